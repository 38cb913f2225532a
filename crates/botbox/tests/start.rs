//! Integration tests for the `POST /start` route's request-validation
//! layer. Exercising a successful match needs a live Docker daemon, so
//! these cover the part reachable without one: malformed requests must
//! be rejected with the right status code before any container is
//! touched.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use bollard::Docker;
use botbox::Config;
use http_body_util::BodyExt;
use tower::ServiceExt;

fn router() -> axum::Router {
    let docker = Docker::connect_with_local_defaults().expect("docker client handle");
    botbox::build_router(docker, Config::default())
}

async fn post_multipart(body: &str, boundary: &str) -> axum::http::Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri("/start")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body.to_string()))
        .unwrap();

    router().oneshot(request).await.unwrap()
}

#[tokio::test]
async fn test_empty_body_is_rejected_as_bad_request() {
    let boundary = "X-BOUNDARY";
    let body = format!("--{boundary}--\r\n");

    let response = post_multipart(&body, boundary).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("server archive"));
}

#[tokio::test]
async fn test_mismatched_ids_and_clients_is_rejected_as_bad_request() {
    let boundary = "X-BOUNDARY";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"server\"; filename=\"s.zip\"\r\n\
         Content-Type: application/zip\r\n\r\n\
         PK\x05\x06\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"ids\"\r\n\r\n\
         agent-a\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"ids\"\r\n\r\n\
         agent-b\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"clients\"; filename=\"c.zip\"\r\n\
         Content-Type: application/zip\r\n\r\n\
         PK\x05\x06\r\n\
         --{boundary}--\r\n"
    );

    let response = post_multipart(&body, boundary).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_router_can_be_built_without_a_running_daemon() {
    let _ = router();
}
