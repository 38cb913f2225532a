//! The `POST /start` HTTP entry point: parses the multipart match
//! request, runs a match's sandbox from setup through teardown, and
//! maps the outcome onto an HTTP response.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use bollard::Docker;

use botbox_sandbox::{
    destroy_sandbox, from_multipart, setup_client, setup_network, setup_server, start_server,
    wait_server, MatchRequest, SandboxResources,
};
use botbox_session::SecretTable;

use crate::config::Config;
use crate::error::BotboxError;

struct AppState {
    docker: Docker,
    config: Config,
}

/// Builds the service's router, bound to a Docker client and a loaded
/// [`Config`].
pub fn build_router(docker: Docker, config: Config) -> Router {
    let state = Arc::new(AppState { docker, config });
    Router::new()
        .route("/start", post(start_handler))
        .with_state(state)
}

async fn start_handler(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let request = match from_multipart(multipart).await {
        Ok(request) => request,
        Err(err) => return BotboxError::from(err).into_response(),
    };

    match run_match_sandbox(&state.docker, &state.config, request).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => err.into_response(),
    }
}

/// Runs one match's sandbox end to end: issues secrets, stands up the
/// network and containers in order, waits for the server container to
/// exit, then always tears everything down — on the success path and
/// on every error path alike.
async fn run_match_sandbox(
    docker: &Docker,
    config: &Config,
    mut request: MatchRequest,
) -> Result<(), BotboxError> {
    let (_table, issued) = SecretTable::issue(&request.ids)?;
    let secrets: Vec<String> = request
        .ids
        .iter()
        .map(|id| issued[id].as_str().to_string())
        .collect();

    let sandbox_config = config.sandbox_config();
    let network_id = setup_network(docker).await?;
    let mut resources = SandboxResources {
        network_id: network_id.clone(),
        ..Default::default()
    };

    let outcome = async {
        let server_container = setup_server(
            docker,
            &network_id,
            request.server.as_mut(),
            &request.ids,
            &secrets,
            &sandbox_config,
        )
        .await?;
        resources.server_container = server_container.clone();

        let server_ip = start_server(docker, &network_id, &server_container).await?;

        for (archive, id) in request.clients.iter_mut().zip(&request.ids) {
            let secret = issued[id].as_str();
            let client_id = setup_client(
                docker,
                &network_id,
                archive.as_mut(),
                &server_ip,
                secret,
                &sandbox_config,
            )
            .await?;
            resources.client_containers.push(client_id);
        }

        wait_server(docker, &server_container).await?;
        Ok::<(), BotboxError>(())
    }
    .await;

    destroy_sandbox(docker, &resources).await;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use botbox_sandbox::ArchiveFile;

    struct EmptyArchive;
    impl botbox_sandbox::Archive for EmptyArchive {
        fn files(&mut self) -> Result<Vec<ArchiveFile>, botbox_sandbox::ArchiveError> {
            Ok(vec![])
        }
    }

    #[test]
    fn test_build_router_registers_start_route() {
        // `connect_with_local_defaults` only builds a client handle, it
        // does not dial the daemon, so this is safe without one running.
        let docker = Docker::connect_with_local_defaults().expect("docker handle");
        let router = build_router(docker, Config::default());
        let _ = router;
    }

    #[tokio::test]
    async fn test_secrets_are_issued_one_per_agent_id() {
        // Exercises the wiring up to (but not through) the first Docker
        // call, since container lifecycle needs a live daemon; full
        // end-to-end coverage is a deployment-level concern.
        let request = MatchRequest::new(
            Box::new(EmptyArchive),
            vec!["a".to_string(), "b".to_string()],
            vec![Box::new(EmptyArchive), Box::new(EmptyArchive)],
        )
        .unwrap();
        let (_table, issued) = SecretTable::issue(&request.ids).unwrap();
        assert_eq!(issued.len(), 2);
        assert!(issued.contains_key("a"));
        assert!(issued.contains_key("b"));
    }
}
