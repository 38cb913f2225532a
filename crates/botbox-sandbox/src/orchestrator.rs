//! Container and network lifecycle for one match, via the Docker Engine
//! API.
//!
//! Setup order is fixed: network, then the server container (created,
//! not started), then the server is started and its IP resolved off the
//! match network, then every client container (which needs that IP for
//! its environment). Teardown always runs, in every exit path, and is
//! idempotent — disconnecting or removing something already gone is not
//! an error.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use bollard::container::{
    Config as ContainerConfig, CreateContainerOptions, LogsOptions, RemoveContainerOptions,
    WaitContainerOptions,
};
use bollard::network::{
    ConnectNetworkOptions, CreateNetworkOptions, DisconnectNetworkOptions,
};
use bollard::Docker;
use futures_util::StreamExt;

use crate::archive::{archive_to_tar, Archive};
use crate::error::SandboxError;

/// Container env var naming the server's resolved IPv4 address, handed
/// to every client.
pub const CLIENT_SERVER_ENV_VAR: &str = "BOTBOX_SERVER";
/// Container env var naming the semicolon-joined agent ids, handed to
/// the server.
pub const SERVER_IDS_ENV_VAR: &str = "BOTBOX_IDS";
/// Container env var naming the semicolon-joined per-agent secrets,
/// handed to the server (same order as `BOTBOX_IDS`).
pub const SERVER_SECRETS_ENV_VAR: &str = "BOTBOX_SECRETS";
/// Container env var naming a client's own secret.
pub const CLIENT_SECRET_ENV_VAR: &str = "BOTBOX_SECRET";

const SERVER_DROP_DIR: &str = "/botbox-server";
const SERVER_PORT_SPEC: &str = "12345/tcp";
const CLIENT_DROP_DIR: &str = "/botbox-client";
const SANDBOX_USER: &str = "sandbox";

/// The resources a single match's sandbox allocated, tracked so they can
/// all be torn down together regardless of how the match ended.
#[derive(Debug, Clone, Default)]
pub struct SandboxResources {
    pub network_id: String,
    pub server_container: String,
    pub client_containers: Vec<String>,
}

/// Images and environment-separator settings the orchestrator needs.
/// The subset of `botbox::Config` this module depends on.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    pub server_image: String,
    pub client_image: String,
    pub env_list_sep: char,
}

/// Creates an isolated bridge network for one match.
pub async fn setup_network(docker: &Docker) -> Result<String, SandboxError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let name = format!("sandbox_{now}");

    let response = docker
        .create_network(CreateNetworkOptions {
            name: name.as_str(),
            driver: "bridge",
            ..Default::default()
        })
        .await?;

    let id = response.id.ok_or(SandboxError::NetworkIdMissing)?;
    tracing::info!(network_id = %id, "match network created");
    Ok(id)
}

/// Creates (but does not start) the server container, injecting the
/// server archive's files into its drop directory.
pub async fn setup_server(
    docker: &Docker,
    network_id: &str,
    archive: &mut dyn Archive,
    ids: &[String],
    secrets: &[String],
    config: &SandboxConfig,
) -> Result<String, SandboxError> {
    let sep = config.env_list_sep.to_string();
    let env = vec![
        format!("{SERVER_IDS_ENV_VAR}={}", ids.join(&sep)),
        format!("{SERVER_SECRETS_ENV_VAR}={}", secrets.join(&sep)),
    ];

    let response = docker
        .create_container(
            None::<CreateContainerOptions<String>>,
            ContainerConfig {
                image: Some(config.server_image.clone()),
                cmd: Some(vec!["/bin/bash".to_string(), "run.sh".to_string()]),
                working_dir: Some(SERVER_DROP_DIR.to_string()),
                user: Some(SANDBOX_USER.to_string()),
                env: Some(env),
                exposed_ports: Some(HashMap::from([(
                    SERVER_PORT_SPEC.to_string(),
                    HashMap::new(),
                )])),
                ..Default::default()
            },
        )
        .await?;
    let container_id = response.id;

    let tar = archive_to_tar(archive)?;
    docker
        .upload_to_container(
            &container_id,
            Some(bollard::container::UploadToContainerOptions {
                path: SERVER_DROP_DIR.to_string(),
                ..Default::default()
            }),
            tar.into(),
        )
        .await?;

    docker
        .connect_network(
            network_id,
            ConnectNetworkOptions {
                container: container_id.clone(),
                ..Default::default()
            },
        )
        .await?;

    tracing::info!(container_id = %container_id, "server container created");
    Ok(container_id)
}

/// Starts the server container and resolves its IPv4 address on the
/// match network, so client containers can be pointed at it.
pub async fn start_server(
    docker: &Docker,
    network_id: &str,
    server_container: &str,
) -> Result<String, SandboxError> {
    docker
        .start_container::<String>(server_container, None)
        .await?;

    let network = docker.inspect_network::<String>(network_id, None).await?;
    let ipv4_cidr = network
        .containers
        .unwrap_or_default()
        .get(server_container)
        .and_then(|c| c.ipv4_address.clone());
    let ip = strip_cidr_suffix(ipv4_cidr).ok_or(SandboxError::ServerAddressUnresolved)?;

    tracing::info!(%ip, "server container started");
    Ok(ip)
}

/// Docker reports container addresses as CIDR (`10.0.0.2/16`); strips
/// the prefix length, since agents need a bare IPv4 address.
fn strip_cidr_suffix(addr: Option<String>) -> Option<String> {
    addr.and_then(|addr| {
        let ip = addr.split('/').next().unwrap_or_default().to_string();
        if ip.is_empty() {
            None
        } else {
            Some(ip)
        }
    })
}

/// Creates, injects, connects, and starts one client container.
pub async fn setup_client(
    docker: &Docker,
    network_id: &str,
    archive: &mut dyn Archive,
    server_ip: &str,
    secret: &str,
    config: &SandboxConfig,
) -> Result<String, SandboxError> {
    let env = vec![
        format!("{CLIENT_SERVER_ENV_VAR}={server_ip}"),
        format!("{CLIENT_SECRET_ENV_VAR}={secret}"),
    ];

    let response = docker
        .create_container(
            None::<CreateContainerOptions<String>>,
            ContainerConfig {
                image: Some(config.client_image.clone()),
                cmd: Some(vec!["/bin/bash".to_string(), "run.sh".to_string()]),
                working_dir: Some(CLIENT_DROP_DIR.to_string()),
                user: Some(SANDBOX_USER.to_string()),
                env: Some(env),
                ..Default::default()
            },
        )
        .await?;
    let container_id = response.id;

    let tar = archive_to_tar(archive)?;
    docker
        .upload_to_container(
            &container_id,
            Some(bollard::container::UploadToContainerOptions {
                path: CLIENT_DROP_DIR.to_string(),
                ..Default::default()
            }),
            tar.into(),
        )
        .await?;

    docker
        .connect_network(
            network_id,
            ConnectNetworkOptions {
                container: container_id.clone(),
                ..Default::default()
            },
        )
        .await?;

    docker
        .start_container::<String>(&container_id, None)
        .await?;

    tracing::info!(container_id = %container_id, "client container started");
    Ok(container_id)
}

/// Blocks until the server container exits, the signal that the match
/// is over (the reference server process exits once its game finishes).
pub async fn wait_server(docker: &Docker, server_container: &str) -> Result<(), SandboxError> {
    let mut stream = docker.wait_container(
        server_container,
        None::<WaitContainerOptions<String>>,
    );
    while let Some(result) = stream.next().await {
        result?;
    }
    Ok(())
}

/// Collects a container's combined stdout+stderr log output.
pub async fn collect_logs(docker: &Docker, container_id: &str) -> Result<String, SandboxError> {
    let mut stream = docker.logs(
        container_id,
        Some(LogsOptions::<String> {
            stdout: true,
            stderr: true,
            ..Default::default()
        }),
    );

    let mut logs = String::new();
    while let Some(chunk) = stream.next().await {
        logs.push_str(&chunk?.to_string());
    }
    Ok(logs)
}

/// Tears down every resource a match allocated: disconnects then force
/// removes each container, then removes the network. Always runs on
/// every exit path; safe to call twice on the same resources.
pub async fn destroy_sandbox(docker: &Docker, resources: &SandboxResources) {
    let mut containers = resources.client_containers.clone();
    if !resources.server_container.is_empty() {
        containers.push(resources.server_container.clone());
    }

    for container_id in &containers {
        let _ = docker
            .disconnect_network(
                &resources.network_id,
                DisconnectNetworkOptions {
                    container: container_id.clone(),
                    force: true,
                },
            )
            .await;
        let _ = docker
            .remove_container(
                container_id,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await;
    }

    if !resources.network_id.is_empty() {
        let _ = docker.remove_network(&resources.network_id).await;
    }

    tracing::info!(network_id = %resources.network_id, "sandbox destroyed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_cidr_suffix_removes_prefix_length() {
        assert_eq!(
            strip_cidr_suffix(Some("10.0.0.2/16".to_string())),
            Some("10.0.0.2".to_string())
        );
    }

    #[test]
    fn test_strip_cidr_suffix_rejects_empty_address() {
        assert_eq!(strip_cidr_suffix(Some(String::new())), None);
        assert_eq!(strip_cidr_suffix(None), None);
    }

    #[test]
    fn test_destroy_sandbox_resources_default_is_empty() {
        let resources = SandboxResources::default();
        assert!(resources.network_id.is_empty());
        assert!(resources.client_containers.is_empty());
    }
}
