//! Central configuration, replacing the scattered package-level globals
//! of the reference implementation with one struct built once at
//! startup and threaded explicitly through every component that needs
//! it.

use std::net::SocketAddr;

use botbox_sandbox::SandboxConfig;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:12345";
const DEFAULT_SERVER_IMAGE: &str = "botbox-server";
const DEFAULT_CLIENT_IMAGE: &str = "botbox-client";

/// Everything the `/start` handler and the sandbox orchestrator need to
/// run a match. Built once from the process environment in `main`, then
/// passed down by reference — nothing in this crate reaches back into
/// `std::env` after startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP service listens on.
    pub listen_addr: SocketAddr,
    /// Docker image used for every match's server container.
    pub server_image: String,
    /// Docker image used for every match's client containers.
    pub client_image: String,
    /// Separator joining `BOTBOX_IDS`/`BOTBOX_SECRETS` into one env var.
    pub env_list_sep: char,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.parse().expect("valid default addr"),
            server_image: DEFAULT_SERVER_IMAGE.to_string(),
            client_image: DEFAULT_CLIENT_IMAGE.to_string(),
            env_list_sep: ';',
        }
    }
}

impl Config {
    /// Builds a `Config` from environment variables, falling back to
    /// defaults for anything unset. Intended to be called once, at
    /// process startup.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            listen_addr: std::env::var("BOTBOX_LISTEN_ADDR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.listen_addr),
            server_image: std::env::var("BOTBOX_SERVER_IMAGE")
                .unwrap_or(defaults.server_image),
            client_image: std::env::var("BOTBOX_CLIENT_IMAGE")
                .unwrap_or(defaults.client_image),
            env_list_sep: defaults.env_list_sep,
        }
    }

    /// The subset of this config the sandbox orchestrator needs.
    pub fn sandbox_config(&self) -> SandboxConfig {
        SandboxConfig {
            server_image: self.server_image.clone(),
            client_image: self.client_image.clone(),
            env_list_sep: self.env_list_sep,
        }
    }
}
