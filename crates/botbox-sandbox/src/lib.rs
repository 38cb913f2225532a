//! Archive ingestion and Docker-backed sandbox orchestration for a
//! single Botbox match.
//!
//! Every match gets its own bridge network, one server container, and
//! one container per connecting agent. Setup is strictly ordered
//! (network, server, start+resolve, clients); teardown always runs and
//! is idempotent.

mod archive;
mod error;
mod orchestrator;
mod request;

pub use archive::{archive_to_tar, open_archive, Archive, ArchiveFile};
pub use error::{ArchiveError, RequestError, SandboxError};
pub use orchestrator::{
    collect_logs, destroy_sandbox, setup_client, setup_network, setup_server, start_server,
    wait_server, SandboxConfig, SandboxResources, CLIENT_SECRET_ENV_VAR, CLIENT_SERVER_ENV_VAR,
    SERVER_IDS_ENV_VAR, SERVER_SECRETS_ENV_VAR,
};
pub use request::{from_multipart, MatchRequest};
