//! Error types for archive reading, request parsing, and sandbox
//! orchestration.

/// Errors reading or repacking a submitted archive.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("unsupported archive format")]
    UnsupportedFormat,

    #[error("corrupt zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("archive I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors parsing a `POST /start` multipart request into a `MatchRequest`.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("multipart parsing failed: {0}")]
    Multipart(String),

    #[error("request must include exactly one server archive")]
    MissingServerArchive,

    #[error("request must include at least one client archive")]
    MissingClientArchives,

    #[error("`ids` count ({ids}) does not match client archive count ({clients})")]
    IdCountMismatch { ids: usize, clients: usize },

    #[error("agent ids must be unique, \"{0}\" appears more than once")]
    DuplicateId(String),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// Errors setting up, running, or tearing down a match's containers.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("docker engine API error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("failed to resolve server container IPv4 address on the match network")]
    ServerAddressUnresolved,

    #[error("docker did not return an id for the created network")]
    NetworkIdMissing,

    #[error("archive error during sandbox setup: {0}")]
    Archive(#[from] ArchiveError),
}
