//! Parses a `POST /start` multipart request into a validated
//! [`MatchRequest`].

use std::collections::HashSet;

use axum::extract::Multipart;

use crate::archive::{open_archive, Archive};
use crate::error::RequestError;

/// One parsed match request: a server archive, an ordered list of agent
/// ids, and one client archive per id (same order).
pub struct MatchRequest {
    pub server: Box<dyn Archive>,
    pub ids: Vec<String>,
    pub clients: Vec<Box<dyn Archive>>,
}

impl MatchRequest {
    /// Builds a request, enforcing `ids.len() == clients.len() >= 1`
    /// and unique ids.
    pub fn new(
        server: Box<dyn Archive>,
        ids: Vec<String>,
        clients: Vec<Box<dyn Archive>>,
    ) -> Result<Self, RequestError> {
        if clients.is_empty() {
            return Err(RequestError::MissingClientArchives);
        }
        if ids.len() != clients.len() {
            return Err(RequestError::IdCountMismatch {
                ids: ids.len(),
                clients: clients.len(),
            });
        }
        let mut seen = HashSet::with_capacity(ids.len());
        for id in &ids {
            if !seen.insert(id.clone()) {
                return Err(RequestError::DuplicateId(id.clone()));
            }
        }
        Ok(Self {
            server,
            ids,
            clients,
        })
    }
}

/// Reads an entire `axum::extract::Multipart` body, extracting the
/// `server` file field, the `clients` file fields, and the `ids` value
/// fields, in the order they're sent.
pub async fn from_multipart(mut multipart: Multipart) -> Result<MatchRequest, RequestError> {
    let mut server_bytes: Option<Vec<u8>> = None;
    let mut ids = Vec::new();
    let mut client_bytes = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| RequestError::Multipart(err.to_string()))?
    {
        match field.name().map(str::to_string).as_deref() {
            Some("server") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| RequestError::Multipart(err.to_string()))?;
                server_bytes = Some(bytes.to_vec());
            }
            Some("clients") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| RequestError::Multipart(err.to_string()))?;
                client_bytes.push(bytes.to_vec());
            }
            Some("ids") => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| RequestError::Multipart(err.to_string()))?;
                ids.push(text);
            }
            _ => continue,
        }
    }

    let server = open_archive(server_bytes.ok_or(RequestError::MissingServerArchive)?)?;
    let clients = client_bytes
        .into_iter()
        .map(open_archive)
        .collect::<Result<Vec<_>, _>>()?;

    MatchRequest::new(server, ids, clients)
}
