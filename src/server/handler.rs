//! Request handling: parse, authorize, search, respond.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::ServerConfig;
use crate::content::ContentProvider;
use crate::observability::metrics;
use crate::observability::AuditRecord;
use crate::protocol::{MalformedRequest, Outcome, Request};
use crate::security::authorize;
use crate::security::limits::strip_padding;

/// Turns one request frame into a response and an audit record.
#[derive(Debug, Clone)]
pub struct RequestHandler {
    config: Arc<ServerConfig>,
    content: ContentProvider,
}

impl RequestHandler {
    pub fn new(config: Arc<ServerConfig>, content: ContentProvider) -> Self {
        Self { config, content }
    }

    /// Handle a raw frame from `client`.
    ///
    /// Every branch settles on an `Outcome`, so the audit record is always
    /// complete.
    pub async fn handle(&self, payload: &[u8], client: SocketAddr) -> (&'static str, AuditRecord) {
        let start = Instant::now();

        let request = match Request::parse(strip_padding(payload)) {
            Ok(request) => request,
            Err(reason) => return self.reject(reason, client, start),
        };

        let outcome = self.lookup(&request).await;
        metrics::record_request(outcome, start);
        (
            outcome.response(),
            AuditRecord::new(Some(request.query), client, outcome),
        )
    }

    /// Answer a frame that was refused before parsing.
    pub fn handle_oversized(&self, client: SocketAddr) -> (&'static str, AuditRecord) {
        self.reject(MalformedRequest::Oversized, client, Instant::now())
    }

    fn reject(
        &self,
        reason: MalformedRequest,
        client: SocketAddr,
        start: Instant,
    ) -> (&'static str, AuditRecord) {
        tracing::debug!(client = %client, %reason, "Malformed request");
        let outcome = Outcome::Malformed;
        metrics::record_request(outcome, start);
        (outcome.response(), AuditRecord::new(None, client, outcome))
    }

    async fn lookup(&self, request: &Request) -> Outcome {
        let Some(path) = authorize(&request.target_path, &self.config).await else {
            return Outcome::PathNotAllowed;
        };

        if self.content.search(&path, &request.query).await {
            Outcome::Found
        } else {
            Outcome::NotFound
        }
    }
}
