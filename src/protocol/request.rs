//! Request frame parsing.
//!
//! A frame looks like `allowedRootPath=<path>&string=<query>`. The older
//! client spelling `linuxpath=<path>&string=<query>` is accepted too.
//!
//! The path runs from the first `=` to the first `&`, and that `&` must open
//! the `&string=` marker. The query is everything after the marker, so it
//! may itself contain `=` and `&`.

use thiserror::Error;

const QUERY_MARKER: &str = "&string=";
const PATH_KEYS: [&str; 2] = ["allowedRootPath", "linuxpath"];

/// One parsed lookup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub target_path: String,
    pub query: String,
}

/// Why a frame could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRequest {
    #[error("payload is not valid UTF-8")]
    NotUtf8,

    #[error("missing '=' after the path key")]
    MissingKey,

    #[error("unknown path key '{0}'")]
    UnknownKey(String),

    #[error("missing '&string=' marker after the path")]
    MissingQuery,

    #[error("frame exceeds {} bytes", crate::security::limits::MAX_PAYLOAD_SIZE)]
    Oversized,
}

impl Request {
    /// Parse a frame with padding already stripped.
    pub fn parse(payload: &[u8]) -> Result<Self, MalformedRequest> {
        let text = std::str::from_utf8(payload).map_err(|_| MalformedRequest::NotUtf8)?;

        let (key, rest) = text.split_once('=').ok_or(MalformedRequest::MissingKey)?;
        if !PATH_KEYS.contains(&key) {
            return Err(MalformedRequest::UnknownKey(key.to_string()));
        }

        let amp = rest.find('&').ok_or(MalformedRequest::MissingQuery)?;
        let query = rest[amp..]
            .strip_prefix(QUERY_MARKER)
            .ok_or(MalformedRequest::MissingQuery)?;

        Ok(Self {
            target_path: rest[..amp].to_string(),
            query: query.to_string(),
        })
    }

    /// Encode for sending, as the client does.
    pub fn encode(&self) -> String {
        format!(
            "{}={}{}{}",
            PATH_KEYS[0], self.target_path, QUERY_MARKER, self.query
        )
    }
}
