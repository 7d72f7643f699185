//! Request outcomes and their wire responses.

use serde::{Deserialize, Serialize};

/// Closed set of per-request results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Found,
    NotFound,
    PathNotAllowed,
    Malformed,
}

impl Outcome {
    /// The exact bytes sent back to the client.
    pub fn response(self) -> &'static str {
        match self {
            Outcome::Found => "STRING EXISTS",
            Outcome::NotFound => "STRING NOT FOUND",
            Outcome::PathNotAllowed => "INVALID FILE PATH",
            Outcome::Malformed => "Invalid request",
        }
    }

    /// Label for logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Found => "found",
            Outcome::NotFound => "not_found",
            Outcome::PathNotAllowed => "path_not_allowed",
            Outcome::Malformed => "malformed",
        }
    }

    /// Map a wire response back to its outcome.
    pub fn from_response(text: &str) -> Option<Self> {
        [
            Outcome::Found,
            Outcome::NotFound,
            Outcome::PathNotAllowed,
            Outcome::Malformed,
        ]
        .into_iter()
        .find(|o| o.response() == text)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
