//! Error types for the session store and identifier allocator.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using the crate's core Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Failures returned by the store and the allocator.
///
/// None of these are fatal: both components stay usable after any failed call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("no record for session {session_id} on {website_url}")]
    NotFound {
        website_url: String,
        session_id: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no free session id found within {0:?}")]
    AllocationTimeout(Duration),

    #[error("record for session {session_id} on {website_url} already exists")]
    AlreadyExists {
        website_url: String,
        session_id: String,
    },
}

impl Error {
    pub(crate) fn not_found(website_url: &str, session_id: &str) -> Self {
        Error::NotFound {
            website_url: website_url.to_string(),
            session_id: session_id.to_string(),
        }
    }

    pub(crate) fn already_exists(website_url: &str, session_id: &str) -> Self {
        Error::AlreadyExists {
            website_url: website_url.to_string(),
            session_id: session_id.to_string(),
        }
    }

    /// True when the caller sent something wrong, false for server-side capacity faults.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Error::AllocationTimeout(_))
    }
}
