use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Page dimensions as reported by the browser (w x h).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub width: String,
    pub height: String,
}

impl Dimension {
    pub fn new(width: impl Into<String>, height: impl Into<String>) -> Self {
        Self {
            width: width.into(),
            height: height.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.width.is_empty() && !self.height.is_empty()
    }
}

/// The first page resize of a visit. Both ends are always present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Resize {
    pub from: Dimension,
    pub to: Dimension,
}

/// Composite address of a record. URLs are compared verbatim, so
/// `https://a.com` and `https://a.com/` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub website_url: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(website_url: &str, session_id: &str) -> Self {
        Self {
            website_url: website_url.to_string(),
            session_id: session_id.to_string(),
        }
    }
}

/// Cumulative telemetry for one visit, built up until the form is submitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(rename = "websiteURL")]
    pub website_url: String,
    #[serde(rename = "sessionID")]
    pub session_id: String,
    pub resize: Option<Resize>,
    pub copy_paste_fields: HashSet<String>,
    /// Zero until the client reports it.
    pub form_completion_time_secs: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    pub fn new(website_url: &str, session_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            website_url: website_url.to_string(),
            session_id: session_id.to_string(),
            resize: None,
            copy_paste_fields: HashSet::new(),
            form_completion_time_secs: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> SessionKey {
        SessionKey::new(&self.website_url, &self.session_id)
    }

    pub fn resize_from(&self) -> Option<&Dimension> {
        self.resize.as_ref().map(|r| &r.from)
    }

    pub fn resize_to(&self) -> Option<&Dimension> {
        self.resize.as_ref().map(|r| &r.to)
    }
}
