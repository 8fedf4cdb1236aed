//! Wire shapes sent by the browser client.
//!
//! Every event that can be parsed is declared here explicitly; anything else
//! is rejected at deserialization.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    error::Error,
    models::{Dimension, PartialRecord, Record},
    session::SessionController,
};

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "eventType", rename_all = "camelCase")]
pub enum Event {
    NewSession(NewSessionRequest),
    WindowResize(ResizePageEvent),
    CopyAndPaste(CopyAndPasteEvent),
    TimeTaken(TimeTakenEvent),
    EndSession(EndSessionRequest),
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NewSessionRequest {
    #[serde(rename = "websiteURL")]
    pub website_url: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ResizePageEvent {
    #[serde(rename = "websiteURL")]
    pub website_url: String,
    #[serde(rename = "sessionID")]
    pub session_id: String,
    #[serde(rename = "resizeFrom", default)]
    pub resize_from: Dimension,
    #[serde(rename = "resizeTo", default)]
    pub resize_to: Dimension,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CopyAndPasteEvent {
    #[serde(rename = "websiteURL")]
    pub website_url: String,
    #[serde(rename = "sessionID")]
    pub session_id: String,
    #[serde(rename = "inputID")]
    pub input_id: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TimeTakenEvent {
    #[serde(rename = "websiteURL")]
    pub website_url: String,
    #[serde(rename = "sessionID")]
    pub session_id: String,
    #[serde(rename = "timeSeconds", alias = "time")]
    pub time_seconds: i64,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EndSessionRequest {
    #[serde(rename = "websiteURL")]
    pub website_url: String,
    #[serde(rename = "sessionID")]
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Response {
    Session {
        #[serde(rename = "sessionID")]
        session_id: String,
    },
    Record {
        record: Record,
    },
    Ended {
        record: Record,
    },
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Malformed request body: {0}")]
    Malformed(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid event: {0}")]
    Invalid(String),

    #[error(transparent)]
    Session(#[from] Error),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl EventError {
    /// HTTP-style status class for the failure.
    pub fn status(&self) -> u16 {
        match self {
            EventError::Malformed(_) | EventError::InvalidUrl(_) | EventError::Invalid(_) => 400,
            EventError::Session(err) if !err.is_client_error() => 500,
            EventError::Session(Error::NotFound { .. }) => 404,
            EventError::Session(Error::AlreadyExists { .. }) => 409,
            EventError::Session(_) => 400,
            EventError::Internal(_) => 500,
        }
    }
}

fn require_session(
    controller: &SessionController,
    website_url: &str,
    session_id: &str,
) -> Result<(), EventError> {
    if controller.contains(website_url, session_id) {
        Ok(())
    } else {
        Err(Error::NotFound {
            website_url: website_url.to_string(),
            session_id: session_id.to_string(),
        }
        .into())
    }
}

impl NewSessionRequest {
    pub fn validate(&self) -> Result<(), EventError> {
        url::Url::parse(&self.website_url)
            .map(|_| ())
            .map_err(|err| EventError::InvalidUrl(format!("{}: {err}", self.website_url)))
    }
}

impl ResizePageEvent {
    pub fn validate(&self, controller: &SessionController) -> Result<PartialRecord, EventError> {
        require_session(controller, &self.website_url, &self.session_id)?;
        if !self.resize_from.is_complete() || !self.resize_to.is_complete() {
            return Err(EventError::Invalid(
                "resize needs width and height on both ends".into(),
            ));
        }
        Ok(PartialRecord::resize(
            self.resize_from.clone(),
            self.resize_to.clone(),
        ))
    }
}

impl CopyAndPasteEvent {
    pub fn validate(&self, controller: &SessionController) -> Result<PartialRecord, EventError> {
        require_session(controller, &self.website_url, &self.session_id)?;
        if self.input_id.is_empty() {
            return Err(EventError::Invalid("inputID must not be empty".into()));
        }
        Ok(PartialRecord::copy_paste([self.input_id.clone()]))
    }
}

impl TimeTakenEvent {
    pub fn validate(&self, controller: &SessionController) -> Result<PartialRecord, EventError> {
        require_session(controller, &self.website_url, &self.session_id)?;
        let secs = u64::try_from(self.time_seconds).map_err(|_| {
            EventError::Invalid(format!("time taken {} is negative", self.time_seconds))
        })?;
        Ok(PartialRecord::form_completion(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{session::SessionIdAllocator, store::KeyedStore};
    use std::sync::Arc;

    fn controller_with_session(url: &str, session: &str) -> SessionController {
        let store = Arc::new(KeyedStore::new());
        store.create(url, session);
        SessionController::new(store, Arc::new(SessionIdAllocator::default()))
    }

    #[test]
    fn parses_client_payloads() {
        let event: Event = serde_json::from_str(
            r#"{"eventType":"windowResize","websiteURL":"https://a.com","sessionID":"1",
                "resizeFrom":{"width":"100","height":"200"},"resizeTo":{"width":"101","height":"201"}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            Event::WindowResize(ResizePageEvent {
                website_url: "https://a.com".into(),
                session_id: "1".into(),
                resize_from: Dimension::new("100", "200"),
                resize_to: Dimension::new("101", "201"),
            })
        );

        let event: Event = serde_json::from_str(
            r#"{"eventType":"timeTaken","websiteURL":"https://a.com","sessionID":"1","timeSeconds":12}"#,
        )
        .unwrap();
        assert!(matches!(event, Event::TimeTaken(TimeTakenEvent { time_seconds: 12, .. })));

        let event: Event = serde_json::from_str(
            r#"{"eventType":"copyAndPaste","websiteURL":"https://a.com","sessionID":"1","inputID":"cardNumber"}"#,
        )
        .unwrap();
        assert!(matches!(event, Event::CopyAndPaste(_)));
    }

    #[test]
    fn rejects_undeclared_event_types() {
        let result: Result<Event, _> =
            serde_json::from_str(r#"{"eventType":"scroll","websiteURL":"https://a.com"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn copy_paste_for_existing_session_is_valid() {
        let controller = controller_with_session("https://www.website1.com", "validSession1");
        let event = CopyAndPasteEvent {
            website_url: "https://www.website1.com".into(),
            session_id: "validSession1".into(),
            input_id: "cardNumber".into(),
        };
        let partial = event.validate(&controller).unwrap();
        assert!(partial.copy_paste_fields.contains("cardNumber"));
    }

    #[test]
    fn events_for_unknown_sessions_are_not_found() {
        let controller = controller_with_session("https://www.website1.com", "validSession1");
        let event = CopyAndPasteEvent {
            website_url: "https://www.website2.com".into(),
            session_id: "noSession2".into(),
            input_id: "cardNumber".into(),
        };
        let err = event.validate(&controller).unwrap_err();
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn resize_needs_all_dimensions() {
        let controller = controller_with_session("https://www.website3.com", "validSession3");
        let mut event = ResizePageEvent {
            website_url: "https://www.website3.com".into(),
            session_id: "validSession3".into(),
            resize_from: Dimension::new("100", "200"),
            resize_to: Dimension::new("101", "201"),
        };
        assert!(event.validate(&controller).unwrap().complete_resize().is_some());

        event.resize_to = Dimension::default();
        let err = event.validate(&controller).unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn negative_time_taken_is_invalid() {
        let controller = controller_with_session("https://www.website5.com", "validSession5");
        let mut event = TimeTakenEvent {
            website_url: "https://www.website5.com".into(),
            session_id: "validSession5".into(),
            time_seconds: 10,
        };
        assert_eq!(
            event.validate(&controller).unwrap().form_completion_time_secs,
            10
        );

        event.time_seconds = -1;
        assert!(matches!(
            event.validate(&controller),
            Err(EventError::Invalid(_))
        ));
    }

    #[test]
    fn new_session_needs_a_parseable_url() {
        let ok = NewSessionRequest {
            website_url: "https://www.website.com/checkout".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = NewSessionRequest {
            website_url: "not a url".into(),
        };
        assert_eq!(bad.validate().unwrap_err().status(), 400);
    }

    #[test]
    fn store_failures_map_to_status_classes() {
        let timeout = EventError::from(Error::AllocationTimeout(std::time::Duration::from_secs(5)));
        assert_eq!(timeout.status(), 500);

        let missing = EventError::from(Error::NotFound {
            website_url: "https://a.com".into(),
            session_id: "1".into(),
        });
        assert_eq!(missing.status(), 404);

        let taken = EventError::from(Error::AlreadyExists {
            website_url: "https://a.com".into(),
            session_id: "1".into(),
        });
        assert_eq!(taken.status(), 409);

        let invalid = EventError::from(Error::InvalidArgument("missing partial record".into()));
        assert_eq!(invalid.status(), 400);
    }
}
