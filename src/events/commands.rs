use serde_json::json;

use crate::AppState;

use super::{Event, EventError, Response};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_warn};

/// Validates one event, applies it, and describes the outcome.
pub async fn handle_event(state: &AppState, event: Event) -> Result<Response, EventError> {
    let controller = &state.sessions;

    match event {
        Event::NewSession(request) => {
            request.validate()?;

            // Allocation may spin until its deadline; keep it off the async workers.
            let controller = controller.clone();
            let record = tokio::task::spawn_blocking(move || {
                controller.start_session(&request.website_url)
            })
            .await
            .map_err(|err| EventError::Internal(format!("session allocation task failed: {err}")))??;

            Ok(Response::Session {
                session_id: record.session_id,
            })
        }
        Event::WindowResize(event) => {
            let partial = event.validate(controller)?;
            let record = controller.apply(&event.website_url, &event.session_id, &partial)?;
            Ok(Response::Record { record })
        }
        Event::CopyAndPaste(event) => {
            let partial = event.validate(controller)?;
            let record = controller.apply(&event.website_url, &event.session_id, &partial)?;
            Ok(Response::Record { record })
        }
        Event::TimeTaken(event) => {
            let partial = event.validate(controller)?;
            let record = controller.apply(&event.website_url, &event.session_id, &partial)?;
            Ok(Response::Record { record })
        }
        Event::EndSession(request) => {
            let record = controller.end_session(&request.website_url, &request.session_id)?;
            Ok(Response::Ended { record })
        }
    }
}

/// Handles one newline-delimited JSON request and renders a one-line JSON reply.
pub async fn handle_line(state: &AppState, line: &str) -> String {
    let outcome = match serde_json::from_str::<Event>(line) {
        Ok(event) => handle_event(state, event).await,
        Err(err) => Err(EventError::Malformed(err.to_string())),
    };

    let reply = match outcome {
        Ok(response) => json!({ "ok": true, "response": response }),
        Err(err) => {
            let status = err.status();
            if status >= 500 {
                log_error!("event failed: {}", err);
            } else {
                log_warn!("event rejected ({}): {}", status, err);
            }
            json!({ "ok": false, "status": status, "error": err.to_string() })
        }
    };

    reply.to_string()
}
