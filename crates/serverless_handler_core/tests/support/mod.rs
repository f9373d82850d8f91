use serde_json::{json, Value};
use serverless_handler_core::dispatcher::{HandlerError, RequestHandler, ValidationErrors};
use serverless_handler_core::logging::{LogSettings, LoggerFactory};
use serverless_handler_core::response::{create_response, trigger_error_response, Response};
use serverless_handler_core::test_helpers::CapturedSink;

/// Routes on the event's `action` field so each test can pick a code path.
pub struct ScriptedHandler;

impl RequestHandler for ScriptedHandler {
    type Context = String;

    fn validate_request(&self, event: &Value) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        match event.get("action") {
            Some(Value::String(_)) => {}
            Some(_) => {
                errors.insert("action".to_string(), "action must be a string".to_string());
            }
            None => {
                errors.insert("action".to_string(), "action is required".to_string());
            }
        }
        errors
    }

    fn process_request(&self, event: &Value, context: &String) -> Result<Response, HandlerError> {
        match event.get("action").and_then(Value::as_str) {
            Some("echo") => Ok(create_response(
                json!({ "context": context, "event": event }),
                200,
            )?),
            Some("forbid") => Ok(trigger_error_response(403, "forbidden")?),
            Some("not_found") => Ok(create_response(json!({"missing": "order-7"}), 404)?),
            Some("parse") => {
                let parsed: Value = serde_json::from_str("{ not json")
                    .map_err(HandlerError::unexpected)?;
                Ok(create_response(parsed, 200)?)
            }
            _ => Ok(trigger_error_response(501, "not implemented")?),
        }
    }
}

/// Runs `body` with a scoped subscriber at `level` and returns the captured lines.
pub fn with_captured_logs<T>(
    level: Option<&str>,
    body: impl FnOnce(&LoggerFactory) -> T,
) -> (T, Vec<String>) {
    let factory = LoggerFactory::new(LogSettings::from_level_name(level));
    let sink = CapturedSink::new();
    let subscriber = factory.subscriber(sink.clone());
    let value = tracing::subscriber::with_default(subscriber, || body(&factory));
    (value, sink.lines())
}
