use lambda_runtime::Context;
use serde_json::{json, Value};
use serverless_handler_core::dispatcher::{HandlerError, RequestHandler, ValidationErrors};
use serverless_handler_core::response::{
    create_response, trigger_error_response, Response, HTTP_STATUS_BAD_REQUEST,
    HTTP_STATUS_SUCCESS,
};

pub const HELLO_PATH: &str = "/hello";
pub const HELLO_MESSAGE: &str = "Hello from Lambda";

/// Answers `GET /hello` from API Gateway proxy events (HTTP API v2 or REST v1
/// shape) and rejects every other route with a 400.
#[derive(Debug, Default, Clone, Copy)]
pub struct HelloHandler;

impl RequestHandler for HelloHandler {
    type Context = Context;

    fn validate_request(&self, event: &Value) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if request_path(event).is_none() {
            errors.insert(
                "rawPath".to_string(),
                "request path must be a string".to_string(),
            );
        }
        if http_method(event).is_none() {
            errors.insert(
                "requestContext.http.method".to_string(),
                "HTTP method must be a string".to_string(),
            );
        }
        errors
    }

    fn process_request(&self, event: &Value, _context: &Context) -> Result<Response, HandlerError> {
        let path = request_path(event).unwrap_or_default();
        let method = http_method(event).unwrap_or_default();

        if method.eq_ignore_ascii_case("GET") && path == HELLO_PATH {
            return Ok(create_response(
                json!({ "message": HELLO_MESSAGE }),
                HTTP_STATUS_SUCCESS,
            )?);
        }

        Ok(trigger_error_response(
            HTTP_STATUS_BAD_REQUEST,
            format!(
                "Invalid request method or path. Requested path: {path}. HTTP method: {method}"
            ),
        )?)
    }
}

fn request_path(event: &Value) -> Option<&str> {
    event
        .get("rawPath")
        .or_else(|| event.get("path"))
        .and_then(Value::as_str)
}

fn http_method(event: &Value) -> Option<&str> {
    event
        .pointer("/requestContext/http/method")
        .or_else(|| event.get("httpMethod"))
        .and_then(Value::as_str)
}
