use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};

pub const HTTP_STATUS_BAD_REQUEST: u16 = 400;
pub const HTTP_STATUS_UNAUTHORIZED: u16 = 401;
pub const HTTP_STATUS_FORBIDDEN: u16 = 403;
pub const HTTP_STATUS_NOT_FOUND: u16 = 404;
pub const HTTP_STATUS_SUCCESS: u16 = 200;
pub const HTTP_STATUS_SERVER_ERROR: u16 = 500;
pub const HTTP_STATUS_NOT_IMPLEMENTED: u16 = 501;
pub const HTTP_STATUS_SERVICE_UNAVAILABLE: u16 = 503;

/// The `{status, data}` envelope returned on every non-warm-up path.
///
/// Callers can only build one for [`HTTP_STATUS_SUCCESS`] through
/// [`create_response`]; any other status is expressed as an
/// [`ApplicationError`] and turned into an envelope by the dispatcher.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Response {
    status: u16,
    data: Value,
}

impl Response {
    pub(crate) fn with_status(status: u16, data: Value) -> Self {
        Self { status, data }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn into_data(self) -> Value {
        self.data
    }

    pub fn is_success(&self) -> bool {
        self.status == HTTP_STATUS_SUCCESS
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", json!({ "status": self.status, "data": self.data }))
    }
}

/// An expected failure with an explicit status and payload chosen by business
/// logic. Consumed exactly once by the dispatcher.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Error {code}: {}", render_content(.content))]
pub struct ApplicationError {
    pub code: u16,
    pub content: Value,
}

impl ApplicationError {
    pub fn new(code: u16, content: impl Into<Value>) -> Self {
        Self {
            code,
            content: content.into(),
        }
    }
}

fn render_content(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Builds a success envelope, or fails with an [`ApplicationError`] carrying
/// `status` and `data` for any non-success status.
pub fn create_response(data: impl Into<Value>, status: u16) -> Result<Response, ApplicationError> {
    let data = data.into();
    if status == HTTP_STATUS_SUCCESS {
        Ok(Response::with_status(status, data))
    } else {
        Err(ApplicationError::new(status, data))
    }
}

pub fn success_response(data: impl Into<Value>) -> Response {
    Response::with_status(HTTP_STATUS_SUCCESS, data.into())
}

pub fn trigger_error_response<T>(
    status: u16,
    message: impl Into<Value>,
) -> Result<T, ApplicationError> {
    Err(ApplicationError::new(status, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_response_returns_envelope_for_success_status() {
        let response = create_response(json!({"id": 7}), HTTP_STATUS_SUCCESS)
            .expect("success status should not fail");

        assert_eq!(response.status(), 200);
        assert_eq!(response.data(), &json!({"id": 7}));
        assert_eq!(
            serde_json::to_value(&response).expect("response should serialize"),
            json!({"status": 200, "data": {"id": 7}})
        );
    }

    #[test]
    fn create_response_fails_for_every_other_status() {
        for status in [
            HTTP_STATUS_BAD_REQUEST,
            HTTP_STATUS_UNAUTHORIZED,
            HTTP_STATUS_FORBIDDEN,
            HTTP_STATUS_NOT_FOUND,
            HTTP_STATUS_SERVER_ERROR,
            HTTP_STATUS_NOT_IMPLEMENTED,
            HTTP_STATUS_SERVICE_UNAVAILABLE,
            201,
        ] {
            let error = create_response(json!(["payload"]), status)
                .expect_err("non-success status should fail");
            assert_eq!(error.code, status);
            assert_eq!(error.content, json!(["payload"]));
        }
    }

    #[test]
    fn trigger_error_response_always_fails() {
        let error = trigger_error_response::<Response>(HTTP_STATUS_NOT_FOUND, "missing")
            .expect_err("trigger should fail");

        assert_eq!(error, ApplicationError::new(404, "missing"));
    }

    #[test]
    fn application_error_display_renders_strings_unquoted() {
        assert_eq!(
            ApplicationError::new(403, "forbidden").to_string(),
            "Error 403: forbidden"
        );
        assert_eq!(
            ApplicationError::new(400, json!({"name": "required"})).to_string(),
            "Error 400: {\"name\":\"required\"}"
        );
    }

    #[test]
    fn display_matches_serialized_envelope() {
        let response = success_response("ok");
        let rendered: Value =
            serde_json::from_str(&response.to_string()).expect("display should be JSON");
        assert_eq!(rendered, json!({"status": 200, "data": "ok"}));
    }
}
