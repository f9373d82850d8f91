use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::logging::{Logger, LoggerFactory};
use crate::response::{
    ApplicationError, Response, HTTP_STATUS_BAD_REQUEST, HTTP_STATUS_SERVER_ERROR,
};

pub const DISPATCHER_LOGGER_NAME: &str = "abstract-lambda";
pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal server error";

/// Field name to error message. Empty means the event is valid.
pub type ValidationErrors = BTreeMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Application(#[from] ApplicationError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn unexpected<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Unexpected(anyhow::Error::new(error))
    }
}

/// The two phases a concrete handler provides. [`Dispatcher`] is the only
/// place they are composed.
pub trait RequestHandler {
    /// Execution context handed through from the host runtime untouched.
    type Context;

    fn validate_request(&self, event: &Value) -> ValidationErrors;

    fn process_request(
        &self,
        event: &Value,
        context: &Self::Context,
    ) -> Result<Response, HandlerError>;
}

pub struct Dispatcher<H> {
    handler: H,
    logger: Logger,
}

impl<H: RequestHandler> Dispatcher<H> {
    pub fn new(handler: H, loggers: &LoggerFactory) -> Self {
        Self {
            handler,
            logger: loggers.get_logger(DISPATCHER_LOGGER_NAME),
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Runs one invocation. Returns `None` for warm-up events and an envelope
    /// for every other path; never fails.
    pub fn lambda_handler(&self, event: &Value, context: &H::Context) -> Option<Response> {
        self.logger.debug(format_args!("Incoming request: {event}"));

        if is_warm_up(event) {
            return None;
        }

        let response = match self.validate_then_process(event, context) {
            Ok(response) => response,
            Err(HandlerError::Application(error)) => {
                self.logger.error(format_args!(
                    "Application error; Event: {event}; Error: {error}"
                ));
                // Built directly: create_response would reject the non-success code.
                Response::with_status(error.code, error.content)
            }
            Err(HandlerError::Unexpected(error)) => {
                self.logger.error(format_args!(
                    "Unexpected error; Event: {event}; Error: {error:#}"
                ));
                Response::with_status(
                    HTTP_STATUS_SERVER_ERROR,
                    Value::from(INTERNAL_SERVER_ERROR_MESSAGE),
                )
            }
        };
        Some(response)
    }

    fn validate_then_process(
        &self,
        event: &Value,
        context: &H::Context,
    ) -> Result<Response, HandlerError> {
        let validation_errors = self.handler.validate_request(event);
        if !validation_errors.is_empty() {
            return Ok(validation_failure_response(validation_errors));
        }

        let response = self.handler.process_request(event, context)?;
        self.logger.debug(format_args!("Response generated: {response}"));
        Ok(response)
    }
}

fn validation_failure_response(errors: ValidationErrors) -> Response {
    let data: Map<String, Value> = errors
        .into_iter()
        .map(|(field, message)| (field, Value::String(message)))
        .collect();
    Response::with_status(HTTP_STATUS_BAD_REQUEST, Value::Object(data))
}

fn is_warm_up(event: &Value) -> bool {
    event.get("warm_up").is_some_and(is_truthy)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}
