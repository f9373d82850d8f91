//! Request-handling scaffold shared by serverless function handlers.
//!
//! This crate owns the response envelope, the logger factory, and the
//! validate-then-process dispatch contract. It intentionally excludes Lambda
//! runtime concerns; those live in `serverless_handler_lambda`.

pub mod dispatcher;
pub mod logging;
pub mod response;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
