//! Lambda-hosted handlers built on `serverless_handler_core`.
//!
//! This crate owns the runtime integration (the `hello_lambda` binary) and the
//! concrete business logic plugged into the dispatcher.

pub mod handlers;
