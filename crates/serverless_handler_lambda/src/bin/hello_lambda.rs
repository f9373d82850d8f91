use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use serverless_handler_core::dispatcher::Dispatcher;
use serverless_handler_core::logging::LoggerFactory;
use serverless_handler_core::response::Response;
use serverless_handler_lambda::handlers::hello::HelloHandler;

async fn handle_request(
    dispatcher: &Dispatcher<HelloHandler>,
    event: LambdaEvent<Value>,
) -> Result<Option<Response>, Error> {
    let LambdaEvent { payload, context } = event;
    Ok(dispatcher.lambda_handler(&payload, &context))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let loggers = LoggerFactory::init();
    loggers.get_logger("hello-lambda").info(format_args!(
        "Starting with log level {}",
        loggers.default_threshold()
    ));

    let dispatcher = Arc::new(Dispatcher::new(HelloHandler, &loggers));
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let dispatcher = Arc::clone(&dispatcher);
        async move { handle_request(&dispatcher, event).await }
    }))
    .await
}
