//! A calculator service hosted over stdio.
//!
//! This demo registers a calculator service and boots it from a TOML
//! configuration. The service is reachable as `calc.CalculatorService`:
//!
//! - `add(a, b)`: Returns a + b
//! - `subtract(minuend, subtrahend)`: Returns minuend - subtrahend
//! - `divide(dividend, divisor)`: Fails with code -32000 on a zero divisor
//! - `sum(numbers)`: Sums an array of numbers
//! - `internal_failure()`: Demonstrates an untyped handler failure
//!
//! An echo service is provided as a handler only and registered by the
//! `services` section of the configuration.
//!
//! Usage:
//!
//! ```bash
//! echo '{"jsonrpc":"2.0","method":"calc.CalculatorService.add","params":[1,2.1],"id":1}' | cargo run --example calculator
//! ```
//!
//! Expected response:
//!
//! ```json
//! {"jsonrpc":"2.0","id":1,"result":3.1}
//! ```
//!
//! Pass a path to a TOML file as the first argument to replace the built-in
//! configuration.

use anyhow::Result;
use json_rpc_host::{Error, MethodTable, ServerBuilder, ServerConfig, ServiceDefinition, Stdio};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = r#"
[server]
middleware = ["request_log"]
advertised_host = "127.0.0.1"

[[server.ports]]
host = "0.0.0.0"
port = 8000
protocol = "http"

[services.echo]
class = "demo::EchoServiceImpl"
expose = ["echo"]
"#;

async fn add(params: (f64, f64)) -> Result<f64, Error> {
    Ok(params.0 + params.1)
}

async fn subtract(params: (i64, i64)) -> Result<i64, Error> {
    Ok(params.0 - params.1)
}

async fn divide(params: (f64, f64)) -> Result<f64, Error> {
    let (dividend, divisor) = params;
    if divisor == 0.0 {
        return Err(Error::rpc_with_data(
            -32000,
            "Division by zero",
            json!({ "dividend": dividend }),
        ));
    }
    Ok(dividend / divisor)
}

async fn sum(params: (Vec<f64>,)) -> Result<f64, Error> {
    Ok(params.0.into_iter().sum())
}

async fn internal_failure(_params: ()) -> Result<(), Error> {
    Err(Error::protocol("Calculator memory is corrupted"))
}

async fn echo(params: (String,)) -> Result<String, Error> {
    Ok(params.0)
}

fn calculator() -> ServiceDefinition {
    let methods = MethodTable::new()
        .add("add", ["a", "b"], add)
        .add("subtract", ["minuend", "subtrahend"], subtract)
        .add("divide", ["dividend", "divisor"], divide)
        .add("sum", ["numbers"], sum)
        .add("internal_failure", Vec::<String>::new(), internal_failure);

    ServiceDefinition::new("demo::CalculatorServiceImpl", methods)
        .implements("calc::CalculatorService")
        .expose(["add", "subtract", "divide", "sum", "internal_failure"])
}

fn echo_service() -> ServiceDefinition {
    ServiceDefinition::new(
        "demo::EchoServiceImpl",
        MethodTable::new().add("echo", ["text"], echo),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::from_toml_str(DEFAULT_CONFIG)?,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Calculator service started. Send JSON-RPC messages via stdin.");

    ServerBuilder::new(config)
        .discover(calculator())
        .provide(echo_service())
        .serve(Stdio::new())
        .await?;

    info!("Message processing loop completed");
    Ok(())
}
