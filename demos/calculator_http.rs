//! A calculator service hosted over HTTP.
//!
//! Usage:
//!
//! ```bash
//! cargo run --example calculator_http --features axum
//! ```
//!
//! Then send requests:
//!
//! ```bash
//! curl -X POST http://localhost:8000/jsonrpc \
//!   -H "Content-Type: application/json" \
//!   -d '{"jsonrpc":"2.0","method":"calc.CalculatorService.add","params":{"a":1,"b":2.1},"id":1}'
//! ```
//!
//! Expected response:
//!
//! ```json
//! {"jsonrpc":"2.0","id":1,"result":3.1}
//! ```
//!
//! This demo requires the "axum" feature to be enabled.

use anyhow::Result;
use json_rpc_host::middleware::from_fn;
use json_rpc_host::{
    Error, ErrorObject, Http, MethodTable, RequestId, Response, ServerBuilder, ServerConfig,
    ServiceDefinition,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"
[server]
middleware = ["request_log"]
advertised_host = "127.0.0.1"

[[server.ports]]
host = "127.0.0.1"
port = 8000
protocol = "http"
"#;

async fn add(params: (f64, f64)) -> Result<f64, Error> {
    Ok(params.0 + params.1)
}

async fn multiply(params: (f64, f64)) -> Result<f64, Error> {
    Ok(params.0 * params.1)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_toml_str(CONFIG)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let calculator = ServiceDefinition::new(
        "demo::CalculatorServiceImpl",
        MethodTable::new()
            .add("add", ["a", "b"], add)
            .add("multiply", ["a", "b"], multiply),
    )
    .implements("calc::CalculatorService")
    .expose(["add", "multiply"]);

    // Rejects calls carrying a negative first operand before they reach the handler.
    let guard = from_fn(|call, next| {
        Box::pin(async move {
            let negative = call
                .request
                .params
                .as_ref()
                .and_then(|params| params.get(0).or_else(|| params.get("a")))
                .and_then(|value| value.as_f64())
                .is_some_and(|value| value < 0.0);
            if negative {
                let id = call.request.id.clone().unwrap_or(RequestId::Null);
                return Response::error(id, ErrorObject::new(-32001, "Negative operand", None));
            }
            next.run(call).await
        })
    });

    let transport = Http::bind(config.service_port()?);
    info!("Calculator service listening on {}", transport.address());

    ServerBuilder::new(config)
        .discover(calculator)
        .layer(guard)
        .serve(transport)
        .await?;

    Ok(())
}
