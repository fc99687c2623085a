//! Common utilities for integration tests.
//!
//! This module provides the calculator fixture shared by the in-process tests,
//! and locates demo binaries for the tests that drive them as subprocesses.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result, ensure};
use json_rpc_host::{
    Error, MethodTable, RequestDispatcher, ServerBuilder, ServerConfig, ServiceDefinition,
};
use serde_json::json;

pub const CALCULATOR: &str = "calc.CalculatorService";

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

async fn internal_failure(_params: ()) -> Result<(), Error> {
    Err(Error::protocol("disk on fire"))
}

async fn crash(_params: ()) -> Result<(), Error> {
    panic!("handler exploded")
}

async fn reset(_params: ()) -> Result<(), Error> {
    Ok(())
}

/// Calculator methods, with `reset` registered but ignored.
pub fn calculator_methods() -> MethodTable {
    MethodTable::new()
        .add("add", ["a", "b"], add)
        .add("subtract", ["minuend", "subtrahend"], subtract)
        .add("divide", ["dividend", "divisor"], divide)
        .add("internal_failure", Vec::<String>::new(), internal_failure)
        .add("crash", Vec::<String>::new(), crash)
        .add("reset", Vec::<String>::new(), reset)
        .ignore("reset")
}

/// The calculator service, named `calc.CalculatorService` by derivation.
pub fn calculator() -> ServiceDefinition {
    ServiceDefinition::new("calc::CalculatorServiceImpl", calculator_methods())
        .implements("calc::CalculatorService")
        .expose(["add", "subtract", "divide", "internal_failure", "crash"])
}

pub fn dispatcher_with(config: ServerConfig) -> RequestDispatcher {
    ServerBuilder::new(config)
        .discover(calculator())
        .build()
        .expect("calculator boots")
}

pub fn dispatcher() -> RequestDispatcher {
    dispatcher_with(ServerConfig::default())
}

/// Build a demo binary if needed and return its path.
///
/// Demo binaries live next to the test binaries, under
/// `target/<profile>/examples`.
pub fn get_demo_path(name: &str) -> Result<PathBuf> {
    let binary_path = get_demos_dir()?.join(name);

    if !binary_path.exists() {
        eprintln!("Demo binary '{}' not found, building...", name);

        let status = Command::new(env!("CARGO"))
            .args(["build", "--example", name])
            .current_dir(env!("CARGO_MANIFEST_DIR"))
            .status()?;

        ensure!(
            status.success(),
            "cargo build --example {} failed with status: {}",
            name,
            status
        );
    }

    ensure!(
        binary_path.exists(),
        "Demo binary '{}' not found at: {}",
        name,
        binary_path.display()
    );

    Ok(binary_path)
}

/// `target/<profile>/examples`, derived from the running test binary,
/// which lives in `target/<profile>/deps`.
fn get_demos_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let profile_dir = exe
        .parent()
        .and_then(|deps| deps.parent())
        .context("test binary has no profile directory")?;
    Ok(profile_dir.join("examples"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demos_dir_is_next_to_deps() {
        let dir = get_demos_dir().unwrap();
        assert!(dir.ends_with("examples"));
    }
}
