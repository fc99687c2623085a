//! Integration tests for the calculator demo over stdio.
//!
//! This test suite runs the `calculator` demo binary, feeds it
//! newline-delimited JSON-RPC messages on stdin and checks the responses
//! written to stdout.
//!
//! Run test:
//!
//! ```shell
//! cargo test --test calculator_stdio
//! ```

pub mod common;

#[cfg(test)]
mod tests {
    use super::common;
    use assert_cmd::Command;
    use serde_json::{Value, json};

    fn run(args: &[&str], input: impl Into<Vec<u8>>) -> std::process::Output {
        let binary_path = common::get_demo_path("calculator").unwrap();

        let output = Command::new(&binary_path)
            .args(args)
            .write_stdin(input)
            .output()
            .expect("Failed to execute calculator");

        eprintln!("Server Logs:\n{}", String::from_utf8_lossy(&output.stderr));
        output
    }

    fn send_request(request: &str) -> String {
        let output = run(&[], request);
        String::from_utf8(output.stdout).expect("Response is not valid UTF-8")
    }

    #[test]
    fn add_success() {
        let request = json!({
            "jsonrpc": "2.0",
            "method": "calc.CalculatorService.add",
            "params": [1, 2.1],
            "id": 1
        })
        .to_string();
        let response = send_request(&request).trim_end().to_string();
        let expected_response = r#"{"jsonrpc":"2.0","id":1,"result":3.1}"#;
        assert_eq!(response, expected_response);
    }

    #[test]
    fn one_response_line_per_request_in_order() {
        let input = [
            r#"{"jsonrpc":"2.0","method":"calc.CalculatorService.subtract","params":[42,23],"id":1}"#,
            "",
            r#"{"jsonrpc":"2.0","method":"calc.CalculatorService.add","params":[1,2]}"#,
            r#"{"jsonrpc":"2.0","method":"calc.CalculatorService.sum","params":{"numbers":[1,2,3.5]},"id":2}"#,
            r#"{"jsonrpc":"2.0","method":"echo.echo","params":["hello"],"id":3}"#,
        ]
        .join("\n");

        let stdout = send_request(&input);
        let lines: Vec<&str> = stdout.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"{"jsonrpc":"2.0","id":1,"result":19}"#,
                r#"{"jsonrpc":"2.0","id":2,"result":6.5}"#,
                r#"{"jsonrpc":"2.0","id":3,"result":"hello"}"#,
            ]
        );
    }

    #[test]
    fn parse_error_malformed_json() {
        let response = send_request("invalid json").trim_end().to_string();
        let expected_response =
            r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error"}}"#;
        assert_eq!(response, expected_response);
    }

    #[test]
    fn invalid_utf8_line_does_not_stop_server() {
        let mut input = b"\xff\xfe\n".to_vec();
        input.extend_from_slice(
            br#"{"jsonrpc":"2.0","method":"calc.CalculatorService.add","params":[1,2.1],"id":1}"#,
        );
        input.push(b'\n');

        let output = run(&[], input);
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout).unwrap();
        let lines: Vec<&str> = stdout.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error"}}"#,
                r#"{"jsonrpc":"2.0","id":1,"result":3.1}"#,
            ]
        );
    }

    #[test]
    fn division_by_zero_is_typed_error() {
        let response = send_request(
            r#"{"jsonrpc":"2.0","method":"calc.CalculatorService.divide","params":[3,0],"id":"d"}"#,
        );
        let response: Value = serde_json::from_str(response.trim_end()).unwrap();
        assert_eq!(response["id"], json!("d"));
        assert_eq!(response["error"]["code"], json!(-32000));
        assert_eq!(response["error"]["data"]["dividend"], json!(3.0));
    }

    #[test]
    fn batch_on_one_line() {
        let request = json!([
            {"jsonrpc": "2.0", "method": "calc.CalculatorService.add", "params": [1, 2], "id": "1"},
            {"jsonrpc": "2.0", "method": "calc.CalculatorService.multiply", "params": [1, 2], "id": "2"}
        ])
        .to_string();
        let response: Value = serde_json::from_str(send_request(&request).trim_end()).unwrap();
        assert_eq!(response[0]["result"], json!(3.0));
        assert_eq!(response[1]["error"]["code"], json!(-32601));
    }

    #[test]
    fn configuration_file_hides_error_details() {
        let path = std::env::temp_dir().join(format!("calculator-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            r#"
            [server]
            middleware = ["request_log"]

            [[server.ports]]
            host = "127.0.0.1"
            port = 8000

            [dispatcher]
            expose_error_details = false

            [logging]
            level = "debug"

            [services.echo]
            class = "demo::EchoServiceImpl"
            expose = ["echo"]
            "#,
        )
        .unwrap();

        let output = run(
            &[path.to_str().unwrap()],
            r#"{"jsonrpc":"2.0","method":"calc.CalculatorService.internal_failure","id":5}"#,
        );
        let _ = std::fs::remove_file(&path);

        assert_eq!(
            String::from_utf8(output.stdout).unwrap().trim_end(),
            r#"{"jsonrpc":"2.0","id":5,"error":{"code":-32603,"message":"Internal error"}}"#
        );
        assert!(String::from_utf8_lossy(&output.stderr).contains("Calculator memory is corrupted"));
    }

    #[test]
    fn invalid_configuration_fails_startup() {
        let path = std::env::temp_dir().join(format!("calculator-bad-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            r#"
            [server]
            middleware = ["rate_limit"]
            "#,
        )
        .unwrap();

        let output = run(&[path.to_str().unwrap()], "");
        let _ = std::fs::remove_file(&path);

        assert!(!output.status.success());
        assert!(output.stdout.is_empty());
    }
}
