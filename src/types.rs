//! JSON-RPC 2.0 message types.
//!
//! This module defines JSON-RPC 2.0 message types as specified in:
//! https://www.jsonrpc.org/specification

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Invalid JSON was received by the server.
pub const PARSE_ERROR: i32 = -32700;
/// The JSON sent is not a valid Request object.
pub const INVALID_REQUEST: i32 = -32600;
/// The method does not exist / is not available.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameter(s).
pub const INVALID_PARAMS: i32 = -32602;
/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i32 = -32603;

/// A JSON-RPC request. A request without an `id` is a notification.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(id),
            method: method.into(),
            params,
        }
    }

    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: method.into(),
            params,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Validate a decoded JSON value as a request object.
    ///
    /// The `id` member is read first so that a rejection can still echo it.
    /// `"id": null` is a request with a null id, only an absent `id` makes a
    /// notification.
    pub fn from_value(value: Value) -> Result<Self, InvalidRequest> {
        let Value::Object(mut object) = value else {
            return Err(InvalidRequest::new(RequestId::Null, "request is not an object"));
        };

        let id = match object.remove("id") {
            None => None,
            Some(raw) => match RequestId::from_value(&raw) {
                Some(id) => Some(id),
                None => {
                    return Err(InvalidRequest::new(RequestId::Null, "id has an invalid type"));
                }
            },
        };
        let echo = id.clone().unwrap_or(RequestId::Null);

        match object.remove("jsonrpc") {
            Some(Value::String(version)) if version == "2.0" => {}
            _ => return Err(InvalidRequest::new(echo, "jsonrpc must be \"2.0\"")),
        }

        let method = match object.remove("method") {
            Some(Value::String(method)) => method,
            _ => return Err(InvalidRequest::new(echo, "method must be a string")),
        };

        let params = match object.remove("params") {
            None => None,
            Some(params @ (Value::Array(_) | Value::Object(_))) => Some(params),
            Some(_) => {
                return Err(InvalidRequest::new(echo, "params must be an array or object"));
            }
        };

        debug!("Validated request for method {}", method);

        Ok(Self {
            jsonrpc: "2.0".to_string(),
            id,
            method,
            params,
        })
    }
}

/// A request object that failed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidRequest {
    /// The id to echo in the error response.
    pub id: RequestId,
    /// Why the request was rejected. Logged, never sent.
    pub reason: &'static str,
}

impl InvalidRequest {
    fn new(id: RequestId, reason: &'static str) -> Self {
        Self { id, reason }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    pub id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Response {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: RequestId, error: ErrorObject) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn validate(&self) -> Result<(), String> {
        match (&self.result, &self.error) {
            (Some(_), Some(_)) => Err("Response cannot have both result and error".to_string()),
            (None, None) => Err("Response must have either result or error".to_string()),
            _ => Ok(()),
        }
    }
}

/// What the dispatcher sends back: one response, or the responses of a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Single(Response),
    Batch(Vec<Response>),
}

impl Reply {
    /// All responses in this reply, in order.
    pub fn responses(&self) -> &[Response] {
        match self {
            Reply::Single(response) => std::slice::from_ref(response),
            Reply::Batch(responses) => responses,
        }
    }
}

/// The `error` member of a JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorObject {
    pub fn new(code: i32, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(PARSE_ERROR, message, None)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, message, None)
    }

    pub fn method_not_found(message: impl Into<String>) -> Self {
        Self::new(METHOD_NOT_FOUND, message, None)
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message, None)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message, None)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    Null,
    Number(i64),
    /// Integer ids above `i64::MAX`.
    Unsigned(u64),
    String(String),
}

impl RequestId {
    /// Read an id member. Only strings, integers and null are valid ids.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(RequestId::Null),
            Value::Number(n) => n
                .as_i64()
                .map(RequestId::Number)
                .or_else(|| n.as_u64().map(RequestId::Unsigned)),
            Value::String(s) => Some(RequestId::String(s.clone())),
            _ => None,
        }
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        RequestId::Number(value)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        RequestId::String(value.to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Null => write!(f, "null"),
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::Unsigned(n) => write!(f, "{}", n),
            RequestId::String(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_id_is_a_notification() {
        let request =
            Request::from_value(json!({"jsonrpc": "2.0", "method": "calc.Calculator.add"}))
                .unwrap();
        assert!(request.is_notification());
    }

    #[test]
    fn null_id_is_a_request() {
        let request =
            Request::from_value(json!({"jsonrpc": "2.0", "method": "m", "id": null})).unwrap();
        assert_eq!(request.id, Some(RequestId::Null));
    }

    #[test]
    fn rejection_echoes_readable_id() {
        let rejected = Request::from_value(json!({"jsonrpc": "1.0", "method": "m", "id": "abc"}))
            .unwrap_err();
        assert_eq!(rejected.id, RequestId::String("abc".into()));

        let rejected = Request::from_value(json!({"jsonrpc": "2.0", "method": "m", "id": 1.5}))
            .unwrap_err();
        assert_eq!(rejected.id, RequestId::Null);
    }

    #[test]
    fn large_unsigned_id_is_echoed() {
        let request = Request::from_value(json!({
            "jsonrpc": "2.0",
            "method": "m",
            "id": u64::MAX
        }))
        .unwrap();
        assert_eq!(request.id, Some(RequestId::Unsigned(u64::MAX)));

        let response = Response::success(request.id.unwrap(), json!(true));
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"jsonrpc":"2.0","id":18446744073709551615,"result":true}"#
        );

        let negative = Request::from_value(json!({"jsonrpc": "2.0", "method": "m", "id": -4}))
            .unwrap();
        assert_eq!(negative.id, Some(RequestId::Number(-4)));
    }

    #[test]
    fn scalar_params_are_rejected() {
        let rejected =
            Request::from_value(json!({"jsonrpc": "2.0", "method": "m", "params": 3, "id": 7}))
                .unwrap_err();
        assert_eq!(rejected.id, RequestId::Number(7));
    }

    #[test]
    fn response_serializes_id_before_result() {
        let response = Response::success(RequestId::Number(1), json!(3.1));
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"jsonrpc":"2.0","id":1,"result":3.1}"#
        );
    }

    #[test]
    fn response_validation() {
        let mut response = Response::success(RequestId::Null, json!(null));
        assert!(response.validate().is_ok());

        response.error = Some(ErrorObject::internal_error("Internal error"));
        assert!(response.validate().is_err());

        response.result = None;
        response.error = None;
        assert!(response.validate().is_err());
    }
}
