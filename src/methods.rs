//! Per-service method table with a builder pattern.
//!
//! A `MethodTable` is the handler side of a service: every callable method is
//! registered explicitly with its ordered parameter names and an async
//! function taking the deserialized parameters. Methods flagged with
//! [`MethodTable::ignore`] stay registered but are never callable remotely.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;

/// Type alias for async handler functions.
type BoxedHandler = Box<dyn Fn(Value) -> BoxFuture<'static, Result<Value, Error>> + Send + Sync>;

/// Name and parameter list of a registered method.
///
/// Derived once at registration and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    name: String,
    parameters: Vec<String>,
}

impl MethodDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter names, in positional order.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Bind request params to this method's parameter list.
    ///
    /// Positional params must match the arity exactly. Named params must
    /// supply every declared parameter and nothing else; they are reordered
    /// into positional form. Absent params bind as an empty list. The result
    /// is a JSON array, or `null` for methods without parameters.
    pub fn bind(&self, params: Option<Value>) -> Result<Value, Error> {
        let args = match params {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(Value::Object(mut named)) => {
                let mut args = Vec::with_capacity(self.parameters.len());
                for parameter in &self.parameters {
                    let value = named.remove(parameter).ok_or_else(|| {
                        Error::invalid_params(format!("missing parameter '{}'", parameter))
                    })?;
                    args.push(value);
                }
                if let Some(unknown) = named.keys().next() {
                    return Err(Error::invalid_params(format!(
                        "unknown parameter '{}'",
                        unknown
                    )));
                }
                args
            }
            Some(_) => {
                return Err(Error::invalid_params("params must be an array or object"));
            }
        };

        if args.len() != self.parameter_count() {
            return Err(Error::invalid_params(format!(
                "{} expects {} parameter(s), got {}",
                self.name,
                self.parameter_count(),
                args.len()
            )));
        }

        if args.is_empty() {
            Ok(Value::Null)
        } else {
            Ok(Value::Array(args))
        }
    }
}

struct MethodEntry {
    descriptor: MethodDescriptor,
    handler: BoxedHandler,
}

/// Registry of a single service's methods.
///
/// # Example
///
/// ```no_run
/// use json_rpc_host::MethodTable;
///
/// async fn add(params: (f64, f64)) -> Result<f64, json_rpc_host::Error> {
///     Ok(params.0 + params.1)
/// }
///
/// let methods = MethodTable::new()
///     .add("add", ["a", "b"], add);
/// ```
#[derive(Default)]
pub struct MethodTable {
    entries: BTreeMap<String, MethodEntry>,
    ignored: BTreeSet<String>,
}

impl MethodTable {
    /// Create a new empty method table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a method handler.
    ///
    /// The handler receives its parameters deserialized from the positional
    /// form produced by [`MethodDescriptor::bind`]: a tuple (or a struct) with
    /// one element per declared parameter, or `()` when there are none. A
    /// deserialization failure is reported as invalid params.
    ///
    /// The bound form is always an array, even for a single parameter, so a
    /// one-parameter handler takes a 1-tuple such as `(String,)`. A bare
    /// `String` parameter would reject every call as invalid params.
    ///
    /// # Type Parameters
    ///
    /// - `F`: The handler function type
    /// - `P`: The parameter type (must implement `DeserializeOwned`)
    /// - `R`: The return type (must implement `Serialize`)
    /// - `Fut`: The future type returned by the handler
    pub fn add<F, P, R, Fut, I, S>(mut self, method: &str, parameters: I, handler: F) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, Error>> + Send + 'static,
        P: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let handler = Arc::new(handler);
        let boxed: BoxedHandler = Box::new(
            move |params: Value| -> BoxFuture<'static, Result<Value, Error>> {
                let handler = Arc::clone(&handler);
                Box::pin(async move {
                    let parsed: P = serde_json::from_value(params)
                        .map_err(|e| Error::invalid_params(e.to_string()))?;
                    let result = handler(parsed).await?;
                    Ok::<Value, Error>(serde_json::to_value(result)?)
                })
            },
        );

        let descriptor = MethodDescriptor {
            name: method.to_string(),
            parameters: parameters.into_iter().map(Into::into).collect(),
        };
        self.entries.insert(
            method.to_string(),
            MethodEntry {
                descriptor,
                handler: boxed,
            },
        );
        self
    }

    /// Flag a method as never callable remotely.
    pub fn ignore(mut self, method: &str) -> Self {
        self.ignored.insert(method.to_string());
        self
    }

    /// Names of all registered methods not flagged with [`MethodTable::ignore`].
    pub fn methods_of(&self) -> BTreeSet<String> {
        self.entries
            .keys()
            .filter(|name| !self.ignored.contains(*name))
            .cloned()
            .collect()
    }

    /// Whether a method is registered and not ignored.
    pub fn is_callable(&self, method: &str) -> bool {
        self.entries.contains_key(method) && !self.ignored.contains(method)
    }

    pub fn descriptor(&self, method: &str) -> Option<&MethodDescriptor> {
        self.entries.get(method).map(|entry| &entry.descriptor)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.entries.values().map(|entry| &entry.descriptor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bind `params` and run the handler.
    ///
    /// Returns `None` when the method is not callable.
    pub(crate) fn invoke(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Option<BoxFuture<'static, Result<Value, Error>>> {
        if self.ignored.contains(method) {
            return None;
        }
        let entry = self.entries.get(method)?;
        let call: BoxFuture<'static, Result<Value, Error>> = match entry.descriptor.bind(params) {
            Ok(bound) => (entry.handler)(bound),
            Err(e) => Box::pin(async move { Err(e) }),
        };
        Some(call)
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("methods", &self.entries.keys().collect::<Vec<_>>())
            .field("ignored", &self.ignored)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn calculator() -> MethodTable {
        MethodTable::new()
            .add("add", ["a", "b"], |(a, b): (f64, f64)| async move { Ok(a + b) })
            .add("ping", Vec::<String>::new(), |_: ()| async { Ok("pong") })
            .add("reset", Vec::<String>::new(), |_: ()| async { Ok(()) })
            .ignore("reset")
    }

    #[test]
    fn ignored_methods_are_not_listed() {
        let table = calculator();
        let names: Vec<_> = table.methods_of().into_iter().collect();
        assert_eq!(names, vec!["add".to_string(), "ping".to_string()]);
        assert!(!table.is_callable("reset"));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn descriptor_reports_arity() {
        let table = calculator();
        let add = table.descriptor("add").unwrap();
        assert_eq!(add.parameter_count(), 2);
        assert_eq!(add.parameters(), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn named_params_are_reordered() {
        let table = calculator();
        let bound = table
            .descriptor("add")
            .unwrap()
            .bind(Some(json!({"b": 2, "a": 1})))
            .unwrap();
        assert_eq!(bound, json!([1, 2]));
    }

    #[test]
    fn arity_mismatch_is_invalid_params() {
        let table = calculator();
        let add = table.descriptor("add").unwrap();

        assert!(matches!(
            add.bind(Some(json!([1]))),
            Err(Error::InvalidParams(_))
        ));
        assert!(matches!(add.bind(None), Err(Error::InvalidParams(_))));
        assert!(matches!(
            add.bind(Some(json!({"a": 1, "b": 2, "c": 3}))),
            Err(Error::InvalidParams(_))
        ));
        assert!(matches!(
            add.bind(Some(json!({"a": 1}))),
            Err(Error::InvalidParams(_))
        ));
    }

    #[test]
    fn parameterless_method_binds_null() {
        let table = calculator();
        let ping = table.descriptor("ping").unwrap();
        assert_eq!(ping.bind(None).unwrap(), Value::Null);
        assert_eq!(ping.bind(Some(json!([]))).unwrap(), Value::Null);
        assert_eq!(ping.bind(Some(json!({}))).unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn invoke_runs_handler() {
        let table = calculator();
        let result = table
            .invoke("add", Some(json!([1, 2.1])))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(result, json!(3.1));
    }

    #[tokio::test]
    async fn wrong_argument_type_is_invalid_params() {
        let table = calculator();
        let result = table
            .invoke("add", Some(json!(["one", 2])))
            .unwrap()
            .await;
        assert!(matches!(result, Err(Error::InvalidParams(_))));
    }

    #[tokio::test]
    async fn struct_parameters_bind_by_name() {
        #[derive(Deserialize)]
        struct Greeting {
            name: String,
            punctuation: String,
        }

        let table = MethodTable::new().add(
            "greet",
            ["name", "punctuation"],
            |greeting: Greeting| async move {
                Ok(format!("Hello, {}{}", greeting.name, greeting.punctuation))
            },
        );
        let result = table
            .invoke("greet", Some(json!({"punctuation": "!", "name": "world"})))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(result, json!("Hello, world!"));
    }

    #[tokio::test]
    async fn single_parameter_binds_as_one_tuple() {
        let table = MethodTable::new()
            .add("shout", ["text"], |(text,): (String,)| async move {
                Ok(text.to_uppercase())
            })
            .add("whisper", ["text"], |text: String| async move { Ok(text) });

        let result = table
            .invoke("shout", Some(json!({"text": "hi"})))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(result, json!("HI"));

        let result = table.invoke("whisper", Some(json!(["hi"]))).unwrap().await;
        assert!(matches!(result, Err(Error::InvalidParams(_))));
    }

    #[test]
    fn ignored_and_unknown_methods_are_not_invocable() {
        let table = calculator();
        assert!(table.invoke("reset", None).is_none());
        assert!(table.invoke("missing", None).is_none());
    }
}
