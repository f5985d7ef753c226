//! Method Dispatcher
//!
//! Server side of the exchange: decodes a `methodCall`, runs the registered
//! handler, and answers with a `methodResponse` or a fault.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use crate::protocol::envelope::{marshal_fault, marshal_response, read_call, MethodCall};
use crate::protocol::fault::Fault;
use crate::value::Value;

/// The request body could not be decoded as a `methodCall`
pub const PARSE_ERROR: i64 = -32700;
/// No handler is registered under the requested name
pub const METHOD_NOT_FOUND: i64 = -32601;
/// The handler's result has no XML-RPC representation
pub const INTERNAL_ERROR: i64 = -32603;

/// A method implementation
pub type Handler = Box<dyn Fn(&[Value]) -> Result<Value, Fault> + Send + Sync>;

/// Routes decoded calls to named handlers
#[derive(Default)]
pub struct Dispatcher {
    handlers: BTreeMap<String, Handler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `method`, replacing any previous one
    pub fn register<F>(&mut self, method: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        self.handlers.insert(method.into(), Box::new(handler));
        self
    }

    /// Builder form of [`Dispatcher::register`]
    pub fn with_method<F>(mut self, method: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        self.register(method, handler);
        self
    }

    /// Registered method names, sorted
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Run the handler for an already decoded call
    pub fn dispatch(&self, call: &MethodCall) -> Result<Value, Fault> {
        match self.handlers.get(&call.method_name) {
            Some(handler) => handler(call.params.as_slice()),
            None => Err(Fault::new(
                METHOD_NOT_FOUND,
                format!("unknown method {:?}", call.method_name),
            )),
        }
    }

    /// Answer a raw request body with a raw response body
    pub fn handle(&self, body: &[u8]) -> Vec<u8> {
        let call = match read_call(body) {
            Ok(call) => call,
            Err(err) => {
                warn!(error = %err, "rejecting undecodable XML-RPC request");
                return fault_response(&Fault::new(PARSE_ERROR, err.to_string()));
            }
        };

        debug!(method = %call.method_name, params = call.params.len(), "dispatching XML-RPC call");
        let result = match self.dispatch(&call) {
            Ok(result) => result,
            Err(fault) => {
                debug!(method = %call.method_name, code = fault.code, "XML-RPC handler faulted");
                return fault_response(&fault);
            }
        };

        match marshal_response(&[result]) {
            Ok(response) => response,
            Err(err) => {
                warn!(method = %call.method_name, error = %err, "XML-RPC result cannot be encoded");
                fault_response(&Fault::new(INTERNAL_ERROR, err.to_string()))
            }
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("methods", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn fault_response(fault: &Fault) -> Vec<u8> {
    match marshal_fault(fault) {
        Ok(response) => response,
        Err(err) => {
            warn!(code = fault.code, error = %err, "XML-RPC fault cannot be encoded");
            Vec::new()
        }
    }
}
