//! XML-RPC Call Orchestration
//!
//! Encodes a `methodCall`, POSTs it through a [`Transport`], and decodes the
//! `methodResponse`. One round trip per call; retry policy belongs to the caller.

use std::io::{self, BufReader, Read};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::protocol::envelope::{marshal_call, read_response};
use crate::value::Array;

use super::transport::{HttpTransport, Transport, TransportError};

/// Content type of every request
pub const CONTENT_TYPE: &str = "text/xml";

/// Call `method` on `endpoint` and return its result list.
///
/// `params` must serialize as a sequence or tuple; pass `&()` for no
/// arguments. Raw byte slices must be wrapped in [`crate::Bytes`],
/// [`crate::ByteBuf`] or [`crate::Value::Binary`] to go out as `<base64>`.
/// A `fault` response comes back as [`Error::Fault`]. A non-2xx status is a
/// transport error and the body is never decoded.
pub fn call<P: Serialize + ?Sized>(
    transport: &dyn Transport,
    endpoint: &str,
    method: &str,
    params: &P,
) -> Result<Array> {
    let request = marshal_call(method, params)?;
    debug!(method, endpoint, bytes = request.len(), "posting XML-RPC call");

    let response = transport.post(endpoint, CONTENT_TYPE, request)?;
    let status = response.status;
    let success = response.is_success();
    let mut body = DrainOnDrop(response.body);

    if !success {
        warn!(method, endpoint, status, "XML-RPC call rejected by HTTP status");
        return Err(TransportError::Status { status }.into());
    }

    match read_response(BufReader::new(&mut body)) {
        Ok(results) => {
            debug!(method, results = results.len(), "XML-RPC call completed");
            Ok(results)
        }
        Err(Error::Fault(fault)) => {
            debug!(method, code = fault.code, fault = %fault.message, "XML-RPC call faulted");
            Err(fault.into())
        }
        Err(err) => Err(err),
    }
}

/// Reads the rest of the body into a sink when dropped, so the connection
/// can go back to the pool whichever way the call ends.
struct DrainOnDrop(Box<dyn Read + Send>);

impl Read for DrainOnDrop {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl Drop for DrainOnDrop {
    fn drop(&mut self) {
        let _ = io::copy(&mut self.0, &mut io::sink());
    }
}

/// XML-RPC client bound to one endpoint
pub struct Client {
    transport: Arc<dyn Transport>,
    endpoint: String,
}

impl Client {
    /// Create a client over HTTP with default settings
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_config(endpoint, &ClientConfig::default())
    }

    /// Create a client over HTTP with custom configuration
    pub fn with_config(endpoint: impl Into<String>, config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::with_config(config)?;
        Ok(Self::with_transport(Arc::new(transport), endpoint))
    }

    /// Create a client over the given transport
    pub fn with_transport(transport: Arc<dyn Transport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Call `method` with `params` and return its result list. See [`call`]
    /// for how arguments are encoded.
    pub fn call<P: Serialize + ?Sized>(&self, method: &str, params: &P) -> Result<Array> {
        call(self.transport.as_ref(), &self.endpoint, method, params)
    }
}
