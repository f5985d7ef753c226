//! Client-Side Components
//!
//! Implements the calling side of an XML-RPC exchange over a pluggable
//! HTTP transport.

pub mod rpc;
pub mod transport;

pub use rpc::{call, Client, CONTENT_TYPE};
pub use transport::{HttpResponse, HttpTransport, MockTransport, RecordedRequest, Transport, TransportError};
