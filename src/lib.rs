//! XML-RPC Wire Protocol
//!
//! This crate implements the XML-RPC codec (a streaming decoder over XML
//! tokens and a serde-driven encoder), the `methodCall` / `methodResponse`
//! envelopes, and a blocking client that posts calls over HTTP.

pub mod config;
pub mod error;
pub mod host;
pub mod protocol;
pub mod server;
pub mod value;

pub use config::{ClientConfig, ConfigError};
pub use error::{Error, Result};
pub use host::{call, Client, HttpTransport, MockTransport, Transport, TransportError};
pub use protocol::{DecodeError, EncodeError, Fault};
pub use server::Dispatcher;
pub use serde_bytes::{ByteBuf, Bytes};
pub use value::{Array, Kind, Struct, Value};
