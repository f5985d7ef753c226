//! Server-Side Components
//!
//! Answers decoded XML-RPC calls with registered handlers. Used in-process by
//! `MockTransport` and embeddable behind any HTTP server.

pub mod dispatch;

pub use dispatch::{Dispatcher, Handler, INTERNAL_ERROR, METHOD_NOT_FOUND, PARSE_ERROR};
