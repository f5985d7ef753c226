//! HTTP Transport Layer
//!
//! Abstracts the HTTP POST the client rides on. Provides:
//! - Transport trait: one blocking request/response exchange
//! - HttpTransport: reqwest blocking client for production
//! - MockTransport: in-process server for tests

use std::fmt;
use std::io::{self, Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::ClientConfig;
use crate::server::Dispatcher;

/// A single blocking HTTP POST
pub trait Transport: Send + Sync {
    /// POST `body` to `url` and return the status with the unread response body
    fn post(&self, url: &str, content_type: &str, body: Vec<u8>) -> Result<HttpResponse, TransportError>;
}

/// Response status and a streaming body
pub struct HttpResponse {
    pub status: u16,
    pub body: Box<dyn Read + Send>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Read + Send + 'static) -> Self {
        Self {
            status,
            body: Box::new(body),
        }
    }

    /// Status in the 2xx class
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server answered outside the 2xx class.
    #[error("HTTP status {status}")]
    Status { status: u16 },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::ConnectionFailed(err.to_string())
        } else {
            TransportError::Http(err)
        }
    }
}

/// reqwest-backed transport for production use
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Create a transport with default settings
    pub fn new() -> Result<Self, TransportError> {
        Self::with_config(&ClientConfig::default())
    }

    /// Create a transport from client configuration
    pub fn with_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone());
        if let Some(connect_timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(connect_timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Transport for HttpTransport {
    fn post(&self, url: &str, content_type: &str, body: Vec<u8>) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()?;
        Ok(HttpResponse::new(response.status().as_u16(), response))
    }
}

/// A request as seen by [`MockTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

enum Reply {
    Dispatch(Dispatcher),
    Canned { status: u16, body: Vec<u8> },
}

/// Mock transport for testing - answers in-process
///
/// Records the last request and tracks how many bytes of the most recent
/// response body were never read.
pub struct MockTransport {
    reply: Reply,
    last_request: Mutex<Option<RecordedRequest>>,
    unread: Arc<AtomicUsize>,
}

impl MockTransport {
    /// Route every request through `dispatcher` and answer with status 200
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self::with_reply(Reply::Dispatch(dispatcher))
    }

    /// Answer every request with a fixed status and body
    pub fn canned(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::with_reply(Reply::Canned {
            status,
            body: body.into(),
        })
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            last_request: Mutex::new(None),
            unread: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The most recent request, if any
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Bytes of the most recent response body left unread
    pub fn unread_bytes(&self) -> usize {
        self.unread.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    fn post(&self, url: &str, content_type: &str, body: Vec<u8>) -> Result<HttpResponse, TransportError> {
        let (status, response) = match &self.reply {
            Reply::Dispatch(dispatcher) => (200, dispatcher.handle(&body)),
            Reply::Canned { status, body } => (*status, body.clone()),
        };

        *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(RecordedRequest {
            url: url.to_string(),
            content_type: content_type.to_string(),
            body,
        });

        self.unread.store(response.len(), Ordering::SeqCst);
        Ok(HttpResponse::new(
            status,
            TrackedBody {
                inner: Cursor::new(response),
                unread: Arc::clone(&self.unread),
            },
        ))
    }
}

/// Response body that reports its remaining length as it is read
struct TrackedBody {
    inner: Cursor<Vec<u8>>,
    unread: Arc<AtomicUsize>,
}

impl Read for TrackedBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.unread.fetch_sub(n, Ordering::SeqCst);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_class() {
        assert!(HttpResponse::new(200, io::empty()).is_success());
        assert!(HttpResponse::new(299, io::empty()).is_success());
        assert!(!HttpResponse::new(199, io::empty()).is_success());
        assert!(!HttpResponse::new(300, io::empty()).is_success());
        assert!(!HttpResponse::new(500, io::empty()).is_success());
    }

    #[test]
    fn test_canned_reply_tracks_unread_bytes() {
        let transport = MockTransport::canned(404, "not found");
        let mut response = transport
            .post("http://mock/RPC2", "text/xml", b"<x/>".to_vec())
            .unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(transport.unread_bytes(), 9);

        let mut first = [0u8; 4];
        response.body.read_exact(&mut first).unwrap();
        assert_eq!(transport.unread_bytes(), 5);

        io::copy(&mut response.body, &mut io::sink()).unwrap();
        assert_eq!(transport.unread_bytes(), 0);
    }

    #[test]
    fn test_records_last_request() {
        let transport = MockTransport::canned(200, Vec::new());
        assert!(transport.last_request().is_none());

        transport
            .post("http://mock/RPC2", "text/xml", b"payload".to_vec())
            .unwrap();
        let request = transport.last_request().unwrap();
        assert_eq!(request.url, "http://mock/RPC2");
        assert_eq!(request.content_type, "text/xml");
        assert_eq!(request.body, b"payload");
    }

    #[test]
    fn test_status_error_display() {
        assert_eq!(TransportError::Status { status: 502 }.to_string(), "HTTP status 502");
    }

    #[test]
    fn test_http_transport_builds_from_config() {
        let config = ClientConfig {
            connect_timeout_seconds: Some(2),
            ..ClientConfig::default()
        };
        assert!(HttpTransport::with_config(&config).is_ok());
    }
}
