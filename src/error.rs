//! Crate-wide error type
//!
//! Four disjoint failure classes: structural decode errors, unsupported
//! encode kinds, remote faults, and transport failures.

use crate::host::transport::TransportError;
use crate::protocol::errors::{DecodeError, EncodeError};
use crate::protocol::fault::Fault;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// The call reached the remote end and was rejected there.
    #[error(transparent)]
    Fault(#[from] Fault),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl Error {
    pub fn as_fault(&self) -> Option<&Fault> {
        match self {
            Error::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    pub fn is_fault(&self) -> bool {
        self.as_fault().is_some()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
