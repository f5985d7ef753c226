//! Codec Error Types
//!
//! Structural decode failures and encode failures. Remote faults live in
//! [`super::fault`]; transport failures in [`crate::host::transport`].

use std::fmt;
use std::io;
use std::num::{ParseFloatError, ParseIntError};

use crate::value::Kind;

/// Structural or literal failure while decoding a token stream
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid UTF-8 in document: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("values nested deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("unexpected end of document")]
    UnexpectedEof,

    #[error("expected {expected}, found {found}")]
    Expected { expected: &'static str, found: String },

    #[error("expected end of {element}, found {found}")]
    Unclosed { element: &'static str, found: String },

    #[error("unexpected end of struct")]
    UnexpectedEndOfStruct,

    #[error("invalid boolean value {0:?}")]
    InvalidBoolean(String),

    #[error("invalid integer value {literal:?}: {source}")]
    InvalidInteger {
        literal: String,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid double value {literal:?}: {source}")]
    InvalidDouble {
        literal: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("invalid dateTime.iso8601 value {literal:?}: {source}")]
    InvalidDateTime {
        literal: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("invalid base64 value: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("unknown entity reference &{0};")]
    UnknownEntity(String),

    #[error("invalid response: missing {0}")]
    MissingEnvelope(&'static str),

    #[error("wanted array, got {0}")]
    NotAnArray(Kind),

    #[error("invalid fault: {0}")]
    InvalidFault(String),
}

impl DecodeError {
    pub(crate) fn expected(expected: &'static str, found: impl fmt::Display) -> Self {
        DecodeError::Expected {
            expected,
            found: found.to_string(),
        }
    }
}

/// Failure while encoding a value to XML-RPC markup
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// The value has no XML-RPC representation.
    #[error("unsupported type: {0}")]
    UnsupportedType(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Custom(String),
}

impl EncodeError {
    /// Returns true for the unsupported-type sentinel
    pub fn is_unsupported(&self) -> bool {
        matches!(self, EncodeError::UnsupportedType(_))
    }
}

impl serde::ser::Error for EncodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        EncodeError::Custom(msg.to_string())
    }
}
