//! Remote Faults
//!
//! A `<fault>` response is surfaced as a typed error, never as a result value.

use serde::Serialize;

use super::errors::DecodeError;
use crate::value::Value;

/// Application-level error reported by the remote end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct Fault {
    #[serde(rename = "faultCode")]
    pub code: i64,
    #[serde(rename = "faultString")]
    pub message: String,
}

impl Fault {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Convert the decoded body of a `<fault>` element.
    ///
    /// `faultCode` may be an integer or a string holding one. `faultString`
    /// defaults to empty when absent.
    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        let mut members = match value {
            Value::Struct(members) => members,
            other => {
                return Err(DecodeError::InvalidFault(format!(
                    "wanted struct, got {}",
                    other.kind()
                )))
            }
        };

        let code = match members.remove("faultCode") {
            Some(Value::Integer(code)) => code,
            Some(Value::String(code)) => code.trim().parse().map_err(|_| {
                DecodeError::InvalidFault(format!("faultCode {code:?} is not an integer"))
            })?,
            Some(other) => {
                return Err(DecodeError::InvalidFault(format!(
                    "faultCode must be int or string, got {}",
                    other.kind()
                )))
            }
            None => return Err(DecodeError::InvalidFault("missing faultCode".to_string())),
        };

        let message = match members.remove("faultString") {
            Some(Value::String(message)) => message,
            None => String::new(),
            Some(other) => {
                return Err(DecodeError::InvalidFault(format!(
                    "faultString must be string, got {}",
                    other.kind()
                )))
            }
        };

        Ok(Self { code, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Struct;

    fn fault_struct(code: Value, message: Option<Value>) -> Value {
        let mut members = Struct::new();
        members.insert("faultCode".to_string(), code);
        if let Some(message) = message {
            members.insert("faultString".to_string(), message);
        }
        Value::Struct(members)
    }

    #[test]
    fn test_display() {
        assert_eq!(Fault::new(4, "Too many parameters.").to_string(), "4: Too many parameters.");
    }

    #[test]
    fn test_integer_and_string_codes() {
        let fault = Fault::from_value(fault_struct(Value::from(4), Some(Value::from("nope")))).unwrap();
        assert_eq!(fault, Fault::new(4, "nope"));

        let fault = Fault::from_value(fault_struct(Value::from(" 500 "), Some(Value::from("x")))).unwrap();
        assert_eq!(fault.code, 500);
    }

    #[test]
    fn test_missing_message_defaults_to_empty() {
        let fault = Fault::from_value(fault_struct(Value::from(1), None)).unwrap();
        assert_eq!(fault.message, "");
    }

    #[test]
    fn test_bad_shapes() {
        assert!(matches!(
            Fault::from_value(Value::from("boom")),
            Err(DecodeError::InvalidFault(_))
        ));
        assert!(matches!(
            Fault::from_value(fault_struct(Value::from("abc"), None)),
            Err(DecodeError::InvalidFault(_))
        ));
        assert!(matches!(
            Fault::from_value(fault_struct(Value::from(true), None)),
            Err(DecodeError::InvalidFault(_))
        ));
        assert!(matches!(
            Fault::from_value(fault_struct(Value::from(1), Some(Value::from(2)))),
            Err(DecodeError::InvalidFault(_))
        ));
        assert!(matches!(
            Fault::from_value(Value::Struct(Struct::new())),
            Err(DecodeError::InvalidFault(_))
        ));
    }
}
