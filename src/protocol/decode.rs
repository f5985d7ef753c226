//! Streaming Decoder
//!
//! Recursive descent over a [`TokenSource`]. Each element handler consumes
//! tokens up to and including its own end tag, and fails on the first
//! structural violation; nothing is recovered or partially returned.

use std::io::BufRead;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, FixedOffset, NaiveDateTime};

use super::encode::DATETIME_FORMAT;
use super::errors::DecodeError;
use super::fault::Fault;
use super::tokens::{Token, TokenSource, XmlTokens};
use crate::error::{Error, Result};
use crate::value::{Array, Struct, Value};

/// `dateTime.iso8601` fallbacks, tried in order after [`DATETIME_FORMAT`]
const DATETIME_OFFSET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";
const DATETIME_EXTENDED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Deepest element nesting the decoder follows before giving up
pub const MAX_DEPTH: usize = 256;

/// A decoded element.
///
/// `name` is only set for elements outside the XML-RPC vocabulary, which
/// decode to their character data so callers can still inspect them.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub name: Option<String>,
    pub value: Value,
}

/// Decodes XML-RPC values from a token stream
pub struct Decoder<S> {
    tokens: S,
    depth: usize,
}

impl<S: TokenSource> Decoder<S> {
    pub fn new(tokens: S) -> Self {
        Self { tokens, depth: 0 }
    }

    /// Skip to the next start tag and decode that element.
    pub fn decode_next(&mut self) -> Result<Decoded> {
        let name = self.next_start()?;
        self.element(name)
    }

    /// Skip anything up to the next start tag and return its name.
    pub(crate) fn next_start(&mut self) -> Result<String> {
        loop {
            if let Token::Start(name) = self.token()? {
                return Ok(name);
            }
        }
    }

    /// Consume whitespace up to the end tag of `element`.
    pub(crate) fn close(&mut self, element: &'static str) -> Result<()> {
        loop {
            match self.token()? {
                Token::Text(_) => {}
                Token::End(name) if name == element => return Ok(()),
                other => {
                    return Err(DecodeError::Unclosed {
                        element,
                        found: other.to_string(),
                    }
                    .into())
                }
            }
        }
    }

    /// Character data of the element just opened, up to its end tag.
    /// Text inside nested elements is skipped.
    pub(crate) fn text(&mut self) -> Result<String> {
        let mut text = String::new();
        let mut depth = 0usize;
        loop {
            match self.token()? {
                Token::Text(chunk) if depth == 0 => text.push_str(&chunk),
                Token::Text(_) => {}
                Token::Start(_) => depth += 1,
                Token::End(_) if depth > 0 => depth -= 1,
                Token::End(_) => return Ok(text),
            }
        }
    }

    fn token(&mut self) -> Result<Token> {
        Ok(self.tokens.next_token()?.ok_or(DecodeError::UnexpectedEof)?)
    }

    fn element(&mut self, name: String) -> Result<Decoded> {
        if self.depth == MAX_DEPTH {
            return Err(DecodeError::TooDeep { limit: MAX_DEPTH }.into());
        }
        self.depth += 1;
        let decoded = self.element_body(name);
        self.depth -= 1;
        decoded
    }

    fn element_body(&mut self, name: String) -> Result<Decoded> {
        let value = match name.as_str() {
            "string" => Value::String(self.text()?),
            "boolean" => parse_boolean(&self.text()?)?,
            "int" | "i1" | "i2" | "i4" | "i8" => parse_integer(self.text()?)?,
            "double" => parse_double(self.text()?)?,
            "dateTime.iso8601" => {
                let literal = self.text()?;
                match parse_datetime(&literal) {
                    Ok(dt) => Value::DateTime(dt),
                    Err(source) => return Err(DecodeError::InvalidDateTime { literal, source }.into()),
                }
            }
            "base64" => parse_base64(&self.text()?)?,
            "nil" => {
                self.text()?;
                Value::Nil
            }
            "value" | "param" => self.value()?,
            "struct" => self.structure()?,
            "array" => self.array()?,
            "params" => self.params()?,
            "fault" => return Err(self.fault()),
            _ => {
                let text = self.text()?;
                return Ok(Decoded {
                    name: Some(name),
                    value: Value::String(text),
                });
            }
        };
        Ok(Decoded { name: None, value })
    }

    /// Body of `<value>` or `<param>`. A nested element wins; bare text
    /// decodes as a string.
    fn value(&mut self) -> Result<Value> {
        let mut text = String::new();
        let mut nested = None;
        loop {
            match self.token()? {
                Token::Start(name) => nested = Some(self.element(name)?.value),
                Token::Text(chunk) => text.push_str(&chunk),
                Token::End(_) => return Ok(nested.unwrap_or(Value::String(text))),
            }
        }
    }

    fn structure(&mut self) -> Result<Value> {
        enum State {
            Member,
            Name,
            Value(String),
        }

        let mut members = Struct::new();
        let mut state = State::Member;
        loop {
            state = match (state, self.token()?) {
                (state, Token::Text(_)) => state,
                (State::Member, Token::Start(name)) if name == "member" => State::Name,
                (State::Name, Token::Start(name)) if name == "name" => State::Value(self.text()?),
                (State::Value(key), Token::Start(name)) if name == "value" => {
                    let value = self.value()?;
                    members.insert(key, value);
                    State::Member
                }
                (State::Member, Token::End(name)) if name == "struct" => {
                    return Ok(Value::Struct(members))
                }
                (_, Token::End(name)) if name == "struct" => {
                    return Err(DecodeError::UnexpectedEndOfStruct.into())
                }
                (State::Member, Token::End(name)) if name == "member" => State::Member,
                (State::Member, other) => return Err(DecodeError::expected("member", other).into()),
                (State::Name, other) => return Err(DecodeError::expected("name", other).into()),
                (State::Value(_), other) => return Err(DecodeError::expected("value", other).into()),
            };
        }
    }

    fn array(&mut self) -> Result<Value> {
        #[derive(Clone, Copy)]
        enum State {
            Data,
            Value,
        }

        let mut items = Array::new();
        let mut state = State::Data;
        loop {
            match (state, self.token()?) {
                (_, Token::Text(_)) => {}
                (State::Data, Token::Start(name)) if name == "data" => state = State::Value,
                (State::Data, other) => return Err(DecodeError::expected("data", other).into()),
                (State::Value, Token::Start(name)) if name == "value" => items.push(self.value()?),
                (State::Value, Token::End(name)) if name == "data" => {
                    self.close("array")?;
                    return Ok(Value::Array(items));
                }
                (State::Value, other) => return Err(DecodeError::expected("value", other).into()),
            }
        }
    }

    fn params(&mut self) -> Result<Value> {
        let mut params = Array::new();
        loop {
            match self.token()? {
                Token::Text(_) => {}
                Token::Start(name) if name == "param" => params.push(self.value()?),
                Token::End(name) if name == "params" => return Ok(Value::Array(params)),
                other => return Err(DecodeError::expected("param", other).into()),
            }
        }
    }

    /// Decode the struct inside `<fault>` and turn it into the error to return.
    fn fault(&mut self) -> Error {
        match self.decode_next() {
            Ok(decoded) => match Fault::from_value(decoded.value) {
                Ok(fault) => fault.into(),
                Err(err) => err.into(),
            },
            Err(err) => err,
        }
    }
}

/// Decode the first element of an XML document.
pub fn from_reader<R: BufRead>(input: R) -> Result<Value> {
    Decoder::new(XmlTokens::new(input))
        .decode_next()
        .map(|decoded| decoded.value)
}

pub fn from_str(xml: &str) -> Result<Value> {
    from_reader(xml.as_bytes())
}

fn parse_boolean(literal: &str) -> std::result::Result<Value, DecodeError> {
    match literal.trim() {
        "true" | "1" => Ok(Value::Boolean(true)),
        "false" | "0" => Ok(Value::Boolean(false)),
        other => Err(DecodeError::InvalidBoolean(other.to_string())),
    }
}

fn parse_integer(literal: String) -> std::result::Result<Value, DecodeError> {
    match literal.trim().parse::<i64>() {
        Ok(i) => Ok(Value::Integer(i)),
        Err(source) => Err(DecodeError::InvalidInteger { literal, source }),
    }
}

fn parse_double(literal: String) -> std::result::Result<Value, DecodeError> {
    match literal.trim().parse::<f64>() {
        Ok(f) => Ok(Value::Double(f)),
        Err(source) => Err(DecodeError::InvalidDouble { literal, source }),
    }
}

/// First format that parses wins; otherwise the last format's error.
fn parse_datetime(literal: &str) -> std::result::Result<DateTime<FixedOffset>, chrono::ParseError> {
    let literal = literal.trim();
    NaiveDateTime::parse_from_str(literal, DATETIME_FORMAT)
        .map(|dt| dt.and_utc().fixed_offset())
        .or_else(|_| DateTime::parse_from_str(literal, DATETIME_OFFSET_FORMAT))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(literal, DATETIME_EXTENDED_FORMAT)
                .map(|dt| dt.and_utc().fixed_offset())
        })
}

fn parse_base64(literal: &str) -> std::result::Result<Value, DecodeError> {
    let compact: String = literal.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(Value::Binary(STANDARD.decode(compact)?))
}
