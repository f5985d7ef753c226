//! XML Token Stream
//!
//! The decoder only ever sees start tags, end tags and character data. Any
//! tokenizer that can produce those drives it; [`XmlTokens`] adapts quick-xml.

use std::collections::VecDeque;
use std::fmt;
use std::io::BufRead;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::Reader;

use super::errors::DecodeError;

/// A structural token with an unqualified (namespace-free) element name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Start(String),
    End(String),
    Text(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Start(name) => write!(f, "<{name}>"),
            Token::End(name) => write!(f, "</{name}>"),
            Token::Text(text) => write!(f, "text {text:?}"),
        }
    }
}

/// Source of structural tokens. `Ok(None)` marks the end of the document.
pub trait TokenSource {
    fn next_token(&mut self) -> Result<Option<Token>, DecodeError>;
}

/// Scripted token sources, mostly useful in tests.
impl TokenSource for VecDeque<Token> {
    fn next_token(&mut self) -> Result<Option<Token>, DecodeError> {
        Ok(self.pop_front())
    }
}

/// quick-xml backed token source
pub struct XmlTokens<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl<R: BufRead> XmlTokens<R> {
    pub fn new(input: R) -> Self {
        let mut reader = Reader::from_reader(input);
        // `<nil/>` must arrive as a start/end pair.
        reader.config_mut().expand_empty_elements = true;
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> TokenSource for XmlTokens<R> {
    fn next_token(&mut self) -> Result<Option<Token>, DecodeError> {
        loop {
            self.buf.clear();
            let token = match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => Token::Start(utf8(e.local_name().as_ref())?),
                Event::End(e) => Token::End(utf8(e.local_name().as_ref())?),
                Event::Text(t) => Token::Text(utf8(&t)?),
                Event::CData(t) => Token::Text(utf8(&t)?),
                Event::GeneralRef(r) => Token::Text(resolve_reference(&utf8(&r)?)?),
                Event::Eof => return Ok(None),
                // declarations, comments, PIs, doctypes
                _ => continue,
            };
            return Ok(Some(token));
        }
    }
}

fn utf8(bytes: &[u8]) -> Result<String, DecodeError> {
    Ok(std::str::from_utf8(bytes)?.to_string())
}

/// Resolve `&name;` or `&#NN;` / `&#xHH;` to its replacement text.
fn resolve_reference(name: &str) -> Result<String, DecodeError> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => number.parse().ok(),
        };
        return code
            .and_then(char::from_u32)
            .map(String::from)
            .ok_or_else(|| DecodeError::UnknownEntity(name.to_string()));
    }
    resolve_predefined_entity(name)
        .map(str::to_string)
        .ok_or_else(|| DecodeError::UnknownEntity(name.to_string()))
}
