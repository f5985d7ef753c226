//! methodCall / methodResponse Envelopes
//!
//! Request and response framing around a `params` list. Arguments inside an
//! envelope are always written with explicit type tags.

use std::io::{BufRead, Write};

use serde::ser::{self, Impossible, Serialize};

use super::decode::Decoder;
use super::encode::Encoder;
use super::errors::{DecodeError, EncodeError};
use super::fault::Fault;
use super::tokens::{TokenSource, XmlTokens};
use crate::error::Result;
use crate::value::{Array, Value};

const XML_DECLARATION: &str = "<?xml version=\"1.0\"?>";

const NOT_A_PARAM_LIST: &str = "parameters must be a tuple or sequence";

/// A decoded request
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method_name: String,
    pub params: Array,
}

/// Either side of an exchange
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Call(MethodCall),
    Response(Array),
}

/// Write a `methodCall` for `method` with `params` as its arguments.
///
/// `params` must serialize as a sequence or tuple; `()` means no arguments.
/// Byte arguments go in [`serde_bytes::Bytes`] or [`serde_bytes::ByteBuf`]
/// to be sent as `<base64>`.
pub fn write_call<W, P>(writer: W, method: &str, params: &P) -> std::result::Result<(), EncodeError>
where
    W: Write,
    P: Serialize + ?Sized,
{
    let mut enc = Encoder::new(writer, true);
    enc.raw(XML_DECLARATION)?;
    enc.raw("<methodCall><methodName>")?;
    enc.escaped(method)?;
    enc.raw("</methodName>")?;
    write_params(&mut enc, params)?;
    enc.raw("</methodCall>")
}

pub fn marshal_call<P: Serialize + ?Sized>(method: &str, params: &P) -> std::result::Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    write_call(&mut buf, method, params)?;
    Ok(buf)
}

/// Write a successful `methodResponse` carrying `params`.
pub fn write_response<W, P>(writer: W, params: &P) -> std::result::Result<(), EncodeError>
where
    W: Write,
    P: Serialize + ?Sized,
{
    let mut enc = Encoder::new(writer, true);
    enc.raw(XML_DECLARATION)?;
    enc.raw("<methodResponse>")?;
    write_params(&mut enc, params)?;
    enc.raw("</methodResponse>")
}

pub fn marshal_response<P: Serialize + ?Sized>(params: &P) -> std::result::Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    write_response(&mut buf, params)?;
    Ok(buf)
}

/// Write a `methodResponse` carrying `fault` in place of a params list.
pub fn write_fault<W: Write>(writer: W, fault: &Fault) -> std::result::Result<(), EncodeError> {
    let mut enc = Encoder::new(writer, true);
    enc.raw(XML_DECLARATION)?;
    enc.raw("<methodResponse><fault><value>")?;
    fault.serialize(&mut enc)?;
    enc.raw("</value></fault></methodResponse>")
}

pub fn marshal_fault(fault: &Fault) -> std::result::Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    write_fault(&mut buf, fault)?;
    Ok(buf)
}

fn write_params<W: Write, P: Serialize + ?Sized>(
    enc: &mut Encoder<W>,
    params: &P,
) -> std::result::Result<(), EncodeError> {
    enc.raw("<params>")?;
    params.serialize(ParamsEncoder { enc: &mut *enc })?;
    enc.raw("</params>")
}

/// Decode a request or response document.
///
/// A `fault` in place of the params list comes back as [`crate::Error::Fault`].
pub fn unmarshal<R: BufRead>(input: R) -> Result<Message> {
    let mut decoder = Decoder::new(XmlTokens::new(input));
    match decoder.next_start()?.as_str() {
        "methodResponse" => Ok(Message::Response(params_then_close(&mut decoder, "methodResponse")?)),
        "methodCall" => {
            if decoder.next_start()? != "methodName" {
                return Err(DecodeError::MissingEnvelope("methodName").into());
            }
            let method_name = decoder.text()?.trim().to_string();
            let params = params_then_close(&mut decoder, "methodCall")?;
            Ok(Message::Call(MethodCall { method_name, params }))
        }
        _ => Err(DecodeError::MissingEnvelope("methodResponse").into()),
    }
}

/// Decode a response document into its result list.
pub fn read_response<R: BufRead>(input: R) -> Result<Array> {
    match unmarshal(input)? {
        Message::Response(params) => Ok(params),
        Message::Call(_) => Err(DecodeError::MissingEnvelope("methodResponse").into()),
    }
}

/// Decode a request document.
pub fn read_call<R: BufRead>(input: R) -> Result<MethodCall> {
    match unmarshal(input)? {
        Message::Call(call) => Ok(call),
        Message::Response(_) => Err(DecodeError::MissingEnvelope("methodCall").into()),
    }
}

fn params_then_close<S: TokenSource>(decoder: &mut Decoder<S>, envelope: &'static str) -> Result<Array> {
    let params = match decoder.decode_next()?.value {
        Value::Array(params) => params,
        other => return Err(DecodeError::NotAnArray(other.kind()).into()),
    };
    decoder.close(envelope)?;
    Ok(params)
}

/// Accepts only a sequence-shaped value and writes each element as a `<param>`.
struct ParamsEncoder<'a, W> {
    enc: &'a mut Encoder<W>,
}

struct ParamList<'a, W> {
    enc: &'a mut Encoder<W>,
}

impl<'a, W: Write> ser::Serializer for ParamsEncoder<'a, W> {
    type Ok = ();
    type Error = EncodeError;
    type SerializeSeq = ParamList<'a, W>;
    type SerializeTuple = ParamList<'a, W>;
    type SerializeTupleStruct = ParamList<'a, W>;
    type SerializeTupleVariant = Impossible<(), EncodeError>;
    type SerializeMap = Impossible<(), EncodeError>;
    type SerializeStruct = Impossible<(), EncodeError>;
    type SerializeStructVariant = Impossible<(), EncodeError>;

    fn serialize_unit(self) -> std::result::Result<(), EncodeError> {
        Ok(())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> std::result::Result<(), EncodeError> {
        value.serialize(self)
    }

    fn serialize_seq(self, _len: Option<usize>) -> std::result::Result<ParamList<'a, W>, EncodeError> {
        Ok(ParamList { enc: self.enc })
    }

    fn serialize_tuple(self, _len: usize) -> std::result::Result<ParamList<'a, W>, EncodeError> {
        Ok(ParamList { enc: self.enc })
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<ParamList<'a, W>, EncodeError> {
        Ok(ParamList { enc: self.enc })
    }

    fn serialize_char(self, _v: char) -> std::result::Result<(), EncodeError> {
        Err(EncodeError::UnsupportedType(NOT_A_PARAM_LIST))
    }

    fn serialize_str(self, _v: &str) -> std::result::Result<(), EncodeError> {
        Err(EncodeError::UnsupportedType(NOT_A_PARAM_LIST))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> std::result::Result<(), EncodeError> {
        Err(EncodeError::UnsupportedType(NOT_A_PARAM_LIST))
    }

    reject_scalars!(NOT_A_PARAM_LIST);
    reject_compounds!(NOT_A_PARAM_LIST);
}

impl<W: Write> ParamList<'_, W> {
    fn param<T: Serialize + ?Sized>(&mut self, value: &T) -> std::result::Result<(), EncodeError> {
        self.enc.raw("<param><value>")?;
        value.serialize(&mut *self.enc)?;
        self.enc.raw("</value></param>")
    }
}

impl<W: Write> ser::SerializeSeq for ParamList<'_, W> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> std::result::Result<(), EncodeError> {
        self.param(value)
    }

    fn end(self) -> std::result::Result<(), EncodeError> {
        Ok(())
    }
}

impl<W: Write> ser::SerializeTuple for ParamList<'_, W> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> std::result::Result<(), EncodeError> {
        self.param(value)
    }

    fn end(self) -> std::result::Result<(), EncodeError> {
        Ok(())
    }
}

impl<W: Write> ser::SerializeTupleStruct for ParamList<'_, W> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> std::result::Result<(), EncodeError> {
        self.param(value)
    }

    fn end(self) -> std::result::Result<(), EncodeError> {
        Ok(())
    }
}
