//! Markup Encoder
//!
//! A `serde::Serializer` that writes XML-RPC markup. serde's data model is
//! the set of kinds we dispatch on: maps and named-field structs become
//! `<struct>`, sequences and tuples become `<array>`, bytes become
//! `<base64>`, and anything without an XML-RPC form is rejected with
//! [`EncodeError::UnsupportedType`].
//!
//! With `typed` off, integers, doubles and strings are written as bare text.
//! Struct fields are always typed.

use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use quick_xml::escape::escape;
use serde::ser::{self, Impossible, Serialize, Serializer};

use super::errors::EncodeError;

/// Wire format written for `dateTime.iso8601`
pub const DATETIME_FORMAT: &str = "%Y%m%dT%H:%M:%S";

/// Newtype name [`crate::Value`] uses to mark a preformatted timestamp.
pub(crate) const DATETIME_NEWTYPE: &str = "$xmlrpc_wire::DateTime";

const NON_STRING_KEY: &str = "non-string map key";

type Result<T> = std::result::Result<T, EncodeError>;

/// Encode `value` into `writer`.
///
/// Only values that serialize as bytes become `<base64>`. serde reports a bare
/// `Vec<u8>` or `&[u8]` as a sequence, which encodes as an `<array>` of ints;
/// wrap byte data in [`serde_bytes::Bytes`], [`serde_bytes::ByteBuf`] or
/// [`crate::Value::Binary`].
pub fn to_writer<W: Write, T: Serialize + ?Sized>(writer: W, value: &T, typed: bool) -> Result<()> {
    value.serialize(&mut Encoder::new(writer, typed))
}

/// Encode `value` into a string. Byte data must be wrapped as for [`to_writer`].
pub fn to_string<T: Serialize + ?Sized>(value: &T, typed: bool) -> Result<String> {
    let mut buf = Vec::new();
    to_writer(&mut buf, value, typed)?;
    String::from_utf8(buf).map_err(|e| EncodeError::Custom(e.to_string()))
}

/// XML-RPC markup writer
pub struct Encoder<W> {
    writer: W,
    typed: bool,
}

impl<W: Write> Encoder<W> {
    pub fn new(writer: W, typed: bool) -> Self {
        Self { writer, typed }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub(crate) fn raw(&mut self, markup: &str) -> Result<()> {
        self.writer.write_all(markup.as_bytes())?;
        Ok(())
    }

    pub(crate) fn escaped(&mut self, text: &str) -> Result<()> {
        self.raw(&escape(text))
    }

    fn scalar(&mut self, tag: &str, text: &str) -> Result<()> {
        if self.typed {
            write!(self.writer, "<{tag}>{text}</{tag}>")?;
            Ok(())
        } else {
            self.raw(text)
        }
    }

    fn integer<I: TryInto<i64>>(&mut self, value: I) -> Result<()> {
        let value: i64 = value
            .try_into()
            .map_err(|_| EncodeError::UnsupportedType("integer outside the i64 range"))?;
        self.scalar("int", &value.to_string())
    }

    fn double(&mut self, finite: bool, text: String) -> Result<()> {
        if !finite {
            return Err(EncodeError::UnsupportedType("non-finite float"));
        }
        self.scalar("double", &text)
    }

    fn with_typed<T: Serialize + ?Sized>(&mut self, typed: bool, value: &T) -> Result<()> {
        let ambient = std::mem::replace(&mut self.typed, typed);
        let result = value.serialize(&mut *self);
        self.typed = ambient;
        result
    }
}

impl<'a, W: Write> ser::Serializer for &'a mut Encoder<W> {
    type Ok = ();
    type Error = EncodeError;
    type SerializeSeq = Compound<'a, W>;
    type SerializeTuple = Compound<'a, W>;
    type SerializeTupleStruct = Compound<'a, W>;
    type SerializeTupleVariant = Impossible<(), EncodeError>;
    type SerializeMap = Compound<'a, W>;
    type SerializeStruct = Compound<'a, W>;
    type SerializeStructVariant = Impossible<(), EncodeError>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.raw(if v { "<boolean>1</boolean>" } else { "<boolean>0</boolean>" })
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.integer(v)
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.integer(v)
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.integer(v)
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.integer(v)
    }

    fn serialize_i128(self, v: i128) -> Result<()> {
        self.integer(v)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.integer(v)
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.integer(v)
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.integer(v)
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.integer(v)
    }

    fn serialize_u128(self, v: u128) -> Result<()> {
        self.integer(v)
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.double(v.is_finite(), v.to_string())
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.double(v.is_finite(), v.to_string())
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.serialize_str(v.encode_utf8(&mut [0; 4]))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        if self.typed {
            self.raw("<string>")?;
            self.escaped(v)?;
            self.raw("</string>")
        } else {
            self.escaped(v)
        }
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.raw("<base64>")?;
        self.raw(&STANDARD.encode(v))?;
        self.raw("</base64>")
    }

    fn serialize_none(self) -> Result<()> {
        self.raw("<nil/>")
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.raw("<nil/>")
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.raw("<nil/>")
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<()> {
        if name == DATETIME_NEWTYPE {
            self.raw("<dateTime.iso8601>")?;
            self.with_typed(false, value)?;
            return self.raw("</dateTime.iso8601>");
        }
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()> {
        Err(EncodeError::UnsupportedType("enum variant with data"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Compound<'a, W>> {
        self.raw("<array><data>")?;
        Ok(Compound { enc: self })
    }

    fn serialize_tuple(self, len: usize) -> Result<Compound<'a, W>> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<Compound<'a, W>> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(EncodeError::UnsupportedType("enum variant with data"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Compound<'a, W>> {
        self.raw("<struct>")?;
        Ok(Compound { enc: self })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Compound<'a, W>> {
        self.raw("<struct>")?;
        Ok(Compound { enc: self })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(EncodeError::UnsupportedType("enum variant with data"))
    }
}

/// Open `<array>` or `<struct>` being filled in
pub struct Compound<'a, W> {
    enc: &'a mut Encoder<W>,
}

impl<W: Write> ser::SerializeSeq for Compound<'_, W> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.enc.raw("<value>")?;
        value.serialize(&mut *self.enc)?;
        self.enc.raw("</value>")
    }

    fn end(self) -> Result<()> {
        self.enc.raw("</data></array>")
    }
}

impl<W: Write> ser::SerializeTuple for Compound<'_, W> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<()> {
        ser::SerializeSeq::end(self)
    }
}

impl<W: Write> ser::SerializeTupleStruct for Compound<'_, W> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<()> {
        ser::SerializeSeq::end(self)
    }
}

impl<W: Write> ser::SerializeMap for Compound<'_, W> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<()> {
        self.enc.raw("<member><name>")?;
        key.serialize(MemberName { enc: &mut *self.enc })?;
        self.enc.raw("</name><value>")
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.enc)?;
        self.enc.raw("</value></member>")
    }

    fn end(self) -> Result<()> {
        self.enc.raw("</struct>")
    }
}

impl<W: Write> ser::SerializeStruct for Compound<'_, W> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.enc.raw("<member><name>")?;
        self.enc.escaped(key)?;
        self.enc.raw("</name><value>")?;
        self.enc.with_typed(true, value)?;
        self.enc.raw("</value></member>")
    }

    fn end(self) -> Result<()> {
        self.enc.raw("</struct>")
    }
}

/// Writes a map key as member name text. Only strings qualify.
struct MemberName<'a, W> {
    enc: &'a mut Encoder<W>,
}

impl<W: Write> ser::Serializer for MemberName<'_, W> {
    type Ok = ();
    type Error = EncodeError;
    type SerializeSeq = Impossible<(), EncodeError>;
    type SerializeTuple = Impossible<(), EncodeError>;
    type SerializeTupleStruct = Impossible<(), EncodeError>;
    type SerializeTupleVariant = Impossible<(), EncodeError>;
    type SerializeMap = Impossible<(), EncodeError>;
    type SerializeStruct = Impossible<(), EncodeError>;
    type SerializeStructVariant = Impossible<(), EncodeError>;

    fn serialize_str(self, v: &str) -> Result<()> {
        self.enc.escaped(v)
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.enc.escaped(v.encode_utf8(&mut [0; 4]))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.enc.escaped(variant)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Err(EncodeError::UnsupportedType(NON_STRING_KEY))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(EncodeError::UnsupportedType(NON_STRING_KEY))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(EncodeError::UnsupportedType(NON_STRING_KEY))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(EncodeError::UnsupportedType(NON_STRING_KEY))
    }

    reject_scalars!(NON_STRING_KEY);
    reject_compounds!(NON_STRING_KEY);
}
