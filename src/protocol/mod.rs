//! XML-RPC Wire Protocol
//!
//! Token-level decoding, markup encoding, and the `methodCall` /
//! `methodResponse` envelopes built from them.

/// Rejects every scalar kind with `UnsupportedType($reason)`.
macro_rules! reject_scalars {
    (@each $reason:expr; $($method:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method(self, _v: $ty) -> std::result::Result<Self::Ok, Self::Error> {
                Err($crate::protocol::errors::EncodeError::UnsupportedType($reason))
            }
        )*
    };
    ($reason:expr) => {
        reject_scalars!(@each $reason;
            serialize_bool(bool),
            serialize_i8(i8), serialize_i16(i16), serialize_i32(i32), serialize_i64(i64),
            serialize_u8(u8), serialize_u16(u16), serialize_u32(u32), serialize_u64(u64),
            serialize_f32(f32), serialize_f64(f64),
            serialize_bytes(&[u8]),
        );

        fn serialize_none(self) -> std::result::Result<Self::Ok, Self::Error> {
            Err($crate::protocol::errors::EncodeError::UnsupportedType($reason))
        }

        fn serialize_some<T: serde::Serialize + ?Sized>(
            self,
            _value: &T,
        ) -> std::result::Result<Self::Ok, Self::Error> {
            Err($crate::protocol::errors::EncodeError::UnsupportedType($reason))
        }

        fn serialize_unit_struct(
            self,
            _name: &'static str,
        ) -> std::result::Result<Self::Ok, Self::Error> {
            Err($crate::protocol::errors::EncodeError::UnsupportedType($reason))
        }

        fn serialize_newtype_variant<T: serde::Serialize + ?Sized>(
            self,
            _name: &'static str,
            _variant_index: u32,
            _variant: &'static str,
            _value: &T,
        ) -> std::result::Result<Self::Ok, Self::Error> {
            Err($crate::protocol::errors::EncodeError::UnsupportedType($reason))
        }
    };
}

/// Rejects maps, structs and data-carrying enum variants.
macro_rules! reject_compounds {
    ($reason:expr) => {
        fn serialize_map(
            self,
            _len: Option<usize>,
        ) -> std::result::Result<Self::SerializeMap, Self::Error> {
            Err($crate::protocol::errors::EncodeError::UnsupportedType($reason))
        }

        fn serialize_struct(
            self,
            _name: &'static str,
            _len: usize,
        ) -> std::result::Result<Self::SerializeStruct, Self::Error> {
            Err($crate::protocol::errors::EncodeError::UnsupportedType($reason))
        }

        fn serialize_tuple_variant(
            self,
            _name: &'static str,
            _variant_index: u32,
            _variant: &'static str,
            _len: usize,
        ) -> std::result::Result<Self::SerializeTupleVariant, Self::Error> {
            Err($crate::protocol::errors::EncodeError::UnsupportedType($reason))
        }

        fn serialize_struct_variant(
            self,
            _name: &'static str,
            _variant_index: u32,
            _variant: &'static str,
            _len: usize,
        ) -> std::result::Result<Self::SerializeStructVariant, Self::Error> {
            Err($crate::protocol::errors::EncodeError::UnsupportedType($reason))
        }
    };
}

pub mod decode;
pub mod encode;
pub mod envelope;
pub mod errors;
pub mod fault;
pub mod tokens;

pub use decode::{Decoded, Decoder, MAX_DEPTH};
pub use encode::Encoder;
pub use envelope::{
    marshal_call, marshal_fault, marshal_response, read_call, read_response, unmarshal,
    write_call, write_fault, write_response, Message, MethodCall,
};
pub use errors::{DecodeError, EncodeError};
pub use fault::Fault;
pub use tokens::{Token, TokenSource, XmlTokens};
