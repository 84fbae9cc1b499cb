use std::path::Path;

use serde::ser::{Impossible, Serialize, SerializeSeq, SerializeTuple, Serializer};

use crate::error::{Error, Result};

/// Turns a value into the bytes stored in a golden file.
pub trait Marshal {
    fn marshal<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<u8>>;
}

impl<M: Marshal> Marshal for &M {
    fn marshal<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<u8>> {
        (**self).marshal(value)
    }
}

/// Passthrough for text and byte buffers.
#[derive(Debug, Default, Clone, Copy)]
pub struct Raw;

impl Marshal for Raw {
    fn marshal<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<u8>> {
        value.serialize(RawSerializer)
    }
}

/// serde_json encoding, compact unless built with [`Json::pretty`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Json {
    pretty: bool,
}

impl Json {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Marshal for Json {
    fn marshal<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        // None and () both end up as a bare null
        if bytes == b"null" {
            return Err(Error::InvalidType);
        }
        Ok(bytes)
    }
}

/// quick-xml encoding; the root element is named after the serialized type.
#[derive(Debug, Default, Clone, Copy)]
pub struct Xml;

impl Marshal for Xml {
    fn marshal<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<u8>> {
        let text = quick_xml::se::to_string(value)?;
        if text.is_empty() {
            return Err(Error::InvalidType);
        }
        Ok(text.into_bytes())
    }
}

/// Built-in encoders, selectable by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Raw,
    Json,
    Xml,
}

impl Format {
    /// Picks the encoder matching the extension of `path`.
    pub fn for_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "json" => Ok(Format::Json),
            "xml" => Ok(Format::Xml),
            "txt" | "golden" => Ok(Format::Raw),
            _ => Err(Error::UnknownExtension { extension: ext }),
        }
    }
}

impl Marshal for Format {
    fn marshal<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<u8>> {
        match self {
            Format::Raw => Raw.marshal(value),
            Format::Json => Json::default().marshal(value),
            Format::Xml => Xml.marshal(value),
        }
    }
}

fn unsupported(kind: &'static str) -> Error {
    Error::UnsupportedType { kind }
}

macro_rules! reject {
    ($($method:ident($ty:ty) => $kind:expr;)*) => {
        $(
            fn $method(self, _: $ty) -> Result<Self::Ok> {
                Err(unsupported($kind))
            }
        )*
    };
}

/// Accepts strings, bytes and sequences of `u8`; rejects every other shape.
struct RawSerializer;

impl Serializer for RawSerializer {
    type Ok = Vec<u8>;
    type Error = Error;
    type SerializeSeq = ByteSeq;
    type SerializeTuple = ByteSeq;
    type SerializeTupleStruct = Impossible<Vec<u8>, Error>;
    type SerializeTupleVariant = Impossible<Vec<u8>, Error>;
    type SerializeMap = Impossible<Vec<u8>, Error>;
    type SerializeStruct = Impossible<Vec<u8>, Error>;
    type SerializeStructVariant = Impossible<Vec<u8>, Error>;

    reject! {
        serialize_bool(bool) => "bool";
        serialize_i8(i8) => "integer";
        serialize_i16(i16) => "integer";
        serialize_i32(i32) => "integer";
        serialize_i64(i64) => "integer";
        serialize_u8(u8) => "integer";
        serialize_u16(u16) => "integer";
        serialize_u32(u32) => "integer";
        serialize_u64(u64) => "integer";
        serialize_f32(f32) => "float";
        serialize_f64(f64) => "float";
        serialize_unit_struct(&'static str) => "unit struct";
    }

    fn serialize_char(self, v: char) -> Result<Vec<u8>> {
        Ok(v.to_string().into_bytes())
    }

    fn serialize_str(self, v: &str) -> Result<Vec<u8>> {
        Ok(v.as_bytes().to_vec())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Vec<u8>> {
        Ok(v.to_vec())
    }

    fn serialize_none(self) -> Result<Vec<u8>> {
        Err(Error::InvalidType)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Vec<u8>> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Vec<u8>> {
        Err(Error::InvalidType)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
    ) -> Result<Vec<u8>> {
        Err(unsupported("enum"))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Vec<u8>> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Vec<u8>> {
        Err(unsupported("enum"))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<ByteSeq> {
        Ok(ByteSeq(Vec::with_capacity(len.unwrap_or(0))))
    }

    fn serialize_tuple(self, len: usize) -> Result<ByteSeq> {
        Ok(ByteSeq(Vec::with_capacity(len)))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(unsupported("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(unsupported("enum"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(unsupported("map"))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(unsupported("struct"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(unsupported("enum"))
    }
}

/// Collects the elements of `Vec<u8>`, `&[u8]` and `[u8; N]`.
struct ByteSeq(Vec<u8>);

impl SerializeSeq for ByteSeq {
    type Ok = Vec<u8>;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.0.push(value.serialize(ByteSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Vec<u8>> {
        Ok(self.0)
    }
}

impl SerializeTuple for ByteSeq {
    type Ok = Vec<u8>;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Vec<u8>> {
        Ok(self.0)
    }
}

const NON_BYTE_ELEMENT: &str = "sequence of non-byte values";

/// Element serializer for [`ByteSeq`]: only `u8` gets through.
struct ByteSerializer;

impl Serializer for ByteSerializer {
    type Ok = u8;
    type Error = Error;
    type SerializeSeq = Impossible<u8, Error>;
    type SerializeTuple = Impossible<u8, Error>;
    type SerializeTupleStruct = Impossible<u8, Error>;
    type SerializeTupleVariant = Impossible<u8, Error>;
    type SerializeMap = Impossible<u8, Error>;
    type SerializeStruct = Impossible<u8, Error>;
    type SerializeStructVariant = Impossible<u8, Error>;

    reject! {
        serialize_bool(bool) => NON_BYTE_ELEMENT;
        serialize_i8(i8) => NON_BYTE_ELEMENT;
        serialize_i16(i16) => NON_BYTE_ELEMENT;
        serialize_i32(i32) => NON_BYTE_ELEMENT;
        serialize_i64(i64) => NON_BYTE_ELEMENT;
        serialize_u16(u16) => NON_BYTE_ELEMENT;
        serialize_u32(u32) => NON_BYTE_ELEMENT;
        serialize_u64(u64) => NON_BYTE_ELEMENT;
        serialize_f32(f32) => NON_BYTE_ELEMENT;
        serialize_f64(f64) => NON_BYTE_ELEMENT;
        serialize_char(char) => NON_BYTE_ELEMENT;
        serialize_str(&str) => NON_BYTE_ELEMENT;
        serialize_bytes(&[u8]) => NON_BYTE_ELEMENT;
        serialize_unit_struct(&'static str) => NON_BYTE_ELEMENT;
    }

    fn serialize_u8(self, v: u8) -> Result<u8> {
        Ok(v)
    }

    fn serialize_none(self) -> Result<u8> {
        Err(unsupported(NON_BYTE_ELEMENT))
    }

    fn serialize_some<T: ?Sized + Serialize>(self, _value: &T) -> Result<u8> {
        Err(unsupported(NON_BYTE_ELEMENT))
    }

    fn serialize_unit(self) -> Result<u8> {
        Err(unsupported(NON_BYTE_ELEMENT))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
    ) -> Result<u8> {
        Err(unsupported(NON_BYTE_ELEMENT))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _value: &T,
    ) -> Result<u8> {
        Err(unsupported(NON_BYTE_ELEMENT))
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<u8> {
        Err(unsupported(NON_BYTE_ELEMENT))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(unsupported(NON_BYTE_ELEMENT))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(unsupported(NON_BYTE_ELEMENT))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(unsupported(NON_BYTE_ELEMENT))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(unsupported(NON_BYTE_ELEMENT))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(unsupported(NON_BYTE_ELEMENT))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(unsupported(NON_BYTE_ELEMENT))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(unsupported(NON_BYTE_ELEMENT))
    }
}
