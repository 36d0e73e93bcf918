use super::error::{Error, Result};
use serde::{
    ser::{self, Impossible},
    Serialize,
};

/// Type name used for marking a newtype as Solidity `bytes`.
///
/// Due to limitations of the [serde::Serializer] trait we cannot represent the
/// solidity types `bytes` and `bytes32` at the same time. `bytes32` and other
/// fixed-size bytes (including `uint256` and `address`, which are written as
/// pre-aligned slots) go through `serialize_bytes`, so the dynamic `bytes` type
/// is wrapped in a newtype struct with this name (see
/// [as_bytes][super::as_bytes]). The characters have no special meaning, they
/// have just been chosen in a way that normal Rust types will never have this
/// name.
pub(super) const MARK_BYTES_NAME: &str = ":$&_BYTES";

const SLOT_SIZE: usize = 32; // bytes

/// Receives the encoded output, one 32 byte slot at a time.
pub trait Writer {
    fn write(&mut self, slot: &[u8]);
}

impl Writer for Vec<u8> {
    fn write(&mut self, slot: &[u8]) {
        self.extend_from_slice(slot);
    }
}

/// Intermediate representation of a value in the Solidity type system.
///
/// Serialization happens in two steps: serde builds a tree of [Token]s, which
/// is then written with the usual head/tail layout. Building the tree first
/// allows computing the offsets of dynamic values without serializing the
/// value multiple times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A single static slot (`uintN`, `intN`, `bool`, `address`, `bytesN`).
    Word([u8; SLOT_SIZE]),
    /// `bytes` or `string`.
    Bytes(Vec<u8>),
    /// Dynamic length array `T[]`.
    Array(Vec<Token>),
    /// Struct, tuple or fixed-size array `T[N]`.
    Tuple(Vec<Token>),
}

impl Token {
    fn is_dynamic(&self) -> bool {
        match self {
            Token::Word(_) => false,
            Token::Bytes(_) | Token::Array(_) => true,
            Token::Tuple(items) => items.iter().any(Token::is_dynamic),
        }
    }

    /// Size this token occupies in the head of the enclosing sequence.
    fn head_len(&self) -> usize {
        if self.is_dynamic() {
            return SLOT_SIZE;
        }
        match self {
            Token::Tuple(items) => items.iter().map(Token::head_len).sum(),
            _ => SLOT_SIZE,
        }
    }

    /// Size of the body, which is inline for static and in the tail for
    /// dynamic tokens.
    fn body_len(&self) -> usize {
        match self {
            Token::Word(_) => SLOT_SIZE,
            Token::Bytes(b) => SLOT_SIZE + padded_len(b.len()),
            Token::Array(items) => SLOT_SIZE + sequence_len(items),
            Token::Tuple(items) => sequence_len(items),
        }
    }

    fn write_body<W: Writer>(&self, writer: &mut W) {
        match self {
            Token::Word(w) => writer.write(w),
            Token::Bytes(b) => {
                writer.write(&usize_word(b.len()));
                for chunk in b.chunks(SLOT_SIZE) {
                    let mut slot = [0u8; SLOT_SIZE];
                    slot[..chunk.len()].copy_from_slice(chunk);
                    writer.write(&slot);
                }
            }
            Token::Array(items) => {
                writer.write(&usize_word(items.len()));
                write_sequence(items, writer);
            }
            Token::Tuple(items) => write_sequence(items, writer),
        }
    }
}

fn padded_len(len: usize) -> usize {
    (len + SLOT_SIZE - 1) / SLOT_SIZE * SLOT_SIZE
}

fn sequence_len(items: &[Token]) -> usize {
    items
        .iter()
        .map(|t| {
            if t.is_dynamic() {
                SLOT_SIZE + t.body_len()
            } else {
                t.head_len()
            }
        })
        .sum()
}

fn usize_word(v: usize) -> [u8; SLOT_SIZE] {
    let mut slot = [0u8; SLOT_SIZE];
    slot[SLOT_SIZE - 8..].copy_from_slice(&(v as u64).to_be_bytes());
    slot
}

fn write_sequence<W: Writer>(items: &[Token], writer: &mut W) {
    // Head: static values inline, offsets (relative to the start of this
    // sequence) for dynamic ones.
    let mut offset: usize = items.iter().map(Token::head_len).sum();
    for item in items {
        if item.is_dynamic() {
            writer.write(&usize_word(offset));
            offset += item.body_len();
        } else {
            item.write_body(writer);
        }
    }
    // Tail
    for item in items.iter().filter(|t| t.is_dynamic()) {
        item.write_body(writer);
    }
}

/// Build the [Token] tree for `value`.
pub fn to_token<T>(value: &T) -> Result<Token>
where
    T: Serialize + ?Sized,
{
    value.serialize(Serializer::default())
}

/// Equivalent of `abi.encode(value)`.
pub fn to_writer<T, W>(value: &T, writer: &mut W) -> Result<()>
where
    T: Serialize + ?Sized,
    W: Writer,
{
    let token = to_token(value)?;
    write_sequence(core::slice::from_ref(&token), writer);
    Ok(())
}

/// Equivalent of `abi.encode(a, b, ...)` where the fields of `value` are the
/// arguments.
///
/// Differs from [to_writer] only for dynamic structs, which are not prefixed
/// with an offset.
pub fn to_fnargs_writer<T, W>(value: &T, writer: &mut W) -> Result<()>
where
    T: Serialize + ?Sized,
    W: Writer,
{
    match to_token(value)? {
        Token::Tuple(items) => write_sequence(&items, writer),
        token => write_sequence(core::slice::from_ref(&token), writer),
    }
    Ok(())
}

pub fn to_vec<T>(value: &T) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    let mut buf = Vec::new();
    to_writer(value, &mut buf)?;
    Ok(buf)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Serializer {
    // Set inside the newtype created by `as_bytes`.
    dynamic_bytes: bool,
}

fn uint_word(bytes: &[u8]) -> Token {
    let mut slot = [0u8; SLOT_SIZE];
    slot[SLOT_SIZE - bytes.len()..].copy_from_slice(bytes);
    Token::Word(slot)
}

fn int_word(bytes: &[u8], negative: bool) -> Token {
    let mut slot = if negative {
        [0xffu8; SLOT_SIZE]
    } else {
        [0u8; SLOT_SIZE]
    };
    slot[SLOT_SIZE - bytes.len()..].copy_from_slice(bytes);
    Token::Word(slot)
}

impl ser::Serializer for Serializer {
    type Ok = Token;
    type Error = Error;

    type SerializeSeq = Compound;
    type SerializeTuple = Compound;
    type SerializeTupleStruct = Compound;
    type SerializeTupleVariant = Impossible<Token, Error>;
    type SerializeMap = Impossible<Token, Error>;
    type SerializeStruct = Compound;
    type SerializeStructVariant = Impossible<Token, Error>;

    fn serialize_bool(self, v: bool) -> Result<Token> {
        Ok(uint_word(&[v as u8]))
    }

    fn serialize_i8(self, v: i8) -> Result<Token> {
        Ok(int_word(&v.to_be_bytes(), v < 0))
    }

    fn serialize_i16(self, v: i16) -> Result<Token> {
        Ok(int_word(&v.to_be_bytes(), v < 0))
    }

    fn serialize_i32(self, v: i32) -> Result<Token> {
        Ok(int_word(&v.to_be_bytes(), v < 0))
    }

    fn serialize_i64(self, v: i64) -> Result<Token> {
        Ok(int_word(&v.to_be_bytes(), v < 0))
    }

    fn serialize_i128(self, v: i128) -> Result<Token> {
        Ok(int_word(&v.to_be_bytes(), v < 0))
    }

    fn serialize_u8(self, v: u8) -> Result<Token> {
        Ok(uint_word(&v.to_be_bytes()))
    }

    fn serialize_u16(self, v: u16) -> Result<Token> {
        Ok(uint_word(&v.to_be_bytes()))
    }

    fn serialize_u32(self, v: u32) -> Result<Token> {
        Ok(uint_word(&v.to_be_bytes()))
    }

    fn serialize_u64(self, v: u64) -> Result<Token> {
        Ok(uint_word(&v.to_be_bytes()))
    }

    fn serialize_u128(self, v: u128) -> Result<Token> {
        Ok(uint_word(&v.to_be_bytes()))
    }

    fn serialize_f32(self, _v: f32) -> Result<Token> {
        Err(Error::TypeNotRepresentable("f32"))
    }

    fn serialize_f64(self, _v: f64) -> Result<Token> {
        Err(Error::TypeNotRepresentable("f64"))
    }

    fn serialize_char(self, _v: char) -> Result<Token> {
        Err(Error::TypeNotRepresentable("char"))
    }

    fn serialize_str(self, v: &str) -> Result<Token> {
        Ok(Token::Bytes(v.as_bytes().to_vec()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Token> {
        if self.dynamic_bytes {
            return Ok(Token::Bytes(v.to_vec()));
        }
        // bytesN is left aligned. Types that need to be right aligned
        // (uint256, address) pass an already aligned 32 byte slot.
        if v.len() > SLOT_SIZE {
            return Err(Error::FixedBytesTooLong(v.len()));
        }
        let mut slot = [0u8; SLOT_SIZE];
        slot[..v.len()].copy_from_slice(v);
        Ok(Token::Word(slot))
    }

    fn serialize_none(self) -> Result<Token> {
        Err(Error::TypeNotRepresentable("Option"))
    }

    fn serialize_some<T>(self, _value: &T) -> Result<Token>
    where
        T: ?Sized + Serialize,
    {
        Err(Error::TypeNotRepresentable("Option"))
    }

    fn serialize_unit(self) -> Result<Token> {
        Err(Error::TypeNotRepresentable("()"))
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Token> {
        Err(Error::TypeNotRepresentable(name))
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<Token> {
        Err(Error::TypeNotRepresentable(name))
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<Token>
    where
        T: ?Sized + Serialize,
    {
        if name == MARK_BYTES_NAME {
            value.serialize(Serializer {
                dynamic_bytes: true,
            })
        } else {
            // A newtype struct is a struct with a single field in Solidity.
            Ok(Token::Tuple(vec![value.serialize(Serializer::default())?]))
        }
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Token>
    where
        T: ?Sized + Serialize,
    {
        Err(Error::TypeNotRepresentable(name))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Compound> {
        Ok(Compound::new(true, len))
    }

    fn serialize_tuple(self, len: usize) -> Result<Compound> {
        Ok(Compound::new(false, Some(len)))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<Compound> {
        Ok(Compound::new(false, Some(len)))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::TypeNotRepresentable(name))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::TypeNotRepresentable("map"))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Compound> {
        Ok(Compound::new(false, Some(len)))
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::TypeNotRepresentable(name))
    }
}

/// Collects the elements of arrays, tuples and structs.
pub struct Compound {
    items: Vec<Token>,
    dynamic_length: bool,
}

impl Compound {
    fn new(dynamic_length: bool, len: Option<usize>) -> Self {
        Compound {
            items: Vec::with_capacity(len.unwrap_or(0)),
            dynamic_length,
        }
    }

    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(value.serialize(Serializer::default())?);
        Ok(())
    }

    fn finish(self) -> Token {
        if self.dynamic_length {
            Token::Array(self.items)
        } else {
            Token::Tuple(self.items)
        }
    }
}

impl ser::SerializeSeq for Compound {
    type Ok = Token;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Token> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for Compound {
    type Ok = Token;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Token> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for Compound {
    type Ok = Token;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Token> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for Compound {
    type Ok = Token;
    type Error = Error;

    fn serialize_field<T>(&mut self, _key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Token> {
        Ok(self.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_tuple_is_inline() {
        let token = to_token(&(1u8, true)).unwrap();
        assert!(!token.is_dynamic());
        assert_eq!(token.head_len(), 64);
    }

    #[test]
    fn nested_dynamic_tuple_is_dynamic() {
        let token = to_token(&(1u8, (2u8, vec![3u8]))).unwrap();
        assert!(token.is_dynamic());
    }

    #[test]
    fn negative_ints_are_sign_extended() {
        let buf = to_vec(&-1i32).unwrap();
        assert_eq!(buf, vec![0xff; 32]);
    }

    #[test]
    fn unsupported_types() {
        assert_eq!(to_vec(&1.5f64), Err(Error::TypeNotRepresentable("f64")));
        assert_eq!(
            to_vec(&Some(1u8)),
            Err(Error::TypeNotRepresentable("Option"))
        );
        assert_eq!(to_vec(&TooLong), Err(Error::FixedBytesTooLong(33)));
    }

    struct TooLong;
    impl Serialize for TooLong {
        fn serialize<S: serde::Serializer>(&self, s: S) -> core::result::Result<S::Ok, S::Error> {
            s.serialize_bytes(&[0u8; 33])
        }
    }
}
