//! Scalar data types carried by nodes and tensors.
//!
//! `Float` and the integer types are 32-bit, little-endian; `Bool` is
//! represented as a 32-bit integer 0/1. `None` is the type of control and
//! memory-declaration nodes that produce no value.

use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum DataType {
    Float,
    Int,
    Uint,
    Bool,
    None,
}

impl DataType {
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Float | DataType::Int | DataType::Uint)
    }

    pub fn is_integral(self) -> bool {
        matches!(self, DataType::Int | DataType::Uint | DataType::Bool)
    }

    /// Encode a constant's value as the little-endian 4-byte inline payload.
    pub fn encode_f32(value: f32) -> [u8; 4] {
        let mut buf = [0u8; 4];
        LittleEndian::write_f32(&mut buf, value);
        buf
    }

    pub fn encode_i32(value: i32) -> [u8; 4] {
        let mut buf = [0u8; 4];
        LittleEndian::write_i32(&mut buf, value);
        buf
    }

    pub fn encode_u32(value: u32) -> [u8; 4] {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, value);
        buf
    }

    pub fn encode_bool(value: bool) -> [u8; 4] {
        Self::encode_u32(if value { 1 } else { 0 })
    }

    pub fn decode_f32(bits: [u8; 4]) -> f32 {
        LittleEndian::read_f32(&bits)
    }

    pub fn decode_i32(bits: [u8; 4]) -> i32 {
        LittleEndian::read_i32(&bits)
    }

    pub fn decode_u32(bits: [u8; 4]) -> u32 {
        LittleEndian::read_u32(&bits)
    }

    pub fn decode_bool(bits: [u8; 4]) -> bool {
        Self::decode_u32(bits) != 0
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::Float => "float",
            DataType::Int => "int",
            DataType::Uint => "uint",
            DataType::Bool => "bool",
            DataType::None => "none",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f32_round_trips_through_the_inline_payload() {
        let bits = DataType::encode_f32(2.0);
        assert_eq!(DataType::decode_f32(bits), 2.0);
    }

    #[test]
    fn bool_is_encoded_as_zero_or_one() {
        assert_eq!(DataType::decode_u32(DataType::encode_bool(true)), 1);
        assert_eq!(DataType::decode_u32(DataType::encode_bool(false)), 0);
    }
}
