// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read/write cursors for message bodies.
//!
//! All integers are big-endian (network order). Strings and values are
//! prefixed with a `u32` byte length. Handle arrays carry no prefix: their
//! element count travels in the header.

use super::codec::{DecodeError, EncodeError};

/// Generate big-endian read methods for primitive types.
///
/// Each generated method checks the remaining length first and reports the
/// offending offset on underflow.
macro_rules! impl_read_be {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> Result<$type, DecodeError> {
            let bytes = self.take($size)?;
            let mut raw = [0u8; $size];
            raw.copy_from_slice(bytes);
            Ok(<$type>::from_be_bytes(raw))
        }
    };
}

/// Generate big-endian write methods for primitive types.
macro_rules! impl_write_be {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self, value: $type) {
            self.buffer.extend_from_slice(&value.to_be_bytes());
        }
    };
}

/// Bounds-checked reader over a received body.
pub struct Cursor<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    impl_read_be!(read_u8, u8, 1);
    impl_read_be!(read_u32, u32, 4);
    impl_read_be!(read_u64, u64, 8);

    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::Malformed {
                offset: self.offset - 1,
                reason: format!("invalid boolean {}", other),
            }),
        }
    }

    /// Length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let start = self.offset;
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::Malformed {
            offset: start,
            reason: "string is not valid UTF-8".into(),
        })
    }

    /// Length-prefixed opaque value.
    pub fn read_value(&mut self) -> Result<Vec<u8>, DecodeError> {
        let len = self.read_u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    /// `count` raw handles, the count coming from the header.
    pub fn read_handles<H: From<u32>>(&mut self, count: usize) -> Result<Vec<H>, DecodeError> {
        // Refuse counts the remaining bytes cannot possibly hold before allocating.
        if count.saturating_mul(4) > self.remaining() {
            return Err(DecodeError::Malformed {
                offset: self.offset,
                reason: format!("handle array of {} exceeds body", count),
            });
        }
        let mut handles = Vec::with_capacity(count);
        for _ in 0..count {
            handles.push(H::from(self.read_u32()?));
        }
        Ok(handles)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if len > self.remaining() {
            return Err(DecodeError::Truncated {
                offset: self.offset,
                needed: len,
            });
        }
        let slice = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }
}

/// A length or element count as carried on the wire.
pub fn wire_len(len: usize) -> Result<u32, EncodeError> {
    u32::try_from(len).map_err(|_| EncodeError::LengthOverflow { len })
}

/// Growable writer for an outgoing body.
#[derive(Debug, Default)]
pub struct CursorMut {
    buffer: Vec<u8>,
}

impl CursorMut {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    impl_write_be!(write_u8, u8);
    impl_write_be!(write_u32, u32);
    impl_write_be!(write_u64, u64);

    pub fn write_f64(&mut self, value: f64) {
        self.write_u64(value.to_bits());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    pub fn write_string(&mut self, value: &str) -> Result<(), EncodeError> {
        self.write_u32(wire_len(value.len())?);
        self.buffer.extend_from_slice(value.as_bytes());
        Ok(())
    }

    pub fn write_value(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        self.write_u32(wire_len(value.len())?);
        self.buffer.extend_from_slice(value);
        Ok(())
    }

    pub fn write_handles<H: Copy + Into<u32>>(&mut self, handles: &[H]) {
        for handle in handles {
            self.write_u32((*handle).into());
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handles::AttributeHandle;

    #[test]
    fn test_primitives_are_big_endian() {
        let mut writer = CursorMut::new();
        writer.write_u32(0x0102_0304);
        assert_eq!(writer.into_inner(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_string_and_value_prefixes() {
        let mut writer = CursorMut::new();
        writer.write_string("tag").unwrap();
        writer.write_value(&[]).unwrap();
        let bytes = writer.into_inner();

        let mut cursor = Cursor::new(&bytes);
        assert_eq!(cursor.read_string().unwrap(), "tag");
        assert!(cursor.read_value().unwrap().is_empty());
        assert!(cursor.is_eof());
    }

    #[test]
    fn test_read_overflow_reports_offset() {
        let bytes = [0u8, 0, 0, 9, b'x'];
        let mut cursor = Cursor::new(&bytes);
        match cursor.read_string() {
            Err(DecodeError::Truncated { offset, needed }) => {
                assert_eq!(offset, 4);
                assert_eq!(needed, 9);
            }
            other => panic!("Expected Truncated, got {:?}", other),
        }
    }

    #[test]
    fn test_handle_count_larger_than_body_is_rejected() {
        let bytes = [0u8; 8];
        let mut cursor = Cursor::new(&bytes);
        let result: Result<Vec<AttributeHandle>, _> = cursor.read_handles(1_000_000);
        assert!(matches!(result, Err(DecodeError::Malformed { .. })));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_length_beyond_u32_is_refused() {
        assert_eq!(wire_len(u32::MAX as usize), Ok(u32::MAX));
        let len = u32::MAX as usize + 1;
        assert_eq!(wire_len(len), Err(EncodeError::LengthOverflow { len }));
    }

    #[test]
    fn test_invalid_bool() {
        let bytes = [7u8];
        let mut cursor = Cursor::new(&bytes);
        assert!(matches!(
            cursor.read_bool(),
            Err(DecodeError::Malformed { offset: 0, .. })
        ));
    }
}
