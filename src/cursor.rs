use nom::{
    IResult,
    bytes::complete::take,
    number::complete::{be_f32, be_f64, be_i32, be_i64, be_u16, be_u32, u8},
};

use crate::error::{ClassError, Result};

pub(crate) const UNEXPECTED_END: &str = "Unexpected end of data while parsing class";

/// Big-endian reader over an untrusted byte slice.
///
/// Every read is bounded by the bytes that remain; callers that need a
/// more specific error than [`UNEXPECTED_END`] check up front with
/// [`ByteCursor::ensure`].
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    input: &'a [u8],
    consumed: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, consumed: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.input.len()
    }

    pub fn position(&self) -> usize {
        self.consumed
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Unread bytes, without advancing.
    pub fn rest(&self) -> &'a [u8] {
        self.input
    }

    /// Fails with a truncation error carrying `message` unless at least
    /// `required` bytes remain.
    pub fn ensure(&self, required: usize, message: &str) -> Result<()> {
        if self.input.len() < required {
            return Err(ClassError::truncation(message));
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_with(u8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_with(be_u16)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_with(be_u32)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_with(be_i32)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_with(be_i64)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_with(be_f32)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_with(be_f64)
    }

    /// Borrows the next `len` bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        self.read_with(|input| take(len)(input))
    }

    /// Copies the next `len` bytes into a fresh allocation.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let bytes = self.take(len)?;
        let mut copy = Vec::new();
        copy.try_reserve_exact(len)
            .map_err(|_| ClassError::allocation(len))?;
        copy.extend_from_slice(bytes);
        Ok(copy)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    fn read_with<T>(&mut self, mut parser: impl FnMut(&'a [u8]) -> IResult<&'a [u8], T>) -> Result<T> {
        match parser(self.input) {
            Ok((rest, value)) => {
                self.consumed += self.input.len() - rest.len();
                self.input = rest;
                Ok(value)
            }
            Err(_) => Err(ClassError::truncation(UNEXPECTED_END)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn reads_big_endian_and_tracks_remaining() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_u8().unwrap(), 0x01);
        assert_eq!(cursor.read_u16().unwrap(), 0x0203);
        assert_eq!(cursor.read_u32().unwrap(), 0x0405_0607);
        assert_eq!(cursor.remaining(), 0);
        assert_eq!(cursor.position(), 7);
        assert!(cursor.is_empty());
    }

    #[test]
    fn never_reads_past_the_end() {
        let data = [0xAB, 0xCD, 0xEF];
        let mut cursor = ByteCursor::new(&data);
        let err = cursor.read_u32().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncation);
        // a failed read leaves the cursor where it was
        assert_eq!(cursor.remaining(), 3);
        assert_eq!(cursor.read_u16().unwrap(), 0xABCD);
        assert!(cursor.read_bytes(2).is_err());
        assert_eq!(cursor.read_bytes(1).unwrap(), vec![0xEF]);
    }

    #[test]
    fn ensure_reports_caller_message() {
        let cursor = ByteCursor::new(&[0; 4]);
        assert!(cursor.ensure(4, "short").is_ok());
        let err = cursor.ensure(5, "Unexpected end of field data").unwrap_err();
        assert_eq!(err, ClassError::Truncation("Unexpected end of field data".into()));
    }

    #[test]
    fn floats_are_reinterpreted_from_bits() {
        let mut data = 1.5f32.to_bits().to_be_bytes().to_vec();
        data.extend_from_slice(&(-2.25f64).to_bits().to_be_bytes());
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_f32().unwrap(), 1.5);
        assert_eq!(cursor.read_f64().unwrap(), -2.25);
    }
}
