//! Forward-only byte cursor over an in-memory SEG-D record.

use crate::error::{Result, SegdError};

/// Sequential reader over a byte slice.
///
/// Every block reader is written purely in terms of "read the next k
/// bytes" in fixed, known order; there is no seeking and no re-reading.
#[derive(Debug)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Reads exactly `n` bytes, advancing the cursor.
    pub fn read(&mut self, n: usize) -> Result<&'a [u8]> {
        let remaining = self.buf.len() - self.pos;
        if n > remaining {
            return Err(SegdError::UnexpectedEndOfStream {
                needed: n,
                remaining,
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Total bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left in the underlying slice.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_reads() {
        let data = [1u8, 2, 3, 4, 5];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read(2).unwrap(), &[1, 2]);
        assert_eq!(cursor.read(3).unwrap(), &[3, 4, 5]);
        assert_eq!(cursor.position(), 5);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_exhaustion() {
        let data = [0u8; 4];
        let mut cursor = ByteCursor::new(&data);
        cursor.read(3).unwrap();
        let err = cursor.read(2).unwrap_err();
        assert!(matches!(
            err,
            SegdError::UnexpectedEndOfStream {
                needed: 2,
                remaining: 1
            }
        ));
        // A failed read consumes nothing
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn test_zero_length_read() {
        let mut cursor = ByteCursor::new(&[]);
        assert_eq!(cursor.read(0).unwrap(), &[] as &[u8]);
    }
}
