//! Capture and formatting of the TDO bits selected by RMASK.
use std::fmt::Write;

/// Maximum number of captured bits. Further bits are dropped.
pub const CAPTURE_CAPACITY: usize = 256;

/// Fixed capacity store for captured TDO bits.
#[derive(Clone)]
pub struct CaptureBuffer {
    bits: [u8; CAPTURE_CAPACITY],
    len: usize,
}

impl Default for CaptureBuffer {
    fn default() -> Self {
        CaptureBuffer {
            bits: [0; CAPTURE_CAPACITY],
            len: 0,
        }
    }
}

impl std::fmt::Debug for CaptureBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl CaptureBuffer {
    pub fn new() -> CaptureBuffer {
        CaptureBuffer::default()
    }

    /// Append a bit. Returns `false`, dropping the bit, if the buffer is full.
    pub fn push(&mut self, bit: bool) -> bool {
        if self.len == CAPTURE_CAPACITY {
            return false;
        }
        self.bits[self.len] = bit as u8;
        self.len += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == CAPTURE_CAPACITY
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bits[..self.len]
    }

    /// Bit at `index`, or 0 for positions that were never written.
    fn slot(&self, index: isize) -> u32 {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.len)
            .map_or(0, |i| self.bits[i] as u32)
    }
}

impl FromIterator<bool> for CaptureBuffer {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        let mut buffer = CaptureBuffer::new();
        for bit in iter {
            buffer.push(bit);
        }
        buffer
    }
}

/// How the captured bits are printed.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum RmaskFormat {
    /// `<N> rmask bits: b0 b1 ...`
    #[default]
    Decimal,
    /// Hex value, the last captured bit is the most significant.
    HexLittleEndian,
    /// Hex value, the first captured bit is the most significant.
    HexBigEndian,
}

/// Pack the four positions `first..first + 4` into a nibble, the first position ending up in
/// the most significant bit. Little endian reads the sequence back to front.
fn nibble(bits: &CaptureBuffer, first: usize, format: RmaskFormat) -> u32 {
    let n = bits.len() as isize;
    (first..first + 4).fold(0, |value, j| {
        let j = j as isize;
        let index = match format {
            RmaskFormat::HexBigEndian => j,
            _ => n - j - 1,
        };
        (value << 1) | bits.slot(index)
    })
}

/// Render the captured bits.
///
/// In the hex formats a final group of fewer than four bits is packed as if the missing
/// positions held zeros, so they end up in the low bits of the last digit.
pub fn encode(bits: &CaptureBuffer, format: RmaskFormat) -> String {
    let mut out = String::new();
    match format {
        RmaskFormat::Decimal => {
            let _ = write!(out, "{} rmask bits:", bits.len());
            for bit in bits.as_slice() {
                let _ = write!(out, " {}", bit);
            }
        }
        RmaskFormat::HexLittleEndian | RmaskFormat::HexBigEndian => {
            out.push_str("0x");
            for first in (0..bits.len()).step_by(4) {
                let _ = write!(out, "{:x}", nibble(bits, first, format));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(bits: &[u8]) -> CaptureBuffer {
        bits.iter().map(|&b| b != 0).collect()
    }

    #[test]
    fn decimal() {
        assert_eq!(
            encode(&capture(&[1, 0, 1, 1]), RmaskFormat::Decimal),
            "4 rmask bits: 1 0 1 1"
        );
    }

    #[test]
    fn hex_big_endian() {
        assert_eq!(encode(&capture(&[1, 0, 1, 1]), RmaskFormat::HexBigEndian), "0xb");
        assert_eq!(
            encode(&capture(&[0, 0, 0, 1, 1, 1, 1, 0]), RmaskFormat::HexBigEndian),
            "0x1e"
        );
    }

    #[test]
    fn hex_little_endian() {
        assert_eq!(
            encode(&capture(&[1, 0, 1, 1]), RmaskFormat::HexLittleEndian),
            "0xd"
        );
        // whole sequence reversed, not just each nibble
        assert_eq!(
            encode(&capture(&[0, 0, 0, 1, 1, 1, 1, 0]), RmaskFormat::HexLittleEndian),
            "0x78"
        );
    }

    #[test]
    fn partial_trailing_group() {
        let bits = capture(&[1, 0, 1, 1, 1]);
        assert_eq!(encode(&bits, RmaskFormat::HexBigEndian), "0xb8");
        assert_eq!(encode(&bits, RmaskFormat::HexLittleEndian), "0xe8");
        assert_eq!(encode(&bits, RmaskFormat::Decimal), "5 rmask bits: 1 0 1 1 1");

        let single = capture(&[1]);
        assert_eq!(encode(&single, RmaskFormat::HexBigEndian), "0x8");
        assert_eq!(encode(&single, RmaskFormat::HexLittleEndian), "0x8");
    }

    #[test]
    fn empty_buffer() {
        let bits = CaptureBuffer::new();
        assert_eq!(encode(&bits, RmaskFormat::Decimal), "0 rmask bits:");
        assert_eq!(encode(&bits, RmaskFormat::HexBigEndian), "0x");
    }

    #[test]
    fn capacity_is_enforced() {
        let mut bits = CaptureBuffer::new();
        for _ in 0..CAPTURE_CAPACITY {
            assert!(bits.push(true));
        }
        assert!(bits.is_full());
        assert!(!bits.push(false));
        assert_eq!(bits.len(), CAPTURE_CAPACITY);
        assert_eq!(encode(&bits, RmaskFormat::HexBigEndian).len(), 2 + 64);
    }
}
