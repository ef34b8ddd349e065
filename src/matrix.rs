use std::borrow::Cow;
use std::io::{Read, Write};

use flate2::read::{DeflateDecoder, GzDecoder};
use flate2::write::{DeflateEncoder, GzEncoder};

use crate::builder::QR;
use crate::metadata::Version;
use crate::utils::{BitStream, QRError, QRResult};

// Compression scheme
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Compression {
    Uncompressed,
    Deflate,
    Gzip,
}

// QR matrix
//------------------------------------------------------------------------------

/// Finished module grid handed to renderers: the version plus a row-major
/// bit grid, dark modules set. Serializes to a small signed byte format
/// with optional DEFLATE or GZIP wrapping
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct QRMatrix {
    version: Version,
    width: usize,
    // Row-major modules, msb first within each byte
    bits: Vec<u8>,
}

impl From<&QR> for QRMatrix {
    fn from(qr: &QR) -> Self {
        let width = qr.width();
        let mut bits = BitStream::new(width * width);
        for r in 0..width {
            for c in 0..width {
                bits.push(qr.is_dark(r, c));
            }
        }
        Self { version: qr.version(), width, bits: bits.data().to_vec() }
    }
}

impl QRMatrix {
    pub fn version(&self) -> Version {
        self.version
    }

    pub fn side(&self) -> usize {
        self.width
    }

    pub fn is_dark(&self, r: usize, c: usize) -> bool {
        debug_assert!(r < self.width && c < self.width, "Module out of bounds: ({r}, {c})");

        let index = r * self.width + c;
        (self.bits[index >> 3] >> (7 - (index & 7))) & 1 == 1
    }
}

// Serialization
//------------------------------------------------------------------------------

impl QRMatrix {
    pub fn serialize(&self, compression: Compression) -> Vec<u8> {
        let mut raw = Vec::with_capacity(HEADER_LEN + self.bits.len());
        raw.extend(SIGNATURE);
        raw.push(self.width as u8);
        raw.extend(&self.bits);

        match compression {
            Compression::Uncompressed => raw,
            Compression::Deflate => {
                let mut encoder = DeflateEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(&raw).expect("writing to a Vec cannot fail");
                encoder.finish().expect("writing to a Vec cannot fail")
            }
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(&raw).expect("writing to a Vec cannot fail");
                encoder.finish().expect("writing to a Vec cannot fail")
            }
        }
    }

    pub fn deserialize(raw: &[u8], compression: Compression) -> QRResult<Self> {
        let raw = match compression {
            Compression::Uncompressed => Cow::Borrowed(raw),
            Compression::Deflate => Cow::Owned(decompress(DeflateDecoder::new(raw))?),
            Compression::Gzip => Cow::Owned(decompress(GzDecoder::new(raw))?),
        };

        if raw.len() < HEADER_LEN || raw[..4] != SIGNATURE {
            return Err(QRError::CorruptSerialization);
        }
        let width = raw[4] as usize;
        if !(21..=177).contains(&width) || (width - 21) % 4 != 0 {
            return Err(QRError::CorruptSerialization);
        }
        let version = Version::Normal((width - 21) / 4 + 1);

        let grid_bytes = (width * width).div_ceil(8);
        let body = &raw[HEADER_LEN..];
        if body.len() < grid_bytes {
            return Err(QRError::CorruptSerialization);
        }
        let mut bits = body[..grid_bytes].to_vec();
        // Zero the padding bits of the final byte so equality is structural
        let tail_bits = (width * width) & 7;
        if tail_bits > 0 {
            bits[grid_bytes - 1] &= 0xFF << (8 - tail_bits);
        }

        Ok(Self { version, width, bits })
    }
}

// Decompressed size is capped to starve decompression bombs
fn decompress(mut decoder: impl Read) -> QRResult<Vec<u8>> {
    let mut raw = Vec::new();
    let read = decoder
        .by_ref()
        .take(MAX_DECOMPRESSED_LEN as u64 + 1)
        .read_to_end(&mut raw)
        .map_err(|_| QRError::CorruptSerialization)?;
    if read > MAX_DECOMPRESSED_LEN {
        return Err(QRError::CorruptSerialization);
    }
    Ok(raw)
}

// Global constants
//------------------------------------------------------------------------------

static SIGNATURE: [u8; 4] = [0x51, 0x52, 0x52, 0x00];

const HEADER_LEN: usize = 5;

const MAX_DECOMPRESSED_LEN: usize = 10 << 20;

#[cfg(test)]
mod matrix_tests {
    use super::{Compression, QRMatrix, SIGNATURE};
    use crate::builder::QRBuilder;
    use crate::metadata::{ECLevel, Version};
    use crate::utils::QRError;

    fn sample() -> QRMatrix {
        let qr = QRBuilder::new("HELLO WORLD").ec_level(ECLevel::Q).build().unwrap();
        QRMatrix::from(&qr)
    }

    #[test]
    fn test_header_layout() {
        let matrix = sample();
        let raw = matrix.serialize(Compression::Uncompressed);
        assert_eq!(raw[..4], SIGNATURE);
        assert_eq!(raw[4], 21);
        assert_eq!(raw.len(), 5 + (21 * 21usize).div_ceil(8));
    }

    #[test]
    fn test_roundtrip_uncompressed() {
        let matrix = sample();
        let raw = matrix.serialize(Compression::Uncompressed);
        let restored = QRMatrix::deserialize(&raw, Compression::Uncompressed).unwrap();
        assert_eq!(matrix, restored);
        assert_eq!(restored.version(), Version::Normal(1));
        assert_eq!(restored.side(), 21);
    }

    #[test]
    fn test_roundtrip_deflate() {
        let matrix = sample();
        let raw = matrix.serialize(Compression::Deflate);
        let restored = QRMatrix::deserialize(&raw, Compression::Deflate).unwrap();
        assert_eq!(matrix, restored);
    }

    #[test]
    fn test_roundtrip_gzip() {
        let matrix = sample();
        let raw = matrix.serialize(Compression::Gzip);
        let restored = QRMatrix::deserialize(&raw, Compression::Gzip).unwrap();
        assert_eq!(matrix, restored);
    }

    #[test]
    fn test_is_dark_matches_grid() {
        let qr = QRBuilder::new("12345").ec_level(ECLevel::L).build().unwrap();
        let matrix = QRMatrix::from(&qr);
        for r in 0..qr.width() {
            for c in 0..qr.width() {
                assert_eq!(matrix.is_dark(r, c), qr.is_dark(r, c), "({r}, {c})");
            }
        }
        // Finder core and dark module
        assert!(matrix.is_dark(0, 0));
        assert!(matrix.is_dark(3, 3));
        assert!(matrix.is_dark(4 + 9, 8));
    }

    #[test]
    fn test_deserialize_bad_signature() {
        let mut raw = sample().serialize(Compression::Uncompressed);
        raw[0] ^= 0xFF;
        let err = QRMatrix::deserialize(&raw, Compression::Uncompressed).unwrap_err();
        assert_eq!(err, QRError::CorruptSerialization);
    }

    #[test]
    fn test_deserialize_implausible_side() {
        let mut raw = sample().serialize(Compression::Uncompressed);
        for side in [0, 20, 22, 178, 255] {
            raw[4] = side;
            let err = QRMatrix::deserialize(&raw, Compression::Uncompressed).unwrap_err();
            assert_eq!(err, QRError::CorruptSerialization, "side {side}");
        }
    }

    #[test]
    fn test_deserialize_truncated_body() {
        let raw = sample().serialize(Compression::Uncompressed);
        let err =
            QRMatrix::deserialize(&raw[..raw.len() - 1], Compression::Uncompressed).unwrap_err();
        assert_eq!(err, QRError::CorruptSerialization);
        let err = QRMatrix::deserialize(&raw[..3], Compression::Uncompressed).unwrap_err();
        assert_eq!(err, QRError::CorruptSerialization);
    }

    #[test]
    fn test_deserialize_garbage_deflate() {
        let err = QRMatrix::deserialize(&[0x12, 0x34, 0x56], Compression::Deflate).unwrap_err();
        assert_eq!(err, QRError::CorruptSerialization);
    }

    #[test]
    fn test_deserialize_decompression_bomb() {
        use flate2::write::DeflateEncoder;
        use std::io::Write;

        // 16 MiB of zeros deflates to a few KiB but must be rejected on
        // expansion, not parsed
        let mut encoder = DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        let chunk = vec![0u8; 1 << 16];
        for _ in 0..256 {
            encoder.write_all(&chunk).unwrap();
        }
        let bomb = encoder.finish().unwrap();
        let err = QRMatrix::deserialize(&bomb, Compression::Deflate).unwrap_err();
        assert_eq!(err, QRError::CorruptSerialization);
    }
}
