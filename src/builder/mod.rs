mod qr;

pub use qr::{Module, QR};

use std::borrow::Cow;
use std::ops::Deref;

use crate::codec::{encode, encode_with_version, prepare_text};
use crate::ec::ecc;
use crate::mask::apply_best_mask;
use crate::metadata::{ECLevel, Eci, Version};
use crate::utils::{BitStream, QRError, QRResult};

#[derive(Debug, Clone, Copy)]
enum Payload<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
}

/// Builds a QR symbol from a text or byte payload. Version and mask are
/// chosen automatically unless a version is forced
pub struct QRBuilder<'a> {
    payload: Payload<'a>,
    version: Option<Version>,
    ec_level: ECLevel,
    eci: Option<Eci>,
    force_utf8: bool,
    utf8_bom: bool,
}

impl<'a> QRBuilder<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            payload: Payload::Text(text),
            version: None,
            ec_level: ECLevel::M,
            eci: None,
            force_utf8: false,
            utf8_bom: false,
        }
    }

    pub fn from_bytes(data: &'a [u8]) -> Self {
        Self { payload: Payload::Bytes(data), ..Self::new("") }
    }

    pub fn version(&mut self, version: Version) -> &mut Self {
        self.version = Some(version);
        self
    }

    pub fn unset_version(&mut self) -> &mut Self {
        self.version = None;
        self
    }

    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = ec_level;
        self
    }

    pub fn eci(&mut self, eci: Eci) -> &mut Self {
        self.eci = Some(eci);
        self
    }

    pub fn force_utf8(&mut self, force_utf8: bool) -> &mut Self {
        self.force_utf8 = force_utf8;
        self
    }

    pub fn utf8_bom(&mut self, utf8_bom: bool) -> &mut Self {
        self.utf8_bom = utf8_bom;
        self
    }

    pub fn metadata(&self) -> String {
        match self.version {
            Some(v) => format!("{{ Version: {:?}, Ec level: {:?} }}", *v, self.ec_level),
            None => format!("{{ Version: None, Ec level: {:?} }}", self.ec_level),
        }
    }
}

impl QRBuilder<'_> {
    pub fn build(&self) -> QRResult<QR> {
        if let Some(v) = self.version {
            if !matches!(v, Version::Normal(1..=40)) {
                return Err(QRError::InvalidInput);
            }
        }

        let (data, eci) = match self.payload {
            Payload::Text(text) => {
                prepare_text(text, self.eci, self.force_utf8, self.utf8_bom)?
            }
            Payload::Bytes(bytes) => {
                let eci = self.eci.map(Eci::assignment_number);
                if eci.is_some_and(|v| v > 999_999) {
                    return Err(QRError::UnsupportedEci);
                }
                (Cow::Borrowed(bytes), eci)
            }
        };

        // Encode data into the smallest version that fits, or the forced one
        let (encoded, version) = match self.version {
            Some(v) => (encode_with_version(&data, self.ec_level, v, eci)?, v),
            None => encode(&data, self.ec_level, eci)?,
        };
        if encoded.len() != version.data_bit_capacity(self.ec_level) {
            return Err(QRError::InternalInvariantViolated);
        }

        // Compute error correction per block, then interleave by column
        let (data_blocks, ecc_blocks) = ecc(encoded.data(), version, self.ec_level);
        let mut payload = BitStream::new(version.total_codewords() << 3);
        payload.extend(&interleave(&data_blocks));
        payload.extend(&interleave(&ecc_blocks));

        // Lay out the matrix and pick the best mask
        let mut qr = QR::new(version, self.ec_level);
        qr.draw_all_function_patterns();
        qr.draw_encoding_region(payload)?;
        apply_best_mask(&mut qr);

        Ok(qr)
    }
}

pub(crate) fn interleave<T: Copy, V: Deref<Target = [T]>>(blocks: &[V]) -> Vec<T> {
    let max_block_size = blocks.iter().map(|b| b.len()).max().expect("Blocks is empty");
    let total_size = blocks.iter().map(|b| b.len()).sum::<usize>();
    let mut res = Vec::with_capacity(total_size);
    for i in 0..max_block_size {
        for b in blocks {
            if i < b.len() {
                res.push(b[i]);
            }
        }
    }
    res
}
