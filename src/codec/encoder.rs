use std::borrow::Cow;

use crate::codec::{Mode, Segment};
use crate::metadata::{ECLevel, Eci, Version};
use crate::utils::{BitStream, QRError, QRResult};

use self::writer::{pad_remaining_capacity, push_eci_header, push_segment, push_terminator};

// Payload preparation
//------------------------------------------------------------------------------

// Byte mode text is ISO-8859-1 unless the caller forces UTF-8 or names a
// code page; text that ISO-8859-1 cannot represent falls back to UTF-8.
// Numeric and alphanumeric payloads are ASCII and bypass transcoding.
// Returns the prepared bytes and the ECI assignment number to emit, if any
pub(crate) fn prepare_text<'a>(
    text: &'a str,
    eci: Option<Eci>,
    force_utf8: bool,
    utf8_bom: bool,
) -> QRResult<(Cow<'a, [u8]>, Option<u32>)> {
    let eci_value = eci.map(Eci::assignment_number);
    if let Some(v) = eci_value {
        if v > MAX_ECI_VALUE {
            return Err(QRError::UnsupportedEci);
        }
    }

    if Mode::analyze(text.as_bytes()) != Mode::Byte {
        return Ok((Cow::Borrowed(text.as_bytes()), eci_value));
    }

    let data = match eci_value {
        Some(3) => encode_latin1(text)?,
        Some(4) => encode_latin2(text)?,
        Some(26) => Cow::Owned(encode_utf8(text, utf8_bom)),
        Some(_) => return Err(QRError::UnsupportedEci),
        None => {
            if force_utf8 {
                Cow::Owned(encode_utf8(text, utf8_bom))
            } else if text.is_ascii() {
                Cow::Borrowed(text.as_bytes())
            } else if text.chars().all(|c| (c as u32) <= 0xFF) {
                encode_latin1(text)?
            } else {
                Cow::Owned(encode_utf8(text, utf8_bom))
            }
        }
    };
    Ok((data, eci_value))
}

fn encode_utf8(text: &str, bom: bool) -> Vec<u8> {
    let mut data = Vec::with_capacity(text.len() + 3);
    if bom {
        data.extend(UTF8_BOM);
    }
    data.extend(text.as_bytes());
    data
}

fn encode_latin1(text: &str) -> QRResult<Cow<'_, [u8]>> {
    if text.is_ascii() {
        return Ok(Cow::Borrowed(text.as_bytes()));
    }
    text.chars()
        .map(|c| u8::try_from(c as u32).map_err(|_| QRError::InvalidInput))
        .collect::<QRResult<Vec<u8>>>()
        .map(Cow::Owned)
}

fn encode_latin2(text: &str) -> QRResult<Cow<'_, [u8]>> {
    if text.is_ascii() {
        return Ok(Cow::Borrowed(text.as_bytes()));
    }
    text.chars()
        .map(|c| {
            let cp = c as u32;
            if cp < 0xA0 {
                return Ok(cp as u8);
            }
            let cp = u16::try_from(cp).map_err(|_| QRError::InvalidInput)?;
            ISO_8859_2_HIGH
                .binary_search_by_key(&cp, |&(u, _)| u)
                .map(|i| ISO_8859_2_HIGH[i].1)
                .map_err(|_| QRError::InvalidInput)
        })
        .collect::<QRResult<Vec<u8>>>()
        .map(Cow::Owned)
}

// Encoder
//------------------------------------------------------------------------------

// Smallest version whose data capacity fits the payload, then the full
// data codeword stream for it
pub(crate) fn encode(
    data: &[u8],
    ecl: ECLevel,
    eci: Option<u32>,
) -> QRResult<(BitStream, Version)> {
    let mode = Mode::analyze(data);
    let eci_bits = eci.map_or(0, eci_header_bit_len);
    for v in 1..=40 {
        let ver = Version::Normal(v);
        let seg = Segment::new(mode, ver.mode_bits(), ver.char_cnt_bits(mode), data);
        if eci_bits + seg.bit_len() <= ver.data_bit_capacity(ecl) {
            return Ok((encode_into(seg, ecl, ver, eci), ver));
        }
    }
    Err(QRError::CapacityExceeded)
}

pub(crate) fn encode_with_version(
    data: &[u8],
    ecl: ECLevel,
    ver: Version,
    eci: Option<u32>,
) -> QRResult<BitStream> {
    let mode = Mode::analyze(data);
    let eci_bits = eci.map_or(0, eci_header_bit_len);
    let seg = Segment::new(mode, ver.mode_bits(), ver.char_cnt_bits(mode), data);
    if eci_bits + seg.bit_len() > ver.data_bit_capacity(ecl) {
        return Err(QRError::CapacityExceeded);
    }
    Ok(encode_into(seg, ecl, ver, eci))
}

fn encode_into(seg: Segment, ecl: ECLevel, ver: Version, eci: Option<u32>) -> BitStream {
    let mut bs = BitStream::new(ver.data_bit_capacity(ecl));
    if let Some(eci) = eci {
        push_eci_header(eci, &mut bs);
    }
    push_segment(seg, &mut bs);
    push_terminator(&mut bs);
    pad_remaining_capacity(&mut bs);
    bs
}

fn eci_header_bit_len(eci: u32) -> usize {
    match eci {
        0..=127 => 12,
        128..=16383 => 20,
        _ => 28,
    }
}

// Writer for encoded data
//------------------------------------------------------------------------------

pub(super) mod writer {
    use crate::codec::{Mode, Segment, ECI_MODE_INDICATOR, PADDING_CODEWORDS};
    use crate::utils::BitStream;

    // ISO/IEC 18004 6.4.2: the assignment number is framed in the fewest
    // bytes that fit, with the leading bits naming the width
    pub fn push_eci_header(eci: u32, out: &mut BitStream) {
        debug_assert!(eci <= super::MAX_ECI_VALUE, "Invalid ECI assignment number: {eci}");

        out.push_bits(ECI_MODE_INDICATOR, 4);
        match eci {
            0..=127 => out.push_bits(eci as u8, 8),
            128..=16383 => out.push_bits((0b10 << 14) | eci, 16),
            _ => out.push_bits((0b110 << 21) | eci, 24),
        }
    }

    pub fn push_segment(seg: Segment, out: &mut BitStream) {
        push_header(&seg, out);
        match seg.mode {
            Mode::Numeric => push_numeric_data(seg.data, out),
            Mode::Alphanumeric => push_alphanumeric_data(seg.data, out),
            Mode::Byte => push_byte_data(seg.data, out),
        }
    }

    fn push_header(seg: &Segment, out: &mut BitStream) {
        out.push_bits(seg.mode as u8, seg.mode_bits);
        let char_cnt = seg.data.len();
        debug_assert!(
            char_cnt < (1 << seg.len_bits),
            "Char count exceeds bit length: Char count {char_cnt}, Char count bits {}",
            seg.len_bits
        );
        out.push_bits(char_cnt as u16, seg.len_bits);
    }

    fn push_numeric_data(data: &[u8], out: &mut BitStream) {
        for chunk in data.chunks(3) {
            let len = (chunk.len() * 10 + 2) / 3;
            let data = Mode::Numeric.encode_chunk(chunk);
            out.push_bits(data, len);
        }
    }

    fn push_alphanumeric_data(data: &[u8], out: &mut BitStream) {
        for chunk in data.chunks(2) {
            let len = (chunk.len() * 11 + 1) / 2;
            let data = Mode::Alphanumeric.encode_chunk(chunk);
            out.push_bits(data, len);
        }
    }

    fn push_byte_data(data: &[u8], out: &mut BitStream) {
        for chunk in data.chunks(1) {
            let data = Mode::Byte.encode_chunk(chunk);
            out.push_bits(data, 8);
        }
    }

    pub fn push_terminator(out: &mut BitStream) {
        let bit_len = out.len();
        let bit_capacity = out.capacity();
        if bit_len < bit_capacity {
            let term_len = std::cmp::min(4, bit_capacity - bit_len);
            out.push_bits(0, term_len);
        }
    }

    pub fn pad_remaining_capacity(out: &mut BitStream) {
        push_padding_bits(out);
        push_padding_codewords(out);
    }

    fn push_padding_bits(out: &mut BitStream) {
        let offset = out.len() & 7;
        if offset > 0 {
            let padding_bits_len = 8 - offset;
            out.push_bits(0, padding_bits_len);
        }
    }

    fn push_padding_codewords(out: &mut BitStream) {
        let offset = out.len() & 7;
        debug_assert!(offset == 0, "Bit offset should be zero before padding codewords: {offset}");

        let remain_byte_capacity = (out.capacity() - out.len()) >> 3;
        PADDING_CODEWORDS.iter().copied().cycle().take(remain_byte_capacity).for_each(|pc| {
            out.push_bits(pc, 8);
        });
    }
}

// Global constants
//------------------------------------------------------------------------------

const MAX_ECI_VALUE: u32 = 999_999;

static UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

// ISO-8859-2 code points 0xA0..0xFF keyed by Unicode scalar; the lower
// half is identity
static ISO_8859_2_HIGH: [(u16, u8); 96] = [
    (0x00a0, 0xa0),
    (0x00a4, 0xa4),
    (0x00a7, 0xa7),
    (0x00a8, 0xa8),
    (0x00ad, 0xad),
    (0x00b0, 0xb0),
    (0x00b4, 0xb4),
    (0x00b8, 0xb8),
    (0x00c1, 0xc1),
    (0x00c2, 0xc2),
    (0x00c4, 0xc4),
    (0x00c7, 0xc7),
    (0x00c9, 0xc9),
    (0x00cb, 0xcb),
    (0x00cd, 0xcd),
    (0x00ce, 0xce),
    (0x00d3, 0xd3),
    (0x00d4, 0xd4),
    (0x00d6, 0xd6),
    (0x00d7, 0xd7),
    (0x00da, 0xda),
    (0x00dc, 0xdc),
    (0x00dd, 0xdd),
    (0x00df, 0xdf),
    (0x00e1, 0xe1),
    (0x00e2, 0xe2),
    (0x00e4, 0xe4),
    (0x00e7, 0xe7),
    (0x00e9, 0xe9),
    (0x00eb, 0xeb),
    (0x00ed, 0xed),
    (0x00ee, 0xee),
    (0x00f3, 0xf3),
    (0x00f4, 0xf4),
    (0x00f6, 0xf6),
    (0x00f7, 0xf7),
    (0x00fa, 0xfa),
    (0x00fc, 0xfc),
    (0x00fd, 0xfd),
    (0x0102, 0xc3),
    (0x0103, 0xe3),
    (0x0104, 0xa1),
    (0x0105, 0xb1),
    (0x0106, 0xc6),
    (0x0107, 0xe6),
    (0x010c, 0xc8),
    (0x010d, 0xe8),
    (0x010e, 0xcf),
    (0x010f, 0xef),
    (0x0110, 0xd0),
    (0x0111, 0xf0),
    (0x0118, 0xca),
    (0x0119, 0xea),
    (0x011a, 0xcc),
    (0x011b, 0xec),
    (0x0139, 0xc5),
    (0x013a, 0xe5),
    (0x013d, 0xa5),
    (0x013e, 0xb5),
    (0x0141, 0xa3),
    (0x0142, 0xb3),
    (0x0143, 0xd1),
    (0x0144, 0xf1),
    (0x0147, 0xd2),
    (0x0148, 0xf2),
    (0x0150, 0xd5),
    (0x0151, 0xf5),
    (0x0154, 0xc0),
    (0x0155, 0xe0),
    (0x0158, 0xd8),
    (0x0159, 0xf8),
    (0x015a, 0xa6),
    (0x015b, 0xb6),
    (0x015e, 0xaa),
    (0x015f, 0xba),
    (0x0160, 0xa9),
    (0x0161, 0xb9),
    (0x0162, 0xde),
    (0x0163, 0xfe),
    (0x0164, 0xab),
    (0x0165, 0xbb),
    (0x016e, 0xd9),
    (0x016f, 0xf9),
    (0x0170, 0xdb),
    (0x0171, 0xfb),
    (0x0179, 0xac),
    (0x017a, 0xbc),
    (0x017b, 0xaf),
    (0x017c, 0xbf),
    (0x017d, 0xae),
    (0x017e, 0xbe),
    (0x02c7, 0xb7),
    (0x02d8, 0xa2),
    (0x02d9, 0xff),
    (0x02db, 0xb2),
    (0x02dd, 0xbd),
];
