//! Phase 5: write code points out as destination units, compacted.

use super::encoding::{Encoding, SENTINEL};

/// Largest Unicode scalar value.
const MAX_CODE_POINT: u32 = 0x10FFFF;

/// Encode the code point lanes into `output`, skipping sentinels, and return
/// the number of destination code units written from offset 0.
///
/// # Panics
/// If `output` is smaller than the encoded text. Callers size it with
/// [`Transcoder::output_capacity`](super::Transcoder::output_capacity).
pub fn encode(dest: Encoding, swap: bool, lanes: &[u32], output: &mut [u8]) -> usize {
    match (dest, swap) {
        (Encoding::Utf8, _) => encode_utf8(lanes, output),
        (Encoding::Utf16, false) => encode_utf16::<false>(lanes, output),
        (Encoding::Utf16, true) => encode_utf16::<true>(lanes, output),
        (Encoding::Utf32, false) => encode_utf32::<false>(lanes, output),
        (Encoding::Utf32, true) => encode_utf32::<true>(lanes, output),
    }
}

fn encode_utf8(lanes: &[u32], output: &mut [u8]) -> usize {
    let mut pos = 0;

    for &cp in lanes {
        match cp {
            0..=0x7F => {
                output[pos] = cp as u8;
                pos += 1;
            }
            0x80..=0x7FF => {
                output[pos] = (0xC0 | (cp >> 6)) as u8;
                output[pos + 1] = (0x80 | (cp & 0x3F)) as u8;
                pos += 2;
            }
            0x800..=0xFFFF => {
                output[pos] = (0xE0 | (cp >> 12)) as u8;
                output[pos + 1] = (0x80 | ((cp >> 6) & 0x3F)) as u8;
                output[pos + 2] = (0x80 | (cp & 0x3F)) as u8;
                pos += 3;
            }
            0x10000..=MAX_CODE_POINT => {
                output[pos] = (0xF0 | (cp >> 18)) as u8;
                output[pos + 1] = (0x80 | ((cp >> 12) & 0x3F)) as u8;
                output[pos + 2] = (0x80 | ((cp >> 6) & 0x3F)) as u8;
                output[pos + 3] = (0x80 | (cp & 0x3F)) as u8;
                pos += 4;
            }
            // Sentinels and values past U+10FFFF have no UTF-8 form.
            _ => {}
        }
    }

    pos
}

fn encode_utf16<const SWAP: bool>(lanes: &[u32], output: &mut [u8]) -> usize {
    let mut units = 0;

    for &cp in lanes {
        if cp < 0x10000 {
            put_u16::<SWAP>(output, units, cp as u16);
            units += 1;
        } else if cp <= MAX_CODE_POINT {
            let v = cp - 0x10000;
            put_u16::<SWAP>(output, units, (0xD800 | (v >> 10)) as u16);
            put_u16::<SWAP>(output, units + 1, (0xDC00 | (v & 0x3FF)) as u16);
            units += 2;
        }
    }

    units
}

fn encode_utf32<const SWAP: bool>(lanes: &[u32], output: &mut [u8]) -> usize {
    let mut units = 0;

    for &cp in lanes {
        if cp == SENTINEL {
            continue;
        }
        let unit = if SWAP { cp.swap_bytes() } else { cp };
        output[units * 4..units * 4 + 4].copy_from_slice(&unit.to_ne_bytes());
        units += 1;
    }

    units
}

#[inline(always)]
fn put_u16<const SWAP: bool>(output: &mut [u8], index: usize, unit: u16) {
    let unit = if SWAP { unit.swap_bytes() } else { unit };
    output[index * 2..index * 2 + 2].copy_from_slice(&unit.to_ne_bytes());
}
