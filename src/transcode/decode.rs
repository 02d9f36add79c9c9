//! Phase 4: turn merged lanes into code points, in place.
//!
//! Pure per-lane map; no lane reads its neighbours, so the loop vectorises
//! and the order of evaluation does not matter.

use super::encoding::{Encoding, SENTINEL};

pub fn decode(src: Encoding, lanes: &mut [u32]) {
    match src {
        Encoding::Utf8 => lanes.iter_mut().for_each(|lane| *lane = decode_utf8(*lane)),
        Encoding::Utf16 => lanes.iter_mut().for_each(|lane| *lane = decode_utf16(*lane)),
        Encoding::Utf32 => {}
    }
}

/// Decode a merged UTF-8 lane (sequence bytes packed most significant first).
#[inline]
pub fn decode_utf8(lane: u32) -> u32 {
    match lane {
        SENTINEL => SENTINEL,
        0..=0x7F => lane,
        // A lone byte with the high bit set never survives merging intact.
        0x80..=0xFF => SENTINEL,
        _ => {
            let len = 4 - (lane.leading_zeros() / 8) as usize;
            let bytes = lane.to_be_bytes();
            let seq = &bytes[4 - len..];

            let mut cp = (seq[0] & (0x7F >> len)) as u32;
            for &byte in &seq[1..] {
                cp = (cp << 6) | (byte & 0x3F) as u32;
            }
            cp
        }
    }
}

/// Decode a UTF-16 lane: a surrogate pair packed high unit first, or a
/// single unit passed through as is.
#[inline]
pub fn decode_utf16(lane: u32) -> u32 {
    if lane == SENTINEL || lane <= 0xFFFF {
        return lane;
    }
    // Same as `high - 0xD800` / `low - 0xDC00` for real surrogates.
    let high = (lane >> 16) & 0x3FF;
    let low = lane & 0x3FF;
    (high << 10) + low + 0x10000
}
