//! Phase 1: expand source code units into 32-bit host-order lanes.
//!
//! Total over every bit pattern; nothing is validated here. UTF-8 bytes become
//! one lane each and are merged into sequences later.

use super::encoding::Encoding;

/// Units widened per group. Matches one 256-bit register of single-byte input.
const WIDEN_BLOCK: usize = 32;

/// Widen `input` into `lanes`, returning the number of whole source units.
/// Trailing bytes that do not complete a code unit are ignored.
///
/// # Panics
/// If `lanes` holds fewer lanes than there are source units.
pub fn widen(src: Encoding, swap: bool, input: &[u8], lanes: &mut [u32]) -> usize {
    let units = input.len() / src.width();
    let input = &input[..units * src.width()];
    let lanes = &mut lanes[..units];

    match (src, swap) {
        (Encoding::Utf8, _) => widen_u8(input, lanes),
        (Encoding::Utf16, false) => widen_u16::<false>(input, lanes),
        (Encoding::Utf16, true) => widen_u16::<true>(input, lanes),
        (Encoding::Utf32, false) => widen_u32::<false>(input, lanes),
        (Encoding::Utf32, true) => widen_u32::<true>(input, lanes),
    }

    units
}

fn widen_u8(input: &[u8], lanes: &mut [u32]) {
    let mut src = input.chunks_exact(WIDEN_BLOCK);
    let mut dst = lanes.chunks_exact_mut(WIDEN_BLOCK);

    for (s, d) in (&mut src).zip(&mut dst) {
        for (lane, &byte) in d.iter_mut().zip(s) {
            *lane = byte as u32;
        }
    }

    for (lane, &byte) in dst.into_remainder().iter_mut().zip(src.remainder()) {
        *lane = byte as u32;
    }
}

fn widen_u16<const SWAP: bool>(input: &[u8], lanes: &mut [u32]) {
    const UNITS: usize = WIDEN_BLOCK / 2;

    let mut src = input.chunks_exact(UNITS * 2);
    let mut dst = lanes.chunks_exact_mut(UNITS);

    for (s, d) in (&mut src).zip(&mut dst) {
        for (lane, unit) in d.iter_mut().zip(s.chunks_exact(2)) {
            *lane = read_u16::<SWAP>(unit) as u32;
        }
    }

    for (lane, unit) in dst
        .into_remainder()
        .iter_mut()
        .zip(src.remainder().chunks_exact(2))
    {
        *lane = read_u16::<SWAP>(unit) as u32;
    }
}

fn widen_u32<const SWAP: bool>(input: &[u8], lanes: &mut [u32]) {
    const UNITS: usize = WIDEN_BLOCK / 4;

    let mut src = input.chunks_exact(UNITS * 4);
    let mut dst = lanes.chunks_exact_mut(UNITS);

    for (s, d) in (&mut src).zip(&mut dst) {
        for (lane, unit) in d.iter_mut().zip(s.chunks_exact(4)) {
            *lane = read_u32::<SWAP>(unit);
        }
    }

    for (lane, unit) in dst
        .into_remainder()
        .iter_mut()
        .zip(src.remainder().chunks_exact(4))
    {
        *lane = read_u32::<SWAP>(unit);
    }
}

#[inline(always)]
fn read_u16<const SWAP: bool>(bytes: &[u8]) -> u16 {
    let unit = u16::from_ne_bytes([bytes[0], bytes[1]]);
    if SWAP { unit.swap_bytes() } else { unit }
}

#[inline(always)]
fn read_u32<const SWAP: bool>(bytes: &[u8]) -> u32 {
    let unit = u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if SWAP { unit.swap_bytes() } else { unit }
}
