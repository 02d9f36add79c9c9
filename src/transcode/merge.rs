//! Phase 2: fold multi-unit sequences into the lane of their lead unit.
//!
//! After this phase every lane is in one of three states:
//! - merged: the raw concatenated bits of a complete sequence (or a unit that
//!   needed no merging), at the lead unit's position;
//! - `SENTINEL`: absorbed into a preceding lane, or rejected as malformed
//!   UTF-8 (unpaired UTF-16 surrogates are not rejected and stay raw);
//! - raw-pending: the trailing units of a sequence cut off by the end of the
//!   buffer, left untouched for the truncate phase.
//!
//! Two tiers produce identical lanes. The block tier classifies fixed groups
//! of lanes with bitmasks (bit `i` describes lane `i`) and hands a [`Carry`]
//! to the next group when a sequence straddles the group boundary. The scalar
//! tier walks one sequence at a time and also finishes whatever tail the
//! block tier leaves behind.

use super::encoding::{Encoding, SENTINEL};

/// Lanes per UTF-8 block: one 256-bit register of bytes.
pub const BLOCK_U8: usize = 32;

/// Lanes per UTF-16 block: one 256-bit register of 16-bit units.
pub const BLOCK_U16: usize = 16;

/// Which merge implementation a transcoder runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tier {
    /// Fixed-width lane groups classified with bitmasks.
    #[default]
    Block,
    /// One sequence at a time. The reference behaviour.
    Scalar,
}

/// Merge state passed from one block to the next.
///
/// `deferred` counts the lanes at the end of a block that belong to a
/// sequence whose lead sits too close to the block end to see all of its
/// units. Those lanes are left raw and the next block starts at the lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Carry {
    deferred: usize,
}

impl Carry {
    pub const NONE: Carry = Carry { deferred: 0 };

    #[inline]
    pub const fn deferred(self) -> usize {
        self.deferred
    }

    /// Cursor of the next block after processing `block` lanes at `cursor`.
    #[inline]
    pub const fn resume(self, cursor: usize, block: usize) -> usize {
        cursor + block - self.deferred
    }
}

/// Merge `lanes` in place according to the source encoding.
pub fn merge(src: Encoding, tier: Tier, lanes: &mut [u32]) {
    match (src, tier) {
        (Encoding::Utf8, Tier::Block) => merge_utf8_blocks(lanes),
        (Encoding::Utf8, Tier::Scalar) => merge_utf8_scalar(lanes, 0),
        (Encoding::Utf16, Tier::Block) => merge_utf16_blocks(lanes),
        (Encoding::Utf16, Tier::Scalar) => merge_utf16_scalar(lanes, 0),
        // Every UTF-32 unit is already a whole code point.
        (Encoding::Utf32, _) => {}
    }
}

// ---------------------------------------------------------------------------
// UTF-8
// ---------------------------------------------------------------------------

/// Number of units a UTF-8 byte declares: 1 for ASCII, 2..=4 for a lead
/// byte, 0 for a continuation byte or a byte that can never start a sequence.
#[inline]
pub(crate) fn utf8_declared_len(byte: u32) -> usize {
    match (byte as u8).leading_ones() {
        0 => 1,
        n @ 2..=4 => n as usize,
        _ => 0,
    }
}

#[inline]
pub(crate) fn is_utf8_continuation(lane: u32) -> bool {
    lane & 0xFFFF_FFC0 == 0x80
}

/// Fold `len` byte lanes starting at `at` into one lane, first byte in the
/// most significant position, and mark the absorbed lanes.
#[inline]
fn fold_utf8(lanes: &mut [u32], at: usize, len: usize) {
    let mut merged = lanes[at];
    for lane in &mut lanes[at + 1..at + len] {
        merged = (merged << 8) | *lane;
        *lane = SENTINEL;
    }
    lanes[at] = merged;
}

/// Scalar UTF-8 merge from `start` to the end of `lanes`.
fn merge_utf8_scalar(lanes: &mut [u32], start: usize) {
    let n = lanes.len();
    let mut i = start;

    while i < n {
        match utf8_declared_len(lanes[i]) {
            1 => i += 1,
            len @ 2..=4 => {
                let end = i + len;
                let avail = end.min(n);
                let continuations = lanes[i + 1..avail]
                    .iter()
                    .take_while(|&&lane| is_utf8_continuation(lane))
                    .count();

                if i + 1 + continuations < avail {
                    // Lead followed by something other than a continuation byte.
                    lanes[i] = SENTINEL;
                    i += 1;
                } else if end > n {
                    // Cut off by the end of the buffer: leave it for truncate.
                    return;
                } else {
                    fold_utf8(lanes, i, len);
                    i = end;
                }
            }
            _ => {
                lanes[i] = SENTINEL;
                i += 1;
            }
        }
    }
}

/// Per-lane classification of one UTF-8 block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Utf8Masks {
    ascii: u32,
    continuation: u32,
    lead2: u32,
    lead3: u32,
    lead4: u32,
}

impl Utf8Masks {
    fn classify(block: &[u32]) -> Self {
        let mut masks = Utf8Masks::default();

        for (i, &lane) in block.iter().enumerate().take(BLOCK_U8) {
            let bit = 1u32 << i;
            let byte = lane as u8;
            // Longest pattern first so a shorter prefix never shadows it.
            if byte & 0xF8 == 0xF0 {
                masks.lead4 |= bit;
            } else if byte & 0xF0 == 0xE0 {
                masks.lead3 |= bit;
            } else if byte & 0xE0 == 0xC0 {
                masks.lead2 |= bit;
            } else if byte & 0xC0 == 0x80 {
                masks.continuation |= bit;
            } else if byte & 0x80 == 0 {
                masks.ascii |= bit;
            }
        }

        masks
    }

    /// Leads whose declared sequence runs past the end of the block.
    #[inline]
    fn crossing(&self) -> u32 {
        (self.lead4 & (0b111 << (BLOCK_U8 - 3)))
            | (self.lead3 & (0b11 << (BLOCK_U8 - 2)))
            | (self.lead2 & (1 << (BLOCK_U8 - 1)))
    }
}

/// Merge one full block of `BLOCK_U8` byte lanes.
fn merge_utf8_block(block: &mut [u32]) -> Carry {
    debug_assert_eq!(block.len(), BLOCK_U8);

    let masks = Utf8Masks::classify(block);
    if masks.ascii == u32::MAX {
        return Carry::NONE;
    }

    let crossing = masks.crossing();
    let limit = if crossing == 0 {
        BLOCK_U8
    } else {
        crossing.trailing_zeros() as usize
    };
    // Lanes this block settles; everything from `limit` on is redone next time.
    let live = low_bits(limit);

    let c1 = masks.continuation >> 1;
    let c2 = masks.continuation >> 2;
    let c3 = masks.continuation >> 3;

    let valid2 = masks.lead2 & c1 & live;
    let valid3 = masks.lead3 & c1 & c2 & live;
    let valid4 = masks.lead4 & c1 & c2 & c3 & live;

    // Continuation membership, tagged by the length of the owning sequence.
    let seq2 = valid2 << 1;
    let seq3 = (valid3 << 1) | (valid3 << 2);
    let seq4 = (valid4 << 1) | (valid4 << 2) | (valid4 << 3);
    let claimed = seq2 | seq3 | seq4;

    let rejected = live & !(masks.ascii | valid2 | valid3 | valid4 | claimed);

    for_each_bit(valid4, |at| fold_utf8(block, at, 4));
    for_each_bit(valid3, |at| fold_utf8(block, at, 3));
    for_each_bit(valid2, |at| fold_utf8(block, at, 2));
    for_each_bit(rejected, |at| block[at] = SENTINEL);

    Carry {
        deferred: BLOCK_U8 - limit,
    }
}

fn merge_utf8_blocks(lanes: &mut [u32]) {
    let n = lanes.len();
    let mut cursor = 0;

    while cursor + BLOCK_U8 <= n {
        let carry = merge_utf8_block(&mut lanes[cursor..cursor + BLOCK_U8]);
        cursor = carry.resume(cursor, BLOCK_U8);
    }

    merge_utf8_scalar(lanes, cursor);
}

// ---------------------------------------------------------------------------
// UTF-16
// ---------------------------------------------------------------------------

#[inline]
pub(crate) fn is_high_surrogate(lane: u32) -> bool {
    lane & 0xFFFF_FC00 == 0xD800
}

#[inline]
pub(crate) fn is_low_surrogate(lane: u32) -> bool {
    lane & 0xFFFF_FC00 == 0xDC00
}

/// Scalar UTF-16 merge from `start` to the end of `lanes`.
///
/// Unpaired surrogates stay as raw lanes and come out unchanged, so a
/// UTF-16 to UTF-16 conversion never loses units.
fn merge_utf16_scalar(lanes: &mut [u32], start: usize) {
    let n = lanes.len();
    let mut i = start;

    while i < n {
        let unit = lanes[i];
        if is_high_surrogate(unit) && i + 1 < n && is_low_surrogate(lanes[i + 1]) {
            lanes[i] = (unit << 16) | lanes[i + 1];
            lanes[i + 1] = SENTINEL;
            i += 2;
        } else {
            i += 1;
        }
    }
}

/// Merge one full block of `BLOCK_U16` unit lanes.
fn merge_utf16_block(block: &mut [u32]) -> Carry {
    debug_assert_eq!(block.len(), BLOCK_U16);

    let mut high = 0u32;
    let mut low = 0u32;
    for (i, &lane) in block.iter().enumerate().take(BLOCK_U16) {
        high |= (is_high_surrogate(lane) as u32) << i;
        low |= (is_low_surrogate(lane) as u32) << i;
    }

    if high == 0 {
        return Carry::NONE;
    }

    // A high surrogate in the last lane pairs with the head of the next block.
    let limit = if high & (1 << (BLOCK_U16 - 1)) != 0 {
        BLOCK_U16 - 1
    } else {
        BLOCK_U16
    };
    let live = low_bits(limit);

    // Unpaired surrogates are left as they are.
    let paired_high = high & (low >> 1) & live;

    for_each_bit(paired_high, |at| {
        block[at] = (block[at] << 16) | block[at + 1];
        block[at + 1] = SENTINEL;
    });

    Carry {
        deferred: BLOCK_U16 - limit,
    }
}

fn merge_utf16_blocks(lanes: &mut [u32]) {
    let n = lanes.len();
    let mut cursor = 0;

    while cursor + BLOCK_U16 <= n {
        let carry = merge_utf16_block(&mut lanes[cursor..cursor + BLOCK_U16]);
        cursor = carry.resume(cursor, BLOCK_U16);
    }

    merge_utf16_scalar(lanes, cursor);
}

// ---------------------------------------------------------------------------
// Bitmask helpers
// ---------------------------------------------------------------------------

/// Mask with the low `n` bits set, `n <= 32`.
#[inline]
fn low_bits(n: usize) -> u32 {
    if n >= 32 { u32::MAX } else { (1u32 << n) - 1 }
}

/// Call `f` with the index of every set bit, lowest first.
#[inline]
fn for_each_bit(mut mask: u32, mut f: impl FnMut(usize)) {
    while mask != 0 {
        f(mask.trailing_zeros() as usize);
        mask &= mask - 1;
    }
}
