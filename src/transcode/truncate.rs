//! Phase 3: find how many lanes hold sequences that are wholly present.

use super::encoding::Encoding;
use super::merge::{is_high_surrogate, is_utf8_continuation, utf8_declared_len};

/// Length of the prefix of merged `lanes` that is fully decodable. Lanes past
/// the returned index are the start of a sequence the next call must finish.
/// Returns 0 when the buffer holds nothing but a partial sequence.
pub fn truncate(src: Encoding, lanes: &[u32]) -> usize {
    match src {
        Encoding::Utf8 => truncate_utf8(lanes),
        Encoding::Utf16 => truncate_utf16(lanes),
        Encoding::Utf32 => lanes.len(),
    }
}

fn truncate_utf8(lanes: &[u32]) -> usize {
    let n = lanes.len();

    // Unmerged continuation bytes at the very end.
    let mut len = n;
    while len > 0 && is_utf8_continuation(lanes[len - 1]) {
        len -= 1;
    }
    if len == 0 {
        return n;
    }

    let lead = lanes[len - 1];
    // Merged lanes are wider than a byte; only a raw lead can be waiting.
    if lead > 0xFF {
        return n;
    }

    let declared = utf8_declared_len(lead);
    if declared >= 2 && n - len != declared - 1 {
        len - 1
    } else {
        n
    }
}

fn truncate_utf16(lanes: &[u32]) -> usize {
    match lanes.last() {
        Some(&unit) if is_high_surrogate(unit) => lanes.len() - 1,
        _ => lanes.len(),
    }
}
