use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Lane value marking a unit absorbed into a preceding merged lane, or a
/// unit that cannot be decoded. Skipped by decode and encode.
pub const SENTINEL: u32 = 0xFFFF_FFFF;

/// The three Unicode encoding forms the engine converts between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Utf8,
    Utf16,
    Utf32,
}

impl Encoding {
    /// Size of one code unit in bytes.
    #[inline]
    pub const fn width(self) -> usize {
        match self {
            Encoding::Utf8 => 1,
            Encoding::Utf16 => 2,
            Encoding::Utf32 => 4,
        }
    }

    /// Ratio of the 32-bit intermediate lane width to this encoding's unit
    /// width. A buffer of `n` lanes needs at most `n * conversion_factor()`
    /// destination units.
    #[inline]
    pub const fn conversion_factor(self) -> usize {
        4 / self.width()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16 => "UTF-16",
            Encoding::Utf32 => "UTF-32",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Byte order of multi-byte code units in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Big,
    Little,
}

impl ByteOrder {
    /// Byte order of the machine this crate was compiled for.
    #[cfg(target_endian = "little")]
    pub const HOST: ByteOrder = ByteOrder::Little;
    #[cfg(target_endian = "big")]
    pub const HOST: ByteOrder = ByteOrder::Big;

    /// True when units stored in this order must be byte-swapped to be read
    /// as host integers.
    #[inline]
    pub const fn needs_swap(self) -> bool {
        !matches!(
            (self, ByteOrder::HOST),
            (ByteOrder::Big, ByteOrder::Big) | (ByteOrder::Little, ByteOrder::Little)
        )
    }

    #[inline]
    pub const fn flip(self) -> ByteOrder {
        match self {
            ByteOrder::Big => ByteOrder::Little,
            ByteOrder::Little => ByteOrder::Big,
        }
    }
}

impl Default for ByteOrder {
    /// Big-endian, the network/Unicode default when no BOM or label says otherwise.
    fn default() -> Self {
        ByteOrder::Big
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::Big => f.write_str("big"),
            ByteOrder::Little => f.write_str("little"),
        }
    }
}

/// Errors from parsing encoding or byte-order labels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown encoding '{0}'")]
    UnknownEncoding(String),
    #[error("unknown byte order '{0}' (expected big or little)")]
    UnknownByteOrder(String),
}

impl FromStr for ByteOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "big" | "be" => Ok(ByteOrder::Big),
            "little" | "le" => Ok(ByteOrder::Little),
            _ => Err(ConfigError::UnknownByteOrder(s.to_string())),
        }
    }
}

/// An encoding label such as `utf-16le`: the encoding plus the byte order
/// it pins, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    pub encoding: Encoding,
    pub order: Option<ByteOrder>,
}

impl FromStr for Label {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        let (encoding, order) = match lower.as_str() {
            "utf-8" | "utf8" => (Encoding::Utf8, None),
            "utf-16" | "utf16" => (Encoding::Utf16, None),
            "utf-16be" | "utf16be" => (Encoding::Utf16, Some(ByteOrder::Big)),
            "utf-16le" | "utf16le" => (Encoding::Utf16, Some(ByteOrder::Little)),
            "utf-32" | "utf32" => (Encoding::Utf32, None),
            "utf-32be" | "utf32be" => (Encoding::Utf32, Some(ByteOrder::Big)),
            "utf-32le" | "utf32le" => (Encoding::Utf32, Some(ByteOrder::Little)),
            _ => return Err(ConfigError::UnknownEncoding(s.to_string())),
        };
        Ok(Label { encoding, order })
    }
}

impl FromStr for Encoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Label>().map(|label| label.encoding)
    }
}

/// The four setup-time choices that fix a transcoder's behaviour.
/// Every combination is valid; byte order is ignored for UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Config {
    pub src: Encoding,
    pub dest: Encoding,
    pub src_order: ByteOrder,
    pub dest_order: ByteOrder,
}

impl Config {
    pub const fn new(
        src: Encoding,
        dest: Encoding,
        src_order: ByteOrder,
        dest_order: ByteOrder,
    ) -> Self {
        Config {
            src,
            dest,
            src_order,
            dest_order,
        }
    }

    /// Build a config from two labels, falling back to the given orders
    /// when a label does not pin one.
    pub fn from_labels(
        src: Label,
        dest: Label,
        src_order: ByteOrder,
        dest_order: ByteOrder,
    ) -> Self {
        Config {
            src: src.encoding,
            dest: dest.encoding,
            src_order: src.order.unwrap_or(src_order),
            dest_order: dest.order.unwrap_or(dest_order),
        }
    }

    /// Swap needed when reading source units. Always false for UTF-8.
    #[inline]
    pub const fn swap_src(&self) -> bool {
        !matches!(self.src, Encoding::Utf8) && self.src_order.needs_swap()
    }

    /// Swap needed when writing destination units. Always false for UTF-8.
    #[inline]
    pub const fn swap_dest(&self) -> bool {
        !matches!(self.dest, Encoding::Utf8) && self.dest_order.needs_swap()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.src)?;
        if self.src != Encoding::Utf8 {
            write!(f, " ({})", self.src_order)?;
        }
        write!(f, " -> {}", self.dest)?;
        if self.dest != Encoding::Utf8 {
            write!(f, " ({})", self.dest_order)?;
        }
        Ok(())
    }
}
