mod core;
pub mod decode;
pub mod encode;
mod encoding;
pub mod merge;
pub mod truncate;
pub mod widen;

#[cfg(test)]
mod tests;

pub use self::core::{Transcoded, Transcoder};
pub use self::encoding::{ByteOrder, Config, ConfigError, Encoding, Label, SENTINEL};
pub use self::merge::{Carry, Tier};
