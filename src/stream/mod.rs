pub mod core;


pub use self::core::{DEFAULT_CHUNK_UNITS, StreamError, StreamStats, transcode_stream};
