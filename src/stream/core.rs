use std::io::{self, Read, Write};

use thiserror::Error;

use crate::common::io::read_full;
use crate::transcode::Transcoder;

/// Source units read per chunk when the caller does not choose.
/// 1M units = 1MB of UTF-8 or 4MB of UTF-32 per read.
pub const DEFAULT_CHUNK_UNITS: usize = 1024 * 1024;

/// Room kept in front of each read for the previous chunk's residue.
/// A residue is at most three units of an unfinished UTF-8 sequence, one
/// unpaired high surrogate plus a stray byte, or three stray UTF-32 bytes.
const MAX_RESIDUE_BYTES: usize = 4;

/// Totals for one stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Engine calls made, one per chunk read.
    pub chunks: u64,
    /// Source code units consumed by the engine.
    pub units_read: u64,
    /// Destination code units written.
    pub units_written: u64,
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Input ended inside a sequence (or inside a code unit). Everything
    /// before it has been written.
    #[error("incomplete character or code unit at end of input ({residue_bytes} byte(s))")]
    Incomplete { residue_bytes: usize },
}

/// Transcode everything `reader` yields into `writer`.
///
/// Reads `chunk_units` source units at a time into a buffer positioned after
/// the residue of the previous call, hands the whole buffer to the engine,
/// writes what it produced and moves the unconsumed tail to the front. A
/// residue left when the reader is exhausted is reported as
/// [`StreamError::Incomplete`] after the output has been flushed.
pub fn transcode_stream(
    reader: &mut impl Read,
    writer: &mut impl Write,
    transcoder: &Transcoder,
    chunk_units: usize,
) -> Result<StreamStats, StreamError> {
    let config = transcoder.config();
    let chunk_bytes = chunk_units.max(1) * config.src.width();
    let capacity = chunk_bytes + MAX_RESIDUE_BYTES;

    let mut input = vec![0u8; capacity];
    let mut lanes = vec![0u32; transcoder.lanes_needed(capacity)];
    let mut output = vec![0u8; transcoder.output_capacity(capacity)];

    log::debug!(
        "transcoding {} with {:?} merge, {} byte chunks",
        config,
        transcoder.tier(),
        chunk_bytes
    );

    let mut stats = StreamStats::default();
    let mut residue = 0usize;

    loop {
        let n = read_full(reader, &mut input[residue..residue + chunk_bytes])?;
        if n == 0 {
            break;
        }
        let len = residue + n;

        let result = transcoder.transcode(&mut output, &input[..len], &mut lanes);
        writer.write_all(&output[..transcoder.produced_bytes(result)])?;

        let consumed = transcoder.consumed_bytes(result);
        input.copy_within(consumed..len, 0);
        residue = len - consumed;
        debug_assert!(residue <= MAX_RESIDUE_BYTES);

        stats.chunks += 1;
        stats.units_read += result.consumed as u64;
        stats.units_written += result.produced as u64;

        log::debug!(
            "chunk {}: {} bytes in, {} units consumed, {} units produced",
            stats.chunks,
            n,
            result.consumed,
            result.produced
        );
        if residue > 0 {
            log::trace!("carrying residue {:02X?}", &input[..residue]);
        }

        // Short read: the reader is exhausted.
        if n < chunk_bytes {
            break;
        }
    }

    writer.flush()?;

    if residue > 0 {
        log::debug!("input ended with {} residue byte(s)", residue);
        return Err(StreamError::Incomplete {
            residue_bytes: residue,
        });
    }

    log::debug!(
        "done: {} chunks, {} units read, {} units written",
        stats.chunks,
        stats.units_read,
        stats.units_written
    );
    Ok(stats)
}
