use super::decode::decode;
use super::encode::encode;
use super::encoding::{ByteOrder, Config, Encoding};
use super::merge::{Tier, merge};
use super::truncate::truncate;
use super::widen::widen;

/// Outcome of one engine call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transcoded {
    /// Destination code units written to the front of the output buffer.
    pub produced: usize,
    /// Source code units fully accounted for. The units after this point
    /// start a sequence that is not complete yet.
    pub consumed: usize,
}

/// A configured engine for one (source, destination, byte orders) choice.
///
/// Holds no buffers and no state between calls; it is `Copy` and can be
/// shared freely across threads, each working on its own buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transcoder {
    config: Config,
    tier: Tier,
    swap_src: bool,
    swap_dest: bool,
}

impl Transcoder {
    /// Transcoder using the block (lane-group) merge tier.
    pub fn new(config: Config) -> Self {
        Self::with_tier(config, Tier::Block)
    }

    /// Transcoder using the portable one-sequence-at-a-time merge tier.
    pub fn scalar(config: Config) -> Self {
        Self::with_tier(config, Tier::Scalar)
    }

    pub fn with_tier(config: Config, tier: Tier) -> Self {
        Transcoder {
            config,
            tier,
            swap_src: config.swap_src(),
            swap_dest: config.swap_dest(),
        }
    }

    /// Shorthand for a transcoder between two encodings in the given orders.
    pub fn between(
        src: Encoding,
        src_order: ByteOrder,
        dest: Encoding,
        dest_order: ByteOrder,
    ) -> Self {
        Self::new(Config::new(src, dest, src_order, dest_order))
    }

    #[inline]
    pub fn config(&self) -> Config {
        self.config
    }

    #[inline]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Intermediate lanes needed for an input of `input_bytes` bytes.
    #[inline]
    pub fn lanes_needed(&self, input_bytes: usize) -> usize {
        input_bytes / self.config.src.width()
    }

    /// Worst-case output size in bytes for an input of `input_bytes` bytes:
    /// every lane may expand to `conversion_factor` destination units.
    #[inline]
    pub fn output_capacity(&self, input_bytes: usize) -> usize {
        let dest = self.config.dest;
        self.lanes_needed(input_bytes) * dest.conversion_factor() * dest.width()
    }

    /// Transcode as much of `input` as is complete into `output`.
    ///
    /// `lanes` is scratch space owned by the caller; it must hold at least
    /// [`lanes_needed`](Self::lanes_needed) lanes. `output` must hold at least
    /// [`output_capacity`](Self::output_capacity) bytes. Neither is
    /// validated beyond Rust's bounds checks.
    ///
    /// Malformed units are dropped from the output. A sequence cut off by
    /// the end of `input` is not consumed; the caller re-submits it, unchanged,
    /// at the front of the next call's input.
    pub fn transcode(&self, output: &mut [u8], input: &[u8], lanes: &mut [u32]) -> Transcoded {
        let Config { src, dest, .. } = self.config;

        let units = widen(src, self.swap_src, input, lanes);
        let lanes = &mut lanes[..units];

        merge(src, self.tier, lanes);

        let complete = truncate(src, lanes);
        let lanes = &mut lanes[..complete];

        decode(src, lanes);
        let produced = encode(dest, self.swap_dest, lanes, output);

        Transcoded {
            produced,
            consumed: complete,
        }
    }

    /// Allocating wrapper around [`transcode`](Self::transcode) for callers
    /// that hold the whole input in memory. The returned bytes are exactly
    /// the produced units.
    pub fn transcode_to_vec(&self, input: &[u8]) -> (Vec<u8>, Transcoded) {
        let mut lanes = vec![0u32; self.lanes_needed(input.len())];
        let mut output = vec![0u8; self.output_capacity(input.len())];
        let result = self.transcode(&mut output, input, &mut lanes);
        output.truncate(result.produced * self.config.dest.width());
        (output, result)
    }

    /// Bytes of source input covered by `result.consumed`.
    #[inline]
    pub fn consumed_bytes(&self, result: Transcoded) -> usize {
        result.consumed * self.config.src.width()
    }

    /// Bytes of output covered by `result.produced`.
    #[inline]
    pub fn produced_bytes(&self, result: Transcoded) -> usize {
        result.produced * self.config.dest.width()
    }
}
