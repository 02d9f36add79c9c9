// Allow pre-existing clippy lints across the codebase
#![allow(
    clippy::collapsible_if,
    clippy::needless_range_loop,
    clippy::identity_op,
    clippy::len_without_is_empty,
    clippy::doc_lazy_continuation,
    clippy::manual_range_contains
)]

/// Use mimalloc as the global allocator for all binaries.
/// The stream harness allocates its chunk, lane and output buffers once per
/// stream; mimalloc keeps that and the CLI's small allocations cheap.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod common;
pub mod stream;
pub mod transcode;
