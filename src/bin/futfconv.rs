use std::fs::File;
use std::io::{self, Read, Write};
#[cfg(unix)]
use std::mem::ManuallyDrop;
#[cfg(unix)]
use std::os::unix::io::FromRawFd;
use std::path::Path;
use std::process;

use anyhow::Context;
use clap::Parser;
use clap::builder::RangedU64ValueParser;

use utfconv_rs::common::io::open_input;
use utfconv_rs::common::{io_error_msg, reset_sigpipe, tool_name};
use utfconv_rs::stream::{DEFAULT_CHUNK_UNITS, StreamError, StreamStats, transcode_stream};
use utfconv_rs::transcode::{ByteOrder, Config, Label, Transcoder};

#[derive(Parser)]
#[command(
    name = "utfconv",
    about = "Convert FILE, or standard input, between UTF-8, UTF-16 and UTF-32.",
    after_help = "With no FILE, or when FILE is -, read standard input.\n\n\
        ENCODING is one of utf-8, utf-16, utf-16be, utf-16le, utf-32, utf-32be or\n\
        utf-32le (case-insensitive, the dash is optional). A label that names a\n\
        byte order overrides --from-endian/--to-endian; byte order is ignored\n\
        for UTF-8. Malformed UTF-8 is dropped from the output; unpaired UTF-16\n\
        surrogates are passed through. Input that ends inside a sequence is an\n\
        error.\n\n\
        Set RUST_LOG=debug to trace each chunk on standard error.",
    version
)]
struct Cli {
    /// Encoding of the input
    #[arg(short = 'f', long = "from", value_name = "ENCODING")]
    from: Label,

    /// Encoding of the output
    #[arg(short = 't', long = "to", value_name = "ENCODING")]
    to: Label,

    /// Byte order of the input: big or little
    #[arg(long = "from-endian", value_name = "ORDER", default_value_t = ByteOrder::Big)]
    from_endian: ByteOrder,

    /// Byte order of the output: big or little
    #[arg(long = "to-endian", value_name = "ORDER", default_value_t = ByteOrder::Big)]
    to_endian: ByteOrder,

    /// Input code units read per chunk
    #[arg(
        short = 'c',
        long = "chunk-size",
        value_name = "UNITS",
        default_value_t = DEFAULT_CHUNK_UNITS,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    chunk_units: usize,

    /// Merge one sequence at a time instead of in lane blocks
    #[arg(long = "scalar")]
    scalar: bool,

    /// Write to OUTPUT instead of standard output
    #[arg(short = 'o', long = "output", value_name = "OUTPUT")]
    output: Option<String>,

    /// File to convert (reads stdin if omitted or -)
    file: Option<String>,
}

/// Raw fd stdout for unbuffered chunk writes on Unix.
/// Each write is already a whole converted chunk.
#[cfg(unix)]
#[inline]
fn raw_stdout() -> ManuallyDrop<File> {
    unsafe { ManuallyDrop::new(File::from_raw_fd(1)) }
}

fn main() {
    reset_sigpipe();

    #[cfg(target_os = "linux")]
    utfconv_rs::common::enlarge_pipes();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let name = tool_name(env!("CARGO_BIN_NAME"));

    match run(&cli) {
        Ok(stats) => log::info!(
            "{} chunks, {} units read, {} units written",
            stats.chunks,
            stats.units_read,
            stats.units_written
        ),
        Err(e) => {
            if is_broken_pipe(&e) {
                process::exit(0);
            }
            eprintln!("{}: {}", name, render_error(&e));
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<StreamStats> {
    let config = Config::from_labels(cli.from, cli.to, cli.from_endian, cli.to_endian);
    let transcoder = if cli.scalar {
        Transcoder::scalar(config)
    } else {
        Transcoder::new(config)
    };

    let filename = cli.file.as_deref().unwrap_or("-");
    let display_name = if filename == "-" {
        "standard input"
    } else {
        filename
    };

    let mut reader: Box<dyn Read> = if filename == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(open_input(Path::new(filename)).with_context(|| filename.to_string())?)
    };

    match cli.output.as_deref() {
        Some(path) if path != "-" => {
            let mut file = File::create(path).with_context(|| path.to_string())?;
            convert(&mut reader, &mut file, &transcoder, cli.chunk_units, display_name)
        }
        _ => convert_to_stdout(&mut reader, &transcoder, cli.chunk_units, display_name),
    }
}

#[cfg(unix)]
fn convert_to_stdout(
    reader: &mut impl Read,
    transcoder: &Transcoder,
    chunk_units: usize,
    display_name: &str,
) -> anyhow::Result<StreamStats> {
    let mut raw = raw_stdout();
    convert(reader, &mut *raw, transcoder, chunk_units, display_name)
}

#[cfg(not(unix))]
fn convert_to_stdout(
    reader: &mut impl Read,
    transcoder: &Transcoder,
    chunk_units: usize,
    display_name: &str,
) -> anyhow::Result<StreamStats> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    convert(reader, &mut out, transcoder, chunk_units, display_name)
}

fn convert(
    reader: &mut impl Read,
    writer: &mut impl Write,
    transcoder: &Transcoder,
    chunk_units: usize,
    display_name: &str,
) -> anyhow::Result<StreamStats> {
    transcode_stream(reader, writer, transcoder, chunk_units)
        .with_context(|| display_name.to_string())
}

/// IO error somewhere in the chain, looking through `StreamError::Io`.
fn io_cause<'a>(e: &'a (dyn std::error::Error + 'static)) -> Option<&'a io::Error> {
    match e.downcast_ref::<StreamError>() {
        Some(StreamError::Io(io)) => Some(io),
        Some(_) => None,
        None => e.downcast_ref::<io::Error>(),
    }
}

fn is_broken_pipe(e: &anyhow::Error) -> bool {
    e.chain()
        .filter_map(io_cause)
        .any(|io| io.kind() == io::ErrorKind::BrokenPipe)
}

/// "context: message" with OS error suffixes stripped.
fn render_error(e: &anyhow::Error) -> String {
    e.chain()
        .map(|cause| match io_cause(cause) {
            Some(io) => io_error_msg(io),
            None => cause.to_string(),
        })
        .collect::<Vec<_>>()
        .join(": ")
}
