// Command-line front end for oxilz.
//
// Explicit subcommands with long-form options:
//   compress / decompress  whole-buffer codec between files or stdio
//   roundtrip              time compression and decompression of a file
//   inspect                list the tokens of a compressed file
//   config                 print build features and format constants

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::compress::decoder::Decoder;
use crate::compress::encoder::{CompressOptions, Encoder};
use crate::io::{RoundTripStats, hex_digest, roundtrip_file};
use crate::lz77::matcher::MatchStrategy;
use crate::lz77::{
    DEFAULT_WINDOW_SIZE, EscapedFixedWidth, Format, MAX_MATCH_LEN, MAX_WINDOW_SIZE, MIN_MATCH_LEN,
    Token, TokenIter, TokenRecord, TokenStats, VlqTagged, WireFormat,
};

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Byte size parsing (supports K, M suffixes)
// ---------------------------------------------------------------------------

fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size string".into());
    }
    let (num_part, multiplier) = match s.as_bytes().last() {
        Some(b'k' | b'K') => (&s[..s.len() - 1], 1024u64),
        Some(b'm' | b'M') => (&s[..s.len() - 1], 1024 * 1024),
        _ => (s, 1u64),
    };
    let num: u64 = num_part
        .trim()
        .parse()
        .map_err(|e| format!("invalid size '{s}': {e}"))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| format!("size overflow: '{s}'"))
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// LZ77 sliding-window compressor.
#[derive(Parser, Debug)]
#[command(
    name = "oxilz",
    version,
    about = "LZ77 sliding-window compressor",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Compress an input stream.
    Compress(CompressArgs),
    /// Decompress an input stream.
    Decompress(DecompressArgs),
    /// Compress and decompress a file, reporting timings and verifying the result.
    Roundtrip(RoundtripArgs),
    /// Print the token stream of a compressed file.
    Inspect(InspectArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// 0xFF-escaped literals, fixed-width 4-byte matches.
    Escaped,
    /// 0x00-tagged matches with VLQ offset and length.
    Vlq,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Escaped => Format::EscapedFixedWidth,
            FormatArg::Vlq => Format::VlqTagged,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    HashChain,
    BruteForce,
}

impl From<StrategyArg> for MatchStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::HashChain => MatchStrategy::HashChain,
            StrategyArg::BruteForce => MatchStrategy::BruteForce,
        }
    }
}

#[derive(Args, Debug)]
struct TuningArgs {
    /// Match window size in bytes (supports K/M suffix).
    #[arg(long = "window-size", value_parser = parse_byte_size, default_value_t = DEFAULT_WINDOW_SIZE as u64)]
    window_size: u64,

    /// Match search strategy. Does not change the output.
    #[arg(long, value_enum, default_value_t = StrategyArg::HashChain)]
    strategy: StrategyArg,
}

#[derive(Args, Debug)]
struct CompressArgs {
    /// Wire format.
    #[arg(long, value_enum, default_value_t = FormatArg::Escaped)]
    format: FormatArg,

    #[command(flatten)]
    tuning: TuningArgs,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Check/compute only (do not write output).
    #[arg(long = "check-only")]
    no_output: bool,

    /// Input file (default: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DecompressArgs {
    /// Wire format of the input.
    #[arg(long, value_enum, default_value_t = FormatArg::Escaped)]
    format: FormatArg,

    /// Fail if the decoded output would exceed this size (supports K/M suffix).
    #[arg(long = "max-output", value_parser = parse_byte_size)]
    max_output: Option<u64>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Check/compute only (do not write output).
    #[arg(long = "check-only")]
    no_output: bool,

    /// Input file (default: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RoundtripArgs {
    /// Wire format.
    #[arg(long, value_enum, default_value_t = FormatArg::Escaped)]
    format: FormatArg,

    #[command(flatten)]
    tuning: TuningArgs,

    /// File to compress.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Wire format of the input.
    #[arg(long, value_enum, default_value_t = FormatArg::Escaped)]
    format: FormatArg,

    /// Compressed input file.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

// ---------------------------------------------------------------------------
// Resolved options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Compress,
    Decompress,
    Roundtrip,
    Inspect,
    Config,
}

#[derive(Debug)]
struct Options {
    command: Command,
    format: Format,
    strategy: MatchStrategy,
    window_size: u64,
    max_output: Option<u64>,
    use_stdout: bool,
    no_output: bool,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
}

fn resolve_options(cli: Cli) -> Options {
    let mut opts = Options {
        command: Command::Config,
        format: Format::default(),
        strategy: MatchStrategy::default(),
        window_size: DEFAULT_WINDOW_SIZE as u64,
        max_output: None,
        use_stdout: false,
        no_output: false,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
        input_file: None,
        output_file: None,
    };

    match cli.command {
        Cmd::Compress(args) => {
            opts.command = Command::Compress;
            opts.format = args.format.into();
            opts.strategy = args.tuning.strategy.into();
            opts.window_size = args.tuning.window_size;
            opts.use_stdout = args.stdout;
            opts.no_output = args.no_output;
            opts.input_file = args.input;
            opts.output_file = args.output;
        }
        Cmd::Decompress(args) => {
            opts.command = Command::Decompress;
            opts.format = args.format.into();
            opts.max_output = args.max_output;
            opts.use_stdout = args.stdout;
            opts.no_output = args.no_output;
            opts.input_file = args.input;
            opts.output_file = args.output;
        }
        Cmd::Roundtrip(args) => {
            opts.command = Command::Roundtrip;
            opts.format = args.format.into();
            opts.strategy = args.tuning.strategy.into();
            opts.window_size = args.tuning.window_size;
            opts.input_file = Some(args.input);
        }
        Cmd::Inspect(args) => {
            opts.command = Command::Inspect;
            opts.format = args.format.into();
            opts.input_file = Some(args.input);
        }
        Cmd::Config => {}
    }

    opts
}

/// Build `CompressOptions`, rejecting window sizes that do not fit `usize`.
/// Format limits are checked by the encoder.
fn build_compress_options(opts: &Options) -> Result<CompressOptions, String> {
    let window_size = usize::try_from(opts.window_size)
        .map_err(|_| format!("window size {} is too large", opts.window_size))?;
    Ok(CompressOptions {
        format: opts.format,
        window_size,
        strategy: opts.strategy,
    })
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("oxilz".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let opts = resolve_options(cli);
        let _ = build_compress_options(&opts);
    }
}

// ---------------------------------------------------------------------------
// I/O helpers
// ---------------------------------------------------------------------------

fn read_input(path: Option<&Path>) -> Result<Vec<u8>, String> {
    let mut data = Vec::new();
    match path {
        Some(path) => {
            File::open(path)
                .and_then(|mut f| f.read_to_end(&mut data))
                .map_err(|e| format!("input file: {}: {e}", path.display()))?;
        }
        None => {
            io::stdin()
                .lock()
                .read_to_end(&mut data)
                .map_err(|e| format!("read error: {e}"))?;
        }
    }
    Ok(data)
}

fn open_output(opts: &Options) -> Result<Box<dyn Write>, String> {
    if opts.no_output {
        return Ok(Box::new(io::sink()));
    }
    match (&opts.output_file, opts.use_stdout) {
        (Some(path), false) => {
            if path.exists() && !opts.force {
                return Err(format!(
                    "output file exists, use -f to overwrite: {}",
                    path.display()
                ));
            }
            let f = File::create(path)
                .map_err(|e| format!("output file: {}: {e}", path.display()))?;
            Ok(Box::new(BufWriter::with_capacity(BUF_SIZE, f)))
        }
        _ => Ok(Box::new(BufWriter::with_capacity(
            BUF_SIZE,
            io::stdout().lock(),
        ))),
    }
}

fn write_output(opts: &Options, data: &[u8]) -> Result<(), String> {
    let mut writer = open_output(opts)?;
    writer
        .write_all(data)
        .and_then(|()| writer.flush())
        .map_err(|e| format!("write error: {e}"))
}

fn report_failure(result: Result<(), String>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(msg) => {
            eprintln!("oxilz: {msg}");
            1
        }
    }
}

fn tokens_json(stats: &TokenStats) -> serde_json::Value {
    serde_json::json!({
        "literals": stats.literals,
        "matches": stats.matches,
        "matched_bytes": stats.matched_bytes,
    })
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("oxilz version {version} (Rust), Copyright (C) oxilz contributors");
    eprintln!("Licensed under the MIT License");

    let file_io = cfg!(feature = "file-io") as u8;
    let ptr_size = std::mem::size_of::<*const ()>();

    eprintln!("FILE_IO={file_io}");
    eprintln!("DEFAULT_FORMAT={}", Format::default());
    eprintln!("DEFAULT_STRATEGY={}", MatchStrategy::default().name());
    eprintln!("DEFAULT_WINDOW_SIZE={DEFAULT_WINDOW_SIZE}");
    eprintln!("MIN_MATCH_LEN={MIN_MATCH_LEN}");
    eprintln!("ESCAPED_MAX_WINDOW_SIZE={MAX_WINDOW_SIZE}");
    eprintln!("ESCAPED_MAX_MATCH_LEN={MAX_MATCH_LEN}");
    eprintln!("sizeof(usize)={ptr_size}");

    0
}

// ---------------------------------------------------------------------------
// Compress command
// ---------------------------------------------------------------------------

fn cmd_compress(opts: &Options) -> i32 {
    report_failure(run_compress(opts))
}

fn run_compress(opts: &Options) -> Result<(), String> {
    let compress_opts = build_compress_options(opts)?;
    let mut encoder = Encoder::new(compress_opts).map_err(|e| format!("compress error: {e}"))?;
    let input = read_input(opts.input_file.as_deref())?;
    let output = encoder
        .compress(&input)
        .map_err(|e| format!("compress error: {e}"))?;
    write_output(opts, &output)?;

    let stats = encoder.stats();
    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "oxilz: compress: format {}, window {}, strategy {}: {} -> {} bytes \
             ({} literals, {} matches)",
            opts.format,
            encoder.options().window_size,
            opts.strategy.name(),
            input.len(),
            output.len(),
            stats.literals,
            stats.matches,
        );
    }

    if opts.json_output {
        let json = serde_json::json!({
            "command": "compress",
            "format": opts.format.name(),
            "window_size": encoder.options().window_size,
            "strategy": opts.strategy.name(),
            "input_size": input.len(),
            "output_size": output.len(),
            "tokens": tokens_json(&stats),
        });
        eprintln!("{json:#}");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Decompress command
// ---------------------------------------------------------------------------

fn cmd_decompress(opts: &Options) -> i32 {
    report_failure(run_decompress(opts))
}

fn run_decompress(opts: &Options) -> Result<(), String> {
    let input = read_input(opts.input_file.as_deref())?;
    let limit = opts
        .max_output
        .map_or(usize::MAX, |m| usize::try_from(m).unwrap_or(usize::MAX));
    let mut decoder = Decoder::with_output_limit(opts.format, limit);
    let output = decoder
        .decompress(&input)
        .map_err(|e| format!("decompress error: {e}"))?;
    write_output(opts, &output)?;

    let stats = decoder.stats();
    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "oxilz: decompress: format {}: {} -> {} bytes ({} literals, {} matches)",
            opts.format,
            input.len(),
            output.len(),
            stats.literals,
            stats.matches,
        );
    }

    if opts.json_output {
        let json = serde_json::json!({
            "command": "decompress",
            "format": opts.format.name(),
            "input_size": input.len(),
            "output_size": output.len(),
            "tokens": tokens_json(&stats),
        });
        eprintln!("{json:#}");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Roundtrip command
// ---------------------------------------------------------------------------

fn cmd_roundtrip(opts: &Options) -> i32 {
    report_failure(run_roundtrip(opts))
}

fn run_roundtrip(opts: &Options) -> Result<(), String> {
    let path = opts
        .input_file
        .as_deref()
        .ok_or("roundtrip requires an input file")?;
    let compress_opts = build_compress_options(opts)?;
    let stats = roundtrip_file(path, &compress_opts).map_err(|e| e.to_string())?;

    if !opts.quiet {
        print_roundtrip(&stats).map_err(|e| format!("write error: {e}"))?;
    }

    if opts.json_output {
        let json = serde_json::json!({
            "command": "roundtrip",
            "format": stats.format.name(),
            "window_size": stats.window_size,
            "strategy": opts.strategy.name(),
            "input_size": stats.input_size,
            "compressed_size": stats.compressed_size,
            "ratio": stats.ratio(),
            "compress_secs": stats.compress_time.as_secs_f64(),
            "decompress_secs": stats.decompress_time.as_secs_f64(),
            "tokens": tokens_json(&stats.tokens),
            "sha256": stats.input_sha256.as_ref().map(hex_digest),
        });
        eprintln!("{json:#}");
    }

    Ok(())
}

fn print_roundtrip(stats: &RoundTripStats) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let mib = stats.input_size as f64 / (1024.0 * 1024.0);
    writeln!(out, "Format:              {}", stats.format)?;
    writeln!(out, "Window size:         {}", stats.window_size)?;
    writeln!(out, "Source size:         {mib:.2} MiB")?;
    writeln!(
        out,
        "Compression time:    {:.3} s",
        stats.compress_time.as_secs_f64()
    )?;
    writeln!(
        out,
        "Compression speed:   {:.2} MiB/s",
        stats.compress_mib_per_sec()
    )?;
    writeln!(out, "Compression ratio:   {:.2}%", stats.ratio() * 100.0)?;
    writeln!(
        out,
        "Decompression time:  {:.3} s",
        stats.decompress_time.as_secs_f64()
    )?;
    writeln!(
        out,
        "Decompression speed: {:.2} MiB/s",
        stats.decompress_mib_per_sec()
    )?;
    if let Some(digest) = &stats.input_sha256 {
        writeln!(out, "SHA-256:             {}", hex_digest(digest))?;
    }
    writeln!(out, "Result:              round trip verified")?;
    out.flush()
}

// ---------------------------------------------------------------------------
// Inspect command
// ---------------------------------------------------------------------------

fn cmd_inspect(opts: &Options) -> i32 {
    report_failure(run_inspect(opts))
}

fn run_inspect(opts: &Options) -> Result<(), String> {
    let input = read_input(opts.input_file.as_deref())?;
    let mut out = BufWriter::with_capacity(BUF_SIZE, io::stdout().lock());
    let result = match opts.format {
        Format::EscapedFixedWidth => {
            list_tokens(TokenIter::<EscapedFixedWidth>::new(&input), &mut out, opts)
        }
        Format::VlqTagged => list_tokens(TokenIter::<VlqTagged>::new(&input), &mut out, opts),
    };
    out.flush().map_err(|e| format!("write error: {e}"))?;
    let (stats, produced) = result?;

    if opts.json_output {
        let json = serde_json::json!({
            "command": "inspect",
            "format": opts.format.name(),
            "input_size": input.len(),
            "output_size": produced,
            "tokens": tokens_json(&stats),
        });
        eprintln!("{json:#}");
    }
    Ok(())
}

/// Print one line per token. Literal runs are listed byte by byte only at
/// `-v`; otherwise consecutive literals collapse into one line.
fn list_tokens<F: WireFormat, W: Write>(
    mut iter: TokenIter<'_, F>,
    out: &mut W,
    opts: &Options,
) -> Result<(TokenStats, usize), String> {
    let write_err = |e: io::Error| format!("write error: {e}");
    let mut stats = TokenStats::default();
    // (input_pos, output_pos, count) of the pending literal run
    let mut run: Option<(usize, usize, usize)> = None;

    if !opts.quiet {
        writeln!(out, "{:>10}  {:>10}  token", "input", "output").map_err(write_err)?;
    }

    for record in iter.by_ref() {
        let record: TokenRecord = record.map_err(|e| format!("{}: {e}", F::FORMAT))?;
        stats.record(record.token);
        if opts.quiet {
            continue;
        }
        match record.token {
            Token::Literal(byte) if opts.verbose > 0 => {
                writeln!(
                    out,
                    "{:>10}  {:>10}  literal {byte:#04x}",
                    record.input_pos, record.output_pos
                )
                .map_err(write_err)?;
            }
            Token::Literal(_) => {
                let pending = run.get_or_insert((record.input_pos, record.output_pos, 0));
                pending.2 += 1;
            }
            Token::Match(m) => {
                if let Some((input_pos, output_pos, count)) = run.take() {
                    writeln!(out, "{input_pos:>10}  {output_pos:>10}  literals x{count}")
                        .map_err(write_err)?;
                }
                writeln!(
                    out,
                    "{:>10}  {:>10}  match offset {} length {}",
                    record.input_pos, record.output_pos, m.offset, m.length
                )
                .map_err(write_err)?;
            }
        }
    }
    if let Some((input_pos, output_pos, count)) = run.take() {
        writeln!(out, "{input_pos:>10}  {output_pos:>10}  literals x{count}").map_err(write_err)?;
    }

    let produced = iter.produced();
    if !opts.quiet {
        writeln!(
            out,
            "{} literals, {} matches ({} matched bytes), {} bytes decoded",
            stats.literals, stats.matches, stats.matched_bytes, produced
        )
        .map_err(write_err)?;
    }
    Ok((stats, produced))
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run() -> ! {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = Cli::parse();
    let mut opts = resolve_options(cli);

    if opts.use_stdout && !opts.quiet
        && let Some(path) = opts.output_file.take()
    {
        eprintln!(
            "oxilz: warning: -c option overrides output filename: {}",
            path.display()
        );
    }

    let exit_code = match opts.command {
        Command::Compress => cmd_compress(&opts),
        Command::Decompress => cmd_decompress(&opts),
        Command::Roundtrip => cmd_roundtrip(&opts),
        Command::Inspect => cmd_inspect(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
