use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use svgslim::{Options, SlimError, minify_with_options};

#[derive(Parser)]
#[command(name = "svgslim", version, about = "SVG minifier")]
struct Args {
    /// Input SVG file, or - for stdin
    #[arg(default_value = "-")]
    input: String,

    /// Output file, or - for stdout
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Decimal places kept in path coordinates
    #[arg(short, long, default_value_t = 2)]
    precision: u8,

    /// Decimal places kept in arc rotation angles
    #[arg(long, default_value_t = 2)]
    angle_precision: u8,

    /// Douglas-Peucker tolerance for simplifying line runs (0 = off)
    #[arg(long, default_value_t = 0.0)]
    simplify_tolerance: f64,

    /// Keep the XML declaration
    #[arg(long)]
    keep_xml_declaration: bool,

    /// Keep the doctype
    #[arg(long)]
    keep_doctype: bool,

    /// Keep comments
    #[arg(long)]
    keep_comments: bool,

    /// Leave path data untouched
    #[arg(long)]
    no_paths: bool,

    /// Leave filters untouched
    #[arg(long)]
    no_filters: bool,

    /// Leave styles and presentation attributes untouched
    #[arg(long)]
    no_styles: bool,

    /// Leave ids untouched
    #[arg(long)]
    no_ids: bool,

    /// Leave class names untouched
    #[arg(long)]
    no_classes: bool,

    /// Leave attribute order untouched
    #[arg(long)]
    no_sort_attrs: bool,

    /// Print size statistics to stderr
    #[arg(long)]
    stats: bool,
}

fn main() -> ExitCode {
    if let Err(e) = log::set_logger(&LOGGER) {
        eprintln!("failed to install logger: {e}");
    } else {
        log::set_max_level(log::LevelFilter::Warn);
    }

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), SlimError> {
    let input = if args.input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(PathBuf::from(&args.input))?
    };

    let options = Options {
        precision: args.precision,
        angle_precision: args.angle_precision,
        simplify_tolerance: args.simplify_tolerance,
        minify_paths: !args.no_paths,
        minify_filters: !args.no_filters,
        minify_styles: !args.no_styles,
        shorten_ids: !args.no_ids,
        shorten_classes: !args.no_classes,
        remove_comments: !args.keep_comments,
        remove_xml_declaration: !args.keep_xml_declaration,
        remove_doctype: !args.keep_doctype,
        sort_attrs: !args.no_sort_attrs,
    };

    let output = minify_with_options(&input, &options)?;

    if args.stats {
        let before = input.len();
        let after = output.len();
        let pct = if before > 0 {
            100.0 * (before - after.min(before)) as f64 / before as f64
        } else {
            0.0
        };
        eprintln!("{before} -> {after} bytes ({pct:.1}% smaller)");
    }

    if args.output == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(output.as_bytes())?;
        stdout.write_all(b"\n")?;
    } else {
        std::fs::write(PathBuf::from(&args.output), output)?;
    }

    Ok(())
}

static LOGGER: SimpleLogger = SimpleLogger;

/// Minimal stderr logger.
struct SimpleLogger;

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Warn
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{}: {}", record.level().to_string().to_lowercase(), record.args());
        }
    }

    fn flush(&self) {}
}
