//! sheetextract - Extract spreadsheet tables to JSON records

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use log::LevelFilter;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use sheetextract::{Config, DateFormat, ExtractError, Extractor};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDateFormat {
    Epoch,
    Iso,
}

impl From<CliDateFormat> for DateFormat {
    fn from(f: CliDateFormat) -> Self {
        match f {
            CliDateFormat::Epoch => DateFormat::Epoch,
            CliDateFormat::Iso => DateFormat::Iso,
        }
    }
}

/// Extract patient and correspondent spreadsheets to JSON records
#[derive(Parser, Debug)]
#[command(name = "sheetextract")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Patients workbook
    #[arg(long)]
    patients: Option<PathBuf>,

    /// Correspondents workbook
    #[arg(long)]
    correspondents: Option<PathBuf>,

    /// TOML file describing sources and output settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the JSON files (default: system temp directory)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Worksheet to read from each workbook (default: first sheet)
    #[arg(long)]
    sheet: Option<String>,

    /// Number of rows shown in each preview
    #[arg(long)]
    preview: Option<usize>,

    /// Encoding of date and duration cells
    #[arg(long, value_enum)]
    date_format: Option<CliDateFormat>,

    /// Indent the JSON output
    #[arg(long)]
    pretty: bool,

    /// Re-read written files and check them against the loaded tables
    #[arg(long)]
    verify: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match cli.config {
        Some(ref path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(path) = cli.patients {
        config.set_input("patients", path);
    }
    if let Some(path) = cli.correspondents {
        config.set_input("correspondents", path);
    }
    if let Some(dir) = cli.out_dir {
        config = config.with_out_dir(dir);
    }
    if let Some(sheet) = cli.sheet {
        config = config.with_sheet_name(sheet);
    }
    if let Some(rows) = cli.preview {
        config = config.with_preview_rows(rows);
    }
    if let Some(format) = cli.date_format {
        config = config.with_date_format(format.into());
    }
    if cli.pretty {
        config = config.with_pretty(true);
    }
    if cli.verify {
        config = config.with_verify(true);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    Extractor::new(config).run(&mut out)?;
    out.flush().context("Failed to flush stdout")?;

    Ok(())
}

fn print_error(error: &anyhow::Error) {
    let read_failure = error
        .downcast_ref::<ExtractError>()
        .is_some_and(ExtractError::is_read_failure);
    let prefix = if read_failure {
        "Error while reading"
    } else {
        "Error"
    };

    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
    let _ = write!(stderr, "{}", prefix);
    let _ = stderr.reset();
    let _ = writeln!(stderr, ": {:#}", error);
}
