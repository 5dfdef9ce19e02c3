//! svgpass command-line host
//!
//! Drives the optimization worker over its message channel, or uses the
//! printer and dimension extractor directly.

use std::fs::{self, File};
use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;
use svgpass::{
    decode_request, encode_response, extract_dimensions, parse_file, print_document,
    spawn_worker, Dimensions, OptimizationSettings, Pipeline, Plugin, PluginKind, PluginParams,
    PrinterConfig, Request, Response, WorkerConfig, WorkerHandle, XmlNode,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// SVG serializer and multipass optimizer
#[derive(Parser)]
#[command(name = "svgpass")]
#[command(version)]
#[command(about = "SVG serializer and multipass optimizer", long_about = None)]
struct Cli {
    /// Log more (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize a document until its output stops shrinking
    #[command(visible_alias = "o")]
    Optimize {
        /// Input SVG file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the result
        #[arg(long)]
        pretty: bool,

        /// Decimal places kept by numeric plugins
        #[arg(long)]
        precision: Option<u32>,

        /// JSON settings file (`plugins`, `floatPrecision`, `pretty`)
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Enable a plugin by name
        #[arg(long = "enable", value_name = "PLUGIN")]
        enable: Vec<String>,

        /// Disable a plugin by name
        #[arg(long = "disable", value_name = "PLUGIN")]
        disable: Vec<String>,
    },

    /// Parse and print a document once
    #[command(visible_alias = "f")]
    Format {
        /// Input SVG file
        input: PathBuf,

        /// Pretty-print with line breaks and indentation
        #[arg(long)]
        pretty: bool,

        /// Spaces per indentation level
        #[arg(long, default_value = "4")]
        indent: usize,

        /// Print childless elements as `<name></name>`
        #[arg(long)]
        no_short_tags: bool,
    },

    /// Print the width and height of a document as JSON
    #[command(visible_alias = "d")]
    Dimensions {
        /// Input SVG file
        input: PathBuf,
    },

    /// Answer JSON-lines requests from stdin on stdout
    Serve,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Optimize {
            input,
            output,
            pretty,
            precision,
            settings,
            enable,
            disable,
        } => load_settings(settings.as_ref(), pretty, precision, &enable, &disable)
            .and_then(|settings| run_optimize(&input, output.as_ref(), settings)),
        Commands::Format {
            input,
            pretty,
            indent,
            no_short_tags,
        } => run_format(&input, pretty, indent, no_short_tags),
        Commands::Dimensions { input } => run_dimensions(&input),
        Commands::Serve => run_serve(),
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Logs go to stderr so stdout only carries documents and responses.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();
}

/// Drops comment nodes. The only stage the stock binary registers.
struct RemoveComments;

impl Plugin for RemoveComments {
    fn name(&self) -> &str {
        "removeComments"
    }

    fn kind(&self) -> PluginKind {
        PluginKind::PerItem
    }

    fn visit(&self, node: &mut XmlNode, _params: &PluginParams) -> svgpass::Result<bool> {
        Ok(!matches!(node, XmlNode::Comment(_)))
    }
}

fn default_pipeline() -> Pipeline {
    Pipeline::new().with_plugin(RemoveComments)
}

/// Builds session settings from an optional JSON file, then applies flags.
fn load_settings(
    path: Option<&PathBuf>,
    pretty: bool,
    precision: Option<u32>,
    enable: &[String],
    disable: &[String],
) -> CliResult<OptimizationSettings> {
    let mut settings = match path {
        Some(path) => {
            debug!(path = %path.display(), "reading settings");
            serde_json::from_str(&fs::read_to_string(path)?)?
        }
        None => OptimizationSettings::default(),
    };

    if pretty {
        settings.pretty = true;
    }
    if let Some(precision) = precision {
        settings.float_precision = precision;
    }
    for name in enable {
        settings.plugins.insert(name.clone(), true);
    }
    for name in disable {
        settings.plugins.insert(name.clone(), false);
    }
    Ok(settings)
}

/// Runs the load, process, nextPass cycle through a worker.
fn run_optimize(
    input: &PathBuf,
    output_path: Option<&PathBuf>,
    settings: OptimizationSettings,
) -> CliResult<()> {
    let data = fs::read_to_string(input)?;
    info!(input = %input.display(), bytes = data.len(), "optimizing");

    let worker = spawn_worker(default_pipeline(), WorkerConfig::default())?;

    let dimensions = expect_result(worker.call(Request::load("load", data))?)?;
    debug!(dimensions = %dimensions, "loaded");

    let mut last = expect_result(worker.call(Request::process(1, settings))?)?;
    let mut pass = 1;
    log_pass(pass, &last);

    loop {
        pass += 1;
        let next = expect_result(worker.call(Request::next_pass(pass))?)?;
        if next.is_null() {
            break;
        }
        log_pass(pass, &next);
        last = next;
    }
    worker.shutdown()?;

    let text = last
        .get("data")
        .and_then(Value::as_str)
        .ok_or("worker returned a result without data")?;

    let mut output: Box<dyn Write> = match output_path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout()),
    };
    output.write_all(text.as_bytes())?;
    output.flush()?;

    info!(passes = pass - 1, bytes = text.len(), "optimization complete");
    Ok(())
}

fn expect_result(response: Response) -> CliResult<Value> {
    match response.error {
        Some(error) => Err(error.into()),
        None => Ok(response.result.unwrap_or(Value::Null)),
    }
}

fn log_pass(pass: u64, result: &Value) {
    let size = result
        .get("data")
        .and_then(Value::as_str)
        .map_or(0, |data| data.encode_utf16().count());
    info!(pass, size, "pass complete");
}

fn run_format(input: &PathBuf, pretty: bool, indent: usize, no_short_tags: bool) -> CliResult<()> {
    let document = parse_file(input)?;
    let config = PrinterConfig::pretty(pretty)
        .with_indent_width(indent)
        .with_short_tags(!no_short_tags);
    let printed = print_document(&document, config);

    let mut stdout = io::stdout().lock();
    stdout.write_all(printed.data.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn run_dimensions(input: &PathBuf) -> CliResult<()> {
    let document = parse_file(input)?;
    let dimensions: Dimensions = extract_dimensions(&document).unwrap_or_default();
    println!("{}", serde_json::to_string(&dimensions)?);
    Ok(())
}

/// One request per line in, one response per line out, until stdin closes.
fn run_serve() -> CliResult<()> {
    let worker = spawn_worker(default_pipeline(), WorkerConfig::default())?;
    info!("serving requests on stdin");

    let stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    for line in stdin.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = answer(&worker, &line)?;
        writeln!(stdout, "{}", encode_response(&response)?)?;
        stdout.flush()?;
    }

    worker.shutdown()?;
    Ok(())
}

fn answer(worker: &WorkerHandle, line: &str) -> CliResult<Response> {
    match decode_request(line) {
        Ok(request) => Ok(worker.call(request)?),
        Err(e) => Ok(Response::failure(Value::Null, &e)),
    }
}
