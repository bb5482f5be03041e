use crate::config::load_config;
use crate::layout::compute_layout;
use crate::layout_dump::{layout_summary, layout_to_json, write_layout_dump};
use crate::parser::parse_steps;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "stepd", version, about = "Layered layout for workflow step diagrams")]
pub struct Args {
    /// Input file (step map, step list or text) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Rows,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level);
    debug!(args:?; "Parsed arguments");
    run_with_args(&args)
}

fn init_logger(level: &str) {
    let filter = level.parse().unwrap_or_else(|_| {
        eprintln!("Invalid log level: {level}. Using 'warn' instead.");
        log::LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(filter)
        .init();
}

pub fn run_with_args(args: &Args) -> Result<()> {
    let config = load_config(args.config.as_deref()).context("failed to load config")?;
    let input = read_input(args.input.as_deref())?;

    let steps = parse_steps(&input)?;
    let layout = compute_layout(&steps, &config.layout)?;
    info!(rows = layout.rows.len(), nodes = layout.node_count(); "Layout computed");

    match (args.format, args.output.as_deref()) {
        (OutputFormat::Json, Some(path)) => write_layout_dump(path, &layout)
            .with_context(|| format!("failed to write {}", path.display()))?,
        (OutputFormat::Json, None) => println!("{}", layout_to_json(&layout)?),
        (OutputFormat::Rows, output) => write_output(&layout_summary(&layout), output)?,
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn write_output(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
        }
        None => {
            print!("{}", text);
        }
    }
    Ok(())
}
