//! `csvsample`: sample a large delimited file into a chartable table

mod args;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sv_data::schema::DEFAULT_PREVIEW_ROWS;
use sv_data::{preview, sample, SampleConfig, SampleResult, Source};

use crate::args::{Args, OutputFormat};

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = args.to_config()?;
    let source = Source::path(&args.path);

    if args.preview {
        return write_preview(source, &config, &args);
    }

    let start = Instant::now();
    info!("Sampling {}", args.path.display());
    let result = sample(source, &config)?;

    let out = open_output(&args)?;
    match args.format {
        OutputFormat::Csv => result.write_csv(out, config.delimiter_byte()?)?,
        OutputFormat::Json => write_json(&result, out)?,
    }

    eprintln!("{}", result.summary());
    eprintln!("Done in {}", humantime::format_duration(round_millis(start.elapsed())));
    Ok(())
}

fn open_output(args: &Args) -> Result<Box<dyn Write>> {
    Ok(match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

fn write_json(result: &SampleResult, mut out: impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, result)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn write_preview(source: Source, config: &SampleConfig, args: &Args) -> Result<()> {
    let preview = preview(source, config, DEFAULT_PREVIEW_ROWS)?;
    let mut out = open_output(args)?;

    match args.format {
        OutputFormat::Json => {
            let hints: serde_json::Map<String, serde_json::Value> = preview
                .hints
                .iter()
                .map(|(name, hint)| Ok((name.clone(), serde_json::to_value(hint)?)))
                .collect::<Result<_, serde_json::Error>>()?;
            serde_json::to_writer_pretty(&mut out, &hints)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            writeln!(out, "{} columns, {} preview rows", preview.schema.len(), preview.rows.len())?;
            for (name, hint) in &preview.hints {
                writeln!(out, "{}: {}", name, serde_json::to_string(hint)?)?;
            }
        }
    }

    out.flush()?;
    Ok(())
}

fn round_millis(elapsed: std::time::Duration) -> std::time::Duration {
    std::time::Duration::from_millis(elapsed.as_millis() as u64)
}
