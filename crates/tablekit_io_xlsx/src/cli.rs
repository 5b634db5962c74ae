use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::convert::generate_xlsx;
use crate::spec::SpecConvertOptions;

/// CLI arguments for the `tablekit_xlsx` binary.
#[derive(Debug, Parser)]
#[command(about = "Convert semicolon-delimited text tables into a styled XLSX workbook.")]
pub struct Args {
    /// Input text file; blank lines separate sheets.
    #[arg(default_value = "xlsx_generate.txt")]
    input: PathBuf,

    /// Output workbook path.
    #[arg(short, long, default_value = "output.xlsx")]
    output: PathBuf,

    /// Maximum worker threads used to style sheets (default: CPU count, capped at 8).
    #[arg(long)]
    workers: Option<usize>,

    /// Keep Excel's default column widths.
    #[arg(long = "no-autofit")]
    no_autofit: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    run_with_args(args)
}

/// Map CLI flags onto the default conversion options.
pub fn derive_convert_options(args: &Args) -> SpecConvertOptions {
    let mut options = SpecConvertOptions {
        num_workers_max: args.workers,
        ..Default::default()
    };
    options.autofit.if_enabled = !args.no_autofit;
    options
}

pub fn run_with_args(args: Args) -> Result<()> {
    let options = derive_convert_options(&args);
    let report = generate_xlsx(&args.input, &args.output, &options).with_context(|| {
        format!(
            "failed to convert {} into {}",
            args.input.display(),
            args.output.display()
        )
    })?;

    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    println!(
        "Excel file generated: {} ({} sheet(s), {} warning(s))",
        args.output.display(),
        report.sheets.len(),
        report.warnings.len()
    );
    Ok(())
}
