//! pagereflow-host - replays a watcher script against a document and writes
//! the debug report the guard analyzes.
//!
//! Exit status: 0 on success, 2 when a reflow pass had to be rolled back
//! (the report is still written), 1 on I/O or parse errors.

use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use colored::Colorize;

use pagereflow::{Document, EditScript, PageGeometry, Session};

#[derive(Parser)]
#[command(name = "pagereflow-host")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Replay an edit script and write a pagination debug report", long_about = None)]
struct Args {
    /// Accepted for launcher compatibility
    #[arg(long)]
    disable_setuid_sandbox: bool,

    /// Accepted for launcher compatibility
    #[arg(long)]
    no_sandbox: bool,

    /// Watcher (edit) script
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Document file
    #[arg(value_name = "DOC")]
    doc: PathBuf,

    /// Report path
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Page size when the script does not set one
    #[arg(long, value_enum, default_value = "letter")]
    page_size: PageSize,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PageSize {
    /// US Letter, 1 inch margins
    Letter,
    /// A4, 1 inch margins
    A4,
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    match run(&args) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<i32, Box<dyn std::error::Error>> {
    if args.disable_setuid_sandbox || args.no_sandbox {
        log::debug!("sandbox flags given; this host runs no sandbox");
    }

    let geometry = match args.page_size {
        PageSize::Letter => PageGeometry::letter(),
        PageSize::A4 => PageGeometry::a4(),
    };
    let doc = Document::from_path(&args.doc)?;
    let script = EditScript::from_path(&args.script)?;

    let mut session = Session::with_engine(doc, geometry)?;
    let run = session.run_script(&script)?;
    run.report.write_to(&args.output)?;

    println!(
        "{} {} samples, {} trace events to {}",
        "Wrote".green(),
        run.report.samples.len(),
        run.report.trace.len(),
        args.output.display()
    );

    if run.diverged_passes > 0 {
        log::warn!("{} reflow pass(es) did not converge", run.diverged_passes);
        return Ok(2);
    }
    Ok(0)
}
