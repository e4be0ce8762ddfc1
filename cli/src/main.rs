//! pagereflow CLI - pagination stability analysis and oscillation guard

use std::path::{Path, PathBuf};
use std::process;

use clap::builder::BoolishValueParser;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pagereflow::analyze::{self, JsonFormat};
use pagereflow::guard::{self, GuardConfig, DEFAULT_DOC, DEFAULT_REPORT};
use pagereflow::{
    analyze_all, paginate, AnalyzeOptions, Document, EditScript, FlowPos, PageGeometry, Report,
    Session,
};

type CmdResult = Result<i32, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "pagereflow")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Check pagination reflow for split/join thrashing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one or more debug reports
    Analyze {
        /// Report files
        #[arg(value_name = "INPUT", default_value = DEFAULT_REPORT)]
        inputs: Vec<PathBuf>,

        /// Print the raw analysis as JSON
        #[arg(
            long,
            env = "PAGINATION_DEBUG_ANALYZE_JSON",
            value_parser = BoolishValueParser::new()
        )]
        json: bool,

        /// Exit with status 1 when a report is not stable
        #[arg(
            long,
            env = "PAGINATION_DEBUG_ANALYZE_STRICT",
            value_parser = BoolishValueParser::new()
        )]
        strict: bool,
    },

    /// Run the host session end to end and gate on the analysis
    Guard {
        /// Document to replay
        #[arg(value_name = "DOC", default_value = DEFAULT_DOC)]
        doc: PathBuf,

        /// Report path
        #[arg(value_name = "OUTPUT", default_value = DEFAULT_REPORT)]
        output: PathBuf,
    },

    /// Replay an edit script in-process and write a report
    Simulate {
        /// Document file
        #[arg(value_name = "DOC")]
        doc: PathBuf,

        /// Edit script file
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,

        /// Report path
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_REPORT)]
        output: PathBuf,

        /// Page size
        #[arg(long, value_enum, default_value = "letter")]
        page_size: PageSize,

        /// Landscape orientation
        #[arg(long)]
        landscape: bool,
    },

    /// Lay a document out and list its pages
    Layout {
        /// Document file
        #[arg(value_name = "DOC")]
        doc: PathBuf,

        /// Page size
        #[arg(long, value_enum, default_value = "letter")]
        page_size: PageSize,

        /// Landscape orientation
        #[arg(long)]
        landscape: bool,

        /// Print the layout as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PageSize {
    /// US Letter, 1 inch margins
    Letter,
    /// A4, 1 inch margins
    A4,
}

impl PageSize {
    fn geometry(self, landscape: bool) -> PageGeometry {
        let geometry = match self {
            PageSize::Letter => PageGeometry::letter(),
            PageSize::A4 => PageGeometry::a4(),
        };
        if landscape {
            geometry.landscape()
        } else {
            geometry
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Analyze {
            inputs,
            json,
            strict,
        }) => cmd_analyze(&inputs, json, strict),
        Some(Commands::Guard { doc, output }) => cmd_guard(&doc, &output),
        Some(Commands::Simulate {
            doc,
            script,
            output,
            page_size,
            landscape,
        }) => cmd_simulate(&doc, &script, &output, page_size.geometry(landscape)),
        Some(Commands::Layout {
            doc,
            page_size,
            landscape,
            json,
        }) => cmd_layout(&doc, page_size.geometry(landscape), json),
        Some(Commands::Version) => {
            cmd_version();
            Ok(0)
        }
        None => {
            println!("{}", "Usage: pagereflow <COMMAND>".yellow());
            println!("       pagereflow --help for more information");
            Ok(0)
        }
    };

    match result {
        Ok(0) => {}
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            process::exit(1);
        }
    }
}

fn cmd_analyze(inputs: &[PathBuf], json: bool, strict: bool) -> CmdResult {
    let options = AnalyzeOptions::from_env();
    let reports = inputs
        .iter()
        .map(Report::from_path)
        .collect::<pagereflow::Result<Vec<_>>>()?;
    let analyses = analyze_all(&reports, &options);

    if json {
        let out = match analyses.as_slice() {
            [single] => analyze::to_json(single, JsonFormat::Pretty)?,
            many => serde_json::to_string_pretty(many)?,
        };
        println!("{}", out);
    } else {
        for (path, analysis) in inputs.iter().zip(&analyses) {
            if inputs.len() > 1 {
                println!("{}", path.display().to_string().cyan().bold());
            }
            print!("{}", analyze::to_text(analysis));
        }
    }

    let failed = analyses.iter().filter(|a| !a.ok).count();
    if strict && failed > 0 {
        return Ok(1);
    }
    Ok(0)
}

fn cmd_guard(doc: &Path, output: &Path) -> CmdResult {
    let config = GuardConfig::from_env()
        .with_doc_path(doc)
        .with_output_path(output);

    let outcome = guard::run(&config)?;
    println!(
        "{} {} {} {:?}",
        "Host".cyan().bold(),
        config.host_binary.display(),
        "finished:".dimmed(),
        outcome.host
    );

    print!("{}", analyze::to_text(&outcome.analysis));

    if outcome.analysis.ok {
        println!("\n{}", "Pagination guard passed".green().bold());
        Ok(0)
    } else {
        eprintln!("\n{}", "Pagination guard failed".red().bold());
        for reason in &outcome.analysis.reasons {
            eprintln!("  {} {}", "✗".red(), reason);
        }
        Ok(1)
    }
}

fn cmd_simulate(doc: &Path, script: &Path, output: &Path, geometry: PageGeometry) -> CmdResult {
    let document = Document::from_path(doc)?;
    let script = EditScript::from_path(script)?;
    let mut session = Session::with_engine(document, geometry)?;

    let pb = ProgressBar::new(script.steps.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_message("Replaying edits...");
    let run = session.run_script_with(&script, |_| pb.inc(1))?;
    pb.finish_with_message("Done!");

    run.report.write_to(output)?;

    println!("\n{}", "Session".green().bold());
    println!("  {} pages: {}", "├─".dimmed(), session.layout().page_count());
    println!("  {} samples: {}", "├─".dimmed(), run.report.samples.len());
    println!("  {} trace events: {}", "├─".dimmed(), run.report.trace.len());
    println!("  {} diverged passes: {}", "└─".dimmed(), run.diverged_passes);
    println!("{} {}", "Saved to".green(), output.display());

    Ok(0)
}

fn cmd_layout(doc: &Path, geometry: PageGeometry, json: bool) -> CmdResult {
    let document = Document::from_path(doc)?;
    let layout = paginate(&document, geometry)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&layout)?);
        return Ok(0);
    }

    println!("{}", "Layout".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    if let Some(ref title) = document.title {
        println!("{}: {}", "Title".bold(), title);
    }
    println!("{}: {}", "Units".bold(), document.len());
    println!(
        "{}: {:.0} x {:.0} pt",
        "Content frame".bold(),
        geometry.content_width(),
        geometry.content_height()
    );
    println!("{}: {}", "Pages".bold(), layout.page_count());
    println!();

    for (i, page) in layout.pages.iter().enumerate() {
        println!(
            "  {:>4}  {} .. {}",
            i + 1,
            fmt_pos(page.start),
            fmt_pos(page.end)
        );
    }

    Ok(0)
}

fn fmt_pos(pos: FlowPos) -> String {
    if pos.line == 0 {
        format!("unit {}", pos.unit)
    } else {
        format!("unit {} line {}", pos.unit, pos.line)
    }
}

fn cmd_version() {
    println!("{} {}", "pagereflow".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Pagination reflow stability tooling");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/pagereflow".dimmed());
    println!("License: MIT");
}
