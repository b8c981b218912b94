use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use credibility_report::exchange::{export_json, import_json};
use credibility_report::{Error, MatrixDefinition, ReportContext, chart_png, generate_report};

#[derive(Debug, Parser)]
#[command(
    name = "credibility-report",
    about = "Render information-credibility assessments as PDF reports and radar charts",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render the PDF report for a state or export file.
    Report {
        state: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        /// Report language (pl or en).
        #[arg(long, default_value = "pl")]
        lang: String,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Rasterize one primary element's radar chart as PNG.
    Chart {
        state: PathBuf,
        #[arg(long)]
        primary: String,
        #[arg(long, default_value = "chart.png")]
        out: PathBuf,
        /// Edge length in pixels.
        #[arg(long, default_value_t = 512, value_parser = clap::value_parser!(u32).range(16..=4096))]
        size: u32,
    },

    /// Rewrite an export (legacy or current) in the current format.
    Convert { input: PathBuf, output: PathBuf },
}

fn run(cli: Cli) -> Result<(), Error> {
    match cli.command {
        Command::Report {
            state,
            title,
            author,
            lang,
            out_dir,
        } => {
            let matrix = MatrixDefinition::from_env()?;
            let imported = import_json(&std::fs::read_to_string(&state)?)?;
            let mut ctx = ReportContext::new(imported.comments, imported.sources);
            ctx.title = title;
            ctx.author = author;
            ctx.language = lang;
            let path = generate_report(&ctx, &matrix, &out_dir)?;
            println!("{}", path.display());
        }
        Command::Chart {
            state,
            primary,
            out,
            size,
        } => {
            let matrix = MatrixDefinition::from_env()?;
            let imported = import_json(&std::fs::read_to_string(&state)?)?;
            let png = chart_png(&matrix, &imported.comments, &primary, size)?;
            std::fs::write(&out, png)?;
            println!("{}", out.display());
        }
        Command::Convert { input, output } => {
            let imported = import_json(&std::fs::read_to_string(&input)?)?;
            if imported.legacy {
                log::info!("Upgrading legacy export {}", input.display());
            }
            let text = export_json(&imported.comments, &imported.sources, chrono::Utc::now())?;
            std::fs::write(&output, text)?;
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
