mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "docrev",
    version,
    about = "Review and validate fields extracted from documents by a remote analysis service"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a PDF, extract its fields, and show them for review
    Review {
        /// Path to the PDF document
        pdf: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write review rows to a CSV file
        #[arg(short = 'e', long = "export", value_name = "FILE")]
        export: Option<PathBuf>,

        /// Render a page with this field's regions highlighted
        #[arg(long, value_name = "FIELD")]
        highlight: Option<String>,

        /// Page for --highlight (defaults to the field's first region page)
        #[arg(long)]
        page: Option<u32>,

        /// Render zoom factor
        #[arg(long, default_value_t = 2.0)]
        zoom: f64,

        /// Output PNG path for --highlight
        #[arg(long, value_name = "FILE", default_value = "highlight.png")]
        out: PathBuf,
    },
    /// Normalize a saved raw analysis result without any remote call
    Fields {
        /// Path to a saved JSON analysis result
        result_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write review rows to a CSV file
        #[arg(short = 'e', long = "export", value_name = "FILE")]
        export: Option<PathBuf>,
    },
    /// Export review rows from a saved raw result to CSV
    Export {
        /// Path to a saved JSON analysis result
        result_file: PathBuf,

        /// Output CSV path
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: PathBuf,
    },
    /// Show the label -> extraction profile routing table
    Routes,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Review {
            pdf,
            output,
            export,
            highlight,
            page,
            zoom,
            out,
        } => commands::review::run(pdf, &output, export, highlight, page, zoom, out),
        Commands::Fields {
            result_file,
            output,
            export,
        } => commands::fields::run(result_file, &output, export),
        Commands::Export { result_file, out } => commands::export::run(result_file, out),
        Commands::Routes => commands::routes::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
