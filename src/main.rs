use anyhow::{Context, Result};
use clap::Parser;
use refaudit::config::get_config;
use refaudit::parser::split_references;
use refaudit::report::{render, write_report, ReportFormat};
use refaudit::ui::{self, ResolutionProgress, Status};
use refaudit::{Resolver, ResolverOptions};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// refaudit - Check a reference list against Crossref and PubMed
#[derive(Parser, Debug)]
#[command(name = "refaudit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resolve references against Crossref and PubMed and flag missing or retracted ones", long_about = None)]
struct Cli {
    /// Reference list as text (one reference per line); read from stdin when omitted
    #[arg(long, short)]
    text: Option<String>,

    /// Report output path
    #[arg(long, short, default_value = "outputs/report.md")]
    out: PathBuf,

    /// Also list references that resolved cleanly
    #[arg(long)]
    include_ok: bool,

    /// Attach the top registry candidates to references that were not found
    #[arg(long)]
    debug: bool,

    /// Accept the first search candidate without title/year/author checks
    #[arg(long)]
    no_strict: bool,

    /// Report format
    #[arg(long, short, value_enum, default_value_t = ReportFormat::Markdown)]
    format: ReportFormat,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,
}

fn init_tracing(verbose: u8, quiet: bool) {
    let log_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("refaudit={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn read_input(text: Option<String>) -> Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read references from stdin")?;
            Ok(buffer)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = get_config(cli.config.as_deref())?;
    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let references = split_references(&read_input(cli.text)?);
    tracing::info!("Auditing {} references", references.len());

    let options = ResolverOptions::from_config(&config)
        .strict(config.resolution.strict && !cli.no_strict)
        .debug(cli.debug);
    let resolver = Resolver::from_config(&config, options)?;

    let progress = ResolutionProgress::new(references.len(), !cli.quiet && ui::is_terminal());
    let verdicts = resolver
        .resolve_all_with(&references, |_, verdict| progress.advance(verdict))
        .await;
    progress.finish();

    let contents = render(&verdicts, cli.format, cli.include_ok)?;
    write_report(&cli.out, &contents)
        .with_context(|| format!("Failed to write report to {}", cli.out.display()))?;

    if !cli.quiet {
        ui::print_summary(&verdicts);
        ui::print_status(
            Status::Info,
            &format!("Report written to {}", cli.out.display()),
        );
    }

    Ok(())
}
