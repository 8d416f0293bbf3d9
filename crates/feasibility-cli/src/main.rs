mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::amortize::AmortizeArgs;
use commands::analyze::AnalyzeArgs;
use commands::exit_plan::ExitPlanArgs;
use commands::finance::FinanceArgs;
use commands::improve::ImproveArgs;

/// Franchise-cafe feasibility analysis
#[derive(Parser)]
#[command(
    name = "feas",
    version,
    about = "Franchise-cafe feasibility analysis",
    long_about = "Runs the feasibility engine against a JSON or YAML input file \
                  (or piped stdin): profit/loss projection, viability score and \
                  traffic-light verdict, survival estimate, risk cards, and \
                  optimal exit timing."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log schema self-check deviations instead of failing on them
    #[arg(long, global = true)]
    lenient: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Full decision report: score, signal, survival, risks, exit plan
    Analyze(AnalyzeArgs),
    /// Profit/loss projection only
    Finance(FinanceArgs),
    /// Loan repayment schedule preview
    Amortize(AmortizeArgs),
    /// Exit-cost series and optimal exit month
    ExitPlan(ExitPlanArgs),
    /// Improvement scenario deltas (rent cut, volume swings, refinancing)
    Improve(ImproveArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analyze::run_analyze(args, cli.lenient),
        Commands::Finance(args) => commands::finance::run_finance(args),
        Commands::Amortize(args) => commands::amortize::run_amortize(args),
        Commands::ExitPlan(args) => commands::exit_plan::run_exit_plan(args),
        Commands::Improve(args) => commands::improve::run_improve(args),
        Commands::Version => {
            println!("feas {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
