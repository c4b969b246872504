use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL};
use configuration::{Frequency, load_config, load_config_from, settings::Config};
use data_provider::JsonDirectoryProvider;
use evaluator::{
    BatchEvaluator, BatchReport, EvaluationPlan, Metric, Ranking, SortOrder, TickerFailure,
};
use indicatif::ProgressStyle;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

/// The main entry point for the diversifier application.
#[tokio::main]
async fn main() -> Result<()> {
    // The .env file is optional; overrides may also come from the shell.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let logging = init_tracing()?;

    let common = cli.command.common();
    let mut config = match &common.config {
        Some(path) => load_config_from(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => load_config().context("Failed to load config.toml")?,
    };
    if let Some(frequency) = common.frequency {
        config.evaluation.frequency = frequency;
    }

    // Held until exit so buffered file logs are flushed.
    let _guard = match config.logging.directory.as_deref() {
        Some(dir) => Some(logging.add_file(dir)?),
        None => None,
    };

    match cli.command {
        Commands::Evaluate(args) => handle_evaluate(&config, args).await,
        Commands::Score(args) => handle_score(&config, args).await,
        Commands::CheckConfig(_) => handle_check_config(&config),
    }
}

type FileLayer = fmt::Layer<Registry, fmt::format::DefaultFields, fmt::format::Format, NonBlocking>;

/// Handle to the installed subscriber; the file layer stays empty until the
/// configuration names a log directory.
struct Logging {
    file: reload::Handle<Option<FileLayer>, Registry>,
}

impl Logging {
    fn add_file(&self, dir: &Path) -> Result<WorkerGuard> {
        let appender = tracing_appender::rolling::daily(dir, "diversifier.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer().with_writer(writer).with_ansi(false);
        self.file.modify(|file| *file = Some(layer))?;
        tracing::debug!(directory = %dir.display(), "Writing logs to rolling file");
        Ok(guard)
    }
}

fn init_tracing() -> Result<Logging> {
    let (file_layer, file) = reload::Layer::new(None::<FileLayer>);
    let indicatif_layer = IndicatifLayer::new();

    tracing_subscriber::registry()
        .with(file_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .try_init()?;
    Ok(Logging { file })
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Scores candidate assets by how much they improve a stock/bond base portfolio.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every ticker in the configured universe.
    Evaluate(EvaluateArgs),
    /// Score a single candidate ticker against the base portfolio.
    Score(ScoreArgs),
    /// Validate the configuration and print the resolved run plan.
    CheckConfig(CommonArgs),
}

impl Commands {
    fn common(&self) -> &CommonArgs {
        match self {
            Commands::Evaluate(args) => &args.common,
            Commands::Score(args) => &args.common,
            Commands::CheckConfig(common) => common,
        }
    }
}

#[derive(Args)]
struct CommonArgs {
    /// Path to the TOML configuration file [default: config.toml].
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Overrides `[evaluation].frequency` from the configuration.
    #[arg(long, value_enum)]
    frequency: Option<Frequency>,
}

#[derive(Args)]
struct EvaluateArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Print the report as JSON instead of tables.
    #[arg(long)]
    json: bool,

    /// Write the cumulative growth of every blend and the base to this JSON file.
    #[arg(long)]
    cumulative: Option<PathBuf>,

    /// How many tickers to list in each ranked summary (0 to skip them).
    #[arg(long, default_value_t = 5)]
    top: usize,
}

#[derive(Args)]
struct ScoreArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// The candidate ticker (e.g., "gld").
    ticker: String,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn build_evaluator(plan: &EvaluationPlan, config: &Config) -> BatchEvaluator {
    let provider = Arc::new(JsonDirectoryProvider::new(&config.data.directory));
    BatchEvaluator::new(plan.params, provider)
        .with_timeout(plan.timeout)
        .with_max_concurrency(plan.max_concurrency)
}

async fn handle_evaluate(config: &Config, args: EvaluateArgs) -> Result<()> {
    let plan = EvaluationPlan::from_config(config)?;

    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
        .progress_chars("#>-");

    let evaluator = build_evaluator(&plan, config).with_progress_style(style);
    let base = evaluator
        .build_base_portfolio(&plan.base, plan.range)
        .await
        .context("Failed to construct the base portfolio")?;
    let report = evaluator.run(&plan.tickers, &base, plan.range).await;

    if let Some(path) = &args.cumulative {
        let json = serde_json::to_string_pretty(&report.cumulative_returns())?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "Cumulative returns written");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
        if args.top > 0 {
            for ranking in report.summaries(args.top) {
                print_ranking(&ranking);
            }
        }
    }
    Ok(())
}

async fn handle_score(config: &Config, args: ScoreArgs) -> Result<()> {
    let plan = EvaluationPlan::from_config(config)?;
    let evaluator = build_evaluator(&plan, config);
    let base = evaluator
        .build_base_portfolio(&plan.base, plan.range)
        .await
        .context("Failed to construct the base portfolio")?;

    let report = evaluator
        .run(std::slice::from_ref(&args.ticker), &base, plan.range)
        .await;
    if let Some(failure) = report.failures.first() {
        bail!("Could not score '{}': {}", failure.ticker, failure.reason);
    }
    let Some(row) = report.risk_return.get(&args.ticker) else {
        bail!("No result for '{}'", args.ticker);
    };

    println!(
        "{} vs {} ({}% asset)",
        row.ticker, report.base_name, report.asset_weight_percent
    );
    println!("  {:<14}{}", Metric::Wabp.to_string(), fmt_metric(row.wabp));
    println!("  {:<14}{}", Metric::AdditiveSortino.to_string(), fmt_metric(row.additive_sortino));
    println!(
        "  {:<14}{}",
        Metric::AdditiveReturnToMaxDrawdown.to_string(),
        fmt_metric(row.additive_return_to_max_drawdown)
    );
    for failure in &row.failures {
        println!("  {} unavailable: {}", failure.metric, failure.reason);
    }
    Ok(())
}

fn handle_check_config(config: &Config) -> Result<()> {
    let plan = EvaluationPlan::from_config(config)?;
    let (w_asset, w_base) = plan.params.weights.fractions();

    println!("Configuration is valid.");
    println!("  Base portfolio:  {} ({} / {})", plan.base.name, plan.base.stock_ticker, plan.base.bond_ticker);
    println!("  Candidates:      {}", plan.tickers.join(", "));
    println!("  Date range:      {} to {}", plan.range.start, plan.range.end);
    println!("  Periodicity:     {} per year", plan.params.periodicity.periods_per_year());
    println!("  Blend weights:   {:.2} asset / {:.2} base", w_asset, w_base);
    println!(
        "  Rates:           risk-free {:.4}, financing {:.4}",
        plan.params.rates.risk_free_annual, plan.params.rates.financing_annual
    );
    match plan.timeout {
        Some(limit) => println!("  Timeout:         {}s per retrieval", limit.as_secs()),
        None => println!("  Timeout:         none"),
    }
    Ok(())
}

// ==============================================================================
// Report Rendering
// ==============================================================================

fn fmt_metric(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"))
}

fn fmt_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.to_string())
}

fn new_table(header: Vec<String>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_report(report: &BatchReport) {
    println!("\nRisk/return vs {} (run {})", report.base_name, report.run_id);
    let mut risk_table = new_table(
        ["Ticker".to_string(), "Start".to_string(), "End".to_string()]
            .into_iter()
            .chain(
                [
                    Metric::Wabp,
                    Metric::AdditiveSortino,
                    Metric::AdditiveReturnToMaxDrawdown,
                    Metric::Sharpe,
                    Metric::Sortino,
                    Metric::MaxDrawdown,
                ]
                .iter()
                .map(Metric::to_string),
            )
            .collect(),
    );
    for row in report.risk_return.iter() {
        risk_table.add_row(vec![
            Cell::new(&row.ticker),
            Cell::new(fmt_date(row.start_date)),
            Cell::new(fmt_date(row.end_date)),
            Cell::new(fmt_metric(row.wabp)),
            Cell::new(fmt_metric(row.additive_sortino)),
            Cell::new(fmt_metric(row.additive_return_to_max_drawdown)),
            Cell::new(fmt_metric(row.sharpe)),
            Cell::new(fmt_metric(row.sortino)),
            Cell::new(fmt_metric(row.max_drawdown)),
        ]);
    }
    println!("{risk_table}");

    println!("\nBlended portfolios");
    let mut blended_table = new_table(
        std::iter::once("Ticker".to_string())
            .chain(
                [
                    Metric::Return,
                    Metric::Volatility,
                    Metric::Sharpe,
                    Metric::Sortino,
                    Metric::MaxDrawdown,
                    Metric::ReturnToMaxDrawdown,
                ]
                .iter()
                .map(Metric::to_string),
            )
            .chain(std::iter::once(report.wabp_label()))
            .collect(),
    );
    for row in report.blended.iter() {
        blended_table.add_row(vec![
            Cell::new(&row.ticker),
            Cell::new(fmt_metric(row.annualized_return)),
            Cell::new(fmt_metric(row.downside_volatility)),
            Cell::new(fmt_metric(row.sharpe)),
            Cell::new(fmt_metric(row.sortino)),
            Cell::new(fmt_metric(row.max_drawdown)),
            Cell::new(fmt_metric(row.return_to_max_drawdown)),
            Cell::new(fmt_metric(row.wabp)),
        ]);
    }
    println!("{blended_table}");

    if !report.failures.is_empty() {
        print_failures(&report.failures);
    }
}

fn print_ranking(ranking: &Ranking) {
    let direction = match ranking.order {
        SortOrder::Ascending => "lowest",
        SortOrder::Descending => "highest",
    };
    println!("\nTop {} by {} ({direction} first)", ranking.entries.len(), ranking.metric);
    let mut table = new_table(vec!["Ticker".to_string(), ranking.metric.to_string()]);
    for (ticker, value) in &ranking.entries {
        table.add_row(vec![Cell::new(ticker), Cell::new(fmt_metric(*value))]);
    }
    println!("{table}");
}

fn print_failures(failures: &[TickerFailure]) {
    println!("\nSkipped tickers");
    let mut table = new_table(vec!["Ticker".to_string(), "Reason".to_string()]);
    for failure in failures {
        table.add_row(vec![Cell::new(&failure.ticker), Cell::new(&failure.reason)]);
    }
    println!("{table}");
}
