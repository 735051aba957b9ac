//! quarterly-metrics CLI - derived metrics from quarterly disclosures
//!
//! ## Example Usage
//!
//! ```bash
//! # Enrich one company's disclosures
//! quarterly-metrics run 7203_disclosures.csv --prices 7203_prices.csv --output 7203.csv
//!
//! # Latest-quarter snapshot for every code in a list
//! quarterly-metrics batch codes.csv --data-dir ./data --output snapshots.csv
//!
//! # Show resolved configuration
//! quarterly-metrics info
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use quarterly_metrics::batch::{
    read_code_list, write_snapshots_csv, BatchRunner, CodeEntry, CompanyInput,
};
use quarterly_metrics::config::{PipelineConfig, YearAgoPolicy};
use quarterly_metrics::data::{
    read_disclosures, read_price_series, write_enriched, write_enriched_csv, write_json,
};
use quarterly_metrics::pipeline::MetricsPipeline;
use quarterly_metrics::pricing::PriceSeries;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

/// quarterly-metrics: growth, yield and discount metrics from quarterly disclosures
#[derive(Parser)]
#[command(name = "quarterly-metrics")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Robert Fall")]
#[command(about = "Derived financial metrics from quarterly disclosures", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich one company's disclosures
    Run {
        /// Disclosure CSV file
        #[arg(value_name = "DISCLOSURES")]
        disclosures: PathBuf,

        /// Daily price CSV file (date, open)
        #[arg(short, long)]
        prices: Option<PathBuf>,

        /// Fiscal year end month (1-12); the configured month if omitted
        #[arg(short, long)]
        fiscal_month: Option<u32>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,

        /// Only compare year-ago quarters that carry the same quarter label
        #[arg(long)]
        match_quarter: bool,
    },

    /// Latest-quarter snapshot for every company in a code list
    Batch {
        /// CSV file with `code,name` columns and an optional `fiscal_month`
        #[arg(value_name = "CODELIST")]
        codelist: PathBuf,

        /// Directory holding `<code>_disclosures.csv` and `<code>_prices.csv`
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Snapshot CSV output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show version and resolved configuration
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

/// Configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Config {
    #[serde(default = "default_data_dir")]
    data_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    output_dir: PathBuf,
    #[serde(default)]
    pipeline: PipelineConfig,
}

fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".quarterly-metrics")
}

fn default_data_dir() -> PathBuf {
    app_dir().join("data")
}

fn default_output_dir() -> PathBuf {
    app_dir().join("output")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    fn load(path: Option<&Path>) -> Self {
        let explicit = path.is_some();
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => app_dir().join("config.toml"),
        };

        if !path.exists() {
            if explicit {
                eprintln!(
                    "{} Config file not found: {}",
                    "Warning:".yellow(),
                    path.display()
                );
            }
            return Config::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => return config,
                Err(e) => {
                    eprintln!("{} Failed to parse config: {}", "Warning:".yellow(), e);
                }
            },
            Err(e) => {
                eprintln!("{} Failed to read config: {}", "Warning:".yellow(), e);
            }
        }

        Config::default()
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref());

    if cli.verbose {
        eprintln!(
            "{} v{}",
            "quarterly-metrics".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        );
        eprintln!(
            "Data dir: {}",
            config.data_dir.display().to_string().dimmed()
        );
    }

    let result = match cli.command {
        Commands::Run {
            disclosures,
            prices,
            fiscal_month,
            output,
            format,
            match_quarter,
        } => run_company(RunArgs {
            disclosures,
            prices,
            fiscal_month,
            output,
            format,
            match_quarter,
            verbose: cli.verbose,
            config: &config,
        }),
        Commands::Batch {
            codelist,
            data_dir,
            output,
        } => run_batch(&codelist, data_dir, output, &config),
        Commands::Info => {
            show_info(&config, cli.config.as_deref());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

struct RunArgs<'a> {
    disclosures: PathBuf,
    prices: Option<PathBuf>,
    fiscal_month: Option<u32>,
    output: Option<PathBuf>,
    format: OutputFormat,
    match_quarter: bool,
    verbose: bool,
    config: &'a Config,
}

fn run_company(args: RunArgs<'_>) -> Result<()> {
    let start = Instant::now();

    let records = read_disclosures(&args.disclosures)
        .with_context(|| format!("reading disclosures from {}", args.disclosures.display()))?;
    let prices = match &args.prices {
        Some(path) => read_price_series(path)
            .with_context(|| format!("reading prices from {}", path.display()))?,
        None => PriceSeries::default(),
    };

    let fiscal_month = args
        .fiscal_month
        .unwrap_or(args.config.pipeline.fiscal_year_end_month);

    let mut pipeline_config = PipelineConfig {
        fiscal_year_end_month: fiscal_month,
        ..args.config.pipeline.clone()
    };
    if args.match_quarter {
        pipeline_config.year_ago_policy = YearAgoPolicy::MatchQuarter;
    }

    if args.verbose {
        eprintln!("  {} {}", "Quarters:".bold(), records.len());
        eprintln!("  {} {}", "Price points:".bold(), prices.len());
        eprintln!("  {} {}", "Fiscal year end:".bold(), fiscal_month);
        eprintln!();
    }

    let pipeline = MetricsPipeline::new(pipeline_config)?;
    let output = pipeline.run(records, &prices)?;

    match (&args.output, args.format) {
        (Some(path), OutputFormat::Csv) => write_enriched_csv(path, &output.records)
            .with_context(|| format!("writing {}", path.display()))?,
        (Some(path), OutputFormat::Json) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            write_json(file, &output.records)?;
        }
        (None, OutputFormat::Csv) => write_enriched(io::stdout().lock(), &output.records)?,
        (None, OutputFormat::Json) => write_json(io::stdout().lock(), &output.records)?,
    }

    let summary = &output.summary;
    eprintln!(
        "{} {} quarters in {:.1?} ({} with growth, {} with yield, {} priced)",
        "✓".green().bold(),
        summary.records,
        start.elapsed(),
        summary.with_growth,
        summary.with_yield,
        summary.price_matches
    );
    if let Some(corr) = summary.growth_price_corr {
        eprintln!("  {} {:.3}", "Growth/price correlation:".bold(), corr);
    }
    if let Some(corr) = summary.yield_price_corr {
        eprintln!("  {} {:.3}", "Yield/price correlation:".bold(), corr);
    }
    if let Some(path) = &args.output {
        eprintln!("  {} {}", "Saved to:".bold(), path.display());
    }

    Ok(())
}

fn run_batch(
    codelist: &Path,
    data_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    let data_dir = data_dir.unwrap_or_else(|| config.data_dir.clone());
    let output = output.unwrap_or_else(|| config.output_dir.join("snapshots.csv"));

    let entries = read_code_list(codelist)
        .with_context(|| format!("reading code list {}", codelist.display()))?;
    println!(
        "{} {} companies from {}",
        "Loading".cyan().bold(),
        entries.len(),
        data_dir.display()
    );

    let pb = ProgressBar::new(entries.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut companies = Vec::with_capacity(entries.len());
    let mut unreadable = 0usize;
    for entry in entries {
        pb.set_message(entry.code.clone());
        match load_company(&data_dir, &entry) {
            Ok(company) => companies.push(company),
            Err(e) => {
                unreadable += 1;
                pb.println(format!("{} {}: {:#}", "Skipped".yellow(), entry.code, e));
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("loaded");

    let report = BatchRunner::new(config.pipeline.clone()).run(companies);
    for failure in &report.failures {
        eprintln!(
            "{} {} {}: {}",
            "Failed".red(),
            failure.code,
            failure.name,
            failure.error
        );
    }

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    write_snapshots_csv(&output, &report.snapshots)
        .with_context(|| format!("writing {}", output.display()))?;

    println!(
        "{} {} snapshots, {} failed, {} unreadable",
        "✓".green().bold(),
        report.snapshots.len(),
        report.failures.len(),
        unreadable
    );
    println!("  {} {}", "Saved to:".bold(), output.display());
    Ok(())
}

fn load_company(data_dir: &Path, entry: &CodeEntry) -> Result<CompanyInput> {
    let code = entry.code.as_str();
    let disclosures = data_dir.join(format!("{}_disclosures.csv", code));
    let prices = data_dir.join(format!("{}_prices.csv", code));

    let records = read_disclosures(&disclosures)
        .with_context(|| format!("reading {}", disclosures.display()))?;
    let prices = if prices.exists() {
        read_price_series(&prices).with_context(|| format!("reading {}", prices.display()))?
    } else {
        log::warn!("No price file for {}", code);
        PriceSeries::default()
    };

    let company = CompanyInput::new(code, entry.name.as_str(), records, prices);
    Ok(match entry.fiscal_month {
        Some(month) => company.with_fiscal_year_end_month(month),
        None => company,
    })
}

fn show_info(config: &Config, config_path: Option<&Path>) {
    println!(
        "{} v{}",
        "quarterly-metrics".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("{}", "Configuration".bold());
    let source = config_path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| app_dir().join("config.toml").display().to_string());
    println!("  {} {}", "Config file:".bold(), source);
    println!("  {} {}", "Data dir:".bold(), config.data_dir.display());
    println!("  {} {}", "Output dir:".bold(), config.output_dir.display());
    println!();
    println!("{}", "Pipeline".bold());
    println!(
        "  {} {}",
        "Fiscal year end month:".bold(),
        config.pipeline.fiscal_year_end_month
    );
    println!(
        "  {} {:?}",
        "Year-ago policy:".bold(),
        config.pipeline.year_ago_policy
    );
    println!(
        "  {} {}",
        "Price offset days:".bold(),
        config.pipeline.price_offset_days
    );
}
