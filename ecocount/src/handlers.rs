use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::ArgMatches;
use colored::Colorize;
use ecocount_core::report::{OutputFormat, render, save_report};
use ecocount_core::{CounterScraper, Dataset, Frequency};
use ecocount_scanner::{EcoDisplayMap, HttpFetcher};
use ecocount_scanner::fetch::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Options for a single fetch
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub site_id: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub freq: Frequency,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub strict: bool,
    pub dump_html: Option<PathBuf>,
}

impl FetchOptions {
    pub fn new(site_id: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            start: None,
            end: None,
            freq: Frequency::Day,
            format: OutputFormat::Table,
            output: None,
            base_url: EcoDisplayMap::DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            strict: false,
            dump_html: None,
        }
    }
}

/// Parse a command-line date: `YYYY-MM-DD` (midnight UTC) or RFC 3339
pub fn parse_date_arg(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .ok_or_else(|| format!("Invalid date '{}'", s));
    }
    DateTime::parse_from_rfc3339(s.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| format!("Invalid date '{}': expected YYYY-MM-DD", s))
}

pub fn parse_frequency(s: &str) -> Result<Frequency, String> {
    Frequency::from_str(s).map_err(|e| e.to_string())
}

/// Expand `~` in a user-supplied path
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Build fetch options from the `fetch` subcommand's arguments
pub fn fetch_options_from_args(args: &ArgMatches) -> Result<FetchOptions> {
    let site_id = args
        .get_one::<String>("site")
        .context("--site is required")?;
    let mut options = FetchOptions::new(site_id.as_str());

    options.start = args.get_one::<DateTime<Utc>>("start").copied();
    options.end = args.get_one::<DateTime<Utc>>("end").copied();
    if let Some(freq) = args.get_one::<Frequency>("freq") {
        options.freq = *freq;
    }
    if let Some(format) = args.get_one::<String>("format") {
        options.format = OutputFormat::from_str(format)
            .with_context(|| format!("Unknown output format '{}'", format))?;
    }
    options.output = args.get_one::<String>("output").map(|p| expand_path(p));
    options.dump_html = args.get_one::<String>("dump-html").map(|p| expand_path(p));
    if let Some(base_url) = args.get_one::<String>("base-url") {
        options.base_url = base_url.clone();
    }
    if let Some(timeout) = args.get_one::<u64>("timeout") {
        options.timeout_secs = *timeout;
    }
    options.strict = args.get_flag("strict");

    Ok(options)
}

pub fn build_scraper(options: &FetchOptions) -> Result<CounterScraper> {
    let fetcher = HttpFetcher::with_options(options.timeout_secs, DEFAULT_USER_AGENT)
        .context("Failed to create HTTP client")?;
    let source = EcoDisplayMap::with_base_url(options.base_url.as_str());

    Ok(CounterScraper::with_parts(options.site_id.as_str(), fetcher, source)
        .with_strict(options.strict)
        .with_debug(options.dump_html.is_some()))
}

/// Execute a fetch with the given options.
/// Returns the dataset together with the scraper, which now holds the site metadata.
pub async fn execute_fetch(options: &FetchOptions) -> Result<(Dataset, CounterScraper)> {
    let scraper = build_scraper(options)?;
    let dataset = scraper
        .fetch_counts(options.start, options.end, options.freq)
        .await
        .with_context(|| format!("Failed to fetch counts for site {}", options.site_id))?;

    if let Some(path) = &options.dump_html
        && let Some(html) = scraper.last_html()
    {
        fs::write(path, html)
            .with_context(|| format!("Failed to write page to {}", path.display()))?;
    }

    Ok((dataset, scraper))
}

/// Write the dataset to `options.output`, or return it rendered for the screen
pub fn write_output(dataset: &Dataset, options: &FetchOptions) -> Result<Option<String>> {
    match &options.output {
        Some(path) => {
            save_report(dataset, options.format, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            Ok(None)
        }
        None => Ok(Some(render(dataset, options.format))),
    }
}

/// True when CSV or JSON data goes to stdout, so status text must go to stderr
pub fn status_to_stderr(options: &FetchOptions) -> bool {
    options.output.is_none() && options.format != OutputFormat::Table
}

/// Same decision as [`status_to_stderr`], taken from the raw command line
pub fn banner_to_stderr(matches: &ArgMatches) -> bool {
    match matches.subcommand() {
        Some(("fetch", sub_matches)) => {
            sub_matches.get_one::<String>("output").is_none()
                && sub_matches
                    .get_one::<String>("format")
                    .is_some_and(|format| format != "table")
        }
        _ => false,
    }
}

fn emit(text: &str, to_stderr: bool) {
    if to_stderr {
        eprint!("{}", text);
    } else {
        print!("{}", text);
    }
}

pub fn print_banner(to_stderr: bool) {
    let rule = "═".repeat(60).bright_blue().bold();
    let banner = format!(
        "{}\n{}\n{}\n\n",
        rule,
        "  ECOCOUNT - bicycle counter data".bright_white().bold(),
        rule
    );
    emit(&banner, to_stderr);
}

fn init_tracing(args: &ArgMatches) {
    if args.get_flag("verbose") {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message);
    spinner
}

fn site_summary(scraper: &CounterScraper) -> String {
    let mut out = String::new();
    match scraper.metadata() {
        Some(metadata) => {
            let name = metadata.name().unwrap_or("unknown site");
            out.push_str(&format!(
                "{} {} ({})\n",
                "✓".green().bold(),
                name.bright_white(),
                metadata.site_id
            ));
            if let Some(location) = metadata.location() {
                out.push_str(&format!(
                    "  {} {}, {}\n",
                    "Location:".blue(),
                    location.lat,
                    location.lon
                ));
            }
            if let Some(first) = metadata.first_data() {
                out.push_str(&format!("  {} {}\n", "First data:".blue(), first.date_naive()));
            }
            for (code, name) in &metadata.direction_names {
                out.push_str(&format!("  {} {} = {}\n", "Direction".blue(), code.cyan(), name));
            }
        }
        None => out.push_str(&format!(
            "{} Site {} returned no direction data\n",
            "⚠".yellow().bold(),
            scraper.site_id()
        )),
    }
    out
}

pub async fn handle_fetch(sub_matches: &ArgMatches, quiet: bool) {
    init_tracing(sub_matches);

    let options = match fetch_options_from_args(sub_matches) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("✗ {:#}", e);
            std::process::exit(1);
        }
    };

    let progress = (!quiet).then(|| {
        spinner(format!(
            "Fetching site {} ({})...",
            options.site_id,
            options.freq.granularity()
        ))
    });

    let result = execute_fetch(&options).await;
    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    let (dataset, scraper) = match result {
        Ok(result) => result,
        Err(e) => {
            eprintln!("✗ {:#}", e);
            std::process::exit(1);
        }
    };

    if !quiet {
        let mut summary = site_summary(&scraper);
        summary.push_str(&format!("  {} {}\n", "Rows:".blue(), dataset.len()));
        if dataset.is_empty() {
            summary.push_str(&format!(
                "{} No counts found for this period\n",
                "⚠".yellow().bold()
            ));
        }
        summary.push('\n');
        emit(&summary, status_to_stderr(&options));
    }

    match write_output(&dataset, &options) {
        Ok(Some(rendered)) => print!("{}", rendered),
        Ok(None) => {
            if let Some(path) = &options.output
                && !quiet
            {
                println!(
                    "{} Saved to {}",
                    "✓".green().bold(),
                    path.display().to_string().bright_white()
                );
            }
        }
        Err(e) => {
            eprintln!("✗ {:#}", e);
            std::process::exit(1);
        }
    }
}

pub async fn handle_info(sub_matches: &ArgMatches) {
    init_tracing(sub_matches);

    let site_id = match sub_matches.get_one::<String>("site") {
        Some(site_id) => site_id.clone(),
        None => {
            eprintln!("✗ --site is required");
            std::process::exit(1);
        }
    };
    let mut options = FetchOptions::new(site_id);
    if let Some(base_url) = sub_matches.get_one::<String>("base-url") {
        options.base_url = base_url.clone();
    }
    if let Some(timeout) = sub_matches.get_one::<u64>("timeout") {
        options.timeout_secs = *timeout;
    }

    match execute_fetch(&options).await {
        Ok((_, scraper)) => {
            println!("{}", site_summary(&scraper));
            println!("{}", scraper);
        }
        Err(e) => {
            eprintln!("✗ {:#}", e);
            std::process::exit(1);
        }
    }
}
