// JobRadar - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing
// 2. Config loading and logging initialisation (debug mode support)
// 3. Dispatch to scan / report / export / ban-list commands

use clap::{Parser, Subcommand, ValueEnum};
use jobradar::app::report_store::{self, StoredReport};
use jobradar::app::scan::{preflight, CredentialProvider, ScanEvent, ScanManager, ScanSettings};
use jobradar::core::export;
use jobradar::core::lemma::AnalyzerKind;
use jobradar::core::matching::Matcher;
use jobradar::core::model::{ScanPhase, ScanProgress, ScanReport};
use jobradar::core::sources::{parse_chat_sources_text, parse_search_terms_text};
use jobradar::platform::config::{AppConfig, ConfigStore, PlatformPaths};
use jobradar::util::constants;
use jobradar::util::error::{CredentialKind, ExportError, JobRadarError};
use jobradar::util::logging;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// JobRadar - scan chat channels for recent job postings that match your
/// keyword profile.
#[derive(Parser, Debug)]
#[command(name = "JobRadar", version, about)]
struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the selected chats and print the matches.
    Scan(ScanArgs),

    /// Show the last scan report.
    Report,

    /// Export the last scan report to CSV or JSON.
    Export {
        /// Output file; the format follows the extension unless --format is given.
        path: PathBuf,

        #[arg(short = 'f', long = "format")]
        format: Option<ExportFormat>,
    },

    /// Never report this message link again.
    Ban { link: String },

    /// Remove a message link from the ban list.
    Unban { link: String },

    /// Create the config file if missing and print its location.
    Init,
}

#[derive(clap::Args, Debug)]
struct ScanArgs {
    /// Chats to scan (comma, semicolon or newline separated), replacing the
    /// configured list.
    #[arg(long)]
    chats: Option<String>,

    /// Job title keywords; "/" separates variants.
    #[arg(long)]
    title: Option<String>,

    /// Functional profile keywords.
    #[arg(long)]
    profile: Option<String>,

    /// Industry keywords.
    #[arg(long)]
    industry: Option<String>,

    /// Exclusion phrases.
    #[arg(long)]
    exclude: Option<String>,

    /// Lookback window in days.
    #[arg(long, value_parser = clap::value_parser!(u32).range(
        i64::from(constants::MIN_SCAN_DEPTH_DAYS)..=i64::from(constants::MAX_SCAN_DEPTH_DAYS)
    ))]
    days: Option<u32>,

    /// Morphological analyzer used for keyword matching.
    #[arg(long)]
    analyzer: Option<AnalyzerArg>,

    /// Persist the overrides above to the config file.
    #[arg(long)]
    save: bool,

    /// Also export the matches to this file.
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum AnalyzerArg {
    Snowball,
    Identity,
}

impl From<AnalyzerArg> for AnalyzerKind {
    fn from(arg: AnalyzerArg) -> Self {
        match arg {
            AnalyzerArg::Snowball => AnalyzerKind::Snowball,
            AnalyzerArg::Identity => AnalyzerKind::Identity,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ExportFormat {
    Csv,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let paths = PlatformPaths::resolve();
    let store = match &cli.config {
        Some(path) => ConfigStore::new(path),
        None => ConfigStore::from_platform(&paths),
    };
    let (config, warnings) = store.load();

    logging::init(
        cli.debug,
        config.log_level.as_deref(),
        config.log_file.as_deref(),
    );
    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        config = %store.path().display(),
        "JobRadar starting"
    );
    for warning in &warnings {
        tracing::warn!("{}", warning);
        eprintln!("Warning: {warning}");
    }

    let report_file = report_store::report_path(&paths.data_dir);
    let result = match cli.command {
        Command::Scan(args) => cmd_scan(&store, config, args, &report_file),
        Command::Report => cmd_report(&config, &report_file),
        Command::Export { path, format } => cmd_export(&report_file, &path, format),
        Command::Ban { link } => cmd_set_banned(&store, &link, true),
        Command::Unban { link } => cmd_set_banned(&store, &link, false),
        Command::Init => cmd_init(&store),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

// =============================================================================
// Commands
// =============================================================================

fn cmd_scan(
    store: &ConfigStore,
    mut config: AppConfig,
    args: ScanArgs,
    report_file: &Path,
) -> Result<(), JobRadarError> {
    let overridden = apply_overrides(&mut config, &args);
    if args.save && overridden {
        store.save(&config)?;
        println!("Saved settings to {}", store.path().display());
    }

    let settings = ScanSettings {
        telegram: config.telegram.clone(),
        selected_chats: config.selected_chats.clone(),
        banned_message_links: config.banned_message_links.clone(),
        job_profile: config.job_profile.clone(),
        scan_depth_days: config.scan_depth_days,
    };
    preflight(&settings)?;

    let mut manager = ScanManager::new();
    let credentials: CredentialProvider = Box::new(prompt_credential);
    manager.start_scan(settings, config.analyzer, None, Some(credentials));

    let mut outcome: Option<Result<ScanReport, String>> = None;
    while let Some(event) = manager.next_event() {
        match event {
            ScanEvent::Progress(progress) => print_progress(&progress, &manager),
            ScanEvent::Completed(report) => outcome = Some(Ok(report)),
            ScanEvent::Failed { error } => outcome = Some(Err(error)),
        }
    }
    manager.join();

    let report = match outcome {
        Some(Ok(report)) => report,
        Some(Err(error)) => {
            eprintln!("Scan failed: {error}");
            std::process::exit(1);
        }
        None => {
            eprintln!("Scan ended without a result");
            std::process::exit(1);
        }
    };

    let stored = StoredReport::new(report, config.scan_depth_days, chrono::Utc::now());
    if let Err(e) = report_store::save(&stored, report_file) {
        tracing::warn!(error = %e, "Could not save the last report");
    }

    print_report(&config, &stored.report);

    if let Some(path) = args.export {
        let count = export_records(&stored.report, &path, None)?;
        println!("Exported {count} matches to {}", path.display());
    }
    Ok(())
}

fn cmd_report(config: &AppConfig, report_file: &Path) -> Result<(), JobRadarError> {
    match report_store::load(report_file) {
        Some(stored) => {
            println!(
                "Last scan: {} (depth {} days)",
                stored.finished_at.format(constants::DISPLAY_DATE_FORMAT),
                stored.scan_depth_days
            );
            print_report(config, &stored.report);
        }
        None => println!("No scan report yet. Run `jobradar scan` first."),
    }
    Ok(())
}

fn cmd_export(
    report_file: &Path,
    path: &Path,
    format: Option<ExportFormat>,
) -> Result<(), JobRadarError> {
    let Some(stored) = report_store::load(report_file) else {
        println!("No scan report yet. Run `jobradar scan` first.");
        return Ok(());
    };
    let count = export_records(&stored.report, path, format)?;
    println!("Exported {count} matches to {}", path.display());
    Ok(())
}

fn cmd_set_banned(store: &ConfigStore, link: &str, banned: bool) -> Result<(), JobRadarError> {
    let changed = store.set_banned(link, banned)?;
    let link = link.trim();
    match (changed, banned) {
        (true, true) => println!("Banned {link}"),
        (true, false) => println!("Unbanned {link}"),
        (false, true) => println!("{link} is already banned"),
        (false, false) => println!("{link} is not banned"),
    }
    Ok(())
}

fn cmd_init(store: &ConfigStore) -> Result<(), JobRadarError> {
    if store.ensure_exists()? {
        println!("Created {}", store.path().display());
    } else {
        println!("Config file: {}", store.path().display());
    }
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

/// Apply command-line overrides. Returns true when anything changed.
fn apply_overrides(config: &mut AppConfig, args: &ScanArgs) -> bool {
    let mut changed = false;
    if let Some(ref chats) = args.chats {
        config.selected_chats = parse_chat_sources_text(chats);
        changed = true;
    }
    let keyword_overrides = [
        (&args.title, &mut config.job_profile.title_keywords),
        (&args.profile, &mut config.job_profile.profile_keywords),
        (&args.industry, &mut config.job_profile.industry_keywords),
        (&args.exclude, &mut config.job_profile.exclusion_phrases),
    ];
    for (raw, target) in keyword_overrides {
        if let Some(raw) = raw {
            *target = parse_search_terms_text(raw);
            changed = true;
        }
    }
    if let Some(days) = args.days {
        config.scan_depth_days = days;
        changed = true;
    }
    if let Some(analyzer) = args.analyzer {
        config.analyzer = analyzer.into();
        changed = true;
    }
    changed
}

/// Read a login code or password from stdin. Empty input declines.
fn prompt_credential(kind: CredentialKind) -> Option<String> {
    eprint!("Enter Telegram {kind}: ");
    let _ = std::io::stderr().flush();
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => {
            let value = line.trim_end_matches(&['\r', '\n'][..]).to_string();
            (!value.trim().is_empty()).then_some(value)
        }
    }
}

fn print_progress(progress: &ScanProgress, manager: &ScanManager) {
    let position = format!("[{}/{}]", progress.current_chat_index, progress.total_chats);
    match progress.phase {
        ScanPhase::ChatStart => eprintln!("{position} {}: resolving", progress.current_chat),
        ScanPhase::ChatResolved => eprintln!("{position} {}: scanning", progress.current_chat),
        ScanPhase::MatchFound => eprintln!(
            "{position} {}: match #{}",
            progress.current_chat, progress.matched_count
        ),
        ScanPhase::MessageProgress => eprintln!(
            "{position} {}: {} messages scanned",
            progress.current_chat, progress.scanned_messages
        ),
        ScanPhase::ChatDone => {
            let eta = progress
                .eta(manager.elapsed())
                .map(|d| format!(", about {}s left", d.as_secs()))
                .unwrap_or_default();
            eprintln!(
                "{position} {}: done ({} messages, {} matches{eta})",
                progress.current_chat, progress.scanned_messages, progress.matched_count
            );
        }
    }
}

fn print_report(config: &AppConfig, report: &ScanReport) {
    let status = if report.canceled { " (canceled)" } else { "" };
    println!(
        "Scanned {} chats, {} messages: {} matches{status}",
        report.scanned_chats,
        report.scanned_messages,
        report.matched_records.len()
    );

    let matcher = Matcher::with_analyzer(config.analyzer.build());
    for record in export::sort_newest_first(&report.matched_records) {
        let lemmas = matcher.highlight_lemmas(&record.match_result);
        let preview = logging::shorten(
            &record.text.replace('\n', " "),
            constants::REPORT_TEXT_PREVIEW_CHARS,
        );
        let marked = matcher.lemmatizer().highlight(&preview, &lemmas, "[", "]");
        println!();
        println!(
            "{}  {}  score {}/{}",
            record.published_at.format(constants::DISPLAY_DATE_FORMAT),
            record.channel,
            record.match_result.score,
            record.match_result.active_criteria_count.max(1)
        );
        println!("  {marked}");
        println!("  {}", export::format_matched_terms(&record.match_result));
        if !record.link.is_empty() {
            println!("  {}", record.link);
        }
    }
}

fn export_records(
    report: &ScanReport,
    path: &Path,
    format: Option<ExportFormat>,
) -> Result<usize, ExportError> {
    let format = format.unwrap_or_else(|| {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            ExportFormat::Json
        } else {
            ExportFormat::Csv
        }
    });

    let file = std::fs::File::create(path).map_err(|e| ExportError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let writer = std::io::BufWriter::new(file);
    match format {
        ExportFormat::Csv => export::export_csv(&report.matched_records, writer, path),
        ExportFormat::Json => export::export_json(&report.matched_records, writer, path),
    }
}
