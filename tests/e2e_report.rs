// JobRadar - tests/e2e_report.rs
//
// End-to-end tests for the configuration -> scan -> report -> export path.
//
// Each test works in a temporary directory: a config.toml is written by hand,
// loaded through `ConfigStore`, scanned in demo mode, and the result is
// persisted and exported the way the CLI does it.

use chrono::{TimeZone, Utc};
use jobradar::app::report_store::{self, StoredReport};
use jobradar::app::scan::{run_scan_at, ScanHooks, ScanSettings};
use jobradar::core::export::{export_csv, export_json};
use jobradar::core::matching::Matcher;
use jobradar::core::model::ScanReport;
use jobradar::platform::config::{AppConfig, ConfigStore};
use std::fs::File;
use std::io::BufWriter;
use tempfile::TempDir;

// =============================================================================
// Helpers
// =============================================================================

const CONFIG: &str = r#"
selected_chats = ["@jobs", "@jobs https://t.me/fintech_jobs"]
scan_depth_days = 7

[job_profile]
title_keywords = ["Директор"]
profile_keywords = ["развитие"]
industry_keywords = ["финтех"]

[matching]
analyzer = "snowball"
"#;

fn write_config(dir: &TempDir) -> ConfigStore {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, CONFIG).unwrap();
    ConfigStore::new(path)
}

fn settings_from(config: &AppConfig) -> ScanSettings {
    ScanSettings {
        telegram: config.telegram.clone(),
        selected_chats: config.selected_chats.clone(),
        banned_message_links: config.banned_message_links.clone(),
        job_profile: config.job_profile.clone(),
        scan_depth_days: config.scan_depth_days,
    }
}

fn scan(config: &AppConfig) -> ScanReport {
    let matcher = Matcher::with_analyzer(config.analyzer.build());
    let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
    run_scan_at(&settings_from(config), None, &matcher, &mut ScanHooks::new(), now).unwrap()
}

// =============================================================================
// Tests
// =============================================================================

/// A hand-written config drives a demo scan over the expanded source list.
#[test]
fn e2e_config_drives_demo_scan() {
    let dir = TempDir::new().unwrap();
    let (config, warnings) = write_config(&dir).load();
    assert!(warnings.is_empty(), "warnings: {warnings:?}");

    let report = scan(&config);

    assert_eq!(report.scanned_chats, 2);
    assert_eq!(report.scanned_messages, 6);
    let links: Vec<&str> = report.matched_records.iter().map(|r| r.link.as_str()).collect();
    assert_eq!(
        links,
        vec!["https://t.me/jobs/101", "https://t.me/fintech_jobs/101"]
    );
}

/// Banning a link through the store hides it from the next scan.
#[test]
fn e2e_banned_link_is_excluded_from_next_scan() {
    let dir = TempDir::new().unwrap();
    let store = write_config(&dir);

    assert!(store.set_banned("https://t.me/jobs/101", true).unwrap());
    assert!(!store.set_banned("https://t.me/jobs/101", true).unwrap());

    let (config, _) = store.load();
    let report = scan(&config);
    assert_eq!(report.matched_records.len(), 1);
    assert_eq!(report.matched_records[0].link, "https://t.me/fintech_jobs/101");

    assert!(store.set_banned("https://t.me/jobs/101", false).unwrap());
    let (config, _) = store.load();
    assert_eq!(scan(&config).matched_records.len(), 2);
}

/// The stored report survives a save/load cycle and exports to both formats.
#[test]
fn e2e_report_persist_and_export() {
    let dir = TempDir::new().unwrap();
    let (config, _) = write_config(&dir).load();
    let report = scan(&config);

    let path = report_store::report_path(&dir.path().join("data"));
    let finished_at = Utc.with_ymd_and_hms(2026, 3, 10, 12, 5, 0).unwrap();
    report_store::save(&StoredReport::new(report, 7, finished_at), &path).unwrap();

    let stored = report_store::load(&path).expect("stored report");
    assert_eq!(stored.scan_depth_days, 7);
    assert_eq!(stored.finished_at, finished_at);
    let records = &stored.report.matched_records;
    assert_eq!(records.len(), 2);

    let csv_path = dir.path().join("matches.csv");
    let written = export_csv(
        records,
        BufWriter::new(File::create(&csv_path).unwrap()),
        &csv_path,
    )
    .unwrap();
    assert_eq!(written, 2);
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("date,message,link,channel,matched_terms"));
    assert!(csv.contains("https://t.me/fintech_jobs/101"));
    assert!(csv.contains("title: директор"));
    assert!(csv.contains("industry: финтех"));

    let json_path = dir.path().join("matches.json");
    export_json(
        records,
        BufWriter::new(File::create(&json_path).unwrap()),
        &json_path,
    )
    .unwrap();
    let rows: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows[0]["score"].as_u64().unwrap() >= 2);
    assert_eq!(rows[0]["channel"], "@jobs");
}
