// JobRadar - app/scan.rs
//
// Scan lifecycle management. Resolves each selected source through a message
// source, filters its recent messages, scores them, and collects the matches
// into a deduplicated report.
//
// Architecture:
//   - `run_scan` is the synchronous pipeline. Live and demo scans share it;
//     demo mode swaps in `DemoSource` when no credentials are configured.
//   - Observers are injected through `ScanHooks`. A failing hook is logged and
//     treated as a no-op.
//   - `ScanManager` runs the pipeline on a background thread and streams
//     `ScanEvent`s over an mpsc channel; an `Arc<AtomicBool>` cancel flag
//     stops the scan cooperatively.
//
// Failure policy:
//   - Partial credentials, missing transport, and declined login secrets are
//     fatal and abort the run.
//   - Resolve and load failures are per source: logged, the source is skipped.
//   - Cancellation is checked before every source and every message; matches
//     found before it are kept.

use crate::app::demo::DemoSource;
use crate::app::source::{ApiCredentials, MessageSource, RemoteMessage, ResolvedChat};
use crate::core::dedupe::dedupe_match_records;
use crate::core::lemma::AnalyzerKind;
use crate::core::matching::{effective_threshold, CompiledProfile, Matcher};
use crate::core::model::{
    ChatMessage, JobProfile, MatchRecord, ParsedSource, ScanPhase, ScanProgress, ScanReport, TelegramSettings,
};
use crate::core::sources::{parse_chat_sources_list, parse_source};
use crate::util::constants;
use crate::util::error::{ConfigError, CredentialKind, ScanError, SourceError};
use crate::util::logging::shorten;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

// =============================================================================
// Scan input
// =============================================================================

/// Everything a scan reads from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSettings {
    pub telegram: TelegramSettings,
    /// Raw source entries; normalised and deduplicated at scan start.
    pub selected_chats: Vec<String>,
    /// Message links never reported, compared case-insensitively.
    pub banned_message_links: Vec<String>,
    pub job_profile: JobProfile,
    /// Lookback window, 1-365 days.
    pub scan_depth_days: u32,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            telegram: TelegramSettings::default(),
            selected_chats: Vec::new(),
            banned_message_links: Vec::new(),
            job_profile: JobProfile::default(),
            scan_depth_days: constants::DEFAULT_SCAN_DEPTH_DAYS,
        }
    }
}

/// How completely the transport credentials are filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsState {
    Complete,
    Partial,
    Empty,
}

pub fn credentials_state(telegram: &TelegramSettings) -> CredentialsState {
    match missing_credential_fields(telegram).len() {
        0 => CredentialsState::Complete,
        3 => CredentialsState::Empty,
        _ => CredentialsState::Partial,
    }
}

fn missing_credential_fields(telegram: &TelegramSettings) -> Vec<&'static str> {
    [
        ("api_id", &telegram.api_id),
        ("api_hash", &telegram.api_hash),
        ("phone_number", &telegram.phone_number),
    ]
    .iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| *name)
    .collect()
}

/// Validate complete credentials into the transport's typed form.
pub fn live_credentials(telegram: &TelegramSettings) -> Result<ApiCredentials, ConfigError> {
    let missing = missing_credential_fields(telegram);
    if !missing.is_empty() {
        return Err(ConfigError::PartialCredentials { missing });
    }
    let api_id = telegram.api_id.trim();
    let api_id = api_id.parse::<i32>().map_err(|_| ConfigError::InvalidApiId {
        value: api_id.to_string(),
    })?;
    Ok(ApiCredentials {
        api_id,
        api_hash: telegram.api_hash.trim().to_string(),
        phone_number: telegram.phone_number.trim().to_string(),
    })
}

/// Refuse scans that cannot produce anything: no sources, or no keywords.
pub fn preflight(settings: &ScanSettings) -> Result<(), ScanError> {
    if parse_chat_sources_list(&settings.selected_chats).is_empty() {
        return Err(ScanError::NoSources);
    }
    if settings.job_profile.active_criteria_count() == 0 {
        return Err(ScanError::NoCriteria);
    }
    Ok(())
}

// =============================================================================
// Hooks
// =============================================================================

/// Error type hooks may fail with.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

type ProgressHook<'a> = Box<dyn FnMut(&ScanProgress) -> Result<(), HookError> + 'a>;
type StopHook<'a> = Box<dyn FnMut() -> Result<bool, HookError> + 'a>;
type CredentialHook<'a> = Box<dyn FnMut(CredentialKind) -> Option<String> + 'a>;

/// Optional collaborators invoked synchronously by the scan.
///
/// `None` credentials means nobody can be asked for a login code or password;
/// a scan that needs one fails.
#[derive(Default)]
pub struct ScanHooks<'a> {
    on_progress: Option<ProgressHook<'a>>,
    should_stop: Option<StopHook<'a>>,
    request_credential: Option<CredentialHook<'a>>,
}

impl<'a> ScanHooks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(
        mut self,
        hook: impl FnMut(&ScanProgress) -> Result<(), HookError> + 'a,
    ) -> Self {
        self.on_progress = Some(Box::new(hook));
        self
    }

    pub fn with_stop_check(mut self, hook: impl FnMut() -> Result<bool, HookError> + 'a) -> Self {
        self.should_stop = Some(Box::new(hook));
        self
    }

    /// The hook returns `None` (or an empty string) when the user declines.
    pub fn with_credentials(
        mut self,
        hook: impl FnMut(CredentialKind) -> Option<String> + 'a,
    ) -> Self {
        self.request_credential = Some(Box::new(hook));
        self
    }

    fn emit(&mut self, progress: ScanProgress) {
        if let Some(hook) = self.on_progress.as_mut() {
            if let Err(e) = hook(&progress) {
                tracing::warn!(phase = %progress.phase, error = %e, "Progress hook failed");
            }
        }
    }

    fn stop_requested(&mut self) -> bool {
        match self.should_stop.as_mut() {
            Some(hook) => hook().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Stop check failed; continuing");
                false
            }),
            None => false,
        }
    }

    fn can_request_credentials(&self) -> bool {
        self.request_credential.is_some()
    }

    fn request(&mut self, kind: CredentialKind) -> Result<String, ScanError> {
        let hook = self
            .request_credential
            .as_mut()
            .ok_or(ScanError::CredentialUnavailable { kind })?;
        match hook(kind) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ScanError::CredentialDeclined { kind }),
        }
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Run one scan, choosing live or demo mode from the configured credentials.
///
/// `transport` is only consulted for live scans; demo scans synthesise their
/// messages.
pub fn run_scan(
    settings: &ScanSettings,
    transport: Option<&mut dyn MessageSource>,
    matcher: &Matcher,
    hooks: &mut ScanHooks<'_>,
) -> Result<ScanReport, ScanError> {
    run_scan_at(settings, transport, matcher, hooks, Utc::now())
}

/// [`run_scan`] with an explicit "now" for the lookback cutoff.
pub fn run_scan_at(
    settings: &ScanSettings,
    transport: Option<&mut dyn MessageSource>,
    matcher: &Matcher,
    hooks: &mut ScanHooks<'_>,
    now: DateTime<Utc>,
) -> Result<ScanReport, ScanError> {
    match credentials_state(&settings.telegram) {
        CredentialsState::Partial => Err(ConfigError::PartialCredentials {
            missing: missing_credential_fields(&settings.telegram),
        }
        .into()),
        CredentialsState::Empty => {
            tracing::info!("No Telegram credentials configured; running demo scan");
            let mut demo = DemoSource::new(now);
            scan_sources(
                settings,
                &mut demo,
                matcher,
                hooks,
                now,
                constants::DEMO_PROGRESS_INTERVAL,
            )
        }
        CredentialsState::Complete => {
            let credentials = live_credentials(&settings.telegram)?;
            let transport = transport.ok_or(ScanError::TransportUnavailable)?;
            run_live(settings, transport, &credentials, matcher, hooks, now)
        }
    }
}

fn run_live(
    settings: &ScanSettings,
    transport: &mut dyn MessageSource,
    credentials: &ApiCredentials,
    matcher: &Matcher,
    hooks: &mut ScanHooks<'_>,
    now: DateTime<Utc>,
) -> Result<ScanReport, ScanError> {
    tracing::info!(api_id = credentials.api_id, "Connecting to Telegram");
    transport.connect(credentials)?;

    let outcome = match authorize(transport, &credentials.phone_number, hooks) {
        Ok(()) => scan_sources(
            settings,
            transport,
            matcher,
            hooks,
            now,
            constants::LIVE_PROGRESS_INTERVAL,
        ),
        Err(e) => Err(e),
    };

    if let Err(e) = transport.disconnect() {
        tracing::warn!(error = %e, "Disconnect failed");
    }
    outcome
}

/// Make sure the transport session is signed in, asking for a login code and,
/// when the account has one, the two-factor password.
fn authorize(
    transport: &mut dyn MessageSource,
    phone_number: &str,
    hooks: &mut ScanHooks<'_>,
) -> Result<(), ScanError> {
    if transport.is_authorized()? {
        tracing::info!("Telegram session authorized: reusing existing session");
        return Ok(());
    }

    tracing::info!("Telegram authorization required: requesting login code");
    if !hooks.can_request_credentials() {
        return Err(ScanError::CredentialUnavailable {
            kind: CredentialKind::LoginCode,
        });
    }

    transport.send_code_request(phone_number)?;
    let code = hooks.request(CredentialKind::LoginCode)?;

    match transport.sign_in_with_code(phone_number, code.trim()) {
        Ok(()) => {
            tracing::info!("Telegram authorization completed by login code");
            return Ok(());
        }
        Err(SourceError::PasswordRequired) => tracing::info!("Telegram 2FA required"),
        Err(e) => return Err(e.into()),
    }

    let password = hooks.request(CredentialKind::Password)?;
    transport.sign_in_with_password(&password)?;
    tracing::info!("Telegram authorization completed with 2FA password");
    Ok(())
}

/// Counters and matches accumulated during one run.
struct ScanRun {
    total_chats: usize,
    scanned_chats: usize,
    scanned_messages: usize,
    matches: Vec<MatchRecord>,
    canceled: bool,
}

impl ScanRun {
    fn progress(
        &self,
        phase: ScanPhase,
        current_chat: &str,
        current_chat_index: usize,
        completed_chats: usize,
    ) -> ScanProgress {
        ScanProgress {
            phase,
            current_chat: current_chat.to_string(),
            current_chat_index,
            completed_chats,
            total_chats: self.total_chats,
            scanned_messages: self.scanned_messages,
            matched_count: self.matches.len(),
            latest_match: None,
        }
    }
}

/// Per-run matching context shared by every message.
struct Evaluation<'p> {
    profile: CompiledProfile<'p>,
    active_criteria_count: u8,
    threshold: u8,
}

fn scan_sources(
    settings: &ScanSettings,
    source: &mut dyn MessageSource,
    matcher: &Matcher,
    hooks: &mut ScanHooks<'_>,
    now: DateTime<Utc>,
    progress_interval: usize,
) -> Result<ScanReport, ScanError> {
    let depth_days = settings
        .scan_depth_days
        .clamp(constants::MIN_SCAN_DEPTH_DAYS, constants::MAX_SCAN_DEPTH_DAYS);
    if depth_days != settings.scan_depth_days {
        tracing::warn!(
            requested = settings.scan_depth_days,
            using = depth_days,
            "Scan depth out of range; clamped"
        );
    }
    let cutoff = now - ChronoDuration::days(i64::from(depth_days));

    let expanded = parse_chat_sources_list(&settings.selected_chats);
    tracing::info!(
        raw_count = settings.selected_chats.len(),
        normalized_count = expanded.len(),
        values = %expanded.join(", "),
        "Source normalization"
    );
    tracing::info!(
        days = depth_days,
        cutoff = %cutoff.to_rfc3339(),
        "Date depth setup"
    );
    let sources: Vec<ParsedSource> = expanded.iter().map(|s| parse_source(s)).collect();

    let banned: HashSet<String> = settings
        .banned_message_links
        .iter()
        .map(|link| link.trim().to_lowercase())
        .filter(|link| !link.is_empty())
        .collect();

    let profile = matcher.compile(&settings.job_profile);
    let active_criteria_count = profile.active_criteria_count();
    let threshold = effective_threshold(constants::FIXED_MIN_MATCH_SCORE, active_criteria_count);
    tracing::info!(
        configured = constants::FIXED_MIN_MATCH_SCORE,
        active = active_criteria_count,
        effective = threshold,
        analyzer = matcher.lemmatizer().analyzer_name(),
        "Threshold setup"
    );
    let evaluation = Evaluation {
        profile,
        active_criteria_count,
        threshold,
    };

    let mut run = ScanRun {
        total_chats: sources.len(),
        scanned_chats: 0,
        scanned_messages: 0,
        matches: Vec::new(),
        canceled: false,
    };

    for (position, parsed) in sources.iter().enumerate() {
        let index = position + 1;
        if hooks.stop_requested() {
            run.canceled = true;
            break;
        }
        hooks.emit(run.progress(ScanPhase::ChatStart, &parsed.raw_source, index, run.scanned_chats));

        let chat = match source.resolve(&parsed.chat_ref) {
            Ok(chat) => chat,
            Err(e) => {
                tracing::warn!(source = %parsed.raw_source, error = %e, "Source resolve failed; skipping");
                continue;
            }
        };
        let display_name = chat.display_name(&parsed.raw_source);
        run.scanned_chats += 1;
        tracing::info!(chat = %display_name, "Scanning chat");
        hooks.emit(run.progress(
            ScanPhase::ChatResolved,
            &display_name,
            index,
            run.scanned_chats - 1,
        ));

        let (messages, stopped) = match load_messages(source, &chat, parsed, cutoff, hooks) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(source = %parsed.raw_source, error = %e, "Source read failed; skipping");
                continue;
            }
        };
        if stopped {
            run.canceled = true;
        }

        for message in messages {
            if run.canceled || hooks.stop_requested() {
                run.canceled = true;
                break;
            }

            let text = message.text.as_deref().unwrap_or("");
            if text.trim().is_empty() {
                continue;
            }
            run.scanned_messages += 1;

            let link = source.message_link(&chat, message.id);
            if !link.is_empty() && banned.contains(&link.to_lowercase()) {
                tracing::info!(chat = %display_name, link = %link, "Message skipped by ban list");
                continue;
            }

            let candidate = ChatMessage {
                channel: display_name.clone(),
                published_at: message.date.unwrap_or(now),
                text: text.to_string(),
                link,
            };
            if let Some(record) = evaluate_candidate(&evaluation, candidate) {
                run.matches.push(record.clone());
                let mut found =
                    run.progress(ScanPhase::MatchFound, &display_name, index, run.scanned_chats - 1);
                found.latest_match = Some(record);
                hooks.emit(found);
            }

            if run.scanned_messages % progress_interval == 0 {
                hooks.emit(run.progress(
                    ScanPhase::MessageProgress,
                    &display_name,
                    index,
                    run.scanned_chats - 1,
                ));
            }
        }

        hooks.emit(run.progress(ScanPhase::ChatDone, &display_name, index, run.scanned_chats));
        if run.canceled {
            break;
        }
    }

    let (matched_records, removed) = dedupe_match_records(run.matches);
    if removed > 0 {
        tracing::info!(removed, "Deduplicated matches");
    }
    tracing::info!(
        scanned_chats = run.scanned_chats,
        scanned_messages = run.scanned_messages,
        matches = matched_records.len(),
        canceled = run.canceled,
        "Scan finished"
    );

    Ok(ScanReport {
        scanned_chats: run.scanned_chats,
        scanned_messages: run.scanned_messages,
        matched_records,
        canceled: run.canceled,
    })
}

/// Collect the in-window messages of one source.
///
/// Returns the messages and whether a stop was requested while loading.
/// History is consumed newest-first and loading stops at the first message
/// at or before `cutoff`.
fn load_messages(
    source: &mut dyn MessageSource,
    chat: &ResolvedChat,
    parsed: &ParsedSource,
    cutoff: DateTime<Utc>,
    hooks: &mut ScanHooks<'_>,
) -> Result<(Vec<RemoteMessage>, bool), SourceError> {
    let in_window = |message: &RemoteMessage| message.date.map_or(true, |date| date > cutoff);

    if let Some(message_id) = parsed.message_id {
        let pinned = source.get_message(chat, message_id)?;
        return Ok((pinned.into_iter().filter(in_window).collect(), false));
    }

    let mut loaded = Vec::new();
    let history = source.iter_messages(chat, constants::MAX_MESSAGES_PER_CHAT)?;
    for item in history.take(constants::MAX_MESSAGES_PER_CHAT) {
        if hooks.stop_requested() {
            return Ok((loaded, true));
        }
        let message = item?;
        if !in_window(&message) {
            break;
        }
        loaded.push(message);
    }
    Ok((loaded, false))
}

fn evaluate_candidate(evaluation: &Evaluation<'_>, message: ChatMessage) -> Option<MatchRecord> {
    let channel = message.channel.as_str();
    let shown = message.text.replace('\n', " ");
    tracing::debug!(
        chat = %channel,
        date = %message.published_at.to_rfc3339(),
        link = %message.link,
        text = %shorten(&shown, constants::LOG_TEXT_PREVIEW_CHARS),
        "Scanning message"
    );

    let result = evaluation.profile.evaluate(&message.text);
    if result.excluded {
        tracing::debug!(
            chat = %channel,
            by = %result.matched_exclusion_terms.join(", "),
            "Message excluded"
        );
        return None;
    }

    let out_of = evaluation.active_criteria_count.max(1);
    tracing::debug!(
        chat = %channel,
        score = result.score,
        threshold = evaluation.threshold,
        out_of,
        "Match metrics"
    );
    if result.score < evaluation.threshold {
        return None;
    }

    tracing::info!(
        chat = %channel,
        score = result.score,
        title = %or_dash(&result.matched_title_terms),
        profile = %or_dash(&result.matched_profile_terms),
        industry = %or_dash(&result.matched_industry_terms),
        "Match found"
    );

    Some(MatchRecord {
        channel: message.channel,
        published_at: message.published_at,
        text: message.text,
        link: message.link,
        match_result: result,
    })
}

fn or_dash(terms: &[String]) -> String {
    if terms.is_empty() {
        "-".to_string()
    } else {
        terms.join(", ")
    }
}

// =============================================================================
// ScanManager
// =============================================================================

/// Messages streamed from a background scan.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    Progress(ScanProgress),
    Completed(ScanReport),
    Failed { error: String },
}

/// Asks the user for a login secret from the scan thread.
pub type CredentialProvider = Box<dyn FnMut(CredentialKind) -> Option<String> + Send>;

/// Manages a scan operation on a background thread.
pub struct ScanManager {
    /// Channel receiver for polling scan events.
    pub event_rx: Option<mpsc::Receiver<ScanEvent>>,

    /// Cancel flag shared with the background thread.
    cancel_flag: Option<Arc<AtomicBool>>,

    worker: Option<JoinHandle<()>>,
    started_at: Option<Instant>,
}

impl ScanManager {
    pub fn new() -> Self {
        Self {
            event_rx: None,
            cancel_flag: None,
            worker: None,
            started_at: None,
        }
    }

    /// Start a scan on a background thread.
    ///
    /// Events are sent over the channel; the last one is always `Completed`
    /// or `Failed`. A scan already running is cancelled and joined first.
    pub fn start_scan(
        &mut self,
        settings: ScanSettings,
        analyzer: AnalyzerKind,
        transport: Option<Box<dyn MessageSource + Send>>,
        credentials: Option<CredentialProvider>,
    ) {
        self.cancel_scan();
        self.join();

        let (tx, rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));

        self.event_rx = Some(rx);
        self.cancel_flag = Some(Arc::clone(&cancel));
        self.started_at = Some(Instant::now());

        self.worker = Some(std::thread::spawn(move || {
            scan_worker(settings, analyzer, transport, credentials, tx, cancel);
        }));

        tracing::info!(analyzer = analyzer.as_str(), "Scan started");
    }

    /// Request cancellation of the running scan. The worker still delivers a
    /// `Completed` event with `canceled = true`.
    pub fn cancel_scan(&mut self) {
        if let Some(flag) = &self.cancel_flag {
            flag.store(true, Ordering::SeqCst);
        }
        self.cancel_flag = None;
    }

    /// Block until the next event. `None` once the worker has exited and the
    /// channel is drained.
    pub fn next_event(&self) -> Option<ScanEvent> {
        self.event_rx.as_ref().and_then(|rx| rx.recv().ok())
    }

    /// Time since the current scan started.
    pub fn elapsed(&self) -> Duration {
        self.started_at.map(|t| t.elapsed()).unwrap_or_default()
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Wait for the worker thread to exit.
    pub fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Scan worker panicked");
            }
        }
    }
}

impl Default for ScanManager {
    fn default() -> Self {
        Self::new()
    }
}

fn scan_worker(
    settings: ScanSettings,
    analyzer: AnalyzerKind,
    mut transport: Option<Box<dyn MessageSource + Send>>,
    credentials: Option<CredentialProvider>,
    tx: mpsc::Sender<ScanEvent>,
    cancel: Arc<AtomicBool>,
) {
    let matcher = Matcher::with_analyzer(analyzer.build());
    let progress_tx = tx.clone();

    let mut hooks = ScanHooks::new()
        .with_progress(move |progress| {
            progress_tx
                .send(ScanEvent::Progress(progress.clone()))
                .map_err(|_| "scan event receiver dropped".into())
        })
        .with_stop_check(move || Ok(cancel.load(Ordering::SeqCst)));
    if let Some(mut provider) = credentials {
        hooks = hooks.with_credentials(move |kind| provider(kind));
    }

    let transport_ref = transport
        .as_deref_mut()
        .map(|t| t as &mut dyn MessageSource);
    let event = match run_scan(&settings, transport_ref, &matcher, &mut hooks) {
        Ok(report) => ScanEvent::Completed(report),
        Err(e) => {
            tracing::error!(error = %e, "Scan failed");
            ScanEvent::Failed {
                error: e.to_string(),
            }
        }
    };
    // Receiver dropped means nobody is listening any more; exit quietly.
    let _ = tx.send(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::source::MessageIter;
    use crate::core::lemma::SnowballAnalyzer;
    use crate::core::model::ChatRef;
    use std::cell::Cell;

    fn demo_settings(chats: &[&str]) -> ScanSettings {
        ScanSettings {
            selected_chats: chats.iter().map(|c| c.to_string()).collect(),
            job_profile: JobProfile {
                title_keywords: vec!["директор".to_string()],
                profile_keywords: vec!["развитие".to_string()],
                industry_keywords: vec!["финтех".to_string()],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn snowball() -> Matcher {
        Matcher::with_analyzer(Box::new(SnowballAnalyzer::new()))
    }

    #[test]
    fn test_credentials_state() {
        let mut tg = TelegramSettings::default();
        assert_eq!(credentials_state(&tg), CredentialsState::Empty);
        tg.api_id = "123".to_string();
        assert_eq!(credentials_state(&tg), CredentialsState::Partial);
        tg.api_hash = "hash".to_string();
        tg.phone_number = " +7000 ".to_string();
        assert_eq!(credentials_state(&tg), CredentialsState::Complete);
        tg.phone_number = "   ".to_string();
        assert_eq!(credentials_state(&tg), CredentialsState::Partial);
    }

    #[test]
    fn test_live_credentials_rejects_non_numeric_id() {
        let tg = TelegramSettings {
            api_id: "abc".to_string(),
            api_hash: "hash".to_string(),
            phone_number: "+7000".to_string(),
        };
        assert!(matches!(
            live_credentials(&tg),
            Err(ConfigError::InvalidApiId { .. })
        ));
    }

    #[test]
    fn test_preflight() {
        assert!(matches!(
            preflight(&ScanSettings::default()),
            Err(ScanError::NoSources)
        ));
        let mut settings = demo_settings(&["@jobs"]);
        assert!(preflight(&settings).is_ok());
        settings.job_profile = JobProfile::default();
        assert!(matches!(preflight(&settings), Err(ScanError::NoCriteria)));
    }

    #[test]
    fn test_partial_credentials_are_fatal() {
        let mut settings = demo_settings(&["@jobs"]);
        settings.telegram.api_hash = "hash".to_string();
        let err = run_scan(&settings, None, &snowball(), &mut ScanHooks::new()).unwrap_err();
        match err {
            ScanError::Config(ConfigError::PartialCredentials { missing }) => {
                assert_eq!(missing, vec!["api_id", "phone_number"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_complete_credentials_without_transport_fail() {
        let mut settings = demo_settings(&["@jobs"]);
        settings.telegram = TelegramSettings {
            api_id: "1".to_string(),
            api_hash: "hash".to_string(),
            phone_number: "+7000".to_string(),
        };
        let err = run_scan(&settings, None, &snowball(), &mut ScanHooks::new()).unwrap_err();
        assert!(matches!(err, ScanError::TransportUnavailable));
    }

    #[test]
    fn test_demo_scan_finds_fintech_director() {
        let settings = demo_settings(&["@jobs"]);
        let report = run_scan(&settings, None, &snowball(), &mut ScanHooks::new()).unwrap();
        assert_eq!(report.scanned_chats, 1);
        assert_eq!(report.scanned_messages, 3);
        assert!(!report.canceled);
        assert_eq!(report.matched_records.len(), 1);
        assert_eq!(report.matched_records[0].channel, "@jobs");
        assert_eq!(report.matched_records[0].link, "https://t.me/jobs/101");
    }

    #[test]
    fn test_cancel_before_start() {
        let settings = demo_settings(&["@jobs", "@more_jobs"]);
        let mut hooks = ScanHooks::new().with_stop_check(|| Ok(true));
        let report = run_scan(&settings, None, &snowball(), &mut hooks).unwrap();
        assert_eq!(report.scanned_chats, 0);
        assert!(report.canceled);
        assert!(report.matched_records.is_empty());
    }

    #[test]
    fn test_failing_hooks_are_ignored() {
        let settings = demo_settings(&["@jobs"]);
        let mut hooks = ScanHooks::new()
            .with_progress(|_| Err("observer broke".into()))
            .with_stop_check(|| Err("stop check broke".into()));
        let report = run_scan(&settings, None, &snowball(), &mut hooks).unwrap();
        assert!(!report.canceled);
        assert_eq!(report.matched_records.len(), 1);
    }

    #[test]
    fn test_banned_link_is_skipped_but_counted() {
        let mut settings = demo_settings(&["@jobs"]);
        settings.banned_message_links = vec![" HTTPS://t.me/jobs/101 ".to_string()];
        let report = run_scan(&settings, None, &snowball(), &mut ScanHooks::new()).unwrap();
        assert_eq!(report.scanned_messages, 3);
        assert!(report.matched_records.is_empty());
    }

    #[test]
    fn test_demo_progress_phases() {
        let settings = demo_settings(&["@jobs"]);
        let mut phases = Vec::new();
        let mut hooks = ScanHooks::new().with_progress(|p| {
            phases.push(p.phase);
            Ok(())
        });
        run_scan(&settings, None, &snowball(), &mut hooks).unwrap();
        drop(hooks);
        assert_eq!(
            phases,
            vec![
                ScanPhase::ChatStart,
                ScanPhase::ChatResolved,
                ScanPhase::MatchFound,
                ScanPhase::ChatDone,
            ]
        );
    }

    #[test]
    fn test_stop_mid_scan_keeps_earlier_matches() {
        let settings = demo_settings(&["@first", "@second"]);
        let calls = Cell::new(0usize);
        // Stop once the first chat is fully processed: one check before the
        // chat, three while loading, three per message.
        let mut hooks = ScanHooks::new().with_stop_check(|| {
            calls.set(calls.get() + 1);
            Ok(calls.get() > 7)
        });
        let report = run_scan(&settings, None, &snowball(), &mut hooks).unwrap();
        assert!(report.canceled);
        assert_eq!(report.scanned_chats, 1);
        assert_eq!(report.matched_records.len(), 1);
        assert_eq!(report.matched_records[0].channel, "@first");
    }

    #[test]
    fn test_scan_depth_out_of_range_is_clamped() {
        let mut settings = demo_settings(&["@jobs"]);

        // Zero days would put the cutoff at "now" and drop every sample.
        settings.scan_depth_days = 0;
        let report = run_scan(&settings, None, &snowball(), &mut ScanHooks::new()).unwrap();
        assert_eq!(report.scanned_messages, 3);

        settings.scan_depth_days = u32::MAX;
        let report = run_scan(&settings, None, &snowball(), &mut ScanHooks::new()).unwrap();
        assert_eq!(report.scanned_messages, 3);
        assert_eq!(report.matched_records.len(), 1);
    }

    #[test]
    fn test_demo_progress_heartbeat_every_five_messages() {
        let settings = demo_settings(&["@first", "@second"]);
        let mut heartbeats = Vec::new();
        let mut hooks = ScanHooks::new().with_progress(|p| {
            if p.phase == ScanPhase::MessageProgress {
                heartbeats.push(p.scanned_messages);
            }
            Ok(())
        });
        let report = run_scan(&settings, None, &snowball(), &mut hooks).unwrap();
        drop(hooks);
        assert_eq!(report.scanned_messages, 6);
        assert_eq!(heartbeats, vec![5]);
    }

    /// Live transport that holds the scan in `connect` until released.
    struct GatedSource {
        gate: mpsc::Receiver<()>,
        inner: DemoSource,
    }

    impl MessageSource for GatedSource {
        fn connect(&mut self, _credentials: &ApiCredentials) -> Result<(), SourceError> {
            self.gate.recv().map_err(|_| SourceError::Connection {
                reason: "gate dropped".to_string(),
            })
        }

        fn disconnect(&mut self) -> Result<(), SourceError> {
            Ok(())
        }

        fn is_authorized(&mut self) -> Result<bool, SourceError> {
            Ok(true)
        }

        fn send_code_request(&mut self, _phone_number: &str) -> Result<(), SourceError> {
            Ok(())
        }

        fn sign_in_with_code(&mut self, _phone: &str, _code: &str) -> Result<(), SourceError> {
            Ok(())
        }

        fn sign_in_with_password(&mut self, _password: &str) -> Result<(), SourceError> {
            Ok(())
        }

        fn resolve(&mut self, chat_ref: &ChatRef) -> Result<ResolvedChat, SourceError> {
            self.inner.resolve(chat_ref)
        }

        fn get_message(
            &mut self,
            chat: &ResolvedChat,
            message_id: i64,
        ) -> Result<Option<RemoteMessage>, SourceError> {
            self.inner.get_message(chat, message_id)
        }

        fn iter_messages<'a>(
            &'a mut self,
            chat: &ResolvedChat,
            limit: usize,
        ) -> Result<MessageIter<'a>, SourceError> {
            self.inner.iter_messages(chat, limit)
        }
    }

    #[test]
    fn test_scan_manager_cancel_reaches_worker() {
        let mut settings = demo_settings(&["@first", "@second", "@third"]);
        settings.telegram = TelegramSettings {
            api_id: "1".to_string(),
            api_hash: "hash".to_string(),
            phone_number: "+7000".to_string(),
        };
        let (release, gate) = mpsc::channel();
        let transport = GatedSource {
            gate,
            inner: DemoSource::new(Utc::now()),
        };

        let mut manager = ScanManager::new();
        manager.start_scan(settings, AnalyzerKind::Snowball, Some(Box::new(transport)), None);
        manager.cancel_scan();
        release.send(()).unwrap();

        let report = loop {
            match manager.next_event() {
                Some(ScanEvent::Progress(_)) => {}
                Some(ScanEvent::Completed(report)) => break report,
                Some(ScanEvent::Failed { error }) => panic!("scan failed: {error}"),
                None => panic!("worker exited without a final event"),
            }
        };
        manager.join();

        assert!(report.canceled);
        assert_eq!(report.scanned_chats, 0);
        assert!(report.matched_records.is_empty());
    }

    #[test]
    fn test_scan_manager_streams_events_to_completion() {
        let mut manager = ScanManager::new();
        manager.start_scan(demo_settings(&["@jobs"]), AnalyzerKind::Snowball, None, None);

        let mut progress_events = 0;
        let report = loop {
            match manager.next_event() {
                Some(ScanEvent::Progress(_)) => progress_events += 1,
                Some(ScanEvent::Completed(report)) => break report,
                Some(ScanEvent::Failed { error }) => panic!("scan failed: {error}"),
                None => panic!("worker exited without a final event"),
            }
        };
        manager.join();

        assert!(progress_events >= 3);
        assert_eq!(report.matched_records.len(), 1);
        assert!(!manager.is_running());
    }
}
