//! Shared helpers used by the `ytscoped` binary.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use ys_collect::{HaltReason, RunSummary};
use ys_config::{CollectorConfig, API_KEY_ENV};
use ys_data::Analyzer;

/// Build-time version string.
///
/// `YTSCOPED_VERSION` from the build environment wins; otherwise the crate
/// package version is used.
pub const VERSION: &str = match option_env!("YTSCOPED_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};

/// One line of `ytscoped check` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: &'static str,
    pub ok: bool,
    pub detail: String,
}

impl Check {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            ok: true,
            detail: detail.into(),
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            ok: false,
            detail: detail.into(),
        }
    }
}

/// Creates `dir` if needed and proves a file can be written inside it.
pub fn ensure_writable(dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir)?;
    let marker = dir.join(".ytscoped-write-test");
    fs::write(&marker, b"ok")?;
    fs::remove_file(&marker)?;
    Ok(())
}

/// Pre-flight checks run before starting the server or an extraction.
pub fn preflight(config: &CollectorConfig) -> Vec<Check> {
    let mut checks = Vec::new();

    checks.push(match config.validate() {
        Ok(()) => Check::pass("config", format!("{} search phrases", config.search_phrases.len())),
        Err(e) => Check::fail("config", e.to_string()),
    });

    checks.push(match config.api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => Check::pass("api key", format!("{API_KEY_ENV} set")),
        _ => Check::fail("api key", format!("{API_KEY_ENV} is not set")),
    });

    checks.push(match config.reset_tz() {
        Ok(tz) => Check::pass("quota reset timezone", tz.name()),
        Err(e) => Check::fail("quota reset timezone", e.to_string()),
    });

    checks.push(match config.data_dir() {
        Ok(dir) => match ensure_writable(&dir) {
            Ok(()) => Check::pass("data directory", dir.display().to_string()),
            Err(e) => Check::fail("data directory", format!("{}: {}", dir.display(), e)),
        },
        Err(e) => Check::fail("data directory", e.to_string()),
    });

    checks
}

/// Human-readable report printed after a foreground extraction.
pub fn format_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Queries:  {}/{} completed",
        summary.completed_queries, summary.total_queries
    );
    let _ = writeln!(out, "Videos:   {}", summary.videos_collected);
    let _ = writeln!(out, "Channels: {}", summary.channels_collected);
    let _ = writeln!(
        out,
        "Quota:    {}/{} units ({} requests)",
        summary.quota.used, summary.quota.limit, summary.quota.requests
    );
    match summary.halted {
        Some(HaltReason::QuotaExceeded) => {
            let _ = writeln!(out, "Halted:   daily quota exhausted; rerun after reset to resume");
        }
        Some(HaltReason::Stopped) => {
            let _ = writeln!(out, "Halted:   stopped; rerun to resume");
        }
        None => {}
    }
    for path in [
        &summary.exported.videos,
        &summary.exported.channels,
        &summary.exported.summary,
    ]
    .into_iter()
    .flatten()
    {
        let _ = writeln!(out, "Wrote:    {}", path.display());
    }
    if !summary.exported.per_query.is_empty() {
        let _ = writeln!(
            out,
            "Wrote:    {} per-query CSV files",
            summary.exported.per_query.len()
        );
    }
    out
}

/// Writes the JSON analysis report for the newest exports in `data_dir`.
pub fn write_report(data_dir: &Path) -> anyhow::Result<PathBuf> {
    let analyzer = Analyzer::load(data_dir)?;
    Ok(analyzer.export_report(data_dir, chrono::Local::now())?)
}
