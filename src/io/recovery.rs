use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::model::{Container, Food};

const LOG_FILE: &str = ".recovery.log";

/// Once an append would take the log past this size, the oldest entries
/// are dropped to make room (1 MB).
const MAX_LOG_BYTES: u64 = 1_048_576;

const PREAMBLE: &str = "\
<!-- larder recovery log: data that could not be saved, and deleted foods.
     View with: larder recovery
     Safe to delete once you no longer need it. -->

---
";

/// Replace `path` in one step: write a sibling temp file, then rename it
/// over the target. Readers never see a half-written file.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(parent)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map(|_| ()).map_err(|e| e.error)
}

pub fn recovery_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_FILE)
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryKind {
    /// Payload is the catalog document that failed to save
    Unsaved,
    /// Payload is the JSON record of a removed food
    Deleted,
}

impl RecoveryKind {
    fn as_str(self) -> &'static str {
        match self {
            RecoveryKind::Unsaved => "unsaved",
            RecoveryKind::Deleted => "deleted",
        }
    }
}

impl fmt::Display for RecoveryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecoveryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [RecoveryKind::Unsaved, RecoveryKind::Deleted]
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown recovery entry kind '{}'", s))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecoveryEntry {
    #[serde(serialize_with = "rfc3339_secs")]
    pub at: DateTime<Utc>,
    pub kind: RecoveryKind,
    pub summary: String,
    pub details: IndexMap<String, String>,
    pub payload: String,
}

fn rfc3339_secs<S: serde::Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Secs, true))
}

impl RecoveryEntry {
    pub fn new(kind: RecoveryKind, summary: impl Into<String>) -> Self {
        RecoveryEntry {
            at: Utc::now(),
            kind,
            summary: summary.into(),
            details: IndexMap::new(),
            payload: String::new(),
        }
    }

    pub fn detail(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }

    pub fn payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }

    /// The entry as it appears in the log file
    pub fn to_markdown(&self) -> String {
        let mut lines = vec![
            format!(
                "## {} [{}] {}",
                self.at.to_rfc3339_opts(SecondsFormat::Secs, true),
                self.kind,
                self.summary
            ),
            String::new(),
        ];
        lines.extend(self.details.iter().map(|(k, v)| format!("{}: {}", k, v)));
        if !self.payload.is_empty() {
            lines.push(String::new());
            lines.push("```json".to_string());
            lines.push(self.payload.trim_end_matches('\n').to_string());
            lines.push("```".to_string());
        }
        lines.push(String::new());
        lines.push("---".to_string());
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Append to the log under `data_dir`. A log that cannot be written only
/// produces a warning.
pub fn log_recovery(data_dir: &Path, entry: RecoveryEntry) {
    let path = recovery_log_path(data_dir);
    if let Err(e) = append_bounded(&path, &entry, MAX_LOG_BYTES) {
        warn!(path = %path.display(), error = %e, "recovery log not written");
    }
}

/// Append `entry`, or rewrite the log without its oldest entries when the
/// result would exceed `cap` bytes. The newest entry is always kept.
fn append_bounded(path: &Path, entry: &RecoveryEntry, cap: u64) -> io::Result<()> {
    let block = entry.to_markdown();
    let current = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
        Err(e) => return Err(e),
    };
    let projected = current.max(PREAMBLE.len() as u64) + block.len() as u64;

    if projected <= cap {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if current == 0 {
            file.write_all(PREAMBLE.as_bytes())?;
        }
        return file.write_all(block.as_bytes());
    }

    let text = if current == 0 {
        String::new()
    } else {
        std::fs::read_to_string(path)?
    };
    let mut blocks: Vec<String> = parse_log(&text).iter().map(RecoveryEntry::to_markdown).collect();
    blocks.push(block);

    let budget = (cap as usize).saturating_sub(PREAMBLE.len());
    let mut total: usize = blocks.iter().map(String::len).sum();
    let mut dropped = 0;
    while total > budget && dropped + 1 < blocks.len() {
        total -= blocks[dropped].len();
        dropped += 1;
    }
    if dropped > 0 {
        debug!(dropped, "recovery log trimmed");
    }

    let mut out = String::with_capacity(PREAMBLE.len() + total);
    out.push_str(PREAMBLE);
    for b in &blocks[dropped..] {
        out.push_str(b);
    }
    atomic_write(path, out.as_bytes())
}

/// Keep a copy of a food that is about to disappear from the catalog.
pub fn log_food_deletion(data_dir: &Path, food: &Food, container: Container) {
    let record = serde_json::to_string_pretty(food).unwrap_or_default();
    let entry = RecoveryEntry::new(RecoveryKind::Deleted, format!("food {} deleted", food.id))
        .detail("Name", &food.name)
        .detail("Container", container)
        .payload(record);
    log_recovery(data_dir, entry);
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Entries from newest to oldest, at most `limit` of them.
pub fn read_recovery_entries(data_dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let Ok(text) = std::fs::read_to_string(recovery_log_path(data_dir)) else {
        return Vec::new();
    };
    let entries = parse_log(&text).into_iter().rev();
    match limit {
        Some(n) => entries.take(n).collect(),
        None => entries.collect(),
    }
}

/// `<rfc3339> [<kind>] <summary>`
fn parse_header(line: &str) -> Option<RecoveryEntry> {
    let mut parts = line.strip_prefix("## ")?.splitn(3, ' ');
    let at = DateTime::parse_from_rfc3339(parts.next()?).ok()?.with_timezone(&Utc);
    let kind = parts
        .next()?
        .strip_prefix('[')?
        .strip_suffix(']')?
        .parse()
        .ok()?;
    Some(RecoveryEntry {
        at,
        kind,
        summary: parts.next().unwrap_or_default().to_string(),
        details: IndexMap::new(),
        payload: String::new(),
    })
}

fn parse_log(text: &str) -> Vec<RecoveryEntry> {
    let mut entries = Vec::new();
    let mut current: Option<RecoveryEntry> = None;
    let mut payload: Option<Vec<&str>> = None;

    for line in text.lines() {
        // inside a fence only the closing fence matters
        if let Some(buf) = payload.as_mut() {
            if line == "```" {
                if let Some(entry) = current.as_mut() {
                    entry.payload = buf.join("\n");
                }
                payload = None;
            } else {
                buf.push(line);
            }
            continue;
        }
        if let Some(entry) = parse_header(line) {
            entries.extend(current.replace(entry));
            continue;
        }
        let Some(entry) = current.as_mut() else {
            continue;
        };
        if line == "---" {
            entries.extend(current.take());
        } else if line.starts_with("```") {
            payload = Some(Vec::new());
        } else if let Some((key, value)) = line.split_once(": ") {
            entry.details.insert(key.trim().to_string(), value.to_string());
        }
    }
    entries.extend(current);
    entries
}
