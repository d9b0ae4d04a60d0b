use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::ToolKind;

/// A raw status record as reported by one scan tool for one target.
pub type RawStatus = Map<String, Value>;

/// Why a status record that exists could not be used.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read status record {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("status record {origin} is not valid JSON: {source}")]
    InvalidJson {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("status record {origin} is not a JSON object")]
    NotAnObject { origin: String },
}

/// Read-only access to per-(target, tool) status, however it is persisted.
///
/// `Ok(None)` means nothing was reported; `Err` means something was reported but
/// could not be interpreted.
pub trait StatusSource {
    fn read(&self, target: &str, kind: ToolKind) -> Result<Option<RawStatus>, SourceError>;
}

/// Status records stored as `<dir>/<target>_<tool>.json`, one per pair.
#[derive(Debug, Clone)]
pub struct DirStatusSource {
    dir: PathBuf,
}

impl DirStatusSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that holds the record for `(target, kind)`.
    pub fn record_path(&self, target: &str, kind: ToolKind) -> PathBuf {
        let safe: String = target
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect();
        self.dir.join(format!("{safe}_{}.json", kind.slug()))
    }

    /// Writes a record, creating the directory when needed.
    pub fn write(&self, target: &str, kind: ToolKind, record: &Value) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create status directory: {}", self.dir.display()))?;
        let path = self.record_path(target, kind);
        let body = serde_json::to_vec(record)?;
        fs::write(&path, body).with_context(|| format!("failed to write status record: {}", path.display()))?;
        Ok(())
    }
}

impl StatusSource for DirStatusSource {
    fn read(&self, target: &str, kind: ToolKind) -> Result<Option<RawStatus>, SourceError> {
        let path = self.record_path(target, kind);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SourceError::Unreadable { path, source }),
        };
        parse_record(&content, &path.display().to_string()).map(Some)
    }
}

/// In-memory records holding raw JSON text, keyed by `(target, kind)`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStatusSource {
    records: HashMap<(String, ToolKind), String>,
}

impl MemoryStatusSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, target: impl Into<String>, kind: ToolKind, raw_json: impl Into<String>) {
        self.records.insert((target.into(), kind), raw_json.into());
    }

    pub fn with(mut self, target: impl Into<String>, kind: ToolKind, record: Value) -> Self {
        self.insert(target, kind, record.to_string());
        self
    }
}

impl StatusSource for MemoryStatusSource {
    fn read(&self, target: &str, kind: ToolKind) -> Result<Option<RawStatus>, SourceError> {
        match self.records.get(&(target.to_string(), kind)) {
            Some(raw) => parse_record(raw, &format!("{target}/{kind}")).map(Some),
            None => Ok(None),
        }
    }
}

fn parse_record(content: &str, origin: &str) -> Result<RawStatus, SourceError> {
    let value: Value = serde_json::from_str(content).map_err(|source| SourceError::InvalidJson {
        origin: origin.to_string(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(SourceError::NotAnObject {
            origin: origin.to_string(),
        }),
    }
}
