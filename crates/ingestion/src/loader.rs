//! Trade CSV loaders.
//!
//! A loader produces the full normalized record list for one source. The
//! pipeline is decode → tokenize → detect schema → normalize each row. Rows
//! that cannot be normalized are dropped, and a header matching no schema
//! yields an empty list.

use crate::decoder::detect_and_decode;
use crate::schema::{detect_schema, FieldIndexMap};
use crate::tokenizer::{tokenize, Row};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use tradecal_core::{Error, Result, SourceConfig, TradeRecord};

/// A source of normalized trade records.
pub trait TradeCsvLoader: Send + Sync {
    /// Stable identifier used in log messages.
    fn id(&self) -> &str;

    /// Load every record from the source.
    fn load_records(&self) -> Result<Vec<TradeRecord>>;
}

/// Map tokenized rows (header first) to records.
fn records_from_rows(rows: Vec<Row>) -> Vec<TradeRecord> {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };

    let fields = FieldIndexMap::from_header(&header);
    let Some(schema) = detect_schema(&fields) else {
        debug!(columns = header.len(), "no trade CSV schema matched header");
        return Vec::new();
    };

    let mut total = 0usize;
    let records: Vec<TradeRecord> = rows
        .inspect(|_| total += 1)
        .filter_map(|row| schema.normalize(&row, &fields))
        .collect();

    debug!(
        schema = schema.id(),
        records = records.len(),
        dropped = total - records.len(),
        "normalized trade CSV rows"
    );
    records
}

/// Parse already-decoded CSV text into records.
pub fn records_from_text(content: &str) -> Vec<TradeRecord> {
    records_from_rows(tokenize(content))
}

/// Decode a raw CSV buffer, logging the chosen encoding.
fn decode_logged(bytes: &[u8]) -> String {
    let decoded = detect_and_decode(bytes);
    debug!(
        encoding = ?decoded.encoding,
        replacements = decoded.replacements,
        "decoded trade CSV"
    );
    decoded.text
}

/// Decode and parse a raw CSV buffer into records.
pub fn records_from_bytes(bytes: &[u8]) -> Vec<TradeRecord> {
    records_from_text(&decode_logged(bytes))
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // `..` above the filesystem root stays at the root.
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(component),
            },
            other => normalized.push(other),
        }
    }
    normalized
}

fn resolve_project_root(root: &Path) -> Result<PathBuf> {
    let absolute = if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir()?.join(root)
    };
    Ok(normalize_lexically(&absolute))
}

fn ensure_within_root(root: &Path, candidate: PathBuf) -> Result<PathBuf> {
    if candidate.starts_with(root) {
        Ok(candidate)
    } else {
        Err(Error::config(format!(
            "CSV path {} is outside the project root {}",
            candidate.display(),
            root.display()
        )))
    }
}

/// Resolve the CSV path for a source.
///
/// An explicit non-blank path wins over the configured default. Relative
/// paths are taken from the project root, and the result must stay inside it.
fn resolve_csv_path(source: &SourceConfig, csv_path: Option<&str>) -> Result<PathBuf> {
    let root = resolve_project_root(&source.project_root)?;

    let candidate = match csv_path.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) if Path::new(p).is_absolute() => normalize_lexically(Path::new(p)),
        Some(p) => normalize_lexically(&root.join(p)),
        None => normalize_lexically(&root.join(&source.default_csv_path)),
    };

    ensure_within_root(&root, candidate)
}

/// Loads trade records from a CSV file inside the project root.
#[derive(Debug, Clone)]
pub struct FileCsvLoader {
    path: PathBuf,
}

impl FileCsvLoader {
    /// Create a loader for the source's configured path (or its default).
    pub fn new(source: &SourceConfig) -> Result<Self> {
        Self::with_path(source, source.csv_path.as_deref())
    }

    /// Create a loader for an explicit path, falling back to the default
    /// when `csv_path` is `None` or blank.
    pub fn with_path(source: &SourceConfig, csv_path: Option<&str>) -> Result<Self> {
        let path = resolve_csv_path(source, csv_path)?;
        Ok(Self { path })
    }

    /// Resolved file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TradeCsvLoader for FileCsvLoader {
    fn id(&self) -> &str {
        "file-csv"
    }

    fn load_records(&self) -> Result<Vec<TradeRecord>> {
        let bytes = std::fs::read(&self.path)?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "read trade CSV");
        Ok(records_from_bytes(&bytes))
    }
}

/// Loads trade records from CSV content held in memory.
#[derive(Debug, Clone)]
pub struct InlineCsvLoader {
    content: String,
}

impl InlineCsvLoader {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Decode a raw buffer up front and hold the text.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::new(decode_logged(bytes))
    }
}

impl TradeCsvLoader for InlineCsvLoader {
    fn id(&self) -> &str {
        "inline-csv"
    }

    fn load_records(&self) -> Result<Vec<TradeRecord>> {
        Ok(records_from_text(&self.content))
    }
}

/// File loader for the configured (or default) CSV.
pub fn create_default_trade_csv_loader(source: &SourceConfig) -> Result<FileCsvLoader> {
    FileCsvLoader::new(source)
}

/// File loader for an explicit CSV path.
pub fn create_file_csv_loader(source: &SourceConfig, csv_path: &str) -> Result<FileCsvLoader> {
    FileCsvLoader::with_path(source, Some(csv_path))
}

/// Loader over in-memory CSV text.
pub fn create_csv_loader_from_content(content: impl Into<String>) -> InlineCsvLoader {
    InlineCsvLoader::new(content)
}
