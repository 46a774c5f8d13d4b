//! Configuration handling for sheetextract

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ExtractError, Result};

/// Rows shown in each table preview unless configured otherwise
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// How date/time and duration cells are written to JSON
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFormat {
    /// Milliseconds since the Unix epoch (durations in milliseconds)
    #[default]
    Epoch,
    /// ISO-8601 strings
    Iso,
}

/// One spreadsheet to extract
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Source {
    /// Name used in console messages and the default output file name
    pub label: String,
    /// Workbook to read
    pub input: PathBuf,
    /// Worksheet to read; the first sheet when unset
    #[serde(default)]
    pub sheet: Option<String>,
    /// JSON file to write; `<out_dir>/<label>_raw.json` when unset
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl Source {
    pub fn new(label: impl Into<String>, input: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            input: input.into(),
            sheet: None,
            output: None,
        }
    }
}

/// The two workbooks extracted when nothing else is configured
pub fn default_sources() -> Vec<Source> {
    vec![
        Source::new("patients", "patients.xlsx"),
        Source::new("correspondents", "correspondents.xlsx"),
    ]
}

/// Configuration for an extraction run
#[derive(Debug, Clone)]
pub struct Config {
    /// Spreadsheets to extract, in processing order
    pub sources: Vec<Source>,
    /// Directory for outputs that have no explicit path
    pub out_dir: PathBuf,
    /// Worksheet for sources that do not name one
    pub sheet_name: Option<String>,
    /// Number of rows printed in each preview
    pub preview_rows: usize,
    /// Encoding of date/time cells in the JSON output
    pub date_format: DateFormat,
    /// Indent JSON output
    pub pretty: bool,
    /// Re-read every written file and compare it with the loaded table
    pub verify: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            out_dir: std::env::temp_dir(),
            sheet_name: None,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            date_format: DateFormat::default(),
            pretty: false,
            verify: false,
        }
    }
}

/// On-disk TOML layout; every field is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    out_dir: Option<PathBuf>,
    sheet: Option<String>,
    preview_rows: Option<usize>,
    date_format: Option<DateFormat>,
    pretty: Option<bool>,
    verify: Option<bool>,
    #[serde(default)]
    sources: Vec<Source>,
}

impl Config {
    /// Create a Config extracting the given sources
    pub fn new(sources: Vec<Source>) -> Self {
        Self {
            sources,
            ..Default::default()
        }
    }

    /// Load a TOML config file on top of the defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ExtractError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ExtractError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse TOML config text on top of the defaults
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, toml::de::Error> {
        let file: FileConfig = toml::from_str(text)?;
        let mut config = Self::default();

        if !file.sources.is_empty() {
            config.sources = file.sources;
        }
        if let Some(dir) = file.out_dir {
            config.out_dir = dir;
        }
        config.sheet_name = file.sheet;
        if let Some(rows) = file.preview_rows {
            config.preview_rows = rows;
        }
        if let Some(format) = file.date_format {
            config.date_format = format;
        }
        if let Some(pretty) = file.pretty {
            config.pretty = pretty;
        }
        if let Some(verify) = file.verify {
            config.verify = verify;
        }

        Ok(config)
    }

    /// Replace the input of the source with this label, adding it if absent
    pub fn set_input(&mut self, label: &str, input: PathBuf) {
        match self.sources.iter_mut().find(|s| s.label == label) {
            Some(source) => source.input = input,
            None => self.sources.push(Source::new(label, input)),
        }
    }

    /// Where the JSON for `source` is written
    pub fn output_path(&self, source: &Source) -> PathBuf {
        source
            .output
            .clone()
            .unwrap_or_else(|| self.out_dir.join(format!("{}_raw.json", source.label)))
    }

    /// Worksheet to read for `source`, if one is named
    pub fn sheet_for<'a>(&'a self, source: &'a Source) -> Option<&'a str> {
        source.sheet.as_deref().or(self.sheet_name.as_deref())
    }

    /// Set the default output directory
    pub fn with_out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = dir.into();
        self
    }

    /// Set the worksheet used by sources without their own
    pub fn with_sheet_name(mut self, name: String) -> Self {
        self.sheet_name = Some(name);
        self
    }

    /// Set preview length
    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    /// Set date encoding
    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.date_format = format;
        self
    }

    /// Enable indented JSON
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Enable post-write verification
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}
