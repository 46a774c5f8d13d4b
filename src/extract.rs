//! The extraction run: read every source, report it, then write the JSON files

use std::io::Write;
use std::path::PathBuf;

use log::info;

use crate::config::Config;
use crate::error::Result;
use crate::model::Table;
use crate::output::{JsonOutput, TerminalOutput};
use crate::parser::ExcelParser;

/// Outcome for one extracted source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub label: String,
    pub output: PathBuf,
    pub row_count: usize,
    pub columns: Vec<String>,
}

/// Reads the configured spreadsheets and writes them out as JSON records
pub struct Extractor {
    config: Config,
    parser: ExcelParser,
}

impl Extractor {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            parser: ExcelParser,
        }
    }

    /// Run the extraction, printing diagnostics to `writer`.
    ///
    /// Every source is read and reported before anything is written, so a read
    /// failure leaves no new output behind. The first error ends the run.
    pub fn run(&self, writer: &mut dyn Write) -> Result<Vec<Extracted>> {
        let terminal = TerminalOutput::new(self.config.preview_rows);

        let mut tables: Vec<Table> = Vec::with_capacity(self.config.sources.len());
        for (i, source) in self.config.sources.iter().enumerate() {
            if i > 0 {
                terminal.write_separator(writer)?;
            }
            terminal.write_reading(&source.label, writer)?;

            let table = self.parser.parse(
                &source.label,
                &source.input,
                self.config.sheet_for(source),
            )?;
            terminal.write_report(&source.label, &table, writer)?;
            tables.push(table);
        }

        let json = if self.config.pretty {
            JsonOutput::pretty(self.config.date_format)
        } else {
            JsonOutput::new(self.config.date_format)
        };

        let mut extracted = Vec::with_capacity(tables.len());
        for (source, table) in self.config.sources.iter().zip(&tables) {
            let output = self.config.output_path(source);
            json.write_file(table, &output)?;
            if self.config.verify {
                json.verify_file(table, &output)?;
            }

            extracted.push(Extracted {
                label: source.label.clone(),
                output,
                row_count: table.row_count(),
                columns: table.column_names().iter().map(|c| c.to_string()).collect(),
            });
        }

        writeln!(writer)?;
        writeln!(writer, "Data extracted and saved to {}", self.output_dirs(&extracted))?;
        if self.config.verify {
            writeln!(writer, "Verified {} output file(s)", extracted.len())?;
        }
        info!("extracted {} source(s)", extracted.len());

        Ok(extracted)
    }

    /// Distinct output directories, in first-seen order
    fn output_dirs(&self, extracted: &[Extracted]) -> String {
        let mut dirs: Vec<String> = Vec::new();
        for item in extracted {
            let dir = item
                .output
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        if dirs.is_empty() {
            self.config.out_dir.display().to_string()
        } else {
            dirs.join(", ")
        }
    }
}
