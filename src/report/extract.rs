//! Text and table extraction from downloaded report PDFs.

use crate::client::providers::ProviderError;
use crate::models::TableRows;
use indexmap::IndexMap;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

/// Separator placed between pages of extracted text
pub const PAGE_SEPARATOR: &str = "\u{c}";

/// Extraction backend for report documents
pub trait ReportExtractor: Send + Sync {
    /// Text of every page, in page order
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, ProviderError>;

    /// Tables found in already-extracted page text, each a list of header -> cell rows
    fn extract_tables(&self, pages: &[String]) -> Result<Vec<TableRows>, ProviderError>;
}

/// Pure-Rust extractor built on `lopdf`
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl ReportExtractor for LopdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, ProviderError> {
        let document = lopdf::Document::load(path).map_err(|e| {
            ProviderError::Parse(format!("Failed to open PDF {}: {e}", path.display()))
        })?;

        let pages = document
            .get_pages()
            .keys()
            .map(|&page| {
                document.extract_text(&[page]).map_err(|e| {
                    ProviderError::Parse(format!("Failed to extract text from page {page}: {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Extracted text from {} pages of {}", pages.len(), path.display());
        Ok(pages)
    }

    fn extract_tables(&self, pages: &[String]) -> Result<Vec<TableRows>, ProviderError> {
        let tables: Vec<TableRows> = pages.iter().flat_map(|page| detect_tables(page)).collect();
        debug!("Detected {} tables", tables.len());
        Ok(tables)
    }
}

/// Whole-document text: non-blank pages joined by [`PAGE_SEPARATOR`]
#[must_use]
pub fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .filter(|text| !text.trim().is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR)
}

/// Rough page count: form feeds plus one
#[must_use]
pub fn estimate_pages(text: &str) -> usize {
    text.matches(PAGE_SEPARATOR).count() + 1
}

fn column_gap() -> &'static Regex {
    static GAP: OnceLock<Regex> = OnceLock::new();
    GAP.get_or_init(|| Regex::new(r"\t+|\s{2,}").expect("static regex is valid"))
}

fn split_columns(line: &str) -> Vec<String> {
    column_gap()
        .split(line.trim())
        .map(|cell| cell.trim().to_string())
        .filter(|cell| !cell.is_empty())
        .collect()
}

/// Detect whitespace-aligned tables in page text.
///
/// A table is a run of at least two consecutive lines that split into the
/// same number (two or more) of columns. The first line supplies the headers.
#[must_use]
pub fn detect_tables(page: &str) -> Vec<TableRows> {
    let mut tables = Vec::new();
    let mut run: Vec<Vec<String>> = Vec::new();

    for line in page.lines() {
        let cells = split_columns(line);
        let continues =
            cells.len() >= 2 && run.first().is_some_and(|head| head.len() == cells.len());

        if continues {
            run.push(cells);
            continue;
        }

        flush_run(&mut run, &mut tables);
        if cells.len() >= 2 {
            run.push(cells);
        }
    }
    flush_run(&mut run, &mut tables);

    tables
}

fn flush_run(run: &mut Vec<Vec<String>>, tables: &mut Vec<TableRows>) {
    if run.len() >= 2 {
        let headers = run[0].clone();
        let rows = run[1..]
            .iter()
            .map(|cells| {
                headers
                    .iter()
                    .cloned()
                    .zip(cells.iter().cloned())
                    .collect::<IndexMap<_, _>>()
            })
            .collect();
        tables.push(rows);
    }
    run.clear();
}

/// Placeholder table output used when extraction fails
#[must_use]
pub fn extraction_error_tables(error: &ProviderError) -> Vec<TableRows> {
    vec![vec![IndexMap::from([("error".to_string(), error.to_string())])]]
}
