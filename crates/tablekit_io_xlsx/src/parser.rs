//! Splits raw input text into sheet blocks, rows and classified cells.

use std::sync::OnceLock;

use regex::Regex;

use crate::classify::{EnumTokenSource, classify_token};
use crate::conf::{C_CELL_DELIMITER, C_SHEET_NAME_PREFIX, C_SHEET_NAME_SEPARATOR};
use crate::spec::{SpecCell, SpecDocument, SpecSheet, SpecXlsxReport};

fn derive_block_separator() -> Option<&'static Regex> {
    static BLOCK_SEPARATOR: OnceLock<Option<Regex>> = OnceLock::new();
    BLOCK_SEPARATOR
        .get_or_init(|| Regex::new(r"\n{2,}").ok())
        .as_ref()
}

/// Split normalized text into non-empty sheet blocks.
///
/// Only truly empty lines end a block; a run of them is one boundary. A line
/// holding only spaces stays in its block as a row with one empty token.
pub fn split_sheet_blocks(text: &str) -> Vec<&str> {
    let c_text = text.trim();
    let l_blocks: Vec<&str> = match derive_block_separator() {
        Some(regex) => regex.split(c_text).collect(),
        None => c_text.split("\n\n").collect(),
    };
    l_blocks
        .into_iter()
        .filter(|block| !block.trim().is_empty())
        .collect()
}

/// Extract the sheet name from a `sheet:<name>` line.
///
/// The name is the colon-separated field after the prefix: `sheet:Q1:draft`
/// names the sheet `Q1`.
pub fn parse_sheet_name_line(line: &str) -> Option<&str> {
    line.strip_prefix(C_SHEET_NAME_PREFIX).map(|rest| {
        rest.split_once(C_SHEET_NAME_SEPARATOR)
            .map_or(rest, |(name, _)| name)
            .trim()
    })
}

/// Split one data row on `;` and classify every trimmed token.
pub fn parse_row(line: &str) -> (Vec<SpecCell>, usize) {
    let mut n_fallbacks = 0usize;
    let l_cells = line
        .split(C_CELL_DELIMITER)
        .map(|token| {
            let token = classify_token(token.trim());
            if token.source == EnumTokenSource::DescriptorFallback {
                n_fallbacks += 1;
            }
            token.cell
        })
        .collect();
    (l_cells, n_fallbacks)
}

/// Parse one sheet block; `n_idx_block_1based` feeds the default name.
pub fn parse_sheet_block(
    block: &str,
    n_idx_block_1based: usize,
    default_sheet_prefix: &str,
    report: &mut SpecXlsxReport,
) -> SpecSheet {
    let mut c_name: Option<String> = None;
    let mut l_rows = Vec::new();
    let mut n_fallbacks = 0usize;

    for line in block.lines() {
        if let Some(name) = parse_sheet_name_line(line) {
            c_name = Some(name.to_string());
            continue;
        }
        let (l_cells, n_row_fallbacks) = parse_row(line);
        n_fallbacks += n_row_fallbacks;
        l_rows.push(l_cells);
    }

    let c_name = match c_name {
        Some(name) if !name.is_empty() => name,
        _ => format!("{default_sheet_prefix}{n_idx_block_1based}"),
    };

    if n_fallbacks > 0 {
        report.warn(format!(
            "Sheet {c_name:?}: {n_fallbacks} malformed cell descriptor(s) kept as literal text."
        ));
    }

    SpecSheet {
        name: c_name,
        rows: l_rows,
    }
}

/// Parse the whole input into an ordered document.
///
/// Whitespace-only input yields one default-named sheet with no rows.
pub fn parse_document(
    text: &str,
    default_sheet_prefix: &str,
    report: &mut SpecXlsxReport,
) -> SpecDocument {
    let c_text = text.replace("\r\n", "\n");
    let l_blocks = split_sheet_blocks(&c_text);

    if l_blocks.is_empty() {
        return SpecDocument {
            sheets: vec![SpecSheet {
                name: format!("{default_sheet_prefix}1"),
                rows: vec![],
            }],
        };
    }

    let sheets = l_blocks
        .into_iter()
        .enumerate()
        .map(|(n_idx, block)| parse_sheet_block(block, n_idx + 1, default_sheet_prefix, report))
        .collect();
    SpecDocument { sheets }
}
