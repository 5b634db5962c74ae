//! Shared table, style and option models.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification; every field is optional so formats can be layered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Bold style.
    pub bold: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Text wrap.
    pub text_wrap: Option<bool>,
    /// Indent level.
    pub indent: Option<u8>,

    /// Top border style.
    pub top: Option<i64>,
    /// Bottom border style.
    pub bottom: Option<i64>,
    /// Left border style.
    pub left: Option<i64>,
    /// Right border style.
    pub right: Option<i64>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            text_wrap: other.text_wrap.or(self.text_wrap),
            indent: other.indent.or(self.indent),
            top: other.top.or(self.top),
            bottom: other.bottom.or(self.bottom),
            left: other.left.or(self.left),
            right: other.right.or(self.right),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
        }
    }

    /// Patch that sets all four sides to `border`.
    pub fn with_all_sides(border: i64) -> SpecCellFormat {
        SpecCellFormat {
            top: Some(border),
            bottom: Some(border),
            left: Some(border),
            right: Some(border),
            ..Default::default()
        }
    }

    /// Resolved border tuple; unset sides read as `0` (no border).
    pub fn border(&self) -> SpecCellBorder {
        SpecCellBorder {
            top: self.top.unwrap_or(0),
            bottom: self.bottom.unwrap_or(0),
            left: self.left.unwrap_or(0),
            right: self.right.unwrap_or(0),
        }
    }
}

/// Border tuple for top/bottom/left/right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecCellBorder {
    /// Top border style.
    pub top: i64,
    /// Bottom border style.
    pub bottom: i64,
    /// Left border style.
    pub left: i64,
    /// Right border style.
    pub right: i64,
}

impl SpecCellBorder {
    /// Same style on every side.
    pub fn uniform(border: i64) -> Self {
        Self {
            top: border,
            bottom: border,
            left: border,
            right: border,
        }
    }
}

/// Fixed fill/border palette threaded through style resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecStylePalette {
    /// Numeric column fill, even 1-based index.
    pub numeric_even: String,
    /// Numeric column fill, odd 1-based index.
    pub numeric_odd: String,
    /// Text column fill, even 1-based index.
    pub text_even: String,
    /// Text column fill, odd 1-based index.
    pub text_odd: String,
    /// Date column fill (no parity split).
    pub date_color: String,
    /// Header row fill.
    pub header_fill: String,
    /// First column fill.
    pub first_column_fill: String,
    /// Border code used for the table-wide grid.
    pub border_thin: i64,
    /// Border code used for edges, header row and first column.
    pub border_thick: i64,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TableModel

/// Resolved cell value during the conversion pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value (also carries formula literals).
    String(String),
    /// Numeric value.
    Number(f64),
    /// Calendar date.
    Date(NaiveDate),
}

impl EnumCellValue {
    /// Literal text before coercion; `None` for blank and coerced values.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Whether the cell carries no content.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::None => true,
            Self::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// Per-cell type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumCellKind {
    /// Coerced to a number.
    Number,
    /// Coerced to a date.
    Date,
    /// `=`-prefixed literal, never coerced.
    Formula,
    /// Plain text (including values still awaiting column classification).
    Text,
}

/// One classified cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecCell {
    /// Resolved value.
    pub value: EnumCellValue,
    /// Type tag.
    pub kind: EnumCellKind,
}

impl SpecCell {
    /// Text cell holding `literal`.
    pub fn text(literal: impl Into<String>) -> Self {
        Self {
            value: EnumCellValue::String(literal.into()),
            kind: EnumCellKind::Text,
        }
    }

    /// Formula cell holding `literal` verbatim.
    pub fn formula(literal: impl Into<String>) -> Self {
        Self {
            value: EnumCellValue::String(literal.into()),
            kind: EnumCellKind::Formula,
        }
    }
}

/// One parsed sheet block.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSheet {
    /// Sheet name (from `sheet:` line or generated default).
    pub name: String,
    /// Data rows in input order; rows may differ in length.
    pub rows: Vec<Vec<SpecCell>>,
}

impl SpecSheet {
    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Maximum observed row length.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cell at `(row_idx, col_idx)`, `None` when outside a ragged row.
    pub fn cell(&self, row_idx: usize, col_idx: usize) -> Option<&SpecCell> {
        self.rows.get(row_idx).and_then(|row| row.get(col_idx))
    }
}

/// Ordered sheets of one input document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecDocument {
    /// Sheets in input order.
    pub sheets: Vec<SpecSheet>,
}

/// Column classification derived from its data cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumColumnClass {
    /// Every participating cell is numeric.
    Numeric,
    /// Every participating cell matches a date shape.
    Date,
    /// Anything else, including columns without participating cells.
    Text,
}

/// Position and column facts needed to style one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecCellContext {
    /// Zero-based row index.
    pub row_idx: usize,
    /// Zero-based column index.
    pub col_idx: usize,
    /// Sheet height.
    pub n_rows: usize,
    /// Sheet width (maximum row length).
    pub n_cols: usize,
    /// Classification of the cell's column.
    pub column_class: EnumColumnClass,
}

impl SpecCellContext {
    /// Cell lies in the header row.
    pub fn is_header_row(&self) -> bool {
        self.row_idx == 0
    }

    /// Cell lies in the first column.
    pub fn is_first_column(&self) -> bool {
        self.col_idx == 0
    }

    /// Cell lies on any outer edge of the occupied grid.
    pub fn is_outer_edge(&self) -> bool {
        self.row_idx == 0
            || self.col_idx == 0
            || self.row_idx + 1 == self.n_rows
            || self.col_idx + 1 == self.n_cols
    }
}

/// Cell ready for emission.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecStyledCell {
    /// Final (possibly coerced) value.
    pub value: EnumCellValue,
    /// Final type tag.
    pub kind: EnumCellKind,
    /// Fully resolved format.
    pub format: SpecCellFormat,
}

/// Styled sheet covering the full `height x width` rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecStyledSheet {
    /// Sheet name before workbook-level sanitizing.
    pub name: String,
    /// Styled rectangle; absent ragged positions are blank cells.
    pub cells: Vec<Vec<SpecStyledCell>>,
    /// Column classifications.
    pub column_classes: Vec<EnumColumnClass>,
    /// Column widths; empty when autofit is disabled.
    pub column_widths: Vec<f64>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ConvertOptions

/// Replacement text for non-finite numbers, which Excel cannot store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxValuePolicy {
    /// Replacement text for NaN.
    pub nan_str: String,
    /// Replacement text for positive infinity.
    pub posinf_str: String,
    /// Replacement text for negative infinity.
    pub neginf_str: String,
}

impl Default for SpecXlsxValuePolicy {
    fn default() -> Self {
        Self {
            nan_str: "NaN".to_string(),
            posinf_str: "Inf".to_string(),
            neginf_str: "-Inf".to_string(),
        }
    }
}

/// Autofit policy for column widths.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecAutofitCellsPolicy {
    /// Compute and apply widths.
    pub if_enabled: bool,
    /// Characters added to the longest rendered value.
    pub width_cell_padding: usize,
    /// Multiplier applied after padding.
    pub width_scale: f64,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            if_enabled: true,
            width_cell_padding: 2,
            width_scale: 1.2,
        }
    }
}

/// Options for one conversion run.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecConvertOptions {
    /// Fill/border palette.
    pub palette: SpecStylePalette,
    /// Column width policy.
    pub autofit: SpecAutofitCellsPolicy,
    /// Non-finite number replacement policy.
    pub value_policy: SpecXlsxValuePolicy,
    /// Number format applied to date-column data cells.
    pub date_num_format: String,
    /// Prefix of generated sheet names (`{prefix}{n}`).
    pub default_sheet_prefix: String,
    /// Indent applied to body cells.
    pub indent_body: u8,
    /// Maximum worker threads for per-sheet styling; `None` picks a default.
    pub num_workers_max: Option<usize>,
}

impl Default for SpecConvertOptions {
    fn default() -> Self {
        crate::conf::derive_default_convert_options()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportAndErrors

/// One emitted worksheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetReport {
    /// Actual unique sheet name in workbook.
    pub sheet_name: String,
    /// Rows written.
    pub n_rows: usize,
    /// Columns written.
    pub n_cols: usize,
}

/// Per-run report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Worksheets in emission order.
    pub sheets: Vec<SpecSheetReport>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }

    /// Append warnings collected elsewhere.
    pub fn extend_warnings(&mut self, warnings: impl IntoIterator<Item = String>) {
        self.warnings.extend(warnings);
    }
}

/// Fatal conversion errors.
#[derive(Debug)]
pub enum ConvertError {
    /// Input path does not exist.
    MissingInput(PathBuf),
    /// Input exists but could not be read as UTF-8 text.
    ReadInput {
        /// Input path.
        path: PathBuf,
        /// Underlying IO error text.
        message: String,
    },
    /// Option values out of range.
    InvalidOptions(String),
    /// Workbook could not be produced or persisted.
    Serialization(String),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInput(path) => write!(f, "Input file not found: {}", path.display()),
            Self::ReadInput { path, message } => {
                write!(f, "Failed to read input {}: {message}", path.display())
            }
            Self::InvalidOptions(msg) => write!(f, "{msg}"),
            Self::Serialization(msg) => write!(f, "xlsx write error: {msg}"),
        }
    }
}

impl std::error::Error for ConvertError {}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overwrites_only_set_fields() {
        let base = SpecCellFormat {
            bold: Some(false),
            indent: Some(1),
            ..SpecCellFormat::with_all_sides(1)
        };
        let merged = base.with_(SpecCellFormat {
            bold: Some(true),
            left: Some(5),
            ..Default::default()
        });

        assert_eq!(merged.bold, Some(true));
        assert_eq!(merged.indent, Some(1));
        assert_eq!(
            merged.border(),
            SpecCellBorder {
                top: 1,
                bottom: 1,
                left: 5,
                right: 1
            }
        );
    }

    #[test]
    fn test_outer_edge_detection() {
        let ctx = SpecCellContext {
            row_idx: 1,
            col_idx: 1,
            n_rows: 3,
            n_cols: 3,
            column_class: EnumColumnClass::Text,
        };
        assert!(!ctx.is_outer_edge());
        assert!(
            SpecCellContext {
                row_idx: 2,
                ..ctx
            }
            .is_outer_edge()
        );
        assert!(
            SpecCellContext {
                col_idx: 2,
                ..ctx
            }
            .is_outer_edge()
        );
    }

    #[test]
    fn test_sheet_width_uses_longest_row() {
        let sheet = SpecSheet {
            name: "S".to_string(),
            rows: vec![
                vec![SpecCell::text("a")],
                vec![SpecCell::text("b"), SpecCell::text("c"), SpecCell::text("d")],
            ],
        };
        assert_eq!(sheet.width(), 3);
        assert!(sheet.cell(0, 2).is_none());
    }

    #[test]
    fn test_convert_error_display() {
        let err = ConvertError::MissingInput(PathBuf::from("in.txt"));
        assert_eq!(err.to_string(), "Input file not found: in.txt");
    }
}
