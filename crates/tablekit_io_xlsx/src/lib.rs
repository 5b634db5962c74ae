//! `tablekit_io_xlsx` v1:
//! Text-to-styled-XLSX conversion kernel.
//!
//! Pipeline stages, one module each:
//! - `conf`     : constants and default presets
//! - `spec`     : specs/models/options/errors
//! - `parser`   : text → sheet blocks → rows of typed cells
//! - `classify` : literal shape tests and cell descriptors
//! - `style`    : column classes, coercion and layered style rules
//! - `sizing`   : column width inference
//! - `util`     : pure helper functions
//! - `writer`   : rust_xlsxwriter-backed emitter
//! - `convert`  : end-to-end orchestration
//! - `cli`      : `tablekit_xlsx` command line
pub mod classify;
pub mod cli;
pub mod conf;
pub mod convert;
pub mod parser;
pub mod sizing;
pub mod spec;
pub mod style;
pub mod util;
pub mod writer;

pub use conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
    derive_default_convert_options,
};
pub use convert::{convert_text, generate_xlsx};
pub use parser::parse_document;
pub use spec::{
    ConvertError, EnumCellKind, EnumCellValue, EnumColumnClass, SpecAutofitCellsPolicy,
    SpecCell, SpecCellFormat, SpecConvertOptions, SpecDocument, SpecSheet, SpecSheetReport,
    SpecStylePalette, SpecStyledCell, SpecStyledSheet, SpecXlsxReport, SpecXlsxValuePolicy,
};
pub use style::{classify_columns, plan_styled_sheet, resolve_cell_style};
pub use writer::XlsxWriter;
