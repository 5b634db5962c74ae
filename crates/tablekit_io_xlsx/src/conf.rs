//! XLSX constants and default preset factories.

use crate::spec::{
    SpecAutofitCellsPolicy, SpecCellFormat, SpecConvertOptions, SpecStylePalette,
    SpecXlsxValuePolicy,
};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Excel column width maximum (character units).
pub const N_WIDTH_EXCEL_COLUMN_MAX: f64 = 255.0;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Line prefix that names the current sheet block.
pub const C_SHEET_NAME_PREFIX: &str = "sheet:";
/// Field separator within a `sheet:` line.
pub const C_SHEET_NAME_SEPARATOR: char = ':';
/// Cell delimiter within one data row.
pub const C_CELL_DELIMITER: char = ';';
/// Leading character of a formula literal.
pub const C_FORMULA_PREFIX: char = '=';
/// Descriptor key holding the effective cell content.
pub const C_DESCRIPTOR_VALUE_KEY: &str = "value";

/// Full-string date shape patterns, in check order.
pub const TUP_DATE_SHAPE_PATTERNS: [&str; 3] = [
    r"^\d{4}-\d{2}-\d{2}$",
    r"^\d{2}/\d{2}/\d{4}$",
    r"^\d{2}\.\d{2}\.\d{4}$",
];
/// chrono parse formats tried by date coercion, in order.
///
/// The second entry is day-first although the matching shape check above is
/// conventionally month-first; both orders are kept as observed.
pub const TUP_DATE_COERCE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y"];
/// Earliest calendar year representable as an Excel date.
pub const N_YEAR_EXCEL_MIN: i32 = 1900;
/// Latest calendar year representable as an Excel date.
pub const N_YEAR_EXCEL_MAX: i32 = 9999;

/// Border code for a thin line (see `writer::derive_format_border`).
pub const N_BORDER_THIN: i64 = 1;
/// Border code for a thick line.
pub const N_BORDER_THICK: i64 = 5;

/// Build the default style palette.
pub fn derive_default_style_palette() -> SpecStylePalette {
    SpecStylePalette {
        numeric_even: "#E6F1FF".to_string(),
        numeric_odd: "#E6E6FF".to_string(),
        text_even: "#E6FFE6".to_string(),
        text_odd: "#FFF2E6".to_string(),
        date_color: "#F0E6FF".to_string(),
        header_fill: "#D3D3D3".to_string(),
        first_column_fill: "#F0F0F0".to_string(),
        border_thin: N_BORDER_THIN,
        border_thick: N_BORDER_THICK,
    }
}

/// Build the shared patch used by header-row and first-column cells.
///
/// Fill and borders are layered separately by the style engine.
pub fn derive_default_emphasis_format() -> SpecCellFormat {
    SpecCellFormat {
        bold: Some(true),
        align: Some("center".to_string()),
        valign: Some("vcenter".to_string()),
        text_wrap: Some(true),
        indent: Some(0),
        ..Default::default()
    }
}

/// Build default conversion options.
pub fn derive_default_convert_options() -> SpecConvertOptions {
    SpecConvertOptions {
        palette: derive_default_style_palette(),
        autofit: SpecAutofitCellsPolicy::default(),
        value_policy: SpecXlsxValuePolicy::default(),
        date_num_format: "yyyy-mm-dd".to_string(),
        default_sheet_prefix: "Sheet".to_string(),
        indent_body: 1,
        num_workers_max: None,
    }
}
