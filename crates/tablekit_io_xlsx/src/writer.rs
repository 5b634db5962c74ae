//! XLSX writer kernel that emits styled sheets into a workbook file.

use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Datelike;
use rust_xlsxwriter::{
    ExcelDateTime, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError,
};
use tempfile::NamedTempFile;

use crate::conf::{N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
use crate::spec::{
    ConvertError, EnumCellValue, SpecCellFormat, SpecSheetReport, SpecStyledSheet,
    SpecXlsxReport, SpecXlsxValuePolicy,
};
use crate::util::{convert_nan_inf_to_str, derive_unique_sheet_name, sanitize_sheet_name};

/// Stateful workbook writer.
///
/// The workbook is buffered in memory until [`Self::close`] is called, which
/// persists it in one step so a failed run leaves no partial file behind.
pub struct XlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    value_policy: SpecXlsxValuePolicy,
    default_sheet_prefix: String,
    set_sheet_names_existing: BTreeSet<String>,
    report: SpecXlsxReport,
    if_closed: bool,
}

impl XlsxWriter {
    /// Create writer bound to output path.
    pub fn new(
        path_file_out: PathBuf,
        value_policy: SpecXlsxValuePolicy,
        default_sheet_prefix: &str,
    ) -> Self {
        Self {
            path_file_out,
            workbook: Workbook::new(),
            value_policy,
            default_sheet_prefix: default_sheet_prefix.to_string(),
            set_sheet_names_existing: BTreeSet::new(),
            report: SpecXlsxReport::default(),
            if_closed: false,
        }
    }

    /// Return output file path as string.
    pub fn file_out(&self) -> String {
        self.path_file_out.to_string_lossy().to_string()
    }

    /// Return snapshot of the emission report.
    pub fn report(&self) -> SpecXlsxReport {
        self.report.clone()
    }

    /// Serialize and persist the workbook. Idempotent.
    pub fn close(&mut self) -> Result<(), ConvertError> {
        if self.if_closed {
            return Ok(());
        }
        if self.report.sheets.is_empty() {
            return Err(ConvertError::Serialization(
                "workbook has no worksheets".to_string(),
            ));
        }
        let v_buffer = self
            .workbook
            .save_to_buffer()
            .map_err(derive_xlsx_error)?;
        persist_bytes_atomically(&self.path_file_out, &v_buffer)?;
        self.if_closed = true;
        Ok(())
    }

    /// Append one styled sheet as a new worksheet.
    pub fn write_sheet(&mut self, sheet: &SpecStyledSheet) -> Result<(), ConvertError> {
        if self.if_closed {
            return Err(ConvertError::Serialization(
                "Cannot write after close().".to_string(),
            ));
        }

        let n_rows = sheet.cells.len();
        let n_cols = sheet.cells.iter().map(Vec::len).max().unwrap_or(0);
        if n_rows > N_NROWS_EXCEL_MAX || n_cols > N_NCOLS_EXCEL_MAX {
            return Err(ConvertError::Serialization(format!(
                "sheet {:?} exceeds Excel limits: {n_rows} rows x {n_cols} columns",
                sheet.name
            )));
        }

        let n_idx_sheet_1based = self.report.sheets.len() + 1;
        let c_name_fallback = format!("{}{n_idx_sheet_1based}", self.default_sheet_prefix);
        let c_name_clean = sanitize_sheet_name(&sheet.name, "_", &c_name_fallback);
        let c_name_unique =
            derive_unique_sheet_name(&c_name_clean, &mut self.set_sheet_names_existing);
        if c_name_unique != sheet.name {
            log::warn!("sheet {:?} renamed to {c_name_unique:?}", sheet.name);
            self.report.warn(format!(
                "Sheet {:?} renamed to {c_name_unique:?} (invalid or duplicate name).",
                sheet.name
            ));
        }

        let worksheet = self.workbook.add_worksheet();
        worksheet
            .set_name(&c_name_unique)
            .map_err(derive_xlsx_error)?;

        let mut dict_formats: HashMap<SpecCellFormat, Format> = HashMap::new();
        for (row_idx, row) in sheet.cells.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                let format = dict_formats
                    .entry(cell.format.clone())
                    .or_insert_with(|| derive_rust_xlsx_format(&cell.format));
                write_cell_with_format(
                    worksheet,
                    row_idx,
                    col_idx,
                    &cell.value,
                    format,
                    &self.value_policy,
                )?;
            }
        }

        for (col_idx, width) in sheet.column_widths.iter().enumerate() {
            worksheet
                .set_column_width(cast_col_num(col_idx)?, *width)
                .map_err(derive_xlsx_error)?;
        }

        log::debug!("sheet {c_name_unique:?}: wrote {n_rows}x{n_cols}");
        self.report.sheets.push(SpecSheetReport {
            sheet_name: c_name_unique,
            n_rows,
            n_cols,
        });
        Ok(())
    }
}

fn persist_bytes_atomically(path_file_out: &Path, v_bytes: &[u8]) -> Result<(), ConvertError> {
    let path_dir_out = match path_file_out.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut file_tmp = NamedTempFile::new_in(&path_dir_out).map_err(|err| {
        ConvertError::Serialization(format!(
            "failed to create temporary file in {}: {err}",
            path_dir_out.display()
        ))
    })?;
    file_tmp
        .write_all(v_bytes)
        .and_then(|_| file_tmp.flush())
        .map_err(|err| ConvertError::Serialization(format!("failed to write workbook: {err}")))?;
    file_tmp.persist(path_file_out).map_err(|err| {
        ConvertError::Serialization(format!(
            "failed to persist {}: {}",
            path_file_out.display(),
            err.error
        ))
    })?;
    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
    value_policy: &SpecXlsxValuePolicy,
) -> Result<(), ConvertError> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    match value {
        EnumCellValue::None => {
            worksheet
                .write_blank(n_row, n_col, format)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::String(val) if val.is_empty() => {
            worksheet
                .write_blank(n_row, n_col, format)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::String(val) => {
            worksheet
                .write_string_with_format(n_row, n_col, val, format)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::Number(val) if !val.is_finite() => {
            let c_text = convert_nan_inf_to_str(*val, value_policy)
                .unwrap_or_else(|_| value_policy.nan_str.clone());
            worksheet
                .write_string_with_format(n_row, n_col, &c_text, format)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::Number(val) => {
            worksheet
                .write_number_with_format(n_row, n_col, *val, format)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::Date(date) => {
            let datetime = derive_excel_date(date.year(), date.month(), date.day())?;
            worksheet
                .write_datetime_with_format(n_row, n_col, &datetime, format)
                .map_err(derive_xlsx_error)?;
        }
    }
    Ok(())
}

fn derive_excel_date(year: i32, month: u32, day: u32) -> Result<ExcelDateTime, ConvertError> {
    let n_year = u16::try_from(year)
        .map_err(|_| ConvertError::Serialization(format!("year out of range: {year}")))?;
    // chrono guarantees month 1..=12 and day 1..=31.
    ExcelDateTime::from_ymd(n_year, month as u8, day as u8).map_err(derive_xlsx_error)
}

/// Translate a layered format spec into a `rust_xlsxwriter` format.
pub fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = spec.indent
        && val > 0
    {
        format = format.set_indent(val);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }

    if let Some(val) = spec.top {
        format = format.set_border_top(derive_format_border(val));
    }
    if let Some(val) = spec.bottom {
        format = format.set_border_bottom(derive_format_border(val));
    }
    if let Some(val) = spec.left {
        format = format.set_border_left(derive_format_border(val));
    }
    if let Some(val) = spec.right {
        format = format.set_border_right(derive_format_border(val));
    }

    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        0 => FormatBorder::None,
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, ConvertError> {
    u32::try_from(value)
        .map_err(|_| ConvertError::Serialization(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, ConvertError> {
    u16::try_from(value)
        .map_err(|_| ConvertError::Serialization(format!("column index overflow: {value}")))
}

fn derive_xlsx_error(err: XlsxError) -> ConvertError {
    ConvertError::Serialization(err.to_string())
}
