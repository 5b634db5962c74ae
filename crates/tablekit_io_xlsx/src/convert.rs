//! One-shot conversion pipeline: read → parse → style → write.

use std::fs;
use std::path::Path;

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::parser::parse_document;
use crate::spec::{
    ConvertError, SpecConvertOptions, SpecDocument, SpecStyledSheet, SpecXlsxReport,
};
use crate::style::plan_styled_sheet;
use crate::util::calculate_worker_limit;
use crate::writer::XlsxWriter;

/// Read the whole input file as UTF-8 text.
pub fn read_input_text(path_file_in: &Path) -> Result<String, ConvertError> {
    if !path_file_in.exists() {
        return Err(ConvertError::MissingInput(path_file_in.to_path_buf()));
    }
    fs::read_to_string(path_file_in).map_err(|err| ConvertError::ReadInput {
        path: path_file_in.to_path_buf(),
        message: err.to_string(),
    })
}

/// Reject option values the pipeline cannot honour.
pub fn validate_convert_options(options: &SpecConvertOptions) -> Result<(), ConvertError> {
    let n_scale = options.autofit.width_scale;
    if !n_scale.is_finite() || n_scale <= 0.0 {
        return Err(ConvertError::InvalidOptions(format!(
            "autofit.width_scale must be a finite value > 0, got {n_scale}."
        )));
    }
    if options.date_num_format.trim().is_empty() {
        return Err(ConvertError::InvalidOptions(
            "date_num_format must not be empty.".to_string(),
        ));
    }
    if options.default_sheet_prefix.trim().is_empty() {
        return Err(ConvertError::InvalidOptions(
            "default_sheet_prefix must not be empty.".to_string(),
        ));
    }
    Ok(())
}

/// Style every sheet; output order always matches input order.
pub fn style_document(
    doc: &SpecDocument,
    options: &SpecConvertOptions,
    report: &mut SpecXlsxReport,
) -> Vec<SpecStyledSheet> {
    let n_workers_max = calculate_worker_limit(options.num_workers_max);

    let l_results: Vec<(SpecStyledSheet, Vec<String>)> =
        if n_workers_max <= 1 || doc.sheets.len() <= 1 {
            style_sheets_serial(doc, options)
        } else {
            match ThreadPoolBuilder::new().num_threads(n_workers_max).build() {
                Ok(thread_pool) => thread_pool.install(|| {
                    doc.sheets
                        .par_iter()
                        .map(|sheet| plan_styled_sheet(sheet, options))
                        .collect()
                }),
                Err(err) => {
                    log::warn!("thread pool init failed ({err}); styling sheets serially");
                    report.warn(format!(
                        "Failed to initialize thread pool (workers={n_workers_max}); fallback to serial styling."
                    ));
                    style_sheets_serial(doc, options)
                }
            }
        };

    l_results
        .into_iter()
        .map(|(sheet, l_warnings)| {
            report.extend_warnings(l_warnings);
            sheet
        })
        .collect()
}

fn style_sheets_serial(
    doc: &SpecDocument,
    options: &SpecConvertOptions,
) -> Vec<(SpecStyledSheet, Vec<String>)> {
    doc.sheets
        .iter()
        .map(|sheet| plan_styled_sheet(sheet, options))
        .collect()
}

/// Parse and style raw text without touching the filesystem.
pub fn convert_text(
    text: &str,
    options: &SpecConvertOptions,
) -> Result<(Vec<SpecStyledSheet>, SpecXlsxReport), ConvertError> {
    validate_convert_options(options)?;

    let mut report = SpecXlsxReport::default();
    let doc = parse_document(text, &options.default_sheet_prefix, &mut report);
    log::debug!("parsed {} sheet block(s)", doc.sheets.len());
    let l_sheets = style_document(&doc, options, &mut report);
    Ok((l_sheets, report))
}

/// Convert `path_file_in` into a styled workbook at `path_file_out`.
///
/// Nothing is written unless every stage succeeds.
pub fn generate_xlsx(
    path_file_in: &Path,
    path_file_out: &Path,
    options: &SpecConvertOptions,
) -> Result<SpecXlsxReport, ConvertError> {
    let text = read_input_text(path_file_in)?;
    let (l_sheets, mut report) = convert_text(&text, options)?;

    let mut writer = XlsxWriter::new(
        path_file_out.to_path_buf(),
        options.value_policy.clone(),
        &options.default_sheet_prefix,
    );
    for sheet in &l_sheets {
        writer.write_sheet(sheet)?;
    }
    writer.close()?;

    let report_writer = writer.report();
    report.sheets = report_writer.sheets;
    report.extend_warnings(report_writer.warnings);
    log::debug!(
        "wrote {} with {} sheet(s), {} warning(s)",
        writer.file_out(),
        report.sheets.len(),
        report.warnings.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::spec::EnumColumnClass;

    #[test]
    fn test_parallel_styling_keeps_input_order() {
        let text = (1..=12)
            .map(|n| format!("sheet:S{n}\nk;v\na;{n}"))
            .collect::<Vec<_>>()
            .join("\n\n");
        let options = SpecConvertOptions {
            num_workers_max: Some(4),
            ..Default::default()
        };
        let (l_sheets, report) = convert_text(&text, &options).expect("convert");
        let l_names: Vec<String> = l_sheets.iter().map(|s| s.name.clone()).collect();
        let l_expected: Vec<String> = (1..=12).map(|n| format!("S{n}")).collect();
        assert_eq!(l_names, l_expected);
        let l_classes_expected = vec![EnumColumnClass::Text, EnumColumnClass::Numeric];
        assert!(
            l_sheets
                .iter()
                .all(|s| s.column_classes == l_classes_expected)
        );
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_serial_and_parallel_agree() {
        let text = "sheet:A\nk;n\nx;1\n\nsheet:B\nk;d\ny;2024-01-02";
        let serial = SpecConvertOptions {
            num_workers_max: Some(1),
            ..Default::default()
        };
        let parallel = SpecConvertOptions {
            num_workers_max: Some(8),
            ..Default::default()
        };
        assert_eq!(
            convert_text(text, &serial).expect("serial").0,
            convert_text(text, &parallel).expect("parallel").0
        );
    }

    #[test]
    fn test_invalid_options_rejected() {
        let mut options = SpecConvertOptions::default();
        options.autofit.width_scale = 0.0;
        assert!(matches!(
            convert_text("a", &options),
            Err(ConvertError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_missing_input_is_fatal_before_parsing() {
        let path_missing = Path::new("definitely/not/here/input.txt");
        let err = generate_xlsx(
            path_missing,
            Path::new("unused.xlsx"),
            &SpecConvertOptions::default(),
        )
        .expect_err("missing input");
        assert!(matches!(err, ConvertError::MissingInput(_)));
    }
}
