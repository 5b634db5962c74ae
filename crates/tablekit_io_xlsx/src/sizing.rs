//! Column width inference from rendered cell text.

use crate::conf::N_WIDTH_EXCEL_COLUMN_MAX;
use crate::spec::{
    EnumCellValue, SpecAutofitCellsPolicy, SpecStyledCell, SpecXlsxValuePolicy,
};
use crate::util::convert_nan_inf_to_str;

/// Text a cell displays; `None` for blank cells, which do not count.
pub fn render_cell_text(
    value: &EnumCellValue,
    value_policy: &SpecXlsxValuePolicy,
) -> Option<String> {
    match value {
        EnumCellValue::None => None,
        EnumCellValue::String(s) if s.is_empty() => None,
        EnumCellValue::String(s) => Some(s.clone()),
        EnumCellValue::Number(n) if !n.is_finite() => {
            convert_nan_inf_to_str(*n, value_policy).ok()
        }
        EnumCellValue::Number(n) => Some(n.to_string()),
        EnumCellValue::Date(date) => Some(date.format("%Y-%m-%d").to_string()),
    }
}

/// Width for a column whose longest rendered value has `n_len_max` characters.
pub fn calculate_column_width(n_len_max: usize, policy: &SpecAutofitCellsPolicy) -> f64 {
    let n_width = (n_len_max + policy.width_cell_padding) as f64 * policy.width_scale;
    n_width.min(N_WIDTH_EXCEL_COLUMN_MAX)
}

/// Infer one width per column across all rows, header included.
pub fn plan_column_widths(
    cells: &[Vec<SpecStyledCell>],
    n_cols: usize,
    policy: &SpecAutofitCellsPolicy,
    value_policy: &SpecXlsxValuePolicy,
) -> Vec<f64> {
    let mut l_len_by_col = vec![0usize; n_cols];
    for row in cells {
        for (col_idx, cell) in row.iter().enumerate().take(n_cols) {
            let Some(c_text) = render_cell_text(&cell.value, value_policy) else {
                continue;
            };
            l_len_by_col[col_idx] = usize::max(l_len_by_col[col_idx], c_text.chars().count());
        }
    }
    l_len_by_col
        .into_iter()
        .map(|n_len| calculate_column_width(n_len, policy))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::spec::{EnumCellKind, SpecCellFormat};

    fn cell(value: EnumCellValue) -> SpecStyledCell {
        SpecStyledCell {
            value,
            kind: EnumCellKind::Text,
            format: SpecCellFormat::default(),
        }
    }

    #[test]
    fn test_render_cell_text() {
        let policy = SpecXlsxValuePolicy::default();
        assert_eq!(
            render_cell_text(&EnumCellValue::Number(10.0), &policy),
            Some("10".to_string())
        );
        assert_eq!(
            render_cell_text(&EnumCellValue::Number(2.5), &policy),
            Some("2.5".to_string())
        );
        assert_eq!(
            render_cell_text(&EnumCellValue::Number(f64::NEG_INFINITY), &policy),
            Some("-Inf".to_string())
        );
        assert_eq!(
            render_cell_text(
                &EnumCellValue::Date(NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date")),
                &policy
            ),
            Some("2024-03-15".to_string())
        );
        assert_eq!(render_cell_text(&EnumCellValue::String(String::new()), &policy), None);
    }

    #[test]
    fn test_widths_use_longest_value_including_header() {
        let cells = vec![
            vec![
                cell(EnumCellValue::String("Item".to_string())),
                cell(EnumCellValue::String("Q".to_string())),
            ],
            vec![
                cell(EnumCellValue::String("Apples".to_string())),
                cell(EnumCellValue::Number(10.0)),
            ],
            vec![
                cell(EnumCellValue::String("Kiwi".to_string())),
                cell(EnumCellValue::None),
            ],
        ];
        let l_widths = plan_column_widths(
            &cells,
            2,
            &SpecAutofitCellsPolicy::default(),
            &SpecXlsxValuePolicy::default(),
        );
        assert_eq!(l_widths.len(), 2);
        assert!((l_widths[0] - 9.6).abs() < 1e-9);
        assert!((l_widths[1] - 4.8).abs() < 1e-9);
    }

    #[test]
    fn test_width_counts_characters_not_bytes() {
        let cells = vec![vec![cell(EnumCellValue::String("Äpfel".to_string()))]];
        let l_widths = plan_column_widths(
            &cells,
            1,
            &SpecAutofitCellsPolicy::default(),
            &SpecXlsxValuePolicy::default(),
        );
        assert!((l_widths[0] - 8.4).abs() < 1e-9);
    }

    #[test]
    fn test_width_is_clamped() {
        let policy = SpecAutofitCellsPolicy::default();
        assert_eq!(calculate_column_width(10_000, &policy), N_WIDTH_EXCEL_COLUMN_MAX);
        assert!((calculate_column_width(0, &policy) - 2.4).abs() < 1e-9);
    }
}
