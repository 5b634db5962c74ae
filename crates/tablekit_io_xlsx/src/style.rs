//! Style resolution engine.
//!
//! Each sheet goes through strictly ordered passes:
//! 1. column classification over the data rows,
//! 2. value coercion for numeric and date columns,
//! 3. per-cell style resolution (pure, rule list evaluated top-down),
//! 4. column sizing over the final values.

use crate::classify::{derive_date_from_literal, is_date_literal, is_number_literal};
use crate::conf::derive_default_emphasis_format;
use crate::sizing::plan_column_widths;
use crate::spec::{
    EnumCellKind, EnumCellValue, EnumColumnClass, SpecCell, SpecCellContext, SpecCellFormat,
    SpecConvertOptions, SpecSheet, SpecStyledCell, SpecStyledSheet, SpecStylePalette,
};

////////////////////////////////////////////////////////////////////////////////
// #region ColumnClassification

/// Literals of the data cells (row >= 1) that take part in unanimity checks.
///
/// Blank cells, formulas and positions missing from ragged rows are skipped.
pub fn derive_participating_literals(sheet: &SpecSheet, col_idx: usize) -> Vec<&str> {
    (1..sheet.height())
        .filter_map(|row_idx| sheet.cell(row_idx, col_idx))
        .filter(|cell| cell.kind != EnumCellKind::Formula && !cell.value.is_blank())
        .filter_map(|cell| cell.value.as_literal())
        .collect()
}

/// Classify one column.
pub fn classify_column(sheet: &SpecSheet, col_idx: usize) -> EnumColumnClass {
    let l_literals = derive_participating_literals(sheet, col_idx);
    // `all` is vacuously true on an empty column.
    if l_literals.is_empty() {
        return EnumColumnClass::Text;
    }
    if l_literals.iter().all(|literal| is_date_literal(literal)) {
        return EnumColumnClass::Date;
    }
    if l_literals.iter().all(|literal| is_number_literal(literal)) {
        return EnumColumnClass::Numeric;
    }
    EnumColumnClass::Text
}

/// Classify every column in `0..sheet.width()`.
pub fn classify_columns(sheet: &SpecSheet) -> Vec<EnumColumnClass> {
    (0..sheet.width())
        .map(|col_idx| classify_column(sheet, col_idx))
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ValueCoercion

/// Coerce one data cell according to its column class.
///
/// Returns the cell and whether a date-shaped literal failed calendar parsing.
pub fn coerce_cell(cell: &SpecCell, column_class: EnumColumnClass) -> (SpecCell, bool) {
    if cell.kind == EnumCellKind::Formula || cell.value.is_blank() {
        return (cell.clone(), false);
    }
    let Some(literal) = cell.value.as_literal() else {
        return (cell.clone(), false);
    };

    match column_class {
        EnumColumnClass::Text => (cell.clone(), false),
        EnumColumnClass::Numeric => match literal.parse::<f64>() {
            Ok(n) => (
                SpecCell {
                    value: EnumCellValue::Number(n),
                    kind: EnumCellKind::Number,
                },
                false,
            ),
            Err(_) => (cell.clone(), false),
        },
        EnumColumnClass::Date => match derive_date_from_literal(literal) {
            Some(date) => (
                SpecCell {
                    value: EnumCellValue::Date(date),
                    kind: EnumCellKind::Date,
                },
                false,
            ),
            None => (cell.clone(), true),
        },
    }
}

/// Coerce all data rows; the header row is kept verbatim.
///
/// Returns the coerced rows and the count of unparseable date literals.
pub fn coerce_sheet_cells(
    sheet: &SpecSheet,
    column_classes: &[EnumColumnClass],
) -> (Vec<Vec<SpecCell>>, usize) {
    let mut n_unparsed_dates = 0usize;
    let l_rows = sheet
        .rows
        .iter()
        .enumerate()
        .map(|(row_idx, row)| {
            if row_idx == 0 {
                return row.clone();
            }
            row.iter()
                .zip(column_classes)
                .map(|(cell, column_class)| {
                    let (cell_coerced, if_unparsed) = coerce_cell(cell, *column_class);
                    if if_unparsed {
                        n_unparsed_dates += 1;
                    }
                    cell_coerced
                })
                .collect()
        })
        .collect();
    (l_rows, n_unparsed_dates)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StyleRules

/// Inputs shared by every style rule.
#[derive(Debug, Clone, Copy)]
pub struct SpecStyleRuleEnv<'a> {
    /// Fill/border palette.
    pub palette: &'a SpecStylePalette,
    /// Number format for date-column data cells.
    pub date_num_format: &'a str,
    /// Body indent.
    pub indent_body: u8,
}

/// Style layers, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumStyleLayer {
    /// Thin grid and body alignment on every cell.
    TableBase,
    /// Fill and number format by column class and parity.
    ColumnBand,
    /// Thick sides on the sheet's outer edge.
    OuterEdge,
    /// Header row emphasis.
    HeaderRow,
    /// First column emphasis.
    FirstColumn,
}

/// Signature shared by all style rules.
pub type FnStyleRule = fn(&SpecCellContext, &SpecStyleRuleEnv<'_>) -> Option<SpecCellFormat>;

/// Ordered override rules; later entries win on the fields they set.
pub const L_STYLE_RULES: [(EnumStyleLayer, FnStyleRule); 5] = [
    (EnumStyleLayer::TableBase, rule_table_base),
    (EnumStyleLayer::ColumnBand, rule_column_band),
    (EnumStyleLayer::OuterEdge, rule_outer_edge),
    (EnumStyleLayer::HeaderRow, rule_header_row),
    (EnumStyleLayer::FirstColumn, rule_first_column),
];

/// Band fill for a data column; `col_idx` is zero-based, parity is 1-based.
pub fn derive_band_fill(
    column_class: EnumColumnClass,
    col_idx: usize,
    palette: &SpecStylePalette,
) -> &str {
    let if_even = (col_idx + 1) % 2 == 0;
    match (column_class, if_even) {
        (EnumColumnClass::Numeric, true) => &palette.numeric_even,
        (EnumColumnClass::Numeric, false) => &palette.numeric_odd,
        (EnumColumnClass::Text, true) => &palette.text_even,
        (EnumColumnClass::Text, false) => &palette.text_odd,
        (EnumColumnClass::Date, _) => &palette.date_color,
    }
}

fn rule_table_base(
    _ctx: &SpecCellContext,
    env: &SpecStyleRuleEnv<'_>,
) -> Option<SpecCellFormat> {
    Some(SpecCellFormat {
        indent: Some(env.indent_body),
        ..SpecCellFormat::with_all_sides(env.palette.border_thin)
    })
}

fn rule_column_band(
    ctx: &SpecCellContext,
    env: &SpecStyleRuleEnv<'_>,
) -> Option<SpecCellFormat> {
    if ctx.is_header_row() {
        return None;
    }
    Some(SpecCellFormat {
        bg_color: Some(
            derive_band_fill(ctx.column_class, ctx.col_idx, env.palette).to_string(),
        ),
        num_format: (ctx.column_class == EnumColumnClass::Date)
            .then(|| env.date_num_format.to_string()),
        ..Default::default()
    })
}

fn rule_outer_edge(
    ctx: &SpecCellContext,
    env: &SpecStyleRuleEnv<'_>,
) -> Option<SpecCellFormat> {
    if !ctx.is_outer_edge() {
        return None;
    }
    let n_thick = env.palette.border_thick;
    Some(SpecCellFormat {
        top: (ctx.row_idx == 0).then_some(n_thick),
        bottom: (ctx.row_idx + 1 == ctx.n_rows).then_some(n_thick),
        left: (ctx.col_idx == 0).then_some(n_thick),
        right: (ctx.col_idx + 1 == ctx.n_cols).then_some(n_thick),
        ..Default::default()
    })
}

fn rule_header_row(
    ctx: &SpecCellContext,
    env: &SpecStyleRuleEnv<'_>,
) -> Option<SpecCellFormat> {
    if !ctx.is_header_row() {
        return None;
    }
    Some(
        derive_default_emphasis_format()
            .merge(&SpecCellFormat::with_all_sides(env.palette.border_thick))
            .with_(SpecCellFormat {
                bg_color: Some(env.palette.header_fill.clone()),
                ..Default::default()
            }),
    )
}

fn rule_first_column(
    ctx: &SpecCellContext,
    env: &SpecStyleRuleEnv<'_>,
) -> Option<SpecCellFormat> {
    if !ctx.is_first_column() {
        return None;
    }
    // Header fill wins the (0, 0) tie.
    let bg_color = (!ctx.is_header_row()).then(|| env.palette.first_column_fill.clone());
    Some(
        derive_default_emphasis_format()
            .merge(&SpecCellFormat::with_all_sides(env.palette.border_thick))
            .with_(SpecCellFormat {
                bg_color,
                ..Default::default()
            }),
    )
}

/// Resolve the final format of one cell.
pub fn resolve_cell_style(ctx: &SpecCellContext, env: &SpecStyleRuleEnv<'_>) -> SpecCellFormat {
    L_STYLE_RULES
        .iter()
        .filter_map(|(_, rule)| rule(ctx, env))
        .fold(SpecCellFormat::default(), |fmt_acc, patch| {
            fmt_acc.merge(&patch)
        })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetPlan

/// Run classification, coercion, styling and sizing for one sheet.
///
/// Returns the styled sheet and non-fatal warnings.
pub fn plan_styled_sheet(
    sheet: &SpecSheet,
    options: &SpecConvertOptions,
) -> (SpecStyledSheet, Vec<String>) {
    let mut l_warnings = Vec::new();
    let n_rows = sheet.height();
    let n_cols = sheet.width();

    let l_column_classes = classify_columns(sheet);
    let (l_rows_coerced, n_unparsed_dates) = coerce_sheet_cells(sheet, &l_column_classes);
    if n_unparsed_dates > 0 {
        log::debug!(
            "sheet {:?}: {n_unparsed_dates} date literal(s) kept as text",
            sheet.name
        );
        l_warnings.push(format!(
            "Sheet {:?}: {n_unparsed_dates} date-shaped value(s) could not be parsed and were kept as text.",
            sheet.name
        ));
    }

    let env = SpecStyleRuleEnv {
        palette: &options.palette,
        date_num_format: &options.date_num_format,
        indent_body: options.indent_body,
    };

    let l_cells: Vec<Vec<SpecStyledCell>> = (0..n_rows)
        .map(|row_idx| {
            (0..n_cols)
                .map(|col_idx| {
                    let ctx = SpecCellContext {
                        row_idx,
                        col_idx,
                        n_rows,
                        n_cols,
                        column_class: l_column_classes[col_idx],
                    };
                    let cell = l_rows_coerced[row_idx]
                        .get(col_idx)
                        .cloned()
                        .unwrap_or(SpecCell {
                            value: EnumCellValue::None,
                            kind: EnumCellKind::Text,
                        });
                    SpecStyledCell {
                        value: cell.value,
                        kind: cell.kind,
                        format: resolve_cell_style(&ctx, &env),
                    }
                })
                .collect()
        })
        .collect();

    let l_column_widths = if options.autofit.if_enabled {
        plan_column_widths(&l_cells, n_cols, &options.autofit, &options.value_policy)
    } else {
        vec![]
    };

    log::debug!(
        "sheet {:?}: styled {n_rows}x{n_cols}, classes={l_column_classes:?}",
        sheet.name
    );

    (
        SpecStyledSheet {
            name: sheet.name.clone(),
            cells: l_cells,
            column_classes: l_column_classes,
            column_widths: l_column_widths,
        },
        l_warnings,
    )
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
