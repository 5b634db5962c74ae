//! Token-level classification: descriptor unwrapping, numeric/date/formula tests.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde_json::Value;

use crate::conf::{
    C_DESCRIPTOR_VALUE_KEY, C_FORMULA_PREFIX, N_YEAR_EXCEL_MAX, N_YEAR_EXCEL_MIN,
    TUP_DATE_COERCE_FORMATS, TUP_DATE_SHAPE_PATTERNS,
};
use crate::spec::SpecCell;

////////////////////////////////////////////////////////////////////////////////
// #region LiteralTests

fn derive_date_shape_regexes() -> &'static [Regex] {
    static DATE_SHAPES: OnceLock<Vec<Regex>> = OnceLock::new();
    DATE_SHAPES.get_or_init(|| {
        TUP_DATE_SHAPE_PATTERNS
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect()
    })
}

/// Whether `literal` parses as a decimal floating-point number.
pub fn is_number_literal(literal: &str) -> bool {
    !literal.is_empty() && literal.parse::<f64>().is_ok()
}

/// Whether `literal` fully matches one of the recognized date shapes.
pub fn is_date_literal(literal: &str) -> bool {
    derive_date_shape_regexes()
        .iter()
        .any(|regex| regex.is_match(literal))
}

/// Whether `literal` is a formula (leading `=`).
pub fn is_formula_literal(literal: &str) -> bool {
    literal.starts_with(C_FORMULA_PREFIX)
}

/// Parse a date literal with the coercion formats, first success wins.
///
/// Dates outside Excel's calendar range are rejected so the caller keeps the
/// literal text.
pub fn derive_date_from_literal(literal: &str) -> Option<NaiveDate> {
    TUP_DATE_COERCE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(literal, fmt).ok())
        .filter(|date| (N_YEAR_EXCEL_MIN..=N_YEAR_EXCEL_MAX).contains(&date.year()))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructuredDescriptor

/// Structured cell descriptor (`{"value": ...}`).
#[derive(Debug, Clone, PartialEq)]
pub struct SpecCellDescriptor {
    /// Effective content of the cell.
    pub value: Value,
}

/// Outcome of descriptor parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumDescriptorParse {
    /// Well-formed descriptor with a `value` key.
    Parsed(SpecCellDescriptor),
    /// Malformed descriptor; the original token is used as a bare literal.
    Fallback {
        /// Original token.
        literal: String,
    },
}

/// Where a classified token's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumTokenSource {
    /// Bare literal.
    Bare,
    /// Unwrapped from a descriptor.
    Descriptor,
    /// Descriptor-shaped token that failed to parse.
    DescriptorFallback,
}

/// Whether `token` is wrapped in braces.
pub fn is_descriptor_token(token: &str) -> bool {
    token.len() >= 2 && token.starts_with('{') && token.ends_with('}')
}

/// Parse a braces-wrapped token as a structured descriptor.
pub fn parse_descriptor(token: &str) -> EnumDescriptorParse {
    let fallback = || EnumDescriptorParse::Fallback {
        literal: token.to_string(),
    };

    let Ok(Value::Object(mut dict_fields)) = serde_json::from_str::<Value>(token) else {
        return fallback();
    };
    match dict_fields.remove(C_DESCRIPTOR_VALUE_KEY) {
        Some(value) => EnumDescriptorParse::Parsed(SpecCellDescriptor { value }),
        None => fallback(),
    }
}

/// Textual rendering of a descriptor `value`.
///
/// Strings are used verbatim; anything else, `null` included, renders as JSON
/// text so the cell is never blank.
pub fn render_descriptor_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TokenClassification

/// Classified token plus its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecClassifiedToken {
    /// Cell before column-level coercion.
    pub cell: SpecCell,
    /// Provenance of the content.
    pub source: EnumTokenSource,
}

/// Classify one trimmed token.
///
/// Only formulas are decided here; number/date coercion is a column-level
/// decision, so every other literal stays text until the style pass.
pub fn classify_token(token: &str) -> SpecClassifiedToken {
    if !is_descriptor_token(token) {
        return derive_literal_token(token.to_string(), EnumTokenSource::Bare);
    }

    match parse_descriptor(token) {
        EnumDescriptorParse::Parsed(descriptor) => {
            let c_literal = render_descriptor_value(&descriptor.value);
            derive_literal_token(c_literal, EnumTokenSource::Descriptor)
        }
        EnumDescriptorParse::Fallback { literal } => {
            log::debug!("malformed cell descriptor kept as literal: {literal}");
            derive_literal_token(literal, EnumTokenSource::DescriptorFallback)
        }
    }
}

fn derive_literal_token(literal: String, source: EnumTokenSource) -> SpecClassifiedToken {
    let cell = if is_formula_literal(&literal) {
        SpecCell::formula(literal)
    } else {
        SpecCell::text(literal)
    };
    SpecClassifiedToken { cell, source }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{EnumCellKind, EnumCellValue};

    #[test]
    fn test_date_shape_patterns_compile() {
        assert_eq!(
            derive_date_shape_regexes().len(),
            TUP_DATE_SHAPE_PATTERNS.len()
        );
    }

    #[test]
    fn test_number_literal() {
        for literal in ["10", "-3.5", "+2", ".5", "1e3", "0"] {
            assert!(is_number_literal(literal), "{literal}");
        }
        for literal in ["", "abc", "1,5", "10 kg", "2024-01-02"] {
            assert!(!is_number_literal(literal), "{literal}");
        }
    }

    #[test]
    fn test_date_literal_requires_full_match() {
        assert!(is_date_literal("2024-03-15"));
        assert!(is_date_literal("12/31/2024"));
        assert!(is_date_literal("15.03.2024"));
        assert!(!is_date_literal("2024-3-15"));
        assert!(!is_date_literal("x2024-03-15"));
        assert!(!is_date_literal("2024-03-15 10:00"));
    }

    #[test]
    fn test_date_coercion_order_is_day_first_for_slashes() {
        assert_eq!(
            derive_date_from_literal("01/02/2024"),
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
        // Month-first shape passes the shape test but not day-first parsing.
        assert!(is_date_literal("12/31/2024"));
        assert_eq!(derive_date_from_literal("12/31/2024"), None);
        assert_eq!(
            derive_date_from_literal("15.03.2024"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(derive_date_from_literal("2024-02-30"), None);
        assert_eq!(derive_date_from_literal("0001-01-01"), None);
    }

    #[test]
    fn test_descriptor_parse_and_fallback() {
        assert_eq!(
            parse_descriptor(r#"{"value": 42}"#),
            EnumDescriptorParse::Parsed(SpecCellDescriptor {
                value: Value::from(42)
            })
        );
        assert_eq!(
            parse_descriptor(r#"{"value": 42"#),
            EnumDescriptorParse::Fallback {
                literal: r#"{"value": 42"#.to_string()
            }
        );
        assert_eq!(
            parse_descriptor(r#"{"other": 1}"#),
            EnumDescriptorParse::Fallback {
                literal: r#"{"other": 1}"#.to_string()
            }
        );
    }

    #[test]
    fn test_classify_descriptor_values() {
        let token = classify_token(r#"{"value": "42"}"#);
        assert_eq!(token.cell, SpecCell::text("42"));
        assert_eq!(token.source, EnumTokenSource::Descriptor);

        let token = classify_token(r#"{"value": "=SUM(A1:A2)"}"#);
        assert_eq!(token.cell.kind, EnumCellKind::Formula);
        assert_eq!(
            token.cell.value,
            EnumCellValue::String("=SUM(A1:A2)".to_string())
        );

        let token = classify_token(r#"{"value": "2024-01-02"}"#);
        assert_eq!(token.cell, SpecCell::text("2024-01-02"));

        assert_eq!(classify_token(r#"{"value": 4.5}"#).cell, SpecCell::text("4.5"));
        assert_eq!(classify_token(r#"{"value": true}"#).cell, SpecCell::text("true"));
        assert_eq!(classify_token(r#"{"value": null}"#).cell, SpecCell::text("null"));
    }

    #[test]
    fn test_classify_malformed_descriptor_is_literal() {
        let token = classify_token("{not json}");
        assert_eq!(token.cell, SpecCell::text("{not json}"));
        assert_eq!(token.source, EnumTokenSource::DescriptorFallback);
    }

    #[test]
    fn test_classify_bare_formula() {
        let token = classify_token("={A1}");
        assert_eq!(token.cell, SpecCell::formula("={A1}"));
        assert_eq!(token.source, EnumTokenSource::Bare);
    }
}
