//! Stateless helper utilities used by the conversion pipeline.

use std::collections::BTreeSet;

use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL};
use crate::spec::SpecXlsxValuePolicy;

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Convert `NaN`/`Inf` to policy string; return error for finite values.
pub fn convert_nan_inf_to_str(
    x: f64,
    value_policy: &SpecXlsxValuePolicy,
) -> Result<String, String> {
    if x.is_nan() {
        return Ok(value_policy.nan_str.clone());
    }
    if x.is_infinite() {
        return Ok(if x.is_sign_positive() {
            value_policy.posinf_str.clone()
        } else {
            value_policy.neginf_str.clone()
        });
    }
    Err("Input is neither NaN nor Inf.".to_string())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str, fallback: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    // Excel rejects names that start or end with an apostrophe.
    c_name = c_name.trim().trim_matches('\'').trim().to_string();
    if c_name.is_empty() {
        c_name = fallback.to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Return `name` or the first free `name__N` (N >= 2), and register it.
///
/// Excel compares sheet names case-insensitively, so `set_names_existing` holds
/// lowercase keys.
pub fn derive_unique_sheet_name(name: &str, set_names_existing: &mut BTreeSet<String>) -> String {
    if set_names_existing.insert(name.to_lowercase()) {
        return name.to_string();
    }

    let base_name: String = name
        .chars()
        .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 4))
        .collect();

    let mut n_idx = 2usize;
    loop {
        let candidate: String = format!("{base_name}__{n_idx}")
            .chars()
            .take(N_LEN_EXCEL_SHEET_NAME_MAX)
            .collect();
        if set_names_existing.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n_idx += 1;
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Workers

/// Resolve worker count: explicit values are clamped to the CPU count.
pub fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);

    match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => n_cpu.clamp(1, 8),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_nan_inf_to_str() {
        let policy = SpecXlsxValuePolicy::default();
        assert_eq!(convert_nan_inf_to_str(f64::NAN, &policy), Ok("NaN".to_string()));
        assert_eq!(
            convert_nan_inf_to_str(f64::INFINITY, &policy),
            Ok("Inf".to_string())
        );
        assert!(convert_nan_inf_to_str(1.0, &policy).is_err());
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("Q1/Q2: [draft]", "_", "Sheet"), "Q1_Q2_ _draft_");
        assert_eq!(sanitize_sheet_name("  ", "_", "Sheet1"), "Sheet1");
        assert_eq!(sanitize_sheet_name("'quoted'", "_", "Sheet1"), "quoted");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40), "_", "S").len(), 31);
    }

    #[test]
    fn test_derive_unique_sheet_name() {
        let mut set_names = BTreeSet::new();
        assert_eq!(derive_unique_sheet_name("Data", &mut set_names), "Data");
        assert_eq!(derive_unique_sheet_name("data", &mut set_names), "data__2");
        assert_eq!(derive_unique_sheet_name("Data", &mut set_names), "Data__3");

        let c_long = "y".repeat(31);
        let c_renamed = derive_unique_sheet_name(&c_long, &mut set_names);
        assert_eq!(derive_unique_sheet_name(&c_long, &mut set_names).len(), 30);
        assert_eq!(c_renamed, c_long);
    }

    #[test]
    fn test_calculate_worker_limit() {
        assert_eq!(calculate_worker_limit(Some(1)), 1);
        assert!(calculate_worker_limit(None) >= 1);
        assert!(calculate_worker_limit(Some(0)) >= 1);
    }
}
