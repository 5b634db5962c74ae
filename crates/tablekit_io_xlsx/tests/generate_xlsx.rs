use std::fs;

use pretty_assertions::assert_eq;
use tablekit_io_xlsx::{ConvertError, SpecConvertOptions, generate_xlsx};

const C_INVENTORY: &str = "sheet:Inventory\r\nItem;Qty;Date\r\nApples;10;2024-03-15\r\nPears;x;2024-03-16\r\n\r\n\r\nk;v\r\n{\"value\": \"42\"};={A1}\r\n";

#[test]
fn test_generate_workbook_from_text_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path_in = dir.path().join("xlsx_generate.txt");
    let path_out = dir.path().join("output.xlsx");
    fs::write(&path_in, C_INVENTORY).expect("write input");

    let report =
        generate_xlsx(&path_in, &path_out, &SpecConvertOptions::default()).expect("generate");

    let l_names: Vec<&str> = report.sheets.iter().map(|s| s.sheet_name.as_str()).collect();
    assert_eq!(l_names, vec!["Inventory", "Sheet2"]);
    assert_eq!((report.sheets[0].n_rows, report.sheets[0].n_cols), (3, 3));
    assert_eq!((report.sheets[1].n_rows, report.sheets[1].n_cols), (2, 2));

    let v_bytes = fs::read(&path_out).expect("read output");
    assert!(v_bytes.starts_with(b"PK\x03\x04"));

    // Only the input and the persisted workbook remain; no temp leftovers.
    let n_entries = fs::read_dir(dir.path()).expect("read_dir").count();
    assert_eq!(n_entries, 2);
}

#[test]
fn test_missing_input_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path_out = dir.path().join("output.xlsx");

    let err = generate_xlsx(
        &dir.path().join("absent.txt"),
        &path_out,
        &SpecConvertOptions::default(),
    )
    .expect_err("missing input");

    assert!(matches!(err, ConvertError::MissingInput(_)));
    assert!(err.to_string().starts_with("Input file not found"));
    assert!(!path_out.exists());
}

#[test]
fn test_duplicate_sheet_names_are_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path_in = dir.path().join("in.txt");
    let path_out = dir.path().join("dup.xlsx");
    fs::write(&path_in, "sheet:Data\na;1\n\nsheet:data\nb;2\n").expect("write input");

    let report =
        generate_xlsx(&path_in, &path_out, &SpecConvertOptions::default()).expect("generate");

    assert_eq!(report.sheets[1].sheet_name, "data__2");
    assert_eq!(report.warnings.len(), 1);
    assert!(path_out.exists());
}
