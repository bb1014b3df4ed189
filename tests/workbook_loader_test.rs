// ==========================================
// 工作簿加载器集成测试
// ==========================================
// 测试目标: XLSX / CSV 加载后单元格保持绝对位置
// ==========================================


use po_ingest::config::SheetSelector;
use po_ingest::domain::{CellValue, FileKind};
use po_ingest::importer::{ParseError, UniversalLoader};
use rust_xlsxwriter::Workbook;
use test_helpers::{blank, grid_to_csv, grid_to_xlsx, sparse, Grid};

fn offset_grid() -> Grid {
    vec![
        blank(),
        blank(),
        sparse(&[(2, "PO#"), (3, "PO12345")]),
        blank(),
        sparse(&[(1, "S.No"), (2, "HSN"), (3, "Quantity")]),
        sparse(&[(1, "1"), (2, "04090000"), (3, "12")]),
    ]
}

#[test]
fn test_xlsx_keeps_leading_blank_rows_and_columns() {
    let bytes = grid_to_xlsx(&offset_grid()).unwrap();
    let ws = UniversalLoader
        .load(&bytes, FileKind::Xlsx, &SheetSelector::First)
        .unwrap();

    assert_eq!(ws.name(), "PO");
    assert!(ws.is_row_empty(0));
    assert!(ws.is_row_empty(1));
    assert!(ws.is_row_empty(3));
    assert_eq!(ws.text(2, 2), "PO#");
    assert_eq!(ws.text(2, 3), "PO12345");
    assert_eq!(ws.text(4, 1), "S.No");
    assert_eq!(ws.cell(5, 3), &CellValue::Number(12.0));
    // 前导 0 编码以文本写入，保持原样
    assert_eq!(ws.cell(5, 2), &CellValue::Text("04090000".into()));
    assert_eq!(ws.first_non_empty(4).map(|(c, _)| c), Some(1));
}

#[test]
fn test_csv_and_xlsx_agree_on_positions() {
    let grid = offset_grid();
    let from_csv = UniversalLoader
        .load(&grid_to_csv(&grid), FileKind::Csv, &SheetSelector::First)
        .unwrap();
    let from_xlsx = UniversalLoader
        .load(&grid_to_xlsx(&grid).unwrap(), FileKind::Xlsx, &SheetSelector::First)
        .unwrap();

    for row in 0..grid.len() {
        for col in 0..4 {
            assert_eq!(
                from_csv.text(row, col),
                from_xlsx.text(row, col),
                "({}, {})",
                row,
                col
            );
        }
    }
}

fn two_sheet_workbook() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let summary = workbook.add_worksheet();
    summary.set_name("Summary").unwrap();
    summary.write_string(0, 0, "Cover page").unwrap();

    let lines = workbook.add_worksheet();
    lines.set_name("Lines").unwrap();
    lines.write_string(0, 0, "PO#").unwrap();
    lines.write_string(0, 1, "PO777").unwrap();
    workbook.save_to_buffer().unwrap()
}

#[test]
fn test_named_sheet() {
    let bytes = two_sheet_workbook();

    let first = UniversalLoader
        .load(&bytes, FileKind::Xlsx, &SheetSelector::First)
        .unwrap();
    assert_eq!(first.name(), "Summary");

    let named = UniversalLoader
        .load(&bytes, FileKind::Xlsx, &SheetSelector::Named("Lines".into()))
        .unwrap();
    assert_eq!(named.name(), "Lines");
    assert_eq!(named.text(0, 1), "PO777");
}

#[test]
fn test_missing_sheet() {
    let err = UniversalLoader
        .load(
            &two_sheet_workbook(),
            FileKind::Xlsx,
            &SheetSelector::Named("Invoice".into()),
        )
        .unwrap_err();
    assert_eq!(err, ParseError::SheetNotFound("Invoice".into()));
}

#[test]
fn test_csv_ignores_sheet_selector() {
    let bytes = grid_to_csv(&offset_grid());
    let ws = UniversalLoader
        .load(&bytes, FileKind::Csv, &SheetSelector::Named("Lines".into()))
        .unwrap();
    assert_eq!(ws.text(2, 3), "PO12345");
}

#[test]
fn test_empty_inputs() {
    let err = UniversalLoader
        .load(b"", FileKind::Csv, &SheetSelector::First)
        .unwrap_err();
    assert!(matches!(err, ParseError::EmptyDocument { .. }));

    let mut workbook = Workbook::new();
    workbook.add_worksheet();
    let bytes = workbook.save_to_buffer().unwrap();
    let err = UniversalLoader
        .load(&bytes, FileKind::Xlsx, &SheetSelector::First)
        .unwrap_err();
    assert!(matches!(err, ParseError::EmptyDocument { .. }));
}

#[test]
fn test_garbage_declared_as_xlsx() {
    let err = UniversalLoader
        .load(b"PO#,PO12345\n", FileKind::Xlsx, &SheetSelector::First)
        .unwrap_err();
    assert!(matches!(err, ParseError::Format(_)));
}
