// ==========================================
// 电商采购单解析引擎 - 工作簿加载器
// ==========================================
// 阶段 0: 字节流 → RawWorksheet
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 红线: 保留空行空列（下游锚点依赖绝对位置）
// ==========================================

use crate::config::SheetSelector;
use crate::domain::types::FileKind;
use crate::domain::worksheet::{CellValue, RawWorksheet};
use crate::importer::error::{ParseError, ParseOutcome};
use crate::importer::po_parser_trait::WorkbookLoader;
use calamine::{open_workbook_from_rs, Data, Range, Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use std::fmt::Display;
use std::io::{Cursor, Read, Seek};
use tracing::{debug, warn};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

// ==========================================
// CSV Loader 实现
// ==========================================
pub struct CsvLoader;

impl WorkbookLoader for CsvLoader {
    fn load(&self, bytes: &[u8], sheet: &SheetSelector) -> ParseOutcome<RawWorksheet> {
        if let SheetSelector::Named(name) = sheet {
            debug!(sheet = %name, "CSV 无工作表概念，忽略工作表选择");
        }

        let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let padded = pad_blank_lines(body);

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(padded.as_slice());

        let mut rows = Vec::new();
        for record in reader.byte_records() {
            let record = record?;
            let row: Vec<CellValue> = record
                .iter()
                .map(|field| CellValue::from(String::from_utf8_lossy(field).as_ref()))
                .collect();
            rows.push(row);
        }

        finish("csv", rows)
    }
}

/// csv 解析器会吞掉空行；在引号外的空物理行写入 `""`，使其成为一行空单元格
fn pad_blank_lines(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 16);
    let mut in_quotes = false;
    let mut line_start = true;

    for (i, &b) in body.iter().enumerate() {
        if line_start && !in_quotes && (b == b'\n' || b == b'\r') {
            out.extend_from_slice(b"\"\"");
        }
        if b == b'"' {
            in_quotes = !in_quotes;
        }
        out.push(b);

        line_start = match b {
            b'\n' => true,
            b'\r' => body.get(i + 1) != Some(&b'\n'),
            _ => false,
        };
    }
    out
}

// ==========================================
// Excel Loader 实现
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExcelFormat {
    Xlsx,
    Xls,
}

pub struct ExcelLoader {
    format: ExcelFormat,
}

impl ExcelLoader {
    pub fn xlsx() -> Self {
        Self {
            format: ExcelFormat::Xlsx,
        }
    }

    pub fn xls() -> Self {
        Self {
            format: ExcelFormat::Xls,
        }
    }
}

impl WorkbookLoader for ExcelLoader {
    fn load(&self, bytes: &[u8], sheet: &SheetSelector) -> ParseOutcome<RawWorksheet> {
        let cursor = Cursor::new(bytes);
        match self.format {
            ExcelFormat::Xlsx => {
                let workbook: Xlsx<_> = open_workbook_from_rs(cursor)?;
                read_sheet(workbook, sheet)
            }
            ExcelFormat::Xls => {
                let workbook: Xls<_> = open_workbook_from_rs(cursor)?;
                read_sheet(workbook, sheet)
            }
        }
    }
}

fn read_sheet<RS, R>(mut workbook: R, selector: &SheetSelector) -> ParseOutcome<RawWorksheet>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: Display,
{
    let sheet_names = workbook.sheet_names();
    let sheet_name = match selector {
        SheetSelector::First => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ParseError::Format("工作簿无工作表".to_string()))?,
        SheetSelector::Named(name) => sheet_names
            .iter()
            .find(|n| n.as_str() == name.as_str())
            .cloned()
            .ok_or_else(|| ParseError::SheetNotFound(name.clone()))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ParseError::Format(format!("工作表 {} 读取失败: {}", sheet_name, e)))?;

    finish(&sheet_name, range_to_rows(&range))
}

/// Range 只覆盖已用区域；按起点补齐前导空行空列，恢复绝对位置
fn range_to_rows(range: &Range<Data>) -> Vec<Vec<CellValue>> {
    let (start_row, start_col) = match range.start() {
        Some((r, c)) => (r as usize, c as usize),
        None => return Vec::new(),
    };

    let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); start_row];
    for data_row in range.rows() {
        let mut row = vec![CellValue::Empty; start_col];
        row.extend(data_row.iter().map(convert_cell));
        rows.push(row);
    }
    rows
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from(s.as_str()),
        Data::Error(e) => {
            warn!(error = ?e, "单元格错误值，按空单元格处理");
            CellValue::Empty
        }
    }
}

fn finish(sheet: &str, rows: Vec<Vec<CellValue>>) -> ParseOutcome<RawWorksheet> {
    let worksheet = RawWorksheet::new(sheet, rows);
    let has_data = (0..worksheet.row_count()).any(|r| !worksheet.is_row_empty(r));
    if !has_data {
        return Err(ParseError::EmptyDocument {
            sheet: sheet.to_string(),
        });
    }

    debug!(
        sheet = %sheet,
        rows = worksheet.row_count(),
        columns = worksheet.column_count(),
        "工作表加载完成"
    );
    Ok(worksheet)
}

// ==========================================
// 通用加载器（根据声明的文件类型选择）
// ==========================================
pub struct UniversalLoader;

impl UniversalLoader {
    pub fn load(
        &self,
        bytes: &[u8],
        kind: FileKind,
        sheet: &SheetSelector,
    ) -> ParseOutcome<RawWorksheet> {
        match kind {
            FileKind::Csv => CsvLoader.load(bytes, sheet),
            FileKind::Xlsx => ExcelLoader::xlsx().load(bytes, sheet),
            FileKind::Xls => ExcelLoader::xls().load(bytes, sheet),
        }
    }
}
