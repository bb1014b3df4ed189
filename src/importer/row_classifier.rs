// ==========================================
// 电商采购单解析引擎 - 明细行分类器
// ==========================================
// 从表头下一行开始逐行分类:
//   空行 → 跳过
//   终止行（首个非空单元格命中合计短语 / 第 0 列为说明文字）→ 停止扫描
//   序号为正整数且必填列至少一个非空 → 明细行
//   其余（续行 / 小计 / 重复表头）→ 跳过
// ==========================================

use crate::domain::worksheet::{CellValue, RawWorksheet};
use crate::importer::table_locator::ColumnLayout;
use regex::Regex;
use tracing::{debug, trace};

/// 行分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowClass {
    Accept { line_number: u32 },
    Skip,
    Stop,
}

/// 被接受的明细行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptedRow {
    /// 工作表行号（0 起）
    pub row: usize,
    pub line_number: u32,
}

/// 一次扫描的汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    pub accepted: Vec<AcceptedRow>,
    pub skipped: usize,
    /// 终止行（0 起）；扫描到表尾时为 None
    pub terminated_at: Option<usize>,
}

// ==========================================
// RowClassifier
// ==========================================
pub struct RowClassifier<'a> {
    terminators: &'a [Regex],
    prose_threshold: usize,
}

impl<'a> RowClassifier<'a> {
    pub fn new(terminators: &'a [Regex], prose_threshold: usize) -> Self {
        Self {
            terminators,
            prose_threshold,
        }
    }

    /// 扫描表头之后的所有行
    pub fn scan(&self, ws: &RawWorksheet, header_row: usize, layout: &ColumnLayout<'_>) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        let mut next_sequential = 1u32;

        for row in header_row + 1..ws.row_count() {
            match self.classify(ws, row, layout) {
                RowClass::Accept { line_number } => {
                    let line_number = if layout.serial.is_some() {
                        line_number
                    } else {
                        let n = next_sequential;
                        next_sequential += 1;
                        n
                    };
                    outcome.accepted.push(AcceptedRow { row, line_number });
                }
                RowClass::Skip => outcome.skipped += 1,
                RowClass::Stop => {
                    outcome.terminated_at = Some(row);
                    break;
                }
            }
        }

        debug!(
            accepted = outcome.accepted.len(),
            skipped = outcome.skipped,
            terminated_at = ?outcome.terminated_at,
            "明细行扫描完成"
        );
        outcome
    }

    /// 单行分类
    ///
    /// 无序号列时 Accept 的 line_number 为 0，由 scan 顺序编号
    pub fn classify(&self, ws: &RawWorksheet, row: usize, layout: &ColumnLayout<'_>) -> RowClass {
        let Some((_, first)) = ws.first_non_empty(row) else {
            return RowClass::Skip;
        };

        let first_text = first.as_text();
        if self.is_terminator(&first_text) {
            trace!(row, text = %first_text, "终止行");
            return RowClass::Stop;
        }
        // 长度只看第 0 列：续行的长描述在后面的列里，不能当作说明文字
        if self.is_prose(&ws.text(row, 0)) {
            trace!(row, "说明文字行");
            return RowClass::Stop;
        }

        let has_value = |col: &usize| !ws.cell(row, *col).is_empty();

        match layout.serial {
            Some(serial_col) => {
                let Some(line_number) = serial_number(ws.cell(row, serial_col)) else {
                    return RowClass::Skip;
                };
                if layout.required.is_empty() || layout.required.iter().any(has_value) {
                    RowClass::Accept { line_number }
                } else {
                    RowClass::Skip
                }
            }
            None => {
                if !layout.required.is_empty() && layout.required.iter().all(has_value) {
                    RowClass::Accept { line_number: 0 }
                } else {
                    RowClass::Skip
                }
            }
        }
    }

    fn is_terminator(&self, text: &str) -> bool {
        self.terminators.iter().any(|re| re.is_match(text))
    }

    fn is_prose(&self, text: &str) -> bool {
        text.chars().count() > self.prose_threshold
    }
}

/// 严格正整数序号（1 / 1.0 / "12"），其余返回 None
pub fn serial_number(cell: &CellValue) -> Option<u32> {
    match cell {
        CellValue::Number(n) if n.fract() == 0.0 && *n >= 1.0 && *n <= u32::MAX as f64 => {
            Some(*n as u32)
        }
        CellValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            s.parse::<u32>().ok().filter(|n| *n > 0)
        }
        _ => None,
    }
}
