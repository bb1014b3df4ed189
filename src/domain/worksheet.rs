// ==========================================
// 电商采购单解析引擎 - 原始工作表
// ==========================================
// 职责: 统一的行列单元格网格（保留空行空列，位置连续）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 单元格值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// 空单元格或纯空白文本
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// 单元格的文本形式（去除首尾空白）
    ///
    /// 整数值的浮点数不带小数部分输出（1.0 → "1"）
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => format_number(*n),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

static EMPTY_CELL: CellValue = CellValue::Empty;

// ==========================================
// RawWorksheet - 原始工作表
// ==========================================
// 行/列下标均为 0 起；越界访问返回空单元格
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawWorksheet {
    name: String,
    rows: Vec<Vec<CellValue>>,
}

impl RawWorksheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// 由文本网格构造（测试与 CSV 使用）
    pub fn from_text_rows<R, C>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|c| CellValue::from(c.as_ref())).collect())
            .collect();
        Self::new(name, rows)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// 所有行中最大的列数
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn row(&self, row: usize) -> &[CellValue] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[CellValue]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn text(&self, row: usize, col: usize) -> String {
        self.cell(row, col).as_text()
    }

    pub fn is_row_empty(&self, row: usize) -> bool {
        self.row(row).iter().all(CellValue::is_empty)
    }

    /// 行内第一个非空单元格（列号, 值）
    pub fn first_non_empty(&self, row: usize) -> Option<(usize, &CellValue)> {
        self.row(row).iter().enumerate().find(|(_, c)| !c.is_empty())
    }
}
