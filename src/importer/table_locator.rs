// ==========================================
// 电商采购单解析引擎 - 明细表定位与列解析
// ==========================================
// 定位: 在扫描窗口内找命中表头标记最多的首行
// 兜底: 序号列首次出现整数 1 的行，其上一行视为表头
// 列解析: 表头文本优先，固定列号兜底
// ==========================================

use crate::config::ParserConfig;
use crate::domain::vendor_profile::{ColumnMapping, LineField, VendorProfile};
use crate::domain::worksheet::RawWorksheet;
use crate::importer::error::{ParseError, ParseOutcome, ParseWarning};
use crate::importer::row_classifier::serial_number;
use std::collections::HashSet;
use tracing::{debug, warn};

/// 明细表位置（0 起行号）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLocation {
    pub header_row: usize,
    /// 表头由序号兜底推断
    pub inferred: bool,
}

/// 单个列映射解析后的实际列号
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumn<'p> {
    pub mapping: &'p ColumnMapping,
    pub col: usize,
}

/// 明细表列布局
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout<'p> {
    pub columns: Vec<ResolvedColumn<'p>>,
    /// 序号列（映射为 LineNumber 的列）
    pub serial: Option<usize>,
    /// 必填字段所在列
    pub required: Vec<usize>,
}

/// 表头行至少命中的不同标记数
pub const MIN_TABLE_TOKENS: usize = 2;

// ==========================================
// TableLocator
// ==========================================
pub struct TableLocator<'a> {
    config: &'a ParserConfig,
}

impl<'a> TableLocator<'a> {
    pub fn new(config: &'a ParserConfig) -> Self {
        Self { config }
    }

    /// 定位明细表表头行
    ///
    /// # 返回
    /// - Ok(TableLocation): 推断表头时附带 TableHeaderInferred 告警
    /// - Err(TableNotFound): 标记与序号兜底均失败
    pub fn locate(
        &self,
        ws: &RawWorksheet,
        profile: &VendorProfile,
        warnings: &mut Vec<ParseWarning>,
    ) -> ParseOutcome<TableLocation> {
        let scan_rows = profile
            .table
            .scan_rows
            .unwrap_or(self.config.table_scan_rows)
            .min(ws.row_count());
        let tokens: Vec<String> = profile
            .table
            .tokens
            .iter()
            .map(|t| normalize_token(t))
            .filter(|t| !t.is_empty())
            .collect();
        let min_matches = profile
            .table
            .min_matches
            .unwrap_or(self.config.min_token_matches)
            .min(tokens.len())
            .max(MIN_TABLE_TOKENS);

        for row in 0..scan_rows {
            let score = token_score(ws, row, &tokens);
            if score >= min_matches {
                debug!(vendor = %profile.id, header_row = row, score, "明细表表头定位成功");
                return Ok(TableLocation {
                    header_row: row,
                    inferred: false,
                });
            }
        }

        // 兜底: 序号列出现 1 且该行至少两个非空单元格
        let serial_col = profile
            .serial_mapping()
            .and_then(|m| m.column)
            .unwrap_or(0);
        for row in 1..scan_rows {
            let non_empty = ws.row(row).iter().filter(|c| !c.is_empty()).count();
            if serial_number(ws.cell(row, serial_col)) == Some(1) && non_empty >= 2 {
                let header_row = row - 1;
                warn!(vendor = %profile.id, header_row, "未命中表头标记，按序号推断表头");
                warnings.push(ParseWarning::TableHeaderInferred {
                    row: header_row + 1,
                });
                return Ok(TableLocation {
                    header_row,
                    inferred: true,
                });
            }
        }

        Err(ParseError::TableNotFound {
            vendor: profile.id.clone(),
            scanned_rows: scan_rows,
        })
    }
}

/// 行内命中的不同标记数
fn token_score(ws: &RawWorksheet, row: usize, tokens: &[String]) -> usize {
    let cells: Vec<String> = ws
        .row(row)
        .iter()
        .map(|c| normalize_token(&c.as_text()))
        .filter(|c| !c.is_empty())
        .collect();
    if cells.is_empty() {
        return 0;
    }

    let mut matched = HashSet::new();
    for token in tokens {
        if cells.iter().any(|cell| token_matches(token, cell)) {
            matched.insert(token.as_str());
        }
    }
    matched.len()
}

/// 完全相等，或标记长度 >= 3 时包含匹配
fn token_matches(token: &str, cell: &str) -> bool {
    token == cell || (token.chars().count() >= 3 && cell.contains(token))
}

/// 只保留小写字母数字（"S. No." → "sno"）
pub fn normalize_token(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

// ==========================================
// 列解析
// ==========================================

/// 按表头行解析各列映射的实际列号
///
/// 表头文本匹配顺序: 规范化后相等 → 包含；均失败时回退到固定列号
pub fn resolve_columns<'p>(
    ws: &RawWorksheet,
    header_row: usize,
    profile: &'p VendorProfile,
    warnings: &mut Vec<ParseWarning>,
) -> ColumnLayout<'p> {
    let header_cells: Vec<String> = ws
        .row(header_row)
        .iter()
        .map(|c| normalize_token(&c.as_text()))
        .collect();

    let mut columns = Vec::with_capacity(profile.columns.len());
    for mapping in &profile.columns {
        let by_header = mapping.header.as_deref().and_then(|h| {
            let wanted = normalize_token(h);
            if wanted.is_empty() {
                return None;
            }
            header_cells
                .iter()
                .position(|c| *c == wanted)
                .or_else(|| header_cells.iter().position(|c| c.contains(&wanted)))
        });

        match by_header.or(mapping.column) {
            Some(col) => columns.push(ResolvedColumn { mapping, col }),
            None => {
                warn!(vendor = %profile.id, field = %mapping.field, "明细列无法定位");
                warnings.push(ParseWarning::FieldExtractionGap {
                    field: mapping.field.to_string(),
                });
            }
        }
    }

    let serial = columns
        .iter()
        .find(|c| c.mapping.field == LineField::LineNumber)
        .map(|c| c.col);

    let mut required = Vec::new();
    for field in &profile.rows.required_fields {
        if let Some(col) = columns
            .iter()
            .find(|c| &c.mapping.field == field)
            .map(|c| c.col)
        {
            if !required.contains(&col) {
                required.push(col);
            }
        }
    }

    ColumnLayout {
        columns,
        serial,
        required,
    }
}
