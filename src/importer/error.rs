// ==========================================
// 电商采购单解析引擎 - 解析错误与告警
// ==========================================
// 致命错误: 立即中止，不返回部分结果
// 非致命告警: 累积进 ParseResult.warnings，始终随结果返回
// 工具: thiserror 派生宏
// ==========================================

use crate::i18n::t_with_args;
use thiserror::Error;

// ==========================================
// 致命错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("文件格式错误: {0}")]
    Format(String),

    #[error("文档为空: 工作表 {sheet} 无数据行")]
    EmptyDocument { sheet: String },

    #[error("无法识别的平台格式{}", hint_suffix(.hint))]
    UnrecognizedVendorFormat { hint: Option<String> },

    #[error("未找到明细表 (平台 {vendor}, 已扫描 {scanned_rows} 行)")]
    TableNotFound { vendor: String, scanned_rows: usize },

    #[error("缺少 PO 号 (平台 {vendor})")]
    MissingPoNumber { vendor: String },

    #[error("工作表不存在: {0}")]
    SheetNotFound(String),
}

fn hint_suffix(hint: &Option<String>) -> String {
    match hint {
        Some(h) => format!(" (指定平台: {})", h),
        None => String::new(),
    }
}

impl ParseError {
    /// 预览界面展示的本地化原因
    pub fn user_message(&self) -> String {
        match self {
            ParseError::Format(detail) => t_with_args("error.format", &[("detail", detail)]),
            ParseError::EmptyDocument { sheet } => {
                t_with_args("error.empty_document", &[("sheet", sheet)])
            }
            ParseError::UnrecognizedVendorFormat { hint } => t_with_args(
                "error.unrecognized_vendor",
                &[("hint", hint.as_deref().unwrap_or("-"))],
            ),
            ParseError::TableNotFound {
                vendor,
                scanned_rows,
            } => t_with_args(
                "error.table_not_found",
                &[("vendor", vendor), ("rows", &scanned_rows.to_string())],
            ),
            ParseError::MissingPoNumber { vendor } => {
                t_with_args("error.missing_po_number", &[("vendor", vendor)])
            }
            ParseError::SheetNotFound(name) => {
                t_with_args("error.sheet_not_found", &[("sheet", name)])
            }
        }
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for ParseError {
    fn from(err: calamine::XlsxError) -> Self {
        ParseError::Format(format!("xlsx: {}", err))
    }
}

// 实现 From<calamine::XlsError>
impl From<calamine::XlsError> for ParseError {
    fn from(err: calamine::XlsError) -> Self {
        ParseError::Format(format!("xls: {}", err))
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ParseError {
    fn from(err: csv::Error) -> Self {
        ParseError::Format(format!("csv: {}", err))
    }
}

/// Result 类型别名
pub type ParseOutcome<T> = Result<T, ParseError>;

// ==========================================
// 非致命告警
// ==========================================
// 行号均为 1 起（与表格软件显示一致）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseWarning {
    #[error("字段缺失: {field}")]
    FieldExtractionGap { field: String },

    #[error("值无法规范化 ({}字段 {field}): {raw:?}", row_prefix(.row))]
    ValueNormalization {
        row: Option<usize>,
        field: String,
        raw: String,
    },

    #[error("合计不一致 ({metric}): 表格声明 {declared}，明细汇总 {computed}")]
    TotalsMismatch {
        metric: String,
        declared: String,
        computed: String,
    },

    #[error("行号不连续，缺少: {}", join_gaps(.missing))]
    LineNumberGap { missing: Vec<LineGap> },

    #[error("行号重复: {line_number}（已重编为 {renumbered_to}）")]
    LineNumberDuplicate { line_number: u32, renumbered_to: u32 },

    #[error("明细汇总溢出 ({metric})，改用表格声明值")]
    TotalsOverflow { metric: String },

    #[error("明细表表头由序号推断: 第 {row} 行")]
    TableHeaderInferred { row: usize },

    #[error("指定平台 {hint} 的签名与文件不符，仍按该平台解析")]
    VendorHintMismatch { hint: String },

    #[error("未找到任何明细行")]
    NoLineItems,

    #[error("字段 {field} 缺失，使用调用方默认值 {date}")]
    DateDefaulted { field: String, date: String },
}

fn row_prefix(row: &Option<usize>) -> String {
    match row {
        Some(r) => format!("第 {} 行, ", r),
        None => String::new(),
    }
}

/// 缺号闭区间；单个缺号时 first == last
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineGap {
    pub first: u32,
    pub last: u32,
}

impl LineGap {
    pub fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }
}

impl std::fmt::Display for LineGap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}-{}", self.first, self.last)
        }
    }
}

fn join_gaps(gaps: &[LineGap]) -> String {
    gaps.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ParseWarning {
    pub fn user_message(&self) -> String {
        match self {
            ParseWarning::FieldExtractionGap { field } => {
                t_with_args("warning.field_gap", &[("field", field)])
            }
            ParseWarning::ValueNormalization { row, field, raw } => t_with_args(
                "warning.value_normalization",
                &[
                    ("row", &row.map_or_else(|| "-".to_string(), |r| r.to_string())),
                    ("field", field),
                    ("raw", raw),
                ],
            ),
            ParseWarning::TotalsMismatch {
                metric,
                declared,
                computed,
            } => t_with_args(
                "warning.totals_mismatch",
                &[
                    ("metric", metric),
                    ("declared", declared),
                    ("computed", computed),
                ],
            ),
            ParseWarning::LineNumberGap { missing } => {
                t_with_args("warning.line_gap", &[("missing", &join_gaps(missing))])
            }
            ParseWarning::TotalsOverflow { metric } => {
                t_with_args("warning.totals_overflow", &[("metric", metric)])
            }
            ParseWarning::LineNumberDuplicate {
                line_number,
                renumbered_to,
            } => t_with_args(
                "warning.line_duplicate",
                &[
                    ("line", &line_number.to_string()),
                    ("renumbered", &renumbered_to.to_string()),
                ],
            ),
            ParseWarning::TableHeaderInferred { row } => {
                t_with_args("warning.header_inferred", &[("row", &row.to_string())])
            }
            ParseWarning::VendorHintMismatch { hint } => {
                t_with_args("warning.hint_mismatch", &[("hint", hint)])
            }
            ParseWarning::NoLineItems => t_with_args("warning.no_line_items", &[]),
            ParseWarning::DateDefaulted { field, date } => t_with_args(
                "warning.date_defaulted",
                &[("field", field), ("date", date)],
            ),
        }
    }
}
