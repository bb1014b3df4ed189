// ==========================================
// 电商采购单解析引擎 - 解析管道 Trait
// ==========================================
// 职责: 定义解析各阶段接口（不包含实现）
// 管道: 加载 → 平台识别 → 表头锚点 + 明细表定位 → 行分类 → 规范化 → 组装
// ==========================================

use crate::config::SheetSelector;
use crate::domain::purchase_order::{FieldValue, POLine, ParseResult};
use crate::domain::types::{FileKind, ValueKind};
use crate::domain::worksheet::{CellValue, RawWorksheet};
use crate::importer::error::{ParseOutcome, ParseWarning};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

// ==========================================
// PoParser Trait
// ==========================================
// 用途: 解析主接口
// 实现者: PurchaseOrderParser
pub trait PoParser: Send + Sync {
    /// 解析一份采购单
    ///
    /// # 参数
    /// - vendor_hint: 调用方指定的平台 ID（None 时自动识别）
    /// - bytes: 已读入内存的文件内容
    /// - kind: 声明的文件类型
    ///
    /// # 返回
    /// - Ok(ParseResult): 表头 + 明细 + 告警
    /// - Err: 致命错误（格式 / 空文档 / 无法识别平台 / 未找到明细表）
    fn parse(
        &self,
        vendor_hint: Option<&str>,
        bytes: &[u8],
        kind: FileKind,
    ) -> ParseOutcome<ParseResult>;
}

// ==========================================
// WorkbookLoader Trait
// ==========================================
// 用途: 文件解码为统一网格（阶段 0）
// 实现者: CsvLoader, ExcelLoader
pub trait WorkbookLoader: Send + Sync {
    /// 解码为单个工作表
    ///
    /// # 参数
    /// - bytes: 文件内容
    /// - sheet: 工作表选择（CSV 忽略）
    ///
    /// # 返回
    /// - Ok(RawWorksheet): 保留空行空列的网格
    /// - Err: Format / EmptyDocument / SheetNotFound
    fn load(&self, bytes: &[u8], sheet: &SheetSelector) -> ParseOutcome<RawWorksheet>;
}

// ==========================================
// FieldNormalizer Trait
// ==========================================
// 用途: 单元格原始值 → 类型值（纯函数，从不报错，失败返回 None）
// 实现者: ValueNormalizer
pub trait FieldNormalizer: Send + Sync {
    fn normalize_text(&self, cell: &CellValue) -> Option<String>;

    /// Excel 序列号或分隔符日期，结果为 UTC 零点
    fn normalize_date(&self, cell: &CellValue) -> Option<DateTime<Utc>>;

    /// 定点小数（去货币符号 / 百分号 / 千分位）
    fn normalize_decimal(&self, cell: &CellValue) -> Option<Decimal>;

    /// 取前导数字部分
    fn normalize_integer(&self, cell: &CellValue) -> Option<i64>;

    /// 按类型分派
    fn normalize(&self, cell: &CellValue, kind: ValueKind) -> Option<FieldValue> {
        match kind {
            ValueKind::Text => self.normalize_text(cell).map(FieldValue::Text),
            ValueKind::Integer => self.normalize_integer(cell).map(FieldValue::Integer),
            ValueKind::Decimal => self.normalize_decimal(cell).map(FieldValue::Decimal),
            ValueKind::Date => self.normalize_date(cell).map(FieldValue::Date),
        }
    }
}

// ==========================================
// TotalsReconciler Trait
// ==========================================
// 用途: 明细汇总 vs 表格声明合计 / 行号序列校验（只产生告警）
// 实现者: Reconciler
pub trait TotalsReconciler: Send + Sync {
    /// 行号重复时就地重编号，返回告警
    fn check_line_numbers(&self, lines: &mut [POLine]) -> Vec<ParseWarning>;

    /// 返回汇总后的表头合计与告警
    fn reconcile_totals(
        &self,
        declared: &DeclaredTotals,
        lines: &[POLine],
    ) -> (ComputedTotals, Vec<ParseWarning>);
}

/// 表格中声明的合计（来自锚点）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclaredTotals {
    pub quantity: Option<i64>,
    pub taxable_value: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub amount: Option<Decimal>,
}

/// 最终写入表头的合计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputedTotals {
    pub quantity: Option<i64>,
    pub taxable_value: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub amount: Option<Decimal>,
}
