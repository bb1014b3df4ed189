// ==========================================
// 电商采购单解析引擎 - 解析层
// ==========================================
// 职责: 采购单表格 → 规范 PO（表头 + 明细 + 告警）
// 支持: Excel (.xlsx/.xls), CSV
// ==========================================

// 模块声明
pub mod anchor_extractor;
pub mod assembler;
pub mod error;
pub mod po_parser;
pub mod po_parser_trait;
pub mod reconciler;
pub mod row_classifier;
pub mod table_locator;
pub mod value_normalizer;
pub mod workbook_loader;

// 重导出核心类型
pub use anchor_extractor::{AnchorExtractor, AnchorHit, CompiledAnchor};
pub use error::{LineGap, ParseError, ParseOutcome, ParseWarning};
pub use po_parser::PurchaseOrderParser;
pub use reconciler::Reconciler;
pub use row_classifier::{RowClass, RowClassifier, ScanOutcome};
pub use table_locator::{ColumnLayout, TableLocation, TableLocator};
pub use value_normalizer::ValueNormalizer;
pub use workbook_loader::{CsvLoader, ExcelLoader, UniversalLoader};

// 重导出 Trait 接口
pub use po_parser_trait::{
    ComputedTotals, DeclaredTotals, FieldNormalizer, PoParser, TotalsReconciler, WorkbookLoader,
};
