// ==========================================
// 电商采购单解析引擎 - 领域模型层
// ==========================================
// 职责: 原始网格 / 平台版式 / 规范采购单
// 红线: 不含文件解码逻辑，不含解析流程
// ==========================================

pub mod purchase_order;
pub mod types;
pub mod vendor_profile;
pub mod worksheet;

// 重导出核心类型
pub use purchase_order::{FieldValue, POHeader, POLine, ParseResult};
pub use types::{FileKind, ValueKind};
pub use vendor_profile::{
    AnchorStrategy, ColumnMapping, FieldAnchor, HeaderAnchor, HeaderField, LabelMatch, LineField,
    RowRules, RowScope, Signature, TableSpec, VendorProfile,
};
pub use worksheet::{CellValue, RawWorksheet};
