// ==========================================
// 电商采购单解析引擎 - 核心库
// ==========================================
// 输入: 各电商平台导出的采购单表格（xlsx / xls / csv）
// 输出: 平台无关的规范采购单 + 告警列表
// 系统定位: 解析结果供人工预览确认后再入库
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 网格 / 版式 / 采购单
pub mod domain;

// 解析层 - 加载 / 定位 / 分类 / 组装
pub mod importer;

// 平台层 - 内置版式与注册表
pub mod vendor;

// 配置层 - 解析参数与版式文件
pub mod config;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// 阶段耗时
pub mod perf;

// ==========================================
// 重导出核心类型
// ==========================================

pub use config::{MissingDatePolicy, ParserConfig, ProfileStore, SheetSelector};
pub use domain::{
    CellValue, FileKind, POHeader, POLine, ParseResult, RawWorksheet, VendorProfile,
};
pub use importer::{ParseError, ParseOutcome, ParseWarning, PoParser, PurchaseOrderParser};
pub use vendor::VendorRegistry;

// ==========================================
// 便捷入口
// ==========================================

/// 使用默认参数解析一份采购单
///
/// # 参数
/// - registry: 平台注册表（通常为 `VendorRegistry::builtin()`）
/// - vendor_hint: 指定平台 ID，None 时按签名识别
/// - bytes: 文件内容
/// - kind: 声明的文件类型
pub fn parse(
    registry: &VendorRegistry,
    vendor_hint: Option<&str>,
    bytes: &[u8],
    kind: FileKind,
) -> ParseOutcome<ParseResult> {
    PurchaseOrderParser::new(registry).parse(vendor_hint, bytes, kind)
}

// ==========================================
// 常量定义
// ==========================================

// 版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 名称
pub const APP_NAME: &str = "电商采购单解析引擎";
