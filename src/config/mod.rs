// ==========================================
// 电商采购单解析引擎 - 配置层
// ==========================================
// 职责: 解析参数 / 平台版式文件加载
// 来源: 默认值 < JSON 文件 < 环境变量
// ==========================================

pub mod error;
pub mod parser_config;
pub mod profile_store;

// 重导出核心配置类型
pub use error::{ConfigError, ConfigResult};
pub use parser_config::{config_keys, MissingDatePolicy, ParserConfig, SheetSelector};
pub use profile_store::ProfileStore;
