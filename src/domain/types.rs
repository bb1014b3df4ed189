// ==========================================
// 电商采购单解析引擎 - 领域类型定义
// ==========================================
// 职责: 文件类型 / 字段值类型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// ==========================================
// 文件类型 (File Kind)
// ==========================================
// 调用方声明的输入格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Xlsx,
    Xls,
    Csv,
}

impl FileKind {
    /// 根据扩展名推断文件类型（大小写不敏感）
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Xlsx => write!(f, "xlsx"),
            FileKind::Xls => write!(f, "xls"),
            FileKind::Csv => write!(f, "csv"),
        }
    }
}

impl FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "xlsx" => Ok(FileKind::Xlsx),
            "xls" => Ok(FileKind::Xls),
            "csv" => Ok(FileKind::Csv),
            other => Err(format!("不支持的文件类型: {}（仅支持 xlsx/xls/csv）", other)),
        }
    }
}

// ==========================================
// 字段值类型 (Value Kind)
// ==========================================
// 规范字段经过哪一个标准化函数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Text,
    Integer,
    Decimal,
    Date,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Text => write!(f, "text"),
            ValueKind::Integer => write!(f, "integer"),
            ValueKind::Decimal => write!(f, "decimal"),
            ValueKind::Date => write!(f, "date"),
        }
    }
}
