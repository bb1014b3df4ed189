// ==========================================
// 电商采购单解析引擎 - 解析参数配置
// ==========================================
// 职责: 引擎可调参数（扫描窗口 / 阈值 / 容差 / 缺失日期策略）
// 来源: 默认值 < JSON 文件 < 环境变量
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::importer::table_locator::MIN_TABLE_TOKENS;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

// ==========================================
// 环境变量键
// ==========================================
pub mod config_keys {
    // 明细表定位
    pub const TABLE_SCAN_ROWS: &str = "PO_INGEST_TABLE_SCAN_ROWS";
    pub const MIN_TOKEN_MATCHES: &str = "PO_INGEST_MIN_TOKEN_MATCHES";

    // 行分类
    pub const PROSE_THRESHOLD: &str = "PO_INGEST_PROSE_THRESHOLD";

    // 日期两位年份分界
    pub const YEAR_PIVOT: &str = "PO_INGEST_YEAR_PIVOT";
}

/// 工作表选择
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "name", rename_all = "snake_case")]
pub enum SheetSelector {
    #[default]
    First,
    Named(String),
}

/// 必填日期缺失时的处理方式（从不使用当前时间兜底）
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", content = "date", rename_all = "snake_case")]
pub enum MissingDatePolicy {
    /// 置空并记录 FieldExtractionGap
    #[default]
    Warn,
    /// 使用调用方显式给出的日期并记录 DateDefaulted
    CallerDefault(DateTime<Utc>),
}

// ==========================================
// ParserConfig
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// 明细表表头扫描窗口（行）
    pub table_scan_rows: usize,

    /// 表头行至少命中的标记数
    pub min_token_matches: usize,

    /// 平台签名扫描窗口（行）
    pub header_scan_rows: usize,

    /// 首个非空单元格超过该字符数视为说明性文字，终止明细扫描
    pub prose_threshold: usize,

    /// 合计容差：绝对值（货币单位）
    pub totals_abs_tolerance: Decimal,

    /// 合计容差：相对值（0.005 = 0.5%），取两者较小者
    pub totals_pct_tolerance: Decimal,

    /// 两位年份 < pivot → 20xx，否则 19xx
    pub year_pivot: u32,

    pub missing_date_policy: MissingDatePolicy,

    pub sheet: SheetSelector,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            table_scan_rows: 50,
            min_token_matches: 2,
            header_scan_rows: 40,
            prose_threshold: 50,
            totals_abs_tolerance: Decimal::ONE,
            totals_pct_tolerance: Decimal::new(5, 3),
            year_pivot: 50,
            missing_date_policy: MissingDatePolicy::Warn,
            sheet: SheetSelector::First,
        }
    }
}

impl ParserConfig {
    /// 从 JSON 文件加载（缺省字段取默认值）
    pub fn from_json_file(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: ParserConfig =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
                path: path.display().to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// 应用环境变量覆写
    pub fn with_env_overrides(self) -> ConfigResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// 应用覆写（lookup 返回键对应的原始值）
    pub fn with_overrides<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = read_override::<usize>(&lookup, config_keys::TABLE_SCAN_ROWS)? {
            self.table_scan_rows = v;
        }
        if let Some(v) = read_override::<usize>(&lookup, config_keys::MIN_TOKEN_MATCHES)? {
            self.min_token_matches = v;
        }
        if let Some(v) = read_override::<usize>(&lookup, config_keys::PROSE_THRESHOLD)? {
            self.prose_threshold = v;
        }
        if let Some(v) = read_override::<u32>(&lookup, config_keys::YEAR_PIVOT)? {
            self.year_pivot = v;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.min_token_matches < MIN_TABLE_TOKENS {
            return Err(invalid(
                "min_token_matches",
                &self.min_token_matches.to_string(),
                "必须 >= 2",
            ));
        }
        if self.table_scan_rows == 0 {
            return Err(invalid("table_scan_rows", "0", "必须 >= 1"));
        }
        if self.year_pivot > 99 {
            return Err(invalid(
                "year_pivot",
                &self.year_pivot.to_string(),
                "必须在 0..=99",
            ));
        }
        if self.totals_abs_tolerance.is_sign_negative()
            || self.totals_pct_tolerance.is_sign_negative()
        {
            return Err(invalid("totals_tolerance", "<0", "容差不能为负"));
        }
        Ok(())
    }
}

fn read_override<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> ConfigResult<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(key, &raw, "无法解析为数字")),
    }
}

fn invalid(key: &str, value: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}
