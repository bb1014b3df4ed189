// ==========================================
// 电商采购单解析引擎 - 配置错误类型
// ==========================================

use thiserror::Error;

/// 配置 / 平台版式注册错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置 JSON 解析失败 ({path}): {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("正则表达式无效 (平台 {profile}): {pattern}: {message}")]
    InvalidPattern {
        profile: String,
        pattern: String,
        message: String,
    },

    #[error("平台 ID 重复: {0}")]
    DuplicateProfile(String),

    #[error("平台版式无效 ({profile}): {message}")]
    InvalidProfile { profile: String, message: String },

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },
}

impl ConfigError {
    pub fn invalid_profile(profile: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidProfile {
            profile: profile.to_string(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
