// ==========================================
// 电商采购单解析引擎 - 平台版式文件加载
// ==========================================
// 职责: 从目录加载 *.json 平台版式（每个文件一个 VendorProfile）
// 顺序: 按文件名排序，保证注册顺序稳定
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::vendor_profile::VendorProfile;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 默认目录: <config_dir>/po-ingest/profiles
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("po-ingest").join("profiles"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 加载目录下全部版式；目录不存在视为错误
    pub fn load(&self) -> ConfigResult<Vec<VendorProfile>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|source| ConfigError::Io {
            path: self.dir.display().to_string(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map_or(false, |e| e.eq_ignore_ascii_case("json"))
            })
            .collect();
        paths.sort();

        let mut profiles = Vec::with_capacity(paths.len());
        for path in paths {
            profiles.push(Self::load_file(&path)?);
        }

        info!(dir = %self.dir.display(), count = profiles.len(), "平台版式加载完成");
        Ok(profiles)
    }

    /// 目录不存在时返回空列表
    pub fn load_if_present(&self) -> ConfigResult<Vec<VendorProfile>> {
        if !self.dir.is_dir() {
            debug!(dir = %self.dir.display(), "版式目录不存在，跳过");
            return Ok(Vec::new());
        }
        self.load()
    }

    pub fn load_file(path: &Path) -> ConfigResult<VendorProfile> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let profile: VendorProfile =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
                path: path.display().to_string(),
                source,
            })?;
        debug!(path = %path.display(), profile = %profile.id, "读取平台版式");
        Ok(profile)
    }
}
