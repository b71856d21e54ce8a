//! 应用配置 (JSON).
//!
//! ```json
//! {
//!     "logging": { "level": "info", "directory": "logs", "file_prefix": "hengsu" },
//!     "constrate": { "frame_rate": "30000/1001", "template_dir": "data/skip_slices" }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hengsu_core::Rational;
use hengsu_filter::SkipSliceTable;
use serde::{Deserialize, Serialize};

use crate::logging::LoggingConfig;

/// 应用配置
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub constrate: ConstRateConfig,
}

impl AppConfig {
    /// 从 JSON 字符串解析
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("解析配置失败")
    }

    /// 从 JSON 文件加载
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败, path={}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("配置文件无效, path={}", path.display()))
    }
}

/// 恒定帧率过滤器配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConstRateConfig {
    /// 目标帧率, `"num/den"` 或整数
    #[serde(default = "default_frame_rate")]
    pub frame_rate: String,
    /// CABAC 跳帧模板目录, 文件名形如 `1920x1080.bin`
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
    /// 日志中的实例标签
    #[serde(default)]
    pub label: Option<String>,
}

fn default_frame_rate() -> String {
    "25/1".to_string()
}

impl Default for ConstRateConfig {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            template_dir: None,
            label: None,
        }
    }
}

impl ConstRateConfig {
    /// 解析目标帧率
    pub fn frame_rate(&self) -> Result<Rational> {
        self.frame_rate
            .parse::<Rational>()
            .with_context(|| format!("无效的 frame_rate: \"{}\"", self.frame_rate))
    }

    /// 加载跳帧模板表, 未配置目录时返回空表
    pub fn templates(&self) -> Result<SkipSliceTable> {
        match &self.template_dir {
            Some(dir) => SkipSliceTable::load_dir(dir)
                .with_context(|| format!("加载跳帧模板失败, dir={}", dir.display())),
            None => Ok(SkipSliceTable::new()),
        }
    }
}
