//! 统一配置系统
//!
//! 提供 TOML/JSON 配置文件、环境变量覆盖和参数验证。
//!
//! 配置在实例生命周期内不可变：分辨率、水滴半径和扰动强度
//! 都在构建时固定，之后不再调整。

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 窗口配置（演示宿主用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 窗口宽度
    pub width: u32,
    /// 窗口高度
    pub height: u32,
    /// 窗口标题
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            title: "Ripples".to_string(),
        }
    }
}

/// 水波特效主配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RipplesConfig {
    /// 模拟网格边长（纹素数，网格始终为正方形）
    #[serde(default = "default_resolution")]
    pub resolution: u32,

    /// 水滴半径（宿主像素）
    #[serde(default = "default_drop_radius")]
    pub drop_radius: f32,

    /// 视觉扰动强度
    #[serde(default = "default_perturbance")]
    pub perturbance: f32,

    /// 是否响应指针输入
    #[serde(default = "default_interactive")]
    pub interactive: bool,

    /// 背景图片路径（不存在时演示宿主退回到棋盘纹理）
    #[serde(default)]
    pub background_image: PathBuf,

    /// 窗口配置
    #[serde(default)]
    pub window: WindowConfig,
}

fn default_resolution() -> u32 {
    256
}

fn default_drop_radius() -> f32 {
    20.0
}

fn default_perturbance() -> f32 {
    0.03
}

fn default_interactive() -> bool {
    true
}

impl Default for RipplesConfig {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            drop_radius: default_drop_radius(),
            perturbance: default_perturbance(),
            interactive: default_interactive(),
            background_image: PathBuf::new(),
            window: WindowConfig::default(),
        }
    }
}

impl RipplesConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 TOML 文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从 TOML 字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从 JSON 文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从 JSON 字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("RIPPLES_RESOLUTION") {
            if let Ok(resolution) = val.parse() {
                self.resolution = resolution;
            }
        }
        if let Ok(val) = env::var("RIPPLES_DROP_RADIUS") {
            if let Ok(radius) = val.parse() {
                self.drop_radius = radius;
            }
        }
        if let Ok(val) = env::var("RIPPLES_PERTURBANCE") {
            if let Ok(perturbance) = val.parse() {
                self.perturbance = perturbance;
            }
        }
        if let Ok(val) = env::var("RIPPLES_INTERACTIVE") {
            if let Ok(interactive) = val.parse() {
                self.interactive = interactive;
            }
        }
        if let Ok(val) = env::var("RIPPLES_BACKGROUND") {
            self.background_image = PathBuf::from(val);
        }
    }

    /// 验证配置参数
    pub fn validate(&self) -> ConfigResult<()> {
        if self.resolution == 0 {
            return Err(ConfigError::ValidationError(
                "resolution must be greater than 0".to_string(),
            ));
        }
        if !(self.drop_radius > 0.0) {
            return Err(ConfigError::ValidationError(
                "drop_radius must be greater than 0".to_string(),
            ));
        }
        if !self.perturbance.is_finite() {
            return Err(ConfigError::ValidationError(
                "perturbance must be finite".to_string(),
            ));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::ValidationError(
                "window dimensions must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// 按优先级加载配置：`RIPPLES_CONFIG` 指定的文件 > `ripples.toml` > 默认值，
    /// 然后套用环境变量覆盖并验证。
    pub fn load() -> ConfigResult<Self> {
        let mut config = if let Ok(path) = env::var("RIPPLES_CONFIG") {
            Self::from_toml_file(path)?
        } else if Path::new("ripples.toml").exists() {
            Self::from_toml_file("ripples.toml")?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}
