//! 烘焙配置
//!
//! 全局配置实例，宿主可在运行前替换；记录的默认值和输出拆分参数都从这里读取。

use std::fs;
use std::path::Path;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::Result;

/// 烘焙配置（扁平化，不嵌套）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeConfig {
    // ========== 输出 ==========
    /// 单个 VMD 文件允许的最大骨骼关键帧数，默认 20000
    pub max_frames: usize,
    /// 拆分文件名中帧号的补零位数，默认 6
    pub segment_digits: usize,
    /// 动作未携带模型名时写入 VMD 头部的名称
    pub model_name_fallback: String,

    // ========== 物理世界默认值 ==========
    /// 重力 Y 分量（负数向下），默认 -9.8
    pub default_gravity_y: f32,
    /// 每帧最大子步数，默认 2
    pub default_max_sub_steps: i32,
    /// 固定时间步长（秒），默认 1/60
    pub default_fixed_time_step: f32,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            // MMD 能稳定读取的单文件关键帧规模
            max_frames: 20_000,
            segment_digits: 6,
            model_name_fallback: String::from("bake"),

            default_gravity_y: -9.8,
            default_max_sub_steps: 2,
            default_fixed_time_step: 1.0 / 60.0,
        }
    }
}

impl BakeConfig {
    /// 从 JSON 文件加载配置，缺失的字段使用默认值
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// 全局配置实例
static BAKE_CONFIG: Lazy<RwLock<BakeConfig>> = Lazy::new(|| RwLock::new(BakeConfig::default()));

/// 获取当前配置（只读）
pub fn get_config() -> BakeConfig {
    BAKE_CONFIG
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// 手动设置配置
pub fn set_config(config: BakeConfig) {
    *BAKE_CONFIG
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    set_config(BakeConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: BakeConfig = serde_json::from_str(r#"{ "max_frames": 500 }"#).unwrap();
        assert_eq!(config.max_frames, 500);
        assert_eq!(config.segment_digits, 6);
        assert!((config.default_gravity_y + 9.8).abs() < 1e-6);
    }
}
