//! MMD 物理烘焙引擎
//!
//! 将带物理模拟的动画转换为可分发的 VMD 文件：
//! - 物理世界时间轴（重力 / 子步数 / 时间步长 / 重置状态）
//! - 刚体与关节参数的梯形渐变
//! - 原始动作与烘焙动作的合成，以及按最大关键帧数拆分输出文件

pub mod animation;
pub mod bake;
pub mod config;
pub mod model;
pub mod records;

pub use animation::{Frame, Motion, Track, VmdFile};
pub use bake::{
    bake_outputs, build_physics_world_timeline, compose_and_split_output,
    interpolate_rigid_body_ramp, BakeReport,
};
pub use config::{get_config, reset_config, set_config, BakeConfig};
pub use model::{Bone, Joint, JointLink, Model, RigidBody, RigidBodyType};
pub use records::{
    Adjustment, BakeRecords, OutputSelection, ParameterRatios, RampRecord, TimeRange,
    WorldPhysicsRecord,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BakeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("VMD parse error: {0}")]
    VmdParse(String),

    #[error("PMX parse error: {0}")]
    PmxParse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record {index}: invalid time range {start}..{end}")]
    InvalidTimeRange { index: usize, start: f32, end: f32 },

    #[error("ramp record {index}: expected start <= max start <= max end <= end, got {start}, {max_start}, {max_end}, {end}")]
    InvalidRamp {
        index: usize,
        start: f32,
        max_start: f32,
        max_end: f32,
        end: f32,
    },

    #[error("output selection {index}: no output bones selected")]
    EmptySelection { index: usize },

    #[error("output selection {index}: no bake-able keyframes in {start}..{end}")]
    NoBakeableKeyframes { index: usize, start: f32, end: f32 },

    #[error("model '{model}' is missing required bones: {}", .bones.join(", "))]
    MissingBones { model: String, bones: Vec<String> },

    #[error("{} errors: {}", .0.len(), .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<BakeError>),
}

pub type Result<T> = std::result::Result<T, BakeError>;
