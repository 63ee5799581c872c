//! 动画关键帧

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::{BezierCurve, Frame};

/// 轨道中的关键帧（按帧唯一）
pub trait Keyframe: Clone {
    fn frame(&self) -> Frame;
}

/// 骨骼插值曲线（X / Y / Z 平移和旋转）
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoneCurves {
    pub translate_x: BezierCurve,
    pub translate_y: BezierCurve,
    pub translate_z: BezierCurve,
    pub rotate: BezierCurve,
}

impl BoneCurves {
    pub fn linear() -> Self {
        Self::default()
    }
}

/// 骨骼关键帧
#[derive(Clone, Debug, PartialEq)]
pub struct BoneKeyframe {
    pub frame: Frame,
    pub translation: Vec3,
    pub rotation: Quat,
    pub curves: BoneCurves,
    /// 物理关闭：该帧的姿势以关键帧为准，不被物理模拟覆盖
    pub physics_disabled: bool,
}

impl BoneKeyframe {
    pub fn new(frame: impl Into<Frame>) -> Self {
        Self {
            frame: frame.into(),
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            curves: BoneCurves::linear(),
            physics_disabled: false,
        }
    }

    /// 复制到另一帧
    pub fn at(&self, frame: Frame) -> Self {
        Self {
            frame,
            ..self.clone()
        }
    }
}

impl Keyframe for BoneKeyframe {
    fn frame(&self) -> Frame {
        self.frame
    }
}

/// Morph 关键帧
#[derive(Clone, Debug, PartialEq)]
pub struct MorphKeyframe {
    pub frame: Frame,
    pub weight: f32,
}

impl MorphKeyframe {
    pub fn new(frame: impl Into<Frame>, weight: f32) -> Self {
        Self {
            frame: frame.into(),
            weight,
        }
    }
}

impl Keyframe for MorphKeyframe {
    fn frame(&self) -> Frame {
        self.frame
    }
}

/// 物理重置类型
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhysicsResetType {
    /// 不重置
    #[default]
    None,
    /// 延续上一帧的物理状态
    Continue,
    /// 从当前姿势重新开始模拟
    Start,
    /// 重新开始并贴合当前姿势
    StartFit,
}

/// 物理重置关键帧
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsResetKeyframe {
    pub frame: Frame,
    pub reset_type: PhysicsResetType,
}

impl PhysicsResetKeyframe {
    pub fn new(frame: Frame, reset_type: PhysicsResetType) -> Self {
        Self { frame, reset_type }
    }
}

impl Keyframe for PhysicsResetKeyframe {
    fn frame(&self) -> Frame {
        self.frame
    }
}

/// 重力关键帧
#[derive(Clone, Debug, PartialEq)]
pub struct GravityKeyframe {
    pub frame: Frame,
    pub gravity: Vec3,
}

impl Keyframe for GravityKeyframe {
    fn frame(&self) -> Frame {
        self.frame
    }
}

/// 最大子步数关键帧
#[derive(Clone, Debug, PartialEq)]
pub struct MaxSubStepsKeyframe {
    pub frame: Frame,
    pub max_sub_steps: i32,
}

impl Keyframe for MaxSubStepsKeyframe {
    fn frame(&self) -> Frame {
        self.frame
    }
}

/// 固定时间步长关键帧
#[derive(Clone, Debug, PartialEq)]
pub struct FixedTimeStepKeyframe {
    pub frame: Frame,
    pub fixed_time_step: f32,
}

impl Keyframe for FixedTimeStepKeyframe {
    fn frame(&self) -> Frame {
        self.frame
    }
}

/// 刚体参数关键帧
#[derive(Clone, Debug, PartialEq)]
pub struct RigidBodyKeyframe {
    pub frame: Frame,
    pub size: Vec3,
    pub mass: f32,
}

impl Keyframe for RigidBodyKeyframe {
    fn frame(&self) -> Frame {
        self.frame
    }
}

/// 关节参数关键帧
#[derive(Clone, Debug, PartialEq)]
pub struct JointKeyframe {
    pub frame: Frame,
    /// 线性下限
    pub linear_lower: Vec3,
    /// 线性上限
    pub linear_upper: Vec3,
    /// 角度下限
    pub angular_lower: Vec3,
    /// 角度上限
    pub angular_upper: Vec3,
    /// 线性弹簧刚度
    pub linear_spring: Vec3,
    /// 角度弹簧刚度
    pub angular_spring: Vec3,
}

impl Keyframe for JointKeyframe {
    fn frame(&self) -> Frame {
        self.frame
    }
}
