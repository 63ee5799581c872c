//! 动画系统
//!
//! 提供帧、关键帧、轨道、Motion 以及 VMD 读写。

mod bezier;
mod frame;
mod keyframe;
mod motion;
mod track;
mod vmd_file;

pub use bezier::BezierCurve;
pub use frame::{frame_steps, Frame};
pub use keyframe::{
    BoneCurves, BoneKeyframe, FixedTimeStepKeyframe, GravityKeyframe, JointKeyframe, Keyframe,
    MaxSubStepsKeyframe, MorphKeyframe, PhysicsResetKeyframe, PhysicsResetType,
    RigidBodyKeyframe,
};
pub use motion::Motion;
pub use track::Track;
pub use vmd_file::{MotionReader, MotionWriter, VmdFile};
