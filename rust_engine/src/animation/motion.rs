//! Motion 核心数据结构
//!
//! 一个可播放动作文件的全部轨道：骨骼、Morph、物理世界参数以及刚体 / 关节参数。

use std::collections::HashMap;
use std::path::PathBuf;

use glam::Vec3;

use super::keyframe::{
    BoneKeyframe, FixedTimeStepKeyframe, GravityKeyframe, JointKeyframe, MaxSubStepsKeyframe,
    MorphKeyframe, PhysicsResetKeyframe, PhysicsResetType, RigidBodyKeyframe,
};
use super::{Frame, Track};

/// 动画数据
#[derive(Debug, Clone, Default)]
pub struct Motion {
    /// 文件路径（拆分输出时包含起始帧号）
    pub path: PathBuf,
    /// 模型名称（写入 VMD 头部）
    pub model_name: String,
    /// 骨骼动画轨道（骨骼名称 -> 轨道）
    pub bone_tracks: HashMap<String, Track<BoneKeyframe>>,
    /// Morph 动画轨道（Morph 名称 -> 轨道）
    pub morph_tracks: HashMap<String, Track<MorphKeyframe>>,
    /// 重力轨道
    pub gravity_track: Track<GravityKeyframe>,
    /// 最大子步数轨道
    pub max_sub_steps_track: Track<MaxSubStepsKeyframe>,
    /// 固定时间步长轨道
    pub fixed_time_step_track: Track<FixedTimeStepKeyframe>,
    /// 物理重置轨道
    pub physics_reset_track: Track<PhysicsResetKeyframe>,
    /// 刚体参数轨道（刚体名称 -> 轨道）
    pub rigid_body_tracks: HashMap<String, Track<RigidBodyKeyframe>>,
    /// 关节参数轨道（关节名称 -> 轨道）
    pub joint_tracks: HashMap<String, Track<JointKeyframe>>,
}

impl Motion {
    /// 创建空的 Motion
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入骨骼关键帧，返回该帧此前是否为空
    pub fn insert_bone_keyframe(&mut self, name: &str, keyframe: BoneKeyframe) -> bool {
        self.bone_tracks
            .entry(name.to_string())
            .or_default()
            .insert(keyframe)
            .is_none()
    }

    /// 插入 Morph 关键帧
    pub fn insert_morph_keyframe(&mut self, name: &str, keyframe: MorphKeyframe) {
        self.morph_tracks
            .entry(name.to_string())
            .or_default()
            .insert(keyframe);
    }

    /// 插入刚体参数关键帧
    pub fn insert_rigid_body_keyframe(&mut self, name: &str, keyframe: RigidBodyKeyframe) {
        self.rigid_body_tracks
            .entry(name.to_string())
            .or_default()
            .insert(keyframe);
    }

    /// 插入关节参数关键帧
    pub fn insert_joint_keyframe(&mut self, name: &str, keyframe: JointKeyframe) {
        self.joint_tracks
            .entry(name.to_string())
            .or_default()
            .insert(keyframe);
    }

    /// 插入物理重置关键帧
    pub fn insert_physics_reset(&mut self, frame: Frame, reset_type: PhysicsResetType) {
        self.physics_reset_track
            .insert(PhysicsResetKeyframe::new(frame, reset_type));
    }

    /// 查找骨骼关键帧
    pub fn find_bone_keyframe(&self, name: &str, frame: Frame) -> Option<&BoneKeyframe> {
        self.bone_tracks.get(name).and_then(|track| track.get(frame))
    }

    /// 按名称排序的骨骼轨道名称（保证输出顺序稳定）
    pub fn sorted_bone_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bone_tracks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// 骨骼关键帧总数
    pub fn bone_keyframe_count(&self) -> usize {
        self.bone_tracks.values().map(Track::len).sum()
    }

    /// 获取骨骼动画的最大帧
    pub fn max_bone_frame(&self) -> Option<Frame> {
        self.bone_tracks.values().filter_map(Track::max_frame).max()
    }

    /// 指定帧生效的物理重置类型（读取时后写入者优先）
    pub fn physics_reset_at(&self, frame: Frame) -> PhysicsResetType {
        self.physics_reset_track
            .get(frame)
            .map(|kf| kf.reset_type)
            .unwrap_or_default()
    }

    /// 指定帧生效的重力
    pub fn gravity_at(&self, frame: Frame) -> Option<Vec3> {
        self.gravity_track.hold_at(frame).map(|kf| kf.gravity)
    }

    /// 指定帧生效的最大子步数
    pub fn max_sub_steps_at(&self, frame: Frame) -> Option<i32> {
        self.max_sub_steps_track
            .hold_at(frame)
            .map(|kf| kf.max_sub_steps)
    }

    /// 指定帧生效的固定时间步长
    pub fn fixed_time_step_at(&self, frame: Frame) -> Option<f32> {
        self.fixed_time_step_track
            .hold_at(frame)
            .map(|kf| kf.fixed_time_step)
    }

    /// 合并另一个 Motion 的骨骼与 Morph 轨道（同帧以 other 为准）
    pub fn merge(&mut self, other: &Motion) {
        for (name, track) in &other.bone_tracks {
            let entry = self.bone_tracks.entry(name.clone()).or_default();
            for keyframe in track.iter() {
                entry.insert(keyframe.clone());
            }
        }

        for (name, track) in &other.morph_tracks {
            let entry = self.morph_tracks.entry(name.clone()).or_default();
            for keyframe in track.iter() {
                entry.insert(keyframe.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_bone_keyframe_reports_new_frames() {
        let mut motion = Motion::new();
        assert!(motion.insert_bone_keyframe("センター", BoneKeyframe::new(Frame(0.0))));
        assert!(!motion.insert_bone_keyframe("センター", BoneKeyframe::new(Frame(0.0))));
        assert!(motion.insert_bone_keyframe("センター", BoneKeyframe::new(Frame(1.0))));
        assert_eq!(motion.bone_keyframe_count(), 2);
        assert_eq!(motion.max_bone_frame(), Some(Frame(1.0)));
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base = Motion::new();
        base.insert_morph_keyframe("あ", MorphKeyframe::new(Frame(0.0), 0.1));
        let mut other = Motion::new();
        other.insert_morph_keyframe("あ", MorphKeyframe::new(Frame(0.0), 0.9));
        other.insert_bone_keyframe("頭", BoneKeyframe::new(Frame(2.0)));
        base.merge(&other);
        assert_eq!(base.morph_tracks["あ"].get(Frame(0.0)).map(|kf| kf.weight), Some(0.9));
        assert!(base.find_bone_keyframe("頭", Frame(2.0)).is_some());
    }

    #[test]
    fn test_physics_reset_defaults_to_none() {
        let mut motion = Motion::new();
        motion.insert_physics_reset(Frame(4.0), PhysicsResetType::Continue);
        assert_eq!(motion.physics_reset_at(Frame(4.0)), PhysicsResetType::Continue);
        assert_eq!(motion.physics_reset_at(Frame(5.0)), PhysicsResetType::None);
    }
}
