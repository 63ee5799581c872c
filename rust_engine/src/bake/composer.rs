//! 输出动作合成
//!
//! 选中骨骼在区间内逐帧取烘焙值，未选中骨骼只沿用原始动作中已有的关键帧。
//! 同时记录每帧写入的关键帧数，供拆分使用。

use std::collections::{BTreeMap, HashSet};

use crate::animation::{BoneKeyframe, Frame, Motion};
use crate::model::Model;
use crate::records::OutputSelection;
use crate::{BakeError, Result};

/// 合成结果
#[derive(Debug, Clone, Default)]
pub struct ComposedMotion {
    pub motion: Motion,
    /// 帧 -> 该帧的骨骼关键帧数
    pub key_counts: BTreeMap<Frame, usize>,
}

impl ComposedMotion {
    pub fn total_keyframes(&self) -> usize {
        self.key_counts.values().sum()
    }

    /// 写入关键帧（同帧覆盖），只有新帧才计数
    fn insert(&mut self, bone: &str, keyframe: BoneKeyframe) {
        let frame = keyframe.frame;
        if self.motion.insert_bone_keyframe(bone, keyframe) {
            *self.key_counts.entry(frame).or_insert(0) += 1;
        }
    }
}

/// 合成原始动作与烘焙动作
///
/// `index` 是输出选择的序号，出错时用于定位记录。
pub fn compose_output(
    index: usize,
    original: &Motion,
    baked: &Motion,
    model: &Model,
    selection: &OutputSelection,
) -> Result<ComposedMotion> {
    selection.range.validate(index)?;
    if selection.bones.is_empty() {
        return Err(BakeError::EmptySelection { index });
    }

    for name in &selection.bones {
        if model.bone_by_name(name).is_none() {
            log::warn!("输出选择 {}: 模型 {} 中没有骨骼 {}", index, model.name, name);
        }
    }

    let drivers: HashSet<String> = selection.bones.iter().cloned().collect();

    let mut composed = ComposedMotion::default();
    composed.motion.model_name = if original.model_name.is_empty() {
        model.name.clone()
    } else {
        original.model_name.clone()
    };
    composed.motion.morph_tracks = original.morph_tracks.clone();

    let bone_names = baked.sorted_bone_names();
    for frame in selection.range.frames() {
        for &name in &bone_names {
            if selection.is_selected(name) {
                compose_selected(&mut composed, baked, model, name, frame);
            } else if !model.is_driven_by_any(name, &drivers) {
                if let Some(keyframe) = original.find_bone_keyframe(name, frame) {
                    composed.insert(name, keyframe.clone());
                }
            }
        }
    }

    let total = composed.total_keyframes();
    if total == 0 {
        return Err(BakeError::NoBakeableKeyframes {
            index,
            start: selection.range.start.value(),
            end: selection.range.end.value(),
        });
    }

    log::debug!(
        "输出选择 {}: {}..{} 选中 {} 根骨骼, 写入 {} 个关键帧",
        index,
        selection.range.start,
        selection.range.end,
        selection.bones.len(),
        total
    );
    Ok(composed)
}

/// 选中骨骼：取烘焙姿势
///
/// 物理骨骼在该帧关闭物理，并在下一帧写入开启物理的关键帧；
/// 区间内下一帧会再次以关闭物理的关键帧覆盖，最终只有区间后一帧恢复物理。
fn compose_selected(
    composed: &mut ComposedMotion,
    baked: &Motion,
    model: &Model,
    name: &str,
    frame: Frame,
) {
    let Some(track) = baked.bone_tracks.get(name) else {
        return;
    };
    let Some(mut sample) = track.seek(frame) else {
        return;
    };

    if !model.bone_has_physics(name) {
        composed.insert(name, sample);
        return;
    }

    sample.physics_disabled = true;
    composed.insert(name, sample);

    if let Some(mut resume) = track.seek(frame + 1.0) {
        resume.physics_disabled = false;
        composed.insert(name, resume);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bone, RigidBody, RigidBodyType};
    use crate::records::TimeRange;
    use glam::Vec3;

    fn model() -> Model {
        let mut model = Model::new("test");
        model.add_bone(Bone::new("センター"));
        model.add_bone(Bone::new("髪").with_parent(0));
        model.add_bone(Bone::new("髪付与").with_parent(0).with_append(1, 1.0, true, false));
        model.add_bone(Bone::new("腕").with_parent(0));
        model.add_rigid_body(RigidBody::new("髪剛体", 1, RigidBodyType::Dynamic));
        model
    }

    fn key(frame: f32, x: f32) -> BoneKeyframe {
        let mut kf = BoneKeyframe::new(frame);
        kf.translation = Vec3::new(x, 0.0, 0.0);
        kf
    }

    fn baked() -> Motion {
        let mut motion = Motion::new();
        for f in 0..=10 {
            for name in ["センター", "髪", "髪付与", "腕"] {
                motion.insert_bone_keyframe(name, key(f as f32, 100.0 + f as f32));
            }
        }
        motion
    }

    fn original() -> Motion {
        let mut motion = Motion::new();
        motion.model_name = String::from("original");
        for name in ["センター", "髪", "髪付与", "腕"] {
            motion.insert_bone_keyframe(name, key(0.0, 0.0));
            motion.insert_bone_keyframe(name, key(3.0, 3.0));
        }
        motion.insert_morph_keyframe("あ", crate::animation::MorphKeyframe::new(50.0, 1.0));
        motion
    }

    #[test]
    fn test_selected_physics_bone() {
        let selection = OutputSelection::new(TimeRange::new(2.0, 4.0), ["髪"]);
        let composed = compose_output(0, &original(), &baked(), &model(), &selection).unwrap();
        let track = &composed.motion.bone_tracks["髪"];

        let frames: Vec<f32> = track.frames().map(Frame::value).collect();
        assert_eq!(frames, vec![2.0, 3.0, 4.0, 5.0]);
        for f in [2.0, 3.0, 4.0] {
            let kf = track.get(Frame(f)).unwrap();
            assert!(kf.physics_disabled, "frame {}", f);
            assert!((kf.translation.x - (100.0 + f)).abs() < 1e-6);
        }
        let resume = track.get(Frame(5.0)).unwrap();
        assert!(!resume.physics_disabled);
        assert!((resume.translation.x - 105.0).abs() < 1e-6);
    }

    #[test]
    fn test_unselected_bones_keep_original_keys() {
        let selection = OutputSelection::new(TimeRange::new(2.0, 4.0), ["髪"]);
        let composed = compose_output(0, &original(), &baked(), &model(), &selection).unwrap();
        let motion = &composed.motion;

        let arm: Vec<f32> = motion.bone_tracks["腕"].frames().map(Frame::value).collect();
        assert_eq!(arm, vec![3.0]);
        assert!((motion.find_bone_keyframe("腕", Frame(3.0)).unwrap().translation.x - 3.0).abs() < 1e-6);
        assert!(motion.find_bone_keyframe("センター", Frame(3.0)).is_some());
        // 被选中骨骼付与驱动的骨骼不沿用原始关键帧
        assert!(!motion.bone_tracks.contains_key("髪付与"));
        assert_eq!(motion.model_name, "original");
        assert!(motion.morph_tracks.contains_key("あ"));
    }

    #[test]
    fn test_selected_bone_without_physics() {
        let selection = OutputSelection::new(TimeRange::new(1.0, 2.0), ["腕"]);
        let composed = compose_output(0, &original(), &baked(), &model(), &selection).unwrap();
        let track = &composed.motion.bone_tracks["腕"];
        let frames: Vec<f32> = track.frames().map(Frame::value).collect();
        assert_eq!(frames, vec![1.0, 2.0]);
        assert!(track.iter().all(|kf| !kf.physics_disabled));
    }

    #[test]
    fn test_ledger_matches_keyframes() {
        let selection = OutputSelection::new(TimeRange::new(0.0, 6.0), ["髪", "腕"]);
        let composed = compose_output(0, &original(), &baked(), &model(), &selection).unwrap();
        assert_eq!(composed.total_keyframes(), composed.motion.bone_keyframe_count());
        for (frame, count) in &composed.key_counts {
            let actual = composed
                .motion
                .bone_tracks
                .values()
                .filter(|track| track.contains(*frame))
                .count();
            assert_eq!(actual, *count, "frame {}", frame);
        }
    }

    #[test]
    fn test_empty_selection_rejected() {
        let selection = OutputSelection::new(TimeRange::new(0.0, 5.0), Vec::<String>::new());
        let result = compose_output(3, &original(), &baked(), &model(), &selection);
        assert!(matches!(result, Err(BakeError::EmptySelection { index: 3 })));
    }

    #[test]
    fn test_no_bakeable_keyframes() {
        // 选中的骨骼不在烘焙动作中，区间内也没有原始关键帧
        let selection = OutputSelection::new(TimeRange::new(5.0, 8.0), ["存在しない"]);
        let result = compose_output(1, &original(), &baked(), &model(), &selection);
        match result {
            Err(BakeError::NoBakeableKeyframes { index, start, end }) => {
                assert_eq!(index, 1);
                assert_eq!((start, end), (5.0, 8.0));
            }
            other => panic!("unexpected result: {:?}", other.map(|c| c.total_keyframes())),
        }
    }
}
