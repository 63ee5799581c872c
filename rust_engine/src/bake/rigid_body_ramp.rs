//! 刚体 / 关节参数渐变
//!
//! 按梯形渐变系数逐帧输出刚体尺寸、质量和关节限制、弹簧参数关键帧。
//! 未修改的刚体不输出任何关键帧；关节只要有一端刚体被修改就输出。

use glam::Vec3;

use crate::animation::{Frame, JointKeyframe, Motion, PhysicsResetType, RigidBodyKeyframe};
use crate::model::{Joint, Model, RigidBody};
use crate::records::{ParameterRatios, RampRecord};
use crate::Result;

/// `original + original * (ratio - 1) * blend`
fn scale(original: f32, ratio: f32, blend: f32) -> f32 {
    original + original * (ratio - 1.0) * blend
}

fn scale_vec3(original: Vec3, ratio: Vec3, blend: f32) -> Vec3 {
    original + original * (ratio - Vec3::ONE) * blend
}

/// 关节两端刚体倍率的平均值
#[derive(Debug, Clone, Copy, PartialEq)]
struct JointScale {
    stiffness: f32,
    tension: f32,
}

impl JointScale {
    fn average(a: ParameterRatios, b: ParameterRatios) -> Self {
        Self {
            stiffness: (a.stiffness_ratio + b.stiffness_ratio) * 0.5,
            tension: (a.tension_ratio + b.tension_ratio) * 0.5,
        }
    }

    /// 角度限制按刚性缩放，线性 / 角度弹簧按张力缩放，线性限制不变
    fn keyframe(&self, joint: &Joint, frame: Frame, blend: f32) -> JointKeyframe {
        JointKeyframe {
            frame,
            linear_lower: joint.linear_lower,
            linear_upper: joint.linear_upper,
            angular_lower: joint.angular_lower * scale(1.0, self.stiffness, blend),
            angular_upper: joint.angular_upper * scale(1.0, self.stiffness, blend),
            linear_spring: joint.linear_spring * scale(1.0, self.tension, blend),
            angular_spring: joint.angular_spring * scale(1.0, self.tension, blend),
        }
    }
}

/// 渐变记录解析到模型后的目标
struct RampTargets<'a> {
    rigid_bodies: Vec<(&'a RigidBody, ParameterRatios)>,
    joints: Vec<(&'a Joint, JointScale)>,
}

fn resolve_targets<'a>(index: usize, record: &RampRecord, model: &'a Model) -> RampTargets<'a> {
    let mut rigid_bodies = Vec::new();
    for (name, adjustment) in &record.adjustments {
        let Some(ratios) = adjustment.modified_ratios() else {
            continue;
        };
        match model
            .find_rigid_body(name)
            .and_then(|i| model.rigid_bodies.get(i))
        {
            Some(rigid_body) => rigid_bodies.push((rigid_body, *ratios)),
            None => log::warn!("渐变记录 {}: 模型中没有刚体 {}", index, name),
        }
    }

    let mut joints = Vec::new();
    for link in model.joint_links() {
        let (Some(joint), Some(a), Some(b)) = (
            model.joints.get(link.joint),
            model.rigid_bodies.get(link.rigid_body_a),
            model.rigid_bodies.get(link.rigid_body_b),
        ) else {
            continue;
        };
        let adjustment_a = record.adjustment(&a.name);
        let adjustment_b = record.adjustment(&b.name);
        if !adjustment_a.is_modified() && !adjustment_b.is_modified() {
            continue;
        }
        joints.push((
            joint,
            JointScale::average(adjustment_a.ratios(), adjustment_b.ratios()),
        ));
    }

    RampTargets {
        rigid_bodies,
        joints,
    }
}

/// 根据渐变记录生成刚体 / 关节参数 Motion
///
/// 处于上升或下降段的帧会向 `world_motion` 写入 `Continue`，防止参数过渡中途被物理重置打断。
pub fn interpolate_rigid_body_ramp(
    records: &[RampRecord],
    model: &Model,
    world_motion: &mut Motion,
) -> Result<Motion> {
    for (index, record) in records.iter().enumerate() {
        record.validate(index)?;
    }

    let mut motion = Motion::new();
    motion.model_name = model.name.clone();

    for (index, record) in records.iter().enumerate() {
        let targets = resolve_targets(index, record, model);

        for frame in record.range().frames() {
            let blend = record.ratio_at(frame);

            if record.phase_at(frame).is_ramping() {
                world_motion.insert_physics_reset(frame, PhysicsResetType::Continue);
            }

            for (rigid_body, ratios) in &targets.rigid_bodies {
                motion.insert_rigid_body_keyframe(
                    &rigid_body.name,
                    RigidBodyKeyframe {
                        frame,
                        size: scale_vec3(rigid_body.size, ratios.size_ratio, blend),
                        mass: scale(rigid_body.mass, ratios.mass_ratio, blend),
                    },
                );
            }

            for (joint, joint_scale) in &targets.joints {
                motion.insert_joint_keyframe(&joint.name, joint_scale.keyframe(joint, frame, blend));
            }
        }

        log::debug!(
            "渐变记录 {}: {}..{} 刚体 {} 个, 关节 {} 个",
            index,
            record.start,
            record.end,
            targets.rigid_bodies.len(),
            targets.joints.len()
        );
    }

    log::info!(
        "刚体渐变: {} 条记录, {} 条刚体轨道, {} 条关节轨道",
        records.len(),
        motion.rigid_body_tracks.len(),
        motion.joint_tracks.len()
    );
    Ok(motion)
}
