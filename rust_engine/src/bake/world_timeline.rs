//! 物理世界时间轴
//!
//! 把物理世界区间记录展开为逐帧的重力、子步数、时间步长和重置状态关键帧。

use glam::Vec3;

use crate::animation::{
    FixedTimeStepKeyframe, Frame, GravityKeyframe, MaxSubStepsKeyframe, Motion, PhysicsResetType,
};
use crate::records::WorldPhysicsRecord;
use crate::Result;

/// 构建物理世界 Motion
///
/// 记录按顺序展开，不做合并；同一帧被多个记录覆盖时以后写入的为准。
pub fn build_physics_world_timeline(records: &[WorldPhysicsRecord]) -> Result<Motion> {
    for (index, record) in records.iter().enumerate() {
        record.range.validate(index)?;
    }

    let mut motion = Motion::new();
    for (index, record) in records.iter().enumerate() {
        append_record(&mut motion, record);
        log::debug!(
            "物理世界记录 {}: {}..{} 重力 {} 子步数 {} 时间步长 {}",
            index,
            record.range.start,
            record.range.end,
            record.gravity_y,
            record.max_sub_steps,
            record.fixed_time_step
        );
    }

    log::info!(
        "物理世界时间轴: {} 条记录, {} 个重置关键帧",
        records.len(),
        motion.physics_reset_track.len()
    );
    Ok(motion)
}

fn append_record(motion: &mut Motion, record: &WorldPhysicsRecord) {
    let start = record.range.start;
    let gravity = Vec3::new(0.0, record.gravity_y, 0.0);

    for frame in record.range.frames() {
        motion.gravity_track.insert(GravityKeyframe { frame, gravity });
        motion.max_sub_steps_track.insert(MaxSubStepsKeyframe {
            frame,
            max_sub_steps: record.max_sub_steps,
        });
        motion.fixed_time_step_track.insert(FixedTimeStepKeyframe {
            frame,
            fixed_time_step: record.fixed_time_step,
        });

        // 起始帧延续上一段的物理状态
        let reset_type = if frame == start {
            PhysicsResetType::Continue
        } else {
            PhysicsResetType::None
        };
        motion.insert_physics_reset(frame, reset_type);
    }

    // 播放时会提前读取下一帧的重置状态，起始帧前一帧需要显式写入 None
    let before = start - 1.0;
    if before.value() >= 0.0 {
        motion.insert_physics_reset(before, PhysicsResetType::None);
    }
    motion.insert_physics_reset(record.range.end + 1.0, PhysicsResetType::None);
}
