//! 物理烘焙时间轴
//!
//! 入口：
//! - [`build_physics_world_timeline`]：物理世界参数与重置状态
//! - [`interpolate_rigid_body_ramp`]：刚体 / 关节参数渐变
//! - [`compose_and_split_output`]：合成输出动作并按关键帧上限拆分

pub mod composer;
pub mod ramp;
pub mod rigid_body_ramp;
pub mod splitter;
pub mod world_timeline;

pub use composer::{compose_output, ComposedMotion};
pub use ramp::{ramp, ramp_phase, RampPhase};
pub use rigid_body_ramp::interpolate_rigid_body_ramp;
pub use splitter::split_motion;
pub use world_timeline::build_physics_world_timeline;

use std::path::Path;

use crate::animation::{Motion, VmdFile};
use crate::config::get_config;
use crate::model::Model;
use crate::records::OutputSelection;
use crate::{BakeError, Result};

/// 合成单个输出选择并拆分为多个 Motion
pub fn compose_and_split_output<P: AsRef<Path>>(
    original: &Motion,
    baked: &Motion,
    model: &Model,
    selection: &OutputSelection,
    max_frames: usize,
    path_template: P,
) -> Result<Vec<Motion>> {
    let composed = compose_output(0, original, baked, model, selection)?;
    let motions = split_motion(&composed, path_template.as_ref(), max_frames);
    log::info!(
        "输出合成完成: {} 个关键帧, {} 个文件",
        composed.total_keyframes(),
        motions.len()
    );
    Ok(motions)
}

/// 多个输出选择的烘焙结果
#[derive(Debug, Default)]
pub struct BakeReport {
    /// 所有选择产生的输出，按选择顺序排列
    pub motions: Vec<Motion>,
    /// 被跳过或失败的选择
    pub errors: Vec<BakeError>,
}

impl BakeReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// 把所有输出写到各自的路径
    pub fn write_all(&self) -> Result<()> {
        for motion in &self.motions {
            VmdFile::write(motion, &motion.path)?;
        }
        Ok(())
    }
}

/// 依次处理多个输出选择
///
/// 区间无效时立即返回错误。空选择和没有可烘焙关键帧的选择记入 `errors`，其余选择照常处理。
/// 有多个选择时，每个选择的输出路径追加 `_{序号}`。
pub fn bake_outputs<P: AsRef<Path>>(
    original: &Motion,
    baked: &Motion,
    model: &Model,
    selections: &[OutputSelection],
    path_template: P,
) -> Result<BakeReport> {
    for (index, selection) in selections.iter().enumerate() {
        selection.range.validate(index)?;
    }

    let max_frames = get_config().max_frames;
    let template = path_template.as_ref();
    let mut report = BakeReport::default();

    for (index, selection) in selections.iter().enumerate() {
        if selection.bones.is_empty() {
            log::warn!("输出选择 {} 没有选中骨骼，已跳过", index);
            report.errors.push(BakeError::EmptySelection { index });
            continue;
        }

        let path = if selections.len() > 1 {
            splitter::suffixed_path(template, &index.to_string())
        } else {
            template.to_path_buf()
        };

        match compose_output(index, original, baked, model, selection) {
            Ok(composed) => {
                report
                    .motions
                    .extend(split_motion(&composed, &path, max_frames));
            }
            Err(e) => {
                log::warn!("输出选择 {} 失败: {}", index, e);
                report.errors.push(e);
            }
        }
    }

    log::info!(
        "烘焙输出: {} 个选择, {} 个文件, {} 个错误",
        selections.len(),
        report.motions.len(),
        report.errors.len()
    );
    Ok(report)
}
