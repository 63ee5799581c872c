//! 用户编辑的烘焙记录
//!
//! 物理世界区间、刚体渐变和输出选择。宿主在每次烘焙前传入快照，
//! 记录本身可通过 JSON 保存和恢复。

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::animation::{frame_steps, Frame};
use crate::bake::ramp;
use crate::config::get_config;
use crate::{BakeError, Result};

/// 帧区间（含两端）
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Frame,
    pub end: Frame,
}

impl TimeRange {
    pub fn new(start: impl Into<Frame>, end: impl Into<Frame>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// 校验 `0 <= start <= end`，`index` 为记录序号
    pub fn validate(&self, index: usize) -> Result<()> {
        let (start, end) = (self.start.value(), self.end.value());
        if !(start.is_finite() && end.is_finite()) || start < 0.0 || end < start {
            return Err(BakeError::InvalidTimeRange { index, start, end });
        }
        Ok(())
    }

    /// 区间内按 1 帧步进的所有帧
    pub fn frames(&self) -> impl Iterator<Item = Frame> {
        frame_steps(self.start.value(), self.end.value())
    }

    pub fn contains(&self, frame: Frame) -> bool {
        self.start <= frame && frame <= self.end
    }
}

/// 物理世界参数区间
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldPhysicsRecord {
    #[serde(flatten)]
    pub range: TimeRange,
    pub gravity_y: f32,
    pub max_sub_steps: i32,
    pub fixed_time_step: f32,
}

impl WorldPhysicsRecord {
    /// 以全局配置中的默认物理参数创建
    pub fn new(range: TimeRange) -> Self {
        let config = get_config();
        Self {
            range,
            gravity_y: config.default_gravity_y,
            max_sub_steps: config.default_max_sub_steps,
            fixed_time_step: config.default_fixed_time_step,
        }
    }

    pub fn with_gravity(mut self, gravity_y: f32) -> Self {
        self.gravity_y = gravity_y;
        self
    }

    pub fn with_max_sub_steps(mut self, max_sub_steps: i32) -> Self {
        self.max_sub_steps = max_sub_steps;
        self
    }

    pub fn with_fixed_time_step(mut self, fixed_time_step: f32) -> Self {
        self.fixed_time_step = fixed_time_step;
        self
    }
}

/// 刚体 / 关节参数倍率
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterRatios {
    pub size_ratio: Vec3,
    pub mass_ratio: f32,
    pub stiffness_ratio: f32,
    pub tension_ratio: f32,
}

impl ParameterRatios {
    /// 全部为 1.0，不改变任何参数
    pub const NEUTRAL: ParameterRatios = ParameterRatios {
        size_ratio: Vec3::ONE,
        mass_ratio: 1.0,
        stiffness_ratio: 1.0,
        tension_ratio: 1.0,
    };
}

impl Default for ParameterRatios {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// 单个刚体的调整
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    /// 未修改：不输出刚体关键帧，关节平均时按 1.0 计
    #[default]
    Unmodified,
    Modified(ParameterRatios),
}

impl Adjustment {
    pub fn is_modified(&self) -> bool {
        matches!(self, Adjustment::Modified(_))
    }

    /// 实际参与计算的倍率
    pub fn ratios(&self) -> ParameterRatios {
        match self {
            Adjustment::Unmodified => ParameterRatios::NEUTRAL,
            Adjustment::Modified(ratios) => *ratios,
        }
    }

    pub fn modified_ratios(&self) -> Option<&ParameterRatios> {
        match self {
            Adjustment::Unmodified => None,
            Adjustment::Modified(ratios) => Some(ratios),
        }
    }
}

/// 梯形渐变记录：start → max_start 渐入，max_start..=max_end 保持，max_end → end 渐出
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RampRecord {
    pub start: Frame,
    pub max_start: Frame,
    pub max_end: Frame,
    pub end: Frame,
    /// 刚体名称 -> 调整
    #[serde(default)]
    pub adjustments: BTreeMap<String, Adjustment>,
}

impl RampRecord {
    pub fn new(
        start: impl Into<Frame>,
        max_start: impl Into<Frame>,
        max_end: impl Into<Frame>,
        end: impl Into<Frame>,
    ) -> Self {
        Self {
            start: start.into(),
            max_start: max_start.into(),
            max_end: max_end.into(),
            end: end.into(),
            adjustments: BTreeMap::new(),
        }
    }

    pub fn with_adjustment(mut self, rigid_body: impl Into<String>, adjustment: Adjustment) -> Self {
        self.adjustments.insert(rigid_body.into(), adjustment);
        self
    }

    /// 刚体的调整，未登记的按未修改处理
    pub fn adjustment(&self, rigid_body: &str) -> Adjustment {
        self.adjustments
            .get(rigid_body)
            .copied()
            .unwrap_or_default()
    }

    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start,
            end: self.end,
        }
    }

    /// 校验 `0 <= start <= max_start <= max_end <= end`
    pub fn validate(&self, index: usize) -> Result<()> {
        let (start, max_start, max_end, end) = (
            self.start.value(),
            self.max_start.value(),
            self.max_end.value(),
            self.end.value(),
        );
        let finite = [start, max_start, max_end, end].iter().all(|v| v.is_finite());
        if !finite || start < 0.0 || start > max_start || max_start > max_end || max_end > end {
            return Err(BakeError::InvalidRamp {
                index,
                start,
                max_start,
                max_end,
                end,
            });
        }
        Ok(())
    }

    /// 指定帧的渐变系数
    pub fn ratio_at(&self, frame: Frame) -> f32 {
        ramp::ramp(
            frame.value(),
            self.start.value(),
            self.max_start.value(),
            self.max_end.value(),
            self.end.value(),
        )
    }

    /// 指定帧所在的段
    pub fn phase_at(&self, frame: Frame) -> ramp::RampPhase {
        ramp::ramp_phase(
            frame.value(),
            self.start.value(),
            self.max_start.value(),
            self.max_end.value(),
            self.end.value(),
        )
    }
}

/// 输出选择：区间内选中骨骼取烘焙值，其余骨骼保留原始关键帧
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputSelection {
    #[serde(flatten)]
    pub range: TimeRange,
    pub bones: BTreeSet<String>,
}

impl OutputSelection {
    pub fn new<S: Into<String>>(range: TimeRange, bones: impl IntoIterator<Item = S>) -> Self {
        Self {
            range,
            bones: bones.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_selected(&self, bone: &str) -> bool {
        self.bones.contains(bone)
    }
}

/// 一次烘焙的全部记录
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeRecords {
    pub world_physics: Vec<WorldPhysicsRecord>,
    pub ramps: Vec<RampRecord>,
    pub outputs: Vec<OutputSelection>,
}

impl BakeRecords {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> BakeRecords {
        BakeRecords {
            world_physics: vec![WorldPhysicsRecord::new(TimeRange::new(0.0, 10.0))
                .with_gravity(-5.0)
                .with_max_sub_steps(4)
                .with_fixed_time_step(1.0 / 120.0)],
            ramps: vec![RampRecord::new(0.0, 10.0, 20.0, 30.5)
                .with_adjustment(
                    "左髪",
                    Adjustment::Modified(ParameterRatios {
                        size_ratio: Vec3::new(2.0, 1.25, 0.3),
                        mass_ratio: 0.1,
                        stiffness_ratio: 1.7,
                        tension_ratio: 0.33,
                    }),
                )
                .with_adjustment("右髪", Adjustment::Unmodified)],
            outputs: vec![OutputSelection::new(TimeRange::new(5.0, 8.0), ["左髪１", "右髪１"])],
        }
    }

    #[test]
    fn test_json_round_trip() {
        let records = sample_records();
        let text = records.to_json_string().unwrap();
        let loaded = BakeRecords::from_json_str(&text).unwrap();
        assert_eq!(loaded, records);
        assert_eq!(loaded.to_json_string().unwrap(), text);
    }

    #[test]
    fn test_time_range_validation() {
        assert!(TimeRange::new(3.0, 3.0).validate(0).is_ok());
        assert!(matches!(
            TimeRange::new(5.0, 4.0).validate(2),
            Err(BakeError::InvalidTimeRange { index: 2, .. })
        ));
        assert!(TimeRange::new(-1.0, 4.0).validate(0).is_err());
    }

    #[test]
    fn test_ramp_validation() {
        assert!(RampRecord::new(0.0, 0.0, 5.0, 5.0).validate(0).is_ok());
        assert!(matches!(
            RampRecord::new(0.0, 10.0, 5.0, 20.0).validate(1),
            Err(BakeError::InvalidRamp { index: 1, .. })
        ));
    }

    #[test]
    fn test_unregistered_adjustment_is_neutral() {
        let record = RampRecord::new(0.0, 1.0, 2.0, 3.0);
        let adjustment = record.adjustment("なし");
        assert!(!adjustment.is_modified());
        assert_eq!(adjustment.ratios(), ParameterRatios::NEUTRAL);
    }

    #[test]
    fn test_missing_sections_default() {
        let records = BakeRecords::from_json_str(r#"{ "outputs": [] }"#).unwrap();
        assert!(records.world_physics.is_empty());
        assert!(records.ramps.is_empty());
    }
}
