//! 梯形渐变曲线
//!
//! start → max_start 线性上升，max_start..=max_end 保持 1.0，max_end → end 线性下降。

/// 帧在梯形中的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampPhase {
    /// 严格位于上升段内
    RampUp,
    /// 平台段（含两端）
    Plateau,
    /// 严格位于下降段内
    RampDown,
    /// 端点或区间外
    Outside,
}

impl RampPhase {
    /// 是否正在过渡（上升或下降段内）
    pub fn is_ramping(self) -> bool {
        matches!(self, RampPhase::RampUp | RampPhase::RampDown)
    }
}

/// 判断帧所在的段
///
/// 上升段和下降段优先于平台段判断；max_start == start 或 max_end == end 时对应的段退化为阶跃。
pub fn ramp_phase(frame: f32, start: f32, max_start: f32, max_end: f32, end: f32) -> RampPhase {
    if start < frame && frame < max_start {
        RampPhase::RampUp
    } else if max_end < frame && frame < end {
        RampPhase::RampDown
    } else if max_start <= frame && frame <= max_end {
        RampPhase::Plateau
    } else {
        RampPhase::Outside
    }
}

/// 帧的渐变系数，范围 [0, 1]
pub fn ramp(frame: f32, start: f32, max_start: f32, max_end: f32, end: f32) -> f32 {
    match ramp_phase(frame, start, max_start, max_end, end) {
        RampPhase::RampUp => (frame - start) / (max_start - start),
        RampPhase::RampDown => (end - frame) / (end - max_end),
        RampPhase::Plateau => 1.0,
        RampPhase::Outside => 0.0,
    }
}
