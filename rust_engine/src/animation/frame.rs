//! 帧编号
//!
//! 时间轴上的帧允许是小数，轨道需要按帧排序去重，所以 `Frame` 用 `total_cmp` 提供全序。

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// 帧编号（可为小数）
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frame(pub f32);

impl Frame {
    pub const ZERO: Frame = Frame(0.0);

    pub fn new(value: f32) -> Self {
        Self(value)
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// 写入 VMD 时使用的整数帧
    pub fn to_index(self) -> u32 {
        self.0.max(0.0).round() as u32
    }
}

impl From<f32> for Frame {
    fn from(value: f32) -> Self {
        Self(value)
    }
}

impl From<u32> for Frame {
    fn from(value: u32) -> Self {
        Self(value as f32)
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frame {}

impl PartialOrd for Frame {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frame {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Frame {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl Add<f32> for Frame {
    type Output = Frame;

    fn add(self, rhs: f32) -> Frame {
        Frame(self.0 + rhs)
    }
}

impl Sub<f32> for Frame {
    type Output = Frame;

    fn sub(self, rhs: f32) -> Frame {
        Frame(self.0 - rhs)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 从 `start` 开始按 1 帧步进，直到 `end`（含）
///
/// 用 `start + i` 计算每一帧，避免小数帧累加误差。
pub fn frame_steps(start: f32, end: f32) -> impl Iterator<Item = Frame> {
    let count = if end >= start {
        (end - start).floor() as u64 + 1
    } else {
        0
    };
    (0..count).map(move |i| Frame(start + i as f32))
}
