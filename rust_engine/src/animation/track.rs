//! 动画轨道
//!
//! 存储单个目标（骨骼、Morph、刚体、关节或物理世界参数）的所有关键帧，按帧排序且每帧唯一。

use std::collections::BTreeMap;
use std::ops::Bound;

use super::keyframe::{BoneKeyframe, Keyframe};
use super::Frame;

/// 关键帧轨道
#[derive(Debug, Clone, PartialEq)]
pub struct Track<K> {
    /// 关键帧映射（帧 -> 关键帧）
    keyframes: BTreeMap<Frame, K>,
}

impl<K> Default for Track<K> {
    fn default() -> Self {
        Self {
            keyframes: BTreeMap::new(),
        }
    }
}

impl<K: Keyframe> Track<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入关键帧，同帧已有关键帧时覆盖并返回旧值
    pub fn insert(&mut self, keyframe: K) -> Option<K> {
        self.keyframes.insert(keyframe.frame(), keyframe)
    }

    /// 查找精确帧
    pub fn get(&self, frame: Frame) -> Option<&K> {
        self.keyframes.get(&frame)
    }

    pub fn contains(&self, frame: Frame) -> bool {
        self.keyframes.contains_key(&frame)
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// 按帧顺序遍历关键帧
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.keyframes.values()
    }

    /// 按顺序遍历所有关键帧的帧号
    pub fn frames(&self) -> impl Iterator<Item = Frame> + '_ {
        self.keyframes.keys().copied()
    }

    /// 最大帧
    pub fn max_frame(&self) -> Option<Frame> {
        self.keyframes.keys().next_back().copied()
    }

    /// 指定帧（含）之前最后一个关键帧，用于阶梯式参数
    pub fn hold_at(&self, frame: Frame) -> Option<&K> {
        self.keyframes.range(..=frame).next_back().map(|(_, kf)| kf)
    }

    /// 查找最近的前后关键帧（前帧 <= frame < 后帧）
    pub fn search_closest(&self, frame: Frame) -> (Option<&K>, Option<&K>) {
        let prev = self.hold_at(frame);
        let next = self
            .keyframes
            .range((Bound::Excluded(frame), Bound::Unbounded))
            .next()
            .map(|(_, kf)| kf);
        (prev, next)
    }
}

impl Track<BoneKeyframe> {
    /// 求值指定帧
    ///
    /// 存在精确关键帧时直接返回副本；否则用后一帧的贝塞尔曲线在前后关键帧之间插值。
    /// 前后任一关键帧关闭物理时，插值结果也关闭物理。
    pub fn seek(&self, frame: Frame) -> Option<BoneKeyframe> {
        if let Some(kf) = self.get(frame) {
            return Some(kf.clone());
        }

        match self.search_closest(frame) {
            (Some(prev), Some(next)) => {
                let span = next.frame.value() - prev.frame.value();
                let coef = (frame.value() - prev.frame.value()) / span;
                let curves = &next.curves;

                let translation = glam::Vec3::new(
                    lerp(prev.translation.x, next.translation.x, curves.translate_x.evaluate(coef)),
                    lerp(prev.translation.y, next.translation.y, curves.translate_y.evaluate(coef)),
                    lerp(prev.translation.z, next.translation.z, curves.translate_z.evaluate(coef)),
                );
                let rotation = prev
                    .rotation
                    .slerp(next.rotation, curves.rotate.evaluate(coef));

                Some(BoneKeyframe {
                    frame,
                    translation,
                    rotation,
                    curves: *curves,
                    physics_disabled: prev.physics_disabled || next.physics_disabled,
                })
            }
            // 只有前帧或只有后帧，沿用该帧的姿势
            (Some(kf), None) | (None, Some(kf)) => Some(kf.at(frame)),
            (None, None) => None,
        }
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
