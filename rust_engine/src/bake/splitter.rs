//! 输出文件拆分
//!
//! 单个 VMD 文件的骨骼关键帧数有上限，合成结果按帧顺序切成多个文件。
//! Morph 轨道复制到每个文件，保证每个文件都能单独播放。

use std::mem;
use std::path::{Path, PathBuf};

use crate::animation::{Frame, Motion};
use crate::config::get_config;

use super::composer::ComposedMotion;

/// 在文件名（扩展名之前）追加后缀
pub(crate) fn suffixed_path(template: &Path, suffix: &str) -> PathBuf {
    let stem = template
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match template.extension() {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}_{}", stem, suffix),
    };
    template.with_file_name(file_name)
}

fn new_segment(composed: &ComposedMotion) -> Motion {
    let mut motion = Motion::new();
    motion.model_name = composed.motion.model_name.clone();
    motion.morph_tracks = composed.motion.morph_tracks.clone();
    motion
}

/// 拆分合成结果
///
/// 写入每一帧之前检查：当前文件已有关键帧，且累计数加上该帧的关键帧数超过 `max_frames` 时，
/// 从该帧开始新文件。单帧关键帧数本身超过上限时该帧独占一个文件。
/// 只产生一个文件时使用模板路径，否则在文件名后追加补零的起始帧号。
pub fn split_motion(composed: &ComposedMotion, path_template: &Path, max_frames: usize) -> Vec<Motion> {
    let digits = get_config().segment_digits;
    let frames: Vec<(Frame, usize)> = composed
        .key_counts
        .iter()
        .map(|(&frame, &count)| (frame, count))
        .collect();
    let bone_names = composed.motion.sorted_bone_names();

    let mut segments: Vec<(Frame, Motion)> = Vec::new();
    let mut current = new_segment(composed);
    let mut current_start = frames.first().map(|&(frame, _)| frame).unwrap_or(Frame::ZERO);
    let mut running = 0usize;

    for &(frame, count) in &frames {
        if running > 0 && running + count > max_frames {
            let finished = mem::replace(&mut current, new_segment(composed));
            segments.push((current_start, finished));
            current_start = frame;
            running = 0;
        }

        for &name in &bone_names {
            if let Some(keyframe) = composed.motion.find_bone_keyframe(name, frame) {
                current.insert_bone_keyframe(name, keyframe.clone());
            }
        }
        running += count;
    }
    segments.push((current_start, current));

    let single = segments.len() == 1;
    segments
        .into_iter()
        .map(|(start, mut motion)| {
            motion.path = if single {
                path_template.to_path_buf()
            } else {
                let index = format!("{:0width$}", start.to_index(), width = digits);
                suffixed_path(path_template, &index)
            };
            log::debug!(
                "输出分段 {}: 起始帧 {}, {} 个骨骼关键帧",
                motion.path.display(),
                start,
                motion.bone_keyframe_count()
            );
            motion
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{BoneKeyframe, MorphKeyframe};
    use std::collections::BTreeMap;

    /// 每帧 `counts[i]` 根骨骼各一个关键帧
    fn composed(counts: &[usize]) -> ComposedMotion {
        let mut composed = ComposedMotion::default();
        composed.motion.model_name = String::from("m");
        composed
            .motion
            .insert_morph_keyframe("まばたき", MorphKeyframe::new(0.0, 1.0));
        let mut key_counts = BTreeMap::new();
        for (f, &count) in counts.iter().enumerate() {
            for b in 0..count {
                let mut kf = BoneKeyframe::new(f as f32);
                kf.translation.x = (f * 10 + b) as f32;
                kf.physics_disabled = b % 2 == 0;
                composed.motion.insert_bone_keyframe(&format!("bone{}", b), kf);
            }
            key_counts.insert(Frame(f as f32), count);
        }
        composed.key_counts = key_counts;
        composed
    }

    fn frames_of(motion: &Motion) -> Vec<f32> {
        let mut frames: Vec<f32> = motion
            .bone_tracks
            .values()
            .flat_map(|track| track.frames().map(Frame::value))
            .collect();
        frames.sort_by(f32::total_cmp);
        frames.dedup();
        frames
    }

    #[test]
    fn test_split_at_limit() {
        let input = composed(&[3, 3, 3, 3, 3]);
        let outputs = split_motion(&input, Path::new("out/bake.vmd"), 7);

        assert_eq!(outputs.len(), 3);
        assert_eq!(frames_of(&outputs[0]), vec![0.0, 1.0]);
        assert_eq!(frames_of(&outputs[1]), vec![2.0, 3.0]);
        assert_eq!(frames_of(&outputs[2]), vec![4.0]);
        assert_eq!(outputs[0].path, PathBuf::from("out/bake_000000.vmd"));
        assert_eq!(outputs[1].path, PathBuf::from("out/bake_000002.vmd"));
        assert_eq!(outputs[2].path, PathBuf::from("out/bake_000004.vmd"));
        for output in &outputs {
            assert!(output.morph_tracks.contains_key("まばたき"));
            assert_eq!(output.model_name, "m");
        }
    }

    #[test]
    fn test_frame_that_does_not_fit_starts_new_file() {
        let input = composed(&[3, 3, 5]);
        let outputs = split_motion(&input, Path::new("bake.vmd"), 7);
        let sizes: Vec<usize> = outputs.iter().map(Motion::bone_keyframe_count).collect();
        assert_eq!(sizes, vec![6, 5]);
        assert_eq!(frames_of(&outputs[1]), vec![2.0]);
    }

    #[test]
    fn test_oversized_frame_gets_own_file() {
        let input = composed(&[2, 9, 1]);
        let outputs = split_motion(&input, Path::new("bake.vmd"), 4);
        let sizes: Vec<usize> = outputs.iter().map(Motion::bone_keyframe_count).collect();
        assert_eq!(sizes, vec![2, 9, 1]);
    }

    #[test]
    fn test_single_segment_keeps_template() {
        let input = composed(&[2, 2, 2]);
        let outputs = split_motion(&input, Path::new("bake.vmd"), 100);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].path, PathBuf::from("bake.vmd"));
        assert_eq!(outputs[0].bone_keyframe_count(), 6);
    }

    #[test]
    fn test_split_is_lossless() {
        let input = composed(&[1, 4, 2, 5, 3, 3, 1, 6]);
        for max_frames in [1, 2, 5, 7, 10, 1000] {
            let outputs = split_motion(&input, Path::new("bake.vmd"), max_frames);

            let mut merged = Motion::new();
            let mut last_frame = None;
            for output in &outputs {
                let frames = frames_of(output);
                assert!(
                    output.bone_keyframe_count() <= max_frames || frames.len() == 1,
                    "max_frames {}: segment of {} keyframes",
                    max_frames,
                    output.bone_keyframe_count()
                );
                // 分段按时间顺序排列且互不重叠
                if let (Some(last), Some(first)) = (last_frame, frames.first()) {
                    assert!(*first > last);
                }
                last_frame = frames.last().copied().or(last_frame);
                merged.merge(output);
            }

            assert_eq!(merged.bone_keyframe_count(), input.motion.bone_keyframe_count());
            for (name, track) in &input.motion.bone_tracks {
                assert_eq!(merged.bone_tracks.get(name), Some(track), "max_frames {}", max_frames);
            }
        }
    }

    #[test]
    fn test_suffixed_path() {
        assert_eq!(
            suffixed_path(Path::new("a/b.vmd"), "1"),
            PathBuf::from("a/b_1.vmd")
        );
        assert_eq!(suffixed_path(Path::new("plain"), "x"), PathBuf::from("plain_x"));
    }
}
