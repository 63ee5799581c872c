//! VMD 文件读写
//!
//! 只处理骨骼与 Morph 关键帧；相机、光照、阴影和 IK 段写出为空段，读取时忽略。

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use encoding_rs::SHIFT_JIS;
use glam::{Quat, Vec3};

use crate::{BakeError, Result};

use super::keyframe::{BoneCurves, BoneKeyframe, MorphKeyframe};
use super::{BezierCurve, Frame, Motion};

/// VMD 文件头
const VMD_HEADER_V1: &[u8] = b"Vocaloid Motion Data file";
const VMD_HEADER_V2: &[u8] = b"Vocaloid Motion Data 0002";

const HEADER_LEN: usize = 30;
const MODEL_NAME_LEN_V1: usize = 10;
const MODEL_NAME_LEN_V2: usize = 20;
const BONE_NAME_LEN: usize = 15;
const MORPH_NAME_LEN: usize = 15;

/// 插值第 0 行第 2、3 字节为 99、15 时表示该关键帧关闭物理
const PHYSICS_OFF_MARK: [u8; 2] = [99, 15];

/// 动作读取接口
pub trait MotionReader {
    fn read_motion(&self, path: &Path) -> Result<Motion>;
}

/// 动作写出接口，写入 `motion.path`，不截断任何轨道
pub trait MotionWriter {
    fn write_motion(&self, motion: &Motion) -> Result<()>;
}

/// VMD 格式读写
#[derive(Debug, Clone, Copy, Default)]
pub struct VmdFile;

impl VmdFile {
    /// 从文件路径加载 VMD
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Motion> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        let mut motion = Self::load_from_reader(&mut reader)?;
        motion.path = path.as_ref().to_path_buf();
        Ok(motion)
    }

    /// 从字节切片加载 VMD
    pub fn load_from_bytes(bytes: &[u8]) -> Result<Motion> {
        let mut reader = std::io::Cursor::new(bytes);
        Self::load_from_reader(&mut reader)
    }

    /// 从 Reader 加载 VMD
    pub fn load_from_reader<R: Read>(reader: &mut R) -> Result<Motion> {
        let mut header = [0u8; HEADER_LEN];
        reader
            .read_exact(&mut header)
            .map_err(|e| BakeError::VmdParse(format!("Failed to read header: {}", e)))?;

        let name_len = if header[..25] == VMD_HEADER_V2[..] {
            MODEL_NAME_LEN_V2
        } else if header[..25] == VMD_HEADER_V1[..] {
            MODEL_NAME_LEN_V1
        } else {
            return Err(BakeError::VmdParse("Invalid VMD header".to_string()));
        };

        let mut motion = Motion::new();
        motion.model_name = read_name(reader, name_len, "model name")?;

        let bone_keyframe_count = read_count(reader, "bone keyframe count")?;
        for _ in 0..bone_keyframe_count {
            let (name, keyframe) = read_bone_keyframe(reader)?;
            motion.insert_bone_keyframe(&name, keyframe);
        }

        let morph_keyframe_count = read_count(reader, "morph keyframe count")?;
        for _ in 0..morph_keyframe_count {
            let (name, keyframe) = read_morph_keyframe(reader)?;
            motion.insert_morph_keyframe(&name, keyframe);
        }

        log::debug!(
            "VMD 解析完成: {} 个骨骼轨道, {} 个 Morph 轨道",
            motion.bone_tracks.len(),
            motion.morph_tracks.len()
        );

        Ok(motion)
    }

    /// 写出到 `path`
    pub fn write<P: AsRef<Path>>(motion: &Motion, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        Self::write_to(motion, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// 写出到任意 Writer
    pub fn write_to<W: Write>(motion: &Motion, writer: &mut W) -> Result<()> {
        let mut header = [0u8; HEADER_LEN];
        header[..VMD_HEADER_V2.len()].copy_from_slice(VMD_HEADER_V2);
        writer.write_all(&header)?;

        let model_name = if motion.model_name.is_empty() {
            crate::config::get_config().model_name_fallback
        } else {
            motion.model_name.clone()
        };
        write_name(writer, &model_name, MODEL_NAME_LEN_V2)?;

        let bone_names = motion.sorted_bone_names();
        writer.write_u32::<LittleEndian>(motion.bone_keyframe_count() as u32)?;
        for name in bone_names {
            for keyframe in motion.bone_tracks[name].iter() {
                write_bone_keyframe(writer, name, keyframe)?;
            }
        }

        let mut morph_names: Vec<&String> = motion.morph_tracks.keys().collect();
        morph_names.sort_unstable();
        let morph_count: usize = motion.morph_tracks.values().map(|t| t.len()).sum();
        writer.write_u32::<LittleEndian>(morph_count as u32)?;
        for name in morph_names {
            for keyframe in motion.morph_tracks[name].iter() {
                write_name(writer, name, MORPH_NAME_LEN)?;
                writer.write_u32::<LittleEndian>(keyframe.frame.to_index())?;
                writer.write_f32::<LittleEndian>(keyframe.weight)?;
            }
        }

        // 相机、光照、阴影、IK
        for _ in 0..4 {
            writer.write_u32::<LittleEndian>(0)?;
        }

        Ok(())
    }
}

impl MotionReader for VmdFile {
    fn read_motion(&self, path: &Path) -> Result<Motion> {
        Self::load(path)
    }
}

impl MotionWriter for VmdFile {
    fn write_motion(&self, motion: &Motion) -> Result<()> {
        Self::write(motion, &motion.path)
    }
}

fn read_count<R: Read>(reader: &mut R, what: &str) -> Result<u32> {
    reader
        .read_u32::<LittleEndian>()
        .map_err(|e| BakeError::VmdParse(format!("Failed to read {}: {}", what, e)))
}

fn read_f32<R: Read>(reader: &mut R, what: &str) -> Result<f32> {
    reader
        .read_f32::<LittleEndian>()
        .map_err(|e| BakeError::VmdParse(format!("Failed to read {}: {}", what, e)))
}

fn read_name<R: Read>(reader: &mut R, len: usize, what: &str) -> Result<String> {
    let mut bytes = vec![0u8; len];
    reader
        .read_exact(&mut bytes)
        .map_err(|e| BakeError::VmdParse(format!("Failed to read {}: {}", what, e)))?;
    Ok(decode_shift_jis(&bytes))
}

/// 读取骨骼关键帧
fn read_bone_keyframe<R: Read>(reader: &mut R) -> Result<(String, BoneKeyframe)> {
    let name = read_name(reader, BONE_NAME_LEN, "bone name")?;
    let frame_index = read_count(reader, "frame index")?;

    let tx = read_f32(reader, "translation")?;
    let ty = read_f32(reader, "translation")?;
    let tz = read_f32(reader, "translation")?;

    let rx = read_f32(reader, "rotation")?;
    let ry = read_f32(reader, "rotation")?;
    let rz = read_f32(reader, "rotation")?;
    let rw = read_f32(reader, "rotation")?;

    let mut interpolation = [0u8; 64];
    reader
        .read_exact(&mut interpolation)
        .map_err(|e| BakeError::VmdParse(format!("Failed to read interpolation: {}", e)))?;

    let physics_disabled = interpolation[2..4] == PHYSICS_OFF_MARK;

    // 第 0 行：X_x1, Y_x1, Z_x1, R_x1, X_y1, ..., R_y2
    // 物理标记占用 Z_x1 / R_x1 时，从第 1 行（整体左移一字节）取回
    let (z_x1, r_x1) = if physics_disabled {
        (interpolation[17], interpolation[18])
    } else {
        (interpolation[2], interpolation[3])
    };

    let curves = BoneCurves {
        translate_x: BezierCurve::from_vmd_data(&[
            interpolation[0],
            interpolation[4],
            interpolation[8],
            interpolation[12],
        ]),
        translate_y: BezierCurve::from_vmd_data(&[
            interpolation[1],
            interpolation[5],
            interpolation[9],
            interpolation[13],
        ]),
        translate_z: BezierCurve::from_vmd_data(&[
            z_x1,
            interpolation[6],
            interpolation[10],
            interpolation[14],
        ]),
        rotate: BezierCurve::from_vmd_data(&[
            r_x1,
            interpolation[7],
            interpolation[11],
            interpolation[15],
        ]),
    };

    // 坐标系转换：Z 轴和 W 分量反转
    let keyframe = BoneKeyframe {
        frame: Frame::from(frame_index),
        translation: Vec3::new(tx, ty, -tz),
        rotation: Quat::from_xyzw(rx, ry, -rz, -rw).normalize(),
        curves,
        physics_disabled,
    };

    Ok((name, keyframe))
}

/// 读取 Morph 关键帧
fn read_morph_keyframe<R: Read>(reader: &mut R) -> Result<(String, MorphKeyframe)> {
    let name = read_name(reader, MORPH_NAME_LEN, "morph name")?;
    let frame_index = read_count(reader, "frame index")?;
    let weight = read_f32(reader, "weight")?;
    Ok((name, MorphKeyframe::new(frame_index, weight)))
}

fn write_bone_keyframe<W: Write>(writer: &mut W, name: &str, keyframe: &BoneKeyframe) -> Result<()> {
    write_name(writer, name, BONE_NAME_LEN)?;
    writer.write_u32::<LittleEndian>(keyframe.frame.to_index())?;

    let t = keyframe.translation;
    writer.write_f32::<LittleEndian>(t.x)?;
    writer.write_f32::<LittleEndian>(t.y)?;
    writer.write_f32::<LittleEndian>(-t.z)?;

    let r = keyframe.rotation;
    writer.write_f32::<LittleEndian>(r.x)?;
    writer.write_f32::<LittleEndian>(r.y)?;
    writer.write_f32::<LittleEndian>(-r.z)?;
    writer.write_f32::<LittleEndian>(-r.w)?;

    writer.write_all(&encode_interpolation(&keyframe.curves, keyframe.physics_disabled))?;
    Ok(())
}

/// 生成 64 字节插值块：第 0 行按轴交错，后三行依次左移一字节
fn encode_interpolation(curves: &BoneCurves, physics_disabled: bool) -> [u8; 64] {
    let x = curves.translate_x.to_vmd_data();
    let y = curves.translate_y.to_vmd_data();
    let z = curves.translate_z.to_vmd_data();
    let r = curves.rotate.to_vmd_data();

    let mut row = [0u8; 16];
    for i in 0..4 {
        row[i * 4] = x[i];
        row[i * 4 + 1] = y[i];
        row[i * 4 + 2] = z[i];
        row[i * 4 + 3] = r[i];
    }

    let mut block = [0u8; 64];
    for line in 0..4 {
        let shifted = &row[line..];
        block[line * 16..line * 16 + shifted.len()].copy_from_slice(shifted);
    }

    if physics_disabled {
        block[2..4].copy_from_slice(&PHYSICS_OFF_MARK);
    }

    block
}

fn write_name<W: Write>(writer: &mut W, name: &str, len: usize) -> Result<()> {
    let (encoded, _, _) = SHIFT_JIS.encode(name);
    let mut bytes = vec![0u8; len];
    let n = encoded.len().min(len);
    bytes[..n].copy_from_slice(&encoded[..n]);
    writer.write_all(&bytes)?;
    Ok(())
}

/// 解码 Shift-JIS 字符串
fn decode_shift_jis(bytes: &[u8]) -> String {
    // 找到 null 终止符
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let (decoded, _, _) = SHIFT_JIS.decode(&bytes[..end]);
    decoded.to_string()
}
