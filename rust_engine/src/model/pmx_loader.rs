//! PMX 模型读取（骨骼、刚体、关节）

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use glam::Vec3;
use mmd::pmx::bone::BoneFlags;
use mmd::pmx::rigid_body::{RigidBodyMode, RigidBodyShape as PmxShape};
use mmd::pmx::types::DefaultConfig;
use mmd::reader::{DisplayFrameReader, JointReader, RigidBodyReader};
use mmd::{
    BoneReader, HeaderReader, MaterialReader, MorphReader, SurfaceReader, TextureReader,
    VertexReader,
};

use crate::{BakeError, Result};

use super::{Bone, Joint, Model, ModelReader, RigidBody, RigidBodyShape, RigidBodyType};

/// PMX 读取器
#[derive(Debug, Clone, Default)]
pub struct PmxModelReader {
    /// 读取后必须存在的骨骼
    pub required_bones: Vec<String>,
}

impl PmxModelReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_required_bones<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            required_bones: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl ModelReader for PmxModelReader {
    fn read_model(&self, path: &Path, physics_enabled: bool) -> Result<Model> {
        let mut model = load_pmx(path)?;
        model.require_bones(&self.required_bones)?;
        if !physics_enabled {
            model.disable_physics();
        }
        Ok(model)
    }
}

fn parse_error<E: std::fmt::Debug>(what: &str) -> impl Fn(E) -> BakeError + '_ {
    move |e| BakeError::PmxParse(format!("{} error: {:?}", what, e))
}

/// 从 PMX 文件加载模型
fn load_pmx(path: &Path) -> Result<Model> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let header_reader = HeaderReader::new(&mut reader).map_err(parse_error("Header"))?;
    let mut model = Model::new(header_reader.model_local_name.clone());
    model.path = path.to_path_buf();

    // 顶点、面、纹理、材质与烘焙无关，只按顺序跳过
    let mut vertex_reader = VertexReader::new(header_reader).map_err(parse_error("Vertex reader"))?;
    while vertex_reader
        .next::<DefaultConfig>()
        .map_err(parse_error("Vertex"))?
        .is_some()
    {}

    let mut surface_reader =
        SurfaceReader::new(vertex_reader).map_err(parse_error("Surface reader"))?;
    while surface_reader
        .next::<DefaultConfig>()
        .map_err(parse_error("Surface"))?
        .is_some()
    {}

    let mut texture_reader =
        TextureReader::new(surface_reader).map_err(parse_error("Texture reader"))?;
    while texture_reader
        .next()
        .map_err(parse_error("Texture"))?
        .is_some()
    {}

    let mut material_reader =
        MaterialReader::new(texture_reader).map_err(parse_error("Material reader"))?;
    while material_reader
        .next::<DefaultConfig>()
        .map_err(parse_error("Material"))?
        .is_some()
    {}

    // 读取骨骼
    let mut bone_reader = BoneReader::new(material_reader).map_err(parse_error("Bone reader"))?;
    while let Some(pmx) = bone_reader
        .next::<DefaultConfig>()
        .map_err(parse_error("Bone"))?
    {
        let flags = pmx.bone_flags;
        let mut bone = Bone::new(pmx.local_name.clone()).with_parent(pmx.parent);
        if let Some(ref additional) = pmx.additional {
            bone = bone.with_append(
                additional.parent,
                additional.rate,
                flags.contains(BoneFlags::AddRotation),
                flags.contains(BoneFlags::AddMovement),
            );
        }
        model.add_bone(bone);
    }

    let mut morph_reader = MorphReader::new(bone_reader).map_err(parse_error("Morph reader"))?;
    while morph_reader
        .next::<DefaultConfig>()
        .map_err(parse_error("Morph"))?
        .is_some()
    {}

    let mut display_frame_reader =
        DisplayFrameReader::new(morph_reader).map_err(parse_error("DisplayFrame reader"))?;
    while display_frame_reader
        .next::<DefaultConfig>()
        .map_err(parse_error("DisplayFrame"))?
        .is_some()
    {}

    // 读取刚体
    let mut rigid_body_reader =
        RigidBodyReader::new(display_frame_reader).map_err(parse_error("RigidBody reader"))?;
    while let Some(rb) = rigid_body_reader
        .next::<DefaultConfig>()
        .map_err(parse_error("RigidBody"))?
    {
        let body_type = match rb.mode {
            RigidBodyMode::Static => RigidBodyType::Kinematic,
            RigidBodyMode::Dynamic => RigidBodyType::Dynamic,
            RigidBodyMode::DynamicWithBonePosition => RigidBodyType::DynamicWithBonePosition,
        };
        let shape = match rb.shape {
            PmxShape::Sphere => RigidBodyShape::Sphere,
            PmxShape::Box => RigidBodyShape::Box,
            PmxShape::Capsule => RigidBodyShape::Capsule,
        };
        model.add_rigid_body(
            RigidBody::new(rb.local_name.clone(), rb.bone_index, body_type)
                .with_shape(shape, vec3_from_arr(rb.size))
                .with_mass(rb.mass),
        );
    }

    // 读取关节
    let mut joint_reader =
        JointReader::new(rigid_body_reader).map_err(parse_error("Joint reader"))?;
    while let Some(j) = joint_reader
        .next::<DefaultConfig>()
        .map_err(parse_error("Joint"))?
    {
        let mut joint = Joint::new(j.local_name.clone(), j.rigid_body_a_index, j.rigid_body_b_index);
        joint.linear_lower = vec3_from_arr(j.position_min);
        joint.linear_upper = vec3_from_arr(j.position_max);
        joint.angular_lower = vec3_from_arr(j.rotation_min);
        joint.angular_upper = vec3_from_arr(j.rotation_max);
        joint.linear_spring = vec3_from_arr(j.position_spring);
        joint.angular_spring = vec3_from_arr(j.rotation_spring);
        model.add_joint(joint);
    }

    log::debug!(
        "PMX 解析完成: {} 个骨骼, {} 个刚体, {} 个关节",
        model.bones.len(),
        model.rigid_bodies.len(),
        model.joints.len()
    );

    Ok(model)
}

fn vec3_from_arr(v: [f32; 3]) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}
