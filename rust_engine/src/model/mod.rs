//! 模型数据（骨骼层级、刚体、关节）
//!
//! 骨骼、刚体、关节都按 PMX 中的索引存放在数组里，彼此之间只用索引引用。

mod bone;
mod joint;
mod loader;
#[cfg(feature = "pmx")]
mod pmx_loader;
mod rigid_body;

pub use bone::Bone;
pub use joint::{Joint, JointLink};
pub use loader::{load_model_variants, load_physics_variants, ModelReader, PhysicsVariants};
#[cfg(feature = "pmx")]
pub use pmx_loader::PmxModelReader;
pub use rigid_body::{RigidBody, RigidBodyShape, RigidBodyType};

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::{BakeError, Result};

/// 烘焙使用的只读模型
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub name: String,
    pub path: PathBuf,
    pub bones: Vec<Bone>,
    pub rigid_bodies: Vec<RigidBody>,
    pub joints: Vec<Joint>,
    bone_name_to_index: HashMap<String, usize>,
    rigid_body_name_to_index: HashMap<String, usize>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// 添加骨骼，索引按添加顺序分配
    pub fn add_bone(&mut self, mut bone: Bone) -> usize {
        let index = self.bones.len();
        bone.index = index;
        bone.has_physics = self
            .rigid_bodies
            .iter()
            .any(|rb| rb.bone_index == index as i32 && rb.body_type.is_simulated());
        self.bone_name_to_index.insert(bone.name.clone(), index);
        self.bones.push(bone);
        index
    }

    /// 添加刚体
    pub fn add_rigid_body(&mut self, rigid_body: RigidBody) -> usize {
        let index = self.rigid_bodies.len();
        if rigid_body.body_type.is_simulated() && rigid_body.bone_index >= 0 {
            if let Some(bone) = self.bones.get_mut(rigid_body.bone_index as usize) {
                bone.has_physics = true;
            }
        }
        self.rigid_body_name_to_index
            .insert(rigid_body.name.clone(), index);
        self.rigid_bodies.push(rigid_body);
        index
    }

    /// 添加关节
    pub fn add_joint(&mut self, joint: Joint) -> usize {
        self.joints.push(joint);
        self.joints.len() - 1
    }

    /// 通过名称查找骨骼
    pub fn bone_by_name(&self, name: &str) -> Option<&Bone> {
        self.bone_name_to_index
            .get(name)
            .and_then(|&index| self.bones.get(index))
    }

    /// 通过名称查找刚体索引
    pub fn find_rigid_body(&self, name: &str) -> Option<usize> {
        self.rigid_body_name_to_index.get(name).copied()
    }

    /// 骨骼是否由物理驱动
    pub fn bone_has_physics(&self, name: &str) -> bool {
        self.bone_by_name(name).is_some_and(|bone| bone.has_physics)
    }

    /// 骨骼是否被选中骨骼中的某一根通过付与驱动
    pub fn is_driven_by_any(&self, name: &str, drivers: &HashSet<String>) -> bool {
        self.bone_by_name(name)
            .and_then(Bone::effector_index)
            .and_then(|index| self.bones.get(index))
            .is_some_and(|driver| drivers.contains(&driver.name))
    }

    /// 解析关节两端刚体，跳过索引无效的关节
    pub fn joint_links(&self) -> Vec<JointLink> {
        let count = self.rigid_bodies.len() as i32;
        self.joints
            .iter()
            .enumerate()
            .filter_map(|(index, joint)| {
                let a = joint.rigid_body_a_index;
                let b = joint.rigid_body_b_index;
                if (0..count).contains(&a) && (0..count).contains(&b) {
                    Some(JointLink {
                        joint: index,
                        rigid_body_a: a as usize,
                        rigid_body_b: b as usize,
                    })
                } else {
                    log::warn!("关节 {} 的刚体索引无效: {}, {}", joint.name, a, b);
                    None
                }
            })
            .collect()
    }

    /// 检查必需骨骼是否存在
    pub fn require_bones<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        let missing: Vec<String> = names
            .iter()
            .map(|name| name.as_ref())
            .filter(|name| !self.bone_name_to_index.contains_key(*name))
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(BakeError::MissingBones {
                model: self.name.clone(),
                bones: missing,
            })
        }
    }

    /// 关闭物理：所有刚体改为跟随骨骼
    pub fn disable_physics(&mut self) {
        for rigid_body in &mut self.rigid_bodies {
            rigid_body.body_type = RigidBodyType::Kinematic;
        }
        for bone in &mut self.bones {
            bone.has_physics = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hair_model() -> Model {
        let mut model = Model::new("test");
        model.add_bone(Bone::new("センター"));
        model.add_bone(Bone::new("頭").with_parent(0));
        model.add_bone(Bone::new("髪").with_parent(1));
        model.add_bone(Bone::new("髪先").with_parent(2).with_append(2, 1.0, true, false));
        model.add_rigid_body(RigidBody::new("頭剛体", 1, RigidBodyType::Kinematic));
        model.add_rigid_body(RigidBody::new("髪剛体", 2, RigidBodyType::Dynamic));
        model.add_joint(Joint::new("髪関節", 0, 1));
        model.add_joint(Joint::new("壊れた関節", 0, 9));
        model
    }

    #[test]
    fn test_physics_flags() {
        let model = hair_model();
        assert!(model.bone_has_physics("髪"));
        assert!(!model.bone_has_physics("頭"));
        assert!(!model.bone_has_physics("存在しない"));
    }

    #[test]
    fn test_physics_flag_when_bone_added_late() {
        let mut model = Model::new("late");
        model.add_rigid_body(RigidBody::new("rb", 0, RigidBodyType::DynamicWithBonePosition));
        model.add_bone(Bone::new("root"));
        assert!(model.bone_has_physics("root"));
    }

    #[test]
    fn test_effector_driven() {
        let model = hair_model();
        let drivers: HashSet<String> = ["髪".to_string()].into_iter().collect();
        assert!(model.is_driven_by_any("髪先", &drivers));
        assert!(!model.is_driven_by_any("髪", &drivers));
        assert!(!model.is_driven_by_any("髪先", &HashSet::new()));
    }

    #[test]
    fn test_joint_links_skip_invalid() {
        let links = hair_model().joint_links();
        assert_eq!(
            links,
            vec![JointLink {
                joint: 0,
                rigid_body_a: 0,
                rigid_body_b: 1
            }]
        );
    }

    #[test]
    fn test_require_bones() {
        let model = hair_model();
        assert!(model.require_bones(&["センター", "頭"]).is_ok());
        match model.require_bones(&["センター", "上半身"]) {
            Err(BakeError::MissingBones { bones, .. }) => assert_eq!(bones, vec!["上半身"]),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_disable_physics() {
        let mut model = hair_model();
        model.disable_physics();
        assert!(!model.bone_has_physics("髪"));
        assert!(model
            .rigid_bodies
            .iter()
            .all(|rb| rb.body_type == RigidBodyType::Kinematic));
    }
}
