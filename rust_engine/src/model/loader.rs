//! 模型读取接口与物理开 / 关两个版本的并行加载

use std::path::Path;

use crate::{BakeError, Result};

use super::Model;

/// 模型读取接口
///
/// `physics_enabled` 为 false 时返回的模型所有刚体都跟随骨骼。
/// 缺少必需骨骼时应返回 `BakeError::MissingBones`。
pub trait ModelReader {
    fn read_model(&self, path: &Path, physics_enabled: bool) -> Result<Model>;
}

/// 物理开启 / 关闭两个版本
#[derive(Debug, Clone)]
pub struct PhysicsVariants<T> {
    pub physics_enabled: T,
    pub physics_disabled: T,
}

/// 并行加载物理开启和关闭两个版本
///
/// 两个任务都结束后才报告错误；两边都失败时返回 `BakeError::Multiple`。
pub fn load_physics_variants<T, F>(load: F) -> Result<PhysicsVariants<T>>
where
    T: Send,
    F: Fn(bool) -> Result<T> + Sync,
{
    let (enabled, disabled) = rayon::join(|| load(true), || load(false));

    match (enabled, disabled) {
        (Ok(physics_enabled), Ok(physics_disabled)) => Ok(PhysicsVariants {
            physics_enabled,
            physics_disabled,
        }),
        (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
        (Err(a), Err(b)) => Err(BakeError::Multiple(vec![a, b])),
    }
}

/// 用指定的读取器并行加载模型的两个版本
pub fn load_model_variants<R>(reader: &R, path: &Path) -> Result<PhysicsVariants<Model>>
where
    R: ModelReader + Sync,
{
    let variants = load_physics_variants(|physics_enabled| reader.read_model(path, physics_enabled))?;
    log::info!(
        "模型加载完成: {} ({} 个骨骼, {} 个刚体, {} 个关节)",
        variants.physics_enabled.name,
        variants.physics_enabled.bones.len(),
        variants.physics_enabled.rigid_bodies.len(),
        variants.physics_enabled.joints.len()
    );
    Ok(variants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bone, RigidBody, RigidBodyType};

    struct MemoryReader {
        fail_disabled: bool,
        fail_enabled: bool,
    }

    impl ModelReader for MemoryReader {
        fn read_model(&self, path: &Path, physics_enabled: bool) -> Result<Model> {
            if (physics_enabled && self.fail_enabled) || (!physics_enabled && self.fail_disabled) {
                return Err(BakeError::PmxParse(format!(
                    "{} physics={}",
                    path.display(),
                    physics_enabled
                )));
            }
            let mut model = Model::new("memory");
            model.add_bone(Bone::new("髪"));
            model.add_rigid_body(RigidBody::new("髪", 0, RigidBodyType::Dynamic));
            if !physics_enabled {
                model.disable_physics();
            }
            Ok(model)
        }
    }

    #[test]
    fn test_variants_loaded() {
        let reader = MemoryReader {
            fail_disabled: false,
            fail_enabled: false,
        };
        let variants = load_model_variants(&reader, Path::new("a.pmx")).unwrap();
        assert!(variants.physics_enabled.bone_has_physics("髪"));
        assert!(!variants.physics_disabled.bone_has_physics("髪"));
    }

    #[test]
    fn test_single_failure_is_returned() {
        let reader = MemoryReader {
            fail_disabled: true,
            fail_enabled: false,
        };
        match load_model_variants(&reader, Path::new("a.pmx")) {
            Err(BakeError::PmxParse(message)) => assert!(message.contains("physics=false")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_both_failures_are_collected() {
        let reader = MemoryReader {
            fail_disabled: true,
            fail_enabled: true,
        };
        match load_model_variants(&reader, Path::new("a.pmx")) {
            Err(BakeError::Multiple(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
