//! 刚体定义

use glam::Vec3;

/// 刚体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigidBodyType {
    /// 静态/运动学刚体，跟随骨骼
    Kinematic,
    /// 动态刚体，完全由物理驱动
    Dynamic,
    /// 动态刚体，但位置跟随骨骼（只有旋转由物理驱动）
    DynamicWithBonePosition,
}

impl RigidBodyType {
    /// 是否由物理模拟驱动
    pub fn is_simulated(self) -> bool {
        self != RigidBodyType::Kinematic
    }
}

/// 刚体形状
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigidBodyShape {
    Sphere,
    Box,
    Capsule,
}

/// 刚体
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    /// 刚体名称
    pub name: String,
    /// 关联的骨骼索引
    pub bone_index: i32,
    /// 刚体类型
    pub body_type: RigidBodyType,
    pub shape: RigidBodyShape,
    /// 尺寸（球：半径；盒：半长；胶囊：半径、高）
    pub size: Vec3,
    /// 质量
    pub mass: f32,
}

impl RigidBody {
    pub fn new(name: impl Into<String>, bone_index: i32, body_type: RigidBodyType) -> Self {
        Self {
            name: name.into(),
            bone_index,
            body_type,
            shape: RigidBodyShape::Sphere,
            size: Vec3::ONE,
            mass: 1.0,
        }
    }

    pub fn with_shape(mut self, shape: RigidBodyShape, size: Vec3) -> Self {
        self.shape = shape;
        self.size = size;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }
}
