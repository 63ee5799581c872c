//! 关节（6DOF 弹簧约束）定义

use glam::Vec3;

/// 关节
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    /// 关节名称
    pub name: String,
    /// 刚体 A 索引
    pub rigid_body_a_index: i32,
    /// 刚体 B 索引
    pub rigid_body_b_index: i32,
    /// 线性下限
    pub linear_lower: Vec3,
    /// 线性上限
    pub linear_upper: Vec3,
    /// 角度下限
    pub angular_lower: Vec3,
    /// 角度上限
    pub angular_upper: Vec3,
    /// 线性弹簧刚度
    pub linear_spring: Vec3,
    /// 角度弹簧刚度
    pub angular_spring: Vec3,
}

impl Joint {
    pub fn new(name: impl Into<String>, rigid_body_a_index: i32, rigid_body_b_index: i32) -> Self {
        Self {
            name: name.into(),
            rigid_body_a_index,
            rigid_body_b_index,
            linear_lower: Vec3::ZERO,
            linear_upper: Vec3::ZERO,
            angular_lower: Vec3::ZERO,
            angular_upper: Vec3::ZERO,
            linear_spring: Vec3::ZERO,
            angular_spring: Vec3::ZERO,
        }
    }

    pub fn with_angular_limits(mut self, lower: Vec3, upper: Vec3) -> Self {
        self.angular_lower = lower;
        self.angular_upper = upper;
        self
    }

    pub fn with_springs(mut self, linear: Vec3, angular: Vec3) -> Self {
        self.linear_spring = linear;
        self.angular_spring = angular;
        self
    }
}

/// 关节与两端刚体的关联（索引均已验证有效）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointLink {
    pub joint: usize,
    pub rigid_body_a: usize,
    pub rigid_body_b: usize,
}
