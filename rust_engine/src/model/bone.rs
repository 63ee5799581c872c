//! 骨骼节点

/// 骨骼节点
///
/// 只保留烘焙需要的信息：层级、附加变换（付与）关系和物理标志。
#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    pub index: usize,
    pub name: String,
    pub parent_index: i32,

    // 附加变换：本骨骼的旋转 / 移动由 append_parent 驱动
    pub is_append_rotate: bool,
    pub is_append_translate: bool,
    pub append_parent: i32,
    pub append_rate: f32,

    /// 是否挂有非静态刚体（由 Model 维护）
    pub has_physics: bool,
}

impl Bone {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            index: 0,
            name: name.into(),
            parent_index: -1,
            is_append_rotate: false,
            is_append_translate: false,
            append_parent: -1,
            append_rate: 0.0,
            has_physics: false,
        }
    }

    pub fn with_parent(mut self, parent_index: i32) -> Self {
        self.parent_index = parent_index;
        self
    }

    /// 设置附加变换来源
    pub fn with_append(mut self, parent: i32, rate: f32, rotate: bool, translate: bool) -> Self {
        self.append_parent = parent;
        self.append_rate = rate;
        self.is_append_rotate = rotate;
        self.is_append_translate = translate;
        self
    }

    /// 驱动本骨骼的付与亲骨骼
    pub fn effector_index(&self) -> Option<usize> {
        if (self.is_append_rotate || self.is_append_translate) && self.append_parent >= 0 {
            Some(self.append_parent as usize)
        } else {
            None
        }
    }
}
