//! VMD 插值曲线
//!
//! 控制点以 0..=127 的字节存放在 VMD 中，这里归一化到 [0, 1]。

/// 起点 (0, 0)、终点 (1, 1) 的三次贝塞尔曲线
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BezierCurve {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Default for BezierCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl BezierCurve {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// 线性插值（MMD 默认的 20,20,107,107）
    pub fn linear() -> Self {
        Self::from_vmd_data(&[20, 20, 107, 107])
    }

    /// 从 VMD 插值数据创建（x1, y1, x2, y2，范围 0..=127）
    pub fn from_vmd_data(data: &[u8; 4]) -> Self {
        Self {
            x1: data[0] as f32 / 127.0,
            y1: data[1] as f32 / 127.0,
            x2: data[2] as f32 / 127.0,
            y2: data[3] as f32 / 127.0,
        }
    }

    /// 转换回 VMD 插值数据
    pub fn to_vmd_data(&self) -> [u8; 4] {
        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 127.0).round() as u8;
        [to_byte(self.x1), to_byte(self.y1), to_byte(self.x2), to_byte(self.y2)]
    }

    pub fn is_linear(&self) -> bool {
        (self.x1 - self.y1).abs() < 1e-6 && (self.x2 - self.y2).abs() < 1e-6
    }

    /// 求 x = t 处的 y 值
    ///
    /// 先用牛顿迭代反解参数 s，导数过小时停止迭代。
    pub fn evaluate(&self, t: f32) -> f32 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        if self.is_linear() {
            return t;
        }

        let mut s = t;
        for _ in 0..15 {
            let slope = cubic_derivative(s, self.x1, self.x2);
            if slope.abs() < 1e-6 {
                break;
            }
            let next = (s - (cubic(s, self.x1, self.x2) - t) / slope).clamp(0.0, 1.0);
            let converged = (next - s).abs() < 1e-6;
            s = next;
            if converged {
                break;
            }
        }

        cubic(s, self.y1, self.y2)
    }
}

/// 端点固定为 0 和 1 的三次贝塞尔
fn cubic(s: f32, p1: f32, p2: f32) -> f32 {
    let inv = 1.0 - s;
    3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
}

fn cubic_derivative(s: f32, p1: f32, p2: f32) -> f32 {
    let inv = 1.0 - s;
    3.0 * inv * inv * p1 + 6.0 * inv * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_curve() {
        let curve = BezierCurve::linear();
        assert!((curve.evaluate(0.3) - 0.3).abs() < 1e-5);
        assert_eq!(curve.to_vmd_data(), [20, 20, 107, 107]);
    }

    #[test]
    fn test_ease_curve_endpoints() {
        let curve = BezierCurve::from_vmd_data(&[64, 0, 64, 127]);
        assert_eq!(curve.evaluate(0.0), 0.0);
        assert_eq!(curve.evaluate(1.0), 1.0);
        let mid = curve.evaluate(0.5);
        assert!((mid - 0.5).abs() < 0.05);
        assert!(curve.evaluate(0.2) < 0.2);
    }
}
