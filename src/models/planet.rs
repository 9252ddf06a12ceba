use crate::models::{
    common::{math_utils, Vec3},
    traits::ISurfaceQuery,
};

/// 表面クエリの結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// 表面上の交点
    pub point: Vec3,
    /// 交点における外向き法線
    pub normal: Vec3,
    /// クエリ位置から交点までの距離（表面からの高度）
    pub distance: f64,
}

/// 惑星
///
/// 球体として扱い、重力基準の上方向と歩行可能な表面を定義します。
/// ユニットからは参照されるのみで、所有されることはありません。
#[derive(Debug, Clone)]
pub struct Planet {
    pub id: String,
    /// 惑星中心位置
    pub center: Vec3,
    /// 惑星半径
    pub radius: f64,
    /// 表面コライダーがクエリ対象か（レイヤー不一致の場合false）
    pub collision_enabled: bool,
    /// クエリの最大キャスト距離
    pub max_query_distance: f64,
}

impl Planet {
    pub fn new(id: String, center: Vec3, radius: f64) -> Self {
        Self {
            id,
            center,
            radius,
            collision_enabled: true,
            max_query_distance: f64::INFINITY,
        }
    }

    /// 位置から惑星中心までの距離
    pub fn distance_to_center(&self, position: Vec3) -> f64 {
        position.distance(self.center)
    }

    /// 表面からの高度（表面下では負）
    pub fn altitude(&self, position: Vec3) -> f64 {
        self.distance_to_center(position) - self.radius
    }
}

/// レイと球の最初の交点までの距離
///
/// レイの始点が球の内側にある場合は交差なしとみなします（表面上は距離0で交差）。
fn ray_sphere_first_hit(origin: Vec3, direction: Vec3, center: Vec3, radius: f64) -> Option<f64> {
    let offset = origin - center;
    let c = offset.length_squared() - radius * radius;
    if c < 0.0 {
        return None;
    }

    let b = offset.dot(direction);
    if b > 0.0 {
        // 球から遠ざかる方向
        return None;
    }

    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let t = -b - discriminant.sqrt();
    (t >= 0.0).then_some(t)
}

impl ISurfaceQuery for Planet {
    fn query_surface(&self, position: Vec3) -> Option<SurfaceHit> {
        if !self.collision_enabled || !math_utils::is_finite_vec(position) {
            return None;
        }

        let direction = (self.center - position).normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }

        let distance = ray_sphere_first_hit(position, direction, self.center, self.radius)?;
        if distance > self.max_query_distance {
            return None;
        }

        let point = position + direction * distance;
        let normal = (point - self.center).normalize_or_zero();

        Some(SurfaceHit { point, normal, distance })
    }

    fn gravity_up(&self, position: Vec3) -> Vec3 {
        let up = (position - self.center).normalize_or_zero();
        if up == Vec3::ZERO { Vec3::Y } else { up }
    }
}
