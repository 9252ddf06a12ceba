use glam::{DMat3, DQuat, DVec3};

/// 3次元ベクトル（位置・速度・方向）
pub type Vec3 = DVec3;

/// 姿勢を表す四元数
pub type Quat = DQuat;

/// ユニットのローカル前方軸（+Z）
pub const LOCAL_FORWARD: Vec3 = DVec3::Z;

/// エージェントの状態を表す列挙型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStatus {
    Active,    // アクティブ
    Destroyed, // 撃破・消滅
}

/// ユニットが行動する領域
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// 宇宙空間（軌道上・ホバー）
    Space,
    /// 惑星表面に拘束
    Ground,
}

/// 数学ユーティリティ関数
pub mod math_utils {
    use super::*;

    /// 数値誤差の許容値
    pub const EPSILON: f64 = 1e-9;

    /// 前方向と上方向からルック回転を計算
    ///
    /// ローカル+Zが`forward`に、ローカル+Yが可能な限り`up`に一致する回転を返します。
    /// `forward`がゼロの場合は単位回転、`up`と平行な場合は代替の上方向を使用します。
    pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
        let z = forward.normalize_or_zero();
        if z == Vec3::ZERO {
            return Quat::IDENTITY;
        }

        let mut x = up.cross(z);
        if x.length_squared() < EPSILON {
            // 前方向と上方向が平行
            let fallback = if z.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
            x = fallback.cross(z);
        }
        let x = x.normalize();
        let y = z.cross(x);

        Quat::from_mat3(&DMat3::from_cols(x, y, z)).normalize()
    }

    /// 最大回転角を制限して`from`から`to`へ回転
    ///
    /// 1回の呼び出しで`max_degrees`を超えて回転せず、目標を行き過ぎることもありません。
    pub fn rotate_towards(from: Quat, to: Quat, max_degrees: f64) -> Quat {
        if max_degrees <= 0.0 {
            return from;
        }

        let angle = from.angle_between(to).to_degrees();
        if angle <= max_degrees || angle < EPSILON {
            return to;
        }

        from.slerp(to, max_degrees / angle).normalize()
    }

    /// ベクトルを法線で定義される平面へ射影
    pub fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
        let n = normal.normalize_or_zero();
        v - n * v.dot(n)
    }

    /// 接平面内の進行方向（正規化済み）
    ///
    /// `v`が法線と平行で接平面成分を持たない場合は`hint`の接平面成分を、
    /// それも無ければ法線に直交する任意の方向を使います。`v`がゼロならゼロを返します。
    pub fn tangent_direction(v: Vec3, normal: Vec3, hint: Vec3) -> Vec3 {
        let n = normal.normalize_or_zero();
        if v.length_squared() < EPSILON || n == Vec3::ZERO {
            return project_on_plane(v, n).normalize_or_zero();
        }

        let tangent = project_on_plane(v, n);
        if tangent.length_squared() > EPSILON * v.length_squared() {
            return tangent.normalize();
        }

        let hinted = project_on_plane(hint, n);
        if hinted.length_squared() > EPSILON {
            return hinted.normalize();
        }
        n.any_orthonormal_vector()
    }

    /// 2つのベクトルのなす角（度）
    ///
    /// どちらかがゼロベクトルの場合は0を返します。
    pub fn angle_between_deg(a: Vec3, b: Vec3) -> f64 {
        if a.length_squared() < EPSILON || b.length_squared() < EPSILON {
            return 0.0;
        }
        a.angle_between(b).to_degrees()
    }

    /// 回転から前方軸を取得
    pub fn forward_of(rotation: Quat) -> Vec3 {
        rotation * LOCAL_FORWARD
    }

    /// ベクトルの全成分が有限かどうか
    pub fn is_finite_vec(v: Vec3) -> bool {
        v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
    }
}
