//! 攻撃中の位置取り（ホバー位置）と地表拘束の共通処理
//!
//! 宇宙用・地上用の攻撃ステートは同じ`HoverPositioning`を領域別に構成して保持します。

use crate::models::{
    common::{math_utils, Domain, Vec3},
    planet::SurfaceHit,
    traits::{IMovable, ISurfaceQuery},
    unit::Unit,
};

/// 最適交戦距離の攻撃射程に対する比率
pub const OPTIMAL_DISTANCE_RATIO: f64 = 0.75;

/// 表面からの最小距離の最適交戦距離に対する比率
pub const MIN_SURFACE_DISTANCE_RATIO: f64 = 0.5;

/// ホバー位置への到達判定距離
pub const POSITION_TOLERANCE: f64 = 2.0;

/// 精密位置取り時の速度倍率
pub const PRECISION_SPEED_FACTOR: f64 = 0.5;

/// 地上ユニットの表面からの高さ
pub const GROUND_OFFSET: f64 = 1.0;

/// 地表高度補正のゲイン（1/秒）
pub const GROUND_SNAP_RATE: f64 = 4.0;

/// 地表高度を`GROUND_OFFSET`へ戻すための法線方向速度
///
/// 大きさは`max_speed`で制限されます。
pub fn ground_altitude_correction(hit: &SurfaceHit, max_speed: f64) -> Vec3 {
    (hit.normal * (GROUND_OFFSET - hit.distance) * GROUND_SNAP_RATE).clamp_length_max(max_speed)
}

/// 位置の直下（重力方向）の地表点に`GROUND_OFFSET`を加えた位置
///
/// 位置を`probe_height`だけ持ち上げた点から表面クエリを行うため、地表よりわずかに
/// 下の位置でも地表点が得られます。クエリ失敗時は位置をそのまま返します。
pub fn ground_goal(surface: &impl ISurfaceQuery, position: Vec3, probe_height: f64) -> Vec3 {
    let probe = position + surface.gravity_up(position) * probe_height;
    match surface.query_surface(probe) {
        Some(hit) => hit.point + hit.normal * GROUND_OFFSET,
        None => position,
    }
}

/// 攻撃中の位置取り戦略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverPositioning {
    pub domain: Domain,
}

impl HoverPositioning {
    pub fn new(domain: Domain) -> Self {
        Self { domain }
    }

    /// 最適交戦距離
    pub fn optimal_distance(attack_range: f64) -> f64 {
        attack_range * OPTIMAL_DISTANCE_RATIO
    }

    /// 理想的なホバー位置を計算
    ///
    /// # 引数
    ///
    /// * `unit_position` - ユニットの現在位置
    /// * `target_position` - 目標の位置
    /// * `attack_range` - 攻撃射程
    /// * `surface` - 表面クエリ
    ///
    /// # 戻り値
    ///
    /// 目標から見てユニット側、最適交戦距離にある位置（表面制約を適用済み）
    pub fn ideal_position(
        &self,
        unit_position: Vec3,
        target_position: Vec3,
        attack_range: f64,
        surface: &impl ISurfaceQuery,
    ) -> Vec3 {
        match self.domain {
            Domain::Space => Self::space_ideal(unit_position, target_position, attack_range, surface),
            Domain::Ground => Self::ground_ideal(unit_position, target_position, attack_range, surface),
        }
    }

    fn space_ideal(
        unit_position: Vec3,
        target_position: Vec3,
        attack_range: f64,
        surface: &impl ISurfaceQuery,
    ) -> Vec3 {
        let optimal = Self::optimal_distance(attack_range);

        let mut away = (unit_position - target_position).normalize_or_zero();
        if away == Vec3::ZERO {
            away = surface.gravity_up(target_position);
        }

        let mut ideal = target_position + away * optimal;

        // 表面に近すぎる場合は法線方向へ押し出す
        if let Some(hit) = surface.query_surface(ideal) {
            let min_surface_distance = optimal * MIN_SURFACE_DISTANCE_RATIO;
            if hit.distance < min_surface_distance {
                ideal = hit.point + hit.normal * min_surface_distance;

                // 押し出しで射程外になった場合は射程球面上へ戻す
                if ideal.distance(target_position) > attack_range {
                    ideal = target_position + (ideal - target_position).normalize_or_zero() * attack_range;
                }
            }
        }

        ideal
    }

    fn ground_ideal(
        unit_position: Vec3,
        target_position: Vec3,
        attack_range: f64,
        surface: &impl ISurfaceQuery,
    ) -> Vec3 {
        let optimal = Self::optimal_distance(attack_range);
        let offset = unit_position - target_position;

        let tangent = match surface.query_surface(unit_position) {
            Some(hit) => math_utils::project_on_plane(offset, hit.normal),
            None => offset,
        };
        let away = tangent.normalize_or_zero();
        if away == Vec3::ZERO {
            // 目標の真上・真下では位置取りしない
            return unit_position;
        }

        ground_goal(surface, target_position + away * optimal, optimal)
    }

    /// ホバー位置へ向けて速度を設定
    ///
    /// 許容距離を超えている場合は移動速度の半分で精密に移動し、範囲内なら停止して保持します。
    ///
    /// # 戻り値
    ///
    /// 移動中ならtrue、保持中ならfalse
    pub fn steer(&self, unit: &mut Unit, ideal: Vec3, surface: &impl ISurfaceQuery, dt: f64) -> bool {
        let mut displacement = ideal - unit.position;
        let ground_hit = match self.domain {
            Domain::Ground => surface.query_surface(unit.position),
            Domain::Space => None,
        };
        if let Some(hit) = &ground_hit {
            displacement = math_utils::project_on_plane(displacement, hit.normal);
        }

        if displacement.length() <= POSITION_TOLERANCE {
            unit.stop();
            return false;
        }

        let speed = unit.stats.move_speed * PRECISION_SPEED_FACTOR;
        let mut desired = displacement.normalize_or_zero() * speed;
        if let Some(hit) = &ground_hit {
            desired += ground_altitude_correction(hit, speed);
        }

        let velocity = unit.steering.smooth_velocity(unit.velocity(), desired, dt);
        unit.set_velocity(velocity);
        true
    }
}
