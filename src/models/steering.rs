//! # Steering モジュール
//!
//! 目標方向を平滑化された速度へ変換し、指定された上方向に沿った向きを計算します。
//!
//! - **速度平滑化**: 臨界減衰による目標速度への接近（行き過ぎなし）
//! - **向き制御**: 重力基準または表面法線を上方向とするルック回転へ、
//!   旋回速度で制限しながら回転

use crate::models::common::{math_utils, Quat, Vec3};

/// 速度平滑化のデフォルト時定数（秒）
pub const DEFAULT_SMOOTH_TIME: f64 = 0.3;

/// ステアリングモデル
///
/// 平滑化の内部状態（速度の変化率）をユニットごとに保持します。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringModel {
    /// 目標速度へ到達するおおよその時間（秒）
    pub smooth_time: f64,
    /// 平滑化の内部速度（加速度に相当）
    pub smoothing_velocity: Vec3,
}

impl Default for SteeringModel {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTH_TIME)
    }
}

impl SteeringModel {
    pub fn new(smooth_time: f64) -> Self {
        Self {
            smooth_time: smooth_time.max(1e-4),
            smoothing_velocity: Vec3::ZERO,
        }
    }

    /// 平滑化状態のリセット
    pub fn reset(&mut self) {
        self.smoothing_velocity = Vec3::ZERO;
    }

    /// 現在速度から目標速度へ臨界減衰で接近した速度を返す
    ///
    /// # 引数
    ///
    /// * `current` - 現在の速度
    /// * `target` - 目標速度（方向 × 速さ）
    /// * `dt` - 時間ステップ（秒）
    ///
    /// # 戻り値
    ///
    /// 平滑化された速度。目標を行き過ぎず、非有限値にはなりません。
    pub fn smooth_velocity(&mut self, current: Vec3, target: Vec3, dt: f64) -> Vec3 {
        if dt <= 0.0 {
            return current;
        }

        let omega = 2.0 / self.smooth_time;
        let x = omega * dt;
        let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

        let change = current - target;
        let temp = (self.smoothing_velocity + change * omega) * dt;
        self.smoothing_velocity = (self.smoothing_velocity - temp * omega) * decay;

        let mut output = target + (change + temp) * decay;

        // 行き過ぎ防止
        if (target - current).dot(output - target) > 0.0 {
            output = target;
            self.smoothing_velocity = Vec3::ZERO;
        }

        if !math_utils::is_finite_vec(output) || !math_utils::is_finite_vec(self.smoothing_velocity) {
            self.reset();
            return Vec3::ZERO;
        }

        output
    }

    /// 上方向を保ちつつ前方へ向く回転を、旋回速度で制限して返す
    ///
    /// 前方向がゼロの場合は現在の回転を維持します。
    pub fn face(&self, current: Quat, forward: Vec3, up: Vec3, rotation_speed: f64, dt: f64) -> Quat {
        if forward.length_squared() < math_utils::EPSILON {
            return current;
        }

        let desired = math_utils::look_rotation(forward, up);
        math_utils::rotate_towards(current, desired, rotation_speed * dt)
    }
}
