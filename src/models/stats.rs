use serde::{Deserialize, Serialize};

/// ユニットの性能パラメータ
///
/// スポーン時に決定され、以後は変更されません。各ステートは読み取りのみ行います。
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct StatBlock {
    /// 移動速度（単位/秒）
    pub move_speed: f64,
    /// 旋回速度（度/秒）
    pub rotation_speed: f64,
    /// 攻撃射程
    pub attack_range: f64,
    /// 攻撃速度（発/秒）
    pub attack_speed: f64,
    /// 1発あたりのダメージ
    pub attack_damage: f64,
    /// 弾速
    pub projectile_speed: f64,
    /// 攻撃可能な正面コーンの全角（度、地上ユニットのみ使用）
    #[serde(default = "default_attack_angle")]
    pub attack_angle: f64,
}

fn default_attack_angle() -> f64 {
    60.0
}

impl Default for StatBlock {
    fn default() -> Self {
        Self {
            move_speed: 10.0,
            rotation_speed: 90.0,
            attack_range: 50.0,
            attack_speed: 1.0,
            attack_damage: 10.0,
            projectile_speed: 40.0,
            attack_angle: default_attack_angle(),
        }
    }
}

impl StatBlock {
    /// 発射間隔（秒）
    ///
    /// 攻撃速度が0以下の場合は無限大（発射しない）
    pub fn attack_interval(&self) -> f64 {
        if self.attack_speed > 0.0 {
            1.0 / self.attack_speed
        } else {
            f64::INFINITY
        }
    }

    /// 攻撃コーンの半角（度）
    pub fn attack_half_angle(&self) -> f64 {
        self.attack_angle * 0.5
    }

    /// パラメータの検証
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("move_speed", self.move_speed),
            ("rotation_speed", self.rotation_speed),
            ("attack_range", self.attack_range),
            ("attack_speed", self.attack_speed),
            ("attack_damage", self.attack_damage),
            ("projectile_speed", self.projectile_speed),
            ("attack_angle", self.attack_angle),
        ];

        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a finite non-negative number (got {})", name, value));
            }
        }

        if self.attack_range <= 0.0 {
            return Err("attack_range must be positive".to_string());
        }
        if self.attack_angle > 360.0 {
            return Err(format!("attack_angle {} exceeds 360 degrees", self.attack_angle));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attack_interval() {
        let stats = StatBlock { attack_speed: 2.0, ..StatBlock::default() };
        assert_eq!(stats.attack_interval(), 0.5);

        let idle = StatBlock { attack_speed: 0.0, ..StatBlock::default() };
        assert!(idle.attack_interval().is_infinite());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(StatBlock::default().validate().is_ok());

        let negative = StatBlock { move_speed: -1.0, ..StatBlock::default() };
        assert!(negative.validate().is_err());

        let nan = StatBlock { attack_damage: f64::NAN, ..StatBlock::default() };
        assert!(nan.validate().is_err());

        let zero_range = StatBlock { attack_range: 0.0, ..StatBlock::default() };
        assert!(zero_range.validate().is_err());
    }

    #[test]
    fn test_deserialize_with_default_angle() {
        let yaml = "move_speed: 5\nrotation_speed: 45\nattack_range: 30\nattack_speed: 2\nattack_damage: 3\nprojectile_speed: 20\n";
        let stats: StatBlock = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(stats.attack_angle, 60.0);
        assert_eq!(stats.attack_range, 30.0);
    }
}
