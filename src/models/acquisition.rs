use crate::models::{
    common::Vec3,
    generator::{Generator, GeneratorRegistry},
    unit::Unit,
};
use tracing::debug;

/// 目標捕捉の結果
#[derive(Debug, Clone, PartialEq)]
pub enum Acquisition {
    /// 最も近い生存ジェネレーター
    Found { id: String, position: Vec3, distance: f64 },
    /// 生存ジェネレーターが存在しない
    NoTargets,
}

/// ユニットの目標保持状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    /// 既存の目標が有効
    Held,
    /// 新しい目標を捕捉した
    Acquired,
    /// 目標なし（ユニットは破壊される）
    Missing,
}

/// 最も近い生存ジェネレーターを探索
///
/// 破壊済みのジェネレーターは除外します。距離が等しい場合は登録順で先のものを返します。
pub fn acquire_nearest(registry: &GeneratorRegistry, position: Vec3) -> Acquisition {
    let mut best: Option<(&str, Vec3, f64)> = None;

    for generator in registry.live() {
        let distance = position.distance(generator.position);
        if best.is_none_or(|(_, _, d)| distance < d) {
            best = Some((generator.id.as_str(), generator.position, distance));
        }
    }

    match best {
        Some((id, position, distance)) => Acquisition::Found {
            id: id.to_string(),
            position,
            distance,
        },
        None => Acquisition::NoTargets,
    }
}

/// ユニットが保持している生存中の目標
///
/// 目標なし、または破壊済みの場合は`None`
pub fn live_target<'w>(unit: &Unit, registry: &'w GeneratorRegistry) -> Option<&'w Generator> {
    let id = unit.target.as_deref()?;
    registry.get(id).filter(|g| !g.is_destroyed())
}

/// ユニットが有効な目標を保持していることを保証
///
/// 目標がない、または破壊済みの場合は再捕捉します。
/// 目標が1つも存在しない場合はユニットを破壊します（再試行可能なエラーではなく終端条件）。
///
/// # 引数
///
/// * `unit` - 要求元ユニット
/// * `registry` - ジェネレーターレジストリ
///
/// # 戻り値
///
/// 目標の保持状態
pub fn ensure_target(unit: &mut Unit, registry: &GeneratorRegistry) -> TargetStatus {
    if !unit.is_alive() {
        return TargetStatus::Missing;
    }

    if let Some(id) = &unit.target {
        if registry.is_live(id) {
            return TargetStatus::Held;
        }
    }

    match acquire_nearest(registry, unit.position) {
        Acquisition::Found { id, distance, .. } => {
            debug!(
                unit_id = %unit.id,
                previous_target = ?unit.target,
                target_id = %id,
                distance = distance,
                "TARGET_ACQUIRED: 目標を捕捉しました"
            );
            unit.target = Some(id);
            TargetStatus::Acquired
        }
        Acquisition::NoTargets => {
            unit.target = None;
            unit.request_destroy("no live generators remain");
            TargetStatus::Missing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{common::Domain, generator::Generator, stats::StatBlock};

    fn registry() -> GeneratorRegistry {
        let mut registry = GeneratorRegistry::new();
        registry.register(Generator::new("G1".to_string(), Vec3::new(100.0, 0.0, 0.0)));
        registry.register(Generator::new("G2".to_string(), Vec3::new(30.0, 0.0, 0.0)));
        registry.register(Generator::new("G3".to_string(), Vec3::new(-30.0, 0.0, 0.0)));
        registry
    }

    fn unit() -> Unit {
        Unit::new("E001".to_string(), Vec3::ZERO, Domain::Space, StatBlock::default())
    }

    #[test]
    fn test_acquire_nearest_prefers_first_on_tie() {
        match acquire_nearest(&registry(), Vec3::ZERO) {
            Acquisition::Found { id, distance, .. } => {
                assert_eq!(id, "G2");
                assert_eq!(distance, 30.0);
            }
            Acquisition::NoTargets => panic!("expected a target"),
        }
    }

    #[test]
    fn test_acquire_skips_destroyed() {
        let mut registry = registry();
        registry.destroy("G2");
        registry.destroy("G3");
        match acquire_nearest(&registry, Vec3::ZERO) {
            Acquisition::Found { id, .. } => assert_eq!(id, "G1"),
            Acquisition::NoTargets => panic!("expected a target"),
        }
    }

    #[test]
    fn test_ensure_target_reacquires_after_destruction() {
        let mut registry = registry();
        let mut u = unit();

        assert_eq!(ensure_target(&mut u, &registry), TargetStatus::Acquired);
        assert_eq!(u.target.as_deref(), Some("G2"));
        assert_eq!(ensure_target(&mut u, &registry), TargetStatus::Held);

        registry.destroy("G2");
        assert!(live_target(&u, &registry).is_none());
        assert_eq!(ensure_target(&mut u, &registry), TargetStatus::Acquired);
        assert_eq!(u.target.as_deref(), Some("G3"));
        assert_eq!(live_target(&u, &registry).map(|g| g.id.as_str()), Some("G3"));
    }

    #[test]
    fn test_no_targets_destroys_unit_exactly_once() {
        let mut registry = registry();
        for id in ["G1", "G2", "G3"] {
            registry.destroy(id);
        }

        let mut u = unit();
        assert_eq!(ensure_target(&mut u, &registry), TargetStatus::Missing);
        assert!(!u.is_alive());
        assert!(u.destroy_reason.is_some());

        // 繰り返し呼び出しても破壊シグナルは再発行されない
        assert_eq!(ensure_target(&mut u, &registry), TargetStatus::Missing);
        assert!(!u.request_destroy("again"));
    }
}
