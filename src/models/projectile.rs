use crate::models::{common::Vec3, traits::IProjectileLauncher};
use std::collections::HashMap;
use tracing::{debug, warn};

/// 弾体ハンドル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectileHandle(pub u64);

/// 発射記録
#[derive(Debug, Clone)]
pub struct LaunchRecord {
    pub handle: ProjectileHandle,
    pub damage: f64,
    pub speed: f64,
    pub target_id: String,
    pub target_position: Vec3,
}

/// 生成済み・未発射の弾体
#[derive(Debug, Clone, Copy)]
struct PendingProjectile {
    damage: f64,
    speed: f64,
}

/// 弾体受け渡しの記録実装
///
/// 弾体の飛翔・ダメージ解決は外部システムの責務のため、ここでは受け渡しを記録するのみです。
#[derive(Debug, Default)]
pub struct ProjectileLedger {
    next_handle: u64,
    pending: HashMap<ProjectileHandle, PendingProjectile>,
    launches: Vec<LaunchRecord>,
}

impl ProjectileLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn launches(&self) -> &[LaunchRecord] {
        &self.launches
    }

    pub fn launch_count(&self) -> usize {
        self.launches.len()
    }

    /// 特定ターゲットへの発射数
    pub fn launches_at(&self, target_id: &str) -> usize {
        self.launches.iter().filter(|l| l.target_id == target_id).count()
    }
}

impl IProjectileLauncher for ProjectileLedger {
    fn spawn_projectile(&mut self, damage: f64, _target_position: Vec3, speed: f64) -> ProjectileHandle {
        self.next_handle += 1;
        let handle = ProjectileHandle(self.next_handle);
        self.pending.insert(handle, PendingProjectile { damage, speed });
        handle
    }

    fn launch(&mut self, handle: ProjectileHandle, target_position: Vec3, target_id: &str) {
        let Some(projectile) = self.pending.remove(&handle) else {
            warn!(handle = handle.0, "PROJECTILE_UNKNOWN: 未生成の弾体ハンドルです");
            return;
        };

        debug!(
            handle = handle.0,
            target_id = target_id,
            damage = projectile.damage,
            speed = projectile.speed,
            "PROJECTILE_LAUNCHED"
        );

        self.launches.push(LaunchRecord {
            handle,
            damage: projectile.damage,
            speed: projectile.speed,
            target_id: target_id.to_string(),
            target_position,
        });
    }
}
