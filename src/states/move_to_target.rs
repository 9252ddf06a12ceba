use tracing::trace;

use crate::models::{
    acquisition::{ensure_target, live_target, TargetStatus},
    traits::{IMovable, ISurfaceQuery},
};
use crate::states::{announce_enter, announce_exit, IState, StateContext, StateKind};

/// 惑星表面からの最小クリアランスの攻撃射程に対する比率
pub const MIN_CLEARANCE_RATIO: f64 = 0.5;

/// 目標へ移動（宇宙）
///
/// 目標へ直線的に向かい、表面に近づきすぎた場合は表面から離れる方向へ進路を混ぜます。
/// 射程内に入ると`AttackAtRange`へ遷移します。
#[derive(Debug, Default)]
pub struct MoveToTargetState;

impl MoveToTargetState {
    pub fn new() -> Self {
        Self
    }
}

impl IState for MoveToTargetState {
    fn kind(&self) -> StateKind {
        StateKind::MoveToTarget
    }

    fn enter(&mut self, ctx: &mut StateContext) {
        announce_enter(self.kind(), ctx);

        if ctx.unit.target.is_none() {
            // 目標が見つからなければ何もしない
            ensure_target(ctx.unit, &ctx.world.generators);
        }
    }

    fn update(&mut self, ctx: &mut StateContext) {
        let world = ctx.world;
        if ensure_target(ctx.unit, &world.generators) == TargetStatus::Missing {
            return;
        }
        let Some(target) = live_target(ctx.unit, &world.generators) else {
            return;
        };

        let unit = &mut *ctx.unit;
        let to_target = target.position - unit.position;
        let distance = to_target.length();
        let direction = to_target.normalize_or_zero();

        // 表面クリアランスの確保
        let min_clearance = unit.stats.attack_range * MIN_CLEARANCE_RATIO;
        let mut move_direction = direction;
        if let Some(hit) = world.planet.query_surface(unit.position) {
            if hit.distance < min_clearance && min_clearance > 0.0 {
                let weight = 1.0 - hit.distance / min_clearance;
                move_direction = direction.lerp(hit.normal, weight).normalize_or_zero();
                trace!(
                    unit_id = %unit.id,
                    clearance = hit.distance,
                    min_clearance = min_clearance,
                    weight = weight,
                    "CLEARANCE_ADJUSTED"
                );
            }
        }

        let desired = move_direction * unit.stats.move_speed;
        let velocity = unit.steering.smooth_velocity(unit.velocity(), desired, ctx.dt);
        unit.set_velocity(velocity);

        // 向きは補正前の進行方向、上方向は重力基準
        let up = world.planet.gravity_up(unit.position);
        unit.rotation = unit
            .steering
            .face(unit.rotation, direction, up, unit.stats.rotation_speed, ctx.dt);

        if distance <= unit.stats.attack_range {
            ctx.request_transition(StateKind::AttackAtRange);
        }
    }

    fn exit(&mut self, ctx: &mut StateContext) {
        ctx.unit.stop();
        announce_exit(self.kind(), ctx);
    }
}
