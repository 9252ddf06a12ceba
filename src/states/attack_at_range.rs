use tracing::{debug, trace};

use crate::models::{
    acquisition::live_target,
    common::{Domain, Vec3},
    traits::ISurfaceQuery,
};
use crate::states::{
    announce_enter, announce_exit, positioning::HoverPositioning, timer::AttackTimer, IState,
    StateContext, StateKind,
};

/// 目標へ弾体を受け渡す
///
/// 生成と発射の2段階で弾体システムへ渡し、以後の追跡は行いません。
pub(crate) fn fire_at(ctx: &mut StateContext, target_id: &str, target_position: Vec3) {
    let stats = &ctx.unit.stats;
    let handle = ctx
        .projectiles
        .spawn_projectile(stats.attack_damage, target_position, stats.projectile_speed);
    ctx.projectiles.launch(handle, target_position, target_id);

    debug!(
        unit_id = %ctx.unit.id,
        target_id = target_id,
        handle = handle.0,
        damage = stats.attack_damage,
        distance = ctx.unit.distance_to(target_position),
        "UNIT_FIRED: 弾体を発射しました"
    );
}

/// 射程内で攻撃（宇宙/ホバー）
///
/// 最適交戦距離のホバー位置を保持しながら、攻撃間隔ごとに弾体を発射します。
#[derive(Debug)]
pub struct AttackAtRangeState {
    positioning: HoverPositioning,
    timer: AttackTimer,
}

impl Default for AttackAtRangeState {
    fn default() -> Self {
        Self::new()
    }
}

impl AttackAtRangeState {
    pub fn new() -> Self {
        Self {
            positioning: HoverPositioning::new(Domain::Space),
            timer: AttackTimer::new(),
        }
    }

    pub fn timer(&self) -> &AttackTimer {
        &self.timer
    }
}

impl IState for AttackAtRangeState {
    fn kind(&self) -> StateKind {
        StateKind::AttackAtRange
    }

    fn enter(&mut self, ctx: &mut StateContext) {
        announce_enter(self.kind(), ctx);
        ctx.unit.stop();
        self.timer.reset();
    }

    fn update(&mut self, ctx: &mut StateContext) {
        let world = ctx.world;
        let Some(target) = live_target(ctx.unit, &world.generators) else {
            ctx.request_transition(StateKind::MoveToTarget);
            return;
        };
        if ctx.unit.distance_to(target.position) > ctx.unit.stats.attack_range {
            ctx.request_transition(StateKind::MoveToTarget);
            return;
        }

        let unit = &mut *ctx.unit;
        let ideal = self.positioning.ideal_position(
            unit.position,
            target.position,
            unit.stats.attack_range,
            &world.planet,
        );
        let moving = self.positioning.steer(unit, ideal, &world.planet, ctx.dt);
        trace!(unit_id = %unit.id, ideal = ?ideal, moving = moving, "HOVER_POSITIONING");

        let up = world.planet.gravity_up(unit.position);
        unit.rotation = unit.steering.face(
            unit.rotation,
            target.position - unit.position,
            up,
            unit.stats.rotation_speed,
            ctx.dt,
        );

        let interval = unit.stats.attack_interval();
        self.timer.advance(ctx.dt);
        if self.timer.ready(interval) {
            self.timer.consume(interval);
            fire_at(ctx, &target.id, target.position);
        }
    }

    fn exit(&mut self, ctx: &mut StateContext) {
        ctx.unit.stop();
        announce_exit(self.kind(), ctx);
    }
}
