use tracing::trace;

use crate::models::{
    acquisition::{ensure_target, live_target, TargetStatus},
    common::{math_utils, Vec3},
    traits::{IMovable, ISurfaceQuery},
};
use crate::states::{
    announce_enter, announce_exit,
    positioning::{ground_altitude_correction, ground_goal},
    IState, StateContext, StateKind,
};

/// 地表に沿って移動
///
/// 方向計算は全て局所表面の接平面へ投影し、目標点には地表からのオフセットを加えます。
/// 表面クエリに失敗したティックは重力基準の上方向で直進します。
#[derive(Debug, Default)]
pub struct GroundMoveState;

impl GroundMoveState {
    pub fn new() -> Self {
        Self
    }
}

impl IState for GroundMoveState {
    fn kind(&self) -> StateKind {
        StateKind::GroundMove
    }

    fn enter(&mut self, ctx: &mut StateContext) {
        announce_enter(self.kind(), ctx);

        if ctx.unit.target.is_none() {
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
        let speed = unit.stats.move_speed;
        let goal = ground_goal(&world.planet, target.position, unit.stats.attack_range);
        let offset = goal - unit.position;

        let (direction, up, correction) = match world.planet.query_surface(unit.position) {
            Some(hit) => (
                math_utils::tangent_direction(offset, hit.normal, unit.forward()),
                hit.normal,
                ground_altitude_correction(&hit, speed),
            ),
            None => {
                trace!(unit_id = %unit.id, "SURFACE_QUERY_MISS: 地表補正を省略します");
                (
                    offset.normalize_or_zero(),
                    world.planet.gravity_up(unit.position),
                    Vec3::ZERO,
                )
            }
        };

        let desired = direction * speed + correction;
        let velocity = unit.steering.smooth_velocity(unit.velocity(), desired, ctx.dt);
        unit.set_velocity(velocity);

        unit.rotation = unit
            .steering
            .face(unit.rotation, direction, up, unit.stats.rotation_speed, ctx.dt);

        if unit.distance_to(target.position) <= unit.stats.attack_range {
            ctx.request_transition(StateKind::GroundAttack);
        }
    }

    fn exit(&mut self, ctx: &mut StateContext) {
        ctx.unit.stop();
        announce_exit(self.kind(), ctx);
    }
}
