use tracing::trace;

use crate::models::{
    acquisition::live_target,
    common::{math_utils, Domain},
    traits::ISurfaceQuery,
};
use crate::states::{
    announce_enter, announce_exit, attack_at_range::fire_at, positioning::HoverPositioning,
    timer::AttackTimer, IState, StateContext, StateKind,
};

/// 地表で攻撃
///
/// 射程内攻撃と同じ位置取りを地上モードで行い、加えて前方軸が目標方向から
/// 攻撃角の半分以内にある場合のみ発射します。コーン外では向きの調整を続け、発射を保留します。
#[derive(Debug)]
pub struct GroundAttackState {
    positioning: HoverPositioning,
    timer: AttackTimer,
}

impl Default for GroundAttackState {
    fn default() -> Self {
        Self::new()
    }
}

impl GroundAttackState {
    pub fn new() -> Self {
        Self {
            positioning: HoverPositioning::new(Domain::Ground),
            timer: AttackTimer::new(),
        }
    }
}

impl IState for GroundAttackState {
    fn kind(&self) -> StateKind {
        StateKind::GroundAttack
    }

    fn enter(&mut self, ctx: &mut StateContext) {
        announce_enter(self.kind(), ctx);
        ctx.unit.stop();
        self.timer.reset();
    }

    fn update(&mut self, ctx: &mut StateContext) {
        let world = ctx.world;
        let Some(target) = live_target(ctx.unit, &world.generators) else {
            ctx.request_transition(StateKind::GroundMove);
            return;
        };
        if ctx.unit.distance_to(target.position) > ctx.unit.stats.attack_range {
            ctx.request_transition(StateKind::GroundMove);
            return;
        }

        let unit = &mut *ctx.unit;
        let ideal = self.positioning.ideal_position(
            unit.position,
            target.position,
            unit.stats.attack_range,
            &world.planet,
        );
        self.positioning.steer(unit, ideal, &world.planet, ctx.dt);

        let to_target = target.position - unit.position;
        let (aim, up) = match world.planet.query_surface(unit.position) {
            Some(hit) => (math_utils::project_on_plane(to_target, hit.normal), hit.normal),
            None => (to_target, world.planet.gravity_up(unit.position)),
        };
        unit.rotation = unit
            .steering
            .face(unit.rotation, aim, up, unit.stats.rotation_speed, ctx.dt);

        let interval = unit.stats.attack_interval();
        self.timer.advance(ctx.dt);

        let off_axis = math_utils::angle_between_deg(unit.forward(), aim);
        if off_axis > unit.stats.attack_half_angle() {
            trace!(
                unit_id = %unit.id,
                off_axis_deg = off_axis,
                half_angle_deg = unit.stats.attack_half_angle(),
                "FIRE_WITHHELD: 攻撃コーン外のため発射を保留します"
            );
            self.timer.hold(interval);
            return;
        }

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
