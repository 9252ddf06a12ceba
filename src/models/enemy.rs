use crate::models::{
    traits::{IAgent, IMovable, IProjectileLauncher},
    unit::Unit,
    world::World,
};
use crate::states::{StateConfigEntry, StateContext, StateError, StateKind, StateMachine};

/// 敵エージェント
///
/// ユニット本体とステート機械を束ね、シミュレーションループから毎ティック駆動されます。
/// ステート機械は最初の`update`（または明示的な`start`）で開始されます。
#[derive(Debug)]
pub struct Enemy {
    pub unit: Unit,
    machine: StateMachine,
    started: bool,
    config_errors: Vec<StateError>,
}

impl Enemy {
    pub fn new(unit: Unit, states: &[StateConfigEntry]) -> Self {
        let (machine, config_errors) = StateMachine::from_config(&unit.id, states);
        Self {
            unit,
            machine,
            started: false,
            config_errors,
        }
    }

    /// 構築時に記録された設定エラー
    pub fn config_errors(&self) -> &[StateError] {
        &self.config_errors
    }

    pub fn current_state(&self) -> Option<StateKind> {
        self.machine.current_kind()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// 開始ステートへ入る（2回目以降は何もしない）
    pub fn start(&mut self, world: &World, projectiles: &mut dyn IProjectileLauncher) {
        if self.is_started() {
            return;
        }
        self.started = true;

        let mut ctx = StateContext::new(&mut self.unit, world, projectiles, 0.0);
        self.machine.start(&mut ctx);
    }

    /// 毎フレームの判断処理（速度・向きの決定と遷移）
    pub fn update(&mut self, world: &World, projectiles: &mut dyn IProjectileLauncher, dt: f64) {
        if !self.is_started() {
            self.start(world, projectiles);
        }

        let mut ctx = StateContext::new(&mut self.unit, world, projectiles, dt);
        self.machine.update(&mut ctx);
    }

    /// 物理ステップ処理
    ///
    /// 前回の`update`で決定された速度を位置へ積分します。
    pub fn fixed_update(&mut self, world: &World, projectiles: &mut dyn IProjectileLauncher, dt: f64) {
        {
            let mut ctx = StateContext::new(&mut self.unit, world, projectiles, dt);
            self.machine.fixed_update(&mut ctx);
        }
        self.unit.move_agent(dt);
    }
}

impl IAgent for Enemy {
    fn get_id(&self) -> String {
        self.unit.get_id()
    }

    fn is_active(&self) -> bool {
        self.unit.is_active()
    }
}
