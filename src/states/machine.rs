use tracing::{error, info, warn};

use crate::states::{
    registry::{StateConfigEntry, StateRegistry},
    IState, StateContext, StateError, StateKind,
};

/// ステート機械ホスト
///
/// 常に高々1つのステートのみがアクティブです。ステートからの遷移要求は、
/// そのステートの処理が完了した直後にホストが実行します（旧ステートのExit → 新ステートのEnter）。
#[derive(Debug)]
pub struct StateMachine {
    registry: StateRegistry,
    current: Option<StateKind>,
}

impl StateMachine {
    pub fn new(registry: StateRegistry) -> Self {
        Self {
            registry,
            current: None,
        }
    }

    /// 設定エントリからステート機械を構築
    ///
    /// 設定エラーは記録済みのため、呼び出し側は戻り値のエラー一覧を集計に使うのみです。
    pub fn from_config(owner_id: &str, entries: &[StateConfigEntry]) -> (Self, Vec<StateError>) {
        let (registry, errors) = StateRegistry::from_config(owner_id, entries);
        (Self::new(registry), errors)
    }

    /// 現在アクティブなステート
    pub fn current_kind(&self) -> Option<StateKind> {
        self.current
    }

    pub fn registry(&self) -> &StateRegistry {
        &self.registry
    }

    /// 開始ステートへ入る
    ///
    /// デフォルト指定がなければ最初に登録されたステート、1つも登録されていなければ待機します。
    pub fn start(&mut self, ctx: &mut StateContext) {
        match self.registry.initial_kind() {
            Some(kind) => {
                if let Err(err) = self.transition_to(kind, ctx) {
                    warn!(unit_id = %ctx.unit.id, error = %err, "STATE_START_FAILED");
                }
            }
            None => warn!(
                unit_id = %ctx.unit.id,
                "STATE_IDLE: 登録済みのステートがないため待機します"
            ),
        }
    }

    /// 指定ステートへ遷移
    ///
    /// 同じステートへの遷移でもExitとEnterを実行します。
    /// 未登録のステートが指定された場合はエラーを記録し、現在のステートを維持します。
    ///
    /// # 引数
    ///
    /// * `kind` - 遷移先のステート
    /// * `ctx` - ティックコンテキスト
    ///
    /// # 戻り値
    ///
    /// 遷移に成功した場合はOk、未登録の場合はTransitionError
    pub fn transition_to(&mut self, kind: StateKind, ctx: &mut StateContext) -> Result<(), StateError> {
        if !self.registry.contains(kind) {
            let err = StateError::UnregisteredTransition(kind);
            error!(
                unit_id = %ctx.unit.id,
                from = ?self.current,
                to = %kind,
                error = %err,
                "TRANSITION_ERROR: 未登録のステートへの遷移を無視しました"
            );
            return Err(err);
        }

        let previous = self.current.take();
        if let Some(state) = previous.and_then(|p| self.registry.get_mut(p)) {
            state.exit(ctx);
        }

        self.current = Some(kind);
        if let Some(state) = self.registry.get_mut(kind) {
            state.enter(ctx);
        }

        info!(
            unit_id = %ctx.unit.id,
            from = ?previous,
            to = %kind,
            target_id = ?ctx.unit.target,
            "STATE_TRANSITION: ステートが遷移しました"
        );

        Ok(())
    }

    /// 毎フレームの判断処理
    pub fn update(&mut self, ctx: &mut StateContext) {
        self.dispatch(ctx, |state, ctx| state.update(ctx));
    }

    /// 物理ステップの処理
    pub fn fixed_update(&mut self, ctx: &mut StateContext) {
        self.dispatch(ctx, |state, ctx| state.fixed_update(ctx));
    }

    /// 現在のステートへコールバックを転送し、保留中の遷移要求を実行
    fn dispatch<F>(&mut self, ctx: &mut StateContext, callback: F)
    where
        F: FnOnce(&mut (dyn IState + 'static), &mut StateContext),
    {
        if !ctx.unit.is_alive() {
            return;
        }
        let Some(kind) = self.current else {
            return;
        };
        let Some(state) = self.registry.get_mut(kind) else {
            return;
        };

        callback(state, ctx);

        // 破壊されたユニットでは遷移しない（Exitは保証されない）
        if let Some(next) = ctx.take_request() {
            if ctx.unit.is_alive() {
                let _ = self.transition_to(next, ctx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{common::Vec3, tags::TagEvent, traits::IMovable, unit::Unit, world::World};
    use crate::states::test_support::*;

    fn space_config() -> Vec<StateConfigEntry> {
        vec![
            StateConfigEntry::new("MoveToTarget", true),
            StateConfigEntry::new("AttackAtRange", false),
        ]
    }

    fn started(unit: &mut Unit, world: &World, entries: &[StateConfigEntry]) -> StateMachine {
        let (mut machine, _) = StateMachine::from_config(&unit.id.clone(), entries);
        let mut ledger = ledger();
        let mut ctx = StateContext::new(unit, world, &mut ledger, 0.1);
        machine.start(&mut ctx);
        machine
    }

    #[test]
    fn test_start_enters_default_state() {
        let world = world_with(&[("G1", Vec3::new(0.0, 300.0, 0.0))]);
        let mut unit = space_unit(Vec3::new(0.0, 200.0, 0.0));
        let entries = vec![
            StateConfigEntry::new("AttackAtRange", false),
            StateConfigEntry::new("MoveToTarget", true),
        ];

        let machine = started(&mut unit, &world, &entries);
        assert_eq!(machine.current_kind(), Some(StateKind::MoveToTarget));
        assert!(unit.tags.contains("Enemy.State.MoveToTarget"));
        assert_eq!(unit.target.as_deref(), Some("G1"));
    }

    #[test]
    fn test_start_without_states_stays_idle() {
        let world = world_with(&[("G1", Vec3::new(0.0, 300.0, 0.0))]);
        let mut unit = space_unit(Vec3::new(0.0, 200.0, 0.0));

        let mut machine = started(&mut unit, &world, &[]);
        assert_eq!(machine.current_kind(), None);

        let mut ledger = ledger();
        let mut ctx = StateContext::new(&mut unit, &world, &mut ledger, 0.1);
        machine.update(&mut ctx);
        assert_eq!(machine.current_kind(), None);
    }

    #[test]
    fn test_unregistered_transition_keeps_current_state() {
        let world = world_with(&[("G1", Vec3::new(0.0, 300.0, 0.0))]);
        let mut unit = space_unit(Vec3::new(0.0, 200.0, 0.0));
        let mut machine = started(&mut unit, &world, &space_config());

        let mut ledger = ledger();
        let mut ctx = StateContext::new(&mut unit, &world, &mut ledger, 0.1);
        let result = machine.transition_to(StateKind::GroundAttack, &mut ctx);

        assert_eq!(result, Err(StateError::UnregisteredTransition(StateKind::GroundAttack)));
        assert_eq!(machine.current_kind(), Some(StateKind::MoveToTarget));
        assert!(unit.tags.contains("Enemy.State.MoveToTarget"));
    }

    #[test]
    fn test_exit_completes_before_enter() {
        let world = world_with(&[("G1", Vec3::new(0.0, 300.0, 0.0))]);
        let mut unit = space_unit(Vec3::new(0.0, 200.0, 0.0));
        let mut machine = started(&mut unit, &world, &space_config());
        unit.tags.clear_journal();
        unit.set_velocity(Vec3::new(0.0, 5.0, 0.0));

        let mut ledger = ledger();
        let mut ctx = StateContext::new(&mut unit, &world, &mut ledger, 0.1);
        machine.transition_to(StateKind::AttackAtRange, &mut ctx).unwrap();

        assert_eq!(
            unit.tags.journal(),
            &[
                TagEvent::Removed("Enemy.State.MoveToTarget".to_string()),
                TagEvent::Added("Enemy.State.AttackAtRange".to_string()),
            ]
        );
        assert_eq!(unit.velocity(), Vec3::ZERO);
        assert_eq!(unit.tags.matching("Enemy.State").len(), 1);
    }

    #[test]
    fn test_self_transition_runs_exit_and_enter() {
        let world = world_with(&[("G1", Vec3::new(0.0, 300.0, 0.0))]);
        let mut unit = space_unit(Vec3::new(0.0, 200.0, 0.0));
        let mut machine = started(&mut unit, &world, &space_config());
        unit.tags.clear_journal();

        let mut ledger = ledger();
        let mut ctx = StateContext::new(&mut unit, &world, &mut ledger, 0.1);
        machine.transition_to(StateKind::MoveToTarget, &mut ctx).unwrap();

        assert_eq!(
            unit.tags.journal(),
            &[
                TagEvent::Removed("Enemy.State.MoveToTarget".to_string()),
                TagEvent::Added("Enemy.State.MoveToTarget".to_string()),
            ]
        );
        assert_eq!(machine.current_kind(), Some(StateKind::MoveToTarget));
    }

    /// 射程50、目標から100のユニットは移動ステート。40まで近づくと1ティック以内に攻撃ステート
    #[test]
    fn test_range_gates_move_and_attack() {
        let world = world_with(&[("G1", Vec3::new(0.0, 300.0, 0.0))]);
        let mut unit = space_unit(Vec3::new(0.0, 200.0, 0.0));
        let mut machine = started(&mut unit, &world, &space_config());
        let mut ledger = ledger();

        {
            let mut ctx = StateContext::new(&mut unit, &world, &mut ledger, 0.1);
            machine.update(&mut ctx);
        }
        assert_eq!(machine.current_kind(), Some(StateKind::MoveToTarget));

        unit.position = Vec3::new(0.0, 260.0, 0.0);
        {
            let mut ctx = StateContext::new(&mut unit, &world, &mut ledger, 0.1);
            machine.update(&mut ctx);
        }
        assert_eq!(machine.current_kind(), Some(StateKind::AttackAtRange));

        unit.position = Vec3::new(0.0, 200.0, 0.0);
        {
            let mut ctx = StateContext::new(&mut unit, &world, &mut ledger, 0.1);
            machine.update(&mut ctx);
        }
        assert_eq!(machine.current_kind(), Some(StateKind::MoveToTarget));
    }

    #[test]
    fn test_no_generators_destroys_unit_once() {
        let world = world_with(&[]);
        let mut unit = space_unit(Vec3::new(0.0, 200.0, 0.0));
        let mut machine = started(&mut unit, &world, &space_config());
        let mut ledger = ledger();

        // 開始時点で既に破壊済み
        assert!(!unit.is_alive());
        let reason = unit.destroy_reason.clone();

        for _ in 0..3 {
            let mut ctx = StateContext::new(&mut unit, &world, &mut ledger, 0.1);
            machine.update(&mut ctx);
        }
        assert!(!unit.request_destroy("again"));
        assert_eq!(unit.destroy_reason, reason);
    }

    #[test]
    fn test_dead_unit_is_not_updated() {
        let world = world_with(&[("G1", Vec3::new(0.0, 240.0, 0.0))]);
        let mut unit = space_unit(Vec3::new(0.0, 200.0, 0.0));
        let mut machine = started(&mut unit, &world, &space_config());
        unit.request_destroy("killed");

        let mut ledger = ledger();
        let mut ctx = StateContext::new(&mut unit, &world, &mut ledger, 0.1);
        machine.update(&mut ctx);
        assert_eq!(machine.current_kind(), Some(StateKind::MoveToTarget));
        assert_eq!(ctx.pending_request(), None);
    }
}
