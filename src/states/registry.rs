use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::states::{
    attack_at_range::AttackAtRangeState, ground_attack::GroundAttackState,
    ground_move::GroundMoveState, move_to_target::MoveToTargetState, IState, StateError,
    StateKind,
};

/// ステート設定エントリ（宣言的設定の1行）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StateConfigEntry {
    /// ステート識別子（例: "MoveToTarget"）
    pub state: String,
    /// 開始時のデフォルトステートか
    #[serde(default)]
    pub is_default: bool,
}

impl StateConfigEntry {
    pub fn new(state: &str, is_default: bool) -> Self {
        Self {
            state: state.to_string(),
            is_default,
        }
    }
}

type StateConstructor = fn() -> Box<dyn IState>;

/// ステート種別からコンストラクタへの対応表
fn constructor_for(kind: StateKind) -> StateConstructor {
    match kind {
        StateKind::MoveToTarget => || -> Box<dyn IState> { Box::new(MoveToTargetState::new()) },
        StateKind::AttackAtRange => || -> Box<dyn IState> { Box::new(AttackAtRangeState::new()) },
        StateKind::GroundMove => || -> Box<dyn IState> { Box::new(GroundMoveState::new()) },
        StateKind::GroundAttack => || -> Box<dyn IState> { Box::new(GroundAttackState::new()) },
    }
}

/// ステートレジストリ
///
/// ユニット初期化時に設定から一度だけ構築され、以後は変更されません（インスタンス自身の内部状態を除く）。
/// 登録順を保持し、デフォルト未指定時は最初に登録されたステートが開始ステートになります。
pub struct StateRegistry {
    states: Vec<Box<dyn IState>>,
    default: Option<StateKind>,
}

impl std::fmt::Debug for StateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateRegistry")
            .field("states", &self.kinds())
            .field("default", &self.default)
            .finish()
    }
}

impl StateRegistry {
    /// 設定エントリからレジストリを構築
    ///
    /// 未知の識別子・重複エントリはConfigurationErrorとして記録し、スキップします。
    /// 複数のデフォルト指定がある場合は最初のものを採用します。
    ///
    /// # 引数
    ///
    /// * `owner_id` - ログ出力用のユニットID
    /// * `entries` - 設定エントリ
    ///
    /// # 戻り値
    ///
    /// 構築されたレジストリと、記録された設定エラーの一覧
    pub fn from_config(owner_id: &str, entries: &[StateConfigEntry]) -> (Self, Vec<StateError>) {
        let mut registry = Self {
            states: Vec::new(),
            default: None,
        };
        let mut errors = Vec::new();

        for entry in entries {
            let kind = match entry.state.parse::<StateKind>() {
                Ok(kind) => kind,
                Err(err) => {
                    error!(
                        unit_id = owner_id,
                        state = %entry.state,
                        error = %err,
                        "CONFIGURATION_ERROR: 未知のステートをスキップしました"
                    );
                    errors.push(err);
                    continue;
                }
            };

            if registry.contains(kind) {
                let err = StateError::DuplicateState(kind);
                error!(
                    unit_id = owner_id,
                    state = %kind,
                    error = %err,
                    "CONFIGURATION_ERROR: 重複したステートをスキップしました"
                );
                errors.push(err);
                continue;
            }

            registry.states.push(constructor_for(kind)());

            if entry.is_default {
                match registry.default {
                    None => registry.default = Some(kind),
                    Some(existing) => warn!(
                        unit_id = owner_id,
                        state = %kind,
                        default_state = %existing,
                        "CONFIGURATION_WARNING: デフォルトが複数指定されています（最初の指定を使用）"
                    ),
                }
            }

            debug!(unit_id = owner_id, state = %kind, is_default = entry.is_default, "STATE_REGISTERED");
        }

        if registry.states.is_empty() {
            warn!(unit_id = owner_id, "CONFIGURATION_WARNING: 有効なステートが1つもありません（待機状態）");
        }

        (registry, errors)
    }

    pub fn contains(&self, kind: StateKind) -> bool {
        self.states.iter().any(|s| s.kind() == kind)
    }

    pub fn get_mut(&mut self, kind: StateKind) -> Option<&mut (dyn IState + 'static)> {
        self.states.iter_mut().find(|s| s.kind() == kind).map(|s| &mut **s)
    }

    /// 明示的に指定されたデフォルトステート
    pub fn default_kind(&self) -> Option<StateKind> {
        self.default
    }

    /// 開始ステート（デフォルト、なければ最初に登録されたもの）
    pub fn initial_kind(&self) -> Option<StateKind> {
        self.default_kind().or_else(|| self.states.first().map(|s| s.kind()))
    }

    /// 登録順のステート種別
    pub fn kinds(&self) -> Vec<StateKind> {
        self.states.iter().map(|s| s.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_one_instance_per_entry() {
        let entries = vec![
            StateConfigEntry::new("MoveToTarget", false),
            StateConfigEntry::new("AttackAtRange", true),
        ];
        let (registry, errors) = StateRegistry::from_config("E001", &entries);

        assert!(errors.is_empty());
        assert_eq!(registry.kinds(), vec![StateKind::MoveToTarget, StateKind::AttackAtRange]);
        assert_eq!(registry.default_kind(), Some(StateKind::AttackAtRange));
        assert_eq!(registry.initial_kind(), Some(StateKind::AttackAtRange));
    }

    #[test]
    fn test_invalid_entries_are_skipped() {
        let entries = vec![
            StateConfigEntry::new("Patrol", true),
            StateConfigEntry::new("GroundMove", false),
            StateConfigEntry::new("GroundMove", false),
            StateConfigEntry::new("GroundAttack", false),
        ];
        let (registry, errors) = StateRegistry::from_config("E001", &entries);

        assert_eq!(
            errors,
            vec![
                StateError::UnknownState("Patrol".to_string()),
                StateError::DuplicateState(StateKind::GroundMove),
            ]
        );
        assert_eq!(registry.kinds(), vec![StateKind::GroundMove, StateKind::GroundAttack]);
        // デフォルト指定のエントリが無効だったため、最初の登録ステートで開始
        assert_eq!(registry.default_kind(), None);
        assert_eq!(registry.initial_kind(), Some(StateKind::GroundMove));
    }

    #[test]
    fn test_first_default_wins() {
        let entries = vec![
            StateConfigEntry::new("MoveToTarget", true),
            StateConfigEntry::new("AttackAtRange", true),
        ];
        let (registry, _) = StateRegistry::from_config("E001", &entries);
        assert_eq!(registry.default_kind(), Some(StateKind::MoveToTarget));
    }

    #[test]
    fn test_empty_config_has_no_initial_state() {
        let (registry, errors) = StateRegistry::from_config("E001", &[]);
        assert!(errors.is_empty());
        assert!(registry.is_empty());
        assert_eq!(registry.initial_kind(), None);
    }

    #[test]
    fn test_entry_from_yaml() {
        let yaml = "- state: GroundMove\n  is_default: true\n- state: GroundAttack\n";
        let entries: Vec<StateConfigEntry> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(entries[0], StateConfigEntry::new("GroundMove", true));
        assert_eq!(entries[1], StateConfigEntry::new("GroundAttack", false));
    }
}
