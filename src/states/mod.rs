//! # States モジュール
//!
//! 敵ユニットの行動を駆動するデータ駆動型の有限状態機械を提供します。
//!
//! ## 構成
//!
//! - **ステート基底**: 全ステートが実装する`IState`（Enter/Update/FixedUpdate/Exit）
//! - **レジストリ**: 設定から一度だけ構築されるステート種別→インスタンスの対応表
//! - **ホスト**: 現在のステートを保持し、毎ティックのコールバックと遷移を実行
//! - **具象ステート**: 宇宙用（移動/攻撃）と地上用（移動/攻撃）
//!
//! ## 遷移
//!
//! ```text
//! {MoveToTarget ⇄ AttackAtRange}  または  {GroundMove ⇄ GroundAttack}
//! ```
//!
//! 遷移条件は目標との距離と攻撃射程の比較のみです。遷移時は必ず旧ステートの
//! Exitが完了してから新ステートのEnterが開始されます。

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::models::{traits::IProjectileLauncher, unit::Unit, world::World};

pub mod attack_at_range;
pub mod ground_attack;
pub mod ground_move;
pub mod machine;
pub mod move_to_target;
pub mod positioning;
pub mod registry;
pub mod timer;

pub use machine::StateMachine;
pub use registry::{StateConfigEntry, StateRegistry};

/// ステートタグの接頭辞
pub const STATE_TAG_PREFIX: &str = "Enemy.State";

/// ステート種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    /// 目標へ移動（宇宙）
    MoveToTarget,
    /// 射程内で攻撃（宇宙/ホバー）
    AttackAtRange,
    /// 地表に沿って移動
    GroundMove,
    /// 地表で攻撃（正面コーン判定あり）
    GroundAttack,
}

impl StateKind {
    pub const ALL: [StateKind; 4] = [
        StateKind::MoveToTarget,
        StateKind::AttackAtRange,
        StateKind::GroundMove,
        StateKind::GroundAttack,
    ];

    /// 設定ファイルで使用する識別子
    pub fn identifier(&self) -> &'static str {
        match self {
            StateKind::MoveToTarget => "MoveToTarget",
            StateKind::AttackAtRange => "AttackAtRange",
            StateKind::GroundMove => "GroundMove",
            StateKind::GroundAttack => "GroundAttack",
        }
    }

    /// 観測用タグ
    pub fn tag(&self) -> String {
        format!("{}.{}", STATE_TAG_PREFIX, self.identifier())
    }

    /// 攻撃系ステートかどうか
    pub fn is_attack(&self) -> bool {
        matches!(self, StateKind::AttackAtRange | StateKind::GroundAttack)
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for StateKind {
    type Err = StateError;

    /// 大文字小文字と区切り文字（`_`, `-`）を無視して解析
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        StateKind::ALL
            .into_iter()
            .find(|kind| kind.identifier().to_ascii_lowercase() == normalized)
            .ok_or_else(|| StateError::UnknownState(s.to_string()))
    }
}

/// ステート機械のエラー
///
/// いずれも記録されるのみで、ホストを停止させることはありません。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// 設定エントリが未知のステートを指している（ConfigurationError）
    #[error("unknown state identifier '{0}'")]
    UnknownState(String),
    /// 同じステートが重複して設定された（ConfigurationError）
    #[error("state {0} is configured more than once")]
    DuplicateState(StateKind),
    /// 未登録のステートへの遷移要求（TransitionError）
    #[error("state {0} is not registered for this unit")]
    UnregisteredTransition(StateKind),
}

/// ステートへ渡される1ティック分のコンテキスト
pub struct StateContext<'a> {
    /// 操作対象のユニット（現在アクティブなステートのみが変更する）
    pub unit: &'a mut Unit,
    /// 惑星とジェネレーター（読み取り専用）
    pub world: &'a World,
    /// 弾体システムへの受け渡し先
    pub projectiles: &'a mut dyn IProjectileLauncher,
    /// 時間ステップ（秒）
    pub dt: f64,
    requested: Option<StateKind>,
}

impl<'a> StateContext<'a> {
    pub fn new(
        unit: &'a mut Unit,
        world: &'a World,
        projectiles: &'a mut dyn IProjectileLauncher,
        dt: f64,
    ) -> Self {
        Self {
            unit,
            world,
            projectiles,
            dt,
            requested: None,
        }
    }

    /// ホストへ遷移を要求（ステートの処理完了後にホストが実行）
    pub fn request_transition(&mut self, kind: StateKind) {
        self.requested = Some(kind);
    }

    /// 保留中の遷移要求を取り出す
    pub fn take_request(&mut self) -> Option<StateKind> {
        self.requested.take()
    }

    pub fn pending_request(&self) -> Option<StateKind> {
        self.requested
    }
}

/// 全ての行動ステートが実装する基本インターフェース
pub trait IState {
    /// ステート種別
    fn kind(&self) -> StateKind;

    /// ステート開始時の処理
    fn enter(&mut self, ctx: &mut StateContext) {
        announce_enter(self.kind(), ctx);
    }

    /// 毎フレームの判断処理
    fn update(&mut self, ctx: &mut StateContext);

    /// 物理ステップの処理（デフォルトは何もしない）
    fn fixed_update(&mut self, _ctx: &mut StateContext) {}

    /// ステート終了時の処理
    fn exit(&mut self, ctx: &mut StateContext) {
        announce_exit(self.kind(), ctx);
    }
}

/// ステート開始をタグで通知
pub fn announce_enter(kind: StateKind, ctx: &mut StateContext) {
    ctx.unit.tags.add(&kind.tag());
}

/// ステート終了をタグで通知
pub fn announce_exit(kind: StateKind, ctx: &mut StateContext) {
    ctx.unit.tags.remove(&kind.tag());
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_kind_from_str() {
        assert_eq!("MoveToTarget".parse::<StateKind>(), Ok(StateKind::MoveToTarget));
        assert_eq!("attack_at_range".parse::<StateKind>(), Ok(StateKind::AttackAtRange));
        assert_eq!("ground-move".parse::<StateKind>(), Ok(StateKind::GroundMove));
        assert_eq!(
            "Patrol".parse::<StateKind>(),
            Err(StateError::UnknownState("Patrol".to_string()))
        );
    }

    #[test]
    fn test_state_tag() {
        assert_eq!(StateKind::GroundAttack.tag(), "Enemy.State.GroundAttack");
        assert!(StateKind::GroundAttack.is_attack());
        assert!(!StateKind::MoveToTarget.is_attack());
    }
}
