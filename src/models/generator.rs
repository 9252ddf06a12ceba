use crate::models::common::{AgentStatus, Vec3};
use crate::models::traits::IAgent;
use tracing::info;

/// ジェネレーター（敵ユニットが探索・攻撃する目標構造物）
///
/// ユニットからは位置と破壊フラグのみ参照されます。
#[derive(Debug, Clone)]
pub struct Generator {
    pub id: String,
    pub position: Vec3,
    pub status: AgentStatus,
}

impl Generator {
    pub fn new(id: String, position: Vec3) -> Self {
        Self {
            id,
            position,
            status: AgentStatus::Active,
        }
    }

    /// 破壊済みかどうか
    pub fn is_destroyed(&self) -> bool {
        self.status == AgentStatus::Destroyed
    }

    /// 破壊状態にする
    pub fn destroy(&mut self) {
        if self.status != AgentStatus::Destroyed {
            self.status = AgentStatus::Destroyed;
            info!(
                generator_id = %self.id,
                position_x = self.position.x,
                position_y = self.position.y,
                position_z = self.position.z,
                "GENERATOR_DESTROYED: ジェネレーターが破壊されました"
            );
        }
    }
}

impl IAgent for Generator {
    fn get_id(&self) -> String {
        self.id.clone()
    }

    fn is_active(&self) -> bool {
        !self.is_destroyed()
    }
}

/// ジェネレーターの空間レジストリ
///
/// ワールドコンテキストが所有し、目標捕捉処理へ明示的に渡されます。
/// 登録順を保持し、距離が等しい場合は先に登録されたものを優先します。
#[derive(Debug, Clone, Default)]
pub struct GeneratorRegistry {
    generators: Vec<Generator>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// ジェネレーターを登録
    pub fn register(&mut self, generator: Generator) {
        self.generators.push(generator);
    }

    pub fn get(&self, id: &str) -> Option<&Generator> {
        self.generators.iter().find(|g| g.id == id)
    }

    /// IDのジェネレーターが存在し、かつ破壊されていないか
    pub fn is_live(&self, id: &str) -> bool {
        self.get(id).is_some_and(|g| !g.is_destroyed())
    }

    /// ジェネレーターを破壊（存在しない場合はfalse）
    pub fn destroy(&mut self, id: &str) -> bool {
        match self.generators.iter_mut().find(|g| g.id == id) {
            Some(generator) => {
                generator.destroy();
                true
            }
            None => false,
        }
    }

    /// 生存しているジェネレーター
    pub fn live(&self) -> impl Iterator<Item = &Generator> {
        self.generators.iter().filter(|g| !g.is_destroyed())
    }

    pub fn live_count(&self) -> usize {
        self.live().count()
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Generator> {
        self.generators.iter()
    }
}
