use crate::models::{
    common::{math_utils, AgentStatus, Domain, Quat, Vec3},
    stats::StatBlock,
    steering::SteeringModel,
    tags::TagSet,
    traits::{IAgent, IMovable},
};
use tracing::{info, warn};

/// 敵ユニット
///
/// 敵1体につき1インスタンス。体力が尽きた場合、または目標が1つも存在しない場合に破壊されます。
/// 速度はステートが決定し、位置への反映は次の物理ステップ（`move_agent`）で行われます。
#[derive(Debug, Clone)]
pub struct Unit {
    pub id: String,
    pub position: Vec3,
    pub rotation: Quat,
    velocity: Vec3,
    /// 行動領域（宇宙/地上）
    pub domain: Domain,
    /// 性能パラメータ（不変）
    pub stats: StatBlock,
    /// 現在の目標ジェネレーターID
    pub target: Option<String>,
    pub status: AgentStatus,
    /// 観測用タグ
    pub tags: TagSet,
    /// 速度平滑化の状態
    pub steering: SteeringModel,
    /// 破壊理由（破壊済みの場合）
    pub destroy_reason: Option<String>,
}

impl Unit {
    pub fn new(id: String, position: Vec3, domain: Domain, stats: StatBlock) -> Self {
        Self {
            id,
            position,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            domain,
            stats,
            target: None,
            status: AgentStatus::Active,
            tags: TagSet::new(),
            steering: SteeringModel::default(),
            destroy_reason: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status == AgentStatus::Active
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// 前方軸
    pub fn forward(&self) -> Vec3 {
        math_utils::forward_of(self.rotation)
    }

    pub fn distance_to(&self, point: Vec3) -> f64 {
        self.position.distance(point)
    }

    /// 速度を0にし、平滑化状態もリセット
    pub fn stop(&mut self) {
        self.velocity = Vec3::ZERO;
        self.steering.reset();
    }

    /// 破壊要求
    ///
    /// 既に破壊済みの場合は何もしません。
    ///
    /// # 戻り値
    ///
    /// この呼び出しで破壊された場合のみtrue（破壊シグナルは1回だけ発行される）
    pub fn request_destroy(&mut self, reason: &str) -> bool {
        if self.status == AgentStatus::Destroyed {
            return false;
        }

        self.status = AgentStatus::Destroyed;
        self.velocity = Vec3::ZERO;
        self.target = None;
        self.destroy_reason = Some(reason.to_string());

        info!(
            unit_id = %self.id,
            position_x = self.position.x,
            position_y = self.position.y,
            position_z = self.position.z,
            reason = reason,
            "UNIT_DESTROYED: ユニットが破壊されました"
        );

        true
    }
}

impl IAgent for Unit {
    fn get_id(&self) -> String {
        self.id.clone()
    }

    fn is_active(&self) -> bool {
        self.is_alive()
    }
}

impl IMovable for Unit {
    fn move_agent(&mut self, dt: f64) {
        if self.is_alive() {
            self.position += self.velocity * dt;
        }
    }

    fn get_position(&self) -> Vec3 {
        self.position
    }

    fn get_velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        if math_utils::is_finite_vec(velocity) {
            self.velocity = velocity;
        } else {
            warn!(
                unit_id = %self.id,
                velocity = ?velocity,
                "NON_FINITE_VELOCITY: 非有限の速度を破棄しました"
            );
            self.stop();
        }
    }
}
