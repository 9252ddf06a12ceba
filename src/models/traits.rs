use crate::models::common::Vec3;
use crate::models::planet::SurfaceHit;
use crate::models::projectile::ProjectileHandle;

/// 全てのシミュレーションエージェントが実装する基本インターフェース
pub trait IAgent {
    /// エージェントIDの取得
    fn get_id(&self) -> String;

    /// エージェントがアクティブかどうか
    fn is_active(&self) -> bool;
}

/// 移動可能なエージェントのインターフェース
pub trait IMovable {
    /// 物理ステップでの移動処理（速度を位置へ積分）
    fn move_agent(&mut self, dt: f64);

    /// 現在位置の取得
    fn get_position(&self) -> Vec3;

    /// 現在速度の取得
    fn get_velocity(&self) -> Vec3;

    /// 位置の設定
    fn set_position(&mut self, position: Vec3);

    /// 速度の設定
    fn set_velocity(&mut self, velocity: Vec3);
}

/// 惑星表面クエリのインターフェース
pub trait ISurfaceQuery {
    /// 指定位置から惑星中心へ向けてキャストし、最初の交点を返す
    ///
    /// 交点が見つからない場合は`None`（呼び出し側はそのティックの補正を省略）
    fn query_surface(&self, position: Vec3) -> Option<SurfaceHit>;

    /// 重力基準の上方向（惑星中心から位置へのベクトル）
    fn gravity_up(&self, position: Vec3) -> Vec3;
}

/// 弾体システムへの受け渡しインターフェース
///
/// 発射後の弾体の追跡は行いません（撃ちっぱなし）。
pub trait IProjectileLauncher {
    /// 弾体の生成
    fn spawn_projectile(&mut self, damage: f64, target_position: Vec3, speed: f64) -> ProjectileHandle;

    /// 生成済み弾体の発射
    fn launch(&mut self, handle: ProjectileHandle, target_position: Vec3, target_id: &str);
}
