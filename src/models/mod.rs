// 基本的なデータ型と数学ユーティリティ
pub mod common;

// エージェントと協調オブジェクトの基本インターフェース（trait）定義
pub mod traits;

// ワールド（惑星・ジェネレーター）
pub mod planet;
pub mod generator;
pub mod world;

// ユニットとその構成要素
pub mod stats;
pub mod steering;
pub mod tags;
pub mod unit;
pub mod enemy;

// 目標捕捉と弾体の受け渡し
pub mod acquisition;
pub mod projectile;

// 便利な re-export
pub use common::*;
pub use traits::*;
pub use enemy::Enemy;
pub use generator::Generator;
pub use planet::Planet;
pub use projectile::ProjectileLedger;
pub use stats::StatBlock;
pub use unit::Unit;
pub use world::World;
