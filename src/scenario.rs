//! # Scenario モジュール
//!
//! シナリオYAMLの読み込みと検証を行います。
//!
//! シナリオは惑星、ジェネレーター、性能プロファイル、敵ユニット（ステート構成を含む）で構成されます。

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{Domain, StatBlock, Vec3};
use crate::states::StateConfigEntry;

/// シナリオメタデータ
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// シミュレーション設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// フレーム（Update）の時間刻み
    pub dt_s: f64,
    /// 物理ステップ（FixedUpdate）の時間刻み、省略時はdt_sと同じ
    #[serde(default)]
    pub fixed_dt_s: Option<f64>,
    pub t_max_s: f64,
}

impl SimulationConfig {
    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt_s.unwrap_or(self.dt_s)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Position3D {
    pub x_m: f64,
    pub y_m: f64,
    pub z_m: f64,
}

impl Position3D {
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x_m, self.y_m, self.z_m)
    }
}

fn default_planet_id() -> String {
    "P001".to_string()
}

fn default_true() -> bool {
    true
}

/// 惑星設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlanetConfig {
    #[serde(default = "default_planet_id")]
    pub id: String,
    pub center: Position3D,
    pub radius_m: f64,
    /// 表面コライダーがクエリ対象か
    #[serde(default = "default_true")]
    pub collision_enabled: bool,
    /// 表面クエリの最大キャスト距離（省略時は無制限）
    #[serde(default)]
    pub max_query_distance_m: Option<f64>,
}

/// ジェネレーター設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorConfig {
    pub id: String,
    pub pos: Position3D,
    /// 外部要因で破壊される時刻（省略時は破壊されない）
    #[serde(default)]
    pub destroyed_at_s: Option<f64>,
}

/// 敵ユニット設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnemyConfig {
    pub id: String,
    pub pos: Position3D,
    pub domain: Domain,
    /// `stat_profiles`のキー
    pub profile: String,
    /// ステート構成（宣言的設定）
    pub states: Vec<StateConfigEntry>,
}

/// シナリオ全体の設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub sim: SimulationConfig,
    pub planet: PlanetConfig,
    pub generators: Vec<GeneratorConfig>,
    pub stat_profiles: BTreeMap<String, StatBlock>,
    pub enemies: Vec<EnemyConfig>,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&contents, path)
    }

    /// YAML文字列からシナリオ設定を読み込み
    #[cfg(test)]
    pub fn from_yaml_str(contents: &str) -> Result<Self, ScenarioError> {
        Self::parse(contents, Path::new("<inline>"))
    }

    /// YAMLを解析して検証（`path`はエラー表示用）
    fn parse(contents: &str, path: &Path) -> Result<Self, ScenarioError> {
        let config: ScenarioConfig = serde_yaml::from_str(contents).map_err(|source| ScenarioError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;

        Ok(config)
    }

    /// 設定の検証
    ///
    /// ステート構成の誤り（未知の識別子など）はここでは検証しません。
    /// ユニット初期化時に設定エラーとして記録され、該当エントリのみスキップされます。
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !(self.sim.dt_s > 0.0) {
            return Err(ScenarioError::Validation("dt_s must be positive".to_string()));
        }
        if !(self.sim.fixed_dt() > 0.0) {
            return Err(ScenarioError::Validation("fixed_dt_s must be positive".to_string()));
        }
        if !(self.sim.t_max_s > 0.0) {
            return Err(ScenarioError::Validation("t_max_s must be positive".to_string()));
        }

        if !(self.planet.radius_m > 0.0) {
            return Err(ScenarioError::Validation("planet radius_m must be positive".to_string()));
        }
        if let Some(max) = self.planet.max_query_distance_m {
            if !(max > 0.0) {
                return Err(ScenarioError::Validation(
                    "planet max_query_distance_m must be positive".to_string(),
                ));
            }
        }

        let mut generator_ids = HashSet::new();
        for generator in &self.generators {
            if !generator_ids.insert(generator.id.as_str()) {
                return Err(ScenarioError::Validation(format!(
                    "duplicate generator id '{}'",
                    generator.id
                )));
            }
        }

        for (name, stats) in &self.stat_profiles {
            stats
                .validate()
                .map_err(|msg| ScenarioError::Validation(format!("stat profile '{}': {}", name, msg)))?;
        }

        let mut enemy_ids = HashSet::new();
        for enemy in &self.enemies {
            if !enemy_ids.insert(enemy.id.as_str()) {
                return Err(ScenarioError::Validation(format!("duplicate enemy id '{}'", enemy.id)));
            }
            if !self.stat_profiles.contains_key(&enemy.profile) {
                return Err(ScenarioError::Validation(format!(
                    "enemy '{}' refers to unknown stat profile '{}'",
                    enemy.id, enemy.profile
                )));
            }
        }

        Ok(())
    }

    /// 敵ユニットの性能パラメータ
    pub fn stats_for(&self, enemy: &EnemyConfig) -> Option<StatBlock> {
        self.stat_profiles.get(&enemy.profile).copied()
    }

    /// 組み込みのデモシナリオ
    ///
    /// 半径100の惑星上に3基のジェネレーターを置き、軌道上の宇宙ユニット2体と
    /// 地表の地上ユニット1体が攻撃します。1基は20秒時点で破壊されます。
    pub fn demo() -> Self {
        let pos = |x_m: f64, y_m: f64, z_m: f64| Position3D { x_m, y_m, z_m };
        let space_states = vec![
            StateConfigEntry::new("MoveToTarget", true),
            StateConfigEntry::new("AttackAtRange", false),
        ];
        let ground_states = vec![
            StateConfigEntry::new("GroundMove", true),
            StateConfigEntry::new("GroundAttack", false),
        ];

        let mut stat_profiles = BTreeMap::new();
        stat_profiles.insert(
            "fighter".to_string(),
            StatBlock {
                move_speed: 12.0,
                rotation_speed: 120.0,
                attack_range: 50.0,
                attack_speed: 2.0,
                attack_damage: 5.0,
                projectile_speed: 60.0,
                attack_angle: 60.0,
            },
        );
        stat_profiles.insert(
            "crawler".to_string(),
            StatBlock {
                move_speed: 6.0,
                rotation_speed: 60.0,
                attack_range: 20.0,
                attack_speed: 1.0,
                attack_damage: 15.0,
                projectile_speed: 30.0,
                attack_angle: 60.0,
            },
        );

        Self {
            meta: ScenarioMeta {
                version: "1.0".to_string(),
                name: "demo".to_string(),
                description: "Built-in orbit and surface assault".to_string(),
            },
            sim: SimulationConfig {
                dt_s: 0.1,
                fixed_dt_s: Some(0.05),
                t_max_s: 60.0,
            },
            planet: PlanetConfig {
                id: default_planet_id(),
                center: pos(0.0, 0.0, 0.0),
                radius_m: 100.0,
                collision_enabled: true,
                max_query_distance_m: None,
            },
            generators: vec![
                GeneratorConfig {
                    id: "G001".to_string(),
                    pos: pos(0.0, 100.0, 0.0),
                    destroyed_at_s: Some(20.0),
                },
                GeneratorConfig {
                    id: "G002".to_string(),
                    pos: pos(100.0, 0.0, 0.0),
                    destroyed_at_s: None,
                },
                GeneratorConfig {
                    id: "G003".to_string(),
                    pos: pos(0.0, 0.0, 100.0),
                    destroyed_at_s: None,
                },
            ],
            stat_profiles,
            enemies: vec![
                EnemyConfig {
                    id: "E001".to_string(),
                    pos: pos(0.0, 250.0, 0.0),
                    domain: Domain::Space,
                    profile: "fighter".to_string(),
                    states: space_states.clone(),
                },
                EnemyConfig {
                    id: "E002".to_string(),
                    pos: pos(200.0, 150.0, 0.0),
                    domain: Domain::Space,
                    profile: "fighter".to_string(),
                    states: space_states,
                },
                EnemyConfig {
                    id: "E003".to_string(),
                    pos: pos(60.6, 0.0, 80.8),
                    domain: Domain::Ground,
                    profile: "crawler".to_string(),
                    states: ground_states,
                },
            ],
        }
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("時間刻み: {:.3}秒 (物理: {:.3}秒)", self.sim.dt_s, self.sim.fixed_dt());
        println!("最大時間: {:.1}秒", self.sim.t_max_s);
        println!();

        println!("=== 惑星 ===");
        let c = self.planet.center;
        println!("中心: ({:.1}, {:.1}, {:.1})  半径: {:.1}", c.x_m, c.y_m, c.z_m, self.planet.radius_m);
        println!();

        println!("=== ジェネレーター ===");
        for generator in &self.generators {
            match generator.destroyed_at_s {
                Some(t) => println!("  {} (破壊予定: {:.1}秒)", generator.id, t),
                None => println!("  {}", generator.id),
            }
        }
        println!();

        println!("=== 敵ユニット ===");
        println!("総数: {}体", self.enemies.len());
        for enemy in &self.enemies {
            let states: Vec<&str> = enemy.states.iter().map(|s| s.state.as_str()).collect();
            println!(
                "  {}: {:?} / {} [{}]",
                enemy.id,
                enemy.domain,
                enemy.profile,
                states.join(", ")
            );
        }
    }
}

/// シナリオ読み込みエラー
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("シナリオファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("ファイル読み込みエラー {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML解析エラー {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("設定検証エラー: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
meta:
  version: "1.0"
  name: orbit
sim:
  dt_s: 0.1
  t_max_s: 30
planet:
  center: { x_m: 0, y_m: 0, z_m: 0 }
  radius_m: 100
generators:
  - id: G001
    pos: { x_m: 0, y_m: 100, z_m: 0 }
    destroyed_at_s: 12.5
stat_profiles:
  fighter:
    move_speed: 12
    rotation_speed: 120
    attack_range: 50
    attack_speed: 2
    attack_damage: 5
    projectile_speed: 60
enemies:
  - id: E001
    pos: { x_m: 0, y_m: 250, z_m: 0 }
    domain: space
    profile: fighter
    states:
      - state: MoveToTarget
        is_default: true
      - state: AttackAtRange
"#;

    #[test]
    fn test_parse_scenario() {
        let config = ScenarioConfig::from_yaml_str(YAML).unwrap();
        assert_eq!(config.sim.fixed_dt(), 0.1);
        assert!(config.planet.collision_enabled);
        assert_eq!(config.planet.max_query_distance_m, None);
        assert_eq!(config.generators[0].destroyed_at_s, Some(12.5));
        assert_eq!(config.enemies[0].domain, Domain::Space);
        assert_eq!(config.enemies[0].states[1], StateConfigEntry::new("AttackAtRange", false));

        let stats = config.stats_for(&config.enemies[0]).unwrap();
        assert_eq!(stats.attack_angle, 60.0);
    }

    #[test]
    fn test_unknown_profile_is_rejected() {
        let yaml = YAML.replace("profile: fighter", "profile: bomber");
        match ScenarioConfig::from_yaml_str(&yaml) {
            Err(ScenarioError::Validation(msg)) => assert!(msg.contains("bomber")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_time_step_is_rejected() {
        let yaml = YAML.replace("dt_s: 0.1", "dt_s: 0");
        assert!(matches!(
            ScenarioConfig::from_yaml_str(&yaml),
            Err(ScenarioError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_state_is_not_a_scenario_error() {
        let yaml = YAML.replace("state: AttackAtRange", "state: Patrol");
        assert!(ScenarioConfig::from_yaml_str(&yaml).is_ok());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ScenarioConfig::from_file("scenarios/does_not_exist.yaml"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_bundled_scenarios_load() {
        let orbit = ScenarioConfig::from_file("scenarios/scenario_orbit.yaml").unwrap();
        assert_eq!(orbit.enemies.len(), 3);
        assert_eq!(orbit.sim.fixed_dt(), 0.05);

        let surface = ScenarioConfig::from_file("scenarios/scenario_surface.yaml").unwrap();
        assert!(surface.enemies.iter().all(|e| e.domain == Domain::Ground));
        assert_eq!(surface.planet.max_query_distance_m, Some(500.0));
    }

    #[test]
    fn test_demo_is_valid() {
        let demo = ScenarioConfig::demo();
        assert!(demo.validate().is_ok());
        assert_eq!(demo.enemies.len(), 3);
    }
}
