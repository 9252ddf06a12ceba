//! # Simulation モジュール
//!
//! 惑星防衛シミュレーションのメインループを提供します。
//!
//! 各フレームで敵ユニットのステート機械を駆動し、ジェネレーターの破壊予定を反映します。
//! 速度はUpdateで決定され、次フレームの物理ステップで位置へ積分されます（1ティックの遅延）。
//!
//! ## フレーム処理順序
//!
//! 1. **ジェネレーター処理**: 破壊予定時刻に達したジェネレーターを破壊
//! 2. **物理ステップ**: 累積時間が物理刻みに達するたびに FixedUpdate と速度積分
//! 3. **Update**: 各ユニットの現在ステートが目標捕捉・操舵・発射・遷移を判断
//! 4. **後処理**: 破壊されたユニットを除去
//!
//! ## 使用例
//!
//! ```rust,ignore
//! let config = ScenarioConfig::from_file("scenarios/scenario_orbit.yaml")?;
//! let mut engine = SimulationEngine::new(config, 1);
//! engine.initialize()?;
//! let report = engine.run();
//! report.print_summary();
//! ```

use std::collections::BTreeMap;

use tracing::{debug, info, trace, warn};

use crate::models::{
    Domain, Enemy, Generator, IAgent, IMovable, ISurfaceQuery, Planet, ProjectileLedger, Unit, Vec3, World,
};
use crate::scenario::{ScenarioConfig, ScenarioError};
use crate::states::{positioning::GROUND_OFFSET, StateKind, STATE_TAG_PREFIX};

/// 時刻比較の許容値
const TIME_EPSILON: f64 = 1e-9;

/// 破壊されたユニットの記録
#[derive(Debug, Clone, PartialEq)]
pub struct DestroyedUnit {
    pub id: String,
    pub time: f64,
    pub reason: String,
}

/// 生存ユニットの最終状態
#[derive(Debug, Clone, PartialEq)]
pub struct SurvivingUnit {
    pub id: String,
    pub position: Vec3,
    pub state: Option<StateKind>,
    pub state_tags: Vec<String>,
    pub target: Option<String>,
}

/// シミュレーション結果
#[derive(Debug, Clone, Default)]
pub struct SimulationReport {
    pub elapsed_time: f64,
    pub steps: u64,
    pub fixed_steps: u64,
    pub shots_fired: usize,
    /// ジェネレーター別の被弾数
    pub shots_by_target: BTreeMap<String, usize>,
    pub destroyed_units: Vec<DestroyedUnit>,
    pub surviving_units: Vec<SurvivingUnit>,
    pub live_generators: usize,
    pub config_errors: usize,
}

impl SimulationReport {
    pub fn print_summary(&self) {
        println!("=== シミュレーション結果 ===");
        println!("経過時間: {:.2}秒 (フレーム: {}, 物理ステップ: {})", self.elapsed_time, self.steps, self.fixed_steps);
        println!("発射数: {}発", self.shots_fired);
        for (target, shots) in &self.shots_by_target {
            println!("  {}: {}発", target, shots);
        }
        println!("生存ジェネレーター: {}基", self.live_generators);
        if self.config_errors > 0 {
            println!("設定エラー: {}件", self.config_errors);
        }
        println!();

        println!("破壊されたユニット: {}体", self.destroyed_units.len());
        for unit in &self.destroyed_units {
            println!("  {} ({:.2}秒): {}", unit.id, unit.time, unit.reason);
        }
        let attacking = self
            .surviving_units
            .iter()
            .filter(|u| u.state.is_some_and(|s| s.is_attack()))
            .count();
        println!("生存ユニット: {}体 (攻撃中: {}体)", self.surviving_units.len(), attacking);
        for unit in &self.surviving_units {
            let state = unit.state.map(|s| s.identifier()).unwrap_or("-");
            println!(
                "  {} [{}] タグ: {} 目標: {} 位置: ({:.1}, {:.1}, {:.1})",
                unit.id,
                state,
                unit.state_tags.join(","),
                unit.target.as_deref().unwrap_or("-"),
                unit.position.x,
                unit.position.y,
                unit.position.z
            );
        }
    }
}

pub struct SimulationEngine {
    pub current_time: f64,
    pub dt: f64,
    pub fixed_dt: f64,
    pub max_time: f64,
    pub step_count: u64,
    pub fixed_step_count: u64,
    accumulator: f64,

    pub world: World,
    pub enemies: Vec<Enemy>,
    pub projectiles: ProjectileLedger,
    /// (破壊時刻, ジェネレーターID) 時刻順
    destruction_schedule: Vec<(f64, String)>,
    destroyed_units: Vec<DestroyedUnit>,
    config_errors: usize,

    pub scenario_config: ScenarioConfig,
    pub verbose_level: u8,
}

impl SimulationEngine {
    pub fn new(scenario: ScenarioConfig, verbose_level: u8) -> Self {
        let planet_config = &scenario.planet;
        let mut planet = Planet::new(
            planet_config.id.clone(),
            planet_config.center.to_vec3(),
            planet_config.radius_m,
        );
        planet.collision_enabled = planet_config.collision_enabled;
        if let Some(max) = planet_config.max_query_distance_m {
            planet.max_query_distance = max;
        }

        Self {
            current_time: 0.0,
            dt: scenario.sim.dt_s,
            fixed_dt: scenario.sim.fixed_dt(),
            max_time: scenario.sim.t_max_s,
            step_count: 0,
            fixed_step_count: 0,
            accumulator: 0.0,
            world: World::new(planet),
            enemies: Vec::new(),
            projectiles: ProjectileLedger::new(),
            destruction_schedule: Vec::new(),
            destroyed_units: Vec::new(),
            config_errors: 0,
            scenario_config: scenario,
            verbose_level,
        }
    }

    pub fn initialize(&mut self) -> Result<(), ScenarioError> {
        if self.verbose_level > 0 {
            info!("シミュレーションエンジンを初期化中...");
        }

        self.initialize_generators();
        self.initialize_enemies()?;

        info!(
            planet_id = %self.world.planet.id,
            radius = self.world.planet.radius,
            generators = self.world.generators.len(),
            enemies = self.enemies.len(),
            config_errors = self.config_errors,
            "SIMULATION_INITIALIZED: 初期化完了"
        );

        Ok(())
    }

    fn initialize_generators(&mut self) {
        for config in &self.scenario_config.generators {
            self.world
                .generators
                .register(Generator::new(config.id.clone(), config.pos.to_vec3()));

            if let Some(t) = config.destroyed_at_s {
                self.destruction_schedule.push((t, config.id.clone()));
            }

            if self.verbose_level > 1 {
                debug!(generator_id = %config.id, destroyed_at_s = ?config.destroyed_at_s, "ジェネレーター初期化");
            }
        }

        self.destruction_schedule.sort_by(|a, b| a.0.total_cmp(&b.0));
    }

    fn initialize_enemies(&mut self) -> Result<(), ScenarioError> {
        for config in &self.scenario_config.enemies {
            let stats = self.scenario_config.stats_for(config).ok_or_else(|| {
                ScenarioError::Validation(format!(
                    "enemy '{}' refers to unknown stat profile '{}'",
                    config.id, config.profile
                ))
            })?;

            let mut unit = Unit::new(config.id.clone(), config.pos.to_vec3(), config.domain, stats);
            if config.domain == Domain::Ground {
                self.place_on_surface(&mut unit);
            }
            let enemy = Enemy::new(unit, &config.states);
            self.config_errors += enemy.config_errors().len();

            if self.verbose_level > 1 {
                debug!(
                    unit_id = %config.id,
                    domain = ?config.domain,
                    profile = %config.profile,
                    states = config.states.len(),
                    "敵ユニット初期化"
                );
            }

            self.enemies.push(enemy);
        }

        Ok(())
    }

    /// 地上ユニットを直下の地表点から`GROUND_OFFSET`の高さへ配置
    ///
    /// 表面クエリに失敗した場合は設定位置のままにします。
    fn place_on_surface(&self, unit: &mut Unit) {
        let Some(hit) = self.world.planet.query_surface(unit.get_position()) else {
            warn!(unit_id = %unit.id, "SURFACE_QUERY_MISS: 地上ユニットを設定位置のまま配置します");
            return;
        };

        let placed = hit.point + hit.normal * GROUND_OFFSET;
        if (placed - unit.get_position()).length() > 1e-6 {
            debug!(unit_id = %unit.id, from = ?unit.get_position(), to = ?placed, "GROUND_UNIT_PLACED");
        }
        unit.set_position(placed);
    }

    /// 全ユニットを開始ステートへ入れる（未開始のもののみ）
    fn start_enemies(&mut self) {
        for enemy in &mut self.enemies {
            enemy.start(&self.world, &mut self.projectiles);
        }
        self.collect_destroyed();
    }

    pub fn run(&mut self) -> SimulationReport {
        info!("=== シミュレーション実行開始 ===");
        self.start_enemies();

        let max_steps = (self.max_time / self.dt).ceil() as u64 + 1;
        while self.current_time + TIME_EPSILON < self.max_time && !self.enemies.is_empty() {
            self.step();

            if self.verbose_level > 2 {
                trace!("時刻: {:.2}秒 (ステップ: {})", self.current_time, self.step_count);
            }

            if self.step_count % 100 == 0 && self.verbose_level > 0 {
                let progress = (self.current_time / self.max_time) * 100.0;
                info!("進行状況: {:.1}% ({:.1}/{:.1}秒)", progress, self.current_time, self.max_time);
            }

            if self.step_count > max_steps {
                warn!(step_count = self.step_count, "ステップ数の上限に達したため終了します");
                break;
            }
        }

        if self.enemies.is_empty() {
            info!(time = self.current_time, "ALL_UNITS_DESTROYED: 全ての敵ユニットが破壊されました");
        }

        info!("=== シミュレーション完了 ===");
        info!("実行時間: {:.2}秒", self.current_time);
        info!("総ステップ数: {}", self.step_count);

        self.report()
    }

    /// 1フレーム分の処理
    pub fn step(&mut self) {
        self.process_generator_schedule();
        self.process_fixed_steps();
        self.process_updates();
        self.collect_destroyed();

        self.current_time += self.dt;
        self.step_count += 1;
    }

    fn process_generator_schedule(&mut self) {
        while let Some((time, _)) = self.destruction_schedule.first() {
            if *time > self.current_time + TIME_EPSILON {
                break;
            }
            let (_, id) = self.destruction_schedule.remove(0);
            if !self.world.generators.destroy(&id) {
                warn!(generator_id = %id, "破壊予定のジェネレーターが見つかりません");
            }
        }
    }

    fn process_fixed_steps(&mut self) {
        self.accumulator += self.dt;
        while self.accumulator + TIME_EPSILON >= self.fixed_dt {
            for enemy in &mut self.enemies {
                if enemy.is_active() {
                    enemy.fixed_update(&self.world, &mut self.projectiles, self.fixed_dt);
                }
            }
            self.accumulator -= self.fixed_dt;
            self.fixed_step_count += 1;
        }
        self.accumulator = self.accumulator.max(0.0);
    }

    fn process_updates(&mut self) {
        for enemy in &mut self.enemies {
            if enemy.is_active() {
                enemy.update(&self.world, &mut self.projectiles, self.dt);
            }
        }
    }

    fn collect_destroyed(&mut self) {
        let time = self.current_time;
        let destroyed_units = &mut self.destroyed_units;
        self.enemies.retain(|enemy| {
            if enemy.is_active() {
                return true;
            }
            destroyed_units.push(DestroyedUnit {
                id: enemy.get_id(),
                time,
                reason: enemy.unit.destroy_reason.clone().unwrap_or_default(),
            });
            false
        });
    }

    pub fn report(&self) -> SimulationReport {
        let mut shots_by_target = BTreeMap::new();
        for launch in self.projectiles.launches() {
            *shots_by_target.entry(launch.target_id.clone()).or_insert(0) += 1;
        }

        SimulationReport {
            elapsed_time: self.current_time,
            steps: self.step_count,
            fixed_steps: self.fixed_step_count,
            shots_fired: self.projectiles.launch_count(),
            shots_by_target,
            destroyed_units: self.destroyed_units.clone(),
            surviving_units: self
                .enemies
                .iter()
                .map(|enemy| SurvivingUnit {
                    id: enemy.get_id(),
                    position: enemy.unit.position,
                    state: enemy.current_state(),
                    state_tags: enemy
                        .unit
                        .tags
                        .matching(STATE_TAG_PREFIX)
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                    target: enemy.unit.target.clone(),
                })
                .collect(),
            live_generators: self.world.generators.live_count(),
            config_errors: self.config_errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{EnemyConfig, GeneratorConfig, Position3D};
    use crate::states::positioning::GROUND_OFFSET;

    fn pos(x_m: f64, y_m: f64, z_m: f64) -> Position3D {
        Position3D { x_m, y_m, z_m }
    }

    fn engine(config: ScenarioConfig) -> SimulationEngine {
        let mut engine = SimulationEngine::new(config, 0);
        engine.initialize().unwrap();
        engine
    }

    fn single_enemy(mut config: ScenarioConfig, index: usize) -> ScenarioConfig {
        let enemy = config.enemies.remove(index);
        config.enemies = vec![enemy];
        config
    }

    #[test]
    fn test_velocity_is_applied_one_frame_later() {
        let mut engine = engine(single_enemy(ScenarioConfig::demo(), 0));
        engine.start_enemies();
        let start = engine.enemies[0].unit.position;

        engine.step();
        assert_eq!(engine.enemies[0].unit.position, start);
        assert_ne!(engine.enemies[0].unit.velocity(), Vec3::ZERO);

        engine.step();
        assert_ne!(engine.enemies[0].unit.position, start);
    }

    #[test]
    fn test_fixed_steps_follow_accumulator() {
        let mut config = single_enemy(ScenarioConfig::demo(), 0);
        config.sim.dt_s = 0.1;
        config.sim.fixed_dt_s = Some(0.02);
        let mut engine = engine(config);

        for _ in 0..10 {
            engine.step();
        }
        assert_eq!(engine.fixed_step_count, 50);
    }

    #[test]
    fn test_space_unit_closes_and_fires() {
        let mut config = single_enemy(ScenarioConfig::demo(), 0);
        config.generators.retain(|g| g.id == "G001");
        config.generators[0].destroyed_at_s = None;
        config.sim.t_max_s = 40.0;

        let report = engine(config).run();
        assert!(report.shots_fired > 0);
        assert_eq!(report.shots_by_target.get("G001"), Some(&report.shots_fired));
        assert_eq!(report.surviving_units.len(), 1);
        assert_eq!(report.surviving_units[0].state, Some(StateKind::AttackAtRange));

        // ホバー位置（射程内）で攻撃を続けている
        let distance = report.surviving_units[0].position.distance(Vec3::new(0.0, 100.0, 0.0));
        assert!(distance <= 50.0);
    }

    #[test]
    fn test_scheduled_destruction_causes_retarget() {
        let mut config = single_enemy(ScenarioConfig::demo(), 0);
        config.generators[0].destroyed_at_s = Some(15.0);
        config.sim.t_max_s = 16.0;

        let report = engine(config).run();
        assert_eq!(report.live_generators, 2);
        let unit = &report.surviving_units[0];
        assert_ne!(unit.target.as_deref(), Some("G001"));
        assert!(report.shots_by_target.contains_key("G001"));
    }

    #[test]
    fn test_units_self_destruct_when_no_generators_remain() {
        let mut config = ScenarioConfig::demo();
        config.generators = vec![GeneratorConfig {
            id: "G001".to_string(),
            pos: pos(0.0, 100.0, 0.0),
            destroyed_at_s: Some(1.0),
        }];
        config.sim.t_max_s = 10.0;

        let report = engine(config).run();
        assert!(report.surviving_units.is_empty());
        assert_eq!(report.destroyed_units.len(), 3);
        for unit in &report.destroyed_units {
            assert!((unit.time - 1.0).abs() < 1e-6);
            assert_eq!(unit.reason, "no live generators remain");
        }
        assert!(report.elapsed_time < 2.0);
    }

    #[test]
    fn test_ground_unit_hugs_surface() {
        let mut engine = engine(single_enemy(ScenarioConfig::demo(), 2));
        engine.start_enemies();

        for _ in 0..200 {
            engine.step();
            let altitude = engine.world.planet.altitude(engine.enemies[0].unit.position);
            assert!((altitude - GROUND_OFFSET).abs() < 0.5, "altitude {}", altitude);
        }
        assert_eq!(engine.enemies[0].current_state(), Some(StateKind::GroundAttack));
        assert!(engine.projectiles.launches_at("G003") > 0);
    }

    #[test]
    fn test_ground_unit_is_placed_at_offset_on_spawn() {
        let mut config = single_enemy(ScenarioConfig::demo(), 2);
        config.enemies[0].pos = pos(0.0, 0.0, 130.0);
        let engine = engine(config);

        let position = engine.enemies[0].unit.position;
        assert!((position - Vec3::new(0.0, 0.0, 100.0 + GROUND_OFFSET)).length() < 1e-9);
    }

    #[test]
    fn test_report_lists_state_tags() {
        let mut engine = engine(single_enemy(ScenarioConfig::demo(), 0));
        engine.start_enemies();
        engine.step();

        let report = engine.report();
        assert_eq!(report.surviving_units[0].state_tags, vec!["Enemy.State.MoveToTarget".to_string()]);
    }

    #[test]
    fn test_config_errors_are_counted() {
        let mut config = ScenarioConfig::demo();
        config.enemies.push(EnemyConfig {
            id: "E099".to_string(),
            pos: pos(0.0, 300.0, 0.0),
            domain: crate::models::common::Domain::Space,
            profile: "fighter".to_string(),
            states: vec![crate::states::StateConfigEntry::new("Patrol", true)],
        });

        let engine = engine(config);
        assert_eq!(engine.report().config_errors, 1);
    }
}
