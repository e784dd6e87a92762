//! # Simulation モジュール
//!
//! 戦闘員識別シミュレーションの中核となるシミュレーションエンジンを提供します。
//!
//! このモジュールは離散時間のメインループを管理し、すべてのエージェント
//! （センサー、致死性プラットフォーム、人間の戦闘員、不明エージェント）の
//! 状態を単一のエンジンが排他的に所有します。乱数は注入可能なシード付き
//! 乱数源（`ChaCha8Rng`）だけから引くため、同じシードなら実行は完全に再現されます。
//!
//! ## シミュレーション処理順序
//!
//! 各ティックにおいて、以下の順序で処理が実行されます：
//!
//! 1. **プラットフォーム移動**: 現在の確率と位置に基づく移動方策
//! 2. **人間・不明エージェント移動**: 目標地点への単純な移動
//! 3. **確率更新**: 更新後の位置でのセンサー観測とベイズ更新
//! 4. **交戦判定**: 戦闘員 → 人間、致死性プラットフォーム → 不明エージェント
//! 5. **描画**: 有効な場合のみ（失敗しても続行）
//!
//! ## 使用例
//!
//! ```rust
//! use opsim::policy::PolicyMode;
//! use opsim::simulation::SimulationEngine;
//!
//! let mut engine = SimulationEngine::with_parameters(1, 0.5, false, "frames", PolicyMode::Heuristic, 42)?;
//! let outcome = engine.run()?;
//! assert_eq!(outcome.total_warfighters, 4);
//! # Ok::<(), opsim::error::SimError>(())
//! ```

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, info, trace};

use crate::belief::update_beliefs;
use crate::engagement::{resolve_combatant_attacks, resolve_lethal_strikes};
use crate::error::SimError;
use crate::models::{
    warfighter::random_position, IAgent, Label, LethalPlatform, Position2D, SensorPlatform,
    UnknownAgent, Warfighter,
};
use crate::policy::{MovementPolicy, PlatformMove, PolicyMode};
use crate::render::FrameRenderer;
use crate::scenario::{Scenario, ScenarioConfig};

pub struct SimulationEngine {
    pub tick: u32,
    pub end_time: u32,
    pub seed: u64,
    pub scenario: Scenario,
    pub tau: f64,

    pub sensors: Vec<SensorPlatform>,
    pub lethals: Vec<LethalPlatform>,
    pub humans: Vec<Warfighter>,
    pub unknowns: Vec<UnknownAgent>,

    pub scenario_config: ScenarioConfig,

    policy: MovementPolicy,
    false_positive_rate: f64,
    renderer: Option<FrameRenderer>,
    rng: ChaCha8Rng,

    initial_labels: Vec<Label>,
    last_human_alive: Vec<bool>,
    last_unknown_alive: Vec<bool>,
}

/// 1ティック分の処理結果
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub tick: u32,
    pub moves: Vec<PlatformMove>,
    pub beliefs_updated: usize,
    pub warfighters_killed: Vec<String>,
    pub unknowns_killed: Vec<String>,
}

/// シミュレーション結果の統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    pub combatants_killed: u32,
    pub warfighters_killed: u32,
    pub civilians_killed: u32,
    pub total_combatants: u32,
    pub total_warfighters: u32,
    pub total_civilians: u32,
}

impl Outcome {
    pub fn surviving_combatants(&self) -> u32 {
        self.total_combatants - self.combatants_killed
    }

    pub fn surviving_warfighters(&self) -> u32 {
        self.total_warfighters - self.warfighters_killed
    }

    pub fn surviving_civilians(&self) -> u32 {
        self.total_civilians - self.civilians_killed
    }

    /// (戦闘員撃破数, 人間死亡数, 民間人死亡数, 戦闘員数, 人間数, 民間人数)
    pub fn as_tuple(&self) -> (u32, u32, u32, u32, u32, u32) {
        (
            self.combatants_killed,
            self.warfighters_killed,
            self.civilians_killed,
            self.total_combatants,
            self.total_warfighters,
            self.total_civilians,
        )
    }

    /// 実行ごとの統計を表示
    pub fn print_stats(&self) {
        println!("Stats on this round:");
        println!("\tWarfighters: Killed {} out of {}", self.warfighters_killed, self.total_warfighters);
        println!("\tCombatants:  Killed {} out of {}", self.combatants_killed, self.total_combatants);
        println!("\tCivilians:   Killed {} out of {}", self.civilians_killed, self.total_civilians);
    }
}

/// 位置と生存フラグ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentView {
    pub position: Position2D,
    pub alive: bool,
}

/// 不明エージェントの観測可能な状態
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnknownView {
    pub position: Position2D,
    pub alive: bool,
    pub belief: f64,
}

/// ある時点の世界の状態（描画と再現性の検証に使う）
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    pub tick: u32,
    pub sensors: Vec<Position2D>,
    pub lethals: Vec<Position2D>,
    pub humans: Vec<AgentView>,
    pub unknowns: Vec<UnknownView>,
}

impl SimulationEngine {
    /// シナリオ設定からエンジンを作成（乱数源は `sim.seed` から生成）
    pub fn new(config: ScenarioConfig) -> Result<Self, SimError> {
        let rng = ChaCha8Rng::seed_from_u64(config.sim.seed);
        Self::with_rng(config, rng)
    }

    /// 既定の世界パラメータでエンジンを作成
    pub fn with_parameters(
        scenario: u8,
        tau: f64,
        render: bool,
        output_dir: &str,
        policy_mode: PolicyMode,
        seed: u64,
    ) -> Result<Self, SimError> {
        let mut config = ScenarioConfig::default();
        config.policy.scenario = scenario;
        config.policy.tau = tau;
        config.policy.mode = policy_mode;
        config.render.enabled = render;
        config.render.output_dir = output_dir.to_string();
        config.sim.seed = seed;
        Self::new(config)
    }

    /// 乱数源を注入してエンジンを作成
    ///
    /// 設定を検証し、全エージェントを `[0, xy_size)²` に一様配置します。
    /// 真のラベルはシナリオの事前確率で独立に引き、確率はすべて0.5で始まります。
    pub fn with_rng(config: ScenarioConfig, mut rng: ChaCha8Rng) -> Result<Self, SimError> {
        config.validate()?;
        let scenario = config.scenario()?;
        let world = &config.world;
        let xy = world.xy_size;

        let sensors: Vec<SensorPlatform> = (0..world.num_sensors)
            .map(|i| {
                SensorPlatform::new(
                    format!("S{:03}", i + 1),
                    random_position(xy, &mut rng),
                    config.platforms.sensor_step,
                    config.sensing.detection_range,
                )
            })
            .collect();

        let lethals: Vec<LethalPlatform> = (0..world.num_lethal)
            .map(|i| {
                LethalPlatform::new(
                    format!("L{:03}", i + 1),
                    random_position(xy, &mut rng),
                    config.platforms.lethal_step,
                    world.lethal_radius,
                )
            })
            .collect();

        let humans: Vec<Warfighter> = (0..world.num_humans)
            .map(|i| {
                let position = random_position(xy, &mut rng);
                let goal = random_position(xy, &mut rng);
                Warfighter::new(format!("H{:03}", i + 1), position, goal)
            })
            .collect();

        let prior = scenario.combatant_prior();
        let unknowns: Vec<UnknownAgent> = (0..world.num_unknown)
            .map(|i| {
                let position = random_position(xy, &mut rng);
                let goal = random_position(xy, &mut rng);
                let label = Label::draw(prior, &mut rng);
                UnknownAgent::new(format!("U{:03}", i + 1), position, goal, label)
            })
            .collect();

        let policy = MovementPolicy::new(
            config.policy.mode,
            scenario,
            config.policy.tau,
            config.policy.danger_radius,
        );
        let renderer = config.render.enabled.then(|| {
            FrameRenderer::new(&config.render.output_dir, config.render.scale, xy, config.policy.tau)
        });

        debug!(
            scenario = scenario.id(),
            combatants = unknowns.iter().filter(|u| u.ground_truth() == Label::Combatant).count(),
            unknowns = unknowns.len(),
            "シミュレーションを構築しました"
        );

        Ok(Self {
            tick: 0,
            end_time: config.sim.end_time,
            seed: config.sim.seed,
            scenario,
            tau: config.policy.tau,
            initial_labels: unknowns.iter().map(|u| u.ground_truth()).collect(),
            last_human_alive: vec![true; humans.len()],
            last_unknown_alive: vec![true; unknowns.len()],
            sensors,
            lethals,
            humans,
            unknowns,
            policy,
            false_positive_rate: config.sensing.false_positive_rate,
            renderer,
            rng,
            scenario_config: config,
        })
    }

    /// 全ティックを実行して統計を返す
    pub fn run(&mut self) -> Result<Outcome, SimError> {
        info!(
            scenario = self.scenario.id(),
            tau = self.tau,
            mode = %self.policy.mode,
            seed = self.seed,
            "=== シミュレーション実行開始 ==="
        );

        while self.tick < self.end_time {
            let report = self.step()?;
            trace!(tick = report.tick, beliefs_updated = report.beliefs_updated, "ティック完了");
        }

        let outcome = self.outcome()?;
        info!(
            combatants_killed = outcome.combatants_killed,
            warfighters_killed = outcome.warfighters_killed,
            civilians_killed = outcome.civilians_killed,
            believed_hostile = self
                .unknowns
                .iter()
                .filter(|u| u.is_active() && u.is_believed_hostile(self.tau))
                .count(),
            "=== シミュレーション完了 ==="
        );
        Ok(outcome)
    }

    /// 1ティック分の処理
    pub fn step(&mut self) -> Result<TickReport, SimError> {
        let tick = self.tick;

        let moves = self.policy.move_platforms(
            &mut self.sensors,
            &mut self.lethals,
            &self.humans,
            &self.unknowns,
        );
        self.move_population();

        let beliefs_updated = update_beliefs(&mut self.unknowns, &self.sensors, self.false_positive_rate, &mut self.rng)?;
        self.check_beliefs()?;

        let lethal_radius = self.scenario_config.world.lethal_radius;
        let combatant_pass = resolve_combatant_attacks(&mut self.humans, &self.unknowns, lethal_radius);
        let lethal_pass = resolve_lethal_strikes(&self.lethals, &mut self.unknowns, self.tau, self.scenario);

        self.verify_invariants()?;

        if combatant_pass.count() > 0 || lethal_pass.count() > 0 {
            debug!(
                tick,
                warfighters = ?combatant_pass.killed,
                unknowns = ?lethal_pass.killed,
                "交戦発生"
            );
        }

        if self.renderer.is_some() {
            let snapshot = self.snapshot();
            if let Some(renderer) = self.renderer.as_mut() {
                renderer.render(tick, &snapshot);
            }
        }

        self.tick += 1;

        Ok(TickReport {
            tick,
            moves,
            beliefs_updated,
            warfighters_killed: combatant_pass.killed,
            unknowns_killed: lethal_pass.killed,
        })
    }

    fn move_population(&mut self) {
        let world = &self.scenario_config.world;
        for human in self.humans.iter_mut() {
            human.seek_goal(world.goal_reach_radius, world.xy_size, &mut self.rng);
        }
        for agent in self.unknowns.iter_mut() {
            agent.wander(&self.humans, world.goal_reach_radius, world.xy_size, &mut self.rng);
        }
    }

    fn check_beliefs(&self) -> Result<(), SimError> {
        for agent in &self.unknowns {
            let belief = agent.belief();
            if !(0.0..=1.0).contains(&belief) {
                error!(agent = %agent.id, belief, "確率が [0,1] の範囲外");
                return Err(SimError::InvariantViolation(format!(
                    "belief of {} is {} at tick {}",
                    agent.id, belief, self.tick
                )));
            }
        }
        Ok(())
    }

    /// 生存フラグの単調性と真のラベルの不変性を検証
    pub fn verify_invariants(&mut self) -> Result<(), SimError> {
        self.check_beliefs()?;

        for (agent, initial) in self.unknowns.iter().zip(&self.initial_labels) {
            if agent.ground_truth() != *initial {
                error!(agent = %agent.id, "真のラベルが変化した");
                return Err(SimError::InvariantViolation(format!(
                    "ground truth of {} changed from {} to {}",
                    agent.id,
                    initial,
                    agent.ground_truth()
                )));
            }
        }

        let human_alive: Vec<bool> = self.humans.iter().map(|h| h.is_active()).collect();
        let unknown_alive: Vec<bool> = self.unknowns.iter().map(|u| u.is_active()).collect();
        if revived(&self.last_human_alive, &human_alive) || revived(&self.last_unknown_alive, &unknown_alive) {
            error!(tick = self.tick, "死亡したエージェントが復活した");
            return Err(SimError::InvariantViolation(format!(
                "alive flag went from false to true at tick {}",
                self.tick
            )));
        }
        self.last_human_alive = human_alive;
        self.last_unknown_alive = unknown_alive;

        Ok(())
    }

    /// 現在の状態から統計を集計
    ///
    /// 真のラベルが構築時から変わっていれば内部整合性エラーになります。
    pub fn outcome(&self) -> Result<Outcome, SimError> {
        let mut outcome = Outcome {
            total_warfighters: self.humans.len() as u32,
            ..Outcome::default()
        };

        for (agent, initial) in self.unknowns.iter().zip(&self.initial_labels) {
            if agent.ground_truth() != *initial {
                return Err(SimError::InvariantViolation(format!(
                    "ground truth of {} is no longer {}",
                    agent.id, initial
                )));
            }
            let killed = u32::from(!agent.is_active());
            match agent.ground_truth() {
                Label::Combatant => {
                    outcome.total_combatants += 1;
                    outcome.combatants_killed += killed;
                }
                Label::Civilian => {
                    outcome.total_civilians += 1;
                    outcome.civilians_killed += killed;
                }
            }
        }

        outcome.warfighters_killed = self.humans.iter().filter(|h| !h.is_active()).count() as u32;
        Ok(outcome)
    }

    /// 現在の状態のスナップショット
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            tick: self.tick,
            sensors: self.sensors.iter().map(|s| s.position).collect(),
            lethals: self.lethals.iter().map(|l| l.position).collect(),
            humans: self
                .humans
                .iter()
                .map(|h| AgentView { position: h.position, alive: h.is_active() })
                .collect(),
            unknowns: self
                .unknowns
                .iter()
                .map(|u| UnknownView { position: u.position, alive: u.is_active(), belief: u.belief() })
                .collect(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.tick >= self.end_time
    }
}

/// 死亡から生存に戻ったフラグがあるか
fn revived(before: &[bool], after: &[bool]) -> bool {
    before.iter().zip(after).any(|(b, a)| !*b && *a)
}
