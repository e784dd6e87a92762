//! # Trials モジュール
//!
//! 独立したシミュレーションを複数回実行して平均を集計するモンテカルロ試行です。
//!
//! 各試行は状態を一切共有しない独立したエンジンで、試行 `i` はシード
//! `sim.seed + i` を使います。tokio のマルチスレッドランタイム上で
//! `spawn_blocking` により並列実行し、結果は試行順に集めるため集計は決定的です。

use tracing::{debug, info};

use crate::error::SimError;
use crate::scenario::ScenarioConfig;
use crate::simulation::{Outcome, SimulationEngine};

/// 試行結果の集計
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrialSummary {
    /// 試行順の結果
    pub outcomes: Vec<Outcome>,
}

impl TrialSummary {
    pub fn new(outcomes: Vec<Outcome>) -> Self {
        Self { outcomes }
    }

    pub fn trials(&self) -> usize {
        self.outcomes.len()
    }

    /// 6列それぞれの合計
    pub fn totals(&self) -> [u64; 6] {
        let mut totals = [0u64; 6];
        for outcome in &self.outcomes {
            let (a, b, c, d, e, f) = outcome.as_tuple();
            for (total, value) in totals.iter_mut().zip([a, b, c, d, e, f]) {
                *total += value as u64;
            }
        }
        totals
    }

    /// 6列それぞれの平均（試行なしなら全て0）
    pub fn averages(&self) -> [f64; 6] {
        let n = self.trials();
        if n == 0 {
            return [0.0; 6];
        }
        self.totals().map(|total| total as f64 / n as f64)
    }

    /// 平均値を表示
    pub fn print_report(&self) {
        let avg = self.averages();
        println!("Final average values ({} trials):", self.trials());
        println!("\tAverage combatants killed: {}/{}", avg[0], avg[3]);
        println!("\tAverage warfighters killed: {}/{}", avg[1], avg[4]);
        println!("\tAverage civ killed: {}/{}", avg[2], avg[5]);
    }
}

/// 試行 `index` の設定（シードをずらし、描画は無効にする）
pub fn trial_config(base: &ScenarioConfig, index: u32) -> ScenarioConfig {
    let mut config = base.clone();
    config.sim.seed = base.sim.seed.wrapping_add(index as u64);
    config.render.enabled = false;
    config
}

/// モンテカルロ試行を実行
pub fn run_trials(config: &ScenarioConfig, trials: u32) -> Result<TrialSummary, SimError> {
    config.validate()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("opsim-trial")
        .build()
        .map_err(|e| SimError::TrialFailed(format!("ランタイムを作成できません: {}", e)))?;

    runtime.block_on(run_trials_async(config, trials))
}

/// 既存のランタイム上でモンテカルロ試行を実行
pub async fn run_trials_async(config: &ScenarioConfig, trials: u32) -> Result<TrialSummary, SimError> {
    info!(trials, base_seed = config.sim.seed, "モンテカルロ試行を開始");

    let handles: Vec<_> = (0..trials)
        .map(|index| {
            let trial = trial_config(config, index);
            tokio::task::spawn_blocking(move || -> Result<Outcome, SimError> {
                SimulationEngine::new(trial)?.run()
            })
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (index, handle) in handles.into_iter().enumerate() {
        let outcome = handle
            .await
            .map_err(|e| SimError::TrialFailed(format!("trial {}: {}", index, e)))??;
        debug!(trial = index, ?outcome, "試行完了");
        outcomes.push(outcome);
    }

    let summary = TrialSummary::new(outcomes);
    info!(trials = summary.trials(), "モンテカルロ試行が完了");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trials_match_sequential_runs() {
        let mut config = ScenarioConfig::default();
        config.sim.seed = 100;
        config.policy.scenario = 2;

        let summary = run_trials(&config, 8).unwrap();
        assert_eq!(summary.trials(), 8);

        for (index, outcome) in summary.outcomes.iter().enumerate() {
            let expected = SimulationEngine::new(trial_config(&config, index as u32))
                .unwrap()
                .run()
                .unwrap();
            assert_eq!(*outcome, expected);
        }
    }

    #[test]
    fn test_trials_are_deterministic() {
        let config = ScenarioConfig::default();
        let first = run_trials(&config, 5).unwrap();
        let second = run_trials(&config, 5).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_averages() {
        let summary = TrialSummary::new(vec![
            Outcome { combatants_killed: 1, warfighters_killed: 0, civilians_killed: 2, total_combatants: 2, total_warfighters: 4, total_civilians: 2 },
            Outcome { combatants_killed: 0, warfighters_killed: 2, civilians_killed: 0, total_combatants: 0, total_warfighters: 4, total_civilians: 4 },
        ]);
        assert_eq!(summary.totals(), [1, 2, 2, 2, 8, 6]);
        assert_eq!(summary.averages(), [0.5, 1.0, 1.0, 1.0, 4.0, 3.0]);
        assert_eq!(TrialSummary::default().averages(), [0.0; 6]);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = ScenarioConfig::default();
        config.policy.tau = 2.0;
        assert!(matches!(run_trials(&config, 3), Err(SimError::InvalidArgument(_))));
    }

    #[test]
    fn test_trial_config_disables_rendering() {
        let mut config = ScenarioConfig::default();
        config.render.enabled = true;
        config.sim.seed = u64::MAX;
        let trial = trial_config(&config, 2);
        assert!(!trial.render.enabled);
        assert_eq!(trial.sim.seed, 1);
    }
}
