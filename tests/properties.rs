//! シミュレーション全体の性質テスト

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use opsim::belief::bayes_update;
use opsim::models::{simulate_detection, IAgent, Label};
use opsim::policy::PolicyMode;
use opsim::scenario::{Scenario, ScenarioConfig};
use opsim::simulation::SimulationEngine;

fn config(scenario: u8, mode: PolicyMode, tau: f64, seed: u64) -> ScenarioConfig {
    let mut config = ScenarioConfig::default();
    config.policy.scenario = scenario;
    config.policy.mode = mode;
    config.policy.tau = tau;
    config.sim.seed = seed;
    config
}

fn mode_strategy() -> impl Strategy<Value = PolicyMode> {
    prop_oneof![Just(PolicyMode::Greedy), Just(PolicyMode::Heuristic)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn beliefs_stay_in_unit_interval(seed in any::<u64>(), scenario in 1u8..=3, mode in mode_strategy(), tau in 0.0f64..=1.0) {
        let mut engine = SimulationEngine::new(config(scenario, mode, tau, seed)).unwrap();
        while !engine.is_finished() {
            engine.step().unwrap();
            for agent in &engine.unknowns {
                prop_assert!((0.0..=1.0).contains(&agent.belief()));
            }
        }
    }

    #[test]
    fn labels_fixed_and_alive_flags_monotone(seed in any::<u64>(), scenario in 1u8..=3, mode in mode_strategy()) {
        let mut engine = SimulationEngine::new(config(scenario, mode, 0.5, seed)).unwrap();
        let labels: Vec<Label> = engine.unknowns.iter().map(|u| u.ground_truth()).collect();
        let mut humans_alive: Vec<bool> = engine.humans.iter().map(|h| h.is_active()).collect();
        let mut unknowns_alive: Vec<bool> = engine.unknowns.iter().map(|u| u.is_active()).collect();

        while !engine.is_finished() {
            engine.step().unwrap();

            let now: Vec<Label> = engine.unknowns.iter().map(|u| u.ground_truth()).collect();
            prop_assert_eq!(&now, &labels);

            for (before, human) in humans_alive.iter_mut().zip(&engine.humans) {
                prop_assert!(*before || !human.is_active());
                *before = human.is_active();
            }
            for (before, agent) in unknowns_alive.iter_mut().zip(&engine.unknowns) {
                prop_assert!(*before || !agent.is_active());
                *before = agent.is_active();
            }
        }
    }

    #[test]
    fn same_seed_same_outcome(seed in any::<u64>(), scenario in 1u8..=3, mode in mode_strategy()) {
        let first = SimulationEngine::new(config(scenario, mode, 0.5, seed)).unwrap().run().unwrap();
        let second = SimulationEngine::new(config(scenario, mode, 0.5, seed)).unwrap().run().unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn outcome_counts_are_conserved(seed in any::<u64>(), scenario in 1u8..=3, mode in mode_strategy()) {
        let outcome = SimulationEngine::new(config(scenario, mode, 0.5, seed)).unwrap().run().unwrap();
        prop_assert_eq!(outcome.total_combatants + outcome.total_civilians, 4);
        prop_assert_eq!(outcome.total_warfighters, 4);
        prop_assert!(outcome.combatants_killed <= outcome.total_combatants);
        prop_assert!(outcome.civilians_killed <= outcome.total_civilians);
        prop_assert!(outcome.warfighters_killed <= outcome.total_warfighters);
    }

    #[test]
    fn bayes_update_stays_in_unit_interval(prior in 0.0f64..=1.0, p_fn in 0.001f64..0.999, p_fp in 0.001f64..=0.5, hostile in any::<bool>()) {
        let outcome = if hostile { Label::Combatant } else { Label::Civilian };
        let posterior = bayes_update(prior, outcome, p_fn, p_fp).unwrap();
        prop_assert!((0.0..=1.0).contains(&posterior));
    }

    #[test]
    fn perfect_sensor_reports_truth(seed in any::<u64>(), hostile in any::<bool>()) {
        let truth = if hostile { Label::Combatant } else { Label::Civilian };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for _ in 0..20 {
            prop_assert_eq!(simulate_detection(truth, 0.0, 0.0, &mut rng), truth);
        }
    }
}

#[test]
fn combatant_fraction_matches_scenario_prior() {
    for scenario in [Scenario::Peacekeeping, Scenario::Guerrilla, Scenario::WarZone] {
        let mut combatants = 0usize;
        let mut total = 0usize;
        for seed in 0..10_000u64 {
            let engine = SimulationEngine::new(config(scenario.id(), PolicyMode::Heuristic, 0.5, seed)).unwrap();
            combatants += engine
                .unknowns
                .iter()
                .filter(|u| u.ground_truth() == Label::Combatant)
                .count();
            total += engine.unknowns.len();
        }
        let fraction = combatants as f64 / total as f64;
        assert!(
            (fraction - scenario.combatant_prior()).abs() < 0.02,
            "{}: fraction {} vs prior {}",
            scenario.name(),
            fraction,
            scenario.combatant_prior()
        );
    }
}

#[test]
fn scenario_files_load_and_run() {
    for name in ["peacekeeping", "guerrilla", "war_zone"] {
        let path = format!("{}/scenarios/{}.yaml", env!("CARGO_MANIFEST_DIR"), name);
        let config = ScenarioConfig::from_file(&path).unwrap();
        assert!(!config.render.enabled, "{}", name);
        let (num_humans, num_unknown) = (config.world.num_humans, config.world.num_unknown);
        let outcome = SimulationEngine::new(config).unwrap().run().unwrap();
        assert_eq!(outcome.total_warfighters as usize, num_humans, "{}", name);
        assert_eq!((outcome.total_combatants + outcome.total_civilians) as usize, num_unknown, "{}", name);
    }
}
