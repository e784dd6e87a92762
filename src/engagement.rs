//! # Engagement モジュール
//!
//! 距離と確率の閾値から無力化（alive → dead）を判定します。
//! 生存フラグの遷移はこのモジュールだけが起こし、逆向きの遷移はありません。
//!
//! - 戦闘員 → 人間: 真のラベルで判定（分類の正否に関わらず戦闘員は危険）
//! - 致死性プラットフォーム → 不明エージェント: 確率（belief）だけで判定
//!   （誤分類された民間人は攻撃され、見逃された戦闘員は生き残る）

use tracing::debug;

use crate::models::{IAgent, Label, LethalPlatform, UnknownAgent, Warfighter};
use crate::scenario::Scenario;

/// 平和維持・ゲリラシナリオで致死性交戦に追加される信頼度マージン
///
/// `belief − belief·0.01 > tau` を要求する。マージンは1%しかなく、
/// 意図された仕様というより偶発的なものと思われるが、数値的な挙動は保持する。
pub const ENGAGEMENT_CONFIDENCE_MARGIN: f64 = 0.01;

/// 1回の交戦判定パスの結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngagementReport {
    /// このパスで無力化されたエージェントのID
    pub killed: Vec<String>,
}

impl EngagementReport {
    pub fn count(&self) -> usize {
        self.killed.len()
    }
}

/// 戦闘員による人間への攻撃
///
/// 生存中の人間と、真のラベルが戦闘員である生存中の不明エージェントの距離が
/// `lethal_radius` 未満なら人間を無力化します。
pub fn resolve_combatant_attacks(
    humans: &mut [Warfighter],
    unknowns: &[UnknownAgent],
    lethal_radius: f64,
) -> EngagementReport {
    let mut report = EngagementReport::default();

    for human in humans.iter_mut() {
        if !human.is_active() {
            continue;
        }
        let attacker = unknowns.iter().find(|u| {
            u.is_active()
                && u.ground_truth() == Label::Combatant
                && u.position.distance(&human.position) < lethal_radius
        });
        if let Some(attacker) = attacker {
            human.kill();
            debug!(warfighter = %human.id, combatant = %attacker.id, "人間の戦闘員が無力化された");
            report.killed.push(human.id.clone());
        }
    }

    report
}

/// 致死性プラットフォームによる不明エージェントへの攻撃
///
/// 距離が交戦半径以下で、かつ確率が `tau` を超える生存中の不明エージェントを
/// 無力化します。交戦地帯シナリオ以外では信頼度マージンも満たす必要があります。
pub fn resolve_lethal_strikes(
    lethals: &[LethalPlatform],
    unknowns: &mut [UnknownAgent],
    tau: f64,
    scenario: Scenario,
) -> EngagementReport {
    let mut report = EngagementReport::default();

    for agent in unknowns.iter_mut() {
        if !agent.is_active() || !passes_threshold(agent.belief(), tau, scenario) {
            continue;
        }
        let shooter = lethals.iter().find(|l| l.is_in_lethal_range(&agent.position));
        if let Some(shooter) = shooter {
            agent.kill();
            debug!(
                agent = %agent.id,
                lethal = %shooter.id,
                belief = agent.belief(),
                ground_truth = %agent.ground_truth(),
                "不明エージェントが無力化された"
            );
            report.killed.push(agent.id.clone());
        }
    }

    report
}

/// 交戦の確率条件
pub fn passes_threshold(belief: f64, tau: f64, scenario: Scenario) -> bool {
    match scenario {
        Scenario::WarZone => belief > tau,
        Scenario::Peacekeeping | Scenario::Guerrilla => {
            belief > tau && belief - belief * ENGAGEMENT_CONFIDENCE_MARGIN > tau
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position2D;

    fn human(x: f64, y: f64) -> Warfighter {
        Warfighter::new("H001".to_string(), Position2D::new(x, y), Position2D::new(x, y))
    }

    fn unknown(x: f64, y: f64, label: Label, belief: f64) -> UnknownAgent {
        let mut agent = UnknownAgent::new("U001".to_string(), Position2D::new(x, y), Position2D::new(x, y), label);
        agent.set_belief(belief).unwrap();
        agent
    }

    fn lethal(x: f64, y: f64) -> LethalPlatform {
        LethalPlatform::new("L001".to_string(), Position2D::new(x, y), 1.5, 10.0)
    }

    #[test]
    fn test_combatant_within_radius_kills_warfighter() {
        let mut humans = vec![human(0.0, 0.0)];
        let unknowns = vec![unknown(5.0, 0.0, Label::Combatant, 0.0)];
        let report = resolve_combatant_attacks(&mut humans, &unknowns, 10.0);
        assert!(!humans[0].is_active());
        assert_eq!(report.killed, vec!["H001".to_string()]);
    }

    #[test]
    fn test_combatant_out_of_radius_does_not_kill() {
        let mut humans = vec![human(0.0, 0.0)];
        let unknowns = vec![unknown(15.0, 0.0, Label::Combatant, 1.0)];
        let report = resolve_combatant_attacks(&mut humans, &unknowns, 10.0);
        assert!(humans[0].is_active());
        assert_eq!(report.count(), 0);

        // 半径ちょうどは「未満」ではない
        let unknowns = vec![unknown(10.0, 0.0, Label::Combatant, 1.0)];
        resolve_combatant_attacks(&mut humans, &unknowns, 10.0);
        assert!(humans[0].is_active());
    }

    #[test]
    fn test_civilians_and_dead_combatants_are_harmless() {
        let mut humans = vec![human(0.0, 0.0)];
        let mut unknowns = vec![
            unknown(1.0, 0.0, Label::Civilian, 1.0),
            unknown(2.0, 0.0, Label::Combatant, 0.5),
        ];
        unknowns[1].kill();
        resolve_combatant_attacks(&mut humans, &unknowns, 10.0);
        assert!(humans[0].is_active());
    }

    #[test]
    fn test_lethal_strike_uses_belief_not_truth() {
        let lethals = vec![lethal(0.0, 0.0)];
        // 敵と推定された民間人は攻撃され、見逃された戦闘員は生き残る
        let mut unknowns = vec![
            unknown(3.0, 0.0, Label::Civilian, 0.9),
            unknown(4.0, 0.0, Label::Combatant, 0.2),
        ];
        let report = resolve_lethal_strikes(&lethals, &mut unknowns, 0.5, Scenario::Guerrilla);
        assert!(!unknowns[0].is_active());
        assert!(unknowns[1].is_active());
        assert_eq!(report.count(), 1);
    }

    #[test]
    fn test_lethal_strike_radius_is_inclusive() {
        let lethals = vec![lethal(0.0, 0.0)];
        let mut unknowns = vec![unknown(10.0, 0.0, Label::Combatant, 0.9)];
        resolve_lethal_strikes(&lethals, &mut unknowns, 0.5, Scenario::WarZone);
        assert!(!unknowns[0].is_active());

        let mut unknowns = vec![unknown(10.5, 0.0, Label::Combatant, 0.9)];
        resolve_lethal_strikes(&lethals, &mut unknowns, 0.5, Scenario::WarZone);
        assert!(unknowns[0].is_active());
    }

    #[test]
    fn test_confidence_margin_depends_on_scenario() {
        // 0.505 * 0.99 = 0.49995 < 0.5
        assert!(!passes_threshold(0.505, 0.5, Scenario::Peacekeeping));
        assert!(!passes_threshold(0.505, 0.5, Scenario::Guerrilla));
        assert!(passes_threshold(0.505, 0.5, Scenario::WarZone));
        assert!(passes_threshold(0.6, 0.5, Scenario::Peacekeeping));
        assert!(!passes_threshold(0.5, 0.5, Scenario::WarZone));
    }

    #[test]
    fn test_dead_stays_dead() {
        let lethals = vec![lethal(0.0, 0.0)];
        let mut unknowns = vec![unknown(1.0, 0.0, Label::Civilian, 0.1)];
        unknowns[0].kill();
        let report = resolve_lethal_strikes(&lethals, &mut unknowns, 0.5, Scenario::WarZone);
        assert!(!unknowns[0].is_active());
        assert_eq!(report.count(), 0);
    }
}
