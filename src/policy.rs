//! # Policy モジュール
//!
//! センサーと致死性プラットフォームの移動方策を提供します。
//!
//! 方策は「規則」の優先度付きリストとして表され、シナリオ・プラットフォーム種別・
//! 方策モードをキーとする戦略テーブルから選ばれます。評価器はリストを先頭から
//! 調べ、目標が見つかった最初の規則だけを適用します（1ティックに1回の移動のみ）。
//!
//! ## 方策モード
//!
//! - `Greedy`: センサーは未識別（belief ≤ tau）の最も近い不明エージェントへ、
//!   致死性プラットフォームは敵と推定された（belief > tau）最も近い不明エージェントへ
//! - `Heuristic`: シナリオごとの多層規則（人間に接近した脅威を最優先）

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{
    common::geometry, IAgent, IMovable, IPlatform, LethalPlatform, PlatformKind, Position2D, SensorPlatform,
    UnknownAgent, Warfighter,
};
use crate::scenario::Scenario;

/// 方策モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    Greedy,
    Heuristic,
}

impl FromStr for PolicyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "greedy" => Ok(PolicyMode::Greedy),
            "heuristic" | "scenario" => Ok(PolicyMode::Heuristic),
            _ => Err(format!("無効な方策モード: {}. 利用可能: greedy, heuristic", s)),
        }
    }
}

impl fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyMode::Greedy => f.write_str("greedy"),
            PolicyMode::Heuristic => f.write_str("heuristic"),
        }
    }
}

/// 推定クラス
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeliefClass {
    /// belief ≤ tau（未識別・民間人寄り、調査する価値がある）
    Unidentified,
    /// belief > tau（敵と推定）
    Hostile,
}

impl BeliefClass {
    pub fn matches(&self, belief: f64, tau: f64) -> bool {
        match self {
            BeliefClass::Unidentified => belief <= tau,
            BeliefClass::Hostile => belief > tau,
        }
    }
}

/// 移動規則
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// 人間の戦闘員に危険なほど接近している不明エージェントへ向かう
    ThreatNearWarfighter(BeliefClass),
    /// 最も近い不明エージェントへ向かう
    NearestUnknown(BeliefClass),
    /// 最も近い生存中の人間の戦闘員に随伴する
    FollowWarfighter,
    /// 最も近い（自分以外の）センサーへ後退する
    FallBackToSensor,
}

use BeliefClass::{Hostile, Unidentified};
use Rule::{FallBackToSensor, FollowWarfighter, NearestUnknown, ThreatNearWarfighter};

const GREEDY_SENSOR: &[Rule] = &[NearestUnknown(Unidentified)];
const GREEDY_LETHAL: &[Rule] = &[NearestUnknown(Hostile)];

const PEACEKEEPING_SENSOR: &[Rule] = &[ThreatNearWarfighter(Unidentified), NearestUnknown(Unidentified)];
const PEACEKEEPING_LETHAL: &[Rule] = &[ThreatNearWarfighter(Hostile), FollowWarfighter];

const GUERRILLA_SENSOR: &[Rule] = &[
    ThreatNearWarfighter(Unidentified),
    NearestUnknown(Unidentified),
    FollowWarfighter,
];
const GUERRILLA_LETHAL: &[Rule] = &[ThreatNearWarfighter(Hostile), NearestUnknown(Hostile), FollowWarfighter];

const WAR_ZONE_SENSOR: &[Rule] = &[NearestUnknown(Unidentified), FollowWarfighter];
const WAR_ZONE_LETHAL: &[Rule] = &[
    ThreatNearWarfighter(Hostile),
    NearestUnknown(Hostile),
    FollowWarfighter,
    FallBackToSensor,
];

/// 戦略テーブル
pub fn rules_for(mode: PolicyMode, scenario: Scenario, kind: PlatformKind) -> &'static [Rule] {
    match (mode, scenario, kind) {
        (PolicyMode::Greedy, _, PlatformKind::Sensor) => GREEDY_SENSOR,
        (PolicyMode::Greedy, _, PlatformKind::Lethal) => GREEDY_LETHAL,
        (PolicyMode::Heuristic, Scenario::Peacekeeping, PlatformKind::Sensor) => PEACEKEEPING_SENSOR,
        (PolicyMode::Heuristic, Scenario::Peacekeeping, PlatformKind::Lethal) => PEACEKEEPING_LETHAL,
        (PolicyMode::Heuristic, Scenario::Guerrilla, PlatformKind::Sensor) => GUERRILLA_SENSOR,
        (PolicyMode::Heuristic, Scenario::Guerrilla, PlatformKind::Lethal) => GUERRILLA_LETHAL,
        (PolicyMode::Heuristic, Scenario::WarZone, PlatformKind::Sensor) => WAR_ZONE_SENSOR,
        (PolicyMode::Heuristic, Scenario::WarZone, PlatformKind::Lethal) => WAR_ZONE_LETHAL,
    }
}

/// 規則の評価に必要な世界の状態
pub struct PolicyContext<'a> {
    pub unknowns: &'a [UnknownAgent],
    pub humans: &'a [Warfighter],
    pub sensor_positions: &'a [Position2D],
    pub tau: f64,
    pub danger_radius: f64,
}

impl PolicyContext<'_> {
    /// 規則に対応する目標位置を探す
    ///
    /// `own_sensor` は評価中のプラットフォームがセンサーの場合のインデックスで、
    /// 自分自身を後退先に選ばないために使います。
    pub fn find_target(&self, rule: Rule, origin: &Position2D, own_sensor: Option<usize>) -> Option<Position2D> {
        match rule {
            ThreatNearWarfighter(class) => {
                let positions = self.unknown_positions();
                geometry::nearest_index(origin, &positions, |j| {
                    self.unknown_matches(j, class) && self.is_near_live_warfighter(&positions[j])
                })
                .map(|j| positions[j])
            }
            NearestUnknown(class) => {
                let positions = self.unknown_positions();
                geometry::nearest_index(origin, &positions, |j| self.unknown_matches(j, class))
                    .map(|j| positions[j])
            }
            FollowWarfighter => {
                let positions: Vec<Position2D> = self.humans.iter().map(|h| h.position).collect();
                geometry::nearest_index(origin, &positions, |i| self.humans[i].is_active())
                    .map(|i| positions[i])
            }
            FallBackToSensor => {
                geometry::nearest_index(origin, self.sensor_positions, |i| Some(i) != own_sensor)
                    .map(|i| self.sensor_positions[i])
            }
        }
    }

    fn unknown_positions(&self) -> Vec<Position2D> {
        self.unknowns.iter().map(|u| u.position).collect()
    }

    fn unknown_matches(&self, index: usize, class: BeliefClass) -> bool {
        let agent = &self.unknowns[index];
        agent.is_active() && class.matches(agent.belief(), self.tau)
    }

    fn is_near_live_warfighter(&self, position: &Position2D) -> bool {
        let positions: Vec<Position2D> = self.humans.iter().map(|h| h.position).collect();
        geometry::nearest_distance(position, &positions, |i| self.humans[i].is_active()) <= self.danger_radius
    }
}

/// 1プラットフォームの1ティック分の移動結果
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformMove {
    pub platform_id: String,
    /// 適用された規則（どの規則も目標を持たなければ None で停止）
    pub rule: Option<Rule>,
    pub delta: Position2D,
}

/// 規則リストを評価して最初に適用できる規則の変位を返す
pub fn plan_move<P: IPlatform>(
    platform: &P,
    rules: &[Rule],
    context: &PolicyContext<'_>,
    own_sensor: Option<usize>,
) -> PlatformMove {
    let origin = platform.get_position();
    for &rule in rules {
        if let Some(target) = context.find_target(rule, &origin, own_sensor) {
            return PlatformMove {
                platform_id: platform.get_id(),
                rule: Some(rule),
                delta: origin.step_toward(&target, platform.step_size()),
            };
        }
    }
    PlatformMove {
        platform_id: platform.get_id(),
        rule: None,
        delta: Position2D::default(),
    }
}

/// 移動方策エンジン
#[derive(Debug, Clone, Copy)]
pub struct MovementPolicy {
    pub mode: PolicyMode,
    pub scenario: Scenario,
    pub tau: f64,
    pub danger_radius: f64,
}

impl MovementPolicy {
    pub fn new(mode: PolicyMode, scenario: Scenario, tau: f64, danger_radius: f64) -> Self {
        Self {
            mode,
            scenario,
            tau,
            danger_radius,
        }
    }

    pub fn rules(&self, kind: PlatformKind) -> &'static [Rule] {
        rules_for(self.mode, self.scenario, kind)
    }

    /// 全プラットフォームを1ティック分移動
    ///
    /// センサー、致死性プラットフォームの順にインデックス順で処理し、
    /// 各プラットフォームはその時点の位置を見て目標を選びます。
    pub fn move_platforms(
        &self,
        sensors: &mut [SensorPlatform],
        lethals: &mut [LethalPlatform],
        humans: &[Warfighter],
        unknowns: &[UnknownAgent],
    ) -> Vec<PlatformMove> {
        let mut moves = Vec::with_capacity(sensors.len() + lethals.len());

        let sensor_rules = self.rules(PlatformKind::Sensor);
        for index in 0..sensors.len() {
            let sensor_positions: Vec<Position2D> = sensors.iter().map(|s| s.position).collect();
            let context = self.context(humans, unknowns, &sensor_positions);
            let planned = plan_move(&sensors[index], sensor_rules, &context, Some(index));
            sensors[index].displace(planned.delta);
            moves.push(planned);
        }

        let lethal_rules = self.rules(PlatformKind::Lethal);
        let sensor_positions: Vec<Position2D> = sensors.iter().map(|s| s.position).collect();
        let context = self.context(humans, unknowns, &sensor_positions);
        for lethal in lethals.iter_mut() {
            let planned = plan_move(&*lethal, lethal_rules, &context, None);
            lethal.displace(planned.delta);
            moves.push(planned);
        }

        moves
    }

    fn context<'a>(
        &self,
        humans: &'a [Warfighter],
        unknowns: &'a [UnknownAgent],
        sensor_positions: &'a [Position2D],
    ) -> PolicyContext<'a> {
        PolicyContext {
            unknowns,
            humans,
            sensor_positions,
            tau: self.tau,
            danger_radius: self.danger_radius,
        }
    }
}
