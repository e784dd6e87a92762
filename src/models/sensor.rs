use rand::Rng;
use crate::models::{
    traits::{IAgent, IMovable, IPlatform, PlatformKind},
    common::{Position2D, DISTANCE_EPSILON},
    unknown::Label,
};

/// センサープラットフォーム
///
/// 不明エージェントを観測し、戦闘員確率の推定に使う二値の観測結果を提供します。
/// 破壊されることはなく、毎ティック行動方策によって移動します。
#[derive(Debug, Clone)]
pub struct SensorPlatform {
    /// センサーの一意識別子
    pub id: String,
    /// センサーの現在位置
    pub position: Position2D,
    /// 1ティックあたりの最大移動量
    pub step_size: f64,
    /// 探知範囲（これより遠い不明エージェントは観測されない）
    pub detection_range: f64,
}

impl SensorPlatform {
    pub fn new(id: String, position: Position2D, step_size: f64, detection_range: f64) -> Self {
        Self {
            id,
            position,
            step_size,
            detection_range,
        }
    }

    /// 指定された位置が探知範囲内かどうか
    pub fn is_in_detection_range(&self, position: &Position2D) -> bool {
        self.position.distance(position) <= self.detection_range
    }
}

impl IAgent for SensorPlatform {
    fn get_id(&self) -> String {
        self.id.clone()
    }

    fn get_position(&self) -> Position2D {
        self.position
    }

    fn is_active(&self) -> bool {
        true
    }
}

impl IMovable for SensorPlatform {
    fn set_position(&mut self, position: Position2D) {
        self.position = position;
    }
}

impl IPlatform for SensorPlatform {
    fn step_size(&self) -> f64 {
        self.step_size
    }

    fn kind(&self) -> PlatformKind {
        PlatformKind::Sensor
    }
}

/// 距離に応じた見逃し率
///
/// `p_fn = 1 - exp(-distance / detection_range)`。距離0で0、探知範囲ちょうどで
/// 1-1/e、遠方で1に漸近します。距離0は `DISTANCE_EPSILON` に置き換えます。
pub fn range_false_negative_rate(distance: f64, detection_range: f64) -> f64 {
    let distance = if distance <= 0.0 { DISTANCE_EPSILON } else { distance };
    1.0 - (-distance / detection_range).exp()
}

/// 観測結果のシミュレーション
///
/// 一様乱数を1回だけ引き、真のラベルが戦闘員なら確率 `false_negative_rate` で
/// 民間人と、民間人なら確率 `false_positive_rate` で戦闘員と報告します。
/// 比較は厳密な `<` なので、率0では決して誤らず、率1では必ず誤ります。
pub fn simulate_detection<R: Rng>(
    true_label: Label,
    false_negative_rate: f64,
    false_positive_rate: f64,
    rng: &mut R,
) -> Label {
    let draw: f64 = rng.gen_range(0.0..1.0);
    match true_label {
        Label::Combatant => {
            if draw < false_negative_rate {
                Label::Civilian
            } else {
                Label::Combatant
            }
        }
        Label::Civilian => {
            if draw < false_positive_rate {
                Label::Combatant
            } else {
                Label::Civilian
            }
        }
    }
}
