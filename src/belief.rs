//! # Belief モジュール
//!
//! 不明エージェントごとの戦闘員確率 P(combatant | 観測) を逐次ベイズ更新します。
//!
//! 各ティック、生存中の不明エージェント1体につき観測は最大1回です。
//!
//! 1. 最も近いセンサーまでの距離を求める（探知範囲外なら更新しない）
//! 2. 距離から見逃し率 `p_fn` を求め、誤検知率 `p_fp` は固定値を使う
//! 3. 観測モデルで観測結果を1回引く
//! 4. 現在の確率を事前確率としてベイズの定理を適用する
//!
//! 結果が [0,1] から丸め誤差（1e-12）を超えてはみ出す場合、または正規化定数が
//! ゼロ・非有限の場合は不変条件違反としてそのティックを失敗させます。

use rand::Rng;
use tracing::{error, trace};

use crate::error::SimError;
use crate::models::{
    common::geometry,
    sensor::{range_false_negative_rate, simulate_detection},
    IAgent, Label, Position2D, SensorPlatform, UnknownAgent,
};

/// 丸め誤差として黙ってクランプする許容幅
pub const BELIEF_ROUNDING_TOLERANCE: f64 = 1e-12;

/// 1回の観測結果によるベイズ更新
///
/// `prior` を P(combatant) とし、観測が民間人なら
/// `p_fn·p_com / ((1−p_fp)·p_civ + p_fn·p_com)`、
/// 戦闘員なら `(1−p_fn)·p_com / (p_fp·p_civ + (1−p_fn)·p_com)` を返します。
pub fn bayes_update(prior: f64, outcome: Label, p_fn: f64, p_fp: f64) -> Result<f64, SimError> {
    let p_com = prior;
    let p_civ = 1.0 - prior;

    let (numerator, normalizer) = match outcome {
        Label::Civilian => (p_fn * p_com, (1.0 - p_fp) * p_civ + p_fn * p_com),
        Label::Combatant => ((1.0 - p_fn) * p_com, p_fp * p_civ + (1.0 - p_fn) * p_com),
    };

    if normalizer == 0.0 || !normalizer.is_finite() {
        error!(prior, p_fn, p_fp, outcome = %outcome, "ベイズ更新の正規化定数が不正");
        return Err(SimError::InvariantViolation(format!(
            "degenerate normalizer {} (prior={}, outcome={}, p_fn={}, p_fp={})",
            normalizer, prior, outcome, p_fn, p_fp
        )));
    }

    let posterior = numerator / normalizer;
    if posterior.is_finite()
        && posterior >= -BELIEF_ROUNDING_TOLERANCE
        && posterior <= 1.0 + BELIEF_ROUNDING_TOLERANCE
    {
        Ok(posterior.clamp(0.0, 1.0))
    } else {
        error!(prior, posterior, "事後確率が [0,1] の範囲外");
        Err(SimError::InvariantViolation(format!(
            "posterior {} outside [0, 1] (prior={}, outcome={})",
            posterior, prior, outcome
        )))
    }
}

/// 全不明エージェントの確率を1ティック分更新
///
/// 各エージェントは最も近いセンサー（同距離ならインデックスの小さい方）の
/// 探知範囲と距離で観測されます。戻り値は観測を受けて更新されたエージェント数です。
pub fn update_beliefs<R: Rng>(
    unknowns: &mut [UnknownAgent],
    sensors: &[SensorPlatform],
    false_positive_rate: f64,
    rng: &mut R,
) -> Result<usize, SimError> {
    let sensor_positions: Vec<Position2D> = sensors.iter().map(|s| s.position).collect();
    let unknown_positions: Vec<Position2D> = unknowns.iter().map(|u| u.position).collect();
    let distances = geometry::distance_matrix(&unknown_positions, &sensor_positions);
    let mut updated = 0;

    for (agent, row) in unknowns.iter_mut().zip(&distances) {
        if !agent.is_active() {
            continue;
        }

        let Some(nearest) = geometry::row_argmin(row) else {
            continue;
        };
        let sensor = &sensors[nearest];
        if !sensor.is_in_detection_range(&agent.position) {
            continue;
        }

        let distance = row[nearest];
        let p_fn = range_false_negative_rate(distance, sensor.detection_range);
        let outcome = simulate_detection(agent.ground_truth(), p_fn, false_positive_rate, rng);
        let posterior = bayes_update(agent.belief(), outcome, p_fn, false_positive_rate)?;

        trace!(
            agent = %agent.id,
            sensor = %sensor.id,
            distance,
            outcome = %outcome,
            prior = agent.belief(),
            posterior,
            "確率更新"
        );

        agent.set_belief(posterior)?;
        updated += 1;
    }

    Ok(updated)
}
