use std::ops::{Add, Sub, Mul};

/// ゼロ距離を除算・対数の引数に使わないための置換値
pub const DISTANCE_EPSILON: f64 = 1e-6;

/// 死亡したエージェントに割り当てる番兵距離（最近傍に選ばれないようにする）
pub const DEAD_SENTINEL_DISTANCE: f64 = 1e9;

/// 2次元位置を表す構造体（格子に丸めない連続座標）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position2D {
    pub x: f64,
    pub y: f64,
}

impl Position2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// ユークリッド距離を計算
    pub fn distance(&self, other: &Position2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// ベクトルの長さ（原点からの距離）
    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2)).sqrt()
    }

    /// 目標方向の単位ベクトルに歩幅を掛けた変位を返す
    ///
    /// 目標との距離がゼロの場合は `DISTANCE_EPSILON` で置き換えるため、
    /// 結果はゼロベクトルになります。
    pub fn step_toward(&self, target: &Position2D, step_size: f64) -> Position2D {
        let diff = *target - *self;
        let mut distance = diff.magnitude();
        if distance == 0.0 {
            distance = DISTANCE_EPSILON;
        }
        diff * (step_size / distance)
    }
}

impl Add for Position2D {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Position2D {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Position2D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

/// 幾何ユーティリティ関数
pub mod geometry {
    use super::{Position2D, DEAD_SENTINEL_DISTANCE};

    /// 2つのエージェント群の間の距離行列を計算
    ///
    /// `result[i][j]` は `from[i]` と `to[j]` の距離です。
    pub fn distance_matrix(from: &[Position2D], to: &[Position2D]) -> Vec<Vec<f64>> {
        from.iter()
            .map(|a| to.iter().map(|b| a.distance(b)).collect())
            .collect()
    }

    /// 距離列の最小値のインデックス（同距離なら小さいインデックス、空なら None）
    pub fn row_argmin(row: &[f64]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, &distance) in row.iter().enumerate() {
            match best {
                Some((_, best_distance)) if best_distance <= distance => {}
                _ => best = Some((index, distance)),
            }
        }
        best.map(|(index, _)| index)
    }

    /// 距離列の最小値（空なら番兵距離）
    pub fn row_min(row: &[f64]) -> f64 {
        row.iter().copied().fold(DEAD_SENTINEL_DISTANCE, f64::min)
    }

    /// 対象外の候補を番兵距離にした距離列を作成
    pub fn masked_distances<F>(origin: &Position2D, candidates: &[Position2D], eligible: F) -> Vec<f64>
    where
        F: Fn(usize) -> bool,
    {
        candidates
            .iter()
            .enumerate()
            .map(|(index, position)| {
                if eligible(index) {
                    origin.distance(position)
                } else {
                    DEAD_SENTINEL_DISTANCE
                }
            })
            .collect()
    }

    /// 条件を満たす候補の中で最も近いもののインデックス
    ///
    /// 同距離の場合はインデックスの小さい方（先に見つかった方）を返します。
    /// 対象が一つもない場合は `None`。
    pub fn nearest_index<F>(origin: &Position2D, candidates: &[Position2D], eligible: F) -> Option<usize>
    where
        F: Fn(usize) -> bool,
    {
        let mut best: Option<(usize, f64)> = None;
        for (index, distance) in masked_distances(origin, candidates, &eligible).into_iter().enumerate() {
            if !eligible(index) {
                continue;
            }
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((index, distance)),
            }
        }
        best.map(|(index, _)| index)
    }

    /// 条件を満たす候補までの最短距離（対象がなければ番兵距離）
    pub fn nearest_distance<F>(origin: &Position2D, candidates: &[Position2D], eligible: F) -> f64
    where
        F: Fn(usize) -> bool,
    {
        row_min(&masked_distances(origin, candidates, eligible))
    }

    /// 8近傍の1マス分の移動量（各軸の符号、同値なら0）
    pub fn sign_step(from: &Position2D, to: &Position2D) -> Position2D {
        Position2D::new(axis_sign(to.x - from.x), axis_sign(to.y - from.y))
    }

    // f64::signum は 0.0 に対して 1.0 を返すため使わない
    fn axis_sign(value: f64) -> f64 {
        if value > 0.0 {
            1.0
        } else if value < 0.0 {
            -1.0
        } else {
            0.0
        }
    }
}
