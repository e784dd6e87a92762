//! # Render モジュール
//!
//! 各ティックの世界の状態を PNG 画像として書き出します。
//!
//! 描画は結果の統計に影響しない副作用のみの出力先です。書き込みに失敗しても
//! 警告ログを出してシミュレーションを続行します。
//!
//! | 種別 | 色 | 形 |
//! |------|----|----|
//! | センサー | 緑 | 上向き三角 |
//! | 致死性プラットフォーム | 紫 | 下向き三角 |
//! | 人間の戦闘員 | 青 | 円 |
//! | 敵と推定（belief > tau） | 赤 | X |
//! | 不明 | 黒 | ひし形 |

use image::error::{LimitError, LimitErrorKind};
use image::{ImageError, Rgb, RgbImage};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::models::Position2D;
use crate::simulation::StateSnapshot;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const SENSOR_COLOR: Rgb<u8> = Rgb([0, 128, 0]);
const LETHAL_COLOR: Rgb<u8> = Rgb([128, 0, 128]);
const HUMAN_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const ENEMY_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const UNKNOWN_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// フレーム1辺の最大ピクセル数
pub const MAX_FRAME_SIDE: u32 = 16_384;

/// マーカーの半径（ピクセル）
const MARKER_RADIUS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Marker {
    TriangleUp,
    TriangleDown,
    Circle,
    Cross,
    Diamond,
}

impl Marker {
    /// マーカー中心からの相対ピクセル (dx, dy) が塗られるか（dy は下向き正）
    fn covers(&self, dx: i64, dy: i64) -> bool {
        let r = MARKER_RADIUS;
        match self {
            // 頂点が上、底辺が下
            Marker::TriangleUp => dy.abs() <= r && 2 * dx.abs() <= dy + r,
            Marker::TriangleDown => dy.abs() <= r && 2 * dx.abs() <= r - dy,
            Marker::Circle => dx * dx + dy * dy <= r * r,
            Marker::Cross => dx.abs() <= r && ((dx - dy).abs() <= 1 || (dx + dy).abs() <= 1),
            Marker::Diamond => dx.abs() + dy.abs() <= r,
        }
    }
}

/// フレーム描画器
#[derive(Debug, Clone)]
pub struct FrameRenderer {
    pub output_dir: PathBuf,
    /// 世界座標1単位あたりのピクセル数
    pub scale: u32,
    pub xy_size: f64,
    pub tau: f64,
    dir_ready: bool,
}

impl FrameRenderer {
    pub fn new<P: AsRef<Path>>(output_dir: P, scale: u32, xy_size: f64, tau: f64) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            scale,
            xy_size,
            tau,
            dir_ready: false,
        }
    }

    /// フレーム1辺のピクセル数（上限を超える場合は None）
    pub fn frame_side(&self) -> Option<u32> {
        frame_side(self.xy_size, self.scale)
    }

    /// `frame_{tick:03}.png` のパス
    pub fn frame_path(&self, tick: u32) -> PathBuf {
        self.output_dir.join(format!("frame_{:03}.png", tick))
    }

    /// 1フレームを書き出す
    ///
    /// 失敗した場合は警告ログを出して `false` を返します（シミュレーションは継続）。
    pub fn render(&mut self, tick: u32, snapshot: &StateSnapshot) -> bool {
        match self.try_render(tick, snapshot) {
            Ok(path) => {
                debug!(tick, path = %path.display(), "フレームを書き出しました");
                true
            }
            Err(e) => {
                warn!(tick, error = %e, "フレームの書き出しに失敗しました（続行）");
                false
            }
        }
    }

    fn try_render(&mut self, tick: u32, snapshot: &StateSnapshot) -> Result<PathBuf, ImageError> {
        let side = self.frame_side().ok_or_else(|| {
            ImageError::Limits(LimitError::from_kind(LimitErrorKind::DimensionError))
        })?;
        if !self.dir_ready {
            std::fs::create_dir_all(&self.output_dir)?;
            self.dir_ready = true;
        }
        let image = self.draw_sized(snapshot, side);
        let path = self.frame_path(tick);
        image.save(&path)?;
        Ok(path)
    }

    /// スナップショットを画像に描画（死亡したエージェントは描かない）
    ///
    /// 1辺は `MAX_FRAME_SIDE` で頭打ちになります。
    pub fn draw(&self, snapshot: &StateSnapshot) -> RgbImage {
        self.draw_sized(snapshot, self.frame_side().unwrap_or(MAX_FRAME_SIDE))
    }

    fn draw_sized(&self, snapshot: &StateSnapshot, side: u32) -> RgbImage {
        let mut image = RgbImage::from_pixel(side, side, BACKGROUND);

        for position in &snapshot.sensors {
            self.stamp(&mut image, position, Marker::TriangleUp, SENSOR_COLOR);
        }
        for position in &snapshot.lethals {
            self.stamp(&mut image, position, Marker::TriangleDown, LETHAL_COLOR);
        }
        for human in snapshot.humans.iter().filter(|h| h.alive) {
            self.stamp(&mut image, &human.position, Marker::Circle, HUMAN_COLOR);
        }
        for agent in snapshot.unknowns.iter().filter(|u| u.alive) {
            if agent.belief > self.tau {
                self.stamp(&mut image, &agent.position, Marker::Cross, ENEMY_COLOR);
            } else {
                self.stamp(&mut image, &agent.position, Marker::Diamond, UNKNOWN_COLOR);
            }
        }

        image
    }

    /// 世界座標をピクセル座標に変換（y軸は上向き）
    fn to_pixel(&self, position: &Position2D, side: u32) -> (i64, i64) {
        let scale = self.scale as f64;
        let px = (position.x * scale).round() as i64;
        let py = side as i64 - 1 - (position.y * scale).round() as i64;
        (px, py)
    }

    fn stamp(&self, image: &mut RgbImage, position: &Position2D, marker: Marker, color: Rgb<u8>) {
        let (width, height) = image.dimensions();
        let (cx, cy) = self.to_pixel(position, height);
        for dy in -MARKER_RADIUS..=MARKER_RADIUS {
            for dx in -MARKER_RADIUS..=MARKER_RADIUS {
                if !marker.covers(dx, dy) {
                    continue;
                }
                let (x, y) = (cx + dx, cy + dy);
                if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                    image.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }
}

/// 世界の大きさと倍率から1辺のピクセル数を求める（上限超過や非有限なら None）
pub fn frame_side(xy_size: f64, scale: u32) -> Option<u32> {
    let side = (xy_size * scale as f64).ceil();
    if side.is_finite() && side <= MAX_FRAME_SIDE as f64 {
        Some((side as u32).max(1))
    } else {
        None
    }
}
