//! # opsim
//!
//! 不明エージェントを戦闘員・民間人に分類しながら行動する
//! センサー／致死性プラットフォームの時間駆動型マルチエージェントシミュレーション。
//!
//! - [`belief`]: ノイズのあるセンサー観測によるベイズ更新
//! - [`policy`]: 貪欲方策とシナリオ別ヒューリスティック方策
//! - [`engagement`]: 距離と確率閾値による交戦判定
//! - [`simulation`]: ティック駆動のエンジン
//! - [`trials`]: 独立した試行を並列実行して平均を集計

pub mod belief;
pub mod engagement;
pub mod error;
pub mod logging;
pub mod models;
pub mod policy;
pub mod render;
pub mod scenario;
pub mod simulation;
pub mod trials;

pub use error::{ScenarioError, SimError};
pub use scenario::{Scenario, ScenarioConfig};
pub use simulation::{Outcome, SimulationEngine};
