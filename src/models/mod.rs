// 基本的なデータ型と幾何ユーティリティ
pub mod common;

// エージェントの基本インターフェース（trait）定義
pub mod traits;

// 各エージェントモデルの実装
pub mod sensor;
pub mod lethal;
pub mod warfighter;
pub mod unknown;

// 便利な re-export
pub use common::*;
pub use traits::*;
pub use sensor::{SensorPlatform, simulate_detection, range_false_negative_rate};
pub use lethal::LethalPlatform;
pub use warfighter::Warfighter;
pub use unknown::{Label, UnknownAgent, INITIAL_BELIEF};
