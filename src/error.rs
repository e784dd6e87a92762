//! # Error モジュール
//!
//! シミュレーション全体で使うエラー型を定義します。
//!
//! - 構築時の検証エラー（不正なシナリオ番号や閾値）は `InvalidArgument`
//! - 実行中の不変条件違反（確率の範囲外、真のラベルの変化など）は `InvariantViolation`
//! - シナリオファイルの読み込み失敗は `Scenario`

use std::path::PathBuf;
use thiserror::Error;

/// シミュレーションのエラー
#[derive(Debug, Error)]
pub enum SimError {
    /// 構築時の引数検証エラー（シミュレーションは生成されない）
    #[error("不正な引数: {0}")]
    InvalidArgument(String),

    /// 実行中の不変条件違反（ロジックの欠陥を示し、実行を中断する）
    #[error("不変条件違反: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    /// モンテカルロ試行のランタイム・タスクの失敗
    #[error("試行の実行に失敗: {0}")]
    TrialFailed(String),
}

/// シナリオ読み込みエラー
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("シナリオファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("ファイル読み込みエラー {}: {}", .0.display(), .1)]
    IoError(PathBuf, #[source] std::io::Error),

    #[error("YAML解析エラー {}: {}", .0.display(), .1)]
    ParseError(PathBuf, #[source] serde_yaml::Error),

    #[error("設定検証エラー: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SimError::InvalidArgument("tau must be in [0, 1]".to_string());
        assert_eq!(err.to_string(), "不正な引数: tau must be in [0, 1]");

        let err: SimError = ScenarioError::FileNotFound(PathBuf::from("missing.yaml")).into();
        assert_eq!(err.to_string(), "シナリオファイルが見つかりません: missing.yaml");
    }
}
