use serde::{Deserialize, Serialize};
use std::path::Path;
use std::fs;

use crate::error::{ScenarioError, SimError};
use crate::policy::PolicyMode;
use crate::render::{frame_side, MAX_FRAME_SIDE};

/// 作戦シナリオ（戦闘員の事前確率と方策の種類を決める）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// 平和維持活動、戦闘員は少数（10%）
    Peacekeeping = 1,
    /// 平和維持活動、ゲリラ勢力あり（30%）
    Guerrilla = 2,
    /// 交戦地帯、民間人は少数（80%）
    WarZone = 3,
}

impl Scenario {
    /// 不明エージェントが戦闘員である事前確率
    pub fn combatant_prior(&self) -> f64 {
        match self {
            Scenario::Peacekeeping => 0.1,
            Scenario::Guerrilla => 0.3,
            Scenario::WarZone => 0.8,
        }
    }

    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Peacekeeping => "peacekeeping",
            Scenario::Guerrilla => "guerrilla",
            Scenario::WarZone => "war zone",
        }
    }
}

impl TryFrom<u8> for Scenario {
    type Error = SimError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Scenario::Peacekeeping),
            2 => Ok(Scenario::Guerrilla),
            3 => Ok(Scenario::WarZone),
            _ => Err(SimError::InvalidArgument(format!(
                "scenario number not recognized: {} (expected 1, 2 or 3)",
                value
            ))),
        }
    }
}

/// シナリオメタデータ
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    pub description: String,
}

impl Default for ScenarioMeta {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: "default".to_string(),
            description: "センサー・致死性プラットフォームによる戦闘員識別シミュレーション".to_string(),
        }
    }
}

/// シミュレーション設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// 実行するティック数
    pub end_time: u32,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            end_time: 50,
            seed: 0,
        }
    }
}

/// 世界設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorldConfig {
    /// 初期配置と目標地点の範囲 `[0, xy_size)`
    pub xy_size: f64,
    /// 戦闘員と致死性プラットフォームの交戦半径
    pub lethal_radius: f64,
    /// 目標地点に到達したとみなす距離
    pub goal_reach_radius: f64,
    pub num_sensors: usize,
    pub num_lethal: usize,
    pub num_humans: usize,
    pub num_unknown: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            xy_size: 50.0,
            lethal_radius: 10.0,
            goal_reach_radius: 4.0,
            num_sensors: 2,
            num_lethal: 2,
            num_humans: 4,
            num_unknown: 4,
        }
    }
}

/// センサー観測モデル設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SensingConfig {
    pub detection_range: f64,
    /// 距離に依存しない誤検知率
    pub false_positive_rate: f64,
}

impl Default for SensingConfig {
    fn default() -> Self {
        Self {
            detection_range: 20.0,
            false_positive_rate: 0.05,
        }
    }
}

/// プラットフォームの移動性能
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub sensor_step: f64,
    pub lethal_step: f64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            sensor_step: 2.0,
            lethal_step: 1.5,
        }
    }
}

/// 戦術ポリシー設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// シナリオ番号（1, 2, 3）
    pub scenario: u8,
    /// 分類閾値（belief > tau で敵と推定）
    pub tau: f64,
    pub mode: PolicyMode,
    /// 人間にこの距離以内の不明エージェントを「危険な接近」とみなす
    pub danger_radius: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            scenario: 1,
            tau: 0.5,
            mode: PolicyMode::Heuristic,
            danger_radius: 15.0,
        }
    }
}

/// 描画設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    pub enabled: bool,
    pub output_dir: String,
    /// 世界座標1単位あたりのピクセル数
    pub scale: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output_dir: "frames".to_string(),
            scale: 10,
        }
    }
}

/// 完全なシナリオ設定
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub sim: SimulationConfig,
    pub world: WorldConfig,
    pub sensing: SensingConfig,
    pub platforms: PlatformConfig,
    pub policy: PolicyConfig,
    pub render: RenderConfig,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み、検証する
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// YAMLファイルを読み込む（検証はしない）
    ///
    /// コマンドライン引数で上書きしてから検証する場合に使います。
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()).into());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::IoError(path.to_path_buf(), e))?;

        let config = Self::from_yaml_str(&contents)
            .map_err(|e| ScenarioError::ParseError(path.to_path_buf(), e))?;

        Ok(config)
    }

    /// YAML文字列から読み込み（検証はしない）
    pub fn from_yaml_str(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    /// 設定されたシナリオ
    pub fn scenario(&self) -> Result<Scenario, SimError> {
        Scenario::try_from(self.policy.scenario)
    }

    /// 設定の検証
    ///
    /// シナリオ番号と閾値の誤りは `InvalidArgument`、
    /// それ以外の数値の誤りは `ScenarioError::ValidationError` になります。
    pub fn validate(&self) -> Result<(), SimError> {
        self.scenario()?;

        if !(0.0..=1.0).contains(&self.policy.tau) {
            return Err(SimError::InvalidArgument(format!(
                "tau must be a float in [0, 1], got {}",
                self.policy.tau
            )));
        }

        let positive = [
            ("world.xy_size", self.world.xy_size),
            ("world.lethal_radius", self.world.lethal_radius),
            ("world.goal_reach_radius", self.world.goal_reach_radius),
            ("sensing.detection_range", self.sensing.detection_range),
            ("platforms.sensor_step", self.platforms.sensor_step),
            ("platforms.lethal_step", self.platforms.lethal_step),
            ("policy.danger_radius", self.policy.danger_radius),
        ];
        for (name, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ScenarioError::ValidationError(format!("{} must be positive", name)).into());
            }
        }

        if !(0.0..=1.0).contains(&self.sensing.false_positive_rate) {
            return Err(ScenarioError::ValidationError(
                "sensing.false_positive_rate must be in [0, 1]".to_string(),
            ).into());
        }

        if self.render.enabled {
            if self.render.scale == 0 {
                return Err(ScenarioError::ValidationError("render.scale must be positive".to_string()).into());
            }
            if frame_side(self.world.xy_size, self.render.scale).is_none() {
                return Err(ScenarioError::ValidationError(format!(
                    "world.xy_size * render.scale must not exceed {} pixels",
                    MAX_FRAME_SIDE
                )).into());
            }
        }

        Ok(())
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        match self.scenario() {
            Ok(scenario) => println!(
                "シナリオ: {} ({}, 戦闘員比率 {:.0}%)",
                scenario.id(),
                scenario.name(),
                scenario.combatant_prior() * 100.0
            ),
            Err(_) => println!("シナリオ: {} (不正)", self.policy.scenario),
        }
        println!("分類閾値 tau: {:.3}", self.policy.tau);
        println!("移動方策: {}", self.policy.mode);
        println!("ティック数: {}", self.sim.end_time);
        println!("シード値: {}", self.sim.seed);
        println!();

        println!("=== 世界 ===");
        println!("領域: {:.0} x {:.0}", self.world.xy_size, self.world.xy_size);
        println!("交戦半径: {:.1}", self.world.lethal_radius);
        println!("センサー: {}基 (探知範囲 {:.1}, 歩幅 {:.1})",
                 self.world.num_sensors, self.sensing.detection_range, self.platforms.sensor_step);
        println!("致死性プラットフォーム: {}基 (歩幅 {:.1})",
                 self.world.num_lethal, self.platforms.lethal_step);
        println!("人間の戦闘員: {}名", self.world.num_humans);
        println!("不明エージェント: {}体", self.world.num_unknown);
        if self.render.enabled {
            println!("描画出力: {}", self.render.output_dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ScenarioConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sim.end_time, 50);
        assert_eq!(config.world.num_unknown, 4);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
meta:
  name: guerrilla test
sim:
  seed: 99
policy:
  scenario: 2
  tau: 0.3
  mode: greedy
"#;
        let config = ScenarioConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.meta.name, "guerrilla test");
        assert_eq!(config.sim.seed, 99);
        assert_eq!(config.sim.end_time, 50);
        assert_eq!(config.policy.mode, PolicyMode::Greedy);
        assert_eq!(config.scenario().unwrap(), Scenario::Guerrilla);
        assert_eq!(config.world.lethal_radius, 10.0);
    }

    #[test]
    fn test_invalid_scenario_and_tau() {
        let mut config = ScenarioConfig::default();
        config.policy.scenario = 0;
        assert!(matches!(config.validate(), Err(SimError::InvalidArgument(_))));

        let mut config = ScenarioConfig::default();
        config.policy.tau = 1.5;
        assert!(matches!(config.validate(), Err(SimError::InvalidArgument(_))));

        config.policy.tau = -0.1;
        assert!(matches!(config.validate(), Err(SimError::InvalidArgument(_))));
    }

    #[test]
    fn test_invalid_world_values() {
        let mut config = ScenarioConfig::default();
        config.world.lethal_radius = 0.0;
        assert!(matches!(
            config.validate(),
            Err(SimError::Scenario(ScenarioError::ValidationError(_)))
        ));

        let mut config = ScenarioConfig::default();
        config.sensing.false_positive_rate = 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scenario_priors() {
        assert_eq!(Scenario::try_from(1).unwrap().combatant_prior(), 0.1);
        assert_eq!(Scenario::try_from(2).unwrap().combatant_prior(), 0.3);
        assert_eq!(Scenario::try_from(3).unwrap().combatant_prior(), 0.8);
        assert!(Scenario::try_from(4).is_err());
    }

    #[test]
    fn test_oversized_render_is_rejected() {
        let mut config = ScenarioConfig::default();
        config.world.xy_size = 1e6;
        config.render.scale = 10_000;
        assert!(config.validate().is_ok());

        config.render.enabled = true;
        assert!(matches!(
            config.validate(),
            Err(SimError::Scenario(ScenarioError::ValidationError(_)))
        ));

        config.world.xy_size = 50.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_read_file_defers_validation() {
        let path = std::env::temp_dir().join(format!("opsim_bad_tau_{}.yaml", std::process::id()));
        fs::write(&path, "policy:\n  scenario: 2\n  tau: 2.0\n").unwrap();

        assert!(matches!(ScenarioConfig::from_file(&path), Err(SimError::InvalidArgument(_))));

        let mut config = ScenarioConfig::read_file(&path).unwrap();
        assert_eq!(config.policy.scenario, 2);
        assert!(config.validate().is_err());
        config.policy.tau = 0.5;
        assert!(config.validate().is_ok());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file() {
        let result = ScenarioConfig::from_file("does/not/exist.yaml");
        assert!(matches!(result, Err(SimError::Scenario(ScenarioError::FileNotFound(_)))));
    }
}
