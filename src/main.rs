use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use tracing::{error, info};

use opsim::error::SimError;
use opsim::logging::{init_logging, level_from_verbosity, parse_log_level, LogConfig, LogOutput};
use opsim::policy::PolicyMode;
use opsim::scenario::ScenarioConfig;
use opsim::simulation::SimulationEngine;
use opsim::trials::run_trials;

fn main() {
    // コマンドライン引数の解析
    let matches = Command::new("opsim")
        .version(env!("CARGO_PKG_VERSION"))
        .about("戦闘員識別シミュレーション (Operations Simulation)")
        .long_about("センサーと致死性プラットフォームが不明エージェントを分類しながら行動する\n\
                     時間駆動型マルチエージェントシミュレーションです。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
                .long_help("シナリオファイル(.yaml)のパスを指定します。\n\
                           指定しない場合、既定の設定で実行されます。")
        )
        .arg(
            Arg::new("scenario-id")
                .short('n')
                .long("scenario-id")
                .value_name("1|2|3")
                .value_parser(value_parser!(u8))
                .help("シナリオ番号 (1: 平和維持, 2: ゲリラ, 3: 交戦地帯)")
        )
        .arg(
            Arg::new("tau")
                .long("tau")
                .value_name("FLOAT")
                .value_parser(value_parser!(f64))
                .help("分類閾値 [0, 1]")
        )
        .arg(
            Arg::new("policy")
                .short('p')
                .long("policy")
                .value_name("MODE")
                .value_parser(|s: &str| s.parse::<PolicyMode>())
                .help("移動方策 (greedy | heuristic)")
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("N")
                .value_parser(value_parser!(u64))
                .help("乱数シード")
        )
        .arg(
            Arg::new("render")
                .short('r')
                .long("render")
                .action(ArgAction::SetTrue)
                .help("各ティックのフレームを PNG で書き出す")
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .help("フレームの出力先ディレクトリ")
        )
        .arg(
            Arg::new("trials")
                .long("trials")
                .value_name("N")
                .value_parser(value_parser!(u32).range(1..))
                .help("モンテカルロ試行回数（指定時は平均値を表示）")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("詳細出力レベル (-v: info, -vv: debug, -vvv: trace)")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("ログレベル (trace, debug, info, warn, error)")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("OUTPUT")
                .value_parser(|s: &str| s.parse::<LogOutput>())
                .default_value("console")
                .help("ログ出力先 (console, file, both)")
        )
        .get_matches();

    let verbose_level = matches.get_count("verbose");
    let log_config = LogConfig {
        level: matches
            .get_one::<String>("log-level")
            .map(|s| parse_log_level(s))
            .unwrap_or_else(|| level_from_verbosity(verbose_level)),
        output: matches
            .get_one::<LogOutput>("log-output")
            .copied()
            .unwrap_or(LogOutput::Console),
        ..LogConfig::default()
    };

    // ファイル出力のガードはプロセス終了まで保持する
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("ログの初期化に失敗しました: {}", e);
            None
        }
    };

    if let Err(e) = run(&matches) {
        error!(error = %e, "実行に失敗しました");
        eprintln!("エラー: {}", e);
        std::process::exit(1);
    }
}

/// 設定を組み立てて実行
fn run(matches: &ArgMatches) -> Result<(), SimError> {
    let mut config = match matches.get_one::<String>("scenario") {
        Some(path) => {
            let config = ScenarioConfig::read_file(path)?;
            info!(path = %path, "シナリオファイル読み込み完了");
            config
        }
        None => ScenarioConfig::default(),
    };
    apply_overrides(&mut config, matches);
    config.validate()?;

    if matches.get_flag("info") {
        config.print_summary();
        return Ok(());
    }

    match matches.get_one::<u32>("trials") {
        Some(&trials) => {
            let summary = run_trials(&config, trials)?;
            summary.print_report();
        }
        None => {
            let mut simulation = SimulationEngine::new(config)?;
            let outcome = simulation.run()?;
            outcome.print_stats();
        }
    }

    Ok(())
}

/// コマンドライン引数で設定を上書き
fn apply_overrides(config: &mut ScenarioConfig, matches: &ArgMatches) {
    if let Some(&scenario) = matches.get_one::<u8>("scenario-id") {
        config.policy.scenario = scenario;
    }
    if let Some(&tau) = matches.get_one::<f64>("tau") {
        config.policy.tau = tau;
    }
    if let Some(&mode) = matches.get_one::<PolicyMode>("policy") {
        config.policy.mode = mode;
    }
    if let Some(&seed) = matches.get_one::<u64>("seed") {
        config.sim.seed = seed;
    }
    if matches.get_flag("render") {
        config.render.enabled = true;
    }
    if let Some(dir) = matches.get_one::<String>("output-dir") {
        config.render.output_dir = dir.clone();
    }
}
