mod logging;
mod models;
mod scenario;
mod simulation;
mod states;

use std::str::FromStr;

use clap::{Arg, ArgAction, Command};
use logging::{init_logging, level_for_verbosity, parse_log_level, LogConfig, LogOutput};
use scenario::ScenarioConfig;
use simulation::SimulationEngine;

fn main() {
    let matches = Command::new("planetdef")
        .version("0.1.0")
        .about("惑星防衛 敵AIシミュレーション (Planet Defense Enemy AI)")
        .long_about(
            "球形の惑星上と軌道上で行動する敵ユニットのAIを、\n\
             データ駆動型のステート機械で時間駆動シミュレーションします。",
        )
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
                .conflicts_with("demo"),
        )
        .arg(
            Arg::new("demo")
                .short('d')
                .long("demo")
                .action(ArgAction::SetTrue)
                .help("組み込みのデモシナリオを実行"),
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: デバッグ)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("ログレベル (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("OUTPUT")
                .default_value("console")
                .help("ログ出力先 (console, file, both)"),
        )
        .get_matches();

    let verbose_level = matches.get_count("verbose");

    let level = match matches.get_one::<String>("log-level") {
        Some(level) => parse_log_level(level),
        None => level_for_verbosity(verbose_level),
    };
    let output = match matches.get_one::<String>("log-output").map(|s| LogOutput::from_str(s)) {
        Some(Ok(output)) => output,
        Some(Err(e)) => {
            eprintln!("エラー: {}", e);
            std::process::exit(2);
        }
        None => LogOutput::Console,
    };

    let _log_guard = match init_logging(LogConfig {
        level,
        output,
        ..LogConfig::default()
    }) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
    };

    println!("惑星防衛 敵AIシミュレーション - planetdef v0.1.0");
    println!();

    let scenario = if matches.get_flag("demo") {
        Ok(ScenarioConfig::demo())
    } else if let Some(path) = matches.get_one::<String>("scenario") {
        ScenarioConfig::from_file(path)
    } else {
        show_default_help();
        return;
    };

    let result = scenario
        .map_err(Box::<dyn std::error::Error>::from)
        .and_then(|scenario| run_scenario(scenario, matches.get_flag("info"), verbose_level));

    if let Err(e) = result {
        eprintln!("エラー: {}", e);
        std::process::exit(1);
    }
}

/// シナリオを実行（情報表示のみの場合は概要を表示して終了）
fn run_scenario(
    scenario: ScenarioConfig,
    info_only: bool,
    verbose_level: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    scenario.print_summary();
    println!();

    if info_only {
        return Ok(());
    }

    let mut simulation = SimulationEngine::new(scenario, verbose_level);
    simulation.initialize()?;

    let report = simulation.run();
    println!();
    report.print_summary();

    Ok(())
}

/// デフォルトヘルプとシナリオ一覧を表示
fn show_default_help() {
    println!("使用方法:");
    println!("  planetdef [オプション]");
    println!();
    println!("オプション:");
    println!("  -s, --scenario <FILE>     シナリオファイルを指定して実行");
    println!("  -d, --demo                組み込みのデモシナリオを実行");
    println!("  -i, --info                シナリオ情報のみ表示");
    println!("  -v, --verbose             詳細出力 (複数指定で詳細レベル上昇)");
    println!("      --log-level <LEVEL>   ログレベル");
    println!("      --log-output <OUTPUT> ログ出力先 (console, file, both)");
    println!("  -h, --help                このヘルプを表示");
    println!();
    println!("利用可能なシナリオファイル:");
    println!("  scenarios/scenario_orbit.yaml    - 軌道上からの攻撃");
    println!("  scenarios/scenario_surface.yaml  - 地表部隊の攻撃");
    println!();
    println!("例:");
    println!("  planetdef -s scenarios/scenario_orbit.yaml");
    println!("  planetdef -s scenarios/scenario_surface.yaml -vv --log-output both");
    println!("  planetdef --demo -i");
}
