use anyhow::Result;
use std::io::{self, Write};

use terra_tracker::config::Config;
use terra_tracker::dataset::TemperatureTable;
use terra_tracker::driver::{FrameDriver, FrameSummary};
use terra_tracker::pose::{Keypoint, KeypointIndex, Pose};
use terra_tracker::scene::ConsoleOverlay;

const CONFIG_PATH: &str = "config.toml";
const SOURCE_WIDTH: f32 = 640.0;
const SOURCE_HEIGHT: f32 = 480.0;

fn main() -> Result<()> {
    let config = Config::load_or_default(CONFIG_PATH);
    let table = TemperatureTable::from_config(&config.dataset)?;
    let frame_ms = 1000.0 / config.app.target_fps as f64;

    println!("=== Terra Tracker - Pipeline Test ===");
    println!("ソース解像度: {}x{}", SOURCE_WIDTH, SOURCE_HEIGHT);
    println!();
    println!("コマンド:");
    println!("  a x y         - 全キーポイントをピクセル(x, y)に置く (例: a 320 240)");
    println!("  t             - 球に触れる (画面中央に置く)");
    println!("  r             - 球から離す (画面の隅に置く)");
    println!("  0             - 姿勢なしにする");
    println!("  s n           - nフレーム進める (例: s 30)");
    println!("  i             - 現在の状態を表示");
    println!("  q             - 終了");
    println!();

    let mut driver = FrameDriver::new(&config, table, SOURCE_WIDTH, SOURCE_HEIGHT, 42);
    let mut overlay = ConsoleOverlay;
    driver.prime(&mut overlay);

    let mut poses: Vec<Pose> = Vec::new();
    let mut now_ms = 0.0_f64;

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let parts: Vec<&str> = input.trim().split_whitespace().collect();

        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "a" if parts.len() == 3 => {
                let x: f32 = parts[1].parse()?;
                let y: f32 = parts[2].parse()?;
                poses = vec![uniform_pose(x, y)];
                println!("姿勢: 全キーポイント ({}, {})", x, y);
            }
            "t" => {
                poses = vec![uniform_pose(SOURCE_WIDTH / 2.0, SOURCE_HEIGHT / 2.0)];
                println!("姿勢: 接触位置");
            }
            "r" => {
                poses = vec![uniform_pose(10.0, 10.0)];
                println!("姿勢: 非接触位置");
            }
            "0" => {
                poses.clear();
                println!("姿勢なし");
            }
            "s" if parts.len() == 2 => {
                let n: u32 = parts[1].parse()?;
                let mut last = FrameSummary::default();
                for _ in 0..n {
                    last = driver.step(now_ms, &poses, &mut overlay);
                    now_ms += frame_ms;
                }
                println!(
                    "{}フレーム進めました (衝突: {}, 前進: {})",
                    n, last.colliding_poses, last.advances
                );
            }
            "i" => {
                let state = driver.state();
                println!("フレーム: {}", state.frame_count);
                println!("distortionFactor: {:.5}", state.distortion.factor());
                println!("distortionSpeed: {:.6}", state.distortion.speed());
                println!("avgSpeed: {:.4}", state.motion.avg_speed());
                println!("targetSpeed: {:.4}", state.motion.target_speed());
                println!("rotationY: {:.4}", state.rotation_y);
                println!(
                    "年: {} ({}°C)",
                    driver.table().current_year(),
                    driver.table().current_temperature()
                );
                println!("粒子バッチ: {}", driver.particles().batches().len());
            }
            "q" => {
                driver.teardown();
                println!("終了します");
                break;
            }
            _ => {
                println!("不明なコマンド: {}", parts[0]);
            }
        }
    }

    Ok(())
}

fn uniform_pose(x: f32, y: f32) -> Pose {
    Pose::new([Keypoint::new(x, y, 0.9); KeypointIndex::COUNT])
}
