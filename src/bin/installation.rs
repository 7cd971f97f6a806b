use anyhow::Result;
use std::fs;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use terra_tracker::config::Config;
use terra_tracker::dataset::TemperatureTable;
use terra_tracker::driver::FrameDriver;
use terra_tracker::pose::{
    Keypoint, KeypointIndex, Pose, PoseEstimator, PoseSource, ThreadedPoseSource,
};
use terra_tracker::scene::{format_overlay, OverlaySink};

const CONFIG_PATH: &str = "config.toml";
const SOURCE_WIDTH: f32 = 640.0;
const SOURCE_HEIGHT: f32 = 480.0;

type LogFile = Arc<Mutex<std::io::BufWriter<std::fs::File>>>;

fn open_log_file() -> Result<LogFile> {
    fs::create_dir_all("logs")?;
    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = format!("logs/installation_{}.log", ts);
    let file = std::fs::File::create(&path)?;
    eprintln!("Log: {}", path);
    Ok(Arc::new(Mutex::new(std::io::BufWriter::new(file))))
}

macro_rules! log {
    ($logfile:expr, $($arg:tt)*) => {{
        let msg = format!($($arg)*);
        println!("{}", msg);
        if let Ok(mut f) = $logfile.lock() {
            let _ = writeln!(f, "{}", msg);
        }
    }};
}

/// 来場者を模した推定器: 画面外→接近→球に触れて揺らす→退場を繰り返す
///
/// 推論レイテンシを模して数ミリ秒眠る。フレームループは
/// ThreadedPoseSource経由で最新の結果だけを拾う。
struct ScriptedVisitor {
    tick: u64,
}

impl ScriptedVisitor {
    fn pose_at(&self, x: f32, y: f32) -> Pose {
        let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
        for (i, kp) in keypoints.iter_mut().enumerate() {
            // 体の各部位を縦にばらけさせる
            *kp = Keypoint::new(x + 5.0 * (i % 3) as f32, y + 20.0 * i as f32, 0.9);
        }
        Pose::new(keypoints)
    }
}

impl PoseEstimator for ScriptedVisitor {
    fn estimate(&mut self) -> Vec<Pose> {
        self.tick += 1;
        thread::sleep(Duration::from_millis(35));

        let phase = self.tick % 240;
        match phase {
            // 退場中
            0..=59 => Vec::new(),
            // 画面端から中央へ接近
            60..=119 => {
                let t = (phase - 60) as f32 / 60.0;
                let x = 40.0 + t * (SOURCE_WIDTH / 2.0 - 40.0);
                vec![self.pose_at(x, 80.0)]
            }
            // 球に触れながら揺れる
            _ => {
                let wobble = ((self.tick as f32) * 0.3).sin() * 60.0;
                vec![self.pose_at(SOURCE_WIDTH / 2.0 + wobble, 80.0)]
            }
        }
    }
}

/// オーバーレイの内容をコンソールとログファイルへ流すシンク
struct LogOverlay {
    logfile: LogFile,
}

impl OverlaySink for LogOverlay {
    fn push(&mut self, year: i32, temp: f32) {
        let msg = format_overlay(year, temp);
        println!("{}", msg);
        if let Ok(mut f) = self.logfile.lock() {
            let _ = writeln!(f, "{}", msg);
        }
    }
}

fn main() -> Result<()> {
    let config = Config::load_or_default(CONFIG_PATH);
    let logfile = open_log_file()?;

    log!(logfile, "Terra Tracker Installation ({})", env!("GIT_VERSION"));
    log!(logfile, "Target FPS: {}", config.app.target_fps);
    log!(logfile, "Globe radius: {}", config.mesh.radius);
    log!(
        logfile,
        "Dataset: {}..{}",
        config.dataset.start_year,
        config.dataset.end_year
    );
    log!(logfile, "");

    let table = TemperatureTable::from_config(&config.dataset)?;
    let mut driver = FrameDriver::new(&config, table, SOURCE_WIDTH, SOURCE_HEIGHT, 42);
    let mut overlay = LogOverlay {
        logfile: logfile.clone(),
    };
    driver.prime(&mut overlay);

    // 姿勢推定は別スレッド: フレームループは最新スナップショットを
    // ノンブロッキングで読むだけ
    let mut source = ThreadedPoseSource::start(ScriptedVisitor { tick: 0 });

    let frame_duration = Duration::from_secs_f64(1.0 / config.app.target_fps as f64);
    let started = Instant::now();
    let mut frame_count: u32 = 0;
    let mut report_timer = Instant::now();

    loop {
        let frame_start = Instant::now();
        let now_ms = started.elapsed().as_secs_f64() * 1000.0;

        let poses = source.snapshot();
        let summary = driver.step(now_ms, &poses, &mut overlay);
        frame_count += 1;

        if report_timer.elapsed() >= Duration::from_secs(1) {
            log!(
                logfile,
                "fps={} poses={} colliding={} factor={:.4} avgSpeed={:.3} batches={}",
                frame_count,
                summary.pose_count,
                summary.colliding_poses,
                summary.distortion_factor,
                summary.avg_speed,
                summary.particle_batches
            );
            frame_count = 0;
            report_timer = Instant::now();
        }

        if let Some(remaining) = frame_duration.checked_sub(frame_start.elapsed()) {
            thread::sleep(remaining);
        }
    }
}
