use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use super::keypoint::Pose;

/// 姿勢推定器のインターフェース
///
/// モデルの読み込み・推論はこのクレートの外側の責務。
/// 実装は1回の推定で現在検出中の全姿勢を返す（誰もいなければ空）。
pub trait PoseEstimator: Send + 'static {
    fn estimate(&mut self) -> Vec<Pose>;
}

/// フレームループへ姿勢を供給するソース
///
/// 取得は常にノンブロッキング。新しい推定が間に合っていなければ
/// 前回のスナップショットがそのまま返る。
pub trait PoseSource {
    /// 最新の姿勢スナップショットを取得
    fn snapshot(&mut self) -> Vec<Pose>;
}

/// 別スレッドで姿勢推定を行い、最新結果のみを提供する
///
/// キューは持たない: 推定スレッドは同じスロットを上書きし続け、
/// フレームループは読むだけ。推定がフレームレートより遅い場合は
/// 同じスナップショットが繰り返し返る。
pub struct ThreadedPoseSource {
    latest: Arc<Mutex<Vec<Pose>>>,
    generation: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    _handle: thread::JoinHandle<()>,
}

impl ThreadedPoseSource {
    pub fn start<E: PoseEstimator>(mut estimator: E) -> Self {
        let latest = Arc::new(Mutex::new(Vec::new()));
        let latest_ref = latest.clone();
        let generation = Arc::new(AtomicU64::new(0));
        let generation_ref = generation.clone();
        let running = Arc::new(AtomicBool::new(true));
        let running_ref = running.clone();

        let handle = thread::spawn(move || {
            while running_ref.load(Ordering::Acquire) {
                let poses = estimator.estimate();
                *latest_ref.lock().unwrap() = poses;
                generation_ref.fetch_add(1, Ordering::Release);
            }
        });

        Self {
            latest,
            generation,
            running,
            _handle: handle,
        }
    }

    /// 現在の世代番号。新しい推定結果が書き込まれるたびにインクリメントされる。
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// 推定スレッドを停止する。次の推定完了後にスレッドが終了する。
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }
}

impl PoseSource for ThreadedPoseSource {
    fn snapshot(&mut self) -> Vec<Pose> {
        self.latest.lock().unwrap().clone()
    }
}

impl Drop for ThreadedPoseSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// 事前に用意したフレーム列を順に返すソース（テスト・デモ用）
///
/// 列が尽きたら最後のフレームを返し続ける。
pub struct ScriptedPoseSource {
    frames: Vec<Vec<Pose>>,
    cursor: usize,
}

impl ScriptedPoseSource {
    pub fn new(frames: Vec<Vec<Pose>>) -> Self {
        Self { frames, cursor: 0 }
    }
}

impl PoseSource for ScriptedPoseSource {
    fn snapshot(&mut self) -> Vec<Pose> {
        if self.frames.is_empty() {
            return Vec::new();
        }
        let idx = self.cursor.min(self.frames.len() - 1);
        if self.cursor < self.frames.len() {
            self.cursor += 1;
        }
        self.frames[idx].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Keypoint, KeypointIndex};
    use std::time::Duration;

    fn pose_at(x: f32) -> Pose {
        let mut kps = [Keypoint::default(); KeypointIndex::COUNT];
        kps[0] = Keypoint::new(x, 0.0, 1.0);
        Pose::new(kps)
    }

    struct CountingEstimator {
        count: u32,
    }

    impl PoseEstimator for CountingEstimator {
        fn estimate(&mut self) -> Vec<Pose> {
            self.count += 1;
            thread::sleep(Duration::from_millis(1));
            vec![pose_at(self.count as f32)]
        }
    }

    #[test]
    fn test_scripted_source_advances_then_holds() {
        let mut source = ScriptedPoseSource::new(vec![
            vec![pose_at(1.0)],
            vec![pose_at(2.0)],
        ]);

        assert_eq!(source.snapshot()[0].keypoints[0].x, 1.0);
        assert_eq!(source.snapshot()[0].keypoints[0].x, 2.0);
        // 尽きた後は最後のフレームを保持
        assert_eq!(source.snapshot()[0].keypoints[0].x, 2.0);
        assert_eq!(source.snapshot()[0].keypoints[0].x, 2.0);
    }

    #[test]
    fn test_scripted_source_empty() {
        let mut source = ScriptedPoseSource::new(vec![]);
        assert!(source.snapshot().is_empty());
    }

    #[test]
    fn test_threaded_source_never_blocks() {
        let mut source = ThreadedPoseSource::start(CountingEstimator { count: 0 });

        // 初回結果の到着前でも空スナップショットが即座に返る
        let first = source.snapshot();
        assert!(first.len() <= 1);

        // 世代が進むまで待てば結果が読める
        while source.generation() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        let poses = source.snapshot();
        assert_eq!(poses.len(), 1);
        assert!(poses[0].keypoints[0].x >= 1.0);

        source.stop();
    }
}
