use nalgebra::Point3;

use crate::config::MotionConfig;
use crate::distortion::lerp;

/// キーポイント移動速度の推定器
///
/// 履歴はキーポイントのスロット番号で引く（名前ベースではない）。
/// 検出器がフレーム間でキーポイントを並べ替えた場合、速度は
/// 誤った対応で計算される。MoveNetは固定17スロットを返すため
/// 実際にはスロットと部位が一致する。
pub struct MotionState {
    config: MotionConfig,
    history: Vec<Option<Point3<f32>>>,
    frame_sum: f32,
    keypoint_count: usize,
    /// 今フレームの平均変位（正規化・クランプ済み）
    target_speed: f32,
    /// フレーム間で指数平滑化された速度
    avg_speed: f32,
}

impl MotionState {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            history: Vec::new(),
            frame_sum: 0.0,
            keypoint_count: 0,
            target_speed: 0.0,
            avg_speed: 0.0,
        }
    }

    pub fn target_speed(&self) -> f32 {
        self.target_speed
    }

    pub fn avg_speed(&self) -> f32 {
        self.avg_speed
    }

    /// 姿勢の処理開始。今フレームの変位合計をリセットする。
    pub fn begin_pose(&mut self, keypoint_count: usize) {
        self.frame_sum = 0.0;
        self.keypoint_count = keypoint_count.max(1);
    }

    /// マッピング済みキーポイント位置を1つ観測する
    ///
    /// 同一スロットの前フレーム位置があれば変位を速度として積算。
    /// ノイズフロアを超えた変位のみavgSpeedへ寄与する。
    /// 初フレーム（履歴なし）はそのスロットの寄与をスキップ。
    pub fn observe(&mut self, slot: usize, position: Point3<f32>) {
        if slot >= self.history.len() {
            self.history.resize(slot + 1, None);
        }

        if let Some(prev) = self.history[slot] {
            let speed = nalgebra::distance(&position, &prev);
            self.frame_sum += speed;
            if speed > self.config.noise_floor {
                self.avg_speed += speed / self.keypoint_count as f32;
            }
        }

        self.history[slot] = Some(position);
    }

    /// 姿勢の処理終了。targetSpeedを正規化・クランプする。
    pub fn finish_pose(&mut self) {
        let normalized =
            self.frame_sum / self.keypoint_count as f32 / self.config.speed_divisor;
        self.target_speed = normalized.clamp(self.config.target_floor, self.config.max_speed);
        self.avg_speed = self.avg_speed.clamp(0.0, self.config.max_speed);
    }

    /// avgSpeedをtargetSpeedへ平滑に近づける（フレームごとに1回）
    pub fn smooth(&mut self) {
        self.avg_speed = lerp(self.avg_speed, self.target_speed, self.config.avg_fade)
            .clamp(0.0, self.config.max_speed);
    }

    /// 履歴と速度を破棄する（再初期化用）
    pub fn reset(&mut self) {
        self.history.clear();
        self.frame_sum = 0.0;
        self.target_speed = 0.0;
        self.avg_speed = 0.0;
    }
}
