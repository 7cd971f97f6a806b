use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ParticleConfig;
use crate::distortion::lerp;
use crate::pose::{KeypointIndex, Pose};
use crate::scene::CoordinateMapper;

/// 粒子を流す骨格セグメントの隣接リスト
const BODY_SEGMENTS: [(KeypointIndex, KeypointIndex); 13] = [
    (KeypointIndex::LeftShoulder, KeypointIndex::LeftElbow),
    (KeypointIndex::LeftElbow, KeypointIndex::LeftWrist),
    (KeypointIndex::RightShoulder, KeypointIndex::RightElbow),
    (KeypointIndex::RightElbow, KeypointIndex::RightWrist),
    (KeypointIndex::LeftShoulder, KeypointIndex::RightShoulder),
    (KeypointIndex::LeftShoulder, KeypointIndex::LeftHip),
    (KeypointIndex::RightShoulder, KeypointIndex::RightHip),
    (KeypointIndex::LeftHip, KeypointIndex::RightHip),
    (KeypointIndex::LeftHip, KeypointIndex::LeftKnee),
    (KeypointIndex::RightHip, KeypointIndex::RightKnee),
    (KeypointIndex::LeftKnee, KeypointIndex::LeftAnkle),
    (KeypointIndex::RightKnee, KeypointIndex::RightAnkle),
    (KeypointIndex::LeftEye, KeypointIndex::Nose),
];

/// 1回の放出でまとめて生まれる粒子群
///
/// 固定寿命で消える。寿命の管理はタイマーではなくドライバの
/// フレームスイープで行う。
pub struct ParticleBatch {
    pub pose_index: usize,
    pub positions: Vec<Point3<f32>>,
    /// 粒子の描画サイズ（バッチごとにランダム）
    pub size: f32,
    /// フレームごとの上昇オフセット
    pub offset_y: f32,
    expires_at_ms: f64,
}

/// 姿勢に沿った短命の粒子雲を生成・管理する
///
/// 骨格セグメント上の補間点、鼻まわりのハロー、鼻〜肩中点の首筋に
/// 小さなジッタ付きで粒子を置く。信頼度の低いキーポイントに
/// かかるセグメントは黙ってスキップする。
pub struct ParticleEmitter {
    config: ParticleConfig,
    rng: StdRng,
    batches: Vec<ParticleBatch>,
}

impl ParticleEmitter {
    pub fn new(config: ParticleConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            batches: Vec::new(),
        }
    }

    pub fn batches(&self) -> &[ParticleBatch] {
        &self.batches
    }

    /// 1姿勢分の粒子バッチを放出する
    ///
    /// 有効なキーポイントが1つもなければ何も生まれない。
    pub fn emit(
        &mut self,
        pose: &Pose,
        pose_index: usize,
        mapper: &CoordinateMapper,
        source_width: f32,
        source_height: f32,
        now_ms: f64,
    ) {
        let threshold = self.config.confidence_threshold;
        let spread = self.config.spread;
        let count = self.config.per_segment;
        let mut positions = Vec::new();

        let nose = pose.get_valid(KeypointIndex::Nose, threshold);
        let left_shoulder = pose.get_valid(KeypointIndex::LeftShoulder, threshold);
        let right_shoulder = pose.get_valid(KeypointIndex::RightShoulder, threshold);

        // 頭のハローと首筋
        if let (Some(nose), Some(ls), Some(rs)) = (nose, left_shoulder, right_shoulder) {
            let nose_p = mapper.map(nose, source_width, source_height);
            let ls_p = mapper.map(ls, source_width, source_height);
            let rs_p = mapper.map(rs, source_width, source_height);
            let mid_x = lerp(ls_p.x, rs_p.x, 0.5);
            let mid_y = lerp(ls_p.y, rs_p.y, 0.5);

            // 鼻のまわりに散らす（縦にやや引き伸ばした2D球）
            for _ in 0..count {
                let theta = self.rng.random::<f32>() * std::f32::consts::TAU;
                let phi = self.rng.random::<f32>() * std::f32::consts::TAU;
                positions.push(Point3::new(
                    nose_p.x
                        + theta.sin() * phi.cos() * spread
                        + self.rng.random::<f32>() * 0.1,
                    (nose_p.y - 0.1)
                        + theta.sin() * phi.sin() * spread * 1.5
                        + self.rng.random::<f32>() * 0.1,
                    0.0,
                ));
            }

            // 鼻から両肩の中点へ
            for i in 0..count {
                let fraction = i as f32 / count as f32;
                positions.push(Point3::new(
                    lerp(nose_p.x, mid_x, fraction) + (self.rng.random::<f32>() - 0.3) * spread,
                    lerp(nose_p.y, mid_y, fraction) + (self.rng.random::<f32>() - 0.3) * spread,
                    0.0,
                ));
            }
        }

        // 骨格セグメント
        for (start_idx, end_idx) in BODY_SEGMENTS {
            let (Some(start), Some(end)) = (
                pose.get_valid(start_idx, threshold),
                pose.get_valid(end_idx, threshold),
            ) else {
                continue;
            };
            let start_p = mapper.map(start, source_width, source_height);
            let end_p = mapper.map(end, source_width, source_height);

            for i in 0..count {
                let fraction = i as f32 / count as f32;
                positions.push(Point3::new(
                    lerp(start_p.x, end_p.x, fraction) + (self.rng.random::<f32>() - 0.3) * spread,
                    lerp(start_p.y, end_p.y, fraction) + (self.rng.random::<f32>() - 0.3) * spread,
                    0.0,
                ));
            }
        }

        if positions.is_empty() {
            return;
        }

        let size = self
            .rng
            .random_range(self.config.size_min..self.config.size_max);
        self.batches.push(ParticleBatch {
            pose_index,
            positions,
            size,
            offset_y: 0.0,
            expires_at_ms: now_ms + self.config.lifetime_ms as f64,
        });
    }

    /// 寿命切れバッチの回収と上昇アニメーション（フレームごとに1回）
    ///
    /// 戻り値: このフレームで取り除かれたバッチ数
    pub fn sweep(&mut self, now_ms: f64) -> usize {
        let before = self.batches.len();
        self.batches.retain(|b| b.expires_at_ms > now_ms);
        for batch in self.batches.iter_mut() {
            batch.offset_y += self.config.rise_step;
        }
        before - self.batches.len()
    }

    /// 全バッチを破棄する（ティアダウン時の保留中削除の無効化）
    pub fn clear(&mut self) {
        self.batches.clear();
    }
}
