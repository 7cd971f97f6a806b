use nalgebra::Point3;

use crate::collision::CollisionDetector;
use crate::config::Config;
use crate::dataset::TemperatureTable;
use crate::deform::MeshDeformer;
use crate::distortion::DistortionState;
use crate::motion::MotionState;
use crate::particles::ParticleEmitter;
use crate::pose::Pose;
use crate::scene::{CoordinateMapper, GlobeMesh, OverlaySink};

/// かつてグローバル変数だったスカラー群を1か所に集めた状態
///
/// すべてFrameDriverが単一スレッドで所有・更新する。
pub struct InstallationState {
    pub motion: MotionState,
    pub distortion: DistortionState,
    /// 球の現在のY軸回転角（ラジアン）。ホストが描画時に適用する。
    pub rotation_y: f32,
    pub frame_count: u64,
    /// 今フレームの写像済みキーポイント位置（フレーム頭でクリア）
    pub keypoint_scratch: Vec<Point3<f32>>,
}

/// 1フレームの処理結果の要約（デモ・テスト用）
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameSummary {
    pub pose_count: usize,
    pub colliding_poses: usize,
    /// このフレームで起きたデータセット前進の回数
    pub advances: usize,
    pub distortion_factor: f32,
    pub avg_speed: f32,
    pub particle_batches: usize,
    pub particles_retired: usize,
}

/// フレームドライバ
///
/// ディスプレイのリフレッシュごとに1回 `step` を呼ぶ。
/// 姿勢の取得はスナップショット渡し: 推定が遅れていれば呼び出し側が
/// 前回と同じスナップショットを渡してくる。処理順は
/// 粒子放出 → 衝突判定 → 速度平滑化 → 変形量遷移 → メッシュ変形 →
/// 粒子回収 → 回転。
pub struct FrameDriver {
    mapper: CoordinateMapper,
    mesh: GlobeMesh,
    collision: CollisionDetector,
    deformer: MeshDeformer,
    emitter: ParticleEmitter,
    table: TemperatureTable,
    state: InstallationState,
    source_width: f32,
    source_height: f32,
    rotation_step: f32,
}

impl FrameDriver {
    /// seedはノイズ場と粒子ジッタの乱数種（再現可能なデモ用）
    pub fn new(
        config: &Config,
        table: TemperatureTable,
        source_width: f32,
        source_height: f32,
        seed: u64,
    ) -> Self {
        let mesh = GlobeMesh::from_config(&config.mesh);
        let collision = CollisionDetector::new(mesh.bounding_sphere());
        Self {
            mapper: CoordinateMapper::from_config(&config.view),
            collision,
            deformer: MeshDeformer::new(seed as u32, config.mesh.reset_interval),
            emitter: ParticleEmitter::new(config.particles.clone(), seed),
            table,
            state: InstallationState {
                motion: MotionState::new(config.motion.clone()),
                distortion: DistortionState::new(config.distortion.clone()),
                rotation_y: 0.0,
                frame_count: 0,
                keypoint_scratch: Vec::new(),
            },
            mesh,
            source_width,
            source_height,
            rotation_step: config.mesh.rotation_step,
        }
    }

    /// 姿勢ソースの解像度が判明・変更されたときに呼ぶ
    pub fn set_source_size(&mut self, width: f32, height: f32) {
        self.source_width = width;
        self.source_height = height;
    }

    /// 初期表示: 最初の衝突を待たずにオーバーレイへ1回出す
    pub fn prime(&mut self, overlay: &mut dyn OverlaySink) {
        let (year, temp) = self.table.advance();
        overlay.push(year, temp);
    }

    /// 1フレーム分の処理
    pub fn step(
        &mut self,
        now_ms: f64,
        poses: &[Pose],
        overlay: &mut dyn OverlaySink,
    ) -> FrameSummary {
        let mut summary = FrameSummary {
            pose_count: poses.len(),
            ..Default::default()
        };

        self.state.keypoint_scratch.clear();

        if poses.is_empty() {
            self.state.distortion.ease_idle();
        } else {
            for (pose_index, pose) in poses.iter().enumerate() {
                self.emitter.emit(
                    pose,
                    pose_index,
                    &self.mapper,
                    self.source_width,
                    self.source_height,
                    now_ms,
                );

                let colliding = self.collision.check(
                    pose,
                    &self.mapper,
                    self.source_width,
                    self.source_height,
                    &mut self.state.motion,
                    &mut self.state.keypoint_scratch,
                );
                if colliding {
                    summary.colliding_poses += 1;
                }

                self.state.motion.smooth();

                // 新しい接触でのみ年を進める（接触継続中は進めない）
                if self.state.distortion.observe_collision(pose_index, colliding) {
                    let (year, temp) = self.table.advance();
                    overlay.push(year, temp);
                    summary.advances += 1;
                }

                self.state.distortion.ease_toward(
                    colliding,
                    self.state.motion.avg_speed(),
                    self.table.current_temperature(),
                );
            }
        }

        self.deformer.deform(
            &mut self.mesh,
            now_ms,
            self.state.distortion.factor(),
            self.state.distortion.speed(),
        );

        summary.particles_retired = self.emitter.sweep(now_ms);
        summary.particle_batches = self.emitter.batches().len();

        self.state.rotation_y += self.rotation_step;
        self.state.frame_count += 1;

        summary.distortion_factor = self.state.distortion.factor();
        summary.avg_speed = self.state.motion.avg_speed();
        summary
    }

    /// ティアダウン: 保留中の粒子削除をすべて無効化し、状態を初期化する
    pub fn teardown(&mut self) {
        self.emitter.clear();
        self.state.motion.reset();
        self.state.keypoint_scratch.clear();
    }

    pub fn mesh(&self) -> &GlobeMesh {
        &self.mesh
    }

    pub fn state(&self) -> &InstallationState {
        &self.state
    }

    pub fn table(&self) -> &TemperatureTable {
        &self.table
    }

    pub fn particles(&self) -> &ParticleEmitter {
        &self.emitter
    }
}
