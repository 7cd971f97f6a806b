use nalgebra::Point3;

use crate::motion::MotionState;
use crate::pose::Pose;
use crate::scene::{BoundingSphere, CoordinateMapper};

/// 姿勢と球メッシュの粗い衝突判定
///
/// 各キーポイントをシーン座標へ写し、いずれか1つでもバウンディング
/// スフィア内にあれば姿勢全体を衝突とみなす（OR判定）。
/// 頂点単位・部位単位の判定は行わない。
pub struct CollisionDetector {
    center: Point3<f32>,
    radius: f32,
}

impl CollisionDetector {
    pub fn new(bounding: BoundingSphere) -> Self {
        Self {
            center: bounding.center,
            radius: bounding.radius,
        }
    }

    /// 1姿勢分の衝突判定
    ///
    /// 副作用: 各キーポイントの写像位置をMotionStateへ観測として流し、
    /// scratchリスト（フレームごとにドライバがクリア）へ追記する。
    pub fn check(
        &self,
        pose: &Pose,
        mapper: &CoordinateMapper,
        source_width: f32,
        source_height: f32,
        motion: &mut MotionState,
        scratch: &mut Vec<Point3<f32>>,
    ) -> bool {
        let mut hit = false;
        motion.begin_pose(pose.keypoints.len());

        for (slot, keypoint) in pose.keypoints.iter().enumerate() {
            let position = mapper.map(keypoint, source_width, source_height);
            motion.observe(slot, position);
            scratch.push(position);

            if nalgebra::distance(&position, &self.center) < self.radius {
                hit = true;
            }
        }

        motion.finish_pose();
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MotionConfig;
    use crate::pose::{Keypoint, KeypointIndex};

    fn detector() -> CollisionDetector {
        CollisionDetector::new(BoundingSphere {
            center: Point3::origin(),
            radius: 0.7,
        })
    }

    fn mapper() -> CoordinateMapper {
        CoordinateMapper::new(70.0, 1.33)
    }

    fn pose_with_nose(x: f32, y: f32) -> Pose {
        let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
        keypoints[KeypointIndex::Nose as usize] = Keypoint::new(x, y, 0.9);
        Pose::new(keypoints)
    }

    #[test]
    fn test_center_keypoint_collides() {
        let det = detector();
        let mut motion = MotionState::new(MotionConfig::default());
        let mut scratch = Vec::new();

        // 画面中央 → シーン原点 → 球の内側
        let pose = pose_with_nose(320.0, 240.0);
        assert!(det.check(&pose, &mapper(), 640.0, 480.0, &mut motion, &mut scratch));
    }

    #[test]
    fn test_corner_keypoint_misses() {
        let det = detector();
        let mut motion = MotionState::new(MotionConfig::default());
        let mut scratch = Vec::new();

        // (100,100)は原点から約1.33シーン単位 → 半径0.7の外
        // ただしデフォルト姿勢の残り16キーポイントは(0,0)ピクセル、
        // これも画面の隅なので球の外に写る
        let pose = pose_with_nose(100.0, 100.0);
        assert!(!det.check(&pose, &mapper(), 640.0, 480.0, &mut motion, &mut scratch));
    }

    #[test]
    fn test_scratch_gets_all_keypoints() {
        let det = detector();
        let mut motion = MotionState::new(MotionConfig::default());
        let mut scratch = Vec::new();

        let pose = pose_with_nose(100.0, 100.0);
        det.check(&pose, &mapper(), 640.0, 480.0, &mut motion, &mut scratch);
        assert_eq!(scratch.len(), KeypointIndex::COUNT);

        // 2姿勢目は追記される
        det.check(&pose, &mapper(), 640.0, 480.0, &mut motion, &mut scratch);
        assert_eq!(scratch.len(), KeypointIndex::COUNT * 2);
    }

    #[test]
    fn test_check_feeds_motion() {
        let det = detector();
        let mut motion = MotionState::new(MotionConfig::default());
        let mut scratch = Vec::new();

        det.check(&pose_with_nose(100.0, 100.0), &mapper(), 640.0, 480.0, &mut motion, &mut scratch);
        // 鼻を大きく動かす
        det.check(&pose_with_nose(500.0, 400.0), &mapper(), 640.0, 480.0, &mut motion, &mut scratch);
        assert!(motion.target_speed() > 0.05);
    }
}
