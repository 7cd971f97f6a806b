use nalgebra::Point3;

use crate::config::ViewConfig;
use crate::pose::Keypoint;

/// ピクセル座標→シーン座標のマッピング
///
/// X軸はミラー反転（鏡のように動かせるようにカメラ映像の左右を補正）、
/// Y軸は画像座標（下向き正）→シーン座標（上向き正）の反転。
/// スケールはカメラの視野角とアスペクト比から決まる。
pub struct CoordinateMapper {
    fov_rad: f32,
    aspect: f32,
}

impl CoordinateMapper {
    pub fn new(fov_deg: f32, aspect: f32) -> Self {
        Self {
            fov_rad: fov_deg.to_radians(),
            aspect,
        }
    }

    pub fn from_config(config: &ViewConfig) -> Self {
        Self::new(config.fov_deg, config.aspect)
    }

    /// キーポイントをシーン座標へ変換（z=0の平面上）
    ///
    /// ソース寸法が非正の場合は原点を返す。
    pub fn map(&self, keypoint: &Keypoint, source_width: f32, source_height: f32) -> Point3<f32> {
        if source_width <= 0.0 || source_height <= 0.0 {
            return Point3::origin();
        }

        let normalized_x = (keypoint.x / source_width) * 2.0 - 1.0;
        let scene_x = -(normalized_x * self.aspect * self.fov_rad);

        let normalized_y = 1.0 - (keypoint.y / source_height) * 2.0;
        let scene_y = normalized_y * self.fov_rad;

        Point3::new(scene_x, scene_y, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq_f32(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_map_center_is_origin() {
        let mapper = CoordinateMapper::new(70.0, 1.33);
        let kp = Keypoint::new(320.0, 240.0, 1.0);
        let p = mapper.map(&kp, 640.0, 480.0);
        assert!(approx_eq_f32(p.x, 0.0, 1e-6));
        assert!(approx_eq_f32(p.y, 0.0, 1e-6));
        assert_eq!(p.z, 0.0);
    }

    #[test]
    fn test_map_formula() {
        // nose at (100, 100) on a 640x480 source, fov=70deg, aspect=1.33
        let fov_rad = 70.0_f32.to_radians();
        let mapper = CoordinateMapper::new(70.0, 1.33);
        let kp = Keypoint::new(100.0, 100.0, 1.0);
        let p = mapper.map(&kp, 640.0, 480.0);

        let expected_x = -(((100.0 / 640.0) * 2.0 - 1.0) * 1.33 * fov_rad);
        let expected_y = (1.0 - (100.0 / 480.0) * 2.0) * fov_rad;
        assert!(approx_eq_f32(p.x, expected_x, 1e-6));
        assert!(approx_eq_f32(p.y, expected_y, 1e-6));

        // この点は半径0.7の原点中心球の外側にある
        let dist = (p.x * p.x + p.y * p.y).sqrt();
        assert!(dist > 0.7, "distance {} should miss the globe", dist);
    }

    #[test]
    fn test_map_mirrors_x() {
        let mapper = CoordinateMapper::new(70.0, 1.33);
        // 画像の右側（x > w/2）はシーンの左側（x < 0）に写る
        let right = mapper.map(&Keypoint::new(600.0, 240.0, 1.0), 640.0, 480.0);
        assert!(right.x < 0.0);
        let left = mapper.map(&Keypoint::new(40.0, 240.0, 1.0), 640.0, 480.0);
        assert!(left.x > 0.0);
    }

    #[test]
    fn test_map_flips_y() {
        let mapper = CoordinateMapper::new(70.0, 1.33);
        // 画像の上側（y小）はシーンの上側（y > 0）に写る
        let top = mapper.map(&Keypoint::new(320.0, 0.0, 1.0), 640.0, 480.0);
        assert!(top.y > 0.0);
        let bottom = mapper.map(&Keypoint::new(320.0, 480.0, 1.0), 640.0, 480.0);
        assert!(bottom.y < 0.0);
    }

    #[test]
    fn test_map_zero_sized_source() {
        let mapper = CoordinateMapper::new(70.0, 1.33);
        let kp = Keypoint::new(100.0, 100.0, 1.0);
        assert_eq!(mapper.map(&kp, 0.0, 480.0), Point3::origin());
        assert_eq!(mapper.map(&kp, 640.0, 0.0), Point3::origin());
        assert_eq!(mapper.map(&kp, -640.0, 480.0), Point3::origin());
    }
}
