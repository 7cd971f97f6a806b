use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub distortion: DistortionConfig,
    #[serde(default)]
    pub mesh: MeshConfig,
    #[serde(default)]
    pub particles: ParticleConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// フレームレート（デモバイナリ用）
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViewConfig {
    /// カメラの垂直視野角（度）
    #[serde(default = "default_fov_deg")]
    pub fov_deg: f32,
    /// カメラのアスペクト比
    #[serde(default = "default_aspect")]
    pub aspect: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MotionConfig {
    /// この速度未満のキーポイント移動はノイズとして無視
    #[serde(default = "default_noise_floor")]
    pub noise_floor: f32,
    /// targetSpeed正規化の除数
    #[serde(default = "default_speed_divisor")]
    pub speed_divisor: f32,
    /// targetSpeedの下限
    #[serde(default = "default_target_floor")]
    pub target_floor: f32,
    /// 速度の上限
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
    /// avgSpeed→targetSpeedの平滑化係数
    #[serde(default = "default_avg_fade")]
    pub avg_fade: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DistortionConfig {
    /// 温度→振幅マッピングの入力範囲（℃）
    #[serde(default = "default_temp_min")]
    pub temp_min: f32,
    #[serde(default = "default_temp_max")]
    pub temp_max: f32,
    /// 温度→振幅マッピングの出力範囲（シーン単位）
    #[serde(default = "default_amp_min")]
    pub amp_min: f32,
    #[serde(default = "default_amp_max")]
    pub amp_max: f32,
    /// 接触中のフェードイン係数
    #[serde(default = "default_engage_rate")]
    pub engage_rate: f32,
    /// 非接触時のフェードアウト係数
    #[serde(default = "default_release_rate")]
    pub release_rate: f32,
    /// distortionFactorの上限
    #[serde(default = "default_max_factor")]
    pub max_factor: f32,
    /// ノイズサンプリング速度のベースライン
    #[serde(default = "default_speed_base")]
    pub speed_base: f64,
    /// 高速運動時のノイズサンプリング速度の目標値
    #[serde(default = "default_speed_boost")]
    pub speed_boost: f64,
    /// ノイズサンプリング速度の平滑化係数（非常に遅い時定数）
    #[serde(default = "default_speed_ease_rate")]
    pub speed_ease_rate: f64,
    /// avgSpeedがこの値を超えると振幅・速度に寄与
    #[serde(default = "default_speed_threshold")]
    pub speed_threshold: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MeshConfig {
    /// 球の半径（シーン単位）
    #[serde(default = "default_mesh_radius")]
    pub radius: f32,
    /// 緯度方向の分割数
    #[serde(default = "default_mesh_rings")]
    pub rings: u32,
    /// 経度方向の分割数
    #[serde(default = "default_mesh_segments")]
    pub segments: u32,
    /// 何フレームごとに頂点バッファをプリスティンから復元するか
    #[serde(default = "default_reset_interval")]
    pub reset_interval: u32,
    /// 1フレームあたりのY軸回転量（ラジアン）
    #[serde(default = "default_rotation_step")]
    pub rotation_step: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ParticleConfig {
    /// 1セグメントあたりの粒子数
    #[serde(default = "default_per_segment")]
    pub per_segment: usize,
    /// 粒子の散らばり幅（シーン単位）
    #[serde(default = "default_spread")]
    pub spread: f32,
    /// バッチの寿命（ミリ秒）
    #[serde(default = "default_lifetime_ms")]
    pub lifetime_ms: u64,
    /// この信頼度未満のキーポイントはセグメントから除外
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    /// 粒子サイズの範囲（バッチごとにランダム）
    #[serde(default = "default_size_min")]
    pub size_min: f32,
    #[serde(default = "default_size_max")]
    pub size_max: f32,
    /// 1フレームあたりの上昇量
    #[serde(default = "default_rise_step")]
    pub rise_step: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatasetConfig {
    /// データセットの範囲（年）
    #[serde(default = "default_start_year")]
    pub start_year: i32,
    #[serde(default = "default_end_year")]
    pub end_year: i32,
    /// JSONファイルパス（省略時は組み込みデータ）
    #[serde(default)]
    pub path: Option<String>,
}

fn default_target_fps() -> u32 { 60 }
fn default_fov_deg() -> f32 { 70.0 }
fn default_aspect() -> f32 { 16.0 / 9.0 }
fn default_noise_floor() -> f32 { 0.3 }
fn default_speed_divisor() -> f32 { 0.2 }
fn default_target_floor() -> f32 { 0.05 }
fn default_max_speed() -> f32 { 1.0 }
fn default_avg_fade() -> f32 { 0.05 }
fn default_temp_min() -> f32 { -30.0 }
fn default_temp_max() -> f32 { 50.0 }
fn default_amp_min() -> f32 { 0.01 }
fn default_amp_max() -> f32 { 0.1 }
fn default_engage_rate() -> f32 { 0.1 }
fn default_release_rate() -> f32 { 0.02 }
fn default_max_factor() -> f32 { 0.9 }
fn default_speed_base() -> f64 { 0.00008 }
fn default_speed_boost() -> f64 { 0.0009 }
fn default_speed_ease_rate() -> f64 { 0.002 }
fn default_speed_threshold() -> f32 { 0.3 }
fn default_mesh_radius() -> f32 { 0.7 }
fn default_mesh_rings() -> u32 { 32 }
fn default_mesh_segments() -> u32 { 64 }
fn default_reset_interval() -> u32 { 30 }
fn default_rotation_step() -> f32 { 0.001 }
fn default_per_segment() -> usize { 4 }
fn default_spread() -> f32 { 0.1 }
fn default_lifetime_ms() -> u64 { 500 }
fn default_confidence_threshold() -> f32 { 0.3 }
fn default_size_min() -> f32 { 0.001 }
fn default_size_max() -> f32 { 0.01 }
fn default_rise_step() -> f32 { 0.01 }
fn default_start_year() -> i32 { 1979 }
fn default_end_year() -> i32 { 2023 }

impl Default for AppConfig {
    fn default() -> Self {
        Self { target_fps: default_target_fps() }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            fov_deg: default_fov_deg(),
            aspect: default_aspect(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            noise_floor: default_noise_floor(),
            speed_divisor: default_speed_divisor(),
            target_floor: default_target_floor(),
            max_speed: default_max_speed(),
            avg_fade: default_avg_fade(),
        }
    }
}

impl Default for DistortionConfig {
    fn default() -> Self {
        Self {
            temp_min: default_temp_min(),
            temp_max: default_temp_max(),
            amp_min: default_amp_min(),
            amp_max: default_amp_max(),
            engage_rate: default_engage_rate(),
            release_rate: default_release_rate(),
            max_factor: default_max_factor(),
            speed_base: default_speed_base(),
            speed_boost: default_speed_boost(),
            speed_ease_rate: default_speed_ease_rate(),
            speed_threshold: default_speed_threshold(),
        }
    }
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            radius: default_mesh_radius(),
            rings: default_mesh_rings(),
            segments: default_mesh_segments(),
            reset_interval: default_reset_interval(),
            rotation_step: default_rotation_step(),
        }
    }
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            per_segment: default_per_segment(),
            spread: default_spread(),
            lifetime_ms: default_lifetime_ms(),
            confidence_threshold: default_confidence_threshold(),
            size_min: default_size_min(),
            size_max: default_size_max(),
            rise_step: default_rise_step(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            start_year: default_start_year(),
            end_year: default_end_year(),
            path: None,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// ファイルがなければデフォルト設定を返す
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(path).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.view.fov_deg, 70.0);
        assert_eq!(config.mesh.radius, 0.7);
        assert_eq!(config.mesh.reset_interval, 30);
        assert_eq!(config.dataset.start_year, 1979);
        assert_eq!(config.dataset.end_year, 2023);
        assert!(config.dataset.path.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [view]
            fov_deg = 60.0

            [distortion]
            release_rate = 0.05
            "#,
        )
        .unwrap();
        assert_eq!(config.view.fov_deg, 60.0);
        // 未指定フィールドはデフォルト
        assert_eq!(config.view.aspect, 16.0 / 9.0);
        assert_eq!(config.distortion.release_rate, 0.05);
        assert_eq!(config.distortion.engage_rate, 0.1);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("/nonexistent/config.toml");
        assert_eq!(config.app.target_fps, 60);
    }
}
