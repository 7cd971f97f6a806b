use noise::{NoiseFn, OpenSimplex};

use crate::scene::GlobeMesh;

/// 球メッシュの頂点ノイズ変形
///
/// 各頂点をプリスティン位置のラジアル方向にのみ押し引きする。
/// 変形後の頂点は常に原点→プリスティン頂点の射線上にあるため、
/// ノイズ振幅が有界なら自己交差は起こらない。
/// ノイズ場は決定的・連続な3Dグラディエントノイズ（OpenSimplex）。
pub struct MeshDeformer {
    noise: OpenSimplex,
    reset_interval: u32,
    frame_count: u32,
}

impl MeshDeformer {
    pub fn new(seed: u32, reset_interval: u32) -> Self {
        Self {
            noise: OpenSimplex::new(seed),
            reset_interval: reset_interval.max(1),
            frame_count: 0,
        }
    }

    /// 1フレーム分の変形
    ///
    /// time_ms * speed がノイズ座標の時間オフセット。
    /// reset_intervalフレームごとに作業バッファをプリスティンから
    /// 復元してから書き直す。変形式はプリスティン頂点を基準に
    /// 定義されるので、これは誤差蓄積に対する安全弁。
    pub fn deform(&mut self, mesh: &mut GlobeMesh, time_ms: f64, factor: f32, speed: f64) {
        if self.frame_count % self.reset_interval == 0 {
            mesh.restore();
        }
        self.frame_count = self.frame_count.wrapping_add(1);

        let radius = mesh.radius();
        let offset = time_ms * speed;

        for i in 0..mesh.vertex_count() {
            let pristine = mesh.pristine()[i];
            let len = pristine.norm();
            if len < 1e-12 {
                continue;
            }
            let direction = pristine / len;

            let n = self.noise.get([
                direction.x as f64 + offset,
                direction.y as f64 + offset,
                direction.z as f64 + offset,
            ]) as f32;

            // 半径+ノイズが非正にならないよう下限を設ける（星型変形の維持）
            let distance = (radius + n * factor).max(radius * 0.01);
            mesh.set_vertex(i, direction * distance);
        }

        mesh.compute_vertex_normals();
    }
}
