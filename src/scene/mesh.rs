use nalgebra::{Point3, Vector3};

use crate::config::MeshConfig;

/// バウンディングスフィア（中心と半径）
///
/// プリスティンな形状から一度だけ計算され、変形中も更新されない。
#[derive(Debug, Clone, Copy)]
pub struct BoundingSphere {
    pub center: Point3<f32>,
    pub radius: f32,
}

/// 変形対象の球メッシュ
///
/// 頂点位置の作業バッファと、生成時に確保したプリスティンコピーを持つ。
/// 変形は常にプリスティン頂点を基準に定義されるため、浮動小数点誤差の
/// 蓄積を防ぐには `restore` で作業バッファを巻き戻せばよい。
pub struct GlobeMesh {
    radius: f32,
    positions: Vec<Vector3<f32>>,
    pristine: Vec<Vector3<f32>>,
    normals: Vec<Vector3<f32>>,
    triangles: Vec<[u32; 3]>,
    bounding: BoundingSphere,
    normals_dirty: bool,
}

impl GlobeMesh {
    /// UV球を生成する
    ///
    /// rings: 緯度方向の分割数（2以上）、segments: 経度方向の分割数（3以上）。
    /// 経度方向の継ぎ目は頂点を複製する。複製頂点は方向が同一なので
    /// ラジアル変形でも割れ目は生じない。
    pub fn sphere(radius: f32, rings: u32, segments: u32) -> Self {
        let rings = rings.max(2);
        let segments = segments.max(3);

        let mut positions = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
        for ring in 0..=rings {
            let theta = std::f32::consts::PI * ring as f32 / rings as f32;
            let (sin_t, cos_t) = theta.sin_cos();
            for seg in 0..=segments {
                let phi = std::f32::consts::TAU * seg as f32 / segments as f32;
                let (sin_p, cos_p) = phi.sin_cos();
                positions.push(Vector3::new(
                    radius * sin_t * cos_p,
                    radius * cos_t,
                    radius * sin_t * sin_p,
                ));
            }
        }

        let stride = segments + 1;
        let mut triangles = Vec::new();
        for ring in 0..rings {
            for seg in 0..segments {
                let a = ring * stride + seg;
                let b = a + 1;
                let c = a + stride;
                let d = c + 1;
                // 極のリングは片側が縮退するのでスキップ
                if ring != 0 {
                    triangles.push([a, b, c]);
                }
                if ring != rings - 1 {
                    triangles.push([b, d, c]);
                }
            }
        }

        let bounding = Self::compute_bounding_sphere(&positions);
        let pristine = positions.clone();
        let normals = vec![Vector3::zeros(); positions.len()];

        let mut mesh = Self {
            radius,
            positions,
            pristine,
            normals,
            triangles,
            bounding,
            normals_dirty: true,
        };
        mesh.compute_vertex_normals();
        mesh
    }

    pub fn from_config(config: &MeshConfig) -> Self {
        Self::sphere(config.radius, config.rings, config.segments)
    }

    fn compute_bounding_sphere(positions: &[Vector3<f32>]) -> BoundingSphere {
        if positions.is_empty() {
            return BoundingSphere {
                center: Point3::origin(),
                radius: 0.0,
            };
        }
        let mut min = positions[0];
        let mut max = positions[0];
        for p in positions {
            min = min.inf(p);
            max = max.sup(p);
        }
        let center = (min + max) * 0.5;
        let radius = positions
            .iter()
            .map(|p| (p - center).norm())
            .fold(0.0, f32::max);
        BoundingSphere {
            center: Point3::from(center),
            radius,
        }
    }

    /// メッシュの公称半径（変形前の球半径）
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[Vector3<f32>] {
        &self.positions
    }

    pub fn pristine(&self) -> &[Vector3<f32>] {
        &self.pristine
    }

    pub fn normals(&self) -> &[Vector3<f32>] {
        &self.normals
    }

    pub fn bounding_sphere(&self) -> BoundingSphere {
        self.bounding
    }

    /// 頂点位置を書き換える。法線は再計算が必要になる。
    pub fn set_vertex(&mut self, index: usize, position: Vector3<f32>) {
        self.positions[index] = position;
        self.normals_dirty = true;
    }

    /// 作業バッファをプリスティンコピーからビット単位で復元する
    pub fn restore(&mut self) {
        self.positions.copy_from_slice(&self.pristine);
        self.normals_dirty = true;
    }

    pub fn normals_dirty(&self) -> bool {
        self.normals_dirty
    }

    /// 面法線の面積加重平均で頂点法線を再計算する
    ///
    /// 縮退頂点（隣接面なし等）はラジアル方向にフォールバック。
    pub fn compute_vertex_normals(&mut self) {
        for n in self.normals.iter_mut() {
            *n = Vector3::zeros();
        }
        for tri in &self.triangles {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let edge1 = self.positions[b] - self.positions[a];
            let edge2 = self.positions[c] - self.positions[a];
            let face = edge1.cross(&edge2);
            self.normals[a] += face;
            self.normals[b] += face;
            self.normals[c] += face;
        }
        for (i, n) in self.normals.iter_mut().enumerate() {
            let len = n.norm();
            if len > 1e-12 {
                *n /= len;
            } else {
                let p = self.positions[i];
                let plen = p.norm();
                *n = if plen > 1e-12 { p / plen } else { Vector3::y() };
            }
        }
        self.normals_dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_vertex_count() {
        let mesh = GlobeMesh::sphere(0.7, 4, 8);
        assert_eq!(mesh.vertex_count(), (4 + 1) * (8 + 1));
    }

    #[test]
    fn test_sphere_vertices_on_surface() {
        let mesh = GlobeMesh::sphere(0.7, 16, 32);
        for p in mesh.positions() {
            assert!((p.norm() - 0.7).abs() < 1e-5);
        }
    }

    #[test]
    fn test_bounding_sphere_centered_at_origin() {
        let mesh = GlobeMesh::sphere(0.7, 16, 32);
        let bs = mesh.bounding_sphere();
        assert!(bs.center.coords.norm() < 1e-5);
        assert!((bs.radius - 0.7).abs() < 1e-4);
    }

    #[test]
    fn test_restore_is_bit_for_bit() {
        let mut mesh = GlobeMesh::sphere(0.7, 8, 16);
        let original: Vec<_> = mesh.positions().to_vec();

        for i in 0..mesh.vertex_count() {
            let p = mesh.positions()[i];
            mesh.set_vertex(i, p * 1.37);
        }
        assert_ne!(mesh.positions()[0], original[0]);

        mesh.restore();
        for (p, o) in mesh.positions().iter().zip(original.iter()) {
            assert_eq!(p.x.to_bits(), o.x.to_bits());
            assert_eq!(p.y.to_bits(), o.y.to_bits());
            assert_eq!(p.z.to_bits(), o.z.to_bits());
        }
    }

    #[test]
    fn test_normals_point_outward_on_sphere() {
        let mesh = GlobeMesh::sphere(1.0, 16, 32);
        for (p, n) in mesh.positions().iter().zip(mesh.normals().iter()) {
            assert!((n.norm() - 1.0).abs() < 1e-4);
            // 球面上では法線はラジアル方向とほぼ一致する
            let radial = p / p.norm();
            assert!(n.dot(&radial) > 0.9, "normal deviates from radial: {}", n.dot(&radial));
        }
    }

    #[test]
    fn test_set_vertex_marks_normals_dirty() {
        let mut mesh = GlobeMesh::sphere(0.7, 4, 8);
        assert!(!mesh.normals_dirty());
        mesh.set_vertex(0, Vector3::new(1.0, 0.0, 0.0));
        assert!(mesh.normals_dirty());
        mesh.compute_vertex_normals();
        assert!(!mesh.normals_dirty());
    }
}
