use crate::config::DistortionConfig;

/// 線形補間
pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start * (1.0 - t) + end * t
}

fn lerp_f64(start: f64, end: f64, t: f64) -> f64 {
    start * (1.0 - t) + end * t
}

/// 値をある範囲から別の範囲へ写す
pub fn map_range(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// 変形量の状態機械
///
/// 「何かが球に触れているか」（フレームごとのブール値）と
/// 「どれだけ強く変形させるか」（平滑化されたスカラー）を分離する。
/// 瞬間的な接触でも余韻を残して減衰し、接触の立ち上がり
/// （false→true）でのみデータセット前進を報告する。
/// レートは非対称: フェードインはフェードアウトより速い。
pub struct DistortionState {
    config: DistortionConfig,
    /// 現在の変形振幅。0以上、max_factor以下。
    factor: f32,
    /// ノイズ場のサンプリング速度（時間係数）
    speed: f64,
    /// 姿勢スロットごとの前フレーム衝突フラグ
    prev_collisions: Vec<bool>,
}

impl DistortionState {
    pub fn new(config: DistortionConfig) -> Self {
        let speed = config.speed_base;
        Self {
            config,
            factor: 0.0,
            speed,
            prev_collisions: Vec::new(),
        }
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// 衝突フラグの立ち上がり検出（スロットごと）
    ///
    /// 戻り値: このスロットで新しい衝突が始まったか。
    /// 接触が継続している間はfalseを返し続ける（レベルではなくエッジ）。
    pub fn observe_collision(&mut self, slot: usize, colliding: bool) -> bool {
        if slot >= self.prev_collisions.len() {
            self.prev_collisions.resize(slot + 1, false);
        }
        let rising_edge = colliding && !self.prev_collisions[slot];
        self.prev_collisions[slot] = colliding;
        rising_edge
    }

    /// 振幅とノイズ速度の指数イージング（姿勢ごとに1回）
    ///
    /// 接触中: 気温から写した振幅+（閾値超の）平均速度を目標に
    /// フェードイン。非接触: 0へ向けてより遅くフェードアウト。
    pub fn ease_toward(&mut self, colliding: bool, avg_speed: f32, temperature: f32) {
        if colliding {
            let speed_term = if avg_speed > self.config.speed_threshold {
                avg_speed
            } else {
                0.0
            };
            let target = map_range(
                temperature,
                self.config.temp_min,
                self.config.temp_max,
                self.config.amp_min,
                self.config.amp_max,
            ) + speed_term;
            self.factor = lerp(self.factor, target, self.config.engage_rate);
        } else {
            self.factor = lerp(self.factor, 0.0, self.config.release_rate);
        }
        self.factor = self.factor.clamp(0.0, self.config.max_factor);

        self.ease_speed(colliding && avg_speed > self.config.speed_threshold);
    }

    /// 姿勢が1つも無いフレームの遷移
    ///
    /// 振幅をリリースレートで0へ近づけ、衝突フラグを倒す。
    pub fn ease_idle(&mut self) {
        self.factor = lerp(self.factor, 0.0, self.config.release_rate).max(0.0);
        self.prev_collisions.fill(false);
        self.ease_speed(false);
    }

    /// ノイズサンプリング速度の緩やかな追従
    ///
    /// 接触中かつ高速運動ならブースト値へ、それ以外はベースラインへ。
    /// 時定数は振幅よりはるかに遅い。
    fn ease_speed(&mut self, boosted: bool) {
        if boosted {
            self.speed = lerp_f64(
                self.speed,
                self.config.speed_boost,
                self.config.speed_ease_rate,
            );
        } else if self.speed > self.config.speed_base {
            self.speed = lerp_f64(
                self.speed,
                self.config.speed_base,
                self.config.speed_ease_rate,
            );
        } else {
            self.speed = self.config.speed_base;
        }
    }
}
