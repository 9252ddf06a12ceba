/// 発射判定の数値誤差許容値（秒）
const TIMER_EPSILON: f64 = 1e-9;

/// 攻撃タイマー
///
/// 毎ティック経過時間を累積し、発射間隔に達したら1発分を消費します。
/// 端数は次の周期へ繰り越されるため、一定のティック幅でも発射時刻がずれません。
/// 繰り越しは直前ティックの幅以内に限られ、1ティックが発射間隔以上の場合は
/// 撃ち損ねた分を捨てて次の周期を0から数えます。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AttackTimer {
    elapsed: f64,
    last_dt: f64,
}

impl AttackTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.last_dt = 0.0;
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// 経過時間を累積
    pub fn advance(&mut self, dt: f64) {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
            self.last_dt = dt;
        }
    }

    /// 発射間隔に達しているか
    pub fn ready(&self, interval: f64) -> bool {
        interval.is_finite() && self.elapsed + TIMER_EPSILON >= interval
    }

    /// 1発分を消費
    ///
    /// 端数の繰り越しは直前ティックの幅以内かつ発射間隔未満に制限します。
    pub fn consume(&mut self, interval: f64) {
        if self.last_dt + TIMER_EPSILON >= interval {
            self.elapsed = 0.0;
            return;
        }
        let limit = self.last_dt.min(interval - 2.0 * TIMER_EPSILON);
        self.elapsed = (self.elapsed - interval).clamp(0.0, limit.max(0.0));
    }

    /// 発射を保留した場合、累積を1周期分で頭打ちにする
    pub fn hold(&mut self, interval: f64) {
        if interval.is_finite() && self.elapsed > interval {
            self.elapsed = interval;
        }
    }
}
