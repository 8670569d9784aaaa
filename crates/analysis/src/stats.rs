//! 在线统计

use contracts::StatsSummary;

/// 在线统计计算器 (Welford's algorithm)
///
/// 单次遍历、常数内存；空序列不产生任何统计值。
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// 总体方差 (除以 n)
    pub fn population_variance(&self) -> Option<f64> {
        (self.count > 0).then(|| self.m2 / self.count as f64)
    }

    /// 样本方差 (除以 n - 1)
    pub fn sample_variance(&self) -> Option<f64> {
        (self.count > 1).then(|| self.m2 / (self.count - 1) as f64)
    }

    /// 总体标准差
    pub fn std_dev(&self) -> Option<f64> {
        self.population_variance().map(f64::sqrt)
    }

    /// 最小值
    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    /// 最大值
    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }

    /// 按比例缩放后的摘要（例如 tick → 秒）
    pub fn summary_scaled(&self, divisor: f64) -> StatsSummary {
        StatsSummary {
            count: self.count,
            mean: self.mean().map(|v| v / divisor),
            std_dev: self.std_dev().map(|v| v / divisor),
            min: self.min().map(|v| v / divisor),
            max: self.max().map(|v| v / divisor),
        }
    }
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        stats.summary_scaled(1.0)
    }
}
