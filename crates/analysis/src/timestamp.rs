//! Timestamp series analysis
//!
//! Periods and phase are accumulated in the series' native ticks so integer
//! nanosecond timestamps stay exact; conversion to seconds happens once in
//! `finalize`.

use contracts::{Number, TimeUnit, TimestampSummary};

use crate::stats::RunningStats;

/// Incremental period / frequency / phase analyzer
#[derive(Debug, Clone)]
pub struct TimestampAnalyzer {
    frequency_hz: f64,
    unit: TimeUnit,
    expected_period: f64,
    first: Option<Number>,
    previous: Option<Number>,
    periods: RunningStats,
    frequencies: RunningStats,
    phase: RunningStats,
    anomaly_count: u64,
}

impl TimestampAnalyzer {
    /// `frequency_hz` must be finite and positive; `AnalysisKind::parse` enforces it
    pub fn new(frequency_hz: f64, unit: TimeUnit) -> Self {
        Self {
            frequency_hz,
            unit,
            expected_period: unit.ticks_per_second() / frequency_hz,
            first: None,
            previous: None,
            periods: RunningStats::new(),
            frequencies: RunningStats::new(),
            phase: RunningStats::new(),
            anomaly_count: 0,
        }
    }

    /// Feed the next timestamp in arrival order
    pub fn push(&mut self, timestamp: Number) {
        let t0 = *self.first.get_or_insert(timestamp);

        let half = self.expected_period / 2.0;
        let offset = difference(timestamp, t0);
        self.phase
            .push((offset + half).rem_euclid(self.expected_period) - half);

        if let Some(previous) = self.previous {
            let period = difference(timestamp, previous);
            if period > 0.0 {
                self.periods.push(period);
                self.frequencies
                    .push(self.unit.ticks_per_second() / period);
            } else {
                self.anomaly_count += 1;
            }
        }
        self.previous = Some(timestamp);
    }

    pub fn anomaly_count(&self) -> u64 {
        self.anomaly_count
    }

    pub fn finalize(self) -> TimestampSummary {
        let tps = self.unit.ticks_per_second();
        let observed = self
            .periods
            .mean()
            .filter(|mean| *mean > 0.0)
            .map(|mean| tps / mean);
        let deviation = observed.map(|f| f - self.frequency_hz);

        TimestampSummary {
            specified_frequency_hz: self.frequency_hz,
            expected_period_s: self.expected_period / tps,
            unit: self.unit,
            period_s: self.periods.summary_scaled(tps),
            jitter_s: self.periods.std_dev().map(|v| v / tps),
            drift_min_s: self.periods.min().map(|v| v / tps),
            drift_max_s: self.periods.max().map(|v| v / tps),
            observed_frequency_hz: observed,
            frequency_deviation_hz: deviation,
            frequency_deviation_pct: deviation.map(|d| d / self.frequency_hz * 100.0),
            instantaneous_frequency_hz: (&self.frequencies).into(),
            phase_deviation_s: self.phase.summary_scaled(tps),
            anomaly_count: self.anomaly_count,
        }
    }
}

/// `a - b` in ticks, exact for integer timestamps within 2^53
fn difference(a: Number, b: Number) -> f64 {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => (i128::from(x) - i128::from(y)) as f64,
        _ => a.as_f64() - b.as_f64(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(freq: f64, unit: TimeUnit, timestamps: &[i64]) -> TimestampSummary {
        let mut analyzer = TimestampAnalyzer::new(freq, unit);
        for &t in timestamps {
            analyzer.push(Number::Int(t));
        }
        analyzer.finalize()
    }

    #[test]
    fn test_perfect_100hz() {
        let start = 1_700_000_000_000_000_000_i64;
        let timestamps: Vec<i64> = (0..50).map(|i| start + i * 10_000_000).collect();
        let summary = analyze(100.0, TimeUnit::Nanoseconds, &timestamps);

        assert_eq!(summary.period_s.count, 49);
        assert_eq!(summary.period_s.mean, Some(0.01));
        assert_eq!(summary.jitter_s, Some(0.0));
        assert_eq!(summary.observed_frequency_hz, Some(100.0));
        assert_eq!(summary.frequency_deviation_hz, Some(0.0));
        assert_eq!(summary.frequency_deviation_pct, Some(0.0));
        assert_eq!(summary.anomaly_count, 0);
        assert_eq!(summary.phase_deviation_s.max, Some(0.0));
        assert_eq!(summary.expected_period_s, 0.01);
    }

    #[test]
    fn test_out_of_order_counts_anomalies() {
        let summary = analyze(
            100.0,
            TimeUnit::Nanoseconds,
            &[0, 10_000_000, 30_000_000, 20_000_000, 40_000_000],
        );
        // 10ms, 20ms, -10ms (anomaly), 20ms
        assert_eq!(summary.anomaly_count, 1);
        assert_eq!(summary.period_s.count, 3);
        assert_eq!(summary.drift_min_s, Some(0.01));
        assert_eq!(summary.drift_max_s, Some(0.02));
    }

    #[test]
    fn test_duplicate_timestamp_is_anomaly() {
        let summary = analyze(10.0, TimeUnit::Nanoseconds, &[5, 5, 100_000_005]);
        assert_eq!(summary.anomaly_count, 1);
        assert_eq!(summary.period_s.count, 1);
    }

    #[test]
    fn test_millisecond_unit() {
        let summary = analyze(50.0, TimeUnit::Milliseconds, &[0, 20, 40, 60]);
        assert_eq!(summary.period_s.mean, Some(0.02));
        assert_eq!(summary.observed_frequency_hz, Some(50.0));
    }

    #[test]
    fn test_phase_deviation() {
        // T = 10ms; second sample 2ms late, third 3ms early
        let summary = analyze(100.0, TimeUnit::Nanoseconds, &[0, 12_000_000, 17_000_000]);
        assert_eq!(summary.phase_deviation_s.count, 3);
        assert!((summary.phase_deviation_s.max.unwrap() - 0.002).abs() < 1e-12);
        assert!((summary.phase_deviation_s.min.unwrap() + 0.003).abs() < 1e-12);
    }

    #[test]
    fn test_too_few_samples() {
        let summary = analyze(100.0, TimeUnit::Nanoseconds, &[42]);
        assert_eq!(summary.period_s.count, 0);
        assert_eq!(summary.jitter_s, None);
        assert_eq!(summary.observed_frequency_hz, None);
        assert_eq!(summary.instantaneous_frequency_hz.mean, None);

        let empty = analyze(100.0, TimeUnit::Nanoseconds, &[]);
        assert_eq!(empty.phase_deviation_s.count, 0);
        assert_eq!(empty.anomaly_count, 0);
    }

    #[test]
    fn test_float_timestamps() {
        let mut analyzer = TimestampAnalyzer::new(4.0, TimeUnit::Seconds);
        for t in [0.0, 0.25, 0.5, 0.75] {
            analyzer.push(Number::Float(t));
        }
        let summary = analyzer.finalize();
        assert_eq!(summary.observed_frequency_hz, Some(4.0));
    }
}
