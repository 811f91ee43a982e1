//! Encoding and decoding statistics.

use std::time::Duration;

/// Encoding statistics
#[derive(Debug, Default, Clone)]
pub struct EncodingStats {
    /// Messages run through `encode`.
    pub total_messages_encoded: u64,
    /// Symbols generated and delivered.
    pub total_symbols_emitted: u64,
    /// Mean wall time of one encode run.
    pub average_encoding_time: Duration,
    /// `degree_histogram[d - 1]` counts emitted symbols of degree `d`.
    pub degree_histogram: Vec<u64>,
}

impl EncodingStats {
    pub(crate) fn with_k(k: usize) -> Self {
        Self { degree_histogram: vec![0; k], ..Self::default() }
    }

    pub(crate) fn record_symbol(&mut self, degree: usize) {
        self.total_symbols_emitted += 1;
        if let Some(slot) = degree.checked_sub(1).and_then(|d| self.degree_histogram.get_mut(d)) {
            *slot += 1;
        }
    }

    pub(crate) fn record_run(&mut self, elapsed: Duration) {
        self.total_messages_encoded += 1;
        self.average_encoding_time =
            running_mean(self.average_encoding_time, elapsed, self.total_messages_encoded);
    }

    /// Mean degree over every emitted symbol.
    pub fn mean_degree(&self) -> f64 {
        if self.total_symbols_emitted == 0 {
            return 0.0;
        }
        let weighted: u64 = self
            .degree_histogram
            .iter()
            .enumerate()
            .map(|(i, &n)| (i as u64 + 1) * n)
            .sum();
        weighted as f64 / self.total_symbols_emitted as f64
    }
}

/// Decoding statistics
#[derive(Debug, Default, Clone)]
pub struct DecodingStats {
    /// Batches peeled, successful or not.
    pub total_batches_decoded: u64,
    /// Batches that recovered every block.
    pub successful_decodings: u64,
    /// Batches that stalled or were rejected.
    pub failed_decodings: u64,
    /// Drains that ended before the quota was met.
    pub pipeline_stalls: u64,
    /// Mean batch size.
    pub average_symbols_used: f32,
    /// Mean wall time of one peel.
    pub average_decoding_time: Duration,
}

impl DecodingStats {
    pub(crate) fn record_batch(&mut self, symbols: usize, success: bool, elapsed: Duration) {
        self.total_batches_decoded += 1;
        if success {
            self.successful_decodings += 1;
        } else {
            self.failed_decodings += 1;
        }
        let n = self.total_batches_decoded;
        self.average_symbols_used =
            (self.average_symbols_used * (n - 1) as f32 + symbols as f32) / n as f32;
        self.average_decoding_time = running_mean(self.average_decoding_time, elapsed, n);
    }

    /// Fraction of batches decoded, `0.0` before the first.
    pub fn success_rate(&self) -> f32 {
        if self.total_batches_decoded == 0 {
            return 0.0;
        }
        self.successful_decodings as f32 / self.total_batches_decoded as f32
    }
}

fn running_mean(avg: Duration, sample: Duration, n: u64) -> Duration {
    if n <= 1 {
        return sample;
    }
    let total = avg.as_nanos() * u128::from(n - 1) + sample.as_nanos();
    Duration::from_nanos((total / u128::from(n)) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_and_mean_degree() {
        let mut s = EncodingStats::with_k(4);
        s.record_symbol(1);
        s.record_symbol(3);
        s.record_symbol(3);
        // Out-of-range degrees are counted but not binned.
        s.record_symbol(9);
        assert_eq!(s.degree_histogram, vec![1, 0, 2, 0]);
        assert_eq!(s.total_symbols_emitted, 4);
        assert!((s.mean_degree() - 7.0 / 4.0).abs() < 1e-12);
    }

    #[test]
    fn decoding_averages() {
        let mut s = DecodingStats::default();
        s.record_batch(10, true, Duration::from_millis(2));
        s.record_batch(20, false, Duration::from_millis(4));
        assert_eq!(s.total_batches_decoded, 2);
        assert_eq!(s.failed_decodings, 1);
        assert!((s.average_symbols_used - 15.0).abs() < 1e-6);
        assert_eq!(s.average_decoding_time, Duration::from_millis(3));
        assert!((s.success_rate() - 0.5).abs() < 1e-6);
    }
}
