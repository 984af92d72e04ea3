/// Hard upper bound on the moving-average window.
pub const MAX_WINDOW: usize = 64;

/// Fixed-window moving average over raw ADC samples.
///
/// A ring buffer with a running sum: each update replaces the oldest sample
/// and adjusts the sum, so the average is O(1) regardless of window size.
pub struct MeanFilter {
    window: [u16; MAX_WINDOW],
    window_size: usize, // 0 marks an inert filter
    head: usize,        // Next slot to overwrite
    sum: u32,
}

impl MeanFilter {
    /// Creates a filter with the given window size.
    ///
    /// Caller contract: a size of zero or above [`MAX_WINDOW`] yields an
    /// inert filter: `update` does nothing and `average` returns 0 until
    /// the filter is constructed with a valid size.
    pub fn new(size: usize) -> Self {
        let window_size = if size == 0 || size > MAX_WINDOW { 0 } else { size };
        Self {
            window: [0; MAX_WINDOW],
            window_size,
            head: 0,
            sum: 0,
        }
    }

    /// Pushes one raw sample, dropping the oldest one in the window.
    pub fn update(&mut self, sample: u16) {
        if self.window_size == 0 {
            return;
        }
        // head points at the oldest sample, which is about to be replaced
        self.sum -= self.window[self.head] as u32;
        self.window[self.head] = sample;
        self.sum += sample as u32;
        self.head = (self.head + 1) % self.window_size;
    }

    /// Truncating average of the current window contents, 0 while inert.
    pub fn average(&self) -> u16 {
        if self.window_size == 0 {
            return 0;
        }
        (self.sum / self.window_size as u32) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_window_of_identical_samples_averages_exactly() {
        let mut filter = MeanFilter::new(8);
        for _ in 0..8 {
            filter.update(1234);
        }
        assert_eq!(filter.average(), 1234);
    }

    #[test]
    fn running_sum_matches_window_contents() {
        let mut filter = MeanFilter::new(5);
        let samples = [3u16, 9, 1, 65535, 40, 7, 12, 0, 33, 5, 5, 18000];
        for (i, s) in samples.iter().enumerate() {
            filter.update(*s);
            // Recompute the expected window by hand: last min(i+1, 5) samples
            let taken = (i + 1).min(5);
            let expected: u32 = samples[i + 1 - taken..=i].iter().map(|v| *v as u32).sum();
            assert_eq!(filter.sum, expected);
        }
    }

    #[test]
    fn partial_window_divides_by_window_size() {
        // Truncating division over the configured size, not the fill level
        let mut filter = MeanFilter::new(4);
        filter.update(100);
        assert_eq!(filter.average(), 25);
    }

    #[test]
    fn invalid_window_size_leaves_filter_inert() {
        for bad in [0, MAX_WINDOW + 1] {
            let mut filter = MeanFilter::new(bad);
            filter.update(500);
            filter.update(500);
            assert_eq!(filter.average(), 0);
        }
    }

    #[test]
    fn max_window_is_valid() {
        let mut filter = MeanFilter::new(MAX_WINDOW);
        for _ in 0..MAX_WINDOW {
            filter.update(777);
        }
        assert_eq!(filter.average(), 777);
    }
}
