//! Telemetry smoothing filters.
//!
//! One filter instance per published channel, updated on every new sample
//! and published at the same cadence.  Every filter seeds itself with the
//! first sample, so there is no warm-up ramp from zero.

/// Largest supported moving-average window.
pub const MAX_WINDOW: usize = 32;

/// Fixed-window moving average with an output scale factor.
///
/// The first sample fills the whole window, after which each new sample
/// replaces the oldest one.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    ring: [f32; MAX_WINDOW],
    window: usize,
    head: usize,
    sum: f32,
    multiplier: f32,
    seeded: bool,
}

impl MovingAverage {
    /// `window` is clamped to `1..=MAX_WINDOW`.
    pub fn new(window: usize, multiplier: f32) -> Self {
        Self {
            ring: [0.0; MAX_WINDOW],
            window: window.clamp(1, MAX_WINDOW),
            head: 0,
            sum: 0.0,
            multiplier,
            seeded: false,
        }
    }

    pub fn update(&mut self, raw: f32) -> f32 {
        if !self.seeded {
            self.ring[..self.window].fill(raw);
            self.sum = raw * self.window as f32;
            self.seeded = true;
        } else {
            self.sum += raw - self.ring[self.head];
            self.ring[self.head] = raw;
            self.head = (self.head + 1) % self.window;
        }
        self.value()
    }

    /// Current output without feeding a sample.
    pub fn value(&self) -> f32 {
        if !self.seeded {
            return 0.0;
        }
        // Recompute from the ring rather than trusting the running sum:
        // float drift would otherwise accumulate over months of uptime.
        let mean = self.ring[..self.window].iter().sum::<f32>() / self.window as f32;
        self.multiplier * mean
    }
}

/// Exponentially weighted moving average.
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f32,
    state: Option<f32>,
}

impl Ema {
    /// `alpha` is clamped to `(0, 1]`; 1 passes samples through unchanged.
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(f32::EPSILON, 1.0),
            state: None,
        }
    }

    pub fn update(&mut self, raw: f32) -> f32 {
        let next = match self.state {
            None => raw,
            Some(s) => s + self.alpha * (raw - s),
        };
        self.state = Some(next);
        next
    }

    pub fn value(&self) -> f32 {
        self.state.unwrap_or(0.0)
    }
}

/// Per-channel filter choice.
#[derive(Debug, Clone)]
pub enum ChannelFilter {
    /// Forward raw samples unchanged.
    Passthrough { last: f32 },
    MovingAverage(MovingAverage),
    Exponential(Ema),
}

impl ChannelFilter {
    pub fn passthrough() -> Self {
        Self::Passthrough { last: 0.0 }
    }

    /// Moving average for `window > 0`, passthrough for 0.
    pub fn from_window(window: u8, multiplier: f32) -> Self {
        if window == 0 {
            Self::passthrough()
        } else {
            Self::MovingAverage(MovingAverage::new(usize::from(window), multiplier))
        }
    }

    /// EMA when `ema_alpha > 0`, otherwise as [`from_window`](Self::from_window).
    pub fn from_settings(window: u8, multiplier: f32, ema_alpha: f32) -> Self {
        if ema_alpha > 0.0 {
            Self::Exponential(Ema::new(ema_alpha))
        } else {
            Self::from_window(window, multiplier)
        }
    }

    pub fn update(&mut self, raw: f32) -> f32 {
        match self {
            Self::Passthrough { last } => {
                *last = raw;
                raw
            }
            Self::MovingAverage(m) => m.update(raw),
            Self::Exponential(e) => e.update(raw),
        }
    }

    pub fn value(&self) -> f32 {
        match self {
            Self::Passthrough { last } => *last,
            Self::MovingAverage(m) => m.value(),
            Self::Exponential(e) => e.value(),
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_seeds_moving_average() {
        let mut m = MovingAverage::new(15, 1.0);
        assert_eq!(m.update(12.5), 12.5);
    }

    #[test]
    fn first_sample_seeds_ema() {
        let mut e = Ema::new(0.2);
        assert_eq!(e.update(7.0), 7.0);
    }

    #[test]
    fn moving_average_tracks_window() {
        let mut m = MovingAverage::new(4, 1.0);
        m.update(0.0);
        for _ in 0..4 {
            m.update(8.0);
        }
        assert!((m.value() - 8.0).abs() < 1e-5);
    }

    #[test]
    fn moving_average_partial_replacement() {
        let mut m = MovingAverage::new(4, 1.0);
        m.update(4.0); // window: 4 4 4 4
        let out = m.update(8.0); // window: 8 4 4 4
        assert!((out - 5.0).abs() < 1e-5);
    }

    #[test]
    fn multiplier_scales_output() {
        let mut m = MovingAverage::new(3, 0.001);
        assert!((m.update(2500.0) - 2.5).abs() < 1e-5);
    }

    #[test]
    fn ema_converges_to_constant() {
        let mut e = Ema::new(0.3);
        e.update(100.0);
        let mut out = 0.0;
        for _ in 0..100 {
            out = e.update(20.0);
        }
        assert!((out - 20.0).abs() < 1e-3);
    }

    #[test]
    fn zero_window_is_passthrough() {
        let mut f = ChannelFilter::from_window(0, 1.0);
        assert!(f.is_passthrough());
        assert_eq!(f.update(1234.0), 1234.0);
        assert_eq!(f.update(987.0), 987.0);
        assert_eq!(f.value(), 987.0);
    }

    #[test]
    fn positive_alpha_selects_ema() {
        let mut f = ChannelFilter::from_settings(0, 1.0, 0.5);
        assert!(matches!(f, ChannelFilter::Exponential(_)));
        assert_eq!(f.update(800.0), 800.0);
        assert_eq!(f.update(1000.0), 900.0);
        assert!(ChannelFilter::from_settings(0, 1.0, 0.0).is_passthrough());
        assert!(matches!(
            ChannelFilter::from_settings(4, 1.0, 0.0),
            ChannelFilter::MovingAverage(_)
        ));
    }
}
