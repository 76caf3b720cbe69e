// src/config/constants.rs
//! Toolbox-wide numeric constants
//!
//! All numeric policy lives here rather than inline in the operators.

/// Filter engine constants
pub mod filters {
    pub const MIN_FILTER_ORDER: usize = 1;
    pub const MAX_FILTER_ORDER: usize = 8;
    pub const DEFAULT_FILTER_ORDER: usize = 4;

    pub const POWERLINE_FREQ_50HZ: f64 = 50.0;
    pub const POWERLINE_FREQ_60HZ: f64 = 60.0;
    /// Narrow-band rejection around the mains line
    pub const DEFAULT_NOTCH_Q: f64 = 30.0;
}

/// EMG preprocessing constants
pub mod emg {
    /// Band-pass edges removing baseline drift and movement artifacts
    pub const BANDPASS_LOW_HZ: f64 = 50.0;
    pub const BANDPASS_HIGH_HZ: f64 = 470.0;
    pub const BANDPASS_ORDER: usize = 4;

    /// Time constant of the rectified-signal smoothing stage
    pub const ENVELOPE_TIME_CONSTANT_S: f64 = 0.003;
    pub const ENVELOPE_ORDER: usize = 4;
}

/// Interpolation engine constants
pub mod interpolation {
    /// Minimum known samples needed to fit any interpolant
    pub const MIN_SUPPORT_POINTS: usize = 2;
    /// Neighborhood size for cubic convolution
    pub const CUBIC_NEIGHBORHOOD: usize = 4;
}

/// Persisted store constants
pub mod store {
    pub const FORMAT_VERSION: u32 = 1;
}
