// Timebase - Time unit conventions
// Milliseconds for region boundaries, seconds for the audio clock,
// native time units (beats) for generated note sequences

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Region boundary time in milliseconds
///
/// Stored as `f64` because renderer drags produce fractional values;
/// the wire format is always a whole number (see [`Millis::round_to_wire`]).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Millis(pub f64);

impl Millis {
    pub const ZERO: Millis = Millis(0.0);

    pub fn new(ms: f64) -> Self {
        Self(ms)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// ms → s (divide by 1000)
    pub fn to_seconds(self) -> Seconds {
        Seconds(self.0 / 1000.0)
    }

    /// Nearest whole millisecond, clamped at zero
    pub fn round_to_wire(self) -> u64 {
        if self.0.is_finite() && self.0 > 0.0 {
            self.0.round() as u64
        } else {
            0
        }
    }
}

impl From<u64> for Millis {
    fn from(ms: u64) -> Self {
        Self(ms as f64)
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0} ms", self.0)
    }
}

/// Audio clock time in seconds
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Seconds(pub f64);

impl Seconds {
    pub const ZERO: Seconds = Seconds(0.0);

    pub fn new(s: f64) -> Self {
        Self(s)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// s → ms (multiply by 1000)
    pub fn to_millis(self) -> Millis {
        Millis(self.0 * 1000.0)
    }

    pub fn max(self, other: Seconds) -> Seconds {
        Seconds(self.0.max(other.0))
    }
}

impl Add for Seconds {
    type Output = Seconds;

    fn add(self, rhs: Seconds) -> Seconds {
        Seconds(self.0 + rhs.0)
    }
}

impl Sub for Seconds {
    type Output = Seconds;

    fn sub(self, rhs: Seconds) -> Seconds {
        Seconds(self.0 - rhs.0)
    }
}

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} s", self.0)
    }
}

/// Native time unit of generated note sequences
///
/// Interpreted as beats at the generation tempo unless the configuration
/// says the generator emits seconds. Converting to [`Seconds`] always goes
/// through an explicit [`NtuRate`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Ntu(pub f64);

impl Ntu {
    pub fn new(units: f64) -> Self {
        Self(units)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn to_seconds(self, rate: NtuRate) -> Seconds {
        Seconds(self.0 * rate.seconds_per_unit())
    }
}

/// How the generator's time values should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NtuMode {
    /// One unit is one beat at the generation tempo
    #[default]
    Beats,
    /// One unit is one second
    Seconds,
}

/// Conversion rate NTU → seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NtuRate {
    seconds_per_unit: f64,
}

impl NtuRate {
    /// One unit per second
    pub const SECONDS: NtuRate = NtuRate {
        seconds_per_unit: 1.0,
    };

    /// Slowest and fastest tempo accepted for beat conversion
    pub const MIN_BPM: f64 = 20.0;
    pub const MAX_BPM: f64 = 999.0;

    /// Creates a rate from an explicit number of seconds per unit
    /// Non-positive or non-finite values fall back to one second per unit
    pub fn new(seconds_per_unit: f64) -> Self {
        if seconds_per_unit.is_finite() && seconds_per_unit > 0.0 {
            Self { seconds_per_unit }
        } else {
            Self::SECONDS
        }
    }

    /// Beat rate at the given tempo: 60 / bpm seconds per unit
    pub fn from_tempo(bpm: f64) -> Self {
        let bpm = if bpm.is_finite() {
            bpm.clamp(Self::MIN_BPM, Self::MAX_BPM)
        } else {
            120.0
        };
        Self::new(60.0 / bpm)
    }

    /// Rate for a generation tempo under the given mode
    pub fn for_mode(mode: NtuMode, bpm: f64) -> Self {
        match mode {
            NtuMode::Beats => Self::from_tempo(bpm),
            NtuMode::Seconds => Self::SECONDS,
        }
    }

    pub fn seconds_per_unit(&self) -> f64 {
        self.seconds_per_unit
    }
}

impl Default for NtuRate {
    fn default() -> Self {
        Self::SECONDS
    }
}

impl fmt::Display for NtuRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} s/unit", self.seconds_per_unit)
    }
}

/// Frequency in Hz of a MIDI note number: 440 * 2^((note - 69) / 12)
pub fn midi_to_frequency(midi: u8) -> f64 {
    440.0 * 2_f64.powf((midi as f64 - 69.0) / 12.0)
}
