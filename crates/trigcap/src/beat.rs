//! Packed sample beats.
//!
//! A beat is one 256-bit word moving through a lane per processing step:
//! sixteen signed 16-bit samples plus the stream side-band (byte keep mask
//! and end-of-frame flag).

/// Signed 16-bit sample amplitude.
pub type Sample = i16;

/// Number of samples packed into one beat.
pub const SAMPLES_PER_BEAT: usize = 16;

/// Size of the packed data word in bytes (256 bits).
pub const BEAT_DATA_BYTES: usize = SAMPLES_PER_BEAT * 2;

/// Keep mask with every data byte marked valid.
pub const KEEP_ALL: u32 = 0xFFFF_FFFF;

/// One beat of a lane.
///
/// `keep` carries one bit per data byte. It is transported untouched and has
/// no effect on detection. `last` is the end-of-frame marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Beat {
    /// Samples in word order: sample `i` occupies bits `16*i .. 16*i+15`.
    pub samples: [Sample; SAMPLES_PER_BEAT],
    /// Byte-valid mask.
    pub keep: u32,
    /// End-of-frame flag.
    pub last: bool,
}

impl Beat {
    /// Create a beat from samples with all bytes valid and `last` cleared.
    pub fn new(samples: [Sample; SAMPLES_PER_BEAT]) -> Self {
        Self {
            samples,
            keep: KEEP_ALL,
            last: false,
        }
    }

    /// A silent beat (all samples zero).
    pub fn zeroed() -> Self {
        Self::new([0; SAMPLES_PER_BEAT])
    }

    /// A beat carrying `value` in its first sample and zero elsewhere.
    ///
    /// # Examples
    ///
    /// ```
    /// use trigcap::Beat;
    ///
    /// let beat = Beat::with_first_sample(2000, false);
    /// assert_eq!(beat.samples[0], 2000);
    /// assert!(beat.samples[1..].iter().all(|&s| s == 0));
    /// ```
    pub fn with_first_sample(value: Sample, last: bool) -> Self {
        let mut samples = [0; SAMPLES_PER_BEAT];
        samples[0] = value;
        Self {
            samples,
            keep: KEEP_ALL,
            last,
        }
    }

    /// Set the end-of-frame flag.
    pub fn with_last(mut self, last: bool) -> Self {
        self.last = last;
        self
    }

    /// Unpack a 256-bit little-endian data word.
    pub fn from_data_bytes(data: &[u8; BEAT_DATA_BYTES]) -> Self {
        let samples =
            std::array::from_fn(|i| Sample::from_le_bytes([data[i * 2], data[i * 2 + 1]]));
        Self::new(samples)
    }

    /// Pack the samples into a 256-bit little-endian data word.
    pub fn to_data_bytes(&self) -> [u8; BEAT_DATA_BYTES] {
        let mut data = [0u8; BEAT_DATA_BYTES];
        for (chunk, sample) in data.chunks_exact_mut(2).zip(self.samples.iter()) {
            chunk.copy_from_slice(&sample.to_le_bytes());
        }
        data
    }

    /// Whether any sample's magnitude strictly exceeds `threshold`.
    ///
    /// Magnitude is the two's-complement wrapping absolute value, so
    /// `i16::MIN` stays negative and never exceeds a non-negative threshold.
    pub fn exceeds(&self, threshold: Sample) -> bool {
        self.samples.iter().any(|s| s.wrapping_abs() > threshold)
    }

    /// Largest wrapping magnitude among the samples.
    pub fn peak(&self) -> Sample {
        self.samples
            .iter()
            .map(|s| s.wrapping_abs())
            .max()
            .unwrap_or(0)
    }
}

impl Default for Beat {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl From<[Sample; SAMPLES_PER_BEAT]> for Beat {
    fn from(samples: [Sample; SAMPLES_PER_BEAT]) -> Self {
        Self::new(samples)
    }
}
