use rodio::Source;
use std::f32::consts::TAU;
use std::time::Duration;

/// The "Om" frequency, a year of the Earth transposed up 32 octaves.
pub const OM_FREQUENCY_HZ: f32 = 136.1;

/// Continuous sine drone at [`OM_FREQUENCY_HZ`].
pub struct OmTone {
    frequency: f32,
    sample_rate: u32,
    // Normalized phase in [0, 1) so long sessions do not lose precision.
    phase: f32,
}

impl OmTone {
    pub fn new() -> Self {
        Self::with_frequency(OM_FREQUENCY_HZ)
    }

    pub fn with_frequency(frequency: f32) -> Self {
        Self {
            frequency,
            sample_rate: 44100,
            phase: 0.0,
        }
    }
}

impl Iterator for OmTone {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let sample = (TAU * self.phase).sin();

        self.phase += self.frequency / self.sample_rate as f32;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        Some(sample)
    }
}

impl Source for OmTone {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_within_unit_amplitude() {
        let peak = OmTone::new()
            .take(44100)
            .fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(peak <= 1.0);
        assert!(peak > 0.99);
    }

    #[test]
    fn completes_expected_cycles_per_second() {
        // Count upward zero crossings over one second of audio.
        let samples: Vec<f32> = OmTone::new().take(44100).collect();
        let crossings = samples
            .windows(2)
            .filter(|pair| pair[0] < 0.0 && pair[1] >= 0.0)
            .count();
        assert!((135..=137).contains(&crossings), "got {crossings}");
    }

    #[test]
    fn never_ends() {
        let mut tone = OmTone::new();
        assert!(tone.nth(10 * 44100).is_some());
        assert_eq!(tone.total_duration(), None);
    }
}
