use rodio::Source;
use std::f32::consts::TAU;
use std::time::Duration;

/// Partials of one strike as (frequency Hz, relative amplitude).
pub const BELL_PARTIALS: [(f32, f32); 5] = [
    (200.0, 1.0),
    (400.0, 0.5),
    (800.0, 0.3),
    (1200.0, 0.2),
    (1600.0, 0.1),
];

/// Time between strikes.
pub const STRIKE_PERIOD: Duration = Duration::from_millis(3500);

/// Length of a single strike; the envelope reaches [`DECAY_FLOOR`] here.
pub const STRIKE_DECAY: Duration = Duration::from_secs(3);

pub const DECAY_FLOOR: f32 = 0.001;

/// Temple bell restruck on a fixed period.
/// Each strike is a harmonic chord with an exponential envelope that dies out
/// before the next strike starts, so strikes never overlap.
pub struct TempleBell {
    sample_rate: u32,
    num_sample: u64,
    period_samples: u64,
    decay_samples: u64,
}

impl TempleBell {
    pub fn new() -> Self {
        let sample_rate = 44100;
        Self {
            sample_rate,
            num_sample: 0,
            period_samples: samples_for(STRIKE_PERIOD, sample_rate),
            decay_samples: samples_for(STRIKE_DECAY, sample_rate),
        }
    }

    /// Envelope gain `position` samples after a strike.
    fn envelope(&self, position: u64) -> f32 {
        if position >= self.decay_samples {
            return 0.0;
        }
        // Same curve as an exponential ramp from 1.0 to DECAY_FLOOR.
        let fraction = position as f32 / self.decay_samples as f32;
        DECAY_FLOOR.powf(fraction)
    }
}

fn samples_for(duration: Duration, sample_rate: u32) -> u64 {
    (duration.as_secs_f64() * sample_rate as f64).round() as u64
}

impl Iterator for TempleBell {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let position = self.num_sample % self.period_samples;
        self.num_sample = self.num_sample.wrapping_add(1);

        let envelope = self.envelope(position);
        if envelope == 0.0 {
            return Some(0.0);
        }

        let t = position as f32 / self.sample_rate as f32;
        let chord: f32 = BELL_PARTIALS
            .iter()
            .map(|(freq, amp)| amp * (TAU * freq * t).sin())
            .sum();

        Some(chord * envelope)
    }
}

impl Source for TempleBell {
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

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    #[test]
    fn strike_decays_before_the_next_one() {
        let samples: Vec<f32> = TempleBell::new().take(2 * 154_350).collect();

        let attack = peak(&samples[..4410]);
        let tail = peak(&samples[(2.9 * 44100.0) as usize..(3.0 * 44100.0) as usize]);
        let gap = peak(&samples[(3.0 * 44100.0) as usize..154_350]);

        assert!(attack > 0.5);
        assert!(tail < attack * 0.01);
        assert_eq!(gap, 0.0);
    }

    #[test]
    fn restrikes_every_period() {
        let samples: Vec<f32> = TempleBell::new().take(3 * 154_350).collect();
        for strike in 0..3 {
            let start = strike * 154_350;
            assert!(peak(&samples[start..start + 4410]) > 0.5, "strike {strike}");
        }
    }

    #[test]
    fn chord_amplitude_is_bounded_by_partial_sum() {
        let limit: f32 = BELL_PARTIALS.iter().map(|(_, amp)| amp).sum();
        let samples: Vec<f32> = TempleBell::new().take(44100).collect();
        assert!(peak(&samples) <= limit);
    }
}
