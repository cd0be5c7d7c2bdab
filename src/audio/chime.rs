use rodio::Source;
use std::f32::consts::PI;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44100;
const TONE_SECS: f32 = 0.35;

/// Two-note alert played when a step timer runs out.
/// Each note is a sine with a fast exponential decay, high note second.
pub struct Chime {
    notes: [f32; 2],
    sample_rate: u32,
    num_sample: usize,
    total_samples: usize,
}

impl Chime {
    pub fn new() -> Self {
        let per_note = (SAMPLE_RATE as f32 * TONE_SECS) as usize;
        Self {
            notes: [880.0, 1318.5],
            sample_rate: SAMPLE_RATE,
            num_sample: 0,
            total_samples: per_note * 2,
        }
    }
}

impl Default for Chime {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for Chime {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.num_sample >= self.total_samples {
            return None;
        }

        let per_note = self.total_samples / self.notes.len();
        let note = self.notes[self.num_sample / per_note];
        let t_in_note = (self.num_sample % per_note) as f32 / self.sample_rate as f32;
        self.num_sample += 1;

        let envelope = (-t_in_note * 9.0).exp();
        Some((2.0 * PI * note * t_in_note).sin() * envelope * 0.5)
    }
}

impl Source for Chime {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.total_samples - self.num_sample)
    }

    fn channels(&self) -> u16 {
        1 // Mono
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(
            self.total_samples as f32 / self.sample_rate as f32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chime_is_finite_and_bounded() {
        let chime = Chime::new();
        let expected = chime.total_samples;
        let duration = chime.total_duration().unwrap();

        let samples: Vec<f32> = chime.collect();

        assert_eq!(samples.len(), expected);
        assert!(samples.iter().all(|s| s.abs() <= 0.5));
        assert!(duration > Duration::from_millis(600));
        assert!(duration < Duration::from_secs(1));
    }
}
