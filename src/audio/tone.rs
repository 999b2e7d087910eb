use rodio::Source;
use std::f32::consts::PI;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
}

impl Waveform {
    /// Value of the waveform at `phase` cycles (fractional part used).
    fn sample(&self, phase: f32) -> f32 {
        let cycle = phase.fract();
        match self {
            Waveform::Sine => (2.0 * PI * cycle).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (cycle - 0.5).abs(),
        }
    }
}

/// Exponential gain ramp from `start` to `end` over `ramp`, then held at `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainEnvelope {
    pub start: f32,
    pub end: f32,
    pub ramp: Duration,
}

impl GainEnvelope {
    pub fn gain_at(&self, t: Duration) -> f32 {
        if self.ramp.is_zero() || t >= self.ramp {
            return self.end;
        }
        let progress = t.as_secs_f32() / self.ramp.as_secs_f32();
        self.start * (self.end / self.start).powf(progress)
    }
}

/// One scheduled oscillator: starts `offset` after the cue fires and stops
/// `duration` later.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency_hz: f32,
    pub waveform: Waveform,
    pub offset: Duration,
    pub duration: Duration,
    pub envelope: GainEnvelope,
}

/// Renders a [`ToneSpec`] (without its offset) as a finite mono stream.
pub struct Tone {
    spec: ToneSpec,
    sample_rate: u32,
    num_sample: usize,
    total_samples: usize,
}

impl Tone {
    pub fn new(spec: ToneSpec) -> Self {
        let total_samples = (spec.duration.as_secs_f64() * SAMPLE_RATE as f64).round() as usize;
        Self {
            spec,
            sample_rate: SAMPLE_RATE,
            num_sample: 0,
            total_samples,
        }
    }
}

impl Iterator for Tone {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.num_sample >= self.total_samples {
            return None;
        }

        let t = self.num_sample as f32 / self.sample_rate as f32;
        self.num_sample += 1;

        let phase = self.spec.frequency_hz * t;
        let gain = self.spec.envelope.gain_at(Duration::from_secs_f32(t));
        Some(self.spec.waveform.sample(phase) * gain)
    }
}

impl Source for Tone {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.total_samples.saturating_sub(self.num_sample))
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(self.spec.duration)
    }
}
