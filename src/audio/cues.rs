//! Tone recipes for each cue.

use std::time::Duration;

use super::tone::{GainEnvelope, ToneSpec, Waveform};

const KNOCK_HZ: f32 = 800.0;
const KNOCK_SPACING: Duration = Duration::from_millis(150);
const TOCK_HZ: f32 = 300.0;
const GONG_HZ: f32 = 300.0;
const BELL_FUNDAMENTAL_HZ: f32 = 400.0;
const BELL_PARTIALS: [f32; 5] = [1.0, 1.4, 2.1, 2.7, 3.2];

/// Fast pace: two quick woodblock taps.
pub fn knock() -> Vec<ToneSpec> {
    [Duration::ZERO, KNOCK_SPACING]
        .into_iter()
        .map(|offset| ToneSpec {
            frequency_hz: KNOCK_HZ,
            waveform: Waveform::Sine,
            offset,
            duration: Duration::from_millis(100),
            envelope: GainEnvelope {
                start: 0.8,
                end: 0.01,
                ramp: Duration::from_millis(100),
            },
        })
        .collect()
}

/// Slow pace: a single lower tock.
pub fn tock() -> Vec<ToneSpec> {
    vec![ToneSpec {
        frequency_hz: TOCK_HZ,
        waveform: Waveform::Sine,
        offset: Duration::ZERO,
        duration: Duration::from_millis(100),
        envelope: GainEnvelope {
            start: 0.5,
            end: 0.01,
            ramp: Duration::from_millis(100),
        },
    }]
}

/// Phase change.
pub fn gong() -> Vec<ToneSpec> {
    vec![ToneSpec {
        frequency_hz: GONG_HZ,
        waveform: Waveform::Triangle,
        offset: Duration::ZERO,
        duration: Duration::from_millis(1500),
        envelope: GainEnvelope {
            start: 0.5,
            end: 0.01,
            ramp: Duration::from_millis(1500),
        },
    }]
}

/// Session end: bell-like chord of inharmonic partials.
pub fn bell() -> Vec<ToneSpec> {
    BELL_PARTIALS
        .iter()
        .map(|ratio| ToneSpec {
            frequency_hz: BELL_FUNDAMENTAL_HZ * ratio,
            waveform: Waveform::Triangle,
            offset: Duration::ZERO,
            duration: Duration::from_secs(3),
            envelope: GainEnvelope {
                start: 0.3,
                end: 0.001,
                ramp: Duration::from_millis(2500),
            },
        })
        .collect()
}
