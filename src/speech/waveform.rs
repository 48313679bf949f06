//! Deterministic waveform synthesis: the two guaranteed TTS tiers.
//!
//! Neither tier produces intelligible speech. Algorithmic synthesis shapes
//! a speech-like cadence — per-word syllable envelopes over a
//! character-keyed fundamental with harmonics, punctuation-driven pauses.
//! Tone synthesis emits one tone per word as a non-silent placeholder.
//! Both are pure functions of the input text: no randomness, no clock, so
//! identical text yields byte-identical samples.

pub const SAMPLE_RATE: u32 = 22_050;

/// Duration floor: trivial or empty text still yields audible output.
const MIN_SECS: f32 = 0.5;
/// Duration ceiling: bounds the response size for very long text.
const MAX_SECS: f32 = 30.0;
/// Output never exceeds this peak amplitude.
const PEAK: f32 = 0.8;

const SYLLABLE_SECS: f32 = 0.11;
const WORD_GAP_SECS: f32 = 0.06;
const PAUSE_SECS: f32 = 0.22;
const TONE_SECS: f32 = 0.18;
const TONE_GAP_SECS: f32 = 0.05;
const HUM_FREQ: f32 = 110.0;

/// Speech-cadence approximation of `text`.
pub fn algorithmic(text: &str) -> Vec<f32> {
    let mut samples = Vec::new();

    for word in text.split_whitespace() {
        let letters: Vec<char> = word.chars().filter(|c| c.is_alphanumeric()).collect();
        if letters.is_empty() {
            // Bare punctuation still marks a beat.
            append_silence(&mut samples, PAUSE_SECS);
            continue;
        }

        let fundamental = word_fundamental(&letters);
        let syllables = 1 + letters.len().saturating_sub(1) / 3;
        for s in 0..syllables {
            // Small per-syllable pitch drift approximates prosody.
            let drift = 1.0 + 0.04 * s as f32 - 0.02 * (syllables as f32 - 1.0);
            append_voiced(&mut samples, fundamental * drift, SYLLABLE_SECS);
        }

        append_silence(&mut samples, WORD_GAP_SECS);
        if word.ends_with(['.', '!', '?', ',', ';', ':']) {
            append_silence(&mut samples, PAUSE_SECS);
        }
    }

    finish(samples)
}

/// One tone per word, frequency keyed to the word's first character.
pub fn tones(text: &str) -> Vec<f32> {
    let mut samples = Vec::new();

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        append_tone(&mut samples, 440.0, MIN_SECS, 0.3);
        return finish(samples);
    }

    for word in &words {
        let c = word.chars().find(|c| c.is_alphanumeric()).unwrap_or('a');
        append_tone(&mut samples, char_frequency(c), TONE_SECS, 0.3);
        append_silence(&mut samples, TONE_GAP_SECS);
    }

    finish(samples)
}

/// A-Z mapped into a 220-720 Hz band.
fn char_frequency(c: char) -> f32 {
    let code = (c.to_ascii_lowercase() as u32 % 26) + 1;
    200.0 + code as f32 * 20.0
}

/// Character-keyed fundamental in a 90-130 Hz voice band.
fn word_fundamental(letters: &[char]) -> f32 {
    let sum: u32 = letters.iter().map(|c| *c as u32).sum();
    90.0 + (sum % 40) as f32
}

/// Voiced segment: fundamental plus two harmonics under a half-sine
/// swell envelope.
fn append_voiced(samples: &mut Vec<f32>, fundamental: f32, secs: f32) {
    let n = (secs * SAMPLE_RATE as f32) as usize;
    for i in 0..n {
        let t = i as f32 / SAMPLE_RATE as f32;
        let env = (std::f32::consts::PI * i as f32 / n as f32).sin();
        let w = 2.0 * std::f32::consts::PI * fundamental * t;
        let s = 0.6 * w.sin() + 0.25 * (2.0 * w).sin() + 0.15 * (3.0 * w).sin();
        samples.push(0.6 * env * s);
    }
}

/// Plain sine tone with 10ms edge ramps to avoid clicks.
fn append_tone(samples: &mut Vec<f32>, freq: f32, secs: f32, amp: f32) {
    let n = (secs * SAMPLE_RATE as f32) as usize;
    let ramp = (SAMPLE_RATE as f32 * 0.01) as usize;
    for i in 0..n {
        let t = i as f32 / SAMPLE_RATE as f32;
        let env = if i < ramp {
            i as f32 / ramp as f32
        } else if i + ramp > n {
            (n - i) as f32 / ramp as f32
        } else {
            1.0
        };
        samples.push(amp * env * (2.0 * std::f32::consts::PI * freq * t).sin());
    }
}

fn append_silence(samples: &mut Vec<f32>, secs: f32) {
    let n = (secs * SAMPLE_RATE as f32) as usize;
    samples.resize(samples.len() + n, 0.0);
}

/// Apply the duration floor and ceiling, then bound the peak amplitude.
fn finish(mut samples: Vec<f32>) -> Vec<f32> {
    let max_len = (MAX_SECS * SAMPLE_RATE as f32) as usize;
    if samples.len() > max_len {
        samples.truncate(max_len);
        // 50ms fade so the truncation doesn't click.
        let fade = (SAMPLE_RATE as f32 * 0.05) as usize;
        let len = samples.len();
        for (k, s) in samples[len - fade..].iter_mut().enumerate() {
            *s *= (fade - k) as f32 / fade as f32;
        }
    }

    // Pad with a quiet hum rather than silence: the floor must stay audible.
    let min_len = (MIN_SECS * SAMPLE_RATE as f32) as usize;
    while samples.len() < min_len {
        let t = samples.len() as f32 / SAMPLE_RATE as f32;
        samples.push(0.08 * (2.0 * std::f32::consts::PI * HUM_FREQ * t).sin());
    }

    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > PEAK {
        let scale = PEAK / peak;
        for s in &mut samples {
            *s *= scale;
        }
    }

    samples
}
