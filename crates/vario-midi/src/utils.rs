//! Pitch and timing helpers

const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Scientific pitch name for a MIDI note number. Middle C (60) is `C4`.
pub fn pitch_name(pitch: u8) -> String {
    let octave = (pitch / 12) as i32 - 1;
    format!("{}{}", PITCH_CLASSES[(pitch % 12) as usize], octave)
}

/// Grid steps per second for a resolution and tempo.
#[inline]
pub fn steps_per_second(steps_per_quarter: u32, qpm: f64) -> f64 {
    steps_per_quarter as f64 * qpm / 60.0
}

/// Round half-up onto an integer step. Callers pass non-negative values, where
/// this coincides with rounding half away from zero.
#[inline]
pub(crate) fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Microseconds per quarter note, as stored in a MIDI tempo event.
#[inline]
pub fn qpm_to_us_per_quarter(qpm: f64) -> u32 {
    (60_000_000.0 / qpm).round() as u32
}
