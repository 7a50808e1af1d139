//! Standard MIDI File I/O
//!
//! Writes a [`NoteSequence`] as a single-track (format 0) SMF and parses SMF
//! data back into a sequence, using the `midly` crate. Times are converted
//! between seconds and ticks with the sequence's own tempo and tick
//! resolution; only the first tempo event of a parsed file is honoured.

use crate::error::{Error, Result};
use crate::note::MAX_PITCH;
use crate::sequence::{NoteSequence, SequenceBuilder, DEFAULT_QPM};
use crate::utils::qpm_to_us_per_quarter;
use midly::num::{u15, u24, u28, u4, u7};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

const MAX_DELTA: u32 = 0x0FFF_FFFF;
const MAX_TEMPO: u32 = 0x00FF_FFFF;
/// Latest absolute tick a written note may sit on.
const MAX_TICK: u64 = u32::MAX as u64;

/// Serialize `seq` and write it to `path`.
pub fn write_midi(seq: &NoteSequence, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let bytes = encode_midi(seq)?;
    std::fs::write(path, &bytes)?;
    info!("Wrote {} notes to {}", seq.len(), path.display());
    Ok(())
}

/// Serialize `seq` into SMF bytes.
pub fn encode_midi(seq: &NoteSequence) -> Result<Vec<u8>> {
    let smf = sequence_to_smf(seq)?;
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

/// Load and parse a MIDI file from disk.
pub fn read_midi(path: impl AsRef<Path>) -> Result<NoteSequence> {
    let data = std::fs::read(path.as_ref())?;
    parse_midi(&data)
}

/// Parse SMF bytes into a sequence. All tracks and channels are merged.
pub fn parse_midi(data: &[u8]) -> Result<NoteSequence> {
    let smf = Smf::parse(data)?;

    let ticks_per_quarter = match smf.header.timing {
        Timing::Metrical(tpq) => tpq.as_int(),
        Timing::Timecode(_, _) => {
            return Err(Error::MidiUnsupportedTiming);
        }
    };

    let qpm = smf
        .tracks
        .iter()
        .find_map(extract_tempo)
        .unwrap_or(DEFAULT_QPM);

    debug!(
        "Parsing MIDI file: {} tracks, {} ticks per quarter, {:.1} qpm",
        smf.tracks.len(),
        ticks_per_quarter,
        qpm
    );

    let seconds_per_tick = 60.0 / (qpm * ticks_per_quarter as f64);
    let mut builder = SequenceBuilder::new()
        .ticks_per_quarter(ticks_per_quarter as u32)
        .qpm(qpm);

    let mut spans: Vec<(u64, u64, u8, u8)> = Vec::new();
    for track in &smf.tracks {
        spans.extend(parse_track(track));
    }
    spans.sort_by_key(|&(start, _, pitch, _)| (start, pitch));

    for (start, end, pitch, velocity) in spans {
        builder = builder.velocity(velocity).note(
            pitch,
            start as f64 * seconds_per_tick,
            end as f64 * seconds_per_tick,
        );
    }

    builder.build()
}

/// Pair note-on/note-off messages into `(start_tick, end_tick, pitch, velocity)`.
fn parse_track(track: &Track) -> Vec<(u64, u64, u8, u8)> {
    let mut spans = Vec::new();
    let mut sounding: HashMap<(u8, u8), (u64, u8)> = HashMap::new();
    let mut tick = 0u64;

    for event in track.iter() {
        tick += event.delta.as_int() as u64;

        let TrackEventKind::Midi { channel, message } = event.kind else {
            continue;
        };
        let channel = channel.as_int();

        match message {
            // velocity 0 is a note off
            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                let key = key.as_int();
                if let Some((start, velocity)) = sounding.remove(&(channel, key)) {
                    if tick > start {
                        spans.push((start, tick, key, velocity));
                    }
                }
                sounding.insert((channel, key), (tick, vel.as_int()));
            }
            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                let key = key.as_int();
                if let Some((start, velocity)) = sounding.remove(&(channel, key)) {
                    if tick > start {
                        spans.push((start, tick, key, velocity));
                    }
                }
            }
            _ => {}
        }
    }

    // Notes never released end with the track
    for ((_, key), (start, velocity)) in sounding {
        if tick > start {
            spans.push((start, tick, key, velocity));
        }
    }

    spans
}

/// Tempo of the first tempo meta event, in quarter notes per minute.
fn extract_tempo(track: &Track) -> Option<f64> {
    track.iter().find_map(|event| match event.kind {
        TrackEventKind::Meta(MetaMessage::Tempo(tempo)) if tempo.as_int() > 0 => {
            Some(60_000_000.0 / tempo.as_int() as f64)
        }
        _ => None,
    })
}

fn sequence_to_smf(seq: &NoteSequence) -> Result<Smf<'static>> {
    // Builder guarantees 1..=0x7FFF
    let ticks_per_quarter = seq.ticks_per_quarter() as u16;
    let ticks_per_second = seq.ticks_per_quarter() as f64 * seq.qpm() / 60.0;
    let to_tick = |seconds: f64| -> Result<u64> {
        let tick = (seconds * ticks_per_second).round();
        if !(0.0..=MAX_TICK as f64).contains(&tick) {
            return Err(Error::InvalidMetadata(format!(
                "{seconds}s is past the last writable tick at {ticks_per_second} ticks per second"
            )));
        }
        Ok(tick as u64)
    };

    // (tick, is_note_on, pitch, velocity); offs sort before ons at the same tick
    let mut messages: Vec<(u64, bool, u8, u8)> = Vec::with_capacity(seq.len() * 2);
    for note in seq.notes() {
        let start = to_tick(note.start_time())?;
        let end = to_tick(note.end_time())?.max(start + 1);
        messages.push((start, true, note.pitch(), note.velocity()));
        messages.push((end, false, note.pitch(), 0));
    }
    messages.sort_by_key(|&(tick, is_on, pitch, _)| (tick, is_on, pitch));

    let channel = u4::new(0);
    let mut track: Track<'static> = Vec::with_capacity(messages.len() + 2);
    let tempo = qpm_to_us_per_quarter(seq.qpm()).clamp(1, MAX_TEMPO);
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo))),
    });

    let mut last_tick = 0u64;
    for (tick, is_on, pitch, velocity) in messages {
        let delta = tick - last_tick;
        if delta > MAX_DELTA as u64 {
            return Err(Error::InvalidMetadata(format!(
                "gap of {delta} ticks does not fit a MIDI delta time"
            )));
        }
        let key = u7::new(pitch.min(MAX_PITCH));
        let message = if is_on {
            MidiMessage::NoteOn {
                key,
                vel: u7::new(velocity.min(MAX_PITCH)),
            }
        } else {
            MidiMessage::NoteOff { key, vel: u7::new(0) }
        };
        track.push(TrackEvent {
            delta: u28::new(delta as u32),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = tick;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(ticks_per_quarter)),
    ));
    smf.tracks.push(track);
    Ok(smf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::build;
    use approx::assert_relative_eq;

    #[test]
    fn test_encode_has_one_track() {
        let seq = build(&[(60, 0.0, 1.0), (62, 1.0, 2.0)]).unwrap();
        let smf = sequence_to_smf(&seq).unwrap();
        assert_eq!(smf.tracks.len(), 1);
        // tempo + 2 on + 2 off + end of track
        assert_eq!(smf.tracks[0].len(), 6);
    }

    #[test]
    fn test_note_off_precedes_note_on_at_same_tick() {
        let seq = build(&[(62, 1.0, 2.0), (60, 0.0, 1.0)]).unwrap();
        let smf = sequence_to_smf(&seq).unwrap();
        let kinds: Vec<_> = smf.tracks[0]
            .iter()
            .filter_map(|e| match e.kind {
                TrackEventKind::Midi { message, .. } => Some(message),
                _ => None,
            })
            .collect();
        assert!(matches!(kinds[0], MidiMessage::NoteOn { .. }));
        assert!(matches!(kinds[1], MidiMessage::NoteOff { .. }));
        assert!(matches!(kinds[2], MidiMessage::NoteOn { .. }));
    }

    #[test]
    fn test_encode_rejects_unreachable_times() {
        let seq = build(&[(60, 1e17, 2e17)]).unwrap();
        assert!(matches!(encode_midi(&seq), Err(Error::InvalidMetadata(_))));

        // Past the last tick even though the start is fine
        let seq = build(&[(60, 0.0, 1e9)]).unwrap();
        assert!(matches!(encode_midi(&seq), Err(Error::InvalidMetadata(_))));
    }

    #[test]
    fn test_parse_round_trip() {
        let seq = build(&[(60, 0.0, 0.5), (64, 0.5, 1.0), (67, 1.0, 2.0)]).unwrap();
        let bytes = encode_midi(&seq).unwrap();
        let parsed = parse_midi(&bytes).unwrap();

        assert_eq!(parsed.pitches(), vec![60, 64, 67]);
        assert_eq!(parsed.ticks_per_quarter(), 220);
        assert_relative_eq!(parsed.qpm(), 120.0);
        for (a, b) in parsed.sorted_notes().iter().zip(seq.sorted_notes().iter()) {
            assert_relative_eq!(a.start_time(), b.start_time(), epsilon = 1e-3);
            assert_relative_eq!(a.end_time(), b.end_time(), epsilon = 1e-3);
        }
    }

    #[test]
    fn test_parse_header_only_fails_empty() {
        let data = [
            // MThd
            0x4D, 0x54, 0x68, 0x64, // Header length (6)
            0x00, 0x00, 0x00, 0x06, // Format 0
            0x00, 0x00, // 1 track
            0x00, 0x01, // 480 ticks per quarter
            0x01, 0xE0, // MTrk
            0x4D, 0x54, 0x72, 0x6B, // Track length (4)
            0x00, 0x00, 0x00, 0x04, // End of track
            0x00, 0xFF, 0x2F, 0x00,
        ];

        assert!(matches!(parse_midi(&data), Err(Error::InvalidEvent { .. })));
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(matches!(
            parse_midi(b"not a midi file"),
            Err(Error::MidiFileParse(_))
        ));
    }

    #[test]
    fn test_velocity_zero_note_on_releases() {
        let track: Track = vec![
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Midi {
                    channel: u4::new(0),
                    message: MidiMessage::NoteOn {
                        key: u7::new(60),
                        vel: u7::new(90),
                    },
                },
            },
            TrackEvent {
                delta: u28::new(480),
                kind: TrackEventKind::Midi {
                    channel: u4::new(0),
                    message: MidiMessage::NoteOn {
                        key: u7::new(60),
                        vel: u7::new(0),
                    },
                },
            },
        ];
        assert_eq!(parse_track(&track), vec![(0, 480, 60, 90)]);
    }
}
