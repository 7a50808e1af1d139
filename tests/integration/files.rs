//! MIDI files around the pipeline.

use crate::helpers::{test_pipeline, SCALE, TEST_STEPS_PER_QUARTER};
use approx::assert_relative_eq;
use vario::prelude::*;
use vario::{read_midi, write_midi};

#[test]
fn test_run_to_file_writes_result() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mutation.mid");

    let variant = test_pipeline()
        .run_to_file(
            &SCALE,
            TEST_STEPS_PER_QUARTER,
            &MutationRequest::seeded(0.5, 42),
            &path,
        )
        .unwrap();

    let loaded = read_midi(&path).unwrap();
    assert_eq!(loaded.pitches(), variant.pitches());
    for (a, b) in loaded.notes().iter().zip(variant.notes()) {
        assert_relative_eq!(a.start_time(), b.start_time(), epsilon = 1e-2);
        assert_relative_eq!(a.end_time(), b.end_time(), epsilon = 1e-2);
    }
}

#[test]
fn test_mutate_phrase_read_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("melody.mid");
    write_midi(&SequenceBuilder::new().events(&SCALE).build().unwrap(), &input).unwrap();

    let pipeline = test_pipeline();
    let phrase = read_midi(&input).unwrap();
    let from_file = pipeline
        .run_sequence(&phrase, TEST_STEPS_PER_QUARTER, &MutationRequest::seeded(0.0, 1))
        .unwrap();
    let from_events = pipeline
        .run(&SCALE, TEST_STEPS_PER_QUARTER, &MutationRequest::seeded(0.0, 1))
        .unwrap();

    assert_eq!(from_file, from_events);
}

#[test]
fn test_unwritable_output_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no/such/dir/out.mid");

    let err = test_pipeline()
        .run_to_file(
            &SCALE,
            TEST_STEPS_PER_QUARTER,
            &MutationRequest::seeded(0.5, 1),
            &path,
        )
        .unwrap_err();
    assert!(matches!(err, vario::Error::Midi(vario::midi::Error::Io(_))));
    assert!(!err.is_input_error());
}
