//! End-to-end pipeline runs.

use crate::helpers::{counting_pipeline, test_pipeline, SCALE, TEST_STEPS_PER_QUARTER};
use vario::neural::check_latent_dim;
use vario::prelude::*;
use vario::{quantize, Error};

#[test]
fn test_zero_sigma_returns_reconstruction() {
    let pipeline = test_pipeline();
    let out = pipeline
        .run(&SCALE, TEST_STEPS_PER_QUARTER, &MutationRequest::seeded(0.0, 1))
        .unwrap();

    // Unperturbed decode of the encoded phrase
    let gateway = pipeline.gateway();
    let seq = SequenceBuilder::new().events(&SCALE).build().unwrap();
    let latent = gateway
        .encode_one(&quantize(&seq, TEST_STEPS_PER_QUARTER).unwrap())
        .unwrap();
    let expected = gateway.decode_one(&latent).unwrap();

    assert_eq!(out, expected);
    assert_eq!(out.pitches(), vec![60, 62, 64, 65]);
}

#[test]
fn test_seeded_runs_are_identical() {
    let pipeline = test_pipeline();
    let request = MutationRequest::seeded(0.8, 1234);
    let a = pipeline.run(&SCALE, TEST_STEPS_PER_QUARTER, &request).unwrap();
    let b = pipeline.run(&SCALE, TEST_STEPS_PER_QUARTER, &request).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_each_run_encodes_and_decodes_once() {
    let (pipeline, gateway) = counting_pipeline();
    pipeline
        .run(&SCALE, TEST_STEPS_PER_QUARTER, &MutationRequest::seeded(0.5, 3))
        .unwrap();
    assert_eq!(gateway.encode_calls(), 1);
    assert_eq!(gateway.decode_calls(), 1);
}

#[test]
fn test_degenerate_note_never_reaches_model() {
    let (pipeline, gateway) = counting_pipeline();
    // 30ms at 8 steps per second rounds to a zero-length note
    let events = [(60, 0.0, 1.0), (64, 1.0, 1.03)];
    let result = pipeline.run(&events, TEST_STEPS_PER_QUARTER, &MutationRequest::seeded(0.5, 1));

    assert!(matches!(
        result,
        Err(Error::Midi(vario::midi::Error::DegenerateNote { index: 1, .. }))
    ));
    assert_eq!(gateway.encode_calls(), 0);
    assert_eq!(gateway.decode_calls(), 0);
}

#[test]
fn test_single_degenerate_note_never_reaches_model() {
    let (pipeline, gateway) = counting_pipeline();
    let result = pipeline.run(
        &[(60, 0.01, 0.05)],
        TEST_STEPS_PER_QUARTER,
        &MutationRequest::seeded(0.5, 1),
    );

    assert!(matches!(
        result,
        Err(Error::Midi(vario::midi::Error::DegenerateNote { index: 0, pitch: 60, step: 0 }))
    ));
    assert_eq!(gateway.encode_calls(), 0);
    assert_eq!(gateway.decode_calls(), 0);
}

#[test]
fn test_bad_sigma_never_reaches_model() {
    let (pipeline, gateway) = counting_pipeline();
    let result = pipeline.run(&SCALE, TEST_STEPS_PER_QUARTER, &MutationRequest::new(-1.0));

    match result {
        Err(e) => {
            assert!(matches!(e, Error::Neural(vario::neural::Error::InvalidSigma(_))));
            assert!(e.is_input_error());
        }
        Ok(_) => panic!("negative sigma accepted"),
    }
    assert_eq!(gateway.encode_calls(), 0);
}

#[test]
fn test_invalid_events_are_input_errors() {
    let pipeline = test_pipeline();
    let request = MutationRequest::default();

    for events in [vec![], vec![(60, 1.0, 0.5)], vec![(60, -1.0, 0.5)]] {
        let err = pipeline
            .run(&events, TEST_STEPS_PER_QUARTER, &request)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Midi(vario::midi::Error::InvalidEvent { index: 0, .. })
        ));
        assert!(err.is_input_error());
    }

    let err = pipeline.run(&SCALE, 0, &request).unwrap_err();
    assert!(matches!(
        err,
        Error::Midi(vario::midi::Error::InvalidResolution(0))
    ));
}

#[test]
fn test_gateway_preserves_batch_order() {
    let pipeline = test_pipeline();
    let gateway = pipeline.gateway();
    let phrases: Vec<QuantizedSequence> = (0..5u8)
        .map(|i| {
            let seq = SequenceBuilder::new()
                .note(60 + i, 0.0, 0.5)
                .note(72 - i, 0.5, 1.0)
                .build()
                .unwrap();
            quantize(&seq, TEST_STEPS_PER_QUARTER).unwrap()
        })
        .collect();

    let latents = gateway.encode(&phrases).unwrap();
    assert_eq!(latents.len(), phrases.len());
    for latent in &latents {
        check_latent_dim(latent, gateway.latent_dim()).unwrap();
    }

    let decoded = gateway.decode(&latents).unwrap();
    for (i, seq) in decoded.iter().enumerate() {
        let i = i as u8;
        assert_eq!(seq.pitches(), vec![60 + i, 72 - i]);
    }
}

#[test]
fn test_variations_ranked_by_distance() {
    let pipeline = test_pipeline();
    let variations = pipeline
        .variations(
            &SCALE,
            TEST_STEPS_PER_QUARTER,
            &MutationRequest::seeded(0.5, 21),
            8,
            3,
        )
        .unwrap();

    assert_eq!(variations.len(), 3);
    assert!(variations
        .windows(2)
        .all(|w| w[0].latent_distance <= w[1].latent_distance));
    assert!(variations.iter().all(|v| !v.sequence.is_empty()));
}

#[test]
fn test_keep_clamped_to_candidates() {
    let variations = test_pipeline()
        .variations(
            &SCALE,
            TEST_STEPS_PER_QUARTER,
            &MutationRequest::seeded(0.2, 2),
            2,
            10,
        )
        .unwrap();
    assert_eq!(variations.len(), 2);
}
