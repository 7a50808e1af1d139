//! One pipeline shared across threads.

use crate::helpers::{counting_pipeline, test_pipeline, SCALE, TEST_STEPS_PER_QUARTER};
use std::thread;
use vario::prelude::*;

#[test]
fn test_pipeline_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MutationPipeline>();
}

#[test]
fn test_concurrent_seeded_runs_match_serial() {
    let pipeline = test_pipeline();
    let serial: Vec<NoteSequence> = (0..4u64)
        .map(|seed| {
            pipeline
                .run(&SCALE, TEST_STEPS_PER_QUARTER, &MutationRequest::seeded(0.7, seed))
                .unwrap()
        })
        .collect();

    let handles: Vec<_> = (0..4u64)
        .map(|seed| {
            let pipeline = pipeline.clone();
            thread::spawn(move || {
                pipeline
                    .run(&SCALE, TEST_STEPS_PER_QUARTER, &MutationRequest::seeded(0.7, seed))
                    .unwrap()
            })
        })
        .collect();
    let parallel: Vec<NoteSequence> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(parallel, serial);
}

#[test]
fn test_clones_share_one_gateway() {
    let (pipeline, gateway) = counting_pipeline();
    thread::scope(|s| {
        for seed in 0..3u64 {
            let pipeline = pipeline.clone();
            s.spawn(move || {
                pipeline
                    .run(&SCALE, TEST_STEPS_PER_QUARTER, &MutationRequest::seeded(0.3, seed))
                    .unwrap();
            });
        }
    });
    assert_eq!(gateway.encode_calls(), 3);
    assert_eq!(gateway.decode_calls(), 3);
}
