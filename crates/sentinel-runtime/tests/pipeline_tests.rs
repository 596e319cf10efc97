//! End-to-end pipeline tests
//!
//! These run real worker threads against the harness doubles: the reference
//! fixture, several transmitters, both duplicate policies, failing
//! capabilities and concurrent pipelines in one process.

use sentinel_core::{DuplicatePolicy, Fragment, GroupId, PipelineConfig};
use sentinel_harness::fixtures::{self, EXPECTED_INCOMPLETE, EXPECTED_SENT, MIN_FRAGMENTS};
use sentinel_harness::{
    spawn_feeder, threshold_solver, FailingReceiver, FailingTransmitter, Jitter,
    RecordingTransmitter, ScriptedReceiver, SlowSolver, TransmitterLog,
};
use sentinel_runtime::{PipelineBuilder, PipelineState, SentinelPipeline};
use std::time::Duration;

// ----------------------------------------------------------------------------
// Test Utilities
// ----------------------------------------------------------------------------

fn jitter() -> Jitter {
    Jitter::up_to(Duration::from_micros(300))
}

/// Receiver carries the receiver fragments; two feeder threads and the
/// calling thread submit the rest while the pipeline runs.
fn run_reference<S>(pipeline: &SentinelPipeline<S>)
where
    S: sentinel_core::Solver + 'static,
{
    let mut feeders = fixtures::feeder_fragments();
    let own = feeders.pop().unwrap_or_default();

    let handles: Vec<_> = feeders
        .into_iter()
        .map(|fragments| {
            let ingress = pipeline.ingress();
            spawn_feeder(
                move |fragment| {
                    ingress.submit(fragment);
                },
                fragments,
                jitter(),
            )
        })
        .collect();

    let ingress = pipeline.ingress();
    sentinel_harness::feed_fragments(
        |fragment| {
            ingress.submit(fragment);
        },
        &own,
        jitter(),
    );

    for handle in handles {
        handle.join().expect("feeder thread panicked");
    }
}

fn reference_pipeline(
    policy: DuplicatePolicy,
) -> (SentinelPipeline<sentinel_harness::ThresholdSolver>, TransmitterLog<u128>) {
    let transmitter = RecordingTransmitter::new();
    let log = transmitter.log();

    let pipeline = PipelineBuilder::new(threshold_solver(MIN_FRAGMENTS))
        .with_config(PipelineConfig::testing())
        .duplicate_policy(policy)
        .receiver(ScriptedReceiver::new(fixtures::receiver_fragments()).with_jitter(jitter()))
        .transmitter(transmitter)
        .build()
        .unwrap();

    (pipeline, log)
}

// ----------------------------------------------------------------------------
// Reference Scenario
// ----------------------------------------------------------------------------

#[test]
fn test_reference_scenario() {
    let (mut pipeline, log) = reference_pipeline(DuplicatePolicy::KeepFirst);
    pipeline.start(3).unwrap();
    run_reference(&pipeline);

    let report = pipeline.stop().unwrap();

    assert_eq!(log.total_sent(), EXPECTED_SENT);
    assert_eq!(log.total_incomplete(), EXPECTED_INCOMPLETE);
    assert_eq!(log.incomplete(), fixtures::incomplete_groups());

    assert_eq!(report.groups_seen, 6);
    assert_eq!(report.groups_delivered, EXPECTED_SENT);
    assert_eq!(report.groups_incomplete(), EXPECTED_INCOMPLETE);
    assert_eq!(report.receivers, 1);
    assert_eq!(report.compute_workers, 3);
    assert_eq!(report.transmitters, 1);
    assert_eq!(
        report.stats.fragments_accepted,
        fixtures::all_fragments().len() as u64
    );
    assert_eq!(report.stats.late_fragments, 0);
}

#[test]
fn test_reference_scenario_is_repeatable() {
    for _ in 0..10 {
        let (mut pipeline, log) = reference_pipeline(DuplicatePolicy::KeepFirst);
        pipeline.start(3).unwrap();
        run_reference(&pipeline);
        pipeline.stop().unwrap();

        assert_eq!(log.total_sent(), EXPECTED_SENT);
        assert_eq!(log.total_incomplete(), EXPECTED_INCOMPLETE);
    }
}

#[test]
fn test_keep_first_sends_each_group_once() {
    let (mut pipeline, log) = reference_pipeline(DuplicatePolicy::KeepFirst);
    pipeline.start(4).unwrap();
    run_reference(&pipeline);
    pipeline.stop().unwrap();

    let mut groups = log.sent_groups();
    groups.sort();
    groups.dedup();
    assert_eq!(groups.len(), log.total_sent());
}

#[test]
fn test_send_all_delivers_every_resolution() {
    let (mut pipeline, log) = reference_pipeline(DuplicatePolicy::SendAll);
    pipeline.start(3).unwrap();
    run_reference(&pipeline);
    let report = pipeline.stop().unwrap();

    // 0x11 resolves at 3, 4 and 5 fragments, 0x39 at 3 and 4
    assert_eq!(log.total_sent(), 7);
    assert_eq!(report.stats.results_delivered, 7);
    assert_eq!(report.stats.duplicates_dropped, 0);
    assert_eq!(report.groups_delivered, EXPECTED_SENT);
    assert_eq!(log.incomplete(), fixtures::incomplete_groups());
}

// ----------------------------------------------------------------------------
// Transmitters
// ----------------------------------------------------------------------------

#[test]
fn test_every_transmitter_reports_incomplete_groups() {
    let logs: Vec<TransmitterLog<u128>> = (0..3).map(|_| TransmitterLog::new()).collect();

    let mut builder = PipelineBuilder::new(threshold_solver(MIN_FRAGMENTS))
        .with_config(PipelineConfig::testing())
        .receiver(ScriptedReceiver::new(fixtures::all_fragments()));
    for (index, log) in logs.iter().enumerate() {
        builder = builder
            .transmitter(RecordingTransmitter::with_log(log.clone()).named(format!("tx-{index}")));
    }

    let mut pipeline = builder.start().unwrap();
    pipeline.stop().unwrap();

    let total_sent: usize = logs.iter().map(TransmitterLog::total_sent).sum();
    assert_eq!(total_sent, EXPECTED_SENT);
    for log in &logs {
        assert_eq!(log.incomplete(), fixtures::incomplete_groups());
    }
}

#[test]
fn test_failed_send_still_marks_group_delivered() {
    let transmitter = FailingTransmitter::<u128>::new();
    let log = transmitter.log();

    let mut pipeline = PipelineBuilder::new(threshold_solver(MIN_FRAGMENTS))
        .with_config(PipelineConfig::testing())
        .receiver(ScriptedReceiver::new(fixtures::all_fragments()))
        .transmitter(transmitter)
        .start()
        .unwrap();
    let report = pipeline.stop().unwrap();

    assert_eq!(log.total_sent(), EXPECTED_SENT);
    assert_eq!(report.stats.delivery_failures, EXPECTED_SENT as u64);
    assert_eq!(report.groups_delivered, EXPECTED_SENT);
    assert_eq!(log.incomplete(), fixtures::incomplete_groups());
}

#[test]
fn test_failing_incomplete_reports_do_not_stop_finalization() {
    let transmitter = FailingTransmitter::<u128>::new().failing_incomplete();
    let log = transmitter.log();

    let mut pipeline = PipelineBuilder::new(threshold_solver(MIN_FRAGMENTS))
        .with_config(PipelineConfig::testing())
        .receiver(ScriptedReceiver::new(fixtures::all_fragments()))
        .transmitter(transmitter)
        .start()
        .unwrap();
    let report = pipeline.stop().unwrap();

    assert_eq!(log.total_incomplete(), EXPECTED_INCOMPLETE);
    assert_eq!(report.stats.incomplete_reports, EXPECTED_INCOMPLETE as u64);
}

#[test]
fn test_no_transmitters_discards_results() {
    let mut pipeline = PipelineBuilder::new(threshold_solver(MIN_FRAGMENTS))
        .with_config(PipelineConfig::testing())
        .receiver(ScriptedReceiver::new(fixtures::all_fragments()))
        .start()
        .unwrap();
    let report = pipeline.stop().unwrap();

    assert_eq!(report.groups_seen, 6);
    assert_eq!(report.groups_delivered, 0);
    assert_eq!(report.stats.results_delivered, 0);
}

// ----------------------------------------------------------------------------
// Receivers
// ----------------------------------------------------------------------------

#[test]
fn test_failing_receiver_retires_alone() {
    let fixture = fixtures::all_fragments();
    let (head, tail) = fixture.split_at(7);

    let transmitter = RecordingTransmitter::<u128>::new();
    let log = transmitter.log();

    let mut pipeline = PipelineBuilder::new(threshold_solver(MIN_FRAGMENTS))
        .with_config(PipelineConfig::testing())
        .receiver(FailingReceiver::new(head.to_vec(), "link lost"))
        .receiver(ScriptedReceiver::new(tail.to_vec()))
        .transmitter(transmitter)
        .start()
        .unwrap();
    let report = pipeline.stop().unwrap();

    assert_eq!(report.stats.fragments_accepted, fixture.len() as u64);
    assert_eq!(log.total_sent(), EXPECTED_SENT);
    assert_eq!(log.total_incomplete(), EXPECTED_INCOMPLETE);
}

#[test]
fn test_receivers_only_scenario() {
    let transmitter = RecordingTransmitter::<u128>::new();
    let log = transmitter.log();

    let mut builder = PipelineBuilder::new(threshold_solver(MIN_FRAGMENTS))
        .with_config(PipelineConfig::testing())
        .transmitter(transmitter);
    for (index, fragments) in fixtures::feeder_fragments().into_iter().enumerate() {
        builder = builder.receiver(
            ScriptedReceiver::new(fragments)
                .named(format!("rx-{index}"))
                .with_jitter(jitter()),
        );
    }
    builder = builder.receiver(ScriptedReceiver::new(fixtures::receiver_fragments()));

    let mut pipeline = builder.start().unwrap();
    assert_eq!(pipeline.receiver_count(), 4);
    let report = pipeline.stop().unwrap();

    assert_eq!(report.receivers, 4);
    assert_eq!(log.total_sent(), EXPECTED_SENT);
    assert_eq!(log.total_incomplete(), EXPECTED_INCOMPLETE);
}

// ----------------------------------------------------------------------------
// Lifecycle
// ----------------------------------------------------------------------------

#[test]
fn test_slow_solver_results_survive_stop() {
    let transmitter = RecordingTransmitter::<u128>::new();
    let log = transmitter.log();

    let solver = SlowSolver::new(threshold_solver(MIN_FRAGMENTS), Duration::from_millis(2));
    let mut pipeline = PipelineBuilder::new(solver)
        .with_config(PipelineConfig::testing())
        .compute_workers(1)
        .receiver(ScriptedReceiver::new(fixtures::all_fragments()))
        .transmitter(transmitter)
        .start()
        .unwrap();

    assert_eq!(pipeline.state(), PipelineState::Running);
    pipeline.stop().unwrap();

    assert_eq!(log.total_sent(), EXPECTED_SENT);
    assert_eq!(log.total_incomplete(), EXPECTED_INCOMPLETE);
}

#[test]
fn test_dropping_running_pipeline_finalizes() {
    let transmitter = RecordingTransmitter::<u128>::new();
    let log = transmitter.log();

    {
        let pipeline = PipelineBuilder::new(threshold_solver(MIN_FRAGMENTS))
            .with_config(PipelineConfig::testing())
            .receiver(ScriptedReceiver::new(fixtures::all_fragments()))
            .transmitter(transmitter)
            .start()
            .unwrap();
        assert_eq!(pipeline.state(), PipelineState::Running);
    }

    assert_eq!(log.total_sent(), EXPECTED_SENT);
    assert_eq!(log.total_incomplete(), EXPECTED_INCOMPLETE);
}

#[test]
fn test_late_fragment_is_stored_but_not_scheduled() {
    let (mut pipeline, log) = reference_pipeline(DuplicatePolicy::KeepFirst);
    pipeline.start(2).unwrap();
    let ingress = pipeline.ingress();
    pipeline.stop().unwrap();

    assert!(!ingress.submit(Fragment::new(0x0400_0000_0001)));
    let late = GroupId::new(0x0400_0000_0001 >> 37);
    assert!(pipeline.groups().contains_key(&late));
    assert_eq!(pipeline.report().stats.late_fragments, 1);
    assert!(!log.incomplete().contains(&late));
}

#[test]
fn test_independent_pipelines_coexist() {
    let runs: Vec<_> = (0..3)
        .map(|_| {
            let (mut pipeline, log) = reference_pipeline(DuplicatePolicy::KeepFirst);
            pipeline.start(2).unwrap();
            (pipeline, log)
        })
        .collect();

    for (mut pipeline, log) in runs {
        pipeline.stop().unwrap();
        // The receiver's share alone never reaches the threshold
        assert_eq!(pipeline.groups().len(), 3);
        assert_eq!(log.total_sent(), 0);
        assert_eq!(log.total_incomplete(), 3);
    }
}
