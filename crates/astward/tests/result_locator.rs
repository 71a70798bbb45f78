//! Scan result location and completion polling tests.

mod common;

use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use astward::{Baseline, CancellationToken, ErrorKind, ScanResultLocator, WaitPolicy};
use astward_protocol::ProtocolVersion;
use astward_test_utils::{FakeScanResult, FakeServer, FakeStage};

fn fast_wait() -> WaitPolicy {
    WaitPolicy {
        interval: Duration::from_millis(5),
        timeout: Duration::from_secs(5),
    }
}

fn done_baseline(id: astward::ScanResultId) -> Baseline {
    Baseline {
        complete: Some(id),
        latest: Some(id),
    }
}

/// Only `Done` counts as complete, and the newest one wins.
#[test]
fn test_latest_complete_selects_newest_done() -> Result<()> {
    for generation in common::GENERATIONS {
        let server = FakeServer::new(generation);
        let project = server.insert_project("p");
        let older = server.add_result(
            project,
            FakeScanResult::new(FakeStage::Done, server.next_timestamp()),
        );
        let newer = server.add_result(
            project,
            FakeScanResult::new(FakeStage::Done, server.next_timestamp()),
        );
        server.add_result(
            project,
            FakeScanResult::new(FakeStage::Failed, server.next_timestamp()),
        );
        // listed after the newest but created first
        server.add_result(
            project,
            FakeScanResult::new(FakeStage::Done, server.next_timestamp() - chrono::Duration::days(1)),
        );

        let client = common::client(&server);
        let locator = ScanResultLocator::new(&client);
        let selected = locator.latest_complete(&project)?;
        assert_eq!(selected, newer, "{}", generation);
        assert_ne!(selected, older);
    }
    Ok(())
}

/// Non-complete entries alone are an error that names the project.
#[test]
fn test_latest_complete_fails_without_done_entry() {
    for generation in common::GENERATIONS {
        let server = FakeServer::new(generation);
        let project = server.insert_project("p");
        for stage in [FakeStage::Enqueued, FakeStage::Scan, FakeStage::Failed, FakeStage::Aborted] {
            server.add_result(project, FakeScanResult::new(stage, server.next_timestamp()));
        }

        let client = common::client(&server);
        let err = ScanResultLocator::new(&client)
            .latest_complete(&project)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(err.message(), "Project finished scan results are not found");
        assert!(err.detailed_message().contains(&project.to_string()));
    }
}

/// An empty result list is the same error.
#[test]
fn test_latest_complete_fails_on_empty_list() {
    let server = FakeServer::new(ProtocolVersion::V41);
    let project = server.insert_project("p");
    let client = common::client(&server);
    let locator = ScanResultLocator::new(&client);
    assert!(locator.latest_complete(&project).is_err());
    assert_eq!(locator.find_latest_complete(&project).unwrap(), None);
}

/// `latest` ignores the stage.
#[test]
fn test_latest_is_stage_agnostic() -> Result<()> {
    for generation in common::GENERATIONS {
        let server = FakeServer::new(generation);
        let project = server.insert_project("p");
        let client = common::client(&server);
        let locator = ScanResultLocator::new(&client);
        assert_eq!(locator.latest(&project)?, None, "{}", generation);

        server.add_result(project, FakeScanResult::new(FakeStage::Done, server.next_timestamp()));
        let running = server.add_result(
            project,
            FakeScanResult::new(FakeStage::Scan, server.next_timestamp()),
        );
        assert_eq!(locator.latest(&project)?, Some(running), "{}", generation);
    }
    Ok(())
}

/// Waiting returns the first completed result other than the baseline.
#[test]
fn test_wait_for_complete_skips_baseline() -> Result<()> {
    for generation in common::GENERATIONS {
        let server = FakeServer::new(generation);
        let project = server.insert_project("p");
        let baseline = server.add_result(
            project,
            FakeScanResult::new(FakeStage::Done, server.next_timestamp()),
        );
        let fresh = server.add_result(project, FakeScanResult::running(server.next_timestamp(), 3));

        let client = common::client(&server);
        let locator = ScanResultLocator::new(&client);
        let found = locator.wait_for_complete(
            &project,
            &done_baseline(baseline),
            &fast_wait(),
            &CancellationToken::new(),
        )?;
        assert_eq!(found, fresh, "{}", generation);
        assert!(server.request_count("canResults") >= 4);
    }
    Ok(())
}

/// No fresh result before the deadline is a transport-kind timeout.
#[test]
fn test_wait_for_complete_times_out() {
    let server = FakeServer::new(ProtocolVersion::V40);
    let project = server.insert_project("p");
    let baseline = server.add_result(
        project,
        FakeScanResult::new(FakeStage::Done, server.next_timestamp()),
    );
    let client = common::client(&server);

    let policy = WaitPolicy {
        interval: Duration::from_millis(10),
        timeout: Duration::from_millis(60),
    };
    let started = Instant::now();
    let err = ScanResultLocator::new(&client)
        .wait_for_complete(&project, &done_baseline(baseline), &policy, &CancellationToken::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.message(), "Scan result wait timed out");
    assert!(started.elapsed() < Duration::from_secs(5));
}

/// Cancellation from another thread stops the wait promptly.
#[test]
fn test_wait_for_complete_observes_cancellation() {
    let server = FakeServer::new(ProtocolVersion::V36);
    let project = server.insert_project("p");
    let cancel = CancellationToken::new();
    let client = common::client_with(&server, common::token_connection(), cancel.clone());

    let signal = cancel.clone();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        signal.cancel();
    });

    let policy = WaitPolicy {
        interval: Duration::from_secs(30),
        timeout: Duration::from_secs(600),
    };
    let started = Instant::now();
    let err = ScanResultLocator::new(&client)
        .wait_for_complete(&project, &Baseline::default(), &policy, &cancel)
        .unwrap_err();
    canceller.join().unwrap();

    assert_eq!(err.kind(), ErrorKind::Interrupted);
    assert!(started.elapsed() < Duration::from_secs(5));
}

/// A cancelled token makes the client refuse further calls.
#[test]
fn test_cancelled_client_makes_no_remote_call() {
    let server = FakeServer::new(ProtocolVersion::V41);
    let project = server.insert_project("p");
    let cancel = CancellationToken::new();
    let client = common::client_with(&server, common::token_connection(), cancel.clone());
    let before = server.requests().len();

    cancel.cancel();
    let err = ScanResultLocator::new(&client).latest(&project).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Interrupted);
    assert_eq!(server.requests().len(), before);
}

/// A timeout too large for the clock means no deadline.
#[test]
fn test_unbounded_wait_finds_existing_result() -> Result<()> {
    for generation in common::GENERATIONS {
        let server = FakeServer::new(generation);
        let project = server.insert_project("p");
        let done = server.add_result(
            project,
            FakeScanResult::new(FakeStage::Done, server.next_timestamp()),
        );
        let client = common::client(&server);

        let policy = WaitPolicy {
            interval: Duration::from_millis(10),
            timeout: Duration::MAX,
        };
        let found = ScanResultLocator::new(&client).wait_for_complete(
            &project,
            &Baseline::default(),
            &policy,
            &CancellationToken::new(),
        )?;
        assert_eq!(found, done, "{}", generation);
    }
    Ok(())
}

/// A launched scan that ends `Failed` or `Aborted` stops the wait at once.
#[test]
fn test_wait_stops_on_unsuccessful_scan() -> Result<()> {
    for generation in common::GENERATIONS {
        for stage in [FakeStage::Failed, FakeStage::Aborted] {
            let server = FakeServer::new(generation);
            let project = server.insert_project("p");
            server.add_result(
                project,
                FakeScanResult::new(FakeStage::Done, server.next_timestamp()),
            );
            let client = common::client(&server);
            let locator = ScanResultLocator::new(&client);
            let baseline = locator.baseline(&project)?;

            let ended = server.add_result(project, FakeScanResult::new(stage, server.next_timestamp()));
            let policy = WaitPolicy {
                interval: Duration::from_millis(10),
                timeout: Duration::from_secs(30),
            };
            let started = Instant::now();
            let err = locator
                .wait_for_complete(&project, &baseline, &policy, &CancellationToken::new())
                .unwrap_err();

            assert_eq!(err.kind(), ErrorKind::Unknown, "{} {:?}", generation, stage);
            assert_eq!(err.message(), "Scan finished without a complete result");
            let detailed = err.detailed_message();
            assert!(detailed.contains(&ended.to_string()));
            assert!(detailed.contains(&format!("{:?}", stage)));
            assert!(started.elapsed() < Duration::from_secs(5));
        }
    }
    Ok(())
}

/// A failure from before the launch does not end the wait.
#[test]
fn test_wait_ignores_failure_in_baseline() -> Result<()> {
    let server = FakeServer::new(ProtocolVersion::V40);
    let project = server.insert_project("p");
    server.add_result(
        project,
        FakeScanResult::new(FakeStage::Done, server.next_timestamp()),
    );
    server.add_result(
        project,
        FakeScanResult::new(FakeStage::Failed, server.next_timestamp()),
    );
    let client = common::client(&server);
    let locator = ScanResultLocator::new(&client);
    let baseline = locator.baseline(&project)?;

    let fresh = server.add_result(project, FakeScanResult::running(server.next_timestamp(), 2));
    let found = locator.wait_for_complete(&project, &baseline, &fast_wait(), &CancellationToken::new())?;
    assert_eq!(found, fresh);
    Ok(())
}
