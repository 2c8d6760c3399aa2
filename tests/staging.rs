// tests/staging.rs

mod common;
use crate::common::fake_transfer::FakeTransfer;
use crate::common::init_tracing;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use jobdag::errors::StagingError;
use jobdag::fs::mock::MockFileSystem;
use jobdag::fs::{FileSystem, RealFileSystem};
use jobdag::registry::FileSpec;
use jobdag::staging::{LocalTransfer, StagedFile, StagingCoordinator, Transfer};

#[test]
fn ensure_staged_twice_transfers_once() {
    init_tracing();

    let coordinator = StagingCoordinator::new(FakeTransfer::new());
    let file = FileSpec::new("bc_exp1.txt");

    coordinator.ensure_staged(&file).expect("first call stages");
    coordinator.ensure_staged(&file).expect("second call is a no-op");

    assert_eq!(coordinator.transfer().transfers("bc_exp1.txt"), 1);
    assert!(coordinator.is_staged("bc_exp1.txt"));
    assert!(!coordinator.is_staged("other.txt"));
}

#[test]
fn concurrent_callers_share_a_single_transfer() {
    init_tracing();

    let coordinator = Arc::new(StagingCoordinator::new(FakeTransfer::with_delay(
        Duration::from_millis(20),
    )));
    let file = FileSpec::new("shared.bin").executable(true);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let coordinator = Arc::clone(&coordinator);
            let file = file.clone();
            std::thread::spawn(move || coordinator.ensure_staged(&file))
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread panicked").expect("staging succeeds");
    }

    assert_eq!(coordinator.transfer().transfers("shared.bin"), 1);
    assert_eq!(coordinator.transfer().permission_changes("shared.bin"), 1);
}

#[test]
fn executable_files_get_their_permission_set() {
    init_tracing();

    let coordinator = StagingCoordinator::new(FakeTransfer::new());
    coordinator
        .ensure_all_staged(&[
            FileSpec::new("run.sh").executable(true),
            FileSpec::new("data.txt"),
        ])
        .unwrap();

    assert_eq!(coordinator.transfer().permission_changes("run.sh"), 1);
    assert_eq!(coordinator.transfer().permission_changes("data.txt"), 0);

    let staged = coordinator.staged_files();
    assert_eq!(staged.get("run.sh"), Some(&StagedFile { executable: true }));
    assert_eq!(staged.get("data.txt"), Some(&StagedFile { executable: false }));
}

#[test]
fn permission_failure_is_reported_and_retried_later() {
    init_tracing();

    let coordinator = StagingCoordinator::new(FakeTransfer::new());
    coordinator.transfer().fail_permission("run.sh");
    let file = FileSpec::new("run.sh").executable(true);

    match coordinator.ensure_staged(&file) {
        Err(StagingError::Permission(e)) => assert_eq!(e.file, "run.sh"),
        other => panic!("expected permission error, got {other:?}"),
    }
    assert!(!coordinator.is_staged("run.sh"));

    coordinator.transfer().heal();
    coordinator.ensure_staged(&file).expect("retry succeeds");
    assert!(coordinator.is_staged("run.sh"));
    assert_eq!(coordinator.transfer().transfers("run.sh"), 2);
}

#[test]
fn ensure_all_staged_stops_at_first_failure() {
    init_tracing();

    let coordinator = StagingCoordinator::new(FakeTransfer::new());
    coordinator.transfer().fail_transfer("b");

    let err = coordinator
        .ensure_all_staged(&[FileSpec::new("a"), FileSpec::new("b"), FileSpec::new("c")])
        .unwrap_err();

    assert!(matches!(err, StagingError::Transfer(_)));
    assert_eq!(err.file(), "b");
    assert!(coordinator.is_staged("a"));
    assert!(!coordinator.is_staged("b"));
    assert_eq!(coordinator.transfer().transfers("c"), 0);
}

#[test]
fn local_transfer_copies_into_agent_dir_and_sets_mode() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("/work/local/scripts/run.sh", b"#!/bin/sh\necho hi\n".to_vec());

    let transfer = LocalTransfer::new(fs.clone(), "/work/local", "/work/agent");
    let file = FileSpec::new("run.sh")
        .local_path("scripts/run.sh")
        .agent_path("bin/run.sh")
        .executable(true);

    let coordinator = StagingCoordinator::new(transfer);
    coordinator.ensure_staged(&file).unwrap();

    let dest = Path::new("/work/agent/bin/run.sh");
    assert_eq!(fs.read(dest).unwrap(), b"#!/bin/sh\necho hi\n".to_vec());
    assert!(fs.is_executable(dest));
}

#[test]
fn local_transfer_skips_identical_destination() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("/work/local/a.txt", b"1+2\n".to_vec());
    fs.add_file("/work/agent/a.txt", b"1+2\n".to_vec());

    let transfer = LocalTransfer::new(fs.clone(), "/work/local", "/work/agent");
    transfer.stage(&FileSpec::new("a.txt")).unwrap();
    assert_eq!(fs.write_count(), 0);

    fs.add_file("/work/local/a.txt", b"2+2\n".to_vec());
    transfer.stage(&FileSpec::new("a.txt")).unwrap();
    assert_eq!(fs.write_count(), 1);
    assert_eq!(fs.read(Path::new("/work/agent/a.txt")).unwrap(), b"2+2\n".to_vec());
}

#[test]
fn local_transfer_reports_missing_source() {
    init_tracing();

    let fs = MockFileSystem::new();
    let transfer = LocalTransfer::new(fs, "/work/local", "/work/agent");

    let err = transfer.stage(&FileSpec::new("gone.txt")).unwrap_err();
    assert_eq!(err.file, "gone.txt");
    assert!(err.reason.contains("gone.txt"), "{}", err.reason);
}

#[test]
fn local_transfer_maps_denied_chmod_to_permission_error() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("/work/local/tool", b"bin".to_vec());
    fs.deny_permission_changes("/work/agent/tool");

    let coordinator =
        StagingCoordinator::new(LocalTransfer::new(fs, "/work/local", "/work/agent"));
    let err = coordinator
        .ensure_staged(&FileSpec::new("tool").executable(true))
        .unwrap_err();

    assert!(matches!(err, StagingError::Permission(_)));
    assert_eq!(err.file(), "tool");
}

#[test]
fn local_transfer_on_real_filesystem() {
    init_tracing();

    let tmp = tempfile::tempdir().unwrap();
    let local = tmp.path().join("local");
    let agent = tmp.path().join("agent");
    std::fs::create_dir_all(&local).unwrap();
    std::fs::write(local.join("bc_exp1.txt"), "1+2\nquit\n").unwrap();

    let coordinator = StagingCoordinator::new(LocalTransfer::new(RealFileSystem, &local, &agent));
    coordinator
        .ensure_staged(&FileSpec::new("bc_exp1.txt").executable(true))
        .unwrap();

    let staged = agent.join("bc_exp1.txt");
    assert_eq!(std::fs::read_to_string(&staged).unwrap(), "1+2\nquit\n");
    #[cfg(unix)]
    assert!(RealFileSystem.is_executable(&staged));
}

#[test]
fn agent_root_is_created_before_anything_is_staged() {
    init_tracing();

    let fs = MockFileSystem::new();
    let transfer = LocalTransfer::new(fs.clone(), "/work/local", "/work/agent/run1");
    assert!(!fs.is_dir(Path::new("/work/agent/run1")));

    transfer.prepare_agent_root().unwrap();
    transfer.prepare_agent_root().unwrap();

    assert!(fs.is_dir(Path::new("/work/agent/run1")));
    let listing = fs.read_dir(Path::new("/work/agent")).unwrap();
    assert_eq!(listing, vec![Path::new("/work/agent/run1").to_path_buf()]);
    assert_eq!(fs.write_count(), 0);
}

#[test]
fn agent_root_cannot_be_an_existing_file() {
    let fs = MockFileSystem::new();
    fs.add_file("/work/agent", b"not a dir".to_vec());

    let transfer = LocalTransfer::new(fs, "/work/local", "/work/agent");
    let err = transfer.prepare_agent_root().unwrap_err();
    assert!(format!("{err:#}").contains("/work/agent"));
}
