//! Shared helpers for jobdag's integration tests.
//!
//! - [`builders`]: declare files, tasks and jobs in a line each and get a
//!   validated `JobGraph` or `Scheduler` back.
//! - [`fake_executor`]: `FakeExecutor` records start/finish order and returns
//!   scripted exit codes; `FakeBackend` drives a `Runtime` without spawning
//!   any worker tasks.
//! - [`fake_transfer`]: `FakeTransfer` counts transfers per file and fails on
//!   request, for exercising the staging coordinator.

pub mod builders;
pub mod fake_executor;
pub mod fake_transfer;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use jobdag::logging::LOG_ENV_VAR;
use tracing_subscriber::{EnvFilter, fmt};

/// Upper bound for any single async test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

static INIT: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Reads the same `JOBDAG_LOG` variable as the binary, e.g.
/// `JOBDAG_LOG=jobdag=debug`. Output only shows for failing tests.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, panicking if a run hangs past [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(value) => value,
        Err(_) => panic!("run did not finish within {TEST_TIMEOUT:?}"),
    }
}
