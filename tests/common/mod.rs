#![allow(dead_code)]

use std::path::PathBuf;

pub use jobdag_test_utils::{builders, fake_executor, fake_transfer, init_tracing, with_timeout};

/// Path of a config shipped under `demos/`.
pub fn demo_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}
