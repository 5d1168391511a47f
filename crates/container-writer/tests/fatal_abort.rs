//! The default failure policy terminates the process.
//!
//! The test re-runs its own binary with `CONTAINER_WRITER_ABORT_ROOT` set.
//! In that child the writer hits a missing directory and exits; the parent
//! checks the exit status and the logged path.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use container_writer::{Container, ContainerWriter, FATAL_EXIT_CODE, TransferQueue, WriterConfig};
use std::path::Path;
use std::process::Command;

const ROOT_VAR: &str = "CONTAINER_WRITER_ABORT_ROOT";
const TEST_NAME: &str = "test_abort_exits_with_fatal_code";

fn run_aborting_writer(root: &Path) -> ! {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = WriterConfig::new(root, ".container");
    let queue = TransferQueue::new(4);
    queue
        .push(Container::new("AAAA", &b"hello"[..], 64).unwrap())
        .unwrap();
    queue.set_done();

    let mut writer = ContainerWriter::new(config).unwrap();
    let result = writer.run(&queue);
    panic!("writer returned instead of exiting: {result:?}");
}

#[test]
fn test_abort_exits_with_fatal_code() {
    if let Some(root) = std::env::var_os(ROOT_VAR) {
        run_aborting_writer(Path::new(&root));
    }

    let dir = tempfile::tempdir().unwrap();
    let mut root = dir.path().join("missing").into_os_string();
    root.push("/");

    let output = Command::new(std::env::current_exe().unwrap())
        .args(["--exact", TEST_NAME, "--nocapture", "--test-threads=1"])
        .env(ROOT_VAR, &root)
        .output()
        .unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(FATAL_EXIT_CODE), "stderr: {stderr}");

    let failed = dir.path().join("missing").join("AAAA.container");
    assert!(
        stderr.contains(&failed.display().to_string()),
        "path missing from stderr: {stderr}"
    );
    assert!(!failed.exists());
}
