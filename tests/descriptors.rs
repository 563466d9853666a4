//! Kept in its own test binary: counting `/proc/self/fd` is only meaningful when
//! no other test opens files concurrently. The tests here take `FD_LOCK` for the
//! same reason.

use pipesh::env::{Environment, SearchPath};
use pipesh::lexer::split_into_words;
use pipesh::{ExecutionOutcome, build, execute};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

static FD_LOCK: Mutex<()> = Mutex::new(());

fn lock_descriptors() -> MutexGuard<'static, ()> {
    FD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn open_descriptors() -> usize {
    fs::read_dir("/proc/self/fd").unwrap().count()
}

fn has_proc_fd() -> bool {
    PathBuf::from("/proc/self/fd").is_dir()
}

fn search_path() -> SearchPath {
    SearchPath::new(vec![PathBuf::from("/bin"), PathBuf::from("/usr/bin")])
}

fn test_env() -> Environment {
    Environment {
        vars: Environment::new().vars,
        current_dir: std::env::temp_dir(),
    }
}

#[test]
fn pipelines_release_every_descriptor() {
    if !has_proc_fd() {
        return;
    }
    let _lock = lock_descriptors();
    let env = test_env();
    let target = std::env::temp_dir().join(format!("descriptors_it_{}", std::process::id()));
    let copy = std::env::temp_dir().join(format!("descriptors_it_copy_{}", std::process::id()));

    let lines = [
        "true".to_string(),
        "echo a | cat | cat | wc -l".to_string(),
        format!("echo a | cat > {}", target.display()),
        format!("< {} cat | cat > > {}", target.display(), copy.display()),
    ];

    let before = open_descriptors();
    for line in &lines {
        let pipeline = build(&split_into_words(line), &search_path()).unwrap();
        let outcome = execute(&pipeline, &env);
        assert_eq!(outcome.exit_code(), Some(0), "{line}");
        assert_eq!(open_descriptors(), before, "after {line}");
    }

    let _ = fs::remove_file(target);
    let _ = fs::remove_file(copy);
}

#[test]
fn failed_spawn_mid_pipeline_stops_an_endless_upstream() {
    if !has_proc_fd() {
        return;
    }
    let _lock = lock_descriptors();
    let bad = std::env::temp_dir().join(format!("descriptors_bad_exec_{}", std::process::id()));
    fs::write(&bad, b"\x7fELF this is not a program").unwrap();
    fs::set_permissions(&bad, fs::Permissions::from_mode(0o755)).unwrap();

    let line = format!("yes | {} | cat", bad.display());
    let pipeline = build(&split_into_words(&line), &search_path()).unwrap();

    let before = open_descriptors();
    let outcome = execute(&pipeline, &test_env());
    assert_eq!(open_descriptors(), before);

    match &outcome {
        ExecutionOutcome::SpawnFailed { stage, program, .. } => {
            assert_eq!(*stage, 1);
            assert_eq!(program, &bad);
        }
        other => panic!("expected SpawnFailed, got {other:?}"),
    }
    assert_eq!(outcome.exit_code(), None);

    let mut out = Vec::new();
    let mut err = Vec::new();
    outcome.report(&mut out, &mut err).unwrap();
    assert!(out.is_empty());
    assert_eq!(
        String::from_utf8(err).unwrap(),
        format!("{}: Exec format error\n", bad.display())
    );

    let _ = fs::remove_file(bad);
}
