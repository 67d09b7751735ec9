#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::PathBuf;

use tempfile::TempDir;
use wbot::config::EngineConfig;
use wbot::engine::process::ProcessEngine;
use wbot::trust::OwnerPolicy;

/// A throwaway solver script plus a scratch directory used as its index.
pub struct FakeSolver {
    _tmp: TempDir,
    pub exec: PathBuf,
    pub index: PathBuf,
}

impl FakeSolver {
    /// Write `body` as a shell script. The solver runs with a cleared
    /// environment, so the script sets its own PATH.
    pub fn new(body: &str) -> Self {
        Self::with_mode(body, 0o755)
    }

    pub fn with_mode(body: &str, mode: u32) -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let exec = tmp.path().join("wordsmith");
        let index = tmp.path().join("index");
        fs::create_dir_all(&index).expect("create index dir");

        let script = format!("#!/bin/sh\nPATH=/usr/bin:/bin\nexport PATH\n{body}\n");
        fs::write(&exec, script).expect("write solver script");
        fs::set_permissions(&exec, fs::Permissions::from_mode(mode)).expect("chmod solver");

        Self {
            _tmp: tmp,
            exec,
            index,
        }
    }

    /// Trust exactly whoever owns the script.
    pub fn policy(&self) -> OwnerPolicy {
        let meta = fs::metadata(&self.exec).expect("stat solver");
        OwnerPolicy::new(meta.uid(), meta.gid())
    }

    pub fn config(&self, workers: usize, timeout_ms: u64) -> EngineConfig {
        EngineConfig {
            exec_path: self.exec.clone(),
            index_path: self.index.clone(),
            max_concurrent_calls: workers,
            solve_timeout_ms: timeout_ms,
            coach_timeout_ms: timeout_ms,
        }
    }

    pub fn engine(&self, workers: usize, timeout_ms: u64) -> ProcessEngine {
        ProcessEngine::with_policy(&self.config(workers, timeout_ms), &self.policy())
            .expect("start engine")
    }
}

/// Answers every subcommand with well-formed output.
pub const WELL_BEHAVED: &str = r#"
case "$1" in
solve)
    printf '[{"user":{"word":"%s","score":0.5},"best":[{"word":"slate","score":0.9},{"word":"trace","score":0.8}],"optionsLeft":["abide"],"eliminated":12,"colors":"bygyb"}]\n' "$3"
    ;;
coach)
    target="$3"
    shift 3
    opts=""
    for g in "$@"; do
        opts="$opts${opts:+,}\"$g\""
    done
    printf '{"user":{"word":"%s","score":1},"best":[],"optionsLeft":[%s],"eliminated":0,"colors":"ggggg"}\n' "$target" "$opts"
    ;;
list)
    printf '["%s","%s"]\n' "$2" "$WORDSMITH_INDEX"
    ;;
*)
    exit 64
    ;;
esac
"#;
