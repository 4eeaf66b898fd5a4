//! Shared fixtures: a scratch project with fake `cc` and `ar` scripts that
//! record every invocation, so tests can count what the driver spawned.

#![allow(dead_code)]

use craftc::build::CancelToken;
use craftc::config::{Archiver, BuildConfig};
use filetime::{FileTime, set_file_mtime};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

const FAKE_CC: &str = r#"echo "cc $*" >> '@LOG@'
out=
prev=
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  case "${arg##*/}" in
    fail*.c) echo "$arg: error: forced failure" >&2; exit 1 ;;
    slow*.c) sleep 5 ;;
    warn*.c) echo "$arg: warning: unused variable" >&2 ;;
  esac
  prev="$arg"
done
if [ -z "$out" ]; then echo "no output given" >&2; exit 2; fi
echo "built $*" > "$out"
"#;

const FAKE_AR: &str = r#"echo "ar $*" >> '@LOG@'
shift
lib="$1"
shift
echo "archive of $*" > "$lib"
"#;

pub struct Project {
    pub dir: TempDir,
    log: PathBuf,
    cc_script: PathBuf,
    ar_script: PathBuf,
}

impl Project {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let log = dir.path().join("tools.log");
        let cc_script = dir.path().join("fakecc.sh");
        let ar_script = dir.path().join("fakear.sh");
        let log_str = log.to_string_lossy();
        fs::write(&cc_script, FAKE_CC.replace("@LOG@", &log_str)).unwrap();
        fs::write(&ar_script, FAKE_AR.replace("@LOG@", &log_str)).unwrap();
        fs::write(&log, "").unwrap();
        Self {
            dir,
            log,
            cc_script,
            ar_script,
        }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn objdir(&self) -> PathBuf {
        self.path("out/obj")
    }

    /// Writes a source file dated well in the past.
    pub fn source(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, format!("int f_{}(void) {{ return 0; }}\n", rel.len())).unwrap();
        set_age(&path, 10_000);
        path
    }

    /// Space-separated absolute paths, the form the builders take.
    pub fn list(&self, paths: &[&PathBuf]) -> String {
        paths
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Compiler is `sh fakecc.sh`: the script rides along as the first cflag.
    pub fn config(&self) -> BuildConfig {
        BuildConfig::new("sh", self.objdir())
            .with_cflags(vec![self.cc_script.to_string_lossy().to_string()])
            .with_cancel(CancelToken::new())
    }

    pub fn archiver(&self) -> Archiver {
        Archiver {
            program: "sh".to_string(),
            flags: vec![self.ar_script.to_string_lossy().to_string(), "rcs".to_string()],
        }
    }

    pub fn cc_script(&self) -> &Path {
        &self.cc_script
    }

    pub fn ar_script(&self) -> &Path {
        &self.ar_script
    }

    pub fn invocations(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }

    pub fn count(&self, tool: &str) -> usize {
        let prefix = format!("{} ", tool);
        self.invocations()
            .iter()
            .filter(|l| l.starts_with(&prefix))
            .count()
    }

    pub fn compiles(&self) -> usize {
        self.invocations()
            .iter()
            .filter(|l| l.starts_with("cc ") && l.contains(" -c "))
            .count()
    }

    pub fn links(&self) -> usize {
        self.invocations()
            .iter()
            .filter(|l| l.starts_with("cc ") && !l.contains(" -c "))
            .count()
    }

    pub fn clear_log(&self) {
        fs::write(&self.log, "").unwrap();
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// Sets `path`'s mtime to `secs_ago` seconds before now.
pub fn set_age(path: &Path, secs_ago: i64) {
    set_file_mtime(path, FileTime::from_unix_time(now_secs() - secs_ago, 0)).unwrap();
}
