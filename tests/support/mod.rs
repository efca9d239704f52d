use assert_cmd::{cargo::cargo_bin_cmd, Command};
use std::fs;
use std::path::{Path, PathBuf};

/// Get a Command for promptest with provider settings isolated from the host
pub fn promptest() -> Command {
    let mut cmd = cargo_bin_cmd!("promptest");
    cmd.env_remove("PROMPTEST_API_BASE")
        .env_remove("PROMPTEST_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("PROMPTEST_OUTPUT_DIR")
        .env_remove("PROMPTEST_LOG")
        .env_remove("PROMPTEST_LOG_JSON");
    cmd
}

pub const GREETING_PROMPT: &str = r#"
template: "Say hello to {name}"
input_variables: [name]
output_key: greeting
"#;

/// Write `content` to `dir/name` and return the path
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// All snapshot files under `root`, sorted
#[allow(dead_code)]
pub fn snapshot_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(run_dirs) = fs::read_dir(root) {
        for run_dir in run_dirs.flatten() {
            for entry in fs::read_dir(run_dir.path()).unwrap().flatten() {
                files.push(entry.path());
            }
        }
    }
    files.sort();
    files
}
