use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn ingest_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("csv-ingest");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = r#"[warehouse]
host = "localhost"
dbname = "dev"
user = "awsuser"

[ingest]
chunk_size = 2
"#;
    let config_path = config_dir.join("ingest.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn run_ingest(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = ingest_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run csv-ingest binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_check_valid_file() {
    let (tmp, config_path) = setup_test_env();
    let file = write_file(
        tmp.path(),
        "departments.csv",
        "1,Product Management\n2,Sales\n3,Research and Development\n",
    );

    let (stdout, stderr, success) =
        run_ingest(&config_path, &["check", "departments", file.to_str().unwrap()]);
    assert!(success, "check failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("check departments"));
    assert!(stdout.contains("chunks: 2"));
    assert!(stdout.contains("rows read: 3"));
    assert!(stdout.contains("rows accepted: 3"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_check_counts_rejected_rows() {
    let (tmp, config_path) = setup_test_env();
    let file = write_file(
        tmp.path(),
        "hired_employees.csv",
        "1,Harold Vogt,2021-11-07T02:48:42Z,2,96\n\
         2,Ty Hofer,2021-05-30 05:43:46,8,\n\
         3,Lyman Hadye,2021-09-01T23:27:38Z,5,52\n",
    );

    let (stdout, stderr, success) = run_ingest(
        &config_path,
        &["check", "hired_employees", file.to_str().unwrap()],
    );
    assert!(success, "check failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("rows accepted: 2"));
    assert!(stdout.contains("rows rejected: 1"));
}

#[test]
fn test_check_exhausted_chunk_fails() {
    let (tmp, config_path) = setup_test_env();
    let file = write_file(tmp.path(), "jobs.csv", "1,Recruiter\n2,Manager\n,\n3,\n");

    let (stdout, stderr, success) =
        run_ingest(&config_path, &["check", "jobs", file.to_str().unwrap()]);
    assert!(!success, "check should fail: stdout={}", stdout);
    assert!(stderr.contains("no valid rows"), "stderr={}", stderr);
}

#[test]
fn test_check_rejects_non_csv() {
    let (tmp, config_path) = setup_test_env();
    let file = write_file(tmp.path(), "jobs.txt", "1,Recruiter\n");

    let (_, stderr, success) =
        run_ingest(&config_path, &["check", "jobs", file.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("Unsupported file type: jobs.txt"));
}

#[test]
fn test_check_unknown_table() {
    let (tmp, config_path) = setup_test_env();
    let file = write_file(tmp.path(), "x.csv", "1,a\n");

    let (_, _, success) = run_ingest(&config_path, &["check", "employees", file.to_str().unwrap()]);
    assert!(!success);
}

#[test]
fn test_check_without_config_file() {
    let tmp = TempDir::new().unwrap();
    let file = write_file(tmp.path(), "jobs.csv", "1,Recruiter\n");
    let missing = tmp.path().join("missing.toml");

    let (stdout, stderr, success) = run_ingest(&missing, &["check", "jobs", file.to_str().unwrap()]);
    assert!(success, "check failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("chunks: 1"));
}
