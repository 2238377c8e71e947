use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tempfile::TempDir;

fn medi_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("medi");
    path
}

fn setup_test_env(bind: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    let config_content = format!(
        r#"[data]
path = "{root}/data"

[index]
path = "{root}/index/medi.sqlite"

[chunking]
chunk_size = 1000
chunk_overlap = 200

[retrieval]
top_k = 3

[server]
bind = "{bind}"
"#,
        root = root.display(),
    );

    let config_path = root.join("medi.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_medi(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = medi_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run medi binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_seed_creates_sample_reports() {
    let (tmp, config_path) = setup_test_env("127.0.0.1:7391");

    let (stdout, stderr, success) = run_medi(&config_path, &["seed"]);
    assert!(success, "seed failed: stdout={}, stderr={}", stdout, stderr);

    let data_dir = tmp.path().join("data");
    for id in ["001", "002", "003", "004"] {
        let report = data_dir.join(format!("patient_report_{}.pdf", id));
        assert!(report.exists(), "missing {}", report.display());
    }
    assert!(stdout.contains("4 new report(s)"));
}

#[test]
fn test_seed_skips_existing_reports() {
    let (tmp, config_path) = setup_test_env("127.0.0.1:7392");

    run_medi(&config_path, &["seed"]);

    // A hand-edited report must survive a re-run untouched.
    let report = tmp.path().join("data/patient_report_001.pdf");
    fs::write(&report, b"edited by hand").unwrap();

    let (stdout, _, success) = run_medi(&config_path, &["seed"]);
    assert!(success, "Second seed failed (not idempotent)");
    assert!(stdout.contains("0 new report(s)"));
    assert_eq!(fs::read(&report).unwrap(), b"edited by hand");
}

#[test]
fn test_ingest_empty_corpus_warns_but_succeeds() {
    let (tmp, config_path) = setup_test_env("127.0.0.1:7393");

    let (stdout, stderr, success) = run_medi(&config_path, &["ingest"]);
    assert!(
        success,
        "ingest over empty dir should succeed: stdout={}, stderr={}",
        stdout, stderr
    );
    assert!(stdout.contains("no PDF files found"));
    assert!(
        !tmp.path().join("index/medi.sqlite").exists(),
        "empty ingest must not create an index"
    );
}

#[test]
fn test_ingest_unreadable_pdf_aborts() {
    let (tmp, config_path) = setup_test_env("127.0.0.1:7394");

    fs::write(tmp.path().join("data/broken.pdf"), b"not a real pdf").unwrap();

    let (stdout, stderr, success) = run_medi(&config_path, &["ingest"]);
    assert!(
        !success,
        "ingest over a corrupt PDF should fail: stdout={}, stderr={}",
        stdout, stderr
    );
    assert!(
        !tmp.path().join("index/medi.sqlite").exists(),
        "failed ingest must not leave a partial index"
    );
}

#[test]
fn test_ingest_missing_path_errors() {
    let (_tmp, config_path) = setup_test_env("127.0.0.1:7395");

    let (_, stderr, success) = run_medi(&config_path, &["ingest", "--path", "/definitely/not/here"]);
    assert!(!success, "ingest with a missing path should fail");
    assert!(
        stderr.contains("does not exist"),
        "Should report the missing path, got: {}",
        stderr
    );
}

#[test]
fn test_serve_without_index_is_degraded_not_dead() {
    let bind = "127.0.0.1:7396";
    let (_tmp, config_path) = setup_test_env(bind);

    let mut child = Command::new(medi_binary())
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("serve")
        .spawn()
        .expect("Failed to spawn medi serve");

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let base = format!("http://{}", bind);

    // Wait for the listener to come up.
    let mut health = None;
    for _ in 0..50 {
        if let Ok(resp) = client.get(&base).send() {
            health = Some(resp);
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    let result = (|| -> Result<(), String> {
        let health = health.ok_or("server never came up")?;
        if !health.status().is_success() {
            return Err(format!("health check returned {}", health.status()));
        }
        let body: serde_json::Value = health.json().map_err(|e| e.to_string())?;
        if body["status"] != "ok" {
            return Err(format!("unexpected health body: {}", body));
        }

        let chat = client
            .post(format!("{}/chat", base))
            .json(&serde_json::json!({ "query": "What mutation was found?" }))
            .send()
            .map_err(|e| e.to_string())?;
        if chat.status().as_u16() != 503 {
            return Err(format!("expected 503 without an index, got {}", chat.status()));
        }
        let body: serde_json::Value = chat.json().map_err(|e| e.to_string())?;
        if body["error"]["code"] != "not_ready" {
            return Err(format!("unexpected error body: {}", body));
        }
        Ok(())
    })();

    child.kill().ok();
    child.wait().ok();
    result.unwrap();
}
