#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Runs `kcadmin` with its config directory pointed at a temp dir.
pub struct KcAdminTest {
    pub temp_dir: TempDir,
    binary_path: PathBuf,
    env: Vec<(String, String)>,
}

impl KcAdminTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        KcAdminTest {
            temp_dir,
            binary_path: PathBuf::from(env!("CARGO_BIN_EXE_kcadmin")),
            env: Vec::new(),
        }
    }

    /// Extra environment for every run.
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.binary_path);
        cmd.args(args)
            .current_dir(self.temp_dir.path())
            .env("KEEPCONNECT_CONFIG_DIR", self.temp_dir.path())
            .env_remove("KEEPCONNECT_API_URL")
            .env_remove("KEEPCONNECT_TOKEN")
            .env_remove("KEEPCONNECT_PASSWORD")
            .env_remove("KEEPCONNECT_LOG");
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args)
            .output()
            .expect("Failed to execute kcadmin command")
    }

    /// Run off the async runtime, for tests that also host a mock server.
    pub async fn run_async(&self, args: &[&str]) -> Output {
        let mut cmd = self.command(args);
        tokio::task::spawn_blocking(move || cmd.output())
            .await
            .expect("kcadmin task panicked")
            .expect("Failed to execute kcadmin command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        check_success(args, self.run(args))
    }

    pub async fn run_success_async(&self, args: &[&str]) -> String {
        check_success(args, self.run_async(args).await)
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        check_failure(args, self.run(args))
    }

    pub async fn run_failure_async(&self, args: &[&str]) -> String {
        check_failure(args, self.run_async(args).await)
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("config.yaml")
    }

    pub fn write_config(&self, content: &str) {
        fs::write(self.config_path(), content).expect("Failed to write config file");
    }

    pub fn read_config(&self) -> String {
        fs::read_to_string(self.config_path()).unwrap_or_default()
    }

    /// Point the client at `api_url` with a stored token.
    pub fn login_to(&self, api_url: &str, token: &str) {
        self.write_config(&format!("api_url: {api_url}\nauth:\n  token: {token}\n"));
    }
}

fn check_success(args: &[&str], output: Output) -> String {
    if !output.status.success() {
        panic!(
            "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
            args,
            output.status,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn check_failure(args: &[&str], output: Output) -> String {
    assert!(
        !output.status.success(),
        "Expected command {:?} to fail, but it succeeded\nstdout: {}",
        args,
        String::from_utf8_lossy(&output.stdout)
    );
    String::from_utf8_lossy(&output.stderr).to_string()
}
