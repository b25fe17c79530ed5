//! Runs the `imgdrop` binary against a temporary vault and config directory.

#![cfg(target_os = "linux")]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

struct Env {
    home: TempDir,
    vault: TempDir,
}

impl Env {
    fn new() -> Self {
        let env = Self {
            home: tempfile::tempdir().expect("Should create home"),
            vault: tempfile::tempdir().expect("Should create vault"),
        };
        fs::write(env.vault.path().join("cat.png"), [1, 2, 3]).expect("Should write image");
        fs::write(env.vault.path().join("day.md"), "![[cat.png]]\n").expect("Should write note");
        env
    }

    fn config_file(&self) -> std::path::PathBuf {
        self.home.path().join("config/imgdrop/config.toml")
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_imgdrop"))
            .args(args)
            .arg("--vault")
            .arg(self.vault.path())
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.home.path().join("config"))
            .env_remove("RUST_LOG")
            .output()
            .expect("Should run imgdrop")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_help_lists_commands() {
    let env = Env::new();
    let output = env.run(&["--help"]);

    assert!(output.status.success());
    let help = stdout(&output);
    for command in ["upload", "drop", "paste", "config", "completions"] {
        assert!(help.contains(command), "missing {command} in:\n{help}");
    }
}

#[test]
fn test_config_set_then_show() {
    let env = Env::new();

    let set = env.run(&["config", "set", "s3Bucket", "my-images"]);
    assert!(set.status.success(), "{}", String::from_utf8_lossy(&set.stderr));
    let set = env.run(&["config", "set", "s3SecretAccessKey", "abcdefgh"]);
    assert!(set.status.success());

    let content = fs::read_to_string(env.config_file()).expect("Should write config file");
    assert!(content.contains("s3Bucket = \"my-images\""));

    let show = stdout(&env.run(&["config", "show"]));
    assert!(show.contains("my-images"));
    assert!(show.contains("abcd****"));
    assert!(!show.contains("abcdefgh"));
}

#[test]
fn test_config_rejects_unknown_key() {
    let env = Env::new();
    let output = env.run(&["config", "set", "nope", "x"]);

    assert!(!output.status.success());
    assert!(!env.config_file().exists());
}

#[test]
fn test_config_path_points_into_config_home() {
    let env = Env::new();
    let output = stdout(&env.run(&["config", "path"]));
    assert_eq!(Path::new(output.trim()), env.config_file());
}

#[test]
fn test_upload_without_settings_leaves_note_unchanged() {
    let env = Env::new();
    let output = env.run(&["upload", "day.md", "--line", "1"]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout(&output).contains("configure S3 settings"));
    assert_eq!(
        fs::read_to_string(env.vault.path().join("day.md")).expect("Should read note"),
        "![[cat.png]]\n"
    );
}

#[test]
fn test_drop_non_image_attaches_file() {
    let env = Env::new();
    let doc = env.home.path().join("notes.txt");
    fs::write(&doc, "hello").expect("Should write file");

    let output = env.run(&["drop", "day.md", doc.to_str().expect("utf-8 path")]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        fs::read_to_string(env.vault.path().join("day.md")).expect("Should read note"),
        "![[cat.png]]\n![[notes.txt]]"
    );
    assert!(env.vault.path().join("notes.txt").exists());
}

#[test]
fn test_completions_for_bash() {
    let env = Env::new();
    let output = env.run(&["completions", "bash"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("imgdrop"));
}
