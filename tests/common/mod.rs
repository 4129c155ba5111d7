//! Common helpers for the blip-sweep integration tests

// Not every test file uses every helper
#![allow(dead_code)]

use assert_cmd::Command;
use blip_sweep::test_utils::SweepTree;

/// Command output helper
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Assert the command succeeded
    pub fn assert_success(&self) -> &Self {
        assert!(self.success, "Command failed with code {:?}\nStderr: {}", self.code, self.stderr);
        self
    }

    /// Assert stdout contains the given text
    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Expected stdout to contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}):\n{}", self.stdout))
    }
}

/// Runs the binary against `tree`'s configuration, directories and fake tools.
pub fn run_sweep(tree: &SweepTree, args: &[&str]) -> CommandOutput {
    let config = tree.write_config();
    let output = Command::cargo_bin("blip-sweep")
        .expect("binary is built")
        .arg("--config")
        .arg(&config)
        .args(args)
        .current_dir(tree.root())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("run blip-sweep");

    CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        success: output.status.success(),
        code: output.status.code(),
    }
}

/// A po directory with `LINGUAS` and one catalog per language.
pub fn write_po_dir(tree: &SweepTree, module: &str, languages: &[&str]) -> std::path::PathBuf {
    tree.write(&format!("{module}/po/LINGUAS"), &format!("{}\n", languages.join("\n")));
    for lang in languages {
        tree.write(
            &format!("{module}/po/{lang}.po"),
            &blip_sweep::test_utils::sample_catalog(lang),
        );
    }
    tree.root().join(module).join("po")
}

/// Writes a Mallard page with the given body.
pub fn write_page(tree: &SweepTree, dir: &str, id: &str, body: &str) {
    tree.write(
        &format!("{dir}/{id}.page"),
        &format!(r#"<page xmlns="http://projectmallard.org/1.0/" id="{id}">{body}</page>"#),
    );
}
