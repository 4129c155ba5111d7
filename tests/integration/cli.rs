//! The `blip-sweep` binary end to end

use assert_cmd::Command;
use blip_sweep::test_utils::SweepTree;
use blip_sweep::tool::Tool;
use predicates::prelude::*;

use crate::common::{run_sweep, write_page, write_po_dir};

const MODULES: &str = r#"<moduleset>
  <repository type="git" name="g" default="yes" href="git://g/"/>
  <autotools id="glib"><branch/></autotools>
  <autotools id="gtk+">
    <branch/>
    <dependencies><dep package="glib"/></dependencies>
  </autotools>
  <autotools id="gedit">
    <branch/>
    <dependencies><dep package="gtk+"/></dependencies>
  </autotools>
  <metamodule id="meta-loop">
    <dependencies><dep package="gedit"/><dep package="meta-loop"/></dependencies>
  </metamodule>
</moduleset>"#;

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("blip-sweep")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("intltool"))
        .stdout(predicate::str::contains("help-l10n"))
        .stdout(predicate::str::contains("moduleset"));

    Command::cargo_bin("blip-sweep")
        .unwrap()
        .args(["-v", "-q", "state", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_moduleset_resolve_text() {
    let tree = SweepTree::new();
    tree.write("gnome.modules", MODULES);

    let output = run_sweep(&tree, &["moduleset", "resolve", "gnome.modules"]);
    output.assert_success();
    assert_eq!(output.stdout, "glib\ngtk+\ngedit\n");

    let output = run_sweep(&tree, &["moduleset", "resolve", "gnome.modules", "meta-loop"]);
    output.assert_success().assert_stdout_contains("gedit");
    assert!(output.stderr.contains("warning:"), "stderr: {}", output.stderr);
}

#[test]
fn test_moduleset_resolve_json() {
    let tree = SweepTree::new();
    tree.write("gnome.modules", MODULES);

    let output = run_sweep(&tree, &["moduleset", "resolve", "gnome.modules", "meta-loop", "--format", "json"]);
    output.assert_success();
    let json = output.json();
    assert_eq!(json["packages"], serde_json::json!(["gedit"]));
    assert_eq!(json["diagnostics"].as_array().map(Vec::len), Some(1));
}

#[test]
fn test_moduleset_deps() {
    let tree = SweepTree::new();
    tree.write("gnome.modules", MODULES);

    let output = run_sweep(&tree, &["moduleset", "deps", "gnome.modules", "gedit"]);
    output.assert_success();
    assert_eq!(output.stdout, "gtk+\nglib (indirect)\n");

    let output = run_sweep(&tree, &["moduleset", "deps", "gnome.modules", "gedit", "--tree"]);
    output.assert_success();
    assert_eq!(output.stdout, "gedit\n└── gtk+\n    └── glib\n");

    let output = run_sweep(&tree, &["moduleset", "deps", "gnome.modules", "nautilus"]);
    assert!(!output.success);
    assert!(output.stderr.contains("nautilus"), "stderr: {}", output.stderr);
}

#[test]
fn test_missing_moduleset_exits_with_error() {
    let tree = SweepTree::new();
    let output = run_sweep(&tree, &["moduleset", "resolve", "absent.modules"]);
    assert!(!output.success);
    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("absent.modules"), "stderr: {}", output.stderr);
}

#[test]
fn test_intltool_json_then_unchanged_rerun() {
    let tree = SweepTree::new();
    write_po_dir(&tree, "gedit", &["de", "fr"]);

    let output = run_sweep(&tree, &["intltool", "gedit/po", "--epoch", "3.38.0", "--format", "json"]);
    output.assert_success();
    let json = output.json();
    assert!(json.get("error").is_none());
    assert_eq!(json["value"]["name"], "gedit");
    assert_eq!(json["value"]["template"]["message_count"], 2);
    assert_eq!(json["value"]["languages"]["de"]["value"]["messages"]["translated"], 1);
    assert_eq!(json["value"]["languages"]["fr"]["value"]["messages"]["fuzzy"], 1);

    tree.tools.clear_invocations();
    let output = run_sweep(&tree, &["intltool", "gedit/po", "--epoch", "3.38.0"]);
    output.assert_success().assert_stdout_contains("gedit");
    assert!(tree.tools.invocations().is_empty());
}

#[test]
fn test_force_rebuilds_everything() {
    let tree = SweepTree::new();
    write_po_dir(&tree, "gedit", &["de"]);
    run_sweep(&tree, &["intltool", "gedit/po"]).assert_success();

    tree.tools.clear_invocations();
    run_sweep(&tree, &["intltool", "gedit/po", "--force"]).assert_success();
    assert_eq!(tree.tools.invocations_of(Tool::IntltoolUpdate).len(), 2);
    assert_eq!(tree.tools.invocations_of(Tool::Msgmerge).len(), 1);
}

#[test]
fn test_mallard_command() {
    let tree = SweepTree::new();
    write_page(&tree, "help/C", "index", r#"<title>Help</title>"#);
    write_page(&tree, "help/C", "files", r#"<info><link type="guide" xref="index"/></info>"#);

    let output = run_sweep(&tree, &["mallard", "help/C", "--id", "gnome-help"]);
    output.assert_success().assert_stdout_contains("links: 1");
    assert!(tree.output_dir().join("graphs/gnome-help").is_dir());

    let output = run_sweep(&tree, &["mallard", "empty"]);
    assert!(!output.success);
}

#[test]
fn test_state_show_and_clear() {
    let tree = SweepTree::new();
    tree.write("gedit/po/de.po", "");

    // No LINGUAS: the unit fails and its error is kept in the state
    run_sweep(&tree, &["intltool", "gedit/po"]).assert_success();

    let output = run_sweep(&tree, &["state", "show", "--format", "json"]);
    output.assert_success();
    let json = output.json();
    assert!(json["errors"]["intltool:gedit"].as_str().is_some_and(|e| e.contains("LINGUAS")));

    let output = run_sweep(&tree, &["state", "clear"]);
    output.assert_success().assert_stdout_contains("Removed");
    assert!(!tree.state_dir().join("sweep-state.json").exists());

    let output = run_sweep(&tree, &["state", "clear"]);
    output.assert_success().assert_stdout_contains("No sweep state");
}
