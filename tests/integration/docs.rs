//! Mallard link graphs and DocBook metadata through a full run

use blip_sweep::core::{Localized, Outcome};
use blip_sweep::doc::{MallardUnit, UnitReport};
use blip_sweep::state::SweepRun;
use blip_sweep::test_utils::SweepTree;
use blip_sweep::tool::Tool;

use crate::common::write_page;

fn write_network_help(tree: &SweepTree) {
    write_page(
        tree,
        "help/C",
        "index",
        r#"<info><title type="text">Desktop Help</title>
           <revision pkgversion="3.38" date="2020-09-01" status="candidate"/>
           <credit type="author"><name>Shaun McCance</name><email>shaunm@gnome.org</email></credit>
         </info>
         <title>Help</title>
         <links type="topic"/>"#,
    );
    write_page(
        tree,
        "help/C",
        "setup",
        r#"<info>
             <link type="guide" xref="index"/>
             <link type="topic" xref="net-wired"/>
             <link type="topic" xref="net-wired#cable"/>
             <credit type="editor"><name>Shaun</name><email>shaunm@gnome.org</email></credit>
           </info>
           <title>Setup</title>"#,
    );
    write_page(
        tree,
        "help/C",
        "net-wired",
        r#"<info><link type="guide" xref="setup"/></info>
           <title>Wired</title>
           <section id="cable"><info><link type="guide" xref="index#net"/></info></section>"#,
    );
}

async fn sweep_help(tree: &SweepTree) -> Outcome<UnitReport> {
    let unit = MallardUnit::discover("gnome-help", &tree.root().join("help/C"), Some("3.38"));
    let mut run = SweepRun::open(&tree.config()).await.unwrap();
    let outcome = run.sweep_mallard(&unit).await;
    run.finish().unwrap();
    outcome
}

#[tokio::test]
async fn test_link_graph_is_rendered_once() {
    let tree = SweepTree::new();
    write_network_help(&tree);

    let outcome = sweep_help(&tree).await;
    assert!(outcome.is_ok(), "{:?}", outcome.error());
    let report = outcome.value().unwrap();
    assert!(report.rendered);
    assert_eq!(report.pages, 3);
    assert_eq!(report.scanned, 3);

    let svg = std::fs::read_to_string(&report.graph).unwrap();
    assert!(svg.starts_with("strict digraph topics {"));
    assert!(svg.contains("\"setup\" -> \"net-wired\";"));
    assert!(svg.contains("\"index\" -> \"setup\";"));
    assert!(svg.contains("\"index\" -> \"net-wired\";"));
    assert_eq!(svg.matches("\"setup\" -> \"net-wired\";").count(), 1);
    assert_eq!(tree.tools.invocations_of(Tool::Dot).len(), 1);

    tree.tools.clear_invocations();
    let second = sweep_help(&tree).await;
    let report = second.value().unwrap();
    assert!(!report.rendered);
    assert_eq!(report.scanned, 0);
    assert!(tree.tools.invocations().is_empty());
}

#[tokio::test]
async fn test_unit_metadata_and_contributors() {
    let tree = SweepTree::new();
    write_network_help(&tree);

    let outcome = sweep_help(&tree).await;
    let report = outcome.value().unwrap();
    assert_eq!(
        report.title.as_ref().and_then(Localized::default_value).map(String::as_str),
        Some("Desktop Help")
    );
    assert_eq!(report.status.as_deref(), Some("60candidate"));

    assert_eq!(report.contributors.len(), 1);
    let shaun = &report.contributors[0];
    assert_eq!(shaun.identity, "shaunm@gnome.org");
    assert!(shaun.roles.author && shaun.roles.editor);
}

#[tokio::test]
async fn test_removed_page_is_pruned_and_graph_rerendered() {
    let tree = SweepTree::new();
    write_network_help(&tree);
    sweep_help(&tree).await;

    std::fs::remove_file(tree.root().join("help/C/setup.page")).unwrap();
    tree.tools.clear_invocations();
    let outcome = sweep_help(&tree).await;

    let report = outcome.value().unwrap();
    assert_eq!(report.pages, 2);
    assert!(report.rendered);
    // net-wired still names setup as its guide
    let edges: Vec<(&str, &str)> = report.edges.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
    assert_eq!(edges, vec![("index", "net-wired"), ("setup", "net-wired")]);
    assert_eq!(tree.tools.invocations_of(Tool::Dot).len(), 1);
}

#[tokio::test]
async fn test_broken_page_is_reported_and_retried() {
    let tree = SweepTree::new();
    write_network_help(&tree);
    tree.write("help/C/broken.page", "<page xmlns=\"http://projectmallard.org/1.0/\"");

    let outcome = sweep_help(&tree).await;
    assert!(outcome.error().is_some());
    let report = outcome.value().unwrap();
    assert_eq!(report.page_errors.len(), 1);
    assert!(report.rendered, "siblings still produce a graph");

    // Unchanged pages are skipped, the broken one is parsed again
    let second = sweep_help(&tree).await;
    let report = second.value().unwrap();
    assert_eq!(report.scanned, 0);
    assert_eq!(report.page_errors.len(), 1);
}

#[tokio::test]
async fn test_docbook_metadata() {
    let tree = SweepTree::new();
    let file = tree.write(
        "gedit/help/C/gedit.xml",
        r#"<?xml version="1.0"?>
<article id="index" lang="en">
  <articleinfo>
    <title>gedit Manual</title>
    <abstract role="description"><para>A text editor.</para></abstract>
    <releaseinfo revision="3.38" role="final"/>
    <authorgroup>
      <author><firstname>Joachim</firstname><surname>Noreiko</surname></author>
    </authorgroup>
  </articleinfo>
</article>"#,
    );

    let mut run = SweepRun::open(&tree.config()).await.unwrap();
    let outcome = run.sweep_docbook(&file, Some("3.38")).await;
    run.finish().unwrap();

    let document = outcome.value().unwrap();
    assert_eq!(document.title, Some(Localized::Single("gedit Manual".to_string())));
    assert_eq!(document.desc, Some(Localized::Single("A text editor.".to_string())));
    assert_eq!(document.status, "70final");
    assert_eq!(document.credits.len(), 1);
    assert_eq!(document.credits[0].identity(), "/ghost/Joachim%20Noreiko");
}
