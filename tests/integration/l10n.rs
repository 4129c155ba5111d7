//! Translation sweeps against fake intltool-update, xml2po and msgmerge

use blip_sweep::core::{BuildVars, Outcome, SweepError};
use blip_sweep::l10n::{DomainReport, HelpDomain, IntltoolDomain};
use blip_sweep::state::SweepRun;
use blip_sweep::test_utils::{SAMPLE_TEMPLATE, SweepTree, init_test_logging, sample_catalog};
use blip_sweep::tool::Tool;

use crate::common::write_po_dir;

fn gedit_domain(tree: &SweepTree, epoch: &str) -> IntltoolDomain {
    IntltoolDomain {
        po_dir: tree.root().join("gedit").join("po"),
        module: "gedit".to_string(),
        gettext_package: None,
        epoch: epoch.to_string(),
    }
}

async fn sweep_once(tree: &SweepTree, domain: &IntltoolDomain) -> Outcome<DomainReport> {
    let mut run = SweepRun::open(&tree.config()).await.unwrap();
    let outcome = run.sweep_intltool(domain).await;
    run.finish().unwrap();
    outcome
}

#[tokio::test]
async fn test_unchanged_tree_invokes_no_tools() {
    init_test_logging(None);
    let tree = SweepTree::new();
    write_po_dir(&tree, "gedit", &["de", "fr"]);
    let domain = gedit_domain(&tree, "3.38.0");

    let first = sweep_once(&tree, &domain).await;
    assert!(first.is_ok());
    assert_eq!(tree.tools.invocations_of(Tool::IntltoolUpdate).len(), 2);
    assert_eq!(tree.tools.invocations_of(Tool::Msgmerge).len(), 2);
    let template = first.value().unwrap().template.clone().unwrap();
    assert_eq!(template.path, tree.output_dir().join("l10n/gedit/gedit.pot"));
    assert_eq!(template.message_count, 2);

    tree.tools.clear_invocations();
    let mut run = SweepRun::open(&tree.config()).await.unwrap();
    let second = run.sweep_intltool(&domain).await;
    assert_eq!(run.tool_runs(), 0);
    run.finish().unwrap();

    assert!(tree.tools.invocations().is_empty(), "{:?}", tree.tools.invocations());
    let report = second.value().unwrap();
    let de = report.languages["de"].value().unwrap();
    assert_eq!(de.messages.translated, 1);
    assert_eq!(de.messages.fuzzy, 1);
    assert_eq!(report.template.as_ref().unwrap().content_hash, template.content_hash);
}

#[tokio::test]
async fn test_header_only_template_change_skips_merges() {
    let tree = SweepTree::new();
    write_po_dir(&tree, "gedit", &["de"]);
    let first = sweep_once(&tree, &gedit_domain(&tree, "1")).await;
    let first_hash = first.value().unwrap().template.clone().unwrap().content_hash;

    tree.tools.clear_invocations();
    tree.tools.set_template(&SAMPLE_TEMPLATE.replace("2020-01-01 00:00", "2021-06-30 12:34"));
    let second = sweep_once(&tree, &gedit_domain(&tree, "2")).await;

    assert_eq!(tree.tools.invocations_of(Tool::IntltoolUpdate).len(), 2);
    assert!(tree.tools.invocations_of(Tool::Msgmerge).is_empty());
    let template = second.value().unwrap().template.clone().unwrap();
    assert_eq!(template.content_hash, first_hash);
    assert_eq!(template.epoch, "2");
}

#[tokio::test]
async fn test_new_template_content_remerges_every_language() {
    let tree = SweepTree::new();
    write_po_dir(&tree, "gedit", &["de", "fr"]);
    sweep_once(&tree, &gedit_domain(&tree, "1")).await;

    tree.tools.clear_invocations();
    tree.tools.set_template(&format!("{SAMPLE_TEMPLATE}\nmsgid \"Quit\"\nmsgstr \"\"\n"));
    let outcome = sweep_once(&tree, &gedit_domain(&tree, "2")).await;

    assert!(outcome.is_ok());
    assert_eq!(tree.tools.invocations_of(Tool::Msgmerge).len(), 2);
    assert_eq!(outcome.value().unwrap().template.as_ref().unwrap().message_count, 3);
}

#[tokio::test]
async fn test_touched_catalog_only_reruns_its_merge() {
    let tree = SweepTree::new();
    write_po_dir(&tree, "gedit", &["de", "fr"]);
    sweep_once(&tree, &gedit_domain(&tree, "1")).await;

    tree.tools.clear_invocations();
    tree.write("gedit/po/de.po", &sample_catalog("de").replace("#, fuzzy\n", ""));
    let outcome = sweep_once(&tree, &gedit_domain(&tree, "1")).await;

    assert!(tree.tools.invocations_of(Tool::IntltoolUpdate).is_empty());
    let template = tree.output_dir().join("l10n/gedit/gedit.pot");
    assert_eq!(tree.tools.invocations(), vec![format!("msgmerge de.po {}", template.display())]);
    let report = outcome.value().unwrap();
    assert_eq!(report.languages["de"].value().unwrap().messages.translated, 2);
    assert_eq!(report.languages["fr"].value().unwrap().messages.translated, 1);
}

#[tokio::test]
async fn test_merge_failure_is_scoped_to_its_language() {
    let tree = SweepTree::new();
    write_po_dir(&tree, "gedit", &["de", "fr"]);
    sweep_once(&tree, &gedit_domain(&tree, "1")).await;

    tree.tools.fail(Tool::Msgmerge, Some("fr.po"));
    tree.write("gedit/po/fr.po", &format!("{}\nmsgid \"Quit\"\nmsgstr \"\"\n", sample_catalog("fr")));
    tree.write("gedit/po/de.po", &format!("{}\nmsgid \"Quit\"\nmsgstr \"Q\"\n", sample_catalog("de")));
    let outcome = sweep_once(&tree, &gedit_domain(&tree, "1")).await;

    assert!(outcome.is_ok());
    let report = outcome.value().unwrap();

    let fr = &report.languages["fr"];
    assert!(matches!(fr.error(), Some(SweepError::GeneratorFailure { tool, .. }) if tool == "msgmerge"));
    let fr_stats = fr.value().unwrap();
    assert_eq!(fr_stats.messages.total(), 2, "last good statistics are kept");

    let de = &report.languages["de"];
    assert!(de.is_ok());
    assert_eq!(de.value().unwrap().messages.translated, 2);

    // The failed catalog is retried on the next run
    tree.tools.clear_invocations();
    sweep_once(&tree, &gedit_domain(&tree, "1")).await;
    let merges = tree.tools.invocations_of(Tool::Msgmerge);
    assert_eq!(merges.len(), 1);
    assert!(merges[0].starts_with("msgmerge fr.po "));
}

#[tokio::test]
async fn test_generator_failure_keeps_previous_statistics() {
    let tree = SweepTree::new();
    write_po_dir(&tree, "gedit", &["de"]);
    sweep_once(&tree, &gedit_domain(&tree, "1")).await;

    tree.tools.fail(Tool::IntltoolUpdate, None);
    let mut run = SweepRun::open(&tree.config()).await.unwrap();
    let outcome = run.sweep_intltool(&gedit_domain(&tree, "2")).await;

    assert!(matches!(outcome.error(), Some(SweepError::GeneratorFailure { .. })));
    let report = outcome.value().unwrap();
    assert_eq!(report.template.as_ref().unwrap().epoch, "1");
    assert_eq!(report.languages["de"].value().unwrap().messages.translated, 1);
    assert!(run.state.errors.contains_key("intltool:gedit"));
    run.finish().unwrap();
}

#[tokio::test]
async fn test_missing_linguas_fails_the_domain() {
    let tree = SweepTree::new();
    tree.write("gedit/po/de.po", &sample_catalog("de"));

    let outcome = sweep_once(&tree, &gedit_domain(&tree, "1")).await;
    assert!(outcome.value().is_none());
    assert!(matches!(outcome.error(), Some(SweepError::MissingInput { what, .. }) if what == "LINGUAS file"));
    assert!(tree.tools.invocations().is_empty());
}

#[tokio::test]
async fn test_help_domain_sweep() {
    let tree = SweepTree::new();
    tree.write("gedit/help/C/index.page", "<page/>");
    tree.write("gedit/help/C/legal.xml", "<legal/>");
    tree.write("gedit/help/de/de.po", &sample_catalog("de"));

    let vars: BuildVars = [
        ("DOC_ID".to_string(), "gedit".to_string()),
        ("DOC_PAGES".to_string(), "index.page".to_string()),
        ("DOC_INCLUDES".to_string(), "legal.xml".to_string()),
        ("DOC_LINGUAS".to_string(), "de".to_string()),
    ]
    .into_iter()
    .collect();
    let domain = HelpDomain::from_build_vars(&tree.root().join("gedit/help"), "gedit", &vars, "1").unwrap();

    let mut run = SweepRun::open(&tree.config()).await.unwrap();
    let outcome = run.sweep_help(&domain).await;
    run.finish().unwrap();

    assert!(outcome.is_ok());
    let output = tree.output_dir().join("l10n/gedit/help/gedit.pot");
    assert_eq!(
        tree.tools.invocations_of(Tool::Xml2po),
        vec![format!("xml2po -e -o {} C/index.page C/legal.xml", output.display())]
    );
    assert!(output.exists());
    let report = outcome.value().unwrap();
    assert_eq!(report.name, "gedit");
    assert_eq!(report.languages["de"].value().unwrap().messages.total(), 2);
}
