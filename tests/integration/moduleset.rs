//! Module-set files on disk: includes, resolution and dependency closures

use blip_sweep::core::SweepError;
use blip_sweep::moduleset::{
    ModuleSetCache, PackageGraph, dependency_closure, resolve, resolve_all, resolve_default,
};
use blip_sweep::test_utils::SweepTree;
use std::path::PathBuf;
use std::sync::Arc;

fn write_gnome_modulesets(tree: &SweepTree) -> PathBuf {
    tree.write(
        "modulesets/platform.modules",
        r#"<?xml version="1.0"?>
<moduleset>
  <repository type="git" name="git.gnome.org" default="yes" href="git://git.gnome.org/"/>
  <autotools id="glib"><branch/></autotools>
  <autotools id="pango">
    <branch/>
    <dependencies><dep package="glib"/><dep package="cairo"/></dependencies>
  </autotools>
  <autotools id="cairo">
    <branch/>
    <dependencies><dep package="pixman"/></dependencies>
  </autotools>
  <autotools id="pixman"><branch/></autotools>
  <autotools id="gtk+">
    <branch/>
    <dependencies><dep package="pango"/><dep package="glib"/></dependencies>
  </autotools>
</moduleset>"#,
    );
    tree.write(
        "modulesets/desktop.modules",
        r#"<?xml version="1.0"?>
<moduleset>
  <repository type="git" name="git.gnome.org" default="yes" href="git://git.gnome.org/"/>
  <include href="platform.modules"/>
  <autotools id="gedit">
    <branch/>
    <dependencies><dep package="gtk+"/></dependencies>
  </autotools>
  <autotools id="nautilus"><branch/></autotools>
  <metamodule id="meta-gnome-desktop">
    <dependencies>
      <dep package="gedit"/>
      <dep package="meta-gnome-desktop"/>
      <dep package="nautilus"/>
      <dep package="platform.modules"/>
    </dependencies>
  </metamodule>
</moduleset>"#,
    )
}

#[test]
fn test_implicit_groups_and_includes() {
    let tree = SweepTree::new();
    let path = write_gnome_modulesets(&tree);
    let cache = ModuleSetCache::new();
    let document = cache.get_or_load(&path).unwrap();

    assert_eq!(document.files().len(), 2);
    assert_eq!(resolve_default(&document).packages, vec!["gedit", "nautilus"]);
    assert_eq!(
        resolve(&document, "platform.modules").packages,
        vec!["glib", "pango", "cairo", "pixman", "gtk+"]
    );
}

#[test]
fn test_self_referencing_metamodule_resolves_with_a_diagnostic() {
    let tree = SweepTree::new();
    let document = ModuleSetCache::new().get_or_load(&write_gnome_modulesets(&tree)).unwrap();

    let resolution = resolve(&document, "meta-gnome-desktop");
    assert_eq!(
        resolution.packages,
        vec!["gedit", "nautilus", "glib", "pango", "cairo", "pixman", "gtk+"]
    );
    assert_eq!(resolution.diagnostics.len(), 1);
    assert!(matches!(
        &resolution.diagnostics[0],
        SweepError::CyclicReference { id, .. } if id == "meta-gnome-desktop"
    ));
}

#[test]
fn test_resolve_all_keeps_first_occurrence() {
    let tree = SweepTree::new();
    let document = ModuleSetCache::new().get_or_load(&write_gnome_modulesets(&tree)).unwrap();

    let resolution = resolve_all(&document, ["nautilus", "desktop.modules", "glib"]);
    assert_eq!(resolution.packages, vec!["nautilus", "gedit", "glib"]);
    assert!(resolution.diagnostics.is_empty());
}

#[test]
fn test_deep_metamodule_cycle_terminates() {
    let tree = SweepTree::new();
    let mut body = String::from(
        r#"<moduleset><repository type="git" name="g" default="yes" href="git://g/"/>"#,
    );
    for i in 0..200 {
        body.push_str(&format!(
            r#"<metamodule id="m{i}"><dependencies><dep package="m{}"/><dep package="leaf"/></dependencies></metamodule>"#,
            (i + 1) % 200
        ));
    }
    body.push_str(r#"<autotools id="leaf"><branch/></autotools></moduleset>"#);
    let path = tree.write("cycle.modules", &body);

    let document = ModuleSetCache::new().get_or_load(&path).unwrap();
    let resolution = resolve(&document, "m0");
    assert_eq!(resolution.packages, vec!["leaf"]);
    assert_eq!(resolution.diagnostics.len(), 1);
}

#[test]
fn test_dependency_closure_across_files() {
    let tree = SweepTree::new();
    let document = ModuleSetCache::new().get_or_load(&write_gnome_modulesets(&tree)).unwrap();

    let closure: Vec<(String, bool)> =
        dependency_closure(&document, "gedit").into_iter().map(|d| (d.id, d.direct)).collect();
    assert_eq!(
        closure,
        vec![
            ("gtk+".to_string(), true),
            ("pango".to_string(), false),
            ("glib".to_string(), false),
            ("cairo".to_string(), false),
            ("pixman".to_string(), false),
        ]
    );

    let graph = PackageGraph::from_document(&document);
    assert!(graph.cycles().is_empty());
    assert_eq!(graph.node_count(), 7);
}

#[test]
fn test_cache_shares_and_reloads_documents() {
    let tree = SweepTree::new();
    let path = write_gnome_modulesets(&tree);
    let cache = ModuleSetCache::new();

    let first = cache.get_or_load(&path).unwrap();
    let second = cache.get_or_load(&path).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);

    tree.write(
        "modulesets/desktop.modules",
        r#"<moduleset><repository type="git" name="g" default="yes" href="git://g/"/>
           <autotools id="epiphany"><branch/></autotools></moduleset>"#,
    );
    assert!(cache.get_or_load(&path).unwrap().has_package("gedit"));
    let reloaded = cache.reload(&path).unwrap();
    assert!(reloaded.has_package("epiphany"));
    assert!(!reloaded.has_package("gedit"));
}
