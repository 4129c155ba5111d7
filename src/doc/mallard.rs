//! Mallard page scanner.
//!
//! Reads what the sweep needs from one `.page` file: the page id, title and
//! description (per language), credits, the revision status for the current
//! package series, and the `topic`/`guide` links declared in the page info or
//! in section infos.

use serde::{Deserialize, Serialize};

use super::credits::{Credit, CreditRoles};
use crate::constants::MALLARD_NS;
use crate::core::{Localized, SweepError};
use crate::xml::{Element, parse_document};

/// Ordered review states of a document; the two-digit prefix sorts them.
const STATUSES: [(&str, &str); 8] = [
    ("none", "00"),
    ("stub", "10"),
    ("incomplete", "20"),
    ("draft", "30"),
    ("outdated", "40"),
    ("review", "50"),
    ("candidate", "60"),
    ("final", "70"),
];

/// Maps a status name to its ordered code (`"final"` becomes `"70final"`).
/// Unknown or absent statuses are `"00none"`.
pub fn status_code(status: Option<&str>) -> String {
    status
        .and_then(|s| STATUSES.iter().find(|(name, _)| *name == s))
        .map_or_else(|| "00none".to_string(), |(name, code)| format!("{code}{name}"))
}

/// Revision attributes matched against the package series, lowest priority
/// first.
const REVISION_KEYS: [&str; 3] = ["pkgversion", "docversion", "version"];

/// The revision selected for the package series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub date: Option<String>,
    /// Ordered status code, see [`status_code`]
    pub status: String,
}

/// What one page contributes to its unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MallardPage {
    pub id: String,
    pub title: Option<Localized<String>>,
    pub desc: Option<Localized<String>>,
    pub credits: Vec<Credit>,
    /// Outbound topic link targets, fragments stripped, no duplicates
    pub topic_links: Vec<String>,
    /// Targets that list this page as one of their topics
    pub guide_links: Vec<String>,
    pub revision: Option<Revision>,
}

/// Parses a page. Returns `Ok(None)` for XML documents that are not Mallard
/// pages.
///
/// `series` is the package series (`"2.30"`) revisions are matched against;
/// without one no revision is selected.
///
/// # Errors
///
/// [`SweepError::ParseFailure`] for malformed XML or a page without an id.
pub fn parse_page(
    text: &str,
    source_name: &str,
    series: Option<&str>,
) -> Result<Option<MallardPage>, SweepError> {
    let root = parse_document(text, source_name)?;
    if !root.is(Some(MALLARD_NS), "page") {
        return Ok(None);
    }
    let id = root
        .attr("id")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| SweepError::parse(source_name, "page has no id"))?
        .to_string();

    let mut page = MallardPage {
        id,
        title: None,
        desc: None,
        credits: Vec::new(),
        topic_links: Vec::new(),
        guide_links: Vec::new(),
        revision: None,
    };

    let mut info_titles = Vec::new();
    let mut page_titles = Vec::new();
    let mut descs = Vec::new();
    let mut revisions: [Option<(Option<String>, Option<String>)>; 3] = Default::default();

    for node in root.elements().filter(|e| e.ns.as_deref() == Some(MALLARD_NS)) {
        match node.name.as_str() {
            "info" => {
                for info in mallard_elements(node) {
                    match info.name.as_str() {
                        "title" if info.attr("type") == Some("text") => {
                            info_titles.push(localized_entry(info));
                        }
                        "desc" => descs.push(localized_entry(info)),
                        "revision" => {
                            if let Some(series) = series {
                                pick_revision(&mut revisions, info, series);
                            }
                        }
                        "credit" => {
                            if let Some(credit) = parse_credit(info) {
                                page.credits.push(credit);
                            }
                        }
                        "link" => add_link(&mut page, info),
                        _ => {}
                    }
                }
            }
            "title" => page_titles.push(localized_entry(node)),
            "section" => collect_section_links(&mut page, node),
            _ => {}
        }
    }

    page.title = Localized::from_entries(if info_titles.is_empty() {
        page_titles
    } else {
        info_titles
    });
    page.desc = Localized::from_entries(descs);
    page.revision = revisions.into_iter().flatten().last().map(|(date, status)| Revision {
        date,
        status: status_code(status.as_deref()),
    });

    Ok(Some(page))
}

fn mallard_elements(element: &Element) -> impl Iterator<Item = &Element> {
    element.elements().filter(|e| e.ns.as_deref() == Some(MALLARD_NS))
}

fn localized_entry(element: &Element) -> (Option<String>, String) {
    (element.lang().map(str::to_string), element.normalized_text())
}

/// Keeps the newest revision per matching attribute.
fn pick_revision(
    revisions: &mut [Option<(Option<String>, Option<String>)>; 3],
    info: &Element,
    series: &str,
) {
    for (slot, key) in revisions.iter_mut().zip(REVISION_KEYS) {
        if info.attr(key) != Some(series) {
            continue;
        }
        let date = info.attr("date").map(str::to_string);
        let newer = match slot {
            Some((current, _)) => date > *current,
            None => true,
        };
        if newer {
            *slot = Some((date, info.attr("status").map(str::to_string)));
        }
    }
}

fn parse_credit(info: &Element) -> Option<Credit> {
    let roles = CreditRoles::from_types(info.attr("type").unwrap_or_default().split_whitespace());
    let mut name = None;
    let mut email = None;
    for child in mallard_elements(info) {
        match child.name.as_str() {
            "name" => name = Some(child.normalized_text()),
            "email" => email = Some(child.normalized_text()),
            _ => {}
        }
    }
    if name.is_none() && email.is_none() {
        return None;
    }
    Some(Credit {
        name,
        email,
        roles,
    })
}

fn collect_section_links(page: &mut MallardPage, section: &Element) {
    for child in mallard_elements(section) {
        match child.name.as_str() {
            "info" => {
                for link in mallard_elements(child).filter(|e| e.name == "link") {
                    add_link(page, link);
                }
            }
            "section" => collect_section_links(page, child),
            _ => {}
        }
    }
}

fn add_link(page: &mut MallardPage, link: &Element) {
    let links = match link.attr("type") {
        Some("topic") => &mut page.topic_links,
        Some("guide") => &mut page.guide_links,
        _ => return,
    };
    let Some(xref) = link.attr("xref") else {
        return;
    };
    let target = xref.split('#').next().unwrap_or_default();
    if !target.is_empty() && !links.iter().any(|l| l == target) {
        links.push(target.to_string());
    }
}
