//! DocBook document scanner.
//!
//! Only the document-level metadata is read: the root title, the first
//! `*info` block (`bookinfo`, `articleinfo`, `info`, ...) with its abstract,
//! release status and credits. Element names are matched without regard to
//! namespace so DocBook 4 and 5 documents read the same.

use serde::{Deserialize, Serialize};

use super::credits::{Credit, CreditRoles};
use super::mallard::status_code;
use crate::core::{Localized, SweepError};
use crate::utils::normalize_whitespace;
use crate::xml::{Element, parse_document};

/// Name parts of a person, in display order.
const NAME_PARTS: [&str; 5] = ["honorific", "firstname", "othername", "surname", "lineage"];

/// Metadata of a DocBook document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocBookDocument {
    pub title: Option<Localized<String>>,
    /// `abstract role="description"`
    pub desc: Option<Localized<String>>,
    /// Ordered status code from the `releaseinfo` of the package series
    pub status: String,
    pub credits: Vec<Credit>,
}

/// Parses the metadata of a DocBook document.
///
/// # Errors
///
/// [`SweepError::ParseFailure`] for malformed XML.
pub fn parse_docbook(
    text: &str,
    source_name: &str,
    series: Option<&str>,
) -> Result<DocBookDocument, SweepError> {
    let root = parse_document(text, source_name)?;

    let mut document = DocBookDocument {
        title: None,
        desc: None,
        status: status_code(None),
        credits: Vec::new(),
    };

    let mut seen = 0;
    for node in root.elements() {
        if node.name.ends_with("info") {
            seen += 1;
            read_info(&mut document, node, series);
        } else if node.name == "title" {
            seen += 1;
            document.title = Some(Localized::Single(node.normalized_text()));
        }
        if seen > 1 {
            break;
        }
    }

    Ok(document)
}

fn read_info(document: &mut DocBookDocument, info: &Element, series: Option<&str>) {
    let mut nodes: Vec<&Element> = info.elements().collect();
    let mut i = 0;
    while i < nodes.len() {
        let node = nodes[i];
        i += 1;
        let maintainer = node.attr("role") == Some("maintainer");

        match node.name.as_str() {
            "title" => {
                if document.title.is_none() {
                    document.title = Some(Localized::Single(node.normalized_text()));
                }
            }
            "abstract" if node.attr("role") == Some("description") => {
                document.desc = Some(Localized::Single(node.normalized_text()));
            }
            "releaseinfo" => {
                if series.is_some() && node.attr("revision") == series {
                    document.status = status_code(node.attr("role"));
                }
            }
            "authorgroup" => nodes.extend(node.elements()),
            kind @ ("author" | "editor" | "othercredit") => {
                let (name, email) = person_name(node);
                push_credit(document, name, email, kind, maintainer);
            }
            kind @ ("collab" | "publisher") => {
                let child_name = if kind == "collab" { "collabname" } else { "publishername" };
                let name = node.elements().filter(|e| e.name == child_name).last();
                if let Some(name) = name {
                    push_credit(document, Some(name.normalized_text()), None, kind, maintainer);
                }
            }
            kind @ ("corpauthor" | "corpcredit") => {
                push_credit(document, Some(node.normalized_text()), None, kind, maintainer);
            }
            _ => {}
        }
    }
}

fn push_credit(
    document: &mut DocBookDocument,
    name: Option<String>,
    email: Option<String>,
    kind: &str,
    maintainer: bool,
) {
    let name = name.filter(|n| !n.is_empty());
    if name.is_none() && email.is_none() {
        return;
    }
    document.credits.push(Credit {
        name,
        email,
        roles: CreditRoles {
            author: matches!(kind, "author" | "corpauthor"),
            editor: kind == "editor",
            publisher: kind == "publisher",
            maintainer,
        },
    });
}

/// Name and email of a person element: a nested `personname`, or the
/// honorific/first/other/surname/lineage parts joined with spaces.
fn person_name(node: &Element) -> (Option<String>, Option<String>) {
    let mut parts: [Option<String>; 5] = Default::default();
    let mut full_name = None;
    let mut email = None;

    for child in node.elements() {
        if child.name == "personname" {
            full_name = person_name(child).0;
        } else if child.name == "email" {
            email = Some(child.normalized_text()).filter(|e| !e.is_empty());
        } else if full_name.is_none() {
            if let Some(index) = NAME_PARTS.iter().position(|p| *p == child.name) {
                if parts[index].is_none() {
                    parts[index] = Some(child.text());
                }
            }
        }
    }

    let name = full_name.unwrap_or_else(|| {
        normalize_whitespace(&parts.into_iter().flatten().collect::<Vec<_>>().join(" "))
    });
    (Some(name).filter(|n| !n.is_empty()), email)
}
