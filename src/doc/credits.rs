//! Contributor credits and their aggregation per documentation unit.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::GHOST_IDENTITY_PREFIX;

/// Characters left as-is in ghost identities.
const GHOST_ENCODE_SET: &AsciiSet =
    &NON_ALPHANUMERIC.remove(b'_').remove(b'.').remove(b'-').remove(b'/');

/// Role flags of a contributor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditRoles {
    pub author: bool,
    pub editor: bool,
    pub publisher: bool,
    pub maintainer: bool,
}

impl CreditRoles {
    /// Roles named by a whitespace-split credit `type` list. Unknown words are
    /// ignored.
    pub fn from_types<'a>(types: impl IntoIterator<Item = &'a str>) -> Self {
        let mut roles = Self::default();
        for kind in types {
            match kind {
                "author" => roles.author = true,
                "editor" => roles.editor = true,
                "publisher" => roles.publisher = true,
                "maintainer" => roles.maintainer = true,
                _ => {}
            }
        }
        roles
    }

    pub const fn union(self, other: Self) -> Self {
        Self {
            author: self.author || other.author,
            editor: self.editor || other.editor,
            publisher: self.publisher || other.publisher,
            maintainer: self.maintainer || other.maintainer,
        }
    }

    pub const fn is_empty(&self) -> bool {
        !(self.author || self.editor || self.publisher || self.maintainer)
    }
}

/// One credit as declared by a page or document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: CreditRoles,
}

impl Credit {
    /// The email address, or a `/ghost/<name>` pseudo-identity for
    /// contributors known only by name.
    pub fn identity(&self) -> String {
        match &self.email {
            Some(email) => email.clone(),
            None => ghost_identity(self.name.as_deref().unwrap_or_default()),
        }
    }
}

/// Pseudo-identity for a contributor without an email address.
pub fn ghost_identity(name: &str) -> String {
    format!("{GHOST_IDENTITY_PREFIX}{}", utf8_percent_encode(name, GHOST_ENCODE_SET))
}

/// A contributor of a unit with roles merged over all of its credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub identity: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: CreditRoles,
}

/// Merges credits by identity. The first name seen for an identity is kept;
/// roles are unioned. Sorted by identity.
pub fn aggregate_credits<'a>(credits: impl IntoIterator<Item = &'a Credit>) -> Vec<Contributor> {
    let mut by_identity: BTreeMap<String, Contributor> = BTreeMap::new();
    for credit in credits {
        let identity = credit.identity();
        let entry = by_identity.entry(identity.clone()).or_insert_with(|| Contributor {
            identity,
            name: None,
            email: credit.email.clone(),
            roles: CreditRoles::default(),
        });
        if entry.name.is_none() {
            entry.name.clone_from(&credit.name);
        }
        entry.roles = entry.roles.union(credit.roles);
    }
    by_identity.into_values().collect()
}
