//! Gettext catalog (PO/POT) reader and completeness statistics.
//!
//! Only what the statistics need is kept: message ids, translations, and the
//! fuzzy flag. Obsolete (`#~`) entries and the header entry (empty `msgid`
//! without context) are not counted.

use serde::{Deserialize, Serialize};

use crate::constants::IMAGE_MSGID_PREFIX;
use crate::core::SweepError;

/// One catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub context: Option<String>,
    pub msgid: String,
    pub msgid_plural: Option<String>,
    pub msgstr: Vec<String>,
    pub fuzzy: bool,
}

impl Message {
    pub fn is_header(&self) -> bool {
        self.context.is_none() && self.msgid.is_empty()
    }

    /// Messages that reference an image rather than text.
    pub fn is_image(&self) -> bool {
        self.msgid.starts_with(IMAGE_MSGID_PREFIX)
    }

    pub fn is_translated(&self) -> bool {
        !self.fuzzy && !self.msgstr.is_empty() && self.msgstr.iter().all(|s| !s.is_empty())
    }
}

/// Translated / fuzzy / untranslated counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCounts {
    pub translated: usize,
    pub fuzzy: usize,
    pub untranslated: usize,
}

impl MessageCounts {
    pub const fn total(&self) -> usize {
        self.translated + self.fuzzy + self.untranslated
    }

    fn add(&mut self, message: &Message) {
        if message.fuzzy {
            self.fuzzy += 1;
        } else if message.is_translated() {
            self.translated += 1;
        } else {
            self.untranslated += 1;
        }
    }
}

/// Completeness of one catalog, overall and restricted to image messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub messages: MessageCounts,
    pub images: MessageCounts,
}

/// Parsed catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    messages: Vec<Message>,
}

/// Upper bound on `msgstr[N]` indices.
const MAX_PLURAL_FORMS: usize = 256;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Context,
    Id,
    IdPlural,
    Str(usize),
}

#[derive(Default)]
struct Pending {
    message: Message,
    last: Option<Field>,
    seen_msgstr: bool,
    started: bool,
}

impl Catalog {
    /// Parses catalog text. `source_name` is only used in error messages.
    pub fn parse(text: &str, source_name: &str) -> Result<Self, SweepError> {
        let mut messages = Vec::new();
        let mut pending = Pending::default();

        let flush = |pending: &mut Pending, messages: &mut Vec<Message>| {
            let done = std::mem::take(pending);
            if done.started {
                messages.push(done.message);
            }
        };

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            let lineno = index + 1;

            if line.is_empty() {
                flush(&mut pending, &mut messages);
                continue;
            }
            if line.starts_with("#~") {
                continue;
            }
            if let Some(flags) = line.strip_prefix("#,") {
                if pending.seen_msgstr {
                    flush(&mut pending, &mut messages);
                }
                if flags.split(',').any(|f| f.trim() == "fuzzy") {
                    pending.message.fuzzy = true;
                }
                continue;
            }
            if line.starts_with('#') {
                if pending.seen_msgstr {
                    flush(&mut pending, &mut messages);
                }
                continue;
            }

            if line.starts_with('"') {
                let value = unquote(line)
                    .ok_or_else(|| SweepError::parse(source_name, format!("line {lineno}: bad string")))?;
                let field = pending.last.ok_or_else(|| {
                    SweepError::parse(source_name, format!("line {lineno}: string outside of an entry"))
                })?;
                field_mut(&mut pending.message, field).push_str(&value);
                continue;
            }

            let (keyword, rest) = line.split_once(char::is_whitespace).ok_or_else(|| {
                SweepError::parse(source_name, format!("line {lineno}: expected keyword and string"))
            })?;
            let value = unquote(rest.trim())
                .ok_or_else(|| SweepError::parse(source_name, format!("line {lineno}: bad string")))?;

            let field = match keyword {
                "msgctxt" => Field::Context,
                "msgid" => Field::Id,
                "msgid_plural" => Field::IdPlural,
                "msgstr" => Field::Str(0),
                other => match other.strip_prefix("msgstr[").and_then(|s| s.strip_suffix(']')) {
                    Some(n) => {
                        let index = n.parse().ok().filter(|&n| n < MAX_PLURAL_FORMS);
                        Field::Str(index.ok_or_else(|| {
                            SweepError::parse(source_name, format!("line {lineno}: bad plural index"))
                        })?)
                    }
                    None => {
                        return Err(SweepError::parse(
                            source_name,
                            format!("line {lineno}: unknown keyword '{other}'"),
                        ));
                    }
                },
            };

            // A new msgctxt/msgid after a msgstr starts the next entry
            if matches!(field, Field::Context | Field::Id) && pending.seen_msgstr {
                flush(&mut pending, &mut messages);
            }

            pending.started = true;
            if let Field::Str(_) = field {
                pending.seen_msgstr = true;
            }
            *field_mut(&mut pending.message, field) = value;
            pending.last = Some(field);
        }
        flush(&mut pending, &mut messages);

        Ok(Self {
            messages,
        })
    }

    /// Entries other than the header.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| !m.is_header())
    }

    pub fn message_count(&self) -> usize {
        self.messages().count()
    }

    pub fn stats(&self) -> CatalogStats {
        let mut stats = CatalogStats::default();
        for message in self.messages() {
            stats.messages.add(message);
            if message.is_image() {
                stats.images.add(message);
            }
        }
        stats
    }
}

fn field_mut(message: &mut Message, field: Field) -> &mut String {
    match field {
        Field::Context => message.context.get_or_insert_with(String::new),
        Field::Id => &mut message.msgid,
        Field::IdPlural => message.msgid_plural.get_or_insert_with(String::new),
        Field::Str(n) => {
            if message.msgstr.len() <= n {
                message.msgstr.resize(n + 1, String::new());
            }
            &mut message.msgstr[n]
        }
    }
}

fn unquote(text: &str) -> Option<String> {
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            other => out.push(other),
        }
    }
    Some(out)
}
