//! Global constants used throughout the blip-sweep codebase.
//!
//! Timeouts, file names, and protocol constants shared by more than one
//! module live here so they are discoverable in one place.

use std::time::Duration;

/// Default timeout for a single external tool invocation (300 seconds).
///
/// `intltool-update -p` over a large module can take minutes; anything longer
/// is treated as a hung tool.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(300);

/// File name of the persisted sweep state inside the state directory.
pub const STATE_FILE_NAME: &str = "sweep-state.json";

/// Lock name guarding the state file for the duration of a run.
pub const STATE_LOCK_NAME: &str = "sweep-state";

/// Namespace of Mallard 1.0 documents.
pub const MALLARD_NS: &str = "http://projectmallard.org/1.0/";

/// File name of the rendered topic link graph of a documentation unit.
pub const TOPIC_GRAPH_FILE: &str = "topiclinks.svg";

/// Prefix identifying image references among catalog messages.
pub const IMAGE_MSGID_PREFIX: &str = "@@image:";

/// Prefix of synthesized identities for contributors without an email address.
pub const GHOST_IDENTITY_PREFIX: &str = "/ghost/";
