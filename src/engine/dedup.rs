//! Duplicate suppression for extracted replies.

use crate::textutil::prefix_by_chars;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Characters of reply text that feed the fingerprint.
pub const DEFAULT_PREFIX_CHARS: usize = 200;
/// Ledger size that triggers a full clear.
pub const DEFAULT_LEDGER_CEILING: usize = 200;

/// Hash over a bounded prefix of the reply.
///
/// Long replies that get re-rendered with a different tail (re-wrapped or
/// cut by the capture window) still map to the same fingerprint.
pub fn fingerprint(text: &str, prefix_chars: usize) -> String {
    let digest = Sha256::digest(prefix_by_chars(text, prefix_chars).as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Per-session set of fingerprints already delivered.
///
/// Memory is bounded by clearing the whole set once it grows past the
/// ceiling. A reply delivered right before a clear can be delivered once
/// more if it is extracted again; that window is accepted.
#[derive(Debug, Clone)]
pub struct DedupLedger {
    seen: HashSet<String>,
    prefix_chars: usize,
    ceiling: usize,
}

impl Default for DedupLedger {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX_CHARS, DEFAULT_LEDGER_CEILING)
    }
}

impl DedupLedger {
    pub fn new(prefix_chars: usize, ceiling: usize) -> Self {
        Self {
            seen: HashSet::new(),
            prefix_chars: prefix_chars.max(1),
            ceiling: ceiling.max(1),
        }
    }

    /// Record `text`; returns its fingerprint when it was not seen before.
    pub fn admit(&mut self, text: &str) -> Option<String> {
        let print = fingerprint(text, self.prefix_chars);
        if self.seen.contains(&print) {
            return None;
        }
        self.seen.insert(print.clone());
        if self.seen.len() > self.ceiling {
            tracing::debug!(ceiling = self.ceiling, "dedup ledger full, clearing");
            self.seen.clear();
        }
        Some(print)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
