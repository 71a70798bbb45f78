//! Pattern catalog negotiation.
//!
//! Servers refuse to treat a project as configured unless it names both its
//! enabled and disabled pattern keys. Given only a target language, the lists
//! are derived from the server's catalog: a pattern is enabled when its
//! language mask shares a bit with the language group's mask.

use tracing::{debug, warn};

use crate::client::ProtocolClient;
use crate::domain::{Language, PmPattern};
use crate::error::Result;

/// Enabled and disabled pattern keys, each in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSelection {
    pub enabled: Vec<String>,
    pub disabled: Vec<String>,
}

/// Split `catalog` against `language_mask`. Patterns without a mask are
/// dropped from both lists.
pub fn partition(catalog: &[PmPattern], language_mask: u64) -> PatternSelection {
    let mut selection = PatternSelection::default();
    for pattern in catalog {
        let Some(languages) = pattern.languages else {
            warn!("Pattern programming languages is null for {}", pattern.key);
            continue;
        };
        if languages & language_mask == 0 {
            debug!("Added default disabled pattern {}", pattern.key);
            selection.disabled.push(pattern.key.clone());
        } else {
            debug!("Added default enabled pattern {}", pattern.key);
            selection.enabled.push(pattern.key.clone());
        }
    }
    selection
}

/// Fetch the catalog through `client` and partition it for `language`.
pub fn negotiate(client: &dyn ProtocolClient, language: Language) -> Result<PatternSelection> {
    let catalog = client.pattern_catalog()?;
    let selection = partition(&catalog, language.mask());
    debug!(
        "Negotiated {} enabled / {} disabled patterns for {}",
        selection.enabled.len(),
        selection.disabled.len(),
        language
    );
    Ok(selection)
}
