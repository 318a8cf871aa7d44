//! Fixed label catalog

use crate::archive::Archival;
use crate::error::ModelError;
use crate::id::LabelId;
use serde::{Deserialize, Serialize};

/// The only labels that may exist: (name, default colour)
pub const DEFAULT_LABELS: [(&str, &str); 3] = [
    ("Completed", "#309E44"),
    ("Incomplete", "#E03231"),
    ("In Progress", "#F08C00"),
];

/// Task label. Names are immutable; only the colour can change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub archival: Archival,
}

impl Label {
    /// Whether the name is one of the fixed catalog entries
    #[must_use]
    pub fn is_default(&self) -> bool {
        DEFAULT_LABELS.iter().any(|(name, _)| *name == self.name)
    }
}

/// Validate a `#RRGGBB` colour and return it upper-cased
///
/// # Errors
/// `ModelError::Validation` on the `color` field for anything else.
pub fn normalize_color(raw: &str) -> Result<String, ModelError> {
    let raw = raw.trim();
    let valid = raw.len() == 7
        && raw.starts_with('#')
        && raw[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(raw.to_ascii_uppercase())
    } else {
        Err(ModelError::field("color", format!("'{raw}' is not a #RRGGBB colour")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colours() {
        assert_eq!(normalize_color("#37b24d").unwrap(), "#37B24D");
        assert_eq!(normalize_color(" #F03E3E ").unwrap(), "#F03E3E");
        assert!(normalize_color("37B24D").is_err());
        assert!(normalize_color("#37B24").is_err());
        assert!(normalize_color("#GGGGGG").is_err());
    }

    #[test]
    fn default_detection() {
        let label = Label {
            id: LabelId(1),
            name: "In Progress".into(),
            color: "#F08C00".into(),
            archival: Archival::active(),
        };
        assert!(label.is_default());

        let rogue = Label {
            name: "Urgent".into(),
            ..label
        };
        assert!(!rogue.is_default());
    }
}
