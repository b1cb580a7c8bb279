//! Group metadata update descriptor.

use serde::{Deserialize, Serialize};

/// Optional-field update for group properties.
///
/// `None` leaves a property unchanged. `Some` sets it explicitly, including
/// `Some(false)` for the two flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    /// `true` → closed (join requests need approval), `false` → open.
    #[serde(default)]
    pub closed: Option<bool>,
    /// `true` → private (only members read), `false` → public.
    #[serde(default)]
    pub private: Option<bool>,
}

impl EditMetadata {
    /// Returns `true` when no property would be changed.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.about.is_none()
            && self.picture.is_none()
            && self.closed.is_none()
            && self.private.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_deserialize_as_unchanged() {
        let meta: EditMetadata = serde_json::from_str(r#"{"name":"Pizza","closed":false}"#).unwrap();
        assert_eq!(meta.name.as_deref(), Some("Pizza"));
        assert_eq!(meta.closed, Some(false));
        assert!(meta.about.is_none());
        assert!(meta.private.is_none());
        assert!(!meta.is_empty());
        assert!(EditMetadata::default().is_empty());
    }
}
