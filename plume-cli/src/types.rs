//! Common types used across CLI modules

use uuid::Uuid;

/// Run identifier given on the command line: a full UUID or an unambiguous prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdOrPrefix {
    /// Full UUID
    Full(Uuid),
    /// Lower-cased prefix that should match exactly one run
    Prefix(String),
}

impl IdOrPrefix {
    /// Parse user input
    ///
    /// Attempts to parse as a full UUID first, otherwise treats the trimmed,
    /// lower-cased input as a prefix.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        match Uuid::parse_str(input) {
            Ok(uuid) => IdOrPrefix::Full(uuid),
            Err(_) => IdOrPrefix::Prefix(input.to_lowercase()),
        }
    }

    /// Get the UUID if this is a full ID
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            IdOrPrefix::Full(uuid) => Some(*uuid),
            IdOrPrefix::Prefix(_) => None,
        }
    }

    /// Whether `id` is selected by this identifier
    pub fn matches(&self, id: &Uuid) -> bool {
        match self {
            IdOrPrefix::Full(uuid) => uuid == id,
            IdOrPrefix::Prefix(prefix) => id.to_string().starts_with(prefix.as_str()),
        }
    }
}

impl std::fmt::Display for IdOrPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdOrPrefix::Full(uuid) => write!(f, "{}", uuid),
            IdOrPrefix::Prefix(prefix) => write!(f, "{}", prefix),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(IdOrPrefix::parse(&id.to_string()), IdOrPrefix::Full(id));
    }

    #[test]
    fn test_parse_prefix_is_normalised() {
        let parsed = IdOrPrefix::parse(" 6F1C ");
        assert_eq!(parsed, IdOrPrefix::Prefix("6f1c".to_string()));
        assert!(parsed.as_uuid().is_none());
    }

    #[test]
    fn test_matches() {
        let id = Uuid::parse_str("6f1c1a34-2d53-4c55-9a0c-8a5f4d9b1e21").unwrap();
        assert!(IdOrPrefix::parse("6f1c").matches(&id));
        assert!(!IdOrPrefix::parse("7a").matches(&id));
        assert!(IdOrPrefix::Full(id).matches(&id));
    }
}
