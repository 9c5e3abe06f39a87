//! Value-type categories and mutation kinds

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of value stored under a key
///
/// The engine dispatches notifications per category, so a listener that
/// wants to see every mutation has to register once for each entry of
/// [`ValueKind::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Number,
    Object,
    Array,
    Boolean,
}

impl ValueKind {
    /// Every category, in registration order
    pub const ALL: [ValueKind; 5] = [
        ValueKind::String,
        ValueKind::Number,
        ValueKind::Object,
        ValueKind::Array,
        ValueKind::Boolean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Object => "object",
            ValueKind::Array => "array",
            ValueKind::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of mutation a listener is notified about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    /// A value was written under a key
    Write,
    /// A key was removed
    Delete,
}

impl MutationKind {
    pub const ALL: [MutationKind; 2] = [MutationKind::Write, MutationKind::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Write => "write",
            MutationKind::Delete => "delete",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_kinds_are_distinct() {
        let mut kinds = ValueKind::ALL.to_vec();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), ValueKind::ALL.len());
    }

    #[test]
    fn test_registration_order() {
        let names: Vec<_> = ValueKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names, ["string", "number", "object", "array", "boolean"]);
    }

    #[test]
    fn test_mutation_kind_display() {
        assert_eq!(MutationKind::Write.to_string(), "write");
        assert_eq!(MutationKind::Delete.to_string(), "delete");
    }

    #[test]
    fn test_mutation_kind_display_matches_serde() {
        for mutation in MutationKind::ALL {
            let json = serde_json::to_string(&mutation).unwrap();
            assert_eq!(json, format!("\"{mutation}\""));
        }
    }

    #[test]
    fn test_value_kind_serde_lowercase() {
        let json = serde_json::to_string(&ValueKind::Boolean).unwrap();
        assert_eq!(json, "\"boolean\"");
        let kind: ValueKind = serde_json::from_str("\"array\"").unwrap();
        assert_eq!(kind, ValueKind::Array);
    }
}
