//! Note name to keystroke mapping table

use std::collections::HashMap;

use crate::spelling::NoteName;

/// Immutable lookup from note names ("C#", "Db", ...) to output characters.
///
/// Built once per configuration load. Keys are matched exactly and
/// case-sensitively; values are trimmed and only their first character is
/// used, so `"abc"` types `a`. Blank values count as unmapped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    entries: HashMap<String, char>,
}

impl MappingTable {
    /// Build a table from raw config strings, dropping blank values
    pub fn from_raw(raw: &HashMap<String, String>) -> Self {
        let entries = raw
            .iter()
            .filter_map(|(name, value)| {
                value
                    .trim()
                    .chars()
                    .next()
                    .map(|ch| (name.clone(), ch))
            })
            .collect();

        Self { entries }
    }

    pub fn lookup(&self, name: NoteName) -> Option<char> {
        self.lookup_str(name.as_str())
    }

    pub fn lookup_str(&self, name: &str) -> Option<char> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_lookup_exact_match() {
        let table = MappingTable::from_raw(&raw(&[("C#", "x"), ("Db", "y")]));
        assert_eq!(table.lookup_str("C#"), Some('x'));
        assert_eq!(table.lookup_str("Db"), Some('y'));
        assert_eq!(table.lookup_str("c#"), None);
        assert_eq!(table.lookup_str("D"), None);
    }

    #[test]
    fn test_blank_value_is_unmapped() {
        let table = MappingTable::from_raw(&raw(&[("C", ""), ("D", "   "), ("E", "\t\n")]));
        assert!(table.is_empty());
        assert_eq!(table.lookup_str("C"), None);
        assert_eq!(table.lookup_str("D"), None);
    }

    #[test]
    fn test_first_character_after_trim() {
        let table = MappingTable::from_raw(&raw(&[("F", "  hello "), ("G", "é")]));
        assert_eq!(table.lookup_str("F"), Some('h'));
        assert_eq!(table.lookup_str("G"), Some('é'));
        assert_eq!(table.len(), 2);
    }
}
