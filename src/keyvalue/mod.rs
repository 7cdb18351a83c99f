//! Nested key/value document format used by store clients
//!
//! The format is a sequence of `"key" "value"` pairs where a value is either
//! a quoted string or a `{ ... }` object of further pairs. Quoted strings
//! support `\\`, `\"`, `\n` and `\t` escapes; `//` starts a line comment and
//! comments are insignificant between tokens, like whitespace. Game manifests
//! and the client's local config file both use this grammar.
//!
//! Documents are addressed by paths (sequences of keys). Keys are not
//! required to be unique by the parser; accessors and mutators always operate
//! on the first entry matching each path segment.

pub mod parser;
pub mod serializer;

pub use parser::{SyntaxError, SyntaxErrorKind};

/// A value in a key/value document: a string leaf or a nested object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Quoted string leaf
    String(String),
    /// Nested `{ ... }` object
    Object(Vec<Entry>),
}

/// One `"key" value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Entry key (unescaped)
    pub key: String,
    /// Entry value
    pub value: Value,
}

/// An ordered key/value document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Top-level entries in file order
    pub entries: Vec<Entry>,
}

impl Document {
    /// Parse a document from text.
    pub fn parse(content: &str) -> Result<Self, SyntaxError> {
        parser::Parser::new(content).parse_document()
    }

    /// Serialize to the canonical tab-indented text form.
    ///
    /// Round-trip law: `parse(serialize(parse(x)))` equals `parse(x)` as a
    /// structured document (whitespace and comments are not preserved).
    pub fn serialize(&self) -> String {
        serializer::serialize(&self.entries)
    }

    /// Look up the value at `path`, descending nested objects by first key
    /// match. Returns `None` when any segment is missing or a non-terminal
    /// segment holds a string.
    pub fn value_at(&self, path: &[&str]) -> Option<&Value> {
        Self::value_in(&self.entries, path)
    }

    /// Look up a string leaf at `path`. `None` for missing paths and for
    /// object values.
    pub fn string_at(&self, path: &[&str]) -> Option<&str> {
        match self.value_at(path) {
            Some(Value::String(text)) => Some(text),
            _ => None,
        }
    }

    /// Set a string leaf at `path`, creating intermediate objects for any
    /// missing segment.
    ///
    /// If an existing leaf occupies a prefix position it is replaced with a
    /// fresh object — destructive, but the paths written by this crate are
    /// always of known structure. An empty path is a no-op.
    pub fn set_string(&mut self, value: &str, path: &[&str]) {
        if path.is_empty() {
            return;
        }
        Self::set_string_in(&mut self.entries, path, value);
    }

    /// Remove the value at `path`.
    ///
    /// When the removal leaves the parent object empty, the parent entry is
    /// removed as well (one level per call, recursively up the unwind path).
    /// Returns whether anything was removed.
    pub fn remove_value(&mut self, path: &[&str]) -> bool {
        if path.is_empty() {
            return false;
        }
        Self::remove_value_in(&mut self.entries, path)
    }

    fn value_in<'a>(entries: &'a [Entry], path: &[&str]) -> Option<&'a Value> {
        let (head, tail) = path.split_first()?;
        let entry = entries.iter().find(|entry| entry.key == *head)?;
        if tail.is_empty() {
            return Some(&entry.value);
        }
        match &entry.value {
            Value::Object(children) => Self::value_in(children, tail),
            Value::String(_) => None,
        }
    }

    fn set_string_in(entries: &mut Vec<Entry>, path: &[&str], value: &str) {
        let Some((head, tail)) = path.split_first() else {
            return;
        };

        if tail.is_empty() {
            if let Some(entry) = entries.iter_mut().find(|entry| entry.key == *head) {
                entry.value = Value::String(value.to_string());
            } else {
                entries.push(Entry {
                    key: (*head).to_string(),
                    value: Value::String(value.to_string()),
                });
            }
            return;
        }

        if let Some(entry) = entries.iter_mut().find(|entry| entry.key == *head) {
            match &mut entry.value {
                Value::Object(children) => Self::set_string_in(children, tail, value),
                Value::String(_) => {
                    let mut children = Vec::new();
                    Self::set_string_in(&mut children, tail, value);
                    entry.value = Value::Object(children);
                }
            }
        } else {
            let mut children = Vec::new();
            Self::set_string_in(&mut children, tail, value);
            entries.push(Entry {
                key: (*head).to_string(),
                value: Value::Object(children),
            });
        }
    }

    fn remove_value_in(entries: &mut Vec<Entry>, path: &[&str]) -> bool {
        let Some((head, tail)) = path.split_first() else {
            return false;
        };
        let Some(index) = entries.iter().position(|entry| entry.key == *head) else {
            return false;
        };

        if tail.is_empty() {
            entries.remove(index);
            return true;
        }

        let Value::Object(children) = &mut entries[index].value else {
            return false;
        };

        let removed = Self::remove_value_in(children, tail);
        if removed && children.is_empty() {
            entries.remove(index);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn doc(text: &str) -> Document {
        Document::parse(text).expect("test document should parse")
    }

    #[test]
    fn test_parse_flat_pairs() {
        let document = doc("\"appid\"\t\"220\"\n\"name\"\t\"Half-Life 2\"\n");
        assert_eq!(document.string_at(&["appid"]), Some("220"));
        assert_eq!(document.string_at(&["name"]), Some("Half-Life 2"));
    }

    #[test]
    fn test_parse_nested_objects_and_comments() {
        let text = r#"
            // user-authored comment
            "Root"
            {
                "Inner"
                {
                    "leaf"  "value" // trailing comment
                }
            }
        "#;
        let document = doc(text);
        assert_eq!(document.string_at(&["Root", "Inner", "leaf"]), Some("value"));
        assert_eq!(document.string_at(&["Root", "Inner"]), None);
        assert!(matches!(
            document.value_at(&["Root", "Inner"]),
            Some(Value::Object(_))
        ));
    }

    #[test]
    fn test_first_match_wins_for_duplicate_keys() {
        let document = doc("\"k\"\t\"first\"\n\"k\"\t\"second\"\n");
        assert_eq!(document.string_at(&["k"]), Some("first"));
    }

    #[test]
    fn test_set_string_creates_intermediate_objects() {
        let mut document = Document::default();
        document.set_string("-windowed", &["Store", "apps", "220", "LaunchOptions"]);
        assert_eq!(
            document.string_at(&["Store", "apps", "220", "LaunchOptions"]),
            Some("-windowed")
        );
    }

    #[test]
    fn test_set_string_replaces_string_prefix_with_object() {
        let mut document = doc("\"apps\"\t\"oops\"\n");
        document.set_string("x", &["apps", "220", "LaunchOptions"]);
        assert_eq!(document.string_at(&["apps", "220", "LaunchOptions"]), Some("x"));
        assert_eq!(document.string_at(&["apps"]), None);
    }

    #[test]
    fn test_set_string_overwrites_existing_leaf() {
        let mut document = doc("\"a\"\n{\n\t\"b\"\t\"old\"\n}\n");
        document.set_string("new", &["a", "b"]);
        assert_eq!(document.string_at(&["a", "b"]), Some("new"));
        // No duplicate entry was appended.
        let Value::Object(children) = document.value_at(&["a"]).unwrap() else {
            panic!("expected object");
        };
        assert_eq!(children.len(), 1);
    }

    #[test]
    fn test_remove_value_prunes_empty_parents() {
        let mut document = Document::default();
        document.set_string("x", &["a", "b", "c"]);
        document.set_string("y", &["a", "d"]);

        assert!(document.remove_value(&["a", "b", "c"]));
        // "b" became empty and was pruned; "a" still holds "d".
        assert!(document.value_at(&["a", "b"]).is_none());
        assert_eq!(document.string_at(&["a", "d"]), Some("y"));

        assert!(document.remove_value(&["a", "d"]));
        assert!(document.entries.is_empty());
    }

    #[test]
    fn test_remove_value_missing_path_is_noop() {
        let mut document = doc("\"a\"\t\"1\"\n");
        assert!(!document.remove_value(&["missing"]));
        assert!(!document.remove_value(&["a", "deeper"]));
        assert_eq!(document.string_at(&["a"]), Some("1"));
    }

    #[test]
    fn test_serialize_round_trip_preserves_structure() {
        let text = "\"A\"\n{\n\t\"b\"\t\t\"1\"\n\t\"C\"\n\t{\n\t\t\"d\"\t\t\"2\"\n\t}\n}\n";
        let first = doc(text);
        let second = doc(&first.serialize());
        assert_eq!(first, second);
    }

    #[test]
    fn test_escaped_characters_survive_round_trip() {
        let mut document = Document::default();
        document.set_string("back\\slash \"quoted\"\nline\ttab", &["k"]);
        let reparsed = doc(&document.serialize());
        assert_eq!(
            reparsed.string_at(&["k"]),
            Some("back\\slash \"quoted\"\nline\ttab")
        );
    }

    proptest! {
        /// Any value written through `set_string` survives a full
        /// serialize/parse cycle at the same path.
        #[test]
        fn prop_set_string_round_trips(value in ".*", key in "[a-zA-Z0-9 _.-]{1,12}") {
            let mut document = Document::default();
            document.set_string(&value, &["Root", &key]);
            let reparsed = Document::parse(&document.serialize()).unwrap();
            prop_assert_eq!(reparsed.string_at(&["Root", &key]), Some(value.as_str()));
        }

        /// Serialization is a fixed point once parsed: parse∘serialize is
        /// the identity on parsed documents.
        #[test]
        fn prop_parse_serialize_parse_identity(
            pairs in proptest::collection::vec(("[a-z]{1,8}", ".*"), 0..8)
        ) {
            let mut document = Document::default();
            for (key, value) in &pairs {
                document.set_string(value, &["store", key]);
            }
            let reparsed = Document::parse(&document.serialize()).unwrap();
            prop_assert_eq!(&reparsed, &document);
            let again = Document::parse(&reparsed.serialize()).unwrap();
            prop_assert_eq!(again, reparsed);
        }
    }
}
