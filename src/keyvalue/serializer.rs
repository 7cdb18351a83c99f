//! Canonical serializer for key/value documents
//!
//! Emits the tab-indented form the store client itself writes: string
//! entries as `"key"\t\t"value"`, object entries as a key line followed by a
//! braced, one-level-deeper block. Comments and original whitespace are not
//! reproduced — the parser treats them as trivia.

use super::{Entry, Value};

/// Serialize `entries` as a complete document.
pub fn serialize(entries: &[Entry]) -> String {
    let mut output = String::new();
    for entry in entries {
        serialize_entry(entry, 0, &mut output);
    }
    output
}

fn serialize_entry(entry: &Entry, indent: usize, output: &mut String) {
    let indentation = "\t".repeat(indent);
    match &entry.value {
        Value::String(value) => {
            output.push_str(&format!(
                "{indentation}\"{}\"\t\t\"{}\"\n",
                escape(&entry.key),
                escape(value)
            ));
        }
        Value::Object(children) => {
            output.push_str(&format!("{indentation}\"{}\"\n", escape(&entry.key)));
            output.push_str(&format!("{indentation}{{\n"));
            for child in children {
                serialize_entry(child, indent + 1, output);
            }
            output.push_str(&format!("{indentation}}}\n"));
        }
    }
}

/// Escape the four characters the grammar gives special meaning.
fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
}
