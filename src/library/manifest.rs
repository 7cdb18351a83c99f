//! Per-game manifest parsing
//!
//! A manifest is a key/value document with an `AppState` top-level object
//! naming the app id, display name, and install directory name.

use crate::keyvalue::{Document, SyntaxError, Value};

/// The fields this engine needs from a game manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppManifest {
    /// Store app id
    pub app_id: u32,
    /// Display name
    pub name: String,
    /// Install directory name under the store's common-apps directory
    pub install_directory_name: String,
}

impl AppManifest {
    /// Parse manifest text. Returns `Ok(None)` when the document parses but
    /// the expected fields are missing or malformed — the library scan
    /// skips such manifests rather than failing.
    pub fn parse(contents: &str) -> Result<Option<Self>, SyntaxError> {
        let document = Document::parse(contents)?;
        let Some(Value::Object(app_state)) = document.value_at(&["AppState"]) else {
            return Ok(None);
        };

        let app_state = Document {
            entries: app_state.clone(),
        };
        let Some(app_id) = app_state
            .string_at(&["appid"])
            .and_then(|text| text.parse::<u32>().ok())
        else {
            return Ok(None);
        };
        let Some(name) = app_state.string_at(&["name"]) else {
            return Ok(None);
        };
        let Some(install_directory_name) = app_state.string_at(&["installdir"]) else {
            return Ok(None);
        };

        Ok(Some(Self {
            app_id,
            name: name.to_string(),
            install_directory_name: install_directory_name.to_string(),
        }))
    }
}
