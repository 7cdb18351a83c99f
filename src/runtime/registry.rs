//! Compatibility-layer registry access
//!
//! One fixed hive path holds a `REG_SZ` value per executable Windows path;
//! the value data is a space-separated set of compatibility flag tokens.
//! Everything goes through the bottle's `reg` tool as a subprocess.
//!
//! A legacy quirk is preserved deliberately: old releases wrote value names
//! with doubled backslashes. Reads fall back to the escaped name, writes
//! delete the escaped variant first, and removals delete both. This keeps
//! registries written by those releases converging instead of accumulating
//! stale entries.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Result;
use crate::runtime::runner::RegistryRunner;

/// Hive path holding one value per managed executable.
pub const COMPAT_LAYERS_HIVE: &str =
    r"HKCU\Software\Microsoft\Windows NT\CurrentVersion\AppCompatFlags\Layers";

/// Registry value type marker in `reg query` output.
const VALUE_TYPE: &str = "REG_SZ";

/// Wrapper over the bottle's `reg` tool for the compat-layers hive.
pub struct CompatLayerRegistry {
    runner: Arc<dyn RegistryRunner>,
}

impl CompatLayerRegistry {
    /// Create a registry wrapper over `runner`.
    pub fn new(runner: Arc<dyn RegistryRunner>) -> Self {
        Self { runner }
    }

    /// Read every value under the hive as `value name -> value data`.
    ///
    /// A missing hive key is an empty mapping, not an error — the hive only
    /// exists once something wrote to it.
    pub fn query_all(&self) -> Result<HashMap<String, String>> {
        let result = self.runner.run_registry_command(&[
            "reg".to_string(),
            "query".to_string(),
            COMPAT_LAYERS_HIVE.to_string(),
        ]);
        let output = match result {
            Ok(output) => output,
            Err(error) if error.is_missing_registry_object() => return Ok(HashMap::new()),
            Err(error) => return Err(error),
        };

        let mut values = HashMap::new();
        for line in output.output.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("HKEY_") {
                continue;
            }
            // Split on the first occurrence of the type marker; the value
            // name may itself contain spaces.
            let Some(marker_start) = trimmed.find(VALUE_TYPE) else {
                continue;
            };
            let value_name = trimmed[..marker_start].trim();
            let value_data = trimmed[marker_start + VALUE_TYPE.len()..].trim();
            if !value_name.is_empty() {
                values.insert(value_name.to_string(), value_data.to_string());
            }
        }
        debug!(count = values.len(), "Queried compat-layer registry values");
        Ok(values)
    }

    /// Write `flags_value` for `windows_executable_path`, migrating away any
    /// legacy escaped-name variant first.
    pub fn set_flags(&self, windows_executable_path: &str, flags_value: &str) -> Result<()> {
        let escaped = escaped_value_name(windows_executable_path);
        if escaped != windows_executable_path {
            self.delete_value(&escaped)?;
        }

        self.runner.run_registry_command(&[
            "reg".to_string(),
            "add".to_string(),
            COMPAT_LAYERS_HIVE.to_string(),
            "/v".to_string(),
            windows_executable_path.to_string(),
            "/t".to_string(),
            VALUE_TYPE.to_string(),
            "/d".to_string(),
            flags_value.to_string(),
            "/f".to_string(),
        ])?;
        info!(executable = windows_executable_path, flags = flags_value, "Compat flags written");
        Ok(())
    }

    /// Delete the value for `windows_executable_path`, both the canonical
    /// and the legacy escaped name. Missing values are not errors.
    pub fn remove_flags(&self, windows_executable_path: &str) -> Result<()> {
        self.delete_value(windows_executable_path)?;
        let escaped = escaped_value_name(windows_executable_path);
        if escaped != windows_executable_path {
            self.delete_value(&escaped)?;
        }
        info!(executable = windows_executable_path, "Compat flags removed");
        Ok(())
    }

    fn delete_value(&self, value_name: &str) -> Result<()> {
        let result = self.runner.run_registry_command(&[
            "reg".to_string(),
            "delete".to_string(),
            COMPAT_LAYERS_HIVE.to_string(),
            "/v".to_string(),
            value_name.to_string(),
            "/f".to_string(),
        ]);
        match result {
            Ok(_) => Ok(()),
            // Deleting an absent value is fine when resetting a profile.
            Err(error) if error.is_missing_registry_object() => Ok(()),
            Err(error) => Err(error),
        }
    }
}

/// The doubled-backslash value name old releases wrote.
pub fn escaped_value_name(windows_executable_path: &str) -> String {
    windows_executable_path.replace('\\', "\\\\")
}

/// Split a flags value into its token set. Comparison of desired vs current
/// flags is set-based — token order is irrelevant.
pub fn flag_set(flags_value: &str) -> HashSet<String> {
    flags_value.split_whitespace().map(str::to_string).collect()
}
