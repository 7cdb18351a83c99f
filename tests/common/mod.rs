//! Shared integration-test fixtures: a fake Steam install inside a bottle
//! and a scripted in-memory registry.
#![allow(dead_code)] // not every test binary uses every fixture helper

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempDir;

use bottlerack::error::{Error, Result};
use bottlerack::runtime::{CommandOutput, RegistryRunner};
use bottlerack::store::{StoreBackend, StoreManager};

/// In-memory registry emulating the bottle's `reg` tool. Interprets
/// `reg query|add|delete` against a value map and records every command.
#[derive(Default)]
pub struct FakeRegistry {
    state: Mutex<FakeRegistryState>,
}

#[derive(Default)]
struct FakeRegistryState {
    values: HashMap<String, String>,
    calls: Vec<Vec<String>>,
}

impl FakeRegistry {
    pub fn values(&self) -> HashMap<String, String> {
        self.state.lock().values.clone()
    }

    /// Drain the recorded command log.
    pub fn take_calls(&self) -> Vec<Vec<String>> {
        std::mem::take(&mut self.state.lock().calls)
    }

    fn missing_object_error(command: &str) -> Error {
        Error::CommandFailed {
            command: command.to_string(),
            status: 1,
            output: "ERROR: The system was unable to find the specified registry key or value"
                .to_string(),
        }
    }
}

impl RegistryRunner for FakeRegistry {
    fn run_registry_command(&self, args: &[String]) -> Result<CommandOutput> {
        let mut state = self.state.lock();
        state.calls.push(args.to_vec());
        let command = args.join(" ");

        match args.get(1).map(String::as_str) {
            Some("query") => {
                if state.values.is_empty() {
                    return Err(Self::missing_object_error(&command));
                }
                let mut lines = vec!["HKEY_CURRENT_USER\\Software\\...".to_string()];
                let mut names: Vec<&String> = state.values.keys().collect();
                names.sort();
                for name in names {
                    lines.push(format!("    {}    REG_SZ    {}", name, state.values[name]));
                }
                Ok(CommandOutput {
                    command,
                    output: lines.join("\n"),
                })
            }
            Some("add") => {
                let name_index = args.iter().position(|a| a == "/v").unwrap() + 1;
                let data_index = args.iter().position(|a| a == "/d").unwrap() + 1;
                let name = args[name_index].clone();
                let data = args[data_index].clone();
                state.values.insert(name, data);
                Ok(CommandOutput {
                    command,
                    output: String::new(),
                })
            }
            Some("delete") => {
                let name_index = args.iter().position(|a| a == "/v").unwrap() + 1;
                if state.values.remove(&args[name_index]).is_none() {
                    return Err(Self::missing_object_error(&command));
                }
                Ok(CommandOutput {
                    command,
                    output: String::new(),
                })
            }
            _ => panic!("unexpected registry command: {command}"),
        }
    }
}

/// A fake Steam install inside a CrossOver-style bottle, plus an app home.
pub struct SteamFixture {
    pub home: TempDir,
    pub bottle: TempDir,
    pub store_root: PathBuf,
}

impl SteamFixture {
    pub fn new() -> Self {
        let home = tempfile::tempdir().unwrap();
        let bottle = tempfile::tempdir().unwrap();

        let store_root = bottle
            .path()
            .join("drive_c")
            .join("Program Files (x86)")
            .join("Steam");
        std::fs::create_dir_all(store_root.join("package")).unwrap();
        std::fs::write(store_root.join("steam.exe"), b"MZ").unwrap();
        std::fs::write(
            store_root.join("package").join("steam_client_win64.installed"),
            b"",
        )
        .unwrap();
        std::fs::create_dir_all(store_root.join("steamapps").join("common")).unwrap();
        std::fs::create_dir_all(store_root.join("userdata")).unwrap();

        Self {
            home,
            bottle,
            store_root,
        }
    }

    /// Add a manifest plus an install directory with the given executables.
    pub fn add_game(&self, app_id: u32, name: &str, installdir: &str, executables: &[&str]) {
        let steamapps = self.store_root.join("steamapps");
        let manifest = format!(
            "\"AppState\"\n{{\n\t\"appid\"\t\t\"{app_id}\"\n\t\"name\"\t\t\"{name}\"\n\t\"installdir\"\t\t\"{installdir}\"\n}}\n"
        );
        std::fs::write(steamapps.join(format!("appmanifest_{app_id}.acf")), manifest).unwrap();

        let install_dir = steamapps.join("common").join(installdir);
        for executable in executables {
            let path = install_dir.join(executable);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, b"MZ").unwrap();
        }
    }

    /// Write a per-user localconfig.vdf, optionally with existing launch
    /// options for one app, and return its path.
    pub fn add_localconfig(&self, user_id: &str, options: Option<(u32, &str)>) -> PathBuf {
        let config_dir = self.store_root.join("userdata").join(user_id).join("config");
        std::fs::create_dir_all(&config_dir).unwrap();
        let config_path = config_dir.join("localconfig.vdf");

        let apps_block = match options {
            Some((app_id, value)) => format!(
                "\t\t\t\t\"apps\"\n\t\t\t\t{{\n\t\t\t\t\t\"{app_id}\"\n\t\t\t\t\t{{\n\t\t\t\t\t\t\"LaunchOptions\"\t\t\"{value}\"\n\t\t\t\t\t}}\n\t\t\t\t}}\n"
            ),
            None => String::new(),
        };
        let content = format!(
            "\"UserLocalConfigStore\"\n{{\n\t\"Software\"\n\t{{\n\t\t\"Valve\"\n\t\t{{\n\t\t\t\"Steam\"\n\t\t\t{{\n{apps_block}\t\t\t}}\n\t\t}}\n\t}}\n\t\"friends\"\n\t{{\n\t\t\"VoiceReceiveVolume\"\t\t\"0.8\"\n\t}}\n}}\n"
        );
        std::fs::write(&config_path, content).unwrap();
        config_path
    }

    /// Build a manager over this fixture with the given fake registry.
    pub fn manager(&self, registry: Arc<FakeRegistry>) -> StoreManager {
        StoreManager::with_home(StoreBackend::Steam, self.home.path().join("Bottlerack"))
            .with_bottle_path(self.bottle.path().to_path_buf())
            .with_runner(registry)
    }
}
