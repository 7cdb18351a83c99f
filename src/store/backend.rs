//! Store backend catalog
//!
//! The four supported store clients share the whole engine and differ only
//! in fixed constants: where the client executable lives inside the bottle,
//! how the library is laid out on disk, and file/bottle naming. Each backend
//! is one [`BackendSpec`] value — there is deliberately no per-backend code.

use crate::library::LibraryLayout;

/// A supported game-store client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreBackend {
    /// Valve Steam
    Steam,
    /// Blizzard Battle.net
    BattleNet,
    /// Epic Games Launcher
    Epic,
    /// GOG Galaxy
    Gog,
}

/// One candidate location of the client executable inside the bottle's
/// `drive_c`, optionally paired with a marker file that confirms a completed
/// installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientCandidate {
    /// Executable path relative to `drive_c`
    pub executable: &'static str,
    /// Marker file relative to `drive_c`, checked before falling back to
    /// executable-only matches
    pub installed_marker: Option<&'static str>,
}

/// Library discovery constants for backends that expose a manifest-based
/// on-disk library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibrarySpec {
    /// On-disk layout under the store root
    pub layout: LibraryLayout,
    /// Config-document path prefix holding per-app launch options; the app
    /// id and the `LaunchOptions` key are appended per game
    pub launch_options_root: &'static [&'static str],
}

/// All fixed constants for one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendSpec {
    /// The backend these constants describe
    pub backend: StoreBackend,
    /// Human-readable client name for logs and reports
    pub display_name: &'static str,
    /// Path component used for per-backend directories (`prefixes/<this>`)
    pub home_component: &'static str,
    /// Profile store file name under the settings directory
    pub profile_file_name: &'static str,
    /// CrossOver bottle name used when none is configured
    pub default_bottle_name: &'static str,
    /// Environment variable overriding the bottle name
    pub bottle_env_var: &'static str,
    /// Client executable candidates, probed in order
    pub client_candidates: &'static [ClientCandidate],
    /// Manifest library constants; `None` for clients that keep their own
    /// installer database (no on-disk manifest scan is wired for them yet)
    pub library: Option<LibrarySpec>,
}

const STEAM_LAYOUT: LibraryLayout = LibraryLayout {
    manifest_dir: "steamapps",
    manifest_prefix: "appmanifest_",
    manifest_extension: "acf",
    apps_dir: "common",
    userdata_dir: "userdata",
    config_relative_path: "config/localconfig.vdf",
};

const STEAM_SPEC: BackendSpec = BackendSpec {
    backend: StoreBackend::Steam,
    display_name: "Steam",
    home_component: "steam",
    profile_file_name: "game-profiles.json",
    default_bottle_name: "bottlerack-steam",
    bottle_env_var: "BOTTLERACK_CROSSOVER_BOTTLE",
    client_candidates: &[
        ClientCandidate {
            executable: "Program Files (x86)/Steam/steam.exe",
            installed_marker: Some("Program Files (x86)/Steam/package/steam_client_win64.installed"),
        },
        ClientCandidate {
            executable: "Program Files/Steam/Steam.exe",
            installed_marker: Some("Program Files/Steam/package/steam_client_win64.installed"),
        },
    ],
    library: Some(LibrarySpec {
        layout: STEAM_LAYOUT,
        launch_options_root: &["UserLocalConfigStore", "Software", "Valve", "Steam", "apps"],
    }),
};

const BATTLE_NET_SPEC: BackendSpec = BackendSpec {
    backend: StoreBackend::BattleNet,
    display_name: "Battle.net",
    home_component: "battlenet",
    profile_file_name: "battlenet-game-profiles.json",
    default_bottle_name: "bottlerack-battlenet",
    bottle_env_var: "BOTTLERACK_CROSSOVER_BOTTLE_BATTLENET",
    client_candidates: &[ClientCandidate {
        executable: "Program Files (x86)/Battle.net/Battle.net.exe",
        installed_marker: None,
    }],
    library: None,
};

const EPIC_SPEC: BackendSpec = BackendSpec {
    backend: StoreBackend::Epic,
    display_name: "Epic Games",
    home_component: "epic",
    profile_file_name: "epic-game-profiles.json",
    default_bottle_name: "bottlerack-epic",
    bottle_env_var: "BOTTLERACK_CROSSOVER_BOTTLE_EPIC",
    client_candidates: &[ClientCandidate {
        executable:
            "Program Files (x86)/Epic Games/Launcher/Portal/Binaries/Win32/EpicGamesLauncher.exe",
        installed_marker: None,
    }],
    library: None,
};

const GOG_SPEC: BackendSpec = BackendSpec {
    backend: StoreBackend::Gog,
    display_name: "GOG Galaxy",
    home_component: "gog",
    profile_file_name: "gog-game-profiles.json",
    default_bottle_name: "bottlerack-gog",
    bottle_env_var: "BOTTLERACK_CROSSOVER_BOTTLE_GOG",
    client_candidates: &[ClientCandidate {
        executable: "Program Files (x86)/GOG Galaxy/GalaxyClient.exe",
        installed_marker: None,
    }],
    library: None,
};

impl StoreBackend {
    /// Every supported backend.
    pub const ALL: [Self; 4] = [Self::Steam, Self::BattleNet, Self::Epic, Self::Gog];

    /// The fixed constants for this backend.
    pub fn spec(self) -> BackendSpec {
        match self {
            Self::Steam => STEAM_SPEC,
            Self::BattleNet => BATTLE_NET_SPEC,
            Self::Epic => EPIC_SPEC,
            Self::Gog => GOG_SPEC,
        }
    }
}

impl BackendSpec {
    /// Config-document path for a game's launch options, or `None` for
    /// backends without a manifest library.
    pub fn launch_options_path(&self, app_id: u32) -> Option<Vec<String>> {
        let library = self.library.as_ref()?;
        let mut path: Vec<String> = library
            .launch_options_root
            .iter()
            .map(|segment| (*segment).to_string())
            .collect();
        path.push(app_id.to_string());
        path.push("LaunchOptions".to_string());
        Some(path)
    }

    /// File name of the per-user config document (e.g. `localconfig.vdf`).
    pub fn config_file_name(&self) -> Option<&'static str> {
        self.library?.layout.config_relative_path.rsplit('/').next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_backend_has_a_spec() {
        for backend in StoreBackend::ALL {
            let spec = backend.spec();
            assert_eq!(spec.backend, backend);
            assert!(!spec.client_candidates.is_empty());
            assert!(spec.default_bottle_name.starts_with("bottlerack-"));
        }
    }

    #[test]
    fn test_steam_launch_options_path() {
        let path = StoreBackend::Steam.spec().launch_options_path(220).unwrap();
        assert_eq!(
            path,
            vec![
                "UserLocalConfigStore",
                "Software",
                "Valve",
                "Steam",
                "apps",
                "220",
                "LaunchOptions",
            ]
        );
    }

    #[test]
    fn test_backends_without_library_have_no_config_paths() {
        assert!(StoreBackend::Gog.spec().launch_options_path(1).is_none());
        assert!(StoreBackend::Epic.spec().config_file_name().is_none());
        assert_eq!(
            StoreBackend::Steam.spec().config_file_name(),
            Some("localconfig.vdf")
        );
    }

    #[test]
    fn test_profile_files_are_distinct() {
        let names: std::collections::HashSet<&str> = StoreBackend::ALL
            .iter()
            .map(|backend| backend.spec().profile_file_name)
            .collect();
        assert_eq!(names.len(), StoreBackend::ALL.len());
    }
}
