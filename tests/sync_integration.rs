//! End-to-end synchronization tests over a fake Steam bottle and a scripted
//! registry: profile saves and removals must reconcile both external stores,
//! idempotently, without letting one bad file abort a batch.

mod common;

use std::sync::Arc;

use anyhow::Result;

use bottlerack::profile::{CompatibilityMode, CompatibilityProfile, ReducedColorMode};
use bottlerack::store::{StoreBackend, StoreManager};
use common::{FakeRegistry, SteamFixture};

const HL2_WINDOWS_EXE: &str =
    "C:\\Program Files (x86)\\Steam\\steamapps\\common\\Half-Life 2\\hl2.exe";

fn windowed_profile(app_id: u32) -> CompatibilityProfile {
    let mut profile = CompatibilityProfile::defaults(app_id, None);
    profile.force_windowed = true;
    profile.compatibility_mode = CompatibilityMode::Windows7;
    profile.reduced_color_mode = ReducedColorMode::Colors256;
    profile
}

#[test]
fn save_profile_updates_config_and_registry() -> Result<()> {
    let fixture = SteamFixture::new();
    fixture.add_game(220, "Half-Life 2", "Half-Life 2", &["hl2.exe", "uninstall.exe"]);
    let config_path = fixture.add_localconfig("1001", Some((220, "-novid")));

    let registry = Arc::new(FakeRegistry::default());
    let manager = fixture.manager(Arc::clone(&registry));

    let summary = manager.save_profile(windowed_profile(220))?;
    assert!(summary.starts_with("Profile saved for AppID 220."));
    assert!(summary.contains("[LaunchOptions] AppID 220 updated in"));
    assert!(summary.contains("[CompatLayer] AppID 220: flags applied (WIN7RTM 256COLOR)."));

    // Managed segment appended after the user's own options.
    let config = std::fs::read_to_string(&config_path)?;
    assert!(config.contains("-novid __BOTTLERACK_PROFILE_BEGIN__ -windowed __BOTTLERACK_PROFILE_END__"));
    // Unrelated sibling entries survive the rewrite.
    assert!(config.contains("VoiceReceiveVolume"));

    // Registry got exactly the composed flag value for the resolved exe.
    let values = registry.values();
    assert_eq!(values.len(), 1);
    assert_eq!(values[HL2_WINDOWS_EXE], "WIN7RTM 256COLOR");

    // The profile store exists and holds the one profile.
    let state = manager.game_library_state(false);
    assert_eq!(state.profiles.len(), 1);
    assert_eq!(state.profiles[0].app_id, 220);
    Ok(())
}

#[test]
fn second_synchronization_is_a_no_op() -> Result<()> {
    let fixture = SteamFixture::new();
    fixture.add_game(220, "Half-Life 2", "Half-Life 2", &["hl2.exe"]);
    let config_path = fixture.add_localconfig("1001", Some((220, "-novid")));

    let registry = Arc::new(FakeRegistry::default());
    let manager = fixture.manager(Arc::clone(&registry));

    manager.save_profile(windowed_profile(220))?;
    let config_after_first = std::fs::read_to_string(&config_path)?;
    registry.take_calls();

    // Nothing changed since the save: the pass must not write anything.
    let logs = manager.synchronize_all()?;
    assert!(logs.is_empty(), "unexpected log lines: {logs:?}");
    assert_eq!(std::fs::read_to_string(&config_path)?, config_after_first);

    let call_kinds: Vec<String> = registry
        .take_calls()
        .into_iter()
        .map(|call| call[1].clone())
        .collect();
    assert_eq!(call_kinds, vec!["query"], "only the state query may run");
    Ok(())
}

#[test]
fn remove_profile_clears_both_stores() -> Result<()> {
    let fixture = SteamFixture::new();
    fixture.add_game(220, "Half-Life 2", "Half-Life 2", &["hl2.exe"]);
    let config_path = fixture.add_localconfig("1001", Some((220, "-novid")));

    let registry = Arc::new(FakeRegistry::default());
    let manager = fixture.manager(Arc::clone(&registry));

    manager.save_profile(windowed_profile(220))?;
    assert!(!registry.values().is_empty());

    let summary = manager.remove_profile(220)?;
    assert!(summary.starts_with("Profile removed for AppID 220."));
    assert!(summary.contains("[CompatLayer] AppID 220: compatibility flags removed."));

    // Managed segment gone, user options intact, registry empty.
    let config = std::fs::read_to_string(&config_path)?;
    assert!(!config.contains("__BOTTLERACK_PROFILE_BEGIN__"));
    assert!(config.contains("-novid"));
    assert!(registry.values().is_empty());
    assert!(manager.game_library_state(false).profiles.is_empty());
    Ok(())
}

#[test]
fn empty_launch_options_key_is_removed_not_emptied() -> Result<()> {
    let fixture = SteamFixture::new();
    fixture.add_game(220, "Half-Life 2", "Half-Life 2", &["hl2.exe"]);
    // The only content of LaunchOptions is a stale managed segment.
    let config_path = fixture.add_localconfig(
        "1001",
        Some((220, "__BOTTLERACK_PROFILE_BEGIN__ -windowed __BOTTLERACK_PROFILE_END__")),
    );

    let registry = Arc::new(FakeRegistry::default());
    let manager = fixture.manager(registry);

    // A profile with only registry-side overrides: no managed segment.
    let mut profile = CompatibilityProfile::defaults(220, None);
    profile.run_as_admin = true;
    manager.save_profile(profile)?;

    let config = std::fs::read_to_string(&config_path)?;
    assert!(!config.contains("LaunchOptions"));
    Ok(())
}

#[test]
fn one_bad_config_file_does_not_abort_the_batch() -> Result<()> {
    let fixture = SteamFixture::new();
    fixture.add_game(220, "Half-Life 2", "Half-Life 2", &["hl2.exe"]);
    let good_path = fixture.add_localconfig("1001", Some((220, "-novid")));
    let bad_path = fixture.add_localconfig("2002", None);
    std::fs::write(&bad_path, "\"UserLocalConfigStore\"\n{ truncated")?;

    let registry = Arc::new(FakeRegistry::default());
    let manager = fixture.manager(Arc::clone(&registry));

    let summary = manager.save_profile(windowed_profile(220))?;
    assert!(summary.contains(&format!("[LaunchOptions] AppID 220 updated in {}", good_path.display())));
    assert!(summary.contains(&format!("failed in {}", bad_path.display())));

    // The registry phase still ran despite the bad file.
    assert_eq!(registry.values().len(), 1);
    Ok(())
}

#[test]
fn unresolvable_executable_is_logged_per_app() -> Result<()> {
    let fixture = SteamFixture::new();
    // Manifest exists but the install directory holds no executables.
    fixture.add_game(730, "Counter-Strike 2", "Counter-Strike 2", &[]);
    fixture.add_localconfig("1001", None);

    let registry = Arc::new(FakeRegistry::default());
    let manager = fixture.manager(Arc::clone(&registry));

    let mut profile = CompatibilityProfile::defaults(730, None);
    profile.run_as_admin = true;
    let summary = manager.save_profile(profile)?;
    assert!(summary.contains("[CompatLayer] AppID 730: could not resolve executable to apply flags."));
    assert!(registry.values().is_empty());
    Ok(())
}

#[test]
fn explicit_executable_choice_wins_over_default() -> Result<()> {
    let fixture = SteamFixture::new();
    fixture.add_game(
        1091500,
        "Cyberpunk 2077",
        "Cyberpunk 2077",
        &["bin/x64/Cyberpunk2077.exe", "REDprelauncher.exe"],
    );
    fixture.add_localconfig("1001", None);

    let registry = Arc::new(FakeRegistry::default());
    let manager = fixture.manager(Arc::clone(&registry));

    let mut profile = CompatibilityProfile::defaults(1091500, None);
    profile.executable_relative_path = Some("bin/x64/Cyberpunk2077.exe".to_string());
    profile.compatibility_mode = CompatibilityMode::Windows8;
    manager.save_profile(profile)?;

    let values = registry.values();
    let key = values.keys().next().unwrap();
    assert!(key.ends_with("bin\\x64\\Cyberpunk2077.exe"));
    assert_eq!(values[key], "WIN8RTM");
    Ok(())
}

#[test]
fn missing_client_reports_and_keeps_profile() -> Result<()> {
    let home = tempfile::tempdir()?;
    let empty_bottle = tempfile::tempdir()?;
    let registry = Arc::new(FakeRegistry::default());
    let manager = StoreManager::with_home(StoreBackend::Steam, home.path().join("Bottlerack"))
        .with_bottle_path(empty_bottle.path().to_path_buf())
        .with_runner(registry);

    let summary = manager.save_profile(windowed_profile(220))?;
    assert!(summary.contains("Steam not found: profile saved"));
    // Persisted even though nothing could be reconciled.
    assert_eq!(manager.game_library_state(false).profiles.len(), 1);
    Ok(())
}

#[test]
fn saving_a_default_profile_is_a_reset() -> Result<()> {
    let fixture = SteamFixture::new();
    fixture.add_game(220, "Half-Life 2", "Half-Life 2", &["hl2.exe"]);
    fixture.add_localconfig("1001", None);

    let registry = Arc::new(FakeRegistry::default());
    let manager = fixture.manager(registry);

    manager.save_profile(windowed_profile(220))?;
    assert_eq!(manager.game_library_state(false).profiles.len(), 1);

    // Saving a profile whose flags are all default removes it.
    let summary = manager.save_profile(CompatibilityProfile::defaults(220, None))?;
    assert!(summary.starts_with("Profile reset for AppID 220."));
    assert!(manager.game_library_state(false).profiles.is_empty());
    Ok(())
}

#[test]
fn log_lines_are_ordered_by_app_id() -> Result<()> {
    let fixture = SteamFixture::new();
    fixture.add_game(400, "Portal", "Portal", &["portal.exe"]);
    fixture.add_game(220, "Half-Life 2", "Half-Life 2", &["hl2.exe"]);
    fixture.add_localconfig("1001", None);

    let registry = Arc::new(FakeRegistry::default());
    let manager = fixture.manager(registry);

    manager.save_profile(windowed_profile(220))?;
    manager.save_profile(windowed_profile(400))?;

    // Touch both profiles in one pass; lines must come out 220 first.
    let logs = manager.synchronize_all()?;
    assert!(logs.is_empty(), "already synchronized: {logs:?}");

    // Force re-application by clearing the registry out from under us.
    let registry2 = Arc::new(FakeRegistry::default());
    let manager2 = fixture.manager(Arc::clone(&registry2));
    let logs = manager2.synchronize_all()?;
    let first_220 = logs.iter().position(|l| l.contains("AppID 220")).unwrap();
    let first_400 = logs.iter().position(|l| l.contains("AppID 400")).unwrap();
    assert!(first_220 < first_400);
    Ok(())
}

#[test]
fn library_cache_serves_repeat_scans_and_invalidates_on_change() -> Result<()> {
    let fixture = SteamFixture::new();
    fixture.add_game(220, "Half-Life 2", "Half-Life 2", &["hl2.exe"]);

    let registry = Arc::new(FakeRegistry::default());
    let manager = fixture.manager(registry);

    let first = manager.game_library_state(false);
    assert_eq!(first.games.len(), 1);

    // Unchanged manifests: cached result (same content either way; this
    // exercises the fingerprint-hit path).
    let second = manager.game_library_state(false);
    assert_eq!(first.games, second.games);

    // A new manifest changes the fingerprint and the scan picks it up.
    fixture.add_game(400, "Portal", "Portal", &["portal.exe"]);
    let third = manager.game_library_state(false);
    assert_eq!(third.games.len(), 2);
    Ok(())
}
