//! Profile store behavior as seen through the manager: schema migration,
//! stable on-disk shape, and tolerance of data written by older releases.

mod common;

use std::sync::Arc;

use anyhow::Result;

use bottlerack::profile::{CompatibilityPreset, ReducedColorMode};
use common::{FakeRegistry, SteamFixture};

#[test]
fn legacy_profile_file_loads_through_the_manager() -> Result<()> {
    let fixture = SteamFixture::new();
    let registry = Arc::new(FakeRegistry::default());
    let manager = fixture.manager(registry);

    // A v1-era record: boolean color flag, no enum fields at all.
    std::fs::create_dir_all(manager.profiles_path().parent().unwrap())?;
    std::fs::write(
        manager.profiles_path(),
        r#"{
            "version": 1,
            "profiles": [
                { "appID": 400, "force16BitColor": true, "forceWindowed": true }
            ]
        }"#,
    )?;

    let state = manager.game_library_state(false);
    assert_eq!(state.profiles.len(), 1);
    let profile = &state.profiles[0];
    assert_eq!(profile.reduced_color_mode, ReducedColorMode::Colors16Bit);
    assert!(profile.force_windowed);
    // The stored preset was absent: it defaults and gets rederived on the
    // next save, not at load time.
    assert_eq!(profile.preset, CompatibilityPreset::Automatic);
    Ok(())
}

#[test]
fn corrupt_profile_file_degrades_to_empty_library_state() -> Result<()> {
    let fixture = SteamFixture::new();
    let registry = Arc::new(FakeRegistry::default());
    let manager = fixture.manager(registry);

    std::fs::create_dir_all(manager.profiles_path().parent().unwrap())?;
    std::fs::write(manager.profiles_path(), "{ definitely not json")?;

    // Read paths are best-effort; the caller still gets a usable snapshot.
    let state = manager.game_library_state(false);
    assert!(state.profiles.is_empty());
    Ok(())
}

#[test]
fn saved_file_is_stable_and_diff_friendly() -> Result<()> {
    let fixture = SteamFixture::new();
    fixture.add_game(220, "Half-Life 2", "Half-Life 2", &["hl2.exe"]);
    let registry = Arc::new(FakeRegistry::default());
    let manager = fixture.manager(registry);

    let mut profile = bottlerack::profile::CompatibilityProfile::defaults(220, None);
    profile.force_windowed = true;
    profile.disable_fullscreen_optimizations = true;
    manager.save_profile(profile.clone())?;
    let first = std::fs::read_to_string(manager.profiles_path())?;

    // Saving identical content produces an identical file.
    manager.save_profile(profile)?;
    let second = std::fs::read_to_string(manager.profiles_path())?;
    assert_eq!(first, second);

    // Pretty-printed, versioned, preset rederived before persisting.
    assert!(first.contains("\"version\": 1"));
    assert!(first.contains("\"preset\": \"windowedSafe\""));
    assert!(first.contains('\n'));
    Ok(())
}
