//! Compatibility profile data model
//!
//! The `preset` field is always the *derived* classification of the other
//! fields — it is recomputed from the flags before every persist and never
//! treated as a source of truth.

/// Named override bundles selectable in the profile editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatibilityPreset {
    /// No overrides — equivalent to having no profile at all
    Automatic,
    /// 640x480 + 16-bit color + fullscreen optimizations off, for pre-2000 titles
    LegacyVideoSafe,
    /// Forced windowed mode + fullscreen optimizations off
    WindowedSafe,
    /// Any other combination of flags
    Custom,
}

impl CompatibilityPreset {
    /// Stable wire name used in the profile store.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::LegacyVideoSafe => "legacyVideoSafe",
            Self::WindowedSafe => "windowedSafe",
            Self::Custom => "custom",
        }
    }

    /// Parse a wire name; unknown names yield `None` so callers can default.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "automatic" => Some(Self::Automatic),
            "legacyVideoSafe" => Some(Self::LegacyVideoSafe),
            "windowedSafe" => Some(Self::WindowedSafe),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// Windows version the compatibility layer should impersonate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompatibilityMode {
    /// No version lie
    #[default]
    None,
    /// Windows 95
    Windows95,
    /// Windows 98 / ME
    Windows98Me,
    /// Windows XP Service Pack 2
    WindowsXpSp2,
    /// Windows XP Service Pack 3
    WindowsXpSp3,
    /// Windows Vista Service Pack 2
    WindowsVistaSp2,
    /// Windows 7
    Windows7,
    /// Windows 8
    Windows8,
}

impl CompatibilityMode {
    /// Registry flag token, if this mode requests one.
    pub fn compat_layer_flag(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Windows95 => Some("WIN95"),
            Self::Windows98Me => Some("WIN98"),
            Self::WindowsXpSp2 => Some("WINXPSP2"),
            Self::WindowsXpSp3 => Some("WINXPSP3"),
            Self::WindowsVistaSp2 => Some("VISTASP2"),
            Self::Windows7 => Some("WIN7RTM"),
            Self::Windows8 => Some("WIN8RTM"),
        }
    }

    /// Stable wire name used in the profile store.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Windows95 => "windows95",
            Self::Windows98Me => "windows98Me",
            Self::WindowsXpSp2 => "windowsXPServicePack2",
            Self::WindowsXpSp3 => "windowsXPServicePack3",
            Self::WindowsVistaSp2 => "windowsVistaServicePack2",
            Self::Windows7 => "windows7",
            Self::Windows8 => "windows8",
        }
    }

    /// Parse a wire name; unknown names yield `None` so callers can default.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::None),
            "windows95" => Some(Self::Windows95),
            "windows98Me" => Some(Self::Windows98Me),
            "windowsXPServicePack2" => Some(Self::WindowsXpSp2),
            "windowsXPServicePack3" => Some(Self::WindowsXpSp3),
            "windowsVistaServicePack2" => Some(Self::WindowsVistaSp2),
            "windows7" => Some(Self::Windows7),
            "windows8" => Some(Self::Windows8),
            _ => None,
        }
    }
}

/// Reduced color depth override.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReducedColorMode {
    /// Full color
    #[default]
    None,
    /// 256 colors (8-bit)
    Colors256,
    /// 16-bit color
    Colors16Bit,
}

impl ReducedColorMode {
    /// Registry flag token, if this mode requests one.
    pub fn compat_layer_flag(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Colors256 => Some("256COLOR"),
            Self::Colors16Bit => Some("16BITCOLOR"),
        }
    }

    /// Stable wire name used in the profile store.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Colors256 => "colors256",
            Self::Colors16Bit => "colors16Bit",
        }
    }

    /// Parse a wire name; unknown names yield `None` so callers can default.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::None),
            "colors256" => Some(Self::Colors256),
            "colors16Bit" => Some(Self::Colors16Bit),
            _ => None,
        }
    }
}

/// High-DPI scaling override.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HighDpiOverrideMode {
    /// System scaling
    #[default]
    None,
    /// Application handles its own scaling
    Application,
}

impl HighDpiOverrideMode {
    /// Registry flag tokens this mode requests (possibly empty).
    pub fn compat_layer_flags(self) -> &'static [&'static str] {
        match self {
            Self::None => &[],
            Self::Application => &["HIGHDPIAWARE"],
        }
    }

    /// Stable wire name used in the profile store.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Application => "application",
        }
    }

    /// Parse a wire name; unknown names yield `None` so callers can default.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::None),
            "application" => Some(Self::Application),
            _ => None,
        }
    }
}

/// Per-game compatibility overrides, keyed by the store's app id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityProfile {
    /// Store app id (unique per store backend)
    pub app_id: u32,
    /// Derived classification of the override fields below
    pub preset: CompatibilityPreset,
    /// Executable the flags apply to, relative to the install directory;
    /// `None` means "use the scanner's default candidate"
    pub executable_relative_path: Option<String>,
    /// Windows version impersonation
    pub compatibility_mode: CompatibilityMode,
    /// Inject `-windowed` into the game's launch options
    pub force_windowed: bool,
    /// Force 640x480 rendering
    pub force_640x480: bool,
    /// Reduced color depth
    pub reduced_color_mode: ReducedColorMode,
    /// High-DPI behavior
    pub high_dpi_override_mode: HighDpiOverrideMode,
    /// Opt the executable out of fullscreen optimizations
    pub disable_fullscreen_optimizations: bool,
    /// Request elevation
    pub run_as_admin: bool,
}

impl CompatibilityProfile {
    /// A profile with no overrides, seeded with the scanner's default
    /// executable choice.
    pub fn defaults(app_id: u32, default_executable_relative_path: Option<&str>) -> Self {
        Self {
            app_id,
            preset: CompatibilityPreset::Automatic,
            executable_relative_path: default_executable_relative_path.map(str::to_string),
            compatibility_mode: CompatibilityMode::None,
            force_windowed: false,
            force_640x480: false,
            reduced_color_mode: ReducedColorMode::None,
            high_dpi_override_mode: HighDpiOverrideMode::None,
            disable_fullscreen_optimizations: false,
            run_as_admin: false,
        }
    }

    /// Overwrite the override fields with a preset's canonical flag values.
    /// `Custom` leaves the fields untouched.
    pub fn apply_preset(&mut self, preset: CompatibilityPreset) {
        self.preset = preset;
        match preset {
            CompatibilityPreset::Automatic => {
                self.compatibility_mode = CompatibilityMode::None;
                self.force_windowed = false;
                self.force_640x480 = false;
                self.reduced_color_mode = ReducedColorMode::None;
                self.high_dpi_override_mode = HighDpiOverrideMode::None;
                self.disable_fullscreen_optimizations = false;
                self.run_as_admin = false;
            }
            CompatibilityPreset::LegacyVideoSafe => {
                self.compatibility_mode = CompatibilityMode::None;
                self.force_windowed = false;
                self.force_640x480 = true;
                self.reduced_color_mode = ReducedColorMode::Colors16Bit;
                self.high_dpi_override_mode = HighDpiOverrideMode::None;
                self.disable_fullscreen_optimizations = true;
                self.run_as_admin = false;
            }
            CompatibilityPreset::WindowedSafe => {
                self.compatibility_mode = CompatibilityMode::None;
                self.force_windowed = true;
                self.force_640x480 = false;
                self.reduced_color_mode = ReducedColorMode::None;
                self.high_dpi_override_mode = HighDpiOverrideMode::None;
                self.disable_fullscreen_optimizations = true;
                self.run_as_admin = false;
            }
            CompatibilityPreset::Custom => {}
        }
    }

    /// Recompute `preset` from the override fields. Called before every
    /// persist so the stored preset always matches the flags.
    pub fn refresh_preset_from_flags(&mut self) {
        let no_mode = self.compatibility_mode == CompatibilityMode::None
            && self.high_dpi_override_mode == HighDpiOverrideMode::None
            && !self.run_as_admin;

        if no_mode
            && !self.force_windowed
            && !self.force_640x480
            && self.reduced_color_mode == ReducedColorMode::None
            && !self.disable_fullscreen_optimizations
        {
            self.preset = CompatibilityPreset::Automatic;
            return;
        }

        if no_mode
            && !self.force_windowed
            && self.force_640x480
            && self.reduced_color_mode == ReducedColorMode::Colors16Bit
            && self.disable_fullscreen_optimizations
        {
            self.preset = CompatibilityPreset::LegacyVideoSafe;
            return;
        }

        if no_mode
            && self.force_windowed
            && !self.force_640x480
            && self.reduced_color_mode == ReducedColorMode::None
            && self.disable_fullscreen_optimizations
        {
            self.preset = CompatibilityPreset::WindowedSafe;
            return;
        }

        self.preset = CompatibilityPreset::Custom;
    }

    /// Whether any override field differs from its default. A profile
    /// without overrides is removed from the store instead of persisted.
    pub fn has_overrides(&self) -> bool {
        self.compatibility_mode != CompatibilityMode::None
            || self.force_windowed
            || self.force_640x480
            || self.reduced_color_mode != ReducedColorMode::None
            || self.high_dpi_override_mode != HighDpiOverrideMode::None
            || self.disable_fullscreen_optimizations
            || self.run_as_admin
    }

    /// Registry flag tokens in the fixed write order: compatibility mode,
    /// resolution, color, DPI, fullscreen optimizations, admin.
    pub fn compat_layer_flags(&self) -> Vec<&'static str> {
        let mut flags = Vec::new();
        if let Some(mode_flag) = self.compatibility_mode.compat_layer_flag() {
            flags.push(mode_flag);
        }
        if self.force_640x480 {
            flags.push("640X480");
        }
        if let Some(color_flag) = self.reduced_color_mode.compat_layer_flag() {
            flags.push(color_flag);
        }
        flags.extend_from_slice(self.high_dpi_override_mode.compat_layer_flags());
        if self.disable_fullscreen_optimizations {
            flags.push("DISABLEDXMAXIMIZEDWINDOWEDMODE");
        }
        if self.run_as_admin {
            flags.push("RUNASADMIN");
        }
        flags
    }
}
