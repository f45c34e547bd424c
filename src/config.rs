use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Vertical offset of the first status line and distance between lines.
pub const FIRST_ROW_OFFSET: i32 = 10;
pub const ROW_SPACING: i32 = 20;
/// Height reserved for one status line when validating the window size.
pub const ROW_HEIGHT: u32 = 15;
/// Number of status lines (battery, cpu, memory).
pub const ROWS: u32 = 3;

const MAX_WINDOW_DIMENSION: u32 = 4096;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub font: FontConfig,
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 300,
            height: 300,
            title: "Computer System Monitor".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Outline font file (TrueType/OpenType).
    pub path: PathBuf,
    /// Text colour as `[r, g, b, a]`.
    pub color: [u8; 4],
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: "/usr/share/fonts/truetype/freefont/FreeMono.ttf".into(),
            color: [0x00, 0xff, 0x00, 0xff],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub path: PathBuf,
    /// When false, an unopenable source silently disables its sampler.
    pub required: bool,
}

impl SourceConfig {
    fn new(path: &str, required: bool) -> Self {
        Self {
            path: path.into(),
            required,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub battery: SourceConfig,
    pub cpu: SourceConfig,
    pub memory: SourceConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            battery: SourceConfig::new("/sys/class/power_supply/BAT0/uevent", false),
            cpu: SourceConfig::new("/proc/stat", true),
            memory: SourceConfig::new("/proc/meminfo", true),
        }
    }
}

impl AppConfig {
    /// Reads `CONFIG_FILE` if set (the file must exist), else `config.toml` when
    /// present, else the built-in defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = match std::env::var("CONFIG_FILE") {
            Ok(path) => PathBuf::from(path),
            Err(_) if Path::new("config.toml").exists() => PathBuf::from("config.toml"),
            Err(_) => {
                let config = AppConfig::default();
                config.validate()?;
                return Ok(config);
            }
        };
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("config {}: {}", path.display(), e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Vertical offsets of the battery, cpu and memory lines.
    pub fn row_offsets() -> [i32; ROWS as usize] {
        [0, 1, 2].map(|row| FIRST_ROW_OFFSET + row * ROW_SPACING)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            (1..=MAX_WINDOW_DIMENSION).contains(&self.window.width),
            "window.width must be between 1 and {}, got {}",
            MAX_WINDOW_DIMENSION,
            self.window.width
        );
        anyhow::ensure!(
            (1..=MAX_WINDOW_DIMENSION).contains(&self.window.height),
            "window.height must be between 1 and {}, got {}",
            MAX_WINDOW_DIMENSION,
            self.window.height
        );
        let needed = (FIRST_ROW_OFFSET + (ROWS as i32 - 1) * ROW_SPACING) as u32 + ROW_HEIGHT;
        anyhow::ensure!(
            self.window.height >= needed,
            "window.height must be at least {} to fit every status line, got {}",
            needed,
            self.window.height
        );
        anyhow::ensure!(
            !self.window.title.is_empty(),
            "window.title must be non-empty"
        );
        anyhow::ensure!(
            !self.font.path.as_os_str().is_empty(),
            "font.path must be non-empty"
        );
        for (name, source) in [
            ("battery", &self.sources.battery),
            ("cpu", &self.sources.cpu),
            ("memory", &self.sources.memory),
        ] {
            anyhow::ensure!(
                !source.path.as_os_str().is_empty(),
                "sources.{}.path must be non-empty",
                name
            );
        }
        Ok(())
    }
}
