//! Parser configuration

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound on the number of fat descriptors accepted by default.
///
/// Java class files share the `0xcafebabe` magic and store their version
/// where the descriptor count lives, so real containers stay far below this.
pub const DEFAULT_MAX_FAT_ARCHES: u32 = 64;

/// Settings for opening and walking a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Largest descriptor count accepted in a fat header
    pub max_fat_arches: u32,
    /// Memory-map file sources instead of reading them into a buffer
    pub use_mmap: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_fat_arches: DEFAULT_MAX_FAT_ARCHES,
            use_mmap: true,
        }
    }
}

impl ParserConfig {
    /// Load configuration from file
    pub fn load(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| crate::Error::parse(e.to_string()))?;
        config.validate()?;
        debug!("Loaded parser config from {}", path.display());
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &std::path::Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| crate::Error::parse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings no container could satisfy
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_fat_arches == 0 {
            return Err(crate::Error::config("max_fat_arches must be at least 1"));
        }
        Ok(())
    }
}
