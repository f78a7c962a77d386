use anyhow::Result;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete kinematics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KinematicsConfig {
    /// Largest time step the scheduler ever advances by, in seconds
    /// Bounds the time lag passed to actions and the homing replay window
    pub max_physics_step: f32,

    /// Step used when baking homing paths for editor previews
    pub preview_step: f32,

    /// Facing angle previews assume for the player, in radians
    pub default_player_facing: f32,

    #[serde(default)]
    pub demo: DemoConfigData,
}

impl Default for KinematicsConfig {
    fn default() -> Self {
        Self {
            max_physics_step: 1.0 / 120.0,
            preview_step: 1.0 / 120.0,
            default_player_facing: std::f32::consts::FRAC_PI_2,
            demo: DemoConfigData::default(),
        }
    }
}

impl KinematicsConfig {
    /// Load configuration from JSON file
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: KinematicsConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file with pretty formatting
    pub fn save(&self, path: &str) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_default(path: &str) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config file {}: {}, using defaults", path, e);
            let config = Self::default();
            // Try to save the default config
            let _ = config.save(path);
            config
        })
    }

    fn validate(&self) -> Result<()> {
        if !(self.max_physics_step > 0.0) {
            anyhow::bail!("max_physics_step must be positive, got {}", self.max_physics_step);
        }
        if !(self.preview_step > 0.0) {
            anyhow::bail!("preview_step must be positive, got {}", self.preview_step);
        }
        Ok(())
    }
}

/// Headless demo scene configuration (serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfigData {
    #[serde(with = "vec2_serde")]
    pub player_position: Vec2,

    #[serde(with = "vec2_serde")]
    pub spawn_position: Vec2,

    /// Number of fixed steps to simulate
    pub frames: u32,

    /// Log every Nth frame
    pub log_interval: u32,
}

impl Default for DemoConfigData {
    fn default() -> Self {
        Self {
            player_position: Vec2::new(0.0, -200.0),
            spawn_position: Vec2::new(0.0, 200.0),
            frames: 600,
            log_interval: 60,
        }
    }
}

/// Custom serialization for Vec2
mod vec2_serde {
    use glam::Vec2;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Vec2Data {
        x: f32,
        y: f32,
    }

    pub fn serialize<S>(vec: &Vec2, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Vec2Data { x: vec.x, y: vec.y }.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec2, D::Error>
    where
        D: Deserializer<'de>,
    {
        let data = Vec2Data::deserialize(deserializer)?;
        Ok(Vec2::new(data.x, data.y))
    }
}
