use crate::domain::sensor::SensorMeta;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub feed: FeedSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedSettings {
    /// WebSocket endpoint; may reference `${days}`.
    pub url: String,
    #[serde(default = "default_days")]
    pub days: u32,
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl FeedSettings {
    pub fn resolved_url(&self) -> String {
        let mut vars = HashMap::new();
        vars.insert("days".to_string(), self.days.to_string());
        prepare_template(&self.url, &vars)
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_days() -> u32 {
    30
}

fn default_reconnect_delay() -> u64 {
    5
}

fn default_channel_capacity() -> usize {
    64
}

#[derive(Debug, Deserialize, Clone)]
pub struct RegistryConfig {
    #[serde(default)]
    pub sensors: Vec<SensorEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SensorEntry {
    pub site: String,
    pub sid: String,
    pub lat: f64,
    pub lon: f64,
    pub name: Option<String>,
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/landslide"))
        .add_source(
            config::Environment::with_prefix("LANDSLIDE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_sensor_registry() -> anyhow::Result<Vec<SensorMeta>> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/sensors"))
        .build()?;

    Ok(build_registry(settings.try_deserialize()?))
}

/// Turn registry entries into sensor metadata, skipping entries without a
/// usable id and repeats of a key already seen.
pub fn build_registry(config: RegistryConfig) -> Vec<SensorMeta> {
    let mut seen = HashSet::new();
    let mut registry = Vec::with_capacity(config.sensors.len());

    for entry in config.sensors {
        let Some(meta) = SensorMeta::new(&entry.site, &entry.sid, entry.lat, entry.lon, entry.name) else {
            tracing::warn!(site = %entry.site, sid = %entry.sid, "Skipping registry entry without a usable id");
            continue;
        };
        if !seen.insert(meta.key().clone()) {
            tracing::warn!(sensor = %meta.key(), "Skipping duplicate registry entry");
            continue;
        }
        registry.push(meta);
    }

    registry
}

/// Replace `${name}` placeholders in a template string
pub fn prepare_template(template: &str, vars: &HashMap<String, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}
