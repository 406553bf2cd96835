use config::Config;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::*;

use crate::{
    actuation::MotorConfig, error::ErrorWrapper, map::MapConfig, navigation::NavigationConfig,
};

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub navigation: NavigationConfig,
    pub motors: MotorConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub topics: TopicsConfig,
    #[serde(default)]
    pub zenoh: NavigationZenohConfig,
}

impl AppConfig {
    pub fn load_config(config: &Option<PathBuf>) -> anyhow::Result<Self> {
        let settings = if let Some(config) = config {
            info!("Using configuration from {:?}", config);
            Config::builder()
                .add_source(config::File::with_name(
                    config
                        .to_str()
                        .ok_or_else(|| anyhow::anyhow!("Failed to convert path"))?,
                ))
                .add_source(config::Environment::with_prefix("APP").separator("__"))
                .build()?
        } else {
            info!("Using dev configuration");
            Config::builder()
                .add_source(config::File::with_name("config/settings"))
                .add_source(config::File::with_name("config/dev_settings").required(false))
                .add_source(config::Environment::with_prefix("APP").separator("__"))
                .build()?
        };

        let app_config: AppConfig = settings.try_deserialize()?;
        app_config.navigation.validate()?;
        app_config.motors.duties.validate()?;
        Ok(app_config)
    }
}

/// Key expressions used on the zenoh side
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TopicsConfig {
    pub toggle_reading: String,
    pub position_fix: String,
    pub pwm_request: String,
    pub toggle_request: String,
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            toggle_reading: "miniature/proxy/toggle-reading".to_owned(),
            position_fix: "miniature/lps/state".to_owned(),
            pwm_request: "miniature/proxy/pwm-request".to_owned(),
            toggle_request: "miniature/proxy/toggle-request".to_owned(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct NavigationZenohConfig {
    #[serde(default)]
    pub connect: Vec<zenoh_config::EndPoint>,
    #[serde(default)]
    pub listen: Vec<zenoh_config::EndPoint>,
    #[serde(default)]
    pub config_path: Option<String>,
}

impl NavigationZenohConfig {
    pub fn get_zenoh_config(&self) -> anyhow::Result<zenoh::config::Config> {
        let mut config = if let Some(conf_file) = &self.config_path {
            zenoh::config::Config::from_file(conf_file).map_err(ErrorWrapper::ZenohError)?
        } else {
            zenoh::config::Config::default()
        };
        if !self.connect.is_empty() {
            config.connect.endpoints.clone_from(&self.connect);
        }
        if !self.listen.is_empty() {
            config.listen.endpoints.clone_from(&self.listen);
        }
        Ok(config)
    }
}
