//! Command-line overrides layered on top of the TOML config.

use cypherlats_core::{LatsConfig, ProviderKind};
use std::path::Path;

#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub search_depth: Option<usize>,
    pub expand_num: Option<usize>,
    pub max_height: Option<usize>,
    pub exploration_weight: Option<f64>,
    pub timeout_secs: Option<u64>,
    pub provider: Option<ProviderKind>,
    pub base_url: Option<String>,
    pub generator_model: Option<String>,
    pub reflector_model: Option<String>,
}

impl Overrides {
    pub fn apply(&self, config: &mut LatsConfig) {
        let search = &mut config.search;
        if let Some(v) = self.search_depth {
            search.search_depth = v;
        }
        if let Some(v) = self.expand_num {
            search.expand_num = v;
        }
        if let Some(v) = self.max_height {
            search.max_height = v;
        }
        if let Some(v) = self.exploration_weight {
            search.exploration_weight = v;
        }
        if let Some(v) = self.timeout_secs {
            search.oracle_timeout_secs = Some(v);
        }

        let model = &mut config.model;
        if let Some(v) = self.provider {
            model.provider = v;
        }
        if let Some(v) = &self.base_url {
            model.base_url = Some(v.clone());
        }
        if let Some(v) = &self.generator_model {
            model.generator_model = v.clone();
        }
        if let Some(v) = &self.reflector_model {
            model.reflector_model = v.clone();
        }
    }
}

/// An explicit path must exist; the default path may be missing. A file that
/// exists always has to parse and validate.
pub fn load_config(path: Option<&Path>) -> cypherlats_core::Result<LatsConfig> {
    match path {
        Some(path) => LatsConfig::try_load(path),
        None => LatsConfig::load(&LatsConfig::default_path()),
    }
}

/// Resolve the effective config: file, then overrides, then validation.
pub fn resolve(path: Option<&Path>, overrides: &Overrides) -> cypherlats_core::Result<LatsConfig> {
    let mut config = load_config(path)?;
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}
