//! Configuration model and shape normalization

mod config;
mod normalize;


pub use config::{Config, OutputTarget, PluginSettings, PluginSpec};
pub use normalize::{
    layer_config, normalize_instance_or_array, normalize_output_param, normalize_plugins,
};
