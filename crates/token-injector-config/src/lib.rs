// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for the token injector webhook.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file,
//!   environment, command-line overrides)
//! - Type-safe configuration with validation
//!
//! # Usage
//!
//! ```ignore
//! use token_injector_config::{load_config, WebhookConfigLayer};
//!
//! let config = load_config(None, WebhookConfigLayer::default())?;
//! println!("injecting {}", config.injector.image);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::WebhookConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, OverrideSource, Precedence, TomlSource};

use std::path::PathBuf;

use tracing::{debug, info};

/// Fully resolved webhook configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookConfig {
	pub http: HttpConfig,
	pub injector: InjectorConfig,
	pub logging: LoggingConfig,
}

impl WebhookConfig {
	/// Log the resolved settings. Call once tracing is initialized.
	pub fn log_summary(&self) {
		info!(
			listen_address = %self.http.listen_address,
			telemetry_listen_address = ?self.http.telemetry_listen_address,
			tls = self.http.tls.is_some(),
			image = %self.injector.image,
			pull_policy = %self.injector.pull_policy,
			volume_name = %self.injector.volume_name,
			volume_path = %self.injector.volume_path,
			token_file = %self.injector.token_file,
			log_level = ?self.logging.level,
			"Webhook configuration loaded"
		);
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. `overrides` (command-line flags)
/// 2. Environment variables (`TOKEN_INJECTOR_*`, `LOG_LEVEL`, `LOG_JSON`)
/// 3. Config file (`config_path`, or `/etc/token-injector/webhook.toml` if present)
/// 4. Built-in defaults
pub fn load_config(
	config_path: Option<PathBuf>,
	overrides: WebhookConfigLayer,
) -> Result<WebhookConfig, ConfigError> {
	let toml = match config_path {
		Some(path) => TomlSource::new(path),
		None => TomlSource::system(),
	};

	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(toml),
		Box::new(EnvSource::default()),
		Box::new(OverrideSource::new(overrides)),
	])
}

/// Merge the given sources in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<WebhookConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = WebhookConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: WebhookConfigLayer) -> Result<WebhookConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().resolve()?;
	let injector = layer.injector.unwrap_or_default().resolve()?;
	let logging = layer.logging.unwrap_or_default().finalize();

	Ok(WebhookConfig {
		http,
		injector,
		logging,
	})
}
