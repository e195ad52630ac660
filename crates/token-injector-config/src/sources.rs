// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML files, environment and overrides.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::WebhookConfigLayer;
use crate::sections::{HttpConfigLayer, InjectorConfigLayer, LoggingConfigLayer};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
	CommandLine = 60,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<WebhookConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<WebhookConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(WebhookConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
	required: bool,
}

impl TomlSource {
	/// A file the operator asked for explicitly; it must exist.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			required: true,
		}
	}

	/// The well-known system path, skipped when absent.
	pub fn system() -> Self {
		Self {
			path: PathBuf::from("/etc/token-injector/webhook.toml"),
			required: false,
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<WebhookConfigLayer, ConfigError> {
		if !self.required && !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(WebhookConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: WebhookConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Environment variable source.
///
/// Convention: TOKEN_INJECTOR_<FIELD>, except the logging variables which
/// keep their historical `LOG_LEVEL` / `LOG_JSON` names.
#[derive(Clone)]
pub struct EnvSource {
	lookup: EnvLookup,
}

impl Default for EnvSource {
	fn default() -> Self {
		Self {
			lookup: Arc::new(|name| std::env::var(name).ok()),
		}
	}
}

impl EnvSource {
	/// Read variables through `lookup` instead of the process environment.
	pub fn with_lookup<F>(lookup: F) -> Self
	where
		F: Fn(&str) -> Option<String> + Send + Sync + 'static,
	{
		Self {
			lookup: Arc::new(lookup),
		}
	}

	fn var(&self, name: &str) -> Option<String> {
		(self.lookup)(name).filter(|s| !s.is_empty())
	}

	fn bool(&self, name: &str) -> Option<bool> {
		self
			.var(name)
			.map(|v| v.eq_ignore_ascii_case("true") || v == "1")
	}

	fn parsed<T>(&self, name: &str) -> Result<Option<T>, ConfigError>
	where
		T: std::str::FromStr<Err = ConfigError>,
	{
		self
			.var(name)
			.map(|v| {
				v.parse::<T>().map_err(|e| match e {
					ConfigError::InvalidValue { message, .. } => ConfigError::InvalidValue {
						key: name.to_string(),
						message,
					},
					other => other,
				})
			})
			.transpose()
	}

	fn load_http(&self) -> HttpConfigLayer {
		HttpConfigLayer {
			listen_address: self.var("TOKEN_INJECTOR_LISTEN_ADDRESS"),
			telemetry_listen_address: self.var("TOKEN_INJECTOR_TELEMETRY_LISTEN_ADDRESS"),
			tls_cert_file: self.var("TOKEN_INJECTOR_TLS_CERT_FILE").map(PathBuf::from),
			tls_private_key_file: self
				.var("TOKEN_INJECTOR_TLS_PRIVATE_KEY_FILE")
				.map(PathBuf::from),
		}
	}

	fn load_injector(&self) -> Result<InjectorConfigLayer, ConfigError> {
		Ok(InjectorConfigLayer {
			image: self.var("TOKEN_INJECTOR_IMAGE"),
			pull_policy: self.parsed("TOKEN_INJECTOR_PULL_POLICY")?,
			volume_name: self.var("TOKEN_INJECTOR_VOLUME_NAME"),
			volume_path: self.var("TOKEN_INJECTOR_VOLUME_PATH"),
			token_file: self.var("TOKEN_INJECTOR_TOKEN_FILE"),
		})
	}

	fn load_logging(&self) -> Result<LoggingConfigLayer, ConfigError> {
		Ok(LoggingConfigLayer {
			level: self.parsed("LOG_LEVEL")?,
			json: self.bool("LOG_JSON"),
		})
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<WebhookConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(WebhookConfigLayer {
			http: Some(self.load_http()),
			injector: Some(self.load_injector()?),
			logging: Some(self.load_logging()?),
		})
	}
}

/// A pre-built layer, typically assembled from command-line flags.
pub struct OverrideSource {
	layer: WebhookConfigLayer,
}

impl OverrideSource {
	pub fn new(layer: WebhookConfigLayer) -> Self {
		Self { layer }
	}
}

impl ConfigSource for OverrideSource {
	fn name(&self) -> &'static str {
		"command-line"
	}

	fn precedence(&self) -> Precedence {
		Precedence::CommandLine
	}

	fn load(&self) -> Result<WebhookConfigLayer, ConfigError> {
		Ok(self.layer.clone())
	}
}
