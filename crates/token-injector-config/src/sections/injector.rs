// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Injector configuration section.
//!
//! Everything the mutation engine needs to know about the containers and the
//! volume it adds. Read once at startup and never re-read per request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_VOLUME_NAME: &str = "token-injector-volume";
pub const DEFAULT_VOLUME_PATH: &str = "/var/run/secrets/aws/token";
pub const DEFAULT_TOKEN_FILE: &str = "token";

/// Image pull policy applied to the injector containers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PullPolicy {
	Always,
	#[default]
	IfNotPresent,
	Never,
}

impl PullPolicy {
	pub fn as_str(&self) -> &'static str {
		match self {
			PullPolicy::Always => "Always",
			PullPolicy::IfNotPresent => "IfNotPresent",
			PullPolicy::Never => "Never",
		}
	}
}

impl fmt::Display for PullPolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for PullPolicy {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"Always" => Ok(PullPolicy::Always),
			"IfNotPresent" => Ok(PullPolicy::IfNotPresent),
			"Never" => Ok(PullPolicy::Never),
			other => Err(ConfigError::InvalidValue {
				key: "injector.pull_policy".to_string(),
				message: format!("expected Always, IfNotPresent or Never, got '{other}'"),
			}),
		}
	}
}

/// Injector configuration layer (for merging).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InjectorConfigLayer {
	pub image: Option<String>,
	pub pull_policy: Option<PullPolicy>,
	pub volume_name: Option<String>,
	pub volume_path: Option<String>,
	pub token_file: Option<String>,
}

impl InjectorConfigLayer {
	/// Merges another layer on top of this one.
	/// Values from `other` take precedence when present.
	pub fn merge(&mut self, other: InjectorConfigLayer) {
		if other.image.is_some() {
			self.image = other.image;
		}
		if other.pull_policy.is_some() {
			self.pull_policy = other.pull_policy;
		}
		if other.volume_name.is_some() {
			self.volume_name = other.volume_name;
		}
		if other.volume_path.is_some() {
			self.volume_path = other.volume_path;
		}
		if other.token_file.is_some() {
			self.token_file = other.token_file;
		}
	}

	/// Resolves this layer into a runtime configuration.
	pub fn resolve(self) -> Result<InjectorConfig, ConfigError> {
		let image = self
			.image
			.filter(|s| !s.trim().is_empty())
			.ok_or_else(|| ConfigError::Validation("injector image is required".to_string()))?;

		let volume_name = self
			.volume_name
			.unwrap_or_else(|| DEFAULT_VOLUME_NAME.to_string());
		if volume_name.is_empty() {
			return Err(ConfigError::Validation(
				"injector volume_name must not be empty".to_string(),
			));
		}

		let volume_path = self
			.volume_path
			.unwrap_or_else(|| DEFAULT_VOLUME_PATH.to_string());
		if !volume_path.starts_with('/') {
			return Err(ConfigError::InvalidValue {
				key: "injector.volume_path".to_string(),
				message: format!("mount path must be absolute, got '{volume_path}'"),
			});
		}
		// A trailing slash would produce `//` in the token file path.
		let volume_path = match volume_path.trim_end_matches('/') {
			"" => "/".to_string(),
			trimmed => trimmed.to_string(),
		};

		let token_file = self
			.token_file
			.unwrap_or_else(|| DEFAULT_TOKEN_FILE.to_string());
		if token_file.is_empty() || token_file.contains('/') {
			return Err(ConfigError::InvalidValue {
				key: "injector.token_file".to_string(),
				message: format!("token file must be a bare file name, got '{token_file}'"),
			});
		}

		Ok(InjectorConfig {
			image,
			pull_policy: self.pull_policy.unwrap_or_default(),
			volume_name,
			volume_path,
			token_file,
		})
	}
}

/// Injector configuration (runtime).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectorConfig {
	/// Image containing the `/token-injector` binary.
	pub image: String,
	pub pull_policy: PullPolicy,
	/// Name of the shared in-memory volume.
	pub volume_name: String,
	/// Mount path of the shared volume in every patched container.
	pub volume_path: String,
	/// Token file name inside `volume_path`.
	pub token_file: String,
}

impl InjectorConfig {
	/// Build a config for `image` with every other field at its default.
	pub fn with_image(image: impl Into<String>) -> Self {
		Self {
			image: image.into(),
			pull_policy: PullPolicy::default(),
			volume_name: DEFAULT_VOLUME_NAME.to_string(),
			volume_path: DEFAULT_VOLUME_PATH.to_string(),
			token_file: DEFAULT_TOKEN_FILE.to_string(),
		}
	}

	/// Absolute path of the token file the injector writes and consumers read.
	pub fn token_path(&self) -> String {
		if self.volume_path == "/" {
			format!("/{}", self.token_file)
		} else {
			format!("{}/{}", self.volume_path, self.token_file)
		}
	}
}
