// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:8443";

/// TLS key material locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
	pub cert_file: PathBuf,
	pub private_key_file: PathBuf,
}

/// HTTP server configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
	pub listen_address: SocketAddr,
	/// Dedicated plain-HTTP address for `/metrics`. When unset, metrics are
	/// served on `listen_address`.
	pub telemetry_listen_address: Option<SocketAddr>,
	pub tls: Option<TlsConfig>,
}

impl Default for HttpConfig {
	fn default() -> Self {
		Self {
			listen_address: ([0, 0, 0, 0], 8443).into(),
			telemetry_listen_address: None,
			tls: None,
		}
	}
}

/// HTTP configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfigLayer {
	#[serde(default)]
	pub listen_address: Option<String>,
	#[serde(default)]
	pub telemetry_listen_address: Option<String>,
	#[serde(default)]
	pub tls_cert_file: Option<PathBuf>,
	#[serde(default)]
	pub tls_private_key_file: Option<PathBuf>,
}

impl HttpConfigLayer {
	pub fn merge(&mut self, other: HttpConfigLayer) {
		if other.listen_address.is_some() {
			self.listen_address = other.listen_address;
		}
		if other.telemetry_listen_address.is_some() {
			self.telemetry_listen_address = other.telemetry_listen_address;
		}
		if other.tls_cert_file.is_some() {
			self.tls_cert_file = other.tls_cert_file;
		}
		if other.tls_private_key_file.is_some() {
			self.tls_private_key_file = other.tls_private_key_file;
		}
	}

	pub fn resolve(self) -> Result<HttpConfig, ConfigError> {
		let listen_address = parse_listen_address(
			"http.listen_address",
			self
				.listen_address
				.as_deref()
				.unwrap_or(DEFAULT_LISTEN_ADDRESS),
		)?;

		let telemetry_listen_address = self
			.telemetry_listen_address
			.as_deref()
			.filter(|s| !s.is_empty())
			.map(|s| parse_listen_address("http.telemetry_listen_address", s))
			.transpose()?;

		let tls = match (self.tls_cert_file, self.tls_private_key_file) {
			(None, None) => None,
			(Some(cert_file), Some(private_key_file)) => Some(TlsConfig {
				cert_file,
				private_key_file,
			}),
			_ => {
				return Err(ConfigError::Validation(
					"tls_cert_file and tls_private_key_file must be set together".to_string(),
				))
			}
		};

		Ok(HttpConfig {
			listen_address,
			telemetry_listen_address,
			tls,
		})
	}
}

/// Parse a listen address, accepting the `:port` shorthand for all interfaces.
pub fn parse_listen_address(key: &str, value: &str) -> Result<SocketAddr, ConfigError> {
	let candidate = if value.starts_with(':') {
		format!("0.0.0.0{value}")
	} else {
		value.to_string()
	};

	candidate.parse().map_err(|_| ConfigError::InvalidValue {
		key: key.to_string(),
		message: format!("invalid listen address '{value}'"),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let config = HttpConfigLayer::default().resolve().unwrap();
		assert_eq!(config, HttpConfig::default());
		assert_eq!(config.listen_address.port(), 8443);
		assert!(config.tls.is_none());
	}

	#[test]
	fn test_merge_overwrites() {
		let mut base = HttpConfigLayer {
			listen_address: Some("127.0.0.1:3000".to_string()),
			telemetry_listen_address: Some(":9090".to_string()),
			..Default::default()
		};
		let overlay = HttpConfigLayer {
			listen_address: Some(":8443".to_string()),
			..Default::default()
		};
		base.merge(overlay);
		assert_eq!(base.listen_address, Some(":8443".to_string()));
		assert_eq!(base.telemetry_listen_address, Some(":9090".to_string()));
	}

	#[test]
	fn test_port_shorthand() {
		let addr = parse_listen_address("k", ":8443").unwrap();
		assert_eq!(addr, SocketAddr::from(([0, 0, 0, 0], 8443)));
	}

	#[test]
	fn test_invalid_address_rejected() {
		let err = parse_listen_address("http.listen_address", "not-an-address").unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "http.listen_address"));
	}

	#[test]
	fn test_empty_telemetry_address_is_unset() {
		let layer = HttpConfigLayer {
			telemetry_listen_address: Some(String::new()),
			..Default::default()
		};
		assert!(layer.resolve().unwrap().telemetry_listen_address.is_none());
	}

	#[test]
	fn test_tls_requires_both_files() {
		let layer = HttpConfigLayer {
			tls_cert_file: Some(PathBuf::from("/tls/tls.crt")),
			..Default::default()
		};
		assert!(matches!(layer.resolve(), Err(ConfigError::Validation(_))));

		let layer = HttpConfigLayer {
			tls_cert_file: Some(PathBuf::from("/tls/tls.crt")),
			tls_private_key_file: Some(PathBuf::from("/tls/tls.key")),
			..Default::default()
		};
		let tls = layer.resolve().unwrap().tls.unwrap();
		assert_eq!(tls.cert_file, PathBuf::from("/tls/tls.crt"));
		assert_eq!(tls.private_key_file, PathBuf::from("/tls/tls.key"));
	}
}

#[cfg(test)]
mod proptests {
	use proptest::prelude::*;

	use super::*;

	proptest! {
		#[test]
		fn port_shorthand_binds_all_interfaces(port in any::<u16>()) {
			let addr = parse_listen_address("k", &format!(":{port}")).unwrap();
			prop_assert_eq!(addr, SocketAddr::from(([0, 0, 0, 0], port)));
		}

		#[test]
		fn explicit_ipv4_round_trips(a in any::<u8>(), b in any::<u8>(), port in any::<u16>()) {
			let value = format!("10.{a}.{b}.1:{port}");
			let addr = parse_listen_address("k", &value).unwrap();
			prop_assert_eq!(addr.to_string(), value);
		}

		#[test]
		fn tls_files_must_pair(cert in proptest::option::of("/[a-z]{1,8}"), key in proptest::option::of("/[a-z]{1,8}")) {
			let layer = HttpConfigLayer {
				tls_cert_file: cert.clone().map(PathBuf::from),
				tls_private_key_file: key.clone().map(PathBuf::from),
				..Default::default()
			};
			prop_assert_eq!(layer.resolve().is_ok(), cert.is_some() == key.is_some());
		}
	}
}
