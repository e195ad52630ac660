// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for the webhook.

pub mod http;
pub mod injector;
pub mod logging;

pub use http::{parse_listen_address, HttpConfig, HttpConfigLayer, TlsConfig};
pub use injector::{
	InjectorConfig, InjectorConfigLayer, PullPolicy, DEFAULT_TOKEN_FILE, DEFAULT_VOLUME_NAME,
	DEFAULT_VOLUME_PATH,
};
pub use logging::{LogLevel, LoggingConfig, LoggingConfigLayer};
