// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use token_injector_k8s::K8sError;

/// Errors from the Pod mutation engine.
#[derive(Error, Debug)]
pub enum MutationError {
	#[error("failed to look up service account {namespace}/{name}: {source}")]
	ServiceAccountLookup {
		name: String,
		namespace: String,
		#[source]
		source: K8sError,
	},
}

/// Errors starting or running the HTTP listeners.
#[derive(Error, Debug)]
pub enum ServerError {
	#[error("failed to bind {addr}: {source}")]
	Bind {
		addr: SocketAddr,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to load TLS material from {cert} and {key}: {source}")]
	Tls {
		cert: PathBuf,
		key: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("server on {addr} failed: {source}")]
	Serve {
		addr: SocketAddr,
		#[source]
		source: std::io::Error,
	},

	#[error("a rustls crypto provider is already installed")]
	CryptoProvider,
}
