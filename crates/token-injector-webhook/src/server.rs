// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Listener lifecycle for the webhook and telemetry endpoints.

use std::net::SocketAddr;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use token_injector_config::{HttpConfig, TlsConfig};
use tracing::info;

use crate::error::ServerError;

/// Install aws-lc-rs as the process-wide rustls provider.
///
/// kube and axum-server enable different rustls backends, so rustls cannot
/// pick one on its own. Must run before any TLS listener is configured.
pub fn install_crypto_provider() -> Result<(), ServerError> {
	rustls::crypto::aws_lc_rs::default_provider()
		.install_default()
		.map_err(|_| ServerError::CryptoProvider)
}

/// Serve `app` on the webhook listener and, when configured, `telemetry` on
/// the telemetry listener. Returns when either listener fails or on Ctrl-C.
pub async fn run(
	http: &HttpConfig,
	app: Router,
	telemetry: Option<Router>,
) -> Result<(), ServerError> {
	let webhook = serve_webhook(http.listen_address, http.tls.as_ref(), app);

	let telemetry = async {
		match (http.telemetry_listen_address, telemetry) {
			(Some(addr), Some(router)) => serve_plain(addr, router, "telemetry").await,
			_ => std::future::pending().await,
		}
	};

	tokio::select! {
		result = webhook => result?,
		result = telemetry => result?,
		_ = tokio::signal::ctrl_c() => {
			info!("Received shutdown signal");
		}
	}

	info!("Server shutdown complete");
	Ok(())
}

async fn serve_webhook(
	addr: SocketAddr,
	tls: Option<&TlsConfig>,
	app: Router,
) -> Result<(), ServerError> {
	let Some(tls) = tls else {
		return serve_plain(addr, app, "webhook").await;
	};

	let tls_config = RustlsConfig::from_pem_file(&tls.cert_file, &tls.private_key_file)
		.await
		.map_err(|source| ServerError::Tls {
			cert: tls.cert_file.clone(),
			key: tls.private_key_file.clone(),
			source,
		})?;

	info!(%addr, "Starting webhook server with TLS");

	axum_server::bind_rustls(addr, tls_config)
		.serve(app.into_make_service())
		.await
		.map_err(|source| ServerError::Serve { addr, source })
}

async fn serve_plain(addr: SocketAddr, app: Router, name: &'static str) -> Result<(), ServerError> {
	let listener = tokio::net::TcpListener::bind(addr)
		.await
		.map_err(|source| ServerError::Bind { addr, source })?;

	info!(%addr, listener = name, "Starting server");

	axum::serve(listener, app)
		.await
		.map_err(|source| ServerError::Serve { addr, source })
}
