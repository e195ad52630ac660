// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Token injector webhook binary.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use token_injector_config::{load_config, LoggingConfig};
use token_injector_k8s::KubeClient;
use token_injector_webhook::{
	cli::{Args, Command},
	create_router, create_telemetry_router, server, version, AdmissionHandler, AppState,
	PodMutator, WebhookMetrics,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	if let Command::Version = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	server::install_crypto_provider().context("failed to install TLS crypto provider")?;

	let config =
		load_config(args.config.clone(), args.overrides()).context("invalid configuration")?;

	init_tracing(&config.logging);
	config.log_summary();

	tracing::info!(
		version = env!("CARGO_PKG_VERSION"),
		image = %config.injector.image,
		"Starting token injector webhook"
	);

	let client = KubeClient::new()
		.await
		.context("failed to create Kubernetes client")?;
	let metrics = Arc::new(WebhookMetrics::new().context("failed to create metrics")?);
	let mutator = Arc::new(PodMutator::new(Arc::new(client), config.injector.clone()));

	let state = AppState {
		admission: Arc::new(AdmissionHandler::new(mutator, metrics.clone())),
		metrics,
	};

	let dedicated_telemetry = config.http.telemetry_listen_address.is_some();
	let app = create_router(state.clone(), !dedicated_telemetry).layer(TraceLayer::new_for_http());
	let telemetry = dedicated_telemetry.then(|| create_telemetry_router(state));

	server::run(&config.http, app, telemetry).await?;
	Ok(())
}

/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(logging: &LoggingConfig) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(logging.level.as_filter()));

	let registry = tracing_subscriber::registry().with(filter);
	if logging.json {
		registry
			.with(tracing_subscriber::fmt::layer().json())
			.init();
	} else {
		registry.with(tracing_subscriber::fmt::layer()).init();
	}
}
