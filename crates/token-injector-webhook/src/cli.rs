// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Command-line interface.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use token_injector_config::{
	HttpConfigLayer, InjectorConfigLayer, LogLevel, LoggingConfigLayer, PullPolicy,
	WebhookConfigLayer,
};

/// Token injector - mutating admission webhook that binds Pods to cloud IAM roles.
#[derive(Parser, Debug)]
#[command(name = "token-injector-webhook", version)]
pub struct Args {
	/// Log level: debug, info, warning, error, fatal or panic
	#[arg(long, global = true)]
	pub log_level: Option<LogLevel>,

	/// Emit logs as JSON
	#[arg(long, global = true)]
	pub json: bool,

	/// Configuration file (defaults to /etc/token-injector/webhook.toml when present)
	#[arg(long, global = true)]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Run the admission webhook server
	Server(ServerArgs),
	/// Show version and build information
	Version,
}

#[derive(ClapArgs, Debug, Default)]
pub struct ServerArgs {
	/// Webhook listen address, `host:port` or `:port`
	#[arg(long)]
	pub listen_address: Option<String>,

	/// Serve /metrics on this address instead of the webhook listener
	#[arg(long)]
	pub telemetry_listen_address: Option<String>,

	/// PEM certificate for the webhook listener
	#[arg(long)]
	pub tls_cert_file: Option<PathBuf>,

	/// PEM private key for the webhook listener
	#[arg(long)]
	pub tls_private_key_file: Option<PathBuf>,

	/// Image containing the /token-injector binary
	#[arg(long)]
	pub image: Option<String>,

	/// Pull policy for the injector containers: Always, IfNotPresent or Never
	#[arg(long)]
	pub pull_policy: Option<PullPolicy>,

	/// Name of the shared token volume
	#[arg(long)]
	pub volume_name: Option<String>,

	/// Mount path of the shared token volume
	#[arg(long)]
	pub volume_path: Option<String>,

	/// Token file name inside the volume
	#[arg(long)]
	pub token_file: Option<String>,
}

impl Args {
	/// Configuration layer holding only the flags that were given.
	pub fn overrides(&self) -> WebhookConfigLayer {
		let mut layer = WebhookConfigLayer {
			logging: Some(LoggingConfigLayer {
				level: self.log_level,
				json: self.json.then_some(true),
			}),
			..Default::default()
		};

		if let Command::Server(server) = &self.command {
			layer.http = Some(HttpConfigLayer {
				listen_address: server.listen_address.clone(),
				telemetry_listen_address: server.telemetry_listen_address.clone(),
				tls_cert_file: server.tls_cert_file.clone(),
				tls_private_key_file: server.tls_private_key_file.clone(),
			});
			layer.injector = Some(InjectorConfigLayer {
				image: server.image.clone(),
				pull_policy: server.pull_policy,
				volume_name: server.volume_name.clone(),
				volume_path: server.volume_path.clone(),
				token_file: server.token_file.clone(),
			});
		}

		layer
	}
}
