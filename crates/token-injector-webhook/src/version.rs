// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Build information for the `version` subcommand.

/// Build metadata. Git SHA and build timestamp come from
/// `TOKEN_INJECTOR_GIT_SHA` / `TOKEN_INJECTOR_BUILD_TIMESTAMP` at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
	pub version: &'static str,
	pub git_sha: &'static str,
	pub build_timestamp: &'static str,
	pub os: &'static str,
	pub arch: &'static str,
}

impl BuildInfo {
	pub fn current() -> Self {
		Self {
			version: env!("CARGO_PKG_VERSION"),
			git_sha: option_env!("TOKEN_INJECTOR_GIT_SHA").unwrap_or("unknown"),
			build_timestamp: option_env!("TOKEN_INJECTOR_BUILD_TIMESTAMP").unwrap_or("unknown"),
			os: std::env::consts::OS,
			arch: std::env::consts::ARCH,
		}
	}
}

/// Format version info for display.
pub fn format_version_info() -> String {
	let info = BuildInfo::current();
	format!(
		"token-injector-webhook version: {}\n\
		 Git SHA:                        {}\n\
		 Built at:                       {}\n\
		 Platform:                       {}/{}",
		info.version,
		info.git_sha,
		info.build_timestamp,
		info.os,
		info.arch,
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_version_info_lists_fields() {
		let output = format_version_info();
		assert!(output.starts_with(&format!(
			"token-injector-webhook version: {}",
			env!("CARGO_PKG_VERSION")
		)));
		assert!(output.contains("Git SHA:"));
		assert!(output.contains("Built at:"));
		assert!(output.contains(std::env::consts::OS));
	}
}
