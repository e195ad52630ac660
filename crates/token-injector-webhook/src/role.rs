// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Resolve the cloud IAM role bound to a ServiceAccount.

use std::sync::Arc;

use token_injector_k8s::{K8sClient, K8sError};
use tracing::{debug, instrument};

/// ServiceAccount annotation carrying the role identifier.
pub const ROLE_ARN_ANNOTATION: &str = "amazonaws.com/role-arn";

/// ServiceAccount Kubernetes assigns to a Pod that names none.
pub const DEFAULT_SERVICE_ACCOUNT: &str = "default";

/// The ServiceAccount actually looked up for `name`. An empty name means the
/// Pod runs as [`DEFAULT_SERVICE_ACCOUNT`].
pub fn effective_service_account(name: &str) -> &str {
	if name.is_empty() {
		DEFAULT_SERVICE_ACCOUNT
	} else {
		name
	}
}

#[derive(Clone)]
pub struct RoleResolver {
	client: Arc<dyn K8sClient>,
}

impl RoleResolver {
	pub fn new(client: Arc<dyn K8sClient>) -> Self {
		Self { client }
	}

	/// Look up `service_account` in `namespace` and return its bound role.
	///
	/// Returns `Ok(None)` when the ServiceAccount exists without the
	/// annotation. Lookup failures, including a missing ServiceAccount, are
	/// returned as errors. Performs exactly one lookup per call.
	#[instrument(skip(self))]
	pub async fn resolve(
		&self,
		service_account: &str,
		namespace: &str,
	) -> Result<Option<String>, K8sError> {
		let name = effective_service_account(service_account);

		let sa = self.client.get_service_account(name, namespace).await?;
		let role = sa
			.metadata
			.annotations
			.as_ref()
			.and_then(|annotations| annotations.get(ROLE_ARN_ANNOTATION))
			.cloned();

		match &role {
			Some(role) => debug!(service_account = name, %role, "service account bound to role"),
			None => debug!(service_account = name, "service account has no role annotation"),
		}

		Ok(role)
	}
}

impl std::fmt::Debug for RoleResolver {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RoleResolver").finish_non_exhaustive()
	}
}
