// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::error::K8sError;
use crate::types::ServiceAccount;

/// Trait for K8s client operations.
///
/// The webhook only ever reads from the cluster, so the surface is limited to
/// lookups. Implementations must be safe to share across concurrent admission
/// requests.
#[async_trait]
pub trait K8sClient: Send + Sync {
	/// Get a ServiceAccount by name from the specified namespace.
	///
	/// # Returns
	/// * `Ok(ServiceAccount)` - The ServiceAccount object as stored in the cluster
	/// * `Err(K8sError::ServiceAccountNotFound)` - If no such ServiceAccount exists
	/// * `Err(K8sError)` - If the API call itself fails
	async fn get_service_account(
		&self,
		name: &str,
		namespace: &str,
	) -> Result<ServiceAccount, K8sError>;
}
