// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use kube::{api::Api, Client};
use tracing::{debug, instrument};

use crate::client::K8sClient;
use crate::error::K8sError;
use crate::types::ServiceAccount;

/// Production K8s client implementation using the kube crate.
#[derive(Clone)]
pub struct KubeClient {
	client: Client,
}

impl KubeClient {
	/// Create a new KubeClient that auto-discovers cluster configuration.
	///
	/// This will attempt to load config from:
	/// 1. In-cluster service account (when running in K8s)
	/// 2. KUBECONFIG environment variable
	/// 3. ~/.kube/config
	pub async fn new() -> Result<Self, K8sError> {
		let client = Client::try_default().await?;
		debug!("K8s client initialized");
		Ok(Self { client })
	}
}

#[async_trait]
impl K8sClient for KubeClient {
	#[instrument(skip(self))]
	async fn get_service_account(
		&self,
		name: &str,
		namespace: &str,
	) -> Result<ServiceAccount, K8sError> {
		let service_accounts: Api<ServiceAccount> = Api::namespaced(self.client.clone(), namespace);
		match service_accounts.get(name).await {
			Ok(sa) => Ok(sa),
			Err(kube::Error::Api(err)) if err.code == 404 => Err(K8sError::ServiceAccountNotFound {
				name: name.into(),
				namespace: namespace.into(),
			}),
			Err(kube::Error::Api(err)) if err.code == 403 => Err(K8sError::Forbidden {
				name: name.into(),
				namespace: namespace.into(),
				message: err.message,
			}),
			Err(e) => Err(e.into()),
		}
	}
}
