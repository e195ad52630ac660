// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! In-memory K8s client for tests.
//!
//! Holds ServiceAccounts keyed by `namespace/name` and answers lookups without
//! a cluster. A configured failure takes precedence over stored objects so
//! callers can exercise API error paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::client::K8sClient;
use crate::error::K8sError;
use crate::types::{ObjectMeta, ServiceAccount};

#[derive(Debug, Clone, Default)]
pub struct MockK8sClient {
	service_accounts: Arc<Mutex<HashMap<String, ServiceAccount>>>,
	failure: Arc<Mutex<Option<String>>>,
	lookups: Arc<AtomicUsize>,
}

impl MockK8sClient {
	pub fn new() -> Self {
		Self::default()
	}

	/// Store a ServiceAccount. Its namespace and name are taken from metadata.
	pub fn add_service_account(&self, sa: ServiceAccount) {
		let key = key(
			sa.metadata.namespace.as_deref().unwrap_or_default(),
			sa.metadata.name.as_deref().unwrap_or_default(),
		);
		self
			.service_accounts
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.insert(key, sa);
	}

	/// Make every subsequent lookup fail with an API error carrying `message`.
	pub fn fail_with(&self, message: impl Into<String>) {
		*self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.into());
	}

	/// Number of lookups served so far, failed ones included.
	pub fn lookups(&self) -> usize {
		self.lookups.load(Ordering::SeqCst)
	}

	/// Build a ServiceAccount with the given annotations.
	pub fn service_account(
		namespace: &str,
		name: &str,
		annotations: &[(&str, &str)],
	) -> ServiceAccount {
		let annotations: BTreeMap<String, String> = annotations
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();

		ServiceAccount {
			metadata: ObjectMeta {
				name: Some(name.to_string()),
				namespace: Some(namespace.to_string()),
				annotations: if annotations.is_empty() {
					None
				} else {
					Some(annotations)
				},
				..Default::default()
			},
			..Default::default()
		}
	}
}

#[async_trait]
impl K8sClient for MockK8sClient {
	async fn get_service_account(
		&self,
		name: &str,
		namespace: &str,
	) -> Result<ServiceAccount, K8sError> {
		self.lookups.fetch_add(1, Ordering::SeqCst);

		if let Some(message) = self
			.failure
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
		{
			return Err(K8sError::ApiError { message });
		}

		self
			.service_accounts
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.get(&key(namespace, name))
			.cloned()
			.ok_or_else(|| K8sError::ServiceAccountNotFound {
				name: name.to_string(),
				namespace: namespace.to_string(),
			})
	}
}

fn key(namespace: &str, name: &str) -> String {
	format!("{namespace}/{name}")
}
