// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Pod mutation engine.
//!
//! Decides whether a Pod gets credentials and builds the mutated Pod. The
//! input Pod is never modified; callers diff the result against the original
//! to produce the admission patch.
//!
//! Steps per Pod:
//! 1. Resolve the role bound to the Pod's ServiceAccount. No role means the
//!    Pod is returned unchanged.
//! 2. Patch init containers, then regular containers.
//! 3. Unless this is a dry run and only if something was patched, prepend the
//!    generate injector, append the update injector and add the volume.

use std::sync::Arc;

use token_injector_config::InjectorConfig;
use token_injector_k8s::{K8sClient, Pod};
use tracing::{debug, instrument};

use crate::error::MutationError;
use crate::patch::{injector_container, injector_volume, ContainerPatcher, InjectorMode};
use crate::role::{effective_service_account, RoleResolver};
use crate::session_name::SessionNameGenerator;

/// Per-request injection decision. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionDecision {
	pub role: Option<String>,
	pub dry_run: bool,
}

impl InjectionDecision {
	pub fn authorized(&self) -> bool {
		self.role.is_some()
	}
}

/// Result of running the engine over one Pod.
#[derive(Debug, Clone)]
pub struct Mutation {
	pub pod: Pod,
	pub decision: InjectionDecision,
	/// At least one init or regular container received the credential env.
	pub containers_patched: bool,
	/// The injector containers and volume were added.
	pub sidecar_injected: bool,
}

#[derive(Debug, Clone)]
pub struct PodMutator {
	resolver: RoleResolver,
	patcher: ContainerPatcher,
}

impl PodMutator {
	pub fn new(client: Arc<dyn K8sClient>, config: InjectorConfig) -> Self {
		Self::with_session_names(client, config, SessionNameGenerator::random())
	}

	pub fn with_session_names(
		client: Arc<dyn K8sClient>,
		config: InjectorConfig,
		session_names: SessionNameGenerator,
	) -> Self {
		Self {
			resolver: RoleResolver::new(client),
			patcher: ContainerPatcher::new(config, session_names),
		}
	}

	pub fn config(&self) -> &InjectorConfig {
		self.patcher.config()
	}

	/// Return the mutated Pod for `pod` admitted into `namespace`.
	pub async fn mutate_pod(
		&self,
		pod: &Pod,
		namespace: &str,
		dry_run: bool,
	) -> Result<Pod, MutationError> {
		Ok(self.mutate(pod, namespace, dry_run).await?.pod)
	}

	/// Like [`mutate_pod`](Self::mutate_pod), also reporting what was done.
	#[instrument(skip(self, pod), fields(pod = pod_name(pod)))]
	pub async fn mutate(
		&self,
		pod: &Pod,
		namespace: &str,
		dry_run: bool,
	) -> Result<Mutation, MutationError> {
		let unchanged = |decision: InjectionDecision| Mutation {
			pod: pod.clone(),
			decision,
			containers_patched: false,
			sidecar_injected: false,
		};

		let Some(spec) = pod.spec.as_ref() else {
			debug!("pod has no spec, skipping");
			return Ok(unchanged(InjectionDecision {
				role: None,
				dry_run,
			}));
		};

		let service_account =
			effective_service_account(spec.service_account_name.as_deref().unwrap_or_default());

		let role = self
			.resolver
			.resolve(service_account, namespace)
			.await
			.map_err(|source| MutationError::ServiceAccountLookup {
				name: service_account.to_string(),
				namespace: namespace.to_string(),
				source,
			})?;

		let decision = InjectionDecision { role, dry_run };
		let Some(role) = decision.role.as_deref() else {
			debug!(service_account, "no role bound, skipping");
			return Ok(unchanged(decision));
		};

		let (init_containers, init_patched) = self
			.patcher
			.patch_all(spec.init_containers.as_deref().unwrap_or_default(), role);
		let (containers, containers_patched) = self.patcher.patch_all(&spec.containers, role);

		if !init_patched && !containers_patched {
			debug!("pod has no containers, skipping");
			return Ok(unchanged(decision));
		}

		debug!(
			init_containers = init_containers.len(),
			containers = containers.len(),
			"patched containers"
		);

		let mut new_spec = spec.clone();
		new_spec.containers = containers;
		new_spec.init_containers = if init_patched {
			Some(init_containers)
		} else {
			spec.init_containers.clone()
		};

		let sidecar_injected = !dry_run;
		if sidecar_injected {
			let config = self.patcher.config();

			new_spec
				.init_containers
				.get_or_insert_with(Vec::new)
				.insert(0, injector_container(config, InjectorMode::Generate));
			debug!("prepended token generate init container");

			new_spec
				.containers
				.push(injector_container(config, InjectorMode::Update));
			debug!("appended token update sidecar");

			new_spec
				.volumes
				.get_or_insert_with(Vec::new)
				.push(injector_volume(config));
			debug!(volume = %config.volume_name, "appended token volume");
		} else {
			debug!("dry run, skipping injector containers and volume");
		}

		let mut new_pod = pod.clone();
		new_pod.spec = Some(new_spec);

		Ok(Mutation {
			pod: new_pod,
			decision,
			containers_patched: true,
			sidecar_injected,
		})
	}
}

fn pod_name(pod: &Pod) -> &str {
	pod
		.metadata
		.name
		.as_deref()
		.or(pod.metadata.generate_name.as_deref())
		.unwrap_or_default()
}
