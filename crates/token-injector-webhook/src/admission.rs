// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Admission adapter.
//!
//! Decodes `AdmissionReview` requests, hands Pods to the mutation engine and
//! answers with a JSON Patch of the engine's additions. The patch only adds
//! and its paths index the submitted object, so fields the Pod model does not
//! know survive. Other kinds pass through allowed and unmodified.

use std::sync::Arc;
use std::time::{Duration, Instant};

use json_patch::{AddOperation, PatchOperation};
use jsonptr::PointerBuf;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use kube::core::DynamicObject;
use kube::Resource;
use serde::Serialize;
use token_injector_k8s::{Container, Pod};
use tracing::{debug, info, instrument, warn};

use crate::metrics::{ReviewOutcome, WebhookMetrics};
use crate::mutator::{Mutation, PodMutator};

pub type Review = AdmissionReview<DynamicObject>;

/// Namespace assumed when neither the request nor the object carries one.
const FALLBACK_NAMESPACE: &str = "default";

pub struct AdmissionHandler {
	mutator: Arc<PodMutator>,
	metrics: Arc<WebhookMetrics>,
}

impl AdmissionHandler {
	pub fn new(mutator: Arc<PodMutator>, metrics: Arc<WebhookMetrics>) -> Self {
		Self { mutator, metrics }
	}

	/// Answer a raw request body. Undecodable bodies get an invalid review.
	pub async fn review_body(&self, body: &[u8]) -> Review {
		match serde_json::from_slice::<Review>(body) {
			Ok(review) => self.review(review).await,
			Err(error) => {
				warn!(%error, "Failed to parse admission review body");
				self
					.metrics
					.record_review(ReviewOutcome::Invalid, Duration::ZERO);
				AdmissionResponse::invalid(error).into_review()
			}
		}
	}

	pub async fn review(&self, review: Review) -> Review {
		let start = Instant::now();

		let request: Result<AdmissionRequest<DynamicObject>, _> = review.try_into();
		let (outcome, rsp) = match request {
			Ok(req) => self.admit(&req).await,
			Err(error) => {
				warn!(%error, "Invalid admission request");
				(ReviewOutcome::Invalid, AdmissionResponse::invalid(error))
			}
		};

		self.metrics.record_review(outcome, start.elapsed());
		debug!(outcome = outcome.as_str(), allowed = rsp.allowed, "admission review answered");
		rsp.into_review()
	}

	#[instrument(skip_all, fields(uid = %req.uid, operation = ?req.operation))]
	async fn admit(
		&self,
		req: &AdmissionRequest<DynamicObject>,
	) -> (ReviewOutcome, AdmissionResponse) {
		let rsp = AdmissionResponse::from(req);

		if !is_kind::<Pod>(req) {
			debug!(
				group = %req.kind.group,
				kind = %req.kind.kind,
				"not a pod, passing through"
			);
			return (ReviewOutcome::Skipped, rsp);
		}

		let Some(object) = req.object.as_ref() else {
			debug!("request carries no object, passing through");
			return (ReviewOutcome::Skipped, rsp);
		};

		let pod = match decode_pod(object) {
			Ok(pod) => pod,
			Err(error) => {
				warn!(%error, "Failed to decode pod");
				return (
					ReviewOutcome::Invalid,
					rsp.deny(format!("failed to decode pod: {error}")),
				);
			}
		};

		let name = pod
			.metadata
			.name
			.clone()
			.or_else(|| pod.metadata.generate_name.clone())
			.unwrap_or_default();
		let namespace = req
			.namespace
			.clone()
			.or_else(|| pod.metadata.namespace.clone())
			.unwrap_or_else(|| FALLBACK_NAMESPACE.to_string());

		let mutation = match self.mutator.mutate(&pod, &namespace, req.dry_run).await {
			Ok(mutation) => mutation,
			Err(error) => {
				warn!(pod = %name, %namespace, %error, "Failed to mutate pod");
				return (
					ReviewOutcome::Denied,
					rsp.deny(format!("failed to mutate pod: {name}: {error}")),
				);
			}
		};

		let patch = match pod_patch(&pod, &mutation) {
			Ok(ops) => json_patch::Patch(ops),
			Err(error) => {
				warn!(pod = %name, %error, "Failed to compute pod patch");
				return (
					ReviewOutcome::Denied,
					rsp.deny(format!("failed to mutate pod: {name}: {error}")),
				);
			}
		};

		if patch.0.is_empty() {
			let outcome = if mutation.decision.authorized() {
				ReviewOutcome::Unchanged
			} else {
				ReviewOutcome::Skipped
			};
			return (outcome, rsp);
		}

		match rsp.with_patch(patch) {
			Ok(rsp) => {
				info!(
					pod = %name,
					%namespace,
					dry_run = req.dry_run,
					sidecar_injected = mutation.sidecar_injected,
					"Injected role credentials"
				);
				(ReviewOutcome::Mutated, rsp)
			}
			Err(error) => {
				warn!(pod = %name, %error, "Failed to serialize pod patch");
				(
					ReviewOutcome::Denied,
					AdmissionResponse::from(req)
						.deny(format!("failed to mutate pod: {name}: {error}")),
				)
			}
		}
	}
}

fn is_kind<T>(req: &AdmissionRequest<DynamicObject>) -> bool
where
	T: Resource,
	T::DynamicType: Default,
{
	let dt = Default::default();
	req.kind.group.eq_ignore_ascii_case(&T::group(&dt))
		&& req.kind.kind.eq_ignore_ascii_case(&T::kind(&dt))
}

fn decode_pod(object: &DynamicObject) -> Result<Pod, serde_json::Error> {
	serde_json::to_value(object).and_then(serde_json::from_value)
}

/// Add operations for everything the engine appended or prepended.
///
/// Indices refer to the submitted object. Existing list entries are only
/// ever appended to, and injected init containers go in front after all
/// other init container edits.
fn pod_patch(original: &Pod, mutation: &Mutation) -> Result<Vec<PatchOperation>, serde_json::Error> {
	let mut ops = Vec::new();
	let (Some(before), Some(after)) = (original.spec.as_ref(), mutation.pod.spec.as_ref()) else {
		return Ok(ops);
	};

	let before_init = before.init_containers.as_deref().unwrap_or_default();
	let after_init = after.init_containers.as_deref().unwrap_or_default();
	let leading = after_init.len().saturating_sub(before_init.len());

	container_ops(&mut ops, "initContainers", before_init, &after_init[leading..])?;
	container_ops(&mut ops, "containers", &before.containers, &after.containers)?;

	prepend_ops(
		&mut ops,
		&["spec", "initContainers"],
		before.init_containers.is_some(),
		&after_init[..leading],
	)?;
	append_ops(
		&mut ops,
		&["spec", "containers"],
		Some(before.containers.as_slice()),
		Some(after.containers.as_slice()),
	)?;
	append_ops(
		&mut ops,
		&["spec", "volumes"],
		before.volumes.as_deref(),
		after.volumes.as_deref(),
	)?;

	Ok(ops)
}

fn container_ops(
	ops: &mut Vec<PatchOperation>,
	list: &str,
	before: &[Container],
	after: &[Container],
) -> Result<(), serde_json::Error> {
	for (index, (old, new)) in before.iter().zip(after).enumerate() {
		let index = index.to_string();
		append_ops(
			ops,
			&["spec", list, index.as_str(), "volumeMounts"],
			old.volume_mounts.as_deref(),
			new.volume_mounts.as_deref(),
		)?;
		append_ops(
			ops,
			&["spec", list, index.as_str(), "env"],
			old.env.as_deref(),
			new.env.as_deref(),
		)?;
	}
	Ok(())
}

/// Entries of `after` past the length of `before` go to the end of the list at
/// `path`. A list the object does not have is added whole.
fn append_ops<T: Serialize>(
	ops: &mut Vec<PatchOperation>,
	path: &[&str],
	before: Option<&[T]>,
	after: Option<&[T]>,
) -> Result<(), serde_json::Error> {
	let existing = before.map_or(0, <[T]>::len);
	let added = after.and_then(|after| after.get(existing..)).unwrap_or_default();
	if added.is_empty() {
		return Ok(());
	}

	if before.is_none() {
		add(ops, path, None, serde_json::to_value(added)?);
		return Ok(());
	}
	for item in added {
		add(ops, path, Some("-"), serde_json::to_value(item)?);
	}
	Ok(())
}

/// `added` goes to the front of the list at `path`, keeping its order.
fn prepend_ops<T: Serialize>(
	ops: &mut Vec<PatchOperation>,
	path: &[&str],
	exists: bool,
	added: &[T],
) -> Result<(), serde_json::Error> {
	if added.is_empty() {
		return Ok(());
	}

	if !exists {
		add(ops, path, None, serde_json::to_value(added)?);
		return Ok(());
	}
	for (index, item) in added.iter().enumerate() {
		let index = index.to_string();
		add(ops, path, Some(index.as_str()), serde_json::to_value(item)?);
	}
	Ok(())
}

fn add(ops: &mut Vec<PatchOperation>, path: &[&str], last: Option<&str>, value: serde_json::Value) {
	ops.push(PatchOperation::Add(AddOperation {
		path: PointerBuf::from_tokens(path.iter().copied().chain(last)),
		value,
	}));
}
