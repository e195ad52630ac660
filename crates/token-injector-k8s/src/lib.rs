// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! K8s client abstraction for the token injector webhook.
//!
//! This crate provides:
//! - A trait-based K8s client abstraction for testability
//! - Production implementation using the kube crate
//! - An in-memory mock client for tests
//! - Re-exports of the core/v1 types the webhook rewrites

mod client;
mod error;
mod kube_client;
mod mock;
mod types;

pub use client::K8sClient;
pub use error::K8sError;
pub use kube_client::KubeClient;
pub use mock::MockK8sClient;
pub use types::{
	Container, EmptyDirVolumeSource, EnvVar, ObjectMeta, Pod, PodSpec, Quantity,
	ResourceRequirements, ServiceAccount, Volume, VolumeMount,
};
