// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Mutating admission webhook that binds Pods to cloud IAM roles.
//!
//! A Pod whose ServiceAccount carries the `amazonaws.com/role-arn` annotation
//! gets the role, a web identity token path and a session name in the
//! environment of every container, a shared in-memory token volume, an init
//! container that writes the token and a sidecar that keeps it fresh.

pub mod admission;
pub mod cli;
pub mod error;
pub mod metrics;
pub mod mutator;
pub mod patch;
pub mod role;
pub mod routes;
pub mod server;
pub mod session_name;
pub mod version;

pub use admission::{AdmissionHandler, Review};
pub use error::{MutationError, ServerError};
pub use metrics::{ReviewOutcome, WebhookMetrics};
pub use mutator::{InjectionDecision, Mutation, PodMutator};
pub use patch::{injector_container, injector_volume, ContainerPatcher, InjectorMode};
pub use role::{RoleResolver, ROLE_ARN_ANNOTATION};
pub use routes::{create_router, create_telemetry_router, AppState};
pub use session_name::{FixedSuffix, RandomSuffix, SessionNameGenerator, SuffixSource};
