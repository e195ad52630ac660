// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Container patch builder.
//!
//! Pure constructors for everything the mutation engine adds to a Pod: the
//! mount and environment additions for user containers, the two injector
//! containers, and the shared in-memory volume. Nothing here talks to the
//! cluster.

use std::collections::BTreeMap;

use token_injector_config::InjectorConfig;
use token_injector_k8s::{
	Container, EmptyDirVolumeSource, EnvVar, Quantity, ResourceRequirements, Volume, VolumeMount,
};

use crate::session_name::SessionNameGenerator;

pub const ENV_WEB_IDENTITY_TOKEN_FILE: &str = "AWS_WEB_IDENTITY_TOKEN_FILE";
pub const ENV_ROLE_ARN: &str = "AWS_ROLE_ARN";
pub const ENV_ROLE_SESSION_NAME: &str = "AWS_ROLE_SESSION_NAME";

/// Path of the token refresh binary inside the injector image.
pub const INJECTOR_BINARY: &str = "/token-injector";

pub const GENERATE_CONTAINER_NAME: &str = "generate-gcp-id-token";
pub const UPDATE_CONTAINER_NAME: &str = "update-gcp-id-token";

const REQUEST_CPU: &str = "5m";
const REQUEST_MEMORY: &str = "10Mi";
const LIMIT_CPU: &str = "20m";
const LIMIT_MEMORY: &str = "50Mi";

/// Which of the two injector containers to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectorMode {
	/// Init container: writes the token once before user containers start.
	Generate,
	/// Sidecar: keeps the token fresh for the Pod's lifetime.
	Update,
}

impl InjectorMode {
	pub fn container_name(&self) -> &'static str {
		match self {
			InjectorMode::Generate => GENERATE_CONTAINER_NAME,
			InjectorMode::Update => UPDATE_CONTAINER_NAME,
		}
	}

	pub fn refresh(&self) -> bool {
		matches!(self, InjectorMode::Update)
	}
}

/// The mount added to every patched container and to both injectors.
pub fn token_mount(config: &InjectorConfig) -> VolumeMount {
	VolumeMount {
		name: config.volume_name.clone(),
		mount_path: config.volume_path.clone(),
		..Default::default()
	}
}

pub fn injector_container(config: &InjectorConfig, mode: InjectorMode) -> Container {
	let mut requests = BTreeMap::new();
	requests.insert("cpu".to_string(), Quantity(REQUEST_CPU.to_string()));
	requests.insert("memory".to_string(), Quantity(REQUEST_MEMORY.to_string()));

	let mut limits = BTreeMap::new();
	limits.insert("cpu".to_string(), Quantity(LIMIT_CPU.to_string()));
	limits.insert("memory".to_string(), Quantity(LIMIT_MEMORY.to_string()));

	Container {
		name: mode.container_name().to_string(),
		image: Some(config.image.clone()),
		image_pull_policy: Some(config.pull_policy.to_string()),
		command: Some(vec![
			INJECTOR_BINARY.to_string(),
			format!("--file={}", config.token_path()),
			format!("--refresh={}", mode.refresh()),
		]),
		volume_mounts: Some(vec![token_mount(config)]),
		resources: Some(ResourceRequirements {
			requests: Some(requests),
			limits: Some(limits),
			claims: None,
		}),
		..Default::default()
	}
}

/// Memory-backed emptyDir shared by the injectors and patched containers.
pub fn injector_volume(config: &InjectorConfig) -> Volume {
	Volume {
		name: config.volume_name.clone(),
		empty_dir: Some(EmptyDirVolumeSource {
			medium: Some("Memory".to_string()),
			..Default::default()
		}),
		..Default::default()
	}
}

/// Applies the credential mount and environment to user containers.
#[derive(Debug, Clone)]
pub struct ContainerPatcher {
	config: InjectorConfig,
	session_names: SessionNameGenerator,
}

impl ContainerPatcher {
	pub fn new(config: InjectorConfig, session_names: SessionNameGenerator) -> Self {
		Self {
			config,
			session_names,
		}
	}

	pub fn config(&self) -> &InjectorConfig {
		&self.config
	}

	/// Return a copy of `container` with one mount and three env vars
	/// appended. Existing entries keep their order.
	pub fn patch(&self, container: &Container, role: &str) -> Container {
		let mut patched = container.clone();

		patched
			.volume_mounts
			.get_or_insert_with(Vec::new)
			.push(token_mount(&self.config));

		patched.env.get_or_insert_with(Vec::new).extend([
			env_var(ENV_WEB_IDENTITY_TOKEN_FILE, self.config.token_path()),
			env_var(ENV_ROLE_ARN, role.to_string()),
			env_var(ENV_ROLE_SESSION_NAME, self.session_names.generate()),
		]);

		patched
	}

	/// Patch every container in order. The flag is `false` only when
	/// `containers` is empty.
	pub fn patch_all(&self, containers: &[Container], role: &str) -> (Vec<Container>, bool) {
		let patched: Vec<Container> = containers.iter().map(|c| self.patch(c, role)).collect();
		let any = !patched.is_empty();
		(patched, any)
	}
}

fn env_var(name: &str, value: String) -> EnvVar {
	EnvVar {
		name: name.to_string(),
		value: Some(value),
		value_from: None,
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use token_injector_config::PullPolicy;

	use super::*;
	use crate::session_name::FixedSuffix;

	fn config() -> InjectorConfig {
		InjectorConfig {
			image: "img".to_string(),
			pull_policy: PullPolicy::IfNotPresent,
			volume_name: "v".to_string(),
			volume_path: "/p".to_string(),
			token_file: "tok".to_string(),
		}
	}

	fn patcher() -> ContainerPatcher {
		ContainerPatcher::new(
			config(),
			SessionNameGenerator::new(Arc::new(FixedSuffix('0'))),
		)
	}

	fn env_pairs(container: &Container) -> Vec<(String, String)> {
		container
			.env
			.clone()
			.unwrap_or_default()
			.into_iter()
			.map(|e| (e.name, e.value.unwrap_or_default()))
			.collect()
	}

	#[test]
	fn patch_appends_mount_and_env() {
		let container = Container {
			name: "app".to_string(),
			..Default::default()
		};

		let patched = patcher().patch(&container, "arn:aws:iam::1:role/r");

		assert_eq!(patched.name, "app");
		assert_eq!(
			env_pairs(&patched),
			vec![
				("AWS_WEB_IDENTITY_TOKEN_FILE".to_string(), "/p/tok".to_string()),
				("AWS_ROLE_ARN".to_string(), "arn:aws:iam::1:role/r".to_string()),
				(
					"AWS_ROLE_SESSION_NAME".to_string(),
					"token-injector-webhook-0000000000000000".to_string()
				),
			]
		);
		assert_eq!(
			patched.volume_mounts.unwrap(),
			vec![VolumeMount {
				name: "v".to_string(),
				mount_path: "/p".to_string(),
				..Default::default()
			}]
		);
	}

	#[test]
	fn patch_preserves_existing_entries_in_order() {
		let container = Container {
			name: "app".to_string(),
			env: Some(vec![env_var("A", "1".to_string()), env_var("B", "2".to_string())]),
			volume_mounts: Some(vec![VolumeMount {
				name: "data".to_string(),
				mount_path: "/data".to_string(),
				..Default::default()
			}]),
			..Default::default()
		};

		let patched = patcher().patch(&container, "r");

		let names: Vec<String> = patched.env.unwrap().into_iter().map(|e| e.name).collect();
		assert_eq!(
			names,
			vec!["A", "B", ENV_WEB_IDENTITY_TOKEN_FILE, ENV_ROLE_ARN, ENV_ROLE_SESSION_NAME]
		);
		let mounts: Vec<String> = patched
			.volume_mounts
			.unwrap()
			.into_iter()
			.map(|m| m.name)
			.collect();
		assert_eq!(mounts, vec!["data", "v"]);
	}

	#[test]
	fn patch_does_not_touch_input() {
		let container = Container {
			name: "app".to_string(),
			..Default::default()
		};
		let _ = patcher().patch(&container, "r");
		assert!(container.env.is_none());
		assert!(container.volume_mounts.is_none());
	}

	#[test]
	fn patch_all_empty_reports_nothing_patched() {
		let (patched, any) = patcher().patch_all(&[], "r");
		assert!(patched.is_empty());
		assert!(!any);
	}

	#[test]
	fn patch_all_keeps_order() {
		let containers: Vec<Container> = ["a", "b", "c"]
			.iter()
			.map(|n| Container {
				name: n.to_string(),
				..Default::default()
			})
			.collect();

		let (patched, any) = patcher().patch_all(&containers, "r");
		assert!(any);
		let names: Vec<&str> = patched.iter().map(|c| c.name.as_str()).collect();
		assert_eq!(names, vec!["a", "b", "c"]);
		assert!(patched.iter().all(|c| c.env.as_ref().unwrap().len() == 3));
	}

	#[test]
	fn generate_injector_container() {
		let container = injector_container(&config(), InjectorMode::Generate);

		assert_eq!(container.name, "generate-gcp-id-token");
		assert_eq!(container.image.as_deref(), Some("img"));
		assert_eq!(container.image_pull_policy.as_deref(), Some("IfNotPresent"));
		assert_eq!(
			container.command.unwrap(),
			vec!["/token-injector", "--file=/p/tok", "--refresh=false"]
		);
		assert_eq!(container.volume_mounts.unwrap(), vec![token_mount(&config())]);

		let resources = container.resources.unwrap();
		let requests = resources.requests.unwrap();
		let limits = resources.limits.unwrap();
		assert_eq!(requests.get("cpu"), Some(&Quantity("5m".to_string())));
		assert_eq!(requests.get("memory"), Some(&Quantity("10Mi".to_string())));
		assert_eq!(limits.get("cpu"), Some(&Quantity("20m".to_string())));
		assert_eq!(limits.get("memory"), Some(&Quantity("50Mi".to_string())));
	}

	#[test]
	fn update_injector_container() {
		let mut config = config();
		config.pull_policy = PullPolicy::Always;
		let container = injector_container(&config, InjectorMode::Update);

		assert_eq!(container.name, "update-gcp-id-token");
		assert_eq!(container.image_pull_policy.as_deref(), Some("Always"));
		assert_eq!(
			container.command.unwrap(),
			vec!["/token-injector", "--file=/p/tok", "--refresh=true"]
		);
	}

	#[test]
	fn volume_is_memory_backed_empty_dir() {
		let volume = injector_volume(&config());
		assert_eq!(volume.name, "v");
		assert_eq!(
			volume.empty_dir.unwrap().medium.as_deref(),
			Some("Memory")
		);
		assert!(volume.host_path.is_none());
	}

	#[test]
	fn mode_flags() {
		assert!(!InjectorMode::Generate.refresh());
		assert!(InjectorMode::Update.refresh());
	}
}

#[cfg(test)]
mod proptests {
	use std::sync::Arc;

	use proptest::prelude::*;

	use super::*;
	use crate::session_name::RandomSuffix;

	fn patcher(volume_path: &str, token_file: &str) -> ContainerPatcher {
		let config = InjectorConfig {
			volume_path: volume_path.to_string(),
			token_file: token_file.to_string(),
			..InjectorConfig::with_image("img")
		};
		ContainerPatcher::new(
			config,
			SessionNameGenerator::new(Arc::new(RandomSuffix::with_seed(1))),
		)
	}

	proptest! {
		#[test]
		fn patch_appends_exactly_one_mount_and_three_env_vars(
			existing_env in prop::collection::vec("[A-Z_]{1,12}", 0..6),
			existing_mounts in prop::collection::vec("[a-z-]{1,12}", 0..4),
			role in ".{0,64}",
		) {
			let container = Container {
				name: "app".to_string(),
				env: Some(existing_env.iter().map(|n| env_var(n, "x".to_string())).collect()),
				volume_mounts: Some(
					existing_mounts
						.iter()
						.map(|n| VolumeMount {
							name: n.clone(),
							mount_path: format!("/{n}"),
							..Default::default()
						})
						.collect(),
				),
				..Default::default()
			};

			let patched = patcher("/p", "tok").patch(&container, &role);
			let env = patched.env.unwrap();
			let mounts = patched.volume_mounts.unwrap();

			prop_assert_eq!(env.len(), existing_env.len() + 3);
			prop_assert_eq!(mounts.len(), existing_mounts.len() + 1);

			let prefix: Vec<String> = env[..existing_env.len()].iter().map(|e| e.name.clone()).collect();
			prop_assert_eq!(&prefix, &existing_env);

			let added = &env[existing_env.len()..];
			prop_assert_eq!(added[0].value.as_deref(), Some("/p/tok"));
			prop_assert_eq!(added[1].value.as_deref(), Some(role.as_str()));
			let session = added[2].value.clone().unwrap_or_default();
			let suffix = session.strip_prefix("token-injector-webhook-").unwrap_or_default();
			prop_assert_eq!(suffix.len(), 16);
			prop_assert!(suffix.chars().all(|c| c.is_ascii_lowercase()));
		}

		#[test]
		fn independent_patches_differ_only_in_session_name(
			existing_env in prop::collection::vec("[A-Z_]{1,12}", 0..6),
			seed in any::<u64>(),
			role in "[a-z0-9:/-]{1,40}",
		) {
			let container = Container {
				name: "app".to_string(),
				env: Some(existing_env.iter().map(|n| env_var(n, "x".to_string())).collect()),
				..Default::default()
			};
			let patcher = ContainerPatcher::new(
				InjectorConfig::with_image("img"),
				SessionNameGenerator::new(Arc::new(RandomSuffix::with_seed(seed))),
			);

			let first = patcher.patch(&container.clone(), &role);
			let second = patcher.patch(&container.clone(), &role);

			prop_assert_eq!(&first.volume_mounts, &second.volume_mounts);

			let first_env = first.env.unwrap();
			let second_env = second.env.unwrap();
			let shared = existing_env.len() + 2;
			prop_assert_eq!(&first_env[..shared], &second_env[..shared]);
			prop_assert_eq!(&first_env[shared].name, &second_env[shared].name);
			prop_assert_ne!(&first_env[shared].value, &second_env[shared].value);
		}

		#[test]
		fn injector_file_flag_joins_path_and_file(
			dir in "(/[a-z]{1,8}){1,4}",
			file in "[a-z.]{1,12}",
		) {
			let patcher = patcher(&dir, &file);
			let container = injector_container(patcher.config(), InjectorMode::Generate);
			let command = container.command.unwrap();
			prop_assert_eq!(command[1].clone(), format!("--file={dir}/{file}"));
		}
	}
}
