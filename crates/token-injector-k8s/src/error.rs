// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Errors that can occur during K8s operations.
#[derive(Error, Debug)]
pub enum K8sError {
	#[error("K8s API error: {message}")]
	ApiError { message: String },

	#[error("ServiceAccount not found: {namespace}/{name}")]
	ServiceAccountNotFound { name: String, namespace: String },

	#[error("Access to ServiceAccount {namespace}/{name} denied: {message}")]
	Forbidden {
		name: String,
		namespace: String,
		message: String,
	},
}

impl From<kube::Error> for K8sError {
	fn from(err: kube::Error) -> Self {
		K8sError::ApiError {
			message: err.to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn not_found_names_the_object() {
		let err = K8sError::ServiceAccountNotFound {
			name: "builder".to_string(),
			namespace: "ci".to_string(),
		};
		assert_eq!(err.to_string(), "ServiceAccount not found: ci/builder");
	}

	#[test]
	fn forbidden_carries_api_message() {
		let err = K8sError::Forbidden {
			name: "builder".to_string(),
			namespace: "ci".to_string(),
			message: "cannot get serviceaccounts".to_string(),
		};
		assert!(err.to_string().contains("ci/builder"));
		assert!(err.to_string().contains("cannot get serviceaccounts"));
	}
}
