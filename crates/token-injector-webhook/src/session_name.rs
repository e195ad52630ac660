// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Role session names for injected credentials.
//!
//! A session name is `token-injector-webhook-<16 lowercase letters>`. The
//! suffix is a diagnostic label, not a secret, so a non-cryptographic
//! generator seeded once is enough. Tests inject [`FixedSuffix`] rather than
//! flipping any process-wide switch.

use std::sync::{Arc, Mutex, PoisonError};

pub const SESSION_NAME_PREFIX: &str = "token-injector-webhook";
pub const SESSION_SUFFIX_LEN: usize = 16;

/// Source of session-name suffixes.
pub trait SuffixSource: Send + Sync {
	/// Produce a suffix of exactly `len` characters.
	fn suffix(&self, len: usize) -> String;
}

/// Lowercase `a-z` suffixes from a generator seeded at construction.
pub struct RandomSuffix {
	rng: Mutex<fastrand::Rng>,
}

impl RandomSuffix {
	pub fn new() -> Self {
		Self {
			rng: Mutex::new(fastrand::Rng::new()),
		}
	}

	/// Reproducible sequence, for tests that need varying but stable output.
	pub fn with_seed(seed: u64) -> Self {
		Self {
			rng: Mutex::new(fastrand::Rng::with_seed(seed)),
		}
	}
}

impl Default for RandomSuffix {
	fn default() -> Self {
		Self::new()
	}
}

impl SuffixSource for RandomSuffix {
	fn suffix(&self, len: usize) -> String {
		let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
		(0..len).map(|_| rng.lowercase()).collect()
	}
}

/// Repeats a single character.
#[derive(Debug, Clone, Copy)]
pub struct FixedSuffix(pub char);

impl SuffixSource for FixedSuffix {
	fn suffix(&self, len: usize) -> String {
		std::iter::repeat(self.0).take(len).collect()
	}
}

#[derive(Clone)]
pub struct SessionNameGenerator {
	source: Arc<dyn SuffixSource>,
}

impl SessionNameGenerator {
	pub fn new(source: Arc<dyn SuffixSource>) -> Self {
		Self { source }
	}

	pub fn random() -> Self {
		Self::new(Arc::new(RandomSuffix::new()))
	}

	pub fn generate(&self) -> String {
		format!(
			"{SESSION_NAME_PREFIX}-{}",
			self.source.suffix(SESSION_SUFFIX_LEN)
		)
	}
}

impl std::fmt::Debug for SessionNameGenerator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionNameGenerator").finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fixed_suffix_has_requested_length() {
		for len in [0, 1, 16, 32, 100] {
			let suffix = FixedSuffix('0').suffix(len);
			assert_eq!(suffix.len(), len);
			assert!(suffix.chars().all(|c| c == '0'));
		}
	}

	#[test]
	fn random_suffix_is_lowercase_ascii() {
		let source = RandomSuffix::new();
		let suffix = source.suffix(SESSION_SUFFIX_LEN);
		assert_eq!(suffix.len(), SESSION_SUFFIX_LEN);
		assert!(suffix.chars().all(|c| c.is_ascii_lowercase()), "{suffix}");
	}

	#[test]
	fn seeded_sources_are_reproducible() {
		let a = RandomSuffix::with_seed(42);
		let b = RandomSuffix::with_seed(42);
		assert_eq!(a.suffix(16), b.suffix(16));
	}

	#[test]
	fn consecutive_suffixes_differ() {
		let source = RandomSuffix::with_seed(7);
		assert_ne!(source.suffix(16), source.suffix(16));
	}

	#[test]
	fn session_name_format() {
		let generator = SessionNameGenerator::new(Arc::new(FixedSuffix('0')));
		assert_eq!(generator.generate(), "token-injector-webhook-0000000000000000");

		let name = SessionNameGenerator::random().generate();
		let suffix = name
			.strip_prefix("token-injector-webhook-")
			.expect("prefix");
		assert_eq!(suffix.len(), 16);
		assert!(suffix.chars().all(|c| c.is_ascii_lowercase()));
	}
}
