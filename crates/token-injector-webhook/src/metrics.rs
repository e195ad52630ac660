// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::time::Duration;

use prometheus::{CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

/// How an admission review was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
	/// Allowed with a non-empty patch.
	Mutated,
	/// Role bound but nothing to change.
	Unchanged,
	/// Not a Pod, no object, or no role bound.
	Skipped,
	/// The engine failed and the review was denied.
	Denied,
	/// The request could not be decoded.
	Invalid,
}

impl ReviewOutcome {
	pub fn as_str(&self) -> &'static str {
		match self {
			ReviewOutcome::Mutated => "mutated",
			ReviewOutcome::Unchanged => "unchanged",
			ReviewOutcome::Skipped => "skipped",
			ReviewOutcome::Denied => "denied",
			ReviewOutcome::Invalid => "invalid",
		}
	}
}

pub struct WebhookMetrics {
	registry: Registry,

	pub admission_reviews: CounterVec,
	pub admission_duration: Histogram,
}

impl WebhookMetrics {
	pub fn new() -> Result<Self, prometheus::Error> {
		let registry = Registry::new();

		let admission_reviews = CounterVec::new(
			Opts::new(
				"token_injector_admission_reviews_total",
				"Total admission reviews handled",
			),
			&["outcome"],
		)?;
		registry.register(Box::new(admission_reviews.clone()))?;

		let admission_duration = Histogram::with_opts(
			HistogramOpts::new(
				"token_injector_admission_duration_seconds",
				"Time spent answering an admission review",
			)
			.buckets(vec![
				0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
			]),
		)?;
		registry.register(Box::new(admission_duration.clone()))?;

		Ok(Self {
			registry,
			admission_reviews,
			admission_duration,
		})
	}

	pub fn record_review(&self, outcome: ReviewOutcome, elapsed: Duration) {
		self
			.admission_reviews
			.with_label_values(&[outcome.as_str()])
			.inc();
		self.admission_duration.observe(elapsed.as_secs_f64());
	}

	/// Render every registered metric in the Prometheus text format.
	pub fn encode(&self) -> Result<String, prometheus::Error> {
		let encoder = TextEncoder::new();
		let metric_families = self.registry.gather();
		let mut buffer = Vec::new();
		encoder.encode(&metric_families, &mut buffer)?;
		String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
	}
}
