//! Inference metrics.

use metrics::{counter, histogram};

pub mod names {
    /// Inference calls by model role and outcome.
    pub const INFERENCE_TOTAL: &str = "neo_inference_requests_total";

    /// Inference latency in seconds by model role.
    pub const INFERENCE_LATENCY_SECONDS: &str = "neo_inference_latency_seconds";
}

pub fn record_inference(role: &str, success: bool, latency_ms: f64) {
    counter!(
        names::INFERENCE_TOTAL,
        "role" => role.to_string(),
        "outcome" => if success { "success" } else { "error" }
    )
    .increment(1);

    histogram!(names::INFERENCE_LATENCY_SECONDS, "role" => role.to_string())
        .record(latency_ms / 1000.0);
}
