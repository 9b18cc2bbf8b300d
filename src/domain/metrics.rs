//! Metric snapshots computed by the external service and merely displayed here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One training-progress snapshot, produced once per stream message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub epoch: u32,
    pub loss: f64,
    pub accuracy: f64,
    pub discriminator_loss: f64,
    pub generator_loss: f64,
}

/// Privacy evaluation of the generated cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivacyMetrics {
    pub average_privacy_score: f64,
    pub reidentification_risk_score: f64,
}

/// Demographic balance of the generated cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasMetrics {
    pub gender_distribution: BTreeMap<String, f64>,
    pub ethnicity_distribution: BTreeMap<String, f64>,
    pub age_group_distribution: BTreeMap<String, f64>,
    pub condition_prevalence: BTreeMap<String, f64>,
}

/// How closely synthetic data tracks the source distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FidelityMetrics {
    pub real_vs_synthetic_similarity: f64,
    pub feature_correlation_matrix: BTreeMap<String, f64>,
}

/// Aggregate analytics snapshot from `GET /analytics`.
///
/// The nested metric groups are optional: the service omits them until the
/// corresponding evaluation has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsMetrics {
    pub total_samples_generated: u64,
    pub active_models: u32,
    pub compute_usage_hours: f64,
    pub accuracy_metrics: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_metrics: Option<PrivacyMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bias_metrics: Option<BiasMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fidelity_metrics: Option<FidelityMetrics>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analytics_tolerates_missing_metric_groups() {
        let json = r#"{
            "total_samples_generated": 5000,
            "active_models": 2,
            "compute_usage_hours": 41.5,
            "accuracy_metrics": {}
        }"#;
        let metrics: AnalyticsMetrics = serde_json::from_str(json).unwrap();
        assert_eq!(metrics.total_samples_generated, 5000);
        assert!(metrics.privacy_metrics.is_none());
        assert!(metrics.bias_metrics.is_none());
    }

    #[test]
    fn training_metrics_parse_from_stream_shape() {
        let json = r#"{
            "epoch": 12,
            "loss": 0.41,
            "accuracy": 0.87,
            "discriminator_loss": 0.52,
            "generator_loss": 0.33
        }"#;
        let metrics: TrainingMetrics = serde_json::from_str(json).unwrap();
        assert_eq!(metrics.epoch, 12);
        assert!((metrics.generator_loss - 0.33).abs() < f64::EPSILON);
    }
}
