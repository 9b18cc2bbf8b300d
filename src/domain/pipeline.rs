//! Pipeline state: wizard step, synthesis parameters, gallery filters,
//! training checkpoints and resource readings.

use serde::{Deserialize, Serialize};

use super::sample::Gender;

/// Wizard stage of the synthesis pipeline. Ordering is part of the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStep {
    #[default]
    Upload,
    Train,
    Generate,
    Analyze,
    Export,
}

impl PipelineStep {
    /// All stages in pipeline order.
    pub const ALL: [PipelineStep; 5] = [
        PipelineStep::Upload,
        PipelineStep::Train,
        PipelineStep::Generate,
        PipelineStep::Analyze,
        PipelineStep::Export,
    ];

    /// Zero-based position in the pipeline.
    pub fn index(self) -> usize {
        match self {
            PipelineStep::Upload => 0,
            PipelineStep::Train => 1,
            PipelineStep::Generate => 2,
            PipelineStep::Analyze => 3,
            PipelineStep::Export => 4,
        }
    }

    /// Human-readable stage name.
    pub fn label(self) -> &'static str {
        match self {
            PipelineStep::Upload => "Upload",
            PipelineStep::Train => "Train",
            PipelineStep::Generate => "Generate",
            PipelineStep::Analyze => "Analyze",
            PipelineStep::Export => "Export",
        }
    }
}

/// Target share of each severity grade in the generated cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityMix {
    pub mild: f64,
    pub moderate: f64,
    pub severe: f64,
}

impl Default for SeverityMix {
    fn default() -> Self {
        Self {
            mild: 0.34,
            moderate: 0.33,
            severe: 0.33,
        }
    }
}

/// Inclusive age bounds for generated patients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u32,
    pub max: u32,
}

impl Default for AgeRange {
    fn default() -> Self {
        Self { min: 18, max: 90 }
    }
}

/// Synthesis parameters tuned by the researcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Proportion of the cohort carrying the clinical condition.
    pub disease_prevalence: f64,
    pub severity_mix: SeverityMix,
    pub age_range: AgeRange,
    /// Higher noise increases diversity at the cost of strict fidelity.
    pub noise_level: f64,
    /// Samples generated per GPU cycle.
    pub batch_size: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            disease_prevalence: 0.15,
            severity_mix: SeverityMix::default(),
            age_range: AgeRange::default(),
            noise_level: 0.05,
            batch_size: 64,
        }
    }
}

/// Partial update for [`PipelineConfig`]; absent fields keep prior values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfigPatch {
    pub disease_prevalence: Option<f64>,
    pub severity_mix: Option<SeverityMix>,
    pub age_range: Option<AgeRange>,
    pub noise_level: Option<f64>,
    pub batch_size: Option<u32>,
}

impl PipelineConfig {
    /// Apply a shallow merge of `patch` onto this config.
    pub fn apply(&mut self, patch: &PipelineConfigPatch) {
        if let Some(value) = patch.disease_prevalence {
            self.disease_prevalence = value;
        }
        if let Some(mix) = &patch.severity_mix {
            self.severity_mix = mix.clone();
        }
        if let Some(range) = &patch.age_range {
            self.age_range = range.clone();
        }
        if let Some(value) = patch.noise_level {
            self.noise_level = value;
        }
        if let Some(value) = patch.batch_size {
            self.batch_size = value;
        }
    }
}

/// Predicate state applied to the sample collection at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    pub min_confidence: f64,
    pub flagged_only: bool,
}

impl Default for GalleryFilters {
    fn default() -> Self {
        Self {
            condition: None,
            severity: None,
            gender: None,
            min_confidence: 0.7,
            flagged_only: false,
        }
    }
}

/// Partial update for [`GalleryFilters`].
///
/// The optional predicates are tri-state: absent keeps the prior value,
/// `Some(None)` clears the predicate, `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GalleryFiltersPatch {
    pub condition: Option<Option<String>>,
    pub severity: Option<Option<String>>,
    pub gender: Option<Option<Gender>>,
    pub min_confidence: Option<f64>,
    pub flagged_only: Option<bool>,
}

impl GalleryFilters {
    /// Apply a shallow merge of `patch` onto these filters.
    pub fn apply(&mut self, patch: &GalleryFiltersPatch) {
        if let Some(condition) = &patch.condition {
            self.condition = condition.clone();
        }
        if let Some(severity) = &patch.severity {
            self.severity = severity.clone();
        }
        if let Some(gender) = &patch.gender {
            self.gender = *gender;
        }
        if let Some(value) = patch.min_confidence {
            self.min_confidence = value;
        }
        if let Some(value) = patch.flagged_only {
            self.flagged_only = value;
        }
    }
}

/// A saved model checkpoint surfaced during training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    pub epoch: u32,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fid_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    pub is_best: bool,
}

/// Checkpoint fields known at save time; id and timestamp are assigned when
/// the entry is recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCheckpoint {
    pub epoch: u32,
    pub fid_score: Option<f64>,
    pub accuracy: Option<f64>,
    pub is_best: bool,
}

/// Local and cluster resource readings. Absent means "not reported", never
/// zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_memory_gb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_load_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_load_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram_used_gb: Option<f64>,
}

/// Partial update for [`ResourceUsage`]; readings are only ever refreshed,
/// not cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceUsagePatch {
    pub gpu_memory_gb: Option<f64>,
    pub gpu_load_pct: Option<f64>,
    pub cpu_load_pct: Option<f64>,
    pub ram_used_gb: Option<f64>,
}

impl ResourceUsage {
    /// Apply a shallow merge of `patch` onto these readings.
    pub fn apply(&mut self, patch: &ResourceUsagePatch) {
        if let Some(value) = patch.gpu_memory_gb {
            self.gpu_memory_gb = Some(value);
        }
        if let Some(value) = patch.gpu_load_pct {
            self.gpu_load_pct = Some(value);
        }
        if let Some(value) = patch.cpu_load_pct {
            self.cpu_load_pct = Some(value);
        }
        if let Some(value) = patch.ram_used_gb {
            self.ram_used_gb = Some(value);
        }
    }
}

/// A timestamped copy of the resource readings, kept in a bounded history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub timestamp: String,
    pub usage: ResourceUsage,
}
