//! Synthetic sample records and the request shape that produces them.

use serde::{Deserialize, Serialize};

/// Reported gender of a synthetic patient record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Reported ethnicity of a synthetic patient record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ethnicity {
    Asian,
    Caucasian,
    African,
    Hispanic,
    Other,
}

/// Diabetic retinopathy severity grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrLevel {
    None,
    Mild,
    Moderate,
    Severe,
    Proliferative,
}

/// Demographic attributes attached to a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub age: u32,
    pub gender: Gender,
    pub ethnicity: Ethnicity,
}

/// Reviewer-facing medical annotations on a sample.
///
/// Fields the external service has not computed yet stay absent rather than
/// defaulting to zero, so missing data is never mistaken for a real score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    pub confidence_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flagged: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

/// One synthetic record produced by the external generation service.
///
/// Created by generation calls; mutated in place by reviewer actions, never
/// deleted, only filtered at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSample {
    pub id: String,
    pub timestamp: String,
    pub modality: String,
    pub image_url: String,
    pub confidence_score: f64,
    pub is_synthetic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demographics: Option<Demographics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_metadata: Option<MedicalMetadata>,
}

/// Partial update applied to a sample by reviewer actions.
///
/// Present fields replace the corresponding sample fields wholesale; absent
/// fields keep their prior values (shallow merge).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SamplePatch {
    pub modality: Option<String>,
    pub image_url: Option<String>,
    pub confidence_score: Option<f64>,
    pub demographics: Option<Demographics>,
    pub medical_metadata: Option<MedicalMetadata>,
}

impl SyntheticSample {
    /// Apply a shallow merge of `patch` onto this sample.
    pub fn apply(&mut self, patch: &SamplePatch) {
        if let Some(modality) = &patch.modality {
            self.modality = modality.clone();
        }
        if let Some(image_url) = &patch.image_url {
            self.image_url = image_url.clone();
        }
        if let Some(confidence_score) = patch.confidence_score {
            self.confidence_score = confidence_score;
        }
        if let Some(demographics) = &patch.demographics {
            self.demographics = Some(demographics.clone());
        }
        if let Some(metadata) = &patch.medical_metadata {
            self.medical_metadata = Some(metadata.clone());
        }
    }
}

/// Patient parameters submitted to the generation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientData {
    pub age: u32,
    pub condition: String,
    pub scan_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SyntheticSample {
        SyntheticSample {
            id: "s-1".into(),
            timestamp: "2024-01-28T09:00:00Z".into(),
            modality: "Fundus".into(),
            image_url: "https://img/1.png".into(),
            confidence_score: 0.8,
            is_synthetic: true,
            demographics: None,
            medical_metadata: None,
        }
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let mut s = sample();
        s.apply(&SamplePatch {
            confidence_score: Some(0.95),
            ..SamplePatch::default()
        });
        assert_eq!(s.confidence_score, 0.95);
        assert_eq!(s.modality, "Fundus");
        assert!(s.medical_metadata.is_none());
    }

    #[test]
    fn wire_enums_keep_original_spellings() {
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"Female\"");
        assert_eq!(
            serde_json::to_string(&DrLevel::Proliferative).unwrap(),
            "\"Proliferative\""
        );
    }

    #[test]
    fn absent_metadata_round_trips_as_absent() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("medical_metadata").is_none());
        let back: SyntheticSample = serde_json::from_value(json).unwrap();
        assert!(back.medical_metadata.is_none());
    }
}
