//! Plant disease advisory models

use serde::{Deserialize, Serialize};

/// Severity tier derived from classifier confidence
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
    Unknown,
}

impl Severity {
    /// >0.8 High, >0.6 Medium, otherwise Low
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence > 0.8 {
            Severity::High
        } else if confidence > 0.6 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// Disease assessment with treatment guidance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiseaseResult {
    pub disease_name: String,
    pub confidence: f32,
    pub severity: Severity,
    pub treatment_recommendations: Vec<String>,
    pub prevention_tips: Vec<String>,
}

struct CatalogEntry {
    name: &'static str,
    treatment: &'static [&'static str],
    prevention: &'static [&'static str],
}

/// Known diseases, matched in this order
const DISEASE_CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        name: "Healthy",
        treatment: &["Continue current practices", "Maintain regular monitoring"],
        prevention: &["Keep plants well-watered", "Ensure proper spacing", "Regular inspection"],
    },
    CatalogEntry {
        name: "Bacterial Blight",
        treatment: &[
            "Apply copper-based fungicide",
            "Remove infected plant parts",
            "Improve air circulation",
        ],
        prevention: &["Avoid overhead watering", "Plant resistant varieties", "Crop rotation"],
    },
    CatalogEntry {
        name: "Fungal Infection",
        treatment: &["Apply fungicide treatment", "Remove infected leaves", "Improve drainage"],
        prevention: &["Avoid waterlogging", "Proper spacing", "Regular pruning"],
    },
    CatalogEntry {
        name: "Viral Disease",
        treatment: &["Remove infected plants", "Control insect vectors", "Use virus-free seeds"],
        prevention: &[
            "Plant resistant varieties",
            "Control aphids and whiteflies",
            "Sanitize tools",
        ],
    },
    CatalogEntry {
        name: "Nutrient Deficiency",
        treatment: &["Apply appropriate fertilizer", "Soil testing", "Foliar feeding"],
        prevention: &["Regular soil testing", "Balanced fertilization", "Organic matter addition"],
    },
];

const GENERIC_TREATMENT: &[&str] = &["Consult with agricultural expert", "Apply appropriate treatment"];
const GENERIC_PREVENTION: &[&str] = &[
    "Regular monitoring",
    "Maintain plant health",
    "Proper cultural practices",
];
const HYGIENE_PREVENTION: &[&str] = &["Maintain proper plant hygiene", "Monitor regularly"];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Treatment and prevention lists for a classifier label.
///
/// A catalog entry matches when either name contains the other,
/// ignoring case. The first matching entry wins.
pub fn disease_recommendations(label: &str) -> (Vec<String>, Vec<String>) {
    let label = label.to_lowercase();
    DISEASE_CATALOG
        .iter()
        .find(|entry| {
            let name = entry.name.to_lowercase();
            label.contains(&name) || name.contains(&label)
        })
        .map(|entry| (owned(entry.treatment), owned(entry.prevention)))
        .unwrap_or_else(|| (owned(GENERIC_TREATMENT), owned(GENERIC_PREVENTION)))
}

/// Build the full disease result for a classifier output
pub fn classify_disease(raw_label: &str, confidence: f32) -> DiseaseResult {
    let (treatment_recommendations, prevention_tips) = disease_recommendations(raw_label);
    DiseaseResult {
        disease_name: raw_label.to_string(),
        confidence,
        severity: Severity::from_confidence(confidence),
        treatment_recommendations,
        prevention_tips,
    }
}

impl DiseaseResult {
    /// Result when no classifier is available
    pub fn unknown() -> Self {
        Self {
            disease_name: "Unknown".to_string(),
            confidence: 0.0,
            severity: Severity::Unknown,
            treatment_recommendations: owned(&["Consult with agricultural expert"]),
            prevention_tips: owned(HYGIENE_PREVENTION),
        }
    }

    /// Result when the classifier was reachable but could not process the image
    pub fn detection_error() -> Self {
        Self {
            disease_name: "Error in detection".to_string(),
            confidence: 0.0,
            severity: Severity::Unknown,
            treatment_recommendations: owned(&[
                "Unable to process image",
                "Consult with agricultural expert",
            ]),
            prevention_tips: owned(HYGIENE_PREVENTION),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_containing_catalog_name() {
        let result = classify_disease("severe bacterial blight detected", 0.9);
        assert_eq!(result.severity, Severity::High);
        assert_eq!(result.treatment_recommendations[0], "Apply copper-based fungicide");
        assert_eq!(result.disease_name, "severe bacterial blight detected");
    }

    #[test]
    fn test_catalog_name_containing_label() {
        let (treatment, _) = disease_recommendations("viral");
        assert_eq!(treatment[0], "Remove infected plants");
    }

    #[test]
    fn test_first_entry_wins() {
        // "healthy" appears first in the catalog, so it wins over later entries
        let (treatment, _) = disease_recommendations("Healthy leaf, no fungal infection");
        assert_eq!(treatment[0], "Continue current practices");
    }

    #[test]
    fn test_unmatched_label_gets_generic_advice() {
        let (treatment, prevention) = disease_recommendations("Leaf Rust");
        assert_eq!(treatment, vec!["Consult with agricultural expert", "Apply appropriate treatment"]);
        assert_eq!(prevention.len(), 3);
    }

    #[test]
    fn test_severity_tiers() {
        assert_eq!(Severity::from_confidence(0.81), Severity::High);
        assert_eq!(Severity::from_confidence(0.8), Severity::Medium);
        assert_eq!(Severity::from_confidence(0.61), Severity::Medium);
        assert_eq!(Severity::from_confidence(0.6), Severity::Low);
    }

    #[test]
    fn test_unknown_result() {
        let result = DiseaseResult::unknown();
        assert_eq!(result.disease_name, "Unknown");
        assert_eq!(result.severity, Severity::Unknown);
        assert_eq!(result.prevention_tips, vec!["Maintain proper plant hygiene", "Monitor regularly"]);
    }
}
