//! Controlled-vocabulary lookup tables.
//!
//! Clinical records never carry free-text sites, pathologies, techniques,
//! billing codes, systemic therapy types or diagnosis codes; they reference
//! entries in one of six administrator-curated vocabularies.

use serde::{Deserialize, Serialize};

use super::enums::{str_enum, InvalidCode};

str_enum!(
    /// The six vocabularies a clinical record can reference.
    LookupKind, "lookup_kind" {
        CancerSite => "cancer_site",
        Pathology => "pathology",
        TreatmentTechnique => "treatment_technique",
        BillingCode => "billing_code",
        SystemicTherapyType => "systemic_therapy_type",
        DiagnosisCode => "diagnosis_code",
    }
);

impl LookupKind {
    /// Backing table for this vocabulary.
    pub fn table(&self) -> &'static str {
        match self {
            Self::CancerSite => "lookup_cancer_site",
            Self::Pathology => "lookup_pathology",
            Self::TreatmentTechnique => "lookup_treatment_technique",
            Self::BillingCode => "lookup_billing_code",
            Self::SystemicTherapyType => "lookup_systemic_therapy_type",
            Self::DiagnosisCode => "lookup_diagnosis_code",
        }
    }

    pub const ALL: [LookupKind; 6] = [
        Self::CancerSite,
        Self::Pathology,
        Self::TreatmentTechnique,
        Self::BillingCode,
        Self::SystemicTherapyType,
        Self::DiagnosisCode,
    ];
}

/// One entry of a controlled vocabulary.
///
/// The `id` is the curated code itself (ICD code, billing tariff number,
/// local technique abbreviation) and is the value clinical records store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LookupEntry {
    pub id: String,
    pub label: String,
    pub created_at: String,
    pub modified_at: String,
}

impl LookupEntry {
    pub fn new(id: String, label: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id,
            label,
            created_at: now.clone(),
            modified_at: now,
        }
    }
}
