//! Cancer diagnosis model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::CancerSide;
use super::staging::{MStage, NStage, TStage};

/// A confirmed cancer diagnosis for a patient.
///
/// The registry treats (patient, site, side, pathology) as the clinical
/// identity of a diagnosis; a second record with the same tuple is a
/// duplicate and is refused by storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Diagnosis {
    /// Surrogate UUID - generated locally
    pub diagnosis_id: String,
    /// Owning patient
    pub patient_id: String,
    /// Cancer site vocabulary code
    pub cancer_site_id: String,
    /// Laterality of the primary
    pub cancer_side: CancerSide,
    /// Pathology vocabulary code
    pub cancer_pathology_id: String,
    /// Optional coded diagnosis from the diagnosis-code vocabulary
    pub diagnosis_code_id: Option<String>,
    /// Date the diagnosis was confirmed
    pub date_of_diagnosis: NaiveDate,
    /// Primary tumour axis, when staged
    pub t_stage: Option<TStage>,
    /// Nodal axis, when staged
    pub n_stage: Option<NStage>,
    /// Metastasis axis, when staged
    pub m_stage: Option<MStage>,
    /// Overall AJCC stage group (e.g. "IIB"), free text
    pub overall_stage: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub modified_at: String,
}

impl Diagnosis {
    /// Create a new unstaged diagnosis.
    pub fn new(
        patient_id: String,
        cancer_site_id: String,
        cancer_side: CancerSide,
        cancer_pathology_id: String,
        date_of_diagnosis: NaiveDate,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            diagnosis_id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            cancer_site_id,
            cancer_side,
            cancer_pathology_id,
            diagnosis_code_id: None,
            date_of_diagnosis,
            t_stage: None,
            n_stage: None,
            m_stage: None,
            overall_stage: None,
            created_at: now.clone(),
            modified_at: now,
        }
    }

    /// Whether any staging axis has been recorded.
    pub fn is_staged(&self) -> bool {
        self.t_stage.is_some() || self.n_stage.is_some() || self.m_stage.is_some()
    }

    /// Present axes in standard notation, e.g. `"cT2 cN1 cM0"`.
    pub fn staging_display(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(t) = &self.t_stage {
            parts.push(t.to_string());
        }
        if let Some(n) = &self.n_stage {
            parts.push(n.to_string());
        }
        if let Some(m) = &self.m_stage {
            parts.push(m.to_string());
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{MCategory, NCategory, StagePrefix, StageSuffix, TCategory};

    fn sample() -> Diagnosis {
        Diagnosis::new(
            "patient-1".into(),
            "C50.9".into(),
            CancerSide::Left,
            "8500/3".into(),
            NaiveDate::from_ymd_opt(2024, 2, 20).unwrap(),
        )
    }

    #[test]
    fn test_new_diagnosis_is_unstaged() {
        let diagnosis = sample();
        assert_eq!(diagnosis.diagnosis_id.len(), 36);
        assert!(!diagnosis.is_staged());
        assert_eq!(diagnosis.staging_display(), None);
        assert_eq!(diagnosis.diagnosis_code_id, None);
    }

    #[test]
    fn test_staging_display_joins_present_axes() {
        let mut diagnosis = sample();
        diagnosis.t_stage = Some(TStage::new(StagePrefix::Clinical, TCategory::T2));
        diagnosis.m_stage = Some(MStage::new(StagePrefix::Clinical, MCategory::M0));
        assert_eq!(diagnosis.staging_display().unwrap(), "cT2 cM0");

        diagnosis.n_stage = Some(
            NStage::new(StagePrefix::Pathological, NCategory::N1)
                .with_suffix(StageSuffix::Micrometastasis),
        );
        assert_eq!(diagnosis.staging_display().unwrap(), "cT2 pN1(mi) cM0");
    }
}
