//! End-to-end walkthrough: seed the vocabularies, register a patient with a
//! staged diagnosis, book a radiotherapy course and print the exported
//! dataset.
//!
//! Run with: cargo run --example registry_demo

use anyhow::Result;

use onco_registry_core::db::Database;
use onco_registry_core::export::RegistryExporter;
use onco_registry_core::models::{
    CancerSide, Diagnosis, Gender, LookupEntry, LookupKind, MCategory, MStage, Modality,
    NCategory, NStage, Patient, RadiotherapyBooking, StagePrefix, TCategory, TStage,
    TreatmentIntent, TreatmentSequence,
};

fn main() -> Result<()> {
    let mut db = Database::open_in_memory()?;

    // vocabularies first: clinical records only reference curated codes
    for (kind, id, label) in [
        (LookupKind::CancerSite, "C50.4", "Breast, upper-outer quadrant"),
        (LookupKind::Pathology, "8500/3", "Invasive ductal carcinoma"),
        (LookupKind::TreatmentTechnique, "VMAT", "Volumetric arc therapy"),
        (LookupKind::BillingCode, "RT-301", "Complex radiotherapy planning"),
        (LookupKind::SystemicTherapyType, "CHEMO", "Chemotherapy"),
        (LookupKind::DiagnosisCode, "ICD-C50", "Malignant neoplasm of breast"),
    ] {
        db.upsert_lookup(kind, &LookupEntry::new(id.to_string(), label.to_string()))?;
    }

    let mut patient = Patient::new(
        "MRN-88410".to_string(),
        "Amara Osei".to_string(),
        "1962-03-14".parse()?,
        Gender::Female,
    );
    patient.date_of_registration = "2024-01-15".parse()?;
    db.insert_patient(&patient)?;
    println!(
        "registered {} (age {} at registration)",
        patient.name,
        patient.age_at_registration().unwrap_or(0)
    );

    let mut diagnosis = Diagnosis::new(
        patient.patient_id.clone(),
        "C50.4".to_string(),
        CancerSide::Left,
        "8500/3".to_string(),
        "2024-02-01".parse()?,
    );
    diagnosis.diagnosis_code_id = Some("ICD-C50".to_string());
    diagnosis.t_stage = Some(TStage::new(StagePrefix::Clinical, TCategory::T2));
    diagnosis.n_stage = Some(NStage::new(StagePrefix::Clinical, NCategory::N1));
    diagnosis.m_stage = Some(MStage::new(StagePrefix::Clinical, MCategory::M0));
    diagnosis.overall_stage = Some("IIB".to_string());
    db.insert_diagnosis(&diagnosis)?;
    println!(
        "recorded diagnosis {} ({})",
        diagnosis.cancer_site_id,
        diagnosis.staging_display().unwrap_or_default()
    );

    let mut booking = RadiotherapyBooking::new(
        diagnosis.diagnosis_id.clone(),
        TreatmentIntent::Curative,
        TreatmentSequence::Adjuvant,
        Modality::Ebrt,
        "VMAT".to_string(),
        "RT-301".to_string(),
    );
    booking.planned_total_dose = 50.0;
    booking.planned_total_fractions = 25;
    booking.concurrent_systemic_therapy = true;
    booking.systemic_therapy_type_ids = vec!["CHEMO".to_string()];
    booking.proposed_planning_image_date = Some("2024-03-04".parse()?);
    booking.proposed_treatment_start_date = Some("2024-03-18".parse()?);
    db.insert_booking(&booking)?;
    println!(
        "booked {} Gy in {} fractions: {:.2} Gy per fraction over {} days",
        booking.planned_total_dose,
        booking.planned_total_fractions,
        booking.planned_dose_per_fraction()?,
        booking.planned_treatment_duration_days()?,
    );

    let exporter = RegistryExporter::new(&db);
    let dataset = exporter.export_all()?;
    println!("\n{}", dataset.to_csv());

    Ok(())
}
