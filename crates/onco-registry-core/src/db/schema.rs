//! SQLite schema definition.

/// Complete database schema for the oncology registry.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Lookup Vocabularies (administrator-curated reference data)
-- ============================================================================

CREATE TABLE IF NOT EXISTS lookup_cancer_site (
    id TEXT PRIMARY KEY,                         -- curated code, e.g. ICD topography
    label TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    modified_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS lookup_pathology (
    id TEXT PRIMARY KEY,
    label TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    modified_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS lookup_treatment_technique (
    id TEXT PRIMARY KEY,
    label TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    modified_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS lookup_billing_code (
    id TEXT PRIMARY KEY,
    label TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    modified_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS lookup_systemic_therapy_type (
    id TEXT PRIMARY KEY,
    label TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    modified_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS lookup_diagnosis_code (
    id TEXT PRIMARY KEY,
    label TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    modified_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    patient_id TEXT PRIMARY KEY,
    patient_uid TEXT NOT NULL UNIQUE,            -- hospital-issued identifier
    name TEXT NOT NULL,
    date_of_birth TEXT NOT NULL,
    gender TEXT NOT NULL CHECK (gender IN ('M', 'F', 'O')),
    date_of_registration TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    modified_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);

-- ============================================================================
-- Diagnoses
-- ============================================================================

CREATE TABLE IF NOT EXISTS diagnoses (
    diagnosis_id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(patient_id) ON DELETE CASCADE,
    cancer_site_id TEXT NOT NULL REFERENCES lookup_cancer_site(id) ON DELETE RESTRICT,
    cancer_side TEXT NOT NULL CHECK (cancer_side IN
        ('left', 'right', 'bilateral', 'midline', 'central', 'not_applicable')),
    cancer_pathology_id TEXT NOT NULL REFERENCES lookup_pathology(id) ON DELETE RESTRICT,
    diagnosis_code_id TEXT REFERENCES lookup_diagnosis_code(id) ON DELETE RESTRICT,
    date_of_diagnosis TEXT NOT NULL,
    t_stage_prefix TEXT CHECK (t_stage_prefix IN ('c', 'p', 'r', 'yc', 'yp')),
    t_stage_category TEXT CHECK (t_stage_category IN ('TX', 'T0', 'Tis', 'T1', 'T2', 'T3', 'T4')),
    t_stage_suffix TEXT CHECK (t_stage_suffix IN ('i', 'm', 'mi')),
    n_stage_prefix TEXT CHECK (n_stage_prefix IN ('c', 'p', 'r', 'yc', 'yp')),
    n_stage_category TEXT CHECK (n_stage_category IN ('NX', 'N0', 'N1', 'N2', 'N3')),
    n_stage_suffix TEXT CHECK (n_stage_suffix IN ('i', 'm', 'mi')),
    m_stage_prefix TEXT CHECK (m_stage_prefix IN ('c', 'p', 'r', 'yc', 'yp')),
    m_stage_category TEXT CHECK (m_stage_category IN ('M0', 'M1')),
    m_stage_suffix TEXT CHECK (m_stage_suffix IN ('i', 'm', 'mi')),
    overall_stage TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    modified_at TEXT NOT NULL DEFAULT (datetime('now')),
    -- an axis is absent or has both prefix and category; a suffix needs a category
    CHECK ((t_stage_prefix IS NULL) = (t_stage_category IS NULL)),
    CHECK (t_stage_suffix IS NULL OR t_stage_category IS NOT NULL),
    CHECK ((n_stage_prefix IS NULL) = (n_stage_category IS NULL)),
    CHECK (n_stage_suffix IS NULL OR n_stage_category IS NOT NULL),
    CHECK ((m_stage_prefix IS NULL) = (m_stage_category IS NULL)),
    CHECK (m_stage_suffix IS NULL OR m_stage_category IS NOT NULL),
    -- one diagnosis per clinical identity
    UNIQUE (patient_id, cancer_site_id, cancer_side, cancer_pathology_id)
);

CREATE INDEX IF NOT EXISTS idx_diagnoses_patient ON diagnoses(patient_id);

-- ============================================================================
-- Radiotherapy Bookings
-- ============================================================================

CREATE TABLE IF NOT EXISTS bookings (
    booking_id TEXT PRIMARY KEY,
    diagnosis_id TEXT NOT NULL REFERENCES diagnoses(diagnosis_id) ON DELETE CASCADE,
    treatment_intent TEXT NOT NULL CHECK (treatment_intent IN ('curative', 'palliative')),
    treatment_sequence TEXT NOT NULL CHECK (treatment_sequence IN
        ('definitive', 'adjuvant', 'neoadjuvant', 'prophylactic', 'palliative')),
    modality TEXT NOT NULL CHECK (modality IN ('EBRT', 'BRT')),
    treatment_technique_id TEXT NOT NULL REFERENCES lookup_treatment_technique(id) ON DELETE RESTRICT,
    billing_code_id TEXT NOT NULL REFERENCES lookup_billing_code(id) ON DELETE RESTRICT,
    concurrent_systemic_therapy INTEGER NOT NULL DEFAULT 0,
    proposed_planning_image_date TEXT,
    proposed_treatment_start_date TEXT,
    planned_total_dose REAL NOT NULL CHECK (planned_total_dose >= 0 AND planned_total_dose <= 300),
    planned_total_fractions INTEGER NOT NULL
        CHECK (planned_total_fractions >= 1 AND planned_total_fractions <= 300),
    planned_fractions_per_day INTEGER NOT NULL
        CHECK (planned_fractions_per_day >= 1 AND planned_fractions_per_day <= 4),
    planned_fractions_per_week INTEGER NOT NULL
        CHECK (planned_fractions_per_week >= 1 AND planned_fractions_per_week <= 28),
    -- derived columns, written on every insert and update
    planned_dose_per_fraction REAL NOT NULL,
    planned_treatment_duration_days INTEGER NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    modified_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK (planned_fractions_per_week >= planned_fractions_per_day),
    CHECK (planned_fractions_per_week <= planned_fractions_per_day * 7)
);

CREATE INDEX IF NOT EXISTS idx_bookings_diagnosis ON bookings(diagnosis_id);

-- Concurrent systemic therapy types, one row per (booking, type)
CREATE TABLE IF NOT EXISTS booking_systemic_therapy (
    booking_id TEXT NOT NULL REFERENCES bookings(booking_id) ON DELETE CASCADE,
    therapy_type_id TEXT NOT NULL REFERENCES lookup_systemic_therapy_type(id) ON DELETE RESTRICT,
    PRIMARY KEY (booking_id, therapy_type_id)
);

CREATE INDEX IF NOT EXISTS idx_booking_therapy_type ON booking_systemic_therapy(therapy_type_id);
"#;
