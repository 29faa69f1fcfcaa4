//! Closed clinical vocabularies.
//!
//! Every enum here has a stable code that is what gets stored in SQLite and
//! exchanged over FFI. Variants never reorder and codes never change meaning;
//! retiring a value means keeping the variant and hiding it in the UI.

use thiserror::Error;

/// A string that is not a code of the vocabulary it was parsed against.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} code: {value:?}")]
pub struct InvalidCode {
    pub kind: &'static str,
    pub value: String,
}

/// Defines a clinical enum with a fixed code per variant, plus `as_str`,
/// `FromStr`, `Display` and serde impls that all speak the stored codes.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Stored code for this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code),+
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = InvalidCode;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($code => Ok(Self::$variant),)+
                    _ => Err(InvalidCode { kind: $kind, value: s.to_string() }),
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(::serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use str_enum;

str_enum!(
    /// Administrative gender as captured at registration.
    Gender, "gender" {
        Male => "M",
        Female => "F",
        Other => "O",
    }
);

str_enum!(
    /// Laterality of the primary tumour.
    CancerSide, "cancer_side" {
        Left => "left",
        Right => "right",
        Bilateral => "bilateral",
        Midline => "midline",
        Central => "central",
        NotApplicable => "not_applicable",
    }
);

str_enum!(
    /// Overall aim of the radiotherapy course.
    TreatmentIntent, "treatment_intent" {
        Curative => "curative",
        Palliative => "palliative",
    }
);

str_enum!(
    /// Position of radiotherapy relative to other treatment.
    TreatmentSequence, "treatment_sequence" {
        Definitive => "definitive",
        Adjuvant => "adjuvant",
        Neoadjuvant => "neoadjuvant",
        Prophylactic => "prophylactic",
        Palliative => "palliative",
    }
);

str_enum!(
    /// Delivery modality: external beam or brachytherapy.
    Modality, "modality" {
        Ebrt => "EBRT",
        Brt => "BRT",
    }
);

str_enum!(
    /// AJCC evidence prefix for a staging axis.
    StagePrefix, "stage_prefix" {
        Clinical => "c",
        Pathological => "p",
        Recurrent => "r",
        PostNeoadjuvantClinical => "yc",
        PostNeoadjuvantPathological => "yp",
    }
);

str_enum!(
    /// AJCC suffix qualifying a staging category.
    StageSuffix, "stage_suffix" {
        IsolatedCells => "i",
        Multifocal => "m",
        Micrometastasis => "mi",
    }
);

str_enum!(
    /// Extent of the primary tumour.
    TCategory, "t_category" {
        Tx => "TX",
        T0 => "T0",
        Tis => "Tis",
        T1 => "T1",
        T2 => "T2",
        T3 => "T3",
        T4 => "T4",
    }
);

str_enum!(
    /// Regional lymph node involvement.
    NCategory, "n_category" {
        Nx => "NX",
        N0 => "N0",
        N1 => "N1",
        N2 => "N2",
        N3 => "N3",
    }
);

str_enum!(
    /// Distant metastasis status.
    MCategory, "m_category" {
        M0 => "M0",
        M1 => "M1",
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_codes_round_trip() {
        for gender in [Gender::Male, Gender::Female, Gender::Other] {
            assert_eq!(gender.as_str().parse::<Gender>().unwrap(), gender);
        }
        assert_eq!("F".parse::<Gender>().unwrap(), Gender::Female);
    }

    #[test]
    fn test_cancer_side_codes_round_trip() {
        for side in [
            CancerSide::Left,
            CancerSide::Right,
            CancerSide::Bilateral,
            CancerSide::Midline,
            CancerSide::Central,
            CancerSide::NotApplicable,
        ] {
            assert_eq!(side.as_str().parse::<CancerSide>().unwrap(), side);
        }
    }

    #[test]
    fn test_stage_prefix_codes_round_trip() {
        for prefix in [
            StagePrefix::Clinical,
            StagePrefix::Pathological,
            StagePrefix::Recurrent,
            StagePrefix::PostNeoadjuvantClinical,
            StagePrefix::PostNeoadjuvantPathological,
        ] {
            assert_eq!(prefix.as_str().parse::<StagePrefix>().unwrap(), prefix);
        }
        assert_eq!("yp".parse::<StagePrefix>().unwrap(), StagePrefix::PostNeoadjuvantPathological);
    }

    #[test]
    fn test_t_category_accepts_in_situ() {
        assert_eq!("Tis".parse::<TCategory>().unwrap(), TCategory::Tis);
        assert_eq!(TCategory::Tx.as_str(), "TX");
    }

    #[test]
    fn test_invalid_code_is_rejected_with_kind() {
        let err = "sideways".parse::<CancerSide>().unwrap_err();
        assert_eq!(err.kind, "cancer_side");
        assert_eq!(err.value, "sideways");

        assert!("T5".parse::<TCategory>().is_err());
        assert!("m2".parse::<MCategory>().is_err());
        assert!("x".parse::<Gender>().is_err());
    }

    #[test]
    fn test_serde_uses_stored_codes() {
        let json = serde_json::to_string(&Modality::Ebrt).unwrap();
        assert_eq!(json, "\"EBRT\"");
        let back: Modality = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Modality::Ebrt);

        assert!(serde_json::from_str::<Modality>("\"IMRT\"").is_err());
    }
}
