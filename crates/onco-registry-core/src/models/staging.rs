//! AJCC/TNM staging axes.
//!
//! Each axis is stored as up to three columns (prefix, category, suffix) and
//! surfaces here as a single struct. An axis is either fully absent or has at
//! least prefix and category; a suffix alone is not a valid axis.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::enums::{InvalidCode, MCategory, NCategory, StagePrefix, StageSuffix, TCategory};

/// Recompose one axis from its stored column values.
///
/// `(None, None, None)` means the axis was not staged. Any other partial
/// combination only occurs on a corrupted row and is reported as such.
fn parse_axis<C>(
    axis: &'static str,
    prefix: Option<&str>,
    category: Option<&str>,
    suffix: Option<&str>,
) -> Result<Option<(StagePrefix, C, Option<StageSuffix>)>, InvalidCode>
where
    C: std::str::FromStr<Err = InvalidCode>,
{
    let (prefix, category) = match (prefix, category) {
        (Some(prefix), Some(category)) => (prefix, category),
        (None, None) if suffix.is_none() => return Ok(None),
        _ => {
            return Err(InvalidCode {
                kind: axis,
                value: "partially stored axis".to_string(),
            })
        }
    };
    let suffix = suffix.map(|s| s.parse::<StageSuffix>()).transpose()?;
    Ok(Some((prefix.parse()?, category.parse()?, suffix)))
}

/// Primary tumour (T) axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TStage {
    pub prefix: StagePrefix,
    pub category: TCategory,
    pub suffix: Option<StageSuffix>,
}

impl TStage {
    pub fn new(prefix: StagePrefix, category: TCategory) -> Self {
        Self { prefix, category, suffix: None }
    }

    pub fn with_suffix(mut self, suffix: StageSuffix) -> Self {
        self.suffix = Some(suffix);
        self
    }

    /// Stored column values, in (prefix, category, suffix) order.
    pub fn codes(&self) -> (&'static str, &'static str, Option<&'static str>) {
        (self.prefix.as_str(), self.category.as_str(), self.suffix.map(|s| s.as_str()))
    }

    pub fn from_codes(
        prefix: Option<&str>,
        category: Option<&str>,
        suffix: Option<&str>,
    ) -> Result<Option<Self>, InvalidCode> {
        Ok(parse_axis("t_stage", prefix, category, suffix)?
            .map(|(prefix, category, suffix)| Self { prefix, category, suffix }))
    }
}

impl fmt::Display for TStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.category)?;
        if let Some(suffix) = self.suffix {
            write!(f, "({suffix})")?;
        }
        Ok(())
    }
}

/// Regional lymph node (N) axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NStage {
    pub prefix: StagePrefix,
    pub category: NCategory,
    pub suffix: Option<StageSuffix>,
}

impl NStage {
    pub fn new(prefix: StagePrefix, category: NCategory) -> Self {
        Self { prefix, category, suffix: None }
    }

    pub fn with_suffix(mut self, suffix: StageSuffix) -> Self {
        self.suffix = Some(suffix);
        self
    }

    pub fn codes(&self) -> (&'static str, &'static str, Option<&'static str>) {
        (self.prefix.as_str(), self.category.as_str(), self.suffix.map(|s| s.as_str()))
    }

    pub fn from_codes(
        prefix: Option<&str>,
        category: Option<&str>,
        suffix: Option<&str>,
    ) -> Result<Option<Self>, InvalidCode> {
        Ok(parse_axis("n_stage", prefix, category, suffix)?
            .map(|(prefix, category, suffix)| Self { prefix, category, suffix }))
    }
}

impl fmt::Display for NStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.category)?;
        if let Some(suffix) = self.suffix {
            write!(f, "({suffix})")?;
        }
        Ok(())
    }
}

/// Distant metastasis (M) axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MStage {
    pub prefix: StagePrefix,
    pub category: MCategory,
    pub suffix: Option<StageSuffix>,
}

impl MStage {
    pub fn new(prefix: StagePrefix, category: MCategory) -> Self {
        Self { prefix, category, suffix: None }
    }

    pub fn with_suffix(mut self, suffix: StageSuffix) -> Self {
        self.suffix = Some(suffix);
        self
    }

    pub fn codes(&self) -> (&'static str, &'static str, Option<&'static str>) {
        (self.prefix.as_str(), self.category.as_str(), self.suffix.map(|s| s.as_str()))
    }

    pub fn from_codes(
        prefix: Option<&str>,
        category: Option<&str>,
        suffix: Option<&str>,
    ) -> Result<Option<Self>, InvalidCode> {
        Ok(parse_axis("m_stage", prefix, category, suffix)?
            .map(|(prefix, category, suffix)| Self { prefix, category, suffix }))
    }
}

impl fmt::Display for MStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.category)?;
        if let Some(suffix) = self.suffix {
            write!(f, "({suffix})")?;
        }
        Ok(())
    }
}
