//! Pedigree input records.
//!
//! Entries arrive from the host application (usually as JSON from its API) and are never mutated
//! by the layout. Numeric codes follow the PED convention used by genomics tooling.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Sex {
    #[default]
    Unknown,
    Male,
    Female,
}

impl TryFrom<i64> for Sex {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::Male),
            2 => Ok(Self::Female),
            other => Err(format!("unsupported sex code {other} (expected 0, 1 or 2)")),
        }
    }
}

impl From<Sex> for i64 {
    fn from(value: Sex) -> Self {
        match value {
            Sex::Unknown => 0,
            Sex::Male => 1,
            Sex::Female => 2,
        }
    }
}

/// Phenotype status. `-9` is accepted as an alias for unknown, as PED files commonly use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Affected {
    #[default]
    Unknown,
    Unaffected,
    Affected,
}

impl TryFrom<i64> for Affected {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 | -9 => Ok(Self::Unknown),
            1 => Ok(Self::Unaffected),
            2 => Ok(Self::Affected),
            other => Err(format!(
                "unsupported affected code {other} (expected 0, 1, 2 or -9)"
            )),
        }
    }
}

impl From<Affected> for i64 {
    fn from(value: Affected) -> Self {
        match value {
            Affected::Unknown => 0,
            Affected::Unaffected => 1,
            Affected::Affected => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PedigreeEntry {
    pub individual_id: String,
    #[serde(default)]
    pub family_id: String,
    #[serde(default, deserialize_with = "deserialize_parent_id")]
    pub paternal_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_parent_id")]
    pub maternal_id: Option<String>,
    #[serde(default)]
    pub sex: Sex,
    #[serde(default)]
    pub affected: Affected,
}

impl PedigreeEntry {
    pub fn new(individual_id: impl Into<String>) -> Self {
        Self {
            individual_id: individual_id.into(),
            family_id: String::new(),
            paternal_id: None,
            maternal_id: None,
            sex: Sex::Unknown,
            affected: Affected::Unknown,
        }
    }

    pub fn in_family(mut self, family_id: impl Into<String>) -> Self {
        self.family_id = family_id.into();
        self
    }

    /// Sets both parents; empty strings and `"0"` are treated as unknown.
    pub fn with_parents(mut self, paternal_id: Option<&str>, maternal_id: Option<&str>) -> Self {
        self.paternal_id = paternal_id.and_then(normalize_parent_id);
        self.maternal_id = maternal_id.and_then(normalize_parent_id);
        self
    }

    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = sex;
        self
    }

    pub fn with_affected(mut self, affected: Affected) -> Self {
        self.affected = affected;
        self
    }

    pub fn is_affected(&self) -> bool {
        self.affected == Affected::Affected
    }

    /// Known parent ids, paternal first. A parent listed twice is yielded once.
    pub fn parent_ids(&self) -> impl Iterator<Item = &str> {
        let paternal = self.paternal_id.as_deref();
        let maternal = self
            .maternal_id
            .as_deref()
            .filter(|m| Some(*m) != paternal);
        paternal.into_iter().chain(maternal)
    }

    pub fn has_parents(&self) -> bool {
        self.paternal_id.is_some() || self.maternal_id.is_some()
    }
}

pub(crate) fn normalize_parent_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "0" {
        None
    } else {
        Some(raw.to_string())
    }
}

fn deserialize_parent_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(normalize_parent_id))
}
