//! Entry decoding: the host API's JSON shape and plain PED files.

use crate::error::{Error, Result};
use crate::model::{Affected, PedigreeEntry, Sex, normalize_parent_id};

/// Parses a JSON array of entries (`individualId`, `familyId`, `paternalId`, ...).
pub fn parse_json(text: &str) -> Result<Vec<PedigreeEntry>> {
    Ok(serde_json::from_str(text)?)
}

/// Parses PED text: six whitespace separated columns
/// `family individual paternal maternal sex affected`.
///
/// Blank lines and `#` comments are skipped; `0` marks an unknown parent, and a family column
/// of `0` reads as no family (the same way [`to_ped`] writes one). Extra columns
/// (genotypes in some PED variants) are ignored.
pub fn parse_ped(text: &str) -> Result<Vec<PedigreeEntry>> {
    let mut entries = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let cols: Vec<&str> = content.split_whitespace().collect();
        if cols.len() < 6 {
            return Err(Error::InvalidEntry {
                line,
                message: format!("expected 6 columns, found {}", cols.len()),
            });
        }

        let sex = parse_code(cols[4], line, "sex").and_then(|v| {
            Sex::try_from(v).map_err(|message| Error::InvalidEntry { line, message })
        })?;
        let affected = parse_code(cols[5], line, "affected").and_then(|v| {
            Affected::try_from(v).map_err(|message| Error::InvalidEntry { line, message })
        })?;

        entries.push(PedigreeEntry {
            individual_id: cols[1].to_string(),
            family_id: if cols[0] == "0" {
                String::new()
            } else {
                cols[0].to_string()
            },
            paternal_id: normalize_parent_id(cols[2]),
            maternal_id: normalize_parent_id(cols[3]),
            sex,
            affected,
        });
    }
    Ok(entries)
}

fn parse_code(raw: &str, line: usize, column: &str) -> Result<i64> {
    raw.parse::<i64>().map_err(|_| Error::InvalidEntry {
        line,
        message: format!("{column} must be an integer code, found {raw:?}"),
    })
}

/// Renders entries back to PED text (tab separated, `0` for unknown parents and for an empty
/// family id).
pub fn to_ped(entries: &[PedigreeEntry]) -> String {
    let mut out = String::new();
    for e in entries {
        let family = if e.family_id.is_empty() {
            "0"
        } else {
            e.family_id.as_str()
        };
        out.push_str(&format!(
            "{family}\t{}\t{}\t{}\t{}\t{}\n",
            e.individual_id,
            e.paternal_id.as_deref().unwrap_or("0"),
            e.maternal_id.as_deref().unwrap_or("0"),
            i64::from(e.sex),
            i64::from(e.affected),
        ));
    }
    out
}

/// Keeps the entries of one family, in input order.
pub fn select_family(entries: Vec<PedigreeEntry>, family_id: &str) -> Vec<PedigreeEntry> {
    entries
        .into_iter()
        .filter(|e| e.family_id == family_id)
        .collect()
}
