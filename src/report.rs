//! Offline metadata report over a project's assets: which files fail
//! validation and how trait values are distributed among the valid ones.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::verify::{load_metadata, metadata_files};

#[derive(Debug, Default)]
pub struct MetadataReport {
    /// Metadata files examined.
    pub total: usize,
    /// trait_type -> value -> number of tokens carrying it.
    pub traits: BTreeMap<String, BTreeMap<String, usize>>,
    /// Files that failed validation, with the reason.
    pub failures: Vec<(PathBuf, String)>,
}

impl MetadataReport {
    pub fn valid(&self) -> usize {
        self.total - self.failures.len()
    }

    /// Values of `trait_type`, most frequent first, ties by value.
    pub fn ranked_values(&self, trait_type: &str) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .traits
            .get(trait_type)
            .map(|values| values.iter().map(|(v, c)| (v.as_str(), *c)).collect())
            .unwrap_or_default();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}

/// Unlike verification, keeps going past invalid files.
pub fn metadata_report(assets: &Path) -> Result<MetadataReport> {
    let mut report = MetadataReport::default();

    for path in metadata_files(assets)? {
        report.total += 1;
        match load_metadata(&path) {
            Ok(metadata) => {
                for attr in &metadata.attributes {
                    let value_map = report.traits.entry(attr.trait_type.clone()).or_default();
                    *value_map.entry(attr.value.to_string()).or_insert(0) += 1;
                }
            }
            Err(err) => report.failures.push((path, err.to_string())),
        }
    }

    Ok(report)
}
