// src/site/outputs.rs

//! Producer output disjointness.
//!
//! Producers of one stage write to the destination tree concurrently and
//! without locking, so no two of them may produce the same path.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::engine::TaskName;
use crate::errors::{Result, SitepipeError};
use crate::site::jobs::CopyJob;

/// Fail with a `ConfigError` naming both producers and the path if any
/// destination would be written twice.
pub fn check_disjoint_outputs(jobs: &[Arc<CopyJob>]) -> Result<()> {
    let mut owners: HashMap<PathBuf, (TaskName, PathBuf)> = HashMap::new();

    for job in jobs {
        for (source, dest) in job.outputs()? {
            if let Some((owner, first_source)) = owners.get(&dest) {
                let msg = if owner == job.name() {
                    format!(
                        "task '{owner}' writes {dest:?} twice (from {first_source:?} and {source:?})"
                    )
                } else {
                    format!(
                        "tasks '{owner}' and '{}' both write {dest:?}",
                        job.name()
                    )
                };
                return Err(SitepipeError::ConfigError(msg));
            }
            owners.insert(dest, (job.name().to_string(), source));
        }
    }
    Ok(())
}
