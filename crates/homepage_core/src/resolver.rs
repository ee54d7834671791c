use chrono::Local;
use rand::seq::IndexedRandom;
use settings::HomepageData;
use shared::{
    domain::{Kind, Requirement},
    error::HomepageError,
};

use crate::{host::Host, moment};

/// Concrete thing a launch places into the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    File(String),
    Layout(String),
    Graph,
    Nothing,
}

impl Target {
    pub async fn resolve(data: &HomepageData, host: &Host) -> Result<Self, HomepageError> {
        Ok(match data.kind {
            Kind::Workspace => Target::Layout(data.value.clone()),
            Kind::Graph => Target::Graph,
            Kind::None => Target::Nothing,
            _ => Target::File(compute_value(data, host).await?),
        })
    }

    pub fn file(&self) -> Option<&str> {
        match self {
            Target::File(path) => Some(path),
            _ => None,
        }
    }
}

/// String form of the homepage target. Kinds without a file target yield the
/// raw configured value.
pub async fn compute_value(data: &HomepageData, host: &Host) -> Result<String, HomepageError> {
    match data.kind {
        Kind::MomentDate => Ok(moment::format(&Local::now(), &data.value)),
        Kind::Random => {
            let files = host.vault.list_files().await;
            Ok(pick_random(&files).unwrap_or_else(|| data.value.clone()))
        }
        kind => match kind.periodicity() {
            Some(periodicity) => host
                .periodic
                .note_path(periodicity)
                .await
                .map_err(|source| HomepageError::Periodic {
                    kind: periodicity,
                    source,
                }),
            None => Ok(data.value.clone()),
        },
    }
}

pub async fn has_required_feature(kind: Kind, host: &Host) -> bool {
    match kind.required_feature() {
        None => true,
        Some(Requirement::Feature(feature)) => host.features.is_enabled(feature),
        Some(Requirement::Periodicity(periodicity)) => {
            host.periodic.is_available(periodicity).await
        }
    }
}

fn pick_random(files: &[String]) -> Option<String> {
    let candidates: Vec<&String> = files
        .iter()
        .filter(|path| path.ends_with(".md") || path.ends_with(".canvas"))
        .collect();
    candidates.choose(&mut rand::rng()).map(|path| (*path).clone())
}

#[cfg(test)]
#[path = "tests/resolver_tests.rs"]
mod tests;
