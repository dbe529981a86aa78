//! Keeping the backend's ticket categories in lockstep with the taxonomy.
//!
//! Backend categories are matched to taxonomy nodes by complete name
//! (`"Infraestrutura > Rede > VPN"`), never by bare name: several leaves
//! share a name under different parents.

use crate::backend::{CategoryCreation, TicketingClient};
use crate::error::BridgeError;
use crate::taxonomy::Taxonomy;
use crate::ticket::{BackendCategory, CategoryDraft};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsistencyIssue {
    /// Local category has no backend counterpart
    Missing { id: u32, path: String },
    /// Same path, different ids; tickets would land in the wrong category
    IdMismatch {
        path: String,
        local_id: u32,
        backend_id: u64,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsistencyReport {
    pub checked: usize,
    pub issues: Vec<ConsistencyIssue>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Compare every taxonomy node with the backend's categories
pub fn check_consistency(taxonomy: &Taxonomy, backend: &[BackendCategory]) -> ConsistencyReport {
    let by_path = index_by_path(backend);
    let mut report = ConsistencyReport::default();

    for node in taxonomy.walk() {
        let entry = &node.entry;
        report.checked += 1;
        match by_path.get(entry.display_path.as_str()) {
            None => report.issues.push(ConsistencyIssue::Missing {
                id: entry.id,
                path: entry.display_path.clone(),
            }),
            Some(found) if found.id != u64::from(entry.id) => {
                report.issues.push(ConsistencyIssue::IdMismatch {
                    path: entry.display_path.clone(),
                    local_id: entry.id,
                    backend_id: found.id,
                })
            }
            Some(_) => {}
        }
    }

    report
}

/// Category the backend is missing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedCategory {
    pub local_id: u32,
    pub name: String,
    pub completename: String,
    pub level: u32,
    pub parent_path: Option<String>,
}

/// Missing categories in creation order (parents first)
pub fn plan(taxonomy: &Taxonomy, backend: &[BackendCategory]) -> Vec<PlannedCategory> {
    let by_path = index_by_path(backend);

    taxonomy
        .walk()
        .into_iter()
        .filter(|node| !by_path.contains_key(node.entry.display_path.as_str()))
        .map(|node| PlannedCategory {
            local_id: node.entry.id,
            name: node.entry.name().to_string(),
            completename: node.entry.display_path.clone(),
            level: node.entry.depth as u32 + 1,
            parent_path: taxonomy
                .parent_of(node)
                .map(|parent| parent.display_path.clone()),
        })
        .collect()
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProvisionReport {
    /// (complete name, backend id)
    pub created: Vec<(String, u64)>,
    pub existing: Vec<String>,
    /// (complete name, reason)
    pub failed: Vec<(String, String)>,
    /// Filled on dry runs instead of `created`
    pub planned: Vec<String>,
}

impl ProvisionReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Create every missing taxonomy category in one backend session.
///
/// Per-category failures are collected in the report; only session and
/// listing failures abort the run.
pub async fn provision(
    client: &TicketingClient,
    taxonomy: &Taxonomy,
    dry_run: bool,
) -> Result<ProvisionReport, BridgeError> {
    client
        .with_session(|session| async move {
            let backend = client.list_categories(&session).await?;
            let mut report = ProvisionReport::default();

            let mut ids: HashMap<String, u64> = backend
                .iter()
                .map(|c| (c.completename.clone(), c.id))
                .collect();
            let missing = plan(taxonomy, &backend);

            for node in taxonomy.walk() {
                if ids.contains_key(&node.entry.display_path) {
                    report.existing.push(node.entry.display_path.clone());
                }
            }

            if dry_run {
                report.planned = missing.into_iter().map(|p| p.completename).collect();
                return Ok(report);
            }

            for planned in missing {
                let parent_id = match &planned.parent_path {
                    None => None,
                    Some(path) => match ids.get(path) {
                        Some(id) => Some(*id),
                        None => {
                            warn!(
                                "Skipping '{}': parent '{}' not provisioned",
                                planned.completename, path
                            );
                            report.failed.push((
                                planned.completename,
                                format!("parent '{}' not provisioned", path),
                            ));
                            continue;
                        }
                    },
                };

                let draft = CategoryDraft {
                    name: planned.name.clone(),
                    completename: planned.completename.clone(),
                    comment: String::new(),
                    level: planned.level,
                    parent_id,
                };

                match client.create_category(&session, &draft).await {
                    Ok(CategoryCreation::Created(item)) => {
                        if item.id != u64::from(planned.local_id) {
                            warn!(
                                "'{}' created with id {} but the taxonomy uses {}",
                                planned.completename, item.id, planned.local_id
                            );
                        }
                        ids.insert(planned.completename.clone(), item.id);
                        report.created.push((planned.completename, item.id));
                    }
                    Ok(CategoryCreation::AlreadyExists { .. }) => {
                        // Missed by the listing; children still need its id
                        match client.find_category(&session, &planned.completename).await {
                            Ok(Some(found)) => {
                                ids.insert(planned.completename.clone(), found.id);
                                report.existing.push(planned.completename);
                            }
                            Ok(None) => {
                                warn!(
                                    "'{}' already exists but could not be found",
                                    planned.completename
                                );
                                report.failed.push((
                                    planned.completename,
                                    "already exists but not found by name".to_string(),
                                ));
                            }
                            Err(e) => {
                                warn!("Failed to look up '{}': {}", planned.completename, e);
                                report.failed.push((planned.completename, e.to_string()));
                            }
                        }
                    }
                    Err(e) => {
                        warn!("Failed to create '{}': {}", planned.completename, e);
                        report.failed.push((planned.completename, e.to_string()));
                    }
                }
            }

            info!(
                "Provisioning finished: {} created, {} existing, {} failed",
                report.created.len(),
                report.existing.len(),
                report.failed.len()
            );
            Ok(report)
        })
        .await
}

fn index_by_path(backend: &[BackendCategory]) -> HashMap<&str, &BackendCategory> {
    backend
        .iter()
        .map(|c| (c.completename.as_str(), c))
        .collect()
}
