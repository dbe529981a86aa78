//! Command handlers for suportectl.

use anyhow::{bail, Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;
use suporte_common::config::SuporteConfig;
use suporte_common::provisioning::{self, ConsistencyIssue};
use suporte_common::ticket::BackendCategory;
use suporte_common::{Classifier, ServiceDesk};
use tracing::debug;

fn offline_config(path: Option<&Path>) -> Result<SuporteConfig> {
    SuporteConfig::load_unchecked(path).context("Failed to load configuration")
}

fn service_desk(path: Option<&Path>) -> Result<ServiceDesk> {
    let config = SuporteConfig::load(path).context("Failed to load configuration")?;
    debug!("Backend at {}", config.backend.base_url);
    Ok(ServiceDesk::from_config(&config)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Handle classify command
pub fn handle_classify(config: Option<&Path>, text: &str, json: bool) -> Result<()> {
    let config = offline_config(config)?;
    let classifier = Classifier::from_config(&config.classifier)?;
    let entry = classifier.classify(text);

    if json {
        return print_json(entry);
    }
    println!("{} {}", format!("[{}]", entry.id).cyan(), entry.display_path.bold());
    if entry.id == classifier.taxonomy().root().id {
        println!("  {}", "no category matched, using the default".dimmed());
    }
    Ok(())
}

/// Handle taxonomy command
pub fn handle_taxonomy(config: Option<&Path>, json: bool) -> Result<()> {
    let config = offline_config(config)?;
    let classifier = Classifier::from_config(&config.classifier)?;
    let taxonomy = classifier.taxonomy();

    if json {
        let entries: Vec<_> = taxonomy.walk().into_iter().map(|n| &n.entry).collect();
        return print_json(&entries);
    }

    println!(
        "{} ({} categories, {:?} matching)",
        "Taxonomy".bold(),
        taxonomy.len(),
        classifier.policy()
    );
    for node in taxonomy.walk() {
        let indent = "  ".repeat(node.entry.depth);
        println!(
            "{}{} {}",
            indent,
            node.entry.name(),
            format!("[{}]", node.entry.id).dimmed()
        );
    }
    Ok(())
}

/// Handle ticket command
pub async fn handle_ticket(config: Option<&Path>, text: &str, json: bool) -> Result<()> {
    let desk = service_desk(config)?;

    let outcome = match desk.create_from_text(text).await {
        Ok(outcome) => outcome,
        Err(e) => {
            if json {
                print_json(&e.to_payload())?;
            }
            bail!(e);
        }
    };

    if json {
        return print_json(&outcome.to_response_json());
    }

    println!("[OK] Ticket {} created", outcome.ticket_id().to_string().green());
    if let Some(category) = &outcome.category {
        println!("  category: {} [{}]", category.display_path, category.id);
    }
    if let Some(warning) = &outcome.logging_warning {
        println!("  {} {}", "warning:".yellow(), warning);
    }
    Ok(())
}

async fn fetch_categories(desk: &ServiceDesk) -> Result<Vec<BackendCategory>> {
    let client = desk.client();
    let categories = client
        .with_session(|session| async move { client.list_categories(&session).await })
        .await?;
    Ok(categories)
}

/// Handle categories list command
pub async fn handle_categories_list(config: Option<&Path>, json: bool) -> Result<()> {
    let desk = service_desk(config)?;
    let mut categories = fetch_categories(&desk).await?;
    categories.sort_by(|a, b| a.completename.cmp(&b.completename));

    if json {
        return print_json(&categories);
    }
    for category in &categories {
        println!("{:>5}  {}", category.id, category.completename);
    }
    println!("{} categories", categories.len());
    Ok(())
}

/// Handle categories check command
pub async fn handle_categories_check(config: Option<&Path>, json: bool) -> Result<()> {
    let desk = service_desk(config)?;
    let categories = fetch_categories(&desk).await?;
    let report = provisioning::check_consistency(desk.classifier().taxonomy(), &categories);

    if json {
        print_json(&report)?;
    } else {
        for issue in &report.issues {
            match issue {
                ConsistencyIssue::Missing { id, path } => {
                    println!("{} {} [{}]", "missing ".red(), path, id)
                }
                ConsistencyIssue::IdMismatch {
                    path,
                    local_id,
                    backend_id,
                } => println!(
                    "{} {} (local {}, backend {})",
                    "mismatch".yellow(),
                    path,
                    local_id,
                    backend_id
                ),
            }
        }
        if report.is_consistent() {
            println!("[OK] {} categories in lockstep", report.checked.to_string().green());
        }
    }

    if !report.is_consistent() {
        bail!(
            "{} of {} categories out of lockstep with the backend",
            report.issues.len(),
            report.checked
        );
    }
    Ok(())
}

/// Handle categories provision command
pub async fn handle_categories_provision(
    config: Option<&Path>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let desk = service_desk(config)?;
    let report =
        provisioning::provision(desk.client(), desk.classifier().taxonomy(), dry_run).await?;

    if json {
        print_json(&report)?;
    } else if dry_run {
        for path in &report.planned {
            println!("{} {}", "would create".cyan(), path);
        }
        println!("{} to create, {} existing", report.planned.len(), report.existing.len());
    } else {
        for (path, id) in &report.created {
            println!("{} {} [{}]", "created".green(), path, id);
        }
        for (path, reason) in &report.failed {
            println!("{} {}: {}", "failed ".red(), path, reason);
        }
        println!(
            "{} created, {} existing, {} failed",
            report.created.len(),
            report.existing.len(),
            report.failed.len()
        );
    }

    if !report.is_success() {
        bail!("{} categories could not be provisioned", report.failed.len());
    }
    Ok(())
}
