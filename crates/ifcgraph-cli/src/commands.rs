use anyhow::{Context, Result};
use ifcgraph_model::{Accessor, NodeId};
use ifcgraph_session::Session;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

fn describe(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn root(session: &mut Session, files: &[PathBuf]) -> Result<Value> {
    let backend = session
        .backend(files)
        .with_context(|| format!("failed to load {}", describe(files)))?;
    debug!(kind = %backend.kind(), "resolving root");
    let node = backend.get_root().context("no root node")?;
    Ok(serde_json::to_value(node)?)
}

pub fn node(session: &mut Session, files: &[PathBuf], id: &str) -> Result<Value> {
    let backend = session
        .backend(files)
        .with_context(|| format!("failed to load {}", describe(files)))?;
    let id: NodeId = id.parse().unwrap_or_else(|never| match never {});
    let node = backend
        .get_by_id(&id)
        .with_context(|| format!("no node {id}"))?;
    Ok(serde_json::to_value(node)?)
}

pub fn search(session: &mut Session, files: &[PathBuf]) -> Result<Value> {
    let backend = session
        .backend(files)
        .with_context(|| format!("failed to load {}", describe(files)))?;
    Ok(serde_json::to_value(backend.search_index()?)?)
}

pub fn lookup(
    session: &mut Session,
    file: &Path,
    id: Option<&str>,
    guid: Option<&str>,
) -> Result<Value> {
    let backend = session
        .backend(&[file])
        .with_context(|| format!("failed to load {}", file.display()))?;
    let (node_type, item) = match (id, guid) {
        (_, Some(guid)) => backend
            .search_item_by_guid(guid)
            .with_context(|| format!("no entity with GlobalId {guid}"))?,
        (Some(id), None) => {
            let id: NodeId = id.parse().unwrap_or_else(|never| match never {});
            backend
                .search_item_by_id(&id)
                .with_context(|| format!("no node {id}"))?
        }
        (None, None) => anyhow::bail!("either --id or --guid is required"),
    };
    Ok(json!({ "type": node_type, "item": item }))
}
