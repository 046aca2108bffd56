use crate::backend::Backend;
use crate::config::SessionConfig;
use crate::kind::DocumentKind;
use ifcgraph_ingest_ifcx::{compose, ComposedGraph, IfcxAccessor, IfcxDocument};
use ifcgraph_ingest_step::{StepAccessor, StepModel};
use ifcgraph_model::{GraphError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A document read and parsed but not yet cached.
#[derive(Debug)]
enum Parsed {
    Step(StepModel),
    Ifcx(IfcxDocument),
}

impl Parsed {
    fn kind(&self) -> DocumentKind {
        match self {
            Parsed::Step(_) => DocumentKind::Step,
            Parsed::Ifcx(_) => DocumentKind::Ifcx,
        }
    }
}

/// Loaded documents plus the derived graph.
///
/// Not internally synchronized: every mutating call takes `&mut self`.
#[derive(Debug, Default)]
pub struct Session {
    config: SessionConfig,
    step_models: HashMap<PathBuf, StepModel>,
    /// IFCX documents in load order, keyed by canonical path
    ifcx_paths: Vec<PathBuf>,
    ifcx_documents: Vec<IfcxDocument>,
    /// Composition of every loaded IFCX document; `None` when stale.
    graph: Option<ComposedGraph>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of cached documents of both kinds.
    pub fn len(&self) -> usize {
        self.step_models.len() + self.ifcx_documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The composed graph, if one is current.
    pub fn graph(&self) -> Option<&ComposedGraph> {
        self.graph.as_ref()
    }

    fn read(&self, path: &Path) -> Result<String> {
        let size = std::fs::metadata(path)?.len();
        if size > self.config.max_document_bytes {
            return Err(GraphError::invalid_format(
                path.display().to_string(),
                format!(
                    "document is {size} bytes, limit is {}",
                    self.config.max_document_bytes
                ),
            ));
        }
        Ok(std::fs::read_to_string(path)?)
    }

    /// Kind of an already cached document.
    fn cached(&self, key: &Path) -> Option<DocumentKind> {
        if self.step_models.contains_key(key) {
            debug!(path = %key.display(), "STEP model cached");
            return Some(DocumentKind::Step);
        }
        if self.ifcx_paths.iter().any(|p| p == key) {
            debug!(path = %key.display(), "IFCX document cached");
            return Some(DocumentKind::Ifcx);
        }
        None
    }

    /// Read, sniff and parse one document without touching the cache.
    fn parse(&self, key: &Path) -> Result<Parsed> {
        let source_name = key.display().to_string();
        let text = self.read(key)?;
        match DocumentKind::sniff(&source_name, &text)? {
            DocumentKind::Step => {
                let model = StepModel::parse(&text)?;
                debug!(path = %source_name, entities = model.len(), "parsed STEP model");
                Ok(Parsed::Step(model))
            }
            DocumentKind::Ifcx => Ok(Parsed::Ifcx(IfcxDocument::parse(source_name, &text)?)),
        }
    }

    fn insert(&mut self, key: PathBuf, parsed: Parsed) {
        match parsed {
            Parsed::Step(model) => {
                self.step_models.insert(key, model);
            }
            Parsed::Ifcx(document) => {
                self.ifcx_paths.push(key);
                self.ifcx_documents.push(document);
                self.graph = None;
            }
        }
    }

    /// Load a document into the cache unless it is already there.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<DocumentKind> {
        let key = std::fs::canonicalize(path.as_ref())?;
        if let Some(kind) = self.cached(&key) {
            return Ok(kind);
        }
        let parsed = self.parse(&key)?;
        let kind = parsed.kind();
        self.insert(key, parsed);
        Ok(kind)
    }

    /// Load `paths` and return the backend that serves them.
    ///
    /// A STEP file must be requested on its own; any number of IFCX documents
    /// may be requested together and are served by the graph composed from
    /// every IFCX document loaded so far. Every path is parsed before any is
    /// cached, so a failing request leaves the session as it was.
    pub fn backend<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<Backend<'_>> {
        let first = paths
            .first()
            .ok_or_else(|| GraphError::invalid_format("<none>", "no documents requested"))?;

        let mut kinds = Vec::with_capacity(paths.len());
        let mut staged: Vec<(PathBuf, Parsed)> = Vec::new();
        for path in paths {
            let key = std::fs::canonicalize(path.as_ref())?;
            if let Some(kind) = self.cached(&key) {
                kinds.push(kind);
                continue;
            }
            if let Some((_, parsed)) = staged.iter().find(|(k, _)| *k == key) {
                kinds.push(parsed.kind());
                continue;
            }
            let parsed = self.parse(&key)?;
            kinds.push(parsed.kind());
            staged.push((key, parsed));
        }

        if kinds.contains(&DocumentKind::Step) && paths.len() > 1 {
            return Err(GraphError::invalid_format(
                first.as_ref().display().to_string(),
                "a STEP file cannot be combined with other documents",
            ));
        }
        for (key, parsed) in staged {
            self.insert(key, parsed);
        }

        if kinds.contains(&DocumentKind::Step) {
            let key = std::fs::canonicalize(first.as_ref())?;
            let model = self
                .step_models
                .get(&key)
                .ok_or_else(|| GraphError::not_found(key.display().to_string()))?;
            let accessor = StepAccessor::new(model)
                .with_root_type(&self.config.root_type)
                .with_separator(&self.config.display_separator);
            return Ok(Backend::Step(accessor));
        }

        if self.graph.is_none() {
            self.graph = Some(compose(&self.ifcx_documents)?);
        }
        let graph = self
            .graph
            .as_ref()
            .ok_or_else(|| GraphError::not_found("composed graph"))?;
        Ok(Backend::Ifcx(
            IfcxAccessor::new(graph).with_separator(&self.config.display_separator),
        ))
    }

    /// Drop every cached document and the composed graph together.
    pub fn clear(&mut self) {
        info!(
            step = self.step_models.len(),
            ifcx = self.ifcx_documents.len(),
            "clearing document cache"
        );
        self.step_models.clear();
        self.ifcx_paths.clear();
        self.ifcx_documents.clear();
        self.graph = None;
    }
}
