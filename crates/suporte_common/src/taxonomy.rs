//! Category taxonomy used to tag created tickets.
//!
//! Categories form a tree ("Infraestrutura > Rede > Wi-Fi"). The tree is
//! stored as an arena of nodes with parent/child indices; depth, normalized
//! key, specificity and match terms are computed once when the taxonomy is
//! built so classification never re-parses paths.
//!
//! The taxonomy must stay in lockstep with the categories provisioned in the
//! backend: ids here are the backend's `itilcategories_id` values.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Separator between path segments in display paths
pub const PATH_SEPARATOR: &str = " > ";

/// Separator between alternatives inside one keyword term
pub const ALTERNATIVE_SEPARATOR: char = '|';

#[derive(Error, Debug)]
pub enum TaxonomyError {
    #[error("Failed to read taxonomy file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid taxonomy file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Category '{0}' has an empty path segment")]
    EmptySegment(String),

    #[error("Category '{0}' must have a positive id")]
    InvalidId(String),

    #[error("Duplicate category id {0}")]
    DuplicateId(u32),

    #[error("Duplicate category path '{0}'")]
    DuplicatePath(String),

    #[error("Category '{path}' has no parent '{parent}'")]
    MissingParent { path: String, parent: String },

    #[error("Taxonomy has no root category")]
    NoRoot,

    #[error("Taxonomy has more than one root: '{0}' and '{1}'")]
    MultipleRoots(String, String),
}

/// One category as written in a taxonomy file or the built-in table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDef {
    pub id: u32,
    /// Display path, segments separated by `>`
    pub path: String,
    /// Terms for this segment; each term lists `|`-separated alternatives
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl CategoryDef {
    pub fn new(id: u32, path: &str, keywords: &[&str]) -> Self {
        Self {
            id,
            path: path.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TaxonomyFile {
    #[serde(rename = "category", default)]
    categories: Vec<CategoryDef>,
}

/// A requirement satisfied when any alternative occurs in the text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordTerm {
    alternatives: Vec<String>,
}

impl KeywordTerm {
    /// Parse `"falha|falhou|fail"`; returns `None` when nothing usable remains
    pub fn parse(spec: &str) -> Option<Self> {
        let alternatives: Vec<String> = spec
            .split(ALTERNATIVE_SEPARATOR)
            .map(|alt| alt.trim().to_lowercase())
            .filter(|alt| !alt.is_empty())
            .collect();

        if alternatives.is_empty() {
            None
        } else {
            Some(Self { alternatives })
        }
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    /// Substring containment against already-lowercased text
    pub fn is_satisfied_by(&self, normalized_text: &str) -> bool {
        self.alternatives
            .iter()
            .any(|alt| normalized_text.contains(alt.as_str()))
    }
}

/// The category chosen for a piece of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub id: u32,
    /// Human-readable breadcrumb, e.g. "Infraestrutura > Rede > Wi-Fi"
    pub display_path: String,
    /// Lowercase key, e.g. "infraestrutura rede wi-fi"
    pub key: String,
    /// 0 for the root
    pub depth: usize,
}

impl CategoryEntry {
    /// Last path segment
    pub fn name(&self) -> &str {
        self.display_path
            .rsplit(PATH_SEPARATOR)
            .next()
            .unwrap_or(&self.display_path)
    }
}

/// Arena node
#[derive(Debug, Clone)]
pub struct CategoryNode {
    pub entry: CategoryEntry,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Terms declared by this segment alone
    pub own_terms: Vec<KeywordTerm>,
    /// Terms of every non-root segment on the path, root excluded
    pub match_terms: Vec<KeywordTerm>,
    /// Number of tokens in the key
    pub specificity: usize,
}

#[derive(Debug, Clone)]
pub struct Taxonomy {
    nodes: Vec<CategoryNode>,
    root: usize,
    /// Non-root nodes, specificity descending then key ascending
    ranked: Vec<usize>,
    by_id: HashMap<u32, usize>,
}

/// Lowercase path with separators turned into single spaces
pub fn normalize_key(path: &str) -> String {
    path.to_lowercase()
        .replace(['>', '/'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn split_path(path: &str) -> Vec<String> {
    path.split('>').map(|s| s.trim().to_string()).collect()
}

impl Taxonomy {
    /// Build and validate a taxonomy from flat definitions (any order)
    pub fn from_defs(defs: Vec<CategoryDef>) -> Result<Self, TaxonomyError> {
        let mut by_id = HashMap::new();
        let mut by_path: HashMap<String, usize> = HashMap::new();
        let mut parsed = Vec::with_capacity(defs.len());

        for def in defs {
            let segments = split_path(&def.path);
            if segments.iter().any(|s| normalize_key(s).is_empty()) {
                return Err(TaxonomyError::EmptySegment(def.path));
            }
            if def.id == 0 {
                return Err(TaxonomyError::InvalidId(def.path));
            }
            let display_path = segments.join(PATH_SEPARATOR);
            if by_id.insert(def.id, parsed.len()).is_some() {
                return Err(TaxonomyError::DuplicateId(def.id));
            }
            if by_path.insert(display_path.clone(), parsed.len()).is_some() {
                return Err(TaxonomyError::DuplicatePath(display_path));
            }
            parsed.push((def, segments, display_path));
        }

        let mut root: Option<usize> = None;
        let mut nodes = Vec::with_capacity(parsed.len());
        for (def, segments, display_path) in &parsed {
            let parent = if segments.len() > 1 {
                let parent_path = segments[..segments.len() - 1].join(PATH_SEPARATOR);
                let idx = *by_path.get(&parent_path).ok_or_else(|| TaxonomyError::MissingParent {
                    path: display_path.clone(),
                    parent: parent_path.clone(),
                })?;
                Some(idx)
            } else {
                if let Some(existing) = root {
                    return Err(TaxonomyError::MultipleRoots(
                        parsed[existing].2.clone(),
                        display_path.clone(),
                    ));
                }
                root = Some(nodes.len());
                None
            };

            let own_terms = own_terms(def, segments.last().map(String::as_str).unwrap_or(""));
            let key = normalize_key(display_path);
            let specificity = key.split_whitespace().count();

            nodes.push(CategoryNode {
                entry: CategoryEntry {
                    id: def.id,
                    display_path: display_path.clone(),
                    key,
                    depth: segments.len() - 1,
                },
                parent,
                children: Vec::new(),
                own_terms,
                match_terms: Vec::new(),
                specificity,
            });
        }

        let root = root.ok_or(TaxonomyError::NoRoot)?;

        for idx in 0..nodes.len() {
            if let Some(parent) = nodes[idx].parent {
                nodes[parent].children.push(idx);
            }
        }

        // Accumulate terms root-to-leaf; the root's own terms are never required
        for idx in 0..nodes.len() {
            let mut chain = Vec::new();
            let mut cursor = Some(idx);
            while let Some(current) = cursor {
                if current != root {
                    chain.push(current);
                }
                cursor = nodes[current].parent;
            }
            chain.reverse();
            let terms: Vec<KeywordTerm> = chain
                .iter()
                .flat_map(|&n| nodes[n].own_terms.clone())
                .collect();
            nodes[idx].match_terms = terms;
        }

        let mut ranked: Vec<usize> = (0..nodes.len()).filter(|&i| i != root).collect();
        ranked.sort_by(|&a, &b| {
            (Reverse(nodes[a].specificity), &nodes[a].entry.key)
                .cmp(&(Reverse(nodes[b].specificity), &nodes[b].entry.key))
        });

        Ok(Self {
            nodes,
            root,
            ranked,
            by_id,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, TaxonomyError> {
        let file: TaxonomyFile = toml::from_str(content)?;
        Self::from_defs(file.categories)
    }

    pub fn load(path: &Path) -> Result<Self, TaxonomyError> {
        let content = fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// The infrastructure support taxonomy shipped with the bridge
    pub fn builtin() -> Self {
        Self::from_defs(crate::taxonomy_data::builtin_categories())
            .expect("built-in taxonomy is valid")
    }

    /// Default category, returned when nothing matches
    pub fn root(&self) -> &CategoryEntry {
        &self.nodes[self.root].entry
    }

    pub fn get(&self, id: u32) -> Option<&CategoryEntry> {
        self.by_id.get(&id).map(|&idx| &self.nodes[idx].entry)
    }

    pub fn find_by_path(&self, display_path: &str) -> Option<&CategoryEntry> {
        self.nodes
            .iter()
            .map(|n| &n.entry)
            .find(|e| e.display_path == display_path)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: usize) -> &CategoryNode {
        &self.nodes[idx]
    }

    /// Candidates in classification order (root excluded)
    pub fn ranked(&self) -> impl Iterator<Item = &CategoryNode> {
        self.ranked.iter().map(move |&idx| &self.nodes[idx])
    }

    /// Depth-first walk from the root; parents always precede children
    pub fn walk(&self) -> Vec<&CategoryNode> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            out.push(node);
            let mut children = node.children.clone();
            children.sort_by(|&a, &b| self.nodes[b].entry.key.cmp(&self.nodes[a].entry.key));
            stack.extend(children);
        }
        out
    }

    /// Parent entry of a node, `None` for the root
    pub fn parent_of(&self, node: &CategoryNode) -> Option<&CategoryEntry> {
        node.parent.map(|idx| &self.nodes[idx].entry)
    }
}

fn own_terms(def: &CategoryDef, segment: &str) -> Vec<KeywordTerm> {
    let declared: Vec<KeywordTerm> = def
        .keywords
        .iter()
        .filter_map(|k| KeywordTerm::parse(k))
        .collect();
    if !declared.is_empty() {
        return declared;
    }
    normalize_key(segment)
        .split_whitespace()
        .filter_map(KeywordTerm::parse)
        .collect()
}
