//! Report tree keyed by dotted test identities such as
//! `sp.metadata_extra.tls_grade`.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{Error, Result};
use crate::result::AssertionFailure;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestPath(Vec<String>);

impl TestPath {
    pub fn parse(dotted: &str) -> Result<Self> {
        let segments: Vec<String> = dotted.split('.').map(str::to_owned).collect();
        if segments.iter().any(String::is_empty) {
            return Err(Error::Report(format!("invalid test identity '{dotted}'")));
        }
        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for TestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Leaf {
    pub description: String,
    pub assertions: Vec<AssertionFailure>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportNode {
    /// Children in insertion order, keys unique.
    Branch(Vec<(String, ReportNode)>),
    Leaf(Leaf),
}

impl ReportNode {
    fn leaves(&self) -> Box<dyn Iterator<Item = &Leaf> + '_> {
        match self {
            ReportNode::Leaf(leaf) => Box::new(std::iter::once(leaf)),
            ReportNode::Branch(children) => Box::new(children.iter().flat_map(|(_, c)| c.leaves())),
        }
    }
}

impl Serialize for ReportNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ReportNode::Leaf(leaf) => leaf.serialize(serializer),
            ReportNode::Branch(children) => {
                let mut map = serializer.serialize_map(Some(children.len()))?;
                for (key, child) in children {
                    map.serialize_entry(key, child)?;
                }
                map.end()
            }
        }
    }
}

/// Walk `segments` from `node`, creating missing nodes, and return the leaf
/// at the end. A new leaf gets `description`; an existing one keeps its own.
fn insert_path<'a>(
    node: &'a mut ReportNode,
    segments: &[String],
    description: &str,
) -> Option<&'a mut Leaf> {
    let [head, rest @ ..] = segments else {
        return match node {
            ReportNode::Leaf(leaf) => Some(leaf),
            ReportNode::Branch(_) => None,
        };
    };
    let ReportNode::Branch(children) = node else {
        return None;
    };
    let idx = match children.iter().position(|(k, _)| k == head) {
        Some(i) => i,
        None => {
            let child = if rest.is_empty() {
                ReportNode::Leaf(Leaf {
                    description: description.to_string(),
                    assertions: Vec::new(),
                })
            } else {
                ReportNode::Branch(Vec::new())
            };
            children.push((head.clone(), child));
            children.len() - 1
        }
    };
    insert_path(&mut children[idx].1, rest, description)
}

/// Collects the failures of one run. Created by `begin_run`, consumed by
/// `finalize`.
#[derive(Debug)]
pub struct ReportAggregator {
    root: ReportNode,
}

impl ReportAggregator {
    pub fn begin_run() -> Self {
        Self {
            root: ReportNode::Branch(Vec::new()),
        }
    }

    pub fn record(
        &mut self,
        path: &TestPath,
        description: &str,
        failures: Vec<AssertionFailure>,
    ) -> Result<()> {
        let leaf = insert_path(&mut self.root, path.segments(), description).ok_or_else(|| {
            Error::Report(format!("test identity '{path}' collides with an existing report entry"))
        })?;
        leaf.assertions.extend(failures);
        Ok(())
    }

    pub fn finalize(self) -> Report {
        Report { root: self.root }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    root: ReportNode,
}

impl Report {
    pub fn has_failures(&self) -> bool {
        self.root.leaves().any(|l| !l.assertions.is_empty())
    }

    #[cfg(test)]
    pub fn root(&self) -> &ReportNode {
        &self.root
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.root)
            .map_err(|e| Error::Report(format!("failed to serialize report: {e}")))
    }
}
