//! Gradient-boosted tree ensemble (inference only).
//!
//! Reads the XGBoost JSON tree dump (`dump_model(..., dump_format="json")`)
//! for a `binary:logistic` booster:
//!
//! - margin: logit(base_score) + Σ leaf
//! - class: 1 if margin > 0
//!
//! At a split, `x < split_condition` takes `yes`, NaN takes `missing`. The
//! comparison runs in `f32`, the precision XGBoost stores thresholds in.

use serde::Deserialize;

use super::artifacts::ArtifactError;
use crate::domain::{Feature, FeatureVector, FEATURE_COUNT};
use crate::ports::{Classifier, ModelError};

/// Deepest tree accepted at load time.
const MAX_TREE_DEPTH: usize = 64;

fn default_base_score() -> f64 {
    0.5
}

/// One node of the XGBoost JSON dump.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DumpNode {
    Split {
        nodeid: u32,
        split: String,
        split_condition: f64,
        yes: u32,
        no: u32,
        #[serde(default)]
        missing: Option<u32>,
        children: Vec<DumpNode>,
    },
    Leaf {
        nodeid: u32,
        leaf: f64,
    },
}

impl DumpNode {
    fn nodeid(&self) -> u32 {
        match self {
            Self::Split { nodeid, .. } | Self::Leaf { nodeid, .. } => *nodeid,
        }
    }
}

/// Exported booster.
#[derive(Debug, Clone, Deserialize)]
pub struct BoosterParams {
    /// Prior probability of the positive class
    #[serde(default = "default_base_score")]
    pub base_score: f64,
    pub trees: Vec<DumpNode>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f32,
        yes: usize,
        no: usize,
        missing: usize,
    },
}

/// Flattened tree; the root is at index 0.
#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn compile(root: &DumpNode) -> Result<Self, String> {
        let mut nodes = Vec::new();
        compile_node(root, &mut nodes, 0)?;
        Ok(Self { nodes })
    }

    fn leaf_value(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                    missing,
                } => {
                    let v = x[feature];
                    idx = if v.is_nan() {
                        missing
                    } else if (v as f32) < threshold {
                        yes
                    } else {
                        no
                    };
                }
            }
        }
    }
}

/// Resolve `f<index>` or a canonical feature name.
fn resolve_feature(split: &str) -> Option<usize> {
    if let Some(i) = split.strip_prefix('f').and_then(|s| s.parse::<usize>().ok()) {
        return (i < FEATURE_COUNT).then_some(i);
    }
    Feature::from_name(split).map(Feature::index)
}

fn compile_node(node: &DumpNode, nodes: &mut Vec<Node>, depth: usize) -> Result<usize, String> {
    if depth > MAX_TREE_DEPTH {
        return Err(format!("tree deeper than {MAX_TREE_DEPTH}"));
    }
    match node {
        DumpNode::Leaf { nodeid, leaf } => {
            if !leaf.is_finite() {
                return Err(format!("leaf {nodeid} is not finite"));
            }
            nodes.push(Node::Leaf(*leaf));
            Ok(nodes.len() - 1)
        }
        DumpNode::Split {
            nodeid,
            split,
            split_condition,
            yes,
            no,
            missing,
            children,
        } => {
            let feature = resolve_feature(split)
                .ok_or_else(|| format!("node {nodeid} splits on unknown feature {split:?}"))?;
            let threshold = *split_condition as f32;
            if !threshold.is_finite() {
                return Err(format!("node {nodeid} has a non-finite split_condition"));
            }
            let child = |id: u32| {
                children
                    .iter()
                    .find(|c| c.nodeid() == id)
                    .ok_or_else(|| format!("node {nodeid} references missing child {id}"))
            };
            let yes_child = child(*yes)?;
            let no_child = child(*no)?;

            let slot = nodes.len();
            nodes.push(Node::Leaf(0.0));
            let yes_idx = compile_node(yes_child, nodes, depth + 1)?;
            let no_idx = compile_node(no_child, nodes, depth + 1)?;
            let missing_idx = match missing {
                None => yes_idx,
                Some(m) if m == yes => yes_idx,
                Some(m) if m == no => no_idx,
                Some(m) => {
                    return Err(format!("node {nodeid} has missing branch {m} outside yes/no"))
                }
            };
            nodes[slot] = Node::Split {
                feature,
                threshold,
                yes: yes_idx,
                no: no_idx,
                missing: missing_idx,
            };
            Ok(slot)
        }
    }
}

/// Tree-ensemble voter.
#[derive(Debug, Clone)]
pub struct GradientBoostedTrees {
    name: String,
    base_margin: f64,
    trees: Vec<Tree>,
}

impl GradientBoostedTrees {
    /// Compile the dumped trees.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` for a base_score outside (0, 1),
    /// unknown split features, dangling child references or non-finite values.
    pub fn from_params(name: &str, params: BoosterParams) -> Result<Self, ArtifactError> {
        let p = params.base_score;
        if !(p > 0.0 && p < 1.0) {
            return Err(ArtifactError::invalid(
                name,
                format!("base_score {p} must lie strictly between 0 and 1"),
            ));
        }
        if params.trees.is_empty() {
            return Err(ArtifactError::invalid(name, "booster has no trees"));
        }

        let trees = params
            .trees
            .iter()
            .enumerate()
            .map(|(i, root)| {
                Tree::compile(root).map_err(|e| ArtifactError::invalid(name, format!("tree {i}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: name.to_string(),
            base_margin: (p / (1.0 - p)).ln(),
            trees,
        })
    }

    #[must_use]
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Raw log-odds for the positive class.
    #[must_use]
    pub fn margin(&self, features: &FeatureVector) -> f64 {
        let x = features.as_slice();
        self.base_margin + self.trees.iter().map(|t| t.leaf_value(x)).sum::<f64>()
    }
}

impl Classifier for GradientBoostedTrees {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &FeatureVector) -> Result<u8, ModelError> {
        let margin = self.margin(features);
        if !margin.is_finite() {
            return Err(ModelError::NonFinite {
                model: self.name.clone(),
            });
        }
        Ok(u8::from(margin > 0.0))
    }
}
