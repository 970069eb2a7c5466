//! Serialized regressor forms the model artifact may carry.
//!
//! Each form exposes the same contract: a feature matrix in, one predicted
//! value per row out. Structure is validated once at load time (node and
//! feature indices in bounds, child links strictly forward) so prediction
//! itself never fails.

use serde::{Deserialize, Serialize};

/// Flattened decision-tree node. `feature < 0` marks a leaf carrying `value`;
/// interior nodes route rows left when `row[feature] <= threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub feature: i32,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub left: u32,
    #[serde(default)]
    pub right: u32,
    #[serde(default)]
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut index = 0usize;
        loop {
            let node = &self.nodes[index];
            if node.feature < 0 {
                return node.value;
            }
            index = if row[node.feature as usize] <= node.threshold {
                node.left as usize
            } else {
                node.right as usize
            };
        }
    }

    fn check(&self, width: usize, context: &str) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err(format!("{context}: tree has no nodes"));
        }
        for (index, node) in self.nodes.iter().enumerate() {
            if node.feature < 0 {
                continue;
            }
            if node.feature as usize >= width {
                return Err(format!(
                    "{context}: node {index} reads feature {} beyond width {width}",
                    node.feature
                ));
            }
            // children must point strictly forward so traversal terminates
            for child in [node.left, node.right] {
                if child as usize <= index || child as usize >= self.nodes.len() {
                    return Err(format!(
                        "{context}: node {index} has out-of-order child {child}"
                    ));
                }
            }
        }
        Ok(())
    }
}

/// One serialized estimator. The `kind` tag selects the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Regressor {
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    Forest {
        trees: Vec<DecisionTree>,
    },
    GradientBoosting {
        init: f64,
        trees: Vec<DecisionTree>,
    },
    Knn {
        neighbors: usize,
        points: Vec<Vec<f64>>,
        targets: Vec<f64>,
    },
}

impl Regressor {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Linear { .. } => "linear",
            Self::Forest { .. } => "forest",
            Self::GradientBoosting { .. } => "gradient_boosting",
            Self::Knn { .. } => "knn",
        }
    }

    /// Structural validation against the expected feature width. Run once at
    /// artifact load; prediction assumes it passed.
    pub fn check(&self, width: usize, context: &str) -> Result<(), String> {
        match self {
            Self::Linear { coefficients, .. } => {
                if coefficients.len() != width {
                    return Err(format!(
                        "{context}: {} coefficients for feature width {width}",
                        coefficients.len()
                    ));
                }
                Ok(())
            }
            Self::Forest { trees } => {
                if trees.is_empty() {
                    return Err(format!("{context}: forest has no trees"));
                }
                for (index, tree) in trees.iter().enumerate() {
                    tree.check(width, &format!("{context}.trees[{index}]"))?;
                }
                Ok(())
            }
            Self::GradientBoosting { trees, .. } => {
                for (index, tree) in trees.iter().enumerate() {
                    tree.check(width, &format!("{context}.trees[{index}]"))?;
                }
                Ok(())
            }
            Self::Knn {
                neighbors,
                points,
                targets,
            } => {
                if *neighbors == 0 {
                    return Err(format!("{context}: neighbors must be at least 1"));
                }
                if points.is_empty() {
                    return Err(format!("{context}: no reference points"));
                }
                if points.len() != targets.len() {
                    return Err(format!(
                        "{context}: {} points but {} targets",
                        points.len(),
                        targets.len()
                    ));
                }
                if let Some(bad) = points.iter().position(|p| p.len() != width) {
                    return Err(format!(
                        "{context}: point {bad} has width {} instead of {width}",
                        points[bad].len()
                    ));
                }
                Ok(())
            }
        }
    }

    pub fn predict(&self, matrix: &[Vec<f64>]) -> Vec<f64> {
        matrix.iter().map(|row| self.predict_row(row)).collect()
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        match self {
            Self::Linear {
                coefficients,
                intercept,
            } => {
                coefficients
                    .iter()
                    .zip(row.iter())
                    .map(|(c, x)| c * x)
                    .sum::<f64>()
                    + intercept
            }
            Self::Forest { trees } => {
                trees.iter().map(|tree| tree.predict_row(row)).sum::<f64>() / trees.len() as f64
            }
            Self::GradientBoosting { init, trees } => {
                init + trees.iter().map(|tree| tree.predict_row(row)).sum::<f64>()
            }
            Self::Knn {
                neighbors,
                points,
                targets,
            } => {
                let mut distances: Vec<(f64, f64)> = points
                    .iter()
                    .zip(targets.iter())
                    .map(|(point, target)| (squared_distance(point, row), *target))
                    .collect();
                distances.sort_by(|a, b| a.0.total_cmp(&b.0));
                let k = (*neighbors).min(distances.len());
                distances.iter().take(k).map(|(_, t)| t).sum::<f64>() / k as f64
            }
        }
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
