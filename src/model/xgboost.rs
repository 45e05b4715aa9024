//! Scoring with a gradient-boosted tree ensemble saved in XGBoost's JSON model format.
//!
//! Thresholds, leaves and sums are single precision and inputs are narrowed to
//! `f32` before each comparison, so scores match XGBoost's own predictor.

use crate::features::columns::MODEL_COLUMNS;
use crate::model::error::ModelError;
use crate::model::Forecaster;
use log::debug;
use polars::prelude::*;
use serde::Deserialize;
use std::path::Path;

const LEAF: i32 = -1;

#[derive(Debug, Deserialize)]
struct ModelFile {
    learner: Learner,
}

#[derive(Debug, Deserialize)]
struct Learner {
    #[serde(default)]
    feature_names: Vec<String>,
    learner_model_param: LearnerModelParam,
    gradient_booster: GradientBooster,
}

#[derive(Debug, Deserialize)]
struct LearnerModelParam {
    base_score: String,
}

#[derive(Debug, Deserialize)]
struct GradientBooster {
    model: BoosterModel,
}

#[derive(Debug, Deserialize)]
struct BoosterModel {
    trees: Vec<TreeRecord>,
}

#[derive(Debug, Deserialize)]
struct TreeRecord {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f32>,
    default_left: Vec<DefaultLeft>,
}

/// Older exports write `default_left` as 0/1, newer ones as booleans.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DefaultLeft {
    Bool(bool),
    Int(u8),
}

impl DefaultLeft {
    fn as_bool(&self) -> bool {
        match self {
            DefaultLeft::Bool(b) => *b,
            DefaultLeft::Int(i) => *i != 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
        default_left: bool,
    },
    Leaf(f32),
}

#[derive(Debug, Clone, PartialEq)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_record(index: usize, record: TreeRecord) -> Result<Self, ModelError> {
        let malformed = |message: String| ModelError::MalformedTree {
            tree: index,
            message,
        };

        let len = record.left_children.len();
        if len == 0 {
            return Err(malformed("tree has no nodes".to_string()));
        }
        let lengths = [
            record.right_children.len(),
            record.split_indices.len(),
            record.split_conditions.len(),
            record.default_left.len(),
        ];
        if lengths.iter().any(|&l| l != len) {
            return Err(malformed(format!(
                "node arrays differ in length ({len} vs {lengths:?})"
            )));
        }

        // Children always carry a larger id than their parent, so every path ends.
        let child = |node: usize, raw: i32| {
            usize::try_from(raw)
                .ok()
                .filter(|&c| c > node && c < len)
                .ok_or_else(|| malformed(format!("node {node} has invalid child {raw}")))
        };

        let mut nodes = Vec::with_capacity(len);
        for node in 0..len {
            let left = record.left_children[node];
            if left == LEAF {
                nodes.push(Node::Leaf(record.split_conditions[node]));
                continue;
            }
            let feature = usize::try_from(record.split_indices[node])
                .ok()
                .filter(|&f| f < MODEL_COLUMNS.len())
                .ok_or_else(|| {
                    malformed(format!(
                        "node {node} splits on unknown feature {}",
                        record.split_indices[node]
                    ))
                })?;
            nodes.push(Node::Split {
                feature,
                threshold: record.split_conditions[node],
                left: child(node, left)?,
                right: child(node, record.right_children[node])?,
                default_left: record.default_left[node].as_bool(),
            });
        }
        Ok(Self { nodes })
    }

    fn leaf_value(&self, row: &[Option<f32>]) -> f32 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    idx = match row[feature] {
                        None if default_left => left,
                        None => right,
                        Some(v) if v < threshold => left,
                        Some(_) => right,
                    };
                }
            }
        }
    }
}

/// Regression tree ensemble: `base_score` plus the sum of one leaf per tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEnsemble {
    base_score: f32,
    trees: Vec<Tree>,
}

fn parse_base_score(raw: &str) -> Result<f32, ModelError> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .map_err(|_| ModelError::BaseScore(raw.to_string()))
}

impl TreeEnsemble {
    pub async fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ModelError::ModelRead(path.to_path_buf(), e))?;
        let model = Self::from_json(&raw)?;
        debug!(
            "Loaded {} trees from {}",
            model.tree_count(),
            path.display()
        );
        Ok(model)
    }

    pub fn from_json(raw: &str) -> Result<Self, ModelError> {
        let file: ModelFile = serde_json::from_str(raw)?;
        // Older exports carry no feature names; column order is trusted then.
        let names = &file.learner.feature_names;
        if !names.is_empty()
            && names
                .iter()
                .map(String::as_str)
                .ne(MODEL_COLUMNS.iter().copied())
        {
            return Err(ModelError::FeatureNames {
                expected: MODEL_COLUMNS.iter().map(|s| s.to_string()).collect(),
                found: names.clone(),
            });
        }
        let base_score = parse_base_score(&file.learner.learner_model_param.base_score)?;
        let trees = file
            .learner
            .gradient_booster
            .model
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, record)| Tree::from_record(i, record))
            .collect::<Result<_, _>>()?;
        Ok(Self { base_score, trees })
    }

    pub fn base_score(&self) -> f32 {
        self.base_score
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Scores one row given in model column order. Missing values are `None` or NaN.
    pub fn score(&self, row: &[Option<f64>]) -> f64 {
        let row: Vec<Option<f32>> = row
            .iter()
            .map(|v| v.map(|v| v as f32).filter(|v| !v.is_nan()))
            .collect();
        let margin = self
            .trees
            .iter()
            .fold(self.base_score, |sum, tree| sum + tree.leaf_value(&row));
        f64::from(margin)
    }
}

impl Forecaster for TreeEnsemble {
    fn predict(&self, input: &DataFrame) -> Result<Vec<f64>, ModelError> {
        let columns = MODEL_COLUMNS
            .iter()
            .map(|&name| {
                let column = input
                    .column(name)
                    .map_err(|e| ModelError::MissingColumn(name.to_string(), e))?;
                Ok(column.cast(&DataType::Float64)?)
            })
            .collect::<Result<Vec<Column>, ModelError>>()?;
        let values = columns
            .iter()
            .map(|c| c.f64())
            .collect::<PolarsResult<Vec<_>>>()?;

        let mut row = vec![None; values.len()];
        let predictions = (0..input.height())
            .map(|i| {
                for (slot, column) in row.iter_mut().zip(&values) {
                    *slot = column.get(i);
                }
                self.score(&row)
            })
            .collect();
        Ok(predictions)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::features::columns::COL_TEMPERATURE;

    /// Two trees: a temperature split and a constant.
    pub(crate) const MODEL: &str = r#"{
        "learner": {
            "learner_model_param": { "base_score": "[5E-1]", "num_feature": "11" },
            "gradient_booster": {
                "name": "gbtree",
                "model": {
                    "trees": [
                        {
                            "left_children": [1, -1, -1],
                            "right_children": [2, -1, -1],
                            "split_indices": [3, 0, 0],
                            "split_conditions": [0.5, 1.0, 2.0],
                            "default_left": [1, 0, 0]
                        },
                        {
                            "left_children": [-1],
                            "right_children": [-1],
                            "split_indices": [0],
                            "split_conditions": [0.25],
                            "default_left": [false]
                        }
                    ]
                }
            }
        }
    }"#;

    fn input(temperatures: Vec<Option<f64>>) -> DataFrame {
        let height = temperatures.len();
        let columns = MODEL_COLUMNS
            .iter()
            .map(|&name| {
                if name == COL_TEMPERATURE {
                    Series::new(name.into(), temperatures.clone()).into_column()
                } else {
                    Series::new(name.into(), vec![0.0; height]).into_column()
                }
            })
            .collect();
        DataFrame::new(columns).unwrap()
    }

    #[test]
    fn loads_and_scores() {
        let model = TreeEnsemble::from_json(MODEL).unwrap();
        assert_eq!(model.base_score(), 0.5f32);
        assert_eq!(model.tree_count(), 2);

        let predictions = model
            .predict(&input(vec![Some(0.2), Some(0.8), Some(0.5), None]))
            .unwrap();
        assert_eq!(predictions, [1.75, 2.75, 2.75, 1.75]);
    }

    #[test]
    fn plain_base_score() {
        assert_eq!(parse_base_score("5E-1").unwrap(), 0.5f32);
        assert_eq!(parse_base_score("[1.25E0]").unwrap(), 1.25f32);
        assert!(matches!(parse_base_score("abc"), Err(ModelError::BaseScore(_))));
    }

    #[test]
    fn empty_input_scores_nothing() {
        let model = TreeEnsemble::from_json(MODEL).unwrap();
        assert!(model.predict(&input(vec![])).unwrap().is_empty());
    }

    #[test]
    fn missing_column_is_reported() {
        let model = TreeEnsemble::from_json(MODEL).unwrap();
        let frame = input(vec![Some(0.1)]).drop(COL_TEMPERATURE).unwrap();
        assert!(matches!(
            model.predict(&frame),
            Err(ModelError::MissingColumn(name, _)) if name == COL_TEMPERATURE
        ));
    }

    #[test]
    fn rejects_cycles_and_bad_children() {
        let looping = MODEL.replace("[1, -1, -1]", "[0, -1, -1]");
        assert!(matches!(
            TreeEnsemble::from_json(&looping),
            Err(ModelError::MalformedTree { tree: 0, .. })
        ));

        let dangling = MODEL.replace("[2, -1, -1]", "[7, -1, -1]");
        assert!(matches!(
            TreeEnsemble::from_json(&dangling),
            Err(ModelError::MalformedTree { tree: 0, .. })
        ));
    }

    #[test]
    fn rejects_mismatched_arrays() {
        let short = MODEL.replace("[0.5, 1.0, 2.0]", "[0.5, 1.0]");
        assert!(matches!(
            TreeEnsemble::from_json(&short),
            Err(ModelError::MalformedTree { tree: 0, .. })
        ));
    }

    #[test]
    fn rejects_unknown_feature() {
        let wide = MODEL.replace("[3, 0, 0]", "[42, 0, 0]");
        assert!(matches!(
            TreeEnsemble::from_json(&wide),
            Err(ModelError::MalformedTree { tree: 0, .. })
        ));
    }

    #[test]
    fn inputs_are_compared_in_single_precision() {
        // 0.0999999999 and 0.1 round to the same f32, so the split goes right.
        let raw = MODEL.replace("[0.5, 1.0, 2.0]", "[0.1, 1.0, 2.0]");
        let model = TreeEnsemble::from_json(&raw).unwrap();
        let predictions = model
            .predict(&input(vec![Some(0.0999999999), Some(0.09)]))
            .unwrap();
        assert_eq!(predictions, [2.75, 1.75]);
    }

    #[test]
    fn sums_leaves_in_single_precision() {
        let model = TreeEnsemble::from_json(&MODEL.replace("[0.25]", "[0.1]")).unwrap();
        let predictions = model.predict(&input(vec![Some(0.8)])).unwrap();
        assert_eq!(predictions, [f64::from(0.5f32 + 2.0f32 + 0.1f32)]);
    }

    #[test]
    fn checks_trained_feature_names() {
        let names = format!(
            r#""learner": {{ "feature_names": {},"#,
            serde_json::to_string(&MODEL_COLUMNS).unwrap()
        );
        let named = MODEL.replacen(r#""learner": {"#, &names, 1);
        assert_eq!(TreeEnsemble::from_json(&named).unwrap().tree_count(), 2);

        let renamed = named.replace("weather_v3_rain", "weather_rain");
        assert!(matches!(
            TreeEnsemble::from_json(&renamed),
            Err(ModelError::FeatureNames { found, .. }) if found[9] == "weather_rain"
        ));
    }

    #[tokio::test]
    async fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        assert!(matches!(
            TreeEnsemble::load(&path).await,
            Err(ModelError::ModelRead(..))
        ));
        tokio::fs::write(&path, MODEL).await.unwrap();
        assert_eq!(TreeEnsemble::load(&path).await.unwrap().tree_count(), 2);
    }
}
