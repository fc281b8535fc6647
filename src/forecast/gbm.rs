//! Hand-rolled gradient boosted regression trees. No crate in
//! the surrounding stack offers this directly, so it follows the same
//! house style as other from-scratch numeric routines: small, typed,
//! and covered by focused unit tests rather than pulled in whole.

use statrs::statistics::Statistics;

use crate::forecast::features::{FEATURE_COUNT, FeatureVector};

const MIN_LEAF_SIZE: usize = 3;

#[derive(Debug, Clone)]
enum Tree {
    Leaf { value: f64 },
    Split { feature: usize, threshold: f64, left: Box<Tree>, right: Box<Tree> },
}

impl Tree {
    fn predict(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        match self {
            Tree::Leaf { value } => *value,
            Tree::Split { feature, threshold, left, right } => {
                if x[*feature] <= *threshold { left.predict(x) } else { right.predict(x) }
            }
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() { 0.0 } else { values.iter().sum::<f64>() / values.len() as f64 }
}

fn sse(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum()
}

fn build_tree(rows: &[(FeatureVector, f64)], depth: usize) -> Tree {
    let targets: Vec<f64> = rows.iter().map(|(_, y)| *y).collect();

    if depth == 0 || rows.len() < MIN_LEAF_SIZE * 2 {
        return Tree::Leaf { value: mean(&targets) };
    }

    let parent_sse = sse(&targets);
    let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, gain)

    for feature in 0..FEATURE_COUNT {
        let mut values: Vec<f64> = rows.iter().map(|(x, _)| x.0[feature]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        values.dedup();

        for window in values.windows(2) {
            let threshold = (window[0] + window[1]) / 2.0;
            let left: Vec<f64> = rows.iter().filter(|(x, _)| x.0[feature] <= threshold).map(|(_, y)| *y).collect();
            let right: Vec<f64> = rows.iter().filter(|(x, _)| x.0[feature] > threshold).map(|(_, y)| *y).collect();

            if left.len() < MIN_LEAF_SIZE || right.len() < MIN_LEAF_SIZE {
                continue;
            }

            let gain = parent_sse - sse(&left) - sse(&right);
            if best.map(|(_, _, best_gain)| gain > best_gain).unwrap_or(true) {
                best = Some((feature, threshold, gain));
            }
        }
    }

    match best {
        Some((feature, threshold, gain)) if gain > 0.0 => {
            let left_rows: Vec<_> = rows.iter().filter(|(x, _)| x.0[feature] <= threshold).cloned().collect();
            let right_rows: Vec<_> = rows.iter().filter(|(x, _)| x.0[feature] > threshold).cloned().collect();
            Tree::Split {
                feature,
                threshold,
                left: Box::new(build_tree(&left_rows, depth - 1)),
                right: Box::new(build_tree(&right_rows, depth - 1)),
            }
        }
        _ => Tree::Leaf { value: mean(&targets) },
    }
}

#[derive(Debug, Clone)]
pub struct GbmModel {
    init: f64,
    trees: Vec<Tree>,
    shrinkage: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Diagnostics {
    pub rmse: f64,
    pub mae: f64,
}

impl GbmModel {
    pub fn predict(&self, x: &FeatureVector) -> f64 {
        self.init + self.shrinkage * self.trees.iter().map(|t| t.predict(&x.0)).sum::<f64>()
    }

    fn fit(rows: &[(FeatureVector, f64)], rounds: usize, depth: usize, shrinkage: f64) -> Self {
        let targets: Vec<f64> = rows.iter().map(|(_, y)| *y).collect();
        let init = mean(&targets);
        let mut residuals: Vec<f64> = targets.iter().map(|y| y - init).collect();
        let mut trees = Vec::with_capacity(rounds);

        for _ in 0..rounds {
            let training: Vec<(FeatureVector, f64)> = rows.iter().map(|(x, _)| *x).zip(residuals.iter().copied()).collect();
            let tree = build_tree(&training, depth);
            for (i, (x, _)) in rows.iter().enumerate() {
                residuals[i] -= shrinkage * tree.predict(&x.0);
            }
            trees.push(tree);
        }

        GbmModel { init, trees, shrinkage }
    }
}

/// Trains via 5-fold cross-validation across sequential chunks,
/// retaining the fold whose held-out RMSE is lowest; average RMSE/MAE
/// across folds are returned as diagnostics.
pub fn train_with_cross_validation(rows: &[(FeatureVector, f64)], rounds: usize, depth: usize, shrinkage: f64) -> (GbmModel, Diagnostics) {
    if rows.len() < 10 {
        let model = GbmModel::fit(rows, rounds, depth, shrinkage);
        let errors: Vec<f64> = rows.iter().map(|(x, y)| (model.predict(x) - y).abs()).collect();
        let rmse = if errors.is_empty() { 0.0 } else { errors.iter().map(|e| e * e).collect::<Vec<_>>().mean().sqrt() };
        let mae = if errors.is_empty() { 0.0 } else { errors.clone().mean() };
        return (model, Diagnostics { rmse, mae });
    }

    const FOLDS: usize = 5;
    let fold_size = rows.len() / FOLDS;

    let mut best_model = None;
    let mut best_rmse = f64::MAX;
    let mut rmses = Vec::with_capacity(FOLDS);
    let mut maes = Vec::with_capacity(FOLDS);

    for fold in 0..FOLDS {
        let test_start = fold * fold_size;
        let test_end = if fold == FOLDS - 1 { rows.len() } else { test_start + fold_size };

        let train_rows: Vec<_> = rows[..test_start].iter().chain(rows[test_end..].iter()).cloned().collect();
        let test_rows = &rows[test_start..test_end];

        if train_rows.is_empty() || test_rows.is_empty() {
            continue;
        }

        let model = GbmModel::fit(&train_rows, rounds, depth, shrinkage);
        let errors: Vec<f64> = test_rows.iter().map(|(x, y)| model.predict(x) - y).collect();
        let rmse = errors.iter().map(|e| e * e).collect::<Vec<_>>().mean().sqrt();
        let mae = errors.iter().map(|e| e.abs()).collect::<Vec<_>>().mean();

        rmses.push(rmse);
        maes.push(mae);

        if rmse < best_rmse {
            best_rmse = rmse;
            best_model = Some(model);
        }
    }

    let model = best_model.unwrap_or_else(|| GbmModel::fit(rows, rounds, depth, shrinkage));
    let diagnostics = Diagnostics { rmse: rmses.mean(), mae: maes.mean() };
    (model, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(v: [f64; FEATURE_COUNT]) -> FeatureVector {
        FeatureVector(v)
    }

    #[test]
    fn tree_fits_a_simple_threshold_split() {
        let rows = vec![
            (feature([0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]), 10.0),
            (feature([1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]), 10.0),
            (feature([2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]), 10.0),
            (feature([5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]), 50.0),
            (feature([6.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]), 50.0),
            (feature([7.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]), 50.0),
        ];
        let model = GbmModel::fit(&rows, 20, 3, 0.3);
        let low = model.predict(&feature([0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]));
        let high = model.predict(&feature([6.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]));
        assert!(high > low);
    }

    #[test]
    fn cross_validation_returns_finite_diagnostics() {
        let rows: Vec<_> = (0..40)
            .map(|i| (feature([i as f64 % 7.0, 0.0, i as f64, 0.0, 0.0, 0.0, 1.0]), 1000.0 + i as f64 * 10.0))
            .collect();
        let (_, diag) = train_with_cross_validation(&rows, 20, 4, 0.2);
        assert!(diag.rmse.is_finite());
        assert!(diag.mae.is_finite());
    }
}
