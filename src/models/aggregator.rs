//! Voting ensemble that combines member regressor predictions

use crate::error::EnsembleError;
use crate::models::regressor::Regressor;
use crate::types::batch::FeatureBatch;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Guards the inverse-dispersion weight of a model that matches the crowd exactly.
const RANK_EPSILON: f64 = 1e-10;

/// How surviving member predictions are reduced to one value per sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VotingMethod {
    /// Weighted mean using configured weights, renormalized over survivors
    Weighted,
    /// Per-sample median, robust to a single outlying model
    Median,
    /// Weighted mean using inverse leave-one-out dispersion as weights
    Rank,
    /// Unweighted mean
    #[default]
    SimpleAverage,
}

impl VotingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            VotingMethod::Weighted => "weighted",
            VotingMethod::Median => "median",
            VotingMethod::Rank => "rank",
            VotingMethod::SimpleAverage => "simple-average",
        }
    }

    /// Parse a method name, falling back to simple averaging on unknown names.
    pub fn parse_lenient(name: &str) -> Self {
        name.parse().unwrap_or_else(|e: EnsembleError| {
            warn!(method = %name, error = %e, "Falling back to simple-average voting");
            VotingMethod::SimpleAverage
        })
    }
}

impl FromStr for VotingMethod {
    type Err = EnsembleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weighted" => Ok(VotingMethod::Weighted),
            "median" => Ok(VotingMethod::Median),
            "rank" => Ok(VotingMethod::Rank),
            "simple-average" | "simple_average" => Ok(VotingMethod::SimpleAverage),
            _ => Err(EnsembleError::UnrecognizedVotingMethod(s.to_string())),
        }
    }
}

impl fmt::Display for VotingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named regressor inside an ensemble
pub struct EnsembleMember {
    name: String,
    regressor: Box<dyn Regressor>,
}

impl EnsembleMember {
    pub fn new<R: Regressor + 'static>(name: impl Into<String>, regressor: R) -> Self {
        Self::boxed(name, Box::new(regressor))
    }

    pub fn boxed(name: impl Into<String>, regressor: Box<dyn Regressor>) -> Self {
        Self {
            name: name.into(),
            regressor,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for EnsembleMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnsembleMember")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Predictions of a member that succeeded in this call
#[derive(Debug, Clone)]
pub struct MemberPrediction {
    pub name: String,
    pub values: Vec<f64>,
    pub elapsed: Duration,
}

/// A member excluded from this call
#[derive(Debug, Clone)]
pub struct MemberFailure {
    pub name: String,
    /// Always `EnsembleError::ModelPredictionFailed`
    pub error: EnsembleError,
    pub elapsed: Duration,
}

/// Diagnostics of one ensemble prediction
#[derive(Debug, Clone)]
pub struct VotingReport {
    pub method: VotingMethod,
    pub succeeded: Vec<MemberPrediction>,
    pub failed: Vec<MemberFailure>,
    /// Normalized weights applied to survivors; empty for median voting
    pub weights: Vec<(String, f64)>,
}

impl VotingReport {
    fn empty(method: VotingMethod) -> Self {
        Self {
            method,
            succeeded: Vec::new(),
            failed: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Raw predictions keyed by member name
    pub fn model_predictions(&self) -> HashMap<String, Vec<f64>> {
        self.succeeded
            .iter()
            .map(|m| (m.name.clone(), m.values.clone()))
            .collect()
    }

    pub fn failed_models(&self) -> Vec<String> {
        self.failed.iter().map(|f| f.name.clone()).collect()
    }

    pub fn weight_map(&self) -> HashMap<String, f64> {
        self.weights.iter().cloned().collect()
    }

    /// Weight applied to a member, if it survived and the method is weighted
    pub fn weight_of(&self, name: &str) -> Option<f64> {
        self.weights
            .iter()
            .find(|(member, _)| member == name)
            .map(|(_, w)| *w)
    }
}

/// Final per-sample values plus the diagnostics that produced them
#[derive(Debug, Clone)]
pub struct EnsemblePrediction {
    pub values: Vec<f64>,
    pub report: VotingReport,
}

/// Combines fitted regressors under one voting method.
///
/// Immutable after construction: predictions never mutate the ensemble, so a
/// shared reference can serve concurrent calls.
#[derive(Debug)]
pub struct VotingEnsemble {
    members: Vec<EnsembleMember>,
    /// Raw configured weights, parallel to `members`
    weights: Option<Vec<f64>>,
    method: VotingMethod,
}

impl VotingEnsemble {
    /// Create an ensemble.
    ///
    /// Fails on an empty or duplicate-named member list, on weights that are
    /// misaligned, negative, non-finite or all zero, and on weighted voting
    /// without weights.
    pub fn new(
        members: Vec<EnsembleMember>,
        weights: Option<Vec<f64>>,
        method: VotingMethod,
    ) -> Result<Self, EnsembleError> {
        if members.is_empty() {
            return Err(EnsembleError::EmptyEnsemble);
        }

        let mut seen = HashSet::new();
        for member in &members {
            if !seen.insert(member.name()) {
                return Err(EnsembleError::DuplicateModel(member.name().to_string()));
            }
        }

        match &weights {
            Some(weights) => validate_weights(weights, members.len())?,
            None if method == VotingMethod::Weighted => return Err(EnsembleError::MissingWeights),
            None => {}
        }

        Ok(Self {
            members,
            weights,
            method,
        })
    }

    pub fn method(&self) -> VotingMethod {
        self.method
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn model_names(&self) -> Vec<String> {
        self.members.iter().map(|m| m.name().to_string()).collect()
    }

    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    /// Predict one value per sample.
    pub fn predict(&self, batch: &FeatureBatch) -> Result<Vec<f64>, EnsembleError> {
        Ok(self.predict_detailed(batch)?.values)
    }

    /// Predict one value per sample and report which members contributed.
    pub fn predict_detailed(
        &self,
        batch: &FeatureBatch,
    ) -> Result<EnsemblePrediction, EnsembleError> {
        let n_samples = batch.len();
        if n_samples == 0 {
            return Ok(EnsemblePrediction {
                values: Vec::new(),
                report: VotingReport::empty(self.method),
            });
        }

        let mut report = VotingReport::empty(self.method);
        let mut surviving = Vec::with_capacity(self.members.len());

        for (idx, member) in self.members.iter().enumerate() {
            let start = Instant::now();
            let outcome = member
                .regressor
                .predict(batch)
                .map_err(|e| format!("{:#}", e))
                .and_then(|values| check_output(values, n_samples));
            let elapsed = start.elapsed();

            match outcome {
                Ok(values) => {
                    debug!(
                        model = %member.name,
                        elapsed_us = elapsed.as_micros() as u64,
                        "Model prediction succeeded"
                    );
                    surviving.push(idx);
                    report.succeeded.push(MemberPrediction {
                        name: member.name.clone(),
                        values,
                        elapsed,
                    });
                }
                Err(reason) => {
                    warn!(
                        model = %member.name,
                        error = %reason,
                        "Model prediction failed, excluding from vote"
                    );
                    report.failed.push(MemberFailure {
                        name: member.name.clone(),
                        error: EnsembleError::ModelPredictionFailed {
                            model: member.name.clone(),
                            reason,
                        },
                        elapsed,
                    });
                }
            }
        }

        if report.succeeded.is_empty() {
            return Err(EnsembleError::NoPredictionsAvailable {
                attempted: self.members.len(),
            });
        }

        let matrix: Vec<&[f64]> = report
            .succeeded
            .iter()
            .map(|m| m.values.as_slice())
            .collect();

        let (values, weights) = match self.method {
            VotingMethod::Weighted => {
                let weights = self.surviving_weights(&surviving, &report)?;
                (weighted_mean(&matrix, &weights, n_samples), weights)
            }
            VotingMethod::Median => (median(&matrix, n_samples), Vec::new()),
            VotingMethod::Rank => {
                let weights = rank_weights(&matrix, n_samples).ok_or_else(|| {
                    EnsembleError::NonFiniteVote {
                        method: self.method.to_string(),
                    }
                })?;
                (weighted_mean(&matrix, &weights, n_samples), weights)
            }
            VotingMethod::SimpleAverage => {
                let k = matrix.len();
                (simple_average(&matrix, n_samples), vec![1.0 / k as f64; k])
            }
        };

        if values.iter().any(|v| !v.is_finite()) {
            return Err(EnsembleError::NonFiniteVote {
                method: self.method.to_string(),
            });
        }

        report.weights = report
            .succeeded
            .iter()
            .map(|m| m.name.clone())
            .zip(weights)
            .collect();

        debug!(
            method = %self.method,
            survivors = report.succeeded.len(),
            failed = ?report.failed_models(),
            weights = ?report.weights,
            "Applied ensemble voting"
        );

        Ok(EnsemblePrediction { values, report })
    }

    /// Configured weights of the surviving members, normalized to sum to 1.
    fn surviving_weights(
        &self,
        surviving: &[usize],
        report: &VotingReport,
    ) -> Result<Vec<f64>, EnsembleError> {
        let configured = self.weights.as_ref().ok_or(EnsembleError::MissingWeights)?;
        let picked: Vec<f64> = surviving.iter().map(|&idx| configured[idx]).collect();
        let total: f64 = picked.iter().sum();

        if total <= 0.0 {
            return Err(EnsembleError::ZeroSurvivingWeight {
                survivors: report.succeeded.iter().map(|m| m.name.clone()).collect(),
            });
        }
        if !total.is_finite() {
            return Err(EnsembleError::InvalidWeights(
                "surviving weights do not sum to a finite number".to_string(),
            ));
        }

        Ok(picked.into_iter().map(|w| w / total).collect())
    }
}

fn validate_weights(weights: &[f64], n_members: usize) -> Result<(), EnsembleError> {
    if weights.len() != n_members {
        return Err(EnsembleError::InvalidWeights(format!(
            "{} weights for {} models",
            weights.len(),
            n_members
        )));
    }
    if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(EnsembleError::InvalidWeights(format!(
            "weight {} is not a finite non-negative number",
            w
        )));
    }
    if !weights.iter().sum::<f64>().is_finite() {
        return Err(EnsembleError::InvalidWeights(
            "weights do not sum to a finite number".to_string(),
        ));
    }
    if weights.iter().all(|&w| w == 0.0) {
        return Err(EnsembleError::InvalidWeights(
            "all weights are zero".to_string(),
        ));
    }
    Ok(())
}

fn check_output(values: Vec<f64>, n_samples: usize) -> Result<Vec<f64>, String> {
    if values.len() != n_samples {
        return Err(format!(
            "returned {} predictions for {} samples",
            values.len(),
            n_samples
        ));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err("returned a non-finite prediction".to_string());
    }
    Ok(values)
}

fn simple_average(matrix: &[&[f64]], n_samples: usize) -> Vec<f64> {
    let k = matrix.len() as f64;
    (0..n_samples)
        .map(|s| matrix.iter().map(|row| row[s]).sum::<f64>() / k)
        .collect()
}

/// `weights` must already sum to 1.
fn weighted_mean(matrix: &[&[f64]], weights: &[f64], n_samples: usize) -> Vec<f64> {
    (0..n_samples)
        .map(|s| {
            matrix
                .iter()
                .zip(weights)
                .map(|(row, w)| row[s] * w)
                .sum::<f64>()
        })
        .collect()
}

fn median(matrix: &[&[f64]], n_samples: usize) -> Vec<f64> {
    (0..n_samples)
        .map(|s| {
            let mut column: Vec<f64> = matrix.iter().map(|row| row[s]).collect();
            column.sort_by(|a, b| a.total_cmp(b));

            let mid = column.len() / 2;
            if column.len() % 2 == 0 {
                (column[mid - 1] + column[mid]) / 2.0
            } else {
                column[mid]
            }
        })
        .collect()
}

/// Inverse leave-one-out dispersion weights, normalized to sum to 1.
///
/// A model's dispersion is the mean squared deviation, over every sample in
/// the batch, of its prediction from the mean of the other models. Returns
/// `None` when the dispersions overflow and no weight can be derived.
fn rank_weights(matrix: &[&[f64]], n_samples: usize) -> Option<Vec<f64>> {
    let k = matrix.len();
    if k == 1 {
        return Some(vec![1.0]);
    }

    let column_sums: Vec<f64> = (0..n_samples)
        .map(|s| matrix.iter().map(|row| row[s]).sum::<f64>())
        .collect();

    let inverse: Vec<f64> = matrix
        .iter()
        .map(|row| {
            let dispersion = (0..n_samples)
                .map(|s| {
                    let others_mean = (column_sums[s] - row[s]) / (k - 1) as f64;
                    (row[s] - others_mean).powi(2)
                })
                .sum::<f64>()
                / n_samples as f64;
            1.0 / (dispersion + RANK_EPSILON)
        })
        .collect();

    let total: f64 = inverse.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }

    let weights: Vec<f64> = inverse.into_iter().map(|w| w / total).collect();
    weights.iter().all(|w| w.is_finite()).then_some(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use std::sync::Arc;

    /// Returns the same predictions regardless of input
    struct Fixed(Vec<f64>);

    impl Regressor for Fixed {
        fn predict(&self, _batch: &FeatureBatch) -> Result<Vec<f64>> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    impl Regressor for Failing {
        fn predict(&self, _batch: &FeatureBatch) -> Result<Vec<f64>> {
            bail!("model file corrupted")
        }
    }

    fn batch(n_samples: usize) -> FeatureBatch {
        FeatureBatch::new(vec!["x".to_string()], vec![vec![0.0]; n_samples]).unwrap()
    }

    fn fixed(name: &str, values: &[f64]) -> EnsembleMember {
        EnsembleMember::new(name, Fixed(values.to_vec()))
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_simple_average() {
        let ensemble = VotingEnsemble::new(
            vec![
                fixed("linear", &[100.0, 200.0]),
                fixed("random_forest", &[110.0, 260.0]),
                fixed("xgboost", &[120.0, 170.0]),
            ],
            None,
            VotingMethod::SimpleAverage,
        )
        .unwrap();

        let values = ensemble.predict(&batch(2)).unwrap();

        assert_eq!(values.len(), 2);
        assert_close(values[0], 110.0);
        assert_close(values[1], 210.0);
    }

    #[test]
    fn test_median_odd_and_even() {
        let odd = VotingEnsemble::new(
            vec![
                fixed("a", &[100.0]),
                fixed("b", &[500.0]),
                fixed("c", &[120.0]),
            ],
            None,
            VotingMethod::Median,
        )
        .unwrap();
        assert_eq!(odd.predict(&batch(1)).unwrap(), vec![120.0]);

        let even = VotingEnsemble::new(
            vec![
                fixed("a", &[100.0]),
                fixed("b", &[500.0]),
                fixed("c", &[120.0]),
                fixed("d", &[140.0]),
            ],
            None,
            VotingMethod::Median,
        )
        .unwrap();
        assert_eq!(even.predict(&batch(1)).unwrap(), vec![130.0]);
    }

    #[test]
    fn test_weighted_all_members() {
        let ensemble = VotingEnsemble::new(
            vec![
                fixed("xgboost", &[300.0, 90.0]),
                fixed("random_forest", &[200.0, 110.0]),
                fixed("linear", &[100.0, 130.0]),
            ],
            Some(vec![2.0, 1.0, 1.0]),
            VotingMethod::Weighted,
        )
        .unwrap();

        let prediction = ensemble.predict_detailed(&batch(2)).unwrap();

        assert_close(prediction.values[0], (2.0 * 300.0 + 200.0 + 100.0) / 4.0);
        assert_close(prediction.values[1], (2.0 * 90.0 + 110.0 + 130.0) / 4.0);
        assert_close(prediction.report.weight_of("xgboost").unwrap(), 0.5);
    }

    #[test]
    fn test_weighted_renormalizes_over_survivors() {
        let ensemble = VotingEnsemble::new(
            vec![
                fixed("xgboost", &[300.0]),
                fixed("random_forest", &[150.0]),
                EnsembleMember::new("linear", Failing),
            ],
            Some(vec![2.0, 1.0, 1.0]),
            VotingMethod::Weighted,
        )
        .unwrap();

        let prediction = ensemble.predict_detailed(&batch(1)).unwrap();

        assert_close(prediction.report.weight_of("xgboost").unwrap(), 2.0 / 3.0);
        assert_close(prediction.report.weight_of("random_forest").unwrap(), 1.0 / 3.0);
        assert_eq!(prediction.report.weight_of("linear"), None);
        assert_close(prediction.values[0], 300.0 * 2.0 / 3.0 + 150.0 / 3.0);
        assert_eq!(prediction.report.failed_models(), vec!["linear".to_string()]);
        assert!(matches!(
            prediction.report.failed[0].error,
            EnsembleError::ModelPredictionFailed { ref model, .. } if model == "linear"
        ));
    }

    #[test]
    fn test_weighted_without_weights_fails_at_construction() {
        let err = VotingEnsemble::new(vec![fixed("a", &[1.0])], None, VotingMethod::Weighted)
            .unwrap_err();
        assert_eq!(err, EnsembleError::MissingWeights);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let members = || vec![fixed("a", &[1.0]), fixed("b", &[2.0])];

        for weights in [vec![1.0], vec![1.0, -1.0], vec![0.0, 0.0], vec![f64::NAN, 1.0]] {
            let err = VotingEnsemble::new(members(), Some(weights), VotingMethod::Weighted)
                .unwrap_err();
            assert!(matches!(err, EnsembleError::InvalidWeights(_)));
        }
    }

    #[test]
    fn test_zero_weight_survivors() {
        let ensemble = VotingEnsemble::new(
            vec![EnsembleMember::new("a", Failing), fixed("b", &[2.0])],
            Some(vec![1.0, 0.0]),
            VotingMethod::Weighted,
        )
        .unwrap();

        let err = ensemble.predict(&batch(1)).unwrap_err();
        assert_eq!(
            err,
            EnsembleError::ZeroSurvivingWeight {
                survivors: vec!["b".to_string()]
            }
        );
    }

    #[test]
    fn test_all_members_fail() {
        let ensemble = VotingEnsemble::new(
            vec![
                EnsembleMember::new("a", Failing),
                EnsembleMember::new("b", Failing),
            ],
            None,
            VotingMethod::Median,
        )
        .unwrap();

        let err = ensemble.predict(&batch(3)).unwrap_err();
        assert_eq!(err, EnsembleError::NoPredictionsAvailable { attempted: 2 });
    }

    #[test]
    fn test_rank_downweights_outlier() {
        let ensemble = VotingEnsemble::new(
            vec![
                fixed("a", &[100.0]),
                fixed("b", &[102.0]),
                fixed("outlier", &[150.0]),
            ],
            None,
            VotingMethod::Rank,
        )
        .unwrap();

        let prediction = ensemble.predict_detailed(&batch(1)).unwrap();
        let report = &prediction.report;
        let outlier = report.weight_of("outlier").unwrap();

        assert!(outlier < report.weight_of("a").unwrap() / 2.0);
        assert!(outlier < report.weight_of("b").unwrap() / 2.0);
        assert_close(report.weights.iter().map(|(_, w)| w).sum::<f64>(), 1.0);

        let simple_average = (100.0 + 102.0 + 150.0) / 3.0;
        assert!(prediction.values[0] > 100.0);
        assert!(prediction.values[0] < simple_average);
    }

    #[test]
    fn test_rank_dispersion_uses_whole_batch() {
        // "b" agrees on the first sample only; across the batch it is the outlier
        let ensemble = VotingEnsemble::new(
            vec![
                fixed("a", &[100.0, 200.0]),
                fixed("b", &[100.0, 400.0]),
                fixed("c", &[100.0, 210.0]),
            ],
            None,
            VotingMethod::Rank,
        )
        .unwrap();

        let prediction = ensemble.predict_detailed(&batch(2)).unwrap();

        assert_close(prediction.values[0], 100.0);
        let report = &prediction.report;
        assert!(report.weight_of("b").unwrap() < report.weight_of("a").unwrap());
    }

    #[test]
    fn test_rank_single_survivor() {
        let ensemble = VotingEnsemble::new(
            vec![fixed("a", &[123.0]), EnsembleMember::new("b", Failing)],
            None,
            VotingMethod::Rank,
        )
        .unwrap();

        let prediction = ensemble.predict_detailed(&batch(1)).unwrap();
        assert_eq!(prediction.values, vec![123.0]);
        assert_eq!(prediction.report.weight_of("a"), Some(1.0));
    }

    #[test]
    fn test_weights_must_sum_to_finite_total() {
        let err = VotingEnsemble::new(
            vec![fixed("linear", &[300_000.0]), fixed("xgboost", &[500_000.0])],
            Some(vec![f64::MAX, f64::MAX]),
            VotingMethod::Weighted,
        )
        .unwrap_err();

        assert!(matches!(err, EnsembleError::InvalidWeights(_)));
    }

    #[test]
    fn test_rank_dispersion_overflow_is_an_error() {
        let ensemble = VotingEnsemble::new(
            vec![
                fixed("a", &[1e200]),
                fixed("b", &[2e200]),
                fixed("c", &[4e200]),
            ],
            None,
            VotingMethod::Rank,
        )
        .unwrap();

        assert_eq!(
            ensemble.predict(&batch(1)).unwrap_err(),
            EnsembleError::NonFiniteVote {
                method: "rank".to_string()
            }
        );
    }

    #[test]
    fn test_average_overflow_is_an_error() {
        let ensemble = VotingEnsemble::new(
            vec![fixed("a", &[f64::MAX]), fixed("b", &[f64::MAX])],
            None,
            VotingMethod::SimpleAverage,
        )
        .unwrap();

        assert!(matches!(
            ensemble.predict(&batch(1)),
            Err(EnsembleError::NonFiniteVote { .. })
        ));
    }

    #[test]
    fn test_wrong_length_output_excluded() {
        let ensemble = VotingEnsemble::new(
            vec![fixed("short", &[1.0]), fixed("ok", &[5.0, 7.0])],
            None,
            VotingMethod::SimpleAverage,
        )
        .unwrap();

        let prediction = ensemble.predict_detailed(&batch(2)).unwrap();
        assert_eq!(prediction.values, vec![5.0, 7.0]);
        assert_eq!(prediction.report.failed_models(), vec!["short".to_string()]);
    }

    #[test]
    fn test_non_finite_output_excluded() {
        let ensemble = VotingEnsemble::new(
            vec![fixed("nan", &[f64::NAN]), fixed("ok", &[5.0])],
            None,
            VotingMethod::Median,
        )
        .unwrap();

        assert_eq!(ensemble.predict(&batch(1)).unwrap(), vec![5.0]);
    }

    #[test]
    fn test_empty_batch() {
        let ensemble = VotingEnsemble::new(
            vec![EnsembleMember::new("a", Failing)],
            None,
            VotingMethod::SimpleAverage,
        )
        .unwrap();

        assert!(ensemble.predict(&batch(0)).unwrap().is_empty());
    }

    #[test]
    fn test_construction_checks_members() {
        let err = VotingEnsemble::new(Vec::new(), None, VotingMethod::Median).unwrap_err();
        assert_eq!(err, EnsembleError::EmptyEnsemble);

        let err = VotingEnsemble::new(
            vec![fixed("a", &[1.0]), fixed("a", &[2.0])],
            None,
            VotingMethod::Median,
        )
        .unwrap_err();
        assert_eq!(err, EnsembleError::DuplicateModel("a".to_string()));
    }

    #[test]
    fn test_voting_method_parsing() {
        assert_eq!("weighted".parse::<VotingMethod>().unwrap(), VotingMethod::Weighted);
        assert_eq!(" Median ".parse::<VotingMethod>().unwrap(), VotingMethod::Median);
        assert_eq!(
            "simple_average".parse::<VotingMethod>().unwrap(),
            VotingMethod::SimpleAverage
        );
        assert_eq!(
            "bagging".parse::<VotingMethod>().unwrap_err(),
            EnsembleError::UnrecognizedVotingMethod("bagging".to_string())
        );
        assert_eq!(VotingMethod::parse_lenient("bagging"), VotingMethod::SimpleAverage);
        assert_eq!(VotingMethod::parse_lenient("rank"), VotingMethod::Rank);
        assert_eq!(VotingMethod::Rank.to_string(), "rank");
    }

    #[test]
    fn test_concurrent_predictions() {
        let ensemble = Arc::new(
            VotingEnsemble::new(
                vec![fixed("a", &[100.0]), fixed("b", &[200.0])],
                Some(vec![1.0, 3.0]),
                VotingMethod::Weighted,
            )
            .unwrap(),
        );

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let ensemble = ensemble.clone();
                scope.spawn(move || {
                    assert_eq!(ensemble.predict(&batch(1)).unwrap(), vec![175.0]);
                });
            }
        });
    }
}
