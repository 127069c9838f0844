/// Ranking metrics for offline evaluation of recommendations.
///
/// Items are compared by exact string equality (in practice: assessment URLs).
/// Means over an empty collection are 0.
use std::collections::HashSet;

use serde::Serialize;

/// Predictions for one labelled query alongside its known-relevant items.
#[derive(Debug, Clone, Serialize)]
pub struct QueryEvaluation {
    pub query: String,
    pub relevant: Vec<String>,
    pub predicted: Vec<String>,
}

/// Fraction of the relevant items found in the first `k` predictions.
pub fn recall_at_k(predicted: &[String], relevant: &[String], k: usize) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    let top_k = &predicted[..predicted.len().min(k)];
    overlap(top_k, relevant) as f64 / relevant.len() as f64
}

/// Fraction of the first `k` predictions that are relevant.
pub fn precision_at_k(predicted: &[String], relevant: &[String], k: usize) -> f64 {
    if predicted.is_empty() || k == 0 {
        return 0.0;
    }
    let top_k = &predicted[..predicted.len().min(k)];
    overlap(top_k, relevant) as f64 / top_k.len() as f64
}

/// Average precision over the full prediction list.
///
/// Returns `None` when there are no relevant items, so callers can leave such queries
/// out of the mean.
pub fn average_precision(predicted: &[String], relevant: &[String]) -> Option<f64> {
    let relevant: HashSet<&str> = relevant.iter().map(String::as_str).collect();
    if relevant.is_empty() {
        return None;
    }
    let mut hits = 0usize;
    let mut score = 0.0;
    for (i, pred) in predicted.iter().enumerate() {
        if relevant.contains(pred.as_str()) {
            hits += 1;
            score += hits as f64 / (i + 1) as f64;
        }
    }
    Some(score / relevant.len() as f64)
}

pub fn mean_recall_at_k(results: &[QueryEvaluation], k: usize) -> f64 {
    mean(results.iter().map(|r| recall_at_k(&r.predicted, &r.relevant, k)))
}

pub fn mean_precision_at_k(results: &[QueryEvaluation], k: usize) -> f64 {
    mean(results.iter().map(|r| precision_at_k(&r.predicted, &r.relevant, k)))
}

pub fn mean_average_precision(results: &[QueryEvaluation]) -> f64 {
    mean(results.iter().filter_map(|r| average_precision(&r.predicted, &r.relevant)))
}

fn overlap(top_k: &[String], relevant: &[String]) -> usize {
    let top: HashSet<&str> = top_k.iter().map(String::as_str).collect();
    let relevant: HashSet<&str> = relevant.iter().map(String::as_str).collect();
    top.intersection(&relevant).count()
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
