//! Plain-text rendering for stdout. Logging goes to stderr, so everything here is the
//! user-facing output.

use std::fmt::Write;

use recommend_common::evaluate::EvaluationMetrics;
use recommend_common::model::Recommendation;
use recommend_common::panel::{PanelView, RequestState};
use recommend_common::samples::SAMPLE_QUERIES;

const MAX_NAME_WIDTH: usize = 60;

/// Ranked table, one row per recommendation, ranks starting at 1 in received order.
pub fn render_table(results: &[Recommendation]) -> String {
    let names: Vec<String> = results
        .iter()
        .map(|r| truncate(&r.assessment_name, MAX_NAME_WIDTH))
        .collect();
    let rank_width = results.len().to_string().len().max(1);
    let name_width = names
        .iter()
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0)
        .max("Assessment".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>rank_width$}  {:<name_width$}  {:>5}  URL",
        "#", "Assessment", "Score"
    );
    for (i, (rec, name)) in results.iter().zip(&names).enumerate() {
        let _ = writeln!(
            out,
            "{:>rank_width$}  {:<name_width$}  {:>5.3}  {}",
            i + 1,
            name,
            rec.score,
            rec.url
        );
    }
    out
}

/// Everything the panel shows for its current state.
pub fn render_view(view: &PanelView) -> String {
    match view.state() {
        RequestState::Loading => "Searching for recommendations...\n".to_string(),
        RequestState::Idle => String::new(),
        RequestState::Error | RequestState::Success => {
            let mut out = String::new();
            if let Some(err) = &view.error {
                let _ = writeln!(out, "{err}");
            }
            if !view.results.is_empty() {
                out.push_str(&render_table(&view.results));
            }
            out
        }
    }
}

/// Results as a JSON array for scripted callers. A completed request with no
/// recommendations renders as `[]`; failed or unfinished requests render nothing.
pub fn render_results_json(view: &PanelView) -> Result<Option<String>, serde_json::Error> {
    if view.state() != RequestState::Success {
        return Ok(None);
    }
    serde_json::to_string_pretty(&view.results).map(Some)
}

pub fn render_samples() -> String {
    let mut out = String::new();
    for (i, sample) in SAMPLE_QUERIES.iter().enumerate() {
        let _ = writeln!(out, "  [{}] {}", i + 1, sample);
    }
    out
}

pub fn render_metrics(metrics: &EvaluationMetrics) -> String {
    let rule = "=".repeat(60);
    let mut out = String::new();
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "EVALUATION SUMMARY");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Queries evaluated : {}", metrics.num_queries);
    let _ = writeln!(out, "K value           : {}", metrics.k);
    let _ = writeln!(out, "Mean Recall@K     : {:.4}", metrics.mean_recall_at_k);
    let _ = writeln!(out, "Mean Precision@K  : {:.4}", metrics.mean_precision_at_k);
    let _ = writeln!(out, "Mean AP           : {:.4}", metrics.mean_average_precision);
    let _ = writeln!(out, "{rule}");
    out
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max - 3).collect::<String>())
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use recommend_common::error::QueryError;

    use super::*;

    fn rec(name: &str, score: f64) -> Recommendation {
        Recommendation {
            assessment_name: name.to_string(),
            score,
            url: format!("https://example.test/{name}"),
        }
    }

    fn view(error: Option<QueryError>, results: Vec<Recommendation>) -> PanelView {
        PanelView {
            query: "q".to_string(),
            base_url: "http://localhost:8000".to_string(),
            loading: false,
            error,
            results,
        }
    }

    #[test]
    fn test_table_ranks_rows_in_order() {
        let table = render_table(&[rec("Java", 0.91234), rec("OPQ", 0.5), rec("Verify", 0.1)]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Assessment"));
        assert!(lines[1].trim_start().starts_with("1  Java"));
        assert!(lines[1].contains("0.912"));
        assert!(lines[2].trim_start().starts_with("2  OPQ"));
        assert!(lines[3].trim_start().starts_with("3  Verify"));
        assert!(lines[3].ends_with("https://example.test/Verify"));
    }

    #[test]
    fn test_long_names_are_truncated() {
        let long = "x".repeat(100);
        let table = render_table(&[rec(&long, 0.5)]);
        assert!(table.contains(&format!("{}...", "x".repeat(MAX_NAME_WIDTH - 3))));
        assert!(!table.contains(&long));
    }

    #[test]
    fn test_view_shows_error_without_table() {
        let out = render_view(&view(Some(QueryError::Validation), vec![]));
        assert_eq!(out, "Please enter a query.\n");
    }

    #[test]
    fn test_view_shows_empty_result_notice() {
        let out = render_view(&view(Some(QueryError::EmptyResult), vec![]));
        assert!(out.contains("No recommendations found"));
    }

    #[test]
    fn test_view_loading() {
        let mut v = view(None, vec![rec("Java", 0.9)]);
        v.loading = true;
        assert!(render_view(&v).starts_with("Searching"));
    }

    #[test]
    fn test_json_output_for_empty_result_is_empty_array() {
        let out = render_results_json(&view(Some(QueryError::EmptyResult), vec![])).unwrap();
        assert_eq!(out.as_deref(), Some("[]"));
    }

    #[test]
    fn test_json_output_lists_results() {
        let out = render_results_json(&view(None, vec![rec("Java", 0.9)]))
            .unwrap()
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["assessment_name"], "Java");
        assert_eq!(parsed[0]["url"], "https://example.test/Java");
    }

    #[test]
    fn test_json_output_skips_failures() {
        let failed = view(
            Some(QueryError::Transport {
                detail: "connection refused".to_string(),
            }),
            vec![],
        );
        assert!(render_results_json(&failed).unwrap().is_none());
        assert!(render_results_json(&view(None, vec![])).unwrap().is_none());
    }

    #[test]
    fn test_samples_are_numbered_from_one() {
        let out = render_samples();
        assert!(out.starts_with("  [1] "));
        assert_eq!(out.lines().count(), SAMPLE_QUERIES.len());
    }
}
