/// Offline evaluation against a labelled query set.
///
/// The labelled CSV has one row per (query, relevant assessment URL) pair. Rows are
/// grouped per query, every query is sent to the recommendation service, and the
/// returned URLs are scored with the metrics in [`crate::metrics`].
use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::client::RecommendationSource;
use crate::metrics::{
    mean_average_precision, mean_precision_at_k, mean_recall_at_k, precision_at_k, recall_at_k,
    QueryEvaluation,
};

pub const URL_COLUMN: &str = "Assessment_url";
const QUERY_COLUMNS: [&str; 2] = ["query", "csvquery"];

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV must contain '{0}' column")]
    MissingColumn(String),
}

/// A query with every assessment URL labelled as relevant for it.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledQuery {
    pub query: String,
    pub relevant: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationMetrics {
    pub mean_recall_at_k: f64,
    pub mean_precision_at_k: f64,
    pub mean_average_precision: f64,
    pub k: usize,
    pub num_queries: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub metrics: EvaluationMetrics,
    pub results: Vec<QueryEvaluation>,
}

/// Read a labelled CSV from disk. Non-UTF-8 files are decoded as Latin-1.
pub fn load_labelled_queries(path: &Path) -> Result<Vec<LabelledQuery>, EvalError> {
    let bytes = std::fs::read(path).map_err(|source| EvalError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            warn!(path = %path.display(), "file is not valid UTF-8, decoding as Latin-1");
            err.into_bytes().iter().map(|&b| b as char).collect()
        }
    };
    parse_labelled_queries(&text)
}

/// Parse labelled CSV text into queries, sorted by query text.
///
/// Header names are trimmed. The query column is `query`, or `csvquery` when `query`
/// is absent; the `Assessment_url` column is required.
pub fn parse_labelled_queries(text: &str) -> Result<Vec<LabelledQuery>, EvalError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let position = |name: &str| headers.iter().position(|h| h == name);

    let query_idx = QUERY_COLUMNS
        .iter()
        .find_map(|&name| position(name))
        .ok_or_else(|| EvalError::MissingColumn(QUERY_COLUMNS[0].to_string()))?;
    let url_idx =
        position(URL_COLUMN).ok_or_else(|| EvalError::MissingColumn(URL_COLUMN.to_string()))?;

    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for record in reader.records() {
        let record = record?;
        let (Some(query), Some(url)) = (record.get(query_idx), record.get(url_idx)) else {
            continue;
        };
        if query.trim().is_empty() || url.trim().is_empty() {
            continue;
        }
        grouped
            .entry(query.to_string())
            .or_default()
            .push(url.trim().to_string());
    }

    Ok(grouped
        .into_iter()
        .map(|(query, relevant)| LabelledQuery { query, relevant })
        .collect())
}

/// Run every labelled query through `source` and score the returned URLs at `k`.
///
/// A failed request is logged and scored as an empty prediction list.
pub async fn evaluate<S: RecommendationSource>(
    source: &S,
    base_url: &str,
    queries: Vec<LabelledQuery>,
    k: usize,
) -> EvaluationReport {
    let total = queries.len();
    info!(queries = total, k, "starting evaluation");

    let mut results = Vec::with_capacity(total);
    for (idx, labelled) in queries.into_iter().enumerate() {
        let predicted: Vec<String> = match source.recommend(base_url, &labelled.query).await {
            Ok(resp) => resp.recommendations.into_iter().map(|r| r.url).collect(),
            Err(e) => {
                warn!(query = %labelled.query, error = %e, "prediction failed, scoring as empty");
                Vec::new()
            }
        };

        info!(
            n = idx + 1,
            total,
            recall = recall_at_k(&predicted, &labelled.relevant, k),
            precision = precision_at_k(&predicted, &labelled.relevant, k),
            "query evaluated"
        );

        results.push(QueryEvaluation {
            query: labelled.query,
            relevant: labelled.relevant,
            predicted,
        });
    }

    let metrics = EvaluationMetrics {
        mean_recall_at_k: mean_recall_at_k(&results, k),
        mean_precision_at_k: mean_precision_at_k(&results, k),
        mean_average_precision: mean_average_precision(&results),
        k,
        num_queries: results.len(),
    };
    EvaluationReport { metrics, results }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use reqwest::StatusCode;

    use super::*;
    use crate::client::ClientError;
    use crate::model::{Recommendation, RecommendResponse};

    struct FixedSource;

    impl RecommendationSource for FixedSource {
        async fn recommend(
            &self,
            _base_url: &str,
            query: &str,
        ) -> Result<RecommendResponse, ClientError> {
            if query.contains("broken") {
                return Err(ClientError::Api {
                    status: StatusCode::BAD_GATEWAY,
                    body: String::new(),
                });
            }
            let urls = ["https://example.test/a", "https://example.test/x"];
            Ok(RecommendResponse {
                query: Some(query.to_string()),
                recommendations: urls
                    .iter()
                    .map(|u| Recommendation {
                        assessment_name: u.to_string(),
                        score: 0.5,
                        url: u.to_string(),
                    })
                    .collect(),
                processing_time: None,
            })
        }
    }

    #[test]
    fn test_parse_groups_urls_per_query() {
        let csv = " Query , Assessment_url \n\
                   b query,https://example.test/1\n\
                   a query,https://example.test/2\n\
                   b query,https://example.test/3\n";
        // Header match is case-sensitive, like the column names in the labelled set.
        assert!(matches!(
            parse_labelled_queries(csv),
            Err(EvalError::MissingColumn(_))
        ));

        let csv = " query , Assessment_url \n\
                   b query,https://example.test/1\n\
                   a query,https://example.test/2\n\
                   b query, https://example.test/3\n";
        let queries = parse_labelled_queries(csv).unwrap();
        assert_eq!(
            queries,
            vec![
                LabelledQuery {
                    query: "a query".to_string(),
                    relevant: vec!["https://example.test/2".to_string()],
                },
                LabelledQuery {
                    query: "b query".to_string(),
                    relevant: vec![
                        "https://example.test/1".to_string(),
                        "https://example.test/3".to_string(),
                    ],
                },
            ]
        );
    }

    #[test]
    fn test_parse_accepts_csvquery_column() {
        let csv = "csvquery,Assessment_url\nq,https://example.test/1\n";
        let queries = parse_labelled_queries(csv).unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].query, "q");
    }

    #[test]
    fn test_parse_requires_url_column() {
        let err = parse_labelled_queries("query,url\nq,u\n").unwrap_err();
        assert!(err.to_string().contains(URL_COLUMN));
    }

    #[test]
    fn test_load_falls_back_to_latin1() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"query,Assessment_url\ncaf\xe9 manager,https://example.test/1\n")
            .unwrap();
        let queries = load_labelled_queries(file.path()).unwrap();
        assert_eq!(queries[0].query, "caf\u{e9} manager");
    }

    #[tokio::test]
    async fn test_evaluate_scores_predictions() {
        let queries = vec![
            LabelledQuery {
                query: "java".to_string(),
                relevant: vec![
                    "https://example.test/a".to_string(),
                    "https://example.test/b".to_string(),
                ],
            },
            LabelledQuery {
                query: "broken backend".to_string(),
                relevant: vec!["https://example.test/a".to_string()],
            },
        ];

        let report = evaluate(&FixedSource, "http://api.test", queries, 10).await;

        assert_eq!(report.metrics.num_queries, 2);
        assert_eq!(report.results[1].predicted, Vec::<String>::new());
        // java: recall 1/2, precision 1/2, AP 1/2; broken: all zero.
        assert!((report.metrics.mean_recall_at_k - 0.25).abs() < 1e-9);
        assert!((report.metrics.mean_precision_at_k - 0.25).abs() < 1e-9);
        assert!((report.metrics.mean_average_precision - 0.25).abs() < 1e-9);
    }
}
