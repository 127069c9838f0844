use serde::{Deserialize, Serialize};

/// Label used when the backend sends an entry without any name field.
pub const UNKNOWN_ASSESSMENT: &str = "Unknown";

/// A single assessment recommended for a hiring query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Display name of the assessment
    pub assessment_name: String,
    /// Relevance score, expected in [0, 1]
    pub score: f64,
    /// Link to the assessment's catalogue page
    pub url: String,
}

/// Body of `POST /recommend`.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendRequest<'a> {
    pub query: &'a str,
}

/// Decoded `POST /recommend` response after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendResponse {
    /// Query echoed back by the backend, if it sent one.
    pub query: Option<String>,
    /// Recommendations in rank order.
    pub recommendations: Vec<Recommendation>,
    /// Server-side processing time in seconds, if reported.
    pub processing_time: Option<f64>,
}

/// Response body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Raw response envelope as sent on the wire.
///
/// Every field is optional: a missing `recommendations` array decodes as empty, and
/// entries may carry their label under either `assessment_name` or `name`.
#[derive(Debug, Deserialize)]
pub(crate) struct RecommendEnvelope {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    recommendations: Option<Vec<WireRecommendation>>,
    #[serde(default)]
    processing_time: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WireRecommendation {
    #[serde(default)]
    assessment_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    url: Option<String>,
}

impl From<WireRecommendation> for Recommendation {
    fn from(wire: WireRecommendation) -> Self {
        let assessment_name = wire
            .assessment_name
            .or(wire.name)
            .unwrap_or_else(|| UNKNOWN_ASSESSMENT.to_string());
        Self {
            assessment_name,
            score: wire.score.unwrap_or(0.0),
            url: wire.url.unwrap_or_default(),
        }
    }
}

impl RecommendEnvelope {
    pub(crate) fn normalize(self) -> RecommendResponse {
        RecommendResponse {
            query: self.query,
            recommendations: self
                .recommendations
                .unwrap_or_default()
                .into_iter()
                .map(Recommendation::from)
                .collect(),
            processing_time: self.processing_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(body: &str) -> RecommendResponse {
        serde_json::from_str::<RecommendEnvelope>(body)
            .expect("envelope should decode")
            .normalize()
    }

    #[test]
    fn test_decode_full_envelope() {
        let resp = decode(
            r#"{
                "query": "java developer",
                "recommendations": [
                    {"assessment_name": "Java 8 (New)", "score": 0.91, "url": "https://example.test/java8"},
                    {"assessment_name": "OPQ32r", "score": 0.72, "url": "https://example.test/opq"}
                ],
                "processing_time": 1.25
            }"#,
        );
        assert_eq!(resp.query.as_deref(), Some("java developer"));
        assert_eq!(resp.processing_time, Some(1.25));
        assert_eq!(resp.recommendations.len(), 2);
        assert_eq!(resp.recommendations[0].assessment_name, "Java 8 (New)");
        assert_eq!(resp.recommendations[1].url, "https://example.test/opq");
    }

    #[test]
    fn test_name_field_is_accepted_as_label() {
        let resp = decode(r#"{"recommendations": [{"name": "Verify G+", "score": 0.5, "url": "u"}]}"#);
        assert_eq!(resp.recommendations[0].assessment_name, "Verify G+");
    }

    #[test]
    fn test_assessment_name_wins_over_name() {
        let resp = decode(
            r#"{"recommendations": [{"assessment_name": "A", "name": "B", "score": 0.5, "url": "u"}]}"#,
        );
        assert_eq!(resp.recommendations[0].assessment_name, "A");
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let resp = decode(r#"{"recommendations": [{"score": null}]}"#);
        let rec = &resp.recommendations[0];
        assert_eq!(rec.assessment_name, UNKNOWN_ASSESSMENT);
        assert_eq!(rec.score, 0.0);
        assert_eq!(rec.url, "");
    }

    #[test]
    fn test_missing_recommendations_is_empty() {
        let resp = decode(r#"{"results": [{"name": "ignored"}]}"#);
        assert!(resp.recommendations.is_empty());
        assert!(resp.query.is_none());
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(RecommendRequest { query: "sales lead" }).unwrap();
        assert_eq!(body, serde_json::json!({"query": "sales lead"}));
    }
}
