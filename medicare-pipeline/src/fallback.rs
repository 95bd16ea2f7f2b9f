use crate::models::MedicalAnalysis;

/// Maximum number of failure-reason characters carried into the degraded summary.
const REASON_LIMIT: usize = 200;

/// Build a schema-valid degraded analysis after a parse rejection.
///
/// Deterministic: identical failure reasons yield byte-identical records.
/// This is the only place allowed to fabricate content, and it fabricates
/// only advisory text; it never claims medical findings it did not derive
/// from a model.
pub fn synthesize_fallback(failure_reason: &str) -> MedicalAnalysis {
    let truncated: String = failure_reason.chars().take(REASON_LIMIT).collect();

    MedicalAnalysis {
        summary: format!("Analysis completed but encountered formatting issues: {truncated}"),
        key_findings: vec!["Analysis was performed but results need manual review".to_string()],
        recommendations: vec![
            "Consult with a healthcare professional for detailed interpretation".to_string(),
        ],
        next_steps: vec![
            "Schedule appointment with your doctor".to_string(),
            "Keep this record for your medical history".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_has_fixed_shape() {
        let analysis = synthesize_fallback("expected value at line 1 column 1");
        assert_eq!(analysis.key_findings.len(), 1);
        assert_eq!(analysis.recommendations.len(), 1);
        assert_eq!(analysis.next_steps.len(), 2);
        assert!(analysis.summary.contains("encountered formatting issues"));
        assert!(analysis.summary.contains("expected value at line 1 column 1"));
    }

    #[test]
    fn fallback_is_deterministic() {
        let a = synthesize_fallback("same reason");
        let b = synthesize_fallback("same reason");
        assert_eq!(a, b);
    }

    #[test]
    fn long_reason_is_truncated_to_200_chars() {
        let reason = "x".repeat(500);
        let analysis = synthesize_fallback(&reason);
        let embedded = analysis
            .summary
            .strip_prefix("Analysis completed but encountered formatting issues: ")
            .unwrap();
        assert_eq!(embedded.chars().count(), 200);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let reason = "é".repeat(300);
        let analysis = synthesize_fallback(&reason);
        let embedded = analysis
            .summary
            .strip_prefix("Analysis completed but encountered formatting issues: ")
            .unwrap();
        assert_eq!(embedded.chars().count(), 200);
    }
}
