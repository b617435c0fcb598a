//! Turning a decoded provider response into a [`NormalizedResult`].
//!
//! Thresholds are fixed policy, not configuration.

use chrono::Utc;

use crate::detection::types::{
    Confidence, NormalizedResult, ParsedSentence, RawText, Verdict, PROVIDER_TAG,
};
use crate::detection::wire::DecodedDetection;

pub fn verdict_for(probability: f64) -> Verdict {
    if probability >= 70.0 {
        Verdict::Ai
    } else if probability <= 30.0 {
        Verdict::Human
    } else {
        Verdict::Mixed
    }
}

pub fn confidence_for(probability: f64) -> Confidence {
    if probability >= 80.0 || probability <= 20.0 {
        Confidence::High
    } else if probability >= 60.0 || probability <= 40.0 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

fn fallback_feedback(verdict: Verdict, probability: f64) -> String {
    match verdict {
        Verdict::Ai => format!(
            "Your text is most likely written by AI ({:.1}% AI probability).",
            probability
        ),
        Verdict::Human => format!(
            "Your text appears to be human-written ({:.1}% AI probability).",
            probability
        ),
        Verdict::Mixed => format!(
            "Your text contains a mix of AI and human-written content ({:.1}% AI probability).",
            probability
        ),
    }
}

pub fn normalize_result(decoded: DecodedDetection) -> NormalizedResult {
    let probability = decoded.ai_probability;
    let verdict = verdict_for(probability);
    let confidence = confidence_for(probability);

    let sentences = decoded
        .sentences
        .into_iter()
        .enumerate()
        .map(|(index, text)| ParsedSentence {
            is_ai_generated: decoded.highlighted.contains(&text),
            text,
            index,
        })
        .collect();

    // Counts can disagree upstream; clamp so human_words never underflows.
    let ai_words = decoded.ai_words.min(decoded.total_words);

    let raw = if decoded.original_text.is_empty() && decoded.preprocessed_text.is_empty() {
        None
    } else {
        Some(RawText {
            original_text: decoded.original_text,
            preprocessed_text: decoded.preprocessed_text,
        })
    };

    NormalizedResult {
        verdict,
        ai_probability: (probability * 10.0).round() / 10.0,
        confidence,
        feedback: decoded
            .feedback
            .unwrap_or_else(|| fallback_feedback(verdict, probability)),
        total_words: decoded.total_words,
        ai_words,
        human_words: decoded.total_words - ai_words,
        sentences,
        highlighted_sentences: decoded.highlighted,
        result_id: decoded.result_id,
        checked_at: Utc::now(),
        provider: PROVIDER_TAG.to_string(),
        raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(probability: f64) -> DecodedDetection {
        DecodedDetection {
            total_words: 2,
            ai_words: 0,
            ai_probability: probability,
            sentences: Vec::new(),
            highlighted: Vec::new(),
            feedback: None,
            result_id: "id-1".into(),
            original_text: String::new(),
            preprocessed_text: String::new(),
        }
    }

    #[test]
    fn test_verdict_boundaries() {
        assert_eq!(verdict_for(69.9), Verdict::Mixed);
        assert_eq!(verdict_for(70.0), Verdict::Ai);
        assert_eq!(verdict_for(30.0), Verdict::Human);
        assert_eq!(verdict_for(30.1), Verdict::Mixed);
        assert_eq!(verdict_for(0.0), Verdict::Human);
        assert_eq!(verdict_for(100.0), Verdict::Ai);
    }

    #[test]
    fn test_confidence_boundaries() {
        assert_eq!(confidence_for(80.0), Confidence::High);
        assert_eq!(confidence_for(79.9), Confidence::Medium);
        assert_eq!(confidence_for(20.0), Confidence::High);
        assert_eq!(confidence_for(20.1), Confidence::Medium);
        assert_eq!(confidence_for(60.0), Confidence::Medium);
        assert_eq!(confidence_for(40.0), Confidence::Medium);
        assert_eq!(confidence_for(50.0), Confidence::Low);
        assert_eq!(confidence_for(59.9), Confidence::Low);
    }

    #[test]
    fn test_human_scenario() {
        let result = normalize_result(decoded(15.0));
        assert_eq!(result.verdict, Verdict::Human);
        assert_eq!(result.confidence, Confidence::High);
        assert_eq!(result.human_words, 2);
        assert_eq!(result.ai_words, 0);
        assert_eq!(result.provider, "zerogpt");
        assert_eq!(
            result.feedback,
            "Your text appears to be human-written (15.0% AI probability)."
        );
        assert!(result.raw.is_none());
    }

    #[test]
    fn test_sentences_marked_from_highlights() {
        let mut d = decoded(55.0);
        d.sentences = vec!["First one.".into(), "Second one.".into(), "First one.".into()];
        d.highlighted = vec!["Second one.".into()];

        let result = normalize_result(d);
        let flags: Vec<_> = result.sentences.iter().map(|s| s.is_ai_generated).collect();
        assert_eq!(flags, vec![false, true, false]);
        assert_eq!(result.sentences[2].index, 2);
        assert_eq!(result.highlighted_sentences, vec!["Second one."]);
    }

    #[test]
    fn test_rounding_after_classification() {
        // 69.96 rounds to 70.0 for display but classifies as Mixed
        let result = normalize_result(decoded(69.96));
        assert_eq!(result.ai_probability, 70.0);
        assert_eq!(result.verdict, Verdict::Mixed);
    }

    #[test]
    fn test_provider_feedback_preferred() {
        let mut d = decoded(90.0);
        d.feedback = Some("Your Text is AI/GPT Generated".into());
        let result = normalize_result(d);
        assert_eq!(result.feedback, "Your Text is AI/GPT Generated");
        assert_eq!(result.verdict, Verdict::Ai);
    }

    #[test]
    fn test_ai_words_clamped() {
        let mut d = decoded(90.0);
        d.total_words = 5;
        d.ai_words = 9;
        let result = normalize_result(d);
        assert_eq!(result.ai_words, 5);
        assert_eq!(result.human_words, 0);
    }
}
