use serde::Serialize;

use crate::constants::{geo_quick_wins, Recommendation, LEARN_MORE_URL, SOURCE};

pub const GEO_CONTEXT: &str = "GEO (Generative Engine Optimization) is different from SEO";
pub const GEO_KEY_INSIGHT: &str = "Backlinks don't predict AI visibility. Brand awareness and platform diversity are the key drivers.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationsDocument {
    pub recommendations: &'static [Recommendation],
    pub context: &'static str,
    pub key_insight: &'static str,
    pub source: &'static str,
}

pub fn recommendations_document() -> RecommendationsDocument {
    RecommendationsDocument {
        recommendations: geo_quick_wins(),
        context: GEO_CONTEXT,
        key_insight: GEO_KEY_INSIGHT,
        source: SOURCE,
    }
}

/// Component weights as published text. Kept separate from
/// [`crate::constants::score_weights`] so the explanation never drifts with
/// the numeric table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentWeights {
    pub citation_frequency: &'static str,
    pub citation_quality: &'static str,
    pub query_coverage: &'static str,
    pub cross_platform: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreRanges {
    #[serde(rename = "80-100")]
    pub excellent: &'static str,
    #[serde(rename = "60-79")]
    pub good: &'static str,
    #[serde(rename = "40-59")]
    pub moderate: &'static str,
    #[serde(rename = "20-39")]
    pub low: &'static str,
    #[serde(rename = "0-19")]
    pub minimal: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplanationDocument {
    pub what_is_it: &'static str,
    pub who_created_it: &'static str,
    pub methodology: &'static str,
    pub components: ComponentWeights,
    pub score_ranges: ScoreRanges,
    pub key_findings: &'static [&'static str],
    pub learn_more: &'static str,
}

static KEY_FINDINGS: [&str; 5] = [
    "Brand search volume is #1 predictor (0.334 correlation)",
    "Sites on 4+ platforms are 2.8x more likely to be cited",
    "32.5% of AI citations come from comparison content",
    "65% of cited content is less than 1 year old",
    "Backlinks have weak/neutral correlation with AI visibility",
];

pub fn explanation_document() -> ExplanationDocument {
    ExplanationDocument {
        what_is_it: "The Trustable Score is a 0-100 metric measuring how often a brand appears in AI-generated responses",
        who_created_it: "Trustable Labs (https://trustablelabs.com)",
        methodology: "Based on analysis of 680 million AI citations",
        components: ComponentWeights {
            citation_frequency: "30% - How often AI mentions the brand",
            citation_quality: "25% - Prominence and context of mentions",
            query_coverage: "25% - % of relevant queries where brand appears",
            cross_platform: "20% - Consistency across AI platforms",
        },
        score_ranges: ScoreRanges {
            excellent: "Excellent - Dominant AI presence",
            good: "Good - Strong presence",
            moderate: "Moderate - Emerging presence",
            low: "Low - Limited visibility",
            minimal: "Minimal - Invisible to AI",
        },
        key_findings: &KEY_FINDINGS,
        learn_more: LEARN_MORE_URL,
    }
}
