use serde::Serialize;

use crate::constants::{
    geo_quick_wins, rating_bands, Rating, Recommendation, BASE_SCORE, COMPARISON_CONTENT,
    COMPARISON_CONTENT_POINTS, CRUNCHBASE_POINTS, EXPAND_PLATFORMS, FALLBACK_INTERPRETATION,
    FALLBACK_RATING, FRESH_CONTENT_MONTHS, FRESH_CONTENT_POINTS, GOOGLE_BUSINESS_POINTS,
    JSON_LD_SCHEMA, LEARN_MORE_URL, LLMS_TXT_POINTS, MAX_SCORE, METHODOLOGY, MIN_SCORE,
    PLATFORM_POINTS_EACH, PLATFORM_POINTS_SATURATED, PLATFORM_THRESHOLD, RECENT_CONTENT_MONTHS,
    RECENT_CONTENT_POINTS, SCHEMA_MARKUP_POINTS, WIKIDATA_ENTRY, WIKIDATA_POINTS,
};

pub const MAX_RECOMMENDATIONS: usize = 5;

/// Observable facts about a brand's web presence.
///
/// Values are taken as given. Negative or oversized counts are not rejected;
/// the final clamp keeps the score in range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandSignals {
    pub platform_count: i64,
    pub has_wikidata: bool,
    pub has_google_business: bool,
    pub has_crunchbase: bool,
    pub has_schema_markup: bool,
    pub has_llms_txt: bool,
    pub has_comparison_content: bool,
    pub avg_content_age_months: i64,
}

impl Default for BrandSignals {
    fn default() -> Self {
        Self {
            platform_count: 1,
            has_wikidata: false,
            has_google_business: false,
            has_crunchbase: false,
            has_schema_markup: false,
            has_llms_txt: false,
            has_comparison_content: false,
            avg_content_age_months: 24,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub platform_diversity: i64,
    pub entity_recognition: i64,
    pub technical: i64,
    pub content: i64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> i64 {
        self.platform_diversity
            .saturating_add(self.entity_recognition)
            .saturating_add(self.technical)
            .saturating_add(self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    #[serde(rename = "trustable_score")]
    pub score: i64,
    pub rating: Rating,
    pub interpretation: &'static str,
    pub breakdown: ScoreBreakdown,
    pub recommendations: Vec<Recommendation>,
    pub methodology: &'static str,
    pub learn_more: &'static str,
}

/// Estimate a brand's Trustable Score from its observable signals.
pub fn estimate(signals: &BrandSignals) -> ScoreResult {
    let breakdown = ScoreBreakdown {
        platform_diversity: platform_points(signals.platform_count),
        entity_recognition: entity_points(signals),
        technical: technical_points(signals),
        content: content_points(signals),
    };
    let score = BASE_SCORE
        .saturating_add(breakdown.total())
        .clamp(MIN_SCORE, MAX_SCORE);
    let (rating, interpretation) = rate(score);

    ScoreResult {
        score,
        rating,
        interpretation,
        breakdown,
        recommendations: select_recommendations(signals),
        methodology: METHODOLOGY,
        learn_more: LEARN_MORE_URL,
    }
}

// Step function: saturates at the 4+ platform threshold.
pub fn platform_points(platform_count: i64) -> i64 {
    if platform_count >= PLATFORM_THRESHOLD {
        PLATFORM_POINTS_SATURATED
    } else {
        platform_count.saturating_mul(PLATFORM_POINTS_EACH)
    }
}

fn entity_points(signals: &BrandSignals) -> i64 {
    let mut points = 0;
    if signals.has_wikidata {
        points += WIKIDATA_POINTS;
    }
    if signals.has_google_business {
        points += GOOGLE_BUSINESS_POINTS;
    }
    if signals.has_crunchbase {
        points += CRUNCHBASE_POINTS;
    }
    points
}

fn technical_points(signals: &BrandSignals) -> i64 {
    let mut points = 0;
    if signals.has_schema_markup {
        points += SCHEMA_MARKUP_POINTS;
    }
    if signals.has_llms_txt {
        points += LLMS_TXT_POINTS;
    }
    points
}

fn content_points(signals: &BrandSignals) -> i64 {
    let mut points = 0;
    if signals.has_comparison_content {
        points += COMPARISON_CONTENT_POINTS;
    }
    if signals.avg_content_age_months <= FRESH_CONTENT_MONTHS {
        points += FRESH_CONTENT_POINTS;
    } else if signals.avg_content_age_months <= RECENT_CONTENT_MONTHS {
        points += RECENT_CONTENT_POINTS;
    }
    points
}

pub fn rate(score: i64) -> (Rating, &'static str) {
    rating_bands()
        .iter()
        .find(|band| band.contains(score))
        .map_or((FALLBACK_RATING, FALLBACK_INTERPRETATION), |band| {
            (band.rating, band.interpretation)
        })
}

fn select_recommendations(signals: &BrandSignals) -> Vec<Recommendation> {
    let checks = [
        (signals.platform_count < PLATFORM_THRESHOLD, EXPAND_PLATFORMS),
        (!signals.has_comparison_content, COMPARISON_CONTENT),
        (!signals.has_schema_markup, JSON_LD_SCHEMA),
        (!signals.has_wikidata, WIKIDATA_ENTRY),
    ];
    checks
        .iter()
        .filter(|(missing, _)| *missing)
        .filter_map(|(_, idx)| geo_quick_wins().get(*idx).copied())
        .take(MAX_RECOMMENDATIONS)
        .collect()
}
