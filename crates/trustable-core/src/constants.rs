use serde::Serialize;

pub const BASE_SCORE: i64 = 20;
pub const MIN_SCORE: i64 = 0;
pub const MAX_SCORE: i64 = 100;

pub const PLATFORM_THRESHOLD: i64 = 4;
pub const PLATFORM_POINTS_EACH: i64 = 5;
pub const PLATFORM_POINTS_SATURATED: i64 = 25;

pub const WIKIDATA_POINTS: i64 = 10;
pub const GOOGLE_BUSINESS_POINTS: i64 = 8;
pub const CRUNCHBASE_POINTS: i64 = 5;

pub const SCHEMA_MARKUP_POINTS: i64 = 10;
pub const LLMS_TXT_POINTS: i64 = 5;

pub const COMPARISON_CONTENT_POINTS: i64 = 15;
pub const FRESH_CONTENT_MONTHS: i64 = 6;
pub const FRESH_CONTENT_POINTS: i64 = 12;
pub const RECENT_CONTENT_MONTHS: i64 = 12;
pub const RECENT_CONTENT_POINTS: i64 = 8;

pub const METHODOLOGY: &str = "Based on Trustable's 680M AI citation study";
pub const LEARN_MORE_URL: &str = "https://trustablelabs.com/trustable-score";
pub const SOURCE: &str = "Trustable Labs - https://trustablelabs.com";

/// Published component weights of the Trustable Score.
///
/// Documentation only: the estimator scores with the point constants above
/// and never reads these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeight {
    pub component: &'static str,
    pub weight: f64,
    pub description: &'static str,
}

static SCORE_WEIGHTS: [ScoreWeight; 4] = [
    ScoreWeight {
        component: "citation_frequency",
        weight: 0.30,
        description: "How often AI mentions the brand",
    },
    ScoreWeight {
        component: "citation_quality",
        weight: 0.25,
        description: "Prominence and context",
    },
    ScoreWeight {
        component: "query_coverage",
        weight: 0.25,
        description: "% of relevant queries where brand appears",
    },
    ScoreWeight {
        component: "cross_platform",
        weight: 0.20,
        description: "Consistency across AI platforms",
    },
];

pub fn score_weights() -> &'static [ScoreWeight] {
    &SCORE_WEIGHTS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Excellent,
    Good,
    Moderate,
    Low,
    Minimal,
}

impl Rating {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Moderate => "moderate",
            Self::Low => "low",
            Self::Minimal => "minimal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingBand {
    pub low: i64,
    pub high: i64,
    pub rating: Rating,
    pub interpretation: &'static str,
}

impl RatingBand {
    pub fn contains(&self, score: i64) -> bool {
        self.low <= score && score <= self.high
    }
}

pub const FALLBACK_RATING: Rating = Rating::Minimal;
pub const FALLBACK_INTERPRETATION: &str = "Effectively invisible to AI systems";

// Scanned in order; first match wins.
static RATING_BANDS: [RatingBand; 5] = [
    RatingBand {
        low: 80,
        high: 100,
        rating: Rating::Excellent,
        interpretation: "Dominant AI presence - cited as industry authority",
    },
    RatingBand {
        low: 60,
        high: 79,
        rating: Rating::Good,
        interpretation: "Strong presence - regularly cited in relevant queries",
    },
    RatingBand {
        low: 40,
        high: 59,
        rating: Rating::Moderate,
        interpretation: "Emerging presence - appears in some AI responses",
    },
    RatingBand {
        low: 20,
        high: 39,
        rating: Rating::Low,
        interpretation: "Limited visibility - rarely mentioned by AI",
    },
    RatingBand {
        low: 0,
        high: 19,
        rating: Rating::Minimal,
        interpretation: FALLBACK_INTERPRETATION,
    },
];

pub fn rating_bands() -> &'static [RatingBand] {
    &RATING_BANDS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    Ongoing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub action: &'static str,
    pub impact: &'static str,
    pub effort: Effort,
    pub details: &'static str,
}

pub const EXPAND_PLATFORMS: usize = 0;
pub const COMPARISON_CONTENT: usize = 1;
pub const JSON_LD_SCHEMA: usize = 2;
pub const WIKIDATA_ENTRY: usize = 3;

/// GEO quick wins, in priority order.
static GEO_QUICK_WINS: [Recommendation; 6] = [
    Recommendation {
        action: "Expand to 4+ platforms",
        impact: "2.8x more likely to appear in ChatGPT",
        effort: Effort::Medium,
        details: "Publish content on website, Medium, LinkedIn, Substack, industry publications",
    },
    Recommendation {
        action: "Create comparison content",
        impact: "32.5% of all AI citations come from comparisons",
        effort: Effort::Medium,
        details: "Create 'X vs Y vs Z' articles with structured HTML tables",
    },
    Recommendation {
        action: "Implement JSON-LD schema",
        impact: "Makes content machine-readable for AI extraction",
        effort: Effort::Low,
        details: "Add Organization, FAQPage, HowTo schemas to your site",
    },
    Recommendation {
        action: "Create Wikidata entry",
        impact: "Establishes entity recognition in knowledge graphs",
        effort: Effort::Low,
        details: "Wikidata feeds Google Knowledge Graph which feeds AI",
    },
    Recommendation {
        action: "Add source citations",
        impact: "Up to 115% visibility increase",
        effort: Effort::Low,
        details: "Reference statistics, research, and authoritative sources in content",
    },
    Recommendation {
        action: "Update content monthly",
        impact: "65% of AI citations are from past year",
        effort: Effort::Ongoing,
        details: "Fresh content gets priority in AI responses",
    },
];

pub fn geo_quick_wins() -> &'static [Recommendation] {
    &GEO_QUICK_WINS
}
