use std::sync::OnceLock;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use trustable_core::{
    estimate, explanation_document, recommendations_document, BrandSignals, ScoreResult,
};

use crate::error::ToolError;
use crate::protocol::ToolContent;

pub const CHECK_AI_VISIBILITY: &str = "check_ai_visibility";
pub const GET_GEO_RECOMMENDATIONS: &str = "get_geo_recommendations";
pub const EXPLAIN_TRUSTABLE_SCORE: &str = "explain_trustable_score";

pub const DEFAULT_BRAND: &str = "Unknown";
pub const DEFAULT_PLATFORM_COUNT: i64 = 1;
pub const DEFAULT_CONTENT_AGE_MONTHS: i64 = 12;
pub const DEFAULT_CURRENT_SCORE: i64 = 30;

pub fn is_known_tool(name: &str) -> bool {
    matches!(
        name,
        CHECK_AI_VISIBILITY | GET_GEO_RECOMMENDATIONS | EXPLAIN_TRUSTABLE_SCORE
    )
}

/// Output of one tool invocation: exactly one text block, plus the same
/// document as structured JSON when the tool produced one.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub content: Vec<ToolContent>,
    pub structured: Option<Value>,
}

impl ToolOutput {
    fn document<T: Serialize>(doc: &T) -> Result<Self, ToolError> {
        Ok(Self {
            content: vec![ToolContent::text(serde_json::to_string_pretty(doc)?)],
            structured: Some(serde_json::to_value(doc)?),
        })
    }

    fn text(text: String) -> Self {
        Self {
            content: vec![ToolContent::text(text)],
            structured: None,
        }
    }

    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(ToolContent::as_text)
    }
}

/// Route a tool call by name. Unknown tools are answered with a text block,
/// never an error; only malformed arguments fail.
pub fn dispatch(name: &str, arguments: Option<&Value>) -> Result<ToolOutput, ToolError> {
    match name {
        CHECK_AI_VISIBILITY => check_ai_visibility(arguments),
        // `current_score` is advertised but never read.
        GET_GEO_RECOMMENDATIONS => ToolOutput::document(&recommendations_document()),
        EXPLAIN_TRUSTABLE_SCORE => ToolOutput::document(&explanation_document()),
        other => Ok(ToolOutput::text(format!("Unknown tool: {other}"))),
    }
}

#[derive(Debug, Default, Deserialize)]
struct CheckVisibilityInput {
    #[serde(default)]
    brand: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    platform_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    has_wikidata: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    has_google_business: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    has_crunchbase: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    has_schema_markup: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    has_llms_txt: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    has_comparison_content: Option<bool>,
    #[serde(default, deserialize_with = "lenient_int")]
    avg_content_age_months: Option<i64>,
}

impl CheckVisibilityInput {
    fn signals(&self) -> BrandSignals {
        BrandSignals {
            platform_count: self.platform_count.unwrap_or(DEFAULT_PLATFORM_COUNT),
            has_wikidata: self.has_wikidata.unwrap_or(false),
            has_google_business: self.has_google_business.unwrap_or(false),
            has_crunchbase: self.has_crunchbase.unwrap_or(false),
            has_schema_markup: self.has_schema_markup.unwrap_or(false),
            has_llms_txt: self.has_llms_txt.unwrap_or(false),
            has_comparison_content: self.has_comparison_content.unwrap_or(false),
            avg_content_age_months: self
                .avg_content_age_months
                .unwrap_or(DEFAULT_CONTENT_AGE_MONTHS),
        }
    }
}

#[derive(Debug, Serialize)]
struct VisibilityReport {
    #[serde(flatten)]
    result: ScoreResult,
    brand: String,
}

fn check_ai_visibility(arguments: Option<&Value>) -> Result<ToolOutput, ToolError> {
    let input: CheckVisibilityInput = parse_args_optional(arguments)?;
    let result = estimate(&input.signals());
    tracing::debug!(
        score = result.score,
        rating = result.rating.as_str(),
        "estimated trustable score"
    );
    let report = VisibilityReport {
        result,
        brand: input.brand.unwrap_or_else(|| DEFAULT_BRAND.to_string()),
    };
    ToolOutput::document(&report)
}

fn parse_args_optional<T: for<'de> Deserialize<'de> + Default>(
    arguments: Option<&Value>,
) -> Result<T, ToolError> {
    match arguments {
        None | Some(Value::Null) => Ok(T::default()),
        Some(v) => {
            T::deserialize(v).map_err(|err| ToolError::InvalidArguments(err.to_string()))
        }
    }
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => coerce_bool(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected boolean, got {value}"))),
    }
}

fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => coerce_int(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected integer, got {value}"))),
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Value::Number(_) => match coerce_int(value) {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(i);
            }
            if n.as_u64().is_some() {
                return Some(i64::MAX);
            }
            // Saturating cast; only whole floats are accepted.
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

static TOOL_DESCRIPTORS: OnceLock<Value> = OnceLock::new();

/// `tools/list` payload, built on first use.
pub fn tool_descriptors() -> &'static Value {
    TOOL_DESCRIPTORS.get_or_init(|| {
        json!({
            "tools": [
                {
                    "name": CHECK_AI_VISIBILITY,
                    "description": "Check a brand's AI visibility using the Trustable Score methodology. The Trustable Score measures how often a brand appears in AI-generated responses across ChatGPT, Claude, Perplexity, and other AI platforms. Based on research analyzing 680 million AI citations by Trustable Labs.",
                    "inputSchema": {
                        "type": "object",
                        "required": ["brand"],
                        "properties": {
                            "brand": {"type": "string", "description": "Brand name to analyze"},
                            "platform_count": {
                                "type": "integer",
                                "description": "Number of platforms brand is on (website, Medium, LinkedIn, etc.)",
                                "default": DEFAULT_PLATFORM_COUNT
                            },
                            "has_wikidata": {"type": "boolean", "description": "Brand has a Wikidata entry", "default": false},
                            "has_google_business": {"type": "boolean", "description": "Brand has Google Business Profile", "default": false},
                            "has_crunchbase": {"type": "boolean", "description": "Brand has a Crunchbase profile", "default": false},
                            "has_schema_markup": {"type": "boolean", "description": "Site has JSON-LD schema markup", "default": false},
                            "has_llms_txt": {"type": "boolean", "description": "Site publishes an llms.txt file", "default": false},
                            "has_comparison_content": {"type": "boolean", "description": "Has comparison/listicle content", "default": false},
                            "avg_content_age_months": {
                                "type": "integer",
                                "description": "Average age of content in months",
                                "default": DEFAULT_CONTENT_AGE_MONTHS
                            }
                        }
                    }
                },
                {
                    "name": GET_GEO_RECOMMENDATIONS,
                    "description": "Get GEO (Generative Engine Optimization) recommendations for improving AI visibility. Unlike SEO, AI visibility is driven by brand search volume, platform diversity (4+ platforms = 2.8x boost), comparison content (32.5% of citations) and content freshness (65% from past year).",
                    "inputSchema": {
                        "type": "object",
                        "properties": {
                            "current_score": {
                                "type": "integer",
                                "description": "Current Trustable Score (0-100)",
                                "default": DEFAULT_CURRENT_SCORE
                            }
                        }
                    }
                },
                {
                    "name": EXPLAIN_TRUSTABLE_SCORE,
                    "description": "Explain what the Trustable Score is and how it's calculated.",
                    "inputSchema": {
                        "type": "object",
                        "properties": {}
                    }
                }
            ]
        })
    })
}
