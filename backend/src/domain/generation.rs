//! Recommendation history records and the recommendation document itself.
//!
//! The text-completion service is asked for a JSON document; its reply is
//! treated as untrusted input and validated into [`Recommendation`] before
//! anything else happens.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::{Coordinates, Preferences, UserId};

/// Validation errors for history values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationValidationError {
    /// Store identifiers are positive integers.
    #[error("generation id must be a positive integer, got {0}")]
    InvalidId(i64),
    /// Ratings are whole numbers from 1 to 5.
    #[error("rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(i64),
}

/// Store-assigned history record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "i64", into = "i32")]
#[schema(value_type = i32)]
pub struct GenerationId(i32);

impl GenerationId {
    /// Validate and wrap a raw identifier.
    pub fn new(raw: i64) -> Result<Self, GenerationValidationError> {
        match i32::try_from(raw) {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(GenerationValidationError::InvalidId(raw)),
        }
    }

    /// Raw integer value used by the store.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self.0
    }
}

impl TryFrom<i64> for GenerationId {
    type Error = GenerationValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GenerationId> for i32 {
    fn from(value: GenerationId) -> Self {
        value.0
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Star rating attached to a history record.
///
/// # Examples
/// ```
/// use weatherwear::domain::Rating;
///
/// assert_eq!(Rating::new(5).map(|r| r.value()), Ok(5));
/// assert!(Rating::new(6).is_err());
/// assert!(Rating::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "i64", into = "i32")]
#[schema(value_type = i32)]
pub struct Rating(i32);

impl Rating {
    /// Lowest accepted rating.
    pub const MIN: i32 = 1;
    /// Highest accepted rating.
    pub const MAX: i32 = 5;

    /// Validate a raw rating.
    pub fn new(raw: i64) -> Result<Self, GenerationValidationError> {
        match i32::try_from(raw) {
            Ok(value) if (Self::MIN..=Self::MAX).contains(&value) => Ok(Self(value)),
            _ => Err(GenerationValidationError::RatingOutOfRange(raw)),
        }
    }

    /// Numeric value.
    #[must_use]
    pub fn value(self) -> i32 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = GenerationValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for i32 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

/// A persisted recommendation event.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    /// Record identifier.
    pub id: GenerationId,
    /// Owning account.
    #[serde(skip)]
    pub user_id: UserId,
    /// JSON text of the request context.
    pub prompt: String,
    /// JSON text of the recommendation.
    pub response: String,
    /// Optional star rating.
    pub rating: Option<Rating>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a history record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGeneration {
    /// Owning account.
    pub user_id: UserId,
    /// JSON text of the request context.
    pub prompt: String,
    /// JSON text of the recommendation.
    pub response: String,
}

/// Context a recommendation was generated from, stored as the record prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationContext {
    /// Forecast payload the recommendation was based on.
    pub weather_data: Value,
    /// Effective preferences after merging stored and supplied values.
    #[serde(default)]
    pub user_preferences: Preferences,
    /// Target date as supplied by the caller.
    #[serde(default)]
    pub date: Value,
}

/// Failures reading a stored context back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoredContextError {
    /// Prompt text was not a context document.
    #[error("stored prompt is not a generation context: {0}")]
    Malformed(String),
    /// Weather payload lacked usable coordinates.
    #[error("stored weather data has no usable coordinates")]
    MissingCoordinates,
}

impl GenerationContext {
    /// Serialise to the stored prompt text.
    pub fn to_prompt_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse stored prompt text.
    pub fn from_prompt_text(text: &str) -> Result<Self, StoredContextError> {
        serde_json::from_str(text).map_err(|err| StoredContextError::Malformed(err.to_string()))
    }

    /// Coordinates carried in the forecast payload.
    pub fn coordinates(&self) -> Result<Coordinates, StoredContextError> {
        let latitude = self.weather_data.get("latitude").and_then(Value::as_f64);
        let longitude = self.weather_data.get("longitude").and_then(Value::as_f64);
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => {
                Coordinates::new(lat, lon).map_err(|_| StoredContextError::MissingCoordinates)
            }
            _ => Err(StoredContextError::MissingCoordinates),
        }
    }
}

/// Garments chosen for the forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Clothes {
    /// Headwear, when the weather calls for it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hat: Option<Value>,
    /// Upper-body garment.
    pub top: Value,
    /// Lower-body garment.
    pub bottom: Value,
    /// Footwear.
    pub shoes: Value,
    /// Accessories listed alongside the garments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Value>,
}

/// Validated recommendation document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Recommendation {
    /// One-line forecast summary.
    pub summary: String,
    /// Chosen garments.
    pub clothes: Clothes,
    /// Accessories listed at the top level.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Value>,
    /// Reasoning for the choices.
    pub explanation: Value,
}

/// Reasons a completion could not be accepted as a recommendation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecommendationParseError {
    /// The text was not JSON of the expected shape.
    #[error("completion is not a recommendation document: {0}")]
    Schema(String),
    /// A required entry was present but null.
    #[error("recommendation field `{0}` must not be null")]
    NullField(&'static str),
}

impl Recommendation {
    /// Strip an optional code fence and validate the document.
    ///
    /// Returns the recommendation together with the cleaned text that was
    /// parsed, which is what gets stored.
    ///
    /// # Examples
    /// ```
    /// use weatherwear::domain::Recommendation;
    ///
    /// let text = "```json\n{\"summary\":\"Mild\",\"clothes\":{\"top\":\"tee\",\"bottom\":\"jeans\",\"shoes\":\"trainers\"},\"explanation\":[\"warm\"]}\n```";
    /// let (rec, cleaned) = Recommendation::parse_completion(text).expect("valid");
    /// assert_eq!(rec.summary, "Mild");
    /// assert!(cleaned.starts_with('{'));
    /// ```
    pub fn parse_completion(text: &str) -> Result<(Self, String), RecommendationParseError> {
        let cleaned = strip_code_fence(text);
        let recommendation: Self = serde_json::from_str(cleaned)
            .map_err(|err| RecommendationParseError::Schema(err.to_string()))?;
        recommendation.validate()?;
        Ok((recommendation, cleaned.to_owned()))
    }

    fn validate(&self) -> Result<(), RecommendationParseError> {
        let required = [
            ("clothes.top", &self.clothes.top),
            ("clothes.bottom", &self.clothes.bottom),
            ("clothes.shoes", &self.clothes.shoes),
            ("explanation", &self.explanation),
        ];
        for (name, value) in required {
            if value.is_null() {
                return Err(RecommendationParseError::NullField(name));
            }
        }
        Ok(())
    }

    /// Prompt for the image-generation service.
    pub fn image_prompt(&self) -> String {
        let clothes = serde_json::to_string(&self.clothes).unwrap_or_default();
        format!("Generate an image of a person wearing the following clothes: {clothes}")
    }
}

/// Remove a surrounding Markdown code fence, if any.
///
/// # Examples
/// ```
/// use weatherwear::domain::strip_code_fence;
///
/// assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
/// assert_eq!(strip_code_fence("{}"), "{}");
/// ```
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (for example `json`) on the opening line.
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    const VALID: &str = r#"{"summary":"Cold and wet","clothes":{"hat":"beanie","top":"wool jumper","bottom":"jeans","shoes":"boots","items":["umbrella"]},"explanation":["rain expected"]}"#;

    #[rstest]
    #[case(VALID)]
    #[case("```json\n{0}\n```")]
    #[case("```\n{0}\n```")]
    #[case("  ```JSON\n{0}\n```  \n")]
    fn parses_fenced_and_bare_documents(#[case] template: &str) {
        let text = template.replace("{0}", VALID);
        let (recommendation, cleaned) =
            Recommendation::parse_completion(&text).expect("document parses");
        assert_eq!(recommendation.summary, "Cold and wet");
        assert_eq!(recommendation.clothes.hat, Some(json!("beanie")));
        assert_eq!(recommendation.clothes.items, vec![json!("umbrella")]);
        assert_eq!(cleaned, VALID);
    }

    #[rstest]
    fn accepts_top_level_items_and_missing_hat() {
        let text = r#"{"summary":"Sunny","clothes":{"top":"t-shirt","bottom":"shorts","shoes":"sandals"},"items":["sunglasses"],"explanation":"hot"}"#;
        let (recommendation, _) = Recommendation::parse_completion(text).expect("parses");
        assert!(recommendation.clothes.hat.is_none());
        assert_eq!(recommendation.items, vec![json!("sunglasses")]);
    }

    #[rstest]
    #[case("Sure! Here is your outfit.")]
    #[case(r#"{"summary":"x","clothes":{"top":"a","bottom":"b"},"explanation":"e"}"#)]
    #[case(r#"{"clothes":{"top":"a","bottom":"b","shoes":"c"},"explanation":"e"}"#)]
    #[case("```json\n[1,2,3]\n```")]
    fn rejects_non_documents(#[case] text: &str) {
        assert!(matches!(
            Recommendation::parse_completion(text),
            Err(RecommendationParseError::Schema(_))
        ));
    }

    #[rstest]
    fn rejects_null_required_entries() {
        let text = r#"{"summary":"x","clothes":{"top":null,"bottom":"b","shoes":"c"},"explanation":"e"}"#;
        assert_eq!(
            Recommendation::parse_completion(text).map(|_| ()),
            Err(RecommendationParseError::NullField("clothes.top"))
        );
    }

    #[rstest]
    fn image_prompt_embeds_clothes_json() {
        let (recommendation, _) = Recommendation::parse_completion(VALID).expect("parses");
        let prompt = recommendation.image_prompt();
        assert!(
            prompt.starts_with("Generate an image of a person wearing the following clothes: {")
        );
        assert!(prompt.contains("\"top\":\"wool jumper\""));
    }

    #[rstest]
    #[case(1)]
    #[case(5)]
    fn ratings_inside_range_are_accepted(#[case] raw: i64) {
        assert!(Rating::new(raw).is_ok());
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[case(-1)]
    #[case(i64::MAX)]
    fn ratings_outside_range_are_rejected(#[case] raw: i64) {
        assert_eq!(
            Rating::new(raw),
            Err(GenerationValidationError::RatingOutOfRange(raw))
        );
    }

    #[rstest]
    fn context_round_trips_through_prompt_text() {
        let context = GenerationContext {
            weather_data: json!({ "latitude": 59.9, "longitude": 10.75, "hourly": {} }),
            user_preferences: Preferences::try_from(json!({ "style": "casual" }))
                .expect("object"),
            date: json!("2024-05-01"),
        };
        let text = context.to_prompt_text().expect("serialises");
        assert!(text.contains("\"weatherData\""));
        assert!(text.contains("\"userPreferences\""));
        let restored = GenerationContext::from_prompt_text(&text).expect("parses");
        assert_eq!(restored, context);
        let coordinates = restored.coordinates().expect("coordinates present");
        assert_eq!(coordinates.latitude(), 59.9);
    }

    #[rstest]
    #[case(json!({}))]
    #[case(json!({ "latitude": "north", "longitude": 1.0 }))]
    #[case(json!({ "latitude": 120.0, "longitude": 1.0 }))]
    fn context_without_coordinates_is_reported(#[case] weather_data: Value) {
        let context = GenerationContext {
            weather_data,
            user_preferences: Preferences::new(),
            date: json!("2024-05-01"),
        };
        assert_eq!(
            context.coordinates(),
            Err(StoredContextError::MissingCoordinates)
        );
    }

    #[rstest]
    fn malformed_prompt_text_is_reported() {
        assert!(matches!(
            GenerationContext::from_prompt_text("not json"),
            Err(StoredContextError::Malformed(_))
        ));
    }
}
