//! Sentiment Records
//!
//! The typed result of an analysis. The model answers with JSON objects shaped
//! like:
//!
//! ```json
//! {"polarity": "Positive", "emotion": "Joy", "confidence_score": 0.92, "reasoning": "upbeat tone"}
//! ```
//!
//! Records are validated on construction (including deserialization), so a
//! `SentimentRecord` in hand always has a confidence in `[0.0, 1.0]`.

use serde::{Deserialize, Serialize};

/// Coarse sentiment direction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    /// Favourable
    Positive,
    /// Unfavourable
    Negative,
    /// Neither
    Neutral,
}

impl Polarity {
    /// Display label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
        }
    }
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Dominant emotion
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emotion {
    /// Happiness, delight
    Joy,
    /// Grief, disappointment
    Sadness,
    /// Irritation, rage
    Anger,
    /// Worry, dread
    Fear,
    /// Astonishment
    Surprise,
    /// Revulsion, contempt
    Disgust,
    /// No marked emotion
    Neutral,
}

impl Emotion {
    /// Display label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Joy => "Joy",
            Self::Sadness => "Sadness",
            Self::Anger => "Anger",
            Self::Fear => "Fear",
            Self::Surprise => "Surprise",
            Self::Disgust => "Disgust",
            Self::Neutral => "Neutral",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Reasons a record cannot be constructed
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RecordError {
    /// Confidence outside `[0.0, 1.0]` or not a finite number
    #[error("confidence_score {0} is outside [0.0, 1.0]")]
    ConfidenceOutOfRange(f64),
}

/// One decoded sentiment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RecordWire")]
pub struct SentimentRecord {
    polarity: Polarity,
    emotion: Emotion,
    #[serde(rename = "confidence_score")]
    confidence: f64,
    reasoning: String,
}

/// Wire shape, validated into [`SentimentRecord`]
#[derive(Deserialize)]
struct RecordWire {
    polarity: Polarity,
    emotion: Emotion,
    #[serde(rename = "confidence_score", alias = "confidence")]
    confidence: f64,
    reasoning: String,
}

impl TryFrom<RecordWire> for SentimentRecord {
    type Error = RecordError;

    fn try_from(wire: RecordWire) -> Result<Self, Self::Error> {
        Self::new(wire.polarity, wire.emotion, wire.confidence, wire.reasoning)
    }
}

impl SentimentRecord {
    /// Create a record
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::ConfidenceOutOfRange`] if `confidence` is not a
    /// finite value in `[0.0, 1.0]`.
    pub fn new(
        polarity: Polarity,
        emotion: Emotion,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Result<Self, RecordError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(RecordError::ConfidenceOutOfRange(confidence));
        }
        Ok(Self {
            polarity,
            emotion,
            confidence,
            reasoning: reasoning.into(),
        })
    }

    /// Sentiment direction
    #[must_use]
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Dominant emotion
    #[must_use]
    pub fn emotion(&self) -> Emotion {
        self.emotion
    }

    /// Confidence in `[0.0, 1.0]`
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Confidence as a rounded percentage
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn confidence_percent(&self) -> u8 {
        (self.confidence * 100.0).round() as u8
    }

    /// The model's explanation for this record
    #[must_use]
    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_wire_names() {
        let json = r#"{"polarity":"Negative","emotion":"Anger","confidence_score":0.4,"reasoning":"harsh"}"#;
        let record: SentimentRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.polarity(), Polarity::Negative);
        assert_eq!(record.emotion(), Emotion::Anger);
        assert!((record.confidence() - 0.4).abs() < f64::EPSILON);
        assert_eq!(record.reasoning(), "harsh");
    }

    #[test]
    fn test_serialize_uses_confidence_score() {
        let record = SentimentRecord::new(Polarity::Neutral, Emotion::Neutral, 0.5, "flat").unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["confidence_score"], 0.5);
        assert!(value.get("confidence").is_none());
    }

    #[test]
    fn test_confidence_range_enforced() {
        assert_eq!(
            SentimentRecord::new(Polarity::Positive, Emotion::Joy, 1.5, ""),
            Err(RecordError::ConfidenceOutOfRange(1.5))
        );
        assert!(SentimentRecord::new(Polarity::Positive, Emotion::Joy, f64::NAN, "").is_err());

        let json = r#"{"polarity":"Positive","emotion":"Joy","confidence_score":-0.1,"reasoning":""}"#;
        assert!(serde_json::from_str::<SentimentRecord>(json).is_err());
    }

    #[test]
    fn test_unknown_variant_rejected() {
        let json = r#"{"polarity":"Mixed","emotion":"Joy","confidence_score":0.5,"reasoning":""}"#;
        assert!(serde_json::from_str::<SentimentRecord>(json).is_err());
    }

    #[test]
    fn test_confidence_percent_rounds() {
        let record = SentimentRecord::new(Polarity::Positive, Emotion::Joy, 0.926, "").unwrap();
        assert_eq!(record.confidence_percent(), 93);
        let record = SentimentRecord::new(Polarity::Positive, Emotion::Joy, 1.0, "").unwrap();
        assert_eq!(record.confidence_percent(), 100);
    }
}
