//! Tweet records to graph events.
//!
//! Each input line is one JSON object from the streaming API. Only
//! `created_at` and `entities.hashtags[].text` are read; everything else
//! is ignored. Lines without a usable `created_at` (rate-limit notices,
//! deletes, garbage) are errors the caller skips.

use chrono::DateTime;
use serde::Deserialize;
use thiserror::Error;
use window_graph::{Event, Timestamp};

/// `Thu Oct 29 17:51:01 +0000 2015`
pub const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("blank line")]
    Blank,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record has no created_at")]
    MissingTimestamp,

    #[error("unparseable created_at '{value}': {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    created_at: Option<String>,
    #[serde(default)]
    entities: Option<RawEntities>,
}

#[derive(Debug, Default, Deserialize)]
struct RawEntities {
    #[serde(default)]
    hashtags: Vec<RawHashtag>,
}

#[derive(Debug, Deserialize)]
struct RawHashtag {
    text: Option<String>,
}

pub fn parse_created_at(value: &str) -> Result<Timestamp, RecordError> {
    DateTime::parse_from_str(value, CREATED_AT_FORMAT)
        .map(|dt| dt.timestamp())
        .map_err(|source| RecordError::Timestamp {
            value: value.to_string(),
            source,
        })
}

/// Parse one line. A tweet without hashtags is still a valid event.
pub fn parse_record(line: &str) -> Result<Event, RecordError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(RecordError::Blank);
    }

    let raw: RawRecord = serde_json::from_str(line)?;
    let created_at = raw
        .created_at
        .filter(|value| !value.is_empty())
        .ok_or(RecordError::MissingTimestamp)?;
    let timestamp = parse_created_at(&created_at)?;

    let tags = raw
        .entities
        .unwrap_or_default()
        .hashtags
        .into_iter()
        .filter_map(|hashtag| hashtag.text)
        .filter(|text| !text.is_empty());

    Ok(Event::new(timestamp, tags))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_twitter_timestamp() {
        assert_eq!(
            parse_created_at("Thu Oct 29 17:51:01 +0000 2015").unwrap(),
            1_446_141_061
        );
        assert_eq!(
            parse_created_at("Thu Oct 29 19:51:01 +0200 2015").unwrap(),
            1_446_141_061
        );
    }

    #[test]
    fn extracts_distinct_hashtags() {
        let line = r#"{"created_at":"Thu Oct 29 17:51:01 +0000 2015","text":"hi","entities":{"hashtags":[{"text":"Spark","indices":[0,6]},{"text":"Apache","indices":[7,14]},{"text":"Spark","indices":[15,21]}]}}"#;
        let event = parse_record(line).unwrap();
        assert_eq!(event.timestamp, 1_446_141_061);
        let tags: Vec<&str> = event.tags.iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["Apache", "Spark"]);
    }

    #[test]
    fn tweet_without_entities_has_no_tags() {
        let event = parse_record(r#"{"created_at":"Thu Oct 29 17:51:01 +0000 2015"}"#).unwrap();
        assert!(event.tags.is_empty());
    }

    #[test]
    fn rate_limit_notice_is_skipped() {
        let err = parse_record(r#"{"limit":{"track":5,"timestamp_ms":"1446218985743"}}"#)
            .unwrap_err();
        assert!(matches!(err, RecordError::MissingTimestamp));
    }

    #[test]
    fn malformed_inputs_are_errors() {
        assert!(matches!(parse_record("   "), Err(RecordError::Blank)));
        assert!(matches!(parse_record("{not json"), Err(RecordError::Json(_))));
        assert!(matches!(
            parse_record(r#"{"created_at":""}"#),
            Err(RecordError::MissingTimestamp)
        ));
        assert!(matches!(
            parse_record(r#"{"created_at":"yesterday"}"#),
            Err(RecordError::Timestamp { .. })
        ));
    }
}
