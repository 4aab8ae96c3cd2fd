//! YouTube caption provider.
//!
//! The watch page lists the caption tracks of a video. A manually written
//! track in the wanted language is preferred; auto-generated (`asr`) captions
//! are the fallback. The chosen track is fetched in `json3` format.

use super::{TranscriptProvider, TranscriptSegment};
use crate::error::{Result, TubechatError};
use async_trait::async_trait;
use reqwest::header::ACCEPT_LANGUAGE;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const WATCH_ENDPOINT: &str = "https://www.youtube.com/watch";

/// Marker preceding the caption track array in the watch page's player data.
const CAPTION_TRACKS_MARKER: &str = "\"captionTracks\":";

/// Fetches captions for YouTube videos.
pub struct YoutubeTranscripts {
    http: reqwest::Client,
    language: String,
    endpoint: String,
}

impl YoutubeTranscripts {
    /// Create a provider that fetches captions in `language` (e.g. "en").
    pub fn new(language: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            language: language.into(),
            endpoint: WATCH_ENDPOINT.to_string(),
        })
    }

    /// Override the watch page endpoint (for proxies and local mocks).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn caption_tracks(&self, item_id: &str) -> Result<Vec<CaptionTrack>> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("v", item_id)])
            .header(ACCEPT_LANGUAGE, "en-US")
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(TubechatError::TranscriptNotFound(item_id.to_string()));
        }
        if !status.is_success() {
            return Err(TubechatError::Transcript(format!(
                "watch page for {} returned {}",
                item_id, status
            )));
        }

        parse_caption_tracks(&response.text().await?)
    }
}

/// One entry of the watch page's caption track list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    #[serde(default)]
    language_code: String,
    #[serde(default)]
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    /// "en" matches "en" and regional variants such as "en-GB".
    fn matches_language(&self, language: &str) -> bool {
        let code = self.language_code.to_lowercase();
        let language = language.to_lowercase();
        code == language || code.starts_with(&format!("{}-", language))
    }
}

/// Extract the caption track list from a watch page.
///
/// A page without a track list (no captions, or captions disabled) yields an
/// empty list.
fn parse_caption_tracks(page: &str) -> Result<Vec<CaptionTrack>> {
    let Some(start) = page.find(CAPTION_TRACKS_MARKER) else {
        return Ok(Vec::new());
    };

    let mut de = serde_json::Deserializer::from_str(&page[start + CAPTION_TRACKS_MARKER.len()..]);
    Ok(Vec::<CaptionTrack>::deserialize(&mut de)?)
}

/// Manual captions in `language` first, then generated ones.
fn select_track<'a>(tracks: &'a [CaptionTrack], language: &str) -> Option<&'a CaptionTrack> {
    let mut candidates = tracks.iter().filter(|t| t.matches_language(language));
    let manual = candidates.clone().find(|t| !t.is_generated());
    manual.or_else(|| candidates.find(|t| t.is_generated()))
}

#[derive(Debug, Default, Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimedTextEvent {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<TimedTextSeg>,
}

#[derive(Debug, Deserialize)]
struct TimedTextSeg {
    #[serde(default)]
    utf8: String,
}

/// Parse a `json3` caption body into segments.
fn parse_json3(body: &str) -> Result<Vec<TranscriptSegment>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let timed: TimedText = serde_json::from_str(body)?;
    let segments = timed
        .events
        .into_iter()
        .filter(|event| !event.segs.is_empty())
        .map(|event| {
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            TranscriptSegment {
                text: text.replace('\n', " "),
                start_seconds: event.t_start_ms as f64 / 1000.0,
                duration_seconds: event.d_duration_ms as f64 / 1000.0,
            }
        })
        .filter(|segment| !segment.text.trim().is_empty())
        .collect();

    Ok(segments)
}

#[async_trait]
impl TranscriptProvider for YoutubeTranscripts {
    #[instrument(skip(self))]
    async fn fetch_segments(&self, item_id: &str) -> Result<Vec<TranscriptSegment>> {
        let tracks = self.caption_tracks(item_id).await?;
        let track = select_track(&tracks, &self.language).ok_or_else(|| {
            TubechatError::TranscriptNotFound(format!(
                "{} has no '{}' captions ({} tracks listed)",
                item_id,
                self.language,
                tracks.len()
            ))
        })?;
        debug!(
            language = %track.language_code,
            generated = track.is_generated(),
            "Selected caption track for {}",
            item_id
        );

        let response = self
            .http
            .get(&track.base_url)
            .query(&[("fmt", "json3")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TubechatError::Transcript(format!(
                "caption request for {} returned {}",
                item_id, status
            )));
        }

        let segments = parse_json3(&response.text().await?)?;
        if segments.is_empty() {
            return Err(TubechatError::TranscriptNotFound(format!(
                "{} has an empty '{}' caption track",
                item_id, self.language
            )));
        }

        debug!("Fetched {} caption segments for {}", segments.len(), item_id);
        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::LocalServer;

    fn track(language: &str, kind: Option<&str>) -> CaptionTrack {
        CaptionTrack {
            base_url: format!("https://example.com/{}", language),
            language_code: language.to_string(),
            kind: kind.map(str::to_string),
        }
    }

    fn watch_page(base_url: &str) -> String {
        format!(
            r#"<html><script>var ytInitialPlayerResponse = {{"captions":{{"playerCaptionsTracklistRenderer":{{"captionTracks":[{{"baseUrl":"{base}/api/timedtext?v=vid1\u0026lang=de","name":{{"simpleText":"German"}},"vssId":".de","languageCode":"de","isTranslatable":true}},{{"baseUrl":"{base}/api/timedtext?v=vid1\u0026caps=asr\u0026kind=asr\u0026lang=en","name":{{"simpleText":"English (auto-generated)"}},"vssId":"a.en","languageCode":"en","kind":"asr","isTranslatable":true}}],"audioTracks":[]}}}}}};</script></html>"#,
            base = base_url
        )
    }

    #[test]
    fn test_parse_json3() {
        let body = r#"{
            "wireMagic": "pb3",
            "events": [
                {"tStartMs": 0, "dDurationMs": 2000, "segs": [{"utf8": "Cats are"}, {"utf8": " great pets."}]},
                {"tStartMs": 2000, "dDurationMs": 10, "aAppend": 1, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 2100, "dDurationMs": 5000},
                {"tStartMs": 2500, "dDurationMs": 1500, "segs": [{"utf8": "They are\nindependent."}]}
            ]
        }"#;

        let segments = parse_json3(body).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Cats are great pets.");
        assert_eq!(segments[1].text, "They are independent.");
        assert!((segments[1].start_seconds - 2.5).abs() < f64::EPSILON);
        assert!((segments[1].duration_seconds - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_empty_body() {
        assert!(parse_json3("").unwrap().is_empty());
        assert!(parse_json3("{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_caption_tracks() {
        let tracks = parse_caption_tracks(&watch_page("https://www.youtube.com")).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].language_code, "de");
        assert!(!tracks[0].is_generated());
        assert_eq!(
            tracks[1].base_url,
            "https://www.youtube.com/api/timedtext?v=vid1&caps=asr&kind=asr&lang=en"
        );
        assert!(tracks[1].is_generated());
    }

    #[test]
    fn test_page_without_captions_has_no_tracks() {
        assert!(parse_caption_tracks("<html>no player data</html>").unwrap().is_empty());
    }

    #[test]
    fn test_select_prefers_manual_then_generated() {
        let tracks = vec![
            track("en", Some("asr")),
            track("de", None),
            track("en-GB", None),
        ];
        assert_eq!(select_track(&tracks, "en").unwrap().language_code, "en-GB");

        let generated_only = vec![track("de", None), track("en", Some("asr"))];
        let chosen = select_track(&generated_only, "en").unwrap();
        assert!(chosen.is_generated());

        assert!(select_track(&generated_only, "fr").is_none());
    }

    #[tokio::test]
    async fn test_falls_back_to_generated_captions() {
        let server = LocalServer::start(|target, base_url| {
            if target.starts_with("/watch") {
                (200, watch_page(base_url))
            } else {
                (
                    200,
                    r#"{"events":[{"tStartMs":0,"dDurationMs":1500,"segs":[{"utf8":"cats purr"}]},{"tStartMs":1500,"dDurationMs":1000,"segs":[{"utf8":"when happy"}]}]}"#
                        .to_string(),
                )
            }
        })
        .await;
        let provider = YoutubeTranscripts::new("en")
            .unwrap()
            .with_endpoint(format!("{}/watch", server.base_url));

        let segments = provider.fetch_segments("vid1").await.unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].text, "when happy");

        let hits = server.hits();
        assert_eq!(hits[0], "/watch?v=vid1");
        assert!(hits[1].starts_with("/api/timedtext?"));
        assert!(hits[1].contains("kind=asr"));
        assert!(hits[1].ends_with("fmt=json3"));
    }

    #[tokio::test]
    async fn test_video_without_tracks_is_not_found() {
        let server =
            LocalServer::start(|_, _| (200, "<html>no player data</html>".to_string())).await;
        let provider = YoutubeTranscripts::new("en")
            .unwrap()
            .with_endpoint(format!("{}/watch", server.base_url));

        let result = provider.fetch_segments("vid1").await;
        assert!(matches!(result, Err(TubechatError::TranscriptNotFound(_))));
        assert_eq!(server.hits().len(), 1);
    }
}
