//! YouTube transcript tool server.
//!
//! Retrieves captions without an API key: the watch page embeds the list
//! of caption tracks, and each track can be fetched as json3. Auto-generated
//! tracks (kind "asr") are used only when no manual track matches the
//! requested language.

use super::{arg_str, ToolServer};
use crate::config::TranscriptSettings;
use crate::error::{Result, VettError};
use crate::mcp::protocol::{Tool, ToolCallResult};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

const SERVER_NAME: &str = "transcript";

const WATCH_URL: &str = "https://www.youtube.com/watch";

// YouTube serves a consent page to clients without a plausible user agent.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Tool server for YouTube caption retrieval.
pub struct TranscriptServer {
    client: reqwest::Client,
    settings: TranscriptSettings,
    video_id_regex: Regex,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    name: Option<TrackName>,
}

#[derive(Debug, Deserialize)]
struct TrackName {
    #[serde(default, rename = "simpleText")]
    simple_text: Option<String>,
}

impl CaptionTrack {
    fn is_auto_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    fn display_name(&self) -> String {
        let label = self
            .name
            .as_ref()
            .and_then(|n| n.simple_text.clone())
            .unwrap_or_else(|| self.language_code.clone());
        if self.is_auto_generated() {
            format!("{} (auto-generated)", label)
        } else {
            label
        }
    }
}

#[derive(Debug, Deserialize)]
struct Json3Transcript {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(default, rename = "tStartMs")]
    t_start_ms: u64,
    #[serde(default)]
    segs: Option<Vec<Json3Seg>>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

impl TranscriptServer {
    pub fn new(settings: &TranscriptSettings) -> Self {
        // Matches various YouTube URL formats and bare video IDs
        let video_id_regex = Regex::new(
            r"(?x)
            (?:
                # Full YouTube URLs
                (?:https?://)?
                (?:www\.)?
                (?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            # Bare video ID (11 characters)
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("Invalid regex");

        Self {
            client: reqwest::Client::new(),
            settings: settings.clone(),
            video_id_regex,
        }
    }

    /// Extract video ID from a YouTube URL or bare ID.
    fn extract_video_id(&self, input: &str) -> Option<String> {
        let caps = self.video_id_regex.captures(input.trim())?;

        // Try group 1 (URL format) then group 2 (bare ID)
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    }

    /// Fetch the caption track list from the watch page.
    async fn fetch_caption_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>> {
        debug!("Fetching caption tracks for video {}", video_id);

        let html = self
            .client
            .get(WATCH_URL)
            .query(&[("v", video_id)])
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let Some(raw) = extract_json_array(&html, "\"captionTracks\":") else {
            return Err(VettError::TranscriptNotFound(video_id.to_string()));
        };

        let tracks: Vec<CaptionTrack> = serde_json::from_str(raw)
            .map_err(|e| VettError::Transcript(format!("Failed to parse caption tracks: {}", e)))?;

        if tracks.is_empty() {
            return Err(VettError::TranscriptNotFound(video_id.to_string()));
        }

        Ok(tracks)
    }

    /// Fetch and render one caption track.
    async fn fetch_track(&self, track: &CaptionTrack) -> Result<String> {
        let mut url = url::Url::parse(&track.base_url)
            .map_err(|e| VettError::Transcript(format!("Invalid caption track URL: {}", e)))?;
        url.query_pairs_mut().append_pair("fmt", "json3");

        let transcript: Json3Transcript = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(render_transcript(&transcript))
    }

    async fn tool_get_transcript(&self, args: Option<Value>) -> ToolCallResult {
        let Some(video) = arg_str(&args, "video") else {
            return ToolCallResult::error("Missing 'video' argument".to_string());
        };

        let Some(video_id) = self.extract_video_id(video) else {
            return ToolCallResult::error(format!("Not a YouTube URL or video ID: {}", video));
        };

        let preferred: Vec<String> = match arg_str(&args, "language") {
            Some(lang) => vec![lang.to_string()],
            None => self.settings.languages.clone(),
        };

        let tracks = match self.fetch_caption_tracks(&video_id).await {
            Ok(tracks) => tracks,
            Err(VettError::TranscriptNotFound(_)) => {
                return ToolCallResult::text(format!(
                    "No transcript is available for video {}.",
                    video_id
                ))
            }
            Err(e) => return ToolCallResult::error(format!("Transcript fetch failed: {}", e)),
        };

        let Some(track) = select_track(&tracks, &preferred) else {
            let available: Vec<String> =
                tracks.iter().map(|t| t.language_code.clone()).collect();
            return ToolCallResult::text(format!(
                "No transcript in [{}] for video {}. Available languages: {}",
                preferred.join(", "),
                video_id,
                available.join(", ")
            ));
        };

        match self.fetch_track(track).await {
            Ok(text) if text.is_empty() => {
                ToolCallResult::text(format!("Transcript for video {} is empty.", video_id))
            }
            Ok(text) => ToolCallResult::text(format!(
                "Transcript for video {} ({}):\n\n{}",
                video_id,
                track.display_name(),
                text
            )),
            Err(e) => ToolCallResult::error(format!("Transcript fetch failed: {}", e)),
        }
    }

    async fn tool_list_languages(&self, args: Option<Value>) -> ToolCallResult {
        let Some(video) = arg_str(&args, "video") else {
            return ToolCallResult::error("Missing 'video' argument".to_string());
        };

        let Some(video_id) = self.extract_video_id(video) else {
            return ToolCallResult::error(format!("Not a YouTube URL or video ID: {}", video));
        };

        match self.fetch_caption_tracks(&video_id).await {
            Ok(tracks) => {
                let listing = tracks
                    .iter()
                    .map(|t| format!("- {} ({})", t.language_code, t.display_name()))
                    .collect::<Vec<_>>()
                    .join("\n");
                ToolCallResult::text(format!(
                    "Available transcript languages for video {}:\n{}",
                    video_id, listing
                ))
            }
            Err(VettError::TranscriptNotFound(_)) => ToolCallResult::text(format!(
                "No transcript is available for video {}.",
                video_id
            )),
            Err(e) => ToolCallResult::error(format!("Transcript fetch failed: {}", e)),
        }
    }
}

#[async_trait]
impl ToolServer for TranscriptServer {
    fn name(&self) -> &str {
        SERVER_NAME
    }

    fn tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: "get_transcript".to_string(),
                description: "Get the transcript of a YouTube video as timestamped text. \
                    Use this to summarize or answer questions about a video."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "video": {
                            "type": "string",
                            "description": "YouTube URL or 11-character video ID"
                        },
                        "language": {
                            "type": "string",
                            "description": "Preferred caption language code, e.g. 'en'"
                        }
                    },
                    "required": ["video"]
                }),
            },
            Tool {
                name: "list_transcript_languages".to_string(),
                description: "List the caption languages available for a YouTube video."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "video": {
                            "type": "string",
                            "description": "YouTube URL or 11-character video ID"
                        }
                    },
                    "required": ["video"]
                }),
            },
        ]
    }

    async fn call(&self, name: &str, args: Option<Value>) -> ToolCallResult {
        match name {
            "get_transcript" => self.tool_get_transcript(args).await,
            "list_transcript_languages" => self.tool_list_languages(args).await,
            _ => ToolCallResult::error(format!("Unknown tool: {}", name)),
        }
    }
}

/// Pick the best caption track for the preferred languages.
///
/// Manual tracks win over auto-generated ones within the same language;
/// when nothing matches, fall back to the first track.
fn select_track<'a>(tracks: &'a [CaptionTrack], preferred: &[String]) -> Option<&'a CaptionTrack> {
    for lang in preferred {
        if let Some(track) = tracks
            .iter()
            .find(|t| t.language_code == *lang && !t.is_auto_generated())
        {
            return Some(track);
        }
        if let Some(track) = tracks.iter().find(|t| t.language_code == *lang) {
            return Some(track);
        }
    }

    if preferred.is_empty() {
        tracks.first()
    } else {
        None
    }
}

/// Extract a balanced JSON array following `key` in raw HTML.
///
/// Bracket matching respects string literals and escapes, since track
/// names may contain brackets.
fn extract_json_array<'a>(html: &'a str, key: &str) -> Option<&'a str> {
    let start = html.find(key)? + key.len();
    let bytes = html.as_bytes();
    if bytes.get(start) != Some(&b'[') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if *b == b'\\' {
                escaped = true;
            } else if *b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&html[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Render a json3 transcript as timestamped lines.
fn render_transcript(transcript: &Json3Transcript) -> String {
    let mut lines = Vec::new();

    for event in &transcript.events {
        let Some(segs) = &event.segs else { continue };

        let text: String = segs
            .iter()
            .map(|s| s.utf8.as_str())
            .collect::<String>()
            .replace('\n', " ")
            .trim()
            .to_string();

        if text.is_empty() {
            continue;
        }

        lines.push(format!("[{}] {}", format_timestamp(event.t_start_ms), text));
    }

    lines.join("\n")
}

/// Format milliseconds as a timestamp string.
fn format_timestamp(ms: u64) -> String {
    let total = ms / 1000;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> TranscriptServer {
        TranscriptServer::new(&TranscriptSettings::default())
    }

    #[test]
    fn test_extract_video_id() {
        let s = server();
        assert_eq!(
            s.extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            s.extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            s.extract_video_id("dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(s.extract_video_id("not a video"), None);
    }

    #[test]
    fn test_extract_json_array() {
        let html = r#"...,"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://example.com/t","languageCode":"en","name":{"simpleText":"English [CC]"}}],"audioTracks":..."#;
        let raw = extract_json_array(html, "\"captionTracks\":").unwrap();
        assert!(raw.starts_with('['));
        assert!(raw.ends_with(']'));

        let tracks: Vec<CaptionTrack> = serde_json::from_str(raw).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].language_code, "en");
        // The bracket inside the track name must not terminate the scan
        assert_eq!(
            tracks[0].name.as_ref().unwrap().simple_text.as_deref(),
            Some("English [CC]")
        );

        assert!(extract_json_array(html, "\"missingKey\":").is_none());
    }

    #[test]
    fn test_select_track_prefers_manual() {
        let tracks = vec![
            CaptionTrack {
                base_url: "a".to_string(),
                language_code: "en".to_string(),
                kind: Some("asr".to_string()),
                name: None,
            },
            CaptionTrack {
                base_url: "b".to_string(),
                language_code: "en".to_string(),
                kind: None,
                name: None,
            },
        ];

        let preferred = vec!["en".to_string()];
        let track = select_track(&tracks, &preferred).unwrap();
        assert_eq!(track.base_url, "b");

        let preferred = vec!["no".to_string()];
        assert!(select_track(&tracks, &preferred).is_none());

        // No preference: first track wins
        assert_eq!(select_track(&tracks, &[]).unwrap().base_url, "a");
    }

    #[test]
    fn test_render_transcript() {
        let transcript = Json3Transcript {
            events: vec![
                Json3Event {
                    t_start_ms: 0,
                    segs: Some(vec![Json3Seg {
                        utf8: "Hello world".to_string(),
                    }]),
                },
                Json3Event {
                    t_start_ms: 61_500,
                    segs: Some(vec![
                        Json3Seg {
                            utf8: "Second".to_string(),
                        },
                        Json3Seg {
                            utf8: " line".to_string(),
                        },
                    ]),
                },
                // Timing-only event with no segments
                Json3Event {
                    t_start_ms: 90_000,
                    segs: None,
                },
            ],
        };

        let text = render_transcript(&transcript);
        assert_eq!(text, "[00:00] Hello world\n[01:01] Second line");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "00:00");
        assert_eq!(format_timestamp(65_000), "01:05");
        assert_eq!(format_timestamp(3_665_000), "01:01:05");
    }
}
