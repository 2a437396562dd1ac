//! Infer song tags from a video's title, channel and description with a
//! forced function call against a chat completion endpoint.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::{GenreMode, LibrarianOptions};
use crate::error::{Error, Result};
use crate::types::{Metadata, VideoInfo};

/// Name of the single function the model is forced to call.
pub const FUNCTION_NAME: &str = "store_metadata";

/// Earliest release year the schema accepts.
pub const MIN_YEAR: u32 = 1900;

/// Genres offered to the model in [`GenreMode::Enumerated`].
pub const GENRES: [&str; 30] = [
    "Alternative",
    "Ambient",
    "Blues",
    "Classical",
    "Country",
    "Dance",
    "Disco",
    "Electronic",
    "Folk",
    "Funk",
    "Goa",
    "Hard Rock",
    "Hip-Hop",
    "House",
    "Indie",
    "Jazz",
    "Metal",
    "Musical",
    "Opera",
    "Other",
    "Pop",
    "R&B",
    "Rap",
    "Reggae",
    "Rock & Roll",
    "Rock",
    "Soundtrack",
    "Techno",
    "Unknown",
    "Vocal",
];

const SYSTEM_PROMPT: &str =
    "You are assisting the user adding metadata to MP3 files from a YouTube video download.";

static LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://\S*|ftp://\S*|www\.\S*").expect("link regex is valid")
});

/// Remove http(s), ftp and www links so link text doesn't leak into the prompt.
pub fn strip_links(text: &str) -> String {
    LINK_REGEX.replace_all(text, "").into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// System framing plus one user message describing the video.
pub fn build_messages(info: &VideoInfo) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system".into(),
            content: SYSTEM_PROMPT.into(),
        },
        ChatMessage {
            role: "user".into(),
            content: format!(
                "# YouTube Video Information\n\n## Video Name\n{}\n\n## Channel Name\n{}\n\n## Video Description\n{}",
                info.title,
                info.uploader,
                strip_links(&info.description)
            ),
        },
    ]
}

/// JSON schema of the `store_metadata` parameters.
pub fn function_parameters(genre_mode: GenreMode) -> Value {
    let mut genre = json!({
        "description": "The music genre. If it cannot be determined, use 'Unknown'.",
        "type": "string",
    });
    if genre_mode == GenreMode::Enumerated {
        genre["enum"] = json!(GENRES);
    }

    json!({
        "type": "object",
        "properties": {
            "title": {
                "description": "The song or mix title, in the format 'Title (feat. Artist 2, Artist 3, ...)'. Do not list the main artist. If this is a remix, mention the DJ or producer in the title, and not the original artist.",
                "type": "string",
            },
            "artists": {
                "description": "Names of the main artists, most prominent first. If this is a remix of some sort, list the original artist. If this is a compilation or set, list the DJ.",
                "type": "array",
                "items": { "type": "string" },
                "minItems": 1,
            },
            "album": {
                "description": "Album the song belongs to. If not stated, use the song or mix title, but without listing the featured artists.",
                "type": "string",
            },
            "year": {
                "description": "Release year or date where set is performed.",
                "type": "integer",
                "minimum": MIN_YEAR,
            },
            "genre": genre,
            "contributors": {
                "description": "Information about the producers or other contributors to the track, in the format 'Name (Role), Name (Role), ...'. Do not include the main artist or artists mentioned in the title.",
                "type": "string",
            },
        },
        "required": ["title", "artists", "album", "genre"],
    })
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    tools: Vec<Tool>,
    tool_choice: ToolChoice,
    temperature: f32,
}

#[derive(Serialize)]
struct Tool {
    r#type: &'static str,
    function: FunctionDefinition,
}

#[derive(Serialize)]
struct FunctionDefinition {
    name: &'static str,
    description: &'static str,
    parameters: Value,
}

#[derive(Serialize)]
struct ToolChoice {
    r#type: &'static str,
    function: ToolChoiceFunction,
}

#[derive(Serialize)]
struct ToolChoiceFunction {
    name: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    tool_calls: Option<Vec<ToolCall>>,
    function_call: Option<FunctionCall>,
}

#[derive(Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Deserialize)]
struct FunctionCall {
    arguments: String,
}

/// Client for the completion endpoint.
pub struct MetadataClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    genre_mode: GenreMode,
}

impl MetadataClient {
    /// Resolve the API key and build one HTTP client to share across jobs.
    pub fn new(options: &LibrarianOptions) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            api_key: options.resolve_api_key()?,
            endpoint: options.completions_url(),
            model: options.model.clone(),
            genre_mode: options.genre_mode,
        })
    }

    /// Ask the model for structured tags describing the video.
    pub async fn interpret(&self, info: &VideoInfo) -> Result<Metadata> {
        info!(
            title = %info.title,
            model = %self.model,
            genre_mode = %self.genre_mode,
            "requesting metadata"
        );

        let request = ChatRequest {
            model: &self.model,
            messages: build_messages(info),
            tools: vec![Tool {
                r#type: "function",
                function: FunctionDefinition {
                    name: FUNCTION_NAME,
                    description: "Store metadata about song or mix.",
                    parameters: function_parameters(self.genre_mode),
                },
            }],
            tool_choice: ToolChoice {
                r#type: "function",
                function: ToolChoiceFunction {
                    name: FUNCTION_NAME,
                },
            },
            temperature: 0.0,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        parse_response(&body)
    }
}

/// Pull the function-call arguments out of a completion response body.
pub fn parse_response(body: &str) -> Result<Metadata> {
    let response: ChatResponse = serde_json::from_str(body)?;

    let message = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or(Error::NoFunctionCall)?;

    let arguments = message
        .tool_calls
        .and_then(|calls| calls.into_iter().next())
        .map(|call| call.function)
        .or(message.function_call)
        .map(|f| f.arguments)
        .ok_or(Error::NoFunctionCall)?;

    debug!(%arguments, "function call arguments");
    parse_arguments(&arguments)
}

/// Parse and normalize the `store_metadata` arguments.
pub fn parse_arguments(arguments: &str) -> Result<Metadata> {
    let raw: Metadata = serde_json::from_str(arguments)
        .map_err(|e| Error::InvalidMetadata(format!("malformed function arguments: {e}")))?;
    normalize(raw)
}

fn normalize(raw: Metadata) -> Result<Metadata> {
    let title = raw.title.trim().to_string();
    if title.is_empty() {
        return Err(Error::InvalidMetadata("empty title".into()));
    }

    let artists: Vec<String> = raw
        .artists
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(String::from)
        .collect();
    if artists.is_empty() {
        return Err(Error::InvalidMetadata("no artist".into()));
    }

    let year = match raw.year {
        Some(y) if y < MIN_YEAR => {
            warn!(year = y, "discarding implausible release year");
            None
        }
        other => other,
    };

    let non_blank = |s: Option<String>| {
        s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    };

    Ok(Metadata {
        title,
        artists,
        album: raw.album.trim().to_string(),
        year,
        genre: non_blank(raw.genre),
        contributors: non_blank(raw.contributors),
    })
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.chars().take(500).collect())
}
