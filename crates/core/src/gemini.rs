use std::path::Path;

use async_trait::async_trait;
use reqwest::Response;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::fs;
use tracing::{debug, info};

use crate::{
    error::{ReelsightError, Result},
    provider::ProviderConfig,
    remote::{ReasoningAgent, VideoStore},
    types::{AgentReply, FileState, RemoteVideoHandle, WebSource},
};

static SYSTEM_INSTRUCTION: &str = "You are a video analysis assistant. \
Ground your answers in what is shown and said in the attached video, use web search \
to add context and verify facts, and format every answer in Markdown.";

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

#[derive(Deserialize)]
struct FileEnvelope {
    file: FileResource,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    name: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<RemoteStatus>,
}

#[derive(Deserialize)]
struct RemoteStatus {
    #[serde(default)]
    message: String,
}

impl FileResource {
    fn into_handle(self, fallback_mime_type: &str) -> RemoteVideoHandle {
        RemoteVideoHandle {
            state: self
                .state
                .as_deref()
                .map(FileState::from_remote)
                .unwrap_or_default(),
            uri: self.uri.unwrap_or_default(),
            mime_type: self
                .mime_type
                .unwrap_or_else(|| fallback_mime_type.to_string()),
            error: self.error.map(|status| status.message),
            name: self.name,
        }
    }
}

/// Client for the Gemini Files API and `generateContent`.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl GeminiClient {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn request_body(&self, instruction: &str, video: &RemoteVideoHandle) -> Value {
        let mut body = json!({
            "systemInstruction": {
                "parts": [{ "text": SYSTEM_INSTRUCTION }],
            },
            "contents": [
                {
                    "role": "user",
                    "parts": [
                        {
                            "fileData": {
                                "mimeType": video.mime_type,
                                "fileUri": video.uri,
                            },
                        },
                        { "text": instruction },
                    ],
                },
            ],
        });

        if self.config.web_search {
            body["tools"] = json!([{ "googleSearch": {} }]);
        }

        body
    }
}

/// Turn a non-2xx response into [`ReelsightError::Remote`], preferring the
/// API's own `error.message` over the raw body.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| value["error"]["message"].as_str().map(str::to_owned))
        .unwrap_or(body);

    Err(ReelsightError::Remote {
        status: status.as_u16(),
        message,
    })
}

/// Concatenate the text parts of the first candidate and collect the web
/// sources it was grounded on.
fn parse_reply(response: &Value) -> Result<AgentReply> {
    let candidate = &response["candidates"][0];

    let text = candidate["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<String>()
        })
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| {
            let reason = match response["promptFeedback"]["blockReason"].as_str() {
                Some(block_reason) => format!("request blocked by the model: {}", block_reason),
                None => match candidate["finishReason"].as_str() {
                    Some(finish_reason) => format!("model returned no text (finish reason {})", finish_reason),
                    None => format!("Invalid API response structure: {}", response),
                },
            };
            ReelsightError::DispatchFailed { reason }
        })?;

    let mut sources: Vec<WebSource> = Vec::new();
    if let Some(chunks) = candidate["groundingMetadata"]["groundingChunks"].as_array() {
        for web in chunks.iter().map(|chunk| &chunk["web"]) {
            let Some(uri) = web["uri"].as_str() else {
                continue;
            };
            if sources.iter().any(|source| source.uri == uri) {
                continue;
            }
            sources.push(WebSource {
                title: web["title"].as_str().unwrap_or(uri).to_string(),
                uri: uri.to_string(),
            });
        }
    }

    Ok(AgentReply { text, sources })
}

#[async_trait]
impl VideoStore for GeminiClient {
    async fn upload(&self, path: &Path, mime_type: &str) -> Result<RemoteVideoHandle> {
        let api_key = self.config.validate_api_key()?;
        let file = fs::File::open(path).await?;
        let size = file.metadata().await?.len();
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        info!(file = %display_name, size, mime_type, "starting resumable upload");

        let start = self
            .http
            .post(self.config.upload_url())
            .header(API_KEY_HEADER, api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", size.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;
        let start = ensure_success(start).await?;

        let upload_url = start
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| ReelsightError::Remote {
                status: start.status().as_u16(),
                message: format!("upload session response has no {} header", UPLOAD_URL_HEADER),
            })?;

        let response = self
            .http
            .post(&upload_url)
            .header(API_KEY_HEADER, api_key)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .header(reqwest::header::CONTENT_LENGTH, size.to_string())
            .body(reqwest::Body::from(file))
            .send()
            .await?;

        let envelope = ensure_success(response)
            .await?
            .json::<FileEnvelope>()
            .await?;
        let handle = envelope.file.into_handle(mime_type);

        info!(name = %handle.name, state = ?handle.state, "upload finished");
        Ok(handle)
    }

    async fn get(&self, name: &str) -> Result<RemoteVideoHandle> {
        let api_key = self.config.validate_api_key()?;

        let response = self
            .http
            .get(self.config.file_url(name))
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?;

        let file = ensure_success(response)
            .await?
            .json::<FileResource>()
            .await?;

        Ok(file.into_handle(""))
    }
}

#[async_trait]
impl ReasoningAgent for GeminiClient {
    async fn run(&self, instruction: &str, video: &RemoteVideoHandle) -> Result<AgentReply> {
        let api_key = self.config.validate_api_key()?;

        debug!(model = %self.config.model, video = %video.name, web_search = self.config.web_search, "calling generateContent");

        let response = self
            .http
            .post(self.config.generate_url())
            .header(API_KEY_HEADER, api_key)
            .json(&self.request_body(instruction, video))
            .send()
            .await?;

        let response = ensure_success(response)
            .await?
            .json::<Value>()
            .await?;

        parse_reply(&response)
    }
}
