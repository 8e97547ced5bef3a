use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TopicGenerator;
use crate::error::{AppError, Result};
use crate::models::Topic;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

const SPEECH_MODEL: &str = "gpt-4o-mini-tts";
const SPEECH_VOICE: &str = "shimmer";

// The provider rejects speech inputs longer than this.
const SPEECH_INPUT_LIMIT: usize = 4096;

const SYSTEM_PROMPT: &str = r#"Choose one topic from the chosen book and create a detailed analysis of the topic, including the whys, how and what results.

The analysis should start by explaining the idea or concept very clearly and with simple terms.
It could be useful to make practical examples with real-world and actionable insights if the topic allows them.
Be engaging and even funny to keep the reader attention and make it pleasant to read, as if you were explaining it to a friend who has never heard of the book before.
The goal is to provide a deep understanding of the topic and its significance to people who are not familiar with the book.
Do not repeat sentences or phrases from the book, but rather explain the concepts in your own words. Do not lose the context of the book and its themes.
Use valid html tags to format the text and make it easier to read. Absolutely avoid markdown syntax and invalid characters.
Keep a B2+ level of English.

Reply with a JSON object with the following structure:
{
  "topic": "the topic you chose from the book",
  "description": "the detailed analysis of the topic"
}"#;

const SPEECH_INSTRUCTIONS: &str = r#"Voice Affect: Calm, composed and curious; a narrator sharing ideas they find genuinely interesting.
Tone: Warm and conversational, never lecturing.
Pacing: Steady and unhurried, with brief pauses between ideas so each one can land.
Pronunciation: Clear and precise, emphasizing the key terms of the analysis."#;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// The JSON object the model is instructed to reply with.
#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    topic: String,
    description: String,
}

#[derive(Debug, Serialize)]
struct SpeechRequest {
    model: String,
    input: String,
    instructions: String,
    voice: String,
    response_format: String,
    speed: f32,
}

pub struct OpenAiGenerator {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(api_key: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            api_key,
            model,
        }
    }

    async fn generate_analysis(
        &self,
        book: &str,
        covered_topics: &[String],
    ) -> Result<AnalysisPayload> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt(book, covered_topics),
                },
            ],
            temperature: 1.0,
        };

        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::Generation(format!("API error: {}", error_text)));
        }

        let chat_response: ChatResponse = response.json().await?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("model response contained no choices"))?;

        serde_json::from_str(&content).map_err(|e| {
            AppError::Generation(format!(
                "Error parsing JSON response: {}\nResponse: {}",
                e, content
            ))
        })
    }

    async fn synthesize_speech(&self, text: &str) -> Result<Vec<u8>> {
        let input = if text.chars().count() > SPEECH_INPUT_LIMIT {
            text.chars().take(SPEECH_INPUT_LIMIT).collect()
        } else {
            text.to_string()
        };

        let request = SpeechRequest {
            model: SPEECH_MODEL.to_string(),
            input,
            instructions: SPEECH_INSTRUCTIONS.to_string(),
            voice: SPEECH_VOICE.to_string(),
            response_format: "mp3".to_string(),
            speed: 1.0,
        };

        let response = self
            .client
            .post(OPENAI_SPEECH_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::AudioSynthesis(format!(
                "API error: {}",
                error_text
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl TopicGenerator for OpenAiGenerator {
    async fn generate(&self, book: &str, covered_topics: &[String]) -> Result<Topic> {
        let analysis = self.generate_analysis(book, covered_topics).await?;

        // Narration is best-effort: a failed speech call still yields a
        // valid text-only topic.
        let audio = match self
            .synthesize_speech(&strip_markup(&analysis.description))
            .await
        {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(book, "audio synthesis failed: {e}");
                None
            }
        };

        Ok(Topic {
            id: Uuid::new_v4().to_string(),
            book: book.to_string(),
            topic: analysis.topic,
            description: analysis.description,
            audio,
        })
    }
}

/// Offline generator used in development mode: a fixed sample topic that
/// exercises the whole pipeline without touching the provider.
pub struct SampleGenerator {
    sample_audio: Option<Vec<u8>>,
}

impl SampleGenerator {
    pub fn new(sample_audio: Option<Vec<u8>>) -> Self {
        Self { sample_audio }
    }
}

#[async_trait]
impl TopicGenerator for SampleGenerator {
    async fn generate(&self, _book: &str, _covered_topics: &[String]) -> Result<Topic> {
        Ok(Topic {
            id: Uuid::new_v4().to_string(),
            book: "Thinking, fast and slow by Daniel Kahneman".to_string(),
            topic: "test".to_string(),
            description: "test<b/><b/>test new line".to_string(),
            audio: self.sample_audio.clone(),
        })
    }
}

fn user_prompt(book: &str, covered_topics: &[String]) -> String {
    if covered_topics.is_empty() {
        format!("The book is {}.", book)
    } else {
        format!(
            "The book is {}. Please avoid the {}, as we already covered them in the previous analysis.",
            book,
            covered_topics.join(",")
        )
    }
}

/// Strips markup from an analysis so the narration never reads out tags:
/// tag-like substrings are removed, the few entities the model emits are
/// decoded, and surrounding whitespace is trimmed.
fn strip_markup(text: &str) -> String {
    let tags = Regex::new(r"<[^>]*>").expect("valid regex");
    tags.replace_all(text, "")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}
