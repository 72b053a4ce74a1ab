use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Redact a secret string for Debug output. Shows "[REDACTED]" if non-empty, "[]" if empty.
fn redact(s: &str) -> &str {
    if s.is_empty() { "[]" } else { "[REDACTED]" }
}

/// Deserialize a value that may arrive as a string or a number into a String.
///
/// Pipeline inputs are strings, but CLI overrides and dotted env vars encode
/// numeric-looking values as TOML numbers (`max_tokens = 2048`).
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    struct StringOrNumberVisitor;

    impl<'de> Visitor<'de> for StringOrNumberVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(StringOrNumberVisitor)
}

/// Top-level configuration. Each field maps to a TOML `[section]`.
/// Uses `#[serde(default)]` so missing sections gracefully fall back.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Settings {
    pub config: GlobalConfig,
    pub openai: OpenAiConfig,
    pub azure_devops: AzureDevopsConfig,
    pub review_prompt: PromptTemplate,
}

/// Task-level settings.
///
/// `model`, `instructions` and `max_tokens` mirror the pipeline task inputs,
/// which are plain strings: empty means "not set", and the review engine
/// resolves them to the built-in defaults. `max_tokens` in particular must
/// fall back silently when the input is not a number.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    pub model: String,
    pub instructions: String,
    #[serde(deserialize_with = "string_or_number")]
    pub max_tokens: String,
    pub ai_timeout: u32,
}

#[derive(Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct OpenAiConfig {
    pub key: String,
    pub api_base: String,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("key", &redact(&self.key))
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Identity of the pull request the task operates on, plus the credentials
/// and names needed to clean up its own comments. Sourced from `System.*` /
/// `Build.*` pipeline variables (see the env aliases in the loader).
#[derive(Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AzureDevopsConfig {
    pub collection_uri: String,
    pub project_id: String,
    pub project_name: String,
    pub repository_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub pull_request_id: String,
    pub access_token: String,
    /// Explicit display name override for the build service identity.
    pub build_service_name: String,
}

impl fmt::Debug for AzureDevopsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureDevopsConfig")
            .field("collection_uri", &self.collection_uri)
            .field("project_id", &self.project_id)
            .field("project_name", &self.project_name)
            .field("repository_id", &self.repository_id)
            .field("pull_request_id", &self.pull_request_id)
            .field("access_token", &redact(&self.access_token))
            .field("build_service_name", &self.build_service_name)
            .finish()
    }
}

/// A prompt template loaded from the embedded settings TOML.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PromptTemplate {
    pub system: String,
}
