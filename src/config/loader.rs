use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use figment::Figment;
use figment::providers::{Env, Format, Toml};

use crate::config::types::Settings;
use crate::error::ReviewTaskError;

// Embedded default TOML files.
// This makes the binary self-contained — the task carries its own defaults
// and review rubric into the pipeline agent.
static CONFIGURATION_TOML: &str = include_str!("../../settings/configuration.toml");
static REVIEW_PROMPT_TOML: &str = include_str!("../../settings/review_prompt.toml");

/// Global settings, set once at startup by `init_settings`.
static GLOBAL_SETTINGS: RwLock<Option<Arc<Settings>>> = RwLock::new(None);

/// Get the current settings.
pub fn get_settings() -> Arc<Settings> {
    let guard = GLOBAL_SETTINGS.read().unwrap_or_else(|poisoned| {
        tracing::error!("settings RwLock poisoned, recovering inner value");
        poisoned.into_inner()
    });
    match guard.as_ref() {
        Some(s) => s.clone(),
        None => {
            tracing::error!(
                "get_settings() called before init_settings() — loading defaults as fallback"
            );
            let fallback = Arc::new(load_settings(&HashMap::new()).unwrap_or_else(|e| {
                tracing::error!(error = %e, "failed to load fallback settings, using Default");
                Settings::default()
            }));
            drop(guard);
            let mut write_guard = GLOBAL_SETTINGS
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *write_guard = Some(fallback.clone());
            fallback
        }
    }
}

/// Initialize (or re-initialize) global settings.
pub fn init_settings(
    cli_overrides: &HashMap<String, String>,
) -> Result<Arc<Settings>, ReviewTaskError> {
    let settings = Arc::new(load_settings(cli_overrides)?);
    *GLOBAL_SETTINGS.write().unwrap_or_else(|poisoned| {
        tracing::error!("settings RwLock poisoned, recovering inner value");
        poisoned.into_inner()
    }) = Some(settings.clone());
    Ok(settings)
}

/// Build the full configuration by merging layers:
///
/// 1. Embedded TOML defaults (`settings/configuration.toml`, review prompt)
/// 2. Secrets file from filesystem (`.secrets.toml`, optional)
/// 3. CLI argument overrides (`--section.key=value`)
/// 4. Pipeline variable aliases (`SYSTEM_TEAMFOUNDATIONCOLLECTIONURI`, `INPUT_MODEL`, ...)
/// 5. Dotted `SECTION.KEY` env vars (highest precedence)
pub fn load_settings(
    cli_overrides: &HashMap<String, String>,
) -> Result<Settings, ReviewTaskError> {
    // Layer 1: embedded defaults
    let mut figment = Figment::new()
        .merge(Toml::string(CONFIGURATION_TOML))
        .merge(Toml::string(REVIEW_PROMPT_TOML));

    // Layer 2: secrets file (optional, from filesystem)
    figment = figment.merge(Toml::file(".secrets.toml"));
    figment = figment.merge(Toml::file("settings/.secrets.toml"));

    // Layer 3: CLI argument overrides (--config.model=gpt-4o)
    for (key, value) in cli_overrides {
        // Figment doesn't have a direct "set key" method for arbitrary dotted keys,
        // so we build a TOML fragment: `[section]\nkey = value`
        if let Some(toml_fragment) = cli_override_to_toml(key, value) {
            figment = figment.merge(Toml::string(&toml_fragment));
        }
    }

    // Layer 4: pipeline variables and task inputs.
    //
    // Azure DevOps exposes `System.*` / `Build.*` variables and task inputs
    // to the process with dots and periods collapsed to underscores.
    figment = figment.merge(
        Env::raw()
            .only(&[
                "SYSTEM_TEAMFOUNDATIONCOLLECTIONURI",
                "SYSTEM_TEAMPROJECTID",
                "SYSTEM_TEAMPROJECT",
                "BUILD_REPOSITORY_ID",
                "SYSTEM_PULLREQUEST_PULLREQUESTID",
                "SYSTEM_ACCESSTOKEN",
                "INPUT_BUILDSERVICENAME",
                "INPUT_MODEL",
                "INPUT_INSTRUCTIONS",
                "INPUT_MAX_TOKENS",
                "INPUT_API_KEY",
                "OPENAI_API_KEY",
                "OPENAI_KEY",
            ])
            .map(|key| match key.as_str() {
                "SYSTEM_TEAMFOUNDATIONCOLLECTIONURI" => "azure_devops.collection_uri".into(),
                "SYSTEM_TEAMPROJECTID" => "azure_devops.project_id".into(),
                "SYSTEM_TEAMPROJECT" => "azure_devops.project_name".into(),
                "BUILD_REPOSITORY_ID" => "azure_devops.repository_id".into(),
                "SYSTEM_PULLREQUEST_PULLREQUESTID" => "azure_devops.pull_request_id".into(),
                "SYSTEM_ACCESSTOKEN" => "azure_devops.access_token".into(),
                "INPUT_BUILDSERVICENAME" => "azure_devops.build_service_name".into(),
                "INPUT_MODEL" => "config.model".into(),
                "INPUT_INSTRUCTIONS" => "config.instructions".into(),
                "INPUT_MAX_TOKENS" => "config.max_tokens".into(),
                "INPUT_API_KEY" | "OPENAI_API_KEY" | "OPENAI_KEY" => "openai.key".into(),
                _ => key.into(),
            }),
    );

    // Layer 5: dotted SECTION.KEY env vars as TOML fragments.
    // Maps CONFIG.MODEL → config.model, OPENAI.KEY → openai.key, etc.
    for (key, value) in std::env::vars() {
        if !key.contains('.') {
            continue;
        }
        let lower = key.to_lowercase();
        let Some((section, field)) = lower.split_once('.') else {
            continue;
        };
        let fragment = format!("[{section}]\n{field} = {}", toml_scalar(value.trim()));
        figment = figment.merge(Toml::string(&fragment));
    }

    let settings: Settings = figment.extract()?;
    Ok(settings)
}

/// Convert a CLI override like "config.model=gpt-4o" into a TOML fragment.
fn cli_override_to_toml(key: &str, value: &str) -> Option<String> {
    let (section, field) = match key.split_once('.') {
        Some(pair) => pair,
        None => {
            tracing::warn!("ignoring CLI override with no section: {key}={value}");
            return None;
        }
    };
    Some(format!("[{section}]\n{field} = {}", toml_scalar(value)))
}

/// Encode a scalar value for a TOML fragment: bools and numbers pass through,
/// everything else becomes an escaped double-quoted string.
fn toml_scalar(value: &str) -> String {
    let is_literal = value == "true"
        || value == "false"
        || value.parse::<i64>().is_ok()
        || value.parse::<f64>().is_ok();
    if is_literal {
        value.to_string()
    } else {
        let escaped = value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t");
        format!("\"{escaped}\"")
    }
}
