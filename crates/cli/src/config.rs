use anyhow::{Context as AnyhowContext, Result};
use codedesk_chat::{ChatConfig, DEFAULT_API_BASE, DEFAULT_MODEL, MAX_TIMEOUT};
use codedesk_workspace::ScanOptions;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub(crate) const ROOT_ENV: &str = "CODEDESK_ROOT";
pub(crate) const PAGES_DIR_ENV: &str = "CODEDESK_PAGES_DIR";
pub(crate) const PROMPT_FILE_ENV: &str = "CODEDESK_PROMPT_FILE";
pub(crate) const MODEL_ENV: &str = "CODEDESK_MODEL";
pub(crate) const API_BASE_ENV: &str = "CODEDESK_API_BASE";
pub(crate) const API_KEY_ENVS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// Everything the server needs, resolved once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub root: PathBuf,
    pub pages_dir: PathBuf,
    pub scan: ScanOptions,
    pub chat: ChatConfig,
}

impl AppConfig {
    pub(crate) fn from_serve_args(args: &crate::ServeArgs) -> Result<Self> {
        let root = resolve_root(args.root.root.clone())?;
        let scan = ScanOptions {
            max_depth: validate_max_depth(args.root.max_depth)?,
        };
        let chat = ChatConfig {
            api_base: flag_or_env(args.api_base.clone(), API_BASE_ENV)
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: flag_or_env(args.model.clone(), MODEL_ENV)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: pick_api_key(API_KEY_ENVS.iter().map(|name| env::var(name).ok())),
            timeout: validate_timeout(args.timeout_secs)?,
            temperature: validate_temperature(args.temperature)?,
            prompt_file: args
                .prompt_file
                .clone()
                .or_else(|| env::var(PROMPT_FILE_ENV).ok().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("prompt.txt")),
        };
        let pages_dir = args
            .pages_dir
            .clone()
            .or_else(|| env::var(PAGES_DIR_ENV).ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            root,
            pages_dir,
            scan,
            chat,
        })
    }
}

pub(crate) fn resolve_root(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(root) = flag.or_else(|| env::var(ROOT_ENV).ok().map(PathBuf::from)) {
        return Ok(root);
    }
    env::current_dir().context("Failed to determine current directory for the root")
}

fn flag_or_env(flag: Option<String>, name: &str) -> Option<String> {
    flag.or_else(|| env::var(name).ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// First non-blank key wins. There is no built-in fallback key.
pub(crate) fn pick_api_key(candidates: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}

pub(crate) fn validate_timeout(secs: u64) -> Result<Duration> {
    let timeout = Duration::from_secs(secs);
    if secs == 0 || timeout > MAX_TIMEOUT {
        anyhow::bail!(
            "--timeout-secs must be between 1 and {} (got {secs})",
            MAX_TIMEOUT.as_secs()
        );
    }
    Ok(timeout)
}

pub(crate) fn validate_temperature(value: f32) -> Result<f32> {
    if !(0.0..=2.0).contains(&value) {
        anyhow::bail!("--temperature must be between 0.0 and 2.0 (got {value})");
    }
    Ok(value)
}

pub(crate) fn validate_max_depth(value: usize) -> Result<usize> {
    if value == 0 {
        anyhow::bail!("--max-depth must be at least 1");
    }
    Ok(value)
}
