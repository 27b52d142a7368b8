//! Doctor command - verify provider configuration and API keys.

use crate::cli::Output;
use crate::config::{EmbeddingProvider, Settings};
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(config_path: Option<&str>, settings: &Settings) -> anyhow::Result<()> {
    Output::header("Lese Doctor");
    println!();
    println!("Checking provider configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("Providers").bold());
    let provider_checks = check_providers(settings);
    for check in &provider_checks {
        check.print();
    }
    checks.extend(provider_checks);

    println!();

    println!("{}", style("API Keys").bold());
    let key_checks = check_api_keys(settings);
    for check in &key_checks {
        check.print();
    }
    checks.extend(key_checks);

    println!();

    println!("{}", style("Directories").bold());
    let dir_check = check_upload_dir(settings);
    dir_check.print();
    checks.push(dir_check);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Lese.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Lese is ready to use.");
    }

    Ok(())
}

/// Describe which providers are configured.
fn check_providers(settings: &Settings) -> Vec<CheckResult> {
    let embedding = &settings.embedding;
    let embedding_check = match embedding.provider {
        EmbeddingProvider::OpenAI => CheckResult::ok(
            "Embedding",
            &format!(
                "{} ({} dims) at {}",
                embedding.model,
                embedding.dimensions,
                embedding.api_base.as_deref().unwrap_or("api.openai.com")
            ),
        ),
        EmbeddingProvider::Hashing => CheckResult::warning(
            "Embedding",
            &format!("hashing ({} dims, offline)", embedding.dimensions),
            "Lexical matching only; set embedding.provider = \"openai\" for semantic search",
        ),
    };

    let generation = &settings.generation;
    let generation_check = CheckResult::ok(
        "Generation",
        &format!(
            "{} (max {} tokens) at {}",
            generation.model,
            generation.max_tokens,
            generation.api_base.as_deref().unwrap_or("api.openai.com")
        ),
    );

    vec![embedding_check, generation_check]
}

/// Check the API keys the configured providers need.
fn check_api_keys(settings: &Settings) -> Vec<CheckResult> {
    let mut vars = Vec::new();
    if settings.embedding.provider == EmbeddingProvider::OpenAI {
        vars.push(settings.embedding.api_key_env.as_str());
    }
    vars.push(settings.generation.api_key_env.as_str());
    vars.dedup();

    vars.into_iter()
        .map(|var| check_api_key(var, std::env::var(var).ok().as_deref()))
        .collect()
}

fn check_api_key(var: &str, value: Option<&str>) -> CheckResult {
    let hint = format!("Set with: export {}='...'", var);
    match value {
        Some(key) if key.is_empty() => CheckResult::error(var, "empty", &hint),
        Some(key) if key.chars().count() > 12 => {
            let head: String = key.chars().take(4).collect();
            let tail: String = key
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            CheckResult::ok(var, &format!("configured ({}...{})", head, tail))
        }
        Some(_) => CheckResult::warning(var, "set but looks too short", "Check the key value"),
        None => CheckResult::error(var, "not set", &hint),
    }
}

/// Check the upload directory used by the server.
fn check_upload_dir(settings: &Settings) -> CheckResult {
    let upload_dir = settings.upload_dir();
    if upload_dir.exists() {
        let size = dir_size(&upload_dir);
        CheckResult::ok(
            "Upload directory",
            &format!("{} ({})", upload_dir.display(), format_size(size)),
        )
    } else {
        CheckResult::warning(
            "Upload directory",
            &format!("{} (will be created)", upload_dir.display()),
            "Directory will be created when the server starts",
        )
    }
}

/// Check if config file exists.
fn check_config_file(config_path: Option<&str>) -> CheckResult {
    let config_path = config_path
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: lese config init",
        )
    }
}

fn dir_size(dir: &std::path::Path) -> u64 {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter_map(|e| e.metadata().ok())
                .filter(|m| m.is_file())
                .map(|m| m.len())
                .sum()
        })
        .unwrap_or(0)
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
