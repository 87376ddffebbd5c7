//! `clienthub check` command implementation.
//!
//! Validates the configuration file and the environment it points at:
//! - YAML parsing and value validation
//! - Document storage location
//! - Bootstrap admin and session settings
//! - Document types against the onboarding steps
//! - Database connectivity (unless `--offline`)

use anyhow::Result;
use clienthub_core::config::StorageBackend;
use clienthub_core::{ClientHubConfig, OnboardingStep};
use clienthub_store::PgRepository;
use std::path::Path;

/// Severity level for check results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single check finding.
#[derive(Debug, Clone)]
pub struct CheckFinding {
    pub severity: Severity,
    /// Area of the configuration that produced this finding.
    pub category: String,
    pub message: String,
    /// Optional key path within the file (e.g. "portal.document_types[2]").
    pub location: Option<String>,
}

impl CheckFinding {
    fn new(severity: Severity, category: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            category: category.to_string(),
            message: message.into(),
            location: None,
        }
    }

    fn error(category: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, category, message)
    }

    fn warning(category: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, category, message)
    }

    fn info(category: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, category, message)
    }

    fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Results from running all checks.
#[derive(Debug, Default)]
pub struct CheckResults {
    pub findings: Vec<CheckFinding>,
}

impl CheckResults {
    fn add(&mut self, finding: CheckFinding) {
        self.findings.push(finding);
    }

    fn extend(&mut self, findings: impl IntoIterator<Item = CheckFinding>) {
        self.findings.extend(findings);
    }

    fn with_severity(&self, severity: Severity) -> Vec<&CheckFinding> {
        let mut found: Vec<_> = self
            .findings
            .iter()
            .filter(|f| f.severity == severity)
            .collect();
        found.sort_by(|a, b| a.category.cmp(&b.category));
        found
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn error_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count()
    }

    /// Print human-readable summary.
    pub fn print_summary(&self) {
        let errors = self.with_severity(Severity::Error);
        let warnings = self.with_severity(Severity::Warning);
        let infos = self.with_severity(Severity::Info);

        if !errors.is_empty() {
            println!("\n❌ Errors ({}):", errors.len());
            println!("{}", "─".repeat(60));
            errors.iter().for_each(|f| print_finding(f));
        }

        if !warnings.is_empty() {
            println!("\n⚠️  Warnings ({}):", warnings.len());
            println!("{}", "─".repeat(60));
            warnings.iter().for_each(|f| print_finding(f));
        }

        if !infos.is_empty() {
            println!("\nℹ️  Info ({}):", infos.len());
            println!("{}", "─".repeat(60));
            infos.iter().for_each(|f| print_finding(f));
        }

        println!();
        println!("{}", "═".repeat(60));
        if errors.is_empty() && warnings.is_empty() {
            println!("✅ All checks passed!");
        } else {
            println!(
                "Summary: {} error(s), {} warning(s)",
                errors.len(),
                warnings.len()
            );
            if !errors.is_empty() {
                println!("\n❌ Configuration has errors that must be fixed.");
            }
        }
    }
}

fn print_finding(finding: &CheckFinding) {
    let icon = match finding.severity {
        Severity::Error => "✗",
        Severity::Warning => "⚠",
        Severity::Info => "ℹ",
    };
    let location = finding
        .location
        .as_ref()
        .map(|l| format!(" [{l}]"))
        .unwrap_or_default();
    println!(
        "  {} [{}]{}: {}",
        icon, finding.category, location, finding.message
    );
}

/// Run every check and print the results. Fails when any error was found.
pub async fn run(config_path: &Path, offline: bool) -> Result<()> {
    println!("🔍 Checking ClientHub configuration...");
    println!("  📄 {}", config_path.display());
    if offline {
        println!("  ⏭️  Skipping database connectivity (--offline)");
    }

    let results = run_quiet(config_path, offline).await;
    results.print_summary();

    if results.has_errors() {
        anyhow::bail!(
            "Configuration check failed with {} error(s)",
            results.error_count()
        );
    }
    Ok(())
}

/// Run all checks without printing.
pub async fn run_quiet(config_path: &Path, offline: bool) -> CheckResults {
    let mut results = CheckResults::default();

    let config = if config_path.exists() {
        match ClientHubConfig::from_file(config_path) {
            Ok(config) => config,
            Err(e) => {
                results.add(CheckFinding::error("config", e.to_string()));
                return results;
            }
        }
    } else {
        results.add(CheckFinding::warning(
            "config",
            format!(
                "{} not found; built-in defaults will be used",
                config_path.display()
            ),
        ));
        ClientHubConfig::default()
    };

    results.extend(check_storage(&config));
    results.extend(check_auth(&config));
    results.extend(check_portal(&config));
    if !offline {
        results.extend(check_database(&config).await);
    }
    results
}

fn check_storage(config: &ClientHubConfig) -> Vec<CheckFinding> {
    let storage = &config.storage;
    match storage.backend {
        StorageBackend::Memory => vec![CheckFinding::warning(
            "storage",
            "Memory backend keeps uploaded files in process memory; they are lost on restart",
        )
        .at("storage.backend")],
        StorageBackend::Local => {
            let root = storage.bucket_root();
            if !root.exists() {
                vec![CheckFinding::info(
                    "storage",
                    format!("{} does not exist yet; it is created on first upload", root.display()),
                )
                .at("storage")]
            } else if !root.is_dir() {
                vec![CheckFinding::error(
                    "storage",
                    format!("{} exists but is not a directory", root.display()),
                )
                .at("storage")]
            } else {
                vec![]
            }
        }
    }
}

fn check_auth(config: &ClientHubConfig) -> Vec<CheckFinding> {
    let mut findings = Vec::new();
    let admin = &config.auth.bootstrap_admin;

    let has_password = admin
        .resolve_password()
        .is_some_and(|p| !p.trim().is_empty());
    if !has_password {
        let hint = admin
            .password_env
            .as_deref()
            .map(|env| format!("set {env} or auth.bootstrap_admin.password"))
            .unwrap_or_else(|| "set auth.bootstrap_admin.password".to_string());
        findings.push(
            CheckFinding::warning(
                "auth",
                format!("No bootstrap admin password; an empty database cannot be signed into ({hint})"),
            )
            .at("auth.bootstrap_admin"),
        );
    }
    if !admin.email.contains('@') {
        findings.push(
            CheckFinding::error("auth", format!("'{}' is not an email address", admin.email))
                .at("auth.bootstrap_admin.email"),
        );
    }
    if config.auth.session_ttl_hours > 24 * 30 {
        findings.push(
            CheckFinding::warning(
                "auth",
                format!("Sessions last {} hours", config.auth.session_ttl_hours),
            )
            .at("auth.session_ttl_hours"),
        );
    }
    findings
}

fn check_portal(config: &ClientHubConfig) -> Vec<CheckFinding> {
    let mut findings = Vec::new();
    let portal = &config.portal;

    for (i, document_type) in portal.document_types.iter().enumerate() {
        let location = format!("portal.document_types[{i}]");
        let steps: Vec<&str> = OnboardingStep::ALL
            .iter()
            .filter(|step| step.matches(document_type))
            .map(|step| step.title())
            .collect();
        match steps.len() {
            0 => findings.push(
                CheckFinding::warning(
                    "portal",
                    format!("'{document_type}' does not belong to any onboarding step and never advances progress"),
                )
                .at(location),
            ),
            1 => {}
            _ => findings.push(
                CheckFinding::warning(
                    "portal",
                    format!("'{document_type}' counts toward several steps: {}", steps.join(", ")),
                )
                .at(location),
            ),
        }
    }

    for (i, file_type) in portal.accepted_file_types.iter().enumerate() {
        if !file_type.starts_with('.') && !file_type.contains('/') {
            findings.push(
                CheckFinding::warning(
                    "portal",
                    format!("'{file_type}' is neither an extension (.pdf) nor a MIME type"),
                )
                .at(format!("portal.accepted_file_types[{i}]")),
            );
        }
    }

    if !portal.support_email.contains('@') {
        findings.push(
            CheckFinding::warning(
                "portal",
                format!("'{}' is not an email address", portal.support_email),
            )
            .at("portal.support_email"),
        );
    }
    findings
}

async fn check_database(config: &ClientHubConfig) -> Vec<CheckFinding> {
    let repo = match PgRepository::connect(&config.upstream).await {
        Ok(repo) => repo,
        Err(e) => {
            return vec![CheckFinding::error("database", format!("Cannot connect: {e}")).at("upstream")];
        }
    };
    match repo.ping().await {
        Ok(()) => vec![CheckFinding::info("database", "Database is reachable")],
        Err(e) => vec![CheckFinding::error("database", format!("Ping failed: {e}")).at("upstream")],
    }
}
