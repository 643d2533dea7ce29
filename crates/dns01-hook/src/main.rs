// # dns01-hook - certbot manual hook
//
// This binary is a THIN integration layer:
// - DO NOT add zone, record, or retry logic here
// - All reconciliation logic lives in dns01-core
// - Configuration is via environment variables (or one JSON file)
//
// The hook is responsible for:
// 1. Reading configuration and the certbot challenge from the environment
// 2. Initializing logging and the runtime
// 3. Registering providers and creating the Provider API client
// 4. Running one publish (`auth`) or remove (`cleanup`)
//
// ## Configuration
//
// ### DNS Provider
// - `DNS01_PROVIDER_TYPE`: Provider type (ovh)
// - `DNS01_OVH_ENDPOINT`: Endpoint alias or URL (default: ovh-eu)
// - `DNS01_OVH_APPLICATION_KEY`: Application key
// - `DNS01_OVH_APPLICATION_SECRET`: Application secret
// - `DNS01_OVH_CONSUMER_KEY`: Consumer key
//
// ### Challenge
// - `DNS01_TTL`: TTL of the TXT record in seconds (default: 1)
// - `DNS01_PROPAGATION_SECONDS`: Wait after publishing (default: 10)
//
// ### Runtime
// - `DNS01_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
// - `DNS01_MODE`: live or dry-run (default: live)
// - `DNS01_CONFIG`: Path to a JSON `Dns01Config`; replaces the provider and
//   challenge variables above
//
// ### Set by certbot
// - `CERTBOT_DOMAIN`: Domain being validated
// - `CERTBOT_VALIDATION`: Challenge token (auth only)
//
// ## Example
//
// ```bash
// export DNS01_OVH_APPLICATION_KEY=...
// export DNS01_OVH_APPLICATION_SECRET=...
// export DNS01_OVH_CONSUMER_KEY=...
//
// certbot certonly --manual --preferred-challenges dns \
//     --manual-auth-hook "dns01-hook auth" \
//     --manual-cleanup-hook "dns01-hook cleanup" \
//     -d example.com
// ```

use anyhow::{Context, Result};
use dns01_core::{
    ChallengeAuthenticator, ChallengeConfig, Dns01Config, ProviderConfig, ProviderRegistry,
    ZoneRecordReconciler,
};
use std::env;
use std::process::ExitCode;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Prefix of the challenge record owner name
const CHALLENGE_LABEL: &str = "_acme-challenge";

/// Observer channel capacity; a hook run emits a handful of events
const EVENT_CAPACITY: usize = 16;

/// Exit codes for different termination scenarios
///
/// - 0: Success
/// - 1: Configuration error (including a domain with no matching zone)
/// - 2: Runtime error (provider call failed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookExitCode {
    /// Operation completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<HookExitCode> for ExitCode {
    fn from(code: HookExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Which certbot hook is being run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookAction {
    /// `--manual-auth-hook`
    Auth,
    /// `--manual-cleanup-hook`
    Cleanup,
}

impl HookAction {
    fn parse(arg: Option<&str>) -> Result<Self> {
        match arg {
            Some("auth") => Ok(Self::Auth),
            Some("cleanup") => Ok(Self::Cleanup),
            Some(other) => anyhow::bail!(
                "Unknown hook action '{}'. Usage: dns01-hook <auth|cleanup>",
                other
            ),
            None => anyhow::bail!("Missing hook action. Usage: dns01-hook <auth|cleanup>"),
        }
    }
}

/// Challenge handed over by certbot
#[derive(Debug, Clone, PartialEq, Eq)]
struct Challenge {
    domain: String,
    validation: Option<String>,
}

impl Challenge {
    fn from_vars(action: HookAction, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let domain = var("CERTBOT_DOMAIN")
            .map(|d| d.trim().trim_end_matches('.').to_lowercase())
            .filter(|d| !d.is_empty())
            .context("CERTBOT_DOMAIN is required. Run this binary as a certbot manual hook")?;
        validate_domain_name(&domain)?;

        let validation = var("CERTBOT_VALIDATION").filter(|v| !v.is_empty());
        if action == HookAction::Auth && validation.is_none() {
            anyhow::bail!("CERTBOT_VALIDATION is required for the auth hook");
        }

        Ok(Self { domain, validation })
    }

    fn record_name(&self) -> String {
        format!("{}.{}", CHALLENGE_LABEL, self.domain)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    dns01: Dns01Config,
    log_level: String,
    mode: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let dns01 = match var("DNS01_CONFIG") {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read DNS01_CONFIG file {}", path))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("Invalid DNS01_CONFIG file {}", path))?
            }
            None => Dns01Config {
                provider: provider_from_vars(&var)?,
                challenge: challenge_from_vars(&var)?,
            },
        };

        Ok(Self {
            dns01,
            log_level: var("DNS01_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            mode: var("DNS01_MODE").unwrap_or_else(|| "live".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Checks everything the core validation does not: numeric ranges,
    /// placeholder credentials, and the runtime variables.
    fn validate(&self) -> Result<()> {
        if let ProviderConfig::Ovh {
            application_key,
            application_secret,
            consumer_key,
            ..
        } = &self.dns01.provider
        {
            for (name, value) in [
                ("DNS01_OVH_APPLICATION_KEY", application_key),
                ("DNS01_OVH_APPLICATION_SECRET", application_secret),
                ("DNS01_OVH_CONSUMER_KEY", consumer_key),
            ] {
                if value.is_empty() {
                    anyhow::bail!("{} is required. Set it via: export {}=...", name, name);
                }

                // Check for obvious placeholder credentials (common mistake)
                let lower = value.to_lowercase();
                if lower.contains("your_") || lower.contains("replace_me") || lower == "changeme" {
                    anyhow::bail!(
                        "{} appears to be a placeholder. \
                        Use the credentials created for your OVH account.",
                        name
                    );
                }
            }
        }

        let provider_type = self.dns01.provider.type_name();
        if !supported_providers().iter().any(|p| *p == provider_type) {
            anyhow::bail!(
                "DNS01_PROVIDER_TYPE '{}' is not supported. Supported providers: {}",
                provider_type,
                supported_providers().join(", ")
            );
        }

        let challenge = &self.dns01.challenge;
        if !(1..=86_400).contains(&challenge.ttl) {
            anyhow::bail!(
                "DNS01_TTL must be between 1 and 86400 seconds. Got: {}",
                challenge.ttl
            );
        }
        if challenge.propagation_seconds > 3600 {
            anyhow::bail!(
                "DNS01_PROPAGATION_SECONDS must be between 0 and 3600 seconds. Got: {}",
                challenge.propagation_seconds
            );
        }

        self.dns01.validate()?;

        match self.mode.to_lowercase().as_str() {
            "live" | "dry-run" => {}
            _ => anyhow::bail!(
                "DNS01_MODE '{}' is not valid. Valid modes: live, dry-run",
                self.mode
            ),
        }

        parse_log_level(&self.log_level)?;

        Ok(())
    }
}

fn supported_providers() -> Vec<&'static str> {
    let mut providers = Vec::new();
    #[cfg(feature = "ovh")]
    providers.push("ovh");
    providers
}

fn provider_from_vars(var: &impl Fn(&str) -> Option<String>) -> Result<ProviderConfig> {
    let provider_type = var("DNS01_PROVIDER_TYPE").unwrap_or_else(|| "ovh".to_string());
    match provider_type.as_str() {
        "ovh" => Ok(ProviderConfig::Ovh {
            endpoint: var("DNS01_OVH_ENDPOINT").unwrap_or_else(|| "ovh-eu".to_string()),
            application_key: var("DNS01_OVH_APPLICATION_KEY").unwrap_or_default(),
            application_secret: var("DNS01_OVH_APPLICATION_SECRET").unwrap_or_default(),
            consumer_key: var("DNS01_OVH_CONSUMER_KEY").unwrap_or_default(),
        }),
        other => anyhow::bail!(
            "DNS01_PROVIDER_TYPE '{}' is not supported. \
            Use DNS01_CONFIG for custom providers",
            other
        ),
    }
}

fn challenge_from_vars(var: &impl Fn(&str) -> Option<String>) -> Result<ChallengeConfig> {
    let mut challenge = ChallengeConfig::default();
    if let Some(ttl) = var("DNS01_TTL") {
        challenge.ttl = ttl
            .trim()
            .parse()
            .with_context(|| format!("DNS01_TTL must be a number of seconds. Got: {}", ttl))?;
    }
    if let Some(secs) = var("DNS01_PROPAGATION_SECONDS") {
        challenge.propagation_seconds = secs.trim().parse().with_context(|| {
            format!(
                "DNS01_PROPAGATION_SECONDS must be a number of seconds. Got: {}",
                secs
            )
        })?;
    }
    Ok(challenge)
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "DNS01_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks; catches typos before any API call is made.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric, hyphen and underscore only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let action = match HookAction::parse(env::args().nth(1).as_deref()) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("{}", e);
            return HookExitCode::ConfigError.into();
        }
    };

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return HookExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return HookExitCode::ConfigError.into();
    }

    let challenge = match Challenge::from_vars(action, |key| env::var(key).ok()) {
        Ok(challenge) => challenge,
        Err(e) => {
            eprintln!("Challenge error: {:#}", e);
            return HookExitCode::ConfigError.into();
        }
    };

    // Initialize tracing; stdout belongs to certbot
    let log_level = parse_log_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return HookExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return HookExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_hook(action, challenge, config)).into()
}

/// Run one hook invocation
async fn run_hook(action: HookAction, challenge: Challenge, config: Config) -> HookExitCode {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "ovh")]
    {
        debug!("Registering OVH provider");
        dns01_provider_ovh::register(&registry);
    }

    let client = match registry.create_client(&config.dns01.provider) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create provider client: {}", e);
            return HookExitCode::ConfigError;
        }
    };

    let (reconciler, mut events) = ZoneRecordReconciler::observed(client, EVENT_CAPACITY);
    let event_log = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!("Reconciler event: {:?}", event);
        }
    });

    info!(
        "Running {} hook for {} via {}",
        action_name(action),
        challenge.record_name(),
        reconciler.provider_name()
    );

    let code = reconcile(&reconciler, action, &challenge, config.dns01.challenge.ttl).await;

    // Closing the sender ends the event log task
    drop(reconciler);
    if let Err(e) = event_log.await {
        warn!("Reconciler event log task failed: {}", e);
    }

    if code == HookExitCode::Success && action == HookAction::Auth {
        let delay = config.dns01.challenge.propagation_delay();
        if !delay.is_zero() {
            info!("Waiting {:?} for DNS propagation", delay);
            tokio::time::sleep(delay).await;
        }
    }

    code
}

/// Publish or remove the challenge record and classify the outcome
///
/// Setup problems (no zone on the account, bad configuration) exit with 1;
/// everything else the provider reports exits with 2.
async fn reconcile(
    authenticator: &dyn ChallengeAuthenticator,
    action: HookAction,
    challenge: &Challenge,
    ttl: u32,
) -> HookExitCode {
    let record_name = challenge.record_name();

    let result = match action {
        HookAction::Auth => {
            let validation = challenge.validation.as_deref().unwrap_or_default();
            authenticator
                .publish(&challenge.domain, &record_name, validation, ttl)
                .await
                .map(|outcome| {
                    info!(
                        "Published challenge record {} in zone {}",
                        record_name,
                        outcome.zone()
                    )
                })
        }
        HookAction::Cleanup => authenticator
            .remove(&challenge.domain, &record_name)
            .await
            .map(|outcome| info!("Removed challenge record: {:?}", outcome)),
    };

    match result {
        Ok(()) => HookExitCode::Success,
        Err(e) if e.is_user_actionable() => {
            error!("{}", e);
            HookExitCode::ConfigError
        }
        Err(e) => {
            error!("{} hook failed: {}", action_name(action), e);
            HookExitCode::RuntimeError
        }
    }
}

fn action_name(action: HookAction) -> &'static str {
    match action {
        HookAction::Auth => "auth",
        HookAction::Cleanup => "cleanup",
    }
}
