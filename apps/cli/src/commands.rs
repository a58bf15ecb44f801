//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use contentforge_context::ContextCache;
use contentforge_delivery::AdapterRegistry;
use contentforge_pipeline::{ArtifactStore, RoutingTable, execute};
use contentforge_policy::{
    load_content_request, load_validated_brand_profile, validate_request,
};
use contentforge_shared::{
    AppConfig, BrandContextArtifact, FetchConfig, RunId, init_config, load_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ContentForge — compliance-gated content production.
#[derive(Parser)]
#[command(
    name = "contentforge",
    version,
    about = "Validate brand policy, build brand context, and produce routed content artifacts.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Validate a brand profile document.
    ValidateBrand {
        /// Path to the brand profile (TOML).
        brand: PathBuf,
    },

    /// Validate a content request against its brand profile.
    ValidateRequest {
        /// Path to the request document (TOML).
        request: PathBuf,

        /// Path to the brand profile (TOML).
        #[arg(long)]
        brand: PathBuf,
    },

    /// Build (or reuse) the cached brand context. Idempotent: unchanged
    /// sources are a cache hit with no re-fetch.
    BuildContext {
        /// Path to the brand profile (TOML).
        brand: PathBuf,

        /// Output root (defaults to the configured output_dir).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Run a request end to end: validate, route, execute, deliver.
    Run {
        /// Path to the request document (TOML).
        request: PathBuf,

        /// Path to the brand profile (TOML).
        #[arg(long)]
        brand: PathBuf,

        /// Output root (defaults to the configured output_dir).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Build the brand context if no cached artifact exists.
        #[arg(long)]
        build_context_if_missing: bool,

        /// Run identifier to use (defaults to a fresh UUID v7).
        #[arg(long)]
        run_id: Option<RunId>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "contentforge=info",
        1 => "contentforge=debug",
        _ => "contentforge=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::ValidateBrand { brand } => cmd_validate_brand(&brand).await,
        Command::ValidateRequest { request, brand } => {
            cmd_validate_request(&request, &brand).await
        }
        Command::BuildContext { brand, out } => cmd_build_context(&brand, out.as_deref()).await,
        Command::Run {
            request,
            brand,
            out,
            build_context_if_missing,
            run_id,
        } => {
            cmd_run(
                &request,
                &brand,
                out.as_deref(),
                build_context_if_missing,
                run_id,
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_validate_brand(brand_path: &Path) -> Result<()> {
    let brand = load_validated_brand_profile(brand_path)?;

    println!();
    println!("  Brand profile OK");
    println!("  Brand:       {}", brand.brand_id);
    println!("  Domains:     {}", brand.domains_supported.len());
    println!("  Topics:      {}", brand.topic_policy.allowlist.len());
    println!("  Sources:     {}", brand.brand_sources.sources.len());
    println!("  Disclaimers: {}", brand.disclaimer_policy.required().count());
    println!();
    Ok(())
}

async fn cmd_validate_request(request_path: &Path, brand_path: &Path) -> Result<()> {
    let brand = load_validated_brand_profile(brand_path)?;
    let request = load_content_request(request_path)?;
    validate_request(&request, &brand).into_result()?;

    println!();
    println!("  Request OK");
    println!("  Brand:   {}", request.brand_id);
    println!(
        "  Route:   {}/{}/{}",
        request.intent, request.form, request.delivery_target.channel
    );
    println!("  Publish: {}", request.publish_date);
    println!();
    Ok(())
}

async fn cmd_build_context(brand_path: &Path, out: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let brand = load_validated_brand_profile(brand_path)?;
    let output_root = resolve_output_root(&config, out)?;

    let cache = ContextCache::new(&output_root, FetchConfig::from(&config))?;
    let cached = cache.lookup(&brand)?.is_some();

    let spinner = spinner();
    spinner.set_message(if cached {
        "Checking cached brand context".to_string()
    } else {
        format!("Fetching {} brand sources", brand.brand_sources.sources.len())
    });
    let artifact = cache.get_or_build(&brand).await?;
    spinner.finish_and_clear();

    print_context_summary(&artifact, cached);
    Ok(())
}

async fn cmd_run(
    request_path: &Path,
    brand_path: &Path,
    out: Option<&Path>,
    build_context_if_missing: bool,
    run_id: Option<RunId>,
) -> Result<()> {
    let config = load_config()?;

    // Validation gates everything: no fetch or generation until both
    // documents pass.
    let brand = load_validated_brand_profile(brand_path)?;
    let request = load_content_request(request_path)?;
    validate_request(&request, &brand).into_result()?;

    let output_root = resolve_output_root(&config, out)?;
    let cache = ContextCache::new(&output_root, FetchConfig::from(&config))?;

    let context = if build_context_if_missing {
        let spinner = spinner();
        spinner.set_message("Building brand context");
        let artifact = cache.get_or_build(&brand).await?;
        spinner.finish_and_clear();
        artifact
    } else {
        cache.lookup(&brand)?.ok_or_else(|| {
            eyre!(
                "no cached context for brand '{}'; run `contentforge build-context` \
                 or pass --build-context-if-missing",
                brand.brand_id
            )
        })?
    };

    let table = RoutingTable::standard();
    let agent_set = table.route(request.intent, request.form, request.delivery_target.channel)?;

    let run_id = run_id.unwrap_or_default();
    info!(%run_id, brand_id = %brand.brand_id, "executing run");
    let artifact = execute(run_id, &request, &brand, &context, agent_set)?;

    // Persist before adapter matching so a delivery failure never loses
    // the generated artifact.
    let store = ArtifactStore::new(&output_root);
    let artifact_path = store.save(&artifact)?;

    let registry = AdapterRegistry::standard();
    let adapter = registry.match_adapter(&artifact)?;
    let rendered = adapter.render(&artifact)?;

    let delivery_dir = output_root.join("deliveries");
    std::fs::create_dir_all(&delivery_dir)?;
    let delivery_path = delivery_dir.join(&rendered.file_name);
    std::fs::write(&delivery_path, &rendered.body)?;

    println!();
    println!("  Run complete");
    println!("  Run ID:    {}", artifact.run_id);
    println!("  Route:     {}", artifact.route);
    println!("  Title:     {}", artifact.title);
    println!("  Adapter:   {}", rendered.adapter);
    println!("  Artifact:  {}", artifact_path.display());
    println!("  Delivery:  {}", delivery_path.display());
    println!();
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn print_context_summary(artifact: &BrandContextArtifact, cache_hit: bool) {
    println!();
    println!(
        "  Brand context {}",
        if cache_hit { "reused from cache" } else { "built" }
    );
    println!("  Brand:       {}", artifact.brand_id);
    println!("  Sources:     {}", artifact.sources.len());
    println!("  Fingerprint: {}", &artifact.fingerprint[..12.min(artifact.fingerprint.len())]);
    println!("  Built at:    {}", artifact.built_at.to_rfc3339());
    println!();
}

/// Resolve the output root: CLI flag beats config, `~` expands to home.
fn resolve_output_root(config: &AppConfig, out: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = out {
        return Ok(path.to_path_buf());
    }

    let configured = &config.defaults.output_dir;
    if let Some(rest) = configured.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or_else(|| eyre!("cannot determine home directory"))?;
        return Ok(home.join(rest));
    }
    Ok(PathBuf::from(configured))
}

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}
