//! Loadout CLI - manage agent tools and profiles from the terminal

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

use loadout_core::adapter::AdapterRegistry;
use loadout_core::profile::{JsonFileStore, Profile, ProfileBundle, ProfileEngine};
use loadout_core::{
    AdapterEnv, ConfigService, NormalizedTool, PlatformAdapter, PlatformId, ToolKind, ToolManager,
    ToolScope, ToolStatus,
};

#[derive(Parser)]
#[command(name = "loadout")]
#[command(about = "Loadout - agent tool and profile manager")]
#[command(version)]
struct Cli {
    /// Platform to target (auto-detected when omitted)
    #[arg(short, long, global = true)]
    platform: Option<String>,

    /// Project directory (defaults to current directory)
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tools across all scopes
    List {
        /// Restrict to one kind (skill, mcp, hook, command)
        #[arg(short, long)]
        kind: Option<String>,

        /// Restrict to one scope (user, project, local, managed)
        #[arg(short, long)]
        scope: Option<String>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Enable a tool
    Enable {
        /// Tool kind (skill, mcp, hook, command)
        kind: String,
        /// Tool name
        name: String,
        /// Scope to search (all writable scopes when omitted)
        #[arg(short, long)]
        scope: Option<String>,
    },
    /// Disable a tool
    Disable {
        kind: String,
        name: String,
        #[arg(short, long)]
        scope: Option<String>,
    },
    /// Remove a tool
    Remove {
        kind: String,
        name: String,
        #[arg(short, long)]
        scope: Option<String>,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Manage profiles
    Profile {
        #[command(subcommand)]
        action: ProfileCommands,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// List all profiles
    List,
    /// Create a new profile from the current tool states
    Create {
        /// Profile name
        name: String,
    },
    /// Switch to a profile, applying its tool states
    Switch {
        /// Profile name or ID; omit with --none to deactivate
        profile: Option<String>,
        /// Deactivate the current profile without changing tools
        #[arg(long)]
        none: bool,
    },
    /// Show profile details
    Show {
        profile: String,
    },
    /// Drop profile entries whose tools no longer exist
    Reconcile {
        profile: String,
    },
    /// Delete a profile
    Delete {
        profile: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Export a profile as a shareable bundle
    Export {
        profile: String,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Analyze a bundle against the live environment
    Import {
        /// Bundle file to analyze
        bundle: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let env = build_env(cli.project.clone())?;
    let registry = AdapterRegistry::with_defaults(&env);
    let adapter = select_adapter(&registry, cli.platform.as_deref())?;

    let service = ConfigService::new(data_dir(&env).join("backups"));
    let kv = JsonFileStore::new(data_dir(&env).join("profiles.json"));

    match cli.command {
        Commands::List { kind, scope, json } => {
            let manager = ToolManager::new(&service, adapter);
            let mut tools = match kind.as_deref() {
                Some(kind) => manager.list_tools(parse_kind(kind)?),
                None => manager.inventory(),
            };
            if let Some(scope) = scope.as_deref() {
                let scope = ToolScope::from_str(scope)?;
                tools.retain(|t| t.scope == scope);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&tools)?);
            } else {
                print_tools(&tools);
            }
        }
        Commands::Enable { kind, name, scope } => {
            toggle(&service, adapter, &kind, &name, scope.as_deref(), true)?;
        }
        Commands::Disable { kind, name, scope } => {
            toggle(&service, adapter, &kind, &name, scope.as_deref(), false)?;
        }
        Commands::Remove {
            kind,
            name,
            scope,
            force,
        } => {
            let tool = find_tool(&service, adapter, &kind, &name, scope.as_deref())?;
            if !force && !confirm(&format!("Remove {}?", tool.display_name()))? {
                println!("Cancelled.");
                return Ok(());
            }
            let manager = ToolManager::new(&service, adapter);
            let result = manager.delete_tool(&tool);
            if result.success {
                println!("Removed {}.", tool.display_name());
            } else {
                bail!(result.error.unwrap_or_else(|| "unknown error".into()));
            }
        }
        Commands::Profile { action } => {
            let engine = ProfileEngine::new(&service, adapter, &kv);
            run_profile_command(&engine, action)?;
        }
    }
    Ok(())
}

fn run_profile_command(engine: &ProfileEngine<'_>, action: ProfileCommands) -> Result<()> {
    match action {
        ProfileCommands::List => {
            let store = engine.load_store();
            if store.profiles.is_empty() {
                println!("No profiles.");
                return Ok(());
            }
            println!("Profiles:");
            for profile in &store.profiles {
                let active = if store.active_profile_id == Some(profile.id) {
                    " (active)"
                } else {
                    ""
                };
                println!(
                    "  {} - {} ({} tools){active}",
                    profile.id, profile.name, profile.tools.len()
                );
            }
        }
        ProfileCommands::Create { name } => {
            let profile = engine.create_profile(&name)?;
            println!(
                "Created profile '{}' with {} tools.",
                profile.name,
                profile.tools.len()
            );
        }
        ProfileCommands::Switch { profile, none } => {
            let id = match (profile, none) {
                (None, true) => None,
                (Some(profile), false) => Some(find_profile(engine, &profile)?.id),
                _ => bail!("pass a profile name, or --none to deactivate"),
            };
            let report = engine.switch_profile(id)?;
            println!(
                "Switched: {} toggled, {} skipped, {} failed.",
                report.toggled, report.skipped, report.failed
            );
            for error in &report.errors {
                eprintln!("  failed: {error}");
            }
        }
        ProfileCommands::Show { profile } => {
            let profile = find_profile(engine, &profile)?;
            println!("Profile: {}", profile.name);
            println!("ID: {}", profile.id);
            println!("Created: {}", profile.created_at);
            println!("Updated: {}", profile.updated_at);
            println!("Tools:");
            for entry in &profile.tools {
                let state = if entry.enabled { "enabled" } else { "disabled" };
                println!("  {} - {state}", entry.key);
            }
        }
        ProfileCommands::Reconcile { profile } => {
            let profile = find_profile(engine, &profile)?;
            let report = engine.reconcile_profile(profile.id)?;
            println!(
                "Reconciled '{}': {} valid, {} removed.",
                profile.name, report.valid, report.removed
            );
        }
        ProfileCommands::Delete { profile, force } => {
            let profile = find_profile(engine, &profile)?;
            if !force && !confirm(&format!("Delete profile '{}'?", profile.name))? {
                println!("Cancelled.");
                return Ok(());
            }
            engine.delete_profile(profile.id)?;
            println!("Deleted profile '{}'.", profile.name);
        }
        ProfileCommands::Export { profile, output } => {
            let profile = find_profile(engine, &profile)?;
            let bundle = engine.export_profile(profile.id)?;
            let payload = serde_json::to_string_pretty(&bundle)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, payload)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Exported '{}' to {}.", profile.name, path.display());
                }
                None => println!("{payload}"),
            }
        }
        ProfileCommands::Import { bundle } => {
            let payload = std::fs::read_to_string(&bundle)
                .with_context(|| format!("reading {}", bundle.display()))?;
            let bundle: ProfileBundle = serde_json::from_str(&payload)?;
            let analysis = engine.analyze_import(&bundle)?;
            println!(
                "Bundle '{}': {} matching, {} conflicting, {} missing.",
                bundle.profile.name,
                analysis.matching(),
                analysis.conflicting(),
                analysis.missing()
            );
            for item in &analysis.items {
                println!("  {} - {:?}", item.key, item.disposition);
            }
        }
    }
    Ok(())
}

/// Resolve the adapter environment, honoring `LOADOUT_HOME` for tests
fn build_env(project: Option<PathBuf>) -> Result<AdapterEnv> {
    let env = match std::env::var_os("LOADOUT_HOME") {
        Some(home) => AdapterEnv::new(PathBuf::from(home)),
        None => AdapterEnv::discover()?,
    };
    let project = match project {
        Some(project) => project,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    Ok(env.with_project_root(project))
}

fn data_dir(env: &AdapterEnv) -> PathBuf {
    env.home.join(".loadout")
}

fn select_adapter<'a>(
    registry: &'a AdapterRegistry,
    platform: Option<&str>,
) -> Result<&'a dyn PlatformAdapter> {
    match platform {
        Some(platform) => {
            let id = PlatformId::from_str(platform)?;
            registry
                .get(id)
                .ok_or_else(|| anyhow!("platform '{platform}' is not registered"))
        }
        None => Ok(registry.detect_active()?),
    }
}

fn parse_kind(kind: &str) -> Result<ToolKind> {
    match kind.to_lowercase().as_str() {
        "skill" => Ok(ToolKind::Skill),
        "mcp" | "mcp_server" | "server" => Ok(ToolKind::McpServer),
        "hook" => Ok(ToolKind::Hook),
        "command" | "prompt" => Ok(ToolKind::Command),
        other => bail!("unknown tool kind '{other}'"),
    }
}

fn find_tool(
    service: &ConfigService,
    adapter: &dyn PlatformAdapter,
    kind: &str,
    name: &str,
    scope: Option<&str>,
) -> Result<NormalizedTool> {
    let kind = parse_kind(kind)?;
    let mut tools = service.read_all_tools(adapter, kind);
    if let Some(scope) = scope {
        let scope = ToolScope::from_str(scope)?;
        tools.retain(|t| t.scope == scope);
    }
    let mut matches: Vec<NormalizedTool> =
        tools.into_iter().filter(|t| t.name == name).collect();
    match matches.len() {
        0 => bail!("no {} named '{name}' found", kind.display_name()),
        1 => Ok(matches.remove(0)),
        _ => {
            let scopes: Vec<String> = matches.iter().map(|t| t.scope.to_string()).collect();
            bail!(
                "'{name}' exists in several scopes ({}); pass --scope",
                scopes.join(", ")
            )
        }
    }
}

fn toggle(
    service: &ConfigService,
    adapter: &dyn PlatformAdapter,
    kind: &str,
    name: &str,
    scope: Option<&str>,
    enable: bool,
) -> Result<()> {
    let tool = find_tool(service, adapter, kind, name, scope)?;
    let manager = ToolManager::new(service, adapter);
    let result = manager.toggle_tool(&tool, enable);
    if result.success {
        let verb = if enable { "Enabled" } else { "Disabled" };
        println!("{verb} {}.", tool.display_name());
        Ok(())
    } else {
        bail!(result.error.unwrap_or_else(|| "unknown error".into()))
    }
}

fn find_profile(engine: &ProfileEngine<'_>, reference: &str) -> Result<Profile> {
    let store = engine.load_store();
    if let Ok(id) = Uuid::parse_str(reference) {
        if let Some(profile) = store.find(id) {
            return Ok(profile.clone());
        }
    }
    store
        .find_by_name(reference)
        .cloned()
        .ok_or_else(|| anyhow!("profile '{reference}' not found"))
}

fn print_tools(tools: &[NormalizedTool]) {
    if tools.is_empty() {
        println!("No tools found.");
        return;
    }
    println!(
        "{:<12} {:<10} {:<10} {:<30} NAME",
        "KIND", "SCOPE", "STATUS", "SOURCE"
    );
    for tool in tools {
        let status = match tool.status {
            ToolStatus::Enabled => "enabled",
            ToolStatus::Disabled => "disabled",
            ToolStatus::Warning => "warning",
            ToolStatus::Error => "error",
        };
        let source = tool
            .source
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!(
            "{:<12} {:<10} {:<10} {:<30} {}",
            tool.kind.display_name(),
            tool.scope,
            status,
            source,
            tool.name
        );
        if let Some(detail) = &tool.status_detail {
            println!("{:<12} {detail}", "");
        }
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
