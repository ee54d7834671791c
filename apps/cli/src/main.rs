use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use homepage_core::{Coordinator, Homepage, LaunchContext, Lifecycle, MemoryHost, UrlAction};
use serde::de::DeserializeOwned;
use settings::{HomepageData, JsonFileStore, MemorySettingsStore, Platform, SettingsStore};
use shared::domain::{DocumentMode, Kind, OpenMode, Periodicity, ViewPreference};
use tracing::info;

mod config;

use config::load_config;

#[derive(Parser, Debug)]
#[command(name = "homepage", about = "Inspect and simulate the vault homepage")]
struct Cli {
    #[arg(long, default_value = "homepage.toml")]
    config: PathBuf,
    /// Settings document to use instead of the configured one.
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Select the mobile profile.
    #[arg(long)]
    mobile: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the active homepage profile.
    Show,
    /// Change one setting and save the document.
    Set { field: Field, value: String },
    /// Rewrite a legacy settings document in the current schema.
    Migrate,
    /// Print the target the homepage currently resolves to.
    Resolve(VaultArgs),
    /// Run a launch against an in-memory workspace and print the result.
    Simulate(SimulateArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Field {
    Value,
    Kind,
    OpenOnStartup,
    OpenMode,
    ManualOpenMode,
    View,
    RevertView,
    OpenWhenEmpty,
    RefreshDataview,
    AutoCreate,
    AutoScroll,
    Pin,
    AlwaysApply,
    HideReleaseNotes,
    Commands,
    Interval,
    SeparateMobile,
}

#[derive(Args, Debug)]
struct VaultArgs {
    /// File present in the simulated vault; repeatable.
    #[arg(long = "file")]
    files: Vec<String>,
    /// Path returned for today's daily note.
    #[arg(long)]
    daily: Option<String>,
    /// Saved layout as `name=file1,file2`; repeatable.
    #[arg(long = "layout", value_parser = parse_layout)]
    layouts: Vec<(String, Vec<String>)>,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    #[command(flatten)]
    vault: VaultArgs,
    /// File already open in a pane when the application starts; repeatable.
    #[arg(long = "open")]
    open: Vec<String>,
    /// Also run a manual open after startup.
    #[arg(long)]
    manual: bool,
    /// Make the manual open keep existing panes.
    #[arg(long)]
    alternate: bool,
    /// Simulate a plugin reload instead of an application start.
    #[arg(long)]
    warm: bool,
    /// Action URL the application was started with, e.g. `open`.
    #[arg(long)]
    url_action: Option<String>,
    /// Parameter of the action URL as `key=value`; repeatable.
    #[arg(long = "url-param", value_parser = parse_key_value)]
    url_params: Vec<(String, String)>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli.config);
    if let Some(path) = cli.settings.clone() {
        config.settings_path = path;
    }
    config.mobile |= cli.mobile;

    tracing_subscriber::fmt()
        .with_env_filter(config.log_filter.as_str())
        .with_writer(std::io::stderr)
        .init();

    let platform = if config.mobile {
        Platform::Mobile
    } else {
        Platform::Desktop
    };
    let store = Arc::new(JsonFileStore::new(&config.settings_path));
    info!(path = %config.settings_path.display(), ?platform, "cli: using settings");

    match cli.command {
        Command::Show => {
            let homepage = Homepage::load(MemoryHost::new().host(), store, platform).await?;
            println!("profile: {}", homepage.name());
            println!("{}", serde_json::to_string_pretty(&homepage.data().await)?);
        }
        Command::Set { field, value } => {
            let homepage = Homepage::load(MemoryHost::new().host(), store, platform).await?;
            set_field(&homepage, field, &value).await?;
            println!("updated {field:?} on '{}'", homepage.name());
        }
        Command::Migrate => {
            let raw = store.load_raw().await?;
            let from = raw
                .as_ref()
                .and_then(|doc| doc.get("version"))
                .and_then(|version| version.as_u64());
            let settings = settings::from_json(raw)?;
            store.save(&settings).await?;
            println!(
                "settings version {} -> {}",
                from.map_or_else(|| "none".to_string(), |v| v.to_string()),
                settings.version
            );
        }
        Command::Resolve(vault) => {
            let memory = build_vault(&vault);
            let homepage = Homepage::load(memory.host(), in_memory(&store).await?, platform).await?;
            let data = homepage.data().await;
            if !homepage.has_required_feature().await {
                bail!("{} homepages need a host feature that is not available", data.kind);
            }
            let value = homepage.compute_value().await?;
            println!("{} -> {value}", data.kind);
        }
        Command::Simulate(args) => simulate(&store, platform, args).await?,
    }

    Ok(())
}

async fn set_field(homepage: &Homepage, field: Field, value: &str) -> Result<()> {
    match field {
        Field::Value => homepage.update(|data| data.set_value(value)).await?,
        Field::Kind => {
            let kind: Kind = parse_label(value)?;
            homepage.update(|data| data.kind = kind).await?;
        }
        Field::OpenMode | Field::ManualOpenMode => {
            let mode: OpenMode = parse_label(value)?;
            homepage
                .update(|data| match field {
                    Field::OpenMode => data.open_mode = mode,
                    _ => data.manual_open_mode = mode,
                })
                .await?;
        }
        Field::View => {
            let view: ViewPreference = parse_label(value)?;
            homepage.update(|data| data.view = view).await?;
        }
        Field::Commands => {
            let commands: Vec<String> = value
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
            homepage.update(|data| data.commands = commands).await?;
        }
        Field::Interval => {
            let minutes: u32 = value
                .parse()
                .with_context(|| format!("interval must be whole minutes, got '{value}'"))?;
            homepage
                .update_settings(|settings| settings.interval_time = Some(minutes))
                .await?;
        }
        Field::SeparateMobile => {
            let enabled = parse_bool(value)?;
            homepage
                .update_settings(|settings| settings.separate_mobile = enabled)
                .await?;
        }
        flag => {
            let enabled = parse_bool(value)?;
            homepage
                .update(|data| {
                    if let Some(slot) = flag_slot(data, flag) {
                        *slot = enabled;
                    }
                })
                .await?;
        }
    }
    Ok(())
}

fn flag_slot(data: &mut HomepageData, field: Field) -> Option<&mut bool> {
    Some(match field {
        Field::OpenOnStartup => &mut data.open_on_startup,
        Field::RevertView => &mut data.revert_view,
        Field::OpenWhenEmpty => &mut data.open_when_empty,
        Field::RefreshDataview => &mut data.refresh_index,
        Field::AutoCreate => &mut data.auto_create,
        Field::AutoScroll => &mut data.auto_scroll,
        Field::Pin => &mut data.pin,
        Field::AlwaysApply => &mut data.always_apply,
        Field::HideReleaseNotes => &mut data.hide_release_notes,
        _ => return None,
    })
}

async fn simulate(store: &Arc<JsonFileStore>, platform: Platform, args: SimulateArgs) -> Result<()> {
    let memory = build_vault(&args.vault);
    for path in &args.open {
        memory.open_pane(path);
    }
    memory.set_layout_ready();

    let homepage = Homepage::load(memory.host(), in_memory(store).await?, platform).await?;
    let mut context = if args.warm {
        LaunchContext::warm()
    } else {
        LaunchContext::cold_start()
    };
    if let Some(action) = args.url_action {
        context = context.with_url_action(UrlAction {
            action,
            params: args.url_params.into_iter().collect(),
        });
    }

    let handle = Coordinator::spawn(homepage.clone(), context);
    homepage
        .lifecycle()
        .wait_for(|state| *state == Lifecycle::Loaded)
        .await
        .context("homepage coordinator stopped before loading")?;

    if args.manual {
        let outcome = handle.open(args.alternate).await?;
        println!("manual open: {outcome:?}");
    }
    handle.shutdown().await?;

    if let Some(warning) = homepage.startup_warning().await {
        println!("warning: {warning}");
    }
    let active = memory.active();
    for pane in memory.panes() {
        let mode = match pane.document.mode {
            DocumentMode::Source if pane.document.source => "source",
            DocumentMode::Source => "live preview",
            DocumentMode::Preview => "reading",
        };
        println!(
            "{} pane {} [{}] {} ({mode}{})",
            if Some(pane.pane_id) == active { "*" } else { " " },
            pane.pane_id.0,
            pane.view_type,
            pane.file.as_deref().unwrap_or("-"),
            if pane.pinned { ", pinned" } else { "" },
        );
    }
    for notice in memory.notices() {
        println!("notice: {notice}");
    }
    for command in memory.executed_commands() {
        println!("command: {command}");
    }
    Ok(())
}

fn build_vault(args: &VaultArgs) -> Arc<MemoryHost> {
    let memory = MemoryHost::new();
    for path in &args.files {
        memory.add_file(path, "");
    }
    if let Some(path) = &args.daily {
        memory.set_periodic_note(Periodicity::Daily, path);
    }
    for (name, files) in &args.layouts {
        let files: Vec<&str> = files.iter().map(String::as_str).collect();
        memory.add_layout(name, &files);
    }
    memory
}

/// Copies the on-disk document into memory so simulations never write back.
async fn in_memory(store: &Arc<JsonFileStore>) -> Result<Arc<MemorySettingsStore>> {
    Ok(Arc::new(match store.load_raw().await? {
        Some(document) => MemorySettingsStore::with_document(document),
        None => MemorySettingsStore::new(),
    }))
}

fn parse_label<T: DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .with_context(|| format!("unrecognised option '{raw}'"))
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        other => Err(anyhow!("expected true or false, got '{other}'")),
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got '{raw}'"))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

fn parse_layout(raw: &str) -> Result<(String, Vec<String>)> {
    let (name, files) = parse_key_value(raw)?;
    let files = files
        .split(',')
        .map(str::trim)
        .filter(|file| !file.is_empty())
        .map(str::to_string)
        .collect();
    Ok((name, files))
}
