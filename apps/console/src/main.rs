mod config;
mod views;

use std::{io::Write as _, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    people::{MenuItem, MenuOutcome, Notice, NoticeKind, RemovalOutcome, RoleChangeOutcome},
    Dispatcher, PeopleClientSettings, PeopleManagementController, PluginClientSettings,
    PluginStore, PluginStoreEvent, PluginWpOrgClient, WpComPeopleClient,
};
use shared::domain::{LocalSiteId, PersonId, Site, SiteId};
use storage::Storage;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use crate::{config::Settings, views::TerminalViews};

#[derive(Parser, Debug)]
#[command(about = "Site people and plugin directory console")]
struct Cli {
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch plugin details from the plugin directory.
    PluginInfo { slug: String },
    Sites {
        #[command(subcommand)]
        command: SitesCommand,
    },
    People {
        /// Local site id; falls back to the configured one.
        #[arg(long)]
        site: Option<i64>,
        #[command(subcommand)]
        command: PeopleCommand,
    },
}

#[derive(Subcommand, Debug)]
enum SitesCommand {
    Add {
        local_id: i64,
        name: String,
        url: String,
        #[arg(long)]
        site_id: Option<i64>,
    },
    List,
}

#[derive(Subcommand, Debug)]
enum PeopleCommand {
    Refresh,
    List,
    SetRole {
        person_id: i64,
        role: String,
    },
    Remove {
        person_id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = config::load_settings();
    if let Some(database_url) = cli.database_url {
        settings.database_url = database_url;
    }

    match cli.command {
        Command::PluginInfo { slug } => plugin_info(&settings, &slug).await,
        Command::Sites { command } => {
            let storage = open_storage(&settings).await?;
            sites(&storage, command).await
        }
        Command::People { site, command } => {
            let storage = open_storage(&settings).await?;
            let Some(local_id) = site.or(settings.local_site_id) else {
                bail!("no site selected; pass --site or set APP__LOCAL_SITE_ID");
            };
            people(&settings, storage, LocalSiteId(local_id), command).await
        }
    }
}

async fn open_storage(settings: &Settings) -> Result<Storage> {
    let database_url = config::normalize_database_url(&settings.database_url);
    tracing::info!(%database_url, "opening database");
    let storage = Storage::new(&database_url).await?;
    storage.health_check().await?;
    Ok(storage)
}

async fn plugin_info(settings: &Settings, slug: &str) -> Result<()> {
    let dispatcher = Dispatcher::new();
    let store = Arc::new(PluginStore::new());
    let mut events = store.subscribe_events();
    let store_task = tokio::spawn(store.clone().run(dispatcher.subscribe()));

    let client = PluginWpOrgClient::new(
        dispatcher,
        PluginClientSettings {
            api_url: settings.wporg_api_url.clone(),
            ..PluginClientSettings::default()
        },
    )?;
    let payload = client.fetch_plugin_info(slug).await;

    match tokio::time::timeout(Duration::from_secs(5), events.recv()).await {
        Ok(Ok(PluginStoreEvent::PluginInfoChanged { slug })) => {
            tracing::debug!(%slug, cached = store.plugin(&slug).await.is_some(), "store updated");
        }
        Ok(Ok(PluginStoreEvent::PluginInfoFetchFailed(err))) => {
            tracing::debug!(%err, "store recorded failure");
        }
        Ok(Err(err)) => tracing::warn!(%err, "plugin store event stream ended"),
        Err(_) => tracing::warn!("plugin store did not observe the fetch"),
    }

    drop(client);
    store_task.await.context("plugin store task failed")?;

    println!("{}", serde_json::to_string_pretty(&payload)?);
    if let Some(err) = payload.error() {
        bail!("plugin info fetch failed: {err}");
    }
    Ok(())
}

async fn sites(storage: &Storage, command: SitesCommand) -> Result<()> {
    match command {
        SitesCommand::Add {
            local_id,
            name,
            url,
            site_id,
        } => {
            storage
                .upsert_site(&Site {
                    local_id: LocalSiteId(local_id),
                    site_id: site_id.map(SiteId),
                    name,
                    url,
                    people_synced_at: None,
                })
                .await?;
            println!("saved site local_id={local_id}");
        }
        SitesCommand::List => {
            for site in storage.list_sites().await? {
                let remote = site
                    .site_id
                    .map(|id| id.0.to_string())
                    .unwrap_or_else(|| "-".into());
                println!("{:>6}  {:>12}  {}  {}", site.local_id.0, remote, site.name, site.url);
            }
        }
    }
    Ok(())
}

async fn people(
    settings: &Settings,
    storage: Storage,
    local_site_id: LocalSiteId,
    command: PeopleCommand,
) -> Result<()> {
    if let PeopleCommand::List = command {
        return print_people(&storage, local_site_id).await;
    }

    let Some(site) = storage.site(local_site_id).await? else {
        bail!("unknown local site {}; add it with `sites add`", local_site_id.0);
    };

    let service = WpComPeopleClient::new(PeopleClientSettings {
        api_url: settings.wpcom_api_url.clone(),
        token: settings.wpcom_token.clone(),
        ..PeopleClientSettings::default()
    })?;
    let views = TerminalViews::default();
    let mut controller = PeopleManagementController::new(
        Arc::new(service),
        Arc::new(storage.clone()),
        Arc::new(views.clone()),
    );
    let mut notices = controller.subscribe_notices();

    match command {
        PeopleCommand::List => {}
        PeopleCommand::Refresh => {
            if controller.activate(&site, None).await.is_none() {
                println!("site {} is not known remotely; nothing to refresh", site.name);
            }
        }
        PeopleCommand::SetRole { person_id, role } => {
            match controller
                .on_role_changed(PersonId(person_id), local_site_id, &role)
                .await
            {
                RoleChangeOutcome::Skipped => println!("role unchanged"),
                RoleChangeOutcome::Updated(person) => {
                    println!("{} is now {}", person.username, person.role);
                }
                RoleChangeOutcome::Failed => {}
            }
        }
        PeopleCommand::Remove { person_id, yes } => {
            let Some(person) = storage.person(PersonId(person_id), local_site_id).await? else {
                bail!("person {person_id} is not cached; run `people refresh` first");
            };
            controller.on_person_selected(&person);
            if views.take_detail_stale() {
                println!(
                    "{} ({}) role={}",
                    person.display_name, person.username, person.role
                );
            }

            if let MenuOutcome::ConfirmRemoval(prompt) =
                controller.on_menu_item(MenuItem::RemovePerson)
            {
                println!("{}", prompt.title);
                println!("{}", prompt.message);
                if yes || confirm(prompt.confirm_label, prompt.cancel_label)? {
                    match controller.remove_selected_person().await {
                        RemovalOutcome::LocalCleanupFailed => {
                            println!("person {person_id} is still cached locally; run `people refresh`");
                        }
                        RemovalOutcome::Failed => tracing::debug!(person_id, "removal failed"),
                        RemovalOutcome::Removed { .. } | RemovalOutcome::NothingSelected => {}
                    }
                } else {
                    controller.on_back_pressed();
                }
            }
        }
    }

    let failed = drain_notices(&mut notices);
    if views.take_list_stale() {
        print_people(&storage, local_site_id).await?;
    }
    if failed {
        bail!("operation failed");
    }
    Ok(())
}

fn confirm(confirm_label: &str, cancel_label: &str) -> Result<bool> {
    print!("{confirm_label}? [y/N] (anything else means {cancel_label}) ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

/// Prints pending notices and reports whether any of them was a failure.
fn drain_notices(notices: &mut broadcast::Receiver<Notice>) -> bool {
    let mut failed = false;
    while let Ok(notice) = notices.try_recv() {
        failed |= notice.kind != NoticeKind::PersonRemoved;
        println!("{}", notice.text);
    }
    failed
}

async fn print_people(storage: &Storage, local_site_id: LocalSiteId) -> Result<()> {
    let people = storage.list_people(local_site_id).await?;
    if people.is_empty() {
        println!("no people cached for local site {}", local_site_id.0);
    }
    for person in people {
        println!(
            "{:>10}  {:<20} {:<28} {}",
            person.person_id.0, person.username, person.display_name, person.role
        );
    }
    if let Some(synced_at) = storage.people_synced_at(local_site_id).await? {
        println!("synced at {}", synced_at.to_rfc3339());
    }
    Ok(())
}
