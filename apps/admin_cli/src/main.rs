mod config;

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    CheckInError, CheckInOutcome, FilterValue, HttpRegistrationStore, PageError, PageView,
    RegistrationFilters, RegistrationPortal, StaticSession,
};
use shared::domain::{Gender, Registration, RegistrationId};
use tracing_subscriber::EnvFilter;

use crate::config::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(about = "Event registration admin console")]
struct Cli {
    #[arg(long, default_value = "admin.toml")]
    config: PathBuf,
    #[arg(long)]
    backend_url: Option<String>,
    #[arg(long)]
    token: Option<String>,
    /// 1-based page of the table to print.
    #[arg(long, default_value_t = 1)]
    page: usize,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List,
    Search {
        text: String,
    },
    Filter {
        #[arg(long, default_value = "all")]
        gender: FilterValue<Gender>,
        #[arg(long, value_delimiter = ',')]
        profession: Vec<String>,
        #[arg(long, default_value = "all")]
        checked_in: FilterValue<bool>,
        #[arg(long, default_value = "all")]
        newsletter: FilterValue<bool>,
    },
    Show {
        id: String,
    },
    /// Accepts a raw id or the text scanned from an attendee QR code.
    CheckIn {
        input: String,
    },
    Qr {
        id: String,
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    let portal = build_portal(&settings)?;

    match cli.command {
        Command::List => {
            load_table(&portal, TableQuery::All).await?;
            print_table(&portal, cli.page).await;
        }
        Command::Search { text } => {
            load_table(&portal, TableQuery::Search(text)).await?;
            print_table(&portal, cli.page).await;
        }
        Command::Filter {
            gender,
            profession,
            checked_in,
            newsletter,
        } => {
            let filters = RegistrationFilters {
                gender,
                checked_in,
                newsletter_sub: newsletter,
                ..RegistrationFilters::default()
            }
            .with_professions(profession);
            load_table(&portal, TableQuery::Filtered(filters)).await?;
            print_table(&portal, cli.page).await;
        }
        Command::Show { id } => {
            load_table(&portal, TableQuery::All).await?;
            let id = RegistrationId::new(id);
            let registration = portal
                .open_detail(&id)
                .await
                .ok_or_else(|| anyhow!("no registration with id {id}"))?;
            print_detail(&registration);
        }
        Command::CheckIn { input } => {
            load_table(&portal, TableQuery::All).await?;
            match portal.check_in_scanned(&input).await {
                Ok(CheckInOutcome::CheckedIn { id, checked_in_at }) => {
                    println!("{}", client_core::checkin::CHECK_IN_SUCCESS_MESSAGE);
                    println!("{id} checked in at {}", checked_in_at.to_rfc3339());
                }
                Ok(CheckInOutcome::AlreadyCheckedIn) => {
                    println!("Attendee is already checked in.");
                }
                Err(CheckInError::EmptyScan) => bail!("scanned value did not contain an id"),
                Err(CheckInError::Store(err)) => {
                    if err.requires_reauth() {
                        bail!(session_expired_hint());
                    }
                    bail!("{}: {err}", client_core::checkin::CHECK_IN_FAILURE_MESSAGE);
                }
            }
        }
        Command::Qr { id, out } => {
            let id = RegistrationId::new(id);
            let code = portal
                .view_qr(&id)
                .await
                .context("Error fetching QR Code")?;
            let image = code.decode()?;
            tokio::fs::write(&out, &image.bytes)
                .await
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!(
                "wrote {} ({}, {} bytes)",
                out.display(),
                image.mime_type,
                image.bytes.len()
            );
        }
    }

    Ok(())
}

fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = load_settings(&cli.config)?;
    if let Some(url) = &cli.backend_url {
        settings.backend_url = url.clone();
    }
    if let Some(token) = &cli.token {
        settings.token = Some(token.clone());
    }
    settings.validate()?;
    Ok(settings)
}

fn build_portal(settings: &Settings) -> Result<Arc<RegistrationPortal>> {
    let store = HttpRegistrationStore::new(&settings.backend_url)?;
    let session = match &settings.token {
        Some(token) => StaticSession::new(token.clone()),
        None => StaticSession::anonymous(),
    };
    Ok(RegistrationPortal::with_options(
        Arc::new(store),
        Arc::new(session),
        settings.portal_options(),
    ))
}

enum TableQuery {
    All,
    Search(String),
    Filtered(RegistrationFilters),
}

/// Loads the denominator alongside the table query and waits for the table
/// to settle.
async fn load_table(portal: &Arc<RegistrationPortal>, query: TableQuery) -> Result<()> {
    let table = async {
        match query {
            TableQuery::All => portal.retry().await,
            TableQuery::Search(text) => portal.set_search(text).await,
            TableQuery::Filtered(filters) => portal.set_filters(filters).await,
        };
        portal.settle().await
    };
    let ((), settled) = tokio::join!(portal.load_denominator(), table);

    match settled {
        Ok(()) => Ok(()),
        Err(PageError::SessionExpired) => bail!(session_expired_hint()),
        Err(PageError::Message(message)) => bail!("Error: {message}"),
    }
}

fn session_expired_hint() -> &'static str {
    "Session expired. Please log in again and pass a fresh --token."
}

async fn print_table(portal: &RegistrationPortal, page: usize) {
    for _ in 1..page.max(1) {
        portal.next_page().await;
    }
    let view = portal.page().await;
    let input = portal.query_input().await;
    if input.filters.is_active() {
        println!("{}", portal.summary().await.label());
    }
    print_rows(&view);
}

fn print_rows(view: &PageView<Registration>) {
    if view.is_empty_state() {
        println!("No registrations found.");
        return;
    }

    println!(
        "{:<36}  {:<28}  {:<32}  {:<18}  {:<10}  {}",
        "ID", "NAME", "EMAIL", "GENDER", "STATUS", "CHECKED IN"
    );
    for registration in &view.rows {
        println!(
            "{:<36}  {:<28}  {:<32}  {:<18}  {:<10}  {}",
            registration.id,
            registration.full_name(),
            registration.email,
            registration.gender,
            registration.status.as_str(),
            if registration.checked_in { "yes" } else { "no" }
        );
    }

    if let Some(label) = view.range_label() {
        println!("{label}");
    }
    if view.has_pagination() {
        println!("Page {} of {}", view.page_index, view.total_pages);
    }
}

fn print_detail(registration: &Registration) {
    println!("{} <{}>", registration.full_name(), registration.email);
    println!("  id:            {}", registration.id);
    println!("  gender:        {}", registration.gender);
    println!("  location:      {}", registration.location);
    println!("  profession:    {}", registration.profession.join(", "));
    if let Some(interests) = &registration.interests {
        println!("  interests:     {interests}");
    }
    println!("  status:        {}", registration.status.as_str());
    println!("  newsletter:    {}", registration.newsletter_sub);
    match registration.check_in_time {
        Some(at) => println!("  checked in:    {}", at.to_rfc3339()),
        None => println!("  checked in:    no"),
    }
    println!("  registered at: {}", registration.created_at.to_rfc3339());
}
