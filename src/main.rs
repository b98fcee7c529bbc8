//! Vet1Stop - resource directory and identity session CLI

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vet1stop::{
    config::{Args, Command, LogFormat},
    db::{schemas::ResourceDraft, MongoClient},
    identity::{
        AuthContext, IdentityProvider, MemoryIdentityProvider, PromptConsent,
        ToolkitIdentityProvider,
    },
    resources::{InMemoryResourceStore, MongoResourceStore, ResourceRepository, ResourceStore},
    DirectoryError,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("vet1stop={},info", args.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    match args.log_format {
        // Logs go to stderr so stdout stays machine-readable
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!(
        mode = if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" },
        "Vet1Stop starting"
    );

    let result = if args.command.needs_identity() {
        run_identity(&args).await
    } else {
        run_resources(&args).await
    };

    if let Err(e) = &result {
        if let Some(err) = e.downcast_ref::<DirectoryError>() {
            error!(code = err.code(), "{}", err);
        }
    }
    result
}

async fn run_resources(args: &Args) -> anyhow::Result<()> {
    let store = open_store(args).await?;
    let repository = ResourceRepository::new(store);

    match args.command.clone() {
        Command::List(filter) => print_json(&repository.list(&filter.into()).await?),
        Command::Get { id } => print_json(&repository.get_by_id(&id).await?),
        Command::Featured { category } => print_json(&repository.get_featured(category).await?),
        Command::Search { text } => print_json(&repository.search(&text).await?),
        Command::Category {
            category,
            subcategory,
        } => match subcategory {
            Some(subcategory) => {
                print_json(&repository.get_by_subcategory(category, subcategory).await?)
            }
            None => print_json(&repository.get_by_category(category).await?),
        },
        Command::Related { id } => print_json(&repository.get_related(&id).await?),
        Command::Import { file } => {
            let drafts = read_drafts(&file)?;
            let imported = repository.import(drafts).await?;
            info!(count = imported.len(), "Resources imported");
            print_json(&imported)
        }
        _ => anyhow::bail!("not a resource command"),
    }
}

async fn run_identity(args: &Args) -> anyhow::Result<()> {
    let provider = open_identity_provider(args)?;
    let auth = AuthContext::attach(provider);
    let manager = auth.manager()?;

    let initial = manager.resolved().await;
    info!(authenticated = initial.is_authenticated(), "Session resolved");

    let session = match args.command.clone() {
        Command::SignIn { email, password } => Some(auth.sign_in(&email, &password).await?),
        Command::SignUp { email, password } => Some(auth.sign_up(&email, &password).await?),
        Command::SignInFederated => Some(auth.sign_in_with_federated_provider().await?),
        Command::SignOut => {
            auth.sign_out().await?;
            None
        }
        _ => anyhow::bail!("not an identity command"),
    };

    // Report what a listener observes once the provider push has landed
    let mut watch = manager.watch();
    let observed = tokio::time::timeout(
        Duration::from_secs(5),
        watch.wait_for(|state| state.session() == session.as_ref()),
    )
    .await
    .context("Timed out waiting for session update")?
    .map(|state| state.clone())
    .context("Session manager stopped")?;

    manager.dispose();
    print_json(&observed)
}

async fn open_store(args: &Args) -> anyhow::Result<Arc<dyn ResourceStore>> {
    if args.dev_mode {
        let store = Arc::new(InMemoryResourceStore::new());
        if let Some(seed) = &args.dev_seed_file {
            let drafts = read_drafts(seed)?;
            let seeded = ResourceRepository::new(store.clone()).import(drafts).await?;
            info!(count = seeded.len(), "Dev store seeded");
        } else {
            warn!("Dev mode without DEV_SEED_FILE - resource store is empty");
        }
        return Ok(store as Arc<dyn ResourceStore>);
    }

    let client = MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await?;
    info!("MongoDB connected successfully");
    let store = MongoResourceStore::open(&client, Some(&args.resources_collection)).await?;
    Ok(Arc::new(store) as Arc<dyn ResourceStore>)
}

fn open_identity_provider(args: &Args) -> anyhow::Result<Arc<dyn IdentityProvider>> {
    if args.dev_mode {
        warn!("Dev mode - using in-memory identity provider");
        return Ok(Arc::new(MemoryIdentityProvider::new()) as Arc<dyn IdentityProvider>);
    }

    let config = args
        .toolkit_config()
        .ok_or_else(|| DirectoryError::Config("IDENTITY_API_KEY is not set".into()))?;
    let provider = ToolkitIdentityProvider::new(config, Arc::new(PromptConsent::stdio()))?;
    Ok(Arc::new(provider) as Arc<dyn IdentityProvider>)
}

fn read_drafts(path: &Path) -> anyhow::Result<Vec<ResourceDraft>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let drafts = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse resource drafts in {}", path.display()))?;
    Ok(drafts)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
