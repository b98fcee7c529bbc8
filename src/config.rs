//! Configuration
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::db::schemas::{Category, Subcategory, RESOURCE_COLLECTION};
use crate::identity::toolkit::{ToolkitConfig, DEFAULT_ENDPOINT};
use crate::resources::ResourceFilter;

/// Vet1Stop resource directory and identity tooling
#[derive(Parser, Debug, Clone)]
#[command(name = "vet1stop")]
#[command(about = "Query the Vet1Stop resource directory and manage identity sessions")]
pub struct Args {
    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "vet1stop")]
    pub mongodb_db: String,

    /// Collection holding resource documents
    #[arg(long, env = "RESOURCES_COLLECTION", default_value = RESOURCE_COLLECTION)]
    pub resources_collection: String,

    /// Identity provider API key (required outside dev mode for auth commands)
    #[arg(long, env = "IDENTITY_API_KEY")]
    pub identity_api_key: Option<String>,

    /// Identity Toolkit base URL
    #[arg(long, env = "IDENTITY_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub identity_endpoint: String,

    /// Federated provider for interactive sign-in
    #[arg(long, env = "FEDERATED_PROVIDER_ID", default_value = "google.com")]
    pub federated_provider_id: String,

    /// Request URI reported when exchanging federated credentials
    #[arg(long, env = "FEDERATED_REQUEST_URI", default_value = "http://localhost")]
    pub federated_request_uri: String,

    /// Use the in-memory store and identity provider instead of remote services
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// JSON array of resource drafts loaded into the dev-mode store
    #[arg(long, env = "DEV_SEED_FILE")]
    pub dev_seed_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Listing criteria shared by `list`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(long, value_parser = parse_category)]
    pub category: Option<Category>,

    #[arg(long, value_parser = parse_subcategory)]
    pub subcategory: Option<Subcategory>,

    #[arg(long)]
    pub eligibility: Option<String>,

    /// Match records carrying any of these tags (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    #[arg(long)]
    pub featured: Option<bool>,

    #[arg(long)]
    pub search: Option<String>,
}

impl From<FilterArgs> for ResourceFilter {
    fn from(args: FilterArgs) -> Self {
        ResourceFilter {
            category: args.category,
            subcategory: args.subcategory,
            eligibility: args.eligibility,
            tags: if args.tags.is_empty() {
                None
            } else {
                Some(args.tags)
            },
            featured: args.featured,
            search: args.search,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List resources matching a filter
    List(FilterArgs),
    /// Fetch one resource by ID
    Get { id: String },
    /// Featured resources, optionally within a category
    Featured {
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,
    },
    /// Text search over title and description
    Search { text: String },
    /// Resources in a category, optionally narrowed to a subcategory
    Category {
        #[arg(value_parser = parse_category)]
        category: Category,
        #[arg(value_parser = parse_subcategory)]
        subcategory: Option<Subcategory>,
    },
    /// Up to three resources related to the given one
    Related { id: String },
    /// Import resources from a JSON array file
    Import { file: PathBuf },
    /// Sign in with email and password
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long, env = "VET1STOP_PASSWORD")]
        password: String,
    },
    /// Create an account with email and password
    SignUp {
        #[arg(long)]
        email: String,
        #[arg(long, env = "VET1STOP_PASSWORD")]
        password: String,
    },
    /// Sign in through the federated provider's consent flow
    SignInFederated,
    /// Sign out of the current session
    SignOut,
}

impl Command {
    pub fn needs_identity(&self) -> bool {
        matches!(
            self,
            Command::SignIn { .. }
                | Command::SignUp { .. }
                | Command::SignInFederated
                | Command::SignOut
        )
    }
}

fn parse_category(s: &str) -> Result<Category, String> {
    s.parse().map_err(|e: crate::types::DirectoryError| e.to_string())
}

fn parse_subcategory(s: &str) -> Result<Subcategory, String> {
    s.parse().map_err(|e: crate::types::DirectoryError| e.to_string())
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.command.needs_identity() && self.identity_api_key.is_none() {
            return Err("IDENTITY_API_KEY is required unless DEV_MODE is set".to_string());
        }
        Ok(())
    }

    /// Identity Toolkit settings, when an API key is configured
    pub fn toolkit_config(&self) -> Option<ToolkitConfig> {
        self.identity_api_key.as_ref().map(|key| ToolkitConfig {
            api_key: key.clone(),
            endpoint: self.identity_endpoint.clone(),
            federated_provider_id: self.federated_provider_id.clone(),
            request_uri: self.federated_request_uri.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_args_into_filter() {
        let args = Args::try_parse_from([
            "vet1stop",
            "--dev-mode",
            "list",
            "--category",
            "life-leisure",
            "--tag",
            "fishing",
            "--tag",
            "parks",
        ])
        .unwrap();

        let Command::List(filter_args) = args.command else {
            panic!("expected list");
        };
        let filter = ResourceFilter::from(filter_args);
        assert_eq!(filter.category, Some(Category::LifeLeisure));
        assert_eq!(filter.tags, Some(vec!["fishing".to_string(), "parks".to_string()]));
        assert_eq!(filter.search, None);
    }

    #[test]
    fn test_rejects_unknown_category() {
        assert!(Args::try_parse_from(["vet1stop", "featured", "--category", "sports"]).is_err());
    }

    #[test]
    fn test_auth_commands_need_api_key() {
        let args = Args::try_parse_from(["vet1stop", "sign-out"]).unwrap();
        if args.identity_api_key.is_none() {
            assert!(args.validate().is_err());
        }

        let dev = Args::try_parse_from(["vet1stop", "--dev-mode", "sign-out"]).unwrap();
        assert!(dev.validate().is_ok());
    }
}
