use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;
use std::path::PathBuf;

use crate::entity::{EntityKind, MediaCollection};

#[derive(Parser)]
#[command(name = "kcadmin")]
#[command(about = "Manage users, roles, subscriptions and logs of a KeepConnect backend")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// How a command prints its result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputOptions {
    pub json: bool,
}

impl From<bool> for OutputOptions {
    fn from(json: bool) -> Self {
        Self { json }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the bearer token
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password (default: $KEEPCONNECT_PASSWORD)
        #[arg(short, long)]
        password: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Forget the stored token
    Logout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the signed-in account
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask the backend to email a password reset link
    ForgotPassword {
        /// Account email
        email: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List records as a paginated table
    #[command(visible_alias = "ls")]
    List {
        /// Collection to list
        entity: EntityKind,

        /// Case-insensitive search term
        #[arg(short, long)]
        search: Option<String>,

        /// Tab filter (logs: all|sms|whatsapp, transactions: all|credited|debited, media: all|poster|video)
        #[arg(short, long)]
        tab: Option<String>,

        /// Page to show, starting at 1 (clamped to the last page)
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Rows per page (default: config page_size)
        #[arg(long, value_parser = parse_page_size)]
        page_size: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one record
    #[command(visible_alias = "s")]
    Show {
        entity: EntityKind,

        /// Record ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a record from field assignments
    #[command(visible_alias = "c")]
    Create {
        entity: EntityKind,

        /// Field assignment, repeatable (e.g. --set name=Ada --set permissions="View Users,Edit Users")
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update fields of an existing record
    Update {
        entity: EntityKind,

        /// Record ID
        id: String,

        /// Field assignment, repeatable
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment, required = true)]
        fields: Vec<(String, String)>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a record
    #[command(visible_alias = "rm")]
    Delete {
        entity: EntityKind,

        /// Record ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Flip a record's status (users, subscriptions: active; transactions: credited/debited)
    Toggle {
        entity: EntityKind,

        /// Record ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Upload an image or video to the media library
    Upload {
        /// File to upload
        file: PathBuf,

        /// poster or video (default: inferred from the file extension)
        #[arg(long)]
        collection: Option<MediaCollection>,

        /// Title (default: file name without extension)
        #[arg(long)]
        title: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for [possible values: bash, zsh, fish, powershell, elvish]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration (token masked)
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set a configuration value
    Set {
        /// api_url, page_size, timeout_secs or auth.token
        key: String,

        value: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Execute the command, dispatching to the appropriate handler.
    pub async fn run(self) -> crate::error::Result<()> {
        use crate::commands::{
            cmd_config_set, cmd_config_show, cmd_create, cmd_delete, cmd_forgot_password,
            cmd_list, cmd_login, cmd_logout, cmd_show, cmd_toggle, cmd_update, cmd_upload,
            cmd_whoami, ListOptions,
        };

        match self {
            Commands::Login {
                email,
                password,
                json,
            } => cmd_login(&email, password, json.into()).await,
            Commands::Logout { json } => cmd_logout(json.into()),
            Commands::Whoami { json } => cmd_whoami(json.into()).await,
            Commands::ForgotPassword { email, json } => {
                cmd_forgot_password(&email, json.into()).await
            }
            Commands::List {
                entity,
                search,
                tab,
                page,
                page_size,
                json,
            } => {
                cmd_list(
                    entity,
                    ListOptions {
                        search,
                        tab,
                        page,
                        page_size,
                    },
                    json.into(),
                )
                .await
            }
            Commands::Show { entity, id, json } => cmd_show(entity, &id, json.into()).await,
            Commands::Create {
                entity,
                fields,
                json,
            } => cmd_create(entity, &fields, json.into()).await,
            Commands::Update {
                entity,
                id,
                fields,
                json,
            } => cmd_update(entity, &id, &fields, json.into()).await,
            Commands::Delete { entity, id, json } => cmd_delete(entity, &id, json.into()).await,
            Commands::Toggle { entity, id, json } => cmd_toggle(entity, &id, json.into()).await,
            Commands::Upload {
                file,
                collection,
                title,
                json,
            } => cmd_upload(&file, collection, title, json.into()).await,
            Commands::Config { action } => match action {
                ConfigAction::Show { json } => cmd_config_show(json.into()),
                ConfigAction::Set { key, value, json } => {
                    cmd_config_set(&key, &value, json.into())
                }
            },
            Commands::Completions { shell } => {
                generate_completions(shell);
                Ok(())
            }
        }
    }
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("Invalid assignment '{s}'. Expected FIELD=VALUE")),
    }
}

fn parse_page_size(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("Invalid page size '{s}'. Must be a positive integer")),
    }
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "kcadmin", &mut io::stdout());
}
