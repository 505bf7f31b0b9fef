//! Command-line interface.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use taskdeck_domain::{LoginRequest, RegisterRequest, TaskCreate, TaskQuery, TaskStatus, TaskUpdate};
use taskdeck_infrastructure::{ClientConfig, ConfigError, parse_api_url};

use crate::context::{AppError, Taskdeck};
use crate::navigator::CliNavigator;
use crate::render;

/// Manage your tasks from the terminal
#[derive(Debug, Parser)]
#[command(name = "taskdeck", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./taskdeck.toml when present)
    #[arg(long, global = true, env = "TASKDECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// API base URL, overriding the configuration
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the session
    Login(LoginArgs),
    /// Create an account and sign in
    Register(RegisterArgs),
    /// End the session
    Logout,
    /// Show who is signed in
    Whoami,
    /// Work with tasks
    #[command(subcommand)]
    Tasks(TaskCommand),
    /// Show stored credentials and configuration
    Debug(DebugArgs),
}

/// Arguments of `login`.
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email
    #[arg(long)]
    pub email: String,
    /// Account password
    #[arg(long, env = "TASKDECK_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments of `register`.
#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Account email
    #[arg(long)]
    pub email: String,
    /// Account password
    #[arg(long, env = "TASKDECK_PASSWORD", hide_env_values = true)]
    pub password: String,
    /// Display name
    #[arg(long)]
    pub name: String,
}

/// Arguments of `debug`.
#[derive(Debug, Args)]
pub struct DebugArgs {
    /// Force an access-token refresh first
    #[arg(long)]
    pub refresh: bool,
    /// Wipe every stored credential
    #[arg(long, conflicts_with = "refresh")]
    pub clear: bool,
}

/// Task subcommands.
#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// List tasks, one page at a time
    List {
        /// Page number
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Only tasks with this status (open, in-progress, completed)
        #[arg(long)]
        status: Option<TaskStatus>,
        /// Search titles and descriptions
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one task
    Get {
        /// Task id
        id: String,
    },
    /// Create a task
    Create {
        /// Title
        #[arg(long)]
        title: String,
        /// Description
        #[arg(long)]
        description: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Initial status
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    /// Change fields of a task
    Update {
        /// Task id
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// New status
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    /// Delete a task
    Delete {
        /// Task id
        id: String,
    },
    /// Mark a task done, or not done
    Toggle {
        /// Task id
        id: String,
    },
    /// Show counts per status
    Stats,
}

impl Cli {
    /// Loads configuration, applying `--api-url` on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is missing or invalid.
    pub fn client_config(&self) -> Result<ClientConfig, AppError> {
        match (&self.api_url, ClientConfig::load(self.config.as_deref())) {
            (Some(url), Ok(mut config)) => {
                config.api_url = parse_api_url(url)?;
                Ok(config)
            }
            (Some(url), Err(ConfigError::MissingApiUrl)) => {
                Ok(ClientConfig::new(parse_api_url(url)?))
            }
            (_, result) => Ok(result?),
        }
    }
}

/// Runs one command and returns what to print.
///
/// # Errors
///
/// Returns the first failure; the caller prints its notice.
pub async fn execute(app: &Taskdeck, command: Command) -> Result<String, AppError> {
    match command {
        Command::Login(args) => {
            let user = app
                .auth
                .login(LoginRequest::new(args.email, args.password))
                .await?;
            Ok(format!("Logged in as {}", render::profile(&user)))
        }
        Command::Register(args) => {
            let user = app
                .auth
                .register(RegisterRequest::new(args.email, args.password, args.name))
                .await?;
            Ok(format!("Account created. Logged in as {}", render::profile(&user)))
        }
        Command::Logout => {
            app.auth.logout().await?;
            Ok("Logged out".to_string())
        }
        Command::Whoami => match app.auth.restore().await? {
            Some(user) => Ok(render::profile(&user)),
            None => Err(AppError::NotLoggedIn),
        },
        Command::Tasks(command) => {
            if app.auth.restore().await?.is_none() {
                return Err(AppError::NotLoggedIn);
            }
            run_task_command(app, command).await
        }
        Command::Debug(args) => run_debug(app, &args).await,
    }
}

async fn run_task_command(app: &Taskdeck, command: TaskCommand) -> Result<String, AppError> {
    let tasks = &app.tasks;
    match command {
        TaskCommand::List {
            page,
            status,
            search,
        } => {
            let mut query = TaskQuery::dashboard(page);
            if let Some(status) = status {
                query = query.with_status(status);
            }
            if let Some(search) = search {
                query = query.with_search(search);
            }
            Ok(render::page(&tasks.list(&query).await?))
        }
        TaskCommand::Get { id } => Ok(render::task_detail(&tasks.get(&id).await?)),
        TaskCommand::Create {
            title,
            description,
            due,
            status,
        } => {
            let form = TaskCreate {
                description,
                due_date: due,
                status,
                ..TaskCreate::new(title)
            };
            let task = tasks.create(form).await?;
            Ok(format!("Created {}", render::task_line(&task)))
        }
        TaskCommand::Update {
            id,
            title,
            description,
            due,
            status,
        } => {
            let update = TaskUpdate {
                title,
                description,
                due_date: due,
                status,
            };
            if update.is_empty() {
                return Err(AppError::Usage("nothing to update".to_string()));
            }
            let task = tasks.update(&id, update).await?;
            Ok(format!("Updated {}", render::task_line(&task)))
        }
        TaskCommand::Delete { id } => {
            tasks.delete(&id).await?;
            Ok(format!("Deleted {id}"))
        }
        TaskCommand::Toggle { id } => Ok(render::task_line(&tasks.toggle(&id).await?)),
        TaskCommand::Stats => Ok(render::stats(&tasks.stats().await?)),
    }
}

async fn run_debug(app: &Taskdeck, args: &DebugArgs) -> Result<String, AppError> {
    if args.clear {
        app.clear_session().await?;
    }
    if args.refresh {
        app.refresh().await?;
    }
    let user = app.session().user().await?;
    let entries = app.session().snapshot().await?;
    Ok(render::debug_report(
        app.config().api_url.as_str(),
        user.as_ref(),
        &entries,
    ))
}

/// Parses the command line, wires the services and runs the command.
///
/// # Errors
///
/// Returns the failure of the command or of its setup.
pub async fn run(cli: Cli) -> Result<String, AppError> {
    let config = cli.client_config()?;
    let app = Taskdeck::connect(config, Arc::new(CliNavigator::new()))?;
    execute(&app, cli.command).await
}
