use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ConfigOverrides;
use crate::types::SkillStatus;

#[derive(Parser, Debug, Clone)]
#[command(name = "roadmap")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"), long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Base URL of the roadmap service
    #[arg(long, global = true, env = "ROADMAP_API_URL")]
    pub api_url: Option<String>,

    /// Directory holding the session and config files
    #[arg(long, global = true, env = "ROADMAP_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Config file (defaults to <data-dir>/config.toml)
    #[arg(long, global = true, env = "ROADMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log request details to stderr
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

impl GlobalArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config.clone(),
            api_base_url: self.api_url.clone(),
            data_dir: self.data_dir.clone(),
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create an account
    Register(RegisterArgs),
    /// Log in and store the session
    Login(LoginArgs),
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List the available career goals
    Goals,
    /// Create a new roadmap (interactive unless goal and level are given)
    Setup(SetupArgs),
    /// Show progress and the skill timeline
    Dashboard(DashboardArgs),
    /// Change a skill's status by its status id
    Status(StatusArgs),
    /// List all of your roadmaps
    Roadmaps,
    /// Show or edit the configuration
    Config(ConfigArgs),
    /// Print version information
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
    #[arg(long, short)]
    pub username: String,

    #[arg(long, short)]
    pub email: Option<String>,

    /// Prompted for when omitted
    #[arg(long, env = "ROADMAP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    #[arg(long, short)]
    pub username: String,

    /// Prompted for when omitted
    #[arg(long, env = "ROADMAP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SetupArgs {
    #[arg(long)]
    pub goal: Option<String>,

    #[arg(long)]
    pub level: Option<String>,

    /// Skill you already know (repeatable)
    #[arg(long = "skill")]
    pub skills: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DashboardArgs {
    /// Roadmap number as listed by `roadmaps`
    #[arg(long, default_value_t = 1)]
    pub roadmap: usize,

    /// Keep the dashboard open and update statuses from a menu
    #[arg(long, short, default_value_t = false)]
    pub interactive: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    pub status_id: i64,

    /// NOT_STARTED, IN_PROGRESS or COMPLETED
    pub status: SkillStatus,

    #[arg(long, default_value_t = 1)]
    pub roadmap: usize,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Edit and save the config file interactively
    #[arg(long, default_value_t = false)]
    pub edit: bool,
}
