//! Command-line surface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "byod-ui")]
#[command(about = "Terminal front end for the BYOD local dashboard", version)]
pub struct Cli {
    /// Dashboard server URL (overrides config and BYOD_UI_URL)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Config file (default: ~/.byod/ui.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at info level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Platform authentication and tenant status
    Status,

    /// Local AWS credential status
    Aws,

    /// List available plugins and their inputs
    Plugins,

    /// Browse and retrieve jobs
    #[command(subcommand)]
    Jobs(JobsCommand),

    /// Encrypt and upload files, then submit a job
    Submit {
        /// Plugin to run
        #[arg(long, short)]
        plugin: String,

        /// Job description
        #[arg(long, short, default_value = "")]
        description: String,

        /// Plugin config as a JSON object
        #[arg(long)]
        config_json: Option<String>,

        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Tenant infrastructure setup
    #[command(subcommand)]
    Setup(SetupCommand),

    /// Saved platform profiles
    #[command(subcommand)]
    Profiles(ProfilesCommand),

    /// Show the active CLI configuration
    Config,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum JobsCommand {
    /// List recent jobs
    List {
        #[arg(long, default_value_t = 50)]
        limit: u32,

        /// Only jobs with this status
        #[arg(long)]
        status: Option<String>,

        /// Only jobs for this plugin
        #[arg(long)]
        plugin: Option<String>,
    },

    /// Show one job
    Show { job_id: String },

    /// Download and decrypt results for a completed job
    Get { job_id: String },

    /// List decrypted result files
    Results { job_id: String },

    /// Print or save one result file
    File {
        job_id: String,

        /// Path relative to the job's output directory
        path: String,

        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum SetupCommand {
    /// Show what is configured
    Status,

    /// Provision the KMS key and cross-account role
    Run {
        #[arg(long, default_value = "us-east-1")]
        region: String,

        /// Create new resources even if some exist
        #[arg(long)]
        force_new: bool,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ProfilesCommand {
    List,
    Activate { name: String },
}
