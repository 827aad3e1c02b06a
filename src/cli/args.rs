//! CLI argument structures

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Drive CrucibAI build sessions from the terminal
#[derive(Parser)]
#[command(name = "crucibai")]
#[command(about = "crucibai - Generate, version and ship apps with CrucibAI", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend URL, overrides the configuration
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the bearer token
    Login {
        email: String,

        /// Password; falls back to CRUCIBAI_PASSWORD, then stdin
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored token
    Logout,

    /// Show the signed-in account
    Whoami,

    /// Interactive build session (default command)
    Session {
        /// Start from a bundle written by `:export` instead of the template
        #[arg(long, value_name = "FILE")]
        from: Option<PathBuf>,

        /// Persist versions to this JSONL file
        #[arg(long, value_name = "FILE")]
        ledger: Option<PathBuf>,

        /// Model to request (auto, gpt-4o, claude, gemini)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Follow the build progress of a project
    Watch {
        project: String,

        /// Force a transport (auto, push, poll)
        #[arg(long)]
        transport: Option<String>,
    },

    /// Download the deploy archive of a finished build
    Export {
        project: String,

        /// Destination file (default: <project>.zip)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Deploy a finished build
    Deploy {
        project: String,

        /// Hosting provider (vercel, netlify)
        #[arg(long, default_value = "vercel")]
        provider: String,
    },
}
