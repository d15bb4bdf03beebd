// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "caravel")]
#[command(about = "Deploy and tear down application delivery pipelines")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage deployment pipelines
    #[command(subcommand)]
    Pipeline(PipelineCommands),

    /// Manage applications
    #[command(subcommand)]
    App(AppCommands),
}

#[derive(Subcommand)]
pub enum PipelineCommands {
    /// Create or update the pipeline for the workspace
    Deploy {
        /// Application the pipeline belongs to
        #[arg(short, long)]
        app: Option<String>,

        /// Name of the pipeline to deploy
        #[arg(short, long)]
        name: Option<String>,

        /// Skip the redeploy confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Delete the pipeline associated with the workspace
    Delete {
        /// Application the pipeline belongs to
        #[arg(short, long)]
        app: Option<String>,

        /// Name of the pipeline to delete
        #[arg(short, long)]
        name: Option<String>,

        /// Skip the deletion confirmation prompt
        #[arg(long)]
        yes: bool,

        /// Also delete the legacy source access token without prompting
        #[arg(long)]
        delete_secret: bool,
    },
}

#[derive(Subcommand)]
pub enum AppCommands {
    /// Delete an application and everything it owns
    Delete {
        /// Name of the application to delete
        #[arg(short, long)]
        name: Option<String>,

        /// Skip the deletion confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}
