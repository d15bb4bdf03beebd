// ABOUTME: Entry point for the caravel CLI application.
// ABOUTME: Parses arguments, wires the backend into the commands, and dispatches.

mod cli;

use caravel::backend::{
    EnvDeleter, LocalBackend, LocalBucketEmptier, TaskDeleter, WorkloadDeleter,
};
use caravel::bucket::BucketEmptierProvider;
use caravel::commands::app_delete::{AppDelete, AppDeleteDeps, AppDeleteVars};
use caravel::commands::pipeline_delete::{PipelineDelete, PipelineDeleteDeps, PipelineDeleteVars};
use caravel::commands::pipeline_deploy::{PipelineDeploy, PipelineDeployDeps, PipelineDeployVars};
use caravel::commands::{
    AskExecutorProvider, Command, CommandProvider, Executor, ExecutorProvider,
    TaskExecutorProvider,
};
use caravel::deploy::StackDeployer;
use caravel::error::{NoAppInWorkspace, Result};
use caravel::secrets::SecretStore;
use caravel::store::{ConfigStore, WorkloadKind};
use caravel::term::{Progress, Prompter, Spinner, TermPrompter};
use caravel::workspace::{FsWorkspace, Workspace};
use clap::Parser;
use cli::{AppCommands, Cli, Commands, PipelineCommands};
use std::env;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Backend state file, kept inside the workspace directory.
const STATE_FILE: &str = ".local-state.json";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cwd = env::current_dir()?;
    let fs_ws = FsWorkspace::discover(&cwd)?;
    let backend = Arc::new(LocalBackend::open(fs_ws.dir().join(STATE_FILE))?);

    let ws: Arc<dyn Workspace> = Arc::new(fs_ws);
    let prompt: Arc<dyn Prompter> = Arc::new(TermPrompter);
    let progress: Arc<dyn Progress> = Arc::new(Spinner::new());
    let store: Arc<dyn ConfigStore> = backend.clone();
    let deployer: Arc<dyn StackDeployer> = backend.clone();
    let secrets: Arc<dyn SecretStore> = backend.clone();

    match cli.command {
        Commands::Pipeline(PipelineCommands::Deploy { app, name, yes }) => {
            let mut cmd = PipelineDeploy::new(
                PipelineDeployVars {
                    app_name: app,
                    name,
                    skip_confirmation: yes,
                },
                PipelineDeployDeps {
                    store,
                    deployer,
                    ws,
                    prompt,
                    progress,
                },
                backend.default_region(),
            );
            cmd.validate().await?;
            cmd.ask().await?;
            cmd.execute().await?;
            Ok(())
        }
        Commands::Pipeline(PipelineCommands::Delete {
            app,
            name,
            yes,
            delete_secret,
        }) => {
            let app_name = match app {
                Some(app) => app,
                None => ws.summary().map_err(|_| NoAppInWorkspace)?.application,
            };
            let mut cmd = PipelineDelete::new(
                PipelineDeleteVars {
                    app_name,
                    name,
                    skip_confirmation: yes,
                    should_delete_secret: delete_secret,
                },
                PipelineDeleteDeps {
                    store,
                    deployer,
                    secrets,
                    ws,
                    prompt,
                    progress,
                },
            );
            cmd.validate().await?;
            cmd.ask().await?;
            cmd.execute().await?;
            Ok(())
        }
        Commands::App(AppCommands::Delete { name, yes }) => {
            let app_name = match name {
                Some(name) => name,
                None => ws.summary().map_err(|_| NoAppInWorkspace)?.application,
            };

            let bucket_emptier: BucketEmptierProvider = {
                let backend = backend.clone();
                Box::new(move |region| {
                    Ok(Box::new(LocalBucketEmptier::new(backend.clone(), region)))
                })
            };
            let svc_delete: ExecutorProvider = {
                let backend = backend.clone();
                let app = app_name.clone();
                Box::new(move |name| {
                    Ok(Box::new(WorkloadDeleter::new(
                        backend.clone(),
                        app.clone(),
                        name,
                        WorkloadKind::Service,
                    )))
                })
            };
            let job_delete: ExecutorProvider = {
                let backend = backend.clone();
                let app = app_name.clone();
                Box::new(move |name| {
                    Ok(Box::new(WorkloadDeleter::new(
                        backend.clone(),
                        app.clone(),
                        name,
                        WorkloadKind::Job,
                    )))
                })
            };
            let task_delete: TaskExecutorProvider = {
                let backend = backend.clone();
                let app = app_name.clone();
                Box::new(move |env, task| {
                    Ok(Box::new(TaskDeleter::new(
                        backend.clone(),
                        app.clone(),
                        env,
                        task,
                    )))
                })
            };
            // The app-level confirmation already covers each environment, so
            // the per-environment prompt is skipped.
            let env_delete: AskExecutorProvider = {
                let backend = backend.clone();
                let prompt = prompt.clone();
                let app = app_name.clone();
                Box::new(move |env| {
                    Ok(Box::new(EnvDeleter::new(
                        backend.clone(),
                        prompt.clone(),
                        app.clone(),
                        env,
                        true,
                    )))
                })
            };
            // Same for the pipeline and its secret: delete both without
            // re-prompting.
            let pipeline_delete: CommandProvider = {
                let store = store.clone();
                let deployer = deployer.clone();
                let secrets = secrets.clone();
                let ws = ws.clone();
                let prompt = prompt.clone();
                let progress = progress.clone();
                let app = app_name.clone();
                Box::new(move || {
                    Ok(Box::new(PipelineDelete::new(
                        PipelineDeleteVars {
                            app_name: app.clone(),
                            name: None,
                            skip_confirmation: true,
                            should_delete_secret: true,
                        },
                        PipelineDeleteDeps {
                            store: store.clone(),
                            deployer: deployer.clone(),
                            secrets: secrets.clone(),
                            ws: ws.clone(),
                            prompt: prompt.clone(),
                            progress: progress.clone(),
                        },
                    )))
                })
            };

            let mut cmd = AppDelete::new(
                AppDeleteVars {
                    name: Some(app_name),
                    skip_confirmation: yes,
                },
                AppDeleteDeps {
                    store,
                    deployer,
                    ws,
                    prompt,
                    progress,
                    bucket_emptier,
                    svc_delete,
                    job_delete,
                    task_delete,
                    env_delete,
                    pipeline_delete,
                },
            );
            cmd.validate()?;
            cmd.ask()?;
            cmd.execute().await?;
            Ok(())
        }
    }
}
