use anyhow::Context;
use clap::Parser;
use follow_sync::app::refresh::{prompt_line, run_refresh_loop, RefreshOptions, StdinPrompt};
use follow_sync::utils::error::{ErrorSeverity, SyncError};
use follow_sync::utils::logger;
use follow_sync::utils::validation::Validate;
use follow_sync::{load_credentials, CliConfig, GitHubClient, SyncEngine, SyncOptions};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn exit_with(e: &SyncError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }
    tracing::debug!("CLI config: {:?}", config);

    let settings = match config.resolve() {
        Ok(settings) => settings,
        Err(e) => exit_with(&e),
    };
    if let Err(e) = settings.validate() {
        exit_with(&e);
    }

    let username = match &config.username {
        Some(username) => username.clone(),
        None => prompt_line("Enter your GitHub username: ")
            .await
            .context("failed to read username")?
            .unwrap_or_default(),
    };

    let credentials = match load_credentials(&username) {
        Ok(credentials) => credentials,
        Err(e) => exit_with(&e),
    };

    let remote = match GitHubClient::from_config(&settings) {
        Ok(client) => Arc::new(client),
        Err(e) => exit_with(&e),
    };
    let engine = SyncEngine::new_with_monitoring(
        remote,
        SyncOptions::from_config(&settings),
        config.monitor,
    );

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("🛑 Interrupt received, stopping after in-flight requests");
            ctrl_c.cancel();
        }
    });

    let options = RefreshOptions {
        apply: settings.apply,
        once: config.once,
        cooldown: settings.cooldown(),
    };
    if options.apply {
        tracing::info!("✏️ Apply mode: non-mutual follows will be changed");
    }

    let mut stdout = std::io::stdout();
    match run_refresh_loop(
        &engine,
        &credentials,
        &options,
        &cancel,
        &mut StdinPrompt,
        &mut stdout,
    )
    .await
    {
        Ok(runs) => tracing::info!("Finished after {} run(s)", runs),
        Err(e) => exit_with(&e),
    }

    // The blocking stdin read behind the refresh prompt cannot be cancelled,
    // and runtime shutdown would wait on it.
    if cancel.is_cancelled() {
        std::process::exit(130);
    }

    Ok(())
}
