use crate::app::summary::render_run;
use crate::core::engine::SyncEngine;
use crate::domain::model::Credentials;
use crate::domain::ports::RemoteApi;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use std::io::{BufRead, Write};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct RefreshOptions {
    pub apply: bool,
    pub once: bool,
    pub cooldown: Duration,
}

/// Decides whether another pass should run.
#[async_trait]
pub trait RefreshPrompt: Send {
    async fn refresh_requested(&mut self) -> std::io::Result<bool>;
}

/// "[Enter] Refresh, [0] Exit" on the terminal. End of input means exit.
///
/// The read happens on a blocking thread and keeps running if the loop is
/// cancelled; the binary exits the process instead of waiting for it.
pub struct StdinPrompt;

#[async_trait]
impl RefreshPrompt for StdinPrompt {
    async fn refresh_requested(&mut self) -> std::io::Result<bool> {
        let answer = tokio::task::spawn_blocking(|| {
            print!("\n[Enter] Refresh, [0] Exit: ");
            std::io::stdout().flush()?;
            read_line()
        })
        .await
        .map_err(std::io::Error::other)??;

        Ok(matches!(answer, Some(line) if line.trim() != "0"))
    }
}

/// Prints `message` and reads one trimmed line from stdin.
pub async fn prompt_line(message: &'static str) -> std::io::Result<Option<String>> {
    tokio::task::spawn_blocking(move || {
        print!("{}", message);
        std::io::stdout().flush()?;
        Ok(read_line()?.map(|line| line.trim().to_string()))
    })
    .await
    .map_err(std::io::Error::other)?
}

fn read_line() -> std::io::Result<Option<String>> {
    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line)?;
    Ok((read > 0).then_some(line))
}

/// Runs the pipeline, prints the summary, and repeats on request after the cool-down.
///
/// Returns the number of completed passes. A failed pass is reported and the
/// loop continues, except with `once` where the error is returned.
pub async fn run_refresh_loop<A, P, W>(
    engine: &SyncEngine<A>,
    credentials: &Credentials,
    options: &RefreshOptions,
    cancel: &CancellationToken,
    prompt: &mut P,
    out: &mut W,
) -> Result<usize>
where
    A: RemoteApi + ?Sized + 'static,
    P: RefreshPrompt,
    W: Write,
{
    let mut completed = 0usize;

    loop {
        match engine.run_once(credentials, options.apply, cancel).await {
            Ok(run) => {
                write!(out, "{}", render_run(&run))?;
                out.flush()?;
                completed += 1;
            }
            Err(SyncError::Cancelled) => {
                writeln!(out, "\nCancelled.")?;
                return Ok(completed);
            }
            Err(e) => {
                tracing::error!(
                    "❌ Sync failed: {} (Category: {:?}, Severity: {:?})",
                    e,
                    e.category(),
                    e.severity()
                );
                if options.once {
                    return Err(e);
                }
                writeln!(out)?;
                match &e {
                    SyncError::Collections(failures) => {
                        for failure in failures {
                            writeln!(out, "❌ {}", failure.user_friendly_message())?;
                        }
                    }
                    other => writeln!(out, "❌ {}", other.user_friendly_message())?,
                }
                writeln!(out, "💡 {}", e.recovery_suggestion())?;
            }
        }

        if options.once {
            return Ok(completed);
        }

        let again = tokio::select! {
            _ = cancel.cancelled() => false,
            answer = prompt.refresh_requested() => answer?,
        };
        if !again {
            return Ok(completed);
        }

        tracing::debug!("Waiting {:?} before refreshing", options.cooldown);
        tokio::select! {
            _ = cancel.cancelled() => return Ok(completed),
            _ = tokio::time::sleep(options.cooldown) => {}
        }
    }
}
