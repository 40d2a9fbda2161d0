use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dgen_application::sse;
use dgen_core::pacing::PacingPolicy;
use dgen_core::request::GenerationRequest;
use dgen_execution::{GenerationRunner, SessionEvent};
use tokio::sync::mpsc::UnboundedReceiver;

use super::with_status;
use crate::GenerateArgs;
use crate::bootstrap::AppBootstrap;

pub async fn run(
    app: &AppBootstrap,
    args: GenerateArgs,
    mut events: Option<UnboundedReceiver<SessionEvent>>,
) -> Result<()> {
    let image = match &args.image_file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read image {:?}", path))?,
        None => String::new(),
    };

    let source = app.fragment_source(args.script.as_deref()).await?;
    let mut usecase = app.generation_usecase(source)?;
    if args.no_pacing {
        usecase = usecase.with_pacing(PacingPolicy::disabled());
    }

    let request = GenerationRequest::new(args.prompt, args.diagram_type, args.project)
        .with_image(image);
    let prepared = usecase
        .prepare(&args.account, request)
        .await
        .map_err(with_status)?;

    let timeout = args
        .timeout
        .or(app.config.generation.stream_timeout_secs)
        .map(Duration::from_secs);
    let runner = GenerationRunner::new(Arc::new(usecase)).with_timeout(timeout);
    let mut handle = runner.spawn(prepared);

    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            item = handle.receiver.recv() => match item {
                Some(item) => {
                    stdout.write_all(sse::frame(&item)?.as_bytes())?;
                    stdout.flush()?;
                }
                None => break,
            },
            Some(event) = next_event(&mut events) => print_event(&event),
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, cancelling session");
                handle.cancel();
            }
        }
    }

    let result = handle.wait().await;
    if let Some(receiver) = events.as_mut() {
        while let Ok(event) = receiver.try_recv() {
            print_event(&event);
        }
    }

    let report = result.map_err(with_status)?;
    eprintln!(
        "Committed record {} ({} partial snapshots, balance {})",
        report.record_id, report.partial_messages, report.remaining_balance
    );
    Ok(())
}

async fn next_event(events: &mut Option<UnboundedReceiver<SessionEvent>>) -> Option<SessionEvent> {
    match events {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

fn print_event(event: &SessionEvent) {
    match serde_json::to_string(event) {
        Ok(line) => eprintln!("{}", line),
        Err(e) => tracing::warn!("Failed to serialize session event: {}", e),
    }
}
