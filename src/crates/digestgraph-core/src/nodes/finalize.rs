//! `finalize_on_failure` (spec.md §7, SPEC_FULL.md §4.3 expansion): the
//! terminal node reached via the `on_error` conditional edge. Writes a
//! minimal HTML/JSON pair listing `SharedState.errors` from whatever
//! partial state survived, so the "some output was always written" exit
//! status rule holds even when a fatal error aborts the run early.

use std::sync::Arc;

use crate::engine::{BoxFuture, NodeFn, NodeOutcome};
use crate::error::Result as CoreResult;
use crate::nodes::context::PipelineContext;
use crate::state::SharedState;

pub fn node(ctx: Arc<PipelineContext>) -> NodeFn {
    Arc::new(move |state: SharedState| {
        let ctx = Arc::clone(&ctx);
        Box::pin(run(ctx, state)) as BoxFuture<'static, CoreResult<NodeOutcome>>
    })
}

async fn run(ctx: Arc<PipelineContext>, mut state: SharedState) -> CoreResult<NodeOutcome> {
    let output_dir = &ctx.config.output_dir;
    if let Err(err) = tokio::fs::create_dir_all(output_dir).await {
        tracing::error!(error = %err, "finalize_on_failure could not create output directory");
        return Ok(NodeOutcome::ok(state));
    }

    let stamp = state.started_at.format("%Y%m%dT%H%M%SZ");
    let html_path = output_dir.join(format!("newsletter_{stamp}_failed.html"));
    let json_path = output_dir.join(format!("run_results_{stamp}_failed.json"));

    let html = render_failure_html(&state);
    if let Err(err) = tokio::fs::write(&html_path, html).await {
        tracing::error!(error = %err, "finalize_on_failure failed to write partial html");
    } else {
        state.outputs.html_path = Some(html_path.display().to_string());
    }

    match serde_json::to_string_pretty(&state) {
        Ok(json) => {
            if let Err(err) = tokio::fs::write(&json_path, json).await {
                tracing::error!(error = %err, "finalize_on_failure failed to write partial json");
            } else {
                state.outputs.json_path = Some(json_path.display().to_string());
            }
        }
        Err(err) => tracing::error!(error = %err, "finalize_on_failure could not serialize partial state"),
    }

    Ok(NodeOutcome::ok(state))
}

fn render_failure_html(state: &SharedState) -> String {
    let errors: String = state
        .errors
        .iter()
        .map(|e| format!("<li><strong>{}</strong>{}: {}</li>", e.stage, e.topic.as_deref().map(|t| format!(" ({t})")).unwrap_or_default(), escape(&e.message)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>digestgraph run failed</title></head>\n\
         <body>\n<h1>Run {run_id} failed at stage \"{stage}\"</h1>\n<ul>\n{errors}\n</ul>\n</body></html>\n",
        run_id = state.run_id,
        stage = escape(&state.current_stage),
        errors = errors,
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
