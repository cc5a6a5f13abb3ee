//! `apix run` -- execute one request through its pipeline.
//!
//! Calls the live extension services exactly as the gateway would and
//! prints the final status, the response body and a per-stage report.
//! Fatal pipeline errors make the command fail.

use std::fmt::Write as _;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use apix_core::Orchestrator;
use apix_core::pipeline::{HttpServiceInvoker, PipelineRun};
use apix_platform::{NativePlatform, Platform};

use super::{RequestArgs, load_config, request_from_args};

/// Render the outcome of a run as a human-readable report.
pub fn render_run(run: &PipelineRun) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "route:  {}", run.route);
    let _ = writeln!(out, "phase:  {:?}", run.outcome.phase());
    let _ = writeln!(out, "status: {}", run.outcome.status());

    if run.stages.is_empty() {
        let _ = writeln!(out, "stages: none");
    } else {
        let _ = writeln!(out, "stages:");
        for (idx, stage) in run.stages.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. {} -> {} {}{} ({}ms)",
                idx + 1,
                stage.extension,
                stage.status,
                stage.directive,
                if stage.payload_replaced { ", payload replaced" } else { "" },
                stage.elapsed_ms,
            );
        }
    }

    let _ = writeln!(out);
    out.push_str(&String::from_utf8_lossy(run.outcome.body()));
    out
}

/// Run the described request once and print the report.
pub async fn run(args: RequestArgs) -> anyhow::Result<()> {
    let platform = NativePlatform::new();
    let config = load_config(&platform, args.config.as_deref()).await?;
    let request = request_from_args(&platform, &args).await?;

    let invoker = Arc::new(HttpServiceInvoker::new(platform.shared_http()));
    let orchestrator = Orchestrator::from_config(&config, invoker);

    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, cancelling pipeline");
            signal.cancel();
        }
    });

    let run = orchestrator
        .handle(&request, &cancel)
        .await
        .map_err(|e| anyhow::anyhow!("pipeline aborted ({}): {e}", e.kind()))?;
    println!("{}", render_run(&run));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use apix_core::pipeline::{PipelineOutcome, REJECTION_BODY, StageRecord};
    use apix_types::extension::Directive;
    use apix_types::request::PipelineRequest;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn report_lists_stages() {
        let run = PipelineRun {
            route: "ingest".into(),
            outcome: PipelineOutcome::Completed {
                payload: b"stored".to_vec(),
                status: 201,
            },
            stages: vec![
                StageRecord {
                    extension: "validation".into(),
                    status: 204,
                    directive: Directive::Forward,
                    payload_replaced: false,
                    elapsed_ms: 3,
                },
                StageRecord {
                    extension: "store".into(),
                    status: 201,
                    directive: Directive::Forward,
                    payload_replaced: true,
                    elapsed_ms: 5,
                },
            ],
        };

        let report = render_run(&run);
        assert!(report.contains("route:  ingest"));
        assert!(report.contains("status: 201"));
        assert!(report.contains("1. validation -> 204 forward (3ms)"));
        assert!(report.contains("2. store -> 201 forward, payload replaced (5ms)"));
        assert!(report.ends_with("stored"));
    }

    #[test]
    fn report_for_rejection_uses_fixed_body() {
        let run = PipelineRun {
            route: "#0".into(),
            outcome: PipelineOutcome::Rejected {
                extension: "validation".into(),
                stage_status: 412,
            },
            stages: vec![],
        };
        let report = render_run(&run);
        assert!(report.contains("status: 400"));
        assert!(report.contains("stages: none"));
        assert!(report.ends_with(REJECTION_BODY));
    }

    #[tokio::test]
    async fn live_run_against_mock_service() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upper"))
            .respond_with(ResponseTemplate::new(200).set_body_string("HELLO"))
            .expect(1)
            .mount(&server)
            .await;

        let config: apix_types::config::Config = serde_json::from_str(&format!(
            r#"{{
                "routes": [{{"extensions": [{{"name": "upper"}}]}}],
                "extensions": {{"upper": {{"service": {{"uri": "{}/upper"}}, "response_routing": {{"200": "forward"}}}}}}
            }}"#,
            server.uri()
        ))
        .unwrap();

        let invoker = Arc::new(HttpServiceInvoker::new(NativePlatform::new().shared_http()));
        let orchestrator = Orchestrator::from_config(&config, invoker);
        let request = PipelineRequest::new("POST", "/").with_payload("hello");
        let run = orchestrator
            .handle(&request, &CancellationToken::new())
            .await
            .unwrap();

        let report = render_run(&run);
        assert!(report.contains("1. upper -> 200 forward, payload replaced"));
        assert!(report.ends_with("HELLO"));
    }
}
