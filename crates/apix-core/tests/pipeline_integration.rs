//! Pipeline integration tests.
//!
//! Drives the orchestrator end to end: route selection, queue
//! construction, sequential execution and status-driven flow control,
//! first against a scripted invoker and then against real HTTP services.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_bytes, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use apix_core::Orchestrator;
use apix_core::pipeline::{
    HttpServiceInvoker, InvokeError, PipelineOutcome, REJECTION_BODY, REJECTION_STATUS,
    ServiceInvoker,
};
use apix_platform::http::NativeHttpClient;
use apix_types::condition::Condition;
use apix_types::config::Config;
use apix_types::error::ConfigError;
use apix_types::extension::{
    Directive, ExtensionConfig, ResponseRouting, ServiceDescriptor, ServiceMethod,
};
use apix_types::request::{PipelineRequest, StageResult};
use apix_types::route::{ExtensionRef, RouteConfig};
use apix_types::PipelineError;

/// Invoker that answers from a per-URI script and records every call.
#[derive(Default)]
struct ScriptedInvoker {
    script: HashMap<String, StageResult>,
    calls: Mutex<Vec<(String, Vec<u8>)>>,
}

impl ScriptedInvoker {
    fn reply(mut self, ext: &str, status: u16, body: &str) -> Self {
        self.script.insert(svc_uri(ext), StageResult::new(status, body));
        self
    }

    fn called(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(uri, _)| uri.trim_start_matches("http://svc/").to_string())
            .collect()
    }

    fn payloads(&self) -> Vec<Vec<u8>> {
        self.calls.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }
}

#[async_trait]
impl ServiceInvoker for ScriptedInvoker {
    async fn invoke(
        &self,
        service: &ServiceDescriptor,
        payload: &[u8],
    ) -> Result<StageResult, InvokeError> {
        self.calls
            .lock()
            .unwrap()
            .push((service.uri.clone(), payload.to_vec()));
        self.script
            .get(&service.uri)
            .cloned()
            .ok_or_else(|| InvokeError::Transport("no script".into()))
    }
}

fn svc_uri(name: &str) -> String {
    format!("http://svc/{name}")
}

fn extension(name: &str, routing: ResponseRouting) -> ExtensionConfig {
    ExtensionConfig::new(
        name,
        ServiceDescriptor::new(svc_uri(name), ServiceMethod::Post),
        routing,
    )
}

fn config(routes: Vec<RouteConfig>, extensions: Vec<ExtensionConfig>) -> Config {
    Config {
        routes,
        extensions: extensions.into_iter().map(|e| (e.name.clone(), e)).collect(),
        ..Config::default()
    }
}

fn catch_all(names: &[&str]) -> RouteConfig {
    RouteConfig::new(
        "all",
        Condition::Always,
        names.iter().map(|n| ExtensionRef::new(*n)).collect(),
    )
}

async fn run(
    cfg: &Config,
    invoker: Arc<ScriptedInvoker>,
    request: PipelineRequest,
) -> Result<apix_core::pipeline::PipelineRun, PipelineError> {
    Orchestrator::from_config(cfg, invoker)
        .handle(&request, &CancellationToken::new())
        .await
}

/// Two-stage chain: A forwards everything, B rejects 412; C never runs.
#[tokio::test]
async fn test_two_stage_chain_rejects_with_fixed_response() {
    let cfg = config(
        vec![catch_all(&["a", "b", "c"])],
        vec![
            extension("a", ResponseRouting::new().otherwise(Directive::Forward)),
            extension("b", ResponseRouting::new().on(412, Directive::TerminateError)),
            extension("c", ResponseRouting::new().otherwise(Directive::Forward)),
        ],
    );
    let invoker = Arc::new(
        ScriptedInvoker::default()
            .reply("a", 204, "")
            .reply("b", 412, "")
            .reply("c", 200, "unreachable"),
    );

    let run = run(&cfg, invoker.clone(), PipelineRequest::new("POST", "/objects"))
        .await
        .unwrap();

    assert_eq!(invoker.called(), ["a", "b"]);
    assert_eq!(run.outcome.status(), REJECTION_STATUS);
    assert_eq!(run.outcome.body(), REJECTION_BODY.as_bytes());
    assert_eq!(
        run.outcome,
        PipelineOutcome::Rejected {
            extension: "b".into(),
            stage_status: 412
        }
    );
}

/// Single pass-through: the body returned by A becomes the final payload.
#[tokio::test]
async fn test_single_pass_through_completes_with_stage_output() {
    let cfg = config(
        vec![catch_all(&["a"])],
        vec![extension(
            "a",
            ResponseRouting::new()
                .on(204, Directive::Forward)
                .otherwise(Directive::Forward),
        )],
    );
    let invoker = Arc::new(ScriptedInvoker::default().reply("a", 204, "X"));

    let run = run(&cfg, invoker, PipelineRequest::new("GET", "/")).await.unwrap();
    assert_eq!(
        run.outcome,
        PipelineOutcome::Completed {
            payload: b"X".to_vec(),
            status: 204
        }
    );
}

/// Unknown status: no exact entry and no wildcard aborts with a config error.
#[tokio::test]
async fn test_unrouted_status_aborts_without_response() {
    let cfg = config(
        vec![catch_all(&["a"])],
        vec![extension("a", ResponseRouting::new().on(204, Directive::Forward))],
    );
    let invoker = Arc::new(ScriptedInvoker::default().reply("a", 500, "oops"));

    let err = run(&cfg, invoker, PipelineRequest::new("GET", "/")).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Config(ConfigError::UnroutedStatus { ref extension, status: 500 })
            if extension == "a"
    ));
}

/// Inactive skip: B is listed but inactive, so only A is queued and run.
#[tokio::test]
async fn test_inactive_extension_is_skipped() {
    let cfg = config(
        vec![catch_all(&["a", "b"])],
        vec![
            extension("a", ResponseRouting::new().otherwise(Directive::Forward)),
            extension("b", ResponseRouting::new().otherwise(Directive::Forward)).with_active(false),
        ],
    );
    let invoker = Arc::new(
        ScriptedInvoker::default()
            .reply("a", 200, "")
            .reply("b", 200, ""),
    );

    let orch = Orchestrator::from_config(&cfg, invoker.clone());
    let request = PipelineRequest::new("GET", "/");
    let plan = orch.plan(&request).unwrap();
    let queued: Vec<_> = plan.queue.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(queued, ["a"]);

    orch.handle(&request, &CancellationToken::new()).await.unwrap();
    assert_eq!(invoker.called(), ["a"]);
}

/// Route precedence: of several satisfied routes the earliest is applied.
#[tokio::test]
async fn test_route_precedence_first_match() {
    let cfg = config(
        vec![
            RouteConfig::new(
                "never",
                Condition::Never,
                vec![ExtensionRef::new("x")],
            ),
            RouteConfig::new(
                "objects",
                Condition::PathPrefix {
                    prefix: "/objects".into(),
                },
                vec![ExtensionRef::new("a")],
            ),
            RouteConfig::new(
                "posts",
                Condition::Method {
                    methods: vec!["POST".into()],
                },
                vec![ExtensionRef::new("b")],
            ),
            catch_all(&["x"]),
        ],
        vec![
            extension("a", ResponseRouting::new().otherwise(Directive::Forward)),
            extension("b", ResponseRouting::new().otherwise(Directive::Forward)),
            extension("x", ResponseRouting::new().otherwise(Directive::Forward)),
        ],
    );
    let invoker = Arc::new(
        ScriptedInvoker::default()
            .reply("a", 200, "")
            .reply("b", 200, "")
            .reply("x", 200, ""),
    );

    let run = run(&cfg, invoker.clone(), PipelineRequest::new("POST", "/objects/1"))
        .await
        .unwrap();
    assert_eq!(run.route, "objects");
    assert_eq!(invoker.called(), ["a"]);
}

/// Payload carry-over: an empty body leaves the payload bit-for-bit intact.
#[tokio::test]
async fn test_empty_body_carries_payload_over() {
    let original: Vec<u8> = vec![0, 159, 146, 150, 255, b'\n'];
    let cfg = config(
        vec![catch_all(&["a", "b", "c"])],
        vec![
            extension("a", ResponseRouting::new().otherwise(Directive::Forward)),
            extension("b", ResponseRouting::new().otherwise(Directive::Forward)),
            extension("c", ResponseRouting::new().otherwise(Directive::Forward)),
        ],
    );
    let invoker = Arc::new(
        ScriptedInvoker::default()
            .reply("a", 204, "")
            .reply("b", 204, "")
            .reply("c", 204, ""),
    );

    let run = run(
        &cfg,
        invoker.clone(),
        PipelineRequest::new("PUT", "/").with_payload(original.clone()),
    )
    .await
    .unwrap();

    for payload in invoker.payloads() {
        assert_eq!(payload, original);
    }
    assert_eq!(
        run.outcome,
        PipelineOutcome::Completed {
            payload: original,
            status: 204
        }
    );
}

/// Routing precedence: the exact entry wins over the wildcard.
#[tokio::test]
async fn test_exact_status_beats_wildcard() {
    let cfg = config(
        vec![catch_all(&["a", "b"])],
        vec![
            extension(
                "a",
                ResponseRouting::new()
                    .on(202, Directive::Forward)
                    .otherwise(Directive::TerminateError),
            ),
            extension("b", ResponseRouting::new().otherwise(Directive::Forward)),
        ],
    );
    let invoker = Arc::new(
        ScriptedInvoker::default()
            .reply("a", 202, "")
            .reply("b", 200, "done"),
    );

    let run = run(&cfg, invoker.clone(), PipelineRequest::new("GET", "/")).await.unwrap();
    assert!(!run.outcome.is_rejected());
    assert_eq!(invoker.called(), ["a", "b"]);
}

/// Empty queue: completes with the request payload and the default status.
#[tokio::test]
async fn test_empty_queue_completes_with_original_payload() {
    let cfg = config(
        vec![RouteConfig::new(
            "quiet",
            Condition::Always,
            vec![ExtensionRef::when("a", Condition::Never)],
        )],
        vec![extension("a", ResponseRouting::new().otherwise(Directive::Forward))],
    );
    let invoker = Arc::new(ScriptedInvoker::default());

    let run = run(
        &cfg,
        invoker.clone(),
        PipelineRequest::new("POST", "/").with_payload(b"untouched".to_vec()),
    )
    .await
    .unwrap();

    assert!(invoker.called().is_empty());
    assert!(run.stages.is_empty());
    assert_eq!(
        run.outcome,
        PipelineOutcome::Completed {
            payload: b"untouched".to_vec(),
            status: 200
        }
    );
}

/// No route and unknown extensions are distinct fatal errors.
#[tokio::test]
async fn test_fatal_errors_are_distinguishable() {
    let cfg = config(
        vec![RouteConfig::new(
            "posts",
            Condition::Method {
                methods: vec!["POST".into()],
            },
            vec![ExtensionRef::new("ghost")],
        )],
        vec![],
    );
    let invoker = Arc::new(ScriptedInvoker::default());

    let err = run(&cfg, invoker.clone(), PipelineRequest::new("GET", "/"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "no_route_matched");

    let err = run(&cfg, invoker.clone(), PipelineRequest::new("POST", "/"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Config(ConfigError::UnknownExtension { ref name, .. }) if name == "ghost"
    ));
    assert!(invoker.called().is_empty());
}

/// Full chain over HTTP: a transformer rewrites the payload, a validator
/// accepts it, and a service that is down aborts the pipeline.
#[tokio::test]
async fn test_http_services_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transform"))
        .and(body_bytes(b"raw".to_vec()))
        .respond_with(ResponseTemplate::new(200).set_body_string("cooked"))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/validate"))
        .and(body_bytes(b"cooked".to_vec()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let doc = format!(
        r#"{{
            "routes": [
                {{"name": "broken", "condition": {{"type": "header_present", "name": "x-broken"}},
                  "extensions": [{{"name": "transform"}}, {{"name": "down"}}]}},
                {{"name": "ingest", "extensions": [{{"name": "transform"}}, {{"name": "validate"}}]}}
            ],
            "extensions": {{
                "transform": {{"service": {{"uri": "{base}/transform"}}, "response_routing": {{"200": "forward"}}}},
                "validate": {{"service": {{"uri": "{base}/validate"}},
                              "response_routing": {{"204": "forward", "412": "send_error"}}}},
                "down": {{"service": {{"uri": "http://127.0.0.1:1/down"}}, "response_routing": {{"*": "forward"}}}}
            }}
        }}"#,
        base = server.uri()
    );
    let cfg: Config = serde_json::from_str(&doc).unwrap();
    let orch = Orchestrator::from_config(
        &cfg,
        Arc::new(HttpServiceInvoker::new(Arc::new(NativeHttpClient::new()))),
    );

    let ok = orch
        .handle(
            &PipelineRequest::new("POST", "/objects").with_payload(b"raw".to_vec()),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(
        ok.outcome,
        PipelineOutcome::Completed {
            payload: b"cooked".to_vec(),
            status: 204
        }
    );
    assert_eq!(ok.stages.len(), 2);

    let err = orch
        .handle(
            &PipelineRequest::new("POST", "/objects")
                .with_header("X-Broken", "1")
                .with_payload(b"raw".to_vec()),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::ServiceUnavailable { ref extension, .. } if extension == "down"
    ));
}
