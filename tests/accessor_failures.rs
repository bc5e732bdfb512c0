//! Failure handling tests
//!
//! Permission errors, deadlines, failed lists and cancellation, driven by
//! mockall mocks and slow fixtures.

mod common;

use async_trait::async_trait;
use common::{NS, config_map, pod, service, web_scenario};
use kubegraph::graph::{
    AccessError, BuildOptions, GraphBuilder, GraphError, Gvr, LabelSelector, ObjectKey,
    ResolvedKind, ResourceAccessor, cancel_pair,
};
use kubegraph::kube::{FixtureAccessor, KindRegistry};
use kubegraph::{GraphRequest, GraphService, OutputMode};
use mockall::mock;
use serde_json::{Value, json};
use std::time::{Duration, Instant};

mock! {
    pub Cluster {}

    #[async_trait]
    impl ResourceAccessor for Cluster {
        async fn resolve_kind(&self, name: &str) -> Result<ResolvedKind, AccessError>;
        async fn get(&self, gvr: &Gvr, namespace: &str, name: &str) -> Result<Value, AccessError>;
        async fn list(
            &self,
            gvr: &Gvr,
            namespace: &str,
            selector: &LabelSelector,
        ) -> Result<Vec<Value>, AccessError>;
    }
}

fn mock_with_builtin_kinds() -> MockCluster {
    let registry = KindRegistry::builtin();
    let mut mock = MockCluster::new();
    mock.expect_resolve_kind()
        .returning(move |name| registry.resolve(name));
    mock
}

/// Delays `get` for one resource type
struct SlowResource {
    inner: FixtureAccessor,
    resource: &'static str,
    delay: Duration,
}

#[async_trait]
impl ResourceAccessor for SlowResource {
    async fn resolve_kind(&self, name: &str) -> Result<ResolvedKind, AccessError> {
        self.inner.resolve_kind(name).await
    }

    async fn get(&self, gvr: &Gvr, namespace: &str, name: &str) -> Result<Value, AccessError> {
        if gvr.resource == self.resource {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.get(gvr, namespace, name).await
    }

    async fn list(
        &self,
        gvr: &Gvr,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<Value>, AccessError> {
        self.inner.list(gvr, namespace, selector).await
    }
}

fn short_deadline() -> BuildOptions {
    BuildOptions {
        request_timeout: Duration::from_millis(50),
        ..BuildOptions::default()
    }
}

#[tokio::test]
async fn test_forbidden_root_is_fatal() {
    let mut mock = mock_with_builtin_kinds();
    mock.expect_get()
        .times(1)
        .returning(|gvr, _, name| {
            Err(AccessError::Access(format!(
                "{} \"{}\" is forbidden",
                gvr.resource, name
            )))
        });
    mock.expect_list().never();

    let err = GraphBuilder::new(&mock)
        .build("Service", NS, "web")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GraphError::RootAccess { source: AccessError::Access(_), .. }
    ));
    assert_eq!(
        err.to_string(),
        "failed to fetch Service \"web\": access failed: services \"web\" is forbidden"
    );
}

#[tokio::test]
async fn test_slow_root_times_out() {
    let fixture = web_scenario().with_latency(Duration::from_millis(500));
    let err = GraphBuilder::new(&fixture)
        .with_options(short_deadline())
        .build("Service", NS, "web")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GraphError::RootAccess { source: AccessError::Timeout(_), .. }
    ));
}

#[tokio::test]
async fn test_slow_object_becomes_stub() {
    let slow = SlowResource {
        inner: web_scenario(),
        resource: "configmaps",
        delay: Duration::from_millis(500),
    };
    let graph = GraphBuilder::new(&slow)
        .with_options(short_deadline())
        .build("Service", NS, "web")
        .await
        .unwrap();

    let cm = graph
        .node(&ObjectKey {
            group: String::new(),
            resource: "configmaps".to_string(),
            namespace: NS.to_string(),
            name: "web-config".to_string(),
        })
        .unwrap();
    assert_eq!(
        cm.error(),
        Some(&AccessError::Timeout(Duration::from_millis(50)))
    );
    assert_eq!(graph.len(), 6);
}

#[tokio::test]
async fn test_failed_list_drops_selector_relations() {
    let mut mock = mock_with_builtin_kinds();
    mock.expect_get()
        .withf(|gvr, ns, name| gvr.resource == "services" && ns == NS && name == "web")
        .times(1)
        .returning(|_, _, _| Ok(service("web", json!({"app": "web"}))));
    mock.expect_list()
        .withf(|gvr, ns, selector| {
            gvr.resource == "pods" && ns == NS && selector.to_query() == "app=web"
        })
        .times(1)
        .returning(|_, _, _| Err(AccessError::Access("pods is forbidden".to_string())));

    let graph = GraphBuilder::new(&mock)
        .build("svc", NS, "web")
        .await
        .unwrap();

    assert_eq!(graph.len(), 1);
    assert_eq!(graph.relation_count(), 0);
}

#[tokio::test]
async fn test_cancellation_aborts_build() {
    let fixture = web_scenario().with_latency(Duration::from_millis(300));
    let (handle, signal) = cancel_pair();
    let builder = GraphBuilder::new(&fixture).with_cancel(signal);

    let started = Instant::now();
    let cancel_soon = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
    };
    let (result, ()) = tokio::join!(builder.build("Service", NS, "web"), cancel_soon);

    assert!(matches!(result, Err(GraphError::Cancelled)));
    assert!(started.elapsed() < Duration::from_millis(250));
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let mut mock = MockCluster::new();
    mock.expect_resolve_kind().never();
    mock.expect_get().never();

    let (handle, signal) = cancel_pair();
    handle.cancel();

    let result = GraphBuilder::new(&mock)
        .with_cancel(signal)
        .build("Service", NS, "web")
        .await;
    assert!(matches!(result, Err(GraphError::Cancelled)));
}

#[tokio::test]
async fn test_service_writes_nothing_on_failure() {
    let service = GraphService::new(web_scenario());
    let mut out = Vec::new();

    let err = service
        .run(&GraphRequest::new("Service", NS, "missing"), OutputMode::Tree, &mut out)
        .await
        .unwrap_err();

    assert!(matches!(err, GraphError::RootNotFound { .. }));
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_service_renders_partial_graph() {
    let fixture = FixtureAccessor::new()
        .with_object(pod("web-1", "web", None, Some("web-config")))
        .with_object(config_map("web-config"))
        .deny_get("ConfigMap", NS, "web-config");
    let service = GraphService::new(fixture);
    let mut out = Vec::new();

    service
        .run(&GraphRequest::new("po", NS, "web-1"), OutputMode::Tree, &mut out)
        .await
        .unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Pod/web-1\n  ConfigMap/web-config [Mounts] (unresolved: access failed: configmaps \"web-config\" is forbidden)\n"
    );
    assert_eq!(service.accessor().get_count("ConfigMap", NS, "web-config"), 1);
}
