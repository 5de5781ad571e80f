use crate::client::BEditaApiClient;
use crate::error::ClientError;
use crate::request::RequestConfig;
use crate::response::ApiResponse;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// The two phases an interceptor can attach to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Request,
    Response,
}

/// A pre-send hook: transforms the outgoing request configuration.
///
/// `name` is the interceptor's kind identity — a stable tag per
/// *implementation*, not per instance. The registry keeps at most one live
/// attachment per kind per phase, so two instances of the same implementation
/// never run twice on one request.
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    /// Stable kind identity for registry de-duplication.
    fn name(&self) -> &'static str;

    /// Called before the request is sent; may rewrite the configuration.
    async fn on_request(
        &self,
        _client: &BEditaApiClient,
        config: RequestConfig,
    ) -> Result<RequestConfig, ClientError> {
        Ok(config)
    }

    /// Called when an earlier request interceptor failed.
    async fn on_error(
        &self,
        _client: &BEditaApiClient,
        error: ClientError,
    ) -> Result<RequestConfig, ClientError> {
        Err(error)
    }
}

/// A post-receive hook: transforms the incoming response, or intercepts an
/// error and may recover from it.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    /// Stable kind identity for registry de-duplication.
    fn name(&self) -> &'static str;

    /// Called with the successful response; may reshape it.
    async fn on_response(
        &self,
        _client: &BEditaApiClient,
        response: ApiResponse,
    ) -> Result<ApiResponse, ClientError> {
        Ok(response)
    }

    /// Called with a failed request or response. Returning `Ok` recovers:
    /// later interceptors see a successful response again.
    async fn on_error(
        &self,
        _client: &BEditaApiClient,
        error: ClientError,
    ) -> Result<ApiResponse, ClientError> {
        Err(error)
    }
}

/// An interceptor of either capability kind.
#[derive(Clone)]
pub enum Interceptor {
    Request(Arc<dyn RequestInterceptor>),
    Response(Arc<dyn ResponseInterceptor>),
}

impl Interceptor {
    /// The kind identity of the wrapped interceptor.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Interceptor::Request(i) => i.name(),
            Interceptor::Response(i) => i.name(),
        }
    }

    /// The phase the wrapped interceptor attaches to.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            Interceptor::Request(_) => Phase::Request,
            Interceptor::Response(_) => Phase::Response,
        }
    }
}

impl From<Arc<dyn RequestInterceptor>> for Interceptor {
    fn from(value: Arc<dyn RequestInterceptor>) -> Self {
        Interceptor::Request(value)
    }
}

impl From<Arc<dyn ResponseInterceptor>> for Interceptor {
    fn from(value: Arc<dyn ResponseInterceptor>) -> Self {
        Interceptor::Response(value)
    }
}

#[derive(Default)]
struct RegistryInner {
    next_index: usize,
    request_kinds: HashMap<&'static str, usize>,
    response_kinds: HashMap<&'static str, usize>,
    request_chain: BTreeMap<usize, Arc<dyn RequestInterceptor>>,
    response_chain: BTreeMap<usize, Arc<dyn ResponseInterceptor>>,
}

/// De-duplicated, ordered attachment of interceptors to the two pipeline
/// phases.
///
/// Entries are keyed by kind identity and valued by the attachment index;
/// indices grow monotonically, so chain iteration order is attachment order.
/// The registry is shared mutable state across concurrent calls: dispatch
/// snapshots each chain and never holds the lock across an await.
#[derive(Default)]
pub struct InterceptorRegistry {
    inner: Mutex<RegistryInner>,
}

impl InterceptorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an interceptor and return its attachment index.
    ///
    /// Adding a kind already attached to the same phase is a no-op returning
    /// the existing index.
    pub fn add(&self, interceptor: Interceptor) -> usize {
        let mut inner = self.inner.lock();
        match interceptor {
            Interceptor::Request(i) => {
                if let Some(&index) = inner.request_kinds.get(i.name()) {
                    return index;
                }
                let index = inner.next_index;
                inner.next_index += 1;
                inner.request_kinds.insert(i.name(), index);
                inner.request_chain.insert(index, i);
                index
            }
            Interceptor::Response(i) => {
                if let Some(&index) = inner.response_kinds.get(i.name()) {
                    return index;
                }
                let index = inner.next_index;
                inner.next_index += 1;
                inner.response_kinds.insert(i.name(), index);
                inner.response_chain.insert(index, i);
                index
            }
        }
    }

    /// Whether an interceptor of the same kind is attached to the same phase.
    #[must_use]
    pub fn has(&self, interceptor: &Interceptor) -> bool {
        let inner = self.inner.lock();
        match interceptor.phase() {
            Phase::Request => inner.request_kinds.contains_key(interceptor.name()),
            Phase::Response => inner.response_kinds.contains_key(interceptor.name()),
        }
    }

    /// Detach the interceptor holding `index` in the given phase.
    ///
    /// Detaching an unknown index is a safe no-op.
    pub fn remove(&self, index: usize, phase: Phase) {
        let mut inner = self.inner.lock();
        match phase {
            Phase::Request => {
                inner.request_kinds.retain(|_, &mut i| i != index);
                inner.request_chain.remove(&index);
            }
            Phase::Response => {
                inner.response_kinds.retain(|_, &mut i| i != index);
                inner.response_chain.remove(&index);
            }
        }
    }

    /// Snapshot of the request chain in attachment order.
    pub(crate) fn request_chain(&self) -> Vec<Arc<dyn RequestInterceptor>> {
        self.inner.lock().request_chain.values().cloned().collect()
    }

    /// Snapshot of the response chain in attachment order.
    pub(crate) fn response_chain(&self) -> Vec<Arc<dyn ResponseInterceptor>> {
        self.inner.lock().response_chain.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopRequest;

    #[async_trait]
    impl RequestInterceptor for NoopRequest {
        fn name(&self) -> &'static str {
            "noop-request"
        }
    }

    struct NoopResponse;

    #[async_trait]
    impl ResponseInterceptor for NoopResponse {
        fn name(&self) -> &'static str {
            "noop-response"
        }
    }

    struct OtherRequest;

    #[async_trait]
    impl RequestInterceptor for OtherRequest {
        fn name(&self) -> &'static str {
            "other-request"
        }
    }

    #[test]
    fn add_is_idempotent_per_kind() {
        let registry = InterceptorRegistry::new();

        let first = registry.add(Interceptor::Request(Arc::new(NoopRequest)));
        // A distinct instance of the same implementation is the same kind.
        let second = registry.add(Interceptor::Request(Arc::new(NoopRequest)));

        assert_eq!(first, second);
        assert_eq!(registry.request_chain().len(), 1);
    }

    #[test]
    fn kinds_are_scoped_per_phase() {
        let registry = InterceptorRegistry::new();
        registry.add(Interceptor::Request(Arc::new(NoopRequest)));
        registry.add(Interceptor::Response(Arc::new(NoopResponse)));

        assert!(registry.has(&Interceptor::Request(Arc::new(NoopRequest))));
        assert!(registry.has(&Interceptor::Response(Arc::new(NoopResponse))));
        assert_eq!(registry.request_chain().len(), 1);
        assert_eq!(registry.response_chain().len(), 1);
    }

    #[test]
    fn remove_detaches_by_index() {
        let registry = InterceptorRegistry::new();
        let noop = registry.add(Interceptor::Request(Arc::new(NoopRequest)));
        let other = registry.add(Interceptor::Request(Arc::new(OtherRequest)));

        registry.remove(noop, Phase::Request);
        assert!(!registry.has(&Interceptor::Request(Arc::new(NoopRequest))));
        assert!(registry.has(&Interceptor::Request(Arc::new(OtherRequest))));

        // Unknown index is a no-op.
        registry.remove(noop, Phase::Request);
        registry.remove(9999, Phase::Response);
        assert_eq!(registry.request_chain().len(), 1);

        registry.remove(other, Phase::Request);
        assert!(registry.request_chain().is_empty());
    }

    #[test]
    fn chain_order_follows_attachment_order() {
        let registry = InterceptorRegistry::new();
        registry.add(Interceptor::Request(Arc::new(NoopRequest)));
        registry.add(Interceptor::Request(Arc::new(OtherRequest)));

        let names: Vec<_> = registry
            .request_chain()
            .iter()
            .map(|i| i.name())
            .collect();
        assert_eq!(names, ["noop-request", "other-request"]);
    }

    #[test]
    fn readd_after_remove_gets_fresh_index() {
        let registry = InterceptorRegistry::new();
        let first = registry.add(Interceptor::Request(Arc::new(NoopRequest)));
        registry.remove(first, Phase::Request);
        let second = registry.add(Interceptor::Request(Arc::new(NoopRequest)));
        assert_ne!(first, second);
    }
}
