//! # Request Service
//!
//! Entry point for outbound requests. Holds the collaborators every builder
//! shares and hands out fresh builders per request.
//!
//! ## Architecture
//!
//! - Uses the outbound `TemplateProvider` port for header templates
//! - Routes through the `ProtocolTable` capability table
//! - Builders implement the inbound `ExecutableRequest` port

use crate::adapters::MultipartProtocol;
use crate::builder::{ConnectorCertificateRequestBuilder, ConnectorRequestBuilder, RequestOperationBuilder};
use crate::domain::entities::{ProtocolKind, RejectionPolicy};
use crate::ports::outbound::{MessageService, TemplateProvider};
use crate::protocol::ProtocolTable;
use std::fmt;
use std::sync::Arc;

/// Collaborators shared by all builders of one service.
pub struct ExchangeContext {
    pub templates: Arc<dyn TemplateProvider>,
    pub protocols: ProtocolTable,
    pub default_policy: RejectionPolicy,
}

impl fmt::Debug for ExchangeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeContext")
            .field("protocols", &self.protocols)
            .field("default_policy", &self.default_policy)
            .finish()
    }
}

/// Factory for request builders.
#[derive(Debug, Clone)]
pub struct RequestService {
    context: Arc<ExchangeContext>,
}

impl RequestService {
    pub fn new(
        templates: Arc<dyn TemplateProvider>,
        protocols: ProtocolTable,
        default_policy: RejectionPolicy,
    ) -> Self {
        Self {
            context: Arc::new(ExchangeContext {
                templates,
                protocols,
                default_policy,
            }),
        }
    }

    /// Service with only the multipart protocol, on top of `service`.
    pub fn multipart<M: MessageService + 'static>(
        templates: Arc<dyn TemplateProvider>,
        service: M,
    ) -> Self {
        let protocols = ProtocolTable::new().with_handler(Arc::new(MultipartProtocol::new(service)));
        Self::new(templates, protocols, RejectionPolicy::default())
    }

    /// Builder for certificate granted/revoked requests.
    pub fn connector_certificate<T>(&self) -> ConnectorCertificateRequestBuilder<T> {
        RequestOperationBuilder::new(Arc::clone(&self.context))
    }

    /// Builder for connector update/unavailable requests.
    pub fn connector<T>(&self) -> ConnectorRequestBuilder<T> {
        RequestOperationBuilder::new(Arc::clone(&self.context))
    }

    pub fn supports(&self, protocol: ProtocolKind) -> bool {
        self.context.protocols.supports(protocol)
    }

    pub fn supported_protocols(&self) -> Vec<ProtocolKind> {
        self.context.protocols.supported()
    }

    pub fn default_policy(&self) -> RejectionPolicy {
        self.context.default_policy
    }
}
