//! FCS Protocol Module
//!
//! The request state machine behind the SRU/FCS endpoint.
//!
//! ## Request flow
//! ```text
//! recv -> general params -> dispatch by version -> operation
//!                                                   |- explain
//!                                                   |- scan (reserved)
//!                                                   |- searchRetrieve
//!                                                        v
//!                                                  render -> send
//! ```
//!
//! The root [`Gateway::handle`] validates the `version` parameter and picks
//! one of the two subhandlers. Both share the envelope and the diagnostic
//! taxonomy but differ where the protocol versions differ: diagnostic codes
//! (integers vs. SRW URIs), parameter whitelists, result row shape (KWIC
//! tri-split vs. token stream) and failure policy (1.2 aborts on the first
//! error, 2.0 accumulates diagnostics and keeps partial results).
//!
//! ## Submodules
//! - **`diagnostics`**: Error taxonomy and conformant status constants.
//! - **`response`**: The version-independent response envelope.
//! - **`v12`** / **`v20`**: The two version subhandlers.
//! - **`handlers`**: Axum glue between HTTP and the state machine.

pub mod diagnostics;
pub mod handlers;
pub mod response;
pub mod v12;
pub mod v20;


use crate::broker::Adapter;
use crate::corpus::ResourceRegistry;

use axum::http::StatusCode;
use diagnostics::{Diagnostic, DiagnosticType};
use response::FcsResponse;
use std::collections::HashMap;
use std::sync::Arc;

/// Query-string parameters of one request.
pub type Params = HashMap<String, String>;

/// Parameters every operation accepts.
pub const QUERY_GENERAL: &[&str] = &["operation", "version", "recordPacking"];
/// Additional parameters of the explain operation.
pub const QUERY_EXPLAIN: &[&str] = &["x-fcs-endpoint-description"];
/// Additional parameters of the searchRetrieve operation.
pub const QUERY_SEARCH_RETRIEVE: &[&str] = &["query", "x-fcs-context", "x-fcs-dataviews"];

/// Concordance lines requested from each corpus worker.
pub const DEFAULT_MAX_ITEMS: usize = 10;

/// Server identity and database metadata, sourced from configuration.
#[derive(Debug, Clone, Default)]
pub struct GeneralInfo {
    pub server_name: String,
    pub server_port: String,
    pub database: String,
    pub database_title: String,
    pub database_description: String,
}

/// Result of one request: the envelope plus the HTTP status derived from the
/// worst diagnostic present.
pub struct FcsOutcome {
    pub status: StatusCode,
    pub response: FcsResponse,
}

impl FcsOutcome {
    pub fn new(status: StatusCode, response: FcsResponse) -> Self {
        Self { status, response }
    }
}

/// Process-wide state of the FCS endpoint: configuration-derived identity,
/// the corpus registry and the broker adapter, all constructed in `main` and
/// shared across requests.
pub struct Gateway {
    pub general: GeneralInfo,
    pub registry: ResourceRegistry,
    pub adapter: Arc<Adapter>,
}

impl Gateway {
    pub fn new(general: GeneralInfo, registry: ResourceRegistry, adapter: Arc<Adapter>) -> Self {
        Self {
            general,
            registry,
            adapter,
        }
    }

    /// Validate the protocol version and run the matching subhandler.
    pub async fn handle(&self, params: &Params) -> FcsOutcome {
        let version = params.get("version").map(String::as_str).unwrap_or("1.2");
        match version {
            "1.2" => v12::handle(self, params).await,
            "2.0" => v20::handle(self, params).await,
            other => {
                let mut response = FcsResponse::new("1.2");
                response.add_diagnostic(Diagnostic::new(
                    DiagnosticType::UnsupportedVersion,
                    other,
                    format!("Unsupported version {}", other),
                ));
                FcsOutcome::new(StatusCode::BAD_REQUEST, response)
            }
        }
    }
}

/// Explain data comes from configuration, never from request URL fields.
pub(crate) fn explain_block(general: &GeneralInfo) -> response::ExplainBlock {
    response::ExplainBlock {
        server_name: general.server_name.clone(),
        server_port: general.server_port.clone(),
        database: general.database.clone(),
        database_title: general.database_title.clone(),
        database_description: general.database_description.clone(),
    }
}

/// One resource-info block per registered corpus, in registry order. A
/// corpus without a configured title advertises its id.
pub(crate) fn resource_infos(registry: &ResourceRegistry) -> Vec<response::ResourceInfo> {
    registry
        .get_all()
        .into_iter()
        .filter_map(|id| {
            registry.get(&id).map(|resource| response::ResourceInfo {
                title: if resource.title.is_empty() {
                    id.clone()
                } else {
                    resource.title.clone()
                },
                description: resource.description.clone(),
                uri: resource.uri.clone(),
                languages: resource.languages.clone(),
                pid: id,
            })
        })
        .collect()
}

/// Per-resource web and reference links attached to result rows.
pub(crate) fn row_links(gateway: &Gateway, corpus_id: &str) -> (String, String) {
    gateway
        .registry
        .get(corpus_id)
        .map(|r| (r.web_uri.clone(), r.ref_uri.clone()))
        .unwrap_or_default()
}
