//! Version 2.0 subhandler.
//!
//! Differences from 1.2: SRW URI diagnostic codes, conformant statuses
//! (validation failures travel inside a 200 envelope, unprocessable queries
//! answer 422), a mandatory non-empty `x-fcs-context`, token-stream result
//! rows, and diagnostic accumulation: a failed fan-out slot adds a
//! diagnostic but the rows of the other corpora are still serialized.

use super::diagnostics::{
    worse_status, Diagnostic, DiagnosticType, CONFORMANT_BAD_REQUEST,
    CONFORMANT_UNPROCESSABLE_ENTITY,
};
use super::response::{FcsResponse, HitToken, Operation, RecordPacking, RowContent, SearchRow};
use super::{FcsOutcome, Gateway, Params};
use super::{DEFAULT_MAX_ITEMS, QUERY_EXPLAIN, QUERY_GENERAL, QUERY_SEARCH_RETRIEVE};

use crate::broker::types::FUNC_CONC_EXAMPLE;
use crate::broker::{ConcArgs, ConcResult, Job};
use crate::query::{self, Generator};

use axum::http::StatusCode;

pub async fn handle(gateway: &Gateway, params: &Params) -> FcsOutcome {
    let mut response = FcsResponse::new("2.0");

    let packing = params
        .get("recordPacking")
        .map(String::as_str)
        .unwrap_or("xml");
    match RecordPacking::parse(packing) {
        Some(parsed) => response.record_packing = parsed,
        None => {
            response.add_diagnostic(Diagnostic::new(
                DiagnosticType::UnsupportedRecordPacking,
                "recordPacking",
                "Unsupported record packing",
            ));
            return FcsOutcome::new(StatusCode::BAD_REQUEST, response);
        }
    }

    let operation = params
        .get("operation")
        .map(String::as_str)
        .unwrap_or("explain");
    let Some(parsed_operation) = Operation::parse(operation) else {
        response.add_diagnostic(Diagnostic::new(
            DiagnosticType::UnsupportedOperation,
            operation,
            "Unsupported operation",
        ));
        return FcsOutcome::new(StatusCode::BAD_REQUEST, response);
    };
    response.operation = parsed_operation;

    let status = match parsed_operation {
        Operation::Explain => explain(gateway, params, &mut response),
        Operation::SearchRetrieve => search_retrieve(gateway, params, &mut response).await,
        Operation::Scan => {
            response.add_diagnostic(Diagnostic::new(
                DiagnosticType::UnsupportedOperation,
                "scan",
                "Unsupported operation",
            ));
            StatusCode::BAD_REQUEST
        }
    };
    FcsOutcome::new(status, response)
}

fn explain(gateway: &Gateway, params: &Params, response: &mut FcsResponse) -> StatusCode {
    for key in params.keys() {
        if !QUERY_GENERAL.contains(&key.as_str()) && !QUERY_EXPLAIN.contains(&key.as_str()) {
            response.add_diagnostic(Diagnostic::new(
                DiagnosticType::UnsupportedParameter,
                key,
                "Unsupported parameter",
            ));
            return CONFORMANT_BAD_REQUEST;
        }
    }

    response.explain = super::explain_block(&gateway.general);
    if params.get("x-fcs-endpoint-description").map(String::as_str) == Some("true") {
        response.resources = super::resource_infos(&gateway.registry);
    }
    StatusCode::OK
}

async fn search_retrieve(
    gateway: &Gateway,
    params: &Params,
    response: &mut FcsResponse,
) -> StatusCode {
    for key in params.keys() {
        if !QUERY_GENERAL.contains(&key.as_str()) && !QUERY_SEARCH_RETRIEVE.contains(&key.as_str())
        {
            response.add_diagnostic(Diagnostic::new(
                DiagnosticType::UnsupportedParameter,
                key,
                "Unsupported parameter",
            ));
            return CONFORMANT_BAD_REQUEST;
        }
    }

    let fcs_query = params.get("query").map(String::as_str).unwrap_or("");
    if fcs_query.is_empty() {
        response.add_diagnostic(Diagnostic::new(
            DiagnosticType::MandatoryParameterNotSupplied,
            "fcs_query",
            "Mandatory parameter not supplied",
        ));
        return CONFORMANT_BAD_REQUEST;
    }

    // A 2.0 request must name its target corpora; the parameter is read
    // exactly once.
    let corpora: Vec<String> = params
        .get("x-fcs-context")
        .map(|context| {
            context
                .split(',')
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if corpora.is_empty() {
        response.add_diagnostic(Diagnostic::new(
            DiagnosticType::UnsupportedParameterValue,
            "x-fcs-context",
            "Empty context",
        ));
        return CONFORMANT_BAD_REQUEST;
    }
    for id in &corpora {
        if !gateway.registry.contains(id) {
            response.add_diagnostic(Diagnostic::new(
                DiagnosticType::UnsupportedParameterValue,
                "x-fcs-context",
                format!("Unknown context {}", id),
            ));
            return CONFORMANT_BAD_REQUEST;
        }
    }

    let ast = match query::parse(fcs_query) {
        Ok(ast) => ast,
        Err(_) => {
            response.add_diagnostic(Diagnostic::new(
                DiagnosticType::QuerySyntaxError,
                fcs_query,
                "Invalid query syntax",
            ));
            return CONFORMANT_UNPROCESSABLE_ENTITY;
        }
    };
    let retrieve_attrs = gateway.registry.common_pos_attrs(&corpora);

    let mut handles = Vec::with_capacity(corpora.len());
    for id in &corpora {
        let Some(resource) = gateway.registry.get(id) else {
            response.add_diagnostic(Diagnostic::new(
                DiagnosticType::GeneralSystemError,
                id,
                "General system error",
            ));
            return StatusCode::INTERNAL_SERVER_ERROR;
        };

        let mut generator = Generator::new(&resource.default_search_attr);
        let engine_query = generator.generate(&ast);
        let view_context = generator.translate_within_ctx(&resource.view_context_unit);
        if let Some(error) = generator.errors().first() {
            response.add_diagnostic(Diagnostic::new(
                DiagnosticType::QueryCannotProcess,
                "query",
                error,
            ));
            return CONFORMANT_UNPROCESSABLE_ENTITY;
        }

        let job = Job {
            channel: String::new(),
            func: FUNC_CONC_EXAMPLE.to_string(),
            args: ConcArgs {
                corpus_path: resource.registry_path.clone(),
                query: engine_query,
                attrs: retrieve_attrs.clone(),
                max_items: DEFAULT_MAX_ITEMS,
                start_line: 0,
                max_context: 0,
                view_context_struct: view_context,
            },
        };
        match gateway.adapter.publish_job(job).await {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                response.add_diagnostic(Diagnostic::new(
                    DiagnosticType::GeneralSystemError,
                    e.to_string(),
                    "General system error",
                ));
                return StatusCode::INTERNAL_SERVER_ERROR;
            }
        }
    }

    // Join in corpus order. A failed slot becomes a diagnostic; the rows of
    // the surviving corpora are still serialized.
    let mut status = StatusCode::OK;
    let mut results: Vec<Option<ConcResult>> = Vec::with_capacity(handles.len());
    for handle in handles {
        let result = handle.recv().await;
        match result.err().cloned() {
            None => results.push(Some(result)),
            Some(error) if error.is_rows_range_out_of_conc() => {
                response.add_diagnostic(Diagnostic::new(
                    DiagnosticType::QueryCannotProcess,
                    "query",
                    error.message,
                ));
                status = worse_status(status, CONFORMANT_UNPROCESSABLE_ENTITY);
                results.push(None);
            }
            Some(error) => {
                response.add_diagnostic(Diagnostic::new(
                    DiagnosticType::GeneralSystemError,
                    error.message,
                    "General system error",
                ));
                status = worse_status(status, StatusCode::INTERNAL_SERVER_ERROR);
                results.push(None);
            }
        }
    }

    for (i, result) in results.iter().enumerate() {
        let Some(result) = result else { continue };
        let (web, ref_uri) = super::row_links(gateway, &corpora[i]);
        for line in &result.lines {
            let tokens = line
                .text
                .iter()
                .map(|token| HitToken {
                    text: token.word.clone(),
                    hit: token.strong,
                })
                .collect();
            response.rows.push(SearchRow {
                position: response.rows.len() + 1,
                pid: corpora[i].clone(),
                content: RowContent::Tokens(tokens),
                web: web.clone(),
                ref_uri: ref_uri.clone(),
            });
        }
    }
    status
}
