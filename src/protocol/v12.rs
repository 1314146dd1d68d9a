//! Version 1.2 subhandler.
//!
//! Follows the original protocol generation: a single error slot (the first
//! failure aborts the whole request), integer diagnostic codes and KWIC
//! tri-split result rows. The error taxonomy is shared with 2.0: unparseable
//! queries answer QuerySyntaxError and generation failures QueryCannotProcess,
//! both as conformant 422. Only the code rendering differs (integers here,
//! SRW URIs in 2.0).

use super::diagnostics::{Diagnostic, DiagnosticType, CONFORMANT_UNPROCESSABLE_ENTITY};
use super::response::{FcsResponse, Operation, RecordPacking, RowContent, SearchRow};
use super::{FcsOutcome, Gateway, Params};
use super::{DEFAULT_MAX_ITEMS, QUERY_EXPLAIN, QUERY_GENERAL, QUERY_SEARCH_RETRIEVE};

use crate::broker::types::FUNC_CONC_EXAMPLE;
use crate::broker::{ConcArgs, Job, Line};
use crate::query::{self, Generator};

use axum::http::StatusCode;

pub async fn handle(gateway: &Gateway, params: &Params) -> FcsOutcome {
    let mut response = FcsResponse::new("1.2");

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
            return StatusCode::BAD_REQUEST;
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
            return StatusCode::BAD_REQUEST;
        }
    }

    let fcs_query = params.get("query").map(String::as_str).unwrap_or("");
    if fcs_query.is_empty() {
        response.add_diagnostic(Diagnostic::new(
            DiagnosticType::MandatoryParameterNotSupplied,
            "fcs_query",
            "Mandatory parameter not supplied",
        ));
        return StatusCode::BAD_REQUEST;
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

    // Target corpora: an explicit context narrows the fan-out, absence means
    // every registered corpus.
    let corpora: Vec<String> = match params.get("x-fcs-context") {
        Some(context) => {
            let selected: Vec<String> = context.split(',').map(str::to_string).collect();
            for id in &selected {
                if !gateway.registry.contains(id) {
                    response.add_diagnostic(Diagnostic::new(
                        DiagnosticType::UnsupportedParameterValue,
                        "x-fcs-context",
                        format!("Unknown context {}", id),
                    ));
                    return StatusCode::BAD_REQUEST;
                }
            }
            selected
        }
        None => gateway.registry.get_all(),
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

    // Join in corpus order; any failed slot aborts the whole 1.2 request.
    // The worker's rows-out-of-range sentinel means the query itself cannot
    // be processed, so it downgrades the failure to a conformant 422.
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        let result = handle.recv().await;
        if let Some(error) = result.err() {
            response.add_diagnostic(Diagnostic::new(
                DiagnosticType::GeneralSystemError,
                error.message.clone(),
                "General system error",
            ));
            if error.is_rows_range_out_of_conc() {
                return CONFORMANT_UNPROCESSABLE_ENTITY;
            }
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        results.push(result);
    }

    for (i, result) in results.iter().enumerate() {
        let (web, ref_uri) = super::row_links(gateway, &corpora[i]);
        for line in &result.lines {
            let (left, kwic, right) = kwic_split(line);
            response.rows.push(SearchRow {
                position: response.rows.len() + 1,
                pid: corpora[i].clone(),
                content: RowContent::Kwic { left, kwic, right },
                web: web.clone(),
                ref_uri: ref_uri.clone(),
            });
        }
    }
    StatusCode::OK
}

/// Split a concordance line around its hit: tokens before the first strong
/// token form the left context, strong tokens the KWIC, everything else after
/// the first strong token the right context.
fn kwic_split(line: &Line) -> (String, String, String) {
    let mut left = String::new();
    let mut kwic = String::new();
    let mut right = String::new();
    let mut hit = false;

    for token in &line.text {
        if token.strong {
            hit = true;
        }
        if hit {
            if token.strong {
                kwic.push_str(&token.word);
                kwic.push(' ');
            } else {
                right.push_str(&token.word);
                right.push(' ');
            }
        } else {
            left.push_str(&token.word);
            left.push(' ');
        }
    }

    (
        left.trim().to_string(),
        kwic.trim().to_string(),
        right.trim().to_string(),
    )
}
