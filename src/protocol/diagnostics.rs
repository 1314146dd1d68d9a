use axum::http::StatusCode;

/// FCS 2.0 requires validation failures to travel as diagnostics inside a
/// well-formed envelope; the "conformant 400" is an HTTP 200 whose body
/// carries the diagnostic.
pub const CONFORMANT_BAD_REQUEST: StatusCode = StatusCode::OK;
/// Queries the endpoint understands but cannot process answer with a literal
/// 422 plus the diagnostic.
pub const CONFORMANT_UNPROCESSABLE_ENTITY: StatusCode = StatusCode::UNPROCESSABLE_ENTITY;

/// Everything that can go wrong with a request, shared by both protocol
/// versions. Version 1.2 renders the code as a small integer, version 2.0 as
/// an SRW diagnostic URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticType {
    GeneralSystemError,
    UnsupportedOperation,
    UnsupportedVersion,
    UnsupportedParameterValue,
    MandatoryParameterNotSupplied,
    UnsupportedParameter,
    UnsupportedRecordPacking,
    QuerySyntaxError,
    QueryCannotProcess,
}

impl DiagnosticType {
    /// SRU diagnostic number, shared by both renderings.
    pub fn number(&self) -> u32 {
        match self {
            DiagnosticType::GeneralSystemError => 1,
            DiagnosticType::UnsupportedOperation => 4,
            DiagnosticType::UnsupportedVersion => 5,
            DiagnosticType::UnsupportedParameterValue => 6,
            DiagnosticType::MandatoryParameterNotSupplied => 7,
            DiagnosticType::UnsupportedParameter => 8,
            DiagnosticType::QuerySyntaxError => 10,
            DiagnosticType::QueryCannotProcess => 47,
            DiagnosticType::UnsupportedRecordPacking => 71,
        }
    }

    /// Integer code as rendered by the 1.2 envelope.
    pub fn code_v12(&self) -> u32 {
        self.number()
    }

    /// URI code as rendered by the 2.0 envelope.
    pub fn uri_v20(&self) -> String {
        format!("info:srw/diagnostic/1/{}", self.number())
    }
}

/// One structured error entry of the response envelope. `ident` echoes the
/// offending input.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub dtype: DiagnosticType,
    pub ident: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        dtype: DiagnosticType,
        ident: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            dtype,
            ident: ident.into(),
            message: message.into(),
        }
    }
}

/// Pick the more severe of two HTTP statuses; the response status is the
/// worst diagnostic present.
pub fn worse_status(a: StatusCode, b: StatusCode) -> StatusCode {
    fn rank(status: StatusCode) -> u8 {
        match status {
            StatusCode::INTERNAL_SERVER_ERROR => 3,
            StatusCode::UNPROCESSABLE_ENTITY => 2,
            StatusCode::BAD_REQUEST => 1,
            _ => 0,
        }
    }
    if rank(b) > rank(a) {
        b
    } else {
        a
    }
}
