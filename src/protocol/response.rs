use super::diagnostics::Diagnostic;

/// Records-per-response ceiling echoed by explain.
pub const MAXIMUM_RECORDS: usize = 250;
/// Terms-per-scan ceiling echoed by explain.
pub const MAXIMUM_TERMS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Explain,
    Scan,
    SearchRetrieve,
}

impl Operation {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "explain" => Some(Operation::Explain),
            "scan" => Some(Operation::Scan),
            "searchRetrieve" => Some(Operation::SearchRetrieve),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Explain => "explain",
            Operation::Scan => "scan",
            Operation::SearchRetrieve => "searchRetrieve",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordPacking {
    Xml,
    Str,
}

impl RecordPacking {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "xml" => Some(RecordPacking::Xml),
            "string" => Some(RecordPacking::Str),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordPacking::Xml => "xml",
            RecordPacking::Str => "string",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            RecordPacking::Xml => "application/xml",
            RecordPacking::Str => "text/plain; charset=utf-8",
        }
    }
}

/// Server identity and database metadata echoed by the explain operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplainBlock {
    pub server_name: String,
    pub server_port: String,
    pub database: String,
    pub database_title: String,
    pub database_description: String,
}

/// One corpus as advertised by the endpoint description.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceInfo {
    pub pid: String,
    pub title: String,
    pub description: String,
    pub uri: String,
    pub languages: Vec<String>,
}

/// One token of a version 2.0 result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitToken {
    pub text: String,
    pub hit: bool,
}

/// Version-specific shape of a result row: 1.2 splits the line around the
/// hit, 2.0 keeps the token stream with per-token hit flags.
#[derive(Debug, Clone, PartialEq)]
pub enum RowContent {
    Kwic {
        left: String,
        kwic: String,
        right: String,
    },
    Tokens(Vec<HitToken>),
}

/// One concordance row of the search-retrieve block. `position` is 1-based
/// and strictly increasing across the union of all corpus results.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRow {
    pub position: usize,
    pub pid: String,
    pub content: RowContent,
    pub web: String,
    pub ref_uri: String,
}

/// The single in-memory response shape, rendered per version. Everything a
/// response body may contain lives here; the renderer reads nothing else.
#[derive(Debug, Clone)]
pub struct FcsResponse {
    pub version: String,
    pub record_packing: RecordPacking,
    pub operation: Operation,
    pub maximum_records: usize,
    pub maximum_terms: usize,
    pub explain: ExplainBlock,
    pub resources: Vec<ResourceInfo>,
    pub rows: Vec<SearchRow>,
    pub diagnostics: Vec<Diagnostic>,
}

impl FcsResponse {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            record_packing: RecordPacking::Xml,
            operation: Operation::Explain,
            maximum_records: MAXIMUM_RECORDS,
            maximum_terms: MAXIMUM_TERMS,
            explain: ExplainBlock::default(),
            resources: Vec::new(),
            rows: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}
