/// Parsed form of an FCS query. Immutable once built by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryNode {
    Term(String),
    Paren(Box<QueryNode>),
    Not(Box<QueryNode>),
    And(Box<QueryNode>, Box<QueryNode>),
    Or(Box<QueryNode>, Box<QueryNode>),
    Prox(Box<QueryNode>, Box<QueryNode>),
}

/// Emits the corpus engine's native query syntax for one resource.
///
/// Generation is a post-order fold over the AST. Each leaf becomes a single
/// `[attr="…"]` position using the resource's default search attribute.
/// Problems found during generation accumulate in `errors`; the returned
/// string is still the best effort, so callers must check both.
pub struct Generator {
    default_attr: String,
    errors: Vec<String>,
}

impl Generator {
    pub fn new(default_attr: &str) -> Self {
        Self {
            default_attr: default_attr.to_string(),
            errors: Vec::new(),
        }
    }

    pub fn generate(&mut self, root: &QueryNode) -> String {
        self.emit(root)
    }

    fn emit(&mut self, node: &QueryNode) -> String {
        match node {
            QueryNode::Term(text) => {
                format!(
                    "[{}=\"{}\"]",
                    self.default_attr,
                    text.replace('"', "\\\"")
                )
            }
            QueryNode::Paren(child) => format!("({})", self.emit(child)),
            QueryNode::Not(child) => format!("!{}", self.emit(child)),
            QueryNode::And(left, right) => {
                format!("{} & {}", self.emit(left), self.emit(right))
            }
            QueryNode::Or(left, right) => {
                format!("{} | {}", self.emit(left), self.emit(right))
            }
            QueryNode::Prox(left, right) => {
                format!("{} {}", self.emit(left), self.emit(right))
            }
        }
    }

    /// Maps an FCS within-context keyword to the engine's structure name.
    ///
    /// Unknown keywords produce `??` and an accumulated error so the caller
    /// can refuse the query instead of sending garbage to the engine.
    pub fn translate_within_ctx(&mut self, unit: &str) -> String {
        match unit {
            "sentence" | "s" => "s".to_string(),
            "utterance" | "u" => "u".to_string(),
            "paragraph" | "p" => "p".to_string(),
            "turn" | "t" => "t".to_string(),
            "text" => "doc".to_string(),
            "session" => "session".to_string(),
            other => {
                self.add_error(format!("unknown within-context unit: {}", other));
                "??".to_string()
            }
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}
