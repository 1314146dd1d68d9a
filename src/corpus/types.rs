use serde::{Deserialize, Serialize};

/// Names of the structural units of a corpus, as known to its engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StructureMapping {
    pub sentence: String,
    pub paragraph: String,
    pub utterance: String,
    pub turn: String,
}

/// Metadata of a single corpus exposed through the gateway.
///
/// `registry_path` is an opaque string passed to the worker; the gateway never
/// interprets it. `default_search_attr` parameterizes query generation for
/// this corpus. The explain/row metadata fields (`title`, `description`,
/// `uri`, `languages`, `web_uri`, `ref_uri`) default to empty values when not
/// configured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    pub registry_path: String,
    pub pos_attrs: Vec<String>,
    pub default_search_attr: String,
    #[serde(default)]
    pub structures: StructureMapping,
    /// FCS context-unit keyword ("sentence", "paragraph", ...) naming the
    /// structure that bounds KWIC context for this corpus.
    #[serde(default = "default_view_context_unit")]
    pub view_context_unit: String,
    /// Parent-index attribute for corpora with a syntactic layer.
    #[serde(default)]
    pub syntax_parent_attr: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub web_uri: String,
    #[serde(default)]
    pub ref_uri: String,
}

fn default_view_context_unit() -> String {
    "sentence".to_string()
}
