#[cfg(test)]
mod tests {
    use crate::corpus::types::{Resource, StructureMapping};
    use crate::corpus::ResourceRegistry;
    use std::collections::BTreeMap;

    fn resource(path: &str, attrs: &[&str]) -> Resource {
        Resource {
            registry_path: path.to_string(),
            pos_attrs: attrs.iter().map(|a| a.to_string()).collect(),
            default_search_attr: attrs.first().unwrap_or(&"word").to_string(),
            structures: StructureMapping {
                sentence: "s".to_string(),
                paragraph: "p".to_string(),
                utterance: "u".to_string(),
                turn: "t".to_string(),
            },
            view_context_unit: "sentence".to_string(),
            syntax_parent_attr: None,
            title: String::new(),
            description: String::new(),
            uri: String::new(),
            languages: vec![],
            web_uri: String::new(),
            ref_uri: String::new(),
        }
    }

    fn registry() -> ResourceRegistry {
        let mut map = BTreeMap::new();
        map.insert(
            "syn2020".to_string(),
            resource("/registry/syn2020", &["word", "lemma", "pos"]),
        );
        map.insert(
            "oral".to_string(),
            resource("/registry/oral", &["word", "lemma"]),
        );
        map.insert(
            "intercorp".to_string(),
            resource("/registry/intercorp", &["lemma", "word", "tag"]),
        );
        ResourceRegistry::new(map)
    }

    // ============================================================
    // Iteration order
    // ============================================================

    #[test]
    fn test_get_all_is_sorted_by_id() {
        let reg = registry();
        assert_eq!(reg.get_all(), vec!["intercorp", "oral", "syn2020"]);
    }

    #[test]
    fn test_get_all_is_stable_across_calls() {
        let reg = registry();
        assert_eq!(reg.get_all(), reg.get_all());
    }

    // ============================================================
    // Lookups
    // ============================================================

    #[test]
    fn test_registry_path_lookup() {
        let reg = registry();
        assert_eq!(reg.get_registry_path("oral"), Some("/registry/oral"));
        assert_eq!(reg.get_registry_path("nope"), None);
    }

    #[test]
    fn test_contains_and_get() {
        let reg = registry();
        assert!(reg.contains("syn2020"));
        assert!(!reg.contains("missing"));
        assert_eq!(reg.get("syn2020").unwrap().pos_attrs.len(), 3);
        assert!(reg.get("missing").is_none());
    }

    // ============================================================
    // Common attribute intersection
    // ============================================================

    #[test]
    fn test_common_pos_attrs_preserves_first_resource_order() {
        let reg = registry();
        // First id decides the order: intercorp lists lemma before word.
        let attrs = reg.common_pos_attrs(&[
            "intercorp".to_string(),
            "syn2020".to_string(),
            "oral".to_string(),
        ]);
        assert_eq!(attrs, vec!["lemma", "word"]);

        // Reversed selection keeps syn2020's order instead.
        let attrs = reg.common_pos_attrs(&["syn2020".to_string(), "intercorp".to_string()]);
        assert_eq!(attrs, vec!["word", "lemma"]);
    }

    #[test]
    fn test_common_pos_attrs_single_corpus() {
        let reg = registry();
        let attrs = reg.common_pos_attrs(&["syn2020".to_string()]);
        assert_eq!(attrs, vec!["word", "lemma", "pos"]);
    }

    #[test]
    fn test_common_pos_attrs_unknown_id_empties_intersection() {
        let reg = registry();
        let attrs = reg.common_pos_attrs(&["syn2020".to_string(), "missing".to_string()]);
        assert!(attrs.is_empty());
        assert!(reg.common_pos_attrs(&[]).is_empty());
    }
}
