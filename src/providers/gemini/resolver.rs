use std::collections::BTreeSet;

use super::types::GeminiModel;
use crate::error::{GatewayError, Result};

const MODEL_NAMESPACE: &str = "models/";

// 配置的默认模型之后依次尝试
pub const FALLBACK_MODELS: [&str; 4] = [
    "gemini-2.5-flash-lite",
    "gemini-2.5-flash-lite-latest",
    "gemini-2.5-flash",
    "gemini-2.5-flash-latest",
];

pub fn candidate_list(default_model: &str) -> Vec<String> {
    std::iter::once(default_model.trim())
        .chain(FALLBACK_MODELS)
        .map(str::to_string)
        .collect()
}

/// Names of models that support `generateContent`, in both the
/// `models/<id>` and bare `<id>` forms.
pub fn available_model_names(models: &[GeminiModel]) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for model in models.iter().filter(|m| m.supports_generate_content()) {
        names.insert(model.name.clone());
        if let Some(bare) = model.name.strip_prefix(MODEL_NAMESPACE) {
            names.insert(bare.to_string());
        }
    }
    names
}

/// Requested id wins when available; otherwise the first available
/// non-empty candidate.
pub fn resolve_model(
    requested: &str,
    available: &BTreeSet<String>,
    candidates: &[String],
) -> Result<String> {
    let wanted = requested.trim();
    if !wanted.is_empty() && available.contains(wanted) {
        return Ok(wanted.to_string());
    }

    candidates
        .iter()
        .find(|c| !c.is_empty() && available.contains(c.as_str()))
        .cloned()
        .ok_or_else(|| {
            GatewayError::Config(format!(
                "No supported model found. Available: {:?}",
                available.iter().collect::<Vec<_>>()
            ))
        })
}

/// Path segment for REST calls: bare ids get the `models/` namespace.
pub fn model_resource_name(model: &str) -> String {
    if model.contains('/') {
        model.to_string()
    } else {
        format!("{}{}", MODEL_NAMESPACE, model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn model(name: &str, methods: &[&str]) -> GeminiModel {
        GeminiModel {
            name: name.to_string(),
            supported_generation_methods: methods.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn available_names_include_both_forms_of_generating_models() {
        let names = available_model_names(&[
            model("models/foo", &["generateContent", "countTokens"]),
            model("models/embed", &["embedContent"]),
            model("tunedModels/bar", &["generateContent"]),
        ]);
        assert_eq!(names, set(&["foo", "models/foo", "tunedModels/bar"]));
    }

    #[test]
    fn requested_model_wins_when_available() {
        let available = set(&["models/foo", "foo", "models/bar"]);
        let candidates = candidate_list("models/bar");
        assert_eq!(resolve_model("foo", &available, &candidates).unwrap(), "foo");
        assert_eq!(
            resolve_model("  models/foo \n", &available, &candidates).unwrap(),
            "models/foo"
        );
    }

    #[test]
    fn falls_back_to_first_available_candidate() {
        let available = set(&["Y", "Z"]);
        let candidates: Vec<String> = ["", "X", "Y", "Z"].iter().map(|s| s.to_string()).collect();
        assert_eq!(resolve_model("", &available, &candidates).unwrap(), "Y");
        assert_eq!(resolve_model("unknown", &available, &candidates).unwrap(), "Y");
        assert_eq!(resolve_model("   ", &available, &candidates).unwrap(), "Y");
    }

    #[test]
    fn configured_default_precedes_hardcoded_fallbacks() {
        let available = set(&["gemini-2.5-flash", "gemini-2.5-flash-lite"]);
        let candidates = candidate_list("gemini-2.5-flash");
        assert_eq!(resolve_model("", &available, &candidates).unwrap(), "gemini-2.5-flash");

        let candidates = candidate_list("");
        assert_eq!(candidates[0], "");
        assert_eq!(
            resolve_model("", &available, &candidates).unwrap(),
            "gemini-2.5-flash-lite"
        );
    }

    #[test]
    fn no_candidate_lists_sorted_available_set() {
        let available = set(&["zeta", "alpha", "models/alpha"]);
        let err = resolve_model("missing", &available, &candidate_list("")).unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
        assert_eq!(
            err.to_string(),
            "Config error: No supported model found. Available: [\"alpha\", \"models/alpha\", \"zeta\"]"
        );
    }

    #[test]
    fn resource_name_adds_namespace_only_for_bare_ids() {
        assert_eq!(model_resource_name("foo"), "models/foo");
        assert_eq!(model_resource_name("models/foo"), "models/foo");
        assert_eq!(model_resource_name("tunedModels/bar"), "tunedModels/bar");
    }
}
