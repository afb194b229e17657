use super::registry::{ModelRegistry, ModelSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub model: ModelSpec,
    pub requested: Option<String>,
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ModelSelector {
    pub registry: ModelRegistry,
}

impl ModelSelector {
    pub fn new(registry: Option<ModelRegistry>) -> Self {
        Self {
            registry: registry.unwrap_or_else(|| ModelRegistry::new(None)),
        }
    }

    /// Resolves `requested` against the registry. Anything it cannot serve
    /// falls back to the first model registered for `capability`, with the
    /// reason recorded.
    pub fn select(
        &self,
        requested: Option<&str>,
        capability: &str,
    ) -> Result<ModelSelection, String> {
        let requested = requested.map(str::trim).filter(|name| !name.is_empty());
        if let Some(model) = requested.and_then(|name| self.registry.ensure(name, capability)) {
            return Ok(ModelSelection {
                model,
                requested: requested.map(str::to_string),
                fallback_reason: None,
            });
        }

        let Some(model) = self.registry.by_capability(capability).into_iter().next() else {
            return Err(format!("no {capability} model is registered"));
        };
        let fallback_reason = match requested {
            Some(name) if self.registry.get(name).is_some() => format!(
                "model '{name}' cannot serve {capability} requests; using '{}'",
                model.name
            ),
            Some(name) => format!("unknown {capability} model '{name}'; using '{}'", model.name),
            None => format!("no {capability} model requested; using '{}'", model.name),
        };
        Ok(ModelSelection {
            model,
            requested: requested.map(str::to_string),
            fallback_reason: Some(fallback_reason),
        })
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use crate::models::{ModelRegistry, ModelSelector, ModelSpec, IMAGE, TEXT};

    fn image_model(name: &str) -> ModelSpec {
        ModelSpec {
            name: name.to_string(),
            provider: "gemini".to_string(),
            capabilities: vec![IMAGE.to_string()],
        }
    }

    #[test]
    fn falls_back_when_requested_model_unavailable() {
        let mut models = IndexMap::new();
        models.insert("img-fallback".to_string(), image_model("img-fallback"));
        let selection = ModelSelector::new(Some(ModelRegistry::new(Some(models))))
            .select(Some("missing"), IMAGE)
            .unwrap();
        assert_eq!(selection.model.name, "img-fallback");
        assert_eq!(selection.requested.as_deref(), Some("missing"));
        assert_eq!(
            selection.fallback_reason.as_deref(),
            Some("unknown image model 'missing'; using 'img-fallback'")
        );
    }

    #[test]
    fn blank_request_uses_default_with_explanation() {
        let selection = ModelSelector::new(None).select(Some("  "), TEXT).unwrap();
        assert_eq!(selection.model.name, "Llama-3.3-70B-Instruct");
        assert_eq!(
            selection.fallback_reason.as_deref(),
            Some("no text model requested; using 'Llama-3.3-70B-Instruct'")
        );
    }

    #[test]
    fn capability_mismatch_is_a_fallback() {
        let selection = ModelSelector::new(None)
            .select(Some("gpt-4o-mini"), IMAGE)
            .unwrap();
        assert_eq!(selection.model.name, "gemini-2.0-flash-exp-image-generation");
        assert_eq!(
            selection.fallback_reason.as_deref(),
            Some(
                "model 'gpt-4o-mini' cannot serve image requests; \
                 using 'gemini-2.0-flash-exp-image-generation'"
            )
        );
    }

    #[test]
    fn known_model_is_selected_verbatim() {
        let selection = ModelSelector::new(None)
            .select(Some("gpt-4o-mini"), TEXT)
            .unwrap();
        assert_eq!(selection.model.provider, "github-models");
        assert!(selection.fallback_reason.is_none());
    }

    #[test]
    fn errors_when_no_models_for_capability() {
        let mut models = IndexMap::new();
        models.insert("img".to_string(), image_model("img"));
        let err = ModelSelector::new(Some(ModelRegistry::new(Some(models))))
            .select(Some("Llama-3.3-70B-Instruct"), TEXT)
            .err()
            .unwrap_or_default();
        assert_eq!(err, "no text model is registered");
    }
}
