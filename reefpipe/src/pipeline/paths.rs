//! Destination key layout for published products.
//!
//! Every artifact of a quad lives under
//! `{dest_prefix}/{label}/{response_mapping}/{model_name}/{model_version}/`,
//! so re-runs with a new model version or mapping publish alongside old
//! products instead of over them. Markers sit one level up, at
//! `{dest_prefix}/{label}/`, because they describe the quad's source
//! imagery and apply to every model version.

/// Arg-max coarse classification, byte codes.
pub const CLASSIFICATION_TIF: &str = "classification.tif";
/// Coarse class probabilities, 0-100 byte scale, one band per class.
pub const PROBABILITIES_TIF: &str = "probabilities.tif";
/// Reef-class probability, 0-100 byte scale.
pub const REEF_HEATMAP_TIF: &str = "reef_heatmap.tif";
/// Reef presence mask, 1/0 bytes.
pub const REEF_OUTLINE_TIF: &str = "reef_outline.tif";

/// Every artifact a completed quad publishes.
pub const ARTIFACTS: [&str; 4] = [
    CLASSIFICATION_TIF,
    PROBABILITIES_TIF,
    REEF_HEATMAP_TIF,
    REEF_OUTLINE_TIF,
];

/// Computes destination keys for one (mapping, model, version) triple.
#[derive(Debug, Clone)]
pub struct DestLayout {
    dest_prefix: String,
    response_mapping: String,
    model_name: String,
    model_version: String,
}

impl DestLayout {
    pub fn new(
        dest_prefix: impl Into<String>,
        response_mapping: impl Into<String>,
        model_name: impl Into<String>,
        model_version: impl Into<String>,
    ) -> Self {
        Self {
            dest_prefix: dest_prefix.into(),
            response_mapping: response_mapping.into(),
            model_name: model_name.into(),
            model_version: model_version.into(),
        }
    }

    /// Key prefix all of a quad's artifacts share.
    pub fn quad_prefix(&self, label: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.dest_prefix, label, self.response_mapping, self.model_name, self.model_version
        )
    }

    /// Full key of one artifact of a quad.
    pub fn artifact_key(&self, label: &str, artifact: &str) -> String {
        format!("{}/{}", self.quad_prefix(label), artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_keys_are_versioned() {
        let layout = DestLayout::new("products/v2", "benthic", "reefnet", "3.1.0");
        assert_eq!(
            layout.artifact_key("L15-0331E-1257N", CLASSIFICATION_TIF),
            "products/v2/L15-0331E-1257N/benthic/reefnet/3.1.0/classification.tif"
        );
    }

    #[test]
    fn test_quad_prefix_groups_all_artifacts() {
        let layout = DestLayout::new("products/v2", "benthic", "reefnet", "3.1.0");
        let prefix = layout.quad_prefix("L15-0331E-1257N");
        for artifact in ARTIFACTS {
            assert!(layout
                .artifact_key("L15-0331E-1257N", artifact)
                .starts_with(&prefix));
        }
    }
}
