//! Workflow template loading and parameter injection.
//!
//! The workflow document is an opaque graph owned by the generation
//! engine: an object mapping node-id strings to node records, each with
//! an `inputs` object. This module knows a fixed set of key paths into
//! it, expressed as a declarative binding table rather than inline magic
//! strings. The table is validated against the loaded template before
//! any patching, so a template that drifted out from under the adapter
//! fails fast with a schema error instead of silently generating with
//! stale defaults.

use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::error::JobError;
use crate::params::TryonParams;

/// Semantic parameter slots the adapter can patch into the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Width,
    Height,
    Seed,
    HumanImage,
    TattooImage,
    Mask,
    OutputPrefix,
}

/// One entry of the binding table: a semantic slot tied to a
/// `(node id, input key)` path inside the workflow document.
#[derive(Debug, Clone, Copy)]
pub struct Binding {
    pub slot: Slot,
    pub node_id: &'static str,
    pub input_key: &'static str,
}

/// Binding table for the tryon graph template.
///
/// Node ids match the shipped `baseGraphTemplate.json`.
pub const DEFAULT_BINDINGS: &[Binding] = &[
    Binding { slot: Slot::Width, node_id: "27", input_key: "value" },
    Binding { slot: Slot::Height, node_id: "28", input_key: "value" },
    Binding { slot: Slot::Seed, node_id: "95", input_key: "seed" },
    Binding { slot: Slot::HumanImage, node_id: "33", input_key: "image" },
    Binding { slot: Slot::TattooImage, node_id: "96", input_key: "image" },
    Binding { slot: Slot::Mask, node_id: "153", input_key: "image" },
    Binding { slot: Slot::OutputPrefix, node_id: "143", input_key: "filename_prefix" },
];

/// On-disk paths of the materialized input images for one job.
///
/// `None` means the request did not carry that image, so the template
/// default stays in place.
#[derive(Debug, Default)]
pub struct ImagePaths {
    pub human: Option<PathBuf>,
    pub tattoo: Option<PathBuf>,
    pub mask: Option<PathBuf>,
}

/// A workflow document validated against a binding table.
///
/// Construction guarantees every bound `(node id, input key)` path
/// exists with the expected nested shape, so the setters cannot miss.
#[derive(Debug)]
pub struct WorkflowTemplate {
    doc: Value,
    bindings: &'static [Binding],
}

impl WorkflowTemplate {
    /// Read and parse the template file, then validate the bindings.
    pub fn load(path: &Path, bindings: &'static [Binding]) -> Result<Self, JobError> {
        let raw = std::fs::read_to_string(path)?;
        let doc: Value = serde_json::from_str(&raw)?;
        Self::from_value(doc, bindings)
    }

    /// Validate an already-parsed document against the binding table.
    pub fn from_value(doc: Value, bindings: &'static [Binding]) -> Result<Self, JobError> {
        validate_bindings(&doc, bindings)?;
        Ok(Self { doc, bindings })
    }

    /// Patch request-supplied values into the graph.
    ///
    /// Each field is written only if the request carried it; the output
    /// prefix is always written so every run tags its files with the
    /// job id.
    pub fn patch(&mut self, params: &TryonParams, images: &ImagePaths, output_prefix: &str) {
        if let Some(width) = params.width {
            self.set(Slot::Width, json!(width));
        }
        if let Some(height) = params.height {
            self.set(Slot::Height, json!(height));
        }
        if let Some(seed) = params.tryon_seed {
            self.set(Slot::Seed, json!(seed));
        }
        if let Some(path) = &images.human {
            self.set(Slot::HumanImage, json!(path.to_string_lossy()));
        }
        if let Some(path) = &images.tattoo {
            self.set(Slot::TattooImage, json!(path.to_string_lossy()));
        }
        if let Some(path) = &images.mask {
            self.set(Slot::Mask, json!(path.to_string_lossy()));
        }
        self.set(Slot::OutputPrefix, json!(output_prefix));
    }

    /// Current value of a bound input, for inspection.
    pub fn input(&self, slot: Slot) -> Option<&Value> {
        let binding = self.bindings.iter().find(|b| b.slot == slot)?;
        self.doc
            .get(binding.node_id)?
            .get("inputs")?
            .get(binding.input_key)
    }

    /// The full (possibly patched) workflow document.
    pub fn as_value(&self) -> &Value {
        &self.doc
    }

    fn set(&mut self, slot: Slot, value: Value) {
        // Paths were validated at construction, so both lookups hold.
        let Some(binding) = self.bindings.iter().find(|b| b.slot == slot) else {
            return;
        };
        if let Some(inputs) = self
            .doc
            .get_mut(binding.node_id)
            .and_then(|node| node.get_mut("inputs"))
        {
            inputs[binding.input_key] = value;
        }
    }
}

/// Check that every bound path exists in the document.
fn validate_bindings(doc: &Value, bindings: &[Binding]) -> Result<(), JobError> {
    let Some(nodes) = doc.as_object() else {
        return Err(JobError::SchemaMismatch {
            path: "top-level node object".to_string(),
        });
    };

    for binding in bindings {
        let inputs = nodes
            .get(binding.node_id)
            .and_then(|node| node.get("inputs"))
            .and_then(|inputs| inputs.as_object())
            .ok_or_else(|| JobError::SchemaMismatch {
                path: format!("node '{}' inputs object", binding.node_id),
            })?;
        if !inputs.contains_key(binding.input_key) {
            return Err(JobError::SchemaMismatch {
                path: format!(
                    "node '{}' input '{}'",
                    binding.node_id, binding.input_key
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    /// Minimal template with the same node ids as the shipped graph.
    fn fixture() -> Value {
        json!({
            "27": { "class_type": "PrimitiveInt", "inputs": { "value": 832 } },
            "28": { "class_type": "PrimitiveInt", "inputs": { "value": 1216 } },
            "95": { "class_type": "KSampler", "inputs": { "seed": 0, "cfg": 7.0 } },
            "33": { "class_type": "LoadImage", "inputs": { "image": "human_default.png" } },
            "96": { "class_type": "LoadImage", "inputs": { "image": "tattoo_default.png" } },
            "153": { "class_type": "LoadImage", "inputs": { "image": "mask_default.png" } },
            "143": { "class_type": "SaveImage", "inputs": { "filename_prefix": "ComfyUI" } },
        })
    }

    #[test]
    fn valid_template_passes_binding_validation() {
        assert!(WorkflowTemplate::from_value(fixture(), DEFAULT_BINDINGS).is_ok());
    }

    #[test]
    fn missing_node_is_a_schema_mismatch() {
        let mut doc = fixture();
        doc.as_object_mut().unwrap().remove("95");
        let err = WorkflowTemplate::from_value(doc, DEFAULT_BINDINGS).unwrap_err();
        assert_matches!(err, JobError::SchemaMismatch { path } if path.contains("'95'"));
    }

    #[test]
    fn missing_inputs_object_is_a_schema_mismatch() {
        let mut doc = fixture();
        doc["27"] = json!({ "class_type": "PrimitiveInt" });
        let err = WorkflowTemplate::from_value(doc, DEFAULT_BINDINGS).unwrap_err();
        assert_matches!(err, JobError::SchemaMismatch { path } if path.contains("'27'"));
    }

    #[test]
    fn missing_input_key_is_a_schema_mismatch() {
        let mut doc = fixture();
        doc["143"]["inputs"] = json!({ "images": ["142", 0] });
        let err = WorkflowTemplate::from_value(doc, DEFAULT_BINDINGS).unwrap_err();
        assert_matches!(
            err,
            JobError::SchemaMismatch { path } if path.contains("filename_prefix")
        );
    }

    #[test]
    fn non_object_document_is_a_schema_mismatch() {
        let err = WorkflowTemplate::from_value(json!([]), DEFAULT_BINDINGS).unwrap_err();
        assert_matches!(err, JobError::SchemaMismatch { .. });
    }

    #[test]
    fn patch_with_subset_leaves_other_defaults() {
        let mut template = WorkflowTemplate::from_value(fixture(), DEFAULT_BINDINGS).unwrap();
        let params = TryonParams {
            width: Some(512),
            ..TryonParams::default()
        };

        template.patch(&params, &ImagePaths::default(), "tryon_abcd1234");

        assert_eq!(template.input(Slot::Width), Some(&json!(512)));
        // Untouched slots keep their template defaults.
        assert_eq!(template.input(Slot::Height), Some(&json!(1216)));
        assert_eq!(template.input(Slot::Seed), Some(&json!(0)));
        assert_eq!(
            template.input(Slot::HumanImage),
            Some(&json!("human_default.png"))
        );
        // The output prefix is always rewritten.
        assert_eq!(
            template.input(Slot::OutputPrefix),
            Some(&json!("tryon_abcd1234"))
        );
    }

    #[test]
    fn patch_writes_numeric_fields_as_json_integers() {
        let mut template = WorkflowTemplate::from_value(fixture(), DEFAULT_BINDINGS).unwrap();
        let params = TryonParams {
            width: Some(640),
            height: Some(960),
            tryon_seed: Some(123456789),
            ..TryonParams::default()
        };

        template.patch(&params, &ImagePaths::default(), "tryon_x");

        for slot in [Slot::Width, Slot::Height, Slot::Seed] {
            let value = template.input(slot).unwrap();
            assert!(value.is_i64(), "{slot:?} should be an integer, got {value}");
        }
    }

    #[test]
    fn patch_writes_image_paths() {
        let mut template = WorkflowTemplate::from_value(fixture(), DEFAULT_BINDINGS).unwrap();
        let images = ImagePaths {
            human: Some(PathBuf::from("/jobs/j1/human.png")),
            tattoo: Some(PathBuf::from("/jobs/j1/tattoo.png")),
            mask: None,
        };

        template.patch(&TryonParams::default(), &images, "tryon_x");

        assert_eq!(
            template.input(Slot::HumanImage),
            Some(&json!("/jobs/j1/human.png"))
        );
        assert_eq!(
            template.input(Slot::TattooImage),
            Some(&json!("/jobs/j1/tattoo.png"))
        );
        assert_eq!(
            template.input(Slot::Mask),
            Some(&json!("mask_default.png"))
        );
    }

    #[test]
    fn patch_does_not_disturb_unbound_inputs() {
        let mut template = WorkflowTemplate::from_value(fixture(), DEFAULT_BINDINGS).unwrap();
        let params = TryonParams {
            tryon_seed: Some(7),
            ..TryonParams::default()
        };

        template.patch(&params, &ImagePaths::default(), "tryon_x");

        assert_eq!(template.as_value()["95"]["inputs"]["cfg"], json!(7.0));
        assert_eq!(template.as_value()["95"]["inputs"]["seed"], json!(7));
    }

    #[test]
    fn load_rejects_unparseable_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = WorkflowTemplate::load(&path, DEFAULT_BINDINGS).unwrap_err();
        assert_matches!(err, JobError::Json(_));
    }

    #[test]
    fn load_propagates_missing_file_as_io() {
        let dir = tempfile::tempdir().unwrap();
        let err =
            WorkflowTemplate::load(&dir.path().join("absent.json"), DEFAULT_BINDINGS).unwrap_err();
        assert_matches!(err, JobError::Io(_));
    }
}
