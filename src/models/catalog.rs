//! Denoising model metadata catalog.
//!
//! Maps a model identifier to its display name, default file location, and
//! notes. None of these models ship with hushmic and none offer a stable
//! automatic download, so the notes carry manual export/download
//! instructions. Resolving an identifier to an existing file is the
//! caller's concern; the pipeline only ever sees a resolved path.

use std::path::Path;

/// Metadata for a denoising model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    /// Model identifier (e.g., "silero")
    pub name: &'static str,
    /// Human-readable name
    pub display_name: &'static str,
    /// Default location relative to the working directory
    pub default_path: &'static str,
    /// On-disk format
    pub format: &'static str,
    /// Provenance and manual download notes
    pub notes: &'static str,
}

/// Catalog of supported denoising models.
///
/// The engine consumes ONNX graphs, so each entry points at an ONNX export
/// of the published model.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "silero",
        display_name: "Silero Denoiser",
        default_path: "models/silero-denoiser.onnx",
        format: ".onnx",
        notes: "Fast, robust, and widely used for speech denoising. \
                No automatic download; export the published checkpoint to ONNX. \
                See: https://github.com/snakers4/silero-models",
    },
    ModelInfo {
        name: "facebook-denoiser",
        display_name: "Facebook Denoiser",
        default_path: "models/facebook-denoiser.onnx",
        format: ".onnx",
        notes: "Official Facebook Denoiser (DNS) model. \
                No automatic download; export the published checkpoint to ONNX. \
                See: https://github.com/facebookresearch/denoiser",
    },
    ModelInfo {
        name: "dcunet",
        display_name: "DCUNet (SpeechBrain)",
        default_path: "models/dcunet-16khz.onnx",
        format: ".onnx",
        notes: "DCUNet model from SpeechBrain, trained at 16kHz. \
                No automatic download; export the published checkpoint to ONNX. \
                See: https://github.com/speechbrain/speechbrain",
    },
];

/// Find a model by name.
pub fn get_model(name: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.name == name)
}

/// Get all available models.
pub fn list_models() -> &'static [ModelInfo] {
    MODELS
}

/// The default recommended model.
pub fn default_model() -> &'static ModelInfo {
    get_model(crate::defaults::DEFAULT_MODEL)
        .expect("default model should always be present in catalog")
}

/// Instructions printed when a model file is missing.
pub fn missing_model_message(info: &ModelInfo, path: &Path) -> String {
    let dir = path
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ".".to_string());
    format!(
        "The {} model file was not found.\n\
         {}\n\
         Place the exported file at:\n  {}\n\
         Create the directory if it does not exist:\n  \
         mkdir -p {}\n  mv <exported_file> {}",
        info.display_name,
        info.notes,
        path.display(),
        dir,
        path.display(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_model_exists() {
        let model = get_model("silero").unwrap();
        assert_eq!(model.name, "silero");
        assert_eq!(model.display_name, "Silero Denoiser");
        assert_eq!(model.format, ".onnx");
    }

    #[test]
    fn test_get_model_not_found() {
        assert!(get_model("nonexistent").is_none());
    }

    #[test]
    fn test_list_models_not_empty() {
        let models = list_models();
        assert_eq!(models.len(), 3);
    }

    #[test]
    fn test_default_model_is_silero() {
        assert_eq!(default_model().name, "silero");
    }

    #[test]
    fn test_all_entries_are_onnx() {
        for model in list_models() {
            assert_eq!(model.format, ".onnx");
            assert!(model.default_path.ends_with(".onnx"));
        }
    }

    #[test]
    fn test_missing_model_message_includes_path_and_notes() {
        let info = get_model("dcunet").unwrap();
        let path = Path::new("models/dcunet-16khz.onnx");
        let message = missing_model_message(info, path);
        assert!(message.contains("DCUNet"));
        assert!(message.contains("models/dcunet-16khz.onnx"));
        assert!(message.contains("mkdir -p models"));
        assert!(message.contains("speechbrain"));
    }
}
