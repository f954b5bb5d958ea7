//! Model import front door.
//!
//! Detects the format of a byte buffer (magic bytes first, then the file
//! name hint) and hands it to the first registered [`ModelImporter`] that
//! supports it. glTF/GLB is built in; STEP is recognised but needs an
//! importer supplied by the host.
//!
//! # Examples
//!
//! ```no_run
//! use partview_scene::loader::ImporterRegistry;
//! use partview_scene::Scene;
//!
//! let bytes = std::fs::read("assembly.glb").unwrap();
//! let mut scene = Scene::new();
//! let model = ImporterRegistry::new()
//!     .import(&bytes, Some("assembly.glb"), &mut scene)
//!     .unwrap();
//! println!("loaded {:?} as node {}", model.format, model.root);
//! ```

use std::fmt;
use std::path::Path;

use thiserror::Error;

use crate::gltf::GltfImporter;
use crate::{NodeId, Scene};

/// Model formats the loader can recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFormat {
    /// Binary glTF container
    Glb,
    /// glTF JSON with embedded (data URI) buffers
    GltfJson,
    /// ISO 10303-21 exchange file
    Step,
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelFormat::Glb => "GLB",
            ModelFormat::GltfJson => "glTF",
            ModelFormat::Step => "STEP",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while importing a model.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("Unknown file format")]
    UnknownFormat,

    #[error("No importer registered for {0} files")]
    NoImporter(ModelFormat),

    #[error("Model contains no nodes")]
    EmptyModel,

    #[error("Scene error: {0}")]
    Scene(String),
}

/// A successfully imported model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportedModel {
    /// Group node holding the whole model; a root node of the scene
    pub root: NodeId,
    pub format: ModelFormat,
}

/// A pluggable model importer.
///
/// `import` adds the model under a single new root node and returns it.
/// On error the scene must be left as it was.
pub trait ModelImporter {
    /// Short human-readable name, used in logs.
    fn name(&self) -> &str;

    fn supports(&self, format: ModelFormat) -> bool;

    fn import(&self, bytes: &[u8], scene: &mut Scene) -> Result<NodeId, ImportError>;
}

// ============================================================================
// Format Detection
// ============================================================================

/// Detect format from magic bytes.
pub fn detect_format_from_bytes(bytes: &[u8]) -> Result<ModelFormat, ImportError> {
    if bytes.len() < 4 {
        return Err(ImportError::UnknownFormat);
    }

    // glTF binary (.glb) starts with "glTF"
    if bytes.starts_with(b"glTF") {
        return Ok(ModelFormat::Glb);
    }

    // Text formats may carry a BOM or leading whitespace
    let text = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let Some(start) = text.iter().position(|&b| !b.is_ascii_whitespace()) else {
        return Err(ImportError::UnknownFormat);
    };
    let text = &text[start..];

    if text.starts_with(b"{") {
        return Ok(ModelFormat::GltfJson);
    }
    if text.starts_with(b"ISO-10303-21") {
        return Ok(ModelFormat::Step);
    }

    Err(ImportError::UnknownFormat)
}

/// Detect format from file extension as a fallback.
pub fn detect_format_from_extension(path: &Path) -> Result<ModelFormat, ImportError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("glb") => Ok(ModelFormat::Glb),
        Some("gltf") => Ok(ModelFormat::GltfJson),
        Some("step") | Some("stp") => Ok(ModelFormat::Step),
        _ => Err(ImportError::UnknownFormat),
    }
}

/// Detects a model's format from its content, falling back to the name hint.
pub fn detect_format(bytes: &[u8], name_hint: Option<&str>) -> Result<ModelFormat, ImportError> {
    detect_format_from_bytes(bytes).or_else(|err| match name_hint {
        Some(name) => detect_format_from_extension(Path::new(name)),
        None => Err(err),
    })
}

// ============================================================================
// Registry
// ============================================================================

/// Ordered list of importers. The first one supporting a format wins.
pub struct ImporterRegistry {
    importers: Vec<Box<dyn ModelImporter>>,
}

impl Default for ImporterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ImporterRegistry {
    /// Registry with the built-in glTF importer.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(GltfImporter));
        registry
    }

    pub fn empty() -> Self {
        Self {
            importers: Vec::new(),
        }
    }

    /// Adds an importer behind the existing ones.
    pub fn register(&mut self, importer: Box<dyn ModelImporter>) {
        log::debug!("Registered importer '{}'", importer.name());
        self.importers.push(importer);
    }

    pub fn importer_for(&self, format: ModelFormat) -> Option<&dyn ModelImporter> {
        self.importers
            .iter()
            .find(|importer| importer.supports(format))
            .map(|importer| importer.as_ref())
    }

    /// Detects the format and imports the model into `scene`.
    pub fn import(
        &self,
        bytes: &[u8],
        name_hint: Option<&str>,
        scene: &mut Scene,
    ) -> Result<ImportedModel, ImportError> {
        let format = detect_format(bytes, name_hint)?;
        let importer = self
            .importer_for(format)
            .ok_or(ImportError::NoImporter(format))?;

        log::info!(
            "Importing {} model ({} bytes) with '{}'",
            format,
            bytes.len(),
            importer.name()
        );

        let root = importer.import(bytes, scene)?;
        Ok(ImportedModel { root, format })
    }

    /// Reads a file and imports it, using the path as the name hint.
    pub fn import_path(
        &self,
        path: impl AsRef<Path>,
        scene: &mut Scene,
    ) -> Result<ImportedModel, ImportError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        self.import(&bytes, path.to_str(), scene)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Stand-in for a host STEP tessellator: adds an empty group.
    struct FakeStepImporter;

    impl ModelImporter for FakeStepImporter {
        fn name(&self) -> &str {
            "fake-step"
        }

        fn supports(&self, format: ModelFormat) -> bool {
            format == ModelFormat::Step
        }

        fn import(&self, _bytes: &[u8], scene: &mut Scene) -> Result<NodeId, ImportError> {
            scene
                .add_default_node(None, Some("step".into()))
                .map_err(|e| ImportError::Scene(e.to_string()))
        }
    }

    const STEP_HEADER: &[u8] = b"ISO-10303-21;\nHEADER;\nENDSEC;\n";

    #[test]
    fn test_detect_glb() {
        let bytes = b"glTF\x02\x00\x00\x00rest";
        assert_eq!(detect_format_from_bytes(bytes).unwrap(), ModelFormat::Glb);
    }

    #[test]
    fn test_detect_gltf_json() {
        let bytes = b"  { \"asset\": {} }";
        assert_eq!(detect_format_from_bytes(bytes).unwrap(), ModelFormat::GltfJson);

        let with_bom = b"\xEF\xBB\xBF{\"asset\":{}}";
        assert_eq!(detect_format_from_bytes(with_bom).unwrap(), ModelFormat::GltfJson);
    }

    #[test]
    fn test_detect_step() {
        assert_eq!(detect_format_from_bytes(STEP_HEADER).unwrap(), ModelFormat::Step);
    }

    #[test]
    fn test_detect_unknown() {
        assert!(detect_format_from_bytes(b"\x00\x00\x00\x00").is_err());
        assert!(detect_format_from_bytes(b"gl").is_err());
        assert!(detect_format_from_bytes(b"      ").is_err());
    }

    #[test]
    fn test_detect_from_extension() {
        assert_eq!(
            detect_format_from_extension(Path::new("model.glb")).unwrap(),
            ModelFormat::Glb
        );
        assert_eq!(
            detect_format_from_extension(Path::new("model.gltf")).unwrap(),
            ModelFormat::GltfJson
        );
        assert_eq!(
            detect_format_from_extension(Path::new("PART.STP")).unwrap(),
            ModelFormat::Step
        );
        assert!(detect_format_from_extension(Path::new("model.obj")).is_err());
    }

    #[test]
    fn test_detect_prefers_content_over_name() {
        let format = detect_format(b"glTF\x02\x00\x00\x00", Some("misnamed.step")).unwrap();
        assert_eq!(format, ModelFormat::Glb);

        let format = detect_format(b"\x00\x01\x02\x03", Some("part.step")).unwrap();
        assert_eq!(format, ModelFormat::Step);

        assert!(detect_format(b"\x00\x01\x02\x03", None).is_err());
    }

    #[test]
    fn test_step_without_importer() {
        let registry = ImporterRegistry::new();
        let mut scene = Scene::new();

        let result = registry.import(STEP_HEADER, Some("part.step"), &mut scene);

        assert!(matches!(result, Err(ImportError::NoImporter(ModelFormat::Step))));
        assert!(scene.nodes.is_empty());
    }

    #[test]
    fn test_step_with_registered_importer() {
        let mut registry = ImporterRegistry::new();
        registry.register(Box::new(FakeStepImporter));
        let mut scene = Scene::new();

        let model = registry.import(STEP_HEADER, None, &mut scene).unwrap();

        assert_eq!(model.format, ModelFormat::Step);
        assert_eq!(scene.root_nodes(), &[model.root]);
    }

    #[test]
    fn test_empty_registry_rejects_gltf() {
        let registry = ImporterRegistry::empty();
        let mut scene = Scene::new();
        let result = registry.import(b"glTF\x02\x00\x00\x00", None, &mut scene);
        assert!(matches!(result, Err(ImportError::NoImporter(ModelFormat::Glb))));
    }

    #[test]
    fn test_import_path_missing_file() {
        let registry = ImporterRegistry::new();
        let mut scene = Scene::new();
        let result = registry.import_path("/nonexistent/partview/model.glb", &mut scene);
        assert!(matches!(result, Err(ImportError::Io(_))));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ImportError::NoImporter(ModelFormat::Step).to_string(),
            "No importer registered for STEP files"
        );
        assert_eq!(ImportError::UnknownFormat.to_string(), "Unknown file format");
    }
}
