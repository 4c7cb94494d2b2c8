//! Deterministic header generation from parsed metadata.
//!
//! Two outputs per run family:
//!
//! - one `<stem>.gen.hpp` per source header with reflected entities, holding
//!   type descriptors for its classes and enums
//! - one `Enum<Base>.gen.hpp` per factory family, holding the discriminant
//!   enum and the dispatch factory
//!
//! Templates are tera text embedded in the binary. Rendering consults no
//! clock and no environment, and every collection arrives pre-ordered from
//! its producer, so equal inputs always produce byte-equal output. Target
//! files are always overwritten; output recency is the cache's concern.

use std::path::{Path, PathBuf};

use tera::Tera;

use crate::resolver::{include_path, strip_leading_i};
use crate::types::{ClassInfo, EnumInfo, FactoryFamily};

/// A rendering failure: template evaluation or output I/O.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Template evaluation failed.
    #[error("Template error for '{name}': {detail}")]
    Template { name: String, detail: String },

    /// The output file could not be written.
    #[error("Failed to write '{path}': {detail}")]
    Io { path: String, detail: String },
}

/// Renders generated headers into the configured output directory.
pub struct Renderer {
    tera: Tera,
    output_dir: PathBuf,
    project_namespace: String,
}

impl Renderer {
    /// Build a renderer with the embedded templates.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Template`] if an embedded template fails to
    /// compile; that only happens when the template sources themselves are
    /// broken, so it is treated as a configuration failure by the driver.
    pub fn new(output_dir: PathBuf, project_namespace: &str) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_templates([
            (
                "reflection.gen.hpp",
                include_str!("../templates/reflection.gen.hpp.tera"),
            ),
            (
                "enum_factory.gen.hpp",
                include_str!("../templates/enum_factory.gen.hpp.tera"),
            ),
        ])
        .map_err(|e| RenderError::Template {
            name: "embedded templates".to_owned(),
            detail: e.to_string(),
        })?;

        Ok(Self {
            tera,
            output_dir,
            project_namespace: project_namespace.to_owned(),
        })
    }

    /// Render the per-source reflection header for one parsed file.
    ///
    /// Returns `Ok(None)` when the file holds no reflected entities (no
    /// output is produced), otherwise the path of the written header.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] on template evaluation or write failure; the
    /// driver counts these as per-file errors and continues.
    pub fn render_reflection(
        &self,
        classes: &[ClassInfo],
        enums: &[EnumInfo],
        source_path: &Path,
        include_dirs: &[PathBuf],
    ) -> Result<Option<PathBuf>, RenderError> {
        if classes.is_empty() && enums.is_empty() {
            return Ok(None);
        }

        let input_filename = source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = source_path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut context = tera::Context::new();
        context.insert("input_filename", &input_filename);
        context.insert(
            "include_path",
            &include_path(&source_path.display().to_string(), include_dirs),
        );
        context.insert("project_namespace", &self.project_namespace);
        context.insert("classes", classes);
        context.insert("enums", enums);

        let output_path = self.output_dir.join(format!("{stem}.gen.hpp"));
        self.render_to("reflection.gen.hpp", &context, &output_path)?;
        Ok(Some(output_path))
    }

    /// Render the enum+factory header for one factory family.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] on template evaluation or write failure.
    pub fn render_factory(
        &self,
        family: &FactoryFamily,
        source_header_name: &str,
    ) -> Result<PathBuf, RenderError> {
        let mut context = tera::Context::new();
        context.insert("input_filename", source_header_name);
        context.insert("project_namespace", &self.project_namespace);
        context.insert("family", family);

        let output_path = self
            .output_dir
            .join(format!("Enum{}.gen.hpp", strip_leading_i(&family.base.name)));
        self.render_to("enum_factory.gen.hpp", &context, &output_path)?;
        Ok(output_path)
    }

    /// Evaluate one template and overwrite the target file.
    fn render_to(
        &self,
        template: &str,
        context: &tera::Context,
        output_path: &Path,
    ) -> Result<(), RenderError> {
        let rendered = self
            .tera
            .render(template, context)
            .map_err(|e| RenderError::Template {
                name: template.to_owned(),
                detail: e.to_string(),
            })?;

        std::fs::create_dir_all(&self.output_dir).map_err(|e| RenderError::Io {
            path: self.output_dir.display().to_string(),
            detail: e.to_string(),
        })?;

        std::fs::write(output_path, rendered).map_err(|e| RenderError::Io {
            path: output_path.display().to_string(),
            detail: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
