// shaders.rs - Shader program building and uniform access

use gl::types::*;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::ffi::{CString, NulError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

use crate::render::gl_api::GlApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_enum(self) -> GLenum {
        match self {
            Self::Vertex => gl::VERTEX_SHADER,
            Self::Fragment => gl::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("VERTEX"),
            Self::Fragment => f.write_str("FRAGMENT"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("{stage} shader source could not be read from {path:?}: {source}")]
    Read {
        stage: ShaderStage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{stage} shader source contains a null byte: {source}")]
    Nul {
        stage: ShaderStage,
        #[source]
        source: NulError,
    },
    #[error("{stage} shader compilation failed: {log}")]
    Compilation { stage: ShaderStage, log: String },
    #[error("Program linking failed: {0}")]
    Linking(String),
}

impl ShaderError {
    /// The stage this diagnostic belongs to, `None` for link failures.
    pub fn stage(&self) -> Option<ShaderStage> {
        match self {
            Self::Read { stage, .. } | Self::Nul { stage, .. } | Self::Compilation { stage, .. } => {
                Some(*stage)
            }
            Self::Linking(_) => None,
        }
    }
}

/// What to do when a build step reports a diagnostic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildPolicy {
    /// Log the diagnostic and keep building.
    #[default]
    Lenient,
    /// Stop at the first diagnostic and return it.
    Strict,
}

/// Where a stage's source text comes from.
#[derive(Debug, Clone)]
pub enum StageSource {
    File(PathBuf),
    Inline(String),
}

#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub vertex: StageSource,
    pub fragment: StageSource,
}

impl ShaderSources {
    pub fn from_files<P: AsRef<Path>, Q: AsRef<Path>>(vertex: P, fragment: Q) -> Self {
        Self {
            vertex: StageSource::File(vertex.as_ref().to_path_buf()),
            fragment: StageSource::File(fragment.as_ref().to_path_buf()),
        }
    }

    pub fn inline(vertex: &str, fragment: &str) -> Self {
        Self {
            vertex: StageSource::Inline(vertex.to_string()),
            fragment: StageSource::Inline(fragment.to_string()),
        }
    }
}

/// Every diagnostic produced while building one program.
#[derive(Debug, Default)]
pub struct BuildReport {
    diagnostics: Vec<ShaderError>,
}

impl BuildReport {
    pub fn diagnostics(&self) -> &[ShaderError] {
        &self.diagnostics
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn linked(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|d| matches!(d, ShaderError::Linking(_)))
    }
}

/// How a build reacts to one diagnostic. Every diagnostic is logged.
trait DiagnosticHandler {
    type Error;

    fn handle(report: &mut BuildReport, err: ShaderError) -> Result<(), Self::Error>;
}

/// Keeps the diagnostic and carries on, so the build cannot fail.
struct KeepGoing;

impl DiagnosticHandler for KeepGoing {
    type Error = Infallible;

    fn handle(report: &mut BuildReport, err: ShaderError) -> Result<(), Infallible> {
        error!("{}", err);
        report.diagnostics.push(err);
        Ok(())
    }
}

/// Hands the first diagnostic back as the build result.
struct StopAtFirst;

impl DiagnosticHandler for StopAtFirst {
    type Error = ShaderError;

    fn handle(_report: &mut BuildReport, err: ShaderError) -> Result<(), ShaderError> {
        error!("{}", err);
        Err(err)
    }
}

/// A compiled stage object, deleted when dropped.
struct CompiledStage {
    gl: Rc<dyn GlApi>,
    id: GLuint,
    stage: ShaderStage,
}

impl CompiledStage {
    fn compile(gl: &Rc<dyn GlApi>, stage: ShaderStage, source: &CString) -> Self {
        let id = gl.create_shader(stage);
        gl.shader_source(id, source);
        gl.compile_shader(id);
        Self {
            gl: Rc::clone(gl),
            id,
            stage,
        }
    }

    fn check(&self) -> Result<(), ShaderError> {
        if self.gl.shader_compiled(self.id) {
            return Ok(());
        }
        Err(ShaderError::Compilation {
            stage: self.stage,
            log: self.gl.shader_info_log(self.id),
        })
    }
}

impl Drop for CompiledStage {
    fn drop(&mut self) {
        self.gl.delete_shader(self.id);
    }
}

fn read_source(stage: ShaderStage, source: &StageSource) -> Result<String, ShaderError> {
    match source {
        StageSource::Inline(text) => Ok(text.clone()),
        StageSource::File(path) => fs::read_to_string(path).map_err(|source| ShaderError::Read {
            stage,
            path: path.clone(),
            source,
        }),
    }
}

fn to_cstring(stage: ShaderStage, text: String) -> Result<CString, ShaderError> {
    CString::new(text).map_err(|source| ShaderError::Nul { stage, source })
}

/// A linked vertex + fragment program. The program object is deleted on drop.
pub struct ShaderProgram {
    gl: Rc<dyn GlApi>,
    id: GLuint,
    report: BuildReport,
}

impl ShaderProgram {
    /// Builds from two files, logging and continuing past every failure.
    pub fn from_files<P: AsRef<Path>, Q: AsRef<Path>>(
        gl: Rc<dyn GlApi>,
        vertex_path: P,
        fragment_path: Q,
    ) -> Self {
        Self::build_lenient(gl, &ShaderSources::from_files(vertex_path, fragment_path))
    }

    /// Builds from inline source text, logging and continuing past every failure.
    pub fn from_sources(gl: Rc<dyn GlApi>, vertex: &str, fragment: &str) -> Self {
        Self::build_lenient(gl, &ShaderSources::inline(vertex, fragment))
    }

    fn build_lenient(gl: Rc<dyn GlApi>, sources: &ShaderSources) -> Self {
        match Self::build_with::<KeepGoing>(gl, sources) {
            Ok(program) => program,
            Err(never) => match never {},
        }
    }

    pub fn build(
        gl: Rc<dyn GlApi>,
        sources: &ShaderSources,
        policy: BuildPolicy,
    ) -> Result<Self, ShaderError> {
        match policy {
            BuildPolicy::Lenient => Ok(Self::build_lenient(gl, sources)),
            BuildPolicy::Strict => Self::build_with::<StopAtFirst>(gl, sources),
        }
    }

    fn build_with<H: DiagnosticHandler>(
        gl: Rc<dyn GlApi>,
        sources: &ShaderSources,
    ) -> Result<Self, H::Error> {
        let mut report = BuildReport::default();

        let vertex = Self::prepare_stage::<H>(ShaderStage::Vertex, &sources.vertex, &mut report)?;
        let fragment =
            Self::prepare_stage::<H>(ShaderStage::Fragment, &sources.fragment, &mut report)?;

        let vertex = CompiledStage::compile(&gl, ShaderStage::Vertex, &vertex);
        if let Err(err) = vertex.check() {
            H::handle(&mut report, err)?;
        }
        let fragment = CompiledStage::compile(&gl, ShaderStage::Fragment, &fragment);
        if let Err(err) = fragment.check() {
            H::handle(&mut report, err)?;
        }

        let id = gl.create_program();
        gl.attach_shader(id, vertex.id);
        gl.attach_shader(id, fragment.id);
        gl.link_program(id);
        drop(vertex);
        drop(fragment);

        let mut program = Self {
            gl,
            id,
            report: BuildReport::default(),
        };

        if !program.gl.program_linked(id) {
            let log = program.gl.program_info_log(id);
            H::handle(&mut report, ShaderError::Linking(log))?;
        }

        if report.is_clean() {
            debug!("Shader program {} linked", id);
        }
        program.report = report;
        Ok(program)
    }

    /// Reads one stage's source. A lenient build substitutes an empty
    /// source for anything unreadable.
    fn prepare_stage<H: DiagnosticHandler>(
        stage: ShaderStage,
        source: &StageSource,
        report: &mut BuildReport,
    ) -> Result<CString, H::Error> {
        let text = match read_source(stage, source) {
            Ok(text) => text,
            Err(err) => {
                H::handle(report, err)?;
                String::new()
            }
        };
        match to_cstring(stage, text) {
            Ok(source) => Ok(source),
            Err(err) => {
                H::handle(report, err)?;
                Ok(CString::default())
            }
        }
    }

    pub fn id(&self) -> GLuint {
        self.id
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn is_clean(&self) -> bool {
        self.report.is_clean()
    }

    pub fn activate(&self) {
        self.gl.use_program(self.id);
    }

    /// Resolves `name` against this program. Returns `None` when the
    /// uniform does not exist or the name cannot be passed to GL.
    fn location(&self, name: &str) -> Option<GLint> {
        let Ok(cname) = CString::new(name) else {
            warn!("Uniform name {:?} contains a null byte", name);
            return None;
        };
        let location = self.gl.uniform_location(self.id, &cname);
        if location == -1 {
            warn!("Uniform '{}' not found in shader", name);
            return None;
        }
        Some(location)
    }

    // Uniform setters write to the active program.
    pub fn set_bool(&self, name: &str, value: bool) {
        self.set_int(name, value as i32);
    }

    pub fn set_int(&self, name: &str, value: i32) {
        if let Some(location) = self.location(name) {
            self.gl.uniform_1i(location, value);
        }
    }

    pub fn set_float(&self, name: &str, value: f32) {
        if let Some(location) = self.location(name) {
            self.gl.uniform_1f(location, value);
        }
    }

    pub fn get_int(&self, name: &str) -> Option<i32> {
        self.location(name)
            .map(|location| self.gl.get_uniform_i(self.id, location))
    }

    pub fn get_float(&self, name: &str) -> Option<f32> {
        self.location(name)
            .map(|location| self.gl.get_uniform_f(self.id, location))
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get_int(name).map(|value| value != 0)
    }

    /// Deletes the program now instead of at the end of scope.
    pub fn release(self) {}
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        self.gl.delete_program(self.id);
    }
}
