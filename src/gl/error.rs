use thiserror::Error;

use super::context::ShaderStage;

/// Failures raised while creating or driving graphics resources.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GlError {
    #[error("WebGL2 context not available: {0}")]
    ContextUnavailable(String),

    #[error("could not compile {stage} shader:\n{log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("could not link program:\n{log}")]
    ProgramLink { log: String },

    #[error("attribute '{name}' is not defined in the shader program")]
    AttributeNotFound { name: String },

    #[error("uniform '{name}' is not defined in the shader program")]
    UniformNotFound { name: String },

    #[error("buffer allocation failed")]
    BufferAllocation,

    #[error("texture allocation failed")]
    TextureCreation,

    #[error("{0} shader object not available")]
    ShaderUnavailable(ShaderStage),

    #[error("program object not available")]
    ProgramUnavailable,

    #[error("texture unit {0} out of range")]
    InvalidTextureUnit(u32),
}

pub type GlResult<T> = Result<T, GlError>;
