use log::debug;

use super::context::{ProgramHandle, SharedContext, UniformLocation, UniformValue};
use super::error::{GlError, GlResult};

/// A uniform resolved to its location. Values are pushed on demand and not
/// cached here; the program must be in use when [`set`](Self::set) is called.
pub struct UniformBinding {
    context: SharedContext,
    name: String,
    location: UniformLocation,
}

impl UniformBinding {
    pub(crate) fn new(context: SharedContext, program: ProgramHandle, name: &str) -> GlResult<Self> {
        let location = context
            .uniform_location(program, name)
            .ok_or_else(|| GlError::UniformNotFound {
                name: name.to_string(),
            })?;
        debug!("uniform '{name}' resolved");
        Ok(Self {
            context,
            name: name.to_string(),
            location,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> UniformLocation {
        self.location
    }

    pub fn set(&self, value: impl Into<UniformValue>) {
        self.context.uniform(self.location, &value.into());
    }
}

impl std::fmt::Debug for UniformBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UniformBinding")
            .field("name", &self.name)
            .field("location", &self.location)
            .finish()
    }
}
