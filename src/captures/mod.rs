//! The rendering captures and the route table that names them.
//!
//! A capture is started against a [`GlCanvas`], performs its setup (and the
//! draw, for still captures) and then optionally asks to be ticked on a fixed
//! interval. Each capture owns every GL object it created.

use std::time::Duration;

use anyhow::Result;
use glam::Mat4;

use crate::gl::{GlCanvas, GlResult, IndexBuffer, ImageSource, ShaderProgram};
use crate::math;

mod cube;
mod lighting;
mod model_lights;
mod point;
mod sphere_lights;
mod texture;
mod transform;
mod triangle;

/// A running capture.
pub trait Capture {
    /// Timer period for [`frame`](Self::frame); `None` for still captures.
    fn interval(&self) -> Option<Duration> {
        None
    }

    /// One timer tick.
    fn frame(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Inputs a capture may take from its host.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Image for the texture capture; a checkerboard when absent.
    pub image: Option<ImageSource>,
    /// Seed for captures that place things at random.
    pub seed: u64,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            image: None,
            seed: 0x5EED,
        }
    }
}

pub type StartFn = fn(&GlCanvas, &CaptureOptions) -> Result<Box<dyn Capture>>;

/// A named entry in the capture menu.
#[derive(Clone, Copy)]
pub struct Route {
    pub name: &'static str,
    pub start: StartFn,
}

impl Route {
    pub fn start(&self, canvas: &GlCanvas, options: &CaptureOptions) -> Result<Box<dyn Capture>> {
        (self.start)(canvas, options)
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route").field("name", &self.name).finish()
    }
}

pub const ROUTES: &[Route] = &[
    Route {
        name: "Point",
        start: point::start,
    },
    Route {
        name: "Triangle",
        start: triangle::start,
    },
    Route {
        name: "Transform",
        start: transform::start,
    },
    Route {
        name: "Texture",
        start: texture::start,
    },
    Route {
        name: "Cube",
        start: cube::start_colored,
    },
    Route {
        name: "Cube 2",
        start: cube::start_mesh,
    },
    Route {
        name: "Diffuse Light",
        start: sphere_lights::start_diffuse,
    },
    Route {
        name: "Ambient Light",
        start: sphere_lights::start_ambient,
    },
    Route {
        name: "Point Light",
        start: lighting::start_point_light,
    },
    Route {
        name: "Spot Light",
        start: lighting::start_spot_light,
    },
    Route {
        name: "Specular Light",
        start: lighting::start_specular,
    },
    Route {
        name: "Transform Model",
        start: model_lights::start_transform_model,
    },
    Route {
        name: "Cubes",
        start: model_lights::start_cubes,
    },
];

pub fn find_route(name: &str) -> Option<&'static Route> {
    ROUTES.iter().find(|route| route.name == name)
}

/// Route for a location hash such as `#Cube 2`. The hash must already be
/// percent-decoded.
pub fn route_from_hash(hash: &str) -> Option<&'static Route> {
    find_route(hash.strip_prefix('#').unwrap_or(hash))
}

/// Projection shared by the 3D captures.
fn scene_projection(canvas: &GlCanvas) -> Mat4 {
    math::perspective(30.0, canvas.aspect(), 1.0, 100.0)
}

/// Uploads `data` to the named attribute and points its slot at it.
fn upload_attribute(program: &ShaderProgram, name: &str, data: &[f32]) -> GlResult<()> {
    let attribute = program.attribute(name)?;
    attribute.bind_data(data);
    attribute.vertex_attrib_pointer();
    Ok(())
}

fn upload_indices(canvas: &GlCanvas, indices: &[u16]) -> GlResult<IndexBuffer> {
    let mut buffer = canvas.create_index_buffer()?;
    buffer.upload(indices);
    Ok(buffer)
}

/// Capture with nothing left to do after setup. Holds on to its resources
/// so they outlive the draw.
struct Still<T> {
    _resources: T,
}

impl<T> Still<T> {
    fn boxed(resources: T) -> Box<dyn Capture>
    where
        T: 'static,
    {
        Box::new(Self {
            _resources: resources,
        })
    }
}

impl<T> Capture for Still<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_keep_menu_order() {
        let names: Vec<_> = ROUTES.iter().map(|route| route.name).collect();
        assert_eq!(
            names,
            [
                "Point",
                "Triangle",
                "Transform",
                "Texture",
                "Cube",
                "Cube 2",
                "Diffuse Light",
                "Ambient Light",
                "Point Light",
                "Spot Light",
                "Specular Light",
                "Transform Model",
                "Cubes",
            ]
        );
    }

    #[test]
    fn hash_lookup_strips_the_marker() {
        assert_eq!(route_from_hash("#Cube 2").map(|r| r.name), Some("Cube 2"));
        assert_eq!(route_from_hash("Spot Light").map(|r| r.name), Some("Spot Light"));
        assert!(route_from_hash("#cube").is_none());
        assert!(route_from_hash("").is_none());
    }

    #[test]
    fn scene_projection_follows_canvas_aspect() {
        let (canvas, _recording) = GlCanvas::headless(200, 100).unwrap();
        let projection = scene_projection(&canvas);
        assert!((projection.y_axis.y / projection.x_axis.x - 2.0).abs() < 1e-5);
    }
}
