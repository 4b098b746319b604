//! Headless capture runs against a [`RecordingContext`].

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::captures::{CaptureOptions, Route};
use crate::gl::context::constants::NO_ERROR;
use crate::gl::{
    DrawCall, GlCanvas, GlContext, ImageSource, ObjectCounts, ObjectKind, DEFAULT_CANVAS_SIZE,
};

/// How a capture is run on the command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Timer ticks delivered to an animated capture.
    pub frames: u32,
    pub width: u32,
    pub height: u32,
    /// Image file for the texture capture.
    pub texture: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            frames: 1,
            width: DEFAULT_CANVAS_SIZE,
            height: DEFAULT_CANVAS_SIZE,
            texture: None,
        }
    }
}

/// What a headless run recorded.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    /// Ticks actually delivered; zero for still captures.
    pub frames: u32,
    pub commands: Vec<DrawCall>,
    /// First GL error raised during the run, `NO_ERROR` otherwise.
    pub gl_error: u32,
    /// Object totals after the capture was torn down.
    pub objects: Vec<(ObjectKind, ObjectCounts)>,
}

impl RunSummary {
    pub fn draws(&self) -> impl Iterator<Item = &DrawCall> {
        self.commands.iter().filter(|call| call.is_draw())
    }

    pub fn draw_count(&self) -> usize {
        self.draws().count()
    }

    pub fn clear_count(&self) -> usize {
        self.commands.len() - self.draw_count()
    }

    pub fn leaked_objects(&self) -> u32 {
        self.objects.iter().map(|(_, counts)| counts.live()).sum()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Capture: {} ({}x{})", self.name, self.width, self.height)?;
        writeln!(f, "Frames: {}", self.frames)?;
        writeln!(f, "Clears: {}", self.clear_count())?;
        writeln!(f, "Draws: {}", self.draw_count())?;
        for draw in self.draws() {
            writeln!(f, " - {}", draw.describe())?;
        }
        if self.gl_error == NO_ERROR {
            writeln!(f, "GL error: none")?;
        } else {
            writeln!(f, "GL error: 0x{:04X}", self.gl_error)?;
        }
        let objects = self
            .objects
            .iter()
            .map(|(kind, counts)| format!("{} {}/{}", kind.name(), counts.created, counts.deleted))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "Objects (created/deleted): {objects}")
    }
}

/// Starts `route` on a fresh headless canvas, delivers `options.frames` ticks
/// if it is animated, then tears it down.
pub fn run_capture(route: &Route, options: &RunOptions) -> Result<RunSummary> {
    let image = options
        .texture
        .as_ref()
        .map(ImageSource::from_path)
        .transpose()?;
    let capture_options = CaptureOptions {
        image,
        ..CaptureOptions::default()
    };

    let (canvas, recording) = GlCanvas::headless(options.width, options.height)?;
    let mut capture = route
        .start(&canvas, &capture_options)
        .with_context(|| format!("failed to start capture '{}'", route.name))?;

    let mut frames = 0;
    if let Some(interval) = capture.interval() {
        info!(
            "{} ticks every {}ms; delivering {} tick(s)",
            route.name,
            interval.as_millis(),
            options.frames
        );
        for frame in 0..options.frames {
            capture
                .frame()
                .with_context(|| format!("frame {frame} of '{}' failed", route.name))?;
            frames += 1;
        }
    }
    let gl_error = recording.get_error();
    if gl_error != NO_ERROR {
        warn!("{} left GL error 0x{gl_error:04X}", route.name);
    }

    drop(capture);
    drop(canvas);
    let objects = ObjectKind::ALL
        .iter()
        .map(|kind| (*kind, recording.counts(*kind)))
        .collect();

    Ok(RunSummary {
        name: route.name,
        width: options.width,
        height: options.height,
        frames,
        commands: recording.take_draw_calls(),
        gl_error,
        objects,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captures::{find_route, ROUTES};

    #[test]
    fn every_route_runs_cleanly() {
        for route in ROUTES {
            let summary = run_capture(route, &RunOptions::default()).unwrap();
            assert_eq!(summary.gl_error, NO_ERROR, "{}", route.name);
            assert!(summary.draw_count() >= 1, "{} did not draw", route.name);
            assert_eq!(summary.leaked_objects(), 0, "{} leaked", route.name);
        }
    }

    #[test]
    fn still_captures_ignore_frames() {
        let route = find_route("Triangle").unwrap();
        let options = RunOptions {
            frames: 5,
            ..RunOptions::default()
        };
        let summary = run_capture(route, &options).unwrap();
        assert_eq!(summary.frames, 0);
        assert_eq!(summary.draw_count(), 1);
        assert_eq!(
            summary.draws().next().map(DrawCall::describe).as_deref(),
            Some("triangles first=0 count=3")
        );
    }

    #[test]
    fn animated_captures_draw_once_per_frame() {
        let route = find_route("Point").unwrap();
        let options = RunOptions {
            frames: 3,
            ..RunOptions::default()
        };
        let summary = run_capture(route, &options).unwrap();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.draw_count(), 3);
        assert_eq!(summary.clear_count(), 3);
    }

    #[test]
    fn cubes_issue_three_indexed_draws() {
        let summary = run_capture(find_route("Cubes").unwrap(), &RunOptions::default()).unwrap();
        let lines: Vec<_> = summary.draws().map(DrawCall::describe).collect();
        assert_eq!(lines, vec!["triangles count=36 indexed(u16)"; 3]);
    }

    #[test]
    fn summary_lists_draws_and_objects() {
        let summary = run_capture(find_route("Cube").unwrap(), &RunOptions::default()).unwrap();
        let text = summary.to_string();
        assert!(text.contains("Capture: Cube (400x400)"));
        assert!(text.contains(" - triangles count=36 indexed(u8)"));
        assert!(text.contains("GL error: none"));
        assert!(text.contains("programs 1/1"));
    }

    #[test]
    fn missing_texture_file_is_an_error() {
        let options = RunOptions {
            texture: Some(PathBuf::from("/nonexistent/image.png")),
            ..RunOptions::default()
        };
        let err = run_capture(find_route("Texture").unwrap(), &options).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/image.png"));
    }
}
