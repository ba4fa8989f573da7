//! Video rendering.
//!
//! Images are composited onto a black canvas with ffmpeg, each pinned to its
//! own display window, and muxed with the narration track.

mod assembler;
pub mod ffmpeg;
mod timeline;

pub use assembler::{RenderOutput, TimedImage, VideoAssembler};
pub(crate) use assembler::render_error;
pub use timeline::{collect_images, plan_timeline};

#[cfg(test)]
pub(crate) use assembler::tests as test_support;
