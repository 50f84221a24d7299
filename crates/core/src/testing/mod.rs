//! Testing utilities and mock implementations.
//!
//! - [`MockRenderer`] stands in for OpenSCAD behind the [`Renderer`] trait.
//! - [`FakeOpenScad`] is an executable script for tests that go through the
//!   real process runner (Unix only).
//!
//! [`Renderer`]: crate::render::Renderer

#[cfg(unix)]
mod fake_openscad;
mod mock_renderer;

#[cfg(unix)]
pub use fake_openscad::{FakeOpenScad, FakeOpenScadBuilder};
pub use mock_renderer::{MockRenderer, RecordedRequest};
