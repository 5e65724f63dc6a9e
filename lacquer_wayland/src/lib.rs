// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Full-screen overlays for wlroots-style Wayland compositors.
//!
//! A [`Context`] connects to the compositor, discovers outputs and seats,
//! and by default covers every output with an input-transparent overlay
//! layer surface. The application implements [`Handler`] and hands it to
//! [`Context::run`]:
//!
//! - [`Handler::on_event`] receives input as [`Event`]s,
//! - [`Handler::on_render`] paints each surface through a [`RenderView`],
//! - [`Handler::on_update`] runs once per iteration with the smoothed frame
//!   duration.
//!
//! Painting goes through the backend chosen in [`Config::backend`]: raw
//! shared-memory pixels, a `tiny-skia` canvas (feature `vector`, on by
//! default), or a `wgpu` surface (feature `gpu`).
//!
//! ```no_run
//! use lacquer_wayland::{BackendKind, Config, Context, Event, Handler, RenderFrame, RenderView};
//!
//! struct Blank;
//!
//! impl Handler for Blank {
//!     fn on_event(&mut self, ctx: &mut Context, event: &Event) {
//!         if let Event::PointerButton { .. } = event {
//!             ctx.stop();
//!         }
//!     }
//!
//!     fn on_render(&mut self, frame: &mut RenderFrame<'_>) {
//!         if let RenderView::Pixels { data, .. } = &mut frame.view {
//!             data.fill(0x40);
//!         }
//!     }
//! }
//!
//! let mut ctx = Context::new(Config {
//!     backend: BackendKind::Raw,
//!     pointer_interaction: true,
//!     ..Config::default()
//! })?;
//! ctx.run(&mut Blank)?;
//! # Ok::<(), lacquer_wayland::Error>(())
//! ```
//!
//! Everything compositor-independent lives in [`lacquer_core`], re-exported
//! here.

mod backend;
mod capture;
mod config;
mod context;
mod cursor;
mod globals;
mod handler;
mod output;
mod seat;
mod shm;
mod surface;
mod timer;

pub use backend::{RenderFrame, RenderView};
pub use config::{BackendKind, Config, Edges, Layer, SurfaceOptions};
pub use context::Context;
pub use cursor::DEFAULT_CURSOR_SIZE;
pub use handler::Handler;
pub use output::Output;
pub use seat::Seat;
pub use shm::SharedBuffer;
pub use surface::LayerSurface;
pub use timer::{FrameTimer, Instant, now};

pub use lacquer_core;
pub use lacquer_core::cursor::CursorShape;
pub use lacquer_core::error::{Error, ErrorKind};
pub use lacquer_core::event::{ButtonState, Event, Focus, KeyState};
pub use lacquer_core::geometry::{Extent, Point, Rect};
pub use lacquer_core::id::{OutputId, SeatId, SurfaceId};
pub use lacquer_core::render::RenderState;
