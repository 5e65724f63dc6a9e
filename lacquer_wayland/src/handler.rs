// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Application callbacks.

use lacquer_core::event::Event;

use crate::backend::RenderFrame;
use crate::context::Context;

/// Callbacks invoked by [`Context::run`].
///
/// All methods default to doing nothing. Per-application state lives in the
/// implementing type.
pub trait Handler {
    /// An input event arrived. Called for every event of an iteration before
    /// any surface is rendered.
    fn on_event(&mut self, ctx: &mut Context, event: &Event) {
        let _ = (ctx, event);
    }

    /// A surface is being painted.
    fn on_render(&mut self, frame: &mut RenderFrame<'_>) {
        let _ = frame;
    }

    /// Rendering for the iteration finished. `delta_time` is the smoothed
    /// frame duration in seconds.
    fn on_update(&mut self, ctx: &mut Context, delta_time: f64) {
        let _ = (ctx, delta_time);
    }
}
