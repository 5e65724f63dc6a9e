// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Connection ownership and the run loop.
//!
//! # Bootstrap
//!
//! ```text
//! connect ──> registry round-trip ──> bind services (fail: missing kinds)
//!         ──> bind outputs + seats, request xdg-output geometry
//!         ──> round-trip (capabilities, geometry)
//!         ──> attach pointer/keyboard/touch per capability
//!         ──> backend ──> round-trip ──> frame timer
//!         ──> one overlay surface per output (unless disabled)
//! ```
//!
//! Any failure drops everything acquired so far before the error returns.
//!
//! # Iteration
//!
//! Each pass of [`Context::run`] performs, in order:
//!
//! 1. a round-trip, then delivery of every queued [`Event`] in arrival
//!    order. Configure events are consumed by the backend and never reach
//!    the handler.
//! 2. painting of every surface, unless the [`RenderState`] suppresses it,
//!    followed by any render deferred on a frame callback.
//! 3. [`Handler::on_update`] with the smoothed delta time, then frame rate
//!    limiting.
//!
//! All `wayland-client` objects are created with the context's own queue
//! handle; there is no embedded mode.

use lacquer_core::cursor::CursorShape;
use lacquer_core::error::{Error, ErrorKind};
use lacquer_core::event::Event;
use lacquer_core::geometry::{Extent, Rect};
use lacquer_core::id::{Arena, OutputId, SeatId, SurfaceId};
use lacquer_core::queue::EventQueue as Pending;
use lacquer_core::render::{Pace, RenderState};
use wayland_client::globals::{GlobalListContents, registry_queue_init};
use wayland_client::protocol::wl_buffer::WlBuffer;
use wayland_client::protocol::wl_compositor::WlCompositor;
use wayland_client::protocol::wl_output::WlOutput;
use wayland_client::protocol::wl_region::WlRegion;
use wayland_client::protocol::wl_registry::{self, WlRegistry};
use wayland_client::protocol::wl_seat::WlSeat;
use wayland_client::protocol::wl_shm::WlShm;
use wayland_client::protocol::wl_shm_pool::WlShmPool;
use wayland_client::protocol::wl_surface::{self, WlSurface};
use wayland_client::{Connection, Dispatch, EventQueue, Proxy, QueueHandle, delegate_noop};
use wayland_protocols::wp::cursor_shape::v1::client::wp_cursor_shape_device_v1::WpCursorShapeDeviceV1;
use wayland_protocols::wp::cursor_shape::v1::client::wp_cursor_shape_manager_v1::WpCursorShapeManagerV1;
use wayland_protocols::wp::fractional_scale::v1::client::wp_fractional_scale_manager_v1::WpFractionalScaleManagerV1;
use wayland_protocols::wp::viewporter::client::wp_viewport::WpViewport;
use wayland_protocols::wp::viewporter::client::wp_viewporter::WpViewporter;
use wayland_protocols::xdg::xdg_output::zv1::client::zxdg_output_manager_v1::ZxdgOutputManagerV1;
use wayland_protocols_wlr::layer_shell::v1::client::zwlr_layer_shell_v1::ZwlrLayerShellV1;
use wayland_protocols_wlr::screencopy::v1::client::zwlr_screencopy_manager_v1::ZwlrScreencopyManagerV1;

use crate::backend::{Backend, BackendCtx, FrameInfo, RenderFrame, RenderView};
use crate::capture::{self, CaptureSession};
use crate::config::{Config, SurfaceOptions};
use crate::cursor::CursorEngine;
use crate::globals::Globals;
use crate::handler::Handler;
use crate::output::{self, Output};
use crate::seat::{self, Seat};
use crate::shm::SharedBuffer;
use crate::surface::{self, LayerSurface};
use crate::timer::FrameTimer;

/// Protocol state mutated by dispatch.
#[derive(Debug)]
pub(crate) struct State {
    pub(crate) globals: Globals,
    pub(crate) outputs: Arena<OutputId, Output>,
    pub(crate) seats: Arena<SeatId, Seat>,
    pub(crate) surfaces: Arena<SurfaceId, LayerSurface>,
    pub(crate) events: Pending<Event>,
    /// Surfaces whose deferred render became due.
    pub(crate) deferred: Vec<SurfaceId>,
    /// Outputs announced after bootstrap that still need surfaces.
    pub(crate) new_outputs: Vec<OutputId>,
    pub(crate) cursor: CursorEngine,
    pub(crate) capture: Option<CaptureSession>,
    /// Whether seat devices are created as soon as capabilities arrive.
    pub(crate) devices_armed: bool,
}

impl State {
    /// Drops a surface and every reference to it.
    fn remove_surface(&mut self, id: SurfaceId) -> bool {
        let Some(mut surface) = self.surfaces.remove(id) else {
            return false;
        };
        Backend::unassociate(&mut surface);
        drop(surface);
        for (_, seat) in self.seats.iter_mut() {
            seat.forget_surface(id);
        }
        self.deferred.retain(|d| *d != id);
        true
    }

    /// Drops an output together with the surfaces created for it.
    fn remove_output(&mut self, id: OutputId) {
        let doomed: Vec<SurfaceId> = self
            .surfaces
            .iter()
            .filter(|(_, s)| s.output() == Some(id))
            .map(|(sid, _)| sid)
            .collect();
        for sid in doomed {
            self.remove_surface(sid);
        }
        self.outputs.remove(id);
        self.new_outputs.retain(|o| *o != id);
        tracing::debug!(?id, "output removed");
    }
}

/// Owner of the compositor connection, its objects, and the run loop.
pub struct Context {
    // Fields drop in order; the connection goes last.
    backend: Option<Backend>,
    state: State,
    queue: EventQueue<State>,
    qh: QueueHandle<State>,
    timer: FrameTimer,
    config: Config,
    render_state: RenderState,
    running: bool,
    conn: Connection,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("outputs", &self.state.outputs.len())
            .field("seats", &self.state.seats.len())
            .field("surfaces", &self.state.surfaces.len())
            .field("backend", &self.backend)
            .field("render_state", &self.render_state)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

fn roundtrip_error(err: impl std::fmt::Display) -> Error {
    tracing::error!(%err, "round-trip failed");
    ErrorKind::ROUNDTRIP.into()
}

fn backend_ctx<'a>(
    conn: &'a Connection,
    globals: &'a Globals,
    qh: &'a QueueHandle<State>,
    config: &Config,
) -> BackendCtx<'a> {
    BackendCtx {
        conn,
        shm: &globals.shm,
        qh,
        frame_callbacks: config.request_frame_callbacks,
    }
}

impl Context {
    /// Connects to the compositor named by the environment and sets up
    /// outputs, seats, the backend, and, unless disabled, one overlay
    /// surface per output.
    pub fn new(config: Config) -> Result<Self, Error> {
        let conn = Connection::connect_to_env().map_err(|err| {
            tracing::error!(%err, "cannot connect to the compositor");
            Error::from(ErrorKind::CONNECTION)
        })?;
        let (globals, mut queue) = registry_queue_init::<State>(&conn).map_err(|err| {
            tracing::error!(%err, "registry initialisation failed");
            Error::from(ErrorKind::CONNECTION)
        })?;
        let qh = queue.handle();

        let bound = Globals::bind(&globals, &qh)?;
        let cursor = CursorEngine::new(&conn, &bound.shm, bound.cursor_shape.as_ref());
        let mut state = State {
            globals: bound,
            outputs: Arena::new(),
            seats: Arena::new(),
            surfaces: Arena::new(),
            events: Pending::new(),
            deferred: Vec::new(),
            new_outputs: Vec::new(),
            cursor,
            capture: None,
            devices_armed: false,
        };

        let registry = globals.registry();
        for global in globals.contents().clone_list() {
            if global.interface == WlOutput::interface().name {
                output::bind(&mut state, registry, global.name, global.version, &qh);
            } else if global.interface == WlSeat::interface().name {
                seat::bind(&mut state, registry, global.name, global.version, &qh);
            }
        }
        queue.roundtrip(&mut state).map_err(roundtrip_error)?;

        // Capabilities are known now; attaching earlier could miss them.
        state.devices_armed = true;
        for id in state.seats.keys() {
            if let Some(seat) = state.seats.get_mut(id) {
                seat.sync_devices(id, &qh);
            }
        }

        let backend = Backend::new(config.backend)?;
        queue.roundtrip(&mut state).map_err(roundtrip_error)?;

        let timer = FrameTimer::new(config.max_fps);
        tracing::debug!(
            outputs = state.outputs.len(),
            seats = state.seats.len(),
            "context ready"
        );

        let mut ctx = Self {
            conn,
            queue,
            qh,
            state,
            backend,
            timer,
            config,
            render_state: RenderState::default(),
            running: false,
        };
        if ctx.config.auto_create_surfaces {
            let options = ctx.config.surface_options();
            for id in ctx.state.outputs.keys() {
                ctx.create_layer_surface(Some(id), &options)?;
            }
        }
        Ok(ctx)
    }

    /// Runs until [`stop`](Self::stop) is called.
    ///
    /// Fails only if the connection breaks.
    pub fn run(&mut self, handler: &mut impl Handler) -> Result<(), Error> {
        self.running = true;
        while self.running {
            self.timer.start_frame();
            self.process_events(handler)?;
            self.render(handler);
            self.animate_cursors();
            let delta_time = self.timer.delta_time();
            handler.on_update(self, delta_time);
            self.timer.end_frame();
        }
        Ok(())
    }

    /// Round-trips, then delivers every queued event.
    pub fn process_events(&mut self, handler: &mut impl Handler) -> Result<(), Error> {
        self.queue
            .roundtrip(&mut self.state)
            .map_err(roundtrip_error)?;
        self.attach_new_outputs();

        let batch = self.state.events.begin_drain();
        for event in &batch {
            match event {
                Event::LayerSurfaceConfigure { surface, .. } => self.configure_surface(*surface),
                _ => handler.on_event(self, event),
            }
        }
        self.state.events.finish_drain(batch);
        Ok(())
    }

    fn attach_new_outputs(&mut self) {
        let fresh = std::mem::take(&mut self.state.new_outputs);
        if !self.config.auto_create_surfaces {
            return;
        }
        let options = self.config.surface_options();
        for id in fresh {
            if let Err(err) = self.create_layer_surface(Some(id), &options) {
                tracing::warn!(?id, %err, "no overlay for new output");
            }
        }
    }

    fn configure_surface(&mut self, id: SurfaceId) {
        let (Some(backend), Some(surface)) = (&mut self.backend, self.state.surfaces.get_mut(id))
        else {
            return;
        };
        let ctx = backend_ctx(&self.conn, &self.state.globals, &self.qh, &self.config);
        backend.on_configure(&ctx, id, surface);
    }

    fn render(&mut self, handler: &mut impl Handler) {
        let mut painted = Vec::new();
        if self.render_state.begin_pass() {
            for id in self.state.surfaces.keys() {
                if self.render_surface(id, handler) {
                    painted.push(id);
                }
            }
        }
        // A callback may have fired for a surface painted above, which
        // already has a new callback outstanding.
        for id in std::mem::take(&mut self.state.deferred) {
            if !painted.contains(&id) {
                self.render_surface(id, handler);
            }
        }
    }

    /// Paints one surface. Returns whether it was painted.
    fn render_surface(&mut self, id: SurfaceId, handler: &mut impl Handler) -> bool {
        let Some(surface) = self.state.surfaces.get(id) else {
            return false;
        };
        let output_rect = surface
            .output()
            .and_then(|o| self.state.outputs.get(o))
            .map_or_else(|| origin_rect(surface.size()), Output::rect);
        let info = FrameInfo {
            output_rect,
            delta_time: self.timer.delta_time(),
            fps: self.timer.fps(),
        };

        let Some(surface) = self.state.surfaces.get_mut(id) else {
            return false;
        };
        if !surface.is_configured() || surface.is_closed() {
            return false;
        }
        if self.config.request_frame_callbacks && surface.pacer.request() == Pace::Deferred {
            return false;
        }

        match &mut self.backend {
            Some(backend) => {
                let ctx = backend_ctx(&self.conn, &self.state.globals, &self.qh, &self.config);
                backend.render(&ctx, id, surface, info, |frame| handler.on_render(frame));
            }
            None => {
                let mut frame = RenderFrame {
                    surface: id,
                    output: surface.output(),
                    output_rect: info.output_rect,
                    size: surface.size(),
                    scale: surface.scale(),
                    delta_time: info.delta_time,
                    fps: info.fps,
                    view: RenderView::None,
                };
                handler.on_render(&mut frame);
            }
        }
        true
    }

    fn animate_cursors(&mut self) {
        let State { cursor, seats, .. } = &mut self.state;
        for (_, seat) in seats.iter_mut() {
            cursor.animate(&mut seat.cursor);
        }
    }

    /// Ends [`run`](Self::run) after the current iteration.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Whether [`run`](Self::run) is looping.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current render policy.
    #[must_use]
    pub fn render_state(&self) -> RenderState {
        self.render_state
    }

    /// Changes the render policy from the next iteration on.
    pub fn set_render_state(&mut self, render_state: RenderState) {
        self.render_state = render_state;
    }

    /// Configuration the context was created with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Smoothed frame duration in seconds.
    #[must_use]
    pub fn delta_time(&self) -> f64 {
        self.timer.delta_time()
    }

    /// Smoothed frames per second.
    #[must_use]
    pub fn fps(&self) -> u32 {
        self.timer.fps()
    }

    /// The frame timer.
    #[must_use]
    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// Connected outputs.
    pub fn outputs(&self) -> impl Iterator<Item = (OutputId, &Output)> + '_ {
        self.state.outputs.iter()
    }

    /// One output, if still connected.
    #[must_use]
    pub fn output(&self, id: OutputId) -> Option<&Output> {
        self.state.outputs.get(id)
    }

    /// Bounding rectangle of all outputs, or `None` without outputs.
    #[must_use]
    pub fn output_rect(&self) -> Option<Rect> {
        Rect::bounding(self.state.outputs.iter().map(|(_, o)| o.rect()))
    }

    /// Input seats.
    pub fn seats(&self) -> impl Iterator<Item = (SeatId, &Seat)> + '_ {
        self.state.seats.iter()
    }

    /// One seat, if still present.
    #[must_use]
    pub fn seat(&self, id: SeatId) -> Option<&Seat> {
        self.state.seats.get(id)
    }

    /// Layer surfaces.
    pub fn surfaces(&self) -> impl Iterator<Item = (SurfaceId, &LayerSurface)> + '_ {
        self.state.surfaces.iter()
    }

    /// One layer surface, if not destroyed.
    #[must_use]
    pub fn surface(&self, id: SurfaceId) -> Option<&LayerSurface> {
        self.state.surfaces.get(id)
    }

    /// Creates a layer surface on `output`, or wherever the compositor
    /// chooses if `None`, waits for its first configure, and associates it
    /// with the backend.
    pub fn create_layer_surface(
        &mut self,
        output: Option<OutputId>,
        options: &SurfaceOptions,
    ) -> Result<SurfaceId, Error> {
        let id = surface::create(&mut self.state, output, options, &self.qh)?;
        if let Err(err) = self.queue.roundtrip(&mut self.state) {
            self.state.remove_surface(id);
            return Err(roundtrip_error(err));
        }

        let Some(backend) = &mut self.backend else {
            return Ok(id);
        };
        let Some(surface) = self.state.surfaces.get_mut(id) else {
            return Err(ErrorKind::SURFACE_INIT.into());
        };
        let ctx = backend_ctx(&self.conn, &self.state.globals, &self.qh, &self.config);
        if let Err(err) = backend.associate(&ctx, id, surface) {
            tracing::warn!(?id, %err, "backend association failed");
            self.state.remove_surface(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Destroys a layer surface. Returns `false` for stale ids.
    pub fn destroy_layer_surface(&mut self, id: SurfaceId) -> bool {
        self.state.remove_surface(id)
    }

    /// Routes pointer input to every surface, or lets it pass through to
    /// the windows beneath.
    pub fn set_pointer_interaction(&mut self, enable: bool) {
        let State {
            surfaces, globals, ..
        } = &mut self.state;
        for (_, surface) in surfaces.iter_mut() {
            surface.set_pointer_interaction(enable, &globals.compositor, &self.qh);
        }
    }

    /// Grants or revokes exclusive keyboard focus on every surface.
    pub fn set_keyboard_interaction(&mut self, enable: bool) {
        for (_, surface) in self.state.surfaces.iter() {
            surface.set_keyboard_interaction(enable);
        }
    }

    /// Restricts input to `rects`, given in global logical coordinates.
    ///
    /// Each surface receives the rectangles overlapping its output,
    /// translated to output-local coordinates. Surfaces without an output
    /// receive them unchanged.
    pub fn set_input_regions(&mut self, rects: &[Rect]) {
        let State {
            surfaces,
            outputs,
            globals,
            ..
        } = &mut self.state;
        for (_, surface) in surfaces.iter_mut() {
            let local = match surface.output().and_then(|o| outputs.get(o)) {
                Some(output) => local_rects(output.rect(), rects),
                None => rects.to_vec(),
            };
            surface.set_input_rects(&local, &globals.compositor, &self.qh);
            surface.wl.commit();
        }
    }

    /// Changes the pointer cursor of `seat`. Seats without a pointer ignore
    /// the request.
    pub fn set_pointer_shape(&mut self, seat: SeatId, shape: CursorShape) -> Result<(), Error> {
        let State {
            seats,
            cursor,
            globals,
            ..
        } = &mut self.state;
        let seat = seats.get_mut(seat).ok_or(ErrorKind::INVALID_HANDLE)?;
        let Some(pointer) = seat.pointer.clone() else {
            return Ok(());
        };
        cursor.set_shape(&mut seat.cursor, &pointer, shape, &globals.compositor, &self.qh)
    }

    /// Copies the current contents of `output`, blocking until the
    /// compositor finishes or refuses.
    pub fn screenshot(&mut self, output: OutputId) -> Result<SharedBuffer, Error> {
        capture::capture_output(&mut self.queue, &mut self.state, output)
    }
}

/// A rectangle of `extent` at the origin.
fn origin_rect(extent: Extent) -> Rect {
    Rect::new(
        0,
        0,
        i32::try_from(extent.width).unwrap_or(i32::MAX),
        i32::try_from(extent.height).unwrap_or(i32::MAX),
    )
}

/// Rectangles overlapping `output`, in its local coordinates.
fn local_rects(output: Rect, rects: &[Rect]) -> Vec<Rect> {
    rects
        .iter()
        .filter(|r| output.intersects_rect(**r))
        .map(|r| output.to_local_rect(*r))
        .collect()
}

impl Drop for Context {
    fn drop(&mut self) {
        if let Err(err) = self.conn.flush() {
            tracing::debug!(%err, "flush before teardown failed");
        }
        drop(self.backend.take());
        drop(self.state.seats.drain());
        drop(self.state.surfaces.drain());
        drop(self.state.outputs.drain());
        // Service handles are released with `state`; flush what was queued.
        if let Err(err) = self.conn.flush() {
            tracing::debug!(%err, "flush after teardown failed");
        }
    }
}

impl Dispatch<WlRegistry, GlobalListContents> for State {
    fn event(
        state: &mut Self,
        registry: &WlRegistry,
        event: wl_registry::Event,
        _data: &GlobalListContents,
        _conn: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_registry::Event::Global {
                name,
                interface,
                version,
            } => {
                if interface == WlOutput::interface().name {
                    let id = output::bind(state, registry, name, version, qh);
                    state.new_outputs.push(id);
                } else if interface == WlSeat::interface().name {
                    seat::bind(state, registry, name, version, qh);
                }
            }
            wl_registry::Event::GlobalRemove { name } => {
                let output_id = state
                    .outputs
                    .iter()
                    .find(|(_, o)| o.global_name() == name)
                    .map(|(id, _)| id);
                if let Some(id) = output_id {
                    state.remove_output(id);
                } else {
                    let seat_id = state
                        .seats
                        .iter()
                        .find(|(_, s)| s.global_name() == name)
                        .map(|(id, _)| id);
                    if let Some(id) = seat_id {
                        state.seats.remove(id);
                        tracing::debug!(?id, "seat removed");
                    }
                }
            }
            _ => {}
        }
    }
}

impl Dispatch<WlSurface, SurfaceId> for State {
    fn event(
        _state: &mut Self,
        _proxy: &WlSurface,
        _event: wl_surface::Event,
        _data: &SurfaceId,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
    }
}

delegate_noop!(State: ignore WlCompositor);
delegate_noop!(State: ignore WlShm);
delegate_noop!(State: ignore WlShmPool);
delegate_noop!(State: ignore WlBuffer);
delegate_noop!(State: ignore WlRegion);
delegate_noop!(State: ignore WlSurface);
delegate_noop!(State: ignore ZwlrLayerShellV1);
delegate_noop!(State: ignore ZxdgOutputManagerV1);
delegate_noop!(State: ignore WpCursorShapeManagerV1);
delegate_noop!(State: ignore WpCursorShapeDeviceV1);
delegate_noop!(State: ignore ZwlrScreencopyManagerV1);
delegate_noop!(State: ignore WpFractionalScaleManagerV1);
delegate_noop!(State: ignore WpViewporter);
delegate_noop!(State: ignore WpViewport);

#[cfg(test)]
mod tests {
    use super::local_rects;
    use lacquer_core::geometry::Rect;

    #[test]
    fn input_regions_are_split_per_output_and_made_local() {
        let left = Rect::new(0, 0, 1920, 1080);
        let right = Rect::new(1920, 0, 1920, 1080);
        let rects = [Rect::new(100, 100, 50, 50), Rect::new(2000, 10, 20, 20)];

        assert_eq!(local_rects(left, &rects), [Rect::new(100, 100, 50, 50)]);
        assert_eq!(local_rects(right, &rects), [Rect::new(80, 10, 20, 20)]);
    }

    #[test]
    fn rects_straddling_outputs_reach_both() {
        let left = Rect::new(0, 0, 1920, 1080);
        let right = Rect::new(1920, 0, 1920, 1080);
        let straddle = [Rect::new(1900, 0, 40, 40)];

        assert_eq!(local_rects(left, &straddle), [Rect::new(1900, 0, 40, 40)]);
        assert_eq!(local_rects(right, &straddle), [Rect::new(-20, 0, 40, 40)]);
    }
}
