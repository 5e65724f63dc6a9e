// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input seats and their pointer, keyboard, and touch devices.
//!
//! Device events are translated into [`Event`]s tagged with the seat and the
//! focused layer surface, then queued on the context until the next drain.

use lacquer_core::event::{ButtonState, Event, Focus, KeyState};
use lacquer_core::geometry::Point;
use lacquer_core::id::{SeatId, SurfaceId};
use wayland_client::protocol::wl_keyboard::{self, WlKeyboard};
use wayland_client::protocol::wl_pointer::{self, WlPointer};
use wayland_client::protocol::wl_registry::WlRegistry;
use wayland_client::protocol::wl_seat::{self, Capability, WlSeat};
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::protocol::wl_touch::{self, WlTouch};
use wayland_client::{Connection, Dispatch, Proxy, QueueHandle, WEnum};

use crate::context::State;
use crate::cursor::{CursorEngine, SeatCursor};

const SEAT_VERSION: u32 = 5;

/// An input seat.
#[derive(Debug)]
pub struct Seat {
    wl: WlSeat,
    global_name: u32,
    name: Option<String>,
    capabilities: Capability,
    pub(crate) pointer: Option<WlPointer>,
    keyboard: Option<WlKeyboard>,
    touch: Option<WlTouch>,
    pointer_focus: Option<Focus>,
    keyboard_focus: Option<Focus>,
    touches: Vec<(i32, Focus)>,
    pub(crate) cursor: SeatCursor,
}

impl Seat {
    /// Seat name such as `seat0`, once reported.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Surface under the pointer.
    #[must_use]
    pub fn pointer_focus(&self) -> Option<Focus> {
        self.pointer_focus
    }

    /// Surface holding keyboard focus.
    #[must_use]
    pub fn keyboard_focus(&self) -> Option<Focus> {
        self.keyboard_focus
    }

    /// Whether a pointer device is attached.
    #[must_use]
    pub fn has_pointer(&self) -> bool {
        self.pointer.is_some()
    }

    /// Whether a keyboard device is attached.
    #[must_use]
    pub fn has_keyboard(&self) -> bool {
        self.keyboard.is_some()
    }

    /// Whether a touch device is attached.
    #[must_use]
    pub fn has_touch(&self) -> bool {
        self.touch.is_some()
    }

    pub(crate) fn global_name(&self) -> u32 {
        self.global_name
    }

    /// Creates or releases devices to match the advertised capabilities.
    pub(crate) fn sync_devices(&mut self, id: SeatId, qh: &QueueHandle<State>) {
        let caps = self.capabilities;
        match (caps.contains(Capability::Pointer), self.pointer.is_some()) {
            (true, false) => self.pointer = Some(self.wl.get_pointer(qh, id)),
            (false, true) => {
                release_pointer(self.pointer.take());
                self.pointer_focus = None;
            }
            _ => {}
        }
        match (caps.contains(Capability::Keyboard), self.keyboard.is_some()) {
            (true, false) => self.keyboard = Some(self.wl.get_keyboard(qh, id)),
            (false, true) => {
                release_keyboard(self.keyboard.take());
                self.keyboard_focus = None;
            }
            _ => {}
        }
        match (caps.contains(Capability::Touch), self.touch.is_some()) {
            (true, false) => self.touch = Some(self.wl.get_touch(qh, id)),
            (false, true) => {
                release_touch(self.touch.take());
                self.touches.clear();
            }
            _ => {}
        }
        tracing::debug!(?id, ?caps, "seat devices");
    }

    fn touch_focus(&self, touch_id: i32) -> Option<Focus> {
        self.touches
            .iter()
            .find(|(t, _)| *t == touch_id)
            .map(|(_, focus)| *focus)
    }

    /// Forgets any focus on `surface` after it was destroyed.
    pub(crate) fn forget_surface(&mut self, surface: SurfaceId) {
        if self.pointer_focus.is_some_and(|f| f.surface == surface) {
            self.pointer_focus = None;
        }
        if self.keyboard_focus.is_some_and(|f| f.surface == surface) {
            self.keyboard_focus = None;
        }
        self.touches.retain(|(_, f)| f.surface != surface);
    }
}

fn release_pointer(pointer: Option<WlPointer>) {
    if let Some(pointer) = pointer.filter(|p| p.version() >= 3) {
        pointer.release();
    }
}

fn release_keyboard(keyboard: Option<WlKeyboard>) {
    if let Some(keyboard) = keyboard.filter(|k| k.version() >= 3) {
        keyboard.release();
    }
}

fn release_touch(touch: Option<WlTouch>) {
    if let Some(touch) = touch.filter(|t| t.version() >= 3) {
        touch.release();
    }
}

impl Drop for Seat {
    fn drop(&mut self) {
        release_pointer(self.pointer.take());
        release_keyboard(self.keyboard.take());
        release_touch(self.touch.take());
        if self.wl.version() >= 5 {
            self.wl.release();
        }
    }
}

/// Binds a `wl_seat` global. Devices are created once the seat reports its
/// capabilities and the context has finished bootstrapping.
pub(crate) fn bind(
    state: &mut State,
    registry: &WlRegistry,
    global_name: u32,
    version: u32,
    qh: &QueueHandle<State>,
) -> SeatId {
    let id = state.seats.insert_with(|id| Seat {
        wl: registry.bind::<WlSeat, _, _>(global_name, version.min(SEAT_VERSION), qh, id),
        global_name,
        name: None,
        capabilities: Capability::empty(),
        pointer: None,
        keyboard: None,
        touch: None,
        pointer_focus: None,
        keyboard_focus: None,
        touches: Vec::new(),
        cursor: SeatCursor::default(),
    });
    tracing::debug!(?id, global_name, "seat bound");
    id
}

/// Maps a surface to the layer surface it belongs to.
fn focus_of(state: &State, surface: &WlSurface) -> Option<Focus> {
    let id = *surface.data::<SurfaceId>()?;
    let layer = state.surfaces.get(id)?;
    Some(Focus {
        output: layer.output(),
        surface: id,
    })
}

impl Dispatch<WlSeat, SeatId> for State {
    fn event(
        state: &mut Self,
        _proxy: &WlSeat,
        event: wl_seat::Event,
        id: &SeatId,
        _conn: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        let armed = state.devices_armed;
        let Some(seat) = state.seats.get_mut(*id) else {
            return;
        };
        match event {
            wl_seat::Event::Capabilities {
                capabilities: WEnum::Value(caps),
            } => {
                seat.capabilities = caps;
                if armed {
                    seat.sync_devices(*id, qh);
                }
            }
            wl_seat::Event::Name { name } => seat.name = Some(name),
            _ => {}
        }
    }
}

impl Dispatch<WlPointer, SeatId> for State {
    fn event(
        state: &mut Self,
        pointer: &WlPointer,
        event: wl_pointer::Event,
        id: &SeatId,
        _conn: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        let seat_id = *id;
        match event {
            wl_pointer::Event::Enter {
                serial,
                surface,
                surface_x,
                surface_y,
            } => {
                let focus = focus_of(state, &surface);
                let Some(seat) = state.seats.get_mut(seat_id) else {
                    return;
                };
                seat.pointer_focus = focus;
                state.cursor.on_enter(
                    &mut seat.cursor,
                    pointer,
                    serial,
                    &state.globals.compositor,
                    qh,
                );
                if let Some(focus) = focus {
                    state.events.push(Event::PointerEnter {
                        seat: seat_id,
                        focus,
                        position: Point::new(surface_x, surface_y),
                    });
                }
            }
            wl_pointer::Event::Leave { surface, .. } => {
                let focus = focus_of(state, &surface);
                let Some(seat) = state.seats.get_mut(seat_id) else {
                    return;
                };
                let focus = focus.or(seat.pointer_focus.take());
                seat.pointer_focus = None;
                CursorEngine::on_leave(&mut seat.cursor);
                if let Some(focus) = focus {
                    state.events.push(Event::PointerLeave {
                        seat: seat_id,
                        focus,
                    });
                }
            }
            wl_pointer::Event::Motion {
                surface_x,
                surface_y,
                ..
            } => {
                let focus = state.seats.get(seat_id).and_then(Seat::pointer_focus);
                state.events.push(Event::PointerMotion {
                    seat: seat_id,
                    focus,
                    position: Point::new(surface_x, surface_y),
                });
            }
            wl_pointer::Event::Button {
                button,
                state: button_state,
                ..
            } => {
                let focus = state.seats.get(seat_id).and_then(Seat::pointer_focus);
                let button_state = match button_state {
                    WEnum::Value(wl_pointer::ButtonState::Pressed) => ButtonState::Pressed,
                    _ => ButtonState::Released,
                };
                state.events.push(Event::PointerButton {
                    seat: seat_id,
                    focus,
                    button,
                    state: button_state,
                });
            }
            _ => {}
        }
    }
}

impl Dispatch<WlKeyboard, SeatId> for State {
    fn event(
        state: &mut Self,
        _proxy: &WlKeyboard,
        event: wl_keyboard::Event,
        id: &SeatId,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let seat_id = *id;
        match event {
            wl_keyboard::Event::Enter { surface, .. } => {
                let focus = focus_of(state, &surface);
                if let Some(seat) = state.seats.get_mut(seat_id) {
                    seat.keyboard_focus = focus;
                }
                if let Some(focus) = focus {
                    state.events.push(Event::KeyboardEnter {
                        seat: seat_id,
                        focus,
                    });
                }
            }
            wl_keyboard::Event::Leave { surface, .. } => {
                let focus = focus_of(state, &surface);
                let previous = state
                    .seats
                    .get_mut(seat_id)
                    .and_then(|seat| seat.keyboard_focus.take());
                if let Some(focus) = focus.or(previous) {
                    state.events.push(Event::KeyboardLeave {
                        seat: seat_id,
                        focus,
                    });
                }
            }
            wl_keyboard::Event::Key {
                key,
                state: key_state,
                ..
            } => {
                let focus = state.seats.get(seat_id).and_then(Seat::keyboard_focus);
                let key_state = match key_state {
                    WEnum::Value(wl_keyboard::KeyState::Released) => KeyState::Released,
                    _ => KeyState::Pressed,
                };
                state.events.push(Event::KeyboardKey {
                    seat: seat_id,
                    focus,
                    key,
                    state: key_state,
                });
            }
            // The keymap descriptor is closed when the event drops.
            _ => {}
        }
    }
}

impl Dispatch<WlTouch, SeatId> for State {
    fn event(
        state: &mut Self,
        _proxy: &WlTouch,
        event: wl_touch::Event,
        id: &SeatId,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let seat_id = *id;
        match event {
            wl_touch::Event::Down {
                surface, id, x, y, ..
            } => {
                let Some(focus) = focus_of(state, &surface) else {
                    return;
                };
                if let Some(seat) = state.seats.get_mut(seat_id) {
                    seat.touches.retain(|(t, _)| *t != id);
                    seat.touches.push((id, focus));
                }
                state.events.push(Event::TouchDown {
                    seat: seat_id,
                    focus,
                    touch_id: id,
                    position: Point::new(x, y),
                });
            }
            wl_touch::Event::Up { id, .. } => {
                let focus = state.seats.get_mut(seat_id).and_then(|seat| {
                    let focus = seat.touch_focus(id);
                    seat.touches.retain(|(t, _)| *t != id);
                    focus
                });
                state.events.push(Event::TouchUp {
                    seat: seat_id,
                    focus,
                    touch_id: id,
                });
            }
            wl_touch::Event::Motion { id, x, y, .. } => {
                let focus = state
                    .seats
                    .get(seat_id)
                    .and_then(|seat| seat.touch_focus(id));
                state.events.push(Event::TouchMotion {
                    seat: seat_id,
                    focus,
                    touch_id: id,
                    position: Point::new(x, y),
                });
            }
            wl_touch::Event::Cancel => {
                if let Some(seat) = state.seats.get_mut(seat_id) {
                    seat.touches.clear();
                }
            }
            _ => {}
        }
    }
}
