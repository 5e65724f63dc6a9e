// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Platform-independent building blocks for full-screen layer-shell overlays.
//!
//! `lacquer_core` holds everything about an overlay application that does not
//! need a live compositor connection: handle arenas, geometry predicates,
//! error kinds, the input event model, render pacing state machines, shared
//! buffer sizing and pixel conversion, frame statistics, and the screen
//! capture state machine. It is `no_std` compatible (with `alloc`).
//!
//! The Wayland crate drives these types from protocol callbacks:
//!
//! ```text
//!   compositor events ──► EventQueue<Event> ──► Handler::on_event
//!                                 │
//!   configure ──► buffer sizing ──┘
//!
//!   RenderState ──► FramePacer ──► Handler::on_render ──► commit
//!                                                          │
//!   frame callback ──► FramePacer::frame_done ◄────────────┘
//! ```
//!
//! **[`id`]**: Generational handles and the [`Arena`](id::Arena) that owns
//! per-output, per-seat, and per-surface records.
//!
//! **[`geometry`]**: Integer rectangles in the global logical coordinate
//! space with the hit-test predicates used to route shapes to outputs.
//!
//! **[`output`]**: Accumulates partial output geometry reports into a
//! single logical rectangle.
//!
//! **[`error`]**: Bit-set error kinds and the mandatory-service check.
//!
//! **[`event`]**: Input and surface events delivered to the application.
//!
//! **[`queue`]**: Double-buffered event queue that stays writable while
//! being drained.
//!
//! **[`render`]**: Render-state policy and per-surface frame pacing.
//!
//! **[`buffer`]**: Pixel formats, shared buffer sizing, and format
//! conversion for buffer-to-buffer copies.
//!
//! **[`stats`]**: Trimmed-mean frame statistics.
//!
//! **[`capture`]**: Screen capture handshake state machine.
//!
//! **[`cursor`]**: Pointer cursor shapes and their theme names.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod buffer;
pub mod capture;
pub mod cursor;
pub mod error;
pub mod event;
pub mod geometry;
pub mod id;
pub mod output;
pub mod queue;
pub mod render;
pub mod stats;
