// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod event;
pub mod note;
pub mod playlist;
pub mod user;
pub mod video;

pub use event::Event;
pub use note::{Note, NotePatch};
pub use playlist::{CounterDelta, Playlist, DEFAULT_PLATFORM};
pub use user::{SessionEntry, User, UserProfile};
pub use video::{Video, VideoPatch};
