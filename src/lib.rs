//! Client-side state of a videoroom.
//!
//! Callbacks of a media engine ([`Event`]s) are folded into an immutable
//! [`Snapshot`] of the room, held by a [`Room`] for the duration of a
//! session. Any number of observers watch narrow slices of the
//! [`Snapshot`] through [`Room::select()`] with the [`selectors`], being
//! notified only when their slice really changes.

#![allow(clippy::module_name_repetitions)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(non_ascii_idents, unsafe_code)]

pub mod conf;
pub mod event;
pub mod logging;
pub mod media;
pub mod reducer;
pub mod room;
pub mod selectors;
pub mod snapshot;

#[doc(inline)]
pub use self::{
    conf::Conf,
    event::{Event, EventHandler, PeerInfo, TrackContext},
    media::{Encoding, MediaKind, MediaStream, MediaStreamTrack},
    room::{ConnectionStatus, MediaClient, Room, RoomError},
    snapshot::{Metadata, PeerId, Snapshot, TrackId},
};
#[doc(inline)]
pub use videoroom_reactive::{Dropped, Selection, Subscription};
