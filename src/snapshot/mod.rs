//! Immutable peer/track state of a room.
//!
//! Every mutation produces a new [`Snapshot`] sharing all the unchanged
//! subtrees with the previous one, so unchanged data keeps its [`Rc`]
//! identity. Transformations returning the very same [`Rc`] they were given
//! mean "nothing changed".

mod ordered;
mod track;

use std::rc::Rc;

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

#[doc(inline)]
pub use self::{
    ordered::{Iter, OrderedMap},
    track::{Track, TrackMap},
};

pub(crate) use self::track::{put as put_track, remove as remove_track};
pub(crate) use self::track::update as update_track;

/// Opaque application-defined metadata of a peer or a track.
pub type Metadata = serde_json::Value;

/// Remote peers of a room, keyed by [`PeerId`].
pub type PeerMap = OrderedMap<PeerId, Rc<RemotePeer>>;

/// ID of a peer in a room.
#[derive(
    Clone, Debug, Deserialize, Display, Eq, From, Hash, PartialEq, Serialize,
)]
#[from(forward)]
pub struct PeerId(pub String);

/// ID of a track, unique within its owning peer.
#[derive(
    Clone, Debug, Deserialize, Display, Eq, From, Hash, PartialEq, Serialize,
)]
#[from(forward)]
pub struct TrackId(pub String);

/// Single immutable version of the whole peer/track state of a room.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Snapshot {
    /// Local peer.
    pub local: Rc<LocalPeer>,

    /// Remote peers in the order they were seen.
    pub remote: Rc<PeerMap>,
}

/// Local peer of a room.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LocalPeer {
    /// ID assigned to the local peer on joining. [`None`] before that.
    pub id: Option<PeerId>,

    /// Metadata the local peer joined with.
    pub metadata: Rc<Metadata>,

    /// Tracks published by the local peer.
    pub tracks: Rc<TrackMap>,
}

impl Default for LocalPeer {
    fn default() -> Self {
        Self {
            id: None,
            metadata: Rc::new(Metadata::Null),
            tracks: Rc::default(),
        }
    }
}

/// Remote peer of a room.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemotePeer {
    /// ID of this [`RemotePeer`].
    pub id: PeerId,

    /// Metadata of this [`RemotePeer`].
    pub metadata: Rc<Metadata>,

    /// Tracks received from this [`RemotePeer`].
    pub tracks: Rc<TrackMap>,
}

impl RemotePeer {
    /// Creates a new [`RemotePeer`] without tracks.
    #[must_use]
    pub fn new(id: PeerId, metadata: Metadata) -> Self {
        Self {
            id,
            metadata: Rc::new(metadata),
            tracks: Rc::default(),
        }
    }
}

impl Snapshot {
    /// Creates a new [`Snapshot`] of a just joined room.
    pub(crate) fn joined<I>(
        local_id: PeerId,
        local_metadata: Rc<Metadata>,
        peers: I,
    ) -> Self
    where
        I: IntoIterator<Item = RemotePeer>,
    {
        Self {
            local: Rc::new(LocalPeer {
                id: Some(local_id),
                metadata: local_metadata,
                tracks: Rc::default(),
            }),
            remote: Rc::new(
                peers
                    .into_iter()
                    .map(|peer| (peer.id.clone(), Rc::new(peer)))
                    .collect(),
            ),
        }
    }

    /// Replaces [`Snapshot::remote`] with the one returned by `f`.
    pub(crate) fn map_remote<F>(self: &Rc<Self>, f: F) -> Rc<Self>
    where
        F: FnOnce(&Rc<PeerMap>) -> Rc<PeerMap>,
    {
        let remote = f(&self.remote);
        if Rc::ptr_eq(&remote, &self.remote) {
            return Rc::clone(self);
        }
        Rc::new(Self {
            local: Rc::clone(&self.local),
            remote,
        })
    }

    /// Replaces the [`RemotePeer`] with the provided [`PeerId`] with the one
    /// returned by `f`.
    ///
    /// Does nothing if there is no such [`RemotePeer`].
    pub(crate) fn map_remote_peer<F>(
        self: &Rc<Self>,
        peer_id: &PeerId,
        f: F,
    ) -> Rc<Self>
    where
        F: FnOnce(&Rc<RemotePeer>) -> Rc<RemotePeer>,
    {
        self.map_remote(|remote| {
            let peer = match remote.get(peer_id) {
                Some(peer) => peer,
                None => return Rc::clone(remote),
            };
            let updated = f(peer);
            if Rc::ptr_eq(&updated, peer) {
                return Rc::clone(remote);
            }
            let mut next = PeerMap::clone(remote);
            let _ = next.insert(peer_id.clone(), updated);
            Rc::new(next)
        })
    }

    /// Replaces [`Snapshot::local`] with the one returned by `f`.
    pub(crate) fn map_local<F>(self: &Rc<Self>, f: F) -> Rc<Self>
    where
        F: FnOnce(&Rc<LocalPeer>) -> Rc<LocalPeer>,
    {
        let local = f(&self.local);
        if Rc::ptr_eq(&local, &self.local) {
            return Rc::clone(self);
        }
        Rc::new(Self {
            local,
            remote: Rc::clone(&self.remote),
        })
    }

    /// Returns the [`Track`] of the [`RemotePeer`] with the provided
    /// [`PeerId`].
    #[must_use]
    pub fn remote_track(
        &self,
        peer_id: &PeerId,
        track_id: &TrackId,
    ) -> Option<&Rc<Track>> {
        self.remote.get(peer_id)?.tracks.get(track_id)
    }

    /// Returns the [`Track`] of the [`LocalPeer`].
    #[inline]
    #[must_use]
    pub fn local_track(&self, track_id: &TrackId) -> Option<&Rc<Track>> {
        self.local.tracks.get(track_id)
    }
}

impl LocalPeer {
    /// Replaces [`LocalPeer::tracks`] with the ones returned by `f`.
    pub(crate) fn map_tracks<F>(self: &Rc<Self>, f: F) -> Rc<Self>
    where
        F: FnOnce(&Rc<TrackMap>) -> Rc<TrackMap>,
    {
        let tracks = f(&self.tracks);
        if Rc::ptr_eq(&tracks, &self.tracks) {
            return Rc::clone(self);
        }
        Rc::new(Self {
            id: self.id.clone(),
            metadata: Rc::clone(&self.metadata),
            tracks,
        })
    }
}

impl RemotePeer {
    /// Replaces [`RemotePeer::tracks`] with the ones returned by `f`.
    pub(crate) fn map_tracks<F>(self: &Rc<Self>, f: F) -> Rc<Self>
    where
        F: FnOnce(&Rc<TrackMap>) -> Rc<TrackMap>,
    {
        let tracks = f(&self.tracks);
        if Rc::ptr_eq(&tracks, &self.tracks) {
            return Rc::clone(self);
        }
        Rc::new(Self {
            id: self.id.clone(),
            metadata: Rc::clone(&self.metadata),
            tracks,
        })
    }
}
