//! Callbacks of the media engine.

use videoroom_macro::dispatchable;

use crate::{
    media::{Encoding, MediaStream, MediaStreamTrack, SimulcastConfig},
    snapshot::{Metadata, PeerId, TrackId},
};

/// Peer as reported by the media engine.
#[derive(Clone, Debug, PartialEq)]
pub struct PeerInfo {
    /// ID of the peer.
    pub id: PeerId,

    /// Metadata of the peer.
    pub metadata: Metadata,
}

impl PeerInfo {
    /// Creates a new [`PeerInfo`].
    #[inline]
    #[must_use]
    pub fn new<I: Into<PeerId>>(id: I, metadata: Metadata) -> Self {
        Self {
            id: id.into(),
            metadata,
        }
    }
}

/// Track as reported by the media engine.
///
/// The media engine may omit any of the fields, so every one of them is
/// optional. Events missing the fields they need are dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackContext {
    /// ID of the peer owning the track.
    pub peer_id: Option<PeerId>,

    /// ID of the track.
    pub track_id: Option<TrackId>,

    /// [`MediaStream`] of the track, once it's ready.
    pub stream: Option<MediaStream>,

    /// [`MediaStreamTrack`] itself, once it's ready.
    pub track: Option<MediaStreamTrack>,

    /// Metadata of the track.
    pub metadata: Option<Metadata>,

    /// Simulcast settings of the track.
    pub simulcast_config: Option<SimulcastConfig>,
}

impl TrackContext {
    /// Creates a new [`TrackContext`] of the track with the provided IDs and
    /// nothing else.
    #[must_use]
    pub fn new<P, T>(peer_id: P, track_id: T) -> Self
    where
        P: Into<PeerId>,
        T: Into<TrackId>,
    {
        Self {
            peer_id: Some(peer_id.into()),
            track_id: Some(track_id.into()),
            ..Self::default()
        }
    }

    /// Sets the [`MediaStream`] and the [`MediaStreamTrack`] of this
    /// [`TrackContext`].
    #[must_use]
    pub fn with_media(
        mut self,
        stream: MediaStream,
        track: MediaStreamTrack,
    ) -> Self {
        self.stream = Some(stream);
        self.track = Some(track);
        self
    }

    /// Sets the [`Metadata`] of this [`TrackContext`].
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Sets the [`SimulcastConfig`] of this [`TrackContext`].
    #[must_use]
    pub fn with_simulcast(mut self, config: SimulcastConfig) -> Self {
        self.simulcast_config = Some(config);
        self
    }
}

/// Callback of the media engine.
///
/// Events are handled strictly in the order they are delivered, one at a
/// time.
#[dispatchable(self: &Self)]
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Local peer has joined the room.
    JoinSuccess {
        /// ID assigned to the local peer.
        local_peer_id: PeerId,

        /// Peers which were in the room at the moment of joining.
        peers_in_room: Vec<PeerInfo>,
    },

    /// Local peer was refused to join the room.
    JoinError {
        /// Details provided by the server.
        metadata: Metadata,
    },

    /// Local peer was removed from the room by the server.
    Removed {
        /// Reason of the removal.
        reason: String,
    },

    /// New remote peer has joined the room.
    PeerJoined {
        /// Joined peer.
        peer: PeerInfo,
    },

    /// Remote peer has left the room.
    PeerLeft {
        /// ID of the left peer.
        peer_id: PeerId,
    },

    /// Metadata of a remote peer has been changed.
    PeerUpdated {
        /// Updated peer.
        peer: PeerInfo,
    },

    /// Remote track has been announced, but isn't ready yet.
    TrackAdded {
        /// Added track.
        ctx: TrackContext,
    },

    /// Remote track is ready for playback.
    TrackReady {
        /// Ready track.
        ctx: TrackContext,
    },

    /// Remote track has been removed.
    TrackRemoved {
        /// Removed track.
        ctx: TrackContext,
    },

    /// Metadata (and possibly the stream) of a remote track has been changed.
    TrackUpdated {
        /// Updated track.
        ctx: TrackContext,
    },

    /// Remote track is received with another [`Encoding`] now.
    TrackEncodingChanged {
        /// ID of the peer owning the track.
        peer_id: PeerId,

        /// ID of the track.
        track_id: TrackId,

        /// New [`Encoding`] of the track.
        encoding: Encoding,
    },

    /// Set of remote tracks the server forwards to the local peer has been
    /// changed.
    TracksPriorityChanged {
        /// Tracks being forwarded now.
        enabled_tracks: Vec<TrackContext>,

        /// Tracks not being forwarded anymore.
        disabled_tracks: Vec<TrackContext>,
    },

    /// Connection with the media server has failed.
    ConnectionError {
        /// Description of the failure.
        message: String,
    },
}

impl Event {
    /// Returns name of this [`Event`] variant.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinSuccess { .. } => "JoinSuccess",
            Self::JoinError { .. } => "JoinError",
            Self::Removed { .. } => "Removed",
            Self::PeerJoined { .. } => "PeerJoined",
            Self::PeerLeft { .. } => "PeerLeft",
            Self::PeerUpdated { .. } => "PeerUpdated",
            Self::TrackAdded { .. } => "TrackAdded",
            Self::TrackReady { .. } => "TrackReady",
            Self::TrackRemoved { .. } => "TrackRemoved",
            Self::TrackUpdated { .. } => "TrackUpdated",
            Self::TrackEncodingChanged { .. } => "TrackEncodingChanged",
            Self::TracksPriorityChanged { .. } => "TracksPriorityChanged",
            Self::ConnectionError { .. } => "ConnectionError",
        }
    }
}
