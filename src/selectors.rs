//! Selector factories projecting a [`Snapshot`] to narrow views.
//!
//! Every factory returns a pure function of an optional [`Snapshot`], which
//! is [`None`] before a room is joined or once it's left. Selectors never
//! panic and return empty values for missing data.
//!
//! Selectors are meant to be used with [`Room::select`], which memoizes their
//! results.
//!
//! [`Room::select`]: crate::Room::select

use serde_json::Map;

use crate::{
    media::{
        Encoding, MediaStream, MediaStreamTrack, SimulcastConfig, TrackType,
    },
    snapshot::{Metadata, PeerId, Snapshot, Track, TrackId, TrackMap},
};

/// Track without its metadata.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TrackView {
    /// ID of the track.
    pub track_id: TrackId,

    /// [`MediaStream`] of the track, if it's ready.
    pub stream: Option<MediaStream>,

    /// [`MediaStreamTrack`] of the track, if it's ready.
    pub media_track: Option<MediaStreamTrack>,

    /// Simulcast settings of the track.
    pub simulcast_config: Option<SimulcastConfig>,
}

impl From<&Track> for TrackView {
    fn from(track: &Track) -> Self {
        Self {
            track_id: track.track_id.clone(),
            stream: track.stream.clone(),
            media_track: track.media_track.clone(),
            simulcast_config: track.simulcast_config.clone(),
        }
    }
}

/// Presentation data of a remote peer, taken from its metadata.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PeerGui {
    /// ID of the peer.
    pub id: PeerId,

    /// `displayName` of the peer, if it's a string.
    pub display_name: Option<String>,

    /// `emoji` of the peer, if it's a string.
    pub emoji: Option<String>,
}

impl PeerGui {
    /// Extracts [`PeerGui`] from the provided peer [`Metadata`].
    #[must_use]
    pub fn from_metadata(id: PeerId, metadata: &Metadata) -> Self {
        let field = |name: &str| {
            metadata.get(name).and_then(Metadata::as_str).map(str::to_owned)
        };
        Self {
            id,
            display_name: field("displayName"),
            emoji: field("emoji"),
        }
    }
}

/// Returns IDs of all the remote peers in the order they were seen.
pub fn peer_ids() -> impl Fn(Option<&Snapshot>) -> Vec<PeerId> {
    |snapshot| {
        snapshot
            .map(|s| s.remote.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Returns the tracks of the remote peer with the provided [`PeerId`].
pub fn tracks_for_peer(
    peer_id: PeerId,
) -> impl Fn(Option<&Snapshot>) -> Vec<TrackView> {
    move |snapshot| {
        remote_tracks(snapshot, &peer_id)
            .map(|tracks| {
                tracks.values().map(|t| TrackView::from(&**t)).collect()
            })
            .unwrap_or_default()
    }
}

/// Returns IDs of the tracks of the remote peer with the provided
/// [`PeerId`].
pub fn track_ids(
    peer_id: PeerId,
) -> impl Fn(Option<&Snapshot>) -> Vec<TrackId> {
    move |snapshot| {
        remote_tracks(snapshot, &peer_id)
            .map(|tracks| tracks.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Returns the tracks of the remote peer with the provided [`PeerId`] along
/// with their [`TrackType`]s.
///
/// Tracks without a valid [`TrackType`] in their metadata are skipped.
pub fn tracks_by_type(
    peer_id: PeerId,
) -> impl Fn(Option<&Snapshot>) -> Vec<(TrackType, TrackView)> {
    move |snapshot| {
        let tracks = match remote_tracks(snapshot, &peer_id) {
            Some(tracks) => tracks,
            None => return Vec::new(),
        };
        tracks
            .values()
            .filter_map(|track| {
                let ty = TrackType::from_metadata(&track.metadata)?;
                Some((ty, TrackView::from(&**track)))
            })
            .collect()
    }
}

/// Returns metadata of the track of the remote peer.
///
/// Returns an empty object if there is no such track or its metadata is
/// `null`.
pub fn track_metadata(
    peer_id: PeerId,
    track_id: TrackId,
) -> impl Fn(Option<&Snapshot>) -> Metadata {
    move |snapshot| {
        non_null(
            snapshot
                .and_then(|s| s.remote_track(&peer_id, &track_id))
                .map(|t| &*t.metadata),
        )
    }
}

/// Returns [`Encoding`] the track of the remote peer is received with.
pub fn track_encoding(
    peer_id: PeerId,
    track_id: TrackId,
) -> impl Fn(Option<&Snapshot>) -> Option<Encoding> {
    move |snapshot| {
        snapshot
            .and_then(|s| s.remote_track(&peer_id, &track_id))
            .and_then(|t| t.encoding)
    }
}

/// Returns [`PeerGui`] of the remote peer with the provided [`PeerId`].
pub fn peer_gui(
    peer_id: PeerId,
) -> impl Fn(Option<&Snapshot>) -> Option<PeerGui> {
    move |snapshot| {
        let peer = snapshot?.remote.get(&peer_id)?;
        Some(PeerGui::from_metadata(peer.id.clone(), &peer.metadata))
    }
}

/// Returns [`PeerGui`]s of all the remote peers in the order they were seen.
pub fn peers_gui() -> impl Fn(Option<&Snapshot>) -> Vec<PeerGui> {
    |snapshot| {
        snapshot
            .map(|s| {
                s.remote
                    .values()
                    .map(|p| PeerGui::from_metadata(p.id.clone(), &p.metadata))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Returns the whole [`Snapshot`].
///
/// The returned [`Snapshot`] shares all its data with the stored one.
pub fn full_state() -> impl Fn(Option<&Snapshot>) -> Option<Snapshot> {
    |snapshot| snapshot.cloned()
}

/// Returns ID of the local peer, once joined.
pub fn local_peer_id() -> impl Fn(Option<&Snapshot>) -> Option<PeerId> {
    |snapshot| snapshot.and_then(|s| s.local.id.clone())
}

/// Returns the tracks published by the local peer.
pub fn local_tracks() -> impl Fn(Option<&Snapshot>) -> Vec<TrackView> {
    |snapshot| {
        snapshot
            .map(|s| {
                s.local
                    .tracks
                    .values()
                    .map(|t| TrackView::from(&**t))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Returns metadata of the local track.
///
/// Returns an empty object if there is no such track or its metadata is
/// `null`.
pub fn local_track_metadata(
    track_id: TrackId,
) -> impl Fn(Option<&Snapshot>) -> Metadata {
    move |snapshot| {
        non_null(
            snapshot
                .and_then(|s| s.local_track(&track_id))
                .map(|t| &*t.metadata),
        )
    }
}

/// Returns the tracks of the remote peer with the provided [`PeerId`].
fn remote_tracks<'a>(
    snapshot: Option<&'a Snapshot>,
    peer_id: &PeerId,
) -> Option<&'a TrackMap> {
    snapshot?.remote.get(peer_id).map(|p| &*p.tracks)
}

/// Returns a copy of the provided [`Metadata`], replacing a missing or `null`
/// one with an empty object.
fn non_null(metadata: Option<&Metadata>) -> Metadata {
    match metadata {
        Some(Metadata::Null) | None => Metadata::Object(Map::new()),
        Some(metadata) => metadata.clone(),
    }
}
