//! Translation of the media engine callbacks into [`Snapshot`] mutations.

use std::{cell::RefCell, rc::Rc};

use videoroom_reactive::Store;

use crate::{
    event::{EventHandler, PeerInfo, TrackContext},
    media::{Encoding, MediaStreamTrack, TrackType},
    snapshot::{
        put_track, remove_track, update_track, Metadata, PeerId, RemotePeer,
        Snapshot, Track, TrackId,
    },
};

/// Applier of [`Event`]s and local track changes to a [`Store`].
///
/// Every snapshot-affecting operation results in exactly one
/// [`Store::set_snapshot`] call. Operations referring to peers or tracks
/// which aren't there keep the [`Snapshot`] as it is.
///
/// [`Event`]: crate::Event
#[derive(Debug)]
pub struct Reducer {
    /// [`Store`] being mutated.
    store: Rc<Store<Snapshot>>,

    /// Metadata the local peer joins the room with.
    join_metadata: RefCell<Rc<Metadata>>,
}

impl Reducer {
    /// Creates a new [`Reducer`] mutating the provided [`Store`].
    #[must_use]
    pub fn new(store: Rc<Store<Snapshot>>) -> Self {
        Self {
            store,
            join_metadata: RefCell::new(Rc::new(Metadata::Null)),
        }
    }

    /// Returns the [`Store`] mutated by this [`Reducer`].
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Rc<Store<Snapshot>> {
        &self.store
    }

    /// Remembers the metadata the local peer joins the room with.
    pub fn set_join_metadata(&self, metadata: Metadata) {
        *self.join_metadata.borrow_mut() = Rc::new(metadata);
    }

    /// Places a new local [`Track`], overwriting the one with the same ID.
    pub fn add_local_track(&self, track: Track) {
        self.store.set_snapshot(move |prev| {
            prev.map_local(|local| {
                local.map_tracks(|tracks| put_track(tracks, track))
            })
        });
    }

    /// Swaps the [`MediaStreamTrack`] and the metadata of the local [`Track`]
    /// with the provided ID.
    ///
    /// [`None`] metadata resets it to `null`.
    pub fn replace_local_track(
        &self,
        track_id: TrackId,
        media_track: MediaStreamTrack,
        metadata: Option<Metadata>,
    ) {
        self.update_local_track(track_id, move |track| {
            Some(Track {
                media_track: Some(media_track),
                metadata: Rc::new(metadata.unwrap_or(Metadata::Null)),
                ..track.clone()
            })
        });
    }

    /// Removes the local [`Track`] with the provided ID.
    pub fn remove_local_track(&self, track_id: TrackId) {
        self.store.set_snapshot(move |prev| {
            prev.map_local(|local| {
                local.map_tracks(|tracks| remove_track(tracks, &track_id))
            })
        });
    }

    /// Replaces metadata of the local [`Track`] with the provided ID.
    pub fn update_local_track_metadata(
        &self,
        track_id: TrackId,
        metadata: Metadata,
    ) {
        self.update_local_track(track_id, move |track| {
            (*track.metadata != metadata).then(|| Track {
                metadata: Rc::new(metadata),
                ..track.clone()
            })
        });
    }

    /// Activates or deactivates the provided [`Encoding`] in the simulcast
    /// settings of the local [`Track`] with the provided ID.
    ///
    /// Tracks without simulcast settings are kept as they are.
    pub fn toggle_local_encoding(
        &self,
        track_id: TrackId,
        encoding: Encoding,
        active: bool,
    ) {
        self.update_local_track(track_id, move |track| {
            let conf = track.simulcast_config.as_ref()?;
            let conf = if active {
                conf.with_encoding(encoding)
            } else {
                conf.without_encoding(encoding)
            }?;
            Some(Track {
                simulcast_config: Some(conf),
                ..track.clone()
            })
        });
    }

    /// Applies the provided `f` to the local [`Track`] with the provided ID.
    fn update_local_track<F>(&self, track_id: TrackId, f: F)
    where
        F: FnOnce(&Track) -> Option<Track> + 'static,
    {
        self.store.set_snapshot(move |prev| {
            prev.map_local(|local| {
                local.map_tracks(|tracks| update_track(tracks, &track_id, f))
            })
        });
    }

    /// Applies the provided `f` to the [`Track`] of the remote peer.
    fn update_remote_track<F>(&self, peer_id: PeerId, track_id: TrackId, f: F)
    where
        F: FnOnce(&Track) -> Option<Track> + 'static,
    {
        self.store.set_snapshot(move |prev| {
            prev.map_remote_peer(&peer_id, |peer| {
                peer.map_tracks(|tracks| update_track(tracks, &track_id, f))
            })
        });
    }
}

/// Extracts the IDs of the peer and the track from the provided
/// [`TrackContext`], logging if any is missing.
fn ids_of(event: &str, ctx: &TrackContext) -> Option<(PeerId, TrackId)> {
    match (&ctx.peer_id, &ctx.track_id) {
        (Some(peer_id), Some(track_id)) => {
            Some((peer_id.clone(), track_id.clone()))
        }
        _ => {
            log::warn!(
                "{} event without peer ID or track ID is dropped: {:?}",
                event,
                ctx,
            );
            None
        }
    }
}

/// Logs if the provided track metadata carries no valid [`TrackType`].
fn warn_if_untyped(peer_id: &PeerId, track_id: &TrackId, metadata: &Metadata) {
    if TrackType::from_metadata(metadata).is_none() {
        log::warn!(
            "Track `{}` of peer `{}` has no valid type in its metadata: {}",
            track_id,
            peer_id,
            metadata,
        );
    }
}

impl EventHandler for Reducer {
    type Output = ();

    /// Replaces the whole [`Snapshot`] with a fresh one seeded with the
    /// roster of the room.
    fn on_join_success(
        &self,
        local_peer_id: PeerId,
        peers_in_room: Vec<PeerInfo>,
    ) {
        let metadata = Rc::clone(&self.join_metadata.borrow());
        self.store.set_snapshot(move |_| {
            Rc::new(Snapshot::joined(
                local_peer_id,
                metadata,
                peers_in_room
                    .into_iter()
                    .map(|p| RemotePeer::new(p.id, p.metadata)),
            ))
        });
    }

    fn on_join_error(&self, _: Metadata) {}

    fn on_removed(&self, _: String) {}

    fn on_peer_joined(&self, peer: PeerInfo) {
        self.store.set_snapshot(move |prev| {
            prev.map_remote(|remote| {
                let mut next = remote.as_ref().clone();
                let _ = next.insert(
                    peer.id.clone(),
                    Rc::new(RemotePeer::new(peer.id, peer.metadata)),
                );
                Rc::new(next)
            })
        });
    }

    fn on_peer_left(&self, peer_id: PeerId) {
        self.store.set_snapshot(move |prev| {
            prev.map_remote(|remote| {
                if !remote.contains_key(&peer_id) {
                    return Rc::clone(remote);
                }
                let mut next = remote.as_ref().clone();
                let _ = next.remove(&peer_id);
                Rc::new(next)
            })
        });
    }

    /// Replaces metadata of the remote peer keeping its tracks.
    fn on_peer_updated(&self, peer: PeerInfo) {
        let PeerInfo { id, metadata } = peer;
        self.store.set_snapshot(move |prev| {
            prev.map_remote_peer(&id, |old| {
                if *old.metadata == metadata {
                    return Rc::clone(old);
                }
                Rc::new(RemotePeer {
                    id: old.id.clone(),
                    metadata: Rc::new(metadata),
                    tracks: Rc::clone(&old.tracks),
                })
            })
        });
    }

    /// Places a not yet ready [`Track`] if its peer is known.
    fn on_track_added(&self, ctx: TrackContext) {
        let (peer_id, track_id) = match ids_of("TrackAdded", &ctx) {
            Some(ids) => ids,
            None => return,
        };
        warn_if_untyped(
            &peer_id,
            &track_id,
            ctx.metadata.as_ref().unwrap_or(&Metadata::Null),
        );
        let track = Track {
            track_id,
            stream: None,
            media_track: None,
            metadata: Rc::new(ctx.metadata.unwrap_or(Metadata::Null)),
            simulcast_config: ctx.simulcast_config,
            encoding: None,
        };
        self.store.set_snapshot(move |prev| {
            prev.map_remote_peer(&peer_id, |peer| {
                peer.map_tracks(|tracks| put_track(tracks, track))
            })
        });
    }

    /// Upserts a ready [`Track`] if its peer is known.
    ///
    /// Fields not provided by the media engine are kept from the previously
    /// added [`Track`].
    fn on_track_ready(&self, ctx: TrackContext) {
        let (peer_id, track_id) = match ids_of("TrackReady", &ctx) {
            Some(ids) => ids,
            None => return,
        };
        let (stream, media_track) = match (ctx.stream, ctx.track) {
            (Some(stream), Some(track)) => (stream, track),
            _ => {
                log::warn!(
                    "TrackReady event without stream or track is dropped: \
                     peer `{}`, track `{}`",
                    peer_id,
                    track_id,
                );
                return;
            }
        };
        let metadata = ctx.metadata;
        if let Some(metadata) = &metadata {
            warn_if_untyped(&peer_id, &track_id, metadata);
        }
        let simulcast_config = ctx.simulcast_config;

        self.store.set_snapshot(move |prev| {
            prev.map_remote_peer(&peer_id, |peer| {
                peer.map_tracks(|tracks| {
                    let ready = match tracks.get(&track_id) {
                        Some(added) => Track {
                            track_id,
                            stream: Some(stream),
                            media_track: Some(media_track),
                            metadata: metadata.map_or_else(
                                || Rc::clone(&added.metadata),
                                Rc::new,
                            ),
                            simulcast_config: simulcast_config
                                .or_else(|| added.simulcast_config.clone()),
                            encoding: added.encoding,
                        },
                        None => Track {
                            stream: Some(stream),
                            media_track: Some(media_track),
                            simulcast_config,
                            ..Track::new(
                                track_id,
                                metadata.unwrap_or(Metadata::Null),
                            )
                        },
                    };
                    put_track(tracks, ready)
                })
            })
        });
    }

    fn on_track_removed(&self, ctx: TrackContext) {
        let (peer_id, track_id) = match ids_of("TrackRemoved", &ctx) {
            Some(ids) => ids,
            None => return,
        };
        self.store.set_snapshot(move |prev| {
            prev.map_remote_peer(&peer_id, |peer| {
                peer.map_tracks(|tracks| remove_track(tracks, &track_id))
            })
        });
    }

    /// Replaces metadata and the stream of an existing [`Track`] with the
    /// provided ones.
    fn on_track_updated(&self, ctx: TrackContext) {
        let (peer_id, track_id) = match ids_of("TrackUpdated", &ctx) {
            Some(ids) => ids,
            None => return,
        };
        let (metadata, stream) = (ctx.metadata, ctx.stream);
        self.update_remote_track(peer_id, track_id, move |track| {
            let metadata = metadata
                .map_or_else(|| Rc::clone(&track.metadata), Rc::new);
            let stream = stream.or_else(|| track.stream.clone());
            if track.metadata == metadata && track.stream == stream {
                return None;
            }
            Some(Track {
                metadata,
                stream,
                ..track.clone()
            })
        });
    }

    fn on_track_encoding_changed(
        &self,
        peer_id: PeerId,
        track_id: TrackId,
        encoding: Encoding,
    ) {
        self.update_remote_track(peer_id, track_id, move |track| {
            (track.encoding != Some(encoding)).then(|| Track {
                encoding: Some(encoding),
                ..track.clone()
            })
        });
    }

    fn on_tracks_priority_changed(
        &self,
        _: Vec<TrackContext>,
        _: Vec<TrackContext>,
    ) {
    }

    fn on_connection_error(&self, _: String) {}
}
