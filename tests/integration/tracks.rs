use std::rc::Rc;

use serde_json::json;
use videoroom::{
    selectors, Encoding, Event, MediaKind, MediaStream, MediaStreamTrack,
    PeerInfo, Room, TrackContext,
};

use crate::client;

fn joined() -> Room {
    let (room, _) = client::room();
    room.handle_event(Event::JoinSuccess {
        local_peer_id: "me".into(),
        peers_in_room: vec![PeerInfo::new("p1", json!({}))],
    });
    room
}

fn camera() -> (MediaStream, MediaStreamTrack) {
    (
        MediaStream::new("s1"),
        MediaStreamTrack::new("mt1", MediaKind::Video),
    )
}

#[test]
fn track_lifecycle() {
    let room = joined();
    let tracks = room.select(selectors::tracks_for_peer("p1".into()));
    let (stream, track) = camera();

    room.handle_event(Event::TrackAdded {
        ctx: TrackContext::new("p1", "t1")
            .with_metadata(json!({"type": "camera"})),
    });
    assert_eq!(tracks.get().len(), 1);
    assert_eq!(tracks.get()[0].stream, None);

    room.handle_event(Event::TrackReady {
        ctx: TrackContext::new("p1", "t1")
            .with_media(stream.clone(), track.clone()),
    });
    assert_eq!(tracks.get()[0].stream, Some(stream));
    assert_eq!(tracks.get()[0].media_track, Some(track));

    room.handle_event(Event::TrackRemoved {
        ctx: TrackContext::new("p1", "t1"),
    });
    assert!(tracks.get().is_empty());
}

#[test]
fn added_and_ready_compose_into_single_track() {
    let room = joined();
    let (stream, track) = camera();

    room.handle_event(Event::TrackAdded {
        ctx: TrackContext::new("p1", "t1")
            .with_metadata(json!({"type": "camera", "label": "front"})),
    });
    room.handle_event(Event::TrackReady {
        ctx: TrackContext::new("p1", "t1").with_media(stream.clone(), track),
    });

    let snapshot = room.snapshot().unwrap();
    let peer = snapshot.remote.get(&"p1".into()).unwrap();
    assert_eq!(peer.tracks.len(), 1);
    let t1 = peer.tracks.get(&"t1".into()).unwrap();
    assert_eq!(t1.stream, Some(stream));
    assert_eq!(*t1.metadata, json!({"type": "camera", "label": "front"}));
}

#[test]
fn track_of_absent_peer_is_never_created() {
    let room = joined();
    let (stream, track) = camera();
    let before = room.snapshot().unwrap();

    room.handle_event(Event::TrackReady {
        ctx: TrackContext::new("ghost", "t1").with_media(stream, track),
    });
    room.handle_event(Event::TrackAdded {
        ctx: TrackContext::new("ghost", "t2"),
    });

    assert!(Rc::ptr_eq(&before, &room.snapshot().unwrap()));
    assert!(room.snapshot().unwrap().remote.get(&"ghost".into()).is_none());
}

#[test]
fn encoding_change_keeps_other_fields_shared() {
    let room = joined();
    let (stream, track) = camera();
    room.handle_event(Event::TrackReady {
        ctx: TrackContext::new("p1", "t1")
            .with_media(stream.clone(), track)
            .with_metadata(json!({"type": "camera"})),
    });
    let before = room.snapshot().unwrap();
    let encoding = room.select(selectors::track_encoding(
        "p1".into(),
        "t1".into(),
    ));
    assert_eq!(*encoding.get(), None);

    room.handle_event(Event::TrackEncodingChanged {
        peer_id: "p1".into(),
        track_id: "t1".into(),
        encoding: Encoding::Medium,
    });

    let after = room.snapshot().unwrap();
    let old = before.remote_track(&"p1".into(), &"t1".into()).unwrap();
    let new = after.remote_track(&"p1".into(), &"t1".into()).unwrap();
    assert!(Rc::ptr_eq(&old.metadata, &new.metadata));
    assert_eq!(old.stream, new.stream);
    assert_eq!(new.stream, Some(stream));
    assert_eq!(*encoding.get(), Some(Encoding::Medium));
}

#[test]
fn track_metadata_is_referentially_stable() {
    let room = joined();
    room.handle_event(Event::TrackAdded {
        ctx: TrackContext::new("p1", "t1")
            .with_metadata(json!({"type": "camera"})),
    });
    let metadata =
        room.select(selectors::track_metadata("p1".into(), "t1".into()));
    let first = metadata.get();

    room.handle_event(Event::PeerJoined {
        peer: PeerInfo::new("p2", json!({})),
    });
    room.handle_event(Event::TrackUpdated {
        ctx: TrackContext::new("p1", "t1")
            .with_metadata(json!({"type": "camera"})),
    });
    room.handle_event(Event::TrackEncodingChanged {
        peer_id: "p1".into(),
        track_id: "t1".into(),
        encoding: Encoding::Low,
    });

    assert!(Rc::ptr_eq(&first, &metadata.get()));
    assert_eq!(*first, json!({"type": "camera"}));
}

#[test]
fn tracks_by_type_skips_untyped_tracks() {
    let room = joined();
    for (id, metadata) in vec![
        ("t1", json!({"type": "screensharing"})),
        ("t2", json!({"kind": "camera"})),
        ("t3", json!({"type": "audio"})),
    ] {
        room.handle_event(Event::TrackAdded {
            ctx: TrackContext::new("p1", id).with_metadata(metadata),
        });
    }

    let by_type = room.select(selectors::tracks_by_type("p1".into())).get();

    let ids: Vec<_> = by_type
        .iter()
        .map(|(ty, view)| (ty.to_string(), view.track_id.0.clone()))
        .collect();
    assert_eq!(
        ids,
        vec![
            ("screensharing".to_owned(), "t1".to_owned()),
            ("audio".to_owned(), "t3".to_owned()),
        ],
    );
}
