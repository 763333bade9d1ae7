use serde_json::json;
use videoroom::{
    conf, selectors, Encoding, MediaKind, MediaStream, MediaStreamTrack,
    RoomError, TrackId,
};

use crate::client::{self, Call};

fn camera() -> (MediaStreamTrack, MediaStream) {
    (
        MediaStreamTrack::new("cam", MediaKind::Video),
        MediaStream::new("local"),
    )
}

#[test]
fn published_tracks_are_mirrored() {
    let (room, client) = client::room();
    let local = room.select(selectors::local_tracks());
    let (track, stream) = camera();

    let id = room
        .add_track(
            track.clone(),
            stream.clone(),
            json!({"type": "camera"}),
            None,
        )
        .unwrap();
    let mic = room
        .add_track(
            MediaStreamTrack::new("mic", MediaKind::Audio),
            stream.clone(),
            json!({"type": "audio"}),
            None,
        )
        .unwrap();

    assert_eq!(
        local
            .get()
            .iter()
            .map(|t| t.track_id.clone())
            .collect::<Vec<_>>(),
        vec![id.clone(), mic.clone()],
    );
    assert_eq!(local.get()[0].media_track, Some(track));
    assert_eq!(
        client.calls(),
        vec![
            Call::AddTrack {
                track_id: id,
                simulcast: None,
                max_bandwidth: 81_920,
            },
            Call::AddTrack {
                track_id: mic,
                simulcast: None,
                max_bandwidth: 8_192,
            },
        ],
    );
}

#[test]
fn simulcast_controls_update_local_track() {
    let (room, client) = client::room_with(conf::Room {
        simulcast: true,
        default_encodings: vec![Encoding::Low, Encoding::High],
        ..conf::Room::default()
    });
    let (track, stream) = camera();
    let id = room.add_track(track, stream, json!({}), None).unwrap();
    let encodings = || {
        room.snapshot()
            .unwrap()
            .local_track(&id)
            .and_then(|t| t.simulcast_config.clone())
            .map(|c| c.active_encodings().to_vec())
    };
    assert_eq!(encodings(), Some(vec![Encoding::Low, Encoding::High]));

    room.enable_track_encoding(id.clone(), Encoding::Medium)
        .unwrap();
    assert_eq!(
        encodings(),
        Some(vec![Encoding::Low, Encoding::Medium, Encoding::High]),
    );

    room.disable_track_encoding(id.clone(), Encoding::Low)
        .unwrap();
    assert_eq!(encodings(), Some(vec![Encoding::Medium, Encoding::High]));
    assert_eq!(
        client.calls()[1..].to_vec(),
        vec![
            Call::EnableEncoding(id.clone(), Encoding::Medium),
            Call::DisableEncoding(id, Encoding::Low),
        ],
    );
}

#[test]
fn metadata_update_is_mirrored() {
    let (room, client) = client::room();
    let (track, stream) = camera();
    let id = room
        .add_track(track, stream, json!({"type": "camera"}), None)
        .unwrap();
    let metadata = room.select(selectors::local_track_metadata(id.clone()));

    room.update_track_metadata(id.clone(), json!({"type": "screensharing"}))
        .unwrap();

    assert_eq!(*metadata.get(), json!({"type": "screensharing"}));
    assert_eq!(
        client.calls().last(),
        Some(&Call::UpdateTrackMetadata(
            id,
            json!({"type": "screensharing"}),
        )),
    );
}

#[tokio::test]
async fn failed_replace_keeps_local_state() {
    let (room, client) = client::room();
    let (track, stream) = camera();
    let id = room
        .add_track(track.clone(), stream, json!({"type": "camera"}), None)
        .unwrap();
    let screen = MediaStreamTrack::new("screen", MediaKind::Video);

    client.fail_next_replace("negotiation failed");
    let err = room
        .replace_track(id.clone(), screen.clone(), Some(json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err.as_ref(), RoomError::MediaClient(_)));
    let snapshot = room.snapshot().unwrap();
    let local = snapshot.local_track(&id).unwrap();
    assert_eq!(local.media_track, Some(track));
    assert_eq!(*local.metadata, json!({"type": "camera"}));

    room.replace_track(id.clone(), screen.clone(), Some(json!({})))
        .await
        .unwrap();
    let snapshot = room.snapshot().unwrap();
    let local = snapshot.local_track(&id).unwrap();
    assert_eq!(local.media_track, Some(screen));
    assert_eq!(*local.metadata, json!({}));
}

#[tokio::test]
async fn leaving_during_replace_skips_mirroring() {
    let (room, _) = client::room();
    let (track, stream) = camera();
    let id = room.add_track(track, stream, json!({}), None).unwrap();
    let replaced = room.replace_track(
        id,
        MediaStreamTrack::new("screen", MediaKind::Video),
        None,
    );

    room.leave();

    assert_eq!(replaced.await.unwrap_err().as_ref(), &RoomError::Closed);
}

#[test]
fn removed_track_disappears() {
    let (room, _) = client::room();
    let (track, stream) = camera();
    let id = room.add_track(track, stream, json!({}), None).unwrap();

    room.remove_track(id.clone()).unwrap();

    assert!(room.snapshot().unwrap().local_track(&id).is_none());
    assert_eq!(
        room.remove_track(id.clone()).unwrap_err().as_ref(),
        &RoomError::UnknownTrack(TrackId::from("local-1")),
    );
}
