use std::{cell::Cell, rc::Rc};

use futures::{stream, StreamExt as _};
use serde_json::json;
use videoroom::{
    selectors::{self, PeerGui},
    ConnectionStatus, Dropped, Event, PeerId, PeerInfo, RoomError,
};

use crate::{
    client::{self, Call},
    if_let_next, timeout,
};

fn join_success() -> Event {
    Event::JoinSuccess {
        local_peer_id: "p1".into(),
        peers_in_room: vec![PeerInfo::new("p2", json!({"name": "Bob"}))],
    }
}

#[tokio::test]
async fn join_flow_seeds_roster() {
    let (room, client) = client::room();
    let peers = room.select(selectors::peer_ids());
    let mut statuses = room.on_status_change().fuse();

    room.join(json!({"displayName": "Alice"})).unwrap();
    room.handle_event(join_success());

    assert_eq!(*peers.get(), vec![PeerId::from("p2")]);
    let snapshot = room.snapshot().unwrap();
    assert_eq!(snapshot.local.id, Some(PeerId::from("p1")));
    assert_eq!(*snapshot.local.metadata, json!({"displayName": "Alice"}));
    assert_eq!(
        *snapshot.remote.get(&"p2".into()).unwrap().metadata,
        json!({"name": "Bob"}),
    );
    assert_eq!(
        client.calls(),
        vec![Call::Join(json!({"displayName": "Alice"}))],
    );
    timeout(async {
        if_let_next! {
            ConnectionStatus::Connected = statuses {}
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn process_events_applies_stream_in_order() {
    let (room, _) = client::room();
    let peers = room.select(selectors::peer_ids());

    room.process_events(stream::iter(vec![
        join_success(),
        Event::PeerJoined {
            peer: PeerInfo::new("p3", json!({})),
        },
        Event::PeerLeft {
            peer_id: "p2".into(),
        },
        Event::PeerJoined {
            peer: PeerInfo::new("p4", json!({})),
        },
    ]))
    .await;

    assert_eq!(*peers.get(), vec![PeerId::from("p3"), PeerId::from("p4")]);
}

#[test]
fn each_mutation_notifies_exactly_once() {
    let (room, _) = client::room();
    let notified = Rc::new(Cell::new(0));
    let store = room.store().unwrap();
    let _subscription = store.subscribe({
        let notified = Rc::clone(&notified);
        move || notified.set(notified.get() + 1)
    });
    drop(store);

    room.handle_event(join_success());
    assert_eq!(notified.get(), 1);

    room.handle_event(Event::PeerJoined {
        peer: PeerInfo::new("p3", json!({})),
    });
    assert_eq!(notified.get(), 2);

    room.handle_event(Event::PeerUpdated {
        peer: PeerInfo::new("p3", json!({})),
    });
    room.handle_event(Event::Removed {
        reason: "kicked".into(),
    });
    assert_eq!(notified.get(), 2);
}

#[test]
fn peer_left_of_absent_peer_is_noop() {
    let (room, _) = client::room();
    room.handle_event(join_success());
    let notified = Rc::new(Cell::new(false));
    let peers = room.select(selectors::peer_ids());
    let _subscription = peers.subscribe({
        let notified = Rc::clone(&notified);
        move || notified.set(true)
    });
    let before = room.snapshot().unwrap();

    room.handle_event(Event::PeerLeft {
        peer_id: "ghost".into(),
    });

    assert!(Rc::ptr_eq(&before, &room.snapshot().unwrap()));
    assert!(!notified.get());
}

#[test]
fn peers_gui_follows_metadata_updates() {
    let (room, _) = client::room();
    room.handle_event(join_success());
    let gui = room.select(selectors::peer_gui("p2".into()));
    let first = gui.get();
    assert_eq!(
        *first,
        Some(PeerGui {
            id: "p2".into(),
            display_name: None,
            emoji: None,
        }),
    );

    room.handle_event(Event::PeerUpdated {
        peer: PeerInfo::new("p2", json!({"displayName": "Bob", "emoji": 7})),
    });

    let second = gui.get();
    assert!(!Rc::ptr_eq(&first, &second));
    assert_eq!(
        *second,
        Some(PeerGui {
            id: "p2".into(),
            display_name: Some("Bob".into()),
            emoji: None,
        }),
    );
}

#[tokio::test]
async fn leave_ends_observation() {
    let (room, client) = client::room();
    room.join(json!({})).unwrap();
    room.handle_event(join_success());
    let peers = room.select(selectors::peer_ids());
    let someone_new = peers.when(|peers| peers.len() > 1);
    let mut changes = peers.changes();
    assert_eq!(*changes.next().await.unwrap(), vec![PeerId::from("p2")]);

    room.leave();

    assert_eq!(timeout(someone_new).await, Some(Err(Dropped)));
    assert_eq!(timeout(changes.next()).await, Some(None));
    assert!(peers.get().is_empty());
    assert_eq!(room.status(), ConnectionStatus::BeforeConnection);
    assert_eq!(client.calls().last(), Some(&Call::Leave));
    assert_eq!(
        room.join(json!({})).unwrap_err().as_ref(),
        &RoomError::Closed,
    );
}
