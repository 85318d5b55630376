//! Two-session scenarios over the deterministic [`Pair`] fixture.
//!
//! Each test checks the standard invariants after every step it takes.

use std::collections::HashMap;

use pairchat_core::{
    ConnectionStatus, EndpointAddress, Environment, ErrorKind, Notification, Origin, Role,
    RoomCode, RoomDirectory, Screen, SessionEvent, SessionState,
};
use pairchat_harness::{InvariantRegistry, Pair, SimEnv, Side};
use pairchat_proto::{ROOM_CODE_ALPHABET, normalize_code};

fn step(pair: &mut Pair, side: Side, event: SessionEvent) {
    let context = format!("after {event:?} on {side:?}");
    pair.act(side, event);
    InvariantRegistry::standard().assert_all(&pair.snapshot(), &context);
}

fn errors(pair: &Pair, side: Side) -> Vec<ErrorKind> {
    pair.notifications(side)
        .iter()
        .filter_map(|n| match n {
            Notification::ErrorRaised(err) => Some(err.kind()),
            _ => None,
        })
        .collect()
}

fn texts(pair: &Pair, side: Side) -> Vec<(Origin, String)> {
    pair.session(side).log().iter().map(|m| (m.origin, m.text.clone())).collect()
}

/// Host A with code AB12XY, guest B joined and connected.
fn connected_pair() -> Pair {
    let mut pair = Pair::new(42);
    // A=0 B=1 '1'=27 '2'=28 X=23 Y=24
    pair.env().script_bytes(&[0, 1, 27, 28, 23, 24]);

    step(&mut pair, Side::A, SessionEvent::CreateRoom);
    step(&mut pair, Side::B, SessionEvent::JoinRoom { code: normalize_code("ab12xy") });
    pair
}

#[test]
fn generated_codes_are_uniform_per_position() {
    let env = SimEnv::with_seed(9);
    let samples = 36 * 200;
    let mut counts: Vec<HashMap<char, usize>> = vec![HashMap::new(); 6];

    for _ in 0..samples {
        let code = RoomCode::generate(|| env.random_u8());
        for (position, c) in code.as_str().chars().enumerate() {
            *counts[position].entry(c).or_default() += 1;
        }
    }

    // Expected 200 per symbol; the bounds are several standard deviations wide.
    for position in &counts {
        assert_eq!(position.len(), ROOM_CODE_ALPHABET.len());
        for (symbol, count) in position {
            assert!((100..=300).contains(count), "{symbol} drawn {count} times");
        }
    }
}

#[test]
fn invalid_join_touches_nothing() {
    let mut pair = Pair::new(1);

    for input in ["", "ABC", "ab12xy", "AB12XY7", "AB-2XY", "ÄB12XY"] {
        step(&mut pair, Side::B, SessionEvent::JoinRoom { code: input.to_string() });
    }

    assert_eq!(errors(&pair, Side::B), vec![ErrorKind::InvalidCode; 6]);
    assert_eq!(pair.rendezvous_calls(Side::B), 0);
    assert!(pair.directory().is_empty());
    assert_eq!(pair.session(Side::B).state(), SessionState::idle());
}

#[test]
fn create_registers_and_leave_unregisters() {
    let mut pair = Pair::new(3);
    step(&mut pair, Side::A, SessionEvent::CreateRoom);

    let code = pair.session(Side::A).room_code().cloned().unwrap();
    let endpoint = pair.session(Side::A).state().endpoint.unwrap();
    assert_eq!(pair.directory().lookup(&code).map(|r| r.endpoint), Some(endpoint));
    assert_eq!(pair.session(Side::A).screen(), Screen::RoomCreated);

    step(&mut pair, Side::A, SessionEvent::LeaveRoom);

    assert!(pair.directory().lookup(&code).is_none());
}

#[test]
fn leave_when_idle_changes_nothing() {
    let mut pair = Pair::new(4);
    step(&mut pair, Side::A, SessionEvent::LeaveRoom);

    assert!(pair.notifications(Side::A).is_empty());
    assert_eq!(pair.rendezvous_calls(Side::A), 0);
    assert_eq!(pair.session(Side::A).state(), SessionState::idle());
}

#[test]
fn messages_arrive_once_and_in_order() {
    let mut pair = connected_pair();

    step(&mut pair, Side::B, SessionEvent::SendMessage { text: "hello".into() });
    step(&mut pair, Side::A, SessionEvent::SendMessage { text: "hi back".into() });
    step(&mut pair, Side::B, SessionEvent::SendMessage { text: "second".into() });

    let system = (Origin::System, "peer connected".to_string());
    assert_eq!(texts(&pair, Side::B), vec![
        system.clone(),
        (Origin::Own, "hello".into()),
        (Origin::Peer, "hi back".into()),
        (Origin::Own, "second".into()),
    ]);
    assert_eq!(texts(&pair, Side::A), vec![
        system,
        (Origin::Peer, "hello".into()),
        (Origin::Own, "hi back".into()),
        (Origin::Peer, "second".into()),
    ]);
}

#[test]
fn peer_message_keeps_sender_timestamp() {
    let mut pair = connected_pair();
    step(&mut pair, Side::B, SessionEvent::SendMessage { text: "hello".into() });

    let sent = pair.session(Side::B).log().last().unwrap().sent_at;
    let received = pair.session(Side::A).log().last().unwrap().sent_at;
    assert_eq!(sent, received);
}

#[test]
fn happy_path_connects_both_sides() {
    let pair = connected_pair();

    assert_eq!(pair.session(Side::A).room_code().map(RoomCode::as_str), Some("AB12XY"));
    assert_eq!(pair.session(Side::B).room_code().map(RoomCode::as_str), Some("AB12XY"));

    for side in [Side::A, Side::B] {
        let session = pair.session(side);
        assert_eq!(session.connection_status(), ConnectionStatus::Connected, "{side:?}");
        assert_eq!(session.screen(), Screen::Chat, "{side:?}");
        assert_eq!(texts(&pair, side), vec![(Origin::System, "peer connected".to_string())]);
    }

    // Both sides are told the code: the host to share it, the guest to show it.
    let ready = Notification::RoomCodeReady(RoomCode::parse("AB12XY").unwrap());
    assert!(pair.notifications(Side::A).contains(&ready));
    assert!(pair.notifications(Side::B).contains(&ready));
}

#[test]
fn guest_sees_chat_screen_before_link_opens() {
    let mut pair = Pair::new(5);
    step(&mut pair, Side::A, SessionEvent::CreateRoom);
    let code = pair.session(Side::A).room_code().unwrap().to_string();

    pair.apply(Side::B, SessionEvent::JoinRoom { code });

    let guest = pair.session(Side::B);
    assert_eq!(guest.screen(), Screen::Chat);
    assert_eq!(guest.connection_status(), ConnectionStatus::Connecting);
    assert!(guest.log().is_empty());
}

#[test]
fn unknown_room_is_not_found() {
    let mut pair = Pair::new(6);
    step(&mut pair, Side::B, SessionEvent::JoinRoom { code: "ZZZZZZ".into() });

    assert_eq!(errors(&pair, Side::B), vec![ErrorKind::RoomNotFound]);
    assert_eq!(pair.session(Side::B).state(), SessionState::idle());
}

#[test]
fn peer_leaving_disconnects_without_reset() {
    let mut pair = connected_pair();
    step(&mut pair, Side::B, SessionEvent::LeaveRoom);

    let host = pair.session(Side::A);
    assert_eq!(host.connection_status(), ConnectionStatus::Disconnected);
    assert_eq!(host.state().role, Role::Host);
    assert_eq!(host.room_code().map(RoomCode::as_str), Some("AB12XY"));
    assert_eq!(host.log().last().map(|m| (m.origin, m.text.as_str())), Some((
        Origin::System,
        "peer disconnected"
    )));
}

#[test]
fn send_after_disconnect_is_refused() {
    let mut pair = connected_pair();
    step(&mut pair, Side::B, SessionEvent::LeaveRoom);
    let before = pair.session(Side::A).log().len();

    step(&mut pair, Side::A, SessionEvent::SendMessage { text: "x".into() });

    assert_eq!(errors(&pair, Side::A), vec![ErrorKind::NotConnected]);
    assert_eq!(pair.session(Side::A).log().len(), before);
}

#[test]
fn host_accepts_a_new_guest_after_disconnect() {
    let mut pair = connected_pair();
    step(&mut pair, Side::B, SessionEvent::LeaveRoom);
    step(&mut pair, Side::B, SessionEvent::JoinRoom { code: "AB12XY".into() });

    assert_eq!(pair.session(Side::A).connection_status(), ConnectionStatus::Connected);
    assert_eq!(pair.session(Side::B).connection_status(), ConnectionStatus::Connected);
}

#[test]
fn host_leaving_reaches_guest() {
    let mut pair = connected_pair();
    step(&mut pair, Side::A, SessionEvent::LeaveRoom);

    let guest = pair.session(Side::B);
    assert_eq!(guest.connection_status(), ConnectionStatus::Disconnected);
    assert_eq!(guest.state().role, Role::Guest);
    assert!(pair.directory().is_empty());
}

#[test]
fn join_to_vanished_host_surfaces_connection_error() {
    let mut pair = Pair::new(7);
    let mut directory = pair.directory().clone();
    let code = RoomCode::parse("GHOST1").unwrap();
    directory.register(pairchat_core::RoomRecord {
        code: code.clone(),
        endpoint: EndpointAddress::new("peer-404"),
        created_at: pair.env().now(),
    });

    step(&mut pair, Side::B, SessionEvent::JoinRoom { code: code.to_string() });

    assert_eq!(errors(&pair, Side::B), vec![ErrorKind::ConnectionError]);
    let guest = pair.session(Side::B).state();
    assert_eq!(guest.role, Role::Guest);
    assert_eq!(guest.connection_status, ConnectionStatus::Disconnected);
    assert!(guest.link.is_none());
}

#[test]
fn offline_rendezvous_aborts_create() {
    let mut pair = Pair::new(8);
    pair.set_rendezvous_available(false);
    step(&mut pair, Side::A, SessionEvent::CreateRoom);

    assert_eq!(errors(&pair, Side::A), vec![ErrorKind::RendezvousUnavailable]);
    assert_eq!(pair.session(Side::A).state(), SessionState::idle());
    assert!(pair.directory().is_empty());
}

#[test]
fn leave_before_link_opens_drops_late_events() {
    let mut pair = Pair::new(10);
    step(&mut pair, Side::A, SessionEvent::CreateRoom);
    let code = pair.session(Side::A).room_code().unwrap().to_string();

    pair.apply(Side::B, SessionEvent::JoinRoom { code });
    pair.apply(Side::B, SessionEvent::LeaveRoom);
    pair.settle();
    InvariantRegistry::standard().assert_all(&pair.snapshot(), "after late delivery");

    assert_eq!(pair.session(Side::B).state(), SessionState::idle());
    assert!(pair.session(Side::B).log().is_empty());
    assert_eq!(pair.session(Side::A).state().role, Role::Host);
}

#[test]
fn unknown_frame_kind_from_peer_is_ignored() {
    let mut pair = connected_pair();
    let link = pair.session(Side::A).state().link.unwrap().id;
    let before = pair.session(Side::A).log().len();

    step(&mut pair, Side::A, SessionEvent::Link {
        link,
        event: pairchat_core::LinkEvent::Data(br#"{"kind":"typing","who":"b"}"#.to_vec()),
    });

    assert_eq!(pair.session(Side::A).log().len(), before);
    assert!(errors(&pair, Side::A).is_empty());
}
