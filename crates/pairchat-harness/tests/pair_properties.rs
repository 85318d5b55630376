//! Property-based tests over two sessions.
//!
//! Random interleavings of user intents and link deliveries (including
//! dropped deliveries and an unreliable rendezvous) must keep both sessions
//! consistent and never duplicate or reorder messages.

use pairchat_core::{Notification, Origin, SessionEvent};
use pairchat_harness::{InvariantRegistry, Pair, Side};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Create(Side),
    /// Join the other side's room if it has one, else a code nobody hosts.
    JoinOther(Side),
    Send(Side, String),
    Leave(Side),
    Deliver,
    DropDelivery,
    Rendezvous(bool),
}

fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::A), Just(Side::B)]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => side_strategy().prop_map(Op::Create),
        2 => side_strategy().prop_map(Op::JoinOther),
        4 => (side_strategy(), "[a-z]{1,6}").prop_map(|(side, text)| Op::Send(side, text)),
        1 => side_strategy().prop_map(Op::Leave),
        6 => Just(Op::Deliver),
        1 => Just(Op::DropDelivery),
        1 => any::<bool>().prop_map(Op::Rendezvous),
    ]
}

fn apply(pair: &mut Pair, op: &Op) {
    match op {
        Op::Create(side) => pair.apply(*side, SessionEvent::CreateRoom),
        Op::JoinOther(side) => {
            let code = pair
                .session(side.other())
                .room_code()
                .map_or_else(|| "ZZZZZZ".to_string(), ToString::to_string);
            pair.apply(*side, SessionEvent::JoinRoom { code });
        },
        Op::Send(side, text) => pair.apply(*side, SessionEvent::SendMessage { text: text.clone() }),
        Op::Leave(side) => pair.apply(*side, SessionEvent::LeaveRoom),
        Op::Deliver => {
            pair.deliver_next();
        },
        Op::DropDelivery => {
            pair.drop_next();
        },
        Op::Rendezvous(available) => pair.set_rendezvous_available(*available),
    }
}

/// Texts of every message `side` appended with `origin`, across sessions.
fn appended(pair: &Pair, side: Side, origin: Origin) -> Vec<String> {
    pair.notifications(side)
        .iter()
        .filter_map(|n| match n {
            Notification::MessageAppended(m) if m.origin == origin => Some(m.text.clone()),
            _ => None,
        })
        .collect()
}

fn is_subsequence(needle: &[String], haystack: &[String]) -> bool {
    let mut rest = haystack.iter();
    needle.iter().all(|item| rest.any(|candidate| candidate == item))
}

proptest! {
    #[test]
    fn prop_pair_invariants_hold(
        seed in any::<u64>(),
        ops in prop::collection::vec(op_strategy(), 0..80),
    ) {
        let mut pair = Pair::new(seed);
        let invariants = InvariantRegistry::standard();

        for op in &ops {
            apply(&mut pair, op);
            prop_assert!(
                invariants.check_all(&pair.snapshot()).is_ok(),
                "after {:?}: {:?}",
                op,
                invariants.check_all(&pair.snapshot())
            );
        }
    }

    #[test]
    fn prop_messages_never_duplicated_or_reordered(
        seed in any::<u64>(),
        ops in prop::collection::vec(op_strategy(), 0..80),
    ) {
        let mut pair = Pair::new(seed);
        for op in &ops {
            apply(&mut pair, op);
        }
        pair.settle();

        for side in [Side::A, Side::B] {
            let received = appended(&pair, side, Origin::Peer);
            let sent = appended(&pair, side.other(), Origin::Own);
            prop_assert!(
                is_subsequence(&received, &sent),
                "{:?} received {:?}, peer sent {:?}",
                side,
                received,
                sent
            );
        }
    }

    #[test]
    fn prop_leaving_both_sides_cleans_up(
        seed in any::<u64>(),
        ops in prop::collection::vec(op_strategy(), 0..60),
    ) {
        let mut pair = Pair::new(seed);
        for op in &ops {
            apply(&mut pair, op);
        }

        pair.act(Side::A, SessionEvent::LeaveRoom);
        pair.act(Side::B, SessionEvent::LeaveRoom);

        prop_assert!(pair.directory().is_empty());
        prop_assert_eq!(pair.in_flight(), 0);
        for side in [Side::A, Side::B] {
            prop_assert!(pair.session(side).log().is_empty());
            prop_assert!(pair.session(side).room_code().is_none());
        }
    }
}
