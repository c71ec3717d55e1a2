//! Property-based tests of the topic matching algebra.

use proptest::prelude::*;
use sensorpipe::{DataKind, Topic};
use uuid::Uuid;

fn data_kind() -> impl Strategy<Value = DataKind> {
    prop_oneof![
        Just(DataKind::Bool),
        Just(DataKind::Int),
        Just(DataKind::Float),
        Just(DataKind::Text),
        Just(DataKind::Bytes),
        Just(DataKind::FloatArray),
        Just(DataKind::IntArray),
    ]
}

/// Arbitrary structurally-valid topics: a name is only ever paired with a
/// dtype, and sources come from a small pool so collisions actually occur.
fn topic() -> impl Strategy<Value = Topic> {
    let name = prop_oneof![
        Just(None::<String>),
        prop_oneof![Just("random"), Just("audio"), Just("imu")].prop_map(|n| Some(n.to_string())),
    ];
    let source = prop_oneof![
        Just(None::<Uuid>),
        (0u128..4).prop_map(|n| Some(Uuid::from_u128(n))),
    ];
    (name, proptest::option::of(data_kind()), source).prop_map(|(name, dtype, source)| {
        match (name, dtype) {
            (Some(name), Some(dtype)) => {
                let mut topic = Topic::named(name, dtype);
                topic.source = source;
                topic
            }
            (_, dtype) => Topic {
                name: None,
                dtype,
                source,
            },
        }
    })
}

proptest! {
    #[test]
    fn match_is_reflexive(t in topic()) {
        prop_assert!(t.matches(&t));
    }

    #[test]
    fn match_is_symmetric(a in topic(), b in topic()) {
        prop_assert_eq!(a.matches(&b), b.matches(&a));
    }

    #[test]
    fn any_topic_matches_everything(t in topic()) {
        let any = Topic::any();
        prop_assert!(any.matches(&t));
        prop_assert!(t.matches(&any));
    }

    #[test]
    fn fully_specified_topics_match_only_equals(
        a in (prop_oneof![Just("x"), Just("y")], data_kind(), 0u128..3),
        b in (prop_oneof![Just("x"), Just("y")], data_kind(), 0u128..3),
    ) {
        let build = |(name, dtype, source): (&str, DataKind, u128)| {
            Topic::named(name, dtype).with_source(Uuid::from_u128(source))
        };
        let ta = build(a);
        let tb = build(b);
        prop_assert_eq!(ta.matches(&tb), ta == tb);
    }

    #[test]
    fn dropping_fields_never_breaks_a_match(t in topic()) {
        let mut relaxed = t.clone();
        relaxed.name = None;
        prop_assert!(relaxed.matches(&t));
        relaxed.dtype = None;
        prop_assert!(relaxed.matches(&t));
        relaxed.source = None;
        prop_assert!(relaxed.matches(&t));
    }
}
