//! Property tests for the obstacle-record wire format.

use proptest::prelude::*;

use nav_core::geometry::Direction;
use nav_core::wire::{encode_obstacle_record, parse_obstacle_batch};

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::North),
        Just(Direction::East),
        Just(Direction::South),
        Just(Direction::West),
    ]
}

proptest! {
    /// `parse(encode(record))` recovers the record exactly.
    #[test]
    fn record_roundtrip(
        cell_x in 0i32..20,
        cell_y in 0i32..20,
        facing in arb_direction(),
        id in 0u32..1000,
    ) {
        let body = format!("{cell_x},{cell_y},{facing},{id};");
        let parsed = parse_obstacle_batch(&body).unwrap();
        prop_assert_eq!(parsed.len(), 1);

        let obstacle = &parsed[0];
        prop_assert_eq!(obstacle.position().x, cell_x * 10);
        prop_assert_eq!(obstacle.position().y, cell_y * 10);
        prop_assert_eq!(obstacle.facing(), facing);
        prop_assert_eq!(obstacle.index(), id);

        // And encoding the parsed obstacle reproduces the record.
        prop_assert_eq!(format!("{};", encode_obstacle_record(obstacle)), body);
    }

    /// A batch of records parses to the same number of obstacles in order.
    #[test]
    fn batch_preserves_order(
        ids in proptest::collection::vec(0u32..1000, 1..8),
    ) {
        let mut body = String::new();
        for (i, id) in ids.iter().enumerate() {
            body.push_str(&format!("{},{},N,{id};", i, i));
        }
        let parsed = parse_obstacle_batch(&body).unwrap();
        prop_assert_eq!(parsed.len(), ids.len());
        for (obstacle, id) in parsed.iter().zip(&ids) {
            prop_assert_eq!(obstacle.index(), *id);
        }
    }
}
