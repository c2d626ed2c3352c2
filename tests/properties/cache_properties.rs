use std::time::Duration;

use proptest::prelude::*;

use trendlens::cache::TtlCache;

#[derive(Debug, Clone)]
enum Op {
    Set(u8),
    Get(u8),
    Has(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..32).prop_map(Op::Set),
        (0u8..32).prop_map(Op::Get),
        (0u8..32).prop_map(Op::Has),
    ]
}

proptest! {
    #[test]
    fn test_size_never_exceeds_capacity(
        capacity in 0usize..16,
        ops in prop::collection::vec(op_strategy(), 0..200),
    ) {
        let cache = TtlCache::new(capacity, Duration::from_secs(3600));
        for op in ops {
            match op {
                Op::Set(key) => cache.set(key.to_string(), u32::from(key)),
                Op::Get(key) => {
                    if let Some(value) = cache.get(&key.to_string()) {
                        prop_assert_eq!(value, u32::from(key));
                    }
                }
                Op::Has(key) => {
                    let _ = cache.has(&key.to_string());
                }
            }
            prop_assert!(cache.size() <= capacity.max(1));
        }
    }

    #[test]
    fn test_last_set_is_readable(keys in prop::collection::vec(0u8..64, 1..50), capacity in 1usize..8) {
        let cache = TtlCache::new(capacity, Duration::from_secs(3600));
        for key in &keys {
            cache.set(key.to_string(), *key);
        }
        let last = keys[keys.len() - 1];
        prop_assert_eq!(cache.get(&last.to_string()), Some(last));
    }
}
