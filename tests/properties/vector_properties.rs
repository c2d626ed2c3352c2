use proptest::prelude::*;

use trendlens::storage::vector::{cosine_similarity, decode_vector, encode_vector};

proptest! {
    #[test]
    fn test_blob_encoding_is_lossless(vector in prop::collection::vec(-1.0e6f32..1.0e6, 0..64)) {
        prop_assert_eq!(decode_vector(&encode_vector(&vector)), Some(vector));
    }

    #[test]
    fn test_similarity_is_bounded_and_symmetric(
        pair in (1usize..32).prop_flat_map(|dim| (
            prop::collection::vec(-10.0f32..10.0, dim),
            prop::collection::vec(-10.0f32..10.0, dim),
        )),
    ) {
        let (a, b) = pair;
        if let Some(similarity) = cosine_similarity(&a, &b) {
            prop_assert!((-1.0 - 1e-6..=1.0 + 1e-6).contains(&similarity));
            let reverse = cosine_similarity(&b, &a).unwrap_or(f64::NAN);
            prop_assert!((similarity - reverse).abs() < 1e-9);
        }
    }
}
