//! Property-based tests for content keys.

use proptest::prelude::*;

use super::key::ContentKey;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Equal bytes always produce equal keys.
    #[test]
    fn prop_key_is_deterministic(data in prop::collection::vec(any::<u8>(), 0..4096)) {
        let copy = data.clone();
        prop_assert_eq!(ContentKey::for_data(&data), ContentKey::for_data(&copy));
    }

    /// Different bytes produce different keys.
    #[test]
    fn prop_distinct_data_distinct_keys(
        a in prop::collection::vec(any::<u8>(), 0..512),
        b in prop::collection::vec(any::<u8>(), 0..512),
    ) {
        prop_assume!(a != b);
        prop_assert_ne!(ContentKey::for_data(&a), ContentKey::for_data(&b));
    }

    /// Keys are "sha1-" plus 28 characters of padded base64.
    #[test]
    fn prop_key_format(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let key = ContentKey::for_data(&data);
        let encoded = key.as_str().strip_prefix(ContentKey::SHA1_PREFIX);
        prop_assert!(encoded.is_some());
        prop_assert_eq!(encoded.map(str::len), Some(28));
    }
}
