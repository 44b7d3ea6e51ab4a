//! Property tests for hub history ordering.

use logstream::{HubConfig, LogHub};
use proptest::prelude::*;

proptest! {
    #[test]
    fn history_is_the_most_recent_suffix(
        capacity in 1usize..64,
        writes in 0usize..300,
        requested in 0usize..80,
    ) {
        let hub = LogHub::with_config(HubConfig::default().with_capacity(capacity));
        let written: Vec<String> = (0..writes).map(|i| format!("line-{i}")).collect();
        for line in &written {
            hub.write(line);
        }

        let stored = writes.min(capacity);
        prop_assert_eq!(hub.count(), stored);

        let expected_len = if requested == 0 || requested > stored { stored } else { requested };
        let expected = &written[writes - expected_len..];
        let actual: Vec<String> = hub.history(requested).iter().map(ToString::to_string).collect();
        prop_assert_eq!(actual.as_slice(), expected);
    }
}
