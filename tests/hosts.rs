use csv_inventory::hosts::expand_hostname_range;
use proptest::prelude::*;

proptest! {
    #[test]
    fn numeric_ranges_produce_one_host_per_step(
        prefix in "[a-z]{1,8}",
        suffix in "(\\.[a-z]{2,5})?",
        low in 0u64..500,
        span in 0u64..50,
    ) {
        let high = low + span;
        let pattern = format!("{prefix}[{low}:{high}]{suffix}");
        let hosts = expand_hostname_range(&pattern).expect("valid range");
        prop_assert_eq!(hosts.len() as u64, span + 1);
        for (offset, host) in hosts.iter().enumerate() {
            prop_assert_eq!(host, &format!("{prefix}{}{suffix}", low + offset as u64));
        }
    }

    #[test]
    fn padded_ranges_keep_width_and_order(
        width in 2usize..5,
        low in 0u64..10,
        span in 0u64..90,
    ) {
        let high = low + span;
        let pattern = format!("sw[{low:0width$}:{high:0width$}]");
        let hosts = expand_hostname_range(&pattern).expect("valid padded range");
        prop_assert_eq!(hosts.len() as u64, span + 1);
        prop_assert!(hosts.iter().all(|h| h.len() == 2 + width));
        let mut sorted = hosts.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(sorted, hosts);
    }

    #[test]
    fn names_without_brackets_are_untouched(name in "[A-Za-z0-9_.:-]{1,24}") {
        prop_assert_eq!(expand_hostname_range(&name).expect("plain"), vec![name.clone()]);
    }
}

#[test]
fn reversed_bounds_are_rejected() {
    assert!(expand_hostname_range("r[9:1]").is_err());
}
