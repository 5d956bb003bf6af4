//! Property tests for the local filter engine and household grouping.

use proptest::prelude::*;

use client::filter::{self, FilterCriteria};
use shared::types::{Gender, VoterRecord};

fn gender() -> impl Strategy<Value = Gender> {
    prop_oneof![Just(Gender::Male), Just(Gender::Female), Just(Gender::Other)]
}

fn voter() -> impl Strategy<Value = VoterRecord> {
    (
        "[a-z]{1,8}( [a-z]{1,8})?",
        0u32..110,
        gender(),
        prop_oneof![Just(String::new()), Just("  ".to_string()), "[A-C]-[0-9]{1,3}"],
        prop_oneof![Just("Pune"), Just("pune"), Just("Nashik"), Just("")],
        prop::option::of(1u32..20),
        prop::option::of("[0-9]{10}"),
        any::<bool>(),
    )
        .prop_map(|(name, age, gender, house_no, city, booth_no, mobile, is_print)| VoterRecord {
            id: name.clone(),
            voter_id_number: format!("EPIC-{}", age),
            name,
            age,
            gender,
            house_no,
            related_to: format!("Guardian {}", age % 3),
            city: city.to_string(),
            booth_no,
            booth_address: "Ward Office".to_string(),
            mobile,
            is_print,
        })
}

fn criteria() -> impl Strategy<Value = FilterCriteria> {
    let fields = (
        prop::option::of("[a-z]{1,2}"),
        prop::option::of(0u32..110),
        prop::option::of(0u32..110),
        prop::option::of(gender()),
        prop::option::of(1u32..20),
        prop::option::of(prop_oneof![Just("PUNE".to_string()), Just("Nashik".to_string())]),
        any::<bool>(),
        any::<bool>(),
    );
    let substrings = (
        prop::option::of(prop_oneof![Just("a-".to_string()), Just("B".to_string()), "[0-9]"]),
        prop::option::of(prop_oneof![Just("GUARD".to_string()), Just("dian 1".to_string())]),
        prop::option::of(prop_oneof![Just("pune".to_string()), "[a-z]{1,2}", "[0-9]{1,2}"]),
    );
    (fields, substrings).prop_map(
        |(
            (name, min_age, max_age, gender, booth_no, city, mobile_required, print_enabled_required),
            (house_no, related_to, search),
        )| FilterCriteria {
            name,
            min_age,
            max_age,
            gender,
            booth_no,
            city,
            house_no,
            related_to,
            mobile_required,
            print_enabled_required,
            search,
        },
    )
}

/// One criterion at a time, so the conjunction can be checked piecewise.
fn singles(c: &FilterCriteria) -> Vec<FilterCriteria> {
    let mut out = Vec::new();
    if c.name.is_some() {
        out.push(FilterCriteria { name: c.name.clone(), ..Default::default() });
    }
    if c.min_age.is_some() {
        out.push(FilterCriteria { min_age: c.min_age, ..Default::default() });
    }
    if c.max_age.is_some() {
        out.push(FilterCriteria { max_age: c.max_age, ..Default::default() });
    }
    if c.gender.is_some() {
        out.push(FilterCriteria { gender: c.gender, ..Default::default() });
    }
    if c.booth_no.is_some() {
        out.push(FilterCriteria { booth_no: c.booth_no, ..Default::default() });
    }
    if c.city.is_some() {
        out.push(FilterCriteria { city: c.city.clone(), ..Default::default() });
    }
    if c.house_no.is_some() {
        out.push(FilterCriteria { house_no: c.house_no.clone(), ..Default::default() });
    }
    if c.related_to.is_some() {
        out.push(FilterCriteria { related_to: c.related_to.clone(), ..Default::default() });
    }
    if c.search.is_some() {
        out.push(FilterCriteria { search: c.search.clone(), ..Default::default() });
    }
    if c.mobile_required {
        out.push(FilterCriteria { mobile_required: true, ..Default::default() });
    }
    if c.print_enabled_required {
        out.push(FilterCriteria { print_enabled_required: true, ..Default::default() });
    }
    out
}

proptest! {
    /// A record passes iff it passes every specified criterion on its own.
    #[test]
    fn prop_filter_is_a_conjunction(
        records in prop::collection::vec(voter(), 0..30),
        criteria in criteria(),
    ) {
        let parts = singles(&criteria);
        for record in &records {
            let expected = parts.iter().all(|single| single.matches(record));
            prop_assert_eq!(criteria.matches(record), expected);
        }
    }

    /// Filtering keeps input order and never invents records.
    #[test]
    fn prop_apply_is_an_ordered_subsequence(
        records in prop::collection::vec(voter(), 0..30),
        criteria in criteria(),
    ) {
        let kept = filter::apply(&records, &criteria);
        let mut cursor = records.iter();
        for record in kept {
            prop_assert!(cursor.any(|r| std::ptr::eq(r, record)));
        }
    }

    /// Empty criteria pass everything.
    #[test]
    fn prop_empty_criteria_pass_all(records in prop::collection::vec(voter(), 0..30)) {
        prop_assert_eq!(filter::apply(&records, &FilterCriteria::default()).len(), records.len());
    }

    /// Every record lands in exactly one group, keyed by its trimmed house
    /// number, in input order.
    #[test]
    fn prop_grouping_is_total_and_stable(records in prop::collection::vec(voter(), 0..40)) {
        let groups = filter::group_by_house_number(&records);

        let total: usize = groups.values().map(Vec::len).sum();
        prop_assert_eq!(total, records.len());

        for (key, members) in &groups {
            let expected: Vec<&VoterRecord> = records
                .iter()
                .filter(|r| r.household_key() == key.as_str())
                .collect();
            prop_assert_eq!(members.len(), expected.len());
            for (a, b) in members.iter().zip(expected) {
                prop_assert!(std::ptr::eq(*a, b));
            }
        }
    }

    /// Free-text search finds a record by its name in any case.
    #[test]
    fn prop_search_finds_by_name(records in prop::collection::vec(voter(), 1..10)) {
        let target = &records[0];
        let criteria = FilterCriteria {
            search: Some(target.name.to_uppercase()),
            ..Default::default()
        };
        prop_assert!(criteria.matches(target));
    }
}
