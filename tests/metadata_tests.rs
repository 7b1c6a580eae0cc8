use pretty_assertions::assert_eq;
use proptest::prelude::*;
use test_case::test_case;

use cim_mediator::metadata::RESERVED_KEYWORDS;
use cim_mediator::{DispatchError, MetadataDictionary, MetadataExt, MetadataFactory, MetadataValue};

#[derive(Debug, Default)]
struct Envelope {
    metadata: MetadataDictionary,
}

cim_mediator::impl_metadata!(Envelope);

#[test_case("Timestamp" ; "canonical")]
#[test_case("timestamp" ; "lower case")]
#[test_case("CORRELATIONID" ; "upper case")]
#[test_case("memberType" ; "mixed case")]
#[test_case("AggregateVersion" ; "aggregate version")]
fn public_path_rejects_reserved_keys(key: &str) {
    let envelope = Envelope::default();

    let added = envelope.metadata.add(key, "x").unwrap_err();
    let set = MetadataFactory::set(&envelope, key, "x").unwrap_err();

    assert!(matches!(added, DispatchError::ReservedKeyword { .. }));
    assert!(matches!(set, DispatchError::ReservedKeyword { .. }));
    assert!(envelope.metadata.is_empty());
}

#[test]
fn every_reserved_keyword_is_rejected() {
    let envelope = Envelope::default();
    for key in RESERVED_KEYWORDS {
        assert!(envelope.metadata.add(key, 1i64).unwrap_err().is_metadata_error());
    }
}

#[test]
fn merge_never_overwrites() {
    let destination = Envelope::default();
    let source = Envelope::default();
    destination.metadata.add("k", "old").unwrap();
    source.metadata.add("K", "new").unwrap();
    source.metadata.add("other", 7i64).unwrap();
    source.set_correlation_id("corr");

    MetadataFactory::merge(&destination, &source);

    assert_eq!(
        MetadataFactory::get(&destination, "k"),
        Some(MetadataValue::from("old"))
    );
    assert_eq!(
        MetadataFactory::get(&destination, "OTHER"),
        Some(MetadataValue::Integer(7))
    );
    assert_eq!(destination.correlation_id().as_deref(), Some("corr"));
    assert_eq!(destination.metadata.len(), 3);
}

#[test]
fn extensions_use_canonical_casing() {
    let envelope = Envelope::default();
    envelope.set_correlation_id("c").set_aggregate_version(3);

    assert_eq!(
        envelope.metadata.keys(),
        vec!["CorrelationId".to_string(), "AggregateVersion".to_string()]
    );
    assert_eq!(envelope.aggregate_version(), Some(3));
}

#[test]
fn dictionary_serializes_as_a_map() {
    let metadata = MetadataDictionary::new();
    metadata.add("tenant", "acme").unwrap();

    let json = serde_json::to_value(&metadata).unwrap();

    assert_eq!(json["tenant"]["type"], "String");
    assert_eq!(json["tenant"]["value"], "acme");
}

fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_]{0,15}"
        .prop_filter("reserved", |k| !cim_mediator::metadata::is_reserved_keyword(k))
}

proptest! {
    #[test]
    fn keys_differing_only_by_case_are_one_entry(key in key_strategy(), value in any::<i64>()) {
        let metadata = MetadataDictionary::new();
        metadata.add(key.clone(), value).unwrap();

        prop_assert!(metadata.contains_key(&key.to_uppercase()));
        prop_assert!(metadata.contains_key(&key.to_lowercase()));
        prop_assert_eq!(metadata.get(&key.to_uppercase()), Some(MetadataValue::Integer(value)));
        let duplicate = metadata.add(key.to_uppercase(), 0i64);
        prop_assert!(
            matches!(duplicate, Err(DispatchError::DuplicateKey { .. })),
            "expected a duplicate key error"
        );
        prop_assert_eq!(metadata.len(), 1);
    }

    #[test]
    fn set_then_remove_round_trips(
        key in key_strategy(),
        first in any::<i64>(),
        second in any::<i64>(),
    ) {
        let metadata = MetadataDictionary::new();
        prop_assert_eq!(metadata.set(key.clone(), first).unwrap(), None);
        prop_assert_eq!(
            metadata.set(key.to_lowercase(), second).unwrap(),
            Some(MetadataValue::Integer(first))
        );
        prop_assert_eq!(metadata.remove(&key.to_uppercase()), Some(MetadataValue::Integer(second)));
        prop_assert!(metadata.is_empty());
    }
}
