//! End-to-end argument resolution through `#[stream_handler]`.

use std::collections::HashMap;
use std::sync::Arc;

use kstreams_framework::{
    Binding, BuildError, ConsumerRecord, ExtractError, FromHeader, Header, HeaderValue, Headers,
    Param, SolvedHandler,
};
use kstreams_macros::stream_handler;

#[stream_handler]
async fn describe(record: ConsumerRecord, event_type: FromHeader<String>) -> String {
    format!("{}#{}: {}", record.topic, record.offset, event_type.into_inner())
}

#[stream_handler]
async fn aliased(
    #[header(alias = "EventType")] kind: String,
    #[header(convert_underscores = false)] trace_id: Option<Vec<u8>>,
) -> (String, Option<Vec<u8>>) {
    (kind, trace_id)
}

#[stream_handler]
async fn same_header_twice(
    #[header(alias = "k")] first: HeaderValue,
    #[header(alias = "k")] second: HeaderValue,
) -> bool {
    first == second
}

#[stream_handler]
async fn by_alias(#[header(alias = "EventType")] event_type: String) -> String {
    event_type
}

#[stream_handler]
async fn literal(#[header(convert_underscores = false)] event_type: String) -> String {
    event_type
}

#[stream_handler]
async fn private_trace(#[header(convert_underscores = false)] _trace_id: String) -> String {
    _trace_id
}

#[stream_handler]
async fn unmarked(event_type: String) -> String {
    event_type
}

#[tokio::test]
async fn test_default_marker_converts_underscores() {
    let solved = SolvedHandler::build(describe, describe::parameters()).unwrap();

    let record = ConsumerRecord::new("events")
        .with_offset(3)
        .with_header("event-type", "created");

    assert_eq!(solved.execute(record).await.unwrap(), "events#3: created");
}

#[tokio::test]
async fn test_literal_name_does_not_match_hyphenated_header() {
    let solved = SolvedHandler::build(describe, describe::parameters()).unwrap();

    let record = ConsumerRecord::new("events").with_header("event_type", "created");
    let err = solved.execute(record).await.unwrap_err();

    assert_eq!(
        err,
        ExtractError::HeaderNotFound {
            key: "event-type".into()
        }
    );
}

#[tokio::test]
async fn test_alias_and_literal_lookup() {
    let solved = SolvedHandler::build(aliased, aliased::parameters()).unwrap();

    let record = ConsumerRecord::new("events")
        .with_header("EventType", "deleted")
        .with_header("trace_id", b"\x2a".to_vec());
    let (kind, trace) = solved.execute(record).await.unwrap();
    assert_eq!(kind, "deleted");
    assert_eq!(trace, Some(vec![0x2a]));

    let record = ConsumerRecord::new("events").with_header("EventType", "deleted");
    let (_, trace) = solved.execute(record).await.unwrap();
    assert_eq!(trace, None);
}

#[tokio::test]
async fn test_alias_matches_only_aliased_key() {
    let solved = SolvedHandler::build(by_alias, by_alias::parameters()).unwrap();

    for key in ["event_type", "event-type"] {
        let record = ConsumerRecord::new("events").with_header(key, "hello");
        assert_eq!(
            solved.execute(record).await.unwrap_err(),
            ExtractError::HeaderNotFound {
                key: "EventType".into()
            }
        );
    }

    let record = ConsumerRecord::new("events").with_header("EventType", "hello");
    assert_eq!(solved.execute(record).await.unwrap(), "hello");
}

#[tokio::test]
async fn test_disabled_conversion_matches_only_literal_name() {
    let solved = SolvedHandler::build(literal, literal::parameters()).unwrap();

    let record = ConsumerRecord::new("events").with_header("event-type", "hello");
    assert_eq!(
        solved.execute(record).await.unwrap_err(),
        ExtractError::HeaderNotFound {
            key: "event_type".into()
        }
    );

    let record = ConsumerRecord::new("events").with_header("event_type", "hello");
    assert_eq!(solved.execute(record).await.unwrap(), "hello");
}

#[tokio::test]
async fn test_leading_underscore_is_part_of_the_key() {
    let generated = SolvedHandler::build(private_trace, private_trace::parameters()).unwrap();
    let manual = SolvedHandler::build(
        private_trace,
        [Param::new("_trace_id").marker(Header::new().convert_underscores(false))],
    )
    .unwrap();
    assert_eq!(generated.plan().extractors(), manual.plan().extractors());

    let record = ConsumerRecord::new("events").with_header("_trace_id", "abc");
    assert_eq!(generated.execute(record).await.unwrap(), "abc");

    let record = ConsumerRecord::new("events").with_header("trace_id", "abc");
    assert_eq!(
        generated.execute(record).await.unwrap_err(),
        ExtractError::HeaderNotFound {
            key: "_trace_id".into()
        }
    );
}

#[tokio::test]
async fn test_duplicate_header_last_value_wins() {
    let solved = SolvedHandler::build(describe, describe::parameters()).unwrap();

    let record = ConsumerRecord::new("events").with_headers([
        ("event-type", "first"),
        ("event-type", "second"),
    ]);

    assert_eq!(solved.execute(record).await.unwrap(), "events#0: second");
}

#[tokio::test]
async fn test_mapping_headers() {
    let solved = SolvedHandler::build(describe, describe::parameters()).unwrap();

    let mut map = HashMap::new();
    map.insert("event-type".to_string(), HeaderValue::from("mapped"));
    let record = ConsumerRecord::new("events").with_headers(Headers::Map(map));

    assert_eq!(solved.execute(record).await.unwrap(), "events#0: mapped");
}

#[tokio::test]
async fn test_shared_extraction_feeds_both_parameters() {
    let solved = SolvedHandler::build(same_header_twice, same_header_twice::parameters()).unwrap();
    assert_eq!(solved.plan().extractors().len(), 1);

    let record = ConsumerRecord::new("events").with_header("k", "v");
    assert!(solved.execute(record).await.unwrap());
}

#[test]
fn test_unmarked_parameter_fails_at_build_time() {
    let err = SolvedHandler::build(unmarked, unmarked::parameters()).unwrap_err();
    assert!(matches!(err, BuildError::Unsatisfiable { ref name, .. } if name == "event_type"));
}

#[test]
fn test_plan_inspection() {
    let solved = SolvedHandler::build(describe, describe::parameters()).unwrap();
    let plan = solved.plan();

    assert_eq!(plan.binding("record"), Some(&Binding::Record));
    assert!(matches!(
        plan.binding("event_type"),
        Some(Binding::Extractor(extractor)) if extractor.key() == "event-type"
    ));
}

#[tokio::test]
async fn test_records_are_not_retained_between_invocations() {
    let solved = SolvedHandler::build(describe, describe::parameters()).unwrap();

    let first = Arc::new(ConsumerRecord::new("events").with_header("event-type", "a"));
    let second = Arc::new(ConsumerRecord::new("events"));

    solved.execute(Arc::clone(&first)).await.unwrap();
    solved.execute(Arc::clone(&second)).await.unwrap_err();

    assert_eq!(Arc::strong_count(&first), 1);
    assert_eq!(Arc::strong_count(&second), 1);
}
