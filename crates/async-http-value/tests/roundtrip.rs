//! Property 5 (round-trip) and property 6 (external storage transparency)
//! from the testable-properties list, exercised with `proptest` instead of
//! a fixed example grid.

use async_http_value::{
    body_ref, externalize_body, inline_body, CallbackArgs, HttpHeaders, Method, ResultKind,
    TerminalValue,
};
use async_http_value::response::Response;
use proptest::prelude::*;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

fn arb_callback_args() -> impl Strategy<Value = CallbackArgs> {
    proptest::collection::vec(("[a-z]{1,8}", any::<i64>()), 0..6)
        .prop_map(|pairs| CallbackArgs::from_pairs(pairs))
}

fn arb_response(args: CallbackArgs) -> impl Strategy<Value = Response> {
    (100u16..=599, proptest::option::of(proptest::collection::vec(any::<u8>(), 0..64)))
        .prop_map(move |(status, body)| {
            Response::new(
                status,
                HttpHeaders::new(),
                body,
                "HTTP/1.1",
                Duration::from_millis(7),
                Uuid::new_v4(),
                Url::parse("https://example.com/round-trip").unwrap(),
                Method::Get,
                args.clone(),
                vec![],
            )
            .unwrap()
        })
}

proptest! {
    #[test]
    fn response_round_trips_including_callback_args(args in arb_callback_args()) {
        let response_strategy = arb_response(args);
        // `prop_flat_map` needs a Strategy value, so sample directly here.
        let mut runner = proptest::test_runner::TestRunner::default();
        let response = response_strategy.new_tree(&mut runner).unwrap().current();

        let value = TerminalValue::Response(response.clone());
        let hash = value.as_hash();
        let loaded = TerminalValue::load(ResultKind::Response, hash).unwrap();
        prop_assert_eq!(loaded, TerminalValue::Response(response));
    }

    #[test]
    fn external_storage_round_trip_is_transparent(
        args in arb_callback_args(),
        store_name in "[a-z]{1,10}",
        key in "[a-z0-9-]{4,20}",
    ) {
        let response_strategy = arb_response(args);
        let mut runner = proptest::test_runner::TestRunner::default();
        let response = response_strategy.new_tree(&mut runner).unwrap().current();

        let value = TerminalValue::Response(response.clone());
        let mut hash = value.as_hash();

        if let Some(extracted) = externalize_body(&mut hash, &store_name, &key) {
            let reference = body_ref(&hash).unwrap();
            prop_assert_eq!(&reference.store, &store_name);
            prop_assert_eq!(&reference.key, &key);

            inline_body(&mut hash, extracted);
        }

        let loaded = TerminalValue::load(ResultKind::Response, hash).unwrap();
        prop_assert_eq!(loaded, TerminalValue::Response(response));
    }
}
