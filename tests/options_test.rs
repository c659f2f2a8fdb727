//! Integration tests for option validation and how options shape the outbound request

mod common;

use common::{Script, ScriptedTransport, config, text_frame};
use futures::StreamExt;
use glm_chat::{
    CancellationToken, ChatOption, Client, ContentSize, Error, SearchRecency, ToolDeclaration,
    WebSearchOption, build_request, function,
};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

#[test]
fn test_search_count_bounds() {
    assert_err!(WebSearchOption::count(0));
    assert_err!(WebSearchOption::count(101));

    let option = assert_ok!(WebSearchOption::count(50));
    let request = build_request(&config(), "", [ChatOption::web_search([option])]);
    match &request.tools[..] {
        [ToolDeclaration::WebSearch { web_search }] => assert_eq!(web_search.count, 50),
        other => panic!("Expected one web search tool, got {:?}", other),
    }
}

#[test]
fn test_out_of_range_values_never_reach_a_request() {
    // Options are opaque, so the validating constructors are the only way in
    let attempts: Vec<Result<ChatOption, Error>> = vec![
        ChatOption::temperature(5.0),
        ChatOption::max_tokens(0),
        ChatOption::top_p(0.0),
        WebSearchOption::count(0).map(|count| ChatOption::web_search([count])),
    ];
    let mut accepted = Vec::new();
    for attempt in attempts {
        match attempt {
            Ok(option) => accepted.push(option),
            Err(err) => assert!(matches!(err, Error::InvalidOption(_))),
        }
    }
    assert!(accepted.is_empty());

    // A request built from what survived keeps the configured defaults
    let config = config();
    let request = build_request(&config, "Hi", accepted);
    assert_eq!(request.temperature, config.temperature());
    assert_eq!(request.max_tokens, config.max_tokens());
    assert_eq!(request.top_p, config.top_p());
    assert!(request.tools.is_empty());
}

#[test]
fn test_temperature_bounds() {
    for valid in [0.0, 0.7, 1.0, 2.0] {
        assert_ok!(ChatOption::temperature(valid));
    }
    for invalid in [-0.01, 2.01, f64::NAN, f64::INFINITY] {
        let err = assert_err!(ChatOption::temperature(invalid));
        assert!(matches!(err, Error::InvalidOption(_)));
    }
}

#[test]
fn test_other_numeric_bounds() {
    assert_err!(ChatOption::max_tokens(0));
    assert_ok!(ChatOption::max_tokens(1));
    assert_err!(ChatOption::top_p(0.0));
    assert_err!(ChatOption::top_p(1.5));
    assert_ok!(ChatOption::top_p(1.0));
}

#[test]
fn test_enum_options_reject_unknown_names() {
    assert_ok!(WebSearchOption::recency("oneWeek"));
    assert_err!(WebSearchOption::recency("oneYear"));
    assert_ok!(WebSearchOption::content_size("high"));
    let err = assert_err!(WebSearchOption::content_size("huge"));
    assert!(err.to_string().contains("huge"));
}

#[test]
fn test_web_search_wire_shape() {
    let request = build_request(
        &config(),
        "Latest Rust release?",
        [ChatOption::web_search([
            WebSearchOption::from(SearchRecency::OneDay),
            WebSearchOption::domain("github.com"),
            WebSearchOption::intent(true),
            WebSearchOption::from(ContentSize::High),
        ])],
    );

    let body = serde_json::to_value(&request).unwrap();
    assert_eq!(
        body["tools"],
        json!([{
            "type": "web_search",
            "web_search": {
                "search_engine": "search_std",
                "search_recency_filter": "oneDay",
                "count": 10,
                "search_intent": true,
                "search_domain_filter": "github.com",
                "content_size": "high"
            }
        }])
    );
}

#[tokio::test]
async fn test_options_reach_the_wire() {
    // GIVEN: a call with every kind of option
    let reply = text_frame("ok");
    let transport = ScriptedTransport::new(vec![Script::ok(&[&reply])]);
    let client = Client::with_transport(config(), transport.clone());
    let options = vec![
        ChatOption::system_prompt("You are terse."),
        ChatOption::temperature(0.3).unwrap(),
        ChatOption::temperature(0.5).unwrap(),
        ChatOption::max_tokens(256).unwrap(),
        ChatOption::top_p(0.8).unwrap(),
        ChatOption::thinking(false),
        function("get_time", "Current time").param("zone", "string").build().into(),
        ChatOption::web_search([WebSearchOption::count(5).unwrap()]),
    ];

    // WHEN
    let events: Vec<_> = client
        .chat(&CancellationToken::new(), "Hi", options)
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(events.len(), 1);

    // THEN: the last temperature wins and tools keep their order
    let requests = transport.requests();
    let request = &requests[0];
    assert_eq!(request["system_prompt"], "You are terse.");
    assert_eq!(request["temperature"], 0.5);
    assert_eq!(request["max_tokens"], 256);
    assert_eq!(request["top_p"], 0.8);
    assert!(request.get("thinking").is_none());
    assert_eq!(request["tools"][0]["type"], "function");
    assert_eq!(request["tools"][0]["function"]["name"], "get_time");
    assert_eq!(
        request["tools"][0]["function"]["parameters"]["required"],
        json!(["zone"])
    );
    assert_eq!(request["tools"][1]["type"], "web_search");
    assert_eq!(request["tools"][1]["web_search"]["count"], 5);
}

#[tokio::test]
async fn test_options_do_not_leak_between_calls() {
    let a = text_frame("a");
    let b = text_frame("b");
    let transport = ScriptedTransport::new(vec![Script::ok(&[&a]), Script::ok(&[&b])]);
    let client = Client::with_transport(config(), transport.clone());
    let cancel = CancellationToken::new();

    let events = client
        .chat(&cancel, "one", vec![ChatOption::system_prompt("first")])
        .await
        .unwrap();
    events.collect::<Vec<_>>().await;
    let events = client.chat(&cancel, "two", Vec::new()).await.unwrap();
    events.collect::<Vec<_>>().await;

    let requests = transport.requests();
    assert_eq!(requests[0]["system_prompt"], "first");
    assert!(requests[1].get("system_prompt").is_none());
    assert_eq!(requests[1]["thinking"]["type"], "enabled");
    assert_eq!(requests[1]["model"], "glm-4.6");
    assert_eq!(requests[1]["modelId"], 11170);
}
