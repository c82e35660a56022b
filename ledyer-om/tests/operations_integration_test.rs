//! Integration tests for order operations.
//!
//! Runs edit and capture end to end: settings, mapping, token exchange and the
//! data call, against a scripted transport.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use ledyer_om::{
    LedyerError,
    client::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, LedyerClient},
    mapper::OrderLineMapper,
    operations::{capture_order, edit_order},
    order::InMemoryOrder,
    settings::Settings,
};
use serde_json::{Value, json};

#[derive(Default)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<(u16, String)>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    fn with_responses(responses: &[(u16, &str)]) -> Arc<Self> {
        let transport = Self::default();
        transport
            .responses
            .lock()
            .unwrap()
            .extend(responses.iter().map(|(status, body)| (*status, (*body).to_owned())));
        Arc::new(transport)
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Client-side handle; the test keeps its own `Arc` to inspect recorded requests.
struct SharedTransport(Arc<ScriptedTransport>);

impl HttpTransport for SharedTransport {
    async fn send<'a>(&'a self, request: &'a HttpRequest) -> ledyer_om::Result<HttpResponse> {
        self.0.requests.lock().unwrap().push(request.clone());
        let (status, body) = self
            .0
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LedyerError::TransportError("no scripted response".to_owned()))?;
        Ok(HttpResponse { status, body: body.into_bytes() })
    }
}

const SETTINGS: &str = r#"
    [checkout]
    test_mode = true
    environment = "sandbox"
    logging = true
    client_id = "shop"
    client_secret = "hunter2"

    [endpoints]
    capture_order = "/v1/orders/{id}/capture"
"#;

const ORDER: &str = r#"{
    "currency": "SEK",
    "tax_rates": {"1": "25"},
    "items": [
        {"type": "merchandise", "name": "<b>Mug</b>", "quantity": 2,
         "subtotal": "100.00", "subtotal_tax": "25.00", "total": "80.00", "total_tax": "20.00",
         "taxes": {"1": "20.00"},
         "product": {"id": "17", "sku": "MUG-1"}},
        {"type": "shipping", "name": "Post", "method_id": "flat_rate", "instance_id": "3",
         "total": "40.00", "total_tax": "10.00", "taxes": {"1": "10.00"}},
        {"type": "coupon", "name": "SUMMER", "discount": "20.00", "discount_tax": "5.00"},
        {"type": "tax", "rate_id": "1", "label": "Moms"}
    ]
}"#;

const TOKEN: &str = r#"{"access_token":"tok","expires_in":3600}"#;

fn client(transport: &Arc<ScriptedTransport>) -> (LedyerClient<SharedTransport>, Settings) {
    let settings = Settings::from_toml(SETTINGS).expect("settings should parse");
    let mut config = settings.client_config(None).expect("settings should resolve");
    // Environment overrides must not leak into these assertions.
    config.client_id = "shop".to_owned();
    config.client_secret = "hunter2".to_owned();
    (LedyerClient::with_transport(config, SharedTransport(Arc::clone(transport))), settings)
}

#[tokio::test]
async fn test_edit_order_flow() {
    let transport = ScriptedTransport::with_responses(&[(200, TOKEN), (200, r#"{"status":"updated"}"#)]);
    let (client, settings) = client(&transport);
    let mut order = InMemoryOrder::from_json(ORDER).unwrap();

    let response = edit_order(&client, &OrderLineMapper::new(), &settings.endpoints, "or_2Nq", &mut order)
        .await
        .expect("edit should succeed");
    assert_eq!(response, json!({"status": "updated"}));

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].url.as_str(),
        "https://auth.sandbox.ledyer.com/oauth/token?grant_type=client_credentials"
    );

    let edit = &requests[1];
    assert_eq!(edit.method, HttpMethod::Post);
    assert_eq!(edit.url.as_str(), "https://api.sandbox.ledyer.com/v1/orders/or_2Nq/edit");
    assert_eq!(edit.header("Authorization"), Some("Bearer tok"));
    assert_eq!(edit.timeout, Duration::from_secs(10));

    let body = edit.body.as_ref().unwrap();
    assert_eq!(body["totalOrderAmount"], 15000);
    assert_eq!(body["totalOrderVatAmount"], 3000);
    assert_eq!(body["totalOrderAmountExclVat"], 12000);

    let lines = body["orderLines"].as_array().unwrap();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], json!({
        "type": "physical",
        "reference": "MUG-1",
        "description": "Mug",
        "quantity": 2,
        "unitPrice": 6250,
        "unitDiscountAmount": 1250,
        "vat": 25,
        "totalAmount": 10000,
        "totalVatAmount": 2000
    }));
    assert_eq!(lines[1]["type"], "shippingFee");
    assert_eq!(lines[1]["reference"], "flat_rate:3");
    assert_eq!(lines[1]["unitPrice"], 5000);
    assert_eq!(lines[1]["vat"], 25);
    assert_eq!(lines[2]["type"], "discount");
    assert_eq!(lines[2]["totalAmount"], 2000);
    assert_eq!(lines[2]["totalVatAmount"], 500);

    let charged: i64 = lines
        .iter()
        .filter(|line| line["type"] != "discount")
        .map(|line| line["totalAmount"].as_i64().unwrap())
        .sum();
    assert_eq!(charged, 15000);
}

#[tokio::test]
async fn test_capture_order_flow() {
    let transport = ScriptedTransport::with_responses(&[(200, TOKEN), (202, "")]);
    let (client, settings) = client(&transport);
    let mut order = InMemoryOrder::from_json(ORDER).unwrap();

    let response = capture_order(&client, &OrderLineMapper::new(), &settings.endpoints, "or_2Nq", &mut order)
        .await
        .expect("capture should succeed");
    assert_eq!(response, Value::Null);

    let capture = &transport.requests()[1];
    assert_eq!(capture.url.as_str(), "https://api.sandbox.ledyer.com/v1/orders/or_2Nq/capture");
    let body = capture.body.as_ref().unwrap();
    assert_eq!(body["totalCaptureAmount"], 15000);
    assert!(body.get("totalOrderAmount").is_none());
}

#[tokio::test]
async fn test_filter_drops_merchandise_from_payload() {
    let transport = ScriptedTransport::with_responses(&[(200, TOKEN), (200, "{}")]);
    let (client, settings) = client(&transport);
    let mut order = InMemoryOrder::from_json(ORDER).unwrap();
    let mapper = OrderLineMapper::new().with_filter(|line, item| (item.name != "<b>Mug</b>").then_some(line));

    edit_order(&client, &mapper, &settings.endpoints, "or_2Nq", &mut order).await.unwrap();

    let body = transport.requests()[1].body.clone().unwrap();
    let types: Vec<&str> =
        body["orderLines"].as_array().unwrap().iter().map(|l| l["type"].as_str().unwrap()).collect();
    assert_eq!(types, vec!["shippingFee", "discount"]);
}

#[tokio::test]
async fn test_provider_rejection_surfaces_client_error() {
    let transport = ScriptedTransport::with_responses(&[
        (200, TOKEN),
        (422, r#"{"errors":[{"code":"invalid_amount","message":"Capture exceeds authorized amount."}]}"#),
    ]);
    let (client, settings) = client(&transport);
    let mut order = InMemoryOrder::from_json(ORDER).unwrap();

    let err = capture_order(&client, &OrderLineMapper::new(), &settings.endpoints, "or_2Nq", &mut order)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(422));
    assert!(err.to_string().contains("Capture exceeds authorized amount."));
    let context = err.context().unwrap();
    assert!(context.contains("/v1/orders/or_2Nq/capture"));
    assert!(!context.contains("hunter2"));
    assert!(!context.contains("Bearer"));
}

#[tokio::test]
async fn test_invalid_order_never_hits_the_network() {
    let transport = ScriptedTransport::with_responses(&[]);
    let (client, settings) = client(&transport);
    let mut order = InMemoryOrder::new("").with_item(ledyer_om::order::OrderItem::Tax(
        ledyer_om::order::TaxItem { rate_id: "1".to_owned(), label: "Moms".to_owned() },
    ));

    let err = edit_order(&client, &OrderLineMapper::new(), &settings.endpoints, "or_2Nq", &mut order)
        .await
        .unwrap_err();
    assert!(matches!(err, LedyerError::DataError(_)));

    let err = edit_order(&client, &OrderLineMapper::new(), &settings.endpoints, "../x", &mut order)
        .await
        .unwrap_err();
    assert!(matches!(err, LedyerError::DataError(_)));

    assert!(transport.requests().is_empty());
}
