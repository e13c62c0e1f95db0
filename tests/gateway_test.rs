//! End-to-end tests against a gateway bound to a real socket.

use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use reqwest::StatusCode;
use rocket_gateway::auth::token::unix_now;
use rocket_gateway::auth::{issue_token, Claims, TokenVerifier};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

mod common;

use common::{client, fake_health, start_gateway, test_config, SECRET};

#[tokio::test]
async fn fourth_request_in_window_is_rate_limited() {
    let gateway = start_gateway(test_config(3), fake_health(true, true, Duration::ZERO)).await;
    let client = client();

    for _ in 0..3 {
        let res = client.get(gateway.url("/api/v1/ping")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.json::<Value>().await.unwrap(), json!({"message": "pong"}));
    }

    let res = client.get(gateway.url("/api/v1/ping")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({"error": "rate limit exceeded"})
    );

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn valid_token_reaches_me() {
    let gateway = start_gateway(test_config(100), fake_health(true, true, Duration::ZERO)).await;
    let token = issue_token(SECRET, "u-42", Duration::from_secs(3600)).unwrap();

    let res = client()
        .get(gateway.url("/api/v1/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"user_id": "u-42"}));

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn expired_token_is_unauthorized() {
    let gateway = start_gateway(test_config(100), fake_health(true, true, Duration::ZERO)).await;
    let now = unix_now() as i64;
    let token = TokenVerifier::new(SECRET)
        .sign(&Claims::new("u-42", now - 7200, now - 3600))
        .unwrap();

    let res = client()
        .get(gateway.url("/api/v1/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"error": "unauthorized"}));

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn token_signed_with_other_secret_is_unauthorized() {
    let gateway = start_gateway(test_config(100), fake_health(true, true, Duration::ZERO)).await;
    let token = issue_token("not-the-secret", "u-42", Duration::from_secs(3600)).unwrap();

    let res = client()
        .get(gateway.url("/api/v1/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn health_reports_each_dependency() {
    let gateway = start_gateway(test_config(100), fake_health(false, true, Duration::ZERO)).await;

    let res = client().get(gateway.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({"postgres": false, "redis": true})
    );

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn healthy_dependencies_return_ok() {
    let gateway = start_gateway(test_config(100), fake_health(true, true, Duration::ZERO)).await;

    let res = client().get(gateway.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({"postgres": true, "redis": true})
    );

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn websocket_echoes_frames() {
    let gateway = start_gateway(test_config(100), fake_health(true, true, Duration::ZERO)).await;

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", gateway.addr))
        .await
        .unwrap();

    socket.send(Message::text("hello")).await.unwrap();
    let reply = socket.next().await.unwrap().unwrap();
    assert_eq!(reply, Message::text("hello"));

    socket.send(Message::binary(vec![1u8, 2, 3])).await.unwrap();
    let reply = socket.next().await.unwrap().unwrap();
    assert_eq!(reply, Message::binary(vec![1u8, 2, 3]));

    socket.close(None).await.unwrap();
    gateway.shutdown.trigger();
}

#[tokio::test]
async fn shutdown_drains_in_flight_requests() {
    let gateway = start_gateway(
        test_config(100),
        fake_health(true, true, Duration::from_millis(300)),
    )
    .await;

    let url = gateway.url("/health");
    let ping_url = gateway.url("/api/v1/ping");
    let in_flight = tokio::spawn(async move { client().get(url).send().await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    gateway.shutdown.trigger();

    let res = in_flight.await.unwrap().unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    drop(res);

    let finished = tokio::time::timeout(Duration::from_secs(5), gateway.task)
        .await
        .expect("server did not stop after shutdown");
    finished.unwrap().unwrap();

    assert!(client().get(ping_url).send().await.is_err());
}

#[tokio::test]
async fn grace_period_cuts_off_stuck_requests() {
    let mut config = test_config(100);
    config.timeouts.shutdown_grace_secs = 1;
    let gateway = start_gateway(config, fake_health(true, true, Duration::from_secs(4))).await;

    let url = gateway.url("/health");
    let stuck = tokio::spawn(async move { client().get(url).send().await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    gateway.shutdown.trigger();
    let triggered = Instant::now();

    tokio::time::timeout(Duration::from_secs(3), gateway.task)
        .await
        .expect("server did not stop at the end of the grace period")
        .unwrap()
        .unwrap();
    let stopped = triggered.elapsed();
    assert!(stopped >= Duration::from_millis(900), "stopped after {stopped:?}");
    assert!(stopped < Duration::from_secs(2), "stopped after {stopped:?}");

    // Aborted with the server, before the 2s probe timeout could answer.
    let result = tokio::time::timeout(Duration::from_millis(500), stuck)
        .await
        .expect("request outlived the server")
        .unwrap();
    assert!(result.is_err());
}
