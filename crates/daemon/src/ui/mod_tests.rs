// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use rig_wire::{ServerFrame, UiCall, UiReply, UiResponse};
use tokio::sync::mpsc;

use super::*;

fn prompt(label: &str) -> UiCall {
    UiCall::Prompt { label: label.to_string(), default: String::new() }
}

/// Pull the next UiRequest frame off the session channel.
async fn next_request(rx: &mut mpsc::Receiver<ServerFrame>) -> rig_wire::UiRequest {
    match tokio::time::timeout(Duration::from_secs(1), rx.recv()).await {
        Ok(Some(ServerFrame::UiRequest(request))) => request,
        other => panic!("expected a ui request frame, got {other:?}"),
    }
}

#[tokio::test]
async fn prompt_without_a_session_fails() {
    let proxy = UiProxy::new();
    let err = proxy.dispatch(prompt("Name")).await.unwrap_err();
    assert!(matches!(err, UiError::NoSession));
}

#[tokio::test]
async fn update_progress_without_a_session_succeeds() {
    let proxy = UiProxy::new();
    let reply = proxy
        .dispatch(UiCall::UpdateProgress { message: "working".to_string(), percentage: None })
        .await
        .unwrap();
    assert_eq!(reply, UiReply::Ack);
}

#[tokio::test]
async fn prompt_round_trips_through_the_bridge() {
    let proxy = Arc::new(UiProxy::new());
    let (tx, mut rx) = mpsc::channel(8);
    let bridge = proxy.set_active_session(tx);

    let dispatch = {
        let proxy = Arc::clone(&proxy);
        tokio::spawn(async move { proxy.dispatch(prompt("Name")).await })
    };

    let request = next_request(&mut rx).await;
    bridge.handle_response(UiResponse {
        response_to: request.id,
        reply: UiReply::Value { value: "Response".to_string() },
    });

    let reply = dispatch.await.unwrap().unwrap();
    assert_eq!(reply, UiReply::Value { value: "Response".to_string() });
}

#[tokio::test]
async fn replies_correlate_by_id_even_out_of_order() {
    let proxy = Arc::new(UiProxy::new());
    let (tx, mut rx) = mpsc::channel(8);
    let bridge = proxy.set_active_session(tx);

    let mut dispatches = Vec::new();
    for i in 0..3 {
        let proxy = Arc::clone(&proxy);
        dispatches.push(tokio::spawn(async move {
            proxy.dispatch(prompt(&format!("q{i}"))).await
        }));
    }

    let mut requests = Vec::new();
    for _ in 0..3 {
        requests.push(next_request(&mut rx).await);
    }

    // Answer in reverse arrival order; each waiter must still receive the
    // reply correlated to its own id.
    for request in requests.iter().rev() {
        let UiCall::Prompt { label, .. } = &request.call else {
            panic!("expected a prompt");
        };
        bridge.handle_response(UiResponse {
            response_to: request.id.clone(),
            reply: UiReply::Value { value: format!("answer-{label}") },
        });
    }

    for (i, dispatch) in dispatches.into_iter().enumerate() {
        let reply = dispatch.await.unwrap().unwrap();
        assert_eq!(reply, UiReply::Value { value: format!("answer-q{i}") });
    }
}

#[tokio::test]
async fn unknown_reply_ids_are_ignored() {
    let proxy = Arc::new(UiProxy::new());
    let (tx, mut rx) = mpsc::channel(8);
    let bridge = proxy.set_active_session(tx);

    bridge.handle_response(UiResponse {
        response_to: "never-issued".to_string(),
        reply: UiReply::Confirmed { confirmed: true },
    });

    // The bridge still works afterwards.
    let dispatch = {
        let proxy = Arc::clone(&proxy);
        tokio::spawn(async move { proxy.dispatch(prompt("still-alive")).await })
    };
    let request = next_request(&mut rx).await;
    bridge.handle_response(UiResponse {
        response_to: request.id,
        reply: UiReply::Value { value: "yes".to_string() },
    });
    assert!(dispatch.await.unwrap().is_ok());
}

#[tokio::test]
async fn clearing_the_session_unblocks_waiters() {
    let proxy = Arc::new(UiProxy::new());
    let (tx, mut rx) = mpsc::channel(8);
    proxy.set_active_session(tx);

    let dispatch = {
        let proxy = Arc::clone(&proxy);
        tokio::spawn(async move { proxy.dispatch(prompt("stranded")).await })
    };
    let _request = next_request(&mut rx).await;

    proxy.clear_active_session();

    let err = dispatch.await.unwrap().unwrap_err();
    assert!(matches!(err, UiError::SessionClosed));

    // And a fresh prompt now reports no session.
    let err = proxy.dispatch(prompt("later")).await.unwrap_err();
    assert!(matches!(err, UiError::NoSession));
}

#[tokio::test]
async fn dropped_session_channel_reports_closed() {
    let proxy = Arc::new(UiProxy::new());
    let (tx, rx) = mpsc::channel(8);
    proxy.set_active_session(tx);
    drop(rx);

    let err = proxy.dispatch(prompt("gone")).await.unwrap_err();
    assert!(matches!(err, UiError::SessionClosed));
}
