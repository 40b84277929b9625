//! HTTP surface: netboot artifacts under `/mac/{mac}/…` and the live event
//! feed on `/events`.

use crate::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderName, HeaderValue, Request, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::get,
    Router,
};
use damselfly_common::MacAddr;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tower::ServiceExt;
use tracing::{debug, warn};

/// Reconnect delay advertised to SSE clients.
const SSE_RETRY: Duration = Duration::from_millis(3000);

/// Comment-line cadence keeping idle streams alive through proxies.
const SSE_HEARTBEAT: Duration = Duration::from_secs(15);

pub fn router(state: AppState) -> Router {
    let mut router = Router::new().route("/events", get(machine_events));
    if state.netboot.is_some() {
        router = router.route("/mac/{mac_addr}/{*artifact}", get(serve_netboot));
    }
    router.with_state(state)
}

/// Serve one netboot artifact, noting the fetch on the machine's FSM. The
/// artifact fetch is how a machine proves it reached the UKI download stage,
/// so the event fires before the file goes out.
async fn serve_netboot(
    State(state): State<AppState>,
    Path((mac_addr, artifact)): Path<(String, String)>,
) -> Response {
    match mac_addr.parse::<MacAddr>() {
        Ok(mac) => state.registry.get_or_init(mac).event("http_fetch_uki"),
        // Not a MAC: still serve the file, just without the FSM trigger.
        Err(_) => debug!(segment = %mac_addr, "netboot request with non-MAC path segment"),
    }

    let Some(netboot) = state.netboot.clone() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let request = match Request::builder()
        .uri(format!("/{artifact}"))
        .body(Body::empty())
    {
        Ok(request) => request,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };
    match netboot.oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(infallible) => match infallible {},
    }
}

#[derive(Debug, Deserialize)]
struct EventsQuery {
    mac: Option<String>,
}

/// Server-Sent Events feed: a `retry:` hint, one snapshot frame, then live
/// events (optionally filtered to a single machine) until the client goes
/// away.
async fn machine_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Response {
    let filter = match query.mac.as_deref() {
        None | Some("") => None,
        Some(raw) => match raw.parse::<MacAddr>() {
            Ok(mac) => Some(mac),
            Err(e) => return (StatusCode::BAD_REQUEST, format!("MAC error: {e}")).into_response(),
        },
    };

    let snapshot = match filter {
        None => serde_json::to_string(&state.registry.snapshot()),
        Some(mac) => serde_json::to_string(&state.registry.get_or_init(mac).snapshot()),
    };
    let snapshot = match snapshot {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "failed to serialise registry snapshot");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // Subscribe before streaming so nothing between snapshot and first poll
    // is lost; the subscription travels with the stream and unsubscribes
    // when the client disconnects.
    let (rx, subscription) = state.broker.subscribe();

    let preamble = stream::iter([
        Ok::<_, Infallible>(Event::default().retry(SSE_RETRY)),
        Ok(Event::default().data(snapshot)),
    ]);
    let live = stream::unfold(
        (rx, subscription, filter),
        |(mut rx, subscription, filter)| async move {
            loop {
                let message = rx.recv().await?;
                if filter.is_some_and(|mac| mac != message.mac) {
                    continue;
                }
                match serde_json::to_string(&message) {
                    Ok(json) => {
                        return Some((
                            Ok(Event::default().data(json)),
                            (rx, subscription, filter),
                        ));
                    }
                    Err(e) => warn!(error = %e, "failed to serialise event"),
                }
            }
        },
    );

    let sse = Sse::new(preamble.chain(live)).keep_alive(
        KeepAlive::new()
            .interval(SSE_HEARTBEAT)
            .text("heartbeat"),
    );
    (
        [(
            HeaderName::from_static("x-accel-buffering"),
            HeaderValue::from_static("no"),
        )],
        sse,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::Broker;
    use crate::machine::MachineRegistry;
    use axum::body::to_bytes;
    use damselfly_common::pin_timestamp;
    use std::sync::Arc;
    use tower_http::services::ServeDir;

    fn state_with_netboot(dir: Option<&std::path::Path>) -> AppState {
        let broker = Arc::new(Broker::new());
        let registry = Arc::new(MachineRegistry::new(Arc::clone(&broker)));
        AppState {
            broker,
            registry,
            netboot: dir.map(ServeDir::new),
        }
    }

    async fn get_response(router: Router, uri: &str) -> Response {
        router
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_netboot_fetch_serves_file_and_fires_event() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("boot.efi"), b"uki image").unwrap();

        let state = state_with_netboot(Some(dir.path()));
        let registry = Arc::clone(&state.registry);
        let response = get_response(
            router(state),
            "/mac/04:42:1a:03:9b:20/boot.efi",
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"uki image");

        let machine = registry
            .get("04:42:1a:03:9b:20".parse().unwrap())
            .expect("fetch created the machine");
        // Straight to the download stage counts as a stage skip.
        assert_eq!(machine.state(), "http_fetch_uki");
        let names: Vec<String> = machine
            .snapshot()
            .events
            .into_iter()
            .map(|event| event.name)
            .collect();
        assert_eq!(names, vec!["init", "jump_to", "http_fetch_uki"]);
    }

    #[tokio::test]
    async fn test_netboot_fetch_with_non_mac_segment_still_serves() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file.txt"), b"contents").unwrap();

        let state = state_with_netboot(Some(dir.path()));
        let registry = Arc::clone(&state.registry);
        let response = get_response(router(state), "/mac/not-a-mac/file.txt").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_netboot_directory_without_index_is_404() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/file.txt"), b"x").unwrap();

        let state = state_with_netboot(Some(dir.path()));
        let response = get_response(router(state), "/mac/04:42:1a:03:9b:20/sub/").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_netboot_directory_with_index_serves_it() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/index.html"), b"<html></html>").unwrap();

        let state = state_with_netboot(Some(dir.path()));
        let response = get_response(router(state), "/mac/04:42:1a:03:9b:20/sub/").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"<html></html>");
    }

    #[tokio::test]
    async fn test_events_rejects_bad_mac_filter() {
        let state = state_with_netboot(None);
        let response = get_response(router(state), "/events?mac=zz:zz").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_events_stream_opens_with_retry_and_snapshot() {
        pin_timestamp("bogustime");
        let state = state_with_netboot(None);
        state.registry.get_or_init("04:42:1a:03:9b:20".parse().unwrap());

        let response = get_response(router(state), "/events").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/event-stream"
        );
        assert_eq!(response.headers().get("x-accel-buffering").unwrap(), "no");

        let mut body = response.into_body().into_data_stream();
        let first = body.next().await.unwrap().unwrap();
        assert_eq!(&first[..], b"retry: 3000\n\n");

        let second = body.next().await.unwrap().unwrap();
        let frame = String::from_utf8(second.to_vec()).unwrap();
        assert!(frame.starts_with("data: "));
        assert!(frame.contains(r#""04:42:1a:03:9b:20""#));
        assert!(frame.contains(r#""event":"init""#));
    }

    #[tokio::test]
    async fn test_events_filter_passes_only_matching_machine() {
        pin_timestamp("bogustime");
        let state = state_with_netboot(None);
        let registry = Arc::clone(&state.registry);

        let response = get_response(router(state), "/events?mac=04:42:1a:03:9b:20").await;
        let mut body = response.into_body().into_data_stream();

        // retry hint, then the (freshly created) machine's snapshot.
        let _ = body.next().await.unwrap().unwrap();
        let snapshot = body.next().await.unwrap().unwrap();
        let snapshot = String::from_utf8(snapshot.to_vec()).unwrap();
        assert!(snapshot.contains(r#""Mac":"04:42:1a:03:9b:20""#));

        // An event on another machine must not reach this stream; one on the
        // filtered machine must.
        registry.get_or_init("aa:bb:cc:dd:ee:ff".parse().unwrap());
        registry
            .get("04:42:1a:03:9b:20".parse().unwrap())
            .unwrap()
            .event("firmware_init");

        let frame = body.next().await.unwrap().unwrap();
        let frame = String::from_utf8(frame.to_vec()).unwrap();
        assert!(frame.contains(r#""mac":"04:42:1a:03:9b:20""#));
        assert!(frame.contains(r#""event":"firmware_init""#));
    }
}
