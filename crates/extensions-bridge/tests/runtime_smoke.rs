use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use extensions_bridge::{BridgeError, DeliveryPolicy, InProcessTransport, Listener, RetryingBridge};
use outreach_core_types::SurfaceHandle;
use tokio::time::Instant;

struct Echo {
    calls: AtomicU32,
}

#[async_trait]
impl Listener<String, String> for Echo {
    async fn handle(&self, request: String) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        format!("ack:{request}")
    }
}

struct Stalled;

#[async_trait]
impl Listener<String, String> for Stalled {
    async fn handle(&self, _request: String) -> String {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        String::new()
    }
}

fn bridge(
    transport: &Arc<InProcessTransport<String, String>>,
    policy: DeliveryPolicy,
) -> RetryingBridge<String, String> {
    RetryingBridge::new(transport.clone(), policy)
}

#[tokio::test]
async fn delivers_to_attached_listener() {
    let transport = InProcessTransport::new();
    let handle = SurfaceHandle::new();
    let echo = Arc::new(Echo {
        calls: AtomicU32::new(0),
    });
    transport.attach(handle.clone(), echo.clone());

    let reply = bridge(&transport, DeliveryPolicy::default())
        .deliver(&handle, "send".into())
        .await
        .expect("delivered");
    assert_eq!(reply, "ack:send");
    assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_three_attempts_one_second_apart() {
    let transport = InProcessTransport::<String, String>::new();
    let handle = SurfaceHandle::new();
    let started = Instant::now();

    let err = bridge(&transport, DeliveryPolicy::default())
        .deliver(&handle, "send".into())
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Unreachable { attempts: 3, .. }));
    assert_eq!(started.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn late_listener_is_reached_on_retry() {
    let transport = InProcessTransport::new();
    let handle = SurfaceHandle::new();
    let echo = Arc::new(Echo {
        calls: AtomicU32::new(0),
    });

    let attach = {
        let transport = transport.clone();
        let handle = handle.clone();
        let echo = echo.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            transport.attach(handle, echo);
        })
    };

    let reply = bridge(&transport, DeliveryPolicy::default())
        .deliver(&handle, "send".into())
        .await
        .expect("second retry reaches listener");
    attach.await.unwrap();
    assert_eq!(reply, "ack:send");
    assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn reply_timeout_is_not_retried() {
    let transport = InProcessTransport::new();
    let handle = SurfaceHandle::new();
    transport.attach(handle.clone(), Arc::new(Stalled));
    let policy = DeliveryPolicy {
        reply_timeout_ms: Some(5_000),
        ..DeliveryPolicy::default()
    };

    let started = Instant::now();
    let err = bridge(&transport, policy)
        .deliver(&handle, "send".into())
        .await
        .unwrap_err();
    assert_eq!(err, BridgeError::Timeout);
    assert_eq!(started.elapsed(), Duration::from_secs(5));
}

#[tokio::test]
async fn detach_drops_listener() {
    let transport = InProcessTransport::<String, String>::new();
    let handle = SurfaceHandle::new();
    transport.attach(
        handle.clone(),
        Arc::new(Echo {
            calls: AtomicU32::new(0),
        }),
    );
    assert!(transport.is_attached(&handle));
    assert!(transport.detach(&handle));
    assert!(!transport.detach(&handle));
    assert_eq!(transport.listener_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn zero_attempt_policy_still_tries_once() {
    let transport = InProcessTransport::<String, String>::new();
    let handle = SurfaceHandle::new();
    let policy = DeliveryPolicy {
        attempts: 0,
        ..DeliveryPolicy::default()
    };

    let started = Instant::now();
    let err = bridge(&transport, policy)
        .deliver(&handle, "send".into())
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Unreachable { attempts: 1, .. }));
    assert_eq!(started.elapsed(), Duration::ZERO);
}
