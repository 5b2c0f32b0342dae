use std::sync::Arc;
use std::time::Duration;

use confbus::ChangeEvent;
use confbus::ChangeNotifier;
use confbus::LocalBus;
use confbus::MemorySource;
use confbus::RefreshOutcome;
use tokio::sync::watch;

use crate::common::enable_logger;
use crate::common::store_over;
use crate::common::BrokenKeySource;
use crate::common::DEFAULT_KEY;
use crate::common::DEFAULT_VALUE;

async fn wait_for_value(
    store: &confbus::ConfigStore,
    key: &str,
    expected: &str,
) -> bool {
    for _ in 0..100 {
        if store.get(key).ok().as_deref() == Some(expected) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn serves_default_when_no_event_was_received() {
    enable_logger();
    let store = store_over(Arc::new(MemorySource::new()));

    assert_eq!(store.get(DEFAULT_KEY).unwrap(), DEFAULT_VALUE);
}

#[tokio::test]
async fn published_event_updates_every_instance() {
    enable_logger();
    let source = Arc::new(MemorySource::new());
    let bus = LocalBus::new(16);
    let (_shutdown_tx, shutdown_rx) = watch::channel(());

    let instance_a = store_over(source.clone());
    let instance_b = store_over(source.clone());
    let _a = bus.register(
        Arc::new(ChangeNotifier::new(instance_a.clone(), 16)),
        shutdown_rx.clone(),
    );
    let _b = bus.register(
        Arc::new(ChangeNotifier::new(instance_b.clone(), 16)),
        shutdown_rx,
    );

    source.set("example.key", "new-value");
    let delivered = bus.publish(ChangeEvent::new(["example.key"])).unwrap();
    assert_eq!(delivered, 2);

    assert!(wait_for_value(&instance_a, "example.key", "new-value").await);
    assert!(wait_for_value(&instance_b, "example.key", "new-value").await);
}

#[tokio::test]
async fn duplicate_delivery_is_applied_once() {
    enable_logger();
    let source = Arc::new(MemorySource::with_values([(DEFAULT_KEY, "v1")]));
    let notifier = ChangeNotifier::new(store_over(source.clone()), 16);
    let event = ChangeEvent::new([DEFAULT_KEY]);

    let first = notifier.process(&event).await.unwrap();
    assert!(matches!(first.outcome(DEFAULT_KEY), Some(RefreshOutcome::Updated)));

    source.set(DEFAULT_KEY, "v2");
    assert!(notifier.process(&event).await.is_none());
    assert_eq!(notifier.store().get(DEFAULT_KEY).unwrap(), "v1");
}

#[tokio::test]
async fn failing_key_does_not_block_the_others() {
    enable_logger();
    let source = Arc::new(BrokenKeySource {
        inner: MemorySource::with_values([("healthy.key", "fresh")]),
        broken: "broken.key".to_string(),
    });
    let notifier = ChangeNotifier::new(store_over(source), 16);

    let report = notifier
        .process(&ChangeEvent::new(["healthy.key", "broken.key"]))
        .await
        .unwrap();

    assert!(matches!(report.outcome("healthy.key"), Some(RefreshOutcome::Updated)));
    assert!(report.outcome("broken.key").unwrap().is_failure());
    assert_eq!(report.failures().count(), 1);
    assert_eq!(notifier.store().get("healthy.key").unwrap(), "fresh");
    assert!(notifier.store().get("broken.key").unwrap_err().is_not_found());
}

#[tokio::test]
async fn refresh_all_event_picks_up_default_key_change() {
    enable_logger();
    let source = Arc::new(MemorySource::new());
    let notifier = ChangeNotifier::new(store_over(source.clone()), 16);

    source.set(DEFAULT_KEY, "rotated");
    let report = notifier.process(&ChangeEvent::refresh_all()).await.unwrap();

    assert!(report.is_success());
    assert_eq!(notifier.store().get(DEFAULT_KEY).unwrap(), "rotated");
}

#[tokio::test]
async fn older_version_is_not_applied_over_newer() {
    enable_logger();
    let source = Arc::new(MemorySource::with_values([(DEFAULT_KEY, "v5")]));
    let notifier = ChangeNotifier::new(store_over(source.clone()), 16);

    notifier
        .process(&ChangeEvent::new([DEFAULT_KEY]).with_version(5))
        .await
        .unwrap();
    source.set(DEFAULT_KEY, "v4");
    let report = notifier
        .process(&ChangeEvent::new([DEFAULT_KEY]).with_version(4))
        .await
        .unwrap();

    assert!(matches!(report.outcome(DEFAULT_KEY), Some(RefreshOutcome::Stale)));
    assert_eq!(notifier.store().get(DEFAULT_KEY).unwrap(), "v5");
}
