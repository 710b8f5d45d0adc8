//! Status fan-out behavior with misbehaving reporters.

mod support;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hoist_core::status::{
    RecipeState, RecipeStatusEvent, RunStatus, StatusEvent, StatusReporter, StatusRollup,
};
use support::{RecordingReporter, recipe};

struct FailingReporter;

#[async_trait]
impl StatusReporter for FailingReporter {
    fn name(&self) -> &str {
        "failing"
    }

    async fn report(&self, _event: &StatusEvent<'_>, _status: &RunStatus) -> anyhow::Result<()> {
        anyhow::bail!("sink unavailable")
    }
}

struct SlowReporter {
    delay: Duration,
    finished: Arc<Mutex<usize>>,
}

#[async_trait]
impl StatusReporter for SlowReporter {
    fn name(&self) -> &str {
        "slow"
    }

    async fn report(&self, _event: &StatusEvent<'_>, _status: &RunStatus) -> anyhow::Result<()> {
        tokio::time::sleep(self.delay).await;
        *self.finished.lock().unwrap() += 1;
        Ok(())
    }
}

/// Captures the state each event arrived with.
#[derive(Clone, Default)]
struct SnapshotReporter {
    seen: Arc<Mutex<Vec<Option<RecipeState>>>>,
}

#[async_trait]
impl StatusReporter for SnapshotReporter {
    fn name(&self) -> &str {
        "snapshot"
    }

    async fn report(&self, _event: &StatusEvent<'_>, status: &RunStatus) -> anyhow::Result<()> {
        let state = status.get("nginx").map(|s| s.state);
        self.seen.lock().unwrap().push(state);
        Ok(())
    }
}

#[tokio::test]
async fn failing_reporter_does_not_block_others() {
    let recorder = RecordingReporter::default();
    let mut rollup = StatusRollup::new(vec![
        Box::new(FailingReporter),
        Box::new(recorder.clone()),
    ]);

    rollup.report_recipe_available(&recipe("nginx")).await;
    rollup
        .report_recipe_installed(&RecipeStatusEvent::new(recipe("nginx")).with_entity_guid("g-1"))
        .await;
    rollup.report_complete().await;

    assert_eq!(
        recorder.events(),
        vec!["recipe_available:nginx", "recipe_installed:nginx", "complete"]
    );
    assert_eq!(
        rollup.status().get("nginx").map(|s| s.state),
        Some(RecipeState::Installed)
    );
}

#[tokio::test(start_paused = true)]
async fn slow_reporter_is_abandoned_after_timeout() {
    let finished = Arc::new(Mutex::new(0));
    let recorder = RecordingReporter::default();
    let mut rollup = StatusRollup::new(vec![
        Box::new(SlowReporter {
            delay: Duration::from_secs(60),
            finished: Arc::clone(&finished),
        }),
        Box::new(recorder.clone()),
    ])
    .with_sink_timeout(Duration::from_secs(2));

    let started = tokio::time::Instant::now();
    rollup.report_complete().await;

    assert_eq!(*finished.lock().unwrap(), 0);
    assert_eq!(recorder.events(), vec!["complete"]);
    assert!(started.elapsed() < Duration::from_secs(60));
}

#[tokio::test]
async fn reporters_see_post_event_state() {
    let snapshot = SnapshotReporter::default();
    let mut rollup = StatusRollup::new(vec![Box::new(snapshot.clone())]);

    let event = RecipeStatusEvent::new(recipe("nginx"));
    rollup.report_recipe_available(&recipe("nginx")).await;
    rollup.report_recipe_installing(&event).await;
    rollup
        .report_recipe_failed(&event.clone().with_msg("boom"))
        .await;

    assert_eq!(
        *snapshot.seen.lock().unwrap(),
        vec![
            Some(RecipeState::Available),
            Some(RecipeState::Installing),
            Some(RecipeState::Failed),
        ]
    );
    assert_eq!(
        rollup
            .status()
            .get("nginx")
            .and_then(|s| s.error.as_deref()),
        Some("boom")
    );
}

#[tokio::test]
async fn reporters_receive_events_in_registration_order() {
    let order = Arc::new(Mutex::new(Vec::new()));

    struct Ordered {
        label: &'static str,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl StatusReporter for Ordered {
        fn name(&self) -> &str {
            self.label
        }

        async fn report(&self, _event: &StatusEvent<'_>, _status: &RunStatus) -> anyhow::Result<()> {
            self.order.lock().unwrap().push(self.label);
            Ok(())
        }
    }

    let mut rollup = StatusRollup::new(vec![
        Box::new(Ordered {
            label: "first",
            order: Arc::clone(&order),
        }),
        Box::new(Ordered {
            label: "second",
            order: Arc::clone(&order),
        }),
    ]);
    rollup.report_complete().await;

    assert_eq!(rollup.reporter_names(), vec!["first", "second"]);
    assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
}

#[tokio::test]
async fn complete_is_broadcast_once() {
    let recorder = RecordingReporter::default();
    let mut rollup = StatusRollup::new(vec![Box::new(recorder.clone())]);

    rollup.report_complete().await;
    rollup.report_complete().await;

    assert_eq!(recorder.count("complete"), 1);
    assert!(rollup.status().complete);
}

#[tokio::test]
async fn repeated_availability_is_broadcast_once() {
    let recorder = RecordingReporter::default();
    let mut rollup = StatusRollup::new(vec![Box::new(recorder.clone())]);

    rollup
        .report_recipes_available(&[recipe("nginx"), recipe("mysql")])
        .await;
    rollup
        .report_recipes_available(&[recipe("nginx"), recipe("redis")])
        .await;
    rollup.report_recipe_available(&recipe("redis")).await;

    assert_eq!(
        recorder.events(),
        vec!["recipes_available:nginx,mysql", "recipes_available:redis"]
    );
}
