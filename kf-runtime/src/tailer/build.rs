//! The build phase: discover builds, stream their logs, stop on failure
use super::Error;
use crate::build_logs::BuildLogs;
use futures::StreamExt;
use kf_client::{cluster::WATCH_TIMEOUT_SECS, Watch};
use kf_core::{Build, BuildExt, ObjectExt};
use std::time::Duration;
use tokio::{
    io::AsyncWrite,
    sync::{mpsc, oneshot},
    time::Instant,
};
use tracing::{debug, trace, warn};

/// States of the build phase
///
/// `Running` is the only state with outgoing transitions, the other two end the phase.
#[derive(Debug)]
enum Phase {
    Running,
    Done,
    Failed(Error),
}

/// What the coordinator woke up for
enum Signal {
    /// A build was added and its logs should be streamed
    Build(String),
    /// A build failed
    Failure(Error),
    /// The watcher finished without seeing a failure
    WatcherDone,
}

/// Run the build phase to completion
///
/// Builds are tailed one at a time, in the order they were added. Returns once
/// the build watch has closed without a failure, or with the first error.
pub(super) async fn run<L, W>(logs: &L, out: &mut W, namespace: &str, watch: Watch<Build>) -> crate::Result<()>
where
    L: BuildLogs + ?Sized,
    W: AsyncWrite + Send + Unpin,
{
    // The name channel holds at most one discovered build, so discovery is paced by tailing.
    // A failure can always be recorded without the coordinator listening.
    let (names_tx, mut names) = mpsc::channel(1);
    let (failed_tx, mut failed) = oneshot::channel();
    tokio::spawn(watch_builds(watch, names_tx, failed_tx));

    let mut phase = Phase::Running;
    loop {
        phase = match phase {
            Phase::Running => {
                let signal = tokio::select! {
                    biased;
                    failure = &mut failed => match failure {
                        Ok(err) => Signal::Failure(err),
                        Err(_closed) => Signal::WatcherDone,
                    },
                    Some(name) = names.recv() => Signal::Build(name),
                };
                match signal {
                    Signal::Build(name) => match invoke(logs, out, &name, namespace).await {
                        Ok(()) => Phase::Running,
                        Err(err) => Phase::Failed(err),
                    },
                    Signal::Failure(err) => Phase::Failed(err),
                    // anything discovered before the watcher finished still gets tailed
                    Signal::WatcherDone => drain(logs, out, namespace, &mut names).await,
                }
            }
            Phase::Done => {
                debug!(%namespace, "build phase done");
                return Ok(());
            }
            Phase::Failed(err) => {
                debug!(%namespace, error = %err, "build phase failed");
                return Err(err);
            }
        };
    }
}

async fn drain<L, W>(logs: &L, out: &mut W, namespace: &str, names: &mut mpsc::Receiver<String>) -> Phase
where
    L: BuildLogs + ?Sized,
    W: AsyncWrite + Send + Unpin,
{
    while let Some(name) = names.recv().await {
        if let Err(err) = invoke(logs, out, &name, namespace).await {
            return Phase::Failed(err);
        }
    }
    Phase::Done
}

/// Stream the logs of one build, blocking until they have been drained
async fn invoke<L, W>(logs: &L, out: &mut W, build: &str, namespace: &str) -> crate::Result<()>
where
    L: BuildLogs + ?Sized,
    W: AsyncWrite + Send + Unpin,
{
    debug!(%build, %namespace, "streaming build logs");
    logs.tail(out, build, namespace).await.map_err(Error::LogStream)
}

/// Turn build events into discovered names and a failure signal
///
/// Ends at the first failed build, when the coordinator goes away, or when the
/// watch closes. Dropping the senders on the way out is what tells the
/// coordinator which of these happened.
async fn watch_builds(mut watch: Watch<Build>, names: mpsc::Sender<String>, failed: oneshot::Sender<Error>) {
    let opened = Instant::now();
    while let Some(event) = watch.next().await {
        let added = event.is_added();
        let build = event.into_object();
        if added {
            debug!(build = build.name(), "discovered build");
            if names.send(build.name().to_string()).await.is_err() {
                trace!("build phase ended, watcher exiting");
                return;
            }
        }
        if let Some(condition) = build.failure() {
            warn!(build = build.name(), reason = ?condition.reason, message = %condition.message, "build failed");
            let err = Error::BuildFailed {
                build: build.name().to_string(),
                reason: condition.reason.clone(),
                message: Some(condition.message.clone()).filter(|m| !m.is_empty()),
            };
            // the coordinator may already be gone, which is fine
            let _ = failed.send(err);
            return;
        }
    }
    let open_for = opened.elapsed();
    if closed_at_server_timeout(open_for) {
        debug!(?open_for, "build watch closed at the apiserver timeout, builds added later are not seen");
    } else {
        trace!("build watch closed");
    }
}

fn closed_at_server_timeout(open_for: Duration) -> bool {
    open_for >= Duration::from_secs(WATCH_TIMEOUT_SECS.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tailer::tests::{FakeLogs, LogError};
    use futures::stream;
    use kf_core::{conditions::SUCCEEDED, Condition, ConditionStatus, WatchEvent};

    fn failed(name: &str) -> Build {
        Build::named(name).with_condition(Condition::new(SUCCEEDED, ConditionStatus::False))
    }

    async fn run_phase(events: Vec<WatchEvent<Build>>, open: bool, logs: &FakeLogs) -> (crate::Result<()>, String) {
        let watch = if open {
            Watch::spawn(stream::iter(events).chain(stream::pending()))
        } else {
            Watch::spawn(stream::iter(events))
        };
        let mut out = Vec::new();
        let res = tokio::time::timeout(Duration::from_secs(10), run(logs, &mut out, "dev", watch))
            .await
            .expect("build phase should terminate");
        (res, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn empty_watch_is_done() {
        let logs = FakeLogs::default();
        let (res, out) = run_phase(vec![], false, &logs).await;
        res.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn modified_events_do_not_start_tails() {
        let logs = FakeLogs::default();
        let (res, _) = run_phase(
            vec![
                WatchEvent::Modified(Build::named("old")),
                WatchEvent::Added(Build::named("new")),
                WatchEvent::Deleted(Build::named("new")),
            ],
            false,
            &logs,
        )
        .await;
        res.unwrap();
        assert_eq!(*logs.tailed.lock().unwrap(), vec!["new"]);
    }

    #[tokio::test]
    async fn failure_on_an_open_watch_ends_the_phase() {
        let logs = FakeLogs::default();
        let (res, _) = run_phase(vec![WatchEvent::Modified(failed("b1"))], true, &logs).await;
        assert!(matches!(res.unwrap_err(), Error::BuildFailed { build, message: None, .. } if build == "b1"));
        assert!(logs.tailed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn first_failure_wins() {
        let logs = FakeLogs::default();
        let (res, _) = run_phase(
            vec![WatchEvent::Modified(failed("b1")), WatchEvent::Modified(failed("b2"))],
            false,
            &logs,
        )
        .await;
        assert!(matches!(res.unwrap_err(), Error::BuildFailed { build, .. } if build == "b1"));
    }

    #[tokio::test]
    async fn added_failed_build_is_tailed_or_reported() {
        // the name and the failure race, either outcome ends in a failure
        let logs = FakeLogs::default();
        let (res, _) = run_phase(vec![WatchEvent::Added(failed("b1"))], true, &logs).await;
        assert!(matches!(res.unwrap_err(), Error::BuildFailed { .. }));
        assert!(logs.tailed.lock().unwrap().len() <= 1);
    }

    #[tokio::test]
    async fn log_error_stops_later_builds() {
        let logs = FakeLogs {
            fail_with: Some("boom"),
            ..FakeLogs::default()
        };
        let (res, _) = run_phase(
            vec![WatchEvent::Added(Build::named("b1")), WatchEvent::Added(Build::named("b2"))],
            false,
            &logs,
        )
        .await;
        match res.unwrap_err() {
            Error::LogStream(err) => assert_eq!(err.downcast_ref::<LogError>().unwrap().0, "boom"),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(*logs.tailed.lock().unwrap(), vec!["b1"]);
    }

    #[tokio::test]
    async fn watcher_exits_once_the_coordinator_is_gone() {
        let (names_tx, names_rx) = mpsc::channel(1);
        let (failed_tx, _failed_rx) = oneshot::channel();
        drop(names_rx);
        let watch = Watch::spawn(
            stream::iter(vec![WatchEvent::Added(Build::named("b1"))]).chain(stream::pending()),
        );
        let handle = tokio::spawn(watch_builds(watch, names_tx, failed_tx));
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("watcher should exit")
            .unwrap();
    }

    #[test]
    fn server_timeout_is_told_apart_from_an_early_close() {
        assert!(!closed_at_server_timeout(Duration::from_secs(3)));
        assert!(closed_at_server_timeout(Duration::from_secs(290)));
        assert!(closed_at_server_timeout(Duration::from_secs(291)));
    }
}
