//! The deploy phase: report service conditions until the watch closes
use super::Error;
use futures::StreamExt;
use kf_client::Watch;
use kf_core::{Service, ServiceExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Prefix of every deploy progress line
pub const DEPLOY_PREFIX: &str = "[deploy-revision]";

/// Write every condition message of every service event to `out`
///
/// There is no completion signal for a deploy; this returns when the watch closes.
/// Whether the deploy succeeded has to be read from the messages.
pub(super) async fn run<W>(out: &mut W, mut watch: Watch<Service>) -> crate::Result<()>
where
    W: AsyncWrite + Send + Unpin,
{
    while let Some(event) = watch.next().await {
        for message in event.object().messages() {
            let line = format!("{DEPLOY_PREFIX} {message}\n");
            out.write_all(line.as_bytes()).await.map_err(Error::Write)?;
        }
        out.flush().await.map_err(Error::Write)?;
    }
    debug!("service watch closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use kf_core::{Condition, ConditionStatus, ObjectExt, WatchEvent};

    #[tokio::test]
    async fn writes_messages_of_all_events() {
        let watch = Watch::spawn(stream::iter(vec![
            WatchEvent::Added(
                Service::named("myapp").with_condition(Condition::new("Ready", ConditionStatus::Unknown)),
            ),
            WatchEvent::Modified(
                Service::named("myapp")
                    .with_condition(Condition::new("ConfigurationsReady", ConditionStatus::Unknown).message("a"))
                    .with_condition(Condition::new("Ready", ConditionStatus::Unknown).message("b")),
            ),
            WatchEvent::Deleted(
                Service::named("myapp").with_condition(Condition::new("Ready", ConditionStatus::False).message("c")),
            ),
        ]));
        let mut out = Vec::new();
        run(&mut out, watch).await.unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[deploy-revision] a\n[deploy-revision] b\n[deploy-revision] c\n"
        );
    }

    #[tokio::test]
    async fn closed_watch_without_events_is_fine() {
        let mut out = Vec::new();
        run(&mut out, Watch::spawn(stream::iter(Vec::<WatchEvent<Service>>::new())))
            .await
            .unwrap();
        assert!(out.is_empty());
    }
}
