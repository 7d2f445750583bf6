//! logs: follow a release from build to deploy
use anyhow::Result;
use kf_client::KubeFactory;
use kf_runtime::{LogTailer, PodLogs};
use tokio::io::AsyncWriteExt;

#[derive(clap::Args, Debug)]
#[command(after_help = "EXAMPLES:\n  kf logs 48291\n  kf logs 48291 --no-build")]
pub struct Logs {
    /// Resource version to start watching from
    pub(crate) resource_version: String,
    /// Skip the build phase and only follow the deploy
    #[arg(long)]
    pub(crate) no_build: bool,
}

impl Logs {
    pub async fn run(&self, factory: &KubeFactory, namespace: Option<&str>) -> Result<()> {
        let client = factory.connect().await?;
        let namespace = namespace.unwrap_or(client.default_namespace()).to_string();
        let tailer = LogTailer::new(
            KubeFactory::from_client(client.client().clone()),
            PodLogs::new(client.client().clone()),
        );
        let mut stdout = tokio::io::stdout();
        let res = tailer
            .tail(&mut stdout, &self.resource_version, &namespace, self.no_build)
            .await;
        stdout.flush().await?;
        Ok(res?)
    }
}
