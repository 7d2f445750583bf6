//! Subcommands of kf
use anyhow::Result;
use kf_client::KubeFactory;

mod bindings;
mod logs;

pub use bindings::{BindService, ListBindingsCmd, UnbindService};
pub use logs::Logs;

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Bind a service instance to an app
    #[command(visible_alias = "bs")]
    BindService(BindService),
    /// List service bindings
    Bindings(ListBindingsCmd),
    /// Unbind a service instance from an app
    #[command(visible_alias = "us")]
    UnbindService(UnbindService),
    /// Follow the build and deploy logs of a release
    Logs(Logs),
}

impl Command {
    pub async fn run(&self, factory: &KubeFactory, namespace: Option<&str>) -> Result<()> {
        let mut stdout = std::io::stdout();
        match self {
            Command::BindService(cmd) => cmd.run(&factory.connect().await?, namespace, &mut stdout).await,
            Command::Bindings(cmd) => cmd.run(&factory.connect().await?, namespace, &mut stdout).await,
            Command::UnbindService(cmd) => cmd.run(&factory.connect().await?, namespace, &mut stdout).await,
            Command::Logs(cmd) => cmd.run(factory, namespace).await,
        }
    }
}
