//! kf: bind services to apps and follow their releases
//!
//! kf bind-service | bindings | unbind-service | logs
//! with kubeconfig context, cluster, user and namespace selection.
use anyhow::Result;
use clap::Parser;
use kf_client::KubeFactory;
use kube::config::KubeConfigOptions;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::Command;

#[derive(Parser, Debug)]
#[command(name = "kf", version, about = "Operator CLI for app deployments")]
struct App {
    /// Namespace to work in, the kubeconfig default if unset
    #[arg(long, short, global = true, env = "KF_NAMESPACE")]
    namespace: Option<String>,
    /// Kubeconfig context to use
    #[arg(long, global = true)]
    context: Option<String>,
    /// Kubeconfig cluster to use
    #[arg(long, global = true)]
    cluster: Option<String>,
    /// Kubeconfig user to use
    #[arg(long, global = true)]
    user: Option<String>,
    #[command(subcommand)]
    command: Command,
}

impl App {
    fn kubeconfig_options(&self) -> KubeConfigOptions {
        KubeConfigOptions {
            context: self.context.clone(),
            cluster: self.cluster.clone(),
            user: self.user.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let app = App::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let factory = KubeFactory::new(app.kubeconfig_options());
    tracing::debug!(command = ?app.command, namespace = ?app.namespace, "running command");
    app.command.run(&factory, app.namespace.as_deref()).await
}
