//! bind-service, bindings and unbind-service
use crate::output;
use anyhow::{Context, Result};
use kf_client::{
    api::{CreateBinding, DeleteBinding, ListBindings},
    BindingClient,
};
use kf_core::ObjectExt;
use std::io::Write;
use tracing::info;

#[derive(clap::Args, Debug)]
#[command(after_help = "EXAMPLES:\n  \
    kf bind-service myapp mydb -c '{\"permissions\":\"read-only\"}'\n  \
    kf bind-service myapp mydb -c ~/workspace/tmp/instance_config.json\n  \
    kf bind-service myapp mydb --binding-name db")]
pub struct BindService {
    /// Name of the app
    app_name: String,
    /// Name of the service instance
    service_instance: String,
    /// JSON object of service specific configuration, inline or the path of a file
    #[arg(short = 'c', long = "config", default_value = "{}")]
    config: String,
    /// Name to expose the service instance to the app with, the instance name if unset
    #[arg(short = 'b', long)]
    binding_name: Option<String>,
}

impl BindService {
    pub async fn run<C>(&self, client: &C, namespace: Option<&str>, out: &mut impl Write) -> Result<()>
    where
        C: BindingClient + ?Sized,
    {
        let params = kf_core::parse_json_or_file(&self.config).context("invalid --config")?;
        let binding_name = self.binding_name.as_deref().unwrap_or(&self.service_instance);
        let mut opts = CreateBinding::default().binding_name(binding_name).params(params);
        if let Some(ns) = namespace {
            opts = opts.namespace(ns);
        }
        let binding = client.create(&self.service_instance, &self.app_name, &opts).await?;
        info!(binding = binding.name(), app = %self.app_name, instance = %self.service_instance, "bound service");
        output::binding_details(out, &binding)?;
        Ok(())
    }
}

#[derive(clap::Args, Debug)]
pub struct ListBindingsCmd {
    /// Only bindings of this app
    #[arg(long = "app", short = 'a')]
    app_name: Option<String>,
    /// Only bindings of this service instance
    #[arg(long = "service", short = 's')]
    service_instance: Option<String>,
}

impl ListBindingsCmd {
    pub async fn run<C>(&self, client: &C, namespace: Option<&str>, out: &mut impl Write) -> Result<()>
    where
        C: BindingClient + ?Sized,
    {
        let mut filter = ListBindings::default();
        if let Some(ns) = namespace {
            filter = filter.namespace(ns);
        }
        if let Some(app) = &self.app_name {
            filter = filter.app_name(app);
        }
        if let Some(instance) = &self.service_instance {
            filter = filter.service_instance(instance);
        }
        let bindings = client.list(&filter).await?;
        output::bindings_table(out, &bindings)?;
        Ok(())
    }
}

#[derive(clap::Args, Debug)]
#[command(after_help = "EXAMPLES:\n  kf unbind-service myapp mydb")]
pub struct UnbindService {
    /// Name of the app
    app_name: String,
    /// Name of the service instance
    service_instance: String,
}

impl UnbindService {
    pub async fn run<C>(&self, client: &C, namespace: Option<&str>, out: &mut impl Write) -> Result<()>
    where
        C: BindingClient + ?Sized,
    {
        let mut opts = DeleteBinding::default();
        if let Some(ns) = namespace {
            opts = opts.namespace(ns);
        }
        client.delete(&self.service_instance, &self.app_name, &opts).await?;
        writeln!(out, "Unbound {} from {}", self.service_instance, self.app_name)?;
        Ok(())
    }
}
