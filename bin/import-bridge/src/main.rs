use anyhow::Result;
use bridge_core::{EndpointRegistry, LocalServiceRegistry, ModuleRegistry};
use bridge_jsonrpc::HttpSessionFactory;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod discovery;

use discovery::{dispatch, BridgeFile, EndpointSnapshot};

/// Environment variable naming the bridge file when no argument is given
const ENV_BRIDGE_FILE: &str = "IMPORT_BRIDGE_FILE";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting import-bridge...");

    let path: PathBuf = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(ENV_BRIDGE_FILE).ok())
        .unwrap_or_else(|| "import-bridge.yaml".to_string())
        .into();

    let file = BridgeFile::load(&path)?;
    let config = file.config.clone().with_env_overrides();
    let poll_interval = file.poll_interval();
    info!(
        "Loaded {} ({} modules, supported configurations: {:?})",
        path.display(),
        file.modules.len(),
        config.supported_configs
    );

    let modules = Arc::new(ModuleRegistry::from_modules(file.modules));
    let services = Arc::new(LocalServiceRegistry::new());
    let sessions = Arc::new(HttpSessionFactory::new(config.call_timeout())?);
    let registry = Arc::new(EndpointRegistry::new(
        config,
        modules.clone(),
        sessions,
        services.clone(),
    ));
    info!("Endpoint registry initialized");

    let mut snapshot = EndpointSnapshot::default();
    let mut pending = Some(file.endpoints);
    let mut ticker = tokio::time::interval(poll_interval);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    // Periodic discovery loop
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let (endpoints, modules_changed) = match pending.take() {
                    Some(endpoints) => (endpoints, false),
                    None => match BridgeFile::load(&path) {
                        Ok(file) => {
                            let changed = modules.replace_all(file.modules);
                            (file.endpoints, changed)
                        }
                        Err(e) => {
                            error!("Error reloading {}: {:#}", path.display(), e);
                            continue;
                        }
                    },
                };

                let next = EndpointSnapshot::new(endpoints);
                let mut events = snapshot.diff(&next);
                if modules_changed {
                    let retries = snapshot.retries(&next, &registry.imported_uids().await);
                    info!(
                        "Module set changed ({} module(s)), retrying {} endpoint(s)",
                        modules.module_count(),
                        retries.len()
                    );
                    events.extend(retries);
                }

                if !events.is_empty() {
                    debug!("Dispatching {} endpoint event(s)", events.len());
                    dispatch(&*registry, &events).await;
                    info!(
                        "{} endpoint(s) described, {} imported, {} service(s) published",
                        next.len(),
                        registry.imported_count().await,
                        services.service_count().await
                    );
                }
                snapshot = next;
            }
            result = &mut shutdown => {
                if let Err(e) = result {
                    error!("Error waiting for shutdown signal: {}", e);
                }
                break;
            }
        }
    }

    info!("Shutting down import-bridge...");
    registry.shutdown().await;
    Ok(())
}
