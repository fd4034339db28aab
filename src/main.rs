use hemmer_provider_nodeping::{init_logging, serve, NodePingProvider};
use tracing::error;

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = serve(NodePingProvider::new(env!("CARGO_PKG_VERSION"))).await {
        error!(error = %e, "Provider exited with error");
        std::process::exit(1);
    }
}
