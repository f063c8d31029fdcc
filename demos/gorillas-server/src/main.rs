use gorillas::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// Takes the token as the username. For local play only: anyone can
/// claim any name.
struct DevAuthenticator;

impl Authenticator for DevAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<String, AuthError> {
        let username = token.trim();
        if username.is_empty() {
            return Err(AuthError::Rejected("token must not be empty".into()));
        }
        Ok(username.to_string())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr =
        std::env::var("GORILLAS_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    tracing::info!(%addr, "starting gorillas server");

    let server = GorillasServerBuilder::new()
        .bind(&addr)
        .match_config(MatchConfig::default())
        .build(DevAuthenticator)
        .await?;

    server.run().await?;
    Ok(())
}
