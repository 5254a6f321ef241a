// Syncrypt Desktop - Daemon API Probe

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

/// Outcome of a single request against the daemon's local API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiProbe {
    pub reachable: bool,
    /// HTTP status when the daemon answered
    pub status: Option<u16>,
}

/// Check the API once. Any HTTP answer counts as reachable, since most
/// endpoints reject requests without the token.
pub async fn probe_api(url: &str) -> ApiProbe {
    let unreachable = ApiProbe {
        reachable: false,
        status: None,
    };
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            debug!("Cannot build HTTP client: {}", e);
            return unreachable;
        }
    };

    match client.get(url).send().await {
        Ok(resp) => ApiProbe {
            reachable: true,
            status: Some(resp.status().as_u16()),
        },
        Err(e) => {
            debug!("Daemon API not reachable at {}: {}", url, e);
            unreachable
        }
    }
}
