//! Token command implementation

use anyhow::Result;

use kf_core::ClusterKey;

use crate::client::ApiClient;
use crate::output::{format_token, print_error};

/// Execute the token command
pub async fn token_command(client: &ApiClient, key: &ClusterKey) -> Result<()> {
    match client.access_token(key).await {
        Ok(token) => {
            print!("{}", format_token(&token));
            Ok(())
        }
        Err(e) => {
            print_error(&format!("Failed to get token for {}: {}", key, e));
            Err(e.into())
        }
    }
}
