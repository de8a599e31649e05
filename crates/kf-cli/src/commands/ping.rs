//! Ping command implementation

use anyhow::Result;

use crate::client::ApiClient;
use crate::output::{print_error, print_success, print_warning};

/// Execute the ping command
pub async fn ping_command(client: &ApiClient) -> Result<()> {
    let ping = match client.ping().await {
        Ok(p) => p,
        Err(e) => {
            print_error(&format!("Failed to reach orchestrator: {}", e));
            print_error(&format!(
                "Is kf-orchestrator running at {}?",
                client.base_url()
            ));
            return Err(e.into());
        }
    };

    if ping.terraform_available {
        print_success(&ping.message);
    } else {
        print_warning(&ping.message);
    }
    Ok(())
}
