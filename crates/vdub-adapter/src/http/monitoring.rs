/*
[INPUT]:  None
[OUTPUT]: Backend health and task/worker statistics
[POS]:    HTTP layer - monitoring endpoints
[UPDATE]: When monitoring payloads change
*/

use reqwest::Method;

use crate::http::{Result, VdubClient};
use crate::types::{HealthStatus, SystemStats};

impl VdubClient {
    /// GET /monitoring/health
    pub async fn health(&self) -> Result<HealthStatus> {
        let builder = self.api_request(Method::GET, "/monitoring/health")?;
        self.send_json(builder).await
    }

    /// GET /monitoring/stats
    pub async fn stats(&self) -> Result<SystemStats> {
        let builder = self.api_request(Method::GET, "/monitoring/stats")?;
        self.send_json(builder).await
    }
}
