//! Typed calls to the grid topology service.
//!
//! Every endpoint has its own result type. Cell sets travel in both
//! directions in the grid binary format.

use formats::{GridSnapshot, TopologySnapshot, encode};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::{GridClient, decode_body};
use crate::error::{FetchError, TransportError};

pub const API_PREFIX: &str = "/api/topo";

/// Reply of the save endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReceipt {
    pub success: bool,
    pub message: String,
}

/// Borrowing view of a `GridClient` scoped to the topology endpoints.
#[derive(Debug, Clone, Copy)]
pub struct TopologyApi<'a> {
    client: &'a GridClient,
}

impl GridClient {
    pub fn topology(&self) -> TopologyApi<'_> {
        TopologyApi { client: self }
    }
}

impl TopologyApi<'_> {
    fn url(&self, remote: bool, name: &str) -> String {
        self.client
            .config()
            .endpoint(remote, &format!("{API_PREFIX}/{name}"))
    }

    async fn get_grids(
        &self,
        remote: bool,
        name: &str,
        query: &[(&str, &str)],
    ) -> Result<GridSnapshot, FetchError> {
        let url = self.url(remote, name);
        let body = self.client.get_bytes(&url, query).await?;
        decode_body(&url, &body)
    }

    async fn post_grids(
        &self,
        remote: bool,
        name: &str,
        grids: &GridSnapshot,
    ) -> Result<bytes::Bytes, FetchError> {
        let url = self.url(remote, name);
        let body = encode(grids)?;
        Ok(self.client.post_octets(&url, body).await?)
    }

    /// Cells currently active in the session.
    pub async fn activate_info(&self, remote: bool) -> Result<GridSnapshot, FetchError> {
        self.get_grids(remote, "activate-info", &[]).await
    }

    /// Cells deleted in the session, still recoverable.
    pub async fn deleted_info(&self, remote: bool) -> Result<GridSnapshot, FetchError> {
        self.get_grids(remote, "deleted-info", &[]).await
    }

    /// Active and deleted cells in one snapshot, active first.
    pub async fn topology_state(&self, remote: bool) -> Result<TopologySnapshot, FetchError> {
        let active = self.activate_info(remote).await?;
        let deleted = self.deleted_info(remote).await?;
        info!(
            active = active.len(),
            deleted = deleted.len(),
            "loaded topology state"
        );
        Ok(TopologySnapshot::combine(active, deleted))
    }

    /// Children replacing `grids`.
    pub async fn subdivide(
        &self,
        grids: &GridSnapshot,
        remote: bool,
    ) -> Result<GridSnapshot, FetchError> {
        let url = self.url(remote, "subdivide");
        let body = self.post_grids(remote, "subdivide", grids).await?;
        decode_body(&url, &body)
    }

    /// Parents replacing `grids`. Merged parents are never deleted.
    pub async fn merge(
        &self,
        grids: &GridSnapshot,
        remote: bool,
    ) -> Result<TopologySnapshot, FetchError> {
        let url = self.url(remote, "merge");
        let body = self.post_grids(remote, "merge", grids).await?;
        Ok(TopologySnapshot::from_active(decode_body(&url, &body)?))
    }

    pub async fn delete(&self, grids: &GridSnapshot, remote: bool) -> Result<(), FetchError> {
        self.post_grids(remote, "delete", grids).await?;
        Ok(())
    }

    pub async fn recover(&self, grids: &GridSnapshot, remote: bool) -> Result<(), FetchError> {
        self.post_grids(remote, "recover", grids).await?;
        Ok(())
    }

    /// Cells covered by the feature stored at `feature_dir`.
    pub async fn pick_by_feature(
        &self,
        feature_dir: &str,
        remote: bool,
    ) -> Result<GridSnapshot, FetchError> {
        self.get_grids(remote, "pick", &[("feature_dir", feature_dir)])
            .await
    }

    pub async fn save(&self, remote: bool) -> Result<SaveReceipt, TransportError> {
        let url = self.url(remote, "save");
        self.client.get_json(&url).await
    }
}
