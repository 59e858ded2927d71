//! CRUD client for the `/options` resource

use super::ApiClient;
use opsdash_core::OpsdashResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single record from the `/options` resource
///
/// The resource is schema-light on the server side; everything beyond the id
/// is carried through as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionRecord {
    pub id: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// `/options` API surface, borrowed from an [`ApiClient`]
pub struct OptionsApi<'c> {
    client: &'c ApiClient,
}

impl ApiClient {
    /// Access the `/options` CRUD surface
    pub fn options(&self) -> OptionsApi<'_> {
        OptionsApi { client: self }
    }
}

impl OptionsApi<'_> {
    /// List every option visible to the current session
    pub async fn list(&self) -> OpsdashResult<Vec<OptionRecord>> {
        self.client.get("/options").await
    }

    /// Fetch a single option by id
    pub async fn get(&self, id: i64) -> OpsdashResult<OptionRecord> {
        self.client.get(&format!("/options/{}", id)).await
    }

    /// Create an option
    pub async fn create<B>(&self, data: &B) -> OpsdashResult<OptionRecord>
    where
        B: Serialize + ?Sized,
    {
        self.client.post("/options", data).await
    }

    /// Update an option
    ///
    /// The record id travels in the body, matching the endpoint's contract.
    pub async fn update<B>(&self, data: &B) -> OpsdashResult<OptionRecord>
    where
        B: Serialize + ?Sized,
    {
        self.client.patch("/options", data).await
    }

    /// Delete an option by id
    pub async fn delete(&self, id: i64) -> OpsdashResult<()> {
        self.client.delete(&format!("/options/{}", id)).await?;
        Ok(())
    }
}
