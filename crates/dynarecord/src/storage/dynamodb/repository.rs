//! DynamoDB repository implementation.
//!
//! Implements `ItemRepository` from `dynarecord_core::storage` using DynamoDB.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{
    AttributeAction as DynamoAction, AttributeValueUpdate, KeysAndAttributes, PutRequest,
    WriteRequest,
};
use aws_sdk_dynamodb::Client;

use dynarecord_core::model::Key;
use dynarecord_core::storage::{
    AttributeAction, AttributeUpdate, BatchWriteOutput, Item, ItemRepository, Result,
    MAX_BATCH_GET_KEYS, MAX_BATCH_WRITE_ITEMS,
};

use super::client::{create_client, AwsConfig};
use super::conversions::{attributes_to_item, item_to_attributes, key_to_attributes, to_attribute};
use super::error::{
    map_batch_get_item_error, map_batch_write_item_error, map_build_error, map_delete_item_error,
    map_get_item_error, map_update_item_error,
};

/// DynamoDB-based repository implementation.
///
/// Table names are passed per request, so one repository serves every model.
#[derive(Debug, Clone)]
pub struct DynamoDbRepository {
    client: Client,
}

impl DynamoDbRepository {
    /// Creates a new repository with the given DynamoDB client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a new repository for the given AWS configuration.
    pub async fn with_config(config: &AwsConfig) -> Self {
        tracing::debug!(endpoint = %config.target_display(), "Creating DynamoDB client");
        Self::new(create_client(config).await)
    }

    /// Creates a new repository from environment configuration.
    ///
    /// Reads `AWS_ENDPOINT_URL` and `AWS_REGION` (defaults to "us-east-1")
    /// and uses the AWS SDK default credential chain.
    pub async fn from_env() -> Self {
        Self::with_config(&AwsConfig::default()).await
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn attribute_update(update: &AttributeUpdate) -> Result<AttributeValueUpdate> {
    let builder = match &update.action {
        AttributeAction::Put(value) => AttributeValueUpdate::builder()
            .action(DynamoAction::Put)
            .value(to_attribute(value)?),
        AttributeAction::Delete => AttributeValueUpdate::builder().action(DynamoAction::Delete),
    };
    Ok(builder.build())
}

fn put_request(item: &Item) -> Result<WriteRequest> {
    let put = PutRequest::builder()
        .set_item(Some(item_to_attributes(item)?))
        .build()
        .map_err(map_build_error)?;
    Ok(WriteRequest::builder().put_request(put).build())
}

#[async_trait]
impl ItemRepository for DynamoDbRepository {
    async fn get_item(&self, table: &str, key: &Key) -> Result<Option<Item>> {
        let result = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(key_to_attributes(key)?))
            .send()
            .await
            .map_err(|e| map_get_item_error(e, table))?;

        match result.item {
            Some(item) => Ok(Some(attributes_to_item(&item)?)),
            None => Ok(None),
        }
    }

    async fn update_item(
        &self,
        table: &str,
        key: &Key,
        updates: &[AttributeUpdate],
    ) -> Result<()> {
        let mut request = self
            .client
            .update_item()
            .table_name(table)
            .set_key(Some(key_to_attributes(key)?));

        for update in updates {
            request = request.attribute_updates(update.name.clone(), attribute_update(update)?);
        }

        request
            .send()
            .await
            .map_err(|e| map_update_item_error(e, table))?;

        Ok(())
    }

    async fn delete_item(&self, table: &str, key: &Key) -> Result<()> {
        self.client
            .delete_item()
            .table_name(table)
            .set_key(Some(key_to_attributes(key)?))
            .send()
            .await
            .map_err(|e| map_delete_item_error(e, table))?;

        Ok(())
    }

    async fn batch_get_item(&self, table: &str, keys: &[Key]) -> Result<Vec<Item>> {
        let mut items = Vec::with_capacity(keys.len());

        for chunk in keys.chunks(MAX_BATCH_GET_KEYS) {
            let key_maps = chunk
                .iter()
                .map(key_to_attributes)
                .collect::<Result<Vec<_>>>()?;
            let request_keys = KeysAndAttributes::builder()
                .set_keys(Some(key_maps))
                .build()
                .map_err(map_build_error)?;

            let result = self
                .client
                .batch_get_item()
                .request_items(table, request_keys)
                .send()
                .await
                .map_err(|e| map_batch_get_item_error(e, table))?;

            let unprocessed = result
                .unprocessed_keys
                .as_ref()
                .and_then(|pending| pending.get(table))
                .map_or(0, |pending| pending.keys().len());
            if unprocessed > 0 {
                tracing::warn!(table, unprocessed, "BatchGetItem returned unprocessed keys");
            }

            let found = result
                .responses
                .and_then(|mut responses| responses.remove(table))
                .unwrap_or_default();
            for item in &found {
                items.push(attributes_to_item(item)?);
            }
        }

        Ok(items)
    }

    /// Sends one `BatchWriteItem` per 25 items. DynamoDB rejects an empty
    /// request, so no items means no call and a default output.
    async fn batch_write_item(&self, table: &str, items: &[Item]) -> Result<BatchWriteOutput> {
        let mut output = BatchWriteOutput::default();

        // Use batch write for efficiency (25 items per batch max)
        for chunk in items.chunks(MAX_BATCH_WRITE_ITEMS) {
            let write_requests = chunk.iter().map(put_request).collect::<Result<Vec<_>>>()?;

            let result = self
                .client
                .batch_write_item()
                .request_items(table, write_requests)
                .send()
                .await
                .map_err(|e| map_batch_write_item_error(e, table))?;

            let unprocessed = result
                .unprocessed_items
                .and_then(|mut pending| pending.remove(table))
                .unwrap_or_default()
                .iter()
                .filter_map(|request| request.put_request())
                .map(|put| attributes_to_item(put.item()))
                .collect::<Result<Vec<_>>>()?;

            if !unprocessed.is_empty() {
                tracing::warn!(
                    table,
                    unprocessed = unprocessed.len(),
                    "BatchWriteItem returned unprocessed items"
                );
            }

            output.written += chunk.len() - unprocessed.len();
            output.unprocessed.extend(unprocessed);
        }

        Ok(output)
    }
}
