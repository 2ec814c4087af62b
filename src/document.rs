//! MongoDB connection tool
//!
//! Documents cross the API as JSON maps. `_id` values come back as strings
//! (ObjectIds as hex); a `{"$oid": "<hex>"}` value in a filter or document is
//! turned back into an ObjectId.

use crate::error::{DbToolError, Result};
use crate::settings::EnvSettings;
use crate::tool::ConnectionTool;
use crate::types::{FindOptions, Row};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, Bson, Document, doc};
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use serde_json::Value;
use std::time::Duration;

/// Convert a JSON map into a BSON document
pub fn json_to_document(row: &Row) -> Result<Document> {
    let document = bson::to_document(row)?;
    Ok(restore_object_ids(document))
}

fn restore_object_ids(document: Document) -> Document {
    document
        .into_iter()
        .map(|(k, v)| (k, restore_bson(v)))
        .collect()
}

fn restore_bson(value: Bson) -> Bson {
    match value {
        Bson::Document(d) => {
            if d.len() == 1
                && let Ok(hex) = d.get_str("$oid")
                && let Ok(oid) = ObjectId::parse_str(hex)
            {
                return Bson::ObjectId(oid);
            }
            Bson::Document(restore_object_ids(d))
        }
        Bson::Array(items) => Bson::Array(items.into_iter().map(restore_bson).collect()),
        other => other,
    }
}

/// String form of a document identifier (ObjectId as 24-char hex)
pub fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Convert a BSON document into a JSON map, stringifying `_id`
pub fn document_to_row(mut document: Document) -> Result<Row> {
    if let Some(id) = document.get("_id") {
        let id = id_to_string(id);
        document.insert("_id", id);
    }

    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => Ok(map),
        other => Err(DbToolError::Bson(format!(
            "expected a document, got {}",
            other
        ))),
    }
}

/// Sort specification for `find`, `None` when no sort keys are given
pub fn sort_document(options: &FindOptions) -> Option<Document> {
    if options.sort.is_empty() {
        return None;
    }
    let mut sort = Document::new();
    for (field, direction) in &options.sort {
        sort.insert(field.clone(), direction.as_i32());
    }
    Some(sort)
}

/// `{"$set": update}` modifier used by `update_many`
pub fn set_document(update: &Row) -> Result<Document> {
    Ok(doc! { "$set": json_to_document(update)? })
}

/// Connection tool for MongoDB
///
/// Reads `DB__<NAME>__URI` and `DB__<NAME>__DB` on connect. Optional
/// `DB__<NAME>__TIMEOUT_MS` bounds connect and server selection.
pub struct MongoTool {
    name: String,
    settings: EnvSettings,
    client: Option<Client>,
    db: Option<Database>,
}

impl MongoTool {
    pub fn new(name: impl Into<String>, settings: EnvSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            client: None,
            db: None,
        }
    }

    /// The selected database handle
    ///
    /// Pass this to code that needs the driver directly instead of keeping a
    /// process-wide client.
    pub fn database(&self) -> Result<&Database> {
        self.db
            .as_ref()
            .ok_or_else(|| DbToolError::NotConnected(self.name.clone()))
    }

    /// Insert one document; returns its `_id` as a string
    pub async fn insert_one(&self, collection: &str, document: &Row) -> Result<String> {
        let db = self.database()?;
        log::debug!("[{}] insert_one into {}", self.name, collection);

        let result = db
            .collection::<Document>(collection)
            .insert_one(json_to_document(document)?)
            .await?;

        Ok(id_to_string(&result.inserted_id))
    }

    /// Find documents matching `options.filter` (all documents when `None`)
    pub async fn find(&self, collection: &str, options: FindOptions) -> Result<Vec<Row>> {
        let db = self.database()?;
        log::debug!("[{}] find in {}", self.name, collection);

        let filter = match &options.filter {
            Some(f) => json_to_document(f)?,
            None => Document::new(),
        };

        let coll = db.collection::<Document>(collection);
        let mut action = coll.find(filter);

        if let Some(projection) = &options.projection {
            action = action.projection(json_to_document(projection)?);
        }

        if let Some(sort) = sort_document(&options) {
            action = action.sort(sort);
        }

        if let Some(limit) = options.limit {
            action = action.limit(limit);
        }

        let mut cursor = action.await?;
        let mut rows = Vec::new();
        while cursor.advance().await? {
            let document: Document = cursor.deserialize_current()?;
            rows.push(document_to_row(document)?);
        }

        Ok(rows)
    }

    /// `$set` the fields of `update` on every matching document; returns modified count
    pub async fn update_many(&self, collection: &str, filter: &Row, update: &Row) -> Result<u64> {
        let db = self.database()?;
        log::debug!("[{}] update_many in {}", self.name, collection);

        let result = db
            .collection::<Document>(collection)
            .update_many(json_to_document(filter)?, set_document(update)?)
            .await?;

        Ok(result.modified_count)
    }

    /// Delete every matching document; returns deleted count
    pub async fn delete_many(&self, collection: &str, filter: &Row) -> Result<u64> {
        let db = self.database()?;
        log::debug!("[{}] delete_many in {}", self.name, collection);

        let result = db
            .collection::<Document>(collection)
            .delete_many(json_to_document(filter)?)
            .await?;

        Ok(result.deleted_count)
    }

    /// Run the `ping` command against the selected database
    pub async fn ping(&self) -> Result<()> {
        let db = self.database()?;
        db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

#[async_trait]
impl ConnectionTool for MongoTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_connected(&self) -> bool {
        self.db.is_some()
    }

    async fn connect(&mut self) -> Result<()> {
        if self.db.is_some() {
            log::debug!("{} already connected", self.name);
            return Ok(());
        }

        let uri = self.settings.require(&self.name, "URI")?;
        let db_name = self.settings.require(&self.name, "DB")?;
        let timeout = self.settings.get_parsed::<u64>(&self.name, "TIMEOUT_MS")?;

        let mut options = ClientOptions::parse(uri.as_str()).await?;
        if let Some(ms) = timeout {
            options.connect_timeout = Some(Duration::from_millis(ms));
            options.server_selection_timeout = Some(Duration::from_millis(ms));
        }

        let client = Client::with_options(options)?;
        let db = client.database(&db_name);

        log::info!("✓ {} connected (MongoDB database {})", self.name, db_name);

        self.client = Some(client);
        self.db = Some(db);
        Ok(())
    }

    async fn close(&mut self) {
        self.db = None;
        if let Some(client) = self.client.take() {
            client.shutdown().await;
            log::info!("{} closed", self.name);
        }
    }
}
