//! Columnar vector store backed by LanceDB.
//!
//! Warehouse-style semantics: bulk add is a single batched Arrow write,
//! "delete" is one filtered removal statement, and row ids are assigned by
//! the adapter when the caller supplies none (ids are advisory here).
//!
//! # Schema
//!
//! | Column | Type | Purpose |
//! |--------|------|---------|
//! | `id` | Utf8 | Row id (advisory, assigned when blank) |
//! | `user_id` | Utf8 | Owner scope |
//! | `document_id` | Utf8 | Source document identity |
//! | `link_id` | Utf8 (nullable) | Library link identity |
//! | `variant` | Utf8 | Resolved variant identity |
//! | `title` | Utf8 (nullable) | Title snapshot |
//! | `text` | Utf8 | Embedded text (stored, not searched) |
//! | `vector` | FixedSizeList<Float32> | Embedding vector |
//!
//! # Feature Gate
//!
//! This module requires the `vector-lancedb` feature.

use std::sync::Arc;

use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use vellum_core::{Error, Result};

use crate::store::VectorStore;
use crate::types::{
    BACKEND_COLUMNAR, EmbeddedRecord, IndexRecord, MetadataFilter, RecordMetadata, SearchHit,
};

/// LanceDB-backed columnar vector store.
pub struct LancedbStore {
    connection: lancedb::Connection,
    table_name: String,
}

impl LancedbStore {
    /// Connect to (or create) a LanceDB database directory.
    ///
    /// The table itself is created lazily on the first add, since its
    /// vector column width comes from the first batch.
    pub async fn connect(db_path: &str, table_name: &str) -> Result<Self> {
        let connection = lancedb::connect(db_path)
            .execute()
            .await
            .map_err(|e| Error::backend(format!("failed to connect to LanceDB: {e}")))?;

        Ok(Self {
            connection,
            table_name: table_name.to_string(),
        })
    }

    /// Open the vector table, or `None` if it has not been created yet.
    async fn open_table(&self) -> Result<Option<lancedb::Table>> {
        match self.connection.open_table(&self.table_name).execute().await {
            Ok(table) => Ok(Some(table)),
            Err(lancedb::Error::TableNotFound { .. }) => Ok(None),
            Err(e) => Err(Error::backend(format!("failed to open table: {e}"))),
        }
    }
}

#[async_trait]
impl VectorStore for LancedbStore {
    async fn add(&self, records: Vec<EmbeddedRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let dimension = records[0].dimension() as i32;
        let batch = build_record_batch(&records, dimension)?;
        let schema = batch.schema();
        let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);

        match self.open_table().await? {
            Some(table) => {
                table
                    .add(Box::new(batches))
                    .execute()
                    .await
                    .map_err(|e| Error::backend(format!("batched add failed: {e}")))?;
            }
            None => {
                self.connection
                    .create_table(&self.table_name, Box::new(batches))
                    .execute()
                    .await
                    .map_err(|e| Error::backend(format!("failed to create table: {e}")))?;
            }
        }
        Ok(())
    }

    async fn delete_where(&self, filter: &MetadataFilter) -> Result<()> {
        let predicate = filter_predicate(filter)
            .ok_or_else(|| Error::invalid_data("refusing delete with empty filter"))?;

        // No table yet means nothing to delete.
        let Some(table) = self.open_table().await? else {
            return Ok(());
        };

        table
            .delete(&predicate)
            .await
            .map_err(|e| Error::backend(format!("filtered delete failed: {e}")))
    }

    async fn similarity_search(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        let Some(table) = self.open_table().await? else {
            return Ok(Vec::new());
        };

        let results = table
            .vector_search(vector.to_vec())
            .map_err(|e| Error::backend(format!("failed to create vector search: {e}")))?
            .limit(k)
            .execute()
            .await
            .map_err(|e| Error::backend(format!("vector search failed: {e}")))?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(|e| Error::backend(format!("failed to collect results: {e}")))?;

        let mut hits = Vec::new();
        for batch in &batches {
            hits.extend(parse_search_results(batch)?);
        }

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        Ok(hits)
    }

    fn supplies_ids(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        BACKEND_COLUMNAR
    }

    async fn count(&self) -> Result<usize> {
        let Some(table) = self.open_table().await? else {
            return Ok(0);
        };
        table
            .count_rows(None)
            .await
            .map_err(|e| Error::backend(format!("count failed: {e}")))
    }
}

impl std::fmt::Debug for LancedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LancedbStore")
            .field("table", &self.table_name)
            .finish()
    }
}

// ============================================================================
// Predicate construction
// ============================================================================

/// Build the SQL delete predicate for a metadata filter.
///
/// Returns `None` for an empty filter; callers must treat that as an error
/// rather than an unfiltered delete.
fn filter_predicate(filter: &MetadataFilter) -> Option<String> {
    let mut clauses = Vec::new();
    if let Some(ref user_id) = filter.user_id {
        clauses.push(format!("user_id = '{}'", escape(user_id)));
    }
    if let Some(ref document_id) = filter.document_id {
        clauses.push(format!("document_id = '{}'", escape(document_id)));
    }
    if let Some(ref variant) = filter.variant {
        clauses.push(format!("variant = '{}'", escape(variant)));
    }

    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" AND "))
    }
}

fn escape(value: &str) -> String {
    value.replace('\'', "''")
}

// ============================================================================
// Arrow schema and batch construction
// ============================================================================

/// Create the Arrow schema for the vector table.
fn make_schema(dimension: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("user_id", DataType::Utf8, false),
        Field::new("document_id", DataType::Utf8, false),
        Field::new("link_id", DataType::Utf8, true),
        Field::new("variant", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, true),
        Field::new("text", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                dimension,
            ),
            false,
        ),
    ]))
}

/// Build an Arrow RecordBatch from embedded records.
///
/// Records arriving without an id (the engine strips advisory ids for this
/// backend) get a fresh uuid as their row id.
fn build_record_batch(records: &[EmbeddedRecord], dimension: i32) -> Result<RecordBatch> {
    let schema = make_schema(dimension);

    let ids: Vec<String> = records
        .iter()
        .map(|r| {
            if r.record.id.trim().is_empty() {
                uuid::Uuid::new_v4().to_string()
            } else {
                r.record.id.clone()
            }
        })
        .collect();
    let user_ids: Vec<&str> = records
        .iter()
        .map(|r| r.record.metadata.user_id.as_str())
        .collect();
    let document_ids: Vec<&str> = records
        .iter()
        .map(|r| r.record.metadata.document_id.as_str())
        .collect();
    let link_ids: Vec<Option<&str>> = records
        .iter()
        .map(|r| r.record.metadata.link_id.as_deref())
        .collect();
    let variants: Vec<&str> = records
        .iter()
        .map(|r| r.record.metadata.variant.as_str())
        .collect();
    let titles: Vec<Option<&str>> = records
        .iter()
        .map(|r| r.record.metadata.title.as_deref())
        .collect();
    let texts: Vec<&str> = records.iter().map(|r| r.record.text.as_str()).collect();

    let all_values: Vec<f32> = records
        .iter()
        .flat_map(|r| r.vector.iter().copied())
        .collect();

    let values_array = Float32Array::from(all_values);
    let vector_array = FixedSizeListArray::try_new(
        Arc::new(Field::new("item", DataType::Float32, true)),
        dimension,
        Arc::new(values_array),
        None,
    )
    .map_err(|e| Error::backend(format!("failed to create vector array: {e}")))?;

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(user_ids)),
            Arc::new(StringArray::from(document_ids)),
            Arc::new(StringArray::from(link_ids)),
            Arc::new(StringArray::from(variants)),
            Arc::new(StringArray::from(titles)),
            Arc::new(StringArray::from(texts)),
            Arc::new(vector_array),
        ],
    )
    .map_err(|e| Error::backend(format!("failed to create RecordBatch: {e}")))
}

/// Parse search hits out of a result RecordBatch.
fn parse_search_results(batch: &RecordBatch) -> Result<Vec<SearchHit>> {
    let id_col = string_column(batch, "id")?;
    let user_col = string_column(batch, "user_id")?;
    let document_col = string_column(batch, "document_id")?;
    let link_col = string_column(batch, "link_id")?;
    let variant_col = string_column(batch, "variant")?;
    let title_col = string_column(batch, "title")?;
    let text_col = string_column(batch, "text")?;

    let distance_col = batch
        .column_by_name("_distance")
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

    let mut hits = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let metadata = RecordMetadata {
            user_id: user_col.value(i).to_string(),
            document_id: document_col.value(i).to_string(),
            link_id: optional_value(link_col, i),
            variant: variant_col.value(i).to_string(),
            title: optional_value(title_col, i),
        };

        let distance = distance_col.map(|c| c.value(i)).unwrap_or(0.0);
        // Distance-to-score normalization: 1/(1 + distance).
        let score = 1.0 / (1.0 + distance);

        hits.push(SearchHit {
            record: IndexRecord::new(id_col.value(i), text_col.value(i), metadata),
            score,
        });
    }

    Ok(hits)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::backend(format!("missing '{name}' column in results")))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| Error::backend(format!("'{name}' column is not StringArray")))
}

fn optional_value(col: &StringArray, row: usize) -> Option<String> {
    if col.is_null(row) {
        None
    } else {
        Some(col.value(row).to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
