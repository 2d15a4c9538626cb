use crate::application::ports::pending_queue::{LocationPatch, PendingCounts, PendingQueue};
use crate::domain::entities::{PendingLocationRecord, PendingPhotoRecord};
use crate::domain::value_objects::{
    CaptureTime, GeoPoint, OwnerId, RecordId, RecordState, TripId, WaitTime,
};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, SqlitePool};
use tracing::warn;

use super::connection_pool::ConnectionPool;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
struct LocationRow {
    id: String,
    owner_id: String,
    latitude: f64,
    longitude: f64,
    captured_at: String,
    wait_time_seconds: i64,
    trip_ids: Option<String>,
    created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
struct PhotoRow {
    id: String,
    owner_id: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    captured_at: String,
    image: Vec<u8>,
    trip_ids: Option<String>,
    state: String,
    created_at: i64,
}

fn parse_trip_ids(raw: Option<&str>) -> Vec<TripId> {
    raw.and_then(|json| serde_json::from_str::<Vec<String>>(json).ok())
        .unwrap_or_default()
        .iter()
        .filter_map(|value| TripId::parse(value).ok())
        .collect()
}

fn trip_ids_json(trip_ids: &[TripId]) -> Result<String, AppError> {
    let values: Vec<&str> = trip_ids.iter().map(|t| t.as_str()).collect();
    Ok(serde_json::to_string(&values)?)
}

fn parse_captured_at(raw: &str) -> Result<CaptureTime, AppError> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| AppError::Database(format!("Corrupt captured_at {raw:?}: {e}")))?;
    Ok(CaptureTime::from_stored(parsed.with_timezone(&Utc)))
}

impl LocationRow {
    fn into_record(self) -> Result<PendingLocationRecord, AppError> {
        Ok(PendingLocationRecord {
            id: RecordId::parse(&self.id).map_err(AppError::Database)?,
            owner_id: OwnerId::parse(&self.owner_id).map_err(AppError::Database)?,
            point: GeoPoint::new(self.latitude, self.longitude).map_err(AppError::Database)?,
            captured_at: parse_captured_at(&self.captured_at)?,
            wait_time: WaitTime::from_seconds(self.wait_time_seconds.max(0) as u64),
            trip_ids: parse_trip_ids(self.trip_ids.as_deref()),
            created_at: Utc
                .timestamp_opt(self.created_at, 0)
                .single()
                .unwrap_or_else(Utc::now),
        })
    }
}

impl PhotoRow {
    fn into_record(self) -> Result<PendingPhotoRecord, AppError> {
        let point = match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng).map_err(AppError::Database)?),
            _ => None,
        };
        Ok(PendingPhotoRecord {
            id: RecordId::parse(&self.id).map_err(AppError::Database)?,
            owner_id: OwnerId::parse(&self.owner_id).map_err(AppError::Database)?,
            point,
            captured_at: parse_captured_at(&self.captured_at)?,
            image: self.image,
            trip_ids: parse_trip_ids(self.trip_ids.as_deref()),
            state: RecordState::from(self.state.as_str()),
            created_at: Utc
                .timestamp_opt(self.created_at, 0)
                .single()
                .unwrap_or_else(Utc::now),
        })
    }
}

/// SQLite-backed durable local queue. Every write is a single transactional
/// statement, so a crash mid-write never leaves a partial record. Reads
/// degrade to an empty result when the storage is unavailable, keeping
/// capture and sync alive in read-degraded mode.
pub struct SqlitePendingQueue {
    pool: SqlitePool,
}

impl SqlitePendingQueue {
    pub fn new(connection: &ConnectionPool) -> Self {
        Self {
            pool: connection.get_pool().clone(),
        }
    }
}

#[async_trait]
impl PendingQueue for SqlitePendingQueue {
    async fn enqueue_location(&self, record: &PendingLocationRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO pending_locations (
                id, owner_id, latitude, longitude, captured_at,
                wait_time_seconds, trip_ids, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(record.id.as_str())
        .bind(record.owner_id.as_str())
        .bind(record.point.latitude)
        .bind(record.point.longitude)
        .bind(record.captured_at.to_rfc3339())
        .bind(record.wait_time.as_seconds() as i64)
        .bind(trip_ids_json(&record.trip_ids)?)
        .bind(record.created_at.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_location(&self, id: &RecordId, patch: LocationPatch) -> Result<(), AppError> {
        // Both fields land in one transaction; a patch is never half-applied.
        let mut tx = self.pool.begin().await?;

        if let Some(wait_time) = patch.wait_time {
            let result = sqlx::query(
                r#"
                UPDATE pending_locations
                SET wait_time_seconds = MAX(wait_time_seconds, ?1)
                WHERE id = ?2
                "#,
            )
            .bind(wait_time.as_seconds() as i64)
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(format!("Pending location {id}")));
            }
        }

        if let Some(trip_ids) = patch.trip_ids {
            let result = sqlx::query(
                r#"
                UPDATE pending_locations
                SET trip_ids = ?1
                WHERE id = ?2
                "#,
            )
            .bind(trip_ids_json(&trip_ids)?)
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(format!("Pending location {id}")));
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn remove_location(&self, id: &RecordId) -> Result<(), AppError> {
        sqlx::query(r#"DELETE FROM pending_locations WHERE id = ?1"#)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn locations_by_owner(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Vec<PendingLocationRecord>, AppError> {
        let rows = sqlx::query_as::<_, LocationRow>(
            r#"
            SELECT * FROM pending_locations
            WHERE owner_id = ?1
            ORDER BY created_at ASC
            "#,
        )
        .bind(owner_id.as_str())
        .fetch_all(&self.pool)
        .await;

        let rows = match rows {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Location read degraded to empty");
                return Ok(Vec::new());
            }
        };

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            match row.into_record() {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, "Skipping corrupt pending location row"),
            }
        }
        Ok(records)
    }

    async fn enqueue_photo(&self, record: &PendingPhotoRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO pending_photos (
                id, owner_id, latitude, longitude, captured_at,
                image, trip_ids, state, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(record.id.as_str())
        .bind(record.owner_id.as_str())
        .bind(record.point.map(|p| p.latitude))
        .bind(record.point.map(|p| p.longitude))
        .bind(record.captured_at.to_rfc3339())
        .bind(&record.image)
        .bind(trip_ids_json(&record.trip_ids)?)
        .bind(record.state.as_str())
        .bind(record.created_at.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_photo_state(
        &self,
        id: &RecordId,
        state: RecordState,
    ) -> Result<(), AppError> {
        let result = sqlx::query(r#"UPDATE pending_photos SET state = ?1 WHERE id = ?2"#)
            .bind(state.as_str())
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Pending photo {id}")));
        }
        Ok(())
    }

    async fn remove_photo(&self, id: &RecordId) -> Result<(), AppError> {
        sqlx::query(r#"DELETE FROM pending_photos WHERE id = ?1"#)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn photos_by_owner(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Vec<PendingPhotoRecord>, AppError> {
        let rows = sqlx::query_as::<_, PhotoRow>(
            r#"
            SELECT * FROM pending_photos
            WHERE owner_id = ?1
            ORDER BY created_at ASC
            "#,
        )
        .bind(owner_id.as_str())
        .fetch_all(&self.pool)
        .await;

        let rows = match rows {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Photo read degraded to empty");
                return Ok(Vec::new());
            }
        };

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            match row.into_record() {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, "Skipping corrupt pending photo row"),
            }
        }
        Ok(records)
    }

    async fn pending_counts(&self, owner_id: &OwnerId) -> Result<PendingCounts, AppError> {
        let result = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM pending_locations WHERE owner_id = ?1) AS locations,
                (SELECT COUNT(*) FROM pending_photos WHERE owner_id = ?1) AS photos
            "#,
        )
        .bind(owner_id.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(PendingCounts {
                locations: row.try_get::<i64, _>("locations").unwrap_or(0) as u64,
                photos: row.try_get::<i64, _>("photos").unwrap_or(0) as u64,
            }),
            Err(e) => {
                warn!(error = %e, "Pending counts degraded to zero");
                Ok(PendingCounts::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::CaptureTime;
    use chrono::Duration;

    async fn setup_queue() -> (ConnectionPool, SqlitePendingQueue) {
        let connection = ConnectionPool::from_memory().await.unwrap();
        connection.init_schema().await.unwrap();
        let queue = SqlitePendingQueue::new(&connection);
        (connection, queue)
    }

    fn owner() -> OwnerId {
        OwnerId::parse("owner-1").unwrap()
    }

    fn location_record() -> PendingLocationRecord {
        PendingLocationRecord::new(
            owner(),
            GeoPoint::new(37.0, -122.0).unwrap(),
            CaptureTime::new(Utc::now() - Duration::seconds(5)).unwrap(),
        )
    }

    fn photo_record() -> PendingPhotoRecord {
        PendingPhotoRecord::new(
            owner(),
            Some(GeoPoint::new(48.85, 2.35).unwrap()),
            CaptureTime::now(),
            vec![0xFF, 0xD8, 0xFF, 0xE0],
        )
    }

    #[tokio::test]
    async fn enqueue_and_list_roundtrip() {
        let (_connection, queue) = setup_queue().await;
        let record = location_record();

        queue.enqueue_location(&record).await.unwrap();
        let listed = queue.locations_by_owner(&owner()).await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, record.id);
        assert_eq!(listed[0].point, record.point);
        assert_eq!(listed[0].wait_time.as_seconds(), 0);
    }

    #[tokio::test]
    async fn list_filters_by_owner() {
        let (_connection, queue) = setup_queue().await;
        queue.enqueue_location(&location_record()).await.unwrap();

        let other = OwnerId::parse("someone-else").unwrap();
        assert!(queue.locations_by_owner(&other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_tops_up_wait_time_monotonically() {
        let (_connection, queue) = setup_queue().await;
        let record = location_record();
        queue.enqueue_location(&record).await.unwrap();

        let patch = LocationPatch {
            wait_time: Some(WaitTime::from_seconds(120)),
            trip_ids: None,
        };
        queue.update_location(&record.id, patch).await.unwrap();

        // A stale smaller value must not shrink the stored wait time.
        let stale = LocationPatch {
            wait_time: Some(WaitTime::from_seconds(30)),
            trip_ids: None,
        };
        queue.update_location(&record.id, stale).await.unwrap();

        let listed = queue.locations_by_owner(&owner()).await.unwrap();
        assert_eq!(listed[0].wait_time.as_seconds(), 120);
    }

    #[tokio::test]
    async fn update_applies_both_fields_together() {
        let (_connection, queue) = setup_queue().await;
        let record = location_record();
        queue.enqueue_location(&record).await.unwrap();

        let patch = LocationPatch {
            wait_time: Some(WaitTime::from_seconds(45)),
            trip_ids: Some(vec![TripId::parse("trip-a").unwrap()]),
        };
        queue.update_location(&record.id, patch).await.unwrap();

        let listed = queue.locations_by_owner(&owner()).await.unwrap();
        assert_eq!(listed[0].wait_time.as_seconds(), 45);
        assert_eq!(listed[0].trip_ids, vec![TripId::parse("trip-a").unwrap()]);
    }

    #[tokio::test]
    async fn update_missing_record_is_not_found() {
        let (_connection, queue) = setup_queue().await;
        let patch = LocationPatch {
            wait_time: Some(WaitTime::from_seconds(1)),
            trip_ids: None,
        };
        let missing = RecordId::parse("missing").unwrap();
        assert!(matches!(
            queue.update_location(&missing, patch).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn remove_dequeues_exactly_once() {
        let (_connection, queue) = setup_queue().await;
        let record = location_record();
        queue.enqueue_location(&record).await.unwrap();

        queue.remove_location(&record.id).await.unwrap();
        assert!(queue.locations_by_owner(&owner()).await.unwrap().is_empty());

        // A second remove of the same id is a safe no-op.
        queue.remove_location(&record.id).await.unwrap();
    }

    #[tokio::test]
    async fn photo_roundtrip_preserves_bytes_and_state() {
        let (_connection, queue) = setup_queue().await;
        let record = photo_record();
        queue.enqueue_photo(&record).await.unwrap();

        let listed = queue.photos_by_owner(&owner()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].image, record.image);
        assert_eq!(listed[0].state, RecordState::Pending);

        queue
            .update_photo_state(&record.id, RecordState::Promoted)
            .await
            .unwrap();
        let listed = queue.photos_by_owner(&owner()).await.unwrap();
        assert_eq!(listed[0].state, RecordState::Promoted);
    }

    #[tokio::test]
    async fn trip_ids_survive_the_roundtrip() {
        let (_connection, queue) = setup_queue().await;
        let record = location_record()
            .with_trip_ids(vec![TripId::parse("trip-a").unwrap(), TripId::parse("trip-b").unwrap()]);
        queue.enqueue_location(&record).await.unwrap();

        let listed = queue.locations_by_owner(&owner()).await.unwrap();
        assert_eq!(listed[0].trip_ids, record.trip_ids);
    }

    #[tokio::test]
    async fn counts_reflect_both_kinds() {
        let (_connection, queue) = setup_queue().await;
        queue.enqueue_location(&location_record()).await.unwrap();
        queue.enqueue_location(&location_record()).await.unwrap();
        queue.enqueue_photo(&photo_record()).await.unwrap();

        let counts = queue.pending_counts(&owner()).await.unwrap();
        assert_eq!(counts.locations, 2);
        assert_eq!(counts.photos, 1);
    }

    #[tokio::test]
    async fn reads_degrade_to_empty_when_storage_unavailable() {
        let (connection, queue) = setup_queue().await;
        queue.enqueue_location(&location_record()).await.unwrap();

        connection.close().await;

        let listed = queue.locations_by_owner(&owner()).await.unwrap();
        assert!(listed.is_empty());
        let counts = queue.pending_counts(&owner()).await.unwrap();
        assert_eq!(counts.locations, 0);
    }

    #[tokio::test]
    async fn writes_surface_errors_when_storage_unavailable() {
        let (connection, queue) = setup_queue().await;
        connection.close().await;

        assert!(queue.enqueue_location(&location_record()).await.is_err());
    }
}
