use crate::domain::{Item, Point, PointDetail, PointFilter};
use crate::error::{DirectoryError, Result};
use crate::storage::Storage;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Read side of the directory: point detail and filtered listings.
pub struct DirectoryService {
    storage: Arc<dyn Storage>,
}

impl DirectoryService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn list_items(&self) -> Result<Vec<Item>> {
        self.storage.list_items().await
    }

    pub async fn get_point(&self, id: Uuid) -> Result<PointDetail> {
        let point = self
            .storage
            .get_point(id)
            .await?
            .ok_or_else(|| DirectoryError::NotFound {
                resource: "collection point".to_string(),
            })?;

        let items = self.storage.get_point_items(id).await?;
        Ok(PointDetail { point, items })
    }

    pub async fn list_points(&self, filter: PointFilter) -> Result<Vec<Point>> {
        let points = self.storage.list_points(&filter).await?;
        debug!(
            "Listed {} points (uf: {:?}, city: {:?}, items: {})",
            points.len(),
            filter.uf,
            filter.city,
            filter.items.len()
        );
        Ok(points)
    }
}
