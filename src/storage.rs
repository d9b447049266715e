use crate::domain::{Item, Point, PointFilter};
use crate::error::{DirectoryError, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// Storage trait for the points directory
#[async_trait]
pub trait Storage: Send + Sync {
    // Item catalog operations
    async fn create_item(&self, item: &mut Item) -> Result<()>;
    async fn list_items(&self) -> Result<Vec<Item>>;
    async fn get_items_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Item>>;

    // Point operations
    /// Persists the point and one association row per item id as a single
    /// atomic unit. `item_ids` must be distinct and reference existing
    /// catalog items; on failure nothing is persisted.
    async fn create_point(&self, point: &mut Point, item_ids: &[Uuid]) -> Result<()>;
    async fn get_point(&self, id: Uuid) -> Result<Option<Point>>;
    async fn get_point_items(&self, point_id: Uuid) -> Result<Vec<Item>>;
    async fn list_points(&self, filter: &PointFilter) -> Result<Vec<Point>>;
}

/// In-memory storage implementation for development/testing
pub struct InMemoryStorage {
    items: Arc<Mutex<Vec<Item>>>,
    points: Arc<Mutex<Vec<Point>>>,
    point_items: Arc<Mutex<Vec<(Uuid, Uuid)>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
            points: Arc::new(Mutex::new(Vec::new())),
            point_items: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_item(&self, item: &mut Item) -> Result<()> {
        let id = Uuid::new_v4();
        item.id = Some(id);

        let mut items = self.items.lock().unwrap();
        items.push(item.clone());

        debug!("Created item: {} with id {}", item.title, id);
        Ok(())
    }

    async fn list_items(&self) -> Result<Vec<Item>> {
        let items = self.items.lock().unwrap();
        Ok(items.clone())
    }

    async fn get_items_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Item>> {
        let items = self.items.lock().unwrap();
        let found = items
            .iter()
            .filter(|item| item.id.map_or(false, |id| ids.contains(&id)))
            .cloned()
            .collect();
        Ok(found)
    }

    async fn create_point(&self, point: &mut Point, item_ids: &[Uuid]) -> Result<()> {
        // Referential check up front; inserts below cannot fail, so a
        // rejected id leaves no partial state behind.
        {
            let items = self.items.lock().unwrap();
            for item_id in item_ids {
                if !items.iter().any(|item| item.id == Some(*item_id)) {
                    return Err(DirectoryError::Database {
                        message: format!("point references unknown item {item_id}"),
                    });
                }
            }
        }

        let id = Uuid::new_v4();
        point.id = Some(id);

        let mut points = self.points.lock().unwrap();
        let mut point_items = self.point_items.lock().unwrap();
        points.push(point.clone());
        for item_id in item_ids {
            point_items.push((id, *item_id));
        }

        debug!(
            "Created point: {} with id {} ({} items)",
            point.name,
            id,
            item_ids.len()
        );
        Ok(())
    }

    async fn get_point(&self, id: Uuid) -> Result<Option<Point>> {
        let points = self.points.lock().unwrap();
        let point = points.iter().find(|p| p.id == Some(id)).cloned();
        Ok(point)
    }

    async fn get_point_items(&self, point_id: Uuid) -> Result<Vec<Item>> {
        let point_items = self.point_items.lock().unwrap();
        let accepted: Vec<Uuid> = point_items
            .iter()
            .filter(|(pid, _)| *pid == point_id)
            .map(|(_, iid)| *iid)
            .collect();
        drop(point_items);

        // Catalog order, like the persistent implementation
        let items = self.items.lock().unwrap();
        let found = items
            .iter()
            .filter(|item| item.id.map_or(false, |id| accepted.contains(&id)))
            .cloned()
            .collect();
        Ok(found)
    }

    async fn list_points(&self, filter: &PointFilter) -> Result<Vec<Point>> {
        let point_items = self.point_items.lock().unwrap().clone();
        let points = self.points.lock().unwrap();

        let matching = points
            .iter()
            .filter(|p| {
                filter.uf.as_ref().map_or(true, |uf| &p.uf == uf)
                    && filter.city.as_ref().map_or(true, |city| &p.city == city)
                    && (filter.items.is_empty()
                        || point_items.iter().any(|(pid, iid)| {
                            p.id == Some(*pid) && filter.items.contains(iid)
                        }))
            })
            .cloned()
            .collect();
        Ok(matching)
    }
}
