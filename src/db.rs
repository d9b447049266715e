use crate::config::DatabaseConfig;
use crate::domain::{Item, Point, PointFilter};
use crate::error::{DirectoryError, Result};
use crate::storage::Storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::params::Params;
use libsql::{Builder, Connection, Database, Row, Transaction, Value};
use tracing::{debug, info};
use uuid::Uuid;

pub struct DatabaseManager {
    db: Database,
}

fn row_error(e: libsql::Error) -> DirectoryError {
    DirectoryError::Database {
        message: format!("Failed to read row: {e}"),
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| DirectoryError::Database {
        message: format!("Invalid UUID in row: {e}"),
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DirectoryError::Database {
            message: format!("Invalid timestamp in row: {e}"),
        })
}

fn item_from_row(row: &Row) -> Result<Item> {
    let id: String = row.get(0).map_err(row_error)?;
    let title: String = row.get(1).map_err(row_error)?;
    let image: String = row.get(2).map_err(row_error)?;
    let created_at: String = row.get(3).map_err(row_error)?;

    Ok(Item {
        id: Some(parse_uuid(&id)?),
        title,
        image,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn point_from_row(row: &Row) -> Result<Point> {
    let id: String = row.get(0).map_err(row_error)?;
    let name: String = row.get(1).map_err(row_error)?;
    let email: String = row.get(2).map_err(row_error)?;
    let whatsapp: String = row.get(3).map_err(row_error)?;
    let latitude: f64 = row.get(4).map_err(row_error)?;
    let longitude: f64 = row.get(5).map_err(row_error)?;
    let city: String = row.get(6).map_err(row_error)?;
    let uf: String = row.get(7).map_err(row_error)?;
    let image: String = row.get(8).map_err(row_error)?;
    let created_at: String = row.get(9).map_err(row_error)?;

    Ok(Point {
        id: Some(parse_uuid(&id)?),
        name,
        email,
        whatsapp,
        latitude,
        longitude,
        city,
        uf,
        image,
        created_at: parse_timestamp(&created_at)?,
    })
}

const POINT_COLUMNS: &str =
    "p.id, p.name, p.email, p.whatsapp, p.latitude, p.longitude, p.city, p.uf, p.image, p.created_at";

impl DatabaseManager {
    /// Connect to the configured database: a remote libsql deployment when
    /// the URL has a scheme, a local file otherwise.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db = if config.url.starts_with("libsql://") || config.url.starts_with("https://") {
            let auth_token = config.auth_token.clone().ok_or_else(|| {
                DirectoryError::Config(
                    "auth_token is required for a remote database URL".to_string(),
                )
            })?;
            info!("Connecting to remote database at {}", config.url);
            Builder::new_remote(config.url.clone(), auth_token)
                .build()
                .await
        } else {
            info!("Opening local database at {}", config.url);
            Builder::new_local(&config.url).build().await
        }
        .map_err(|e| DirectoryError::Database {
            message: format!("Failed to connect to database: {e}"),
        })?;

        Ok(Self { db })
    }

    /// Get a connection to the database
    pub async fn get_connection(&self) -> Result<Connection> {
        let conn = self.db.connect().map_err(|e| DirectoryError::Database {
            message: format!("Failed to get database connection: {e}"),
        })?;

        // SQLite leaves foreign keys off per connection
        conn.execute("PRAGMA foreign_keys = ON", libsql::params![])
            .await
            .map_err(|e| DirectoryError::Database {
                message: format!("Failed to enable foreign keys: {e}"),
            })?;

        Ok(conn)
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        let conn = self.get_connection().await?;

        let migration_sql = include_str!("../migrations/001_create_points_directory.sql");

        conn.execute_batch(migration_sql)
            .await
            .map_err(|e| DirectoryError::Database {
                message: format!("Failed to run migrations: {e}"),
            })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    async fn insert_point_rows(
        tx: &Transaction,
        id: Uuid,
        point: &Point,
        item_ids: &[Uuid],
    ) -> Result<()> {
        tx.execute(
            "INSERT INTO points (id, name, email, whatsapp, latitude, longitude, city, uf, image, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            libsql::params![
                id.to_string(),
                point.name.as_str(),
                point.email.as_str(),
                point.whatsapp.as_str(),
                point.latitude,
                point.longitude,
                point.city.as_str(),
                point.uf.as_str(),
                point.image.as_str(),
                point.created_at.to_rfc3339(),
            ],
        )
        .await
        .map_err(|e| DirectoryError::Database {
            message: format!("Failed to insert point: {e}"),
        })?;

        for item_id in item_ids {
            tx.execute(
                "INSERT INTO point_items (point_id, item_id) VALUES (?, ?)",
                libsql::params![id.to_string(), item_id.to_string()],
            )
            .await
            .map_err(|e| DirectoryError::Database {
                message: format!("Failed to insert point item association: {e}"),
            })?;
        }

        Ok(())
    }
}

#[async_trait]
impl Storage for DatabaseManager {
    async fn create_item(&self, item: &mut Item) -> Result<()> {
        let conn = self.get_connection().await?;

        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO items (id, title, image, created_at) VALUES (?, ?, ?, ?)",
            libsql::params![
                id.to_string(),
                item.title.as_str(),
                item.image.as_str(),
                item.created_at.to_rfc3339(),
            ],
        )
        .await
        .map_err(|e| DirectoryError::Database {
            message: format!("Failed to insert item: {e}"),
        })?;

        item.id = Some(id);
        debug!("Created item: {} with id {}", item.title, id);
        Ok(())
    }

    async fn list_items(&self) -> Result<Vec<Item>> {
        let conn = self.get_connection().await?;

        let mut rows = conn
            .query(
                "SELECT id, title, image, created_at FROM items ORDER BY rowid",
                libsql::params![],
            )
            .await
            .map_err(|e| DirectoryError::Database {
                message: format!("Failed to query items: {e}"),
            })?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await.map_err(row_error)? {
            items.push(item_from_row(&row)?);
        }
        Ok(items)
    }

    async fn get_items_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Item>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_connection().await?;

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, title, image, created_at FROM items WHERE id IN ({placeholders}) ORDER BY rowid"
        );
        let params: Vec<Value> = ids.iter().map(|id| id.to_string().into()).collect();

        let mut rows = conn
            .query(&sql, Params::Positional(params))
            .await
            .map_err(|e| DirectoryError::Database {
                message: format!("Failed to query items: {e}"),
            })?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await.map_err(row_error)? {
            items.push(item_from_row(&row)?);
        }
        Ok(items)
    }

    async fn create_point(&self, point: &mut Point, item_ids: &[Uuid]) -> Result<()> {
        let conn = self.get_connection().await?;

        let tx = conn
            .transaction()
            .await
            .map_err(|e| DirectoryError::Database {
                message: format!("Failed to begin transaction: {e}"),
            })?;

        let id = Uuid::new_v4();
        match Self::insert_point_rows(&tx, id, point, item_ids).await {
            Ok(()) => {
                tx.commit().await.map_err(|e| DirectoryError::Database {
                    message: format!("Failed to commit registration: {e}"),
                })?;
            }
            Err(e) => {
                let _ = tx.rollback().await;
                return Err(e);
            }
        }

        point.id = Some(id);
        debug!(
            "Created point: {} with id {} ({} items)",
            point.name,
            id,
            item_ids.len()
        );
        Ok(())
    }

    async fn get_point(&self, id: Uuid) -> Result<Option<Point>> {
        let conn = self.get_connection().await?;

        let mut rows = conn
            .query(
                &format!("SELECT {POINT_COLUMNS} FROM points p WHERE p.id = ?"),
                libsql::params![id.to_string()],
            )
            .await
            .map_err(|e| DirectoryError::Database {
                message: format!("Failed to query point: {e}"),
            })?;

        match rows.next().await.map_err(row_error)? {
            Some(row) => Ok(Some(point_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_point_items(&self, point_id: Uuid) -> Result<Vec<Item>> {
        let conn = self.get_connection().await?;

        let mut rows = conn
            .query(
                "SELECT i.id, i.title, i.image, i.created_at FROM items i \
                 JOIN point_items pi ON pi.item_id = i.id \
                 WHERE pi.point_id = ? ORDER BY i.rowid",
                libsql::params![point_id.to_string()],
            )
            .await
            .map_err(|e| DirectoryError::Database {
                message: format!("Failed to query point items: {e}"),
            })?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await.map_err(row_error)? {
            items.push(item_from_row(&row)?);
        }
        Ok(items)
    }

    async fn list_points(&self, filter: &PointFilter) -> Result<Vec<Point>> {
        let conn = self.get_connection().await?;

        let mut sql = format!("SELECT {POINT_COLUMNS} FROM points p");
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        // A point qualifies when it accepts at least one of the requested
        // items; EXISTS keeps a point matching several of them in the
        // result exactly once.
        if !filter.items.is_empty() {
            let placeholders = vec!["?"; filter.items.len()].join(", ");
            clauses.push(format!(
                "EXISTS (SELECT 1 FROM point_items pi \
                 WHERE pi.point_id = p.id AND pi.item_id IN ({placeholders}))"
            ));
            params.extend(filter.items.iter().map(|id| Value::from(id.to_string())));
        }
        if let Some(uf) = &filter.uf {
            clauses.push("p.uf = ?".to_string());
            params.push(uf.clone().into());
        }
        if let Some(city) = &filter.city {
            clauses.push("p.city = ?".to_string());
            params.push(city.clone().into());
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY p.rowid");

        let mut rows = conn
            .query(&sql, Params::Positional(params))
            .await
            .map_err(|e| DirectoryError::Database {
                message: format!("Failed to query points: {e}"),
            })?;

        let mut points = Vec::new();
        while let Some(row) = rows.next().await.map_err(row_error)? {
            points.push(point_from_row(&row)?);
        }
        Ok(points)
    }
}
