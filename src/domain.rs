use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A category of recyclable material a point may accept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: Option<Uuid>,
    pub title: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

/// A registered collection point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    pub id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub whatsapp: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub uf: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a new collection point
#[derive(Debug, Clone, Deserialize)]
pub struct PointRegistration {
    pub name: String,
    pub email: String,
    pub whatsapp: String,
    pub uf: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Ids of the catalog items the point accepts. Treated as a set.
    pub items: Vec<Uuid>,
    /// Relative reference to an already-uploaded asset. Upload itself is
    /// handled elsewhere; absent means the stock placeholder.
    #[serde(default)]
    pub image: Option<String>,
}

/// Filter for listing points. Location fields combine with AND; the item
/// set matches any point accepting at least one of the ids.
#[derive(Debug, Clone, Default)]
pub struct PointFilter {
    pub uf: Option<String>,
    pub city: Option<String>,
    pub items: Vec<Uuid>,
}

/// A point together with the items it accepts
#[derive(Debug, Clone)]
pub struct PointDetail {
    pub point: Point,
    pub items: Vec<Item>,
}
