use crate::domain::{Point, PointRegistration};
use crate::error::{DirectoryError, Result};
use crate::storage::Storage;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Stored image reference used when a registration carries none; upload is
/// handled outside this service.
const PLACEHOLDER_IMAGE: &str = "point-placeholder.svg";

/// Validates registrations and persists them atomically: the point row and
/// every item association commit together or not at all.
pub struct RegistrationService {
    storage: Arc<dyn Storage>,
}

impl RegistrationService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    #[instrument(skip(self, input))]
    pub async fn register(&self, input: PointRegistration) -> Result<Point> {
        validate_fields(&input)?;

        // Duplicate ids collapse to a set before persisting
        let mut item_ids = input.items.clone();
        item_ids.sort();
        item_ids.dedup();

        let known = self.storage.get_items_by_ids(&item_ids).await?;
        if known.len() != item_ids.len() {
            debug!("Registration references unknown item ids");
            return Err(DirectoryError::invalid_field("items"));
        }

        let mut point = Point {
            id: None,
            name: input.name.trim().to_string(),
            email: input.email.trim().to_string(),
            whatsapp: input.whatsapp.trim().to_string(),
            latitude: input.latitude,
            longitude: input.longitude,
            city: input.city.trim().to_string(),
            uf: input.uf.trim().to_string(),
            image: input
                .image
                .filter(|image| !image.trim().is_empty())
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            created_at: Utc::now(),
        };

        self.storage.create_point(&mut point, &item_ids).await?;

        info!(
            "Registered collection point {} in {}/{}",
            point.name, point.city, point.uf
        );
        Ok(point)
    }
}

fn validate_fields(input: &PointRegistration) -> Result<()> {
    let mut fields = Vec::new();

    if input.name.trim().is_empty() {
        fields.push("name");
    }
    if !is_well_formed_email(input.email.trim()) {
        fields.push("email");
    }
    if input.whatsapp.trim().is_empty() {
        fields.push("whatsapp");
    }
    if !is_state_code(input.uf.trim()) {
        fields.push("uf");
    }
    if input.city.trim().is_empty() {
        fields.push("city");
    }
    if !(-90.0..=90.0).contains(&input.latitude) {
        fields.push("latitude");
    }
    if !(-180.0..=180.0).contains(&input.longitude) {
        fields.push("longitude");
    }
    if input.items.is_empty() {
        fields.push("items");
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(DirectoryError::Validation {
            fields: fields.into_iter().map(String::from).collect(),
        })
    }
}

fn is_well_formed_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Two-letter state code, e.g. "SP"
fn is_state_code(uf: &str) -> bool {
    uf.len() == 2 && uf.chars().all(|c| c.is_ascii_alphabetic())
}
