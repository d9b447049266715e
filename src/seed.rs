use crate::domain::Item;
use crate::error::Result;
use crate::storage::Storage;
use chrono::Utc;
use tracing::info;

/// The material categories the directory ships with, title plus the
/// relative reference of the static asset served for it.
pub const DEFAULT_ITEMS: &[(&str, &str)] = &[
    ("Lâmpadas", "lampadas.svg"),
    ("Pilhas e Baterias", "baterias.svg"),
    ("Papéis e Papelão", "papeis-papelao.svg"),
    ("Resíduos Eletrônicos", "eletronicos.svg"),
    ("Resíduos Orgânicos", "organicos.svg"),
    ("Óleo de Cozinha", "oleo.svg"),
];

/// Seeds the default item catalog. Idempotent: a non-empty catalog is
/// left untouched. Returns how many items were created.
pub async fn seed_default_items(storage: &dyn Storage) -> Result<usize> {
    if !storage.list_items().await?.is_empty() {
        info!("Item catalog already populated, skipping seed");
        return Ok(0);
    }

    let mut created = 0;
    for (title, image) in DEFAULT_ITEMS {
        let mut item = Item {
            id: None,
            title: (*title).to_string(),
            image: (*image).to_string(),
            created_at: Utc::now(),
        };
        storage.create_item(&mut item).await?;
        created += 1;
    }

    info!("Seeded {created} catalog items");
    Ok(created)
}
