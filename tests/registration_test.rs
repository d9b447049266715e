use anyhow::Result;
use chrono::Utc;
use coleta_api::directory::DirectoryService;
use coleta_api::domain::{Item, Point, PointFilter, PointRegistration};
use coleta_api::error::DirectoryError;
use coleta_api::registration::RegistrationService;
use coleta_api::storage::{InMemoryStorage, Storage};
use std::sync::Arc;
use uuid::Uuid;

async fn catalog_fixture(storage: &dyn Storage, titles: &[&str]) -> Result<Vec<Uuid>> {
    let mut ids = Vec::new();
    for title in titles {
        let mut item = Item {
            id: None,
            title: (*title).to_string(),
            image: format!("{}.svg", title.to_lowercase()),
            created_at: Utc::now(),
        };
        storage.create_item(&mut item).await?;
        ids.push(item.id.expect("storage assigns an id"));
    }
    Ok(ids)
}

fn registration(items: Vec<Uuid>) -> PointRegistration {
    PointRegistration {
        name: "Mercado Central".to_string(),
        email: "contato@mercado.com".to_string(),
        whatsapp: "+55 11 99999-0000".to_string(),
        uf: "SP".to_string(),
        city: "Campinas".to_string(),
        latitude: -22.9,
        longitude: -47.06,
        items,
        image: None,
    }
}

#[tokio::test]
async fn registered_point_carries_exactly_the_requested_items() -> Result<()> {
    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    let item_ids = catalog_fixture(storage.as_ref(), &["Batteries", "Paper", "Oil"]).await?;

    let service = RegistrationService::new(storage.clone());
    let directory = DirectoryService::new(storage.clone());

    let requested = vec![item_ids[0], item_ids[2]];
    let point = service.register(registration(requested.clone())).await?;
    let id = point.id.expect("registered point has an id");

    let detail = directory.get_point(id).await?;
    let mut got: Vec<Uuid> = detail.items.iter().filter_map(|i| i.id).collect();
    let mut want = requested;
    got.sort();
    want.sort();
    assert_eq!(got, want);
    assert_eq!(detail.point.name, "Mercado Central");
    Ok(())
}

#[tokio::test]
async fn duplicate_item_ids_collapse_to_a_set() -> Result<()> {
    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    let item_ids = catalog_fixture(storage.as_ref(), &["Batteries", "Paper"]).await?;

    let service = RegistrationService::new(storage.clone());
    let directory = DirectoryService::new(storage.clone());

    let point = service
        .register(registration(vec![item_ids[0], item_ids[0], item_ids[1]]))
        .await?;

    let detail = directory.get_point(point.id.unwrap()).await?;
    assert_eq!(detail.items.len(), 2);
    Ok(())
}

#[tokio::test]
async fn unknown_item_id_is_rejected_and_persists_nothing() -> Result<()> {
    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    let item_ids = catalog_fixture(storage.as_ref(), &["Batteries"]).await?;

    let service = RegistrationService::new(storage.clone());

    let err = service
        .register(registration(vec![item_ids[0], Uuid::new_v4()]))
        .await
        .unwrap_err();
    match err {
        DirectoryError::Validation { fields } => assert_eq!(fields, vec!["items"]),
        other => panic!("expected validation error, got {other}"),
    }

    let points = storage.list_points(&PointFilter::default()).await?;
    assert!(points.is_empty());
    Ok(())
}

#[tokio::test]
async fn empty_item_set_is_rejected() -> Result<()> {
    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    catalog_fixture(storage.as_ref(), &["Batteries"]).await?;

    let service = RegistrationService::new(storage.clone());

    let err = service.register(registration(Vec::new())).await.unwrap_err();
    match err {
        DirectoryError::Validation { fields } => assert!(fields.contains(&"items".to_string())),
        other => panic!("expected validation error, got {other}"),
    }

    assert!(storage.list_points(&PointFilter::default()).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_contact_fields_are_all_reported() -> Result<()> {
    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    let item_ids = catalog_fixture(storage.as_ref(), &["Batteries"]).await?;

    let service = RegistrationService::new(storage.clone());

    let mut input = registration(item_ids);
    input.email = "broken".to_string();
    input.whatsapp = String::new();

    let err = service.register(input).await.unwrap_err();
    match err {
        DirectoryError::Validation { fields } => {
            assert_eq!(fields, vec!["email", "whatsapp"]);
        }
        other => panic!("expected validation error, got {other}"),
    }

    assert!(storage.list_points(&PointFilter::default()).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn storage_rejects_an_association_to_a_missing_item() -> Result<()> {
    // Bypasses service validation to exercise the storage-level
    // integrity guarantee directly.
    let storage = InMemoryStorage::new();
    catalog_fixture(&storage, &["Batteries"]).await?;

    let mut point = Point {
        id: None,
        name: "Orphan".to_string(),
        email: "orphan@example.com".to_string(),
        whatsapp: "+55 11 90000-0000".to_string(),
        latitude: 0.0,
        longitude: 0.0,
        city: "Campinas".to_string(),
        uf: "SP".to_string(),
        image: "point-placeholder.svg".to_string(),
        created_at: Utc::now(),
    };

    let result = storage.create_point(&mut point, &[Uuid::new_v4()]).await;
    assert!(result.is_err());

    // No partial state: the point must not be observable afterwards
    assert!(storage.list_points(&PointFilter::default()).await?.is_empty());
    Ok(())
}
