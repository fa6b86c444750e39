// Create, read, update and delete through the controller
// Includes the bulk variants and their all-or-nothing transactions

mod common;

use chrono::{TimeZone, Utc};
use common::parent_entity::{ParentCreate, ParentUpdate, Parents};
use common::{parent_meta, setup_controller, setup_test_db};
use querycrate::{Controller, CrudError, ErrorKind, QuerySpec};
use serde_json::json;
use uuid::Uuid;

fn create(first: &str, rank: i32) -> ParentCreate {
    ParentCreate {
        first: first.to_string(),
        second: None,
        rank,
        created_at: None,
    }
}

#[tokio::test]
async fn test_create_then_read() {
    let db = setup_test_db().await.unwrap();
    let controller = Controller::<Parents>::new(parent_meta(db)).unwrap();

    let created = controller.create(create("kilo", 11)).await.unwrap();
    assert_eq!(created.first, "kilo");
    assert_eq!(created.updated_at, None);

    let read = controller.read(created.id).await.unwrap();
    assert_eq!(read, created);
}

#[tokio::test]
async fn test_create_keeps_supplied_timestamp() {
    let db = setup_test_db().await.unwrap();
    let controller = Controller::<Parents>::new(parent_meta(db)).unwrap();
    let at = Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap();

    let created = controller
        .create(ParentCreate {
            created_at: Some(at.fixed_offset()),
            ..create("lima", 12)
        })
        .await
        .unwrap();
    assert_eq!(created.created_at, at);
}

#[tokio::test]
async fn test_read_unknown_id() {
    let controller = setup_controller().await;
    let missing = Uuid::new_v4();
    let err = controller.read(missing).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains(&missing.to_string()));
}

#[tokio::test]
async fn test_update_merges_fields() {
    let controller = setup_controller().await;
    let target = controller.read_all().await.unwrap().remove(0);

    let updated = controller
        .update(
            target.id,
            ParentUpdate {
                second: Some("patched".into()),
                ..ParentUpdate::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.first, target.first);
    assert_eq!(updated.rank, target.rank);
    assert_eq!(updated.second.as_deref(), Some("patched"));
    assert!(updated.updated_at.is_some());
}

#[tokio::test]
async fn test_update_unknown_id() {
    let controller = setup_controller().await;
    let err = controller
        .update(Uuid::new_v4(), ParentUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CrudError::NotFound { .. }));
}

#[tokio::test]
async fn test_delete() {
    let controller = setup_controller().await;
    let target = controller.read_all().await.unwrap().remove(0);

    assert_eq!(controller.delete(target.id).await.unwrap(), target.id);
    assert!(matches!(
        controller.read(target.id).await,
        Err(CrudError::NotFound { .. })
    ));
    assert!(matches!(
        controller.delete(target.id).await,
        Err(CrudError::NotFound { .. })
    ));
    assert_eq!(controller.read_all().await.unwrap().len(), 9);
}

#[tokio::test]
async fn test_bulk_create_and_read() {
    let db = setup_test_db().await.unwrap();
    let controller = Controller::<Parents>::new(parent_meta(db)).unwrap();

    assert_eq!(controller.bulk_create(Vec::new()).await.unwrap(), 0);

    let written = controller
        .bulk_create(vec![create("a", 1), create("b", 2), create("c", 3)])
        .await
        .unwrap();
    assert_eq!(written, 3);

    let all = controller.read_all().await.unwrap();
    let ids: Vec<Uuid> = all.iter().take(2).map(|p| p.id).collect();
    let mut some = controller.bulk_read(ids.clone()).await.unwrap();
    some.sort_by_key(|p| p.rank);
    assert_eq!(some.len(), 2);
    assert!(some.iter().all(|p| ids.contains(&p.id)));

    let with_missing = controller
        .bulk_read(vec![ids[0], Uuid::new_v4()])
        .await
        .unwrap();
    assert_eq!(with_missing.len(), 1);
}

#[tokio::test]
async fn test_bulk_update_is_all_or_nothing() {
    let controller = setup_controller().await;
    let rows = controller.read_all().await.unwrap();
    let rank_update = |rank| ParentUpdate {
        rank: Some(rank),
        ..ParentUpdate::default()
    };

    let err = controller
        .bulk_update(vec![
            (rows[0].id, rank_update(100)),
            (Uuid::new_v4(), rank_update(200)),
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, CrudError::NotFound { .. }));
    assert_eq!(controller.read(rows[0].id).await.unwrap().rank, rows[0].rank);

    let updated = controller
        .bulk_update(vec![
            (rows[0].id, rank_update(100)),
            (rows[1].id, rank_update(200)),
        ])
        .await
        .unwrap();
    assert_eq!(updated.iter().map(|p| p.rank).collect::<Vec<_>>(), vec![100, 200]);
}

#[tokio::test]
async fn test_bulk_delete() {
    let controller = setup_controller().await;
    let rows = controller.read_all().await.unwrap();
    let ids = rows.iter().take(3).map(|p| p.id).collect();

    assert_eq!(controller.bulk_delete(ids).await.unwrap(), 3);
    assert_eq!(controller.bulk_delete(Vec::new()).await.unwrap(), 0);
    assert_eq!(controller.read_all().await.unwrap().len(), 7);
}

#[tokio::test]
async fn test_run_query() {
    let controller = setup_controller().await;
    let spec = QuerySpec::from_json(&json!({
        "where": {"and": [
            {"col": "rank", "opr": "gt", "value": 2},
            {"col": "rank", "opr": "le", "value": "6"},
            {"col": "second", "opr": "ne", "value": null}
        ]},
        "order_by": [{"col": "rank", "opr": "desc"}],
        "limit": 2,
        "offset": 1
    }))
    .unwrap();

    let rows = controller.run_query(&spec).await.unwrap();
    // ranks 3..=6 with `second` set: 6, 4; skip the first
    assert_eq!(rows.iter().map(|p| p.rank).collect::<Vec<_>>(), vec![4]);
}

#[tokio::test]
async fn test_rejected_create_is_rolled_back() {
    let controller = setup_controller().await;

    // `first` is unique; "alpha-one" is already taken
    let err = controller
        .bulk_create(vec![create("kilo", 11), create("alpha-one", 12)])
        .await
        .unwrap_err();
    assert!(matches!(err, CrudError::Create { ref resource, .. } if resource == "parent"));
    assert_eq!(err.kind(), ErrorKind::Integrity);
    assert_eq!(controller.read_all().await.unwrap().len(), 10);

    let err = controller.create(create("alpha-one", 1)).await.unwrap_err();
    assert!(matches!(err, CrudError::Create { .. }));
    assert_eq!(controller.read_all().await.unwrap().len(), 10);
}

#[tokio::test]
async fn test_rejected_update_is_an_update_error() {
    let controller = setup_controller().await;
    let rows = controller.read_all().await.unwrap();

    let err = controller
        .update(
            rows[1].id,
            ParentUpdate {
                first: Some(rows[0].first.clone()),
                ..ParentUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CrudError::Update { .. }));
    assert_eq!(controller.read(rows[1].id).await.unwrap(), rows[1]);
}
