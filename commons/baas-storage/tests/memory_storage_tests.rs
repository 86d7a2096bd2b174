use baas_models::Object;
use baas_storage::{
    FindOptions, ObjectStorage, StorageError, memory::MemoryObjectStorage,
};
use serde_json::{Value, json};

fn obj(v: Value) -> Object {
    v.as_object().cloned().unwrap()
}

#[tokio::test]
async fn memory_storage_crud() {
    let storage = MemoryObjectStorage::new();
    storage
        .create("GameScore", &obj(json!({"objectId": "a1", "score": 10})))
        .await
        .unwrap();
    let found = storage
        .find("GameScore", &obj(json!({"objectId": "a1"})), &FindOptions::default())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["score"], json!(10));

    let updated = storage
        .update(
            "GameScore",
            &obj(json!({"objectId": "a1"})),
            &obj(json!({"score": 11})),
            false,
        )
        .await
        .unwrap();
    assert_eq!(updated[0]["score"], json!(11));

    let removed = storage
        .delete("GameScore", &obj(json!({"objectId": "a1"})))
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert_eq!(storage.count("GameScore", &Object::new()).await.unwrap(), 0);
}

#[tokio::test]
async fn duplicate_object_id_rejected() {
    let storage = MemoryObjectStorage::new();
    let o = obj(json!({"objectId": "dup"}));
    storage.create("C", &o).await.unwrap();
    let err = storage.create("C", &o).await.unwrap_err();
    assert!(matches!(err, StorageError::AlreadyExists(_)));
}

#[tokio::test]
async fn update_many_increments_every_match() {
    let storage = MemoryObjectStorage::new();
    for (id, device, badge) in [("i1", "ios", 1), ("i2", "ios", 5), ("a1", "android", 2)] {
        storage
            .create(
                "_Installation",
                &obj(json!({"objectId": id, "deviceType": device, "badge": badge})),
            )
            .await
            .unwrap();
    }
    let updated = storage
        .update(
            "_Installation",
            &obj(json!({"deviceType": "ios"})),
            &obj(json!({"badge": {"__op": "Increment", "amount": 1}})),
            true,
        )
        .await
        .unwrap();
    assert_eq!(updated.len(), 2);
    let android = storage
        .find("_Installation", &obj(json!({"objectId": "a1"})), &FindOptions::default())
        .await
        .unwrap();
    assert_eq!(android[0]["badge"], json!(2));
}

#[tokio::test]
async fn find_applies_order_skip_limit_keys() {
    let storage = MemoryObjectStorage::new();
    for i in 0..5 {
        storage
            .create(
                "Item",
                &obj(json!({"objectId": format!("o{}", i), "rank": i, "secret": "x"})),
            )
            .await
            .unwrap();
    }
    let options = FindOptions {
        limit: Some(2),
        skip: Some(1),
        order: FindOptions::parse_order("-rank"),
        keys: Some(vec!["rank".into()]),
    };
    let found = storage.find("Item", &Object::new(), &options).await.unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0]["rank"], json!(3));
    assert_eq!(found[1]["rank"], json!(2));
    assert!(!found[0].contains_key("secret"));
}

#[tokio::test]
async fn failed_many_update_writes_nothing() {
    let storage = MemoryObjectStorage::new();
    for (id, badge) in [("i1", json!(1)), ("i2", json!("x"))] {
        storage
            .create(
                "_Installation",
                &obj(json!({"objectId": id, "deviceType": "ios", "badge": badge})),
            )
            .await
            .unwrap();
    }
    let err = storage
        .update(
            "_Installation",
            &Object::new(),
            &obj(json!({"badge": {"__op": "Increment", "amount": 1}})),
            true,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidUpdate(_)));

    let stored = storage
        .find("_Installation", &Object::new(), &FindOptions::default())
        .await
        .unwrap();
    let badges: Vec<Value> = stored.iter().map(|o| o["badge"].clone()).collect();
    assert_eq!(badges, vec![json!(1), json!("x")]);
}
