use assembly_lists::{
    FilterContext, FilterStateStore, JsonFileFilterStore, ListError, Member, MemberFilter,
    MemoryFilterStore, ReferenceCollection, ReferenceRecord, Result,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

fn member(id: u64, committees: &[u64], meetings: &[u64], active: Option<bool>) -> Member {
    Member {
        id,
        username: format!("user{}", id),
        is_active: active,
        committee_ids: committees.to_vec(),
        is_present_in_meeting_ids: meetings.to_vec(),
        ..Default::default()
    }
}

fn ids(members: &[Member]) -> Vec<u64> {
    members.iter().map(|m| m.id).collect()
}

/// Poll until the condition holds; reference bindings apply asynchronously
async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("condition was not reached in time");
}

#[tokio::test]
async fn test_member_list_filtering_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let members = vec![
        member(1, &[5], &[1], Some(true)),
        member(2, &[], &[2], Some(true)),
        member(3, &[5, 6], &[], Some(false)),
    ];

    {
        let context = FilterContext::new(Arc::new(JsonFileFilterStore::new(dir.path())));
        let engine = context
            .engine::<Member>("user", &MemberFilter::default())
            .await
            .unwrap();
        let mut engine = engine.lock();
        engine.set_source(members.clone());
        engine.toggle_filter("is_active", json!(true));
        engine.set_filter("committee_ids", vec![json!(5)]);
        assert_eq!(ids(engine.filtered()), vec![1]);
        drop(engine);
        context.flush().await;
    }

    // A new session restores the selection from disk
    let context = FilterContext::new(Arc::new(JsonFileFilterStore::new(dir.path())));
    let engine = context
        .engine::<Member>("user", &MemberFilter::default())
        .await
        .unwrap();
    let mut engine = engine.lock();
    assert!(engine.is_active("is_active", &json!(true)));
    engine.set_source(members);
    assert_eq!(ids(engine.filtered()), vec![1]);
}

#[tokio::test]
async fn test_reference_collections_drive_options() {
    let context = FilterContext::new(Arc::new(MemoryFilterStore::new()));
    let engine = context
        .engine::<Member>("user", &MemberFilter::default())
        .await
        .unwrap();

    let meetings = ReferenceCollection::new(vec![ReferenceRecord::new(1, "M1")]);
    let _binding = context.bind_reference(engine.clone(), "is_present_in_meeting_ids", &meetings);

    let option_ids = |engine: &assembly_lists::FilterEngine<Member>| -> Vec<Value> {
        engine
            .definition("is_present_in_meeting_ids")
            .map(|d| d.options.iter().map(|o| o.condition.clone()).collect())
            .unwrap_or_default()
    };

    eventually(|| option_ids(&engine.lock()) == vec![json!(1), Value::Null]).await;

    meetings.replace(vec![ReferenceRecord::new(1, "M1"), ReferenceRecord::new(2, "M2")]);
    eventually(|| option_ids(&engine.lock()) == vec![json!(1), json!(2), Value::Null]).await;

    let engine = engine.lock();
    let labels: Vec<String> = engine
        .definition("is_present_in_meeting_ids")
        .unwrap()
        .options
        .iter()
        .map(|o| o.label.resolve(0))
        .collect();
    assert_eq!(labels, vec!["M1", "M2", "No meeting"]);
}

#[tokio::test]
async fn test_removed_meeting_is_deselected() {
    let store = Arc::new(MemoryFilterStore::new());
    store.insert("MemberList", json!({"is_present_in_meeting_ids": [2]}));
    let context = FilterContext::new(store.clone());
    let engine = context
        .engine::<Member>("user", &MemberFilter::default())
        .await
        .unwrap();
    engine.lock().set_source(vec![
        member(1, &[], &[1], None),
        member(2, &[], &[2], None),
    ]);
    assert_eq!(ids(engine.lock().filtered()), vec![2]);

    let meetings = ReferenceCollection::new(vec![ReferenceRecord::new(1, "M1")]);
    let _binding = context.bind_reference(engine.clone(), "is_present_in_meeting_ids", &meetings);

    eventually(|| !engine.lock().has_active_filters()).await;
    assert_eq!(ids(engine.lock().filtered()), vec![1, 2]);

    context.flush().await;
    assert_eq!(store.get("MemberList"), Some(json!({})));
}

struct BrokenStore;

#[async_trait::async_trait]
impl FilterStateStore for BrokenStore {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        Err(ListError::store(key, "unreachable"))
    }

    async fn save(&self, key: &str, _state: &Value) -> Result<()> {
        Err(ListError::store(key, "unreachable"))
    }
}

#[tokio::test]
async fn test_store_failures_never_reach_the_caller() {
    let context = FilterContext::new(Arc::new(BrokenStore));
    let engine = context
        .engine::<Member>("user", &MemberFilter::default())
        .await
        .unwrap();

    let mut guard = engine.lock();
    assert!(!guard.has_active_filters());
    guard.set_source(vec![member(1, &[], &[], Some(true)), member(2, &[], &[], None)]);
    guard.toggle_filter("is_active", json!(true));
    drop(guard);
    context.flush().await;

    // The failed write did not roll anything back
    let guard = engine.lock();
    assert!(guard.is_active("is_active", &json!(true)));
    assert_eq!(ids(guard.filtered()), vec![1]);
}
