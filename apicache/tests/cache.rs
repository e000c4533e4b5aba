use std::sync::{Arc, Mutex};
use std::time::Duration;

use apicache::{
    ApiCache, CacheConfig, CacheError, CacheKey, CodecError, Method, Node, Payload,
    RequestDescriptor, SetStatus, Store, StoreResult, WriteFlag,
};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::json;

#[derive(Clone, Default)]
struct MockStore {
    entries: Arc<DashMap<String, String>>,
    last_write: Arc<Mutex<Option<(String, WriteFlag, u64)>>>,
}

impl MockStore {
    fn new() -> Self {
        Self::default()
    }

    fn insert_raw(&self, key: &str, value: &str) {
        self.entries.insert(key.to_owned(), value.to_owned());
    }

    fn last_write(&self) -> Option<(String, WriteFlag, u64)> {
        self.last_write.lock().unwrap().clone()
    }

    fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }
}

#[async_trait]
impl Store for MockStore {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key.as_str()).map(|entry| entry.value().clone()))
    }

    async fn set(
        &self,
        key: &CacheKey,
        value: String,
        flag: WriteFlag,
        millis: u64,
    ) -> StoreResult<SetStatus> {
        self.entries.insert(key.as_str().to_owned(), value);
        *self.last_write.lock().unwrap() = Some((key.as_str().to_owned(), flag, millis));
        Ok(SetStatus::Written)
    }
}

fn shared_payload() -> Payload {
    let mut payload = Payload::new();
    let name = payload.alloc(Node::String("ada".to_owned()));
    let author = payload.alloc(Node::Object(vec![("name".to_owned(), name)]));
    let root = payload.alloc(Node::Object(vec![
        ("created_by".to_owned(), author),
        ("updated_by".to_owned(), author),
    ]));
    payload.set_root(root);
    payload
}

#[tokio::test]
async fn miss_returns_none() {
    let cache = ApiCache::with_defaults(MockStore::new());
    let request = RequestDescriptor::new(Method::Get, "/users/42");
    let cached = cache.get_cache(&request).await.unwrap();
    assert!(cached.is_none());
}

#[tokio::test]
async fn empty_entry_is_a_miss() {
    let store = MockStore::new();
    let cache = ApiCache::with_defaults(store.clone());
    let request = RequestDescriptor::new(Method::Get, "/users/42");
    store.insert_raw(cache.build_key(&request).as_str(), "");
    assert!(cache.get_cache(&request).await.unwrap().is_none());
}

#[tokio::test]
async fn set_then_get_round_trips_shared_structure() {
    let cache = ApiCache::with_defaults(MockStore::new());
    let request = RequestDescriptor::new(Method::Get, "/documents/7").query("full", "true");

    let payload = shared_payload();
    assert!(cache.set_cache(&request, &payload, None).await.unwrap());

    let cached = cache.get_cache(&request).await.unwrap().unwrap();
    assert_eq!(cached, payload);

    // The two members still alias a single node after the round trip.
    let Some(Node::Object(members)) = cached.get(cached.root()) else {
        panic!("root should be an object");
    };
    assert_eq!(members[0].1, members[1].1);
}

#[tokio::test]
async fn json_round_trip() {
    let cache = ApiCache::with_defaults(MockStore::new());
    let request = RequestDescriptor::new(Method::Get, "/langage/SGML/infos");

    let value = json!({"title": "SGML", "year": 1986});
    assert!(cache.set_json(&request, &value, None).await.unwrap());

    let cached: Option<serde_json::Value> = cache.get_json(&request).await.unwrap();
    assert_eq!(cached, Some(value));
}

#[tokio::test]
async fn default_key_builder_produces_spec_key() {
    let store = MockStore::new();
    let config = CacheConfig::builder().expiration_ms(86_400_000).build().unwrap();
    let cache = ApiCache::new(store.clone(), config);
    let request = RequestDescriptor::new(Method::Get, "/langage/SGML/infos");

    cache.set_json(&request, &json!(null), None).await.unwrap();
    assert_eq!(store.keys(), vec!["get__langage/sgml/infos__".to_owned()]);
}

#[tokio::test]
async fn corrupted_entry_is_an_error_not_a_miss() {
    let store = MockStore::new();
    let cache = ApiCache::with_defaults(store.clone());
    let request = RequestDescriptor::new(Method::Get, "/users/42");

    store.insert_raw(cache.build_key(&request).as_str(), "definitely not base64!!!");
    let result = cache.get_cache(&request).await;
    assert!(matches!(
        result,
        Err(CacheError::Codec(CodecError::Base64(_)))
    ));
}

#[tokio::test]
async fn post_override_builder_is_used_verbatim() {
    let store = MockStore::new();
    let config = CacheConfig::builder()
        .prefix("api:")
        .key_builder(Method::Post, |request, prefix| {
            CacheKey::new(format!("{prefix}POST:{}", request.path()))
        })
        .build()
        .unwrap();
    let cache = ApiCache::new(store.clone(), config);
    let request = RequestDescriptor::new(Method::Post, "/Checkout");

    cache.set_json(&request, &json!({"ok": true}), None).await.unwrap();

    // No lower-casing or other post-processing on the override's result.
    assert_eq!(store.keys(), vec!["api:POST:/Checkout".to_owned()]);
    let cached: Option<serde_json::Value> = cache.get_json(&request).await.unwrap();
    assert_eq!(cached, Some(json!({"ok": true})));

    // Other methods still use the default algorithm.
    let get_request = RequestDescriptor::new(Method::Get, "/Checkout");
    assert_eq!(cache.build_key(&get_request).as_str(), "api:get__checkout__");
}

#[tokio::test]
async fn default_ttl_comes_from_configuration() {
    let store = MockStore::new();
    let config = CacheConfig::builder().expiration_ms(86_400_000).build().unwrap();
    let cache = ApiCache::new(store.clone(), config);
    let request = RequestDescriptor::new(Method::Get, "/reports/daily");

    cache.set_json(&request, &json!([1, 2, 3]), None).await.unwrap();
    let (_, flag, millis) = store.last_write().unwrap();
    assert_eq!(flag, WriteFlag::ExpireInMs);
    assert_eq!(millis, 86_400_000);
}

#[tokio::test]
async fn explicit_ttl_overrides_configuration() {
    let store = MockStore::new();
    let cache = ApiCache::with_defaults(store.clone());
    let request = RequestDescriptor::new(Method::Get, "/reports/daily");

    cache
        .set_json(&request, &json!([1, 2, 3]), Some(Duration::from_secs(5)))
        .await
        .unwrap();
    let (_, flag, millis) = store.last_write().unwrap();
    assert_eq!(flag, WriteFlag::ExpireInMs);
    assert_eq!(millis, 5_000);
}

#[tokio::test]
async fn zero_ttl_is_rejected() {
    let cache = ApiCache::with_defaults(MockStore::new());
    let request = RequestDescriptor::new(Method::Get, "/reports/daily");

    let result = cache
        .set_cache(&request, &Payload::new(), Some(Duration::ZERO))
        .await;
    assert!(matches!(result, Err(CacheError::InvalidTtl)));
}

#[tokio::test]
async fn store_errors_propagate() {
    struct FailingStore;

    #[async_trait]
    impl Store for FailingStore {
        async fn get(&self, _key: &CacheKey) -> StoreResult<Option<String>> {
            Err(apicache::StoreError::ConnectionError(Box::new(
                std::io::Error::other("store is down"),
            )))
        }

        async fn set(
            &self,
            _key: &CacheKey,
            _value: String,
            _flag: WriteFlag,
            _millis: u64,
        ) -> StoreResult<SetStatus> {
            Err(apicache::StoreError::ConnectionError(Box::new(
                std::io::Error::other("store is down"),
            )))
        }
    }

    let cache = ApiCache::with_defaults(FailingStore);
    let request = RequestDescriptor::new(Method::Get, "/users/42");
    assert!(matches!(
        cache.get_cache(&request).await,
        Err(CacheError::Store(_))
    ));
    assert!(matches!(
        cache.set_cache(&request, &Payload::new(), None).await,
        Err(CacheError::Store(_))
    ));
}
