use async_trait::async_trait;
use jiff::Timestamp;
use parking_lot::RwLock;
use shorty_core::{BackendKind, Repository, Result, ShortLink, StorageError};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
struct State {
    links: HashMap<String, ShortLink>,
    ids: HashSet<u64>,
    last_id: u64,
}

/// In-memory implementation of the Repository trait.
///
/// A single reader/writer lock guards both the map and the id counter, so
/// id assignment and insertion happen as one step and click increments
/// never interleave. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: RwLock<State>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn save(&self, mut link: ShortLink) -> Result<ShortLink> {
        let mut state = self.state.write();

        if state.links.contains_key(&link.short) {
            return Err(StorageError::DuplicateKey(link.short));
        }

        if !link.is_saved() {
            state.last_id += 1;
            link.id = state.last_id;
        } else if state.ids.contains(&link.id) {
            return Err(StorageError::duplicate_id(link.id));
        } else {
            state.last_id = state.last_id.max(link.id);
        }
        link.created_at.get_or_insert_with(Timestamp::now);

        state.ids.insert(link.id);
        state.links.insert(link.short.clone(), link.clone());
        Ok(link)
    }

    async fn get(&self, short: &str) -> Result<ShortLink> {
        self.state
            .read()
            .links
            .get(short)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(short.to_string()))
    }

    async fn increment_clicks(&self, short: &str) -> Result<()> {
        let mut state = self.state.write();

        let Some(link) = state.links.get_mut(short) else {
            return Err(StorageError::NotFound(short.to_string()));
        };

        link.clicks += 1;
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<ShortLink>> {
        let mut links: Vec<ShortLink> = self.state.read().links.values().cloned().collect();
        links.sort_by(ShortLink::newest_first);
        Ok(links)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn save_and_get() {
        let repo = InMemoryRepository::new();

        repo.save(ShortLink::new("https://example.com", "abc123"))
            .await
            .unwrap();

        let link = repo.get("abc123").await.unwrap();
        assert_eq!(link.original, "https://example.com");
        assert_eq!(link.clicks, 0);
        assert_eq!(link.id, 1);
        assert!(link.created_at.is_some());
    }

    #[tokio::test]
    async fn three_clicks_are_counted() {
        let repo = InMemoryRepository::new();
        repo.save(ShortLink::new("https://example.com", "abc123"))
            .await
            .unwrap();

        for _ in 0..3 {
            repo.increment_clicks("abc123").await.unwrap();
        }

        assert_eq!(repo.get("abc123").await.unwrap().clicks, 3);
    }

    #[tokio::test]
    async fn get_nonexistent() {
        let repo = InMemoryRepository::new();

        let err = repo.get("nope").await.unwrap_err();
        assert_eq!(err, StorageError::NotFound("nope".to_string()));
    }

    #[tokio::test]
    async fn save_conflict_keeps_first_record() {
        let repo = InMemoryRepository::new();

        repo.save(ShortLink::new("https://example.com", "abc123"))
            .await
            .unwrap();

        let err = repo
            .save(ShortLink::new("https://other.com", "abc123"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::DuplicateKey(_)));
        assert_eq!(
            repo.get("abc123").await.unwrap().original,
            "https://example.com"
        );
    }

    #[tokio::test]
    async fn caller_supplied_fields_are_kept() {
        let repo = InMemoryRepository::new();
        let created_at = Timestamp::from_second(1_700_000_000).unwrap();

        let link = ShortLink {
            id: 41,
            created_at: Some(created_at),
            ..ShortLink::new("https://example.com", "fixed")
        };
        let stored = repo.save(link).await.unwrap();
        assert_eq!(stored.id, 41);
        assert_eq!(stored.created_at, Some(created_at));

        // The counter continues past ids it has already seen.
        let next = repo
            .save(ShortLink::new("https://example.com", "next"))
            .await
            .unwrap();
        assert_eq!(next.id, 42);
    }

    #[tokio::test]
    async fn explicit_id_already_in_use_is_rejected() {
        let repo = InMemoryRepository::new();
        repo.save(ShortLink::new("https://example.com", "first"))
            .await
            .unwrap();

        let err = repo
            .save(ShortLink {
                id: 1,
                ..ShortLink::new("https://example.com", "second")
            })
            .await
            .unwrap_err();

        assert_eq!(err, StorageError::duplicate_id(1));
        assert!(repo.get("second").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn increment_nonexistent() {
        let repo = InMemoryRepository::new();

        let err = repo.increment_clicks("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn close_is_a_no_op() {
        let repo = InMemoryRepository::new();
        repo.save(ShortLink::new("https://example.com", "abc123"))
            .await
            .unwrap();

        repo.close().await.unwrap();

        assert!(repo.get("abc123").await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_saves_get_distinct_ids() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut handles = vec![];

        for i in 0..10u64 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.save(ShortLink::new(
                    format!("https://example{}.com", i),
                    format!("code-{:03}", i),
                ))
                .await
                .unwrap()
                .id
            }));
        }

        let mut ids = vec![];
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();

        assert_eq!(ids, (1..=10).collect::<Vec<u64>>());
    }
}
