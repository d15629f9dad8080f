use std::collections::HashMap;

use async_trait::async_trait;

use super::repository::{HistoryRepository, RepositoryError};

/// Where the simulation history lives.
///
/// `connection_string` means whatever the named backend says it means; for
/// `sqlite` that is a file path, a `sqlite:` URL or `:memory:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: "selic-history.db".to_string(),
        }
    }
}

/// Opens history stores of one kind.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Returns a migrated repository ready for appends.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn HistoryRepository>, RepositoryError>;
}

/// History backends compiled into the binary.
///
/// Repositories are opened per request; [`RepositoryRegistry::with_repository`]
/// closes them again once the work is done.
#[derive(Default)]
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Registered backend names in alphabetical order.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Opens the history named by `config`.
    ///
    /// An unregistered backend is a [`RepositoryError::Configuration`] that
    /// lists the backends this build knows.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn HistoryRepository>, RepositoryError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                RepositoryError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }

    /// Opens the history, runs `work` against it and closes it, whether or
    /// not `work` succeeded.
    pub async fn with_repository<T>(
        &self,
        config: &DbConfig,
        work: impl AsyncFnOnce(&dyn HistoryRepository) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let repo = self.create(config).await?;
        let outcome = work(repo.as_ref()).await;
        repo.close().await;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::models::{HistoryRecord, NewHistoryRecord};

    use super::{
        DbConfig, HistoryRepository, RepositoryError, RepositoryFactory, RepositoryRegistry,
    };

    /// Counts closes; reads return nothing and appends are refused.
    struct CountingRepository {
        closes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl HistoryRepository for CountingRepository {
        async fn append(
            &self,
            _record: NewHistoryRecord,
        ) -> Result<i64, RepositoryError> {
            Err(RepositoryError::Database("read-only".to_string()))
        }
        async fn get(
            &self,
            _id: i64,
        ) -> Result<HistoryRecord, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn list_all(&self) -> Result<Vec<HistoryRecord>, RepositoryError> {
            Ok(Vec::new())
        }
        async fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct CountingFactory {
        name: &'static str,
        opened: Arc<AtomicBool>,
        closes: Arc<AtomicUsize>,
    }

    impl CountingFactory {
        fn named(name: &'static str) -> Self {
            Self {
                name,
                opened: Arc::new(AtomicBool::new(false)),
                closes: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl RepositoryFactory for CountingFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn HistoryRepository>, RepositoryError> {
            self.opened.store(true, Ordering::SeqCst);
            Ok(Box::new(CountingRepository {
                closes: self.closes.clone(),
            }))
        }
    }

    struct FailingFactory;

    #[async_trait]
    impl RepositoryFactory for FailingFactory {
        fn backend_name(&self) -> &'static str {
            "failing"
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn HistoryRepository>, RepositoryError> {
            Err(RepositoryError::Connection("disk unavailable".to_string()))
        }
    }

    fn config(backend: &str) -> DbConfig {
        DbConfig {
            backend: backend.to_string(),
            connection_string: ":memory:".to_string(),
        }
    }

    fn registry_with(factory: CountingFactory) -> (RepositoryRegistry, Arc<AtomicUsize>) {
        let closes = factory.closes.clone();
        let mut registry = RepositoryRegistry::new();
        registry.register(Box::new(factory));
        (registry, closes)
    }

    #[test]
    fn default_history_is_a_local_sqlite_file() {
        assert_eq!(
            DbConfig::default(),
            DbConfig {
                backend: "sqlite".to_string(),
                connection_string: "selic-history.db".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn create_opens_only_the_named_backend() {
        let sqlite = CountingFactory::named("sqlite");
        let memory = CountingFactory::named("memory");
        let (sqlite_opened, memory_opened) = (sqlite.opened.clone(), memory.opened.clone());
        let mut registry = RepositoryRegistry::new();
        registry.register(Box::new(sqlite));
        registry.register(Box::new(memory));

        registry.create(&config("memory")).await.unwrap();

        assert!(memory_opened.load(Ordering::SeqCst));
        assert!(!sqlite_opened.load(Ordering::SeqCst));
        assert_eq!(registry.available_backends(), vec!["memory", "sqlite"]);
    }

    #[tokio::test]
    async fn unknown_backend_lists_what_is_compiled_in() {
        let (registry, _) = registry_with(CountingFactory::named("sqlite"));

        match registry.create(&config("postgres")).await {
            Err(RepositoryError::Configuration(msg)) => {
                assert!(msg.contains("'postgres'"));
                assert!(msg.contains("[\"sqlite\"]"));
            }
            Err(other) => panic!("expected Configuration error, got {other:#?}"),
            Ok(_) => panic!("expected Configuration error, got a repository"),
        }
    }

    #[tokio::test]
    async fn with_repository_closes_after_success() {
        let (registry, closes) = registry_with(CountingFactory::named("sqlite"));

        let records = registry
            .with_repository(&config("sqlite"), async |repo| repo.list_all().await)
            .await;

        assert_eq!(records, Ok(Vec::new()));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn with_repository_closes_after_failed_work() {
        let (registry, closes) = registry_with(CountingFactory::named("sqlite"));

        let missing = registry
            .with_repository(&config("sqlite"), async |repo| repo.get(42).await)
            .await;

        assert_eq!(missing, Err(RepositoryError::NotFound));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn with_repository_skips_work_when_open_fails() {
        let mut registry = RepositoryRegistry::new();
        registry.register(Box::new(FailingFactory));
        let ran = AtomicBool::new(false);

        let result = registry
            .with_repository(&config("failing"), async |_repo| {
                ran.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert_eq!(
            result,
            Err(RepositoryError::Connection("disk unavailable".to_string()))
        );
        assert!(!ran.load(Ordering::SeqCst));
    }
}
