use kanban_core::{CredentialStore, KvStore, TaskStore, credentials::MIN_COST};
use tempfile::TempDir;

pub struct TestContext {
    #[allow(dead_code)] // dir is kept so the database outlives the test body
    pub dir: TempDir,
    pub kv: KvStore,
}

impl TestContext {
    #[allow(dead_code)]
    pub fn credentials(&self) -> CredentialStore {
        CredentialStore::with_cost(self.kv.clone(), MIN_COST)
    }

    #[allow(dead_code)]
    pub fn tasks(&self) -> TaskStore {
        TaskStore::new(self.kv.clone())
    }

    /// Opens a second handle on the same database file, as a restarted app would.
    #[allow(dead_code)]
    pub fn reopen(&self) -> anyhow::Result<KvStore> {
        Ok(KvStore::open(self.dir.path())?)
    }
}

pub fn setup() -> anyhow::Result<TestContext> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
    let dir = tempfile::tempdir()?;
    let kv = KvStore::open(dir.path())?;
    Ok(TestContext { dir, kv })
}
