use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    modules::{self, Module},
    server_key, users,
};

/// Key material and module lookups needed to derive and check flags.
#[async_trait]
pub trait FlagStore: Send + Sync {
    async fn server_key(&self) -> AppResult<Vec<u8>>;
    /// Fails with `NotFound` when the user does not exist.
    async fn user_key(&self, user_id: Uuid) -> AppResult<Vec<u8>>;
    async fn find_module(&self, name: &str) -> AppResult<Option<Module>>;
    async fn ensure_module(&self, name: &str) -> AppResult<Module>;
}

#[derive(Clone)]
pub struct PgFlagStore {
    db: PgPool,
}

impl PgFlagStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FlagStore for PgFlagStore {
    async fn server_key(&self) -> AppResult<Vec<u8>> {
        Ok(server_key::get_or_create(&self.db).await?)
    }

    async fn user_key(&self, user_id: Uuid) -> AppResult<Vec<u8>> {
        users::services::find_key_by_id(&self.db, user_id).await
    }

    async fn find_module(&self, name: &str) -> AppResult<Option<Module>> {
        modules::services::find_by_name(&self.db, name).await
    }

    async fn ensure_module(&self, name: &str) -> AppResult<Module> {
        let (module, _) = modules::services::ensure_module(&self.db, name).await?;
        Ok(module)
    }
}

#[cfg(test)]
pub use memory::MemoryFlagStore;

#[cfg(test)]
mod memory {
    use std::{collections::HashMap, sync::Mutex};

    use super::*;
    use crate::{crypto, error::AppError};

    /// In-memory store used by handler and flag tests.
    pub struct MemoryFlagStore {
        server_key: Vec<u8>,
        users: Mutex<HashMap<Uuid, Vec<u8>>>,
        modules: Mutex<HashMap<String, Module>>,
    }

    impl MemoryFlagStore {
        pub fn new() -> Self {
            Self {
                server_key: crypto::random_key(),
                users: Mutex::new(HashMap::new()),
                modules: Mutex::new(HashMap::new()),
            }
        }

        pub fn add_user(&self) -> Uuid {
            let id = Uuid::new_v4();
            self.users.lock().unwrap().insert(id, crypto::random_key());
            id
        }

        pub fn add_module(&self, module: Module) {
            self.modules.lock().unwrap().insert(module.name.clone(), module);
        }

        pub fn module_count(&self) -> usize {
            self.modules.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl FlagStore for MemoryFlagStore {
        async fn server_key(&self) -> AppResult<Vec<u8>> {
            Ok(self.server_key.clone())
        }

        async fn user_key(&self, user_id: Uuid) -> AppResult<Vec<u8>> {
            self.users
                .lock()
                .unwrap()
                .get(&user_id)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("User id {user_id} not found")))
        }

        async fn find_module(&self, name: &str) -> AppResult<Option<Module>> {
            Ok(self.modules.lock().unwrap().get(name).cloned())
        }

        async fn ensure_module(&self, name: &str) -> AppResult<Module> {
            let mut modules = self.modules.lock().unwrap();
            Ok(modules
                .entry(name.to_string())
                .or_insert_with(|| Module::dynamic(name))
                .clone())
        }
    }
}
