use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::store::FlagStore;
use crate::{
    crypto,
    error::{AppError, AppResult},
    modules::Module,
    state::AppState,
};

const FLAG_PREFIX: &str = "flag";

/// Derives per-user flags and checks submissions against them.
#[derive(Clone)]
pub struct FlagHandler {
    store: Arc<dyn FlagStore>,
}

impl FromRef<AppState> for FlagHandler {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.flags.clone())
    }
}

impl FlagHandler {
    pub fn new(store: Arc<dyn FlagStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn FlagStore {
        self.store.as_ref()
    }

    /// `flag{hex(HMAC-SHA512(server_key, user_key || module_key || "flag"))}`
    pub fn dynamic_flag(server_key: &[u8], user_key: &[u8], module_key: &[u8]) -> anyhow::Result<String> {
        let mut message = Vec::with_capacity(user_key.len() + module_key.len() + FLAG_PREFIX.len());
        message.extend_from_slice(user_key);
        message.extend_from_slice(module_key);
        message.extend_from_slice(FLAG_PREFIX.as_bytes());
        let mac = crypto::hmac_sha512(server_key, &message)?;
        Ok(format!("{FLAG_PREFIX}{{{}}}", hex::encode(mac)))
    }

    pub async fn get_dynamic_flag(&self, user_id: Uuid, module: &Module) -> AppResult<String> {
        if module.is_flag_static {
            return Err(AppError::Conflict(format!(
                "Module {} has a static flag",
                module.name
            )));
        }
        let user_key = self.store.user_key(user_id).await?;
        let server_key = self.store.server_key().await?;
        Ok(Self::dynamic_flag(&server_key, &user_key, &module.module_key)?)
    }

    /// Static modules yield their fixed flag; dynamic modules a per-user one.
    pub async fn get_flag_for(&self, user_id: Uuid, module: &Module) -> AppResult<String> {
        if module.is_flag_static {
            // The user must still exist for a static flag to be handed out.
            self.store.user_key(user_id).await?;
            return module.static_flag.clone().ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "module {} is static but has no flag",
                    module.name
                ))
            });
        }
        self.get_dynamic_flag(user_id, module).await
    }

    pub async fn get_flag(&self, user_id: Uuid, module_name: &str) -> AppResult<String> {
        let module = self.require_module(module_name).await?;
        self.get_flag_for(user_id, &module).await
    }

    #[instrument(skip(self, module, submitted), fields(module = %module.name))]
    pub async fn verify_flag_for(&self, user_id: Uuid, module: &Module, submitted: &str) -> AppResult<bool> {
        let expected = self.get_flag_for(user_id, module).await?;
        let valid = expected.eq_ignore_ascii_case(submitted.trim());
        debug!(%user_id, valid, "flag verified");
        Ok(valid)
    }

    pub async fn verify_flag(&self, user_id: Uuid, module_name: &str, submitted: &str) -> AppResult<bool> {
        let module = self.require_module(module_name).await?;
        self.verify_flag_for(user_id, &module, submitted).await
    }

    async fn require_module(&self, module_name: &str) -> AppResult<Module> {
        self.store
            .find_module(module_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Module {module_name} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::store::MemoryFlagStore;

    fn handler_with(store: Arc<MemoryFlagStore>) -> FlagHandler {
        FlagHandler::new(store)
    }

    #[test]
    fn dynamic_flag_has_prefix_and_hex_body() {
        let flag = FlagHandler::dynamic_flag(b"server", b"user", b"module").unwrap();
        assert!(flag.starts_with("flag{"));
        assert!(flag.ends_with('}'));
        let body = &flag[5..flag.len() - 1];
        assert_eq!(body.len(), 128);
        assert!(body.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn dynamic_flag_depends_on_every_key() {
        let base = FlagHandler::dynamic_flag(b"server", b"user", b"module").unwrap();
        assert_eq!(base, FlagHandler::dynamic_flag(b"server", b"user", b"module").unwrap());
        assert_ne!(base, FlagHandler::dynamic_flag(b"other", b"user", b"module").unwrap());
        assert_ne!(base, FlagHandler::dynamic_flag(b"server", b"other", b"module").unwrap());
        assert_ne!(base, FlagHandler::dynamic_flag(b"server", b"user", b"other").unwrap());
    }

    #[tokio::test]
    async fn dynamic_flags_differ_between_users() {
        let store = Arc::new(MemoryFlagStore::new());
        store.add_module(Module::dynamic("XSS"));
        let alice = store.add_user();
        let bob = store.add_user();
        let handler = handler_with(store);

        let a = handler.get_flag(alice, "XSS").await.unwrap();
        let b = handler.get_flag(bob, "XSS").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn dynamic_flag_verifies_case_insensitively() {
        let store = Arc::new(MemoryFlagStore::new());
        store.add_module(Module::dynamic("XSS"));
        let user = store.add_user();
        let other = store.add_user();
        let handler = handler_with(store);

        let flag = handler.get_flag(user, "XSS").await.unwrap();
        assert!(handler.verify_flag(user, "XSS", &flag.to_uppercase()).await.unwrap());
        assert!(!handler.verify_flag(user, "XSS", "flag{nope}").await.unwrap());

        // Another user's flag is not valid for this user.
        let foreign = handler.get_flag(other, "XSS").await.unwrap();
        assert!(!handler.verify_flag(user, "XSS", &foreign).await.unwrap());
    }

    #[tokio::test]
    async fn static_flag_is_shared_and_verified() {
        let store = Arc::new(MemoryFlagStore::new());
        store.add_module(Module::dynamic("Poor Data Validation").with_static_flag("StaticFlag123"));
        let user = store.add_user();
        let handler = handler_with(store);

        assert_eq!(
            handler.get_flag(user, "Poor Data Validation").await.unwrap(),
            "StaticFlag123"
        );
        assert!(handler
            .verify_flag(user, "Poor Data Validation", "staticflag123")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn unknown_module_is_not_found() {
        let store = Arc::new(MemoryFlagStore::new());
        let user = store.add_user();
        let err = handler_with(store).get_flag(user, "Missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn unknown_user_propagates_not_found() {
        let store = Arc::new(MemoryFlagStore::new());
        store.add_module(Module::dynamic("XSS"));
        let err = handler_with(store)
            .get_flag(Uuid::new_v4(), "XSS")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
