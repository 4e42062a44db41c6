use async_trait::async_trait;

/// Device compromise (root / jailbreak) check.
#[async_trait]
pub trait IntegrityCheck: Send + Sync {
    async fn is_compromised(&self) -> bool;
}

/// Always reports a clean device. Swap in a platform check when one exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubIntegrityCheck;

#[async_trait]
impl IntegrityCheck for StubIntegrityCheck {
    async fn is_compromised(&self) -> bool {
        false
    }
}
