use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActorRole {
    Vendor,
    Rider,
    Customer,
    System,
}

/// Identity of the party driving an operation. Always passed in explicitly;
/// authentication happens upstream, this core only checks the role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActorContext {
    pub role: ActorRole,
    pub id: Uuid,
}

impl ActorContext {
    pub fn system() -> Self {
        Self {
            role: ActorRole::System,
            id: Uuid::nil(),
        }
    }
}
