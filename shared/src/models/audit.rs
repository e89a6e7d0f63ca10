//! Audit trail records

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Login,
    Logout,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Login => "LOGIN",
            AuditAction::Logout => "LOGOUT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEntityKind {
    User,
    Material,
    Product,
    Location,
    Receipt,
    Production,
    Shipment,
    InventoryAdjustment,
}

impl AuditEntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEntityKind::User => "USER",
            AuditEntityKind::Material => "MATERIAL",
            AuditEntityKind::Product => "PRODUCT",
            AuditEntityKind::Location => "LOCATION",
            AuditEntityKind::Receipt => "RECEIPT",
            AuditEntityKind::Production => "PRODUCTION",
            AuditEntityKind::Shipment => "SHIPMENT",
            AuditEntityKind::InventoryAdjustment => "INVENTORY_ADJUSTMENT",
        }
    }
}

/// One audit trail entry, written after the business transaction commits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub actor_id: i64,
    pub action: AuditAction,
    pub entity_kind: AuditEntityKind,
    pub entity_id: Option<i64>,
    pub description: String,
    pub metadata: serde_json::Value,
}

impl AuditRecord {
    pub fn created(
        actor_id: i64,
        entity_kind: AuditEntityKind,
        entity_id: i64,
        description: String,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            actor_id,
            action: AuditAction::Create,
            entity_kind,
            entity_id: Some(entity_id),
            description,
            metadata,
        }
    }
}
