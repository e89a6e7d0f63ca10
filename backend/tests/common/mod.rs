//! Shared fixture for the integration tests: an in-memory store, the app
//! state over it, and the receiving end of the audit channel.

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use shared::{Actor, AuditRecord, Location, Material, Product, Role};
use tokio::sync::mpsc;
use warehouse_inventory_backend::{
    audit::AuditSink,
    config::{
        AuditConfig, Config, DatabaseConfig, JwtConfig, LedgerConfig, ServerConfig,
        StorageBackend, StorageConfig,
    },
    services::{
        AdjustmentService, LedgerService, ProductionService, ReceivingService, ShipmentService,
    },
    store::{MemoryStore, Stores},
    AppState,
};

pub const JWT_SECRET: &str = "test-secret";

// Helper to create Decimal from string
pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Business time on a fixed day of May 2024
pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
}

pub fn admin() -> Actor {
    Actor::new(1, Role::Admin)
}

pub fn associate() -> Actor {
    Actor::new(2, Role::Associate)
}

pub fn test_config() -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig::default(),
        storage: StorageConfig {
            backend: StorageBackend::Memory,
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 1,
            min_connections: 0,
            acquire_timeout_secs: 1,
            run_migrations: false,
        },
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
            leeway_secs: 0,
        },
        audit: AuditConfig {
            channel_capacity: 64,
        },
        ledger: LedgerConfig::default(),
    }
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    pub audit_rx: mpsc::Receiver<AuditRecord>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let stores = Stores::from_backend(store.clone());
        let (sink, audit_rx) = AuditSink::channel(config.audit.channel_capacity);
        let state = AppState::new(&stores, sink, config);
        Self {
            store,
            state,
            audit_rx,
        }
    }

    pub fn ledger(&self) -> LedgerService {
        LedgerService::from_state(&self.state)
    }

    pub fn receiving(&self) -> ReceivingService {
        ReceivingService::from_state(&self.state)
    }

    pub fn production(&self) -> ProductionService {
        ProductionService::from_state(&self.state)
    }

    pub fn shipments(&self) -> ShipmentService {
        ShipmentService::from_state(&self.state)
    }

    pub fn adjustments(&self) -> AdjustmentService {
        AdjustmentService::from_state(&self.state)
    }

    /// Audit records queued so far
    pub fn drain_audit(&mut self) -> Vec<AuditRecord> {
        let mut records = Vec::new();
        while let Ok(record) = self.audit_rx.try_recv() {
            records.push(record);
        }
        records
    }

    pub async fn material(&self, sku: &str, min_stock: &str) -> Material {
        self.store
            .add_material(sku, &format!("Material {}", sku), "kg", dec(min_stock))
            .await
            .unwrap()
    }

    pub async fn product(&self, sku: &str) -> Product {
        self.store
            .add_product(sku, &format!("Product {}", sku), "ea")
            .await
            .unwrap()
    }

    pub async fn location(&self, code: &str) -> Location {
        self.store
            .add_location(code, Some("Main warehouse"))
            .await
            .unwrap()
    }
}
