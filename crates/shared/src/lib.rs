//! Shared types, errors, configuration and request-pipeline primitives for HRMS.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error taxonomy
//! - Configuration management
//! - JWT issuing and validation
//! - Request context (identity + tenant selection)
//! - Audit event bus, service registry and command mediator
//! - Pagination types for list endpoints

pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod jwt;
pub mod mediator;
pub mod registry;
pub mod tenancy;
pub mod types;

pub use auth::{Claims, TokenKind, TokenPair};
pub use config::AppConfig;
pub use context::{RequestContext, Role, TenantInfo, UserInfo};
pub use error::{AppError, AppResult};
pub use events::{AuditAction, EventBus, LogEvent};
pub use jwt::{JwtConfig, JwtError, JwtService};
pub use mediator::{Handler, Mediator, MediatorBuilder, NoResponse};
pub use registry::{RegistryBuilder, ServiceRegistry};
pub use tenancy::TenantAccessStore;
