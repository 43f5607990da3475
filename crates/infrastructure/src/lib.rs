//! Infrastructure adapters for Rolegate application ports.

#![forbid(unsafe_code)]

mod in_memory_assignment_repository;
mod in_memory_entity_directory;
mod in_memory_policy_repository;
mod in_memory_record_store;
mod postgres_assignment_repository;
mod postgres_entity_directory;
mod postgres_policy_repository;
mod postgres_record_store;

pub use in_memory_assignment_repository::{InMemoryAssignmentRepository, InMemoryProfileRepository};
pub use in_memory_entity_directory::InMemoryEntityDirectory;
pub use in_memory_policy_repository::InMemoryPolicyRepository;
pub use in_memory_record_store::InMemoryRecordStore;
pub use postgres_assignment_repository::{PostgresAssignmentRepository, PostgresProfileRepository};
pub use postgres_entity_directory::PostgresEntityDirectory;
pub use postgres_policy_repository::PostgresPolicyRepository;
pub use postgres_record_store::PostgresRecordStore;
