//! Credential rotation and retrieval CLI.
//!
//! Rotates passwords and SSH public keys in an LDAP directory with verified
//! mutations, and reads/writes/lists secrets in a Vault-style store over the
//! KV2 or logical API.
//!
//! ## Modules
//! - `cli` — Command-line handlers
//! - `core` — Business logic (profiles, target resolution, rotation, store)
//! - `models` — Data structures
//! - `util` — Adapters (ldap3, vault HTTP, prompts)

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod util;
