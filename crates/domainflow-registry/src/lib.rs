//! Persona Registry (§4.3) and Proxy Pool (§4.4): validated validator
//! configs, rotation selection, and health-checked proxy inventory with
//! round_robin/random/least_used selection strategies.

pub mod persona;
pub mod proxy;

pub use persona::{validate_config, DnsPersonaConfig, HttpPersonaConfig, PersonaRegistry};
pub use proxy::{ProxyPool, ProxyPoolConfig};
