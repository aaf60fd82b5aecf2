/* \page ServernameOverview Server Name Record Overview
Persists the selected VPN server name next to a generated WireGuard config.

- Record formats, writing and read-back (`servername.rs`).
- Writer configuration (`config.rs`).
- Audit log appends (`filelog.rs`).
*/
pub mod config;
pub mod filelog;
pub mod servername;

pub use servername::{write_server_name_file, Convention, ServerNameWriter, WriteError};
