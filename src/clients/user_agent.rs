//! Client identification string sent with every request.

use std::sync::OnceLock;

use crate::auth::signature::SIGNER_VERSION;

/// Crate version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Identity of the underlying HTTP client library.
pub const HTTP_CLIENT_IDENTITY: &str = "reqwest/0.11";

/// Returns the client identity, computed once per process.
///
/// The string is made of, separated by single spaces and in this order:
/// the crate version, the signature scheme version, the HTTP client
/// library, the Rust toolchain and the operating system name/release.
///
/// ```rust
/// let agent = exoscale::clients::user_agent();
/// assert!(agent.starts_with("Exoscale-Rust/"));
/// assert_eq!(agent.split(' ').count(), 5);
/// ```
#[must_use]
pub fn user_agent() -> &'static str {
    static USER_AGENT: OnceLock<String> = OnceLock::new();
    USER_AGENT.get_or_init(|| {
        let os_name = sysinfo::System::name().unwrap_or_else(|| std::env::consts::OS.to_string());
        let os_release = sysinfo::System::kernel_version().unwrap_or_else(|| "unknown".to_string());
        compose_user_agent(&os_name, &os_release)
    })
}

fn compose_user_agent(os_name: &str, os_release: &str) -> String {
    let rust_version = env!("CARGO_PKG_RUST_VERSION");
    format!(
        "Exoscale-Rust/{SDK_VERSION} exo2-sig/{SIGNER_VERSION} {HTTP_CLIENT_IDENTITY} Rust/{rust_version} {}/{}",
        no_spaces(os_name),
        no_spaces(os_release)
    )
}

/// OS names such as "Arch Linux" would break the space-separated layout.
fn no_spaces(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join("-")
}
