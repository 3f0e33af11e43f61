use anyhow::{Context as AnyhowContext, Result};
use std::net::SocketAddr;

pub(crate) async fn resolve_guarded_bind_addrs(
    bind: &str,
    public: bool,
) -> Result<Vec<SocketAddr>> {
    let addrs = resolve_bind_addrs(bind).await?;
    enforce_bind_guard_for_addrs(bind, &addrs, public)?;
    Ok(addrs)
}

async fn resolve_bind_addrs(bind: &str) -> Result<Vec<SocketAddr>> {
    // Prefer resolving via Tokio so "localhost" behaves as expected.
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host(bind)
        .await
        .with_context(|| format!("Failed to resolve bind address: {bind}"))?
        .collect();

    if addrs.is_empty() {
        anyhow::bail!("Bind address resolved to zero socket addrs: {bind}")
    }
    Ok(addrs)
}

// The file API has no authentication, so exposing it beyond loopback must be explicit.
fn enforce_bind_guard_for_addrs(bind: &str, addrs: &[SocketAddr], public: bool) -> Result<()> {
    let any_non_loopback = addrs.iter().any(|addr| !addr.ip().is_loopback());
    if any_non_loopback && !public {
        anyhow::bail!(
            "Refusing to bind to non-loopback address without --public: {bind}. Anyone who can reach the port can read and overwrite files under the root."
        )
    }
    Ok(())
}
