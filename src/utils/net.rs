// Network utilities - best-effort DNS resolution for domain validation

use hickory_resolver::config::*;
use hickory_resolver::TokioAsyncResolver;
use std::net::IpAddr;

/// Resolve a hostname to IP addresses, best effort.
///
/// IP literals short-circuit without a lookup. Resolver failures yield an
/// empty set rather than an error: domain validation treats "could not
/// resolve" as "no match" (fail closed).
pub async fn resolve_host_addrs(host: &str) -> Vec<IpAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return vec![ip];
    }

    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
    match resolver.lookup_ip(host).await {
        Ok(response) => response.iter().collect(),
        Err(e) => {
            tracing::debug!("DNS resolution failed for {}: {}", host, e);
            Vec::new()
        }
    }
}
