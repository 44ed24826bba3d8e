// Validation module - trust decisions for inbound and outbound connections
//
// The transport layer invokes these validators during handshake completion
// and treats a rejection as "abort the connection". Validators hold no
// mutable state besides the shared status cache and are safe to invoke
// concurrently without external synchronization.

pub mod peer;
pub mod server;

pub use peer::PeerCertificateValidator;
pub use server::ServerCertificateValidator;
