pub mod http_source;
pub mod verifiers;

pub use http_source::HttpRemoteSource;
pub use verifiers::{AddressFormatVerifier, RpcCodeVerifier, VerifierChain};
