use super::resolver::{DiscoveryResolver, DiscoveryTarget, RetryPolicy};
use crate::config::{DiscoveryEnvConfig, StorageEnvConfig};
use crate::domain::discovery::{DiscoveredValue, Extraction};
use crate::domain::ports::{AddressVerifier, Notifier, RemoteSource};
use crate::infrastructure::discovery::{AddressFormatVerifier, VerifierChain};
use crate::infrastructure::persistence::DiscoveryCache;
use anyhow::Result;
use std::sync::Arc;

/// The two live addresses every prediction cycle needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEndpoints {
    pub contract: DiscoveredValue,
    pub relayer: DiscoveredValue,
}

/// Resolves the active prediction contract and the busiest relayer.
pub struct DiscoveryService {
    resolver: DiscoveryResolver,
    contract: DiscoveryTarget,
    relayer: DiscoveryTarget,
    contract_verifier: Arc<dyn AddressVerifier>,
    relayer_verifier: Arc<dyn AddressVerifier>,
}

impl DiscoveryService {
    pub fn new(
        resolver: DiscoveryResolver,
        contract: DiscoveryTarget,
        relayer: DiscoveryTarget,
        contract_verifier: Arc<dyn AddressVerifier>,
        relayer_verifier: Arc<dyn AddressVerifier>,
    ) -> Self {
        Self {
            resolver,
            contract,
            relayer,
            contract_verifier,
            relayer_verifier,
        }
    }

    pub fn from_config(
        discovery: &DiscoveryEnvConfig,
        storage: &StorageEnvConfig,
        source: Arc<dyn RemoteSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let resolver = DiscoveryResolver::new(
            source,
            notifier,
            RetryPolicy {
                attempts: discovery.retries,
                delay: discovery.retry_delay,
            },
        );

        let contract = DiscoveryTarget {
            name: "Predictoor contract".to_string(),
            sources: discovery.contract_sources.clone(),
            extraction: Extraction::ContractRegistry {
                networks: discovery.networks.clone(),
                contract_key: discovery.contract_key.clone(),
            },
            cache: DiscoveryCache::contract(&storage.contract_cache_path),
            fallback: discovery.fallback_contract.clone(),
        };

        let relayer = DiscoveryTarget {
            name: "Gelato relayer".to_string(),
            sources: discovery.relayer_sources.clone(),
            extraction: Extraction::BestRelayer,
            cache: DiscoveryCache::relayer(&storage.relayer_cache_path),
            fallback: discovery.fallback_relayer.clone(),
        };

        Self::new(
            resolver,
            contract,
            relayer,
            Arc::new(VerifierChain::for_contracts(
                discovery.verify_rpc_url.as_deref(),
                discovery.http_timeout,
            )),
            Arc::new(AddressFormatVerifier),
        )
    }

    pub async fn resolve_contract(&self) -> Result<DiscoveredValue> {
        self.resolver
            .resolve(&self.contract, Some(self.contract_verifier.as_ref()))
            .await
    }

    pub async fn resolve_relayer(&self) -> Result<DiscoveredValue> {
        self.resolver
            .resolve(&self.relayer, Some(self.relayer_verifier.as_ref()))
            .await
    }

    /// Contract first, then relayer.
    pub async fn resolve_all(&self) -> Result<ActiveEndpoints> {
        let contract = self.resolve_contract().await?;
        let relayer = self.resolve_relayer().await?;
        Ok(ActiveEndpoints { contract, relayer })
    }
}
