use alloy::{
    network::{Ethereum, EthereumWallet},
    providers::{Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};
use eyre::{Error, Result};
use std::str::FromStr;
use url::Url;

/// Parses the RPC endpoint
fn rpc_url(rpc_url: &str) -> Result<Url> {
    Url::parse(rpc_url).map_err(|e| Error::msg(format!("Invalid RPC url {rpc_url}: {e}")))
}

/// Parses a hex private key, with or without `0x` prefix
///
/// # Errors
/// * If the key is not a valid secp256k1 secret
pub fn parse_signer(private_key: &str) -> Result<PrivateKeySigner> {
    PrivateKeySigner::from_str(private_key.trim())
        .map_err(|e| Error::msg(format!("Invalid PRIVATE_KEY: {e}")))
}

/// Creates a read-only HTTP provider
///
/// # Errors
/// * If the RPC url cannot be parsed
pub fn create_http_provider(url: &str) -> Result<impl Provider<Ethereum> + Clone> {
    Ok(ProviderBuilder::new().on_http(rpc_url(url)?))
}

/// Creates an HTTP provider that signs transactions with `signer`
///
/// # Errors
/// * If the RPC url cannot be parsed
pub fn create_wallet_provider(
    url: &str,
    signer: PrivateKeySigner,
) -> Result<impl Provider<Ethereum> + Clone> {
    Ok(ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .on_http(rpc_url(url)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_signer() {
        // anvil's first dev account
        let key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let signer = parse_signer(key).unwrap();
        assert_eq!(
            signer.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                .parse::<alloy::primitives::Address>()
                .unwrap()
        );

        let unprefixed = parse_signer(key.trim_start_matches("0x")).unwrap();
        assert_eq!(unprefixed.address(), signer.address());

        assert!(parse_signer("0x1234").is_err());
    }

    #[test]
    fn test_invalid_rpc_url() {
        assert!(create_http_provider("not a url").is_err());
        assert!(create_http_provider("http://localhost:8545").is_ok());
    }
}
