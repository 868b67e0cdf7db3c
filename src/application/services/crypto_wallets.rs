//! # Crypto Wallets
//!
//! Platform wallet addresses disclosed when the buyer picks `Crypto`.
//! Nothing is verified on chain; the buyer acknowledges the transfer
//! locally before the trade is initiated.

/// QR rendering service; the address is appended as `data`.
const QR_ENDPOINT: &str = "https://api.qrserver.com/v1/create-qr-code/?size=200x200&data=";

/// One supported network and its deposit address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CryptoWallet {
    /// Network name.
    pub network: &'static str,
    /// Platform deposit address.
    pub address: &'static str,
}

impl CryptoWallet {
    /// URL of a QR image encoding the address.
    #[must_use]
    pub fn qr_url(&self) -> String {
        format!("{QR_ENDPOINT}{}", self.address)
    }
}

/// Networks offered, in display order.
pub const CRYPTO_WALLETS: [CryptoWallet; 5] = [
    CryptoWallet {
        network: "Bitcoin",
        address: "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa",
    },
    CryptoWallet {
        network: "Ethereum",
        address: "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb",
    },
    CryptoWallet {
        network: "USDT",
        address: "TN3W4H6rK2ce4vX9YnFQHwKENnHjoxb3m9",
    },
    CryptoWallet {
        network: "BNB",
        address: "bnb1grpf0955h0ykzq3ar5nmum7y6gdfl6lxfn46h2",
    },
    CryptoWallet {
        network: "Solana",
        address: "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU",
    },
];

/// Looks a network up by name, case-insensitively.
#[must_use]
pub fn wallet_for(network: &str) -> Option<&'static CryptoWallet> {
    CRYPTO_WALLETS
        .iter()
        .find(|w| w.network.eq_ignore_ascii_case(network.trim()))
}
