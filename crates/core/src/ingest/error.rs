use std::fmt;

/// Provider-side failure for one ticker, carrying the provider's own code when it sent one.
#[derive(Debug, Clone)]
pub struct ProviderError {
    pub provider: &'static str,
    pub ticker: String,
    pub code: String,
    pub detail: String,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "market data error (provider={}, ticker={}, code={}): {}",
            self.provider, self.ticker, self.code, self.detail
        )
    }
}

impl std::error::Error for ProviderError {}
