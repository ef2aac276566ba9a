use crate::error::Result;
use url::Url;

/// Builds the storefront URLs handed to the gateway and the browser.
#[derive(Debug, Clone)]
pub struct UrlProvider {
    base: Url,
}

impl UrlProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url)?;
        // Url::join drops the last segment unless the path ends with a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    pub fn return_url(&self) -> Result<Url> {
        Ok(self.base.join("checkout/process")?)
    }

    pub fn webhook_url(&self) -> Result<Url> {
        Ok(self.base.join("checkout/webhook/")?)
    }

    /// Our own process page, keyed by the gateway order id.
    pub fn success_process_url(&self, transaction_id: &str) -> Result<Url> {
        let mut url = self.return_url()?;
        url.query_pairs_mut()
            .append_pair("order_id", transaction_id);
        Ok(url)
    }

    pub fn success_url(&self) -> Result<Url> {
        let mut url = self.base.join("checkout/onepage/success")?;
        url.query_pairs_mut().append_pair("utm_nooverride", "1");
        Ok(url)
    }
}
