//! Network services.

use std::fmt;
use std::time::Duration;

use sequoia_net::wkd;

use crate::Error;

const TRACE: bool = false;

/// User agent for http communications.
pub const USER_AGENT: &str =
    concat!("torbrowser-launcher/", env!("CARGO_PKG_VERSION"));

/// How long to wait for the initial http connection.
pub const CONNECT_TIMEOUT: Duration = Duration::new(30, 0);

/// How long to wait for each individual http request.
pub const REQUEST_TIMEOUT: Duration = Duration::new(120, 0);

/// The largest response body we accept.
///
/// Signing keys are a few KiB.
pub const MAX_RESPONSE_SIZE: usize = 1 << 20;

/// Routes requests through a proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    url: String,
}

impl ProxyConfig {
    /// Returns a proxy configuration for Tor's SOCKS port at
    /// `address`, e.g. `127.0.0.1:9050`.
    ///
    /// Host names are resolved by the proxy.
    pub fn socks5h(address: &str) -> Self {
        ProxyConfig {
            url: format!("socks5h://{}", address),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Retrieves documents over the network.
pub trait Fetch {
    /// Returns the body of `url`.
    ///
    /// Fails with [`Error::Fetch`] on transport errors and non-success
    /// responses.  Implementations must bound the time they block.
    fn fetch(&self, url: &str, proxy: Option<&ProxyConfig>)
             -> Result<Vec<u8>, Error>;
}

/// Fetches using reqwest.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    connect_timeout: Duration,
    timeout: Duration,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        HttpFetcher {
            connect_timeout: CONNECT_TIMEOUT,
            timeout: REQUEST_TIMEOUT,
        }
    }
}

impl HttpFetcher {
    /// Makes a http client.
    fn http_client(&self, proxy: Option<&ProxyConfig>)
                   -> anyhow::Result<reqwest::Client>
    {
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout);
        // Only the settings decide how requests are routed.
        builder = match proxy {
            Some(proxy) => builder.proxy(reqwest::Proxy::all(proxy.url())?),
            None => builder.no_proxy(),
        };
        Ok(builder.build()?)
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str, proxy: Option<&ProxyConfig>)
             -> Result<Vec<u8>, Error>
    {
        tracer!(TRACE, "HttpFetcher::fetch");
        t!("fetching {} (proxy: {:?})", url, proxy);

        let fetch_error = |reason: String| Error::Fetch {
            url: url.into(),
            reason,
        };

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| fetch_error(e.to_string()))?;

        rt.block_on(async {
            let client = self.http_client(proxy)
                .map_err(|e| fetch_error(crate::one_line_error_chain(e)))?;
            let mut response = client.get(url).send().await
                .map_err(|e| fetch_error(e.to_string()))?;

            let status = response.status();
            t!("{}: {}", url, status);
            if ! status.is_success() {
                return Err(fetch_error(format!("status code = {}", status)));
            }

            if let Some(len) = response.content_length() {
                if len > MAX_RESPONSE_SIZE as u64 {
                    return Err(fetch_error(too_large()));
                }
            }

            let mut body = Vec::new();
            while let Some(chunk) = response.chunk().await
                .map_err(|e| fetch_error(e.to_string()))?
            {
                append_limited(&mut body, &chunk, MAX_RESPONSE_SIZE)
                    .map_err(fetch_error)?;
            }
            Ok::<_, Error>(body)
        })
    }
}

fn too_large() -> String {
    format!("response exceeds {} bytes", MAX_RESPONSE_SIZE)
}

/// Appends `chunk` to `body`, unless that makes it larger than
/// `limit`.
fn append_limited(body: &mut Vec<u8>, chunk: &[u8], limit: usize)
                  -> Result<(), String>
{
    if body.len().saturating_add(chunk.len()) > limit {
        return Err(too_large());
    }
    body.extend_from_slice(chunk);
    Ok(())
}

/// Returns the Web Key Directory URL for `email`.
///
/// This uses the direct method, which is served by the domain
/// itself.
pub fn wkd_url(email: &str) -> anyhow::Result<String> {
    let url = wkd::Url::from(email)?;
    Ok(url.to_url(wkd::Variant::Direct)?.to_string())
}
