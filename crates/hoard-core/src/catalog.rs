//! JSON-over-HTTP catalog driven by URL templates from `[remote]`.
//!
//! Each endpoint is a template such as
//! `https://api.example/list?folder={folder}&page={page}`. Placeholders are
//! percent-encoded on substitution and the result must parse as an absolute
//! URL. Responses use the envelope `{"code": 0, "data": ...}`.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::RemoteConfig;
use crate::downloader::StreamDescriptor;
use crate::retry::FetchError;
use crate::transport::{get_ok, FetchRequest, Transport};
use crate::walker::{CatalogApi, Envelope, FolderList, Item, Page};

#[derive(Debug, Deserialize)]
struct StreamData {
    url: String,
}

pub struct TemplateCatalog {
    transport: Arc<dyn Transport>,
    remote: RemoteConfig,
    timeout: Duration,
}

impl TemplateCatalog {
    pub fn new(transport: Arc<dyn Transport>, remote: RemoteConfig, timeout: Duration) -> Self {
        Self {
            transport,
            remote,
            timeout,
        }
    }

    fn request(&self, url: Url) -> FetchRequest {
        let mut request = FetchRequest::get(url.as_str());
        request.timeout = Some(self.timeout);
        request.headers.push(("Accept".into(), "application/json".into()));
        if let Some(referer) = &self.remote.referer {
            request.headers.push(("Referer".into(), referer.clone()));
        }
        request
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let body = get_ok(self.transport.as_ref(), &self.request(url.clone()))?;
        serde_json::from_slice(&body)
            .map_err(|e| FetchError::malformed(format!("{}: {}", url, e)))
    }

    fn get_raw(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        let mut request = self.request(url);
        request.headers.retain(|(k, _)| k != "Accept");
        get_ok(self.transport.as_ref(), &request)
    }
}

impl CatalogApi for TemplateCatalog {
    fn check_access(&self, item: &Item) -> Result<()> {
        let Some(template) = &self.remote.access_url else {
            return Ok(());
        };
        let url = render(template, &[("item", &item.id)])?;
        let (head, body) = self.transport.get_bytes(&self.request(url))?;
        let env: Option<Envelope<Value>> = serde_json::from_slice(&body).ok();
        let reason = env.as_ref().and_then(|e| e.message.clone()).unwrap_or_default();
        if !head.is_success() {
            anyhow::bail!("HTTP {} {}", head.status, reason);
        }
        if let Some(env) = env.filter(|e| e.code != 0) {
            anyhow::bail!("code {} {}", env.code, reason);
        }
        Ok(())
    }

    fn list_folders(&self, owner: &str) -> Result<Envelope<FolderList>> {
        let url = render(&self.remote.folders_url, &[("owner", owner)])?;
        tracing::debug!(url = %url, "list folders");
        Ok(self.get_json(url)?)
    }

    fn list_page(&self, folder: &str, page: u32) -> Result<Envelope<Page>> {
        let page = page.to_string();
        let url = render(&self.remote.page_url, &[("folder", folder), ("page", &page)])?;
        tracing::debug!(url = %url, "list page");
        Ok(self.get_json(url)?)
    }

    fn resolve_stream(&self, item: &Item) -> Result<StreamDescriptor, FetchError> {
        let url = render(&self.remote.stream_url, &[("item", &item.id)])
            .map_err(|e| FetchError::malformed(format!("{:#}", e)))?;
        let env: Envelope<StreamData> = self.get_json(url)?;
        let data = match env.data {
            Some(data) if env.code == 0 => data,
            _ => {
                return Err(FetchError::malformed(format!(
                    "stream for {} not available: code {} {}",
                    item.id,
                    env.code,
                    env.message.unwrap_or_default()
                )))
            }
        };
        let stream_url = Url::parse(&data.url)
            .map_err(|e| FetchError::malformed(format!("stream url {:?}: {}", data.url, e)))?;
        let mut descriptor = StreamDescriptor::new(stream_url.as_str());
        if let Some(referer) = &self.remote.referer {
            descriptor.headers.push(("Referer".into(), referer.clone()));
        }
        Ok(descriptor)
    }

    fn fetch_comments(&self, item: &Item) -> Result<Value> {
        let url = render(&self.remote.comments_url, &[("item", &item.id)])?;
        Ok(self.get_json(url)?)
    }

    fn fetch_captions(&self, item: &Item) -> Result<Vec<u8>> {
        let caption = item
            .caption_id
            .as_deref()
            .with_context(|| format!("item {} has no caption id", item.id))?;
        let url = render(
            &self.remote.captions_url,
            &[("item", &item.id), ("caption", caption)],
        )?;
        Ok(self.get_raw(url)?)
    }

    fn fetch_cover(&self, item: &Item) -> Result<Vec<u8>> {
        let cover = item
            .cover
            .as_deref()
            .with_context(|| format!("item {} has no cover", item.id))?;
        let url = Url::parse(cover).with_context(|| format!("cover url {:?}", cover))?;
        Ok(self.get_raw(url)?)
    }
}

/// Substitute `{name}` placeholders with percent-encoded values and parse the result.
pub fn render(template: &str, vars: &[(&str, &str)]) -> Result<Url> {
    let mut out = template.to_string();
    for (name, value) in vars {
        let encoded: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
        out = out.replace(&format!("{{{}}}", name), &encoded);
    }
    if let Some(start) = out.find('{') {
        let rest = &out[start..];
        let end = rest.find('}').map(|i| i + 1).unwrap_or(rest.len());
        anyhow::bail!("unresolved placeholder {} in {}", &rest[..end], template);
    }
    let url = Url::parse(&out).with_context(|| format!("invalid url from template {}", template))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => anyhow::bail!("unsupported scheme {} in {}", other, template),
    }
}
