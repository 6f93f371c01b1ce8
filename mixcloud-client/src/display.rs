//! Embedding and oEmbed

use crate::client::Mixcloud;
use crate::error::Result;
use crate::urls::{append_segment, url_join};
use mixcloud_model::{QueryParams, Wrapped};
use serde::Deserialize;
use std::fmt;

/// Response format of embed and oEmbed requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedFormat {
    /// JSON document (default)
    #[default]
    Json,
    /// HTML snippet
    Html,
}

impl EmbedFormat {
    /// Format name as sent to the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbedFormat::Json => "json",
            EmbedFormat::Html => "html",
        }
    }
}

impl fmt::Display for EmbedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format and widget display options
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    /// Response format, used by [`Mixcloud::oembed`]
    pub format: EmbedFormat,
    /// Widget width
    pub width: Option<u32>,
    /// Widget height
    pub height: Option<u32>,
    /// Widget color
    pub color: Option<String>,
}

impl DisplayOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response format.
    pub fn with_format(mut self, format: EmbedFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the widget width.
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    /// Set the widget height.
    pub fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    /// Set the widget color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Width, height and color, when set.
    pub fn display_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        if let Some(width) = self.width {
            params.push(("width".to_string(), width.to_string()));
        }
        if let Some(height) = self.height {
            params.push(("height".to_string(), height.to_string()));
        }
        if let Some(color) = &self.color {
            params.push(("color".to_string(), color.clone()));
        }
        params
    }

    /// Format followed by the display parameters.
    pub fn to_params(&self) -> QueryParams {
        let mut params = vec![("format".to_string(), self.format.as_str().to_string())];
        params.extend(self.display_params());
        params
    }
}

impl Mixcloud {
    /// Embed data for `cloudcast` as JSON.
    pub async fn embed_json(&self, cloudcast: &str, options: &DisplayOptions) -> Result<Wrapped> {
        self.embed(cloudcast, EmbedFormat::Json, options).await
    }

    /// Embed data for `cloudcast` as HTML.
    pub async fn embed_html(&self, cloudcast: &str, options: &DisplayOptions) -> Result<Wrapped> {
        self.embed(cloudcast, EmbedFormat::Html, options).await
    }

    async fn embed(
        &self,
        cloudcast: &str,
        format: EmbedFormat,
        options: &DisplayOptions,
    ) -> Result<Wrapped> {
        let segment = format!("embed-{}", format);
        let url = append_segment(&self.inner.build_url(cloudcast)?, &segment);

        let request = self.inner.http.get(url).query(&options.display_params());
        let response = self.inner.send(request).await?;
        self.inner.proper_result(response).await
    }

    /// oEmbed data for the resource identified by `key`.
    pub async fn oembed(&self, key: &str, options: &DisplayOptions) -> Result<Wrapped> {
        let config = self.config();
        let resource = url_join(&config.mixcloud_root, key)?;

        let mut params = options.to_params();
        params.push(("url".to_string(), resource.to_string()));

        let request = self.inner.http.get(&config.oembed_root).query(&params);
        let response = self.inner.send(request).await?;
        self.inner.proper_result(response).await
    }
}
