//! Cloudcast uploads and edits

use crate::client::Mixcloud;
use crate::config::UploadLimits;
use crate::error::{ClientError, Result};
use crate::urls::{append_segment, with_query};
use mixcloud_model::{format_datetime, DateTimeLike, Wrapped};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio_util::io::ReaderStream;
use url::Url;

/// Optional cloudcast fields sent with an upload or edit
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UploadParams {
    /// Cover picture file
    pub picture: Option<PathBuf>,
    /// Description text
    pub description: Option<String>,
    /// Tag names
    pub tags: Option<Vec<String>>,
    /// Scheduled publishing time
    pub publish_date: Option<DateTimeLike>,
    /// Disable comments
    pub disable_comments: bool,
    /// Hide play statistics
    pub hide_stats: bool,
    /// Keep the cloudcast out of listings
    pub unlisted: bool,
    /// Track sections, keyed by the last part of the API field name
    /// (`artist`, `song`, `start_time`, ...)
    pub sections: Option<Vec<Map<String, Value>>>,
}

impl UploadParams {
    /// Check sizes and counts against `limits`.
    pub async fn validate(&self, limits: &UploadLimits) -> Result<()> {
        if let Some(picture) = &self.picture {
            let size = tokio::fs::metadata(picture).await?.len();
            if size > limits.max_picture_bytes {
                return Err(ClientError::precondition(format!(
                    "picture file size must be {} bytes at most",
                    limits.max_picture_bytes
                )));
            }
        }
        if let Some(description) = &self.description {
            if description.chars().count() > limits.max_description_chars {
                return Err(ClientError::precondition(format!(
                    "description size must be {} characters at most",
                    limits.max_description_chars
                )));
            }
        }
        if let Some(tags) = &self.tags {
            if tags.len() > limits.max_tags {
                return Err(ClientError::precondition(format!(
                    "an upload must have {} tags at most",
                    limits.max_tags
                )));
            }
        }
        if let Some(publish_date) = &self.publish_date {
            format_datetime(publish_date.clone())?;
        }
        Ok(())
    }

    /// Text form fields, in the order they are sent.
    pub fn form_fields(&self) -> Result<Vec<(String, String)>> {
        let mut fields = Vec::new();
        if let Some(description) = &self.description {
            fields.push(("description".to_string(), description.clone()));
        }
        if let Some(publish_date) = &self.publish_date {
            fields.push((
                "publish_date".to_string(),
                format_datetime(publish_date.clone())?,
            ));
        }
        for (name, set) in [
            ("disable_comments", self.disable_comments),
            ("hide_stats", self.hide_stats),
            ("unlisted", self.unlisted),
        ] {
            if set {
                fields.push((name.to_string(), "true".to_string()));
            }
        }
        for (i, tag) in self.tags.iter().flatten().enumerate() {
            fields.push((format!("tags-{}-tag", i), tag.clone()));
        }
        for (i, section) in self.sections.iter().flatten().enumerate() {
            for (field, value) in section {
                let value = match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                fields.push((format!("sections-{}-{}", i, field), value));
            }
        }
        Ok(fields)
    }
}

/// Options accepted by the `edit` targeted operation
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditOptions {
    /// New cloudcast name
    pub name: Option<String>,
    /// Fields to change
    #[serde(flatten)]
    pub params: UploadParams,
}

// Streams the file from disk; mp3 uploads may be gigabytes.
async fn file_part(path: &Path) -> Result<Part> {
    let file = tokio::fs::File::open(path).await?;
    let length = file.metadata().await?.len();
    let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(Part::stream_with_length(body, length).file_name(file_name))
}

impl Mixcloud {
    /// Upload the `mp3` file as a new cloudcast called `name`.
    pub async fn upload(
        &self,
        mp3: impl AsRef<Path>,
        name: &str,
        params: &UploadParams,
    ) -> Result<Wrapped> {
        let limits = &self.config().limits;
        params.validate(limits).await?;
        let token = self.inner.require_token()?;

        let mp3 = mp3.as_ref();
        let size = tokio::fs::metadata(mp3).await?.len();
        if size > limits.max_mp3_bytes {
            return Err(ClientError::precondition(format!(
                "mp3 file size must be {} bytes at most",
                limits.max_mp3_bytes
            )));
        }

        let url = self.inner.build_url("upload/")?;
        let form = Form::new()
            .text("name", name.to_string())
            .part("mp3", file_part(mp3).await?);

        self.send_upload(form, params, url, &token).await
    }

    /// Edit the upload identified by `key`.
    ///
    /// A key without slashes names one of the current user's cloudcasts;
    /// the user part is then looked up with [`me`](Self::me).
    pub async fn edit(
        &self,
        key: &str,
        params: &UploadParams,
        name: Option<&str>,
    ) -> Result<Wrapped> {
        params.validate(&self.config().limits).await?;
        let token = self.inner.require_token()?;

        let key = if key.contains('/') {
            key.to_string()
        } else {
            let user = self.me().await?;
            let user_key = user.get("key")?;
            let user_key = user_key
                .as_str()
                .ok_or_else(|| ClientError::precondition("current user has no key"))?;
            format!("{}/{}", user_key.trim_end_matches('/'), key)
        };

        let url = append_segment(&self.inner.build_url("upload")?, &key);
        let url = append_segment(&url, "edit/");

        let mut form = Form::new();
        if let Some(name) = name {
            form = form.text("name", name.to_string());
        }

        self.send_upload(form, params, url, &token).await
    }

    async fn send_upload(
        &self,
        mut form: Form,
        params: &UploadParams,
        url: Url,
        token: &str,
    ) -> Result<Wrapped> {
        if let Some(picture) = &params.picture {
            form = form.part("picture", file_part(picture).await?);
        }
        for (field, value) in params.form_fields()? {
            form = form.text(field, value);
        }

        let url = with_query(url, &[("access_token", token)]);
        let response = self
            .inner
            .send(self.inner.http.post(url).multipart(form))
            .await?;
        self.inner.native_result(response).await
    }
}
