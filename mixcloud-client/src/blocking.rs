//! Blocking facade over the asynchronous client
//!
//! [`MixcloudSync`] and [`MixcloudOAuthSync`] own a current-thread tokio
//! runtime and block on one operation at a time. They must not be used
//! from inside another tokio runtime.

use crate::auth::MixcloudOAuth;
use crate::client::{GetOptions, Mixcloud, SearchType};
use crate::config::ClientConfig;
use crate::display::DisplayOptions;
use crate::error::Result;
use crate::upload::UploadParams;
use mixcloud_model::{BoundOperation, Entity, EntityCollection, Pagination, Wrapped};
use serde_json::Value;
use std::future::Future;
use std::path::Path;
use tokio::runtime::{Builder, Runtime};

fn current_thread_runtime() -> Result<Runtime> {
    Ok(Builder::new_current_thread().enable_all().build()?)
}

/// Blocking Mixcloud API client
pub struct MixcloudSync {
    client: Mixcloud,
    runtime: Runtime,
}

impl MixcloudSync {
    /// Create a client and the runtime driving it.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::from_client(Mixcloud::new(config)?)
    }

    /// Drive an existing asynchronous client.
    pub fn from_client(client: Mixcloud) -> Result<Self> {
        Ok(Self {
            client,
            runtime: current_thread_runtime()?,
        })
    }

    /// Underlying asynchronous client.
    pub fn client(&self) -> &Mixcloud {
        &self.client
    }

    /// Run `future` to completion on the owned runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Current access token.
    pub fn access_token(&self) -> Option<String> {
        self.client.access_token()
    }

    /// Replace the access token.
    pub fn set_access_token(&self, token: Option<String>) {
        self.client.set_access_token(token);
    }

    /// See [`Mixcloud::get`].
    pub fn get(
        &self,
        url: &str,
        options: GetOptions,
        params: &[(String, String)],
    ) -> Result<Wrapped> {
        self.block_on(self.client.get(url, options, params))
    }

    /// See [`Mixcloud::me`].
    pub fn me(&self) -> Result<Wrapped> {
        self.block_on(self.client.me())
    }

    /// See [`Mixcloud::discover`].
    pub fn discover(&self, tag: &str) -> Result<Wrapped> {
        self.block_on(self.client.discover(tag))
    }

    /// See [`Mixcloud::popular`].
    pub fn popular(&self, pagination: &Pagination) -> Result<Wrapped> {
        self.block_on(self.client.popular(pagination))
    }

    /// See [`Mixcloud::hot`].
    pub fn hot(&self, pagination: &Pagination) -> Result<Wrapped> {
        self.block_on(self.client.hot(pagination))
    }

    /// See [`Mixcloud::new_cloudcasts`].
    pub fn new_cloudcasts(&self, pagination: &Pagination) -> Result<Wrapped> {
        self.block_on(self.client.new_cloudcasts(pagination))
    }

    /// See [`Mixcloud::search`].
    pub fn search(
        &self,
        query: &str,
        search_type: SearchType,
        pagination: &Pagination,
    ) -> Result<Wrapped> {
        self.block_on(self.client.search(query, search_type, pagination))
    }

    /// See [`Mixcloud::follow`].
    pub fn follow(&self, user: &str) -> Result<Wrapped> {
        self.block_on(self.client.follow(user))
    }

    /// See [`Mixcloud::unfollow`].
    pub fn unfollow(&self, user: &str) -> Result<Wrapped> {
        self.block_on(self.client.unfollow(user))
    }

    /// See [`Mixcloud::favorite`].
    pub fn favorite(&self, cloudcast: &str) -> Result<Wrapped> {
        self.block_on(self.client.favorite(cloudcast))
    }

    /// See [`Mixcloud::unfavorite`].
    pub fn unfavorite(&self, cloudcast: &str) -> Result<Wrapped> {
        self.block_on(self.client.unfavorite(cloudcast))
    }

    /// See [`Mixcloud::repost`].
    pub fn repost(&self, cloudcast: &str) -> Result<Wrapped> {
        self.block_on(self.client.repost(cloudcast))
    }

    /// See [`Mixcloud::unrepost`].
    pub fn unrepost(&self, cloudcast: &str) -> Result<Wrapped> {
        self.block_on(self.client.unrepost(cloudcast))
    }

    /// See [`Mixcloud::listen_later`].
    pub fn listen_later(&self, cloudcast: &str) -> Result<Wrapped> {
        self.block_on(self.client.listen_later(cloudcast))
    }

    /// See [`Mixcloud::unlisten_later`].
    pub fn unlisten_later(&self, cloudcast: &str) -> Result<Wrapped> {
        self.block_on(self.client.unlisten_later(cloudcast))
    }

    /// See [`Mixcloud::embed_json`].
    pub fn embed_json(&self, cloudcast: &str, options: &DisplayOptions) -> Result<Wrapped> {
        self.block_on(self.client.embed_json(cloudcast, options))
    }

    /// See [`Mixcloud::embed_html`].
    pub fn embed_html(&self, cloudcast: &str, options: &DisplayOptions) -> Result<Wrapped> {
        self.block_on(self.client.embed_html(cloudcast, options))
    }

    /// See [`Mixcloud::oembed`].
    pub fn oembed(&self, key: &str, options: &DisplayOptions) -> Result<Wrapped> {
        self.block_on(self.client.oembed(key, options))
    }

    /// See [`Mixcloud::upload`].
    pub fn upload(
        &self,
        mp3: impl AsRef<Path>,
        name: &str,
        params: &UploadParams,
    ) -> Result<Wrapped> {
        self.block_on(self.client.upload(mp3, name, params))
    }

    /// See [`Mixcloud::edit`].
    pub fn edit(&self, key: &str, params: &UploadParams, name: Option<&str>) -> Result<Wrapped> {
        self.block_on(self.client.edit(key, params, name))
    }

    /// Load the full representation of `entity`.
    pub fn load(&self, entity: &mut Entity, force: bool) -> Result<()> {
        self.block_on(entity.load(force))?;
        Ok(())
    }

    /// Fetch one page of the connection `name` of `entity`.
    pub fn connection(
        &self,
        entity: &Entity,
        name: &str,
        pagination: &Pagination,
    ) -> Result<Wrapped> {
        Ok(self.block_on(entity.connection(name, pagination))?)
    }

    /// Next page of `collection`, if any.
    pub fn next(&self, collection: &EntityCollection) -> Result<Option<Wrapped>> {
        Ok(self.block_on(collection.next())?)
    }

    /// Previous page of `collection`, if any.
    pub fn previous(&self, collection: &EntityCollection) -> Result<Option<Wrapped>> {
        Ok(self.block_on(collection.previous())?)
    }

    /// Invoke a bound targeted operation.
    pub fn call(&self, operation: &BoundOperation, options: &Value) -> Result<Wrapped> {
        Ok(self.block_on(operation.call_with(options))?)
    }
}

/// Blocking OAuth helper
pub struct MixcloudOAuthSync {
    oauth: MixcloudOAuth,
    runtime: Runtime,
}

impl MixcloudOAuthSync {
    /// Wrap `oauth` with its own runtime.
    pub fn new(oauth: MixcloudOAuth) -> Result<Self> {
        Ok(Self {
            oauth,
            runtime: current_thread_runtime()?,
        })
    }

    /// Underlying asynchronous helper.
    pub fn oauth(&self) -> &MixcloudOAuth {
        &self.oauth
    }

    /// See [`MixcloudOAuth::authorization_url`].
    pub fn authorization_url(&self) -> Result<String> {
        self.oauth.authorization_url()
    }

    /// See [`MixcloudOAuth::access_token`].
    pub fn access_token(&self, code: &str) -> Result<Option<String>> {
        self.runtime.block_on(self.oauth.access_token(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use mixcloud_model::ModelError;

    #[test]
    fn preconditions_surface_without_network() {
        let client = MixcloudSync::new(ClientConfig::default()).unwrap();
        assert!(matches!(client.me(), Err(ClientError::Precondition(_))));
        assert!(matches!(
            client.popular(&Pagination::page(1).with_offset(3)),
            Err(ClientError::Precondition(_))
        ));
    }

    #[test]
    fn detached_entities_report_dropped_context() {
        let client = MixcloudSync::new(ClientConfig::default()).unwrap();
        let data = match serde_json::json!({"type": "user", "key": "/bob/"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let mut entity = Entity::new(
            data,
            mixcloud_model::ContextHandle::detached(),
            false,
            false,
        );
        let err = client.load(&mut entity, true).unwrap_err();
        assert!(matches!(err, ClientError::Model(ModelError::ContextDropped)));
    }
}
