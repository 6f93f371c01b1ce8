//! Key-first client operations exposed to entities
//!
//! Each [`TargetedAction`] is registered in the client's
//! [`OperationRegistry`](mixcloud_model::OperationRegistry) as a
//! [`ClientOperation`], so `entity.targeted("follow")` resolves to a
//! call of [`Mixcloud::follow`] with the entity key applied.

use crate::client::{ClientInner, Mixcloud};
use crate::display::DisplayOptions;
use crate::error::{ClientError, Result};
use crate::upload::EditOptions;
use async_trait::async_trait;
use mixcloud_model::{ModelError, TargetedOperation, Wrapped};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Weak;

/// Client operation that targets a resource by key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetedAction {
    /// Follow a user
    Follow,
    /// Unfollow a user
    Unfollow,
    /// Favorite a cloudcast
    Favorite,
    /// Unfavorite a cloudcast
    Unfavorite,
    /// Repost a cloudcast
    Repost,
    /// Undo a repost
    Unrepost,
    /// Add a cloudcast to the listen-later list
    ListenLater,
    /// Remove a cloudcast from the listen-later list
    UnlistenLater,
    /// Embed data in JSON
    EmbedJson,
    /// Embed data in HTML
    EmbedHtml,
    /// oEmbed data
    Oembed,
    /// Edit an upload
    Edit,
}

impl TargetedAction {
    /// Every targeted action, in registration order.
    pub const ALL: [TargetedAction; 12] = [
        TargetedAction::Follow,
        TargetedAction::Unfollow,
        TargetedAction::Favorite,
        TargetedAction::Unfavorite,
        TargetedAction::Repost,
        TargetedAction::Unrepost,
        TargetedAction::ListenLater,
        TargetedAction::UnlistenLater,
        TargetedAction::EmbedJson,
        TargetedAction::EmbedHtml,
        TargetedAction::Oembed,
        TargetedAction::Edit,
    ];

    /// Registry name of the action.
    pub fn name(&self) -> &'static str {
        match self {
            TargetedAction::Follow => "follow",
            TargetedAction::Unfollow => "unfollow",
            TargetedAction::Favorite => "favorite",
            TargetedAction::Unfavorite => "unfavorite",
            TargetedAction::Repost => "repost",
            TargetedAction::Unrepost => "unrepost",
            TargetedAction::ListenLater => "listen_later",
            TargetedAction::UnlistenLater => "unlisten_later",
            TargetedAction::EmbedJson => "embed_json",
            TargetedAction::EmbedHtml => "embed_html",
            TargetedAction::Oembed => "oembed",
            TargetedAction::Edit => "edit",
        }
    }

    /// Look an action up by registry name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.name() == name)
    }

    /// Run the action against `key` on `client`.
    ///
    /// `options` are decoded into [`DisplayOptions`] for the embed
    /// actions and into [`EditOptions`] for `edit`; `null` means
    /// defaults. The social actions ignore them.
    pub async fn run(&self, client: &Mixcloud, key: &str, options: &Value) -> Result<Wrapped> {
        match self {
            TargetedAction::Follow => client.follow(key).await,
            TargetedAction::Unfollow => client.unfollow(key).await,
            TargetedAction::Favorite => client.favorite(key).await,
            TargetedAction::Unfavorite => client.unfavorite(key).await,
            TargetedAction::Repost => client.repost(key).await,
            TargetedAction::Unrepost => client.unrepost(key).await,
            TargetedAction::ListenLater => client.listen_later(key).await,
            TargetedAction::UnlistenLater => client.unlisten_later(key).await,
            TargetedAction::EmbedJson => {
                let display: DisplayOptions = decode_options(options)?;
                client.embed_json(key, &display).await
            }
            TargetedAction::EmbedHtml => {
                let display: DisplayOptions = decode_options(options)?;
                client.embed_html(key, &display).await
            }
            TargetedAction::Oembed => {
                let display: DisplayOptions = decode_options(options)?;
                client.oembed(key, &display).await
            }
            TargetedAction::Edit => {
                let edit: EditOptions = decode_options(options)?;
                client.edit(key, &edit.params, edit.name.as_deref()).await
            }
        }
    }
}

fn decode_options<T>(options: &Value) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if options.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(options.clone()).map_err(ClientError::from)
}

/// Registry entry running one [`TargetedAction`] on the owning client
pub(crate) struct ClientOperation {
    action: TargetedAction,
    client: Weak<ClientInner>,
}

impl ClientOperation {
    pub(crate) fn new(action: TargetedAction, client: Weak<ClientInner>) -> Self {
        Self { action, client }
    }
}

#[async_trait]
impl TargetedOperation for ClientOperation {
    fn name(&self) -> &str {
        self.action.name()
    }

    async fn invoke(&self, key: &str, options: &Value) -> mixcloud_model::Result<Wrapped> {
        let inner = self.client.upgrade().ok_or(ModelError::ContextDropped)?;
        let client = Mixcloud::from_inner(inner);
        self.action
            .run(&client, key, options)
            .await
            .map_err(ModelError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_are_unique_and_resolvable() {
        for action in TargetedAction::ALL {
            assert_eq!(TargetedAction::from_name(action.name()), Some(action));
        }
        assert_eq!(TargetedAction::from_name("listen-later"), None);
    }

    #[test]
    fn null_options_mean_defaults() {
        let display: DisplayOptions = decode_options(&Value::Null).unwrap();
        assert_eq!(display, DisplayOptions::default());

        let display: DisplayOptions = decode_options(&json!({"width": 300})).unwrap();
        assert_eq!(display.width, Some(300));

        let err = decode_options::<DisplayOptions>(&json!({"width": "wide"})).unwrap_err();
        assert!(matches!(err, ClientError::Json(_)));
    }

    #[tokio::test]
    async fn dropped_client_fails_invocation() {
        let operation = ClientOperation::new(TargetedAction::Follow, Weak::new());
        let err = operation.invoke("/bob/", &Value::Null).await.unwrap_err();
        assert!(matches!(err, ModelError::ContextDropped));
    }
}
