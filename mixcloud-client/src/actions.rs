//! Social actions: follow, favorite, repost and listen later

use crate::client::Mixcloud;
use crate::error::Result;
use crate::urls::{append_segment, with_query};
use mixcloud_model::Wrapped;
use reqwest::Method;

/// Resource action addressed as `{key}/{segment}/`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SocialAction {
    Follow,
    Favorite,
    Repost,
    ListenLater,
}

impl SocialAction {
    fn segment(&self) -> &'static str {
        match self {
            SocialAction::Follow => "follow",
            SocialAction::Favorite => "favorite",
            SocialAction::Repost => "repost",
            SocialAction::ListenLater => "listen-later",
        }
    }
}

impl Mixcloud {
    /// Follow `user`.
    pub async fn follow(&self, user: &str) -> Result<Wrapped> {
        self.do_action(user, SocialAction::Follow, Method::POST).await
    }

    /// Unfollow `user`.
    pub async fn unfollow(&self, user: &str) -> Result<Wrapped> {
        self.do_action(user, SocialAction::Follow, Method::DELETE).await
    }

    /// Favorite `cloudcast`.
    pub async fn favorite(&self, cloudcast: &str) -> Result<Wrapped> {
        self.do_action(cloudcast, SocialAction::Favorite, Method::POST)
            .await
    }

    /// Unfavorite `cloudcast`.
    pub async fn unfavorite(&self, cloudcast: &str) -> Result<Wrapped> {
        self.do_action(cloudcast, SocialAction::Favorite, Method::DELETE)
            .await
    }

    /// Repost `cloudcast`.
    pub async fn repost(&self, cloudcast: &str) -> Result<Wrapped> {
        self.do_action(cloudcast, SocialAction::Repost, Method::POST)
            .await
    }

    /// Undo a repost of `cloudcast`.
    pub async fn unrepost(&self, cloudcast: &str) -> Result<Wrapped> {
        self.do_action(cloudcast, SocialAction::Repost, Method::DELETE)
            .await
    }

    /// Add `cloudcast` to the listen-later list.
    pub async fn listen_later(&self, cloudcast: &str) -> Result<Wrapped> {
        self.do_action(cloudcast, SocialAction::ListenLater, Method::POST)
            .await
    }

    /// Remove `cloudcast` from the listen-later list.
    pub async fn unlisten_later(&self, cloudcast: &str) -> Result<Wrapped> {
        self.do_action(cloudcast, SocialAction::ListenLater, Method::DELETE)
            .await
    }

    async fn do_action(&self, key: &str, action: SocialAction, method: Method) -> Result<Wrapped> {
        let token = self.inner.require_token()?;

        // Non-GET endpoints need the trailing slash.
        let segment = format!("{}/", action.segment());
        let url = append_segment(&self.inner.build_url(key)?, &segment);
        let url = with_query(url, &[("access_token", token.as_str())]);

        let response = self
            .inner
            .send(self.inner.http.request(method, url))
            .await?;
        self.inner.native_result(response).await
    }
}
