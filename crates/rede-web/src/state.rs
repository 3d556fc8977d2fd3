use std::sync::Arc;

use crate::client::ApiClient;

pub type WebState = Arc<WebStateInner>;

pub struct WebStateInner {
    pub api: ApiClient,
    pub cookie_key: [u8; 32],
}
