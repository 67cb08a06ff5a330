use async_trait::async_trait;
use crate::types::{NewPost, Post};
use crate::Result;

#[async_trait]
pub trait PostStorage: Send + Sync {
    /// Returns true if a post with this url is already stored
    async fn exists(&self, url: &str) -> Result<bool>;

    /// Store a new post. Fails with `Error::DuplicateKey` if the url is taken.
    async fn create(&self, post: NewPost) -> Result<Post>;

    /// All posts, most recent first
    async fn latest(&self) -> Result<Vec<Post>>;

    /// Look up a single post by id
    async fn get(&self, id: i64) -> Result<Option<Post>>;
}
