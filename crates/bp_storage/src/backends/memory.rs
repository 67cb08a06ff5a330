use async_trait::async_trait;
use bp_core::{Error, NewPost, Post, PostStorage, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct MemoryStore {
    posts: Vec<Post>,
    next_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            posts: Vec::new(),
            next_id: 1,
        }
    }

    pub fn exists(&self, url: &str) -> bool {
        self.posts.iter().any(|p| p.url == url)
    }

    pub fn create(&mut self, post: NewPost) -> Result<Post> {
        if self.exists(&post.url) {
            return Err(Error::DuplicateKey(post.url));
        }

        let post = Post {
            id: self.next_id,
            url: post.url,
            title: post.title,
            image: post.image,
            content: post.content,
            created_at: Utc::now(),
        };
        self.next_id += 1;
        self.posts.push(post.clone());
        Ok(post)
    }

    pub fn latest(&self) -> Vec<Post> {
        let mut posts = self.posts.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        posts
    }

    pub fn get(&self, id: i64) -> Option<Post> {
        self.posts.iter().find(|p| p.id == id).cloned()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-local post store. Contents are lost on exit.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.posts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PostStorage for MemoryStorage {
    async fn exists(&self, url: &str) -> Result<bool> {
        let store = self.store.read().await;
        Ok(store.exists(url))
    }

    async fn create(&self, post: NewPost) -> Result<Post> {
        let mut store = self.store.write().await;
        store.create(post)
    }

    async fn latest(&self) -> Result<Vec<Post>> {
        let store = self.store.read().await;
        Ok(store.latest())
    }

    async fn get(&self, id: i64) -> Result<Option<Post>> {
        let store = self.store.read().await;
        Ok(store.get(id))
    }
}
