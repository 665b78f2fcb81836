//! The post collection and every operation on it.

use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::StoreError;
use crate::model::{Direction, Post, PostDraft, PostPatch, SortOrder};

/// Ids are drawn from `1..=MAX_ID`.
pub const MAX_ID: u32 = 1000;

/// Ordered collection of posts with unique ids.
///
/// Insertion order is kept; sorted listings are copies.
#[derive(Clone, Debug, Default)]
pub struct PostStore {
    posts: Vec<Post>,
}

impl PostStore {
    pub fn new() -> PostStore {
        PostStore { posts: vec![] }
    }

    /// The store a freshly started service holds.
    pub fn seeded() -> PostStore {
        PostStore {
            posts: vec![
                Post::new(1, "First post", "This is the first post."),
                Post::new(2, "Second post", "This is the second post."),
            ],
        }
    }

    pub fn from_posts(posts: Vec<Post>) -> Result<PostStore, StoreError> {
        let mut store = PostStore::new();
        for post in posts {
            if store.get(post.id()).is_some() {
                return Err(StoreError::DuplicateId(post.id()));
            }
            store.posts.push(post);
        }
        Ok(store)
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Post> {
        self.posts.iter().find(|post| post.id() == id)
    }

    fn get_mut(&mut self, id: u32) -> Result<&mut Post, StoreError> {
        self.posts.iter_mut().find(|post| post.id() == id).ok_or(StoreError::NotFound(id))
    }

    /// All posts, in insertion order or sorted when both `sort` and
    /// `direction` are given.
    pub fn list(&self, sort: Option<&str>, direction: Option<&str>) -> Result<Vec<Post>, StoreError> {
        let order = match SortOrder::parse(sort, direction)? {
            Some(order) => order,
            None => return Ok(self.posts.clone()),
        };

        debug!("listing posts by {} {}", order.field, order.direction);
        let mut posts = self.posts.clone();
        posts.sort_by(|a, b| a.cmp_by(b, order.field));
        if order.direction == Direction::Desc {
            posts.reverse();
        }
        Ok(posts)
    }

    pub fn create(&mut self, draft: PostDraft) -> Result<Post, StoreError> {
        self.create_with_rng(draft, &mut rand::rng())
    }

    /// Appends a new post under a random free id.
    ///
    /// Fails with `OutOfIdentifiers` only when all `MAX_ID` ids are taken.
    pub fn create_with_rng<R: Rng>(&mut self, draft: PostDraft, rng: &mut R) -> Result<Post, StoreError> {
        let (title, content) = match (draft.title, draft.content) {
            (Some(title), Some(content)) => (title, content),
            _ => return Err(StoreError::validation("Invalid post data")),
        };

        let id = self.free_id(rng)?;
        let post = Post::new(id, &title, &content);
        self.posts.push(post.clone());
        debug!("created post {}", id);
        Ok(post)
    }

    /// Walks a random permutation of the id space, so every id is tried at
    /// most once and the first free one is uniform over the free ids.
    fn free_id<R: Rng>(&self, rng: &mut R) -> Result<u32, StoreError> {
        let mut candidates: Vec<u32> = (1..=MAX_ID).collect();
        candidates.shuffle(rng);
        match candidates.into_iter().find(|&id| self.get(id).is_none()) {
            Some(id) => Ok(id),
            None => {
                warn!("all {} post ids are taken", MAX_ID);
                Err(StoreError::OutOfIdentifiers)
            }
        }
    }

    /// Removes the post and hands it back.
    pub fn delete(&mut self, id: u32) -> Result<Post, StoreError> {
        let index = self
            .posts
            .iter()
            .position(|post| post.id() == id)
            .ok_or(StoreError::NotFound(id))?;
        debug!("deleted post {}", id);
        Ok(self.posts.remove(index))
    }

    /// Applies `patch` to the post with the given id.
    ///
    /// A patch with only `title` or only `content` changes that field alone
    /// and ignores any other keys. A patch with both fields is merged whole:
    /// its unrecognized keys are stored on the post as extra attributes.
    /// That merge is a compatibility behavior of the service and is likely
    /// unintended; a key named `id` is never merged.
    pub fn update(&mut self, id: u32, patch: PostPatch) -> Result<Post, StoreError> {
        let post = self.get_mut(id)?;

        match patch {
            PostPatch { title: Some(title), content: Some(content), extra } => {
                post.title = title;
                post.content = content;
                for (key, value) in extra {
                    if key == "id" {
                        warn!("ignoring id field in update of post {}", id);
                        continue;
                    }
                    warn!("merging unrecognized field {:?} into post {}", key, id);
                    post.extra.insert(key, value);
                }
            }
            PostPatch { title: Some(title), content: None, .. } => post.title = title,
            PostPatch { title: None, content: Some(content), .. } => post.content = content,
            PostPatch { title: None, content: None, .. } => {
                return Err(StoreError::validation("No data provided."));
            }
        }

        debug!("updated post {}", id);
        Ok(post.clone())
    }

    /// Case-insensitive substring search. A title query takes precedence
    /// over a content query; with neither, nothing matches.
    pub fn search(&self, title: Option<&str>, content: Option<&str>) -> Vec<Post> {
        let (needle, by_title) = match (title, content) {
            (Some(title), _) => (title.to_lowercase(), true),
            (None, Some(content)) => (content.to_lowercase(), false),
            (None, None) => return vec![],
        };

        self.posts
            .iter()
            .filter(|post| {
                let haystack = if by_title { &post.title } else { &post.content };
                haystack.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }
}
