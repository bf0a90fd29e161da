//! In-memory [`ChatPlatform`] with fault injection.
//!
//! Used by the engine and expander tests and handy for embedding the core
//! without a database. Post timestamps come from a logical clock that advances
//! one second per write, so thread order is deterministic.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use sharepost_types::models::{Channel, ChannelKind, FileInfo, Post, PostList, Team, User};
use uuid::Uuid;

use crate::platform::{ChatPlatform, PlatformError};

const CLOCK_START_MS: i64 = 1_600_000_000_000;
const CLOCK_STEP_MS: i64 = 1_000;

pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Default)]
struct Faults {
    /// Creates succeed this many more times, then fail.
    create_budget: Option<usize>,
    get_post: HashSet<String>,
    update: HashSet<String>,
    delete: HashSet<String>,
    copy_files: bool,
}

#[derive(Default)]
struct State {
    teams: HashMap<String, Team>,
    channels: HashMap<String, Channel>,
    users: HashMap<String, User>,
    posts: HashMap<String, Post>,
    files: HashMap<String, FileInfo>,
    ephemeral: Vec<(String, Post)>,
    faults: Faults,
    clock: i64,
}

impl State {
    fn tick(&mut self) -> i64 {
        self.clock += CLOCK_STEP_MS;
        CLOCK_START_MS + self.clock
    }
}

pub struct MemoryPlatform {
    site_url: Option<String>,
    server_version: String,
    state: Mutex<State>,
}

impl MemoryPlatform {
    pub fn new(site_url: impl Into<String>) -> Self {
        Self {
            site_url: Some(site_url.into()),
            server_version: "5.39.0".to_string(),
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_server_version(mut self, version: impl Into<String>) -> Self {
        self.server_version = version.into();
        self
    }

    pub fn without_site_url(mut self) -> Self {
        self.site_url = None;
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -- Seeding --

    pub fn add_team(&self, name: &str) -> Team {
        let team = Team {
            id: new_id(),
            name: name.to_string(),
            display_name: name.to_string(),
        };
        self.state().teams.insert(team.id.clone(), team.clone());
        team
    }

    pub fn add_channel(&self, team_id: &str, name: &str) -> Channel {
        self.insert_channel(team_id, name, ChannelKind::Open)
    }

    pub fn add_direct_channel(&self, name: &str) -> Channel {
        self.insert_channel("", name, ChannelKind::Direct)
    }

    fn insert_channel(&self, team_id: &str, name: &str, kind: ChannelKind) -> Channel {
        let channel = Channel {
            id: new_id(),
            team_id: team_id.to_string(),
            name: name.to_string(),
            display_name: name.to_string(),
            kind,
        };
        self.state().channels.insert(channel.id.clone(), channel.clone());
        channel
    }

    pub fn add_user(&self, user: User) -> User {
        let user = User {
            id: if user.id.is_empty() { new_id() } else { user.id },
            ..user
        };
        self.state().users.insert(user.id.clone(), user.clone());
        user
    }

    pub fn add_file(&self, creator_id: &str, name: &str) -> FileInfo {
        let id = new_id();
        let file = FileInfo {
            path: format!("data/{}/{}", id, name),
            id,
            creator_id: creator_id.to_string(),
            post_id: String::new(),
            name: name.to_string(),
            extension: name.rsplit_once('.').map(|(_, ext)| ext.to_string()).unwrap_or_default(),
            size: 1024,
            mime_type: "application/octet-stream".to_string(),
        };
        self.state().files.insert(file.id.clone(), file.clone());
        file
    }

    /// Store a post directly, bypassing faults and hooks.
    pub fn insert_post(&self, mut post: Post) -> Post {
        let mut state = self.state();
        if post.id.is_empty() {
            post.id = new_id();
        }
        if post.create_at == 0 {
            post.create_at = state.tick();
        }
        if post.update_at == 0 {
            post.update_at = post.create_at;
        }
        state.posts.insert(post.id.clone(), post.clone());
        post
    }

    // -- Inspection --

    pub fn post(&self, id: &str) -> Option<Post> {
        self.state().posts.get(id).cloned()
    }

    pub fn post_count(&self) -> usize {
        self.state().posts.len()
    }

    /// Oldest first.
    pub fn posts_in_channel(&self, channel_id: &str) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .state()
            .posts
            .values()
            .filter(|p| p.channel_id == channel_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| a.create_at.cmp(&b.create_at).then_with(|| a.id.cmp(&b.id)));
        posts
    }

    pub fn file(&self, id: &str) -> Option<FileInfo> {
        self.state().files.get(id).cloned()
    }

    pub fn ephemeral_posts(&self) -> Vec<(String, Post)> {
        self.state().ephemeral.clone()
    }

    // -- Faults --

    /// Let `successes` more creates through, then fail every create.
    pub fn fail_create_after(&self, successes: usize) {
        self.state().faults.create_budget = Some(successes);
    }

    pub fn fail_get_post(&self, post_id: &str) {
        self.state().faults.get_post.insert(post_id.to_string());
    }

    pub fn fail_update(&self, post_id: &str) {
        self.state().faults.update.insert(post_id.to_string());
    }

    pub fn fail_delete(&self, post_id: &str) {
        self.state().faults.delete.insert(post_id.to_string());
    }

    pub fn fail_copy_files(&self) {
        self.state().faults.copy_files = true;
    }
}

impl ChatPlatform for MemoryPlatform {
    fn site_url(&self) -> Option<String> {
        self.site_url.clone()
    }

    fn server_version(&self) -> String {
        self.server_version.clone()
    }

    fn get_channel(&self, channel_id: &str) -> Result<Channel, PlatformError> {
        self.state()
            .channels
            .get(channel_id)
            .cloned()
            .ok_or_else(|| PlatformError::not_found("channel", channel_id))
    }

    fn get_team(&self, team_id: &str) -> Result<Team, PlatformError> {
        self.state()
            .teams
            .get(team_id)
            .cloned()
            .ok_or_else(|| PlatformError::not_found("team", team_id))
    }

    fn get_user(&self, user_id: &str) -> Result<User, PlatformError> {
        self.state()
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| PlatformError::not_found("user", user_id))
    }

    fn get_post(&self, post_id: &str) -> Result<Post, PlatformError> {
        let state = self.state();
        if state.faults.get_post.contains(post_id) {
            return Err(PlatformError::store(format!("injected get failure for {}", post_id)));
        }
        state
            .posts
            .get(post_id)
            .cloned()
            .ok_or_else(|| PlatformError::not_found("post", post_id))
    }

    fn get_post_thread(&self, post_id: &str) -> Result<PostList, PlatformError> {
        let state = self.state();
        let post = state
            .posts
            .get(post_id)
            .ok_or_else(|| PlatformError::not_found("post", post_id))?;
        let root_id = if post.is_root() { post.id.clone() } else { post.root_id.clone() };

        let posts: HashMap<String, Post> = state
            .posts
            .values()
            .filter(|p| p.id == root_id || p.root_id == root_id)
            .map(|p| (p.id.clone(), p.clone()))
            .collect();

        // Newest first, like the platform's thread endpoint.
        let mut order: Vec<String> = posts.keys().cloned().collect();
        order.sort_by(|a, b| posts[b].create_at.cmp(&posts[a].create_at));

        Ok(PostList { order, posts })
    }

    fn create_post(&self, mut post: Post) -> Result<Post, PlatformError> {
        let mut state = self.state();

        if let Some(budget) = state.faults.create_budget.as_mut() {
            if *budget == 0 {
                return Err(PlatformError::store("injected create failure"));
            }
            *budget -= 1;
        }
        if !state.channels.contains_key(&post.channel_id) {
            return Err(PlatformError::not_found("channel", &post.channel_id));
        }
        if !post.root_id.is_empty() && !state.posts.contains_key(&post.root_id) {
            return Err(PlatformError::Invalid {
                entity: "post",
                reason: format!("root post {} does not exist", post.root_id),
            });
        }

        post.id = new_id();
        if post.create_at == 0 {
            post.create_at = state.tick();
        }
        if post.update_at == 0 {
            post.update_at = post.create_at;
        }
        for file_id in &post.file_ids {
            if let Some(file) = state.files.get_mut(file_id) {
                file.post_id = post.id.clone();
            }
        }

        state.posts.insert(post.id.clone(), post.clone());
        Ok(post)
    }

    fn update_post(&self, mut post: Post) -> Result<Post, PlatformError> {
        let mut state = self.state();
        if state.faults.update.contains(&post.id) {
            return Err(PlatformError::store(format!("injected update failure for {}", post.id)));
        }
        if !state.posts.contains_key(&post.id) {
            return Err(PlatformError::not_found("post", &post.id));
        }

        post.update_at = state.tick();
        state.posts.insert(post.id.clone(), post.clone());
        Ok(post)
    }

    fn delete_post(&self, post_id: &str) -> Result<(), PlatformError> {
        let mut state = self.state();
        if state.faults.delete.contains(post_id) {
            return Err(PlatformError::store(format!("injected delete failure for {}", post_id)));
        }
        state
            .posts
            .remove(post_id)
            .map(|_| ())
            .ok_or_else(|| PlatformError::not_found("post", post_id))
    }

    fn copy_file_infos(&self, user_id: &str, file_ids: &[String]) -> Result<Vec<String>, PlatformError> {
        let mut state = self.state();
        if state.faults.copy_files {
            return Err(PlatformError::store("injected file copy failure"));
        }

        let mut copies = Vec::with_capacity(file_ids.len());
        for file_id in file_ids {
            let original = state
                .files
                .get(file_id)
                .ok_or_else(|| PlatformError::not_found("file", file_id))?;
            copies.push(FileInfo {
                id: new_id(),
                creator_id: user_id.to_string(),
                post_id: String::new(),
                ..original.clone()
            });
        }

        let ids = copies.iter().map(|f| f.id.clone()).collect();
        state.files.extend(copies.into_iter().map(|f| (f.id.clone(), f)));
        Ok(ids)
    }

    fn send_ephemeral_post(&self, user_id: &str, post: Post) {
        self.state().ephemeral.push((user_id.to_string(), post));
    }
}
