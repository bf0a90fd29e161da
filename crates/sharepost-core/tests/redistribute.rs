//! Engine tests: share and move against the in-memory platform, with the
//! permalink expander wired in the way the platform runs it on post creation.

use sharepost_core::{
    ChatPlatform, CompensationLog, GENERIC_ERROR_MESSAGE, HookedPlatform, MemoryPlatform, Outcome,
    PluginConfig, PolicyRejection, RedistributeError, RedistributionEngine, RedistributionRequest,
    ShareKind,
};
use sharepost_types::models::{ADDITIONAL_TEXT_PROP, Channel, Post, PostKind, Team, User};

const SITE_URL: &str = "https://chat.example.com";

struct Fixture {
    platform: MemoryPlatform,
    config: PluginConfig,
    team: Team,
    town: Channel,
    off_topic: Channel,
    alice: User,
    bob: User,
}

fn fixture() -> Fixture {
    let platform = MemoryPlatform::new(SITE_URL);
    let team = platform.add_team("main");
    let town = platform.add_channel(&team.id, "town-square");
    let off_topic = platform.add_channel(&team.id, "off-topic");
    let alice = platform.add_user(User {
        username: "alice".into(),
        first_name: "Alice".into(),
        last_name: "Liddell".into(),
        ..Default::default()
    });
    let bob = platform.add_user(User {
        username: "bob".into(),
        ..Default::default()
    });

    Fixture {
        config: PluginConfig::new(SITE_URL),
        platform,
        team,
        town,
        off_topic,
        alice,
        bob,
    }
}

impl Fixture {
    fn request(&self, post_id: &str, to_channel: &str, kind: ShareKind) -> RedistributionRequest {
        RedistributionRequest {
            user_id: self.bob.id.clone(),
            team_id: self.team.id.clone(),
            channel_id: self.town.id.clone(),
            post_id: post_id.to_string(),
            to_channel: to_channel.to_string(),
            kind,
            additional_text: None,
        }
    }

    fn root(&self, message: &str) -> Post {
        self.platform
            .insert_post(Post::new(&self.town.id, &self.alice.id, message))
    }

    fn reply(&self, root: &Post, parent_id: &str, message: &str) -> Post {
        let mut post = Post::new(&self.town.id, &self.bob.id, message);
        post.root_id = root.id.clone();
        post.parent_id = parent_id.to_string();
        self.platform.insert_post(post)
    }

    fn link(&self, post_id: &str) -> String {
        format!("{}/main/pl/{}", SITE_URL, post_id)
    }

    fn submit(&self, request: &RedistributionRequest) -> Result<Outcome, sharepost_core::Failure> {
        let hooked = HookedPlatform::new(&self.platform, &self.config);
        RedistributionEngine::new(&hooked, &self.config).submit(request)
    }

    fn ephemeral_messages(&self) -> Vec<String> {
        self.platform
            .ephemeral_posts()
            .into_iter()
            .map(|(user_id, post)| {
                assert_eq!(user_id, self.bob.id);
                assert_eq!(post.channel_id, self.town.id);
                post.message
            })
            .collect()
    }
}

// -- Share --

#[test]
fn share_adds_one_quoted_post_and_leaves_source_alone() {
    let f = fixture();
    let root = f.root("the original");
    let reply = f.reply(&root, &root.id, "a reply");

    let outcome = f
        .submit(&f.request(&root.id, &f.off_topic.id, ShareKind::Share))
        .unwrap();
    let Outcome::Shared(report) = outcome else {
        panic!("expected a share");
    };

    let shared = f.platform.posts_in_channel(&f.off_topic.id);
    assert_eq!(shared.len(), 1);
    let new_post = &shared[0];
    assert_eq!(new_post.id, report.new_post.id);
    assert_eq!(new_post.user_id, f.bob.id);
    assert_eq!(
        new_post.message,
        format!("> Shared from ~town-square. ([original post]({}))", f.link(&root.id))
    );

    // The link in the body was expanded on creation.
    assert_eq!(new_post.attachments.len(), 1);
    assert_eq!(new_post.attachments[0].text, "the original");
    assert_eq!(new_post.attachments[0].author_name, "Alice Liddell");

    assert_eq!(f.platform.post(&root.id).unwrap(), root);
    assert_eq!(f.platform.post(&reply.id).unwrap(), reply);
    assert_eq!(f.platform.posts_in_channel(&f.town.id).len(), 2);

    assert_eq!(
        f.ephemeral_messages(),
        vec![format!(
            "[This post]({}) is shared to ~off-topic. [New post]({}).",
            f.link(&root.id),
            f.link(&new_post.id)
        )]
    );
}

#[test]
fn share_prepends_additional_text_once() {
    let f = fixture();
    let root = f.root("the original");
    let mut request = f.request(&root.id, &f.off_topic.id, ShareKind::Share);
    request.additional_text = Some("heads up\n\n".into());

    f.submit(&request).unwrap();

    let shared = f.platform.posts_in_channel(&f.off_topic.id);
    assert_eq!(shared.len(), 1);
    assert_eq!(
        shared[0].message,
        format!(
            "heads up\n\n> Shared from ~town-square. ([original post]({}))",
            f.link(&root.id)
        )
    );
    assert!(shared[0].prop(ADDITIONAL_TEXT_PROP).is_none());
}

#[test]
fn share_to_unknown_channel_is_a_lookup_failure() {
    let f = fixture();
    let root = f.root("the original");
    let before = f.platform.post_count();

    let failure = f
        .submit(&f.request(&root.id, "missing", ShareKind::Share))
        .unwrap_err();

    assert!(matches!(
        failure.error,
        RedistributeError::UpstreamLookup { entity: "channel", .. }
    ));
    assert!(failure.rollback.is_none());
    assert_eq!(f.platform.post_count(), before);
    assert_eq!(f.ephemeral_messages(), vec![GENERIC_ERROR_MESSAGE.to_string()]);
}

#[test]
fn share_create_failure_is_a_write_failure() {
    let f = fixture();
    let root = f.root("the original");
    f.platform.fail_create_after(0);

    let failure = f
        .submit(&f.request(&root.id, &f.off_topic.id, ShareKind::Share))
        .unwrap_err();

    assert!(matches!(failure.error, RedistributeError::UpstreamWrite { .. }));
    assert!(f.platform.posts_in_channel(&f.off_topic.id).is_empty());
    // Raw platform text never reaches the user.
    assert_eq!(f.ephemeral_messages(), vec![GENERIC_ERROR_MESSAGE.to_string()]);
}

// -- Move --

#[test]
fn move_lone_root_rewrites_original_in_place() {
    let f = fixture();
    let file = f.platform.add_file(&f.alice.id, "notes.txt");
    let mut root = Post::new(&f.town.id, &f.alice.id, "move me");
    root.file_ids = vec![file.id.clone()];
    let root = f.platform.insert_post(root);

    let outcome = f
        .submit(&f.request(&root.id, &f.off_topic.id, ShareKind::Move))
        .unwrap();
    let Outcome::Moved(report) = outcome else {
        panic!("expected a move");
    };
    assert!(report.marker_updated);
    assert!(report.moved_replies.is_empty());

    let moved = f.platform.posts_in_channel(&f.off_topic.id);
    assert_eq!(moved.len(), 1);
    assert_eq!(moved[0].id, report.new_root.id);
    assert_eq!(moved[0].message, "move me");
    assert_eq!(moved[0].user_id, f.alice.id);
    assert_eq!(moved[0].create_at, root.create_at);
    assert!(moved[0].is_root());

    // Files are duplicated for the acting user, not shared.
    assert_eq!(moved[0].file_ids.len(), 1);
    assert_ne!(moved[0].file_ids[0], file.id);
    assert_eq!(f.platform.file(&moved[0].file_ids[0]).unwrap().creator_id, f.bob.id);

    let original = f.platform.post(&root.id).expect("original root is kept");
    assert_eq!(original.channel_id, f.town.id);
    assert_eq!(original.kind, PostKind::SystemGeneric);
    assert_eq!(
        original.message,
        format!("This post is moved to ~off-topic. [New post]({})", f.link(&moved[0].id))
    );
    assert!(original.file_ids.is_empty());
    assert!(original.attachments.is_empty());

    assert!(f.ephemeral_messages().is_empty());
}

#[test]
fn move_thread_reparents_replies_under_new_root() {
    let f = fixture();
    let root = f.root("root");
    let first = f.reply(&root, &root.id, "first");
    let nested = f.reply(&root, &first.id, "nested under first");
    let last = f.reply(&root, &root.id, "last");

    let outcome = f
        .submit(&f.request(&root.id, &f.off_topic.id, ShareKind::Move))
        .unwrap();
    let Outcome::Moved(report) = outcome else {
        panic!("expected a move");
    };

    let moved = f.platform.posts_in_channel(&f.off_topic.id);
    assert_eq!(moved.len(), 4);
    let new_root = &moved[0];
    assert_eq!(new_root.id, report.new_root.id);
    assert_eq!(
        moved.iter().map(|p| p.message.as_str()).collect::<Vec<_>>(),
        vec!["root", "first", "nested under first", "last"]
    );
    // One level only: the nested reply now hangs off the new root.
    for reply in &moved[1..] {
        assert_eq!(reply.root_id, new_root.id);
        assert_eq!(reply.parent_id, new_root.id);
    }

    let originals: Vec<&str> = report
        .moved_replies
        .iter()
        .map(|r| r.original_id.as_str())
        .collect();
    assert_eq!(originals, vec![first.id.as_str(), nested.id.as_str(), last.id.as_str()]);
    assert_eq!(report.deleted_replies.len(), 3);
    assert!(report.failed_deletes.is_empty());
    for id in [&first.id, &nested.id, &last.id] {
        assert!(f.platform.post(id).is_none());
    }

    let original_root = f.platform.post(&root.id).unwrap();
    assert_eq!(original_root.kind, PostKind::SystemGeneric);
    assert_eq!(f.platform.posts_in_channel(&f.town.id), vec![original_root]);
}

#[test]
fn move_carries_additional_text_on_root_only() {
    let f = fixture();
    let root = f.root("root");
    f.reply(&root, &root.id, "reply");
    let mut request = f.request(&root.id, &f.off_topic.id, ShareKind::Move);
    request.additional_text = Some("moved from town\n\n".into());

    f.submit(&request).unwrap();

    let moved = f.platform.posts_in_channel(&f.off_topic.id);
    assert_eq!(moved[0].message, "moved from town\n\nroot");
    assert_eq!(moved[1].message, "reply");
    assert!(moved.iter().all(|p| p.prop(ADDITIONAL_TEXT_PROP).is_none()));
}

#[test]
fn moving_a_reply_is_rejected_without_mutation() {
    let f = fixture();
    let root = f.root("root");
    let reply = f.reply(&root, &root.id, "reply");

    let outcome = f
        .submit(&f.request(&reply.id, &f.off_topic.id, ShareKind::Move))
        .unwrap();

    assert!(matches!(outcome, Outcome::Rejected(PolicyRejection::ReplyInThread)));
    assert_eq!(f.platform.post(&root.id).unwrap(), root);
    assert_eq!(f.platform.post(&reply.id).unwrap(), reply);
    assert!(f.platform.posts_in_channel(&f.off_topic.id).is_empty());
    assert_eq!(
        f.ephemeral_messages(),
        vec![PolicyRejection::ReplyInThread.message().to_string()]
    );
}

#[test]
fn moving_into_the_same_channel_is_rejected_without_mutation() {
    let f = fixture();
    let root = f.root("root");

    let outcome = f
        .submit(&f.request(&root.id, &f.town.id, ShareKind::Move))
        .unwrap();

    assert!(matches!(outcome, Outcome::Rejected(PolicyRejection::SameChannel)));
    assert_eq!(f.platform.post(&root.id).unwrap(), root);
    assert_eq!(f.platform.post_count(), 1);
}

#[test]
fn failed_reply_create_rolls_back_every_clone() {
    let f = fixture();
    let root = f.root("root");
    let replies: Vec<Post> = (0..3)
        .map(|i| f.reply(&root, &root.id, &format!("reply {}", i)))
        .collect();

    // New root and the first reply go through; the second reply fails.
    f.platform.fail_create_after(2);

    let failure = f
        .submit(&f.request(&root.id, &f.off_topic.id, ShareKind::Move))
        .unwrap_err();

    assert!(matches!(failure.error, RedistributeError::UpstreamWrite { .. }));
    let rollback = failure.rollback.expect("rollback ran");
    assert_eq!(rollback.targeted.len(), 2);
    assert_eq!(rollback.deleted, rollback.targeted);
    assert!(rollback.is_complete());

    assert!(f.platform.posts_in_channel(&f.off_topic.id).is_empty());
    assert_eq!(f.platform.post(&root.id).unwrap(), root);
    for reply in &replies {
        assert_eq!(f.platform.post(&reply.id).as_ref(), Some(reply));
    }
    assert_eq!(f.ephemeral_messages(), vec![GENERIC_ERROR_MESSAGE.to_string()]);
}

#[test]
fn failed_reply_lookup_rolls_back_the_new_root() {
    let f = fixture();
    let root = f.root("root");
    let reply = f.reply(&root, &root.id, "reply");
    f.platform.fail_get_post(&reply.id);

    let failure = f
        .submit(&f.request(&root.id, &f.off_topic.id, ShareKind::Move))
        .unwrap_err();

    assert!(matches!(
        failure.error,
        RedistributeError::UpstreamLookup { entity: "post", .. }
    ));
    assert_eq!(failure.rollback.unwrap().deleted.len(), 1);
    assert!(f.platform.posts_in_channel(&f.off_topic.id).is_empty());
    assert_eq!(f.platform.post(&root.id).unwrap(), root);
}

#[test]
fn move_is_committed_even_if_the_marker_update_fails() {
    let f = fixture();
    let root = f.root("root");
    let reply = f.reply(&root, &root.id, "reply");
    f.platform.fail_update(&root.id);

    let outcome = f
        .submit(&f.request(&root.id, &f.off_topic.id, ShareKind::Move))
        .unwrap();
    let Outcome::Moved(report) = outcome else {
        panic!("expected a move");
    };

    assert!(!report.marker_updated);
    assert_eq!(f.platform.posts_in_channel(&f.off_topic.id).len(), 2);
    assert_eq!(f.platform.post(&root.id).unwrap(), root);
    assert!(f.platform.post(&reply.id).is_none());
}

#[test]
fn failed_original_reply_delete_is_reported_not_escalated() {
    let f = fixture();
    let root = f.root("root");
    let stuck = f.reply(&root, &root.id, "stuck");
    let gone = f.reply(&root, &root.id, "gone");
    f.platform.fail_delete(&stuck.id);

    let outcome = f
        .submit(&f.request(&root.id, &f.off_topic.id, ShareKind::Move))
        .unwrap();
    let Outcome::Moved(report) = outcome else {
        panic!("expected a move");
    };

    assert_eq!(report.failed_deletes, vec![stuck.id.clone()]);
    assert_eq!(report.deleted_replies, vec![gone.id.clone()]);
    assert!(f.platform.post(&stuck.id).is_some());
}

#[test]
fn file_copy_failure_aborts_move_before_anything_is_created() {
    let f = fixture();
    let root = f.root("root");
    f.platform.fail_copy_files();

    let failure = f
        .submit(&f.request(&root.id, &f.off_topic.id, ShareKind::Move))
        .unwrap_err();

    assert!(failure.rollback.is_none());
    assert_eq!(f.platform.post_count(), 1);
    assert_eq!(f.platform.post(&root.id).unwrap(), root);
}

#[test]
fn rollback_keeps_going_past_a_failed_delete() {
    let f = fixture();
    let a = f.root("a");
    let b = f.root("b");
    let c = f.root("c");
    f.platform.fail_delete(&b.id);

    let mut log = CompensationLog::new();
    for post in [&a, &b, &c] {
        log.record(&post.id);
    }
    let report = log.rollback(&f.platform);

    assert_eq!(report.targeted, vec![a.id.clone(), b.id.clone(), c.id.clone()]);
    assert_eq!(report.deleted, vec![a.id.clone(), c.id.clone()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, b.id);
    assert!(!report.is_complete());
    assert!(f.platform.get_post(&b.id).is_ok());
}
