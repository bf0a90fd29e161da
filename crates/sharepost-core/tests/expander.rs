use sharepost_core::{
    ChatPlatform, ExpandError, HookedPlatform, MemoryPlatform, PermalinkExpander, PlatformError,
    PluginConfig,
};
use sharepost_types::models::{ADDITIONAL_TEXT_PROP, Channel, Post, QuoteAttachment, User};

const SITE_URL: &str = "https://chat.example.com";
/// Mon 2 Jan 2006 15:04:05 UTC
const QUOTED_AT: i64 = 1_136_214_245_000;

struct Fixture {
    platform: MemoryPlatform,
    config: PluginConfig,
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
        nickname: "Al".into(),
        ..Default::default()
    });
    let bob = platform.add_user(User {
        username: "bob".into(),
        ..Default::default()
    });

    Fixture {
        config: PluginConfig::new(SITE_URL),
        platform,
        town,
        off_topic,
        alice,
        bob,
    }
}

impl Fixture {
    fn quoted(&self, message: &str, file_ids: Vec<String>) -> Post {
        let mut post = Post::new(&self.town.id, &self.alice.id, message);
        post.create_at = QUOTED_AT;
        post.file_ids = file_ids;
        self.platform.insert_post(post)
    }

    fn link(&self, post_id: &str) -> String {
        format!("{}/main/pl/{}", SITE_URL, post_id)
    }

    fn draft(&self, message: &str) -> Post {
        Post::new(&self.off_topic.id, &self.bob.id, message)
    }

    fn expand(&self, post: Post) -> Result<Post, ExpandError> {
        PermalinkExpander::new(&self.platform, &self.config).message_will_be_posted(post)
    }
}

#[test]
fn post_without_self_link_is_unchanged() {
    let f = fixture();
    let draft = f.draft("nothing to see, https://elsewhere.example.com/main/pl/abc");

    let expanded = f.expand(draft.clone()).unwrap();

    assert_eq!(expanded, draft);
}

#[test]
fn single_link_becomes_one_quote_with_copied_files() {
    let f = fixture();
    let file = f.platform.add_file(&f.alice.id, "diagram.png");
    let quoted = f.quoted("original words", vec![file.id.clone()]);
    let own_file = f.platform.add_file(&f.bob.id, "mine.txt");
    let mut draft = f.draft(&format!("look at {}", f.link(&quoted.id)));
    draft.file_ids = vec![own_file.id.clone()];

    let expanded = f.expand(draft).unwrap();

    assert_eq!(expanded.message, format!("look at {}", f.link(&quoted.id)));
    assert_eq!(
        expanded.attachments,
        vec![QuoteAttachment {
            author_name: "Al".into(),
            author_icon: format!("{}/api/v4/users/{}/image", SITE_URL, f.alice.id),
            timestamp: QUOTED_AT,
            text: "original words".into(),
            footer: "Posted in ~town-square on Mon 2 Jan 2006 at 15:04:05 UTC".into(),
        }]
    );

    assert_eq!(expanded.file_ids.len(), 2);
    assert_eq!(expanded.file_ids[0], own_file.id);
    let copy = f.platform.file(&expanded.file_ids[1]).unwrap();
    assert_ne!(copy.id, file.id);
    assert_eq!(copy.creator_id, f.bob.id);
    assert_eq!(copy.name, "diagram.png");
}

#[test]
fn only_the_first_of_two_links_is_expanded() {
    let f = fixture();
    let first = f.quoted("first", vec![]);
    let second = f.quoted("second", vec![]);
    let draft = f.draft(&format!("{} and {}", f.link(&first.id), f.link(&second.id)));

    let expanded = f.expand(draft).unwrap();

    assert_eq!(expanded.attachments.len(), 1);
    assert_eq!(expanded.attachments[0].text, "first");
}

#[test]
fn text_typed_right_after_a_link_is_not_part_of_the_id() {
    let f = fixture();
    let quoted = f.quoted("quoted", vec![]);
    let draft = f.draft(&format!("{}を見て", f.link(&quoted.id)));

    let expanded = f.expand(draft).unwrap();

    assert_eq!(expanded.message, format!("{}を見て", f.link(&quoted.id)));
    assert_eq!(expanded.attachments.len(), 1);
    assert_eq!(expanded.attachments[0].text, "quoted");
}

#[test]
fn existing_quote_blocks_are_replaced() {
    let f = fixture();
    let quoted = f.quoted("fresh", vec![]);
    let mut draft = f.draft(&f.link(&quoted.id));
    draft.attachments = vec![
        QuoteAttachment {
            text: "stale one".into(),
            ..Default::default()
        },
        QuoteAttachment {
            text: "stale two".into(),
            ..Default::default()
        },
    ];

    let expanded = f.expand(draft).unwrap();

    assert_eq!(expanded.attachments.len(), 1);
    assert_eq!(expanded.attachments[0].text, "fresh");
}

#[test]
fn link_to_missing_post_blocks_the_post() {
    let f = fixture();
    let draft = f.draft(&f.link("doesnotexist"));

    let err = f.expand(draft).unwrap_err();

    assert_eq!(err.reason(), "post not found: doesnotexist");
}

#[test]
fn link_into_another_team_is_not_expanded() {
    let f = fixture();
    let quoted = f.quoted("other team", vec![]);
    let draft = f.draft(&format!("{}/ops/pl/{}", SITE_URL, quoted.id));

    let expanded = f.expand(draft.clone()).unwrap();

    assert_eq!(expanded, draft);
}

#[test]
fn additional_text_is_prepended_once_and_never_scanned() {
    let f = fixture();
    let quoted = f.quoted("quoted", vec![]);
    let mut draft = f.draft("body");
    draft.set_prop(ADDITIONAL_TEXT_PROP, format!("see {}\n\n", f.link(&quoted.id)));

    let expanded = f.expand(draft).unwrap();

    assert_eq!(expanded.message, format!("see {}\n\nbody", f.link(&quoted.id)));
    assert!(expanded.attachments.is_empty());
    assert!(expanded.prop(ADDITIONAL_TEXT_PROP).is_none());

    // A second pass finds nothing left to prepend, and now scans the link.
    let again = f.expand(expanded).unwrap();
    assert_eq!(again.message, format!("see {}\n\nbody", f.link(&quoted.id)));
    assert_eq!(again.attachments.len(), 1);
}

#[test]
fn direct_channels_skip_expansion_but_keep_additional_text() {
    let f = fixture();
    let quoted = f.quoted("quoted", vec![]);
    let dm = f.platform.add_direct_channel("alice__bob");
    let mut draft = Post::new(&dm.id, &f.bob.id, f.link(&quoted.id));
    draft.set_prop(ADDITIONAL_TEXT_PROP, "fyi\n\n");

    let expanded = f.expand(draft).unwrap();

    assert!(expanded.attachments.is_empty());
    assert_eq!(expanded.message, format!("fyi\n\n{}", f.link(&quoted.id)));
}

#[test]
fn bot_authors_are_shown_by_username() {
    let f = fixture();
    let bot = f.platform.add_user(User {
        username: "deploybot".into(),
        nickname: "Deploys".into(),
        is_bot: true,
        ..Default::default()
    });
    let mut quoted = Post::new(&f.town.id, &bot.id, "shipped");
    quoted.create_at = QUOTED_AT;
    let quoted = f.platform.insert_post(quoted);

    let expanded = f.expand(f.draft(&f.link(&quoted.id))).unwrap();

    assert_eq!(expanded.attachments[0].author_name, "deploybot");
}

#[test]
fn hooked_platform_refuses_rejected_posts() {
    let f = fixture();
    let hooked = HookedPlatform::new(&f.platform, &f.config);
    let before = f.platform.post_count();

    let err = hooked.create_post(f.draft(&f.link("gone"))).unwrap_err();

    assert_eq!(err, PlatformError::Rejected("post not found: gone".into()));
    assert_eq!(f.platform.post_count(), before);
}

#[test]
fn hooked_platform_persists_the_expanded_post() {
    let f = fixture();
    let quoted = f.quoted("quoted", vec![]);
    let hooked = HookedPlatform::new(&f.platform, &f.config);

    let created = hooked.create_post(f.draft(&f.link(&quoted.id))).unwrap();

    let stored = f.platform.post(&created.id).unwrap();
    assert_eq!(stored.attachments.len(), 1);
    assert_eq!(stored, created);
}
