// tests/model_tests.rs

use social_model::{
    AppState, ErrorKind,
    config::Config,
    models::{
        comment::CreateCommentRequest,
        media::CreateMediaRequest,
        post::CreatePostRequest,
        story::CreateStoryRequest,
        user::{ChangePasswordRequest, CreateUserRequest, UpdateUserRequest, User},
    },
    repo::{comments, followers, media, posts, stories, users},
};
use sqlx::SqlitePool;

/// Fresh in-memory database with the schema applied.
async fn setup() -> SqlitePool {
    AppState::init(Config::in_memory())
        .await
        .expect("Failed to set up in-memory database")
        .pool
}

async fn new_user(pool: &SqlitePool, name: &str) -> User {
    users::create_user(
        pool,
        CreateUserRequest::new(&format!("{}@example.com", name), name, "password123"),
    )
    .await
    .expect("Failed to create user")
}

fn caption(text: &str) -> CreatePostRequest {
    CreatePostRequest {
        caption: Some(text.to_string()),
    }
}

fn comment(text: &str) -> CreateCommentRequest {
    CreateCommentRequest {
        text: text.to_string(),
    }
}

#[tokio::test]
async fn create_user_hashes_password() {
    let pool = setup().await;

    let user = new_user(&pool, "alice").await;

    assert!(user.id > 0);
    assert!(user.is_active);
    assert_eq!(user.followers, 0);
    assert_ne!(user.password, "password123");
    assert!(user.password.starts_with("$argon2"));

    let found = users::verify_credentials(&pool, "alice", "password123")
        .await
        .unwrap();
    assert_eq!(found.map(|u| u.id), Some(user.id));
    assert!(users::verify_credentials(&pool, "alice", "wrongpass1")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn duplicate_email_is_validation_error() {
    let pool = setup().await;
    new_user(&pool, "alice").await;

    let err = users::create_user(
        &pool,
        CreateUserRequest::new("ALICE@example.com", "someoneelse", "password123"),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.field(), Some("email"));
}

#[tokio::test]
async fn duplicate_username_is_validation_error() {
    let pool = setup().await;
    new_user(&pool, "alice").await;

    let err = users::create_user(
        &pool,
        CreateUserRequest::new("other@example.com", "alice", "password123"),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.field(), Some("username"));
}

#[tokio::test]
async fn invalid_fields_fail_before_write() {
    let pool = setup().await;

    let cases = [
        (CreateUserRequest::new("nope", "alice", "password123"), "email"),
        (CreateUserRequest::new("a@example.com", "al", "password123"), "username"),
        (CreateUserRequest::new("a@example.com", "alice", "weak"), "password"),
    ];

    for (req, field) in cases {
        let err = users::create_user(&pool, req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.field(), Some(field));
    }

    assert!(users::get_user_by_username(&pool, "alice").await.unwrap().is_none());
}

#[tokio::test]
async fn serialized_user_omits_password() {
    let pool = setup().await;
    let user = new_user(&pool, "alice").await;

    let json = serde_json::to_value(user.to_response()).unwrap();

    assert!(json.get("password").is_none());
    assert!(json.get("followers").is_none());
    assert_eq!(json["id"], user.id);
    assert_eq!(json["email"], "alice@example.com");
    assert_eq!(json["username"], "alice");
}

#[tokio::test]
async fn update_user_keeps_uniqueness() {
    let pool = setup().await;
    let alice = new_user(&pool, "alice").await;
    new_user(&pool, "bob").await;

    let err = users::update_user(
        &pool,
        alice.id,
        UpdateUserRequest {
            username: Some("bob".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.field(), Some("username"));

    let updated = users::update_user(
        &pool,
        alice.id,
        UpdateUserRequest {
            bio: Some(Some("Photographer".into())),
            email: Some("alice@example.com".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.bio.as_deref(), Some("Photographer"));
    assert_eq!(updated.username, "alice");
    assert_eq!(updated.created_at, alice.created_at);
}

#[tokio::test]
async fn update_user_can_clear_optional_fields() {
    let pool = setup().await;
    let alice = new_user(&pool, "alice").await;

    let filled = users::update_user(
        &pool,
        alice.id,
        UpdateUserRequest {
            name: Some(Some("Alice".into())),
            bio: Some(Some("Photographer".into())),
            profile_picture: Some(Some("/uploads/alice.jpg".into())),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(filled.name.as_deref(), Some("Alice"));
    assert_eq!(filled.profile_picture.as_deref(), Some("/uploads/alice.jpg"));

    let cleared = users::update_user(
        &pool,
        alice.id,
        UpdateUserRequest {
            bio: Some(None),
            profile_picture: Some(None),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(cleared.bio, None);
    assert_eq!(cleared.profile_picture, None);
    // Absent fields stay as they were.
    assert_eq!(cleared.name.as_deref(), Some("Alice"));
}

#[tokio::test]
async fn change_password_requires_old_one() {
    let pool = setup().await;
    let alice = new_user(&pool, "alice").await;

    let err = users::change_password(
        &pool,
        alice.id,
        ChangePasswordRequest {
            old_password: "notmypass1".into(),
            new_password: "newpassword9".into(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.field(), Some("old_password"));

    users::change_password(
        &pool,
        alice.id,
        ChangePasswordRequest {
            old_password: "password123".into(),
            new_password: "newpassword9".into(),
        },
    )
    .await
    .unwrap();

    assert!(users::verify_credentials(&pool, "alice", "newpassword9")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn post_requires_existing_active_user() {
    let pool = setup().await;

    let err = posts::create_post(&pool, 999, caption("hello")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let alice = new_user(&pool, "alice").await;
    users::set_active(&pool, alice.id, false).await.unwrap();

    let err = posts::create_post(&pool, alice.id, caption("hello")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert!(users::verify_credentials(&pool, "alice", "password123")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn oversize_caption_is_rejected() {
    let pool = setup().await;
    let alice = new_user(&pool, "alice").await;

    let err = posts::create_post(&pool, alice.id, caption(&"x".repeat(2201)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.field(), Some("caption"));
}

#[tokio::test]
async fn caption_limit_counts_stored_characters() {
    let pool = setup().await;
    let alice = new_user(&pool, "alice").await;

    let post = posts::create_post(&pool, alice.id, caption(&"&".repeat(2200)))
        .await
        .unwrap();
    assert_eq!(post.caption.as_deref().map(|c| c.chars().count()), Some(2200));

    let err = posts::create_post(&pool, alice.id, caption(&"&".repeat(2201)))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("caption"));

    let post = posts::create_post(&pool, alice.id, caption("Tom & Jerry <3"))
        .await
        .unwrap();
    assert_eq!(post.caption.as_deref(), Some("Tom & Jerry <3"));

    // Markup does not count towards the limit once stripped.
    let wrapped = format!("<b>{}</b>", "x".repeat(2200));
    let post = posts::update_caption(&pool, post.id, caption(&wrapped)).await.unwrap();
    assert_eq!(post.caption.as_deref().map(|c| c.len()), Some(2200));
}

#[tokio::test]
async fn post_round_trip_keeps_media_and_comments() {
    let pool = setup().await;
    let alice = new_user(&pool, "alice").await;
    let bob = new_user(&pool, "bob").await;

    let post = posts::create_post(&pool, alice.id, caption("Golden hour"))
        .await
        .unwrap();
    let photo = media::create_media(
        &pool,
        post.id,
        CreateMediaRequest {
            file_type: "image".into(),
            url: "https://cdn.example.com/p/1.jpg".into(),
        },
    )
    .await
    .unwrap();
    let remark = comments::create_comment(&pool, post.id, bob.id, comment("Stunning"))
        .await
        .unwrap();

    let detail = posts::get_post_detail(&pool, post.id).await.unwrap();

    assert_eq!(detail.post.id, post.id);
    assert_eq!(detail.post.caption.as_deref(), Some("Golden hour"));
    assert_eq!(detail.media, vec![photo.to_response()]);
    assert_eq!(detail.comments, vec![remark.to_response()]);
    assert_eq!(detail.comments[0].author_id, bob.id);

    let json = serde_json::to_value(&detail).unwrap();
    assert_eq!(json["media"][0]["url"], "https://cdn.example.com/p/1.jpg");
    assert!(json["media"][0].get("post_id").is_none());
}

#[tokio::test]
async fn unknown_media_type_is_accepted() {
    let pool = setup().await;
    let alice = new_user(&pool, "alice").await;
    let post = posts::create_post(&pool, alice.id, caption("listen")).await.unwrap();

    let clip = media::create_media(
        &pool,
        post.id,
        CreateMediaRequest {
            file_type: "Audio".into(),
            url: "/uploads/clip.mp3".into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(clip.file_type, "audio");

    let err = media::create_media(
        &pool,
        post.id,
        CreateMediaRequest {
            file_type: "   ".into(),
            url: "/uploads/blank.jpg".into(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.field(), Some("file_type"));
    assert_eq!(media::list_media_by_post(&pool, post.id).await.unwrap().len(), 1);

    let err = media::create_media(
        &pool,
        post.id,
        CreateMediaRequest {
            file_type: "image".into(),
            url: "not a url".into(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.field(), Some("url"));

    let err = media::create_media(
        &pool,
        4242,
        CreateMediaRequest {
            file_type: "image".into(),
            url: "/uploads/a.jpg".into(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn comment_markup_is_stripped() {
    let pool = setup().await;
    let alice = new_user(&pool, "alice").await;
    let post = posts::create_post(&pool, alice.id, caption("hi")).await.unwrap();

    let c = comments::create_comment(&pool, post.id, alice.id, comment("<b>nice</b> shot"))
        .await
        .unwrap();
    assert_eq!(c.text, "nice shot");

    let c = comments::create_comment(&pool, post.id, alice.id, comment("5 < 6 & 7 > 2"))
        .await
        .unwrap();
    assert_eq!(c.text, "5 < 6 & 7 > 2");

    let c = comments::create_comment(&pool, post.id, alice.id, comment(&"&".repeat(1000)))
        .await
        .unwrap();
    assert_eq!(c.text.len(), 1000);

    let err = comments::create_comment(&pool, post.id, alice.id, comment("<script>x</script>"))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("text"));

    let err = comments::create_comment(&pool, 777, alice.id, comment("hello"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn counters_clamp_at_zero() {
    let pool = setup().await;
    let alice = new_user(&pool, "alice").await;
    let post = posts::create_post(&pool, alice.id, caption("hi")).await.unwrap();

    let post = posts::add_like(&pool, post.id).await.unwrap();
    assert_eq!(post.likes, 1);
    let post = posts::remove_like(&pool, post.id).await.unwrap();
    let post = posts::remove_like(&pool, post.id).await.unwrap();
    assert_eq!(post.likes, 0);

    let post = posts::add_save(&pool, post.id).await.unwrap();
    assert_eq!(post.saves, 1);
    let post = posts::remove_save(&pool, post.id).await.unwrap();
    assert_eq!(post.saves, 0);
}

#[tokio::test]
async fn delete_post_cascades_to_attachments() {
    let pool = setup().await;
    let alice = new_user(&pool, "alice").await;
    let post = posts::create_post(&pool, alice.id, caption("bye")).await.unwrap();
    let m = media::create_media(
        &pool,
        post.id,
        CreateMediaRequest {
            file_type: "video".into(),
            url: "/uploads/v.mp4".into(),
        },
    )
    .await
    .unwrap();
    let c = comments::create_comment(&pool, post.id, alice.id, comment("first"))
        .await
        .unwrap();

    let summary = posts::delete_post(&pool, post.id).await.unwrap();
    assert_eq!((summary.posts, summary.media, summary.comments), (1, 1, 1));

    assert_eq!(posts::get_post(&pool, post.id).await.unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(media::get_media(&pool, m.id).await.unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(comments::get_comment(&pool, c.id).await.unwrap_err().kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn delete_user_always_cascades() {
    let pool = setup().await;

    // Same policy regardless of how much the user owns.
    for round in 0..5 {
        let owner = new_user(&pool, &format!("owner{}", round)).await;
        let fan = new_user(&pool, &format!("fan{}", round)).await;

        for i in 0..round {
            let post = posts::create_post(&pool, owner.id, caption(&format!("post {}", i)))
                .await
                .unwrap();
            comments::create_comment(&pool, post.id, fan.id, comment("nice"))
                .await
                .unwrap();
        }
        stories::create_story(&pool, owner.id, CreateStoryRequest::default())
            .await
            .unwrap();
        followers::create_follower_edge(&pool, fan.id, owner.id).await.unwrap();
        followers::create_follower_edge(&pool, owner.id, fan.id).await.unwrap();

        let summary = users::delete_user(&pool, owner.id).await.unwrap();

        assert_eq!(summary.posts, round as u64);
        assert_eq!(summary.comments, round as u64);
        assert_eq!(summary.stories, 1);
        assert_eq!(summary.follower_edges, 2);

        assert_eq!(users::get_user(&pool, owner.id).await.unwrap_err().kind(), ErrorKind::NotFound);
        assert!(comments::list_comments_by_user(&pool, fan.id).await.unwrap().is_empty());

        // The fan lost a follower along with the deleted user.
        let fan = users::get_user(&pool, fan.id).await.unwrap();
        assert_eq!(fan.followers, 0);
        assert!(followers::list_following(&pool, fan.id).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn delete_missing_user_is_not_found() {
    let pool = setup().await;
    let err = users::delete_user(&pool, 31337).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn posts_listed_by_owner() {
    let pool = setup().await;
    let alice = new_user(&pool, "alice").await;
    let bob = new_user(&pool, "bob").await;

    let first = posts::create_post(&pool, alice.id, caption("one")).await.unwrap();
    let second = posts::create_post(&pool, alice.id, caption("two")).await.unwrap();
    posts::create_post(&pool, bob.id, caption("bob's")).await.unwrap();

    let listed: Vec<i64> = posts::list_posts_by_user(&pool, alice.id)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();

    assert_eq!(listed, vec![second.id, first.id]);
}

#[tokio::test]
async fn edits_and_single_deletes() {
    let pool = setup().await;
    let alice = new_user(&pool, "alice").await;
    let post = posts::create_post(&pool, alice.id, caption("draft")).await.unwrap();

    let post = posts::update_caption(&pool, post.id, caption("final")).await.unwrap();
    assert_eq!(post.caption.as_deref(), Some("final"));

    let c = comments::create_comment(&pool, post.id, alice.id, comment("typo"))
        .await
        .unwrap();
    let edited = comments::update_comment_text(&pool, c.id, comment("fixed"))
        .await
        .unwrap();
    assert_eq!(edited.text, "fixed");
    assert_eq!(edited.created_at, c.created_at);

    comments::delete_comment(&pool, c.id).await.unwrap();
    assert_eq!(
        comments::delete_comment(&pool, c.id).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );

    let m = media::create_media(
        &pool,
        post.id,
        CreateMediaRequest {
            file_type: "image".into(),
            url: "/uploads/x.png".into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(media::get_media(&pool, m.id).await.unwrap().url, "/uploads/x.png");
    media::delete_media(&pool, m.id).await.unwrap();
    assert!(media::list_media_by_post(&pool, post.id).await.unwrap().is_empty());

    // The post itself survives.
    assert_eq!(posts::get_post(&pool, post.id).await.unwrap().id, post.id);
}
