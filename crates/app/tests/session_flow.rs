use std::sync::Arc;

use chrono::{Duration, Utc};
use tnai::TutorApp;
use tnai::auth::{AuthPhase, LoginForm};
use tnai::chat::{Author, ChatSurface};
use tnai::session::{
    REMEMBER_KEY, SESSION_KEY, SessionPreferences, SessionStore, SubscriptionTier, UserSession,
};
use tnai::settings::AppSettings;
use tnai::{Surface, Tab};
use tnai_storage::{KeyValueStore, MemoryStorage, SqliteStorage};

fn fast_settings() -> Arc<AppSettings> {
    Arc::new(AppSettings {
        sign_in_latency_ms: 5,
        registration_latency_ms: 5,
        free_text_reply_delay_ms: 5,
        adventure_reply_delay_ms: 5,
        faq_reply_delay_ms: 5,
        ..AppSettings::default()
    })
}

fn stored_session(last_login_days_ago: i64) -> UserSession {
    UserSession {
        id: "user_123".to_string(),
        email: "a@b.com".to_string(),
        display_name: "Thanh Trúc".to_string(),
        avatar_ref: None,
        subscription_tier: SubscriptionTier::Premium,
        last_login_at: Utc::now() - Duration::days(last_login_days_ago),
        preferences: SessionPreferences {
            remember_login: true,
        },
    }
}

#[tokio::test(start_paused = true)]
async fn sign_in_then_chat_end_to_end() {
    let storage = Arc::new(MemoryStorage::new());
    let mut app = TutorApp::new(Arc::new(AppSettings::default()), storage.clone());
    app.boot();
    assert_eq!(app.surface(), Surface::Welcome);

    app.show_login();
    assert!(
        app.submit_login(LoginForm::new("a@b.com", "secret", true))
            .await
    );
    assert!(app.phase().is_authenticated());

    let blob = storage.get(SESSION_KEY).unwrap().expect("session persisted");
    let persisted: UserSession = serde_json::from_str(&blob).unwrap();
    assert_eq!(persisted.email, "a@b.com");

    let id = app.new_conversation();
    app.send_text("Hello").unwrap();

    let messages = app.messages(&id);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].author, Author::User);
    assert_eq!(messages[0].content, "Hello");
    assert!(app.is_typing());

    let event = app.next_reply_event().await.expect("reply event");
    assert!(app.apply_reply_event(event));

    let messages = app.messages(&id);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].author, Author::Assistant);
    assert!(!messages[1].content.is_empty());
    assert!(!app.is_typing());
}

#[tokio::test(start_paused = true)]
async fn stale_session_starts_on_the_welcome_surface() {
    let storage = Arc::new(MemoryStorage::new());
    SessionStore::new(storage.clone(), 7)
        .persist(&stored_session(8))
        .unwrap();

    let mut app = TutorApp::new(Arc::new(AppSettings::default()), storage.clone());
    app.boot();

    assert_eq!(app.phase(), &AuthPhase::Initial);
    assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn recent_session_skips_sign_in() {
    let storage = Arc::new(MemoryStorage::new());
    SessionStore::new(storage.clone(), 7)
        .persist(&stored_session(6))
        .unwrap();

    let mut app = TutorApp::new(Arc::new(AppSettings::default()), storage);
    app.boot();

    assert_eq!(
        app.surface(),
        Surface::Main {
            tab: Tab::Chat,
            chat: ChatSurface::Welcome,
        }
    );
}

#[tokio::test]
async fn remembered_login_survives_a_restart_on_sqlite() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("tnai.db").display().to_string();

    let first_identity = {
        let storage = SqliteStorage::open(&path).await.unwrap();
        let mut app = TutorApp::new(fast_settings(), Arc::new(storage));
        app.boot();
        app.show_login();
        assert!(
            app.submit_login(LoginForm::new("a@b.com", "secret", true))
                .await
        );
        app.session().cloned().unwrap()
    };

    let storage = SqliteStorage::open(&path).await.unwrap();
    let mut app = TutorApp::new(fast_settings(), Arc::new(storage));
    app.boot();

    let restored = app.session().expect("restored session");
    assert_eq!(restored.id, first_identity.id);
    assert_eq!(restored.email, first_identity.email);
    assert_eq!(restored.display_name, first_identity.display_name);
}

#[tokio::test(start_paused = true)]
async fn login_without_remember_is_not_restored() {
    let storage = Arc::new(MemoryStorage::new());
    let mut app = TutorApp::new(Arc::new(AppSettings::default()), storage.clone());
    app.show_login();
    assert!(
        app.submit_login(LoginForm::new("a@b.com", "secret", false))
            .await
    );

    let mut restarted = TutorApp::new(Arc::new(AppSettings::default()), storage.clone());
    restarted.boot();

    assert_eq!(restarted.phase(), &AuthPhase::Initial);
    assert!(storage.is_empty());
}

#[tokio::test(start_paused = true)]
async fn logout_clears_session_and_resets_selection() {
    let storage = Arc::new(MemoryStorage::new());
    let mut app = TutorApp::new(Arc::new(AppSettings::default()), storage.clone());
    app.show_login();
    assert!(
        app.submit_login(LoginForm::new("a@b.com", "secret", true))
            .await
    );
    app.send_text("Explain fractions").unwrap();
    app.navigate_to_files();

    app.logout();

    assert_eq!(app.surface(), Surface::Welcome);
    assert_eq!(app.tab(), Tab::Chat);
    assert!(app.active_conversation().is_none());
    assert!(!app.has_pending_replies() || app.settle_replies().await == 0);

    let mut restarted = TutorApp::new(Arc::new(AppSettings::default()), storage.clone());
    restarted.boot();
    assert_eq!(restarted.phase(), &AuthPhase::Initial);
    assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
    // The durable remember-me marker stays for the next sign-in form.
    assert!(storage.get(REMEMBER_KEY).unwrap().is_some());
    assert_eq!(restarted.login_prefill().email, "a@b.com");
}
