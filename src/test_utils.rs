use crate::router::create_router;
use crate::schemas::AppState;
use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue};
use axum_test::TestServer;
use chrono::Duration;
use migration::{Migrator, MigratorTrait};
use model::entities::user::{self, Role};
use sea_orm::{Database, DatabaseConnection};
use store::users::NewUser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub const PASSWORD: &str = "secret-pass";

/// Create an in-memory SQLite database for testing
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Initialize tracing for tests with output to STDERR.
///
/// The log level comes from RUST_LOG and defaults to WARN. The returned
/// guard uninstalls the subscriber when dropped.
fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_default(subscriber)
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    _tracing: tracing::subscriber::DefaultGuard,
}

impl TestApp {
    pub async fn new() -> Self {
        let tracing = init_test_tracing();
        let state = AppState {
            db: setup_test_db().await,
            session_ttl: Duration::hours(1),
        };
        let server = TestServer::new(create_router(state.clone())).expect("Failed to start test server");
        Self {
            server,
            state,
            _tracing: tracing,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.state.db
    }

    /// Creates an account directly in the store
    pub async fn create_user(&self, email: &str, role: Role) -> user::Model {
        store::users::create(
            self.db(),
            NewUser {
                email: email.to_string(),
                password: PASSWORD.to_string(),
                name: format!("{:?} user", role),
                role,
            },
        )
        .await
        .expect("Failed to create user")
    }

    /// Creates an account and returns a bearer token for it
    pub async fn token_for(&self, email: &str, role: Role) -> String {
        let user = self.create_user(email, role).await;
        store::sessions::open(self.db(), user.id, Duration::hours(1))
            .await
            .expect("Failed to open session")
            .token
    }

    pub async fn admin_token(&self) -> String {
        self.token_for("admin@example.com", Role::Admin).await
    }
}

pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    let value = HeaderValue::from_str(&format!("Bearer {}", token)).expect("Invalid token header");
    (AUTHORIZATION, value)
}
