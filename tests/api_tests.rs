use blog_portal::{
    AppConfig, AppState, MemoryRepository, MemorySessionStore, RepositoryState, SessionState,
    create_router,
};
use reqwest::{StatusCode, header, redirect};
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepository::new()) as RepositoryState;
    let sessions = Arc::new(MemorySessionStore::new()) as SessionState;
    let config = AppConfig::default();

    let state = AppState {
        repo,
        sessions,
        config,
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    // Redirects are part of the contract, so they are asserted, not followed.
    let client = reqwest::Client::builder()
        .redirect(redirect::Policy::none())
        .build()
        .unwrap();

    TestApp { address, client }
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn join(&self, username: &str, password: &str) -> reqwest::Response {
        let email = format!("{username}@x.com");
        self.client
            .post(self.url("/join"))
            .form(&[("username", username), ("password", password), ("email", email.as_str())])
            .send()
            .await
            .expect("req fail")
    }

    /// Logs in and returns the `name=value` cookie pair to send back.
    async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .client
            .post(self.url("/login"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("req fail");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("login must set the session cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn get_json(&self, path: &str) -> Value {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("req fail")
            .json()
            .await
            .unwrap()
    }
}

fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(app.url("/health"))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_board_lifecycle() {
    let app = spawn_app().await;

    // 1. Register, which lands on the login form rather than logging in.
    let response = app.join("alice", "pw1").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login-form");

    let cookie = app.login("alice", "pw1").await;

    // 2. Create
    let response = app
        .client
        .post(app.url("/board/save"))
        .header(header::COOKIE, &cookie)
        .form(&[("title", "Hello"), ("content", "World")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let feed = app.get_json("/").await;
    let board_id = feed["data"]["boardList"][0]["id"].as_i64().unwrap();
    assert_eq!(feed["data"]["boardList"][0]["author"], "alice");

    // 3. Read (public)
    let detail = app.get_json(&format!("/board/{board_id}")).await;
    assert_eq!(detail["view"], "board/detail");
    assert_eq!(detail["data"]["board"]["title"], "Hello");

    // 4. Update
    let response = app
        .client
        .post(app.url(&format!("/board/{board_id}/update-form")))
        .header(header::COOKIE, &cookie)
        .form(&[("title", "Hi"), ("content", "World2")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/board/{board_id}"));

    let detail = app.get_json(&format!("/board/{board_id}")).await;
    assert_eq!(detail["data"]["board"]["title"], "Hi");
    assert_eq!(detail["data"]["board"]["content"], "World2");

    // 5. Delete
    let response = app
        .client
        .post(app.url(&format!("/board/{board_id}/delete")))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/");

    let response = app
        .client
        .get(app.url(&format!("/board/{board_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_owner_is_forbidden() {
    let app = spawn_app().await;
    app.join("owner", "pw").await;
    app.join("intruder", "pw").await;

    let owner = app.login("owner", "pw").await;
    let intruder = app.login("intruder", "pw").await;

    app.client
        .post(app.url("/board/save"))
        .header(header::COOKIE, &owner)
        .form(&[("title", "Mine"), ("content", "Hands off")])
        .send()
        .await
        .unwrap();
    let feed = app.get_json("/").await;
    let board_id = feed["data"]["boardList"][0]["id"].as_i64().unwrap();

    let response = app
        .client
        .post(app.url(&format!("/board/{board_id}/delete")))
        .header(header::COOKIE, &intruder)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "FORBIDDEN");

    let detail = app.get_json(&format!("/board/{board_id}")).await;
    assert_eq!(detail["data"]["board"]["title"], "Mine");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = spawn_app().await;
    app.join("alice", "pw").await;
    let cookie = app.login("alice", "pw").await;

    let response = app
        .client
        .get(app.url("/logout"))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/");

    // The old cookie no longer resolves.
    let response = app
        .client
        .get(app.url("/board/save-form"))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login-form");
}
