use crate::error::{AppError, AppResult};
use crate::models::{Board, NewBoard, NewUser, User};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Repository Trait
///
/// The entity store for Users and Boards. Plain reads go straight through the
/// repository; every mutation runs inside a [`Transaction`] obtained from
/// [`Repository::begin`], which is the only way to write.
///
/// **Send + Sync + async_trait** are required to share the trait object
/// (`Arc<dyn Repository>`) across Axum's request tasks.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Opens a transaction. Dropping it without `commit` rolls back.
    async fn begin(&self) -> AppResult<Box<dyn Transaction>>;

    // --- Board Retrieval ---
    async fn find_board(&self, id: i64) -> AppResult<Option<Board>>;
    // Newest first (id DESC).
    async fn list_boards(&self) -> AppResult<Vec<Board>>;

    // --- User Retrieval ---
    async fn find_user(&self, id: i64) -> AppResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;
    // At most two rows, enough for the caller to tell "unique" from "ambiguous".
    async fn find_users_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> AppResult<Vec<User>>;
}

/// Transaction Trait
///
/// A unit of work against the store. Rows fetched `for_update` stay locked
/// until `commit` or drop, which makes fetch → check → mutate atomic with
/// respect to other writers of the same row.
#[async_trait]
pub trait Transaction: Send {
    async fn find_board_for_update(&mut self, id: i64) -> AppResult<Option<Board>>;
    async fn insert_board(&mut self, board: NewBoard) -> AppResult<Board>;
    // Writes title and content back. Owner and id are never touched.
    async fn save_board(&mut self, board: &Board) -> AppResult<Board>;
    // Returns false when no row was removed.
    async fn delete_board(&mut self, id: i64) -> AppResult<bool>;

    async fn find_user_for_update(&mut self, id: i64) -> AppResult<Option<User>>;
    async fn find_user_by_username(&mut self, username: &str) -> AppResult<Option<User>>;
    async fn insert_user(&mut self, user: NewUser) -> AppResult<User>;
    // Writes password and email back. Username is immutable.
    async fn save_user(&mut self, user: &User) -> AppResult<User>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

// --- Postgres ---

const BOARD_COLUMNS: &str = r#"
    SELECT b.id, b.title, b.content, b.user_id, u.username AS author, b.created_at
    FROM boards b
    JOIN users u ON b.user_id = u.id
"#;

const USER_COLUMNS: &str = "SELECT id, username, password, email, created_at FROM users";

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn begin(&self) -> AppResult<Box<dyn Transaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn find_board(&self, id: i64) -> AppResult<Option<Board>> {
        let sql = format!("{BOARD_COLUMNS} WHERE b.id = $1");
        let board = sqlx::query_as::<_, Board>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(board)
    }

    async fn list_boards(&self) -> AppResult<Vec<Board>> {
        let sql = format!("{BOARD_COLUMNS} ORDER BY b.id DESC");
        let boards = sqlx::query_as::<_, Board>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(boards)
    }

    async fn find_user(&self, id: i64) -> AppResult<Option<User>> {
        let sql = format!("{USER_COLUMNS} WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let sql = format!("{USER_COLUMNS} WHERE username = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_users_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> AppResult<Vec<User>> {
        let sql = format!("{USER_COLUMNS} WHERE username = $1 AND password = $2 LIMIT 2");
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .bind(password)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }
}

/// PgTransaction
///
/// Wraps a `sqlx::Transaction`. sqlx rolls the transaction back when it is
/// dropped uncommitted.
pub struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn find_board_for_update(&mut self, id: i64) -> AppResult<Option<Board>> {
        let sql = format!("{BOARD_COLUMNS} WHERE b.id = $1 FOR UPDATE OF b");
        let board = sqlx::query_as::<_, Board>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(board)
    }

    async fn insert_board(&mut self, board: NewBoard) -> AppResult<Board> {
        // CTE so the insert and the author join happen in one round trip.
        let board = sqlx::query_as::<_, Board>(
            r#"
            WITH inserted AS (
                INSERT INTO boards (title, content, user_id) VALUES ($1, $2, $3)
                RETURNING id, title, content, user_id, created_at
            )
            SELECT i.id, i.title, i.content, i.user_id, u.username AS author, i.created_at
            FROM inserted i JOIN users u ON i.user_id = u.id
            "#,
        )
        .bind(board.title)
        .bind(board.content)
        .bind(board.user_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(board)
    }

    async fn save_board(&mut self, board: &Board) -> AppResult<Board> {
        let saved = sqlx::query_as::<_, Board>(
            r#"
            WITH updated AS (
                UPDATE boards SET title = $2, content = $3 WHERE id = $1
                RETURNING id, title, content, user_id, created_at
            )
            SELECT d.id, d.title, d.content, d.user_id, u.username AS author, d.created_at
            FROM updated d JOIN users u ON d.user_id = u.id
            "#,
        )
        .bind(board.id)
        .bind(&board.title)
        .bind(&board.content)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(saved)
    }

    async fn delete_board(&mut self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_user_for_update(&mut self, id: i64) -> AppResult<Option<User>> {
        let sql = format!("{USER_COLUMNS} WHERE id = $1 FOR UPDATE");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&mut self, username: &str) -> AppResult<Option<User>> {
        let sql = format!("{USER_COLUMNS} WHERE username = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(user)
    }

    async fn insert_user(&mut self, user: NewUser) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password, email) VALUES ($1, $2, $3) \
             RETURNING id, username, password, email, created_at",
        )
        .bind(user.username)
        .bind(user.password)
        .bind(user.email)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(user)
    }

    async fn save_user(&mut self, user: &User) -> AppResult<User> {
        let saved = sqlx::query_as::<_, User>(
            "UPDATE users SET password = $2, email = $3 WHERE id = $1 \
             RETURNING id, username, password, email, created_at",
        )
        .bind(user.id)
        .bind(&user.password)
        .bind(&user.email)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(saved)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let PgTransaction { tx } = *self;
        tx.commit().await?;
        Ok(())
    }
}

// --- In-Memory ---

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    boards: BTreeMap<i64, Board>,
    last_user_id: i64,
    last_board_id: i64,
}

/// MemoryRepository
///
/// An in-process `Repository` used by the test suite and by local runs without
/// `DATABASE_URL`. A transaction holds the table lock for its whole life and
/// works on a staged copy, so isolation is serializable and an uncommitted
/// transaction leaves no trace.
#[derive(Clone, Default)]
pub struct MemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn begin(&self) -> AppResult<Box<dyn Transaction>> {
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, staged }))
    }

    async fn find_board(&self, id: i64) -> AppResult<Option<Board>> {
        Ok(self.tables.lock().await.boards.get(&id).cloned())
    }

    async fn list_boards(&self) -> AppResult<Vec<Board>> {
        Ok(self.tables.lock().await.boards.values().rev().cloned().collect())
    }

    async fn find_user(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.user_by_username(username))
    }

    async fn find_users_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> AppResult<Vec<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .filter(|u| u.username == username && u.password == password)
            .take(2)
            .cloned()
            .collect())
    }
}

impl Tables {
    fn user_by_username(&self, username: &str) -> Option<User> {
        self.users.values().find(|u| u.username == username).cloned()
    }
}

/// The transaction handle of [`MemoryRepository`].
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn find_board_for_update(&mut self, id: i64) -> AppResult<Option<Board>> {
        Ok(self.staged.boards.get(&id).cloned())
    }

    async fn insert_board(&mut self, board: NewBoard) -> AppResult<Board> {
        // Mirrors the FK on boards.user_id.
        let author = self
            .staged
            .users
            .get(&board.user_id)
            .map(|u| u.username.clone())
            .ok_or(AppError::NotFound)?;

        self.staged.last_board_id += 1;
        let board = Board {
            id: self.staged.last_board_id,
            title: board.title,
            content: board.content,
            user_id: board.user_id,
            author,
            created_at: Utc::now(),
        };
        self.staged.boards.insert(board.id, board.clone());
        Ok(board)
    }

    async fn save_board(&mut self, board: &Board) -> AppResult<Board> {
        let stored = self
            .staged
            .boards
            .get_mut(&board.id)
            .ok_or(AppError::NotFound)?;
        stored.title = board.title.clone();
        stored.content = board.content.clone();
        Ok(stored.clone())
    }

    async fn delete_board(&mut self, id: i64) -> AppResult<bool> {
        Ok(self.staged.boards.remove(&id).is_some())
    }

    async fn find_user_for_update(&mut self, id: i64) -> AppResult<Option<User>> {
        Ok(self.staged.users.get(&id).cloned())
    }

    async fn find_user_by_username(&mut self, username: &str) -> AppResult<Option<User>> {
        Ok(self.staged.user_by_username(username))
    }

    async fn insert_user(&mut self, user: NewUser) -> AppResult<User> {
        // Mirrors the unique index on users.username.
        if self.staged.user_by_username(&user.username).is_some() {
            return Err(AppError::Conflict);
        }

        self.staged.last_user_id += 1;
        let user = User {
            id: self.staged.last_user_id,
            username: user.username,
            password: user.password,
            email: user.email,
            created_at: Utc::now(),
        };
        self.staged.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn save_user(&mut self, user: &User) -> AppResult<User> {
        let stored = self
            .staged
            .users
            .get_mut(&user.id)
            .ok_or(AppError::NotFound)?;
        stored.password = user.password.clone();
        stored.email = user.email.clone();
        Ok(stored.clone())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTransaction { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
