use crate::{
    authorization::is_owner,
    error::{AppError, AppResult},
    models::{Board, NewBoard, User, validate_board_fields},
    repository::RepositoryState,
};

/// Posts
///
/// Create/read/update/delete for boards. Reads are public; update and delete
/// are owner-only and run fetch → ownership check → write inside one
/// transaction.
#[derive(Clone)]
pub struct Posts {
    repo: RepositoryState,
}

impl Posts {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// create
    ///
    /// Persists a new board owned by `owner`. Titles are not unique; blank
    /// title or content fails with `ValidationFailed` before any write.
    pub async fn create(
        &self,
        title: String,
        content: String,
        owner: Option<&User>,
    ) -> AppResult<Board> {
        let owner = owner.ok_or(AppError::AuthenticationRequired)?;
        validate_board_fields(&title, &content)?;
        tracing::info!(user_id = owner.id, title = %title, "creating board");

        let mut tx = self.repo.begin().await?;
        let board = tx
            .insert_board(NewBoard {
                title,
                content,
                user_id: owner.id,
            })
            .await?;
        tx.commit().await?;

        Ok(board)
    }

    /// get
    ///
    /// Public read by id.
    pub async fn get(&self, id: i64) -> AppResult<Board> {
        self.repo.find_board(id).await?.ok_or(AppError::NotFound)
    }

    /// list_all
    ///
    /// Every board, newest first.
    pub async fn list_all(&self) -> AppResult<Vec<Board>> {
        let boards = self.repo.list_boards().await?;
        tracing::debug!(count = boards.len(), "listed boards");
        Ok(boards)
    }

    /// edit_form
    ///
    /// The board to pre-fill the update form with. Same checks as `update`,
    /// without writing anything.
    pub async fn edit_form(&self, id: i64, acting_user_id: i64) -> AppResult<Board> {
        let board = self.get(id).await?;
        ensure_owner(&board, acting_user_id)?;
        Ok(board)
    }

    /// update
    ///
    /// Replaces title and content. The loaded row is mutated and explicitly
    /// saved before the commit; owner and id never change.
    pub async fn update(
        &self,
        id: i64,
        title: String,
        content: String,
        acting_user_id: i64,
    ) -> AppResult<Board> {
        validate_board_fields(&title, &content)?;
        tracing::info!(board_id = id, user_id = acting_user_id, "updating board");

        let mut tx = self.repo.begin().await?;
        let mut board = tx
            .find_board_for_update(id)
            .await?
            .ok_or(AppError::NotFound)?;
        ensure_owner(&board, acting_user_id)?;

        board.title = title;
        board.content = content;
        let saved = tx.save_board(&board).await?;
        tx.commit().await?;

        Ok(saved)
    }

    /// delete
    ///
    /// Permanently removes the board.
    pub async fn delete(&self, id: i64, acting_user_id: i64) -> AppResult<()> {
        tracing::info!(board_id = id, user_id = acting_user_id, "deleting board");

        let mut tx = self.repo.begin().await?;
        let board = tx
            .find_board_for_update(id)
            .await?
            .ok_or(AppError::NotFound)?;
        ensure_owner(&board, acting_user_id)?;

        if !tx.delete_board(board.id).await? {
            return Err(AppError::NotFound);
        }
        tx.commit().await?;

        Ok(())
    }
}

fn ensure_owner(board: &Board, acting_user_id: i64) -> AppResult<()> {
    if is_owner(board, acting_user_id) {
        Ok(())
    } else {
        tracing::warn!(
            board_id = board.id,
            owner_id = board.user_id,
            user_id = acting_user_id,
            "non-owner attempted to modify board"
        );
        Err(AppError::Forbidden)
    }
}
