use thiserror::Error;

/// Errors that can arise while reading or mutating game state.
#[derive(Debug, Error)]
pub enum GameError {
    /// Wrapper around IO errors (directory creation, lock files, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around serde_json serialization and deserialization errors.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Returned when a named record (item, recipe, terrain, player) is not present.
    #[error("not found: {0}")]
    NotFound(String),

    /// Not enough coin for a purchase or transfer
    #[error("insufficient funds: need {needed_cp} cp, have {available_cp} cp")]
    InsufficientFunds { needed_cp: u64, available_cp: u64 },

    /// Player lacks an item or ingredient
    #[error("insufficient items: {0}")]
    InsufficientItems(String),

    /// Shop or market has no stock left
    #[error("out of stock: {0}")]
    OutOfStock(String),

    /// Permission denied (admin-only command)
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Bad command argument (negative hours, zero quantity, unparseable coins)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A per-player cooldown or attempt budget is exhausted
    #[error("not ready: {0}")]
    NotReady(String),

    /// Could not acquire the document lock
    #[error("lock error: {0}")]
    Locked(String),
}

impl GameError {
    /// True for refusals caused by game rules rather than by the environment.
    /// These are shown to the player; the rest are logged and replaced by a
    /// generic apology.
    pub fn is_refusal(&self) -> bool {
        !matches!(self, GameError::Io(_) | GameError::Json(_) | GameError::Locked(_))
    }
}

pub type GameResult<T> = Result<T, GameError>;
