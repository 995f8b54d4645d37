#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid difficulty value '{value}': {reason}")]
    InvalidDifficulty { value: String, reason: String },
}
