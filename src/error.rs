use thiserror::Error;

#[derive(Error, Debug)]
pub enum DrillError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize/deserialize data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Word {id} has no letters to practice")]
    EmptyWord { id: u32 },

    #[error("Word {id}: target token '{token}' has no position that may be blanked")]
    NoBlankablePosition { id: u32, token: String },

    #[error("No words selected for this session")]
    NoWords,

    #[error("{name} collaborator failed: {message}")]
    Collaborator { name: &'static str, message: String },
}

pub type Result<T> = std::result::Result<T, DrillError>;
