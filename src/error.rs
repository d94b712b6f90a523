use thiserror::Error;

/// Error type for possible errors when building boards, workspaces or settings
///
/// Rejected placements during the search are not errors, those are reported as `None`.
#[derive(Error, Debug)]
pub enum CrozzleError
{
    #[error("The word {0} is not available in the word database.")]
    WordUnavailable(String),
    #[error("Cannot place the word {0} on the board.")]
    CantPlaceWord(String),
    #[error("The words {first} and {second} disagree on the letter at ({x}, {y}).")]
    ConflictingLetters { first: String, second: String, x: i32, y: i32 },
    #[error("The board would be {width}x{height}, bigger than allowed.")]
    BoardTooLarge { width: i32, height: i32 },
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error("Cannot read the settings.")]
    SettingsFormat(#[from] serde_json::Error),
}
