use thiserror::Error;

use crate::content::CurriculumError;
use crate::model::ParseIdError;
use crate::quiz::QuizError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    InvalidId(#[from] ParseIdError),
    #[error(transparent)]
    Curriculum(#[from] CurriculumError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
}
