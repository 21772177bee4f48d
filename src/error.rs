use log::{debug, error};
use mongodb::{
    bson::{de::Error as BsonDeError, ser::Error as BsonSerError},
    error::Error as DbError,
};
use rocket::{http::Status, response::Responder};
use thiserror::Error;

use crate::model::common::{CarId, CategoryId};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    BsonDe(#[from] BsonDeError),
    #[error(transparent)]
    BsonSer(#[from] BsonSerError),
    #[error("Voting is closed")]
    VotingClosed,
    #[error("Unregistered voter code: {0}")]
    UnregisteredCode(String),
    #[error("Voter type not allowed in category {0}")]
    VoterTypeNotAllowed(CategoryId),
    #[error("Entrant {0} not found")]
    EntrantNotFound(CarId),
    #[error("Entrant {0} is not eligible for votes")]
    EntrantNotEligible(CarId),
    #[error("Category {0} not found")]
    CategoryNotFound(CategoryId),
    #[error("Invalid request: {0}")]
    Validation(String),
}

impl Error {
    /// The HTTP status this error is reported as.
    pub fn status(&self) -> Status {
        match self {
            Self::Db(_) | Self::BsonDe(_) | Self::BsonSer(_) => Status::InternalServerError,
            Self::VotingClosed | Self::UnregisteredCode(_) | Self::VoterTypeNotAllowed(_) => {
                Status::Forbidden
            }
            Self::EntrantNotFound(_) | Self::CategoryNotFound(_) => Status::NotFound,
            Self::EntrantNotEligible(_) => Status::UnprocessableEntity,
            Self::Validation(_) => Status::BadRequest,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        if status == Status::InternalServerError {
            error!("{self}");
        } else {
            debug!("Rejected request: {self}");
        }
        Err(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_client_errors() {
        assert_eq!(Error::VotingClosed.status(), Status::Forbidden);
        assert_eq!(
            Error::UnregisteredCode("X".to_string()).status(),
            Status::Forbidden
        );
        assert_eq!(Error::EntrantNotFound(9).status(), Status::NotFound);
        assert_eq!(Error::CategoryNotFound(9).status(), Status::NotFound);
        assert_eq!(
            Error::EntrantNotEligible(9).status(),
            Status::UnprocessableEntity
        );
        assert_eq!(
            Error::Validation(String::new()).status(),
            Status::BadRequest
        );
    }
}
