//! Book model and its availability status

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Format accepted for `published_date`
pub const PUBLISHED_DATE_FORMAT: &str = "%Y-%m-%d";

/// Availability of a book record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum BookStatus {
    Available,
    Borrowed,
    Late,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "available",
            BookStatus::Borrowed => "borrowed",
            BookStatus::Late => "late",
        }
    }

    /// `Borrowed` and `Late` both mean an open loan holds the book
    pub fn is_out(&self) -> bool {
        !matches!(self, BookStatus::Available)
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(BookStatus::Available),
            "borrowed" => Ok(BookStatus::Borrowed),
            "late" => Ok(BookStatus::Late),
            _ => Err(format!("Invalid book status: {}", s)),
        }
    }
}

// SQLx conversion for BookStatus (stored as TEXT)
impl sqlx::Type<Postgres> for BookStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BookStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BookStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub published_date: NaiveDate,
    pub status: BookStatus,
}

/// Book record ready to be persisted
#[derive(Debug, Clone)]
pub struct NewBook {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub published_date: NaiveDate,
}

/// Add book request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    /// Publication date, `YYYY-MM-DD`
    pub published_date: String,
}

impl CreateBook {
    pub fn into_new_book(self) -> AppResult<NewBook> {
        let published_date = NaiveDate::parse_from_str(&self.published_date, PUBLISHED_DATE_FORMAT)
            .map_err(|e| {
                AppError::InvalidArgument(format!("invalid published_date format: {}", e))
            })?;

        Ok(NewBook {
            id: Uuid::new_v4(),
            title: self.title,
            author: self.author,
            published_date,
        })
    }
}

/// Parse a path/body identifier, rejecting anything that is not a UUID
pub fn parse_id(raw: &str, what: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::InvalidArgument(format!("Invalid {} ID format", what)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(date: &str) -> CreateBook {
        CreateBook {
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            published_date: date.to_string(),
        }
    }

    #[test]
    fn published_date_parses_iso_day() {
        let book = request("1965-08-01").into_new_book().unwrap();
        assert_eq!(book.published_date, NaiveDate::from_ymd_opt(1965, 8, 1).unwrap());
    }

    #[test]
    fn published_date_rejects_other_formats() {
        for bad in ["01/08/1965", "1965-13-01", "1965-08-01T00:00:00Z", ""] {
            let err = request(bad).into_new_book().unwrap_err();
            assert!(matches!(err, AppError::InvalidArgument(_)), "accepted {bad:?}");
        }
    }

    #[test]
    fn parse_id_rejects_malformed_identifiers() {
        assert!(parse_id(&Uuid::new_v4().to_string(), "book").is_ok());
        assert!(matches!(
            parse_id("507f1f77bcf86cd799439011", "book"),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [BookStatus::Available, BookStatus::Borrowed, BookStatus::Late] {
            assert_eq!(status.as_str().parse::<BookStatus>().unwrap(), status);
        }
        assert!(BookStatus::Late.is_out());
        assert!(!BookStatus::Available.is_out());
    }
}
