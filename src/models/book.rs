//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Physical condition of a shared book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum BookCondition {
    #[serde(rename = "Brand New")]
    BrandNew,
    #[serde(rename = "Used")]
    Used,
}

impl BookCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookCondition::BrandNew => "Brand New",
            BookCondition::Used => "Used",
        }
    }
}

impl Default for BookCondition {
    fn default() -> Self {
        BookCondition::BrandNew
    }
}

impl std::fmt::Display for BookCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Brand New" => Ok(BookCondition::BrandNew),
            "Used" => Ok(BookCondition::Used),
            _ => Err(format!("Invalid book condition: {}", s)),
        }
    }
}

// SQLx conversion for BookCondition
impl sqlx::Type<Postgres> for BookCondition {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for BookCondition {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BookCondition {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Book record with its genre and author names
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub owner_id: i32,
    pub title: String,
    #[serde(rename = "ISBN")]
    pub isbn: String,
    pub description: String,
    pub condition: BookCondition,
    pub available: bool,
    pub retrieval_location: String,
    pub genres: Vec<String>,
    pub authors: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Genre record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: i32,
    pub genre_name: String,
    pub genre_description: String,
}

/// Create book request (owner is always the caller)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
    #[serde(rename = "ISBN")]
    #[validate(length(min = 1, max = 13, message = "ISBN must be 1-13 characters"))]
    pub isbn: String,
    pub description: Option<String>,
    pub condition: Option<BookCondition>,
    pub available: Option<bool>,
    #[validate(length(min = 1, max = 255, message = "Retrieval location must be 1-255 characters"))]
    pub retrieval_location: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub authors: Vec<String>,
}

/// Partial book update
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,
    #[serde(rename = "ISBN")]
    #[validate(length(min = 1, max = 13, message = "ISBN must be 1-13 characters"))]
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub condition: Option<BookCondition>,
    pub available: Option<bool>,
    #[validate(length(min = 1, max = 255, message = "Retrieval location must be 1-255 characters"))]
    pub retrieval_location: Option<String>,
    pub genres: Option<Vec<String>>,
    pub authors: Option<Vec<String>>,
}

impl From<CreateBook> for UpdateBook {
    fn from(book: CreateBook) -> Self {
        Self {
            title: Some(book.title),
            isbn: Some(book.isbn),
            description: book.description,
            condition: book.condition,
            available: book.available,
            retrieval_location: Some(book.retrieval_location),
            genres: Some(book.genres),
            authors: Some(book.authors),
        }
    }
}

/// Book list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Case-insensitive title substring
    pub title: Option<String>,
    /// Author name
    pub author: Option<String>,
    /// Genre name
    pub genre: Option<String>,
    /// "Brand New" or "Used"
    pub condition: Option<BookCondition>,
    pub available: Option<bool>,
}

/// Capitalize a genre name ("science FICTION" -> "Science fiction")
pub fn normalize_genre(name: &str) -> String {
    let name = name.trim();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Title-case an author name ("j.r.r. TOLKIEN" -> "J.R.R. Tolkien")
pub fn normalize_author(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_alpha = false;
    for c in name.trim().chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Normalize, drop blanks and deduplicate tag names, keeping first occurrence order
pub fn normalize_names(names: &[String], normalize: fn(&str) -> String) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names.iter().map(|n| normalize(n)) {
        if !name.is_empty() && !out.contains(&name) {
            out.push(name);
        }
    }
    out
}
