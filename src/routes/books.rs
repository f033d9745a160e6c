//! Book catalog and review routes
//!
//! - `POST   /api/books` - Add a book
//! - `GET    /api/books?sort_by=&sort_order=` - List books, sorted
//! - `DELETE /api/books/{id}` - Remove a book, keeping ratings (admin)
//! - `POST   /api/books/{id}/rating` - Rate a book (upsert)
//! - `GET    /api/books/{id}/rating` - The caller's own rating
//! - `GET    /api/books/{id}/average-rating` - Mean rating or null
//! - `GET    /api/books/{id}/reviews` - Ratings joined with profiles

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Method, Request, Response};
use serde::{Deserialize, Serialize};

use crate::db::schemas::BookDoc;
use crate::server::AppState;
use crate::services::{SortBy, SortOrder};

use super::response::{self, bad_request, created, error_response, no_content, not_found, ok};
use super::{caller_id, parse_json_body};

#[derive(Debug, Deserialize)]
pub struct AddBookRequest {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub pages: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct AddBookResponse {
    pub book_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rating: f64,
    #[serde(default)]
    pub finished_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RateResponse {
    pub rating_id: String,
}

/// Sort parameters for the listing; the catalog UI always sends both,
/// anything else gets the title ascending view
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_sort_by")]
    pub sort_by: SortBy,
    #[serde(default = "default_sort_order")]
    pub sort_order: SortOrder,
}

fn default_sort_by() -> SortBy {
    SortBy::Title
}

fn default_sort_order() -> SortOrder {
    SortOrder::Asc
}

/// Book entity as returned by the listing
#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
}

impl From<BookDoc> for BookResponse {
    fn from(book: BookDoc) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            pages: book.pages,
        }
    }
}

/// Route `/api/books` and `/api/books/{id}/...` requests
pub async fn handle_book_request(
    req: Request<Incoming>,
    state: &AppState,
    path: &str,
) -> Response<Full<Bytes>> {
    let method = req.method().clone();

    if path == "/api/books" {
        return match method {
            Method::POST => handle_add(req, state).await,
            Method::GET => handle_list(&req, state).await,
            _ => response::method_not_allowed(),
        };
    }

    let Some((book_id, tail)) = split_book_path(path) else {
        return not_found("Not Found");
    };
    let book_id = book_id.to_string();

    match (method, tail) {
        (Method::DELETE, "") => handle_remove(&req, state, &book_id).await,
        (Method::POST, "/rating") => handle_rate(req, state, &book_id).await,
        (Method::GET, "/rating") => handle_get_rating(&req, state, &book_id).await,
        (Method::GET, "/average-rating") => handle_average_rating(state, &book_id).await,
        (Method::GET, "/reviews") => handle_reviews(state, &book_id).await,
        _ => not_found("Not Found"),
    }
}

/// Split `/api/books/{id}{tail}` into id and tail
fn split_book_path(path: &str) -> Option<(&str, &str)> {
    let rest = path.strip_prefix("/api/books/")?;
    let (id, tail) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };
    if id.is_empty() {
        return None;
    }
    Some((id, tail))
}

/// POST /api/books
///
/// Identity is resolved for logging but not required; anonymous
/// submissions succeed.
async fn handle_add(req: Request<Incoming>, state: &AppState) -> Response<Full<Bytes>> {
    let caller = caller_id(&req, state);

    let body: AddBookRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return bad_request(&e.to_string()),
    };

    match state
        .catalog
        .add(caller.as_deref(), body.title, body.author, body.pages)
        .await
    {
        Ok(book_id) => created(&AddBookResponse { book_id }),
        Err(e) => error_response(e),
    }
}

/// GET /api/books
async fn handle_list(req: &Request<Incoming>, state: &AppState) -> Response<Full<Bytes>> {
    let caller = caller_id(req, state);

    let query: ListQuery = match serde_urlencoded::from_str(req.uri().query().unwrap_or("")) {
        Ok(q) => q,
        Err(e) => return bad_request(&format!("Invalid query: {}", e)),
    };

    match state
        .catalog
        .list(caller.as_deref(), query.sort_by, query.sort_order)
        .await
    {
        Ok(books) => {
            let books: Vec<BookResponse> = books.into_iter().map(BookResponse::from).collect();
            ok(&books)
        }
        Err(e) => error_response(e),
    }
}

/// DELETE /api/books/{id}
///
/// Admin only. Leaves the book's ratings behind; the cascading variant
/// is `DELETE /api/admin/books/{id}`.
async fn handle_remove(
    req: &Request<Incoming>,
    state: &AppState,
    book_id: &str,
) -> Response<Full<Bytes>> {
    let caller = caller_id(req, state);

    match state.catalog.remove(caller.as_deref(), book_id).await {
        Ok(()) => no_content(),
        Err(e) => error_response(e),
    }
}

/// POST /api/books/{id}/rating
async fn handle_rate(
    req: Request<Incoming>,
    state: &AppState,
    book_id: &str,
) -> Response<Full<Bytes>> {
    let caller = caller_id(&req, state);

    let body: RateRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return bad_request(&e.to_string()),
    };

    match state
        .reviews
        .rate(
            caller.as_deref(),
            book_id,
            body.rating,
            body.finished_date,
            body.notes,
        )
        .await
    {
        Ok(rating_id) => ok(&RateResponse { rating_id }),
        Err(e) => error_response(e),
    }
}

/// GET /api/books/{id}/rating
async fn handle_get_rating(
    req: &Request<Incoming>,
    state: &AppState,
    book_id: &str,
) -> Response<Full<Bytes>> {
    let caller = caller_id(req, state);

    match state.reviews.get_rating(caller.as_deref(), book_id).await {
        Ok(view) => ok(&view),
        Err(e) => error_response(e),
    }
}

/// GET /api/books/{id}/average-rating
///
/// Open to anonymous callers; serves the bare mean or JSON null.
async fn handle_average_rating(state: &AppState, book_id: &str) -> Response<Full<Bytes>> {
    match state.reviews.average_rating(book_id).await {
        Ok(average) => ok(&average),
        Err(e) => error_response(e),
    }
}

/// GET /api/books/{id}/reviews
async fn handle_reviews(state: &AppState, book_id: &str) -> Response<Full<Bytes>> {
    match state.reviews.book_reviews(book_id).await {
        Ok(reviews) => ok(&reviews),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_book_path() {
        assert_eq!(split_book_path("/api/books/abc"), Some(("abc", "")));
        assert_eq!(
            split_book_path("/api/books/abc/rating"),
            Some(("abc", "/rating"))
        );
        assert_eq!(
            split_book_path("/api/books/abc/average-rating"),
            Some(("abc", "/average-rating"))
        );
        assert_eq!(split_book_path("/api/books/"), None);
        assert_eq!(split_book_path("/api/profiles/abc"), None);
    }

    #[test]
    fn test_list_query_defaults() {
        let query: ListQuery = serde_urlencoded::from_str("").unwrap();
        assert_eq!(query.sort_by, SortBy::Title);
        assert_eq!(query.sort_order, SortOrder::Asc);

        let query: ListQuery =
            serde_urlencoded::from_str("sort_by=rating&sort_order=desc").unwrap();
        assert_eq!(query.sort_by, SortBy::Rating);
        assert_eq!(query.sort_order, SortOrder::Desc);
    }

    #[test]
    fn test_list_query_rejects_unknown_sort() {
        assert!(serde_urlencoded::from_str::<ListQuery>("sort_by=pages").is_err());
    }
}
