use anyhow::Context;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_tracing::TracingMiddleware;

use crate::api::{AllowedMethodsResponse, Book, BookCreate, BookId, BookUpdate, ErrorResponse};

/// Response with a non success status, carries the `detail` message sent by the server
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Request rejected with {status}: {detail}")]
pub struct RejectedRequest {
    pub status: StatusCode,
    pub detail: String,
}

pub struct BookServiceLibraryClient {
    url: String,
    token: String,
    client: ClientWithMiddleware,
}

impl BookServiceLibraryClient {
    pub fn new(url: &str, token: &str) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .build()
            .context("Failed to build reqwest client")?;
        let client = ClientBuilder::new(reqwest_client)
            // Insert the tracing middleware
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            url: url.to_string(),
            token: token.to_string(),
            client,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.url, path))
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
    }

    async fn rejected(response: Response) -> anyhow::Error {
        let status = response.status();
        let detail = response
            .json::<ErrorResponse>()
            .await
            .map(|error| error.detail)
            .unwrap_or_default();
        RejectedRequest { status, detail }.into()
    }

    /// Calls GET /books endpoint
    /// An empty library is reported by the server as 404 and returned here as an empty list
    pub async fn list_books(&self) -> anyhow::Result<Vec<Book>> {
        let response = self.request(Method::GET, "/books").send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            Ok(vec![])
        } else if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::rejected(response).await)
        }
    }

    /// Calls GET /books/{book_id} endpoint
    /// Returns None if the book is not in the library
    pub async fn get_book(&self, book_id: BookId) -> anyhow::Result<Option<Book>> {
        let response = self
            .request(Method::GET, &format!("/books/{}", book_id))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            Ok(None)
        } else if response.status().is_success() {
            Ok(Some(response.json().await?))
        } else {
            Err(Self::rejected(response).await)
        }
    }

    /// Calls POST /books endpoint, returns the created book with its id
    pub async fn create_book(&self, book: &BookCreate) -> anyhow::Result<Book> {
        let response = self.request(Method::POST, "/books").json(book).send().await?;
        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }
        Ok(response.json().await?)
    }

    /// Calls PUT /books/{book_id} endpoint
    /// Returns None if the book is not in the library
    pub async fn update_book(
        &self,
        book_id: BookId,
        update: &BookUpdate,
    ) -> anyhow::Result<Option<Book>> {
        let response = self
            .request(Method::PUT, &format!("/books/{}", book_id))
            .json(update)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            Ok(None)
        } else if response.status().is_success() {
            Ok(Some(response.json().await?))
        } else {
            Err(Self::rejected(response).await)
        }
    }

    /// Calls DELETE /books/{book_id} endpoint
    /// Returns false if there was nothing to delete
    pub async fn delete_book(&self, book_id: BookId) -> anyhow::Result<bool> {
        let response = self
            .request(Method::DELETE, &format!("/books/{}", book_id))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            Ok(false)
        } else if response.status().is_success() {
            Ok(true)
        } else {
            Err(Self::rejected(response).await)
        }
    }

    /// Calls OPTIONS /books endpoint
    pub async fn allowed_methods(&self) -> anyhow::Result<Vec<String>> {
        let response = self.request(Method::OPTIONS, "/books").send().await?;
        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }
        let allowed: AllowedMethodsResponse = response.json().await?;
        Ok(allowed.allowed_methods)
    }
}
