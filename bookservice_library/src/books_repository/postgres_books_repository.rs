use anyhow::Context;
use deadpool_postgres::{Pool, PoolConfig, Runtime};
use tokio_postgres::error::SqlState;
use tokio_postgres::{NoTls, Row};

use crate::api::{Book, BookCreate, BookId, BookUpdate};
use crate::books_repository::{BookRepository, BookRepositoryError};

/// Every query takes its own connection from the pool, the connection goes back when the guard drops
pub struct PostgresBooksRepository {
    pool: Pool,
}

pub struct PostgresBooksRepositoryConfig {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub dbname: String,
    pub max_connections: usize,
}

impl PostgresBooksRepository {
    pub async fn init(config: PostgresBooksRepositoryConfig) -> anyhow::Result<Self> {
        tracing::info!(
            "Postgres connection: {}@{}:{}/{}",
            config.username,
            config.hostname,
            config.port,
            config.dbname
        );

        let mut pool_config = deadpool_postgres::Config::new();
        pool_config.host = Some(config.hostname);
        pool_config.port = Some(config.port);
        pool_config.user = Some(config.username);
        pool_config.password = Some(config.password);
        pool_config.dbname = Some(config.dbname);
        pool_config.pool = Some(PoolConfig::new(config.max_connections));

        let pool = pool_config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .context("Failed to create postgres pool")?;

        let client = pool.get().await.context("Failed to start postgres")?;
        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS books (
            id              BIGSERIAL PRIMARY KEY,
            title           TEXT NOT NULL,
            author          TEXT NOT NULL,
            published_year  INTEGER NOT NULL,
            UNIQUE (title, author)
            )
        ",
            )
            .await
            .context("Failed to setup table")?;

        Ok(Self { pool })
    }
}

fn book_from_row(row: &Row) -> Result<Book, tokio_postgres::Error> {
    Ok(Book {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        published_year: row.try_get("published_year")?,
    })
}

fn map_unique_violation(err: tokio_postgres::Error) -> BookRepositoryError {
    if err
        .as_db_error()
        // This is unique constraint validation error
        .map(|db_err| db_err.code() == &SqlState::UNIQUE_VIOLATION)
        .unwrap_or_default()
    {
        BookRepositoryError::Duplicate
    } else {
        err.into()
    }
}

#[async_trait::async_trait]
impl BookRepository for PostgresBooksRepository {
    async fn list_books(&self) -> Result<Vec<Book>, BookRepositoryError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached("SELECT id, title, author, published_year FROM books ORDER BY id")
            .await?;

        let rows = client.query(&stmt, &[]).await?;
        rows.iter().map(|row| Ok(book_from_row(row)?)).collect()
    }

    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>, BookRepositoryError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached("SELECT id, title, author, published_year FROM books WHERE id = ($1)")
            .await?;

        let row = client.query_opt(&stmt, &[&book_id]).await?;
        Ok(row.as_ref().map(book_from_row).transpose()?)
    }

    async fn add_book(&self, book: BookCreate) -> Result<Book, BookRepositoryError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(
                "INSERT INTO books (title, author, published_year) VALUES ($1, $2, $3) \
                 RETURNING id, title, author, published_year",
            )
            .await?;

        let rows = client
            .query(&stmt, &[&book.title, &book.author, &book.published_year])
            .await
            .map_err(map_unique_violation)?;

        let row = rows
            .first()
            .ok_or_else(|| BookRepositoryError::Other("Id not returned".to_string()))?;
        Ok(book_from_row(row)?)
    }

    async fn update_book(
        &self,
        book_id: BookId,
        update: BookUpdate,
    ) -> Result<Option<Book>, BookRepositoryError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(
                "UPDATE books SET \
                     title = COALESCE($2, title), \
                     author = COALESCE($3, author), \
                     published_year = COALESCE($4, published_year) \
                 WHERE id = ($1) \
                 RETURNING id, title, author, published_year",
            )
            .await?;

        let row = client
            .query_opt(
                &stmt,
                &[
                    &book_id,
                    &update.title,
                    &update.author,
                    &update.published_year,
                ],
            )
            .await
            .map_err(map_unique_violation)?;

        Ok(row.as_ref().map(book_from_row).transpose()?)
    }

    async fn delete_book(&self, book_id: BookId) -> Result<bool, BookRepositoryError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached("DELETE FROM books WHERE id = ($1)")
            .await?;

        let deleted = client.execute(&stmt, &[&book_id]).await?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod postgres_book_repository_tests {
    use serial_test::file_serial;
    use testcontainers::core::IntoContainerPort;
    use testcontainers::runners::AsyncRunner;
    use testcontainers::{ContainerAsync, GenericImage, ImageExt};

    use crate::api::{Book, BookCreate, BookUpdate};
    use crate::books_repository::{
        BookRepository, BookRepositoryError, PostgresBooksRepository,
        PostgresBooksRepositoryConfig,
    };

    async fn start_postgres_container_and_init_repo(
    ) -> (ContainerAsync<GenericImage>, PostgresBooksRepository) {
        let _pg_container = GenericImage::new("postgres", "latest")
            .with_mapped_port(5432, 5432.tcp())
            .with_env_var("POSTGRES_USER", "postgres")
            .with_env_var("POSTGRES_PASSWORD", "postgres")
            .start()
            .await
            .expect("Failed to start postgres");

        for _ in 0..10 {
            if let Ok(repo) = PostgresBooksRepository::init(PostgresBooksRepositoryConfig {
                hostname: "127.0.0.1".to_string(),
                port: 5432,
                username: "postgres".to_string(),
                password: "postgres".to_string(),
                dbname: "postgres".to_string(),
                max_connections: 4,
            })
            .await
            {
                return (_pg_container, repo);
            }
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        }
        panic!("Failed to setup postgres container")
    }

    fn dune() -> BookCreate {
        BookCreate {
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            published_year: 1965,
        }
    }

    #[tokio::test]
    #[file_serial(key, path => "../.pgtestslock")]
    /// Walks a book through its whole lifecycle
    /// for the sake of not starting container multiple times it tests everything in one testcase
    async fn test_book_lifecycle() {
        let (_container, repo) = start_postgres_container_and_init_repo().await;

        assert_eq!(repo.list_books().await.expect("Failed to list"), vec![]);
        assert_eq!(repo.get_book(20000).await.expect("Failed to get"), None);

        let book = repo.add_book(dune()).await.expect("Failed to add book");
        assert!(book.id > 0);
        assert_eq!(
            repo.get_book(book.id).await.expect("Failed to get book"),
            Some(book.clone())
        );

        let updated = repo
            .update_book(
                book.id,
                BookUpdate {
                    published_year: Some(1966),
                    ..BookUpdate::default()
                },
            )
            .await
            .expect("Failed to update")
            .expect("Book not found");
        assert_eq!(
            updated,
            Book {
                published_year: 1966,
                ..book.clone()
            }
        );
        assert_eq!(
            repo.update_book(20000, BookUpdate::default())
                .await
                .expect("Failed to update"),
            None
        );

        assert_eq!(
            repo.list_books().await.expect("Failed to list"),
            vec![updated]
        );

        assert!(repo.delete_book(book.id).await.expect("Failed to delete"));
        assert!(!repo.delete_book(book.id).await.expect("Failed to delete"));
        assert_eq!(repo.get_book(book.id).await.expect("Failed to get"), None);
    }

    #[tokio::test]
    #[file_serial(key, path => "../.pgtestslock")]
    /// Unique (title, author) constraint on insert and on update
    async fn test_duplicates_are_rejected() {
        let (_container, repo) = start_postgres_container_and_init_repo().await;

        let first = repo.add_book(dune()).await.expect("Failed to add book");
        let duplicate = repo.add_book(dune()).await;
        assert!(matches!(duplicate, Err(BookRepositoryError::Duplicate)));

        let second = repo
            .add_book(BookCreate {
                title: "Dune Messiah".to_string(),
                ..dune()
            })
            .await
            .expect("Failed to add book");

        let clash = repo
            .update_book(
                second.id,
                BookUpdate {
                    title: Some("Dune".to_string()),
                    ..BookUpdate::default()
                },
            )
            .await;
        assert!(matches!(clash, Err(BookRepositoryError::Duplicate)));

        assert_eq!(repo.get_book(first.id).await.unwrap(), Some(first));
        assert_eq!(repo.get_book(second.id).await.unwrap(), Some(second));
    }
}
