use crate::error::RepositoryError;
use crate::Author;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;

pub type AuthorRecords = Box<dyn Iterator<Item = Result<Author, RepositoryError>> + Send>;

/// Data access with blocking calls, e.g. a synchronous database driver.
/// Callers keep it off the async executor.
pub trait BlockingAuthorRepository: Send + Sync {
    fn find_all(&self) -> Result<AuthorRecords, RepositoryError>;

    fn find_by_id(&self, id: i64) -> Result<Option<Author>, RepositoryError>;
}

/// Data access driven by an async driver that delivers rows over time.
pub trait ReactiveAuthorRepository: Send + Sync {
    fn find_all(&self) -> BoxStream<'static, Result<Author, RepositoryError>>;

    fn find_by_id(&self, id: i64) -> BoxFuture<'static, Result<Option<Author>, RepositoryError>>;
}

/// Both repository flavours over one shared, immutable table.
#[derive(Debug, Clone)]
pub struct InMemoryAuthorRepository {
    authors: Arc<[Author]>,
    delay: Option<Duration>,
}

impl InMemoryAuthorRepository {
    pub fn new(authors: Vec<Author>) -> Self {
        Self {
            authors: authors.into(),
            delay: None,
        }
    }

    /// Delay every reactive row by `delay`, the way a remote driver would.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay).filter(|delay| !delay.is_zero());
        self
    }

    pub fn len(&self) -> usize {
        self.authors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }

    fn rows(&self) -> impl Iterator<Item = Result<Author, RepositoryError>> + Send + 'static {
        let authors = self.authors.clone();
        (0..authors.len()).map(move |idx| Ok(authors[idx].clone()))
    }

    fn lookup(&self, id: i64) -> Option<Author> {
        self.authors.iter().find(|author| author.id == id).cloned()
    }
}

impl BlockingAuthorRepository for InMemoryAuthorRepository {
    fn find_all(&self) -> Result<AuthorRecords, RepositoryError> {
        Ok(Box::new(self.rows()))
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Author>, RepositoryError> {
        Ok(self.lookup(id))
    }
}

impl ReactiveAuthorRepository for InMemoryAuthorRepository {
    fn find_all(&self) -> BoxStream<'static, Result<Author, RepositoryError>> {
        let rows = futures::stream::iter(self.rows());
        match self.delay {
            Some(delay) => tokio_stream::StreamExt::throttle(rows, delay).boxed(),
            None => rows.boxed(),
        }
    }

    fn find_by_id(&self, id: i64) -> BoxFuture<'static, Result<Option<Author>, RepositoryError>> {
        let found = self.lookup(id);
        match self.delay {
            Some(delay) => async move {
                tokio::time::sleep(delay).await;
                Ok(found)
            }
            .boxed(),
            None => futures::future::ready(Ok(found)).boxed(),
        }
    }
}
