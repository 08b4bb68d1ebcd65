//! Catalog seam the import executors resolve against.
//!
//! The real choir catalog (collections, pieces, composers, events)
//! lives outside this system; executors only need the handful of
//! lookups and find-or-create operations below. [`MemoryCatalog`]
//! backs the server binary and the test suites.

use async_trait::async_trait;
use chorus_core::EventKind;
use chrono::NaiveDate;
use tokio::sync::RwLock;

/// Catalog primary keys.
pub type CatalogId = i64;

/// A composer as stored in the catalog, `Last, First` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composer {
    pub id: CatalogId,
    pub name: String,
}

/// A piece of music attributed to one composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub id: CatalogId,
    pub title: String,
    pub composer_id: CatalogId,
    pub category: Option<String>,
    /// Voice arrangement, e.g. `SATB`.
    pub voicing: String,
}

/// A published collection of pieces. `prefix` is the short form used
/// in piece references ("X1" = number 1 in the collection with
/// prefix "X").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub id: CatalogId,
    pub title: String,
    pub prefix: String,
}

/// A choir event (rehearsal or service) with its program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub id: CatalogId,
    pub date: NaiveDate,
    pub kind: EventKind,
    pub piece_ids: Vec<CatalogId>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Collection not found.")]
    CollectionNotFound,
    #[error("Composer not found.")]
    ComposerNotFound,
    #[error("Piece not found.")]
    PieceNotFound,
    #[error("Event not found.")]
    EventNotFound,
}

/// The lookups and mutations import executors are allowed to perform.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn collection(&self, id: CatalogId) -> Result<Option<Collection>, CatalogError>;

    /// Resolve a sheet reference (collection prefix + number within the
    /// collection) to the linked piece.
    async fn resolve_reference(&self, reference: &str) -> Result<Option<Piece>, CatalogError>;

    async fn composers(&self) -> Result<Vec<Composer>, CatalogError>;

    async fn composer(&self, id: CatalogId) -> Result<Option<Composer>, CatalogError>;

    async fn create_composer(&self, name: &str) -> Result<Composer, CatalogError>;

    async fn pieces_by_composer(&self, composer_id: CatalogId)
        -> Result<Vec<Piece>, CatalogError>;

    async fn piece(&self, id: CatalogId) -> Result<Option<Piece>, CatalogError>;

    async fn create_piece(
        &self,
        title: &str,
        composer_id: CatalogId,
        category: Option<&str>,
        voicing: &str,
    ) -> Result<Piece, CatalogError>;

    /// Link a piece into a collection under a number. Re-linking the
    /// same pair is a no-op.
    async fn link_piece_to_collection(
        &self,
        collection_id: CatalogId,
        piece_id: CatalogId,
        number: &str,
    ) -> Result<(), CatalogError>;

    /// Find the event for (date, kind) or create it. The flag reports
    /// whether a new event was created.
    async fn find_or_create_event(
        &self,
        date: NaiveDate,
        kind: EventKind,
    ) -> Result<(CatalogId, bool), CatalogError>;

    /// Add a piece to an event's program exactly once. Returns `true`
    /// when the link is new.
    async fn link_piece_to_event(
        &self,
        event_id: CatalogId,
        piece_id: CatalogId,
    ) -> Result<bool, CatalogError>;
}

// ── In-memory implementation ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct CollectionLink {
    collection_id: CatalogId,
    piece_id: CatalogId,
    number: String,
}

#[derive(Default)]
struct CatalogState {
    collections: Vec<Collection>,
    composers: Vec<Composer>,
    pieces: Vec<Piece>,
    links: Vec<CollectionLink>,
    events: Vec<EventRecord>,
    next_id: CatalogId,
}

impl CatalogState {
    fn next_id(&mut self) -> CatalogId {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory [`Catalog`] used by the server binary and tests.
pub struct MemoryCatalog {
    state: RwLock<CatalogState>,
}

impl MemoryCatalog {
    /// Create a new, empty catalog.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CatalogState::default()),
        }
    }

    /// Catalog pre-filled with a small demo choir library, enough to
    /// exercise both importers end to end.
    pub async fn with_demo_seed() -> Result<Self, CatalogError> {
        let catalog = Self::new();
        let collection = catalog.add_collection("Chorbuch", "X").await;

        let bach = catalog.create_composer("Bach, Johann Sebastian").await?;
        let mendelssohn = catalog.create_composer("Mendelssohn, Felix").await?;

        let seeds = [
            ("Jesu, meine Freude", bach.id, "1"),
            ("Lobet den Herrn", bach.id, "2"),
            ("Hebe deine Augen auf", mendelssohn.id, "3"),
        ];
        for (title, composer_id, number) in seeds {
            let piece = catalog.create_piece(title, composer_id, None, "SATB").await?;
            catalog
                .link_piece_to_collection(collection.id, piece.id, number)
                .await?;
        }
        Ok(catalog)
    }

    /// Add a collection. Imports never create collections, so this is
    /// not part of the [`Catalog`] trait.
    pub async fn add_collection(&self, title: &str, prefix: &str) -> Collection {
        let mut state = self.state.write().await;
        let collection = Collection {
            id: state.next_id(),
            title: title.to_string(),
            prefix: prefix.to_string(),
        };
        state.collections.push(collection.clone());
        collection
    }

    /// All events with their programs, for assertions and debugging.
    pub async fn events(&self) -> Vec<EventRecord> {
        self.state.read().await.events.clone()
    }

    /// All pieces, for assertions and debugging.
    pub async fn pieces(&self) -> Vec<Piece> {
        self.state.read().await.pieces.clone()
    }

    /// (piece id, number) pairs linked into a collection.
    pub async fn collection_links(&self, collection_id: CatalogId) -> Vec<(CatalogId, String)> {
        self.state
            .read()
            .await
            .links
            .iter()
            .filter(|link| link.collection_id == collection_id)
            .map(|link| (link.piece_id, link.number.clone()))
            .collect()
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn collection(&self, id: CatalogId) -> Result<Option<Collection>, CatalogError> {
        let state = self.state.read().await;
        Ok(state.collections.iter().find(|c| c.id == id).cloned())
    }

    async fn resolve_reference(&self, reference: &str) -> Result<Option<Piece>, CatalogError> {
        let state = self.state.read().await;
        let reference = reference.trim();

        // Longest matching prefix wins, so "XL1" resolves against a
        // collection prefixed "XL" before one prefixed "X".
        let mut collections: Vec<&Collection> = state.collections.iter().collect();
        collections.sort_by_key(|c| std::cmp::Reverse(c.prefix.len()));

        for collection in collections {
            if let Some(number) = reference.strip_prefix(collection.prefix.as_str()) {
                let number = number.trim();
                if number.is_empty() {
                    continue;
                }
                let piece_id = state
                    .links
                    .iter()
                    .find(|link| link.collection_id == collection.id && link.number == number)
                    .map(|link| link.piece_id);
                if let Some(piece_id) = piece_id {
                    return Ok(state.pieces.iter().find(|p| p.id == piece_id).cloned());
                }
            }
        }
        Ok(None)
    }

    async fn composers(&self) -> Result<Vec<Composer>, CatalogError> {
        Ok(self.state.read().await.composers.clone())
    }

    async fn composer(&self, id: CatalogId) -> Result<Option<Composer>, CatalogError> {
        let state = self.state.read().await;
        Ok(state.composers.iter().find(|c| c.id == id).cloned())
    }

    async fn create_composer(&self, name: &str) -> Result<Composer, CatalogError> {
        let mut state = self.state.write().await;
        let composer = Composer {
            id: state.next_id(),
            name: name.to_string(),
        };
        state.composers.push(composer.clone());
        Ok(composer)
    }

    async fn pieces_by_composer(
        &self,
        composer_id: CatalogId,
    ) -> Result<Vec<Piece>, CatalogError> {
        let state = self.state.read().await;
        Ok(state
            .pieces
            .iter()
            .filter(|p| p.composer_id == composer_id)
            .cloned()
            .collect())
    }

    async fn piece(&self, id: CatalogId) -> Result<Option<Piece>, CatalogError> {
        let state = self.state.read().await;
        Ok(state.pieces.iter().find(|p| p.id == id).cloned())
    }

    async fn create_piece(
        &self,
        title: &str,
        composer_id: CatalogId,
        category: Option<&str>,
        voicing: &str,
    ) -> Result<Piece, CatalogError> {
        let mut state = self.state.write().await;
        if !state.composers.iter().any(|c| c.id == composer_id) {
            return Err(CatalogError::ComposerNotFound);
        }
        let piece = Piece {
            id: state.next_id(),
            title: title.to_string(),
            composer_id,
            category: category.map(str::to_string),
            voicing: voicing.to_string(),
        };
        state.pieces.push(piece.clone());
        Ok(piece)
    }

    async fn link_piece_to_collection(
        &self,
        collection_id: CatalogId,
        piece_id: CatalogId,
        number: &str,
    ) -> Result<(), CatalogError> {
        let mut state = self.state.write().await;
        if !state.collections.iter().any(|c| c.id == collection_id) {
            return Err(CatalogError::CollectionNotFound);
        }
        if !state.pieces.iter().any(|p| p.id == piece_id) {
            return Err(CatalogError::PieceNotFound);
        }
        let exists = state
            .links
            .iter()
            .any(|link| link.collection_id == collection_id && link.piece_id == piece_id);
        if !exists {
            state.links.push(CollectionLink {
                collection_id,
                piece_id,
                number: number.to_string(),
            });
        }
        Ok(())
    }

    async fn find_or_create_event(
        &self,
        date: NaiveDate,
        kind: EventKind,
    ) -> Result<(CatalogId, bool), CatalogError> {
        let mut state = self.state.write().await;
        if let Some(event) = state
            .events
            .iter()
            .find(|e| e.date == date && e.kind == kind)
        {
            return Ok((event.id, false));
        }
        let id = state.next_id();
        state.events.push(EventRecord {
            id,
            date,
            kind,
            piece_ids: Vec::new(),
        });
        Ok((id, true))
    }

    async fn link_piece_to_event(
        &self,
        event_id: CatalogId,
        piece_id: CatalogId,
    ) -> Result<bool, CatalogError> {
        let mut state = self.state.write().await;
        if !state.pieces.iter().any(|p| p.id == piece_id) {
            return Err(CatalogError::PieceNotFound);
        }
        let Some(event) = state.events.iter_mut().find(|e| e.id == event_id) else {
            return Err(CatalogError::EventNotFound);
        };
        if event.piece_ids.contains(&piece_id) {
            return Ok(false);
        }
        event.piece_ids.push(piece_id);
        Ok(true)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (MemoryCatalog, Collection, Piece) {
        let catalog = MemoryCatalog::new();
        let collection = catalog.add_collection("Chorbuch", "X").await;
        let composer = catalog.create_composer("Composer").await.unwrap();
        let piece = catalog
            .create_piece("Piece", composer.id, None, "SATB")
            .await
            .unwrap();
        catalog
            .link_piece_to_collection(collection.id, piece.id, "1")
            .await
            .unwrap();
        (catalog, collection, piece)
    }

    #[tokio::test]
    async fn test_resolves_prefix_plus_number_references() {
        let (catalog, _, piece) = seeded().await;
        let found = catalog.resolve_reference("X1").await.unwrap().unwrap();
        assert_eq!(found.id, piece.id);
        assert!(catalog.resolve_reference("X2").await.unwrap().is_none());
        assert!(catalog.resolve_reference("Y1").await.unwrap().is_none());
        assert!(catalog.resolve_reference("X").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_longest_prefix_wins() {
        let catalog = MemoryCatalog::new();
        let short = catalog.add_collection("Short", "X").await;
        let long = catalog.add_collection("Long", "XL").await;
        let composer = catalog.create_composer("Composer").await.unwrap();
        let in_short = catalog
            .create_piece("In short", composer.id, None, "SATB")
            .await
            .unwrap();
        let in_long = catalog
            .create_piece("In long", composer.id, None, "SATB")
            .await
            .unwrap();
        catalog
            .link_piece_to_collection(short.id, in_short.id, "L1")
            .await
            .unwrap();
        catalog
            .link_piece_to_collection(long.id, in_long.id, "1")
            .await
            .unwrap();

        // "XL1" could read as X + "L1" or XL + "1"; the longer prefix
        // must win.
        let found = catalog.resolve_reference("XL1").await.unwrap().unwrap();
        assert_eq!(found.id, in_long.id);
    }

    #[tokio::test]
    async fn test_event_find_or_create_dedupes_on_date_and_kind() {
        let catalog = MemoryCatalog::new();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let (first, created) = catalog
            .find_or_create_event(date, EventKind::Service)
            .await
            .unwrap();
        assert!(created);
        let (second, created) = catalog
            .find_or_create_event(date, EventKind::Service)
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(first, second);

        // A different kind on the same date is a different event.
        let (third, created) = catalog
            .find_or_create_event(date, EventKind::Rehearsal)
            .await
            .unwrap();
        assert!(created);
        assert_ne!(first, third);
    }

    #[tokio::test]
    async fn test_event_links_are_idempotent() {
        let (catalog, _, piece) = seeded().await;
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let (event_id, _) = catalog
            .find_or_create_event(date, EventKind::Service)
            .await
            .unwrap();

        assert!(catalog.link_piece_to_event(event_id, piece.id).await.unwrap());
        assert!(!catalog.link_piece_to_event(event_id, piece.id).await.unwrap());

        let events = catalog.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].piece_ids, vec![piece.id]);
    }
}
