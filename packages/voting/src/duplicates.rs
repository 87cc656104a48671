// ABOUTME: Duplicate suggestion detection
// ABOUTME: ISBN, then catalog ID, then case-insensitive title+author; fails open on errors

use bookclub_core::{normalize_isbn, Suggestion};
use bookclub_storage::StorageResult;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::suggestions::SuggestionStorage;
use crate::types::{DuplicateCheck, DuplicateQuery, MatchType};

pub struct DuplicateDetector {
    suggestions: SuggestionStorage,
}

impl DuplicateDetector {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            suggestions: SuggestionStorage::new(pool),
        }
    }

    /// Never fails: a lookup error is logged and reported as "not a duplicate"
    /// so the suggestion flow stays available.
    pub async fn check(&self, query: &DuplicateQuery) -> DuplicateCheck {
        match self.find_match(query).await {
            Ok(Some((match_type, suggestion))) => {
                debug!(
                    "Duplicate of {} found by {} for \"{}\"",
                    suggestion.id, match_type, query.title
                );
                DuplicateCheck::matched(match_type, suggestion)
            }
            Ok(None) => DuplicateCheck::not_duplicate(),
            Err(e) => {
                warn!("Duplicate check failed, allowing submission: {}", e);
                DuplicateCheck::not_duplicate()
            }
        }
    }

    /// First match by priority: ISBN, then catalog ID, then title and author
    async fn find_match(
        &self,
        query: &DuplicateQuery,
    ) -> StorageResult<Option<(MatchType, Suggestion)>> {
        let isbn = query
            .isbn
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| normalize_isbn(raw).unwrap_or_else(|_| raw.to_string()));

        if let Some(isbn) = isbn {
            if let Some(found) = self.suggestions.find_by_isbn(&isbn).await? {
                return Ok(Some((MatchType::Isbn, found)));
            }
        }

        let external_id = query
            .external_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());

        if let Some(external_id) = external_id {
            if let Some(found) = self.suggestions.find_by_external_id(external_id).await? {
                return Ok(Some((MatchType::ExternalId, found)));
            }
        }

        if query.title.trim().is_empty() || query.author.trim().is_empty() {
            return Ok(None);
        }

        Ok(self
            .suggestions
            .find_by_title_author(&query.title, &query.author)
            .await?
            .map(|found| (MatchType::TitleAuthor, found)))
    }
}
