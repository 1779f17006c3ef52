//! Declarative reads over a note collection.

use std::cmp::Ordering;

use crate::models::Note;

/// A predicate a note must satisfy to appear in a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Favorite(bool),
    IdEq(String),
    /// Case-insensitive substring match on the title
    TitleContains(String),
}

impl Filter {
    pub fn matches(&self, note: &Note) -> bool {
        match self {
            Filter::Favorite(wanted) => note.is_favorite == *wanted,
            Filter::IdEq(id) => note.id == *id,
            Filter::TitleContains(needle) => note
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: SortField,
    pub direction: Direction,
}

impl OrderBy {
    fn compare(&self, a: &Note, b: &Note) -> Ordering {
        let ord = match self.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        };
        // Ties fall back to id so equal keys still come out in a stable order
        let ord = ord.then_with(|| a.id.cmp(&b.id));
        match self.direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        }
    }
}

/// Filter + order + limit over the collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    filters: Vec<Filter>,
    order: Option<OrderBy>,
    limit: Option<usize>,
}

impl Query {
    /// Every note, in id order
    pub fn all() -> Self {
        Self::default()
    }

    /// Favorite notes only
    pub fn favorites() -> Self {
        Self::all().filter(Filter::Favorite(true))
    }

    /// Every note, most recently created first
    pub fn newest_first() -> Self {
        Self::all().order_by(SortField::CreatedAt, Direction::Desc)
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: SortField, direction: Direction) -> Self {
        self.order = Some(OrderBy { field, direction });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, note: &Note) -> bool {
        self.filters.iter().all(|f| f.matches(note))
    }

    /// Run the query against a set of notes
    pub fn evaluate<'a, I>(&self, notes: I) -> Vec<Note>
    where
        I: IntoIterator<Item = &'a Note>,
    {
        let mut results: Vec<Note> = notes
            .into_iter()
            .filter(|n| self.matches(n))
            .cloned()
            .collect();

        match &self.order {
            Some(order) => results.sort_by(|a, b| order.compare(a, b)),
            None => results.sort_by(|a, b| a.id.cmp(&b.id)),
        }

        if let Some(limit) = self.limit {
            results.truncate(limit);
        }
        results
    }
}
