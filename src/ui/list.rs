use crate::model::{Entry, StoreError, Tag, Timer};
use crate::store::Store;

/// A row type the UI can list and select.
pub trait Listed: Sized {
    fn id(&self) -> i64;
    fn fetch(store: &dyn Store) -> Result<Vec<Self>, StoreError>;
}

impl Listed for Entry {
    fn id(&self) -> i64 {
        self.id
    }

    fn fetch(store: &dyn Store) -> Result<Vec<Self>, StoreError> {
        store.list_entries()
    }
}

impl Listed for Timer {
    fn id(&self) -> i64 {
        self.id
    }

    fn fetch(store: &dyn Store) -> Result<Vec<Self>, StoreError> {
        store.list_timers()
    }
}

impl Listed for Tag {
    fn id(&self) -> i64 {
        self.id
    }

    fn fetch(store: &dyn Store) -> Result<Vec<Self>, StoreError> {
        store.list_tags()
    }
}

/// Last successfully fetched rows of one kind plus the highlighted row.
///
/// `cursor` is `None` exactly when `items` is empty.
pub struct EntityListCache<T> {
    items: Vec<T>,
    cursor: Option<usize>,
}

impl<T: Listed> Default for EntityListCache<T> {
    fn default() -> Self {
        EntityListCache {
            items: Vec::new(),
            cursor: None,
        }
    }
}

impl<T: Listed> EntityListCache<T> {
    /// Replaces the rows with a fresh fetch. On failure the previous rows and
    /// cursor stay as they were.
    pub fn refresh(&mut self, store: &dyn Store) -> Result<&[T], StoreError> {
        let items = T::fetch(store)?;
        self.replace(items);
        Ok(&self.items)
    }

    fn replace(&mut self, items: Vec<T>) {
        let selected_id = self.selected().map(Listed::id);
        let previous = self.cursor;
        self.items = items;
        self.cursor = if self.items.is_empty() {
            None
        } else if let Some(idx) =
            selected_id.and_then(|id| self.items.iter().position(|item| item.id() == id))
        {
            Some(idx)
        } else {
            Some(previous.unwrap_or(0).min(self.items.len() - 1))
        };
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Moves the cursor by `delta`, clamped to the list. Returns whether the
    /// selection changed.
    pub fn move_cursor(&mut self, delta: isize) -> bool {
        let Some(current) = self.cursor else {
            return false;
        };
        let last = self.items.len() - 1;
        let target = if delta < 0 {
            current.saturating_sub(delta.unsigned_abs())
        } else {
            current.saturating_add(delta as usize).min(last)
        };
        self.cursor = Some(target);
        target != current
    }

    pub fn selected(&self) -> Option<&T> {
        self.cursor.and_then(|idx| self.items.get(idx))
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::testing::{FlakyStore, ts};

    fn seeded(names: &[&str]) -> FlakyStore {
        let store = FlakyStore::new();
        for (i, name) in names.iter().enumerate() {
            store
                .inner
                .create_timer_at(name, &[], ts(9, i as u32))
                .unwrap();
        }
        store
    }

    #[test]
    fn empty_list_has_no_selection() {
        let store = FlakyStore::new();
        let mut cache = EntityListCache::<Timer>::default();
        cache.refresh(&store).unwrap();
        assert_eq!(cache.cursor(), None);
        assert!(!cache.move_cursor(1));
        assert!(!cache.move_cursor(-1));
        assert_eq!(cache.cursor(), None);
    }

    #[test]
    fn cursor_clamps_at_both_ends() {
        let store = seeded(&["a", "b", "c"]);
        let mut cache = EntityListCache::<Timer>::default();
        cache.refresh(&store).unwrap();
        assert_eq!(cache.cursor(), Some(0));

        assert!(!cache.move_cursor(-1));
        assert_eq!(cache.cursor(), Some(0));

        cache.move_cursor(2);
        assert_eq!(cache.cursor(), Some(2));
        assert!(!cache.move_cursor(1));
        assert!(!cache.move_cursor(1));
        assert_eq!(cache.cursor(), Some(2));
        assert_eq!(cache.selected().map(|t| t.name.as_str()), Some("c"));
    }

    #[test]
    fn failed_refresh_keeps_stale_rows() {
        let store = seeded(&["a", "b"]);
        let mut cache = EntityListCache::<Timer>::default();
        cache.refresh(&store).unwrap();
        cache.move_cursor(1);

        store.inner.create_timer_at("c", &[], ts(10, 0)).unwrap();
        store.fail(true);
        assert!(cache.refresh(&store).is_err());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.cursor(), Some(1));
    }

    #[test]
    fn refresh_follows_the_selected_row() {
        let store = seeded(&["b", "c"]);
        let mut cache = EntityListCache::<Timer>::default();
        cache.refresh(&store).unwrap();
        cache.move_cursor(1);

        // Another process starts a timer that sorts before the selection.
        store.inner.create_timer_at("a", &[], ts(8, 0)).unwrap();
        cache.refresh(&store).unwrap();
        assert_eq!(cache.cursor(), Some(2));
        assert_eq!(cache.selected().map(|t| t.name.as_str()), Some("c"));
    }

    #[test]
    fn removing_the_last_row_clamps_down() {
        let store = seeded(&["a", "b", "c"]);
        let mut cache = EntityListCache::<Timer>::default();
        cache.refresh(&store).unwrap();
        cache.move_cursor(2);

        let last = cache.selected().map(|t| t.id).unwrap();
        store.inner.delete_timer(last).unwrap();
        cache.refresh(&store).unwrap();
        assert_eq!(cache.cursor(), Some(1));

        for timer in store.inner.list_timers().unwrap() {
            store.inner.delete_timer(timer.id).unwrap();
        }
        cache.refresh(&store).unwrap();
        assert_eq!(cache.cursor(), None);
        assert!(cache.is_empty());
    }
}
