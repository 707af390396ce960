use crate::models::{Candidate, Employee, User};

pub trait Record {
    fn id(&self) -> i64;
}

impl Record for Candidate {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Record for Employee {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Record for User {
    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone)]
pub enum Action<T> {
    Loaded(Vec<T>),
    Inserted(T),
    Patched(T),
    Removed(i64),
}

#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Vec<T>,
    loaded: bool,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loaded: false,
        }
    }
}

impl<T: Record> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn load(&mut self, items: Vec<T>) {
        self.items = items;
        self.loaded = true;
    }

    /// Appends `item`, or replaces the existing item with the same id so an
    /// id is never listed twice.
    pub fn apply_insert(&mut self, item: T) {
        let id = item.id();
        match self.items.iter_mut().find(|existing| existing.id() == id) {
            Some(slot) => *slot = item,
            None => self.items.push(item),
        }
    }

    pub fn apply_patch(&mut self, id: i64, item: T) -> bool {
        match self.items.iter_mut().find(|existing| existing.id() == id) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    pub fn apply_remove(&mut self, id: i64) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id() != id);
        self.items.len() != before
    }

    pub fn reduce(mut self, action: Action<T>) -> Self {
        match action {
            Action::Loaded(items) => self.load(items),
            Action::Inserted(item) => self.apply_insert(item),
            Action::Patched(item) => {
                let id = item.id();
                self.apply_patch(id, item);
            }
            Action::Removed(id) => {
                self.apply_remove(id);
            }
        }
        self
    }
}
