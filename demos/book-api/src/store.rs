use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::models::{Book, BookData};

/// In-memory book storage shared by the handlers.
#[derive(Clone, Default)]
pub struct BookStore {
    books: Arc<RwLock<BTreeMap<u32, Book>>>,
}

impl BookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, data: BookData) -> Book {
        let mut books = self.books.write().unwrap_or_else(|e| e.into_inner());
        let id = books.keys().next_back().map_or(1, |last| last + 1);
        let book = Book {
            id,
            age: data.age,
            author: data.author,
        };
        books.insert(id, book.clone());
        book
    }

    pub fn update(&self, id: u32, data: BookData) -> Option<Book> {
        let mut books = self.books.write().unwrap_or_else(|e| e.into_inner());
        let book = books.get_mut(&id)?;
        book.age = data.age;
        book.author = data.author;
        Some(book.clone())
    }

    pub fn get(&self, id: u32) -> Option<Book> {
        self.books
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned()
    }

    pub fn list(&self, age: Option<i64>) -> Vec<Book> {
        self.books
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|b| age.is_none() || b.age == age)
            .cloned()
            .collect()
    }
}
