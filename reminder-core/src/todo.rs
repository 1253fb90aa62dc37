use tokio::sync::RwLock;

use crate::model::Todo;

#[derive(Debug, Default)]
struct TodoList {
    items: Vec<Todo>,
    next_id: u32,
}

/// In-memory, insertion-ordered to-do list shared by all requests.
#[derive(Debug, Default)]
pub struct TodoStore {
    inner: RwLock<TodoList>,
}

impl TodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store. Ids continue after the largest existing id.
    pub fn with_items(items: Vec<Todo>) -> Self {
        let max_id = items.iter().map(|t| t.id).max().unwrap_or(0);
        let next_id = max_id.max(items.len() as u32) + 1;
        Self {
            inner: RwLock::new(TodoList { items, next_id }),
        }
    }

    pub async fn list(&self) -> Vec<Todo> {
        self.inner.read().await.items.clone()
    }

    pub async fn get(&self, id: u32) -> Option<Todo> {
        self.inner.read().await.items.iter().find(|t| t.id == id).cloned()
    }

    /// Append a new item. Ids are never reused, even after deletes.
    pub async fn create(&self, title: String) -> Todo {
        let mut list = self.inner.write().await;
        let id = list.next_id.max(list.items.len() as u32 + 1);
        list.next_id = id + 1;

        let todo = Todo {
            id,
            title,
            completed: false,
        };
        list.items.push(todo.clone());
        todo
    }

    /// Flip `completed`; returns the updated item.
    pub async fn toggle(&self, id: u32) -> Option<Todo> {
        let mut list = self.inner.write().await;
        let todo = list.items.iter_mut().find(|t| t.id == id)?;
        todo.completed = !todo.completed;
        Some(todo.clone())
    }

    /// Remove an item; returns it if it existed.
    pub async fn delete(&self, id: u32) -> Option<Todo> {
        let mut list = self.inner.write().await;
        let index = list.items.iter().position(|t| t.id == id)?;
        Some(list.items.remove(index))
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.items.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn seeded(n: u32) -> TodoStore {
        TodoStore::with_items(
            (1..=n)
                .map(|id| Todo {
                    id,
                    title: format!("할 일 {id}"),
                    completed: false,
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn create_assigns_next_id() {
        let store = seeded(4);
        let todo = store.create("Test".into()).await;
        assert_eq!(todo.id, 5);
        assert_eq!(store.len().await, 5);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = seeded(4);
        assert!(store.delete(2).await.is_some());

        let todo = store.create("new".into()).await;
        assert_eq!(todo.id, 5);

        let ids: Vec<_> = store.list().await.iter().map(|t| t.id).collect();
        assert_eq!(ids, [1, 3, 4, 5]);
    }

    #[tokio::test]
    async fn toggle_flips_and_reports_missing() {
        let store = seeded(1);
        assert!(store.toggle(1).await.unwrap().completed);
        assert!(!store.toggle(1).await.unwrap().completed);
        assert!(store.toggle(9).await.is_none());
    }

    #[tokio::test]
    async fn get_and_delete_missing_ids() {
        let store = TodoStore::new();
        assert!(store.is_empty().await);
        assert!(store.get(1).await.is_none());
        assert!(store.delete(1).await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_get_distinct_ids() {
        let store = Arc::new(TodoStore::new());
        let mut handles = Vec::new();
        for i in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.create(format!("item {i}")).await.id }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }
}
