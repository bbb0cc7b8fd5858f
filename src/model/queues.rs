use serde::{Deserialize, Serialize};

use super::ModelController;

/// Per-user candidate queue: ordered social IDs (search ranking order) plus
/// a cursor. The two are always replaced and mutated together so the
/// invariant `0 <= cursor < len` holds whenever the queue is non-empty.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CandidateQueue {
    pub ids: Vec<i64>,
    pub cursor: usize,
}

impl CandidateQueue {
    pub fn new(ids: Vec<i64>) -> Self {
        Self { ids, cursor: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// ID under the cursor, or none when the queue is empty or the cursor
    /// is out of bounds.
    pub fn current(&self) -> Option<i64> {
        self.ids.get(self.cursor).copied()
    }

    /// Advance and return the new current ID. No-op at the last element.
    pub fn move_next(&mut self) -> Option<i64> {
        if self.ids.is_empty() || self.cursor + 1 >= self.ids.len() {
            return None;
        }
        self.cursor += 1;
        self.current()
    }

    /// Step back and return the new current ID. No-op at the first element.
    pub fn move_prev(&mut self) -> Option<i64> {
        if self.ids.is_empty() || self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.current()
    }

    /// Remove `id` if present and renormalize the cursor: removals before
    /// the cursor shift it down, a removal under a tail cursor clamps it to
    /// the new last element. Returns whether anything was removed.
    pub fn remove(&mut self, id: i64) -> bool {
        let Some(index) = self.ids.iter().position(|&existing| existing == id) else {
            return false;
        };
        self.ids.remove(index);
        if index < self.cursor {
            self.cursor -= 1;
        } else if index == self.cursor && self.cursor >= self.ids.len() {
            self.cursor = self.ids.len().saturating_sub(1);
        }
        true
    }

    /// IDs strictly after the cursor, at most `count` of them.
    pub fn ahead(&self, count: usize) -> Vec<i64> {
        if self.ids.is_empty() {
            return vec![];
        }
        self.ids.iter().skip(self.cursor + 1).take(count).copied().collect()
    }
}

impl ModelController {
    /// Replaces the queue atomically, cursor back to 0.
    pub async fn set_queue(&self, user_id: i64, candidate_ids: Vec<i64>) {
        let mut queues = self.store().queues.write().await;
        queues.insert(user_id, CandidateQueue::new(candidate_ids));
    }

    pub async fn get_queue(&self, user_id: i64) -> Vec<i64> {
        let queues = self.store().queues.read().await;
        queues.get(&user_id).map(|q| q.ids.clone()).unwrap_or_default()
    }

    pub async fn clear_queue(&self, user_id: i64) {
        let mut queues = self.store().queues.write().await;
        queues.remove(&user_id);
    }

    pub async fn get_current_candidate(&self, user_id: i64) -> Option<i64> {
        let queues = self.store().queues.read().await;
        queues.get(&user_id).and_then(|q| q.current())
    }

    pub async fn move_next(&self, user_id: i64) -> Option<i64> {
        let mut queues = self.store().queues.write().await;
        queues.get_mut(&user_id).and_then(|q| q.move_next())
    }

    pub async fn move_prev(&self, user_id: i64) -> Option<i64> {
        let mut queues = self.store().queues.write().await;
        queues.get_mut(&user_id).and_then(|q| q.move_prev())
    }

    pub async fn remove_from_queue(&self, user_id: i64, candidate_id: i64) -> bool {
        let mut queues = self.store().queues.write().await;
        queues.get_mut(&user_id).map(|q| q.remove(candidate_id)).unwrap_or(false)
    }

    pub(super) async fn queue_ahead(&self, user_id: i64, count: usize) -> Vec<i64> {
        let queues = self.store().queues.read().await;
        queues.get(&user_id).map(|q| q.ahead(count)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(ids: &[i64]) -> CandidateQueue {
        CandidateQueue::new(ids.to_vec())
    }

    fn check_invariant(q: &CandidateQueue) {
        if !q.ids.is_empty() {
            assert!(q.cursor < q.ids.len(), "cursor {} out of bounds for len {}", q.cursor, q.ids.len());
        }
    }

    #[test]
    fn test_empty_queue() {
        let mut q = queue(&[]);
        assert_eq!(q.current(), None);
        assert_eq!(q.move_next(), None);
        assert_eq!(q.move_prev(), None);
        assert!(!q.remove(1));
    }

    #[test]
    fn test_navigation_boundaries() {
        let mut q = queue(&[10, 20, 30]);
        assert_eq!(q.current(), Some(10));
        assert_eq!(q.move_prev(), None);
        assert_eq!(q.current(), Some(10));

        assert_eq!(q.move_next(), Some(20));
        assert_eq!(q.move_next(), Some(30));
        assert_eq!(q.move_next(), None);
        assert_eq!(q.current(), Some(30));
        check_invariant(&q);
    }

    #[test]
    fn test_next_prev_round_trip() {
        let mut q = queue(&[10, 20, 30]);
        q.move_next();
        let before = q.current();
        assert_eq!(q.move_next(), Some(30));
        assert_eq!(q.move_prev(), before);
    }

    #[test]
    fn test_remove_before_cursor_shifts_down() {
        let mut q = queue(&[10, 20, 30]);
        q.move_next();
        q.move_next();
        assert_eq!(q.current(), Some(30));
        assert!(q.remove(10));
        assert_eq!(q.current(), Some(30));
        check_invariant(&q);
    }

    #[test]
    fn test_remove_current_points_to_next() {
        let mut q = queue(&[10, 20, 30]);
        q.move_next();
        assert!(q.remove(20));
        assert_eq!(q.current(), Some(30));
        check_invariant(&q);
    }

    #[test]
    fn test_remove_current_tail_clamps() {
        let mut q = queue(&[10, 20, 30]);
        q.move_next();
        q.move_next();
        assert!(q.remove(30));
        assert_eq!(q.current(), Some(20));
        check_invariant(&q);
    }

    #[test]
    fn test_remove_last_element_empties_queue() {
        let mut q = queue(&[10]);
        assert!(q.remove(10));
        assert_eq!(q.current(), None);
        assert_eq!(q.cursor, 0);
    }

    #[test]
    fn test_remove_nonexistent_is_noop() {
        let mut q = queue(&[10, 20]);
        q.move_next();
        assert!(!q.remove(99));
        assert_eq!(q.current(), Some(20));
        check_invariant(&q);
    }

    #[test]
    fn test_ahead_window() {
        let mut q = queue(&[1, 2, 3, 4, 5]);
        assert_eq!(q.ahead(2), vec![2, 3]);
        q.move_next();
        assert_eq!(q.ahead(10), vec![3, 4, 5]);
        assert_eq!(queue(&[]).ahead(3), Vec::<i64>::new());
    }

    #[tokio::test]
    async fn test_controller_set_queue_resets_cursor() {
        let mc = crate::model::tests_support::test_controller();
        mc.set_queue(1, vec![10, 20, 30]).await;
        assert_eq!(mc.move_next(1).await, Some(20));
        mc.set_queue(1, vec![40, 50]).await;
        assert_eq!(mc.get_current_candidate(1).await, Some(40));
    }
}
