//! Scoped hiding of non-exportable elements.
//!
//! [`ExclusionGuard`] forces `display: none` on every marked descendant of a
//! root and remembers each node's previous inline value. Dropping the guard
//! puts every value back, so the page is restored on normal return, on error
//! and when the owning future is cancelled.

use crate::dom::{write_document, NodeId, SharedDocument};
use std::collections::HashMap;
use std::future::Future;

pub struct ExclusionGuard<'a> {
    document: &'a SharedDocument,
    saved: HashMap<NodeId, Option<String>>,
}

impl<'a> ExclusionGuard<'a> {
    /// Hide all descendants of `root` carrying `marker`.
    pub fn acquire(document: &'a SharedDocument, root: NodeId, marker: &str) -> Self {
        let mut doc = write_document(document);
        let targets: Vec<NodeId> = doc
            .descendants(root)
            .into_iter()
            .filter(|id| doc.has_class(*id, marker))
            .collect();
        let mut saved = HashMap::with_capacity(targets.len());
        for id in targets {
            saved.insert(id, doc.display(id));
            doc.set_display(id, Some("none"));
        }
        log::debug!("hid {} excluded region(s)", saved.len());
        Self { document, saved }
    }

    pub fn hidden_count(&self) -> usize {
        self.saved.len()
    }

    /// Restore now instead of at drop
    pub fn release(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if self.saved.is_empty() {
            return;
        }
        let mut doc = write_document(self.document);
        let count = self.saved.len();
        for (id, display) in self.saved.drain() {
            doc.set_display(id, display.as_deref());
        }
        log::debug!("restored {} excluded region(s)", count);
    }
}

impl Drop for ExclusionGuard<'_> {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Run `f` with the excluded descendants of `root` hidden.
///
/// Whatever `f` resolves to is returned unchanged; the original display
/// values are back in place before this returns, or when this future is
/// dropped early.
pub async fn with_hidden_exclusions<T, F, Fut>(
    document: &SharedDocument,
    root: NodeId,
    marker: &str,
    f: F,
) -> T
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let guard = ExclusionGuard::acquire(document, root, marker);
    let out = f().await;
    guard.release();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{read_document, Document};
    use crate::{Error, Result};

    const PAGE: &str = r#"<div id="root">
        <div class="no-print" style="display: flex">a</div>
        <div class="no-print">b</div>
        <div class="no-print" style="display: none">c</div>
        <p>keep</p>
    </div>
    <div class="no-print" style="display: block">outside</div>"#;

    fn setup() -> (SharedDocument, NodeId, Vec<(NodeId, Option<String>)>) {
        let doc = Document::parse(PAGE);
        let root = doc.element_by_id("root").unwrap();
        let all: Vec<_> = doc
            .descendants(doc.root())
            .into_iter()
            .filter(|id| doc.has_class(*id, "no-print"))
            .map(|id| (id, doc.display(id)))
            .collect();
        (doc.into_shared(), root, all)
    }

    fn assert_restored(shared: &SharedDocument, before: &[(NodeId, Option<String>)]) {
        let doc = read_document(shared);
        for (id, display) in before {
            assert_eq!(&doc.display(*id), display);
        }
    }

    #[tokio::test]
    async fn hides_during_and_restores_after_success() {
        let (shared, root, before) = setup();
        let seen = with_hidden_exclusions(&shared, root, "no-print", || async {
            let doc = read_document(&shared);
            doc.descendants(root)
                .into_iter()
                .filter(|id| doc.has_class(*id, "no-print"))
                .all(|id| doc.is_hidden(id))
        })
        .await;
        assert!(seen);
        assert_restored(&shared, &before);
        // the marked node outside the root was never touched
        assert_eq!(read_document(&shared).display_mutations(), 6);
    }

    #[tokio::test]
    async fn restores_after_failure() {
        let (shared, root, before) = setup();
        let res: Result<()> = with_hidden_exclusions(&shared, root, "no-print", || async {
            Err(Error::CaptureFailure("render timeout".into()))
        })
        .await;
        assert!(res.is_err());
        assert_restored(&shared, &before);
    }

    #[tokio::test]
    async fn restores_when_cancelled() {
        let (shared, root, before) = setup();
        let pending = with_hidden_exclusions(&shared, root, "no-print", || futures::future::pending::<()>());
        let timed = tokio::time::timeout(std::time::Duration::from_millis(10), pending).await;
        assert!(timed.is_err());
        assert_restored(&shared, &before);
    }

    #[test]
    fn unset_display_is_removed_again() {
        let (shared, root, _) = setup();
        let guard = ExclusionGuard::acquire(&shared, root, "no-print");
        assert_eq!(guard.hidden_count(), 3);
        drop(guard);
        let doc = read_document(&shared);
        let b = doc
            .descendants(root)
            .into_iter()
            .find(|id| doc.text_content(*id) == "b" && doc.element(*id).is_some())
            .unwrap();
        assert!(doc.element(b).unwrap().style.is_empty());
    }

    #[test]
    fn each_guard_owns_its_bookkeeping() {
        let (shared, root, before) = setup();
        ExclusionGuard::acquire(&shared, root, "no-print").release();
        ExclusionGuard::acquire(&shared, root, "no-print").release();
        assert_restored(&shared, &before);
    }
}
