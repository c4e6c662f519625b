//! The live document collaborator.
//!
//! Reads are asynchronous requests. Mutations and annotations are queued and
//! become observable only after [`DocumentStore::sync`] flushes them, the way
//! a host editor batches a request/response round trip.

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::text::{char_len, find_all, splice};
use crate::types::LiveParagraph;

/// An addressable span inside one paragraph, in code points.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub paragraph_id: String,
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(paragraph_id: impl Into<String>, start: usize, end: usize) -> Self {
        Self { paragraph_id: paragraph_id.into(), start, end }
    }

    /// Zero-width range used as an insertion point.
    pub fn point(paragraph_id: impl Into<String>, at: usize) -> Self {
        Self::new(paragraph_id, at, at)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Sub-range starting `offset` code points into this one.
    pub fn narrow(&self, offset: usize, len: usize) -> TextRange {
        let start = self.start + offset;
        TextRange::new(self.paragraph_id.clone(), start, start + len)
    }
}

/// Capabilities the engine needs from a host document.
///
/// Implementations are driven by a single owner through `&mut self`, so no
/// two operations ever interleave.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Every paragraph in document order.
    async fn paragraphs(&mut self) -> Result<Vec<LiveParagraph>, StoreError>;

    /// Current synced text of one paragraph.
    async fn read(&mut self, paragraph_id: &str) -> Result<String, StoreError>;

    /// All non-overlapping occurrences of `needle`, left to right.
    async fn search(&mut self, paragraph_id: &str, needle: &str) -> Result<Vec<TextRange>, StoreError>;

    fn insert_at(&mut self, at: &TextRange, text: &str);
    fn delete_range(&mut self, range: &TextRange);
    fn replace_range(&mut self, range: &TextRange, text: &str);
    fn replace_paragraph(&mut self, paragraph_id: &str, text: &str);
    fn clear_paragraph(&mut self, paragraph_id: &str);

    /// Marks a range for preview. Annotations never change paragraph text.
    fn annotate(&mut self, range: &TextRange, tag: &str);
    fn remove_annotations(&mut self, tag: &str);

    /// Flushes queued operations.
    ///
    /// # Errors
    ///
    /// On failure none of the queued operations take effect and the queue is
    /// discarded.
    async fn sync(&mut self) -> Result<(), StoreError>;
}

/// A preview mark left on the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub tag: String,
    pub range: TextRange,
}

#[derive(Debug, Clone)]
enum PendingOp {
    Insert { at: TextRange, text: String },
    Delete { range: TextRange },
    Replace { range: TextRange, text: String },
    ReplaceParagraph { paragraph_id: String, text: String },
    Clear { paragraph_id: String },
    Annotate { range: TextRange, tag: String },
    RemoveAnnotations { tag: String },
}

impl PendingOp {
    /// Paragraph whose text this operation rewrites, if any.
    fn touched(&self) -> Option<&str> {
        match self {
            PendingOp::Insert { at: range, .. }
            | PendingOp::Delete { range }
            | PendingOp::Replace { range, .. } => Some(&range.paragraph_id),
            PendingOp::ReplaceParagraph { paragraph_id, .. } | PendingOp::Clear { paragraph_id } => {
                Some(paragraph_id)
            }
            PendingOp::Annotate { .. } | PendingOp::RemoveAnnotations { .. } => None,
        }
    }
}

/// In-memory [`DocumentStore`] with queued writes.
///
/// Test hooks: [`MemoryStore::fail_next_sync`] makes the next flush fail and
/// drop its queue; [`MemoryStore::corrupt_next_sync`] appends stray text to
/// every paragraph the next rewriting flush touches, so post-apply
/// verification fails.
#[derive(Debug, Default)]
pub struct MemoryStore {
    paragraphs: Vec<LiveParagraph>,
    annotations: Vec<Annotation>,
    queue: Vec<PendingOp>,
    fail_next_sync: Option<String>,
    corrupt: Option<(String, usize)>,
}

impl MemoryStore {
    pub fn new(paragraphs: Vec<LiveParagraph>) -> Self {
        Self { paragraphs, ..Self::default() }
    }

    /// Paragraphs with ids `p1`, `p2`, ... in order.
    pub fn from_texts<I, T>(texts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let paragraphs = texts
            .into_iter()
            .enumerate()
            .map(|(i, t)| LiveParagraph::new(format!("p{}", i + 1), t))
            .collect();
        Self::new(paragraphs)
    }

    /// Synced text of a paragraph, bypassing the async protocol.
    pub fn text(&self, paragraph_id: &str) -> Option<&str> {
        self.paragraphs
            .iter()
            .find(|p| p.id == paragraph_id)
            .map(|p| p.text.as_str())
    }

    pub fn into_paragraphs(self) -> Vec<LiveParagraph> {
        self.paragraphs
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn fail_next_sync(&mut self, reason: impl Into<String>) {
        self.fail_next_sync = Some(reason.into());
    }

    pub fn corrupt_next_sync(&mut self, stray: impl Into<String>) {
        self.corrupt_syncs(stray, 1);
    }

    /// Corrupts the next `count` flushes that rewrite paragraph text.
    pub fn corrupt_syncs(&mut self, stray: impl Into<String>, count: usize) {
        self.corrupt = (count > 0).then(|| (stray.into(), count));
    }

    fn paragraph(&self, paragraph_id: &str) -> Result<&LiveParagraph, StoreError> {
        self.paragraphs
            .iter()
            .find(|p| p.id == paragraph_id)
            .ok_or_else(|| StoreError::ParagraphNotFound(paragraph_id.to_owned()))
    }
}

fn paragraph_mut<'a>(
    paragraphs: &'a mut [LiveParagraph],
    paragraph_id: &str,
) -> Result<&'a mut LiveParagraph, StoreError> {
    paragraphs
        .iter_mut()
        .find(|p| p.id == paragraph_id)
        .ok_or_else(|| StoreError::ParagraphNotFound(paragraph_id.to_owned()))
}

fn check_bounds(text: &str, range: &TextRange) -> Result<(), StoreError> {
    let len = char_len(text);
    if range.start > range.end || range.end > len {
        return Err(StoreError::RangeOutOfBounds {
            paragraph_id: range.paragraph_id.clone(),
            start: range.start,
            end: range.end,
            len,
        });
    }
    Ok(())
}

fn splice_range(paragraphs: &mut [LiveParagraph], range: &TextRange, text: &str) -> Result<(), StoreError> {
    let paragraph = paragraph_mut(paragraphs, &range.paragraph_id)?;
    check_bounds(&paragraph.text, range)?;
    paragraph.text = splice(&paragraph.text, range.start, range.end, text);
    Ok(())
}

impl DocumentStore for MemoryStore {
    async fn paragraphs(&mut self) -> Result<Vec<LiveParagraph>, StoreError> {
        Ok(self.paragraphs.clone())
    }

    async fn read(&mut self, paragraph_id: &str) -> Result<String, StoreError> {
        self.paragraph(paragraph_id).map(|p| p.text.clone())
    }

    async fn search(&mut self, paragraph_id: &str, needle: &str) -> Result<Vec<TextRange>, StoreError> {
        let paragraph = self.paragraph(paragraph_id)?;
        let len = char_len(needle);
        Ok(find_all(&paragraph.text, needle)
            .into_iter()
            .map(|start| TextRange::new(paragraph_id, start, start + len))
            .collect())
    }

    fn insert_at(&mut self, at: &TextRange, text: &str) {
        self.queue.push(PendingOp::Insert { at: at.clone(), text: text.to_owned() });
    }

    fn delete_range(&mut self, range: &TextRange) {
        self.queue.push(PendingOp::Delete { range: range.clone() });
    }

    fn replace_range(&mut self, range: &TextRange, text: &str) {
        self.queue.push(PendingOp::Replace { range: range.clone(), text: text.to_owned() });
    }

    fn replace_paragraph(&mut self, paragraph_id: &str, text: &str) {
        self.queue.push(PendingOp::ReplaceParagraph {
            paragraph_id: paragraph_id.to_owned(),
            text: text.to_owned(),
        });
    }

    fn clear_paragraph(&mut self, paragraph_id: &str) {
        self.queue.push(PendingOp::Clear { paragraph_id: paragraph_id.to_owned() });
    }

    fn annotate(&mut self, range: &TextRange, tag: &str) {
        self.queue.push(PendingOp::Annotate { range: range.clone(), tag: tag.to_owned() });
    }

    fn remove_annotations(&mut self, tag: &str) {
        self.queue.push(PendingOp::RemoveAnnotations { tag: tag.to_owned() });
    }

    async fn sync(&mut self) -> Result<(), StoreError> {
        let queue = std::mem::take(&mut self.queue);
        if let Some(reason) = self.fail_next_sync.take() {
            warn!(dropped = queue.len(), %reason, "injected sync failure");
            return Err(StoreError::SyncFailed(reason));
        }

        let mut paragraphs = self.paragraphs.clone();
        let mut annotations = self.annotations.clone();
        let mut touched: Vec<String> = Vec::new();

        for op in &queue {
            if let Some(id) = op.touched() {
                if !touched.iter().any(|t| t == id) {
                    touched.push(id.to_owned());
                }
            }
            match op {
                PendingOp::Insert { at, text } => {
                    let point = TextRange::point(at.paragraph_id.as_str(), at.start);
                    splice_range(&mut paragraphs, &point, text)?;
                }
                PendingOp::Delete { range } => splice_range(&mut paragraphs, range, "")?,
                PendingOp::Replace { range, text } => splice_range(&mut paragraphs, range, text)?,
                PendingOp::ReplaceParagraph { paragraph_id, text } => {
                    paragraph_mut(&mut paragraphs, paragraph_id)?.text = text.clone();
                }
                PendingOp::Clear { paragraph_id } => {
                    paragraph_mut(&mut paragraphs, paragraph_id)?.text.clear();
                }
                PendingOp::Annotate { range, tag } => {
                    let paragraph = paragraph_mut(&mut paragraphs, &range.paragraph_id)?;
                    check_bounds(&paragraph.text, range)?;
                    annotations.push(Annotation { tag: tag.clone(), range: range.clone() });
                }
                PendingOp::RemoveAnnotations { tag } => annotations.retain(|a| &a.tag != tag),
            }
        }

        let mut exhausted = false;
        if let Some((stray, remaining)) = self.corrupt.as_mut().filter(|_| !touched.is_empty()) {
            for id in &touched {
                paragraph_mut(&mut paragraphs, id)?.text.push_str(stray);
            }
            *remaining -= 1;
            exhausted = *remaining == 0;
        }
        if exhausted {
            self.corrupt = None;
        }

        debug!(ops = queue.len(), touched = touched.len(), "synced memory store");
        self.paragraphs = paragraphs;
        self.annotations = annotations;
        Ok(())
    }
}
