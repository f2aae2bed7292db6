use crate::canvas::Image;

// ============================================================================
// SNAPSHOT HISTORY: linear undo/redo over full Image copies
// ============================================================================

/// Undo/redo history made of full, independent [`Image`] snapshots.
///
/// `cursor` designates the snapshot matching the live image. Taking a
/// snapshot while the cursor is not at the end discards every later
/// snapshot first, so there is never more than one redo branch.
#[derive(Debug, Default)]
pub struct History {
    snapshots: Vec<Image>,
    cursor: Option<usize>,
    /// Optional cap on stored snapshots; the oldest are dropped first.
    max_snapshots: Option<usize>,
}

impl History {
    /// Unbounded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// History that keeps at most `max_snapshots` entries (minimum 1).
    pub fn with_limit(max_snapshots: usize) -> Self {
        Self {
            max_snapshots: Some(max_snapshots.max(1)),
            ..Self::default()
        }
    }

    pub fn take_snapshot(&mut self, image: &Image) {
        if let Some(cursor) = self.cursor {
            let discarded = self.snapshots.len().saturating_sub(cursor + 1);
            if discarded > 0 {
                tracing::debug!("history: discarding {} redo snapshot(s)", discarded);
            }
            self.snapshots.truncate(cursor + 1);
        }

        self.snapshots.push(image.deep_copy());
        self.cursor = Some(self.snapshots.len() - 1);
        self.prune();
    }

    /// Step back one snapshot, replacing `image` with a copy of it.
    /// Returns `false` (and leaves `image` alone) at the start of history.
    pub fn undo(&mut self, image: &mut Image) -> bool {
        match self.cursor {
            Some(cursor) if cursor > 0 => {
                self.cursor = Some(cursor - 1);
                *image = self.snapshots[cursor - 1].deep_copy();
                true
            }
            _ => false,
        }
    }

    /// Step forward one snapshot. Returns `false` at the end of history.
    pub fn redo(&mut self, image: &mut Image) -> bool {
        match self.cursor {
            Some(cursor) if cursor + 1 < self.snapshots.len() => {
                self.cursor = Some(cursor + 1);
                *image = self.snapshots[cursor + 1].deep_copy();
                true
            }
            _ => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(c) if c + 1 < self.snapshots.len())
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = None;
    }

    /// Bytes held by every stored snapshot.
    pub fn memory_usage(&self) -> usize {
        self.snapshots.iter().map(Image::memory_bytes).sum()
    }

    fn prune(&mut self) {
        let Some(max) = self.max_snapshots else {
            return;
        };
        if self.snapshots.len() <= max {
            return;
        }
        let excess = self.snapshots.len() - max;
        self.snapshots.drain(..excess);
        self.cursor = self.cursor.map(|c| c.saturating_sub(excess));
    }
}
