use crate::cli::commands::secret_start;

/// Single-line editor state for the input box. Cursor positions count chars,
/// not bytes.
#[derive(Debug, Clone, Default)]
pub(crate) struct InputBuffer {
    text: String,
    cursor: usize,
    history: Vec<String>,
    history_index: Option<usize>,
    draft: Option<String>,
}

impl InputBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Replaces the line and puts the cursor at its end.
    pub(crate) fn set_text(&mut self, text: &str) {
        self.history_index = None;
        self.draft = None;
        self.replace_text(text.to_string());
    }

    pub(crate) fn insert_char(&mut self, ch: char) {
        let byte_index = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_index, ch);
        self.cursor += 1;
    }

    pub(crate) fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let start = char_to_byte_index(&self.text, self.cursor - 1);
        let end = char_to_byte_index(&self.text, self.cursor);
        self.text.replace_range(start..end, "");
        self.cursor -= 1;
    }

    pub(crate) fn delete(&mut self) {
        if self.cursor >= self.text.chars().count() {
            return;
        }
        let start = char_to_byte_index(&self.text, self.cursor);
        let end = char_to_byte_index(&self.text, self.cursor + 1);
        self.text.replace_range(start..end, "");
    }

    pub(crate) fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub(crate) fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub(crate) fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub(crate) fn move_end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    /// Takes the current line, records it in history when non-blank and
    /// resets the editor. `/key <value>` lines are never recorded.
    pub(crate) fn submit(&mut self) -> String {
        let line = std::mem::take(&mut self.text);
        self.cursor = 0;
        self.history_index = None;
        self.draft = None;
        let recordable = !line.trim().is_empty() && secret_start(&line).is_none();
        if recordable && self.history.last() != Some(&line) {
            self.history.push(line.clone());
        }
        line
    }

    pub(crate) fn history_previous(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let next_index = match self.history_index {
            None => {
                self.draft = Some(self.text.clone());
                self.history.len() - 1
            }
            Some(0) => 0,
            Some(idx) => idx - 1,
        };
        self.history_index = Some(next_index);
        self.replace_text(self.history[next_index].clone());
    }

    pub(crate) fn history_next(&mut self) {
        let Some(idx) = self.history_index else {
            return;
        };
        if idx + 1 < self.history.len() {
            self.history_index = Some(idx + 1);
            self.replace_text(self.history[idx + 1].clone());
        } else {
            self.history_index = None;
            let draft = self.draft.take().unwrap_or_default();
            self.replace_text(draft);
        }
    }

    fn replace_text(&mut self, text: String) {
        self.text = text;
        self.cursor = self.text.chars().count();
    }
}

fn char_to_byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(idx, _)| idx)
}
