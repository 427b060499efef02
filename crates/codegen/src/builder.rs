// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Builder stack
//!
//! Native SQL is appended to the buffer on top of a stack. A construct whose
//! surrounding text depends on an inner expression pushes a fresh buffer,
//! renders the inner part, pops it and splices the result where it belongs.

/// Stack of output buffers
#[derive(Debug, Clone)]
pub struct SqlBuilder {
    stack: Vec<String>,
}

impl SqlBuilder {
    pub fn new() -> Self {
        Self {
            stack: vec![String::new()],
        }
    }

    /// Number of open buffers, the root buffer included
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Append to the current buffer
    pub fn append(&mut self, text: &str) -> &mut Self {
        if let Some(top) = self.stack.last_mut() {
            top.push_str(text);
        }
        self
    }

    /// Append `text` preceded by a single space
    pub fn append_spaced(&mut self, text: &str) -> &mut Self {
        self.append(" ").append(text)
    }

    /// Open an isolated buffer
    pub fn push(&mut self) {
        self.stack.push(String::new());
    }

    /// Close the current buffer and return its text. The root buffer is never
    /// popped; popping it yields an empty string.
    pub fn pop(&mut self) -> String {
        if self.stack.len() > 1 {
            self.stack.pop().unwrap_or_default()
        } else {
            String::new()
        }
    }

    /// Whether the current buffer is empty
    pub fn is_empty(&self) -> bool {
        self.stack.last().is_none_or(String::is_empty)
    }

    /// Collapse all open buffers into the final text
    pub fn finish(mut self) -> String {
        while self.stack.len() > 1 {
            let top = self.pop();
            self.append(&top);
        }
        self.stack.pop().unwrap_or_default()
    }
}

impl Default for SqlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_isolates_inner_text() {
        let mut builder = SqlBuilder::new();
        builder.append("UPDATE [t] SET ");
        builder.push();
        builder.append("[a] = ?1");
        assert_eq!(builder.depth(), 2);
        let set_list = builder.pop();
        assert_eq!(set_list, "[a] = ?1");
        builder.append(&set_list);
        assert_eq!(builder.finish(), "UPDATE [t] SET [a] = ?1");
    }

    #[test]
    fn test_root_is_never_popped() {
        let mut builder = SqlBuilder::new();
        builder.append("x");
        assert_eq!(builder.pop(), "");
        assert_eq!(builder.depth(), 1);
        assert!(!builder.is_empty());
    }

    #[test]
    fn test_finish_flushes_open_buffers() {
        let mut builder = SqlBuilder::new();
        builder.append("a");
        builder.push();
        builder.append_spaced("b");
        assert_eq!(builder.finish(), "a b");
    }
}
