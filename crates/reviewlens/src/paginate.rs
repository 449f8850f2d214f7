//! Fixed-size windowing over an ordered collection.

use serde::Serialize;

pub const PAGE_SIZE: usize = 10;

/// Navigation request from the table view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCommand {
  Next,
  Previous,
  First,
  Last,
  /// 1-based page number
  Goto(usize),
}

/// One window of a collection
#[derive(Debug, PartialEq, Serialize)]
pub struct Page<'a, T> {
  pub items: &'a [T],
  /// 1-based
  pub number: usize,
  pub total_pages: usize,
  pub total_items: usize,
  /// Position of the first item within the full collection
  pub offset: usize,
}

impl<T> Page<'_, T> {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn has_previous(&self) -> bool {
    self.number > 1
  }

  pub fn has_next(&self) -> bool {
    self.number < self.total_pages
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
  page_size: usize,
}

impl Default for Paginator {
  fn default() -> Self {
    Self::new(PAGE_SIZE)
  }
}

impl Paginator {
  /// A zero page size is treated as one.
  pub fn new(page_size: usize) -> Self {
    Self { page_size: page_size.max(1) }
  }

  pub fn page_size(&self) -> usize {
    self.page_size
  }

  /// Never less than one, even for an empty collection
  pub fn page_count(&self, len: usize) -> usize {
    len.div_ceil(self.page_size).max(1)
  }

  pub fn clamp(&self, page: usize, len: usize) -> usize {
    page.clamp(1, self.page_count(len))
  }

  /// Page reached from `current` by `command`; stays put at either end.
  pub fn navigate(&self, current: usize, command: PageCommand, len: usize) -> usize {
    let last = self.page_count(len);
    let current = self.clamp(current, len);
    let target = match command {
      PageCommand::Next => current.saturating_add(1),
      PageCommand::Previous => current.saturating_sub(1),
      PageCommand::First => 1,
      PageCommand::Last => last,
      PageCommand::Goto(page) => page,
    };
    target.clamp(1, last)
  }

  pub fn page<'a, T>(&self, items: &'a [T], number: usize) -> Page<'a, T> {
    let number = self.clamp(number, items.len());
    let start = ((number - 1) * self.page_size).min(items.len());
    let end = (number * self.page_size).min(items.len());

    Page {
      items: &items[start..end],
      number,
      total_pages: self.page_count(items.len()),
      total_items: items.len(),
      offset: start,
    }
  }
}
