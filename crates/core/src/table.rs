// crates/core/src/table.rs
//! Paginated view over a tabular preview.

use datadesk_types::{cell_text, PreviewData, Row, MISSING_CELL};

use crate::text::NO_DATA;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Widest a rendered column may get before its cells are cut.
const MAX_CELL_WIDTH: usize = 32;

/// Rows plus a cursor. Pages are 1-based; `current_page` is always within
/// `1..=total_pages()`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Row>,
    page_size: usize,
    current_page: usize,
}

impl DataTable {
    pub fn new(data: PreviewData) -> Self {
        Self::with_page_size(data, DEFAULT_PAGE_SIZE)
    }

    /// A page size of 0 behaves as 1.
    pub fn with_page_size(data: PreviewData, page_size: usize) -> Self {
        Self {
            columns: data.columns,
            rows: data.rows,
            page_size: page_size.max(1),
            current_page: 1,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// `ceil(rows / page_size)`, at least 1 so an empty table still has a
    /// page to sit on.
    pub fn total_pages(&self) -> usize {
        self.rows.len().div_ceil(self.page_size).max(1)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Pagination controls only make sense with more than one page.
    pub fn has_pagination(&self) -> bool {
        self.total_pages() > 1
    }

    /// Jump to `page`. Out-of-range pages leave the cursor where it is.
    pub fn go_to(&mut self, page: usize) -> bool {
        if page < 1 || page > self.total_pages() || page == self.current_page {
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn first(&mut self) -> bool {
        self.go_to(1)
    }

    pub fn previous(&mut self) -> bool {
        match self.current_page.checked_sub(1) {
            Some(page) => self.go_to(page),
            None => false,
        }
    }

    pub fn next(&mut self) -> bool {
        self.go_to(self.current_page + 1)
    }

    pub fn last(&mut self) -> bool {
        self.go_to(self.total_pages())
    }

    /// 0-based `[start, end)` row range of the current page.
    fn bounds(&self) -> (usize, usize) {
        let start = (self.current_page - 1) * self.page_size;
        let end = (start + self.page_size).min(self.rows.len());
        (start.min(end), end)
    }

    /// Display text of the current page, one `String` per column.
    pub fn page_rows(&self) -> Vec<Vec<String>> {
        let (start, end) = self.bounds();
        self.rows[start..end]
            .iter()
            .map(|row| {
                (0..self.columns.len())
                    .map(|i| {
                        cell_text(row.get(i).and_then(Option::as_ref))
                            .unwrap_or_else(|| MISSING_CELL.to_string())
                    })
                    .collect()
            })
            .collect()
    }

    /// `Mostrando A a B de N resultados`, or the empty-table text.
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return NO_DATA.to_string();
        }
        let (start, end) = self.bounds();
        format!(
            "Mostrando {} a {} de {} resultados",
            start + 1,
            end,
            self.rows.len()
        )
    }

    /// Fixed-width text rendering of the current page.
    pub fn render(&self) -> String {
        if self.is_empty() || self.columns.is_empty() {
            return NO_DATA.to_string();
        }

        let body: Vec<Vec<String>> = self
            .page_rows()
            .into_iter()
            .map(|row| row.into_iter().map(|c| truncate(&c)).collect())
            .collect();
        let header: Vec<String> = self.columns.iter().map(|c| truncate(c)).collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
        for row in &body {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        push_line(&mut out, &header, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(&mut out, &rule, &widths);
        for row in &body {
            push_line(&mut out, row, &widths);
        }
        out.push_str(&self.summary());
        if self.has_pagination() {
            out.push_str(&format!(
                "  (página {} de {})",
                self.current_page,
                self.total_pages()
            ));
        }
        out
    }
}

fn truncate(cell: &str) -> String {
    let cell = cell.replace(['\n', '\r'], " ");
    if cell.chars().count() <= MAX_CELL_WIDTH {
        return cell;
    }
    let mut out = String::new();
    for ch in cell.chars() {
        if out.chars().count() + 1 >= MAX_CELL_WIDTH {
            break;
        }
        out.push(ch);
    }
    out.push('…');
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{cell}{}", " ".repeat(w.saturating_sub(cell.chars().count()))))
        .collect();
    out.push_str(line.join(" | ").trim_end());
    out.push('\n');
}
