/// A run of consecutive details printed on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpan {
    /// 0-based page index within the task.
    pub index: usize,
    pub count: usize,
    /// 0-based index of the first detail.
    pub first: usize,
    pub len: usize,
}

impl PageSpan {
    pub fn details(&self) -> std::ops::Range<usize> {
        self.first..self.first + self.len
    }

    /// 1-based row number of the first detail.
    pub fn first_row(&self) -> usize {
        self.first + 1
    }
}

/// Splits `detail_count` details into pages of at most `per_page`.
pub fn plan_pages(detail_count: usize, per_page: usize) -> Vec<PageSpan> {
    let per_page = per_page.max(1);
    let count = detail_count.div_ceil(per_page);
    (0..count)
        .map(|index| {
            let first = index * per_page;
            PageSpan {
                index,
                count,
                first,
                len: per_page.min(detail_count - first),
            }
        })
        .collect()
}

/// Digits needed to print every row number of a task.
pub fn row_digits(detail_count: usize) -> usize {
    detail_count.max(1).to_string().len()
}

pub fn row_label(row: usize, digits: usize) -> String {
    format!("{row:0>digits$}")
}
