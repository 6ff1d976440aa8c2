// Terminal tab bar: one segment per tab, collapsed around the active tab
// when the bar is wider than the terminal

use ansi_term::Style;
use unicode_width::UnicodeWidthStr;

use crate::tab::Tab;

/// A rendered piece of the bar and its width in terminal columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinePart {
    pub part: String,
    pub len: usize,
    /// Index of the tab a click on this part selects.
    pub tab_index: Option<usize>,
}

/// Render one tab as ` title × `. The active tab is drawn bold and
/// reversed when `styled` is set.
pub fn render_tab(tab: &Tab, index: usize, styled: bool) -> LinePart {
    let text = format!(" {} × ", tab.title);
    let len = UnicodeWidthStr::width(text.as_str());

    let part = if styled && tab.is_active {
        Style::new().bold().reverse().paint(text).to_string()
    } else if styled {
        Style::new().dimmed().paint(text).to_string()
    } else if tab.is_active {
        // Unstyled output marks the active tab with brackets of equal width.
        format!("[{}]", &text[1..text.len() - 1])
    } else {
        text
    };

    LinePart {
        part,
        len,
        tab_index: Some(index),
    }
}

/// Width reserved for each collapse indicator.
const INDICATOR_WIDTH: usize = 6;

/// Lay out tab parts within `max_width`. If they do not fit, the active tab
/// is kept and neighbours are added alternately left and right while room
/// remains; the rest collapse into ` <-+N ` and ` +N-> ` indicators.
pub fn build_tab_line(parts: Vec<LinePart>, active: Option<usize>, max_width: usize) -> Vec<LinePart> {
    let total: usize = parts.iter().map(|p| p.len).sum();
    if total <= max_width || parts.is_empty() {
        return parts;
    }

    let budget = max_width.saturating_sub(INDICATOR_WIDTH * 2);
    let center = active.filter(|&i| i < parts.len()).unwrap_or(0);

    // Visible window is parts[lo..hi].
    let mut lo = center;
    let mut hi = center;
    let mut used = 0;
    if parts[center].len <= budget {
        hi = center + 1;
        used = parts[center].len;
    }

    let (mut left_open, mut right_open) = (hi > lo, hi > lo);
    while left_open || right_open {
        if left_open {
            match lo.checked_sub(1) {
                Some(i) if used + parts[i].len <= budget => {
                    lo = i;
                    used += parts[i].len;
                }
                _ => left_open = false,
            }
        }
        if right_open {
            if hi < parts.len() && used + parts[hi].len <= budget {
                used += parts[hi].len;
                hi += 1;
            } else {
                right_open = false;
            }
        }
    }

    let hidden_left = lo;
    let hidden_right = parts.len() - hi;
    let last_index = parts.len() - 1;

    let mut line = Vec::with_capacity(hi - lo + 2);
    if hidden_left > 0 {
        line.push(indicator(format!(" <-+{} ", hidden_left), 0));
    }
    line.extend(parts.into_iter().skip(lo).take(hi - lo));
    if hidden_right > 0 {
        line.push(indicator(format!(" +{}-> ", hidden_right), last_index));
    }
    line
}

fn indicator(text: String, tab_index: usize) -> LinePart {
    LinePart {
        len: UnicodeWidthStr::width(text.as_str()),
        part: text,
        tab_index: Some(tab_index),
    }
}

/// Render the whole bar for `tabs` as a single string.
pub fn render_bar(tabs: &[Tab], max_width: usize, styled: bool) -> String {
    let parts: Vec<LinePart> = tabs
        .iter()
        .enumerate()
        .map(|(i, tab)| render_tab(tab, i, styled))
        .collect();
    let active = tabs.iter().position(|t| t.is_active);

    build_tab_line(parts, active, max_width)
        .iter()
        .map(|p| p.part.as_str())
        .collect()
}

/// Index of the tab under column `x`, for click handling.
pub fn tab_at_column(line: &[LinePart], x: usize) -> Option<usize> {
    let mut start = 0;
    for part in line {
        if x >= start && x < start + part.len {
            return part.tab_index;
        }
        start += part.len;
    }
    None
}
