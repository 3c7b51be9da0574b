use crate::model::{Paragraph, Run};

/// Where a placeholder sits relative to the paragraph's runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMatch {
    /// Found verbatim inside the run at this index (among runs only).
    SingleRun(usize),
    /// Only found in the concatenated text; it crosses a run boundary.
    Straddling,
    NotFound,
}

pub fn locate(paragraph: &Paragraph, key: &str) -> RunMatch {
    if key.is_empty() {
        return RunMatch::NotFound;
    }
    if let Some(index) = paragraph.runs().position(|run| run.text().contains(key)) {
        return RunMatch::SingleRun(index);
    }
    if paragraph.text().contains(key) {
        RunMatch::Straddling
    } else {
        RunMatch::NotFound
    }
}

/// Replace `key` with `value` in `paragraph`, keeping formatting where the
/// key lives in a single run. Returns whether anything was replaced.
///
/// A key that crosses run boundaries collapses the paragraph's runs into one
/// run that carries the first run's formatting. Paragraphs with runs inside
/// hyperlinks or other wrappers are left alone in that case.
pub fn splice(paragraph: &mut Paragraph, key: &str, value: &str) -> bool {
    match locate(paragraph, key) {
        RunMatch::SingleRun(index) => {
            let Some(run) = paragraph.runs_mut().nth(index) else {
                return false;
            };
            let text = run.text().replace(key, value);
            run.set_text(&text);
            true
        }
        RunMatch::Straddling if paragraph.has_wrapped_runs() => {
            log::warn!(
                "'{}' crosses a hyperlink or field boundary; left unreplaced",
                key
            );
            false
        }
        RunMatch::Straddling => {
            let format = paragraph.runs().next().map(Run::format).unwrap_or_default();
            let text = paragraph.text().replace(key, value);
            log::debug!("'{}' crosses run boundaries; merging runs", key);
            paragraph.clear_runs();
            paragraph.push_run(Run::with_text(&text, &format));
            true
        }
        RunMatch::NotFound => false,
    }
}
