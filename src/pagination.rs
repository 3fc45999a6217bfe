//! Pagination / Thread Traversal
//!
//! Drives "show more" interactions: find the trigger, click it, wait for the
//! loading indicator to go away, re-extract, keep only items not already in
//! the accumulated set. Stops on the first of: no trigger, an iteration that
//! adds nothing, or the iteration limit.

use std::collections::HashSet;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::dom::{self, Document};
use crate::error::Result;
use crate::host::PageHost;
use crate::observer::content_key;
use crate::options::PaginationOptions;
use crate::result::ExtractedContent;
use crate::selector::SelectorGroup;
use crate::throttle::{DelayKind, RateLimiter};

/// Why traversal stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No trigger element on the page (or it vanished before the click).
    NoTrigger,
    /// The last iteration revealed nothing new.
    NoNewItems,
    /// The configured iteration limit was reached.
    MaxIterations,
}

/// Outcome of a traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationReport {
    /// Completed click-and-extract iterations.
    pub iterations: usize,
    pub stop: StopReason,
    /// Items added across all iterations.
    pub added: usize,
    /// Iterations whose loading indicator outlived the loading timeout.
    pub loading_timeouts: usize,
}

/// Trigger and loading-indicator selectors for one kind of "show more" UI.
#[derive(Debug, Clone, Copy)]
pub struct PaginationControls {
    pub trigger: &'static SelectorGroup,
    pub loading: &'static SelectorGroup,
}

/// Reveal more items by repeatedly clicking the trigger.
///
/// `accumulated` holds the items known so far and receives new ones in the
/// order they are revealed. `extract` runs over each post-load snapshot.
pub async fn paginate<F>(
    host: &dyn PageHost,
    controls: PaginationControls,
    options: &PaginationOptions,
    limiter: &RateLimiter,
    accumulated: &mut Vec<ExtractedContent>,
    mut extract: F,
) -> Result<PaginationReport>
where
    F: FnMut(&Document) -> Vec<ExtractedContent>,
{
    let mut seen: HashSet<String> = accumulated.iter().map(content_key).collect();
    let mut report = PaginationReport {
        iterations: 0,
        stop: StopReason::MaxIterations,
        added: 0,
        loading_timeouts: 0,
    };

    while report.iterations < options.max_iterations {
        let html = host.snapshot().await?;
        let Some(trigger) = find_trigger(&html, controls.trigger) else {
            report.stop = StopReason::NoTrigger;
            break;
        };

        limiter.wait(DelayKind::LoadMore).await;
        if !host.click(&trigger).await? {
            report.stop = StopReason::NoTrigger;
            break;
        }

        let (html, timed_out) = wait_for_load(host, controls.loading, options).await?;
        if timed_out {
            report.loading_timeouts += 1;
        }
        report.iterations += 1;

        let doc = dom::parse(&html);
        let mut added = 0;
        for item in extract(&doc) {
            if seen.insert(content_key(&item)) {
                accumulated.push(item);
                added += 1;
            }
        }
        report.added += added;
        debug!(iteration = report.iterations, added, trigger = %trigger, "pagination iteration");

        if added == 0 {
            report.stop = StopReason::NoNewItems;
            break;
        }
    }

    Ok(report)
}

fn find_trigger(html: &str, group: &SelectorGroup) -> Option<String> {
    let doc = dom::parse(html);
    group.first(&dom::document_scope(&doc)).map(|r| r.selector)
}

/// Poll until no loading indicator is present or the timeout passes. Returns
/// the last snapshot and whether the timeout was hit.
async fn wait_for_load(
    host: &dyn PageHost,
    loading: &SelectorGroup,
    options: &PaginationOptions,
) -> Result<(String, bool)> {
    let deadline = Instant::now() + options.loading_timeout();
    loop {
        let html = host.snapshot().await?;
        let still_loading = {
            let doc = dom::parse(&html);
            loading.matches(&dom::document_scope(&doc))
        };
        if !still_loading {
            return Ok((html, false));
        }
        if Instant::now() >= deadline {
            warn!(timeout_ms = options.loading_timeout_ms, "loading indicator did not clear");
            return Ok((html, true));
        }
        sleep(options.poll_interval()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryPage;
    use crate::options::ThrottleOptions;
    use crate::result::{ContentKind, Platform};
    use std::time::Duration;

    static MORE: SelectorGroup = SelectorGroup::new("show_more", &["button.more"]);
    static LOADING: SelectorGroup = SelectorGroup::new("loading", &[".spinner"]);

    const CONTROLS: PaginationControls = PaginationControls {
        trigger: &MORE,
        loading: &LOADING,
    };

    fn items(doc: &Document) -> Vec<ExtractedContent> {
        dom::each(&doc.select("li"))
            .map(|li| {
                let id = dom::get_attribute(&li, "id").unwrap_or_default();
                let mut item = ExtractedContent::new(Platform::Twitter, ContentKind::Comment, id);
                item.text = dom::text_content(&li);
                item
            })
            .collect()
    }

    fn page_with(ids: &[u32], more: bool, spinner: bool) -> String {
        let lis: String = ids.iter().map(|i| format!(r#"<li id="{i}">c{i}</li>"#)).collect();
        format!(
            "<ul>{lis}</ul>{}{}",
            if more { r#"<button class="more">more</button>"# } else { "" },
            if spinner { r#"<div class="spinner"></div>"# } else { "" }
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_trigger_disappears() {
        let page = MemoryPage::new("https://x.com/a/status/1", page_with(&[1], true, false));
        page.on_click("button.more", vec![page_with(&[1, 2], true, true), page_with(&[1, 2, 3], true, false)]);
        page.on_click("button.more", vec![page_with(&[1, 2, 3, 4], false, false)]);

        let limiter = RateLimiter::new(&ThrottleOptions::unthrottled());
        let mut acc = items(&dom::parse(&page.html()));
        let report = paginate(&page, CONTROLS, &PaginationOptions::default(), &limiter, &mut acc, items)
            .await
            .unwrap();

        assert_eq!(report.iterations, 2);
        assert_eq!(report.stop, StopReason::NoTrigger);
        assert_eq!(report.added, 3);
        let ids: Vec<&str> = acc.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_nothing_new() {
        let page = MemoryPage::new("https://x.com/a/status/1", page_with(&[1, 2], true, false));
        let limiter = RateLimiter::new(&ThrottleOptions::unthrottled());
        let mut acc = items(&dom::parse(&page.html()));
        let report = paginate(&page, CONTROLS, &PaginationOptions::default(), &limiter, &mut acc, items)
            .await
            .unwrap();
        assert_eq!(report.iterations, 1);
        assert_eq!(report.stop, StopReason::NoNewItems);
        assert_eq!(acc.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_respects_iteration_limit() {
        let page = MemoryPage::new("https://x.com/a/status/1", page_with(&[0], true, false));
        for n in 1..=10 {
            let ids: Vec<u32> = (0..=n).collect();
            page.on_click("button.more", vec![page_with(&ids, true, false)]);
        }
        let options = PaginationOptions {
            max_iterations: 3,
            ..PaginationOptions::default()
        };
        let limiter = RateLimiter::new(&ThrottleOptions::unthrottled());
        let mut acc = Vec::new();
        let report = paginate(&page, CONTROLS, &options, &limiter, &mut acc, items).await.unwrap();
        assert_eq!(report.iterations, 3);
        assert_eq!(report.stop, StopReason::MaxIterations);
        assert_eq!(page.clicks().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_timeout_still_extracts() {
        let page = MemoryPage::new("https://x.com/a/status/1", page_with(&[1], true, false));
        page.on_click("button.more", vec![page_with(&[1, 2], false, true)]);
        let limiter = RateLimiter::new(&ThrottleOptions::unthrottled());
        let mut acc = items(&dom::parse(&page.html()));

        let start = Instant::now();
        let report = paginate(&page, CONTROLS, &PaginationOptions::default(), &limiter, &mut acc, items)
            .await
            .unwrap();
        assert!(Instant::now() - start >= Duration::from_secs(5));
        assert_eq!(report.loading_timeouts, 1);
        assert_eq!(acc.len(), 2);
        assert_eq!(report.stop, StopReason::NoTrigger);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_more_is_throttled() {
        let page = MemoryPage::new("https://x.com/a/status/1", page_with(&[1], true, false));
        page.on_click("button.more", vec![page_with(&[1, 2], true, false)]);
        page.on_click("button.more", vec![page_with(&[1, 2, 3], false, false)]);
        let limiter = RateLimiter::new(&ThrottleOptions::default());
        let mut acc = Vec::new();

        let start = Instant::now();
        paginate(&page, CONTROLS, &PaginationOptions::default(), &limiter, &mut acc, items)
            .await
            .unwrap();
        assert_eq!(Instant::now() - start, Duration::from_millis(800));
    }
}
